/// Declared warehouse type of a target column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Varchar,
    Boolean,
    Timestamp,
}

impl SqlType {
    pub fn ddl(self) -> &'static str {
        match self {
            SqlType::Varchar => "VARCHAR",
            SqlType::Boolean => "BOOLEAN",
            SqlType::Timestamp => "TIMESTAMP",
        }
    }
}

/// Where a column's value comes from: the same-named raw API field, or the
/// load date computed once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnSource {
    ApiField,
    LoadDate,
}

#[derive(Debug, Clone)]
pub struct ColumnSpec {
    pub name: String,
    pub sql_type: SqlType,
    pub source: ColumnSource,
}

impl ColumnSpec {
    pub fn api_field(name: &str, sql_type: SqlType) -> Self {
        Self {
            name: name.to_string(),
            sql_type,
            source: ColumnSource::ApiField,
        }
    }

    pub fn load_date(name: &str) -> Self {
        Self {
            name: name.to_string(),
            sql_type: SqlType::Varchar,
            source: ColumnSource::LoadDate,
        }
    }
}

/// The fixed, ordered column list the warehouse table is expected to have.
/// Every column resolves to an API field or the load date by construction;
/// the order here is the order of DDL columns and insert placeholders.
#[derive(Debug, Clone)]
pub struct TargetSchema {
    columns: Vec<ColumnSpec>,
}

impl TargetSchema {
    pub fn new(columns: Vec<ColumnSpec>) -> Result<Self, String> {
        if columns.is_empty() {
            return Err("target schema has no columns".to_string());
        }
        for (index, column) in columns.iter().enumerate() {
            if column.name.is_empty() {
                return Err(format!("target schema column {index} has an empty name"));
            }
            let duplicate = columns[..index]
                .iter()
                .any(|other| other.name.eq_ignore_ascii_case(&column.name));
            if duplicate {
                return Err(format!("duplicate target schema column: {}", column.name));
            }
        }
        Ok(Self { columns })
    }

    /// The reference-ticker schema: twelve upstream fields plus the `ds`
    /// load-date tag.
    pub fn reference_tickers() -> Self {
        Self {
            columns: vec![
                ColumnSpec::api_field("ticker", SqlType::Varchar),
                ColumnSpec::api_field("name", SqlType::Varchar),
                ColumnSpec::api_field("market", SqlType::Varchar),
                ColumnSpec::api_field("locale", SqlType::Varchar),
                ColumnSpec::api_field("primary_exchange", SqlType::Varchar),
                ColumnSpec::api_field("type", SqlType::Varchar),
                ColumnSpec::api_field("active", SqlType::Boolean),
                ColumnSpec::api_field("currency_name", SqlType::Varchar),
                ColumnSpec::api_field("cik", SqlType::Varchar),
                ColumnSpec::api_field("composite_figi", SqlType::Varchar),
                ColumnSpec::api_field("share_class_figi", SqlType::Varchar),
                ColumnSpec::api_field("last_updated_utc", SqlType::Timestamp),
                ColumnSpec::load_date("ds"),
            ],
        }
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{ColumnSource, ColumnSpec, SqlType, TargetSchema};

    #[test]
    fn reference_tickers_has_expected_shape() {
        let schema = TargetSchema::reference_tickers();
        assert_eq!(schema.len(), 13);

        let last = schema.columns().last().expect("schema is non-empty");
        assert_eq!(last.name, "ds");
        assert_eq!(last.source, ColumnSource::LoadDate);
        assert_eq!(last.sql_type, SqlType::Varchar);

        let active = schema
            .columns()
            .iter()
            .find(|column| column.name == "active")
            .expect("active column");
        assert_eq!(active.sql_type, SqlType::Boolean);

        let load_date_columns = schema
            .columns()
            .iter()
            .filter(|column| column.source == ColumnSource::LoadDate)
            .count();
        assert_eq!(load_date_columns, 1);
    }

    #[test]
    fn new_rejects_duplicate_columns() {
        let err = TargetSchema::new(vec![
            ColumnSpec::api_field("ticker", SqlType::Varchar),
            ColumnSpec::api_field("TICKER", SqlType::Varchar),
        ])
        .expect_err("duplicate columns should be rejected");
        assert!(err.contains("duplicate"));
    }

    #[test]
    fn new_rejects_empty_schema() {
        assert!(TargetSchema::new(Vec::new()).is_err());
    }

    #[test]
    fn ddl_spellings() {
        assert_eq!(SqlType::Varchar.ddl(), "VARCHAR");
        assert_eq!(SqlType::Boolean.ddl(), "BOOLEAN");
        assert_eq!(SqlType::Timestamp.ddl(), "TIMESTAMP");
    }
}
