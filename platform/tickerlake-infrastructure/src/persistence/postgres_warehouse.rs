use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::time::Instant;
use tickerlake_domain::repositories::warehouse::TickerWarehouse;
use tickerlake_domain::services::schema::{SqlType, TargetSchema};
use tickerlake_domain::value_objects::cell::CellValue;
use tickerlake_domain::value_objects::load_batch::LoadBatch;
use tokio_postgres::types::ToSql;
use tokio_postgres::NoTls;

const DEFAULT_PORT: u16 = 5432;

/// Connection coordinates for the warehouse, mirroring the deployment's
/// account/warehouse/database/schema surface. `account` is `host` or
/// `host:port`; the warehouse label is recorded as the connection's
/// application name.
#[derive(Debug, Clone)]
pub struct WarehouseTarget {
    pub user: String,
    pub password: String,
    pub account: String,
    pub warehouse: String,
    pub database: String,
    pub schema: String,
    pub table: String,
}

/// Appends load batches to the target table, creating it on first use. One
/// connection per run, opened lazily and dropped when the write completes;
/// there is no pooling across runs.
#[derive(Debug, Clone)]
pub struct PostgresWarehouse {
    target: WarehouseTarget,
}

enum PgParam {
    Text(Option<String>),
    Bool(Option<bool>),
    Timestamp(Option<NaiveDateTime>),
}

impl PgParam {
    fn as_sql(&self) -> &(dyn ToSql + Sync) {
        match self {
            PgParam::Text(value) => value,
            PgParam::Bool(value) => value,
            PgParam::Timestamp(value) => value,
        }
    }
}

impl PostgresWarehouse {
    pub fn new(target: WarehouseTarget) -> Result<Self, String> {
        validate_identifier(&target.table)
            .map_err(|err| format!("invalid table name '{}': {}", target.table, err))?;
        if !target.schema.is_empty() {
            validate_identifier(&target.schema)
                .map_err(|err| format!("invalid schema name '{}': {}", target.schema, err))?;
        }
        Ok(Self { target })
    }

    /// Ensure the table exists and append the batch as new rows. An empty
    /// batch opens no connection and issues no statement. Errors at
    /// connect/DDL/DML are logged and returned to the caller.
    pub async fn write_batch(
        &self,
        schema: &TargetSchema,
        batch: &LoadBatch,
    ) -> Result<u64, String> {
        if batch.is_empty() {
            tracing::debug!("empty load batch; skipping warehouse write");
            return Ok(0);
        }

        let start = Instant::now();
        let table = self.qualified_table();

        let (mut client, connection) = self
            .connect_config()?
            .connect(NoTls)
            .await
            .map_err(|err| {
                metrics::counter!("tickerlake.warehouse.errors_total", "stage" => "connect")
                    .increment(1);
                tracing::error!(error = %err, "failed to connect to warehouse");
                format!("failed to connect to warehouse: {err}")
            })?;
        tokio::spawn(async move {
            if let Err(err) = connection.await {
                tracing::error!(error = %err, "warehouse connection error");
            }
        });
        tracing::info!(table = %table, "connected to warehouse");

        client
            .batch_execute(&create_table_sql(&table, schema))
            .await
            .map_err(|err| {
                metrics::counter!("tickerlake.warehouse.errors_total", "stage" => "create_table")
                    .increment(1);
                tracing::error!(error = %err, table = %table, "failed to create/verify table");
                format!("failed to create/verify table {table}: {err}")
            })?;

        let statement = client.prepare(&insert_sql(&table, schema)).await.map_err(|err| {
            metrics::counter!("tickerlake.warehouse.errors_total", "stage" => "prepare")
                .increment(1);
            format!("failed to prepare insert: {err}")
        })?;

        let transaction = client
            .transaction()
            .await
            .map_err(|err| format!("failed to start transaction: {err}"))?;

        let mut written = 0u64;
        for row in &batch.rows {
            let owned: Vec<PgParam> = row
                .iter()
                .zip(schema.columns())
                .map(|(cell, column)| pg_param(cell, column.sql_type))
                .collect();
            let params: Vec<&(dyn ToSql + Sync)> =
                owned.iter().map(|param| param.as_sql()).collect();
            transaction.execute(&statement, &params).await.map_err(|err| {
                metrics::counter!("tickerlake.warehouse.errors_total", "stage" => "insert")
                    .increment(1);
                tracing::error!(error = %err, row = written, "insert failed");
                format!("insert into {table} failed: {err}")
            })?;
            written += 1;
        }

        transaction
            .commit()
            .await
            .map_err(|err| format!("failed to commit: {err}"))?;

        metrics::counter!("tickerlake.warehouse.rows_written_total").increment(written);
        metrics::histogram!("tickerlake.warehouse.write_ms")
            .record(start.elapsed().as_secs_f64() * 1000.0);
        tracing::info!(rows = written, table = %table, "inserted load batch");
        Ok(written)
    }

    fn qualified_table(&self) -> String {
        if self.target.schema.is_empty() {
            self.target.table.clone()
        } else {
            format!("{}.{}", self.target.schema, self.target.table)
        }
    }

    fn connect_config(&self) -> Result<tokio_postgres::Config, String> {
        let (host, port) = split_account(&self.target.account)?;
        let mut config = tokio_postgres::Config::new();
        config
            .host(&host)
            .port(port)
            .user(&self.target.user)
            .password(&self.target.password)
            .dbname(&self.target.database);
        if !self.target.warehouse.is_empty() {
            config.application_name(&self.target.warehouse);
        }
        Ok(config)
    }
}

#[async_trait]
impl TickerWarehouse for PostgresWarehouse {
    async fn write_batch(&self, schema: &TargetSchema, batch: &LoadBatch) -> Result<u64, String> {
        PostgresWarehouse::write_batch(self, schema, batch).await
    }
}

fn pg_param(cell: &CellValue, sql_type: SqlType) -> PgParam {
    match sql_type {
        SqlType::Varchar => PgParam::Text(match cell {
            CellValue::Text(text) => Some(text.clone()),
            CellValue::Bool(flag) => Some(flag.to_string()),
            CellValue::Timestamp(ts) => Some(ts.to_string()),
            CellValue::Null => None,
        }),
        SqlType::Boolean => PgParam::Bool(match cell {
            CellValue::Bool(flag) => Some(*flag),
            _ => None,
        }),
        SqlType::Timestamp => PgParam::Timestamp(match cell {
            CellValue::Timestamp(ts) => Some(*ts),
            _ => None,
        }),
    }
}

fn create_table_sql(table: &str, schema: &TargetSchema) -> String {
    let columns = schema
        .columns()
        .iter()
        .map(|column| format!("{} {}", column.name.to_uppercase(), column.sql_type.ddl()))
        .collect::<Vec<_>>()
        .join(", ");
    format!("CREATE TABLE IF NOT EXISTS {table} ({columns})")
}

fn insert_sql(table: &str, schema: &TargetSchema) -> String {
    let columns = schema
        .columns()
        .iter()
        .map(|column| column.name.to_uppercase())
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=schema.len())
        .map(|index| format!("${index}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("INSERT INTO {table} ({columns}) VALUES ({placeholders})")
}

fn split_account(account: &str) -> Result<(String, u16), String> {
    match account.rsplit_once(':') {
        Some((host, port)) => {
            let port = port
                .parse::<u16>()
                .map_err(|_| format!("invalid port in warehouse account '{account}'"))?;
            Ok((host.to_string(), port))
        }
        None => Ok((account.to_string(), DEFAULT_PORT)),
    }
}

fn validate_identifier(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("identifier is empty".to_string());
    }
    let mut chars = name.chars();
    let first = match chars.next() {
        Some(ch) => ch,
        None => return Err("identifier is empty".to_string()),
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return Err(format!("invalid identifier: {name}"));
    }
    if !chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
        return Err(format!("invalid identifier: {name}"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{
        create_table_sql, insert_sql, pg_param, split_account, validate_identifier, PgParam,
        PostgresWarehouse, WarehouseTarget,
    };
    use chrono::NaiveDate;
    use tickerlake_domain::services::mapper::map_batch;
    use tickerlake_domain::services::schema::{SqlType, TargetSchema};
    use tickerlake_domain::value_objects::cell::CellValue;
    use tickerlake_domain::value_objects::load_batch::LoadBatch;

    fn target(table: &str) -> WarehouseTarget {
        WarehouseTarget {
            user: "loader".to_string(),
            password: "CHANGE_ME".to_string(),
            account: "127.0.0.1:1".to_string(),
            warehouse: "loading".to_string(),
            database: "marketdata".to_string(),
            schema: "reference".to_string(),
            table: table.to_string(),
        }
    }

    #[test]
    fn validate_identifier_rejects_injection() {
        assert!(validate_identifier("stock_tickers").is_ok());
        assert!(validate_identifier("_staging").is_ok());
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("tickers;drop").is_err());
        assert!(validate_identifier("1tickers").is_err());
        assert!(validate_identifier("a.b").is_err());
    }

    #[test]
    fn new_rejects_invalid_table_and_schema_names() {
        assert!(PostgresWarehouse::new(target("tickers;drop")).is_err());

        let mut bad_schema = target("stock_tickers");
        bad_schema.schema = "ref;drop".to_string();
        assert!(PostgresWarehouse::new(bad_schema).is_err());

        assert!(PostgresWarehouse::new(target("stock_tickers")).is_ok());
    }

    #[test]
    fn split_account_defaults_the_port() {
        assert_eq!(
            split_account("warehouse.internal").expect("parses"),
            ("warehouse.internal".to_string(), 5432)
        );
        assert_eq!(
            split_account("warehouse.internal:5439").expect("parses"),
            ("warehouse.internal".to_string(), 5439)
        );
        assert!(split_account("warehouse.internal:fast").is_err());
    }

    #[test]
    fn create_table_sql_uppercases_columns_and_keeps_declared_types() {
        let sql = create_table_sql("reference.stock_tickers", &TargetSchema::reference_tickers());
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS reference.stock_tickers ("));
        assert!(sql.contains("TICKER VARCHAR"));
        assert!(sql.contains("ACTIVE BOOLEAN"));
        assert!(sql.contains("LAST_UPDATED_UTC TIMESTAMP"));
        assert!(sql.contains("DS VARCHAR"));
    }

    #[test]
    fn insert_sql_aligns_placeholders_with_the_schema() {
        let schema = TargetSchema::reference_tickers();
        let sql = insert_sql("stock_tickers", &schema);
        assert!(sql.starts_with("INSERT INTO stock_tickers (TICKER, NAME,"));
        assert!(sql.ends_with(format!("${})", schema.len()).as_str()));
        assert_eq!(sql.matches('$').count(), schema.len());
    }

    #[test]
    fn pg_param_respects_the_declared_column_type() {
        match pg_param(&CellValue::Text("AAPL".to_string()), SqlType::Varchar) {
            PgParam::Text(Some(text)) => assert_eq!(text, "AAPL"),
            other => panic!("expected text param, got {:?}", kind(&other)),
        }
        match pg_param(&CellValue::Null, SqlType::Boolean) {
            PgParam::Bool(None) => {}
            other => panic!("expected null bool param, got {:?}", kind(&other)),
        }
        match pg_param(&CellValue::Text("oops".to_string()), SqlType::Timestamp) {
            PgParam::Timestamp(None) => {}
            other => panic!("expected null timestamp param, got {:?}", kind(&other)),
        }
    }

    fn kind(param: &PgParam) -> &'static str {
        match param {
            PgParam::Text(_) => "text",
            PgParam::Bool(_) => "bool",
            PgParam::Timestamp(_) => "timestamp",
        }
    }

    #[tokio::test]
    async fn empty_batch_never_opens_a_connection() {
        // The target points at a closed port; a connection attempt would fail,
        // so Ok(0) proves the short-circuit.
        let warehouse = PostgresWarehouse::new(target("stock_tickers")).expect("valid target");
        let schema = TargetSchema::reference_tickers();
        let batch = map_batch(&[], &schema, NaiveDate::from_ymd_opt(2026, 8, 8).unwrap());

        let written = warehouse
            .write_batch(&schema, &batch)
            .await
            .expect("empty batch short-circuits");
        assert_eq!(written, 0);
    }

    #[tokio::test]
    async fn non_empty_batch_surfaces_connect_errors() {
        let warehouse = PostgresWarehouse::new(target("stock_tickers")).expect("valid target");
        let schema = TargetSchema::reference_tickers();
        let batch = LoadBatch {
            load_date: NaiveDate::from_ymd_opt(2026, 8, 8).unwrap(),
            rows: vec![vec![CellValue::Null; schema.len()]],
        };

        let err = warehouse
            .write_batch(&schema, &batch)
            .await
            .expect_err("closed port should fail to connect");
        assert!(err.contains("failed to connect"));
    }
}
