use crate::services::schema::{ColumnSource, SqlType, TargetSchema};
use crate::value_objects::cell::CellValue;
use crate::value_objects::load_batch::LoadBatch;
use crate::value_objects::ticker::TickerRecord;
use chrono::{DateTime, NaiveDate};
use serde_json::Value;

/// Convert one raw record into a row aligned with the schema's column order.
/// Absent fields map to null; there is no required-field validation.
pub fn map_record(
    record: &TickerRecord,
    schema: &TargetSchema,
    load_date: NaiveDate,
) -> Vec<CellValue> {
    schema
        .columns()
        .iter()
        .map(|column| match column.source {
            ColumnSource::LoadDate => CellValue::Text(load_date.to_string()),
            ColumnSource::ApiField => record
                .field(&column.name)
                .map(|value| cell_from_value(value, column.sql_type))
                .unwrap_or(CellValue::Null),
        })
        .collect()
}

/// Map a full run's records into a load batch sharing one load date.
pub fn map_batch(
    records: &[TickerRecord],
    schema: &TargetSchema,
    load_date: NaiveDate,
) -> LoadBatch {
    LoadBatch {
        load_date,
        rows: records
            .iter()
            .map(|record| map_record(record, schema, load_date))
            .collect(),
    }
}

/// The upstream boolean flag arrives as text or as a native bool depending
/// on the field; "true"/"false" in any casing coerce to a proper boolean.
pub fn coerce_bool(text: &str) -> Option<bool> {
    if text.eq_ignore_ascii_case("true") {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn cell_from_value(value: &Value, sql_type: SqlType) -> CellValue {
    match sql_type {
        SqlType::Boolean => match value {
            Value::Bool(flag) => CellValue::Bool(*flag),
            Value::String(text) => match coerce_bool(text) {
                Some(flag) => CellValue::Bool(flag),
                None => CellValue::Null,
            },
            _ => CellValue::Null,
        },
        SqlType::Varchar => match value {
            Value::String(text) => CellValue::Text(text.clone()),
            Value::Bool(flag) => CellValue::Text(flag.to_string()),
            Value::Number(number) => CellValue::Text(number.to_string()),
            other => CellValue::Text(other.to_string()),
        },
        SqlType::Timestamp => match value.as_str() {
            Some(text) => match DateTime::parse_from_rfc3339(text) {
                Ok(parsed) => CellValue::Timestamp(parsed.naive_utc()),
                Err(_) => CellValue::Null,
            },
            None => CellValue::Null,
        },
    }
}
