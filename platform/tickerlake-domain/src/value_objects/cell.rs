use chrono::NaiveDateTime;

/// A single mapped value, aligned with one target-schema column. Timestamps
/// are naive UTC, matching the warehouse's zone-less timestamp columns.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Text(String),
    Bool(bool),
    Timestamp(NaiveDateTime),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}
