use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One instrument's reference metadata exactly as returned by the market-data
/// API. The upstream field set is not under our control, so the record keeps
/// the raw JSON object and exposes name-based lookup; the target schema
/// decides which fields matter.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TickerRecord(pub Map<String, Value>);

impl TickerRecord {
    /// Look up a raw field by name. JSON null and absent fields are both
    /// treated as missing.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.0.get(name).filter(|value| !value.is_null())
    }

    pub fn symbol(&self) -> Option<&str> {
        self.field("ticker").and_then(Value::as_str)
    }
}
