use crate::value_objects::ticker::TickerRecord;
use chrono::NaiveDate;
use serde::Serialize;

/// What one paginated fetch produced. `abort` carries the reason pagination
/// stopped early (malformed JSON, API error status); records accumulated
/// before the abort are kept and still flow to the writer.
#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    pub tickers: Vec<TickerRecord>,
    pub pages: u64,
    pub abort: Option<String>,
}

/// Outcome of one sync run, returned to the scheduler instead of letting
/// failures propagate implicitly. Warehouse and transport failures surface
/// as `Err` from the job; a fetch abort with partial rows is still `Ok`.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub load_date: NaiveDate,
    pub pages_fetched: u64,
    pub tickers_fetched: usize,
    pub rows_written: u64,
    pub fetch_abort: Option<String>,
}
