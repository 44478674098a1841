use crate::value_objects::sync_report::FetchOutcome;
use async_trait::async_trait;

/// Port for the paginated reference-ticker fetch. Implementations return a
/// partial outcome with an abort reason when pagination stops early, and
/// `Err` only for transport-level failures.
#[async_trait]
pub trait TickerSource {
    async fn fetch_all(&self) -> Result<FetchOutcome, String>;
}
