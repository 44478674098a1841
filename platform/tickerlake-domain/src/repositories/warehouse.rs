use crate::services::schema::TargetSchema;
use crate::value_objects::load_batch::LoadBatch;
use async_trait::async_trait;

/// Port for appending one run's load batch to the warehouse table.
#[async_trait]
pub trait TickerWarehouse {
    async fn write_batch(&self, schema: &TargetSchema, batch: &LoadBatch) -> Result<u64, String>;
}
