use chrono::Utc;
use std::time::Instant;
use tickerlake_application::config::{Config, WarehouseConfig};
use tickerlake_application::sync;
use tickerlake_domain::services::schema::TargetSchema;
use tickerlake_domain::value_objects::sync_report::SyncReport;
use tickerlake_infrastructure::market_data::polygon::PolygonClient;
use tickerlake_infrastructure::persistence::postgres_warehouse::{
    PostgresWarehouse, WarehouseTarget,
};

/// Wire the configured adapters into one fetch-map-write pass. The load
/// date is the run's start date, shared by every row in the batch.
pub async fn run_sync_job(config: &Config) -> Result<SyncReport, String> {
    let start = Instant::now();
    let load_date = Utc::now().date_naive();

    let polygon = PolygonClient::new(
        config.api.api_key.clone(),
        config.api.base_url.clone(),
        config.api.page_limit,
        config.api.page_delay(),
    )?;
    let warehouse = PostgresWarehouse::new(warehouse_target(&config.warehouse))?;
    let schema = TargetSchema::reference_tickers();

    let report = sync::run_sync(&polygon, &warehouse, &schema, load_date).await?;

    metrics::histogram!("tickerlake.sync.run_ms").record(start.elapsed().as_secs_f64() * 1000.0);
    println!(
        "Wrote {} rows to {}",
        report.rows_written, config.warehouse.table
    );
    Ok(report)
}

pub fn warehouse_target(config: &WarehouseConfig) -> WarehouseTarget {
    WarehouseTarget {
        user: config.user.clone(),
        password: config.password.clone(),
        account: config.account.clone(),
        warehouse: config.warehouse.clone(),
        database: config.database.clone(),
        schema: config.schema.clone(),
        table: config.table.clone(),
    }
}
