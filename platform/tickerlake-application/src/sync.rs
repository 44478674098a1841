use chrono::NaiveDate;
use tickerlake_domain::repositories::ticker_source::TickerSource;
use tickerlake_domain::repositories::warehouse::TickerWarehouse;
use tickerlake_domain::services::mapper::map_batch;
use tickerlake_domain::services::schema::TargetSchema;
use tickerlake_domain::value_objects::sync_report::SyncReport;

/// One fetch-map-write pass. A fetch abort still writes whatever was
/// accumulated before it; transport and warehouse errors come back as `Err`
/// and the run writes nothing. The caller owns logging the outcome and
/// deciding when to run again.
pub async fn run_sync<S, W>(
    source: &S,
    warehouse: &W,
    schema: &TargetSchema,
    load_date: NaiveDate,
) -> Result<SyncReport, String>
where
    S: TickerSource + Sync,
    W: TickerWarehouse + Sync,
{
    let outcome = source.fetch_all().await?;
    if let Some(reason) = &outcome.abort {
        tracing::warn!(
            error = %reason,
            tickers = outcome.tickers.len(),
            "fetch aborted; writing what was accumulated"
        );
    }

    let batch = map_batch(&outcome.tickers, schema, load_date);
    let rows_written = warehouse.write_batch(schema, &batch).await?;
    tracing::info!(rows = rows_written, load_date = %load_date, "load batch written");

    Ok(SyncReport {
        load_date,
        pages_fetched: outcome.pages,
        tickers_fetched: outcome.tickers.len(),
        rows_written,
        fetch_abort: outcome.abort,
    })
}
