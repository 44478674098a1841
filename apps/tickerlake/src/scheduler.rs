use crate::job::run_sync_job;
use chrono::Utc;
use std::time::Duration;
use tickerlake_application::config::Config;
use tickerlake_application::schedule::DailySchedule;
use tokio::sync::watch;

/// Drives the daily schedule: polls at a coarse interval, runs the sync job
/// to completion on the same task when the trigger fires, and keeps looping
/// whatever the job's outcome. Triggers that pass while the process is down
/// are skipped; the next run is always computed from the post-run clock, so
/// a single day never fires twice.
pub struct Scheduler {
    schedule: DailySchedule,
    poll: Duration,
}

impl Scheduler {
    pub fn new(schedule: DailySchedule, poll: Duration) -> Self {
        Self { schedule, poll }
    }

    pub async fn run(&self, config: &Config, mut shutdown: watch::Receiver<bool>) {
        let mut next_run = self.schedule.next_run_after(Utc::now());
        println!(
            "Scheduler started. Stock tickers will sync daily at {} UTC",
            self.schedule
        );
        tracing::info!(
            next_run = %next_run,
            poll_secs = self.poll.as_secs(),
            "scheduler started"
        );

        let mut interval = tokio::time::interval(self.poll);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if Utc::now() >= next_run {
                        self.run_once(config).await;
                        next_run = self.schedule.next_run_after(Utc::now());
                        tracing::info!(next_run = %next_run, "next sync scheduled");
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        tracing::info!("scheduler shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// Job failures are logged with a timestamp and never terminate the loop.
    async fn run_once(&self, config: &Config) {
        println!("Stock ticker sync started at {}", Utc::now());
        metrics::counter!("tickerlake.sync.runs_total").increment(1);

        match run_sync_job(config).await {
            Ok(report) => {
                println!(
                    "Stock ticker sync completed at {}: {} rows",
                    Utc::now(),
                    report.rows_written
                );
                tracing::info!(
                    rows = report.rows_written,
                    pages = report.pages_fetched,
                    tickers = report.tickers_fetched,
                    fetch_abort = report.fetch_abort.as_deref().unwrap_or(""),
                    "sync completed"
                );
                metrics::counter!("tickerlake.sync.results_total", "result" => "ok").increment(1);
            }
            Err(err) => {
                println!("Stock ticker sync failed at {}: {err}", Utc::now());
                tracing::error!(error = %err, "sync failed");
                metrics::counter!("tickerlake.sync.results_total", "result" => "err").increment(1);
            }
        }
    }
}
