use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use tickerlake::job::run_sync_job;
use tickerlake::scheduler::Scheduler;
use tickerlake_application::config::Config;
use tickerlake_application::schedule::DailySchedule;
use tokio::sync::watch;

#[derive(Parser)]
#[command(name = "tickerlake")]
#[command(about = "Daily stock-ticker reference sync into a SQL warehouse.", version)]
struct Cli {
    /// Config file path (TOML). If omitted, uses env TICKERLAKE_CONFIG or
    /// environment variables only.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one sync immediately and exit.
    Run {
        /// Print the run report as JSON on stdout.
        #[arg(long)]
        json: bool,
    },
    /// Run the daily scheduler loop (default).
    Schedule,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let cli = Cli::parse();
    init_tracing()?;
    init_metrics()?;

    let config_path = cli.config.or_else(|| {
        std::env::var("TICKERLAKE_CONFIG")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
    });
    let config = Config::load(config_path.as_deref())?;

    match cli.command.unwrap_or(Commands::Schedule) {
        Commands::Run { json } => {
            let report = run_sync_job(&config).await?;
            if json {
                let rendered = serde_json::to_string(&report)
                    .map_err(|err| format!("failed to serialize report: {err}"))?;
                println!("{rendered}");
            }
            Ok(())
        }
        Commands::Schedule => {
            let schedule = DailySchedule::parse(&config.schedule.run_at)?;
            let (shutdown_tx, shutdown_rx) = watch::channel(false);
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    let _ = shutdown_tx.send(true);
                }
            });

            Scheduler::new(schedule, config.schedule.poll_interval())
                .run(&config, shutdown_rx)
                .await;
            Ok(())
        }
    }
}

fn init_tracing() -> Result<(), String> {
    let filter = std::env::var("TICKERLAKE_LOG").unwrap_or_else(|_| "info".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_new(filter)
        .map_err(|err| format!("invalid log filter: {err}"))?;

    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    Ok(())
}

#[cfg(feature = "prometheus")]
fn init_metrics() -> Result<Option<SocketAddr>, String> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let Some(raw) = std::env::var("TICKERLAKE_METRICS_ADDR").ok() else {
        return Ok(None);
    };
    if raw.trim().is_empty() {
        return Ok(None);
    }

    let addr: SocketAddr = raw
        .parse()
        .map_err(|err| format!("invalid TICKERLAKE_METRICS_ADDR (expected host:port): {err}"))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|err| format!("failed to install prometheus exporter: {err}"))?;

    tracing::info!(metrics_addr = %addr, "prometheus metrics exporter enabled");
    Ok(Some(addr))
}

#[cfg(not(feature = "prometheus"))]
fn init_metrics() -> Result<Option<SocketAddr>, String> {
    Ok(None)
}
