use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Process-wide configuration, constructed once at startup and passed into
/// the fetcher, writer, and scheduler. An optional TOML file provides the
/// non-secret settings; environment variables overlay it and are the only
/// source for credentials. Missing required values are not validated up
/// front; they surface as connect/fetch failures on the next run.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub warehouse: WarehouseConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    /// Credential for the reference-data API. Usually supplied via
    /// POLYGON_API_KEY rather than the config file.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
    /// Pause between paginated requests, respecting the provider's rate limit.
    #[serde(default = "default_page_delay_secs")]
    pub page_delay_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct WarehouseConfig {
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    /// Warehouse account coordinate, `host` or `host:port`.
    #[serde(default)]
    pub account: String,
    /// Compute-warehouse label; recorded as the connection's application name.
    #[serde(default)]
    pub warehouse: String,
    #[serde(default)]
    pub database: String,
    #[serde(default)]
    pub schema: String,
    #[serde(default = "default_table")]
    pub table: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct ScheduleConfig {
    /// Daily trigger time, "HH:MM", interpreted in UTC.
    #[serde(default = "default_run_at")]
    pub run_at: String,
    #[serde(default = "default_poll_secs")]
    pub poll_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            page_limit: default_page_limit(),
            page_delay_secs: default_page_delay_secs(),
        }
    }
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            user: String::new(),
            password: String::new(),
            account: String::new(),
            warehouse: String::new(),
            database: String::new(),
            schema: String::new(),
            table: default_table(),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            run_at: default_run_at(),
            poll_secs: default_poll_secs(),
        }
    }
}

impl ApiConfig {
    pub fn page_delay(&self) -> Duration {
        Duration::from_secs(self.page_delay_secs)
    }
}

impl ScheduleConfig {
    /// Polling period for the scheduler loop, clamped so it is never coarser
    /// than the minute granularity of the daily trigger.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_secs.clamp(1, 60))
    }
}

impl Config {
    /// Build from environment variables only.
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env();
        config
    }

    /// Parse the TOML file at `path` (when given), then overlay environment
    /// variables on top. With no path, the environment is the sole source.
    pub fn load(path: Option<&Path>) -> Result<Config, String> {
        let Some(path) = path else {
            return Ok(Self::from_env());
        };
        let contents = fs::read_to_string(path)
            .map_err(|err| format!("failed to read config {}: {}", path.display(), err))?;
        let mut config: Config = toml::from_str(&contents)
            .map_err(|err| format!("failed to parse TOML {}: {}", path.display(), err))?;
        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Some(value) = env_string("POLYGON_API_KEY") {
            self.api.api_key = value;
        }
        if let Some(value) = env_string("TICKERLAKE_API_BASE_URL") {
            self.api.base_url = value;
        }
        if let Some(value) = env_string("TICKERLAKE_WH_USER") {
            self.warehouse.user = value;
        }
        if let Some(value) = env_string("TICKERLAKE_WH_PASSWORD") {
            self.warehouse.password = value;
        }
        if let Some(value) = env_string("TICKERLAKE_WH_ACCOUNT") {
            self.warehouse.account = value;
        }
        if let Some(value) = env_string("TICKERLAKE_WH_WAREHOUSE") {
            self.warehouse.warehouse = value;
        }
        if let Some(value) = env_string("TICKERLAKE_WH_DATABASE") {
            self.warehouse.database = value;
        }
        if let Some(value) = env_string("TICKERLAKE_WH_SCHEMA") {
            self.warehouse.schema = value;
        }
        if let Some(value) = env_string("TICKERLAKE_WH_TABLE") {
            self.warehouse.table = value;
        }
        if let Some(value) = env_string("TICKERLAKE_RUN_AT") {
            self.schedule.run_at = value;
        }
        if let Some(value) = env_string("TICKERLAKE_POLL_SECS") {
            match value.parse::<u64>() {
                Ok(secs) => self.schedule.poll_secs = secs,
                Err(_) => tracing::warn!(value = %value, "ignoring non-numeric TICKERLAKE_POLL_SECS"),
            }
        }
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn default_base_url() -> String {
    "https://api.polygon.io".to_string()
}

fn default_page_limit() -> u32 {
    1000
}

fn default_page_delay_secs() -> u64 {
    15
}

fn default_table() -> String {
    "stock_tickers".to_string()
}

fn default_run_at() -> String {
    "09:00".to_string()
}

fn default_poll_secs() -> u64 {
    60
}
