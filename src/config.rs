use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use tracing::{info, trace};

use crate::util;

/// Which record store to open
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// In-memory storage (no persistence)
    None,

    /// SQLite database (default)
    #[default]
    Sqlite,
}

/// Storage backend configuration
#[derive(Debug, Clone, serde::Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageKind,

    /// Path to the SQLite database file
    #[serde(default = "default_sqlite_path")]
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageKind::default(),
            path: default_sqlite_path(),
        }
    }
}

fn default_sqlite_path() -> PathBuf {
    PathBuf::from("./monitor.db")
}

/// Monitor scheduler loop settings
#[derive(Debug, Clone, serde::Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Upper bound for a single HTTP probe
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            probe_timeout_secs: default_probe_timeout(),
        }
    }
}

/// Schedule propagator settings
#[derive(Debug, Clone, serde::Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Also delete entries that no longer pass the join
    #[serde(default)]
    pub prune_disqualified: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            prune_disqualified: false,
        }
    }
}

/// HTTP facade settings
#[derive(Debug, Clone, serde::Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,

    #[serde(default = "default_enable_cors")]
    pub enable_cors: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            enable_cors: default_enable_cors(),
        }
    }
}

fn default_interval() -> u64 {
    60
}

fn default_probe_timeout() -> u64 {
    5
}

fn default_bind() -> SocketAddr {
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 8080))
}

fn default_enable_cors() -> bool {
    true
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// HTTP facade (disabled when absent)
    pub api: Option<ApiConfig>,
}

impl Config {
    /// Apply `SCHEDULE_DB_PATH` and `SCHEDULE_API_ADDR`
    pub fn apply_env_overrides(&mut self) {
        if let Some(path) = util::get_db_path() {
            trace!("database path overridden from environment: {}", path.display());
            self.storage.path = path;
        }

        if let Some(addr) = util::get_api_addr() {
            trace!("api address overridden from environment: {addr}");
            self.api.get_or_insert_with(ApiConfig::default).bind = addr;
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.scheduler.interval_secs == 0 {
            bail!("scheduler.interval_secs must be at least 1");
        }
        if self.scheduler.probe_timeout_secs == 0 {
            bail!("scheduler.probe_timeout_secs must be at least 1");
        }
        if self.schedule.interval_secs == 0 {
            bail!("schedule.interval_secs must be at least 1");
        }
        Ok(())
    }

    pub fn scheduler_interval(&self) -> Duration {
        Duration::from_secs(self.scheduler.interval_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.scheduler.probe_timeout_secs)
    }

    pub fn propagation_interval(&self) -> Duration {
        Duration::from_secs(self.schedule.interval_secs)
    }
}

pub fn read_config_file(path: impl AsRef<Path>) -> anyhow::Result<Config> {
    let path = path.as_ref();
    let file_content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    serde_json::from_str(&file_content)
        .map_err(|e| anyhow::anyhow!("Invalid configuration file provided: {e}"))
        .inspect(|config| trace!("loaded config: {config:?}"))
}

/// Read the config file if it exists, then apply environment overrides
pub fn load_config(path: impl AsRef<Path>) -> anyhow::Result<Config> {
    let path = path.as_ref();

    let mut config = if path.exists() {
        read_config_file(path)?
    } else {
        info!("no config file at {}, using defaults", path.display());
        Config::default()
    };

    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}
