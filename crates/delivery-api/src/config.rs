//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use delivery::DeliveryConfig;

/// Delivery API server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    /// SQLite database URL.
    pub database_url: String,
    /// Transport timing (poll and stream cadence, wait bounds).
    pub delivery: DeliveryConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `PARLEY_ADDR` | Server bind address | `127.0.0.1:8780` |
    /// | `SQLITE_PATH` | SQLite database URL | `sqlite:parley.db?mode=rwc` |
    /// | `PARLEY_POLL_INTERVAL_SECS` | Pause between long-poll queries | `2` |
    /// | `PARLEY_POLL_MAX_WAIT_SECS` | Long-poll bound before an empty reply | `30` |
    /// | `PARLEY_STREAM_INTERVAL_SECS` | Pause between stream queries | `1` |
    /// | `PARLEY_HEARTBEAT_SECS` | Stream heartbeat cadence | `15` |
    /// | `PARLEY_STREAM_LIFETIME_SECS` | Stream connection cap | `300` |
    pub fn from_env() -> Result<Self, ConfigError> {
        let addr = env::var("PARLEY_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8780".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddr)?;

        let database_url = env::var("SQLITE_PATH")
            .unwrap_or_else(|_| "sqlite:parley.db?mode=rwc".to_string());

        let delivery = DeliveryConfig::default()
            .with_poll_interval(env_secs("PARLEY_POLL_INTERVAL_SECS", 2)?)
            .with_max_wait(env_secs("PARLEY_POLL_MAX_WAIT_SECS", 30)?)
            .with_stream_interval(env_secs("PARLEY_STREAM_INTERVAL_SECS", 1)?)
            .with_heartbeat_interval(env_secs("PARLEY_HEARTBEAT_SECS", 15)?)
            .with_max_stream_lifetime(env_secs("PARLEY_STREAM_LIFETIME_SECS", 300)?);

        Ok(Self {
            addr,
            database_url,
            delivery,
        })
    }
}

fn env_secs(name: &'static str, default: u64) -> Result<Duration, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map(Duration::from_secs)
            .map_err(|_| ConfigError::InvalidDuration(name)),
        Err(_) => Ok(Duration::from_secs(default)),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid PARLEY_ADDR format")]
    InvalidAddr,

    #[error("{0} must be a whole number of seconds")]
    InvalidDuration(&'static str),
}
