// Relay configuration
// Every value can be overridden from the environment; unparseable values fall back to defaults

use std::env;
use std::time::Duration;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 6400;
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 1000;
pub const DEFAULT_IO_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_MAX_RETRIES: u32 = 5;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 250;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;
pub const DEFAULT_API_ADDR: &str = "0.0.0.0:3000";

pub const ENV_HOST: &str = "TESTRELAY_HOST";
pub const ENV_PORT: &str = "TESTRELAY_PORT";
pub const ENV_CONNECT_TIMEOUT_MS: &str = "TESTRELAY_CONNECT_TIMEOUT_MS";
pub const ENV_IO_TIMEOUT_MS: &str = "TESTRELAY_IO_TIMEOUT_MS";
pub const ENV_MAX_RETRIES: &str = "TESTRELAY_MAX_RETRIES";
pub const ENV_RETRY_DELAY_MS: &str = "TESTRELAY_RETRY_DELAY_MS";
pub const ENV_POLL_INTERVAL_MS: &str = "TESTRELAY_POLL_INTERVAL_MS";
pub const ENV_API_ADDR: &str = "TESTRELAY_API_ADDR";
pub const ENV_LOG_FORMAT: &str = "TESTRELAY_LOG_FORMAT";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Test host address
    pub host: String,
    pub port: u16,
    pub connect_timeout: Duration,
    /// Bound on a single request/response exchange
    pub io_timeout: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
    /// Cadence of status polls during a run
    pub poll_interval: Duration,
    pub api_addr: String,
    pub log_format: LogFormat,
}

impl Config {
    pub fn defaults() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            io_timeout: Duration::from_millis(DEFAULT_IO_TIMEOUT_MS),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            api_addr: DEFAULT_API_ADDR.to_string(),
            log_format: LogFormat::Text,
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment in production)
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let parsed = |key: &str, default: u64| -> u64 {
            lookup(key)
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(default)
        };

        Self {
            host: lookup(ENV_HOST).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: lookup(ENV_PORT)
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(DEFAULT_PORT),
            connect_timeout: Duration::from_millis(parsed(
                ENV_CONNECT_TIMEOUT_MS,
                DEFAULT_CONNECT_TIMEOUT_MS,
            )),
            io_timeout: Duration::from_millis(parsed(ENV_IO_TIMEOUT_MS, DEFAULT_IO_TIMEOUT_MS)),
            max_retries: lookup(ENV_MAX_RETRIES)
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(DEFAULT_MAX_RETRIES),
            retry_delay: Duration::from_millis(parsed(ENV_RETRY_DELAY_MS, DEFAULT_RETRY_DELAY_MS)),
            poll_interval: Duration::from_millis(parsed(
                ENV_POLL_INTERVAL_MS,
                DEFAULT_POLL_INTERVAL_MS,
            )),
            api_addr: lookup(ENV_API_ADDR).unwrap_or_else(|| DEFAULT_API_ADDR.to_string()),
            log_format: match lookup(ENV_LOG_FORMAT).as_deref().map(str::trim) {
                Some(f) if f.eq_ignore_ascii_case("json") => LogFormat::Json,
                _ => LogFormat::Text,
            },
        }
    }

    /// `host:port` of the test host
    pub fn host_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::defaults()
    }
}
