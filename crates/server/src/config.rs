//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `ARROWHEAD_HOST` - Bind address (default: 127.0.0.1)
//! - `ARROWHEAD_PORT` - Listen port (default: 3002)
//! - `ARROWHEAD_REMOVE_CONFIRM_MS` - Confirm-to-remove window in milliseconds (default: 2000)
//! - `ARROWHEAD_SESSION_IDLE_SECS` - Seconds without a pick before a session is
//!   released automatically (default: 900)
//! - `ARROWHEAD_SEED_FILE` - JSON array of raw order records loaded at startup
//! - `LOG_FORMAT` - `json` for structured logs, anything else for text
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Traces sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

const DEFAULT_REMOVE_CONFIRM_MS: u64 = 2000;
const DEFAULT_SESSION_IDLE_SECS: u64 = 900;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// How long a first remove click stays armed
    pub remove_confirm_window: Duration,
    /// How long a picking session may go without an add or remove
    pub session_idle_timeout: Duration,
    /// Raw order records to load into the store at startup
    pub seed_file: Option<PathBuf>,
    pub log_format: LogFormat,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3002,
            remove_confirm_window: Duration::from_millis(DEFAULT_REMOVE_CONFIRM_MS),
            session_idle_timeout: Duration::from_secs(DEFAULT_SESSION_IDLE_SECS),
            seed_file: None,
            log_format: LogFormat::Text,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("ARROWHEAD_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("ARROWHEAD_HOST".to_string(), e.to_string()))?;

        let port = get_env_or_default("ARROWHEAD_PORT", "3002")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("ARROWHEAD_PORT".to_string(), e.to_string()))?;

        let remove_confirm_ms = get_optional_env("ARROWHEAD_REMOVE_CONFIRM_MS")
            .map(|raw| parse_positive("ARROWHEAD_REMOVE_CONFIRM_MS", &raw))
            .transpose()?
            .unwrap_or(DEFAULT_REMOVE_CONFIRM_MS);

        let session_idle_secs = get_optional_env("ARROWHEAD_SESSION_IDLE_SECS")
            .map(|raw| parse_positive("ARROWHEAD_SESSION_IDLE_SECS", &raw))
            .transpose()?
            .unwrap_or(DEFAULT_SESSION_IDLE_SECS);

        let seed_file = get_optional_env("ARROWHEAD_SEED_FILE").map(PathBuf::from);

        let log_format = match get_optional_env("LOG_FORMAT") {
            Some(format) if format.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.0);

        Ok(Self {
            host,
            port,
            remove_confirm_window: Duration::from_millis(remove_confirm_ms),
            session_idle_timeout: Duration::from_secs(session_idle_secs),
            seed_file,
            log_format,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Parse a whole number that must be greater than zero.
fn parse_positive(key: &str, raw: &str) -> Result<u64, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEnvVar(key.to_string(), reason);
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(invalid("must be greater than zero".to_string())),
        Ok(value) => Ok(value),
        Err(e) => Err(invalid(e.to_string())),
    }
}

/// Get an optional environment variable. Blank values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}
