use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

pub const HTTP_ADDR_VAR: &str = "SITE_SCHEDULE_HTTP_ADDR";
pub const DB_PATH_VAR: &str = "SITE_SCHEDULE_DB";
pub const LOG_JSON_VAR: &str = "SITE_SCHEDULE_LOG_JSON";

const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} is not a valid socket address: '{value}'")]
    InvalidAddr { var: &'static str, value: String },
    #[error("{var} must be true or false, got '{value}'")]
    InvalidBool { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub http_addr: SocketAddr,
    /// SQLite database file; the in-memory backend is used when unset.
    pub db_path: Option<PathBuf>,
    pub log_json: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds the config from any variable source, e.g. a map in tests.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let addr = lookup(HTTP_ADDR_VAR).unwrap_or_else(|| DEFAULT_HTTP_ADDR.to_string());
        let http_addr = addr.parse().map_err(|_| ConfigError::InvalidAddr {
            var: HTTP_ADDR_VAR,
            value: addr.clone(),
        })?;
        let db_path = lookup(DB_PATH_VAR)
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);
        let log_json = match lookup(LOG_JSON_VAR) {
            None => false,
            Some(value) => parse_bool(LOG_JSON_VAR, &value)?,
        };
        Ok(Self {
            http_addr,
            db_path,
            log_json,
        })
    }
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" | "" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            var,
            value: value.to_string(),
        }),
    }
}

/// Installs the global `tracing` subscriber writing to stderr. `RUST_LOG`
/// overrides `default_directive`.
pub fn init_tracing(log_json: bool, default_directive: &str) {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    let registry = tracing_subscriber::registry().with(filter);
    let result = if log_json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
    if let Err(err) = result {
        eprintln!("tracing subscriber already installed: {err}");
    }
}
