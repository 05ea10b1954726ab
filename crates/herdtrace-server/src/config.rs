//! Environment-driven server configuration.

use std::{env, fmt::Display, str::FromStr};

use tracing::{info, warn};

/// Runtime settings, all overridable through `HERDTRACE_*` variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Socket address the listener binds to
    pub addr: String,
    /// SQLite database path
    pub db_path: String,
    /// Seconds between background sweep runs
    pub sweep_secs: u64,
    /// Exact CORS origin; unset means any origin is allowed
    pub cors_origin: Option<String>,
}

impl Config {
    pub fn load() -> Self {
        Self {
            addr: load_or("HERDTRACE_ADDR", "0.0.0.0:8080"),
            db_path: load_or("HERDTRACE_DB", "herdtrace.db"),
            sweep_secs: try_load("HERDTRACE_SWEEP_SECS", 3600),
            cors_origin: env::var("HERDTRACE_CORS_ORIGIN").ok(),
        }
    }
}

fn load_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    })
}

fn try_load<T: FromStr + Display>(key: &str, default: T) -> T
where
    T::Err: Display,
{
    let raw = match env::var(key) {
        Ok(raw) => raw,
        Err(_) => {
            info!("{key} not set, using default: {default}");
            return default;
        }
    };
    match raw.parse() {
        Ok(value) => value,
        Err(e) => {
            warn!("Invalid {key} value {raw:?}: {e}, using default: {default}");
            default
        }
    }
}
