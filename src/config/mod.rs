//! Configuration module for the exercise admin backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Reasons the environment could not be turned into a [`Config`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid TELC_BIND_ADDR format: {0}")]
    BindAddr(#[from] std::net::AddrParseError),
    #[error("Invalid boolean for {name}: {value}")]
    Bool { name: &'static str, value: String },
    #[error("Invalid TELC_LOG_FORMAT (expected pretty or json): {0}")]
    LogFormat(String),
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the SQLite document store
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Human-readable or JSON log lines
    pub log_format: LogFormat,
    /// Seed default users and settings at startup
    pub seed_on_start: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let db_path = env::var("TELC_DB_PATH")
            .unwrap_or_else(|_| "./data/telc.sqlite".to_string())
            .into();

        let bind_addr = env::var("TELC_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()?;

        let log_level = env::var("TELC_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let log_format = match env::var("TELC_LOG_FORMAT").as_deref() {
            Err(_) | Ok("pretty") => LogFormat::Pretty,
            Ok("json") => LogFormat::Json,
            Ok(other) => return Err(ConfigError::LogFormat(other.to_string())),
        };

        let seed_on_start = parse_bool("TELC_SEED_ON_START", true)?;

        Ok(Self {
            db_path,
            bind_addr,
            log_level,
            log_format,
            seed_on_start,
        })
    }
}

fn parse_bool(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    let Ok(value) = env::var(name) else {
        return Ok(default);
    };

    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Bool { name, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Environment variables are process-global; keep all env mutation in one test.
    #[test]
    fn test_config_from_env() {
        env::remove_var("TELC_DB_PATH");
        env::remove_var("TELC_BIND_ADDR");
        env::remove_var("TELC_LOG_LEVEL");
        env::remove_var("TELC_LOG_FORMAT");
        env::remove_var("TELC_SEED_ON_START");

        let config = Config::from_env().unwrap();

        assert_eq!(config.db_path, PathBuf::from("./data/telc.sqlite"));
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.seed_on_start);

        env::set_var("TELC_LOG_FORMAT", "json");
        env::set_var("TELC_SEED_ON_START", "off");
        let config = Config::from_env().unwrap();
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(!config.seed_on_start);

        env::set_var("TELC_SEED_ON_START", "maybe");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Bool { name: "TELC_SEED_ON_START", .. })
        ));

        env::remove_var("TELC_SEED_ON_START");
        env::set_var("TELC_BIND_ADDR", "not-an-address");
        assert!(matches!(Config::from_env(), Err(ConfigError::BindAddr(_))));

        env::remove_var("TELC_BIND_ADDR");
        env::remove_var("TELC_LOG_FORMAT");
    }
}
