//! Startup configuration, read once from flags or the environment.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use reqwest::Url;
use tracing::Level;

use crate::constants::{AWDB_API_BASE, DEFAULT_TIMEOUT_SECS};

/// MCP server exposing USDA SNOTEL snowpack telemetry
#[derive(Parser, Debug, Clone)]
#[command(name = "snotel-mcp-server", version)]
pub struct Args {
    /// Base URL of the AWDB REST API
    #[arg(long, env = "SNOTEL_API_BASE", default_value = AWDB_API_BASE)]
    pub api_base: String,

    /// Upstream request timeout in seconds
    #[arg(long, env = "SNOTEL_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Log level used when RUST_LOG is not set (error, warning, info, debug, trace)
    #[arg(long, env = "LOGLEVEL", default_value = "warn")]
    pub log_level: String,
}

/// Immutable configuration handed to the API client.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base: String,
    pub timeout: Duration,
    pub log_level: Level,
}

impl Config {
    pub fn from_args(args: &Args) -> Result<Self> {
        let api_base = args.api_base.trim().trim_end_matches('/').to_string();
        let url = Url::parse(&api_base)
            .with_context(|| format!("Invalid AWDB API base URL: {}", args.api_base))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("AWDB API base URL must use http or https: {}", args.api_base);
        }
        if args.timeout_secs == 0 {
            bail!("Request timeout must be greater than zero seconds");
        }

        Ok(Self {
            api_base,
            timeout: Duration::from_secs(args.timeout_secs),
            log_level: parse_log_level(&args.log_level)?,
        })
    }
}

/// Accepts tracing level names and the Python-style `WARNING`/`CRITICAL`.
pub fn parse_log_level(value: &str) -> Result<Level> {
    let name = value.trim().to_ascii_lowercase();
    let name = match name.as_str() {
        "warning" => "warn",
        "critical" | "fatal" => "error",
        other => other,
    };
    match name {
        "error" => Ok(Level::ERROR),
        "warn" => Ok(Level::WARN),
        "info" => Ok(Level::INFO),
        "debug" => Ok(Level::DEBUG),
        "trace" => Ok(Level::TRACE),
        _ => bail!("Unknown log level: {}", value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(api_base: &str, timeout_secs: u64) -> Args {
        Args {
            api_base: api_base.to_string(),
            timeout_secs,
            log_level: "warn".to_string(),
        }
    }

    #[test]
    fn test_defaults_parse() {
        let parsed = Args::try_parse_from(["snotel-mcp-server"]).unwrap();
        let config = Config::from_args(&parsed).unwrap();
        assert_eq!(config.api_base, AWDB_API_BASE);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.log_level, Level::WARN);
    }

    #[test]
    fn test_log_level_names() {
        assert_eq!(parse_log_level("WARNING").unwrap(), Level::WARN);
        assert_eq!(parse_log_level("warn").unwrap(), Level::WARN);
        assert_eq!(parse_log_level("INFO").unwrap(), Level::INFO);
        assert_eq!(parse_log_level(" Debug ").unwrap(), Level::DEBUG);
        assert_eq!(parse_log_level("CRITICAL").unwrap(), Level::ERROR);
        assert!(parse_log_level("verbose").is_err());
        assert!(parse_log_level("").is_err());
    }

    #[test]
    fn test_unknown_log_level_fails_startup() {
        let mut bad = args(AWDB_API_BASE, 30);
        bad.log_level = "loud".to_string();
        assert!(Config::from_args(&bad).is_err());

        let mut python_style = args(AWDB_API_BASE, 30);
        python_style.log_level = "WARNING".to_string();
        let config = Config::from_args(&python_style).unwrap();
        assert_eq!(config.log_level, Level::WARN);
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let config = Config::from_args(&args("http://localhost:8080/awdb/", 5)).unwrap();
        assert_eq!(config.api_base, "http://localhost:8080/awdb");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_rejects_bad_startup_values() {
        assert!(Config::from_args(&args("not a url", 30)).is_err());
        assert!(Config::from_args(&args("ftp://example.com", 30)).is_err());
        assert!(Config::from_args(&args(AWDB_API_BASE, 0)).is_err());
    }
}
