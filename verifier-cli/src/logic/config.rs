//! Pure configuration validation

use crate::error::{CliError, CliResult};
use std::num::NonZeroUsize;
use std::time::Duration;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Table,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Table => "table",
        }
    }

    pub fn parse(s: &str) -> CliResult<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "table" => Ok(OutputFormat::Table),
            other => Err(CliError::InvalidConfiguration(format!(
                "Unknown output format: '{}'. Supported: json, table",
                other
            ))),
        }
    }
}

/// Endpoints must be absolute http(s) URLs
pub fn validate_url(name: &str, url: &str) -> CliResult<()> {
    let has_scheme = url.starts_with("http://") || url.starts_with("https://");
    let has_host = url
        .split_once("://")
        .map(|(_, rest)| !rest.is_empty())
        .unwrap_or(false);
    if has_scheme && has_host {
        Ok(())
    } else {
        Err(CliError::InvalidConfiguration(format!(
            "{} must be an http:// or https:// URL, got '{}'",
            name, url
        )))
    }
}

pub fn validate_cache_capacity(capacity: usize) -> CliResult<NonZeroUsize> {
    NonZeroUsize::new(capacity).ok_or_else(|| {
        CliError::InvalidConfiguration("compiler_cache_capacity must be at least 1".to_string())
    })
}

pub fn validate_timeout_secs(secs: u64) -> CliResult<Duration> {
    if secs == 0 {
        return Err(CliError::InvalidConfiguration(
            "http_timeout_secs must be at least 1".to_string(),
        ));
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format() {
        assert_eq!(OutputFormat::parse("JSON").unwrap(), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("table").unwrap(), OutputFormat::Table);
        assert!(OutputFormat::parse("yaml").is_err());
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("rpc_url", "http://127.0.0.1:8545").is_ok());
        assert!(validate_url("rpc_url", "https://mainnet.example.org/v3/key").is_ok());
        assert!(validate_url("rpc_url", "127.0.0.1:8545").is_err());
        assert!(validate_url("rpc_url", "https://").is_err());
        assert!(validate_url("rpc_url", "ws://127.0.0.1:8546").is_err());
    }

    #[test]
    fn test_numeric_limits() {
        assert!(validate_cache_capacity(0).is_err());
        assert_eq!(validate_cache_capacity(4).unwrap().get(), 4);
        assert!(validate_timeout_secs(0).is_err());
        assert_eq!(validate_timeout_secs(30).unwrap(), Duration::from_secs(30));
    }
}
