//! CLI configuration loader and runtime settings
//!
//! Precedence, highest first: command-line flag or environment variable,
//! config file, built-in default.

use crate::error::{CliError, CliResult};
use crate::logic;
use lib_verifier::{DEFAULT_CACHE_CAPACITY, DEFAULT_RPC_URL, DEFAULT_SOLC_BIN_URL, DEFAULT_VERSION_LIST_URL};
use serde::{Deserialize, Serialize};
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config directory under the home directory
pub const DEFAULT_CONFIG_DIR: &str = ".verifier";
/// Default config filename under ~/.verifier/
pub const DEFAULT_CONFIG_FILENAME: &str = "config.toml";
/// Default location of downloaded compilers
pub const DEFAULT_COMPILER_DIR: &str = "~/.verifier/compilers";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Contents of the TOML config file; every key is optional
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct VerifierConfig {
    pub rpc_url: Option<String>,
    pub solc_bin_url: Option<String>,
    pub version_list_url: Option<String>,
    pub compiler_dir: Option<String>,
    pub compiler_cache_capacity: Option<usize>,
    pub http_timeout_secs: Option<u64>,
}

/// Values supplied on the command line or through the environment
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub rpc_url: Option<String>,
    pub solc_bin_url: Option<String>,
    pub version_list_url: Option<String>,
    pub compiler_dir: Option<String>,
}

/// Fully resolved and validated settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeSettings {
    pub rpc_url: String,
    pub solc_bin_url: String,
    pub version_list_url: String,
    pub compiler_dir: PathBuf,
    pub compiler_cache_capacity: NonZeroUsize,
    pub http_timeout: Duration,
}

pub fn default_config_path() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home.join(DEFAULT_CONFIG_DIR).join(DEFAULT_CONFIG_FILENAME),
        None => PathBuf::from("./verifier.toml"),
    }
}

/// Load the config file.
///
/// A missing default file yields an empty config; a missing file that was
/// named explicitly is an error.
pub fn load_config(path: Option<&str>) -> CliResult<VerifierConfig> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(default_config_path);

    if !config_path.exists() {
        if path.is_some() {
            return Err(CliError::ConfigError(format!(
                "Configuration file not found: {}",
                config_path.display()
            )));
        }
        return Ok(VerifierConfig::default());
    }

    read_config(&config_path)
}

pub fn read_config(path: &Path) -> CliResult<VerifierConfig> {
    let raw = fs::read_to_string(path)
        .map_err(|e| CliError::ConfigError(format!("Failed to read {}: {}", path.display(), e)))?;
    parse_config(&raw)
}

pub fn parse_config(raw: &str) -> CliResult<VerifierConfig> {
    Ok(toml::from_str(raw)?)
}

/// Merge overrides, config file and defaults, then validate.
pub fn resolve_settings(
    config: &VerifierConfig,
    overrides: &ConfigOverrides,
) -> CliResult<RuntimeSettings> {
    let pick = |flag: &Option<String>, file: &Option<String>, default: &str| {
        flag.clone()
            .or_else(|| file.clone())
            .unwrap_or_else(|| default.to_string())
    };

    let rpc_url = pick(&overrides.rpc_url, &config.rpc_url, DEFAULT_RPC_URL);
    let solc_bin_url = pick(&overrides.solc_bin_url, &config.solc_bin_url, DEFAULT_SOLC_BIN_URL);
    let version_list_url = pick(
        &overrides.version_list_url,
        &config.version_list_url,
        DEFAULT_VERSION_LIST_URL,
    );
    let compiler_dir = pick(&overrides.compiler_dir, &config.compiler_dir, DEFAULT_COMPILER_DIR);

    logic::validate_url("rpc_url", &rpc_url)?;
    logic::validate_url("solc_bin_url", &solc_bin_url)?;
    logic::validate_url("version_list_url", &version_list_url)?;

    Ok(RuntimeSettings {
        rpc_url,
        solc_bin_url,
        version_list_url,
        compiler_dir: logic::expand_home_directory(&compiler_dir)?,
        compiler_cache_capacity: logic::validate_cache_capacity(
            config.compiler_cache_capacity.unwrap_or(DEFAULT_CACHE_CAPACITY),
        )?,
        http_timeout: logic::validate_timeout_secs(
            config.http_timeout_secs.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
        )?,
    })
}
