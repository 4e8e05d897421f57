//! Structured error types for the verifier CLI

use lib_verifier::VerifyError;
use thiserror::Error;

/// CLI error types with context
#[derive(Error, Debug)]
pub enum CliError {
    // Verification
    #[error(transparent)]
    Verification(#[from] VerifyError),

    #[error("Contract {contract} at {address} does not match the supplied sources")]
    NotVerified { contract: String, address: String },

    // Sources
    #[error("Source error: {0}")]
    SourceError(String),

    #[error("Failed to read source '{path}': {reason}")]
    SourceReadFailed { path: String, reason: String },

    // Registry
    #[error("Registry error: {0}")]
    RegistryError(String),

    // Configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Home directory not found")]
    HomeDirectoryNotFound,

    // I/O operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    // Serialization
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    // Generic
    #[error("{0}")]
    Other(String),
}

impl From<String> for CliError {
    fn from(s: String) -> Self {
        CliError::Other(s)
    }
}

impl From<&str> for CliError {
    fn from(s: &str) -> Self {
        CliError::Other(s.to_string())
    }
}

impl From<toml::de::Error> for CliError {
    fn from(err: toml::de::Error) -> Self {
        CliError::ConfigError(format!("Invalid config file: {}", err))
    }
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
