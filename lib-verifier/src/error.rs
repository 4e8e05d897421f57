//! Error taxonomy for bytecode verification
//!
//! Every failure raised by the core or by one of its collaborators is
//! surfaced to the caller unchanged. A bytecode mismatch is never an error.

use thiserror::Error;

/// Verification result type
pub type VerifyResult<T> = Result<T, VerifyError>;

/// Errors produced while verifying a deployed contract
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    /// Version label does not carry a `v<major>.<minor>.<patch>[+-]` prefix
    #[error("Malformed compiler version string: '{0}'")]
    MalformedVersionString(String),

    /// Compiler could not be resolved, downloaded or initialized
    #[error("Failed to load compiler {version}: {reason}")]
    CompilerLoadError { version: String, reason: String },

    /// Compiler output could not be parsed into an artifact map
    #[error("Compiler output error: {0}")]
    CompileOutputError(String),

    /// Compiler ran and rejected the sources
    #[error("Compilation failed: {}", .0.join("; "))]
    CompilationFailed(Vec<String>),

    /// Requested `<filename>:<contractName>` is not in the artifact map
    #[error("Contract '{0}' not found in compiler output")]
    ContractNotFound(String),

    /// Deployed code could not be fetched from the chain
    #[error("Failed to fetch code for {address}: {reason}")]
    ChainFetchError { address: String, reason: String },

    /// Bytecode is not an even-length hex string
    #[error("Invalid {origin} bytecode: {reason}")]
    InvalidBytecode { origin: String, reason: String },
}

impl VerifyError {
    /// True when the failure originated in an external collaborator
    /// (compiler loader, compiler, chain) rather than in caller input.
    pub fn is_collaborator_failure(&self) -> bool {
        matches!(
            self,
            VerifyError::CompilerLoadError { .. }
                | VerifyError::CompileOutputError(_)
                | VerifyError::ChainFetchError { .. }
        )
    }

    pub(crate) fn load(version: &str, reason: impl std::fmt::Display) -> Self {
        VerifyError::CompilerLoadError {
            version: version.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn chain(address: &str, reason: impl std::fmt::Display) -> Self {
        VerifyError::ChainFetchError {
            address: address.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<serde_json::Error> for VerifyError {
    fn from(err: serde_json::Error) -> Self {
        VerifyError::CompileOutputError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collaborator_classification() {
        assert!(VerifyError::load("v0.4.24", "offline").is_collaborator_failure());
        assert!(VerifyError::chain("0x00", "timeout").is_collaborator_failure());
        assert!(!VerifyError::MalformedVersionString("x".to_string()).is_collaborator_failure());
        assert!(!VerifyError::ContractNotFound("A.sol:A".to_string()).is_collaborator_failure());
    }

    #[test]
    fn test_compilation_failed_message_joins_lines() {
        let err = VerifyError::CompilationFailed(vec![
            "A.sol:1:1: Error one".to_string(),
            "A.sol:2:1: Error two".to_string(),
        ]);
        assert_eq!(
            err.to_string(),
            "Compilation failed: A.sol:1:1: Error one; A.sol:2:1: Error two"
        );
    }
}
