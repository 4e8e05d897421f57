//! Compiler collaborator
//!
//! The verifier only sees compilers through two traits: a [`CompilerLoader`]
//! that resolves a version label to a [`CompilerHandle`], and the handle that
//! turns a source mapping into an artifact map. [`CompilerCache`] memoizes
//! handles; [`SolcLoader`] is the native `solc` implementation.

pub mod cache;
pub mod solc;

pub use cache::{CacheStats, CompilerCache, DEFAULT_CACHE_CAPACITY};
pub use solc::{SolcHandle, SolcLoader};

use crate::error::{VerifyError, VerifyResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Source file name to source text, compiled together in one invocation
pub type SourceMap = BTreeMap<String, String>;

/// Compiler output keyed by `"<filename>:<contractName>"`
pub type ArtifactMap = BTreeMap<String, CompiledContract>;

/// Per-contract compiler output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledContract {
    /// Runtime bytecode as hex, without `0x` prefix
    pub runtime_bytecode: String,
}

impl CompiledContract {
    pub fn new(runtime_bytecode: impl Into<String>) -> Self {
        Self {
            runtime_bytecode: runtime_bytecode.into(),
        }
    }
}

/// Build the artifact map key for a contract
pub fn artifact_key(contract_filename: &str, contract_name: &str) -> String {
    format!("{}:{}", contract_filename, contract_name)
}

/// Look up a contract in an artifact map
pub fn find_contract<'a>(
    artifacts: &'a ArtifactMap,
    contract_filename: &str,
    contract_name: &str,
) -> VerifyResult<&'a CompiledContract> {
    let key = artifact_key(contract_filename, contract_name);
    artifacts.get(&key).ok_or(VerifyError::ContractNotFound(key))
}

/// Version-bound compiler capability
#[async_trait]
pub trait CompilerHandle: Send + Sync {
    /// Version label this handle was loaded for
    fn version(&self) -> &str;

    /// Compile all `sources` together
    async fn compile(&self, sources: &SourceMap, optimize: bool) -> VerifyResult<ArtifactMap>;
}

/// Resolves version labels to compiler handles
#[async_trait]
pub trait CompilerLoader: Send + Sync {
    /// Load the compiler for `version`, failing with `CompilerLoadError`
    async fn load(&self, version: &str) -> VerifyResult<Arc<dyn CompilerHandle>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_contract() {
        let mut artifacts = ArtifactMap::new();
        artifacts.insert(artifact_key("A.sol", "A"), CompiledContract::new("6080"));

        assert_eq!(
            find_contract(&artifacts, "A.sol", "A").unwrap().runtime_bytecode,
            "6080"
        );
        assert_eq!(
            find_contract(&artifacts, "A.sol", "B"),
            Err(VerifyError::ContractNotFound("A.sol:B".to_string()))
        );
    }
}
