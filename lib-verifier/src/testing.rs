//! Testing utilities for lib-verifier
//!
//! Recording mock collaborators. They capture every call so tests can assert
//! how often the compiler was loaded or the chain was queried.

use crate::chain::Chain;
use crate::compiler::{ArtifactMap, CompiledContract, CompilerHandle, CompilerLoader, SourceMap};
use crate::error::{VerifyError, VerifyResult};
use crate::registry::Registry;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

type CompileLog = Arc<Mutex<Vec<(SourceMap, bool)>>>;

/// Mock compiler loader
///
/// Every loaded handle returns the same configured artifact map.
pub struct MockCompilerLoader {
    artifacts: ArtifactMap,
    fail_on: HashSet<String>,
    delay: Option<Duration>,
    /// Recorded `load` calls, by version label
    pub loads: Arc<Mutex<Vec<String>>>,
    /// Recorded `compile` calls across all handles
    pub compiles: CompileLog,
}

impl MockCompilerLoader {
    pub fn new() -> Self {
        Self {
            artifacts: ArtifactMap::new(),
            fail_on: HashSet::new(),
            delay: None,
            loads: Arc::new(Mutex::new(Vec::new())),
            compiles: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add a contract to the artifact map, keyed `"<file>:<name>"`
    pub fn with_contract(mut self, key: &str, runtime_bytecode: &str) -> Self {
        self.artifacts
            .insert(key.to_string(), CompiledContract::new(runtime_bytecode));
        self
    }

    /// Make `load` for `version` fail with `CompilerLoadError`
    pub fn failing_on(mut self, version: &str) -> Self {
        self.fail_on.insert(version.to_string());
        self
    }

    /// Sleep inside `load` to widen race windows
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub async fn load_calls(&self) -> Vec<String> {
        self.loads.lock().await.clone()
    }

    pub async fn load_count(&self) -> usize {
        self.loads.lock().await.len()
    }

    pub async fn compile_calls(&self) -> Vec<(SourceMap, bool)> {
        self.compiles.lock().await.clone()
    }
}

impl Default for MockCompilerLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompilerLoader for MockCompilerLoader {
    async fn load(&self, version: &str) -> VerifyResult<Arc<dyn CompilerHandle>> {
        self.loads.lock().await.push(version.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_on.contains(version) {
            return Err(VerifyError::CompilerLoadError {
                version: version.to_string(),
                reason: "unknown version".to_string(),
            });
        }

        Ok(Arc::new(MockCompilerHandle {
            version: version.to_string(),
            artifacts: self.artifacts.clone(),
            compiles: Arc::clone(&self.compiles),
        }))
    }
}

/// Handle produced by [`MockCompilerLoader`]
pub struct MockCompilerHandle {
    version: String,
    artifacts: ArtifactMap,
    compiles: CompileLog,
}

#[async_trait]
impl CompilerHandle for MockCompilerHandle {
    fn version(&self) -> &str {
        &self.version
    }

    async fn compile(&self, sources: &SourceMap, optimize: bool) -> VerifyResult<ArtifactMap> {
        self.compiles.lock().await.push((sources.clone(), optimize));
        Ok(self.artifacts.clone())
    }
}

/// Mock chain serving code from an in-memory address map
pub struct MockChain {
    codes: RwLock<HashMap<String, String>>,
    /// Recorded `get_code` calls
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl MockChain {
    pub fn new() -> Self {
        Self {
            codes: RwLock::new(HashMap::new()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub async fn set_code(&self, address: &str, code: &str) {
        self.codes
            .write()
            .await
            .insert(address.to_string(), code.to_string());
    }

    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }
}

impl Default for MockChain {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Chain for MockChain {
    async fn get_code(&self, address: &str) -> VerifyResult<String> {
        self.calls.lock().await.push(address.to_string());
        self.codes
            .read()
            .await
            .get(address)
            .cloned()
            .ok_or_else(|| VerifyError::ChainFetchError {
                address: address.to_string(),
                reason: "no such account in mock chain".to_string(),
            })
    }
}

/// Mock registry returning a fixed raw list, filtered like the real one
pub struct MockRegistry {
    raw: String,
}

impl MockRegistry {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }
}

#[async_trait]
impl Registry for MockRegistry {
    async fn list_versions(&self) -> anyhow::Result<Vec<String>> {
        Ok(crate::registry::filter_release_versions(&self.raw))
    }
}
