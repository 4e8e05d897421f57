//! Verification pipeline
//!
//! load compiler -> compile sources | fetch deployed code -> normalize both -> compare
//!
//! Compilation and the chain fetch do not depend on each other and run
//! concurrently. Any collaborator failure is returned unchanged; a mismatch is
//! `Ok(false)`.

use crate::bytecode::{Bytecode, BytecodeOrigin};
use crate::chain::Chain;
use crate::compiler::{artifact_key, find_contract, CacheStats, CompilerCache, SourceMap};
use crate::error::VerifyResult;
use crate::normalizer::{BytecodeNormalizer, NormalizedBytecode};
use crate::version::{parse_version, SemanticVersion};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// The optimizer setting used for every compilation
pub const OPTIMIZE: bool = true;

/// Everything needed to verify one deployed contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationRequest {
    pub sources: SourceMap,
    pub compiler_version: String,
    pub contract_name: String,
    pub contract_filename: String,
    pub address: String,
}

/// What was compared on one side of the check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionSummary {
    /// Size of the full bytecode in bytes
    pub total_bytes: usize,
    /// Length of the compared region in hex characters
    pub region_len: usize,
    pub start_marker_found: bool,
    pub end_marker_found: bool,
}

impl RegionSummary {
    fn new(code: &Bytecode, normalized: &NormalizedBytecode) -> Self {
        Self {
            total_bytes: code.byte_len(),
            region_len: normalized.region.len(),
            start_marker_found: normalized.start_marker_found,
            end_marker_found: normalized.end_marker_found,
        }
    }
}

/// Detailed verification outcome
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationReport {
    pub verified: bool,
    pub address: String,
    /// `<filename>:<contractName>`
    pub contract: String,
    pub compiler_version: String,
    pub semantic_version: SemanticVersion,
    /// Normalization policy applied, `None` for unsupported compiler eras
    pub policy: Option<String>,
    pub compiled: RegionSummary,
    pub deployed: RegionSummary,
    pub cache: CacheStats,
}

/// Verifies deployed bytecode against a compiled source tree
pub struct VerificationService {
    compilers: Arc<CompilerCache>,
    chain: Arc<dyn Chain>,
    normalizer: BytecodeNormalizer,
}

impl VerificationService {
    pub fn new(compilers: Arc<CompilerCache>, chain: Arc<dyn Chain>) -> Self {
        Self {
            compilers,
            chain,
            normalizer: BytecodeNormalizer::default(),
        }
    }

    /// Replace the normalization policy table
    pub fn with_normalizer(mut self, normalizer: BytecodeNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn compilers(&self) -> &CompilerCache {
        &self.compilers
    }

    /// Verify that `address` holds the runtime code of
    /// `contract_filename:contract_name` compiled from `sources` with `version`.
    pub async fn verify_bytecode(
        &self,
        sources: SourceMap,
        version: &str,
        contract_name: &str,
        contract_filename: &str,
        address: &str,
    ) -> VerifyResult<bool> {
        let request = VerificationRequest {
            sources,
            compiler_version: version.to_string(),
            contract_name: contract_name.to_string(),
            contract_filename: contract_filename.to_string(),
            address: address.to_string(),
        };
        Ok(self.verify_detailed(&request).await?.verified)
    }

    /// Run the full pipeline and describe what was compared.
    pub async fn verify_detailed(&self, request: &VerificationRequest) -> VerifyResult<VerificationReport> {
        let handle = self.compilers.get_or_load(&request.compiler_version).await?;

        let (artifacts, deployed_hex) = tokio::try_join!(
            handle.compile(&request.sources, OPTIMIZE),
            self.chain.get_code(&request.address),
        )?;

        let contract = find_contract(&artifacts, &request.contract_filename, &request.contract_name)?;
        let compiled = Bytecode::from_unprefixed(&contract.runtime_bytecode, BytecodeOrigin::Compiled)?;
        let deployed = Bytecode::parse(deployed_hex, BytecodeOrigin::Deployed)?;

        if deployed.is_empty() {
            warn!("No code deployed at {}", request.address);
        }

        let version = parse_version(&request.compiler_version)?;
        let normalized_compiled = self.normalizer.normalize(&compiled, version);
        let normalized_deployed = self.normalizer.normalize(&deployed, version);
        let verified = normalized_compiled.matches(&normalized_deployed);

        let contract_key = artifact_key(&request.contract_filename, &request.contract_name);
        info!(
            "Verification of {} at {} with {}: {}",
            contract_key,
            request.address,
            request.compiler_version,
            if verified { "match" } else { "mismatch" }
        );

        Ok(VerificationReport {
            verified,
            address: request.address.clone(),
            contract: contract_key,
            compiler_version: request.compiler_version.clone(),
            semantic_version: version,
            policy: normalized_compiled.policy.clone(),
            compiled: RegionSummary::new(&compiled, &normalized_compiled),
            deployed: RegionSummary::new(&deployed, &normalized_deployed),
            cache: self.compilers.stats(),
        })
    }
}
