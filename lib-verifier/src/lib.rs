//! Deterministic bytecode verification for deployed EVM contracts
//!
//! Compiles a source tree with a given `solc` version, fetches the code
//! deployed at an address, strips the non-deterministic metadata trailer from
//! both according to the compiler era, and compares what remains.
//!
//! ```ignore
//! use lib_verifier::{CompilerCache, JsonRpcChain, SolcLoader, VerificationService};
//! use std::sync::Arc;
//!
//! let loader = Arc::new(SolcLoader::new(DEFAULT_SOLC_BIN_URL, "/var/cache/solc"));
//! let service = VerificationService::new(
//!     Arc::new(CompilerCache::new(loader)),
//!     Arc::new(JsonRpcChain::new("http://127.0.0.1:8545")),
//! );
//! let verified = service
//!     .verify_bytecode(sources, "v0.4.24+commit.e67f0147", "Token", "Token.sol", address)
//!     .await?;
//! ```

pub mod bytecode;
pub mod chain;
pub mod compiler;
pub mod error;
pub mod normalizer;
pub mod registry;
pub mod service;
pub mod testing;
pub mod version;

pub use bytecode::{Bytecode, BytecodeOrigin};
pub use chain::{Chain, JsonRpcChain, DEFAULT_RPC_URL};
pub use compiler::solc::DEFAULT_SOLC_BIN_URL;
pub use compiler::{
    artifact_key, ArtifactMap, CacheStats, CompiledContract, CompilerCache, CompilerHandle,
    CompilerLoader, SolcHandle, SolcLoader, SourceMap, DEFAULT_CACHE_CAPACITY,
};
pub use error::{VerifyError, VerifyResult};
pub use normalizer::{normalize, BytecodeNormalizer, NormalizedBytecode, PolicyTable};
pub use registry::{filter_release_versions, release_label, Registry, SolcBinRegistry, DEFAULT_VERSION_LIST_URL};
pub use service::{RegionSummary, VerificationReport, VerificationRequest, VerificationService};
pub use version::{parse_version, SemanticVersion};
