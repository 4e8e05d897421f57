//! Bytecode normalization
//!
//! Strips the deployment prologue and the trailing metadata hash so two builds
//! of the same source compare equal even when their embedded content hashes
//! differ.
//!
//! Boundary policy:
//! - start marker missing: region starts at offset 0
//! - end marker missing: region runs to the end of the input
//! - only start markers beginning before the end index are considered, so the
//!   region is never inverted
//!
//! Marker search ignores ASCII case; the returned region keeps the input case.

pub mod policy;

pub use policy::{MarkerPair, NormalizationPolicy, PolicyTable, VersionRange};

use crate::bytecode::Bytecode;
use crate::version::SemanticVersion;
use serde::Serialize;
use tracing::{debug, warn};

/// Comparable region of a bytecode string
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedBytecode {
    /// Extracted region, a contiguous substring of the input
    pub region: String,
    /// Name of the policy applied, `None` when the version matched no policy
    pub policy: Option<String>,
    pub start_marker_found: bool,
    pub end_marker_found: bool,
}

impl NormalizedBytecode {
    pub fn as_str(&self) -> &str {
        &self.region
    }

    /// True when a policy applied and at least one marker bounded the region.
    /// False means the comparison degrades to whole-input equality.
    pub fn markers_found(&self) -> bool {
        self.start_marker_found || self.end_marker_found
    }

    /// Hex-case-insensitive equality of the extracted regions
    pub fn matches(&self, other: &NormalizedBytecode) -> bool {
        self.region.eq_ignore_ascii_case(&other.region)
    }
}

/// Policy-driven bytecode normalizer
#[derive(Debug, Clone, Default)]
pub struct BytecodeNormalizer {
    table: PolicyTable,
}

impl BytecodeNormalizer {
    pub fn new(table: PolicyTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &PolicyTable {
        &self.table
    }

    /// Extract the comparable region of `bytecode` for `version`.
    pub fn normalize(&self, bytecode: &Bytecode, version: SemanticVersion) -> NormalizedBytecode {
        let text = bytecode.as_str();

        let Some(policy) = self.table.select(version) else {
            debug!("No normalization policy for version {}, comparing full bytecode", version);
            return NormalizedBytecode {
                region: text.to_string(),
                policy: None,
                start_marker_found: false,
                end_marker_found: false,
            };
        };

        let (start, end) = locate_region(text, &policy.markers);

        if start.is_none() && end.is_none() {
            warn!(
                "Policy {} expects markers but none were found in {} bytes of code",
                policy.name,
                bytecode.byte_len()
            );
        }

        let start_idx = start.unwrap_or(0);
        let end_idx = end.unwrap_or(text.len());
        debug!(
            "Normalized with policy {}: region [{}, {}) of {}",
            policy.name,
            start_idx,
            end_idx,
            text.len()
        );

        NormalizedBytecode {
            region: text[start_idx..end_idx].to_string(),
            policy: Some(policy.name.clone()),
            start_marker_found: start.is_some(),
            end_marker_found: end.is_some(),
        }
    }
}

/// Normalize with the default policy table.
pub fn normalize(bytecode: &Bytecode, version: SemanticVersion) -> NormalizedBytecode {
    BytecodeNormalizer::default().normalize(bytecode, version)
}

/// Resolve (start, end) character offsets; `None` when a marker is absent.
fn locate_region(text: &str, markers: &MarkerPair) -> (Option<usize>, Option<usize>) {
    // ASCII lowercasing keeps byte offsets stable.
    let lower = text.to_ascii_lowercase();

    let end = lower.find(markers.end.as_str());
    let search_limit = match end {
        Some(end_idx) => (end_idx + markers.start.len()).saturating_sub(1).min(lower.len()),
        None => lower.len(),
    };
    let start = lower[..search_limit].rfind(markers.start.as_str());

    (start, end)
}
