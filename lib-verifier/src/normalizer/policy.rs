//! Version-range normalization policies
//!
//! Each policy names the hex markers that bracket the comparable executable
//! region for one compiler era. Policies are checked in order; the first whose
//! range contains the version wins.

use crate::version::SemanticVersion;
use serde::Serialize;

/// Creation prologue emitted from 0.4.22 on (`PUSH1 0x80 PUSH1 0x40 MSTORE`)
pub const PROLOGUE_0_4_22: &str = "6080604052";
/// Creation prologue emitted between 0.4.7 and 0.4.21 (`PUSH1 0x60 PUSH1 0x40 MSTORE`)
pub const PROLOGUE_0_4_7: &str = "6060604052";
/// Start of the swarm-hash metadata trailer (`LOG1 "bzzr0" 0x20 ...`)
pub const SWARM_METADATA_MARKER: &str = "a165627a7a72305820";

/// Lower bound on (minor, patch), checked component-wise.
///
/// This is deliberately not a lexicographic bound: `0.5.3` is not contained in
/// `minor >= 4, patch >= 22`. That mirrors the historical dispatch rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VersionRange {
    pub min_minor: u64,
    pub min_patch: u64,
}

impl VersionRange {
    pub const fn at_least(min_minor: u64, min_patch: u64) -> Self {
        Self { min_minor, min_patch }
    }

    pub fn contains(&self, version: SemanticVersion) -> bool {
        version.minor >= self.min_minor && version.patch >= self.min_patch
    }
}

/// Start/end markers delimiting the comparable region
///
/// The start marker is searched from the right (constructor code may repeat
/// the prologue), the end marker from the left.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkerPair {
    pub start: String,
    pub end: String,
}

impl MarkerPair {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into().to_ascii_lowercase(),
            end: end.into().to_ascii_lowercase(),
        }
    }
}

/// One row of the dispatch table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizationPolicy {
    pub name: String,
    pub range: VersionRange,
    pub markers: MarkerPair,
}

impl NormalizationPolicy {
    pub fn new(name: impl Into<String>, range: VersionRange, markers: MarkerPair) -> Self {
        Self {
            name: name.into(),
            range,
            markers,
        }
    }
}

/// Ordered policy table; versions matching no row are left untouched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyTable {
    policies: Vec<NormalizationPolicy>,
}

impl PolicyTable {
    pub fn empty() -> Self {
        Self { policies: Vec::new() }
    }

    /// Append a policy. Earlier rows take precedence.
    pub fn with_policy(mut self, policy: NormalizationPolicy) -> Self {
        self.policies.push(policy);
        self
    }

    pub fn select(&self, version: SemanticVersion) -> Option<&NormalizationPolicy> {
        self.policies.iter().find(|p| p.range.contains(version))
    }

    pub fn policies(&self) -> &[NormalizationPolicy] {
        &self.policies
    }
}

impl Default for PolicyTable {
    fn default() -> Self {
        PolicyTable::empty()
            .with_policy(NormalizationPolicy::new(
                "solc>=0.4.22",
                VersionRange::at_least(4, 22),
                MarkerPair::new(PROLOGUE_0_4_22, SWARM_METADATA_MARKER),
            ))
            .with_policy(NormalizationPolicy::new(
                "solc>=0.4.7",
                VersionRange::at_least(4, 7),
                MarkerPair::new(PROLOGUE_0_4_7, SWARM_METADATA_MARKER),
            ))
    }
}
