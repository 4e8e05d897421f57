//! Compiler version label parsing
//!
//! Labels look like `v0.4.22+commit.4cb486ee` or `v0.4.11-nightly.2017.3.15+commit.0157b86c`.
//! Only minor and patch participate in policy selection; major is ignored.

use crate::error::{VerifyError, VerifyResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

static VERSION_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)v\d+?\.\d+?\.\d+?[+-]").expect("version prefix pattern"));

static DOT_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.(\d+)").expect("dot number pattern"));

/// Comparable (minor, patch) pair derived from a compiler version label
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SemanticVersion {
    pub minor: u64,
    pub patch: u64,
}

impl SemanticVersion {
    pub const fn new(minor: u64, patch: u64) -> Self {
        Self { minor, patch }
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.minor, self.patch)
    }
}

impl FromStr for SemanticVersion {
    type Err = VerifyError;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        parse_version(label)
    }
}

/// Parse a compiler version label into its (minor, patch) pair.
///
/// The `.<digits>` groups are read from the isolated `v<int>.<int>.<int>[+-]`
/// prefix only, so digits inside a commit hash or a nightly date never leak in.
pub fn parse_version(label: &str) -> VerifyResult<SemanticVersion> {
    let malformed = || VerifyError::MalformedVersionString(label.to_string());

    let prefix = VERSION_PREFIX.find(label).ok_or_else(malformed)?.as_str();

    let mut groups = DOT_NUMBER
        .captures_iter(prefix)
        .filter_map(|caps| caps.get(1));

    let minor = groups.next().ok_or_else(malformed)?;
    let patch = groups.next().ok_or_else(malformed)?;

    Ok(SemanticVersion {
        minor: minor.as_str().parse().map_err(|_| malformed())?,
        patch: patch.as_str().parse().map_err(|_| malformed())?,
    })
}
