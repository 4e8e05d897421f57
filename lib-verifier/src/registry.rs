//! Compiler version registry
//!
//! Lists the compiler builds available for verification. Nightly builds are
//! never offered.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Default release list published by the solc-bin repository
pub const DEFAULT_VERSION_LIST_URL: &str =
    "https://raw.githubusercontent.com/ethereum/solc-bin/gh-pages/bin/list.txt";

/// Source of available compiler version labels
#[async_trait]
pub trait Registry: Send + Sync {
    /// Version labels in registry order, nightly builds excluded
    async fn list_versions(&self) -> Result<Vec<String>>;
}

/// Registry backed by the solc-bin `list.txt` file
pub struct SolcBinRegistry {
    list_url: String,
    client: reqwest::Client,
}

impl SolcBinRegistry {
    pub fn new(list_url: impl Into<String>) -> Self {
        Self {
            list_url: list_url.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("HTTP client setup failed")?;
        Ok(self.with_client(client))
    }

    pub fn list_url(&self) -> &str {
        &self.list_url
    }
}

impl Default for SolcBinRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_VERSION_LIST_URL)
    }
}

#[async_trait]
impl Registry for SolcBinRegistry {
    async fn list_versions(&self) -> Result<Vec<String>> {
        debug!("Fetching compiler list from {}", self.list_url);
        let text = self
            .client
            .get(&self.list_url)
            .send()
            .await
            .context("Failed to fetch compiler list")?
            .error_for_status()
            .context("Compiler list request rejected")?
            .text()
            .await
            .context("Failed to read compiler list")?;

        Ok(filter_release_versions(&text))
    }
}

/// File name decorations around the release label in solc-bin lists
const LIST_ENTRY_PREFIXES: [&str; 2] = ["soljson-", "solc-linux-amd64-"];
const LIST_ENTRY_SUFFIX: &str = ".js";

/// Split a newline-separated list into release labels, dropping blank lines
/// and nightly builds.
///
/// Entries such as `soljson-v0.4.24+commit.e67f0147.js` are reduced to the
/// label `v0.4.24+commit.e67f0147` that the compiler loader accepts.
pub fn filter_release_versions(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.contains("nightly"))
        .map(|line| release_label(line).to_string())
        .collect()
}

/// Strip solc-bin file name decorations from a list entry
pub fn release_label(entry: &str) -> &str {
    let label = LIST_ENTRY_PREFIXES
        .iter()
        .find_map(|prefix| entry.strip_prefix(prefix))
        .unwrap_or(entry);
    label.strip_suffix(LIST_ENTRY_SUFFIX).unwrap_or(label)
}
