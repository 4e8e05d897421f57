//! Native `solc` compiler loader
//!
//! Static Linux builds are fetched from the solc-bin mirror on first use and
//! kept on disk under the compiler directory. Compilation shells out to the
//! binary with `--combined-json bin-runtime`, which keys contracts as
//! `"<file>:<name>"`.

use super::{ArtifactMap, CompiledContract, CompilerHandle, CompilerLoader, SourceMap};
use crate::error::{VerifyError, VerifyResult};
use crate::version::parse_version;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

/// Default mirror for static Linux `solc` builds
pub const DEFAULT_SOLC_BIN_URL: &str = "https://binaries.soliditylang.org/linux-amd64";

/// Loader that downloads and caches `solc` binaries
pub struct SolcLoader {
    bin_url: String,
    compiler_dir: PathBuf,
    client: reqwest::Client,
}

impl SolcLoader {
    pub fn new(bin_url: impl Into<String>, compiler_dir: impl Into<PathBuf>) -> Self {
        Self {
            bin_url: bin_url.into().trim_end_matches('/').to_string(),
            compiler_dir: compiler_dir.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Use a preconfigured HTTP client (timeouts, proxies)
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> VerifyResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VerifyError::load("*", format!("HTTP client setup failed: {}", e)))?;
        Ok(self.with_client(client))
    }

    /// Location of the binary for `version` inside the compiler directory
    pub fn binary_path(&self, version: &str) -> PathBuf {
        self.compiler_dir.join(format!("solc-{}", version))
    }

    /// Download URL for `version`
    pub fn download_url(&self, version: &str) -> String {
        format!("{}/solc-linux-amd64-{}", self.bin_url, version)
    }

    async fn download(&self, version: &str, target: &Path) -> VerifyResult<()> {
        let url = self.download_url(version);
        info!("Downloading solc {} from {}", version, url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| VerifyError::load(version, format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(VerifyError::load(
                version,
                format!("HTTP {} from {}", response.status(), url),
            ));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| VerifyError::load(version, format!("download interrupted: {}", e)))?;

        tokio::fs::create_dir_all(&self.compiler_dir)
            .await
            .map_err(|e| VerifyError::load(version, format!("cannot create compiler dir: {}", e)))?;

        // Write beside the target and rename so a partial download is never picked up.
        let mut partial = target.as_os_str().to_owned();
        partial.push(".partial");
        let partial = PathBuf::from(partial);
        tokio::fs::write(&partial, &bytes)
            .await
            .map_err(|e| VerifyError::load(version, format!("cannot write binary: {}", e)))?;
        make_executable(&partial)
            .await
            .map_err(|e| VerifyError::load(version, format!("cannot mark binary executable: {}", e)))?;
        tokio::fs::rename(&partial, target)
            .await
            .map_err(|e| VerifyError::load(version, format!("cannot install binary: {}", e)))?;

        debug!("Installed solc {} ({} bytes)", version, bytes.len());
        Ok(())
    }
}

#[async_trait]
impl CompilerLoader for SolcLoader {
    async fn load(&self, version: &str) -> VerifyResult<Arc<dyn CompilerHandle>> {
        validate_label(version)?;

        let binary = self.binary_path(version);
        if tokio::fs::metadata(&binary).await.is_err() {
            self.download(version, &binary).await?;
        } else {
            debug!("Using installed solc {} at {}", version, binary.display());
        }

        Ok(Arc::new(SolcHandle::new(version, binary)))
    }
}

/// Handle to an installed `solc` binary
#[derive(Debug, Clone)]
pub struct SolcHandle {
    version: String,
    binary: PathBuf,
}

impl SolcHandle {
    pub fn new(version: impl Into<String>, binary: impl Into<PathBuf>) -> Self {
        Self {
            version: version.into(),
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

#[async_trait]
impl CompilerHandle for SolcHandle {
    fn version(&self) -> &str {
        &self.version
    }

    async fn compile(&self, sources: &SourceMap, optimize: bool) -> VerifyResult<ArtifactMap> {
        let workdir = tempfile::tempdir()
            .map_err(|e| VerifyError::CompileOutputError(format!("cannot create workdir: {}", e)))?;

        for (name, text) in sources {
            let relative = checked_source_path(name)?;
            let path = workdir.path().join(relative);
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    VerifyError::CompileOutputError(format!("cannot stage {}: {}", name, e))
                })?;
            }
            tokio::fs::write(&path, text).await.map_err(|e| {
                VerifyError::CompileOutputError(format!("cannot stage {}: {}", name, e))
            })?;
        }

        let mut command = Command::new(&self.binary);
        command
            .current_dir(workdir.path())
            .arg("--combined-json")
            .arg("bin-runtime");
        if optimize {
            command.arg("--optimize");
        }
        command.args(sources.keys());

        debug!("Running solc {} on {} source file(s)", self.version, sources.len());
        let output = command.output().await.map_err(|e| {
            VerifyError::CompileOutputError(format!("failed to run {}: {}", self.binary.display(), e))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let mut lines: Vec<String> = stderr
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(String::from)
                .collect();
            if lines.is_empty() {
                lines.push(format!("solc exited with {}", output.status));
            }
            return Err(VerifyError::CompilationFailed(lines));
        }

        parse_combined_json(&String::from_utf8_lossy(&output.stdout))
    }
}

#[derive(Debug, Deserialize)]
struct CombinedJson {
    contracts: BTreeMap<String, CombinedContract>,
}

#[derive(Debug, Deserialize)]
struct CombinedContract {
    #[serde(rename = "bin-runtime")]
    bin_runtime: String,
}

/// Parse `solc --combined-json bin-runtime` output into an artifact map
pub fn parse_combined_json(stdout: &str) -> VerifyResult<ArtifactMap> {
    let parsed: CombinedJson = serde_json::from_str(stdout)?;
    Ok(parsed
        .contracts
        .into_iter()
        .map(|(key, contract)| (key, CompiledContract::new(contract.bin_runtime)))
        .collect())
}

fn validate_label(version: &str) -> VerifyResult<()> {
    let safe = !version.is_empty()
        && version
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '+' | '-'));
    if !safe {
        return Err(VerifyError::load(version, "unsupported characters in version label"));
    }
    parse_version(version).map_err(|_| VerifyError::load(version, "not a release label"))?;
    Ok(())
}

/// Source names must stay inside the staging directory and must not be
/// mistaken for a solc option when passed on the command line.
fn checked_source_path(name: &str) -> VerifyResult<&Path> {
    let path = Path::new(name);
    let contained = !name.is_empty() && path.components().all(|c| matches!(c, Component::Normal(_)));
    if contained && !name.starts_with('-') {
        Ok(path)
    } else {
        Err(VerifyError::CompilationFailed(vec![format!(
            "unsupported source path '{}'",
            name
        )]))
    }
}

#[cfg(unix)]
async fn make_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).await
}

#[cfg(not(unix))]
async fn make_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_combined_json() {
        let stdout = r#"{
            "contracts": {
                "A.sol:A": {"bin-runtime": "6080604052600080fd00a165627a7a72305820"},
                "lib/B.sol:B": {"bin-runtime": ""}
            },
            "version": "0.4.24+commit.e67f0147.Linux.g++"
        }"#;

        let artifacts = parse_combined_json(stdout).unwrap();
        assert_eq!(artifacts.len(), 2);
        assert_eq!(
            artifacts["A.sol:A"].runtime_bytecode,
            "6080604052600080fd00a165627a7a72305820"
        );
        assert_eq!(artifacts["lib/B.sol:B"].runtime_bytecode, "");
    }

    #[test]
    fn test_parse_combined_json_rejects_garbage() {
        assert!(matches!(
            parse_combined_json("Warning: this is not json"),
            Err(VerifyError::CompileOutputError(_))
        ));
        assert!(matches!(
            parse_combined_json(r#"{"sources": {}}"#),
            Err(VerifyError::CompileOutputError(_))
        ));
    }

    #[test]
    fn test_paths_and_urls() {
        let loader = SolcLoader::new("https://example.org/bin/", "/tmp/compilers");
        assert_eq!(
            loader.download_url("v0.4.24+commit.e67f0147"),
            "https://example.org/bin/solc-linux-amd64-v0.4.24+commit.e67f0147"
        );
        assert_eq!(
            loader.binary_path("v0.4.24+commit.e67f0147"),
            PathBuf::from("/tmp/compilers/solc-v0.4.24+commit.e67f0147")
        );
    }

    #[test]
    fn test_validate_label() {
        assert!(validate_label("v0.4.24+commit.e67f0147").is_ok());
        assert!(validate_label("../../etc/passwd").is_err());
        assert!(validate_label("latest").is_err());
    }

    #[test]
    fn test_checked_source_path() {
        assert!(checked_source_path("A.sol").is_ok());
        assert!(checked_source_path("contracts/token/A.sol").is_ok());
        assert!(checked_source_path("/etc/A.sol").is_err());
        assert!(checked_source_path("../A.sol").is_err());
        assert!(checked_source_path("").is_err());
        assert!(checked_source_path("--output-dir=pwned").is_err());
        assert!(checked_source_path("-o/A.sol").is_err());
        assert!(checked_source_path("contracts/-A.sol").is_ok());
    }

    #[tokio::test]
    async fn test_load_reuses_installed_binary() {
        let dir = tempfile::tempdir().unwrap();
        let loader = SolcLoader::new("http://127.0.0.1:9", dir.path());
        let version = "v0.4.24+commit.e67f0147";
        std::fs::write(loader.binary_path(version), b"#!/bin/sh\n").unwrap();

        let handle = loader.load(version).await.unwrap();
        assert_eq!(handle.version(), version);
    }

    #[tokio::test]
    async fn test_load_unreachable_mirror_fails() {
        let dir = tempfile::tempdir().unwrap();
        let loader = SolcLoader::new("http://127.0.0.1:9", dir.path());
        let err = match loader.load("v0.4.24+commit.e67f0147").await {
            Err(e) => e,
            Ok(_) => panic!("expected load failure"),
        };
        assert!(matches!(err, VerifyError::CompilerLoadError { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_compile_with_stub_binary() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let binary = dir.path().join("solc-stub");
        std::fs::write(
            &binary,
            "#!/bin/sh\necho '{\"contracts\":{\"A.sol:A\":{\"bin-runtime\":\"6080604052\"}}}'\n",
        )
        .unwrap();
        std::fs::set_permissions(&binary, std::fs::Permissions::from_mode(0o755)).unwrap();

        let handle = SolcHandle::new("v0.4.24+commit.e67f0147", &binary);
        let mut sources = SourceMap::new();
        sources.insert("A.sol".to_string(), "contract A {}".to_string());

        let artifacts = handle.compile(&sources, true).await.unwrap();
        assert_eq!(artifacts["A.sol:A"].runtime_bytecode, "6080604052");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_compile_failure_reports_stderr() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let binary = dir.path().join("solc-stub");
        std::fs::write(
            &binary,
            "#!/bin/sh\necho 'A.sol:1:1: Error: Expected pragma' >&2\nexit 1\n",
        )
        .unwrap();
        std::fs::set_permissions(&binary, std::fs::Permissions::from_mode(0o755)).unwrap();

        let handle = SolcHandle::new("v0.4.24+commit.e67f0147", &binary);
        let mut sources = SourceMap::new();
        sources.insert("A.sol".to_string(), "garbage".to_string());

        assert_eq!(
            handle.compile(&sources, true).await,
            Err(VerifyError::CompilationFailed(vec![
                "A.sol:1:1: Error: Expected pragma".to_string()
            ]))
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_option_like_source_never_reaches_solc() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("invoked");
        let binary = dir.path().join("solc-stub");
        std::fs::write(&binary, format!("#!/bin/sh\ntouch '{}'\nexit 1\n", marker.display())).unwrap();
        std::fs::set_permissions(&binary, std::fs::Permissions::from_mode(0o755)).unwrap();

        let handle = SolcHandle::new("v0.4.24+commit.e67f0147", &binary);
        let mut sources = SourceMap::new();
        sources.insert("A.sol".to_string(), "contract A {}".to_string());
        sources.insert("--output-dir=pwned".to_string(), "contract B {}".to_string());

        let err = handle.compile(&sources, true).await.unwrap_err();
        assert_eq!(
            err,
            VerifyError::CompilationFailed(vec!["unsupported source path '--output-dir=pwned'".to_string()])
        );
        assert!(!marker.exists());
    }
}
