//! Source tree and bytecode argument handling
//!
//! Source keys are the paths the compiler reports contracts under, so they
//! are always relative, `/`-separated and free of `.` or `..` segments.

use crate::error::{CliError, CliResult};
use lib_verifier::SourceMap;
use std::path::{Component, Path};

/// Key for `path` relative to `base_dir`
///
/// Both paths are compared lexically; callers canonicalize them first when
/// they come from the filesystem.
pub fn source_key(path: &Path, base_dir: &Path) -> CliResult<String> {
    let path_parts = normal_parts(path);
    let base_parts = normal_parts(base_dir);

    let relative = path_parts
        .strip_prefix(base_parts.as_slice())
        .filter(|rest| !rest.is_empty())
        .ok_or_else(|| {
            CliError::SourceError(format!(
                "{} is not inside base directory {}",
                path.display(),
                base_dir.display()
            ))
        })?;

    if relative.iter().any(|part| part == "..") {
        return Err(CliError::SourceError(format!(
            "{} escapes the base directory",
            path.display()
        )));
    }

    Ok(relative.join("/"))
}

/// The contract file must be one of the compiled sources
pub fn ensure_contract_file(sources: &SourceMap, contract_filename: &str) -> CliResult<()> {
    if sources.contains_key(contract_filename) {
        return Ok(());
    }
    let available: Vec<&str> = sources.keys().map(String::as_str).collect();
    Err(CliError::SourceError(format!(
        "'{}' is not among the supplied sources ({})",
        contract_filename,
        if available.is_empty() {
            "none".to_string()
        } else {
            available.join(", ")
        }
    )))
}

/// Strip surrounding whitespace and line breaks from pasted or file-read bytecode
pub fn trim_bytecode_text(text: &str) -> String {
    text.split_whitespace().collect()
}

fn normal_parts(path: &Path) -> Vec<String> {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            Component::RootDir => Some("/".to_string()),
            Component::Prefix(prefix) => Some(prefix.as_os_str().to_string_lossy().into_owned()),
            Component::CurDir => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_key_relative_to_cwd() {
        assert_eq!(source_key(Path::new("A.sol"), Path::new(".")).unwrap(), "A.sol");
        assert_eq!(
            source_key(Path::new("./contracts/token/Token.sol"), Path::new(".")).unwrap(),
            "contracts/token/Token.sol"
        );
    }

    #[test]
    fn test_source_key_with_base_dir() {
        assert_eq!(
            source_key(
                Path::new("/work/project/contracts/Token.sol"),
                Path::new("/work/project")
            )
            .unwrap(),
            "contracts/Token.sol"
        );
    }

    #[test]
    fn test_source_key_rejects_outside_paths() {
        assert!(source_key(Path::new("/tmp/A.sol"), Path::new("/work")).is_err());
        assert!(source_key(Path::new("../A.sol"), Path::new(".")).is_err());
        assert!(source_key(Path::new("/work"), Path::new("/work")).is_err());
    }

    #[test]
    fn test_ensure_contract_file() {
        let mut sources = SourceMap::new();
        sources.insert("A.sol".to_string(), String::new());
        sources.insert("lib/B.sol".to_string(), String::new());

        assert!(ensure_contract_file(&sources, "A.sol").is_ok());
        let err = ensure_contract_file(&sources, "C.sol").unwrap_err();
        assert!(err.to_string().contains("A.sol, lib/B.sol"));
    }

    #[test]
    fn test_trim_bytecode_text() {
        assert_eq!(trim_bytecode_text("  0x6080\n6040 52\n"), "0x6080604052");
    }
}
