//! Path expansion for configured directories

use crate::error::{CliError, CliResult};
use std::path::{Path, PathBuf};

/// Expand a leading `~` or `~/` to the home directory
pub fn expand_home_directory(path: &str) -> CliResult<PathBuf> {
    expand_with_home(path, dirs::home_dir().as_deref())
}

/// Expansion against an explicit home directory
pub fn expand_with_home(path: &str, home: Option<&Path>) -> CliResult<PathBuf> {
    if path.is_empty() {
        return Err(CliError::ConfigError("Path cannot be empty".to_string()));
    }

    if let Some(rest) = path.strip_prefix("~/") {
        let home = home.ok_or(CliError::HomeDirectoryNotFound)?;
        Ok(home.join(rest))
    } else if path == "~" {
        home.map(Path::to_path_buf).ok_or(CliError::HomeDirectoryNotFound)
    } else {
        Ok(PathBuf::from(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_with_home() {
        let home = Path::new("/home/auditor");
        assert_eq!(
            expand_with_home("~/.verifier/compilers", Some(home)).unwrap(),
            PathBuf::from("/home/auditor/.verifier/compilers")
        );
        assert_eq!(expand_with_home("~", Some(home)).unwrap(), PathBuf::from("/home/auditor"));
        assert_eq!(
            expand_with_home("/opt/solc", Some(home)).unwrap(),
            PathBuf::from("/opt/solc")
        );
    }

    #[test]
    fn test_expand_without_home() {
        assert!(matches!(
            expand_with_home("~/x", None),
            Err(CliError::HomeDirectoryNotFound)
        ));
        assert!(expand_with_home("", None).is_err());
    }
}
