//! Versions command: list compiler releases available for verification

use crate::argument_parsing::{VerifierCli, VersionsArgs};
use crate::commands::common;
use crate::error::{CliError, CliResult};
use crate::logic::OutputFormat;
use crate::output::{ConsoleOutput, Output};
use lib_verifier::Registry;

/// Keep at most `limit` versions, in registry order
pub fn apply_limit(mut versions: Vec<String>, limit: Option<usize>) -> Vec<String> {
    if let Some(limit) = limit {
        versions.truncate(limit);
    }
    versions
}

pub async fn handle_versions_command(args: VersionsArgs, cli: &VerifierCli) -> CliResult<()> {
    let output = ConsoleOutput;
    let format = cli.output_format()?;
    let settings = cli.settings()?;
    let registry = common::build_registry(&settings)?;

    handle_versions_command_impl(&registry, args.limit, format, &output).await
}

pub async fn handle_versions_command_impl(
    registry: &dyn Registry,
    limit: Option<usize>,
    format: OutputFormat,
    output: &dyn Output,
) -> CliResult<()> {
    let versions = registry
        .list_versions()
        .await
        .map_err(|e| CliError::RegistryError(format!("{:#}", e)))?;
    let total = versions.len();
    let shown = apply_limit(versions, limit);

    common::display(&shown, "Compiler Versions", format, output)?;
    if format == OutputFormat::Table && shown.len() < total {
        output.info(&format!("Showing {} of {} releases", shown.len(), total))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::testing::MockOutput;
    use lib_verifier::testing::MockRegistry;

    const LIST: &str = "soljson-v0.4.25+commit.59dbf8f1.js\n\
                        soljson-v0.4.25-nightly.2018.9.12+commit.9214c7c3.js\n\
                        soljson-v0.4.24+commit.e67f0147.js\n\
                        soljson-v0.4.23+commit.124ca40d.js\n";

    #[test]
    fn test_apply_limit() {
        let versions = vec!["a".to_string(), "b".to_string()];
        assert_eq!(apply_limit(versions.clone(), None), versions);
        assert_eq!(apply_limit(versions.clone(), Some(1)), vec!["a"]);
        assert_eq!(apply_limit(versions.clone(), Some(5)), versions);
    }

    #[tokio::test]
    async fn test_nightly_builds_are_hidden() {
        let output = MockOutput::new();
        handle_versions_command_impl(&MockRegistry::new(LIST), None, OutputFormat::Json, &output)
            .await
            .unwrap();

        let listed: Vec<String> = serde_json::from_str(&output.get_messages()[0]).unwrap();
        assert_eq!(
            listed,
            vec!["v0.4.25+commit.59dbf8f1", "v0.4.24+commit.e67f0147", "v0.4.23+commit.124ca40d"]
        );
    }

    #[tokio::test]
    async fn test_limited_table() {
        let output = MockOutput::new();
        handle_versions_command_impl(&MockRegistry::new(LIST), Some(1), OutputFormat::Table, &output)
            .await
            .unwrap();

        output.assert_contains_message("[0] v0.4.25+commit.59dbf8f1");
        output.assert_contains_message("Showing 1 of 3 releases");
    }
}
