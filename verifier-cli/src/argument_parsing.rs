//! Verifier CLI argument parsing and dispatch

use crate::cli_config::{self, ConfigOverrides, RuntimeSettings};
use crate::commands;
use crate::error::CliResult;
use crate::logic::OutputFormat;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Verify deployed contract bytecode against its sources
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(name = "verifier")]
pub struct VerifierCli {
    /// Configuration file path
    #[arg(short, long, env = "VERIFIER_CONFIG")]
    pub config: Option<String>,

    /// Enable debug logging
    #[arg(short, long, env = "VERIFIER_VERBOSE")]
    pub verbose: bool,

    /// Output format (json, table)
    #[arg(short, long, default_value = "table", env = "VERIFIER_FORMAT")]
    pub format: String,

    /// Ethereum JSON-RPC endpoint
    #[arg(long, env = "VERIFIER_RPC_URL")]
    pub rpc_url: Option<String>,

    /// Mirror serving static solc builds
    #[arg(long, env = "VERIFIER_SOLC_BIN_URL")]
    pub solc_bin_url: Option<String>,

    /// URL of the compiler version list
    #[arg(long, env = "VERIFIER_VERSION_LIST_URL")]
    pub version_list_url: Option<String>,

    /// Directory where downloaded compilers are kept
    #[arg(long, env = "VERIFIER_COMPILER_DIR")]
    pub compiler_dir: Option<String>,

    #[command(subcommand)]
    pub command: VerifierCommand,
}

impl VerifierCli {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            rpc_url: self.rpc_url.clone(),
            solc_bin_url: self.solc_bin_url.clone(),
            version_list_url: self.version_list_url.clone(),
            compiler_dir: self.compiler_dir.clone(),
        }
    }

    pub fn output_format(&self) -> CliResult<OutputFormat> {
        OutputFormat::parse(&self.format)
    }

    /// Load the config file and resolve runtime settings
    pub fn settings(&self) -> CliResult<RuntimeSettings> {
        let config = cli_config::load_config(self.config.as_deref())?;
        cli_config::resolve_settings(&config, &self.overrides())
    }
}

/// Verifier commands
#[derive(Subcommand, Debug, Clone)]
pub enum VerifierCommand {
    /// Compile sources and compare against the code deployed at an address
    Verify(VerifyArgs),

    /// Print the comparable region of a bytecode string (offline)
    Normalize(NormalizeArgs),

    /// List available compiler releases
    Versions(VersionsArgs),
}

#[derive(Args, Debug, Clone)]
pub struct VerifyArgs {
    /// Compiler version label, e.g. v0.4.24+commit.e67f0147
    #[arg(long = "compiler")]
    pub compiler_version: String,

    /// Contract name
    #[arg(long)]
    pub contract: String,

    /// Source file declaring the contract, as a key of the source tree
    #[arg(long)]
    pub file: String,

    /// Deployed contract address
    #[arg(long)]
    pub address: String,

    /// Directory that source keys are relative to
    #[arg(long, default_value = ".")]
    pub base_dir: PathBuf,

    /// Source files compiled together
    #[arg(required = true)]
    pub sources: Vec<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct NormalizeArgs {
    /// Compiler version label selecting the normalization policy
    #[arg(long = "compiler")]
    pub compiler_version: String,

    /// Hex bytecode, or @path to read it from a file
    pub bytecode: String,
}

#[derive(Args, Debug, Clone)]
pub struct VersionsArgs {
    /// Only show the first N versions
    #[arg(short, long)]
    pub limit: Option<usize>,
}

/// Main CLI runner
pub async fn run_cli() -> Result<()> {
    let cli = VerifierCli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        VerifierCommand::Verify(args) => commands::verify::handle_verify_command(args.clone(), &cli).await?,
        VerifierCommand::Normalize(args) => commands::normalize::handle_normalize_command(args.clone(), &cli).await?,
        VerifierCommand::Versions(args) => commands::versions::handle_versions_command(args.clone(), &cli).await?,
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Format a JSON value for display
pub fn format_output(data: &Value, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(data)?),
        OutputFormat::Table => {
            if let Some(obj) = data.as_object() {
                let mut result = String::new();
                for (key, value) in obj {
                    result.push_str(&format!("{:<20} {}\n", key, table_cell(value)));
                }
                Ok(result)
            } else if let Some(array) = data.as_array() {
                let mut result = String::new();
                for (i, item) in array.iter().enumerate() {
                    result.push_str(&format!("[{}] {}\n", i, table_cell(item)));
                }
                Ok(result)
            } else {
                Ok(table_cell(data))
            }
        }
    }
}

fn table_cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        VerifierCli::command().debug_assert();
    }

    #[test]
    fn test_parse_verify() {
        let cli = VerifierCli::try_parse_from([
            "verifier",
            "--format",
            "json",
            "verify",
            "--compiler",
            "v0.4.24+commit.e67f0147",
            "--contract",
            "Token",
            "--file",
            "contracts/Token.sol",
            "--address",
            "0x8d12a197cb00d4747a1fe03395095ce2a5cc6819",
            "contracts/Token.sol",
            "contracts/SafeMath.sol",
        ])
        .unwrap();

        assert_eq!(cli.output_format().unwrap(), OutputFormat::Json);
        match cli.command {
            VerifierCommand::Verify(args) => {
                assert_eq!(args.compiler_version, "v0.4.24+commit.e67f0147");
                assert_eq!(args.file, "contracts/Token.sol");
                assert_eq!(args.sources.len(), 2);
                assert_eq!(args.base_dir, PathBuf::from("."));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_verify_requires_sources() {
        assert!(VerifierCli::try_parse_from([
            "verifier",
            "verify",
            "--compiler",
            "v0.4.24+commit.e67f0147",
            "--contract",
            "A",
            "--file",
            "A.sol",
            "--address",
            "0x00",
        ])
        .is_err());
    }

    #[test]
    fn test_format_output_table() {
        let data = serde_json::json!({"verified": true, "policy": "solc>=0.4.22", "note": null});
        let table = format_output(&data, OutputFormat::Table).unwrap();
        assert!(table.contains("verified             true"));
        assert!(table.contains("policy               solc>=0.4.22"));
        assert!(table.contains("note                 -"));
    }

    #[test]
    fn test_format_output_array() {
        let data = serde_json::json!(["v0.4.24+commit.e67f0147", "v0.4.23+commit.124ca40d"]);
        let table = format_output(&data, OutputFormat::Table).unwrap();
        assert_eq!(table, "[0] v0.4.24+commit.e67f0147\n[1] v0.4.23+commit.124ca40d\n");
    }
}
