//! Normalize command
//!
//! Prints the comparable region of a bytecode string for a given compiler
//! version. Runs entirely offline.

use crate::argument_parsing::{NormalizeArgs, VerifierCli};
use crate::commands::common;
use crate::error::{CliError, CliResult};
use crate::logic::{self, OutputFormat};
use crate::output::{ConsoleOutput, Output};
use lib_verifier::{normalize, parse_version, Bytecode, BytecodeOrigin, SemanticVersion};
use serde::Serialize;

// ============================================================================
// PURE LOGIC - No side effects, fully testable
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizeSummary {
    pub compiler_version: String,
    pub semantic_version: SemanticVersion,
    pub policy: Option<String>,
    pub start_marker_found: bool,
    pub end_marker_found: bool,
    pub total_bytes: usize,
    pub region: String,
}

/// Normalize `text` as produced by the compiler labelled `version_label`
pub fn normalize_text(text: &str, version_label: &str) -> CliResult<NormalizeSummary> {
    let version = parse_version(version_label)?;
    let bytecode = Bytecode::parse(logic::trim_bytecode_text(text), BytecodeOrigin::Input)?;
    let normalized = normalize(&bytecode, version);

    Ok(NormalizeSummary {
        compiler_version: version_label.to_string(),
        semantic_version: version,
        policy: normalized.policy,
        start_marker_found: normalized.start_marker_found,
        end_marker_found: normalized.end_marker_found,
        total_bytes: bytecode.byte_len(),
        region: normalized.region,
    })
}

// ============================================================================
// IMPERATIVE SHELL - All side effects here
// ============================================================================

pub async fn handle_normalize_command(args: NormalizeArgs, cli: &VerifierCli) -> CliResult<()> {
    let output = ConsoleOutput;
    let format = cli.output_format()?;
    let text = resolve_bytecode_argument(&args.bytecode).await?;
    handle_normalize_command_impl(&text, &args.compiler_version, format, &output)
}

/// `@path` reads the bytecode from a file, anything else is taken literally
pub async fn resolve_bytecode_argument(argument: &str) -> CliResult<String> {
    match argument.strip_prefix('@') {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .map_err(|e| CliError::SourceReadFailed {
                path: path.to_string(),
                reason: e.to_string(),
            }),
        None => Ok(argument.to_string()),
    }
}

pub fn handle_normalize_command_impl(
    text: &str,
    version_label: &str,
    format: OutputFormat,
    output: &dyn Output,
) -> CliResult<()> {
    let summary = normalize_text(text, version_label)?;

    if summary.policy.is_none() {
        output.warning(&format!(
            "No normalization policy for compiler {}; the full bytecode is the comparable region",
            summary.semantic_version
        ))?;
    }
    common::display(&summary, "Normalized Bytecode", format, output)
}
