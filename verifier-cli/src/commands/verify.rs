//! Verify command
//!
//! Architecture: Functional Core, Imperative Shell (FCIS)
//!
//! - **Pure Logic**: request assembly, report rendering decisions
//! - **Imperative Shell**: reading source files, compiler and chain calls, output printing
//! - **Testability**: service and Output injection

use crate::argument_parsing::{VerifierCli, VerifyArgs};
use crate::commands::common;
use crate::error::{CliError, CliResult};
use crate::logic::{self, OutputFormat};
use crate::output::{ConsoleOutput, Output};
use lib_verifier::{RegionSummary, SourceMap, VerificationReport, VerificationRequest, VerificationService};
use std::path::{Path, PathBuf};
use tracing::debug;

// ============================================================================
// PURE LOGIC - No side effects, fully testable
// ============================================================================

/// Assemble a verification request from parsed arguments and loaded sources
pub fn build_request(args: &VerifyArgs, sources: SourceMap) -> CliResult<VerificationRequest> {
    logic::ensure_contract_file(&sources, &args.file)?;

    Ok(VerificationRequest {
        sources,
        compiler_version: args.compiler_version.clone(),
        contract_name: args.contract.clone(),
        contract_filename: args.file.clone(),
        address: args.address.clone(),
    })
}

/// One-line description of a compared region
pub fn describe_region(summary: &RegionSummary) -> String {
    let bounds = match (summary.start_marker_found, summary.end_marker_found) {
        (true, true) => "both markers",
        (true, false) => "start marker only",
        (false, true) => "end marker only",
        (false, false) => "no markers",
    };
    format!(
        "{} of {} bytes compared ({})",
        summary.region_len / 2,
        summary.total_bytes,
        bounds
    )
}

/// Warnings worth showing next to a report
pub fn report_warnings(report: &VerificationReport) -> Vec<String> {
    let mut warnings = Vec::new();
    if report.policy.is_none() {
        warnings.push(format!(
            "No normalization policy for compiler {}; full bytecode was compared",
            report.semantic_version
        ));
    }
    if report.deployed.total_bytes == 0 {
        warnings.push(format!("No code is deployed at {}", report.address));
    }
    warnings
}

// ============================================================================
// IMPERATIVE SHELL - All side effects here
// ============================================================================

/// Handle the verify command
pub async fn handle_verify_command(args: VerifyArgs, cli: &VerifierCli) -> CliResult<()> {
    let output = ConsoleOutput;
    let format = cli.output_format()?;
    let settings = cli.settings()?;
    let service = common::build_service(&settings)?;

    let sources = read_sources(&args.sources, &args.base_dir).await?;
    let request = build_request(&args, sources)?;

    handle_verify_command_impl(&request, &service, format, &output).await
}

/// Read source files into a source tree keyed relative to `base_dir`
pub async fn read_sources(paths: &[PathBuf], base_dir: &Path) -> CliResult<SourceMap> {
    let base = tokio::fs::canonicalize(base_dir)
        .await
        .map_err(|e| read_failed(base_dir, e))?;

    let mut sources = SourceMap::new();
    for path in paths {
        let canonical = tokio::fs::canonicalize(path)
            .await
            .map_err(|e| read_failed(path, e))?;
        let key = logic::source_key(&canonical, &base)?;
        let content = tokio::fs::read_to_string(&canonical)
            .await
            .map_err(|e| read_failed(path, e))?;

        debug!("Loaded source {} ({} bytes)", key, content.len());
        if sources.insert(key.clone(), content).is_some() {
            return Err(CliError::SourceError(format!("Source '{}' supplied twice", key)));
        }
    }
    Ok(sources)
}

fn read_failed(path: &Path, err: std::io::Error) -> CliError {
    CliError::SourceReadFailed {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

/// Run a verification and print the report
pub async fn handle_verify_command_impl(
    request: &VerificationRequest,
    service: &VerificationService,
    format: OutputFormat,
    output: &dyn Output,
) -> CliResult<()> {
    let report = service.verify_detailed(request).await?;

    match format {
        OutputFormat::Json => output.print_json(&serde_json::to_value(&report)?)?,
        OutputFormat::Table => print_report(&report, output)?,
    }

    if report.verified {
        Ok(())
    } else {
        Err(CliError::NotVerified {
            contract: report.contract,
            address: report.address,
        })
    }
}

fn print_report(report: &VerificationReport, output: &dyn Output) -> CliResult<()> {
    output.header("Contract Verification")?;
    output.field("Contract", &report.contract)?;
    output.field("Address", &report.address)?;
    output.field("Compiler", &report.compiler_version)?;
    output.field("Policy", report.policy.as_deref().unwrap_or("none"))?;
    output.field("Compiled", &describe_region(&report.compiled))?;
    output.field("Deployed", &describe_region(&report.deployed))?;
    output.field(
        "Compiler cache",
        &format!("{} hits, {} loads", report.cache.hits, report.cache.loads),
    )?;

    for warning in report_warnings(report) {
        output.warning(&warning)?;
    }

    if report.verified {
        output.success("Deployed code matches the supplied sources")
    } else {
        output.error("Deployed code does not match the supplied sources")
    }
}
