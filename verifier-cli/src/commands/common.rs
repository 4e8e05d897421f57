//! Collaborator construction and display helpers shared across commands

use crate::argument_parsing::format_output;
use crate::cli_config::RuntimeSettings;
use crate::error::{CliError, CliResult};
use crate::logic::OutputFormat;
use crate::output::Output;
use lib_verifier::{CompilerCache, JsonRpcChain, SolcBinRegistry, SolcLoader, VerificationService};
use serde::Serialize;
use std::sync::Arc;

/// Build the verification service described by `settings`
pub fn build_service(settings: &RuntimeSettings) -> CliResult<VerificationService> {
    let loader = SolcLoader::new(settings.solc_bin_url.as_str(), settings.compiler_dir.clone())
        .with_timeout(settings.http_timeout)?;
    let cache = CompilerCache::with_capacity(Arc::new(loader), settings.compiler_cache_capacity);
    let chain = JsonRpcChain::new(settings.rpc_url.as_str()).with_timeout(settings.http_timeout)?;

    Ok(VerificationService::new(Arc::new(cache), Arc::new(chain)))
}

/// Build the compiler version registry described by `settings`
pub fn build_registry(settings: &RuntimeSettings) -> CliResult<SolcBinRegistry> {
    SolcBinRegistry::new(settings.version_list_url.as_str())
        .with_timeout(settings.http_timeout)
        .map_err(|e| CliError::RegistryError(format!("{:#}", e)))
}

/// Serialize `data` and print it in the requested format
pub fn display<T: Serialize>(
    data: &T,
    title: &str,
    format: OutputFormat,
    output: &dyn Output,
) -> CliResult<()> {
    let value = serde_json::to_value(data)?;
    match format {
        OutputFormat::Json => output.print_json(&value),
        OutputFormat::Table => {
            output.header(title)?;
            output.print(format_output(&value, format)?.trim_end())
        }
    }
}
