//! Contract verifier command-line interface
//!
//! Entry point for the `verifier` binary. Parses command-line arguments
//! and delegates to the appropriate command handler.

use verifier_cli::run_cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    run_cli().await
}
