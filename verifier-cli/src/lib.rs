//! Verifier CLI Library
//!
//! Command-line front end for `lib-verifier`: verify a deployed contract
//! against its sources, inspect the comparable region of a bytecode string,
//! and list the compiler releases that can be used.
//!
//! ## Architecture
//!
//! - **Functional Core** (`logic/` module): Pure functions for validation and source handling
//! - **Imperative Shell** (`commands/` module): File reads, network calls and printing
//! - **Error Handling** (`error/` module): Structured, domain-specific error types
//! - **Output Abstraction** (`output/` module): Testable printing interface

pub mod argument_parsing;
pub mod cli_config;
pub mod commands;
pub mod error;
pub mod logic;
pub mod output;

pub use argument_parsing::{format_output, run_cli, VerifierCli, VerifierCommand};
pub use error::{CliError, CliResult};
pub use output::Output;

/// Verifier CLI version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
