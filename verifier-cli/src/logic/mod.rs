//! Pure functional business logic
//!
//! Functions here take inputs and return outputs without I/O, so they can be
//! tested directly and composed by the command handlers.

pub mod config;
pub mod paths;
pub mod sources;

pub use config::{validate_cache_capacity, validate_timeout_secs, validate_url, OutputFormat};
pub use paths::expand_home_directory;
pub use sources::{ensure_contract_file, source_key, trim_bytecode_text};
