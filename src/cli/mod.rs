//! CLI module
//!
//! Provides command-line interface for:
//! - serve: Run the HTTP sidecar
//! - query: One-shot query execution (stdin to stdout)
//! - check-config: Validate a configuration file

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, DEFAULT_CONFIG_PATH};
pub use commands::{check_config, query, run, run_command, serve};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_query_request, write_json};
