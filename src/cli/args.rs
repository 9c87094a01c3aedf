//! CLI argument definitions using clap
//!
//! Commands:
//! - cosmos-sidecar serve --config <path> [--port <port>]
//! - cosmos-sidecar query --config <path> --container <name>
//! - cosmos-sidecar check-config --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_PATH: &str = "./cosmos-sidecar.json";

/// Query sidecar for a document database container
#[derive(Parser, Debug)]
#[command(name = "cosmos-sidecar")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP server
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        /// Override the configured listen port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Execute a single query read from stdin and exit
    Query {
        /// Path to configuration file
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        /// Target container
        #[arg(long)]
        container: String,

        /// Partition key value
        #[arg(long)]
        pk: Option<String>,

        /// Page size
        #[arg(long)]
        max_item_count: Option<i64>,

        /// Continuation token from a previous page
        #[arg(long)]
        ct: Option<String>,
    },

    /// Load and validate the configuration
    CheckConfig {
        /// Path to configuration file
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
