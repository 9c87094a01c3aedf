//! CLI command implementations
//!
//! Each command loads configuration first and fails before touching the
//! network when it is invalid.

use std::path::Path;
use std::sync::Arc;

use serde_json::json;

use crate::config::SidecarConfig;
use crate::gateway::CosmosGatewayClient;
use crate::http_server::HttpServer;
use crate::observability::{log_event, log_event_with_fields, Event};
use crate::query::{CallContext, QueryOptions, QueryService};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{read_request, write_json};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Serve { config, port } => serve(&config, port),
        Command::Query {
            config,
            container,
            pk,
            max_item_count,
            ct,
        } => query(
            &config,
            &container,
            QueryOptions::new(pk, max_item_count, ct),
        ),
        Command::CheckConfig { config } => check_config(&config),
    }
}

/// Build the shared query service from configuration
fn build_service(config: &SidecarConfig) -> CliResult<Arc<QueryService>> {
    let client = CosmosGatewayClient::from_config(&config.cosmos)?;
    Ok(Arc::new(QueryService::new(Arc::new(client))))
}

fn runtime() -> CliResult<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))
}

/// Start the HTTP server
///
/// Startup sequence:
/// 1. Configuration load (file, environment, `--port`)
/// 2. Gateway client construction
/// 3. Listener bind and serve until Ctrl-C
pub fn serve(config_path: &Path, port: Option<u16>) -> CliResult<()> {
    log_event(Event::BootStart);

    let result = boot_and_serve(config_path, port);
    if let Err(e) = &result {
        log_event_with_fields(
            Event::BootFailed,
            &[("code", e.code_str()), ("message", e.message())],
        );
    }
    result
}

fn boot_and_serve(config_path: &Path, port: Option<u16>) -> CliResult<()> {
    let mut config = SidecarConfig::load(config_path)?;
    if let Some(port) = port {
        config.server.port = port;
        config.validate()?;
    }

    let path = config_path.display().to_string();
    let port_str = config.server.port.to_string();
    log_event_with_fields(
        Event::ConfigLoaded,
        &[
            ("database", config.cosmos.database.as_str()),
            ("endpoint", config.cosmos.endpoint.as_str()),
            ("path", path.as_str()),
            ("port", port_str.as_str()),
        ],
    );

    let service = build_service(&config)?;
    let server = HttpServer::new(service, config.server.clone());

    let rt = runtime()?;
    rt.block_on(async {
        server
            .start()
            .await
            .map_err(|e| CliError::boot_failed(format!("HTTP server failed: {}", e)))
    })
}

/// Execute a single query and exit
///
/// Reads a `QueryRequest` from stdin and prints the envelope to stdout.
/// A failure envelope is still printed, then reported as an error so the
/// process exits non-zero.
pub fn query(config_path: &Path, container: &str, options: QueryOptions) -> CliResult<()> {
    let config = SidecarConfig::load(config_path)?;
    let request = read_request()?;
    let service = build_service(&config)?;

    let rt = runtime()?;
    let response = rt.block_on(service.execute(
        container,
        &request,
        &options,
        &CallContext::default(),
    ));

    write_json(&response)?;

    match &response.error {
        None => Ok(()),
        Some(error) => Err(CliError::query_failed(format!(
            "{}: {}",
            error.code, error.message
        ))),
    }
}

/// Load and validate configuration, printing a summary without the key
pub fn check_config(config_path: &Path) -> CliResult<()> {
    let config = SidecarConfig::load(config_path)?;

    write_json(&json!({
        "status": "ok",
        "data": config,
    }))
}
