//! SQL MCP Server - Main entry point.
//!
//! This server provides an MCP (Model Context Protocol) `execute` tool for AI
//! assistants to run SQL statements against a MySQL server.

use sql_mcp_server::config::{Config, TransportMode};
use sql_mcp_server::db::{MySqlProvisioner, QueryExecutor};
use sql_mcp_server::transport::{HttpTransport, StdioTransport, Transport};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
///
/// Logs are written to stderr so they never mix with the stdio transport.
fn init_tracing(config: &Config) {
    if !config.enable_logs {
        return;
    }

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(false),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load();

    init_tracing(&config);

    info!(
        transport = %config.transport,
        mysql_host = %config.mysql_host,
        "Starting SQL MCP Server v{}",
        env!("CARGO_PKG_VERSION")
    );

    let provisioner = MySqlProvisioner::new(config.credentials());
    let executor = Arc::new(QueryExecutor::new(Arc::new(provisioner)));

    let result = match config.transport {
        TransportMode::Stdio => {
            info!("Using stdio transport");
            StdioTransport::new(executor).run().await
        }
        TransportMode::Http => {
            info!(
                host = %config.http_host,
                port = config.http_port,
                endpoint = %config.mcp_endpoint,
                "Using HTTP transport"
            );
            HttpTransport::new(
                executor,
                &config.http_host,
                config.http_port,
                &config.mcp_endpoint,
            )
            .run()
            .await
        }
    };

    if let Err(e) = result {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("Server shutdown complete");
    Ok(())
}
