//! MCP Server Entry Point
//!
//! Loads configuration, initializes logging and serves the built-in tools
//! and resources over the configured transport.

use anyhow::Result;
use tracing::info;

use mcp_bridge::core::{Config, McpServer, TransportService, init_logging};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration from environment
    let config = Config::from_env();

    init_logging(&config.logging.level);

    info!("Starting {} v{}", config.server.name, config.server.version);

    let server = McpServer::from_config(config.clone())?;

    info!("Server initialized");

    let transport = TransportService::new(config.transport);
    transport.run(server).await?;

    info!("Server shutting down");

    Ok(())
}
