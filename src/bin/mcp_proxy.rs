//! HTTP proxy entry point.
//!
//! Spawns the stdio MCP server named by `MCP_SERVER_PATH` and serves
//! `POST /tools/call` on `MCP_PROXY_HOST:MCP_PROXY_PORT`.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use mcp_bridge::core::init_logging;
use mcp_bridge::proxy::{self, ProxyConfig, StdioToolClient};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let level = std::env::var("MCP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    init_logging(&level);

    let config = ProxyConfig::from_env()?;

    let client = StdioToolClient::spawn(&config.server_path, &config.server_env_vars).await?;
    let app = proxy::router(Arc::new(client), config.enable_cors);

    let address = config.address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind to {address}"))?;

    info!("MCP proxy listening on http://{}", address);
    proxy::serve(listener, app).await?;

    Ok(())
}
