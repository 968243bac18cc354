//! STDIO transport: a single session over the process's stdin and stdout.

use rmcp::ServiceExt;
use tracing::info;

use super::{LineTransport, TransportError, TransportResult};
use crate::core::McpServer;

pub struct StdioTransport;

impl StdioTransport {
    /// Run the STDIO transport until stdin closes.
    pub async fn run(server: McpServer) -> TransportResult<()> {
        info!("Waiting for MCP frames on stdin");

        let service = server
            .serve(LineTransport::new(tokio::io::stdin(), tokio::io::stdout()))
            .await
            .map_err(|e| TransportError::init(e.to_string()))?;

        let reason = service
            .waiting()
            .await
            .map_err(|e| TransportError::Service(e.to_string()))?;

        info!("STDIO session finished: {:?}", reason);
        Ok(())
    }
}
