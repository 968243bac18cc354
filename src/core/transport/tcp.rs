//! TCP transport.
//!
//! Every accepted socket becomes its own MCP session; all sessions share one
//! server, so resource change notifications reach each of them.

use rmcp::ServiceExt;
use tokio::net::{TcpListener, TcpStream};
use tracing::{info, warn};

use super::{LineTransport, TransportError, TransportResult, config::TcpConfig};
use crate::core::McpServer;

/// Accept loop over a TCP listener.
pub struct TcpTransport {
    config: TcpConfig,
}

impl TcpTransport {
    pub fn new(config: TcpConfig) -> Self {
        Self { config }
    }

    /// Bind and serve sessions until the process exits.
    pub async fn run(self, server: McpServer) -> TransportResult<()> {
        let addr = self.config.address();

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| TransportError::bind(&addr, e))?;

        info!("Listening for MCP sessions on {}", addr);

        loop {
            match listener.accept().await {
                Ok((stream, peer_addr)) => {
                    info!("Session opened by {}", peer_addr);

                    // Frames are small and latency-bound.
                    if let Err(e) = stream.set_nodelay(true) {
                        warn!("Failed to set TCP_NODELAY for {}: {}", peer_addr, e);
                    }

                    tokio::spawn(Self::handle_connection(server.clone(), stream, peer_addr));
                }
                Err(e) => {
                    warn!("Failed to accept connection: {}", e);
                    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
                }
            }
        }
    }

    async fn handle_connection(server: McpServer, stream: TcpStream, peer_addr: std::net::SocketAddr) {
        let (reader, writer) = stream.into_split();
        let service = match server.serve(LineTransport::new(reader, writer)).await {
            Ok(service) => service,
            Err(e) => {
                warn!("Handshake with {} failed: {}", peer_addr, e);
                return;
            }
        };

        match service.waiting().await {
            Ok(reason) => info!("Session with {} closed: {:?}", peer_addr, reason),
            Err(e) => warn!("Session with {} failed: {}", peer_addr, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Config;
    use crate::domains::resources::Resources;
    use crate::domains::tools::ToolRegistry;
    use serde_json::Value;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

    #[tokio::test]
    async fn test_tcp_ping() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = McpServer::new(Config::default(), ToolRegistry::default(), Resources::NoResources);

        tokio::spawn(async move {
            let (stream, peer) = listener.accept().await.unwrap();
            TcpTransport::handle_connection(server, stream, peer).await;
        });

        let stream = TcpStream::connect(addr).await.unwrap();
        let (reader, mut writer) = stream.into_split();
        let mut lines = BufReader::new(reader).lines();

        writer
            .write_all(
                concat!(
                    r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05","capabilities":{},"clientInfo":{"name":"t","version":"1"}}}"#,
                    "\n",
                    r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
                    "\n",
                    r#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#,
                    "\n"
                )
                .as_bytes(),
            )
            .await
            .unwrap();

        let line = lines.next_line().await.unwrap().unwrap();
        let handshake: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(handshake["id"], 1);
        assert!(handshake["result"]["serverInfo"]["name"].is_string());

        let line = lines.next_line().await.unwrap().unwrap();
        let reply: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(reply["id"], 2);
        assert_eq!(reply["result"], serde_json::json!({}));
    }

    #[tokio::test]
    async fn test_bind_failure_is_reported() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = taken.local_addr().unwrap().port();
        let server = McpServer::new(Config::default(), ToolRegistry::default(), Resources::NoResources);

        let transport = TcpTransport::new(TcpConfig {
            port,
            host: "127.0.0.1".to_string(),
        });
        let err = transport.run(server).await.unwrap_err();
        assert!(matches!(err, TransportError::Bind { .. }));
    }
}
