//! Client side of the stdio tool server connection.
//!
//! [`StdioToolClient`] spawns the child server through rmcp's child-process
//! transport, performs the MCP handshake as a client and forwards
//! `tools/call` requests over the child's stdin/stdout.

use async_trait::async_trait;
use rmcp::model::{
    CallToolRequestParam, CallToolResult, ClientCapabilities, ClientInfo, Implementation,
    ProtocolVersion,
};
use rmcp::service::RunningService;
use rmcp::transport::TokioChildProcess;
use rmcp::{RoleClient, ServiceExt};
use serde_json::{Value, json};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::config::DEFAULT_CHILD_ENV;
use super::error::ProxyError;

/// Name the proxy reports to the child server.
pub const CLIENT_NAME: &str = "stdio-proxy-client";

/// Version the proxy reports to the child server.
pub const CLIENT_VERSION: &str = "1.0.0";

/// Anything able to carry a tool call to an MCP server.
#[async_trait]
pub trait ToolTransport: Send + Sync {
    /// Invoke `name` with `arguments` and return the raw tool result.
    async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult, ProxyError>;
}

/// Connection to an MCP server running as a child process.
pub struct StdioToolClient {
    service: RunningService<RoleClient, ClientInfo>,
}

impl StdioToolClient {
    /// Spawn the server at `program` and complete the initialize handshake.
    ///
    /// The child inherits only a minimal environment plus the variables
    /// named in `forwarded_env`.
    pub async fn spawn(program: &Path, forwarded_env: &[String]) -> Result<Self, ProxyError> {
        let mut command = Command::new(program);
        command
            .env_clear()
            .envs(child_env(forwarded_env, |name| std::env::var(name).ok()))
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let transport = TokioChildProcess::new(command).map_err(|e| {
            ProxyError::connection(format!("failed to spawn {}: {}", program.display(), e))
        })?;

        let service = client_info()
            .serve(transport)
            .await
            .map_err(|e| ProxyError::connection(e.to_string()))?;

        let client = Self { service };
        match client.service.peer_info() {
            Some(info) => {
                if info.protocol_version != ProtocolVersion::V_2024_11_05 {
                    warn!(
                        "MCP server answered with protocol version {:?}",
                        info.protocol_version
                    );
                }
                info!(
                    "Connected to MCP server '{}' {}",
                    info.server_info.name, info.server_info.version
                );
            }
            None => debug!("Connected to MCP server"),
        }
        Ok(client)
    }

    /// Identity the child server reported during the handshake.
    pub fn server_info(&self) -> Option<&Implementation> {
        self.service.peer_info().map(|info| &info.server_info)
    }
}

#[async_trait]
impl ToolTransport for StdioToolClient {
    async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult, ProxyError> {
        let params = call_params(name, arguments)?;
        self.service
            .call_tool(params)
            .await
            .map_err(|e| ProxyError::call_failed(e.to_string()))
    }
}

fn client_info() -> ClientInfo {
    ClientInfo {
        protocol_version: ProtocolVersion::V_2024_11_05,
        capabilities: ClientCapabilities::default(),
        client_info: Implementation {
            name: CLIENT_NAME.to_string(),
            version: CLIENT_VERSION.to_string(),
            ..Default::default()
        },
    }
}

/// `tools/call` params. MCP arguments are always a JSON object.
fn call_params(name: &str, arguments: Value) -> Result<CallToolRequestParam, ProxyError> {
    if !arguments.is_object() {
        return Err(ProxyError::call_failed("tool arguments must be a JSON object"));
    }
    serde_json::from_value(json!({ "name": name, "arguments": arguments }))
        .map_err(|e| ProxyError::call_failed(e.to_string()))
}

/// Build the child's environment: the minimal defaults plus forwarded names.
///
/// Unset variables are passed through as empty strings.
fn child_env(
    forwarded: &[String],
    lookup: impl Fn(&str) -> Option<String>,
) -> Vec<(String, String)> {
    let mut env: Vec<(String, String)> = Vec::new();
    let names = DEFAULT_CHILD_ENV
        .iter()
        .copied()
        .chain(forwarded.iter().map(String::as_str));

    for name in names {
        if env.iter().any(|(existing, _)| existing == name) {
            continue;
        }
        env.push((name.to_string(), lookup(name).unwrap_or_default()));
    }
    env
}
