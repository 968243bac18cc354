//! HTTP proxy in front of a stdio MCP tool server.
//!
//! The `mcp_proxy` binary spawns the server named by `MCP_SERVER_PATH`,
//! keeps one [`StdioToolClient`] connection to it and serves
//! `POST /tools/call` over HTTP. [`ProxyClient`] is the matching typed caller.

pub mod bridge;
pub mod client;
pub mod config;
pub mod error;
pub mod http_client;

pub use bridge::{TOOL_CALL_PATH, forward_tool_call, interpret_result, router, serve};
pub use client::{StdioToolClient, ToolTransport};
pub use config::{DEFAULT_PROXY_PORT, ProxyConfig};
pub use error::ProxyError;
pub use http_client::ProxyClient;
