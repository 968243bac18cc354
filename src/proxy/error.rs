//! Proxy error types.

use std::path::PathBuf;
use thiserror::Error;

/// Message used when a failed tool call carries no text.
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// Errors raised by the HTTP proxy, its child-process client and its HTTP client.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// `MCP_SERVER_PATH` is missing or empty.
    #[error("Environment variable \"MCP_SERVER_PATH\" not set")]
    ServerPathNotSet,

    /// `MCP_SERVER_PATH` does not resolve to an existing file.
    #[error("MCP stdio server file not found: {}", path.display())]
    ServerFileNotFound { path: PathBuf },

    /// A configuration value is malformed.
    #[error("Invalid configuration value for {name}: '{value}'")]
    InvalidConfig { name: &'static str, value: String },

    /// Spawning or handshaking with the child server failed, or it went away.
    #[error("Failed to connect to MCP server: {0}")]
    Connection(String),

    /// The HTTP body is not a `{name, input}` tool call.
    #[error("Invalid tool call payload: {0}")]
    InvalidPayload(String),

    /// The call could not be carried out at the transport level.
    #[error("Failed to perform tool call: {0}")]
    PerformingToolCallFailed(String),

    /// The first content item of the result is not text.
    #[error("Unsupported tool call result content type: {0}")]
    UnsupportedContentType(String),

    /// The tool reported an error.
    #[error("Tool call returned error: {message}")]
    ToolCallReturnedError {
        message: String,
        /// HTTP status, when the error came back through the proxy.
        status: Option<u16>,
    },

    /// The tool's text output is not JSON.
    #[error("Error parsing tool response: {0}")]
    ErrorParsingToolResponse(String),

    /// The tool's output does not decode into the expected type.
    #[error("Invalid tool output: {0}")]
    InvalidToolOutput(String),

    /// No route matches the HTTP request.
    #[error("Route not supported")]
    RouteNotSupported,
}

impl ProxyError {
    /// Create a new connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a new "invalid payload" error.
    pub fn invalid_payload(msg: impl Into<String>) -> Self {
        Self::InvalidPayload(msg.into())
    }

    /// Create a new "tool call failed" error.
    pub fn call_failed(msg: impl Into<String>) -> Self {
        Self::PerformingToolCallFailed(msg.into())
    }

    /// Create a new "tool returned error" error.
    pub fn returned_error(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::ToolCallReturnedError {
            message: message.into(),
            status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            ProxyError::ServerPathNotSet.to_string(),
            "Environment variable \"MCP_SERVER_PATH\" not set"
        );
        assert_eq!(ProxyError::RouteNotSupported.to_string(), "Route not supported");
        assert_eq!(
            ProxyError::returned_error("boom", None).to_string(),
            "Tool call returned error: boom"
        );
    }
}
