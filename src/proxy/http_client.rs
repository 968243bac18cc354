//! Typed HTTP client for the proxy.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::bridge::TOOL_CALL_PATH;
use super::config::DEFAULT_PROXY_PORT;
use super::error::{ProxyError, UNKNOWN_ERROR};

#[derive(Serialize)]
struct ToolCallPayload<'a, I: ?Sized> {
    name: &'a str,
    input: &'a I,
}

/// Calls tools through a running proxy and decodes their output.
#[derive(Debug, Clone)]
pub struct ProxyClient {
    base_url: String,
    http: reqwest::Client,
}

impl Default for ProxyClient {
    fn default() -> Self {
        Self::with_base_url(format!("http://localhost:{DEFAULT_PROXY_PORT}"))
    }
}

impl ProxyClient {
    /// Create a client for a proxy on the default local port.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a client for a proxy at `base_url`.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// Get the proxy base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Call `name` with `input` and decode the output as `O`.
    pub async fn call_tool<I, O>(&self, name: &str, input: &I) -> Result<O, ProxyError>
    where
        I: Serialize + ?Sized,
        O: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, TOOL_CALL_PATH);
        debug!("POST {} ({})", url, name);

        let response = self
            .http
            .post(&url)
            .json(&ToolCallPayload { name, input })
            .send()
            .await
            .map_err(|e| ProxyError::call_failed(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ProxyError::call_failed(e.to_string()))?;
        let data: Value = serde_json::from_slice(&body)
            .map_err(|e| ProxyError::ErrorParsingToolResponse(e.to_string()))?;

        if status != reqwest::StatusCode::OK {
            let message = data
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or(UNKNOWN_ERROR);
            return Err(ProxyError::returned_error(message, Some(status.as_u16())));
        }

        serde_json::from_value(data).map_err(|e| ProxyError::InvalidToolOutput(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmcp::model::{CallToolResult, Content};
    use crate::proxy::bridge;
    use crate::proxy::client::ToolTransport;
    use async_trait::async_trait;
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::Arc;

    /// Echoes `text` back, or fails when asked to.
    struct EchoTransport;

    #[async_trait]
    impl ToolTransport for EchoTransport {
        async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult, ProxyError> {
            if name != "echo" {
                return Ok(CallToolResult::error(vec![Content::text(format!(
                    "Tool not found: {name}"
                ))]));
            }
            Ok(CallToolResult::success(vec![Content::text(arguments.to_string())]))
        }
    }

    #[derive(Debug, Deserialize)]
    struct Echoed {
        text: String,
    }

    #[derive(Debug, Deserialize)]
    struct Strict {
        #[allow(dead_code)]
        count: u32,
    }

    async fn start_proxy() -> ProxyClient {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = bridge::router(Arc::new(EchoTransport), false);
        tokio::spawn(bridge::serve(listener, app));
        ProxyClient::with_base_url(format!("http://{addr}/"))
    }

    #[test]
    fn test_default_base_url() {
        assert_eq!(ProxyClient::new().base_url(), "http://localhost:4444");
    }

    #[tokio::test]
    async fn test_call_round_trip() {
        let client = start_proxy().await;
        let echoed: Echoed = client.call_tool("echo", &json!({"text": "hi"})).await.unwrap();
        assert_eq!(echoed.text, "hi");
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let client = start_proxy().await;
        let err = client
            .call_tool::<_, Value>("missing", &json!({"x": 1}))
            .await
            .unwrap_err();
        match err {
            ProxyError::ToolCallReturnedError { message, status } => {
                assert!(message.contains("Tool not found: missing"));
                assert_eq!(status, Some(500));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_output_shape_is_checked() {
        let client = start_proxy().await;
        let err = client
            .call_tool::<_, Strict>("echo", &json!({"text": "hi"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProxyError::InvalidToolOutput(_)));
    }

    #[tokio::test]
    async fn test_unreachable_proxy() {
        let client = ProxyClient::with_base_url("http://127.0.0.1:1");
        let err = client
            .call_tool::<_, Value>("echo", &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProxyError::PerformingToolCallFailed(_)));
    }
}
