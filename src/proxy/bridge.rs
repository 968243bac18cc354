//! HTTP front of the stdio proxy.
//!
//! Exposes a single route, `POST /tools/call`, accepting `{name, input}`
//! and answering with the tool's parsed JSON output. Every other method
//! or path gets a 404.

use axum::Router;
use axum::extract::State;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::post;
use bytes::Bytes;
use http::StatusCode;
use rmcp::model::{CallToolResult, RawContent};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use super::client::ToolTransport;
use super::error::{ProxyError, UNKNOWN_ERROR};

/// The one route the proxy serves.
pub const TOOL_CALL_PATH: &str = "/tools/call";

#[derive(Clone)]
struct BridgeState {
    transport: Arc<dyn ToolTransport>,
}

/// Build the proxy's router over `transport`.
pub fn router(transport: Arc<dyn ToolTransport>, enable_cors: bool) -> Router {
    let router = Router::new()
        .route(TOOL_CALL_PATH, post(call_tool).fallback(route_not_supported))
        .fallback(route_not_supported)
        .with_state(BridgeState { transport })
        .layer(TraceLayer::new_for_http());

    if enable_cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

/// Serve `app` on an already bound listener until the process exits.
pub async fn serve(listener: tokio::net::TcpListener, app: Router) -> std::io::Result<()> {
    axum::serve(listener, app).await
}

async fn call_tool(State(state): State<BridgeState>, body: Bytes) -> Response {
    let (name, input) = match parse_payload(&body) {
        Ok(payload) => payload,
        Err(e) => {
            error!("Rejecting tool call: {}", e);
            return error_response(&e);
        }
    };

    match forward_tool_call(state.transport.as_ref(), &name, input).await {
        Ok(output) => (StatusCode::OK, Json(output)).into_response(),
        Err(e) => {
            error!("Tool call '{}' failed: {}", name, e);
            error_response(&e)
        }
    }
}

async fn route_not_supported() -> Response {
    error_response(&ProxyError::RouteNotSupported)
}

/// Call a tool and turn its text result into JSON.
pub async fn forward_tool_call(
    transport: &dyn ToolTransport,
    name: &str,
    input: Value,
) -> Result<Value, ProxyError> {
    let result = transport.call_tool(name, input).await?;
    interpret_result(result)
}

/// Extract the JSON output of a tool result.
///
/// Only results whose first content item is text are understood.
pub fn interpret_result(result: CallToolResult) -> Result<Value, ProxyError> {
    let Some(first) = result.content.into_iter().next() else {
        return Err(ProxyError::UnsupportedContentType("no content".to_string()));
    };
    let text = match first.raw {
        RawContent::Text(text) => text.text,
        other => return Err(ProxyError::UnsupportedContentType(content_kind(&other))),
    };

    if result.is_error == Some(true) {
        let message = if text.is_empty() { UNKNOWN_ERROR.to_string() } else { text };
        return Err(ProxyError::returned_error(message, None));
    }

    serde_json::from_str(&text).map_err(|e| ProxyError::ErrorParsingToolResponse(e.to_string()))
}

/// The wire `type` tag of a content item.
fn content_kind(content: &RawContent) -> String {
    serde_json::to_value(content)
        .ok()
        .and_then(|value| value.get("type")?.as_str().map(str::to_string))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Decode `{name, input}`; both must be present and truthy.
fn parse_payload(body: &[u8]) -> Result<(String, Value), ProxyError> {
    let mut payload: Value =
        serde_json::from_slice(body).map_err(|e| ProxyError::invalid_payload(e.to_string()))?;

    let name = payload.get("name").filter(|v| is_truthy(v));
    let input = payload.get("input").filter(|v| is_truthy(v));
    if name.is_none() || input.is_none() {
        return Err(ProxyError::invalid_payload("expected non-empty 'name' and 'input'"));
    }

    let name = name
        .and_then(Value::as_str)
        .ok_or_else(|| ProxyError::invalid_payload("'name' must be a string"))?
        .to_string();
    let input = payload
        .get_mut("input")
        .map(Value::take)
        .unwrap_or_else(|| json!({}));

    Ok((name, input))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn status_for(error: &ProxyError) -> StatusCode {
    match error {
        ProxyError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
        ProxyError::RouteNotSupported => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(error: &ProxyError) -> Response {
    (status_for(error), Json(json!({ "error": error.to_string() }))).into_response()
}
