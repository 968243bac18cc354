//! Request routing.
//!
//! The MCP handler hands each typed request to [`RequestRouter`], which
//! dispatches it to the tool registry or the resource catalog. Every failure
//! is a [`RouterError`], logged with its context and mapped to an MCP error.

use rmcp::ErrorData as McpError;
use rmcp::model::{
    CallToolResult, Content, ErrorCode, Implementation, JsonObject, ListResourcesResult,
    ListToolsResult, ProtocolVersion, ReadResourceResult, ServerCapabilities, ServerInfo,
};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, instrument};

use crate::domains::resources::{ResourceDescriptor, ResourceError, Resources};
use crate::domains::tools::{SchemaValidator, ToolError, ToolRegistry};

// ============================================================================
// Errors
// ============================================================================

/// Errors produced while answering a request.
#[derive(Debug, Error)]
pub enum RouterError {
    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// A result could not be encoded.
    #[error("Failed to encode result: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl RouterError {
    /// JSON-RPC error code for this failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Tool(ToolError::NotFound(_) | ToolError::InvalidInput { .. }) => {
                ErrorCode::INVALID_PARAMS
            }
            Self::Tool(ToolError::CallFailed { .. }) => ErrorCode::INTERNAL_ERROR,
            Self::Resource(ResourceError::NotConfigured) => ErrorCode::METHOD_NOT_FOUND,
            Self::Resource(e) if e.is_client_error() => ErrorCode::INVALID_PARAMS,
            Self::Resource(_) | Self::Encoding(_) => ErrorCode::INTERNAL_ERROR,
        }
    }

    /// Structured context, when the failure has any.
    pub fn context(&self) -> Option<Value> {
        match self {
            Self::Tool(e) => Some(e.context()),
            Self::Resource(e) => e.context(),
            Self::Encoding(_) => None,
        }
    }
}

impl From<RouterError> for McpError {
    fn from(err: RouterError) -> Self {
        McpError::new(err.code(), err.to_string(), err.context())
    }
}

// ============================================================================
// Router
// ============================================================================

/// Dispatches requests to tools and resources.
pub struct RequestRouter {
    server_info: Implementation,
    tools: Arc<ToolRegistry>,
    resources: Arc<Resources>,
    validator: Arc<dyn SchemaValidator>,
}

impl RequestRouter {
    /// Create a router over a tool registry and optional resources.
    pub fn new(
        server_info: Implementation,
        tools: Arc<ToolRegistry>,
        resources: Arc<Resources>,
        validator: Arc<dyn SchemaValidator>,
    ) -> Self {
        Self {
            server_info,
            tools,
            resources,
            validator,
        }
    }

    /// Handshake answer. Resources, with list-changed notifications, are
    /// only advertised when a catalog is configured.
    pub fn server_info(&self) -> ServerInfo {
        let capabilities = match self.resources.as_ref() {
            Resources::NoResources => ServerCapabilities::builder().enable_tools().build(),
            Resources::Configured(_) => ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .enable_resources_list_changed()
                .build(),
        };
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities,
            server_info: self.server_info.clone(),
            ..Default::default()
        }
    }

    pub fn list_tools(&self) -> ListToolsResult {
        ListToolsResult {
            tools: self.tools.list_tools(self.validator.as_ref()),
            next_cursor: None,
            meta: None,
        }
    }

    /// Validate, run and encode one tool call. The output is returned as a
    /// single text item holding its JSON encoding.
    #[instrument(skip(self, arguments))]
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<CallToolResult, RouterError> {
        debug!("Handling tool call");
        let args = Value::Object(arguments.unwrap_or_default());
        let result: Result<CallToolResult, RouterError> = async {
            let output = self
                .tools
                .call_tool(name, args, self.validator.as_ref())
                .await?;
            let text = serde_json::to_string(&output)?;
            Ok(CallToolResult::success(vec![Content::text(text)]))
        }
        .await;
        result.inspect_err(|e| log_failure("tools/call", e))
    }

    pub async fn list_resources(&self) -> Result<ListResourcesResult, RouterError> {
        let descriptors = match self.resources.as_ref() {
            Resources::NoResources => Vec::new(),
            Resources::Configured(catalog) => catalog
                .list_resources()
                .await
                .map_err(RouterError::from)
                .inspect_err(|e| log_failure("resources/list", e))?,
        };
        Ok(ListResourcesResult {
            resources: descriptors
                .into_iter()
                .map(ResourceDescriptor::into_resource)
                .collect(),
            next_cursor: None,
            meta: None,
        })
    }

    #[instrument(skip(self))]
    pub async fn read_resource(&self, uri: &str) -> Result<ReadResourceResult, RouterError> {
        let result = match self.resources.as_ref() {
            Resources::NoResources => Err(ResourceError::NotConfigured),
            Resources::Configured(catalog) => catalog.read_resource(uri).await,
        };
        result
            .map(|contents| ReadResourceResult {
                contents: vec![contents],
            })
            .map_err(RouterError::from)
            .inspect_err(|e| log_failure("resources/read", e))
    }
}

fn log_failure(method: &str, err: &RouterError) {
    match err.context() {
        Some(context) => error!(method, %context, "{}", err),
        None => error!(method, "{}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::resources::{
        DEFAULT_PATH_TEMPLATE, DEFAULT_URI_ROOT, ReadResourceParams, ResourceCatalog,
        ResourceType, ResourceUriSpec,
    };
    use crate::domains::tools::{SerdeSchemaValidator, Tool};
    use async_trait::async_trait;
    use rmcp::model::{RawContent, ResourceContents};
    use schemars::JsonSchema;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize, JsonSchema)]
    struct PointParams {
        x: i64,
    }

    struct Notes;

    #[async_trait]
    impl ResourceType for Notes {
        fn name(&self) -> &str {
            "notes"
        }

        fn mime_type(&self) -> &str {
            "text/plain"
        }

        async fn list(&self) -> anyhow::Result<Vec<ResourceDescriptor>> {
            Ok(vec![ResourceDescriptor {
                uri: "mcp://server/notes/a".to_string(),
                name: "a".to_string(),
                description: "Note a".to_string(),
                mime_type: "text/plain".to_string(),
                handle: "a".to_string(),
            }])
        }

        async fn read(&self, params: &ReadResourceParams) -> anyhow::Result<Value> {
            Ok(json!(format!("note {}", params["handle"])))
        }

        async fn hash(&self) -> anyhow::Result<String> {
            Ok("n".to_string())
        }
    }

    fn router(resources: Resources) -> RequestRouter {
        let tools = ToolRegistry::new([Tool::from_fn(
            "point",
            Some("Echo a point"),
            |p: PointParams| async move { Ok::<_, anyhow::Error>(json!({ "x": p.x })) },
        )]);
        RequestRouter::new(
            Implementation {
                name: "test".to_string(),
                version: "0.0.0".to_string(),
                ..Default::default()
            },
            Arc::new(tools),
            Arc::new(resources),
            Arc::new(SerdeSchemaValidator),
        )
    }

    fn with_notes() -> Resources {
        let spec = ResourceUriSpec::new(DEFAULT_URI_ROOT, DEFAULT_PATH_TEMPLATE).unwrap();
        Resources::Configured(ResourceCatalog::new(spec, [Arc::new(Notes) as Arc<dyn ResourceType>]))
    }

    fn arguments(value: Value) -> Option<JsonObject> {
        value.as_object().cloned()
    }

    #[test]
    fn test_server_info_advertises_resources() {
        let info = serde_json::to_value(router(with_notes()).server_info()).unwrap();
        assert_eq!(info["capabilities"]["resources"]["listChanged"], json!(true));
        assert!(info["capabilities"].get("tools").is_some());
        assert_eq!(info["serverInfo"]["name"], "test");
        assert_eq!(info["protocolVersion"], "2024-11-05");

        let info = serde_json::to_value(router(Resources::NoResources).server_info()).unwrap();
        assert!(info["capabilities"].get("resources").is_none());
    }

    #[tokio::test]
    async fn test_call_tool_output_is_json_text() {
        let result = router(Resources::NoResources)
            .call_tool("point", arguments(json!({ "x": 1 })))
            .await
            .unwrap();
        assert_ne!(result.is_error, Some(true));
        let text = match &result.content[0].raw {
            RawContent::Text(t) => t.text.as_str(),
            other => panic!("unexpected content: {other:?}"),
        };
        assert_eq!(serde_json::from_str::<Value>(text).unwrap(), json!({ "x": 1 }));
    }

    #[tokio::test]
    async fn test_call_tool_error_codes() {
        let router = router(Resources::NoResources);

        let err = router.call_tool("missing", None).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::INVALID_PARAMS);
        assert!(err.to_string().contains("Tool not found"));

        let err = router.call_tool("point", None).await.unwrap_err();
        let wire = McpError::from(err);
        assert_eq!(wire.code, ErrorCode::INVALID_PARAMS);
        assert_eq!(wire.data.unwrap()["args"], json!({}));
    }

    #[test]
    fn test_list_tools() {
        let result = router(Resources::NoResources).list_tools();
        assert_eq!(result.tools[0].name, "point");
        assert!(result.tools[0].input_schema["properties"].get("x").is_some());
    }

    #[tokio::test]
    async fn test_resources_not_configured() {
        let router = router(Resources::NoResources);
        let listed = router.list_resources().await.unwrap();
        assert!(listed.resources.is_empty());

        let err = router.read_resource("mcp://server/notes/a").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_resources() {
        let listed = router(with_notes()).list_resources().await.unwrap();
        let wire = serde_json::to_value(&listed.resources).unwrap();
        assert_eq!(wire.as_array().map(Vec::len), Some(1));
        assert_eq!(wire[0]["uri"], "mcp://server/notes/a");
        assert_eq!(wire[0]["name"], "a");
        assert_eq!(wire[0]["description"], "Note a");
        assert_eq!(wire[0]["mimeType"], "text/plain");
    }

    #[tokio::test]
    async fn test_read_resource() {
        let router = router(with_notes());
        let result = router.read_resource("mcp://server/notes/a").await.unwrap();
        match &result.contents[0] {
            ResourceContents::TextResourceContents {
                uri,
                mime_type,
                text,
                ..
            } => {
                assert_eq!(uri, "mcp://server/notes/a");
                assert_eq!(mime_type.as_deref(), Some("text/plain"));
                assert_eq!(text, "note a");
            }
            other => panic!("unexpected contents: {other:?}"),
        }

        let err = router.read_resource("mcp://server/other/a").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::INVALID_PARAMS);
    }
}
