//! Server info resource type.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Value, json};

use crate::domains::resources::{
    JSON_MIME_TYPE, ReadResourceParams, ResourceDescriptor, ResourceType, ResourceUriSpec,
};

/// A single JSON document describing the running server.
#[derive(Debug, Clone)]
pub struct ServerInfoResourceType {
    server_name: String,
    started_at: DateTime<Utc>,
    uri: ResourceUriSpec,
}

impl ServerInfoResourceType {
    /// Type name used in resource URIs.
    pub const NAME: &'static str = "server_info";

    pub fn new(server_name: impl Into<String>, uri: ResourceUriSpec) -> Self {
        Self {
            server_name: server_name.into(),
            started_at: Utc::now(),
            uri,
        }
    }
}

#[async_trait]
impl ResourceType for ServerInfoResourceType {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn mime_type(&self) -> &str {
        JSON_MIME_TYPE
    }

    async fn list(&self) -> anyhow::Result<Vec<ResourceDescriptor>> {
        let uri = self
            .uri
            .uri_for(Self::NAME, None)
            .ok_or_else(|| anyhow::anyhow!("Path template requires a handle"))?;
        Ok(vec![ResourceDescriptor {
            uri,
            name: "Server Information".to_string(),
            description: "Information about this MCP server".to_string(),
            mime_type: JSON_MIME_TYPE.to_string(),
            handle: String::new(),
        }])
    }

    async fn read(&self, _params: &ReadResourceParams) -> anyhow::Result<Value> {
        Ok(json!({
            "server": self.server_name,
            "version": env!("CARGO_PKG_VERSION"),
            "startedAt": self.started_at.to_rfc3339(),
            "uptimeSeconds": (Utc::now() - self.started_at).num_seconds(),
        }))
    }

    async fn hash(&self) -> anyhow::Result<String> {
        Ok(format!("{}@{}", self.server_name, env!("CARGO_PKG_VERSION")))
    }
}
