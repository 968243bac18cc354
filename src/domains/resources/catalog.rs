//! Resource catalog.
//!
//! The catalog owns the URI scheme (root + path template) and the configured
//! resource types. It resolves a URI to a type, fans listing and hashing out
//! to every type, and summarizes the whole catalog into one fingerprint.

use async_trait::async_trait;
use futures::future::try_join_all;
use rmcp::model::{AnnotateAble, RawResource, Resource, ResourceContents};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use super::error::ResourceError;
use super::template::{PathTemplate, ReadResourceParams};

/// Mime type whose payloads are always JSON encoded.
pub const JSON_MIME_TYPE: &str = "application/json";

/// Parameter every path template must bind.
pub const RESOURCE_TYPE_PARAM: &str = "resourceType";

/// Parameter the default template uses for a resource's own identifier.
pub const HANDLE_PARAM: &str = "handle";

/// Default URI root.
pub const DEFAULT_URI_ROOT: &str = "mcp://server";

/// Default path template.
pub const DEFAULT_PATH_TEMPLATE: &str = "/:resourceType/:handle?";

/// Separator between per-type hashes in the fingerprint input.
const FINGERPRINT_DELIMITER: &str = "|";

// ============================================================================
// Descriptor
// ============================================================================

/// One listed resource, as a resource type describes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDescriptor {
    pub uri: String,
    pub name: String,
    pub description: String,
    pub mime_type: String,
    /// Opaque identifier owned by the resource type.
    pub handle: String,
}

impl ResourceDescriptor {
    /// Listing entry as served to MCP clients. The handle stays server side.
    pub fn into_resource(self) -> Resource {
        let mut raw = RawResource::new(self.uri, self.name);
        raw.description = Some(self.description);
        raw.mime_type = Some(self.mime_type);
        raw.no_annotation()
    }
}

// ============================================================================
// Resource Type
// ============================================================================

/// A group of resources sharing a name, a mime type and list/read/hash logic.
#[async_trait]
pub trait ResourceType: Send + Sync {
    /// Type name, matched against the `resourceType` URI segment.
    fn name(&self) -> &str;

    /// Mime type of every resource of this type.
    fn mime_type(&self) -> &str;

    /// List the resources currently available.
    async fn list(&self) -> anyhow::Result<Vec<ResourceDescriptor>>;

    /// Read one resource addressed by the matched URI parameters.
    async fn read(&self, params: &ReadResourceParams) -> anyhow::Result<Value>;

    /// Digest of the current listing; changes whenever the listing does.
    async fn hash(&self) -> anyhow::Result<String>;
}

// ============================================================================
// URI Spec
// ============================================================================

/// URI root plus compiled path template.
#[derive(Debug, Clone)]
pub struct ResourceUriSpec {
    root: String,
    template: PathTemplate,
}

impl ResourceUriSpec {
    /// Compile a URI spec; the template must bind `resourceType`.
    pub fn new(root: impl Into<String>, path_template: &str) -> Result<Self, ResourceError> {
        let root = root.into();
        let root = root.strip_suffix('/').unwrap_or(root.as_str()).to_string();

        let template = PathTemplate::parse(path_template)?;
        if !template.has_param(RESOURCE_TYPE_PARAM) {
            return Err(ResourceError::invalid_template(
                path_template,
                format!("missing the '{RESOURCE_TYPE_PARAM}' parameter"),
            ));
        }
        Ok(Self { root, template })
    }

    /// The URI root, without a trailing slash.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// The compiled path template.
    pub fn template(&self) -> &PathTemplate {
        &self.template
    }

    /// Resolve a URI to its matched parameters.
    pub fn locate(&self, uri: &str) -> Result<ReadResourceParams, ResourceError> {
        let path = uri
            .strip_prefix(self.root.as_str())
            .filter(|rest| rest.starts_with('/'))
            .ok_or_else(|| ResourceError::invalid_uri(uri))?;

        self.template
            .matches(path)
            .filter(|params| params.contains_key(RESOURCE_TYPE_PARAM))
            .ok_or_else(|| ResourceError::invalid_uri(uri))
    }

    /// Build the URI of a resource of `resource_type` identified by `handle`.
    pub fn uri_for(&self, resource_type: &str, handle: Option<&str>) -> Option<String> {
        let mut params = ReadResourceParams::new();
        params.insert(RESOURCE_TYPE_PARAM.to_string(), resource_type.to_string());
        if let Some(handle) = handle {
            params.insert(HANDLE_PARAM.to_string(), handle.to_string());
        }
        self.template
            .render(&params)
            .map(|path| format!("{}{}", self.root, path))
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// The configured resource types, indexed by name.
pub struct ResourceCatalog {
    uri: ResourceUriSpec,
    types: Vec<Arc<dyn ResourceType>>,
    index: HashMap<String, usize>,
}

impl ResourceCatalog {
    /// Build a catalog. A later type with an already-used name replaces the earlier one.
    pub fn new(uri: ResourceUriSpec, types: impl IntoIterator<Item = Arc<dyn ResourceType>>) -> Self {
        let mut catalog = Self {
            uri,
            types: Vec::new(),
            index: HashMap::new(),
        };
        for resource_type in types {
            let name = resource_type.name().to_string();
            match catalog.index.get(&name) {
                Some(&slot) => {
                    warn!("Resource type '{}' registered twice; keeping the last one", name);
                    catalog.types[slot] = resource_type;
                }
                None => {
                    catalog.index.insert(name, catalog.types.len());
                    catalog.types.push(resource_type);
                }
            }
        }
        catalog
    }

    /// The URI spec of this catalog.
    pub fn uri_spec(&self) -> &ResourceUriSpec {
        &self.uri
    }

    /// Number of configured types.
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Look a type up by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn ResourceType>> {
        self.index.get(name).map(|&slot| &self.types[slot])
    }

    /// List every type's resources concurrently; any failure fails the whole listing.
    pub async fn list_resources(&self) -> Result<Vec<ResourceDescriptor>, ResourceError> {
        let listings = try_join_all(self.types.iter().map(|t| t.list()))
            .await
            .map_err(ResourceError::listing_failed)?;
        Ok(listings.into_iter().flatten().collect())
    }

    /// Resolve and read one resource.
    pub async fn read_resource(&self, uri: &str) -> Result<ResourceContents, ResourceError> {
        let params = self.uri.locate(uri)?;
        let type_name = params
            .get(RESOURCE_TYPE_PARAM)
            .ok_or_else(|| ResourceError::invalid_uri(uri))?;
        let resource_type = self
            .get(type_name)
            .ok_or_else(|| ResourceError::unknown_type(type_name.as_str()))?;

        debug!("Reading resource {} from type '{}'", uri, type_name);
        let payload = resource_type
            .read(&params)
            .await
            .map_err(|source| ResourceError::reading_failed(uri, source))?;

        let mime_type = resource_type.mime_type();
        Ok(ResourceContents::TextResourceContents {
            uri: uri.to_string(),
            mime_type: Some(mime_type.to_string()),
            text: render_payload(mime_type, payload),
            meta: None,
        })
    }

    /// SHA-256 over the `|`-joined per-type hashes, hex encoded.
    pub async fn fingerprint(&self) -> Result<String, ResourceError> {
        let hashes = try_join_all(self.types.iter().map(|t| t.hash()))
            .await
            .map_err(ResourceError::hashing_failed)?;

        let digest = Sha256::digest(hashes.join(FINGERPRINT_DELIMITER).as_bytes());
        Ok(hex::encode(digest))
    }
}

impl std::fmt::Debug for ResourceCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceCatalog")
            .field("uri", &self.uri)
            .field("types", &self.index.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// JSON mime types get the JSON encoding; otherwise strings pass verbatim.
fn render_payload(mime_type: &str, payload: Value) -> String {
    match payload {
        Value::String(text) if mime_type != JSON_MIME_TYPE => text,
        other => other.to_string(),
    }
}

// ============================================================================
// Resources
// ============================================================================

/// Optional resource support of a server.
#[derive(Debug, Default)]
pub enum Resources {
    /// The server exposes no resources.
    #[default]
    NoResources,
    /// The server exposes the resources of a catalog.
    Configured(ResourceCatalog),
}

impl Resources {
    /// The catalog, when configured.
    pub fn catalog(&self) -> Option<&ResourceCatalog> {
        match self {
            Self::NoResources => None,
            Self::Configured(catalog) => Some(catalog),
        }
    }

    /// Whether at least one resource type is configured.
    pub fn has_types(&self) -> bool {
        self.catalog().is_some_and(|c| c.type_count() > 0)
    }
}
