//! MCP Server implementation and lifecycle management.
//!
//! [`McpServer`] implements rmcp's `ServerHandler` as thin adapters over the
//! request router, and ties each initialized session to the change detector
//! so resource list changes reach every connected peer.

use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler,
    model::*,
    service::{NotificationContext, Peer, RequestContext},
};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, instrument, warn};

use super::config::Config;
use super::error::Result;
use super::router::RequestRouter;
use crate::domains::resources::definitions::{FilesResourceType, ServerInfoResourceType};
use crate::domains::resources::{
    ChangeDetector, ResourceCatalog, ResourceListChanged, ResourceType, Resources,
};
use crate::domains::tools::definitions::{EchoTool, FsListDirTool};
use crate::domains::tools::{SchemaValidator, SerdeSchemaValidator, Tool, ToolRegistry};

/// Capacity of the outbound notification channel.
const NOTIFICATION_CAPACITY: usize = 64;

/// The main MCP server handler.
///
/// Cheap to clone; every clone shares the same router and detector.
#[derive(Clone)]
pub struct McpServer {
    /// Server configuration.
    config: Arc<Config>,

    /// Request dispatch.
    router: Arc<RequestRouter>,

    /// Resource list change detection.
    detector: Arc<ChangeDetector>,

    /// Change events, fanned out to every session.
    notifications: broadcast::Sender<ResourceListChanged>,
}

impl McpServer {
    /// Create a server hosting the built-in tools and resource types.
    ///
    /// `files` is only served when a resources base path is configured.
    /// Fails when the resource URI template is invalid.
    pub fn from_config(config: Config) -> Result<Self> {
        let base_path = config.resources.base_path.clone();

        let tools = ToolRegistry::new([
            Tool::from_definition(EchoTool),
            Tool::from_definition(FsListDirTool::new(base_path.clone())),
        ]);

        let spec = config.resources.uri_spec()?;
        let mut types: Vec<Arc<dyn ResourceType>> = vec![Arc::new(ServerInfoResourceType::new(
            config.server.name.clone(),
            spec.clone(),
        ))];
        if let Some(base_path) = base_path {
            types.push(Arc::new(FilesResourceType::new(base_path, spec.clone())));
        }
        let resources = Resources::Configured(ResourceCatalog::new(spec, types));

        info!(
            "Hosting {} tools and {} resource types",
            tools.len(),
            resources.catalog().map_or(0, ResourceCatalog::type_count)
        );

        Ok(Self::new(config, tools, resources))
    }

    /// Create a new MCP server validating tool input with serde.
    pub fn new(config: Config, tools: ToolRegistry, resources: Resources) -> Self {
        Self::with_validator(config, tools, resources, Arc::new(SerdeSchemaValidator))
    }

    /// Create a new MCP server with a custom schema validator.
    pub fn with_validator(
        config: Config,
        tools: ToolRegistry,
        resources: Resources,
        validator: Arc<dyn SchemaValidator>,
    ) -> Self {
        let config = Arc::new(config);
        let resources = Arc::new(resources);
        let (notifications, _) = broadcast::channel(NOTIFICATION_CAPACITY);

        let server_info = Implementation {
            name: config.server.name.clone(),
            version: config.server.version.clone(),
            ..Default::default()
        };
        let router = RequestRouter::new(server_info, Arc::new(tools), resources.clone(), validator);
        let detector = ChangeDetector::new(
            resources,
            config.resources.poll_interval(),
            notifications.clone(),
        );

        Self {
            config,
            router: Arc::new(router),
            detector: Arc::new(detector),
            notifications,
        }
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    /// Get the server configuration.
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// Register a new session: subscribe it to change events and make sure
    /// change detection is running.
    pub fn connect(&self) -> broadcast::Receiver<ResourceListChanged> {
        let receiver = self.notifications.subscribe();
        if self.detector.arm() {
            debug!("Change detection started by the first session");
        }
        receiver
    }

    /// Forward change events to one peer until its session ends.
    fn attach(&self, peer: Peer<RoleServer>) {
        let mut events = self.connect();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(ResourceListChanged) => {
                        if let Err(e) = peer.notify_resource_list_changed().await {
                            debug!("Session gone; no more notifications: {}", e);
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Session lagged; {} notifications dropped", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
    }
}

impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        self.router.server_info()
    }

    async fn on_initialized(&self, context: NotificationContext<RoleServer>) {
        match context.peer.peer_info() {
            Some(client) => info!(
                "Client {} {} initialized",
                client.client_info.name, client.client_info.version
            ),
            None => info!("Client initialized"),
        }
        self.attach(context.peer);
    }

    #[instrument(skip_all)]
    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<ListToolsResult, McpError> {
        Ok(self.router.list_tools())
    }

    #[instrument(skip_all, fields(tool = %request.name))]
    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<CallToolResult, McpError> {
        self.router
            .call_tool(&request.name, request.arguments)
            .await
            .map_err(McpError::from)
    }

    #[instrument(skip_all)]
    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<ListResourcesResult, McpError> {
        self.router.list_resources().await.map_err(McpError::from)
    }

    #[instrument(skip_all, fields(uri = %request.uri))]
    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<ReadResourceResult, McpError> {
        self.router
            .read_resource(&request.uri)
            .await
            .map_err(McpError::from)
    }
}
