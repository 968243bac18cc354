//! Configuration management for the MCP server.
//!
//! This module provides a centralized configuration structure populated from
//! environment variables (and a `.env` file, when present) over defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

use super::transport::TransportConfig;
use crate::domains::resources::{
    DEFAULT_PATH_TEMPLATE, DEFAULT_POLL_INTERVAL, DEFAULT_URI_ROOT, ResourceError,
    ResourceUriSpec,
};

/// Main configuration structure for the MCP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Resources domain configuration.
    pub resources: ResourcesConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Transport configuration.
    pub transport: TransportConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

/// Configuration for the resources domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourcesConfig {
    /// Directory served by the `files` resource type (and the root of
    /// `fs_list_dir`). Unset disables file resources.
    pub base_path: Option<PathBuf>,

    /// Prefix of every resource URI.
    pub uri_root: String,

    /// Template matched against the URI remainder after `uri_root`.
    pub path_template: String,

    /// Change detection period in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for ResourcesConfig {
    fn default() -> Self {
        Self {
            base_path: None,
            uri_root: DEFAULT_URI_ROOT.to_string(),
            path_template: DEFAULT_PATH_TEMPLATE.to_string(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
        }
    }
}

impl ResourcesConfig {
    /// Change detection period.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Compile the configured URI root and path template.
    pub fn uri_spec(&self) -> Result<ResourceUriSpec, ResourceError> {
        ResourceUriSpec::new(self.uri_root.as_str(), &self.path_template)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "mcp-bridge".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            resources: ResourcesConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            transport: TransportConfig::default(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables are expected to be prefixed with `MCP_`.
    /// For example: `MCP_SERVER_NAME`, `MCP_LOG_LEVEL`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(name) = std::env::var("MCP_SERVER_NAME") {
            config.server.name = name;
        }

        if let Ok(level) = std::env::var("MCP_LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Ok(base_path) = std::env::var("MCP_RESOURCES_BASE_PATH") {
            info!("File resources served from {}", base_path);
            config.resources.base_path = Some(PathBuf::from(base_path));
        }

        if let Ok(root) = std::env::var("MCP_RESOURCES_URI_ROOT") {
            config.resources.uri_root = root;
        }

        if let Ok(template) = std::env::var("MCP_RESOURCES_PATH_TEMPLATE") {
            config.resources.path_template = template;
        }

        if let Ok(interval) = std::env::var("MCP_RESOURCES_POLL_INTERVAL_MS") {
            match interval.parse::<u64>() {
                Ok(ms) if ms > 0 => config.resources.poll_interval_ms = ms,
                _ => warn!(
                    "Ignoring invalid MCP_RESOURCES_POLL_INTERVAL_MS '{}'; using {} ms",
                    interval, config.resources.poll_interval_ms
                ),
            }
        }

        // Load transport configuration from environment
        config.transport = TransportConfig::from_env();

        config
    }
}
