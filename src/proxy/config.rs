//! Proxy configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

use super::error::ProxyError;

/// Default port of the HTTP proxy.
pub const DEFAULT_PROXY_PORT: u16 = 4444;

/// Environment variables every child server receives.
pub const DEFAULT_CHILD_ENV: &[&str] = &["HOME", "LOGNAME", "PATH", "SHELL", "TERM", "USER"];

/// Configuration of the HTTP proxy and the child server it fronts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Host address to bind to.
    pub host: String,

    /// Port number to listen on.
    pub port: u16,

    /// Canonical path of the child server executable.
    pub server_path: PathBuf,

    /// Extra environment variable names forwarded to the child.
    pub server_env_vars: Vec<String>,

    /// Enable permissive CORS for browser clients.
    pub enable_cors: bool,
}

impl ProxyConfig {
    /// Load proxy configuration from environment variables.
    ///
    /// A missing or nonexistent `MCP_SERVER_PATH` is fatal.
    pub fn from_env() -> Result<Self, ProxyError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load proxy configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ProxyError> {
        let port = match lookup("MCP_PROXY_PORT") {
            Some(value) => value.trim().parse().map_err(|_| ProxyError::InvalidConfig {
                name: "MCP_PROXY_PORT",
                value,
            })?,
            None => DEFAULT_PROXY_PORT,
        };

        let host = lookup("MCP_PROXY_HOST").unwrap_or_else(|| "127.0.0.1".to_string());

        let raw_path = lookup("MCP_SERVER_PATH")
            .filter(|p| !p.trim().is_empty())
            .ok_or(ProxyError::ServerPathNotSet)?;
        let raw_path = PathBuf::from(raw_path);
        let server_path = raw_path
            .canonicalize()
            .ok()
            .filter(|p| p.is_file())
            .ok_or(ProxyError::ServerFileNotFound { path: raw_path })?;

        let server_env_vars = lookup("MCP_SERVER_ENV_VARS")
            .map(|vars| split_names(&vars))
            .unwrap_or_default();

        let enable_cors = lookup("MCP_PROXY_CORS")
            .map(|v| v.to_lowercase() != "false" && v != "0")
            .unwrap_or(false);

        info!("Proxying to {}", server_path.display());

        Ok(Self {
            host,
            port,
            server_path,
            server_env_vars,
            enable_cors,
        })
    }

    /// Get the bind address.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Split a comma-delimited list of names, dropping blanks.
fn split_names(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
