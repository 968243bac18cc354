//! MCP Bridge Library
//!
//! This crate provides a Model Context Protocol (MCP) server for tools and
//! resources, plus an HTTP proxy that fronts a stdio tool server.
//!
//! # Architecture
//!
//! - **core**: Request routing, configuration, error handling, the rmcp
//!   server handler and its transports
//! - **domains**: Business logic organized by bounded contexts
//!   - **tools**: Schema-validated tools that can be executed by clients
//!   - **resources**: URI-addressed resources with change notifications
//! - **proxy** (feature `proxy`): `POST /tools/call` over a child-process
//!   MCP connection, and a typed HTTP client for it
//!
//! # Example
//!
//! ```rust,no_run
//! use mcp_bridge::core::{Config, McpServer, TransportService};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env();
//!     let server = McpServer::from_config(config.clone())?;
//!     TransportService::new(config.transport).run(server).await?;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

#[cfg(feature = "proxy")]
pub mod proxy;

// Re-export commonly used types for convenience
pub use core::{Config, Error, McpServer, Result};
