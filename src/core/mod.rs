//! Core module containing shared infrastructure components.
//!
//! This module provides the foundational building blocks for the MCP server:
//! request routing, configuration, error handling, the rmcp server handler
//! and the transport layer.

pub mod config;
pub mod error;
pub mod logging;
pub mod router;
pub mod server;
pub mod transport;

pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use router::{RequestRouter, RouterError};
pub use server::McpServer;
pub use transport::{TransportConfig, TransportService};
