//! Domains module containing business logic organized by bounded contexts.
//!
//! Each subdomain represents a specific area of functionality within the MCP
//! server: tools callable by clients and resources readable by them.

pub mod resources;
pub mod tools;
