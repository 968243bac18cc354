//! Resource type definitions.
//!
//! Demonstration resource types hosted by the `mcp_bridge` binary. Each type
//! is defined in its own file and implements
//! [`ResourceType`](crate::domains::resources::ResourceType).

mod files;
mod server_info;

pub use files::FilesResourceType;
pub use server_info::ServerInfoResourceType;
