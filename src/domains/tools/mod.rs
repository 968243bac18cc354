//! Tools domain module.
//!
//! Tools are named, schema-validated functions that MCP clients call.
//!
//! ## Architecture
//!
//! - `definitions/` - Demonstration tool implementations (one file per tool)
//! - `handlers.rs` - The `Tool` unit and the typed `ToolDefinition` trait
//! - `schema.rs` - Input schemas and the `SchemaValidator` seam
//! - `registry.rs` - Name-indexed registry and call dispatch
//! - `error.rs` - Tool-specific error types
//!
//! ## Adding a New Tool
//!
//! 1. Implement `ToolDefinition` for a new type in `definitions/`
//! 2. Pass `Tool::from_definition(MyTool)` to `ToolRegistry::new`

pub mod definitions;
mod error;
mod handlers;
mod registry;
mod schema;

pub use error::{Diagnostics, ToolError};
pub use handlers::{Tool, ToolDefinition, ToolHandler};
pub use registry::ToolRegistry;
pub use schema::{InputSchema, SchemaValidator, SerdeSchemaValidator};
