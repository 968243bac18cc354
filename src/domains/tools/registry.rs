//! Tool Registry - central registration and dispatch for all tools.
//!
//! This module provides:
//! - A name-indexed registry built once from a caller-supplied list
//! - Tool metadata for listing
//! - Validated, at-most-once dispatch of tool calls

use rmcp::model::{JsonObject, Tool as ToolInfo};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use super::error::ToolError;
use super::handlers::Tool;
use super::schema::SchemaValidator;

// ============================================================================
// Tool Registry
// ============================================================================

/// Tool registry - manages all available tools.
///
/// Immutable once built; listing follows registration order.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: Vec<Tool>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Create a new tool registry.
    ///
    /// A later tool with an already-registered name replaces the earlier one.
    pub fn new(tools: impl IntoIterator<Item = Tool>) -> Self {
        let mut registry = Self::default();
        for tool in tools {
            match registry.index.get(tool.name()) {
                Some(&slot) => {
                    warn!("Tool '{}' registered twice; keeping the last one", tool.name());
                    registry.tools[slot] = tool;
                }
                None => {
                    registry
                        .index
                        .insert(tool.name().to_string(), registry.tools.len());
                    registry.tools.push(tool);
                }
            }
        }
        registry
    }

    /// Look a tool up by name.
    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.index.get(name).map(|&slot| &self.tools[slot])
    }

    /// Get all tool names.
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(Tool::name).collect()
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether no tool is registered.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Get all tools as MCP tool metadata.
    pub fn list_tools(&self, validator: &dyn SchemaValidator) -> Vec<ToolInfo> {
        self.tools
            .iter()
            .map(|tool| ToolInfo {
                name: tool.name().to_string().into(),
                description: tool.description().map(|d| d.to_string().into()),
                input_schema: Arc::new(schema_object(validator.to_wire_schema(tool.input_schema()))),
                annotations: None,
                output_schema: None,
                icons: None,
                meta: None,
                title: None,
            })
            .collect()
    }

    /// Dispatch a tool call.
    ///
    /// Unknown names fail before the validator is consulted, and invalid
    /// arguments fail before the handler runs. The handler runs at most once.
    pub async fn call_tool(
        &self,
        name: &str,
        args: Value,
        validator: &dyn SchemaValidator,
    ) -> Result<Value, ToolError> {
        let tool = self.get(name).ok_or_else(|| ToolError::not_found(name))?;

        let input = validator
            .validate(tool.input_schema(), &args)
            .map_err(|diagnostics| ToolError::invalid_input(name, args.clone(), diagnostics))?;

        debug!("Invoking tool '{}'", name);
        tool.execute(input)
            .await
            .map_err(|source| ToolError::call_failed(name, args, source))
    }
}

/// MCP input schemas are always objects.
fn schema_object(schema: Value) -> JsonObject {
    match schema {
        Value::Object(map) => map,
        other => {
            warn!("Tool input schema is not an object: {}", other);
            JsonObject::new()
        }
    }
}
