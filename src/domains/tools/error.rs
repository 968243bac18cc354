//! Tool-specific error types.

use serde::Serialize;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Structured diagnostics produced by a failed schema validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    /// One entry per problem found in the candidate value.
    pub issues: Vec<String>,
}

impl Diagnostics {
    /// Create diagnostics holding a single issue.
    pub fn single(issue: impl Into<String>) -> Self {
        Self {
            issues: vec![issue.into()],
        }
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.issues.join("; "))
    }
}

impl From<serde_json::Error> for Diagnostics {
    fn from(err: serde_json::Error) -> Self {
        Self::single(err.to_string())
    }
}

/// Errors that can occur during tool operations.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The requested tool was not found.
    #[error("Tool not found: {0}")]
    NotFound(String),

    /// The arguments did not satisfy the tool's input schema.
    #[error("Invalid tool input arguments for '{name}': {diagnostics}")]
    InvalidInput {
        name: String,
        args: Value,
        diagnostics: Diagnostics,
    },

    /// The tool handler failed.
    #[error("Tool call failed for '{name}': {source:#}")]
    CallFailed {
        name: String,
        args: Value,
        #[source]
        source: anyhow::Error,
    },
}

impl ToolError {
    /// Create a new "not found" error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    /// Create a new "invalid input" error.
    pub fn invalid_input(name: impl Into<String>, args: Value, diagnostics: Diagnostics) -> Self {
        Self::InvalidInput {
            name: name.into(),
            args,
            diagnostics,
        }
    }

    /// Create a new "call failed" error.
    pub fn call_failed(name: impl Into<String>, args: Value, source: anyhow::Error) -> Self {
        Self::CallFailed {
            name: name.into(),
            args,
            source,
        }
    }

    /// Structured context for protocol error payloads.
    pub fn context(&self) -> Value {
        match self {
            Self::NotFound(name) => serde_json::json!({ "name": name }),
            Self::InvalidInput {
                name,
                args,
                diagnostics,
            } => serde_json::json!({
                "name": name,
                "args": args,
                "diagnostics": diagnostics.issues,
            }),
            Self::CallFailed { name, args, .. } => serde_json::json!({
                "name": name,
                "args": args,
            }),
        }
    }
}
