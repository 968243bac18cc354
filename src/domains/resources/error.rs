//! Resource-specific error types.

use serde_json::Value;
use thiserror::Error;

/// Errors that can occur during resource operations.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// No resource catalog was configured on this server.
    #[error("MCP server not currently configured for resources")]
    NotConfigured,

    /// The URI is not under the root or does not match the path template.
    #[error("Invalid resource URI: {0}")]
    InvalidUri(String),

    /// The URI named a resource type that is not configured.
    #[error("Unknown resource type: {0}")]
    UnknownType(String),

    /// A resource type failed to list its resources.
    #[error("Failed to list resources: {source:#}")]
    ListingFailed {
        #[source]
        source: anyhow::Error,
    },

    /// A resource type failed to read a resource.
    #[error("Failed to read resource '{uri}': {source:#}")]
    ReadingFailed {
        uri: String,
        #[source]
        source: anyhow::Error,
    },

    /// A resource type failed to hash its listing.
    #[error("Failed to hash resources list: {source:#}")]
    HashingFailed {
        #[source]
        source: anyhow::Error,
    },

    /// The configured path template is unusable.
    #[error("Invalid resource path template '{template}': {reason}")]
    InvalidTemplate { template: String, reason: String },
}

impl ResourceError {
    /// Create a new "invalid URI" error.
    pub fn invalid_uri(uri: impl Into<String>) -> Self {
        Self::InvalidUri(uri.into())
    }

    /// Create a new "unknown type" error.
    pub fn unknown_type(name: impl Into<String>) -> Self {
        Self::UnknownType(name.into())
    }

    /// Create a new "listing failed" error.
    pub fn listing_failed(source: anyhow::Error) -> Self {
        Self::ListingFailed { source }
    }

    /// Create a new "reading failed" error.
    pub fn reading_failed(uri: impl Into<String>, source: anyhow::Error) -> Self {
        Self::ReadingFailed {
            uri: uri.into(),
            source,
        }
    }

    /// Create a new "hashing failed" error.
    pub fn hashing_failed(source: anyhow::Error) -> Self {
        Self::HashingFailed { source }
    }

    /// Create a new "invalid template" error.
    pub fn invalid_template(template: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTemplate {
            template: template.into(),
            reason: reason.into(),
        }
    }

    /// Whether the caller sent a bad or unknown resource address.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidUri(_) | Self::UnknownType(_))
    }

    /// Structured context for protocol error payloads.
    pub fn context(&self) -> Option<Value> {
        match self {
            Self::InvalidUri(uri) | Self::ReadingFailed { uri, .. } => {
                Some(serde_json::json!({ "uri": uri }))
            }
            Self::UnknownType(name) => Some(serde_json::json!({ "resourceType": name })),
            _ => None,
        }
    }
}
