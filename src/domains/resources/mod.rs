//! Resources domain module.
//!
//! Resources are URI-addressed content grouped by resource type. A URI is
//! the configured root followed by a path matched against a template, e.g.
//! `mcp://server/files/report.txt` with `/:resourceType/:handle?`.
//!
//! ## Architecture
//!
//! - `definitions/` - Demonstration resource types (one file per type)
//! - `template.rs` - Path template compilation and matching
//! - `catalog.rs` - The `ResourceType` trait, URI resolution, listing and fingerprinting
//! - `detector.rs` - Background change detection and list-changed notifications
//! - `error.rs` - Resource-specific error types

mod catalog;
pub mod definitions;
mod detector;
mod error;
mod template;

pub use catalog::{
    DEFAULT_PATH_TEMPLATE, DEFAULT_URI_ROOT, HANDLE_PARAM, JSON_MIME_TYPE, RESOURCE_TYPE_PARAM,
    ResourceCatalog, ResourceDescriptor, ResourceType, ResourceUriSpec, Resources,
};
pub use detector::{ChangeDetector, DEFAULT_POLL_INTERVAL, DetectorState, ResourceListChanged};
pub use error::ResourceError;
pub use template::{PathTemplate, ReadResourceParams};
