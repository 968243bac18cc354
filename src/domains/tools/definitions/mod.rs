//! Tool definitions module.
//!
//! Demonstration tools hosted by the `mcp_bridge` binary. Each tool is
//! defined in its own file.

mod echo;
mod list_dir;

pub use echo::{EchoParams, EchoTool};
pub use list_dir::{FsListDirTool, ListDirParams};
