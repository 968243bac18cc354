//! List directory tool definition.
//!
//! A tool that lists files and directories in a given path, optionally
//! confined to a root directory.

use anyhow::{Context, bail};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

use crate::domains::tools::ToolDefinition;

// ============================================================================
// Tool Parameters
// ============================================================================

/// Parameters for the list directory tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ListDirParams {
    /// Path to the directory to list (relative paths resolve against the root).
    #[serde(default = "default_path")]
    pub path: String,

    /// Include hidden files (starting with '.')
    #[serde(default)]
    pub include_hidden: bool,
}

fn default_path() -> String {
    ".".to_string()
}

/// One directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirEntry {
    pub name: String,
    pub kind: EntryKind,
    /// Human-readable size; absent for directories.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Dir,
    File,
    Link,
}

/// Output of the list directory tool.
#[derive(Debug, Serialize)]
pub struct ListDirOutput {
    pub directory: String,
    pub entries: Vec<DirEntry>,
    pub directories: usize,
    pub files: usize,
}

// ============================================================================
// Tool Definition
// ============================================================================

/// List directory tool - lists files and directories in a given path.
#[derive(Debug, Clone, Default)]
pub struct FsListDirTool {
    root: Option<PathBuf>,
}

impl FsListDirTool {
    /// Create the tool, confining listings to `root` when given.
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    fn resolve(&self, input: &str) -> anyhow::Result<PathBuf> {
        let Some(root) = &self.root else {
            return Path::new(input)
                .canonicalize()
                .with_context(|| format!("Path does not exist: '{input}'"));
        };

        let canonical_root = root
            .canonicalize()
            .with_context(|| format!("Root directory unavailable: '{}'", root.display()))?;
        let candidate = canonical_root
            .join(input)
            .canonicalize()
            .with_context(|| format!("Path does not exist: '{input}'"))?;

        if !candidate.starts_with(&canonical_root) {
            bail!(
                "Path '{}' is outside allowed root directory '{}'",
                input,
                canonical_root.display()
            );
        }
        Ok(candidate)
    }
}

#[async_trait]
impl ToolDefinition for FsListDirTool {
    const NAME: &'static str = "fs_list_dir";
    const DESCRIPTION: &'static str =
        "List files and directories in a given path. Returns names, types and sizes.";

    type Input = ListDirParams;
    type Output = ListDirOutput;

    #[instrument(skip_all, fields(path = %input.path))]
    async fn call(&self, input: ListDirParams) -> anyhow::Result<ListDirOutput> {
        info!("List directory tool called for path: {}", input.path);

        let path = self.resolve(&input.path)?;
        if !path.is_dir() {
            bail!("Path is not a directory: {}", input.path);
        }

        let mut reader = tokio::fs::read_dir(&path)
            .await
            .with_context(|| format!("Failed to read directory: {}", input.path))?;

        let mut entries = Vec::new();
        while let Some(entry) = reader.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !input.include_hidden && name.starts_with('.') {
                continue;
            }

            let file_type = match entry.file_type().await {
                Ok(t) => t,
                Err(e) => {
                    warn!("Failed to get metadata for {}: {}", name, e);
                    continue;
                }
            };

            let (kind, size) = if file_type.is_dir() {
                (EntryKind::Dir, None)
            } else if file_type.is_symlink() {
                (EntryKind::Link, None)
            } else {
                let len = entry.metadata().await.map(|m| m.len()).unwrap_or(0);
                (EntryKind::File, Some(format_size(len)))
            };
            entries.push(DirEntry { name, kind, size });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        let directories = entries.iter().filter(|e| e.kind == EntryKind::Dir).count();
        let files = entries.iter().filter(|e| e.kind == EntryKind::File).count();
        info!("Listed {} entries in {}", entries.len(), input.path);

        Ok(ListDirOutput {
            directory: path.display().to_string(),
            entries,
            directories,
            files,
        })
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Format file size in human-readable format.
fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];

    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut scaled = bytes as f64 / 1024.0;
    let mut unit = UNITS[0];
    for next in &UNITS[1..] {
        if scaled < 1024.0 {
            break;
        }
        scaled /= 1024.0;
        unit = next;
    }
    format!("{scaled:.1} {unit}")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn params(path: &str) -> ListDirParams {
        ListDirParams {
            path: path.to_string(),
            include_hidden: false,
        }
    }

    #[tokio::test]
    async fn test_list_dir_under_root() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("file1.txt"), "content").unwrap();
        fs::write(temp_dir.path().join(".hidden"), "x").unwrap();
        fs::create_dir(temp_dir.path().join("subdir")).unwrap();

        let tool = FsListDirTool::new(Some(temp_dir.path().to_path_buf()));
        let output = tool.call(params(".")).await.unwrap();

        let names: Vec<_> = output.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["file1.txt", "subdir"]);
        assert_eq!(output.directories, 1);
        assert_eq!(output.files, 1);
        assert_eq!(output.entries[0].size.as_deref(), Some("7 B"));
    }

    #[tokio::test]
    async fn test_list_dir_include_hidden() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(".hidden"), "x").unwrap();

        let tool = FsListDirTool::new(Some(temp_dir.path().to_path_buf()));
        let output = tool
            .call(ListDirParams {
                path: ".".to_string(),
                include_hidden: true,
            })
            .await
            .unwrap();
        assert_eq!(output.entries.len(), 1);
    }

    #[tokio::test]
    async fn test_list_dir_escaping_root_fails() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("inner")).unwrap();

        let tool = FsListDirTool::new(Some(temp_dir.path().join("inner")));
        let err = tool.call(params("..")).await.unwrap_err();
        assert!(err.to_string().contains("outside allowed root"));
    }

    #[tokio::test]
    async fn test_list_dir_nonexistent() {
        let tool = FsListDirTool::default();
        assert!(tool.call(params("/nonexistent/path/12345")).await.is_err());
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(2560), "2.5 KiB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MiB");
        assert_eq!(format_size(u64::MAX), "16777216.0 TiB");
    }
}
