//! Files resource type.
//!
//! Exposes the regular files of one directory. The handle is the file name;
//! the fingerprint covers names, sizes and modification times.

use anyhow::{Context, bail};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use tracing::{debug, instrument, warn};

use crate::domains::resources::{
    HANDLE_PARAM, ReadResourceParams, ResourceDescriptor, ResourceType, ResourceUriSpec,
};

/// Regular files of a directory, served as plain text.
#[derive(Debug, Clone)]
pub struct FilesResourceType {
    base_path: PathBuf,
    uri: ResourceUriSpec,
}

struct FileEntry {
    name: String,
    size: u64,
    modified: Option<DateTime<Utc>>,
}

impl FilesResourceType {
    /// Type name used in resource URIs.
    pub const NAME: &'static str = "files";

    /// Mime type of every file.
    pub const MIME_TYPE: &'static str = "text/plain";

    /// Serve the files directly under `base_path`.
    pub fn new(base_path: impl Into<PathBuf>, uri: ResourceUriSpec) -> Self {
        Self {
            base_path: base_path.into(),
            uri,
        }
    }

    async fn entries(&self) -> anyhow::Result<Vec<FileEntry>> {
        let mut reader = tokio::fs::read_dir(&self.base_path)
            .await
            .with_context(|| format!("Cannot read directory '{}'", self.base_path.display()))?;

        let mut entries = Vec::new();
        while let Some(entry) = reader.next_entry().await? {
            let metadata = match entry.metadata().await {
                Ok(m) if m.is_file() => m,
                Ok(_) => continue,
                Err(e) => {
                    warn!("Skipping {:?}: {}", entry.file_name(), e);
                    continue;
                }
            };
            entries.push(FileEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                size: metadata.len(),
                modified: metadata.modified().ok().map(DateTime::<Utc>::from),
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

#[async_trait]
impl ResourceType for FilesResourceType {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn mime_type(&self) -> &str {
        Self::MIME_TYPE
    }

    async fn list(&self) -> anyhow::Result<Vec<ResourceDescriptor>> {
        let entries = self.entries().await?;
        let mut resources = Vec::with_capacity(entries.len());
        for entry in entries {
            let Some(uri) = self.uri.uri_for(Self::NAME, Some(&entry.name)) else {
                bail!("Path template cannot address file '{}'", entry.name);
            };
            let modified = entry
                .modified
                .map(|m| m.to_rfc3339())
                .unwrap_or_else(|| "unknown".to_string());
            resources.push(ResourceDescriptor {
                uri,
                description: format!("{} bytes, modified {}", entry.size, modified),
                mime_type: Self::MIME_TYPE.to_string(),
                handle: entry.name.clone(),
                name: entry.name,
            });
        }
        Ok(resources)
    }

    #[instrument(skip_all, fields(handle))]
    async fn read(&self, params: &ReadResourceParams) -> anyhow::Result<Value> {
        let handle = params
            .get(HANDLE_PARAM)
            .context("A file name is required")?;
        tracing::Span::current().record("handle", handle.as_str());

        if handle == "." || handle == ".." || handle.contains(['/', '\\']) {
            bail!("Invalid file name: {}", handle);
        }

        let path = self.base_path.join(handle);
        debug!("Reading {}", path.display());
        let text = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Cannot read file '{}'", handle))?;
        Ok(Value::String(text))
    }

    async fn hash(&self) -> anyhow::Result<String> {
        let mut hasher = Sha256::new();
        for entry in self.entries().await? {
            let modified = entry.modified.map(|m| m.timestamp_millis()).unwrap_or(0);
            hasher.update(format!("{}:{}:{}\n", entry.name, entry.size, modified));
        }
        Ok(hex::encode(hasher.finalize()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::resources::{DEFAULT_PATH_TEMPLATE, DEFAULT_URI_ROOT};
    use std::fs;
    use tempfile::TempDir;

    fn files(dir: &TempDir) -> FilesResourceType {
        let spec = ResourceUriSpec::new(DEFAULT_URI_ROOT, DEFAULT_PATH_TEMPLATE).unwrap();
        FilesResourceType::new(dir.path(), spec)
    }

    fn handle(name: &str) -> ReadResourceParams {
        ReadResourceParams::from([(HANDLE_PARAM.to_string(), name.to_string())])
    }

    #[tokio::test]
    async fn test_list_regular_files_only() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.txt"), "bee").unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();

        let resources = files(&dir).list().await.unwrap();
        let uris: Vec<_> = resources.iter().map(|r| r.uri.as_str()).collect();
        assert_eq!(uris, vec!["mcp://server/files/a.txt", "mcp://server/files/b.txt"]);
        assert_eq!(resources[1].handle, "b.txt");
        assert!(resources[1].description.starts_with("3 bytes"));
    }

    #[tokio::test]
    async fn test_read_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("note.txt"), "hello").unwrap();

        let value = files(&dir).read(&handle("note.txt")).await.unwrap();
        assert_eq!(value, Value::String("hello".to_string()));
    }

    #[tokio::test]
    async fn test_read_rejects_traversal() {
        let dir = TempDir::new().unwrap();
        assert!(files(&dir).read(&handle("..")).await.is_err());
        assert!(files(&dir).read(&ReadResourceParams::new()).await.is_err());
    }

    #[tokio::test]
    async fn test_awkward_names_round_trip_through_uris() {
        let dir = TempDir::new().unwrap();
        let names = ["my notes.txt", "what?.txt", "issue #4.txt"];
        for name in names {
            fs::write(dir.path().join(name), name).unwrap();
        }

        let spec = ResourceUriSpec::new(DEFAULT_URI_ROOT, DEFAULT_PATH_TEMPLATE).unwrap();
        let files = FilesResourceType::new(dir.path(), spec.clone());
        let resources = files.list().await.unwrap();
        assert_eq!(resources.len(), names.len());

        for resource in resources {
            assert!(!resource.uri["mcp://".len()..].contains([' ', '?', '#']));
            let params = spec.locate(&resource.uri).unwrap();
            assert_eq!(params[HANDLE_PARAM], resource.handle);

            let text = files.read(&params).await.unwrap();
            assert_eq!(text, Value::String(resource.handle.clone()));
        }
    }

    #[tokio::test]
    async fn test_hash_changes_with_listing() {
        let dir = TempDir::new().unwrap();
        let files = files(&dir);
        let empty = files.hash().await.unwrap();
        assert_eq!(empty, files.hash().await.unwrap());

        fs::write(dir.path().join("new.txt"), "x").unwrap();
        assert_ne!(empty, files.hash().await.unwrap());
    }
}
