//! Blob store abstraction.
//!
//! An index run reads raw Markdown documents out of a blob store; detail
//! resolution fetches a single body back out of it. Two bindings are
//! provided: a local filesystem tree and an S3-compatible bucket
//! ([`crate::blob_s3`]). Both are addressed by `/`-separated keys.

use anyhow::{bail, Result};
use async_trait::async_trait;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::blob_s3::S3BlobStore;
use crate::config::{Config, FsBlobConfig};

/// One listed blob.
#[derive(Debug, Clone)]
pub struct BlobEntry {
    /// Full `/`-separated key within the store.
    pub key: String,
    pub size: i64,
}

/// Minimal blob-store capability surface consumed by the core.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Human-readable binding label for status output (e.g. `"fs:./docs"`).
    fn label(&self) -> String;

    /// List all blobs whose key starts with `prefix`, in stable key order.
    async fn list(&self, prefix: &str) -> Result<Vec<BlobEntry>>;

    /// Fetch one blob's body as text. `Ok(None)` means the key does not
    /// exist; that is a distinct condition from an I/O failure.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write one blob.
    async fn put(&self, key: &str, body: &[u8], content_type: &str) -> Result<()>;
}

/// Resolve the configured blob binding.
pub fn open_blob_store(config: &Config) -> Result<Box<dyn BlobStore>> {
    match config.blobs.binding.as_str() {
        "fs" => {
            let fs_config = config
                .blobs
                .fs
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("Filesystem blob binding not configured"))?;
            Ok(Box::new(FsBlobStore::new(fs_config.clone())?))
        }
        "s3" => {
            let s3_config = config
                .blobs
                .s3
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("S3 blob binding not configured"))?;
            Ok(Box::new(S3BlobStore::new(s3_config.clone())))
        }
        other => bail!("Unknown blob binding: '{}'. Available: fs, s3", other),
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Filesystem binding
// ═══════════════════════════════════════════════════════════════════════

/// Blob store backed by a local directory tree. Keys are paths relative to
/// the configured root, always `/`-separated.
pub struct FsBlobStore {
    root: PathBuf,
    exclude_set: GlobSet,
}

impl FsBlobStore {
    pub fn new(config: FsBlobConfig) -> Result<Self> {
        let mut default_excludes = vec![
            "**/.git/**".to_string(),
            "**/target/**".to_string(),
            "**/node_modules/**".to_string(),
        ];
        default_excludes.extend(config.exclude_globs.clone());

        Ok(Self {
            root: config.root,
            exclude_set: build_globset(&default_excludes)?,
        })
    }

    fn key_to_path(&self, key: &str) -> PathBuf {
        let mut path = self.root.clone();
        for part in key.split('/').filter(|p| !p.is_empty()) {
            path.push(part);
        }
        path
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    fn label(&self) -> String {
        format!("fs:{}", self.root.display())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<BlobEntry>> {
        if !self.root.exists() {
            bail!("Blob root does not exist: {}", self.root.display());
        }

        let mut entries = Vec::new();

        for entry in WalkDir::new(&self.root) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let relative = path.strip_prefix(&self.root).unwrap_or(path);
            let key = path_to_key(relative);

            if self.exclude_set.is_match(&key) {
                continue;
            }
            if !key.starts_with(prefix) {
                continue;
            }

            let size = entry.metadata().map(|m| m.len() as i64).unwrap_or(0);
            entries.push(BlobEntry { key, size });
        }

        // Sort for deterministic ordering
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(entries)
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_to_path(key);
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(anyhow::anyhow!("Failed to read {}: {}", path.display(), e)),
        }
    }

    async fn put(&self, key: &str, body: &[u8], _content_type: &str) -> Result<()> {
        let path = self.key_to_path(key);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, body)?;
        Ok(())
    }
}

fn path_to_key(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
