use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub blobs: BlobsConfig,
    #[serde(default)]
    pub content_api: Option<ContentApiConfig>,
    #[serde(default)]
    pub query: QueryConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BlobsConfig {
    /// Which blob binding to use: `"fs"` or `"s3"`.
    pub binding: String,
    /// Key prefix scanned by an index run (e.g. `"docs/"`).
    #[serde(default)]
    pub prefix: String,
    pub fs: Option<FsBlobConfig>,
    pub s3: Option<S3BlobConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FsBlobConfig {
    pub root: PathBuf,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct S3BlobConfig {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint for S3-compatible stores (Cloudflare R2, MinIO).
    #[serde(default)]
    pub endpoint_url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ContentApiConfig {
    /// Base URL of the remote article API, without the `/wp-json` suffix.
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct QueryConfig {
    /// Default result count for index queries when the caller omits a limit.
    #[serde(default = "default_index_limit")]
    pub default_limit: i64,
    /// Default per-source result count for federated search.
    #[serde(default = "default_federated_limit")]
    pub federated_default: i64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_limit: default_index_limit(),
            federated_default: default_federated_limit(),
        }
    }
}

fn default_index_limit() -> i64 {
    20
}
fn default_federated_limit() -> i64 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate the blob binding
    match config.blobs.binding.as_str() {
        "fs" => {
            if config.blobs.fs.is_none() {
                anyhow::bail!("blobs.binding is 'fs' but [blobs.fs] is not configured");
            }
        }
        "s3" => {
            if config.blobs.s3.is_none() {
                anyhow::bail!("blobs.binding is 's3' but [blobs.s3] is not configured");
            }
        }
        other => anyhow::bail!("Unknown blob binding: '{}'. Must be fs or s3.", other),
    }

    // Validate query bounds
    if config.query.default_limit < 1 {
        anyhow::bail!("query.default_limit must be >= 1");
    }
    if config.query.federated_default < 1 {
        anyhow::bail!("query.federated_default must be >= 1");
    }

    // Validate the content API when configured
    if let Some(ref api) = config.content_api {
        if api.base_url.trim().is_empty() {
            anyhow::bail!("content_api.base_url must not be empty");
        }
        if api.timeout_secs == 0 {
            anyhow::bail!("content_api.timeout_secs must be > 0");
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn test_minimal_fs_config() {
        let f = write_config(
            r#"
[db]
path = "./data/docdex.db"

[blobs]
binding = "fs"
prefix = "docs/"

[blobs.fs]
root = "./docs"

[server]
bind = "127.0.0.1:8787"
"#,
        );
        let cfg = load_config(f.path()).unwrap();
        assert_eq!(cfg.blobs.binding, "fs");
        assert_eq!(cfg.query.default_limit, 20);
        assert_eq!(cfg.query.federated_default, 5);
        assert!(cfg.content_api.is_none());
    }

    #[test]
    fn test_unknown_binding_rejected() {
        let f = write_config(
            r#"
[db]
path = "./data/docdex.db"

[blobs]
binding = "gcs"

[server]
bind = "127.0.0.1:8787"
"#,
        );
        let err = load_config(f.path()).unwrap_err().to_string();
        assert!(err.contains("Unknown blob binding"), "got: {}", err);
    }

    #[test]
    fn test_binding_without_section_rejected() {
        let f = write_config(
            r#"
[db]
path = "./data/docdex.db"

[blobs]
binding = "s3"

[server]
bind = "127.0.0.1:8787"
"#,
        );
        let err = load_config(f.path()).unwrap_err().to_string();
        assert!(err.contains("[blobs.s3]"), "got: {}", err);
    }

    #[test]
    fn test_empty_content_api_url_rejected() {
        let f = write_config(
            r#"
[db]
path = "./data/docdex.db"

[blobs]
binding = "fs"

[blobs.fs]
root = "./docs"

[content_api]
base_url = "  "

[server]
bind = "127.0.0.1:8787"
"#,
        );
        let err = load_config(f.path()).unwrap_err().to_string();
        assert!(err.contains("base_url"), "got: {}", err);
    }
}
