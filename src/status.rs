//! Source and index status reporting.

use anyhow::Result;

use crate::blobstore;
use crate::config::Config;
use crate::db;
use crate::query;

/// Print a status line for each configured source plus the index itself.
pub async fn run_status(config: &Config) -> Result<()> {
    println!("{:<16} {:<40} HEALTHY", "SOURCE", "STATUS");

    // Blob store binding
    match blobstore::open_blob_store(config) {
        Ok(store) => match store.list(&config.blobs.prefix).await {
            Ok(entries) => println!(
                "{:<16} {:<40} true",
                "blobs",
                format!("{} ({} blobs)", store.label(), entries.len())
            ),
            Err(e) => println!("{:<16} {:<40} false", "blobs", e.to_string()),
        },
        Err(e) => println!("{:<16} {:<40} false", "blobs", e.to_string()),
    }

    // Content API (configuration only; no probe request)
    match &config.content_api {
        Some(api) => println!("{:<16} {:<40} true", "content_api", api.base_url),
        None => println!("{:<16} {:<40} false", "content_api", "NOT CONFIGURED"),
    }

    // Index database
    match db::connect(config).await {
        Ok(pool) => match query::record_count(&pool).await {
            Ok(count) => println!(
                "{:<16} {:<40} true",
                "index",
                format!("{} ({} records)", config.db.path.display(), count)
            ),
            Err(e) => println!("{:<16} {:<40} false", "index", e.to_string()),
        },
        Err(e) => println!("{:<16} {:<40} false", "index", e.to_string()),
    }

    Ok(())
}
