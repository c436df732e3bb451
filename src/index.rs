//! Index run orchestration.
//!
//! Scans the blob store under the configured prefix, parses each Markdown
//! document, and reconciles it into the persistent index keyed by filename
//! stem. Failures are isolated at document granularity: one bad document is
//! recorded in the report and the run continues.

use std::collections::HashSet;

use anyhow::Result;
use sqlx::SqlitePool;

use crate::blobstore::{self, BlobStore};
use crate::config::Config;
use crate::db;
use crate::models::{IndexFailure, IndexReport, ParsedDoc};
use crate::parse::parse_markdown;

/// CLI entry point — runs an index run and prints the report.
pub async fn run_index(config: &Config, limit: Option<usize>) -> Result<()> {
    let report = index_run(config, limit).await?;

    println!("index run over '{}'", config.blobs.prefix);
    println!("  documents seen: {}", report.total);
    println!("  records reconciled: {}", report.indexed);
    if report.errors.is_empty() {
        println!("  errors: none");
    } else {
        println!("  errors: {}", report.errors.len());
        for failure in &report.errors {
            eprintln!("    {}: {}", failure.file, failure.error);
        }
    }
    println!("ok");
    Ok(())
}

/// Run one index run using the configured blob binding and database.
pub async fn index_run(config: &Config, limit: Option<usize>) -> Result<IndexReport> {
    let store = blobstore::open_blob_store(config)?;
    let pool = db::connect(config).await?;
    let report = index_documents(&pool, store.as_ref(), &config.blobs.prefix, limit).await;
    pool.close().await;
    report
}

/// Core reconciliation loop: list → parse → upsert, sequentially.
///
/// Non-Markdown blobs under the prefix are skipped without being counted.
/// `indexed` counts distinct keys reconciled, so two blobs sharing a
/// filename stem land in one record.
pub async fn index_documents(
    pool: &SqlitePool,
    store: &dyn BlobStore,
    prefix: &str,
    limit: Option<usize>,
) -> Result<IndexReport> {
    let mut entries = store.list(prefix).await?;
    entries.retain(|e| e.key.ends_with(".md"));
    if let Some(lim) = limit {
        entries.truncate(lim);
    }

    let total = entries.len();
    let mut reconciled: HashSet<String> = HashSet::new();
    let mut errors: Vec<IndexFailure> = Vec::new();

    for entry in &entries {
        let body = match store.get(&entry.key).await {
            Ok(Some(body)) => body,
            Ok(None) => {
                errors.push(IndexFailure {
                    file: entry.key.clone(),
                    error: "blob disappeared during the run".to_string(),
                });
                continue;
            }
            Err(e) => {
                errors.push(IndexFailure {
                    file: entry.key.clone(),
                    error: e.to_string(),
                });
                continue;
            }
        };

        let parsed = parse_markdown(&body);
        let now = chrono::Utc::now().timestamp();

        match upsert_record(pool, &entry.key, &parsed, now).await {
            Ok(key) => {
                reconciled.insert(key);
            }
            Err(e) => errors.push(IndexFailure {
                file: entry.key.clone(),
                error: e.to_string(),
            }),
        }
    }

    Ok(IndexReport {
        indexed: reconciled.len(),
        total,
        errors,
    })
}

/// Reconcile one parsed document into the index.
///
/// Insert-or-update keyed on the filename stem: a conflict overwrites the
/// parsed fields and `last_indexed_at` while `created_at` keeps its
/// original value. Returns the key.
pub async fn upsert_record(
    pool: &SqlitePool,
    locator: &str,
    parsed: &ParsedDoc,
    now: i64,
) -> Result<String> {
    let key = doc_key(locator);
    let title = parsed.title.clone().unwrap_or_else(|| key.clone());
    let tags_json = serde_json::to_string(&parsed.tags)?;

    sqlx::query(
        r#"
        INSERT INTO index_records (key, title, description, tags_json, source_locator, created_at, last_indexed_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(key) DO UPDATE SET
            title = excluded.title,
            description = excluded.description,
            tags_json = excluded.tags_json,
            source_locator = excluded.source_locator,
            last_indexed_at = excluded.last_indexed_at
        "#,
    )
    .bind(&key)
    .bind(&title)
    .bind(&parsed.description)
    .bind(&tags_json)
    .bind(locator)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(key)
}

/// Derive the natural record key from a blob key: the filename with its
/// extension removed.
pub fn doc_key(locator: &str) -> String {
    let filename = locator.rsplit('/').next().unwrap_or(locator);
    std::path::Path::new(filename)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| filename.to_string())
}
