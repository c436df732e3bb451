//! Federated search and document resolution.
//!
//! One keyword query fanned out across two sources: the remote content API
//! and the local index. Sources degrade independently — a failing source
//! contributes an empty list plus an entry in `source_errors`, and never
//! poisons the other source's results.

use std::str::FromStr;

use anyhow::{bail, Result};
use sqlx::SqlitePool;
use thiserror::Error;

use crate::blobstore::BlobStore;
use crate::config::Config;
use crate::content_api;
use crate::models::{format_ts_iso, DocumentView, FederatedResponse, SourceError};
use crate::query;

/// Ceiling on per-source results for one federated query.
pub const MAX_RESULTS_CAP: i64 = 10;

/// Which sources a federated query consults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    All,
    Content,
    Index,
}

impl SearchScope {
    pub fn includes_content(self) -> bool {
        matches!(self, SearchScope::All | SearchScope::Content)
    }

    pub fn includes_index(self) -> bool {
        matches!(self, SearchScope::All | SearchScope::Index)
    }
}

impl FromStr for SearchScope {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(SearchScope::All),
            "content" => Ok(SearchScope::Content),
            "index" => Ok(SearchScope::Index),
            other => bail!("Unknown search scope: '{}'. Available: all, content, index", other),
        }
    }
}

/// Run one federated query.
///
/// `max_results` bounds each source independently; unset falls back to the
/// configured default, and everything is clamped to 1..=[`MAX_RESULTS_CAP`].
pub async fn federated_search(
    config: &Config,
    pool: &SqlitePool,
    keywords: &str,
    scope: SearchScope,
    max_results: Option<i64>,
) -> Result<FederatedResponse> {
    let keywords = keywords.trim();
    if keywords.is_empty() {
        bail!("Search keywords must not be empty");
    }
    let max_results = clamp_max_results(config, max_results);

    let mut response = FederatedResponse {
        keywords: keywords.to_string(),
        content_results: Vec::new(),
        content_count: 0,
        index_results: Vec::new(),
        index_count: 0,
        source_errors: Vec::new(),
    };

    if scope.includes_content() {
        match &config.content_api {
            Some(api) => {
                match content_api::search_articles(api, keywords, max_results).await {
                    Ok(items) => response.content_results = items,
                    Err(e) => response.source_errors.push(SourceError {
                        source: "content_api".to_string(),
                        error: e.to_string(),
                    }),
                }
            }
            None => response.source_errors.push(SourceError {
                source: "content_api".to_string(),
                error: "Content API is not configured".to_string(),
            }),
        }
    }

    if scope.includes_index() {
        match query::query_records(pool, Some(keywords), Some(max_results)).await {
            Ok(records) => response.index_results = records,
            Err(e) => response.source_errors.push(SourceError {
                source: "index".to_string(),
                error: e.to_string(),
            }),
        }
    }

    response.content_count = response.content_results.len();
    response.index_count = response.index_results.len();
    Ok(response)
}

pub fn clamp_max_results(config: &Config, max_results: Option<i64>) -> i64 {
    max_results
        .unwrap_or(config.query.federated_default)
        .clamp(1, MAX_RESULTS_CAP)
}

/// Failure modes of document resolution that callers route differently: a
/// key nobody indexed versus a record whose underlying blob has vanished.
#[derive(Debug, Error)]
pub enum GetDocumentError {
    #[error("No index record for key '{0}'")]
    RecordNotFound(String),
    #[error("Record '{key}' points at '{locator}' but the blob no longer exists")]
    StorageMissing { key: String, locator: String },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Resolve one document end to end: index record plus the raw body fetched
/// back out of the blob store.
pub async fn get_document(
    pool: &SqlitePool,
    store: &dyn BlobStore,
    key: &str,
) -> Result<DocumentView, GetDocumentError> {
    let record = query::record_by_key(pool, key)
        .await?
        .ok_or_else(|| GetDocumentError::RecordNotFound(key.to_string()))?;

    let body = store
        .get(&record.source_locator)
        .await?
        .ok_or_else(|| GetDocumentError::StorageMissing {
            key: record.key.clone(),
            locator: record.source_locator.clone(),
        })?;

    Ok(DocumentView {
        key: record.key,
        title: record.title,
        description: record.description,
        tags: record.tags,
        source_locator: record.source_locator,
        created_at: format_ts_iso(record.created_at),
        last_indexed_at: format_ts_iso(record.last_indexed_at),
        body,
    })
}

/// CLI entry point — run a federated search and print both result lists.
pub async fn run_search(
    config: &Config,
    keywords: &str,
    scope: SearchScope,
    max_results: Option<i64>,
) -> Result<()> {
    let pool = crate::db::connect(config).await?;
    let response = federated_search(config, &pool, keywords, scope, max_results).await?;
    pool.close().await;

    println!("Results for '{}':", response.keywords);

    if scope.includes_content() {
        println!("\nContent API ({}):", response.content_count);
        for item in &response.content_results {
            println!("  [{}] {}", item.id, item.title);
            if !item.excerpt.is_empty() {
                println!("      {}", item.excerpt);
            }
            println!("      {}", item.link);
        }
    }

    if scope.includes_index() {
        println!("\nIndex ({}):", response.index_count);
        for record in &response.index_results {
            println!("  {} — {}", record.key, record.title);
            if let Some(desc) = &record.description {
                println!("      {}", desc);
            }
        }
    }

    for degraded in &response.source_errors {
        eprintln!("\nwarning: source '{}' degraded: {}", degraded.source, degraded.error);
    }

    Ok(())
}

/// CLI entry point — resolve one document and print it.
pub async fn run_get(config: &Config, key: &str) -> Result<()> {
    let pool = crate::db::connect(config).await?;
    let store = crate::blobstore::open_blob_store(config)?;
    let view = get_document(&pool, store.as_ref(), key).await?;
    pool.close().await;

    println!("Key:          {}", view.key);
    println!("Title:        {}", view.title);
    if let Some(desc) = &view.description {
        println!("Description:  {}", desc);
    }
    if !view.tags.is_empty() {
        println!("Tags:         {}", view.tags.join(", "));
    }
    println!("Source:       {}", view.source_locator);
    println!("Created:      {}", view.created_at);
    println!("Last indexed: {}", view.last_indexed_at);
    println!("\n{}", view.body);

    Ok(())
}
