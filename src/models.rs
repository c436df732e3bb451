//! Core data models used throughout docdex.
//!
//! These types represent the index records, remote content items, and
//! reports that flow through the indexing and query pipeline.

use serde::Serialize;

/// Metadata extracted from one raw Markdown document.
///
/// Produced by [`crate::parse::parse_markdown`]. All fields are optional at
/// this stage; the reconciler fills the gaps (filename stem for the title,
/// empty tag list) before the record is stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedDoc {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
}

/// One row of the persistent index, keyed by the source filename stem.
///
/// `key` uniquely identifies at most one record; re-indexing the same key
/// overwrites the parsed fields and `last_indexed_at` in place and never
/// touches `created_at`.
#[derive(Debug, Clone, Serialize)]
pub struct IndexRecord {
    pub id: i64,
    pub key: String,
    pub title: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub source_locator: String,
    /// Epoch seconds, set once at first reconciliation.
    pub created_at: i64,
    /// Epoch seconds, refreshed on every reconciliation.
    pub last_indexed_at: i64,
}

/// One article from the remote content API.
///
/// Ephemeral: fetched per query, normalized, never persisted or cached.
#[derive(Debug, Clone, Serialize)]
pub struct ContentItem {
    pub id: i64,
    pub title: String,
    pub link: String,
    /// HTML-stripped, whitespace-trimmed excerpt.
    pub excerpt: String,
    pub published_at: Option<String>,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
}

/// A single per-document failure collected during an index run.
#[derive(Debug, Clone, Serialize)]
pub struct IndexFailure {
    pub file: String,
    pub error: String,
}

/// Outcome of one index run over the blob store.
#[derive(Debug, Clone, Serialize)]
pub struct IndexReport {
    /// Distinct keys successfully reconciled in this run.
    pub indexed: usize,
    /// Markdown documents seen under the scanned prefix.
    pub total: usize,
    pub errors: Vec<IndexFailure>,
}

/// A degraded federated sub-query: the source that failed and why.
#[derive(Debug, Clone, Serialize)]
pub struct SourceError {
    pub source: String,
    pub error: String,
}

/// Combined result of one federated search.
///
/// Both lists are independently bounded; an empty list is a valid outcome
/// and does not by itself indicate a failure — check `source_errors`.
#[derive(Debug, Clone, Serialize)]
pub struct FederatedResponse {
    pub keywords: String,
    pub content_results: Vec<ContentItem>,
    pub content_count: usize,
    pub index_results: Vec<IndexRecord>,
    pub index_count: usize,
    pub source_errors: Vec<SourceError>,
}

/// Full document view returned by detail resolution: the index record plus
/// the body fetched from the blob store.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentView {
    pub key: String,
    pub title: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub source_locator: String,
    pub created_at: String,      // ISO8601
    pub last_indexed_at: String, // ISO8601
    pub body: String,
}

/// Format an epoch-seconds timestamp as ISO8601 UTC.
pub fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_else(|| ts.to_string())
}
