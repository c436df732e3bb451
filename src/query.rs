//! Index query service.
//!
//! Keyword lookup over the persistent index: a single LIKE match across
//! title, description, and the serialized tag list, ordered by record id so
//! results are stable across identical queries.

use anyhow::{Context, Result};
use sqlx::{Row, SqlitePool};

use crate::models::IndexRecord;

/// Default result window when the caller does not specify one.
pub const DEFAULT_LIMIT: i64 = 20;
/// Hard ceiling on one query's result window.
pub const LIMIT_MAX: i64 = 50;

/// Look up index records by keyword.
///
/// With no keywords every record qualifies, newest-id-last. Matching is a
/// case-insensitive substring scan over title, description, and tags.
pub async fn query_records(
    pool: &SqlitePool,
    keywords: Option<&str>,
    limit: Option<i64>,
) -> Result<Vec<IndexRecord>> {
    let limit = clamp_limit(limit);

    let rows = match keywords.map(str::trim).filter(|k| !k.is_empty()) {
        Some(keywords) => {
            let pattern = format!("%{}%", escape_like(keywords));
            sqlx::query(
                r#"
                SELECT id, key, title, description, tags_json, source_locator, created_at, last_indexed_at
                FROM index_records
                WHERE title LIKE ? ESCAPE '\'
                   OR description LIKE ? ESCAPE '\'
                   OR tags_json LIKE ? ESCAPE '\'
                ORDER BY id
                LIMIT ?
                "#,
            )
            .bind(&pattern)
            .bind(&pattern)
            .bind(&pattern)
            .bind(limit)
            .fetch_all(pool)
            .await
            .context("Index query failed")?
        }
        None => sqlx::query(
            r#"
            SELECT id, key, title, description, tags_json, source_locator, created_at, last_indexed_at
            FROM index_records
            ORDER BY id
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(pool)
        .await
        .context("Index listing failed")?,
    };

    rows.iter().map(record_from_row).collect()
}

/// Fetch one record by key.
pub async fn record_by_key(pool: &SqlitePool, key: &str) -> Result<Option<IndexRecord>> {
    let row = sqlx::query(
        r#"
        SELECT id, key, title, description, tags_json, source_locator, created_at, last_indexed_at
        FROM index_records
        WHERE key = ?
        "#,
    )
    .bind(key)
    .fetch_optional(pool)
    .await
    .context("Record lookup failed")?;

    row.as_ref().map(record_from_row).transpose()
}

/// Count all records in the index.
pub async fn record_count(pool: &SqlitePool) -> Result<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM index_records")
        .fetch_one(pool)
        .await
        .context("Record count failed")
}

pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, LIMIT_MAX)
}

/// Escape LIKE metacharacters so user keywords match literally.
fn escape_like(keywords: &str) -> String {
    keywords
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn record_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<IndexRecord> {
    let tags_json: String = row.get("tags_json");
    let tags: Vec<String> =
        serde_json::from_str(&tags_json).context("Corrupt tags column in index record")?;

    Ok(IndexRecord {
        id: row.get("id"),
        key: row.get("key"),
        title: row.get("title"),
        description: row.get("description"),
        tags,
        source_locator: row.get("source_locator"),
        created_at: row.get("created_at"),
        last_indexed_at: row.get("last_indexed_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::upsert_record;
    use crate::migrate;
    use crate::models::ParsedDoc;

    async fn seeded_pool(dir: &std::path::Path) -> SqlitePool {
        let pool = crate::db::connect_path(&dir.join("test.db")).await.unwrap();
        migrate::apply_schema(&pool).await.unwrap();

        let docs = [
            ("docs/deploy.md", "Deployment Guide", Some("How we ship releases"), vec!["ops"]),
            ("docs/auth.md", "Auth Overview", Some("Tokens and sessions"), vec!["security"]),
            ("docs/faq.md", "FAQ", None, vec![]),
        ];
        for (locator, title, description, tags) in docs {
            let parsed = ParsedDoc {
                title: Some(title.to_string()),
                description: description.map(|d| d.to_string()),
                tags: tags.into_iter().map(|t| t.to_string()).collect(),
            };
            upsert_record(&pool, locator, &parsed, 100).await.unwrap();
        }
        pool
    }

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None), DEFAULT_LIMIT);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(-5)), 1);
        assert_eq!(clamp_limit(Some(30)), 30);
        assert_eq!(clamp_limit(Some(999)), LIMIT_MAX);
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("under_score"), "under\\_score");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
    }

    #[tokio::test]
    async fn test_keyword_matches_across_fields() {
        let tmp = tempfile::TempDir::new().unwrap();
        let pool = seeded_pool(tmp.path()).await;

        // title
        let hits = query_records(&pool, Some("deployment"), None).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].key, "deploy");

        // description
        let hits = query_records(&pool, Some("sessions"), None).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].key, "auth");

        // tags
        let hits = query_records(&pool, Some("security"), None).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].key, "auth");
    }

    #[tokio::test]
    async fn test_no_keywords_lists_everything_in_id_order() {
        let tmp = tempfile::TempDir::new().unwrap();
        let pool = seeded_pool(tmp.path()).await;

        let hits = query_records(&pool, None, None).await.unwrap();
        let keys: Vec<&str> = hits.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["deploy", "auth", "faq"]);

        let blank = query_records(&pool, Some("   "), None).await.unwrap();
        assert_eq!(blank.len(), 3);
    }

    #[tokio::test]
    async fn test_limit_applies() {
        let tmp = tempfile::TempDir::new().unwrap();
        let pool = seeded_pool(tmp.path()).await;

        let hits = query_records(&pool, None, Some(2)).await.unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn test_like_metacharacters_match_literally() {
        let tmp = tempfile::TempDir::new().unwrap();
        let pool = seeded_pool(tmp.path()).await;

        let parsed = ParsedDoc {
            title: Some("100% uptime".to_string()),
            description: None,
            tags: vec![],
        };
        upsert_record(&pool, "docs/sla.md", &parsed, 100).await.unwrap();

        let hits = query_records(&pool, Some("100%"), None).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].key, "sla");

        // A bare "%" in keywords must not act as a wildcard for everything
        let hits = query_records(&pool, Some("%ployment%"), None).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_record_by_key() {
        let tmp = tempfile::TempDir::new().unwrap();
        let pool = seeded_pool(tmp.path()).await;

        let rec = record_by_key(&pool, "faq").await.unwrap().unwrap();
        assert_eq!(rec.title, "FAQ");
        assert!(record_by_key(&pool, "missing").await.unwrap().is_none());
    }
}
