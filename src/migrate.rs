use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    apply_schema(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Create the index schema. Idempotent — safe to run on every `init`.
pub async fn apply_schema(pool: &SqlitePool) -> Result<()> {
    // One row per distinct source document, keyed by filename stem.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS index_records (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            key TEXT NOT NULL UNIQUE,
            title TEXT NOT NULL,
            description TEXT,
            tags_json TEXT NOT NULL DEFAULT '[]',
            source_locator TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            last_indexed_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_index_records_title ON index_records(title)")
        .execute(pool)
        .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_index_records_last_indexed_at \
         ON index_records(last_indexed_at DESC)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
