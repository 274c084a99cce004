//! Database schema management for `codemetal-catalogflow`.
//!
//! Ensures the `categories`, `products` and `ratings` tables exist before any
//! load. Applied once per run from the pipeline (single gateway call).

use std::path::Path;

use sqlx::SqlitePool;

use crate::error::{PipelineError, Result};

/// Schema script shipped with the crate.
pub const SCHEMA_SQL: &str = include_str!("../sql/schema.sql");

// ---

/// Create the schema if it does not exist (idempotent).
///
/// Every statement is `CREATE ... IF NOT EXISTS`, so this is safe on a
/// database that already holds the tables. Errors are reported as
/// [`PipelineError::Storage`].
pub async fn ensure_schema(pool: &SqlitePool) -> Result<()> {
    // ---
    apply_script(pool, SCHEMA_SQL).await
}

/// Same as [`ensure_schema`], reading the script from `path` first.
pub async fn ensure_schema_from(pool: &SqlitePool, path: &Path) -> Result<()> {
    // ---
    let script = std::fs::read_to_string(path).map_err(|e| {
        PipelineError::storage(format!("failed to read schema {}", path.display()), e)
    })?;
    apply_script(pool, &script).await
}

#[tracing::instrument(skip_all)]
async fn apply_script(pool: &SqlitePool, script: &str) -> Result<()> {
    // ---
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| PipelineError::storage("failed to begin schema transaction", e))?;

    sqlx::raw_sql(script)
        .execute(&mut *tx)
        .await
        .map_err(|e| PipelineError::storage("failed to apply schema", e))?;

    tx.commit()
        .await
        .map_err(|e| PipelineError::storage("failed to commit schema", e))?;

    tracing::info!("Database schema is in place");
    Ok(())
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::db::memory_pool;
    use std::io::Write;

    async fn table_names(pool: &SqlitePool) -> Vec<String> {
        // ---
        sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(pool)
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_creates_three_tables() {
        // ---
        let pool = memory_pool().await;
        ensure_schema(&pool).await.unwrap();

        assert_eq!(
            table_names(&pool).await,
            vec!["categories", "products", "ratings"]
        );
    }

    #[tokio::test]
    async fn test_is_idempotent() {
        // ---
        let pool = memory_pool().await;
        ensure_schema(&pool).await.unwrap();

        sqlx::query("INSERT INTO categories (category_name) VALUES ('jewelery')")
            .execute(&pool)
            .await
            .unwrap();

        ensure_schema(&pool).await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_foreign_keys_are_enforced() {
        // ---
        let pool = memory_pool().await;
        ensure_schema(&pool).await.unwrap();

        let orphan = sqlx::query(
            "INSERT INTO ratings (product_id, customer_rating, customer_reviews, product_highly_recommended) VALUES (99, 4.0, 1, 0)",
        )
        .execute(&pool)
        .await;
        assert!(orphan.is_err());
    }

    #[tokio::test]
    async fn test_reads_schema_from_file() {
        // ---
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SCHEMA_SQL.as_bytes()).unwrap();

        let pool = memory_pool().await;
        ensure_schema_from(&pool, file.path()).await.unwrap();
        assert_eq!(table_names(&pool).await.len(), 3);
    }

    #[tokio::test]
    async fn test_missing_schema_file_is_storage_error() {
        // ---
        let pool = memory_pool().await;
        let result = ensure_schema_from(&pool, Path::new("/nonexistent/schema.sql")).await;
        assert!(matches!(result, Err(PipelineError::Storage { .. })));
    }

    #[tokio::test]
    async fn test_broken_script_is_storage_error() {
        // ---
        let pool = memory_pool().await;
        let result = apply_script(&pool, "CREATE TABLE oops (").await;
        assert!(matches!(result, Err(PipelineError::Storage { .. })));
    }
}
