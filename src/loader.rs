//! Transactional loader for enriched catalog rows.
//!
//! A load is all-or-nothing: categories, products and ratings are written in
//! one transaction that is rolled back on any failure. A database whose
//! `products` table already has rows is left untouched and the call reports
//! [`LoadStatus::SkippedAlreadyLoaded`].

use std::collections::HashMap;

use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info, warn};

use crate::error::{PipelineError, Result};
use crate::models::{EnrichedProduct, LoadResult, LoadStatus};

// ---

/// Load `rows` into `categories`, `products` and `ratings`.
///
/// The schema must already exist (see [`crate::schema::ensure_schema`]).
/// Returns [`PipelineError::Validation`] for an unresolvable category and
/// [`PipelineError::Storage`] for any database failure; in both cases the
/// transaction is rolled back and no row of the batch is persisted.
///
/// Categories are only ever created here, alongside their products. A
/// database whose `categories` table has rows while `products` is empty
/// (products removed by hand) fails the category insert on the unique name
/// and keeps returning `Storage` until both tables are cleared.
#[tracing::instrument(skip_all, fields(rows = rows.len()))]
pub async fn load(pool: &SqlitePool, rows: &[EnrichedProduct]) -> Result<LoadResult> {
    // ---
    let categories = distinct_categories(rows);
    load_with_categories(pool, rows, &categories).await
}

/// Category names in first-seen order, without duplicates.
fn distinct_categories(rows: &[EnrichedProduct]) -> Vec<&str> {
    // ---
    let mut seen = Vec::new();
    for row in rows {
        if !seen.contains(&row.category.as_str()) {
            seen.push(row.category.as_str());
        }
    }
    seen
}

async fn load_with_categories(
    pool: &SqlitePool,
    rows: &[EnrichedProduct],
    categories: &[&str],
) -> Result<LoadResult> {
    // ---
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| PipelineError::storage("failed to begin load transaction", e))?;

    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| PipelineError::storage("failed to count existing products", e))?;

    if existing > 0 {
        tx.rollback()
            .await
            .map_err(|e| PipelineError::storage("failed to release load transaction", e))?;
        info!(
            "Products table already holds {} rows; skipping load",
            existing
        );
        return Ok(LoadResult::skipped());
    }

    match write_batch(&mut tx, rows, categories).await {
        Ok(result) => {
            tx.commit()
                .await
                .map_err(|e| PipelineError::storage("failed to commit load", e))?;
            info!(
                "Loaded {} products and {} categories",
                result.inserted_count, result.categories_inserted
            );
            Ok(result)
        }
        Err(err) => {
            warn!("Load failed, rolling back: {}", err);
            if let Err(rollback_err) = tx.rollback().await {
                warn!("Rollback failed: {}", rollback_err);
            }
            Err(err)
        }
    }
}

async fn write_batch(
    tx: &mut Transaction<'_, Sqlite>,
    rows: &[EnrichedProduct],
    categories: &[&str],
) -> Result<LoadResult> {
    // ---
    // Step 1: categories, capturing surrogate ids
    let mut category_ids: HashMap<&str, i64> = HashMap::with_capacity(categories.len());
    for name in categories {
        let id = sqlx::query("INSERT INTO categories (category_name) VALUES (?1)")
            .bind(*name)
            .execute(&mut **tx)
            .await
            .map_err(|e| PipelineError::storage(format!("failed to insert category '{}'", name), e))?
            .last_insert_rowid();
        debug!("Category '{}' -> {}", name, id);
        category_ids.insert(*name, id);
    }

    // Step 2: resolve every row before writing any of them
    let resolved = rows
        .iter()
        .map(|row| {
            category_ids
                .get(row.category.as_str())
                .copied()
                .map(|id| (row, id))
                .ok_or_else(|| {
                    PipelineError::Validation(format!(
                        "product {} references unknown category '{}'",
                        row.id, row.category
                    ))
                })
        })
        .collect::<Result<Vec<_>>>()?;

    // Step 3: products and ratings, in input order
    for (row, category_id) in resolved {
        store_product(tx, row, category_id).await?;
        store_rating(tx, row).await?;
    }

    Ok(LoadResult {
        inserted_count: rows.len(),
        categories_inserted: categories.len(),
        status: LoadStatus::Loaded,
    })
}

async fn store_product(
    tx: &mut Transaction<'_, Sqlite>,
    row: &EnrichedProduct,
    category_id: i64,
) -> Result<()> {
    // ---
    sqlx::query(
        r#"
        INSERT INTO products (
            id, title, price_usd, price_eur, description,
            category_id, image_url, price_category, price_per_rating, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(row.id)
    .bind(&row.title)
    .bind(row.price_usd)
    .bind(row.price_eur)
    .bind(&row.description)
    .bind(category_id)
    .bind(&row.image_url)
    .bind(row.price_category.map(|c| c.as_str()))
    .bind(row.price_per_rating)
    .bind(row.created_at)
    .execute(&mut **tx)
    .await
    .map_err(|e| PipelineError::storage(format!("failed to insert product {}", row.id), e))?;

    Ok(())
}

async fn store_rating(tx: &mut Transaction<'_, Sqlite>, row: &EnrichedProduct) -> Result<()> {
    // ---
    sqlx::query(
        r#"
        INSERT INTO ratings (
            product_id, customer_rating, customer_reviews, product_highly_recommended
        ) VALUES (?1, ?2, ?3, ?4)
        "#,
    )
    .bind(row.id)
    .bind(row.customer_rating)
    .bind(row.customer_reviews)
    .bind(row.product_highly_recommended)
    .execute(&mut **tx)
    .await
    .map_err(|e| PipelineError::storage(format!("failed to insert rating for {}", row.id), e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::db::memory_pool;
    use crate::schema::ensure_schema;

    async fn fresh_db() -> SqlitePool {
        // ---
        let pool = memory_pool().await;
        ensure_schema(&pool).await.unwrap();
        pool
    }

    async fn count(pool: &SqlitePool, table: &str) -> i64 {
        // ---
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(pool)
            .await
            .unwrap()
    }

    fn sample_batch() -> Vec<EnrichedProduct> {
        // ---
        vec![
            EnrichedProduct::sample(1, "men's clothing"),
            EnrichedProduct::sample(2, "jewelery"),
            EnrichedProduct::sample(3, "men's clothing"),
            EnrichedProduct::sample(4, "electronics"),
        ]
    }

    #[test]
    fn test_distinct_categories_first_seen_order() {
        // ---
        let rows = sample_batch();
        assert_eq!(
            distinct_categories(&rows),
            vec!["men's clothing", "jewelery", "electronics"]
        );
    }

    #[tokio::test]
    async fn test_load_inserts_all_tables() {
        // ---
        let pool = fresh_db().await;

        let result = load(&pool, &sample_batch()).await.unwrap();

        assert_eq!(result.status, LoadStatus::Loaded);
        assert_eq!(result.inserted_count, 4);
        assert_eq!(result.categories_inserted, 3);
        assert_eq!(count(&pool, "products").await, 4);
        assert_eq!(count(&pool, "ratings").await, 4);
        assert_eq!(count(&pool, "categories").await, 3);
    }

    #[tokio::test]
    async fn test_products_reference_their_category() {
        // ---
        let pool = fresh_db().await;
        load(&pool, &sample_batch()).await.unwrap();

        let rows: Vec<(i64, String)> = sqlx::query_as(
            r#"
            SELECT p.id, c.category_name
            FROM products p JOIN categories c ON c.category_id = p.category_id
            ORDER BY p.rowid
            "#,
        )
        .fetch_all(&pool)
        .await
        .unwrap();

        assert_eq!(
            rows,
            vec![
                (1, "men's clothing".to_string()),
                (2, "jewelery".to_string()),
                (3, "men's clothing".to_string()),
                (4, "electronics".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_rating_columns_are_persisted() {
        // ---
        let pool = fresh_db().await;
        let mut row = EnrichedProduct::sample(7, "electronics");
        row.customer_rating = 0.0;
        row.customer_reviews = 0;
        row.product_highly_recommended = false;
        row.price_per_rating = None;
        row.price_category = None;

        load(&pool, &[row]).await.unwrap();

        let (rating, reviews, recommended): (f64, i64, bool) = sqlx::query_as(
            "SELECT customer_rating, customer_reviews, product_highly_recommended FROM ratings WHERE product_id = 7",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!((rating, reviews, recommended), (0.0, 0, false));

        let (category, per_rating): (Option<String>, Option<f64>) = sqlx::query_as(
            "SELECT price_category, price_per_rating FROM products WHERE id = 7",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(category, None);
        assert_eq!(per_rating, None);
    }

    #[tokio::test]
    async fn test_second_load_is_skipped() {
        // ---
        let pool = fresh_db().await;
        let batch = sample_batch();

        let first = load(&pool, &batch).await.unwrap();
        let second = load(&pool, &batch).await.unwrap();

        assert_eq!(first.inserted_count, 4);
        assert_eq!(second, LoadResult::skipped());
        assert_eq!(second.status, LoadStatus::SkippedAlreadyLoaded);
        assert_eq!(count(&pool, "products").await, 4);
        assert_eq!(count(&pool, "ratings").await, 4);
        assert_eq!(count(&pool, "categories").await, 3);
    }

    #[tokio::test]
    async fn test_unresolvable_category_rolls_back_everything() {
        // ---
        let pool = fresh_db().await;
        let batch = sample_batch();

        // "electronics" is never inserted, so product 4 cannot be resolved
        let result =
            load_with_categories(&pool, &batch, &["men's clothing", "jewelery"]).await;

        assert!(matches!(result, Err(PipelineError::Validation(_))));
        assert_eq!(count(&pool, "categories").await, 0);
        assert_eq!(count(&pool, "products").await, 0);
        assert_eq!(count(&pool, "ratings").await, 0);
    }

    #[tokio::test]
    async fn test_failure_mid_batch_rolls_back_everything() {
        // ---
        let pool = fresh_db().await;
        let mut batch = sample_batch();
        // Duplicate primary key: rows 1-2 insert fine, row 3 fails
        batch[2].id = 1;

        let result = load(&pool, &batch).await;

        assert!(matches!(result, Err(PipelineError::Storage { .. })));
        assert_eq!(count(&pool, "categories").await, 0);
        assert_eq!(count(&pool, "products").await, 0);
        assert_eq!(count(&pool, "ratings").await, 0);

        // The database is still loadable afterwards
        let retry = load(&pool, &sample_batch()).await.unwrap();
        assert_eq!(retry.inserted_count, 4);
    }

    #[tokio::test]
    async fn test_leftover_category_fails_without_partial_rows() {
        // ---
        let pool = fresh_db().await;
        sqlx::query("INSERT INTO categories (category_name) VALUES ('jewelery')")
            .execute(&pool)
            .await
            .unwrap();

        let result = load(&pool, &sample_batch()).await;

        assert!(matches!(result, Err(PipelineError::Storage { .. })));
        assert_eq!(count(&pool, "categories").await, 1);
        assert_eq!(count(&pool, "products").await, 0);
        assert_eq!(count(&pool, "ratings").await, 0);
    }

    #[tokio::test]
    async fn test_load_without_schema_is_storage_error() {
        // ---
        let pool = memory_pool().await;
        let result = load(&pool, &sample_batch()).await;
        assert!(matches!(result, Err(PipelineError::Storage { .. })));
    }
}
