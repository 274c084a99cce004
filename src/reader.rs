//! Read-back helper used to smoke-check a run.

use sqlx::SqlitePool;

use crate::error::{PipelineError, Result};
use crate::models::Product;

/// First product in storage order, if any.
pub async fn first_product(pool: &SqlitePool) -> Result<Option<Product>> {
    // ---
    sqlx::query_as::<_, Product>(
        r#"
        SELECT id, title, price_usd, price_eur, description, category_id,
               image_url, price_category, price_per_rating, created_at
        FROM products
        ORDER BY rowid
        LIMIT 1
        "#,
    )
    .fetch_optional(pool)
    .await
    .map_err(|e| PipelineError::storage("failed to read first product", e))
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::db::memory_pool;
    use crate::loader::load;
    use crate::models::EnrichedProduct;
    use crate::schema::ensure_schema;

    #[tokio::test]
    async fn test_empty_database_has_no_first_product() {
        // ---
        let pool = memory_pool().await;
        ensure_schema(&pool).await.unwrap();

        assert_eq!(first_product(&pool).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_returns_first_loaded_row() {
        // ---
        let pool = memory_pool().await;
        ensure_schema(&pool).await.unwrap();

        let rows = vec![
            EnrichedProduct::sample(20, "jewelery"),
            EnrichedProduct::sample(3, "electronics"),
        ];
        load(&pool, &rows).await.unwrap();

        let product = first_product(&pool).await.unwrap().unwrap();
        assert_eq!(product.id, 3);
        assert_eq!(product.title, "Product 3");
        assert_eq!(product.price_eur, 108.0);
        assert_eq!(product.price_category.as_deref(), Some("high"));
        assert_eq!(product.price_per_rating, Some(25.0));
        assert_eq!(product.created_at, rows[1].created_at);
    }
}
