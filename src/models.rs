//! Data models for the catalog pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---

/// Nested rating object as delivered by the catalog API.
///
/// Both members are optional so that a missing value surfaces as a
/// validation failure in the transformer instead of a decode error.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RawRating {
    // ---
    pub rate: Option<f64>,
    pub count: Option<i64>,
}

/// Raw product record from the catalog API (prices in USD).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RawProduct {
    // ---
    pub id: i64,
    pub title: String,
    pub price: f64,
    #[serde(default)]
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub image: String,
    pub rating: Option<RawRating>,
}

/// Price bin derived from `price_usd`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceCategory {
    Low,
    Medium,
    High,
}

impl PriceCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceCategory::Low => "low",
            PriceCategory::Medium => "medium",
            PriceCategory::High => "high",
        }
    }
}

/// Transformed product row, one per [`RawProduct`].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EnrichedProduct {
    // ---
    pub id: i64,
    pub title: String,
    pub price_usd: f64,
    pub price_eur: f64,
    pub description: String,
    pub category: String,
    pub image_url: String,
    pub customer_rating: f64,
    pub customer_reviews: i64,
    pub price_category: Option<PriceCategory>,
    pub product_highly_recommended: bool,
    pub price_per_rating: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// Persisted product row as read back from the `products` table.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Product {
    // ---
    pub id: i64,
    pub title: String,
    pub price_usd: f64,
    pub price_eur: f64,
    pub description: String,
    pub category_id: i64,
    pub image_url: String,
    pub price_category: Option<String>,
    pub price_per_rating: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// Outcome of a load call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    /// Rows were written and committed.
    Loaded,
    /// The `products` table already had rows; nothing was written.
    SkippedAlreadyLoaded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoadResult {
    // ---
    /// Products inserted (one rating row accompanies each).
    pub inserted_count: usize,
    pub categories_inserted: usize,
    pub status: LoadStatus,
}

impl LoadResult {
    pub fn skipped() -> Self {
        Self {
            inserted_count: 0,
            categories_inserted: 0,
            status: LoadStatus::SkippedAlreadyLoaded,
        }
    }
}

#[cfg(test)]
impl EnrichedProduct {
    /// Minimal valid row for storage tests.
    pub(crate) fn sample(id: i64, category: &str) -> Self {
        // ---
        use chrono::TimeZone;

        EnrichedProduct {
            id,
            title: format!("Product {}", id),
            price_usd: 120.0,
            price_eur: 108.0,
            description: "A test product".to_string(),
            category: category.to_string(),
            image_url: format!("https://example.test/img/{}.jpg", id),
            customer_rating: 4.8,
            customer_reviews: 10,
            price_category: Some(PriceCategory::High),
            product_highly_recommended: true,
            price_per_rating: Some(25.0),
            created_at: Utc.with_ymd_and_hms(2025, 3, 26, 18, 45, 0).unwrap(),
        }
    }
}
