//! Catalog enrichment: currency conversion and derived classifications.
//!
//! Monetary values are computed in [`Decimal`] from the shortest decimal form
//! of each input float and rounded half-to-even (banker's rounding) to two
//! places, so the same inputs always produce the same stored values.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{debug, info};

use crate::config::PricingRules;
use crate::error::{PipelineError, Result};
use crate::models::{EnrichedProduct, PriceCategory, RawProduct};

/// Decimal places kept for monetary values.
pub const MONEY_DECIMALS: u32 = 2;

// ---

/// Enrich a batch of raw products with a single conversion `rate`.
///
/// `created_at` is captured once, so every row of the batch shares it.
/// Fails with [`PipelineError::Validation`] on an empty batch, a rate that is
/// not a finite positive number, or any record with an incomplete rating;
/// no partial batch is ever returned.
#[tracing::instrument(skip_all, fields(records = records.len(), rate = rate))]
pub fn transform(
    records: &[RawProduct],
    rate: f64,
    rules: &PricingRules,
) -> Result<Vec<EnrichedProduct>> {
    // ---
    transform_at(records, rate, rules, Utc::now())
}

/// [`transform`] with an explicit batch timestamp.
pub fn transform_at(
    records: &[RawProduct],
    rate: f64,
    rules: &PricingRules,
    created_at: DateTime<Utc>,
) -> Result<Vec<EnrichedProduct>> {
    // ---
    if !rate.is_finite() || rate <= 0.0 {
        return Err(PipelineError::Validation(format!(
            "exchange rate must be a finite positive number, got {}",
            rate
        )));
    }
    if records.is_empty() {
        return Err(PipelineError::Validation(
            "no product records to transform".into(),
        ));
    }

    let rate = to_decimal(rate, "exchange rate")?;

    let rows = records
        .iter()
        .map(|raw| enrich(raw, rate, rules, created_at))
        .collect::<Result<Vec<_>>>()?;

    info!(rows = rows.len(), "Transformed catalog batch");
    Ok(rows)
}

fn enrich(
    raw: &RawProduct,
    rate: Decimal,
    rules: &PricingRules,
    created_at: DateTime<Utc>,
) -> Result<EnrichedProduct> {
    // ---
    let (customer_rating, customer_reviews) = extract_rating(raw)?;

    if !raw.price.is_finite() {
        return Err(PipelineError::Validation(format!(
            "product {} has a non-finite price",
            raw.id
        )));
    }
    let price = to_decimal(raw.price, "price")?;

    let price_eur = price.checked_mul(rate).and_then(round_money).ok_or_else(|| {
        PipelineError::Validation(format!("product {}: converted price overflows", raw.id))
    })?;

    let price_per_rating = if customer_rating == 0.0 {
        None
    } else {
        let rating = to_decimal(customer_rating, "rating")?;
        price.checked_div(rating).and_then(round_money)
    };

    debug!(id = raw.id, price_eur, ?price_per_rating, "Enriched product");

    Ok(EnrichedProduct {
        id: raw.id,
        title: raw.title.clone(),
        price_usd: raw.price,
        price_eur,
        description: raw.description.clone(),
        category: raw.category.clone(),
        image_url: raw.image.clone(),
        customer_rating,
        customer_reviews,
        price_category: price_category(raw.price, rules),
        product_highly_recommended: customer_rating >= rules.rating_threshold,
        price_per_rating,
        created_at,
    })
}

/// Pull `rate` and `count` out of the nested rating object.
fn extract_rating(raw: &RawProduct) -> Result<(f64, i64)> {
    // ---
    let missing = |field: &str| {
        PipelineError::Validation(format!("product {} is missing {}", raw.id, field))
    };

    let rating = raw.rating.as_ref().ok_or_else(|| missing("rating"))?;
    let rate = rating.rate.ok_or_else(|| missing("rating.rate"))?;
    let count = rating.count.ok_or_else(|| missing("rating.count"))?;

    if !rate.is_finite() || !(0.0..=5.0).contains(&rate) {
        return Err(PipelineError::Validation(format!(
            "product {} has rating.rate {} outside 0..=5",
            raw.id, rate
        )));
    }
    if count < 0 {
        return Err(PipelineError::Validation(format!(
            "product {} has negative rating.count {}",
            raw.id, count
        )));
    }
    Ok((rate, count))
}

/// Bin a USD price: `(0, low]` low, `(low, high]` medium, `(high, ∞)` high.
///
/// Prices at or below zero fall outside every bin and yield `None`.
pub fn price_category(price: f64, rules: &PricingRules) -> Option<PriceCategory> {
    // ---
    if price.is_nan() || price <= 0.0 {
        None
    } else if price <= rules.low_price_threshold {
        Some(PriceCategory::Low)
    } else if price <= rules.high_price_threshold {
        Some(PriceCategory::Medium)
    } else {
        Some(PriceCategory::High)
    }
}

/// Convert through the shortest decimal form of `value` (what JSON carried).
fn to_decimal(value: f64, what: &str) -> Result<Decimal> {
    value.to_string().parse::<Decimal>().map_err(|e| {
        PipelineError::Validation(format!(
            "{} {} is not representable as a decimal: {}",
            what, value, e
        ))
    })
}

fn round_money(value: Decimal) -> Option<f64> {
    value
        .round_dp_with_strategy(MONEY_DECIMALS, RoundingStrategy::MidpointNearestEven)
        .to_f64()
}
