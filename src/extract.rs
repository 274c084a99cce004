//! Catalog extraction from the product API.

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::models::RawProduct;

// ---

/// Fetch every product from `{base_url}/products`.
///
/// The body must decode as a JSON array of [`RawProduct`]; a record that does
/// not fit the shape fails the whole fetch rather than being skipped. The
/// request is bounded by `timeout`.
#[tracing::instrument(skip(client))]
pub async fn fetch_products(
    client: &Client,
    base_url: Option<&str>,
    timeout: Duration,
) -> Result<Vec<RawProduct>> {
    // ---
    let base_url = base_url
        .ok_or_else(|| PipelineError::Configuration("CATALOG_API_URL is not set".into()))?;
    let url = format!("{}/products", base_url.trim_end_matches('/'));

    debug!("Fetching catalog from: {}", url);

    let body = client
        .get(&url)
        .timeout(timeout)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    let products: Vec<RawProduct> = serde_json::from_str(&body).map_err(|e| {
        PipelineError::Upstream(format!("catalog response from {} is malformed: {}", url, e))
    })?;

    info!("Extracted {} products from catalog", products.len());
    Ok(products)
}
