//! One pipeline run, start to finish.
//!
//! Steps run in a fixed order: extract, raw snapshot, rate lookup,
//! transform, processed snapshot, schema, load, read-back. Any error ends the
//! run; an already-populated database is reported through [`LoadStatus`]
//! rather than as an error.
//!
//! [`LoadStatus`]: crate::models::LoadStatus

use reqwest::Client;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::models::{LoadResult, Product};
use crate::rates::RateProvider;
use crate::{db, extract, loader, reader, schema, snapshot, transform};

/// What a run did.
#[derive(Debug, Clone)]
pub struct RunSummary {
    // ---
    pub extracted: usize,
    /// The single rate applied to the whole batch.
    pub rate: f64,
    pub load: LoadResult,
    pub first_product: Option<Product>,
}

/// Shared HTTP client carrying the configured timeout.
pub fn http_client(cfg: &Config) -> Result<Client> {
    // ---
    Client::builder()
        .timeout(cfg.http_timeout)
        .build()
        .map_err(|e| PipelineError::Configuration(format!("failed to build HTTP client: {}", e)))
}

/// Execute the full pipeline once.
#[tracing::instrument(skip_all)]
pub async fn run(cfg: &Config) -> Result<RunSummary> {
    // ---
    let client = http_client(cfg)?;
    let rates = RateProvider::new(
        client.clone(),
        cfg.exchange_rate_api_url.clone(),
        cfg.http_timeout,
    );

    // Fail on missing endpoints before any I/O
    let catalog_url = cfg
        .catalog_api_url
        .as_deref()
        .ok_or_else(|| PipelineError::Configuration("CATALOG_API_URL is not set".into()))?;
    rates.endpoint()?;

    debug!("Pipeline step 1: extract");
    let raw = extract::fetch_products(&client, Some(catalog_url), cfg.http_timeout).await?;
    if raw.is_empty() {
        return Err(PipelineError::Validation(
            "catalog returned no products; nothing to snapshot or load".into(),
        ));
    }
    snapshot::save_snapshot(&raw, &cfg.raw_snapshot_path())?;

    debug!("Pipeline step 2: transform");
    let rate = rates.get_rate(&cfg.target_currency).await?;
    let enriched = transform::transform(&raw, rate, &cfg.pricing)?;
    snapshot::save_snapshot(&enriched, &cfg.processed_snapshot_path())?;

    debug!("Pipeline step 3: load");
    let pool = db::connect(&cfg.database_path).await?;
    match &cfg.schema_path {
        Some(path) => schema::ensure_schema_from(&pool, path).await?,
        None => schema::ensure_schema(&pool).await?,
    }
    let load = loader::load(&pool, &enriched).await?;

    debug!("Pipeline step 4: read back");
    let first_product = reader::first_product(&pool).await?;

    pool.close().await;

    info!(
        "Pipeline complete: {} extracted, {} loaded ({:?})",
        raw.len(),
        load.inserted_count,
        load.status
    );

    Ok(RunSummary {
        extracted: raw.len(),
        rate,
        load,
        first_product,
    })
}
