//! Configuration loader for the `codemetal-catalogflow` pipeline.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). Components never read the environment themselves;
//! they receive the pieces of [`Config`] they need as arguments.
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{PipelineError, Result};

pub const DEFAULT_CATALOG_API_URL: &str = "https://fakestoreapi.com";
pub const DEFAULT_EXCHANGE_RATE_API_URL: &str = "https://api.exchangerate-api.com/v4/latest/USD";

/// Parse an optional numeric variable with a default value.
macro_rules! parse_env {
    ($lookup:expr, $var_name:expr, $ty:ty, $default:expr) => {
        $lookup($var_name)
            .map(|v| v.trim().parse::<$ty>())
            .transpose()
            .map_err(|e| PipelineError::Configuration(format!("Invalid {}: {}", $var_name, e)))?
            .unwrap_or($default)
    };
}

/// Read an optional URL; an empty value counts as unset.
macro_rules! optional_url {
    ($lookup:expr, $var_name:expr, $default:expr) => {
        match $lookup($var_name) {
            Some(v) if v.trim().is_empty() => None,
            Some(v) => Some(v.trim().trim_end_matches('/').to_string()),
            None => Some($default.to_string()),
        }
    };
}

/// Price and rating thresholds used by the transformer.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingRules {
    // ---
    /// Upper (inclusive) edge of the `low` price bin, in USD.
    pub low_price_threshold: f64,

    /// Upper (inclusive) edge of the `medium` price bin, in USD.
    pub high_price_threshold: f64,

    /// Minimum rating for a product to count as highly recommended.
    pub rating_threshold: f64,
}

impl Default for PricingRules {
    fn default() -> Self {
        Self {
            low_price_threshold: 5.0,
            high_price_threshold: 100.0,
            rating_threshold: 4.5,
        }
    }
}

impl PricingRules {
    /// Reject thresholds that would make the price bins meaningless.
    pub fn validate(&self) -> Result<()> {
        // ---
        let all_finite = [
            self.low_price_threshold,
            self.high_price_threshold,
            self.rating_threshold,
        ]
        .iter()
        .all(|v| v.is_finite());

        if !all_finite {
            return Err(PipelineError::Configuration(
                "price and rating thresholds must be finite numbers".into(),
            ));
        }
        if self.low_price_threshold <= 0.0 {
            return Err(PipelineError::Configuration(format!(
                "LOW_PRICE_THRESHOLD must be positive, got {}",
                self.low_price_threshold
            )));
        }
        if self.low_price_threshold >= self.high_price_threshold {
            return Err(PipelineError::Configuration(format!(
                "LOW_PRICE_THRESHOLD ({}) must be below HIGH_PRICE_THRESHOLD ({})",
                self.low_price_threshold, self.high_price_threshold
            )));
        }
        if !(0.0..=5.0).contains(&self.rating_threshold) {
            return Err(PipelineError::Configuration(format!(
                "RATING_THRESHOLD must be within 0..=5, got {}",
                self.rating_threshold
            )));
        }
        Ok(())
    }
}

/// Strongly typed pipeline configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the run.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// Catalog API base URL; products are fetched from `{url}/products`.
    pub catalog_api_url: Option<String>,

    /// Exchange rate endpoint returning `{"rates": {...}}` for USD.
    pub exchange_rate_api_url: Option<String>,

    /// Currency code prices are converted into.
    pub target_currency: String,

    pub pricing: PricingRules,

    /// Root for raw and processed JSON snapshots.
    pub data_dir: PathBuf,

    /// SQLite database file.
    pub database_path: PathBuf,

    /// Optional schema script; the embedded one is used when unset.
    pub schema_path: Option<PathBuf>,

    /// Timeout applied to every outbound HTTP call.
    pub http_timeout: Duration,
}

/// Load configuration from environment variables with defaults.
///
/// Optional:
/// - `CATALOG_API_URL` – catalog base URL (default: fakestoreapi.com)
/// - `EXCHANGE_RATE_API_URL` – rate endpoint (default: exchangerate-api USD)
/// - `TARGET_CURRENCY` – conversion target (default: EUR)
/// - `LOW_PRICE_THRESHOLD` / `HIGH_PRICE_THRESHOLD` – price bins (default: 5 / 100)
/// - `RATING_THRESHOLD` – highly recommended cut-off (default: 4.5)
/// - `DATA_DIR` – snapshot root (default: `data`)
/// - `DATABASE_PATH` – SQLite file (default: `{DATA_DIR}/database/products.db`)
/// - `DATABASE_SCHEMA` – schema script path (default: embedded)
/// - `HTTP_TIMEOUT_SECS` – HTTP timeout (default: 10)
///
/// Setting either URL to an empty string leaves it unconfigured.
pub fn load_from_env() -> Result<Config> {
    // ---
    load_with(|name| env::var(name).ok())
}

/// Same as [`load_from_env`], reading variables through `lookup`.
pub fn load_with<F>(lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    // ---
    let catalog_api_url = optional_url!(lookup, "CATALOG_API_URL", DEFAULT_CATALOG_API_URL);
    let exchange_rate_api_url = optional_url!(
        lookup,
        "EXCHANGE_RATE_API_URL",
        DEFAULT_EXCHANGE_RATE_API_URL
    );

    let target_currency = lookup("TARGET_CURRENCY")
        .map(|v| v.trim().to_uppercase())
        .unwrap_or_else(|| "EUR".to_string());
    if target_currency.is_empty() {
        return Err(PipelineError::Configuration(
            "TARGET_CURRENCY must not be empty".into(),
        ));
    }

    let defaults = PricingRules::default();
    let pricing = PricingRules {
        low_price_threshold: parse_env!(
            lookup,
            "LOW_PRICE_THRESHOLD",
            f64,
            defaults.low_price_threshold
        ),
        high_price_threshold: parse_env!(
            lookup,
            "HIGH_PRICE_THRESHOLD",
            f64,
            defaults.high_price_threshold
        ),
        rating_threshold: parse_env!(lookup, "RATING_THRESHOLD", f64, defaults.rating_threshold),
    };
    pricing.validate()?;

    let data_dir = lookup("DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data"));
    let database_path = lookup("DATABASE_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|| data_dir.join("database").join("products.db"));
    let schema_path = lookup("DATABASE_SCHEMA").map(PathBuf::from);

    let http_timeout = Duration::from_secs(parse_env!(lookup, "HTTP_TIMEOUT_SECS", u64, 10));

    Ok(Config {
        catalog_api_url,
        exchange_rate_api_url,
        target_currency,
        pricing,
        data_dir,
        database_path,
        schema_path,
        http_timeout,
    })
}

impl Config {
    /// Location of the raw catalog snapshot.
    pub fn raw_snapshot_path(&self) -> PathBuf {
        self.data_dir.join("raw").join("raw_products.json")
    }

    /// Location of the enriched catalog snapshot.
    pub fn processed_snapshot_path(&self) -> PathBuf {
        self.data_dir
            .join("processed")
            .join("processed_products.json")
    }

    /// Log the loaded configuration for debugging purposes.
    pub fn log_config(&self) {
        // ---
        let show = |v: &Option<String>| v.clone().unwrap_or_else(|| "<unset>".to_string());

        tracing::info!("Configuration loaded:");
        tracing::info!("  CATALOG_API_URL       : {}", show(&self.catalog_api_url));
        tracing::info!("  EXCHANGE_RATE_API_URL : {}", show(&self.exchange_rate_api_url));
        tracing::info!("  TARGET_CURRENCY       : {}", self.target_currency);
        tracing::info!("  LOW_PRICE_THRESHOLD   : {}", self.pricing.low_price_threshold);
        tracing::info!("  HIGH_PRICE_THRESHOLD  : {}", self.pricing.high_price_threshold);
        tracing::info!("  RATING_THRESHOLD      : {}", self.pricing.rating_threshold);
        tracing::info!("  DATA_DIR              : {}", self.data_dir.display());
        tracing::info!("  DATABASE_PATH         : {}", self.database_path.display());
        tracing::info!(
            "  DATABASE_SCHEMA       : {}",
            self.schema_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<embedded>".to_string())
        );
        tracing::info!("  HTTP_TIMEOUT_SECS     : {}", self.http_timeout.as_secs());
    }
}
