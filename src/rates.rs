//! Exchange rate lookup for the configured target currency.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{PipelineError, Result};

/// Body shape of the rate endpoint: `{"rates": {"EUR": 0.92, ...}}`.
#[derive(Debug, Deserialize)]
struct RatesResponse {
    rates: HashMap<String, f64>,
}

/// Fetches a single USD → target conversion rate.
///
/// Nothing is cached; the pipeline calls [`RateProvider::get_rate`] once per
/// run and hands the value to the transformer.
#[derive(Debug, Clone)]
pub struct RateProvider {
    // ---
    client: Client,
    endpoint: Option<String>,
    timeout: Duration,
}

impl RateProvider {
    /// Every lookup is bounded by `timeout`, whatever `client` is configured with.
    pub fn new(client: Client, endpoint: Option<String>, timeout: Duration) -> Self {
        Self {
            client,
            endpoint,
            timeout,
        }
    }

    /// The configured endpoint, or a configuration error when unset.
    pub fn endpoint(&self) -> Result<&str> {
        self.endpoint.as_deref().ok_or_else(|| {
            PipelineError::Configuration("EXCHANGE_RATE_API_URL is not set".into())
        })
    }

    /// Look up the rate for `target_currency`.
    ///
    /// A response without the requested currency is an upstream error; no
    /// default rate is ever substituted.
    #[tracing::instrument(skip(self))]
    pub async fn get_rate(&self, target_currency: &str) -> Result<f64> {
        // ---
        let endpoint = self.endpoint()?;

        debug!("Fetching exchange rates from: {}", endpoint);

        let response: RatesResponse = self
            .client
            .get(endpoint)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let rate = response.rates.get(target_currency).copied().ok_or_else(|| {
            PipelineError::Upstream(format!(
                "rate response from {} has no entry for {}",
                endpoint, target_currency
            ))
        })?;

        if !rate.is_finite() || rate <= 0.0 {
            return Err(PipelineError::Upstream(format!(
                "rate for {} is not a positive number: {}",
                target_currency, rate
            )));
        }

        info!("Exchange rate USD -> {}: {}", target_currency, rate);
        Ok(rate)
    }
}
