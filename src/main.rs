//! Application entry point for the `codemetal-catalogflow` pipeline.
//!
//! This binary runs the catalog ETL once:
//! - Loading configuration from environment variables or `.env`
//! - Initializing structured logging/tracing
//! - Running the pipeline (extract, transform, load)
//! - Printing the first stored product as a smoke check
//!
//! # Environment Variables
//! See [`catalogflow::config::load_from_env`] for the pipeline settings.
//! - `PIPELINE_LOG_LEVEL` (optional) – log verbosity (default: `info`)
//! - `PIPELINE_SPAN_EVENTS` (optional) – span event mode for tracing
use std::env;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use is_terminal::IsTerminal;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use catalogflow::{config, pipeline, LoadStatus};

// ---

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // ---
    dotenv().ok();
    init_tracing();

    let cfg = config::load_from_env().context("Failed to load configuration")?;
    cfg.log_config();

    let summary = pipeline::run(&cfg).await.context("Pipeline run failed")?;

    match summary.load.status {
        LoadStatus::Loaded => tracing::info!(
            "Loaded {} products at rate {}",
            summary.load.inserted_count,
            summary.rate
        ),
        LoadStatus::SkippedAlreadyLoaded => {
            tracing::info!("Database already populated; load skipped")
        }
    }

    match summary.first_product {
        Some(product) => println!("{}", serde_json::to_string_pretty(&product)?),
        None => println!("No products stored"),
    }

    Ok(())
}

// ---

/// Install the global subscriber. Logs go to stderr; stdout carries only the
/// printed product. `PIPELINE_SPAN_EVENTS` accepts `full` or `enter_exit`.
fn init_tracing() {
    // ---
    let span_events = match env::var("PIPELINE_SPAN_EVENTS").as_deref() {
        Ok("full") => FmtSpan::FULL,
        Ok("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::CLOSE,
    };

    let use_color = match env::var("FORCE_COLOR").as_deref() {
        Ok("1") | Ok("true") | Ok("yes") => true,
        Ok("0") | Ok("false") | Ok("no") => false,
        _ => std::io::stderr().is_terminal(),
    };

    // Use RUST_LOG if available, otherwise fall back to PIPELINE_LOG_LEVEL
    let env_filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match env::var("PIPELINE_LOG_LEVEL").ok().as_deref() {
            Some("trace") => "trace",
            Some("debug") => "debug",
            Some("info") => "info",
            Some("warn") => "warn",
            Some("error") => "error",
            _ => "info",
        };
        EnvFilter::new(format!("{level},sqlx::query=warn"))
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(span_events)
        .with_env_filter(env_filter)
        .with_ansi(use_color)
        .compact()
        .init();
}
