//! Batch ETL pipeline for a product catalog.
//!
//! Fetches products from a catalog API, converts prices with a single
//! exchange rate, derives price and rating classifications, and loads the
//! result into SQLite inside one transaction. Re-running against a populated
//! database is a no-op.
//!
//! Modules follow the Explicit Module Boundary Pattern (EMBP): each stage
//! owns its types and I/O, and [`pipeline::run`] is the single gateway that
//! wires them together.

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod loader;
pub mod models;
pub mod pipeline;
pub mod rates;
pub mod reader;
pub mod schema;
pub mod snapshot;
pub mod transform;

pub use config::{Config, PricingRules};
pub use error::{PipelineError, Result};
pub use models::{
    EnrichedProduct, LoadResult, LoadStatus, PriceCategory, Product, RawProduct, RawRating,
};
pub use rates::RateProvider;
