//! Error taxonomy for the catalog pipeline.
//!
//! Every stage returns [`PipelineError`]; nothing is swallowed. The binary
//! wraps these in `anyhow` so a failed run prints the full cause chain.

use std::path::PathBuf;

/// Boxed source error carried by storage failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Missing or invalid required setting (endpoint, threshold, ...).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Network or HTTP failure talking to the catalog or rate source.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Malformed input records, bad rate, unresolvable category.
    #[error("validation error: {0}")]
    Validation(String),

    /// Schema application or transactional load failure.
    #[error("storage error: {context}")]
    Storage {
        context: String,
        #[source]
        source: BoxError,
    },

    /// Writing a JSON snapshot failed.
    #[error("snapshot error: failed to write {}", path.display())]
    Snapshot {
        path: PathBuf,
        #[source]
        source: BoxError,
    },
}

impl PipelineError {
    // ---
    pub fn storage<E>(context: impl Into<String>, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        PipelineError::Storage {
            context: context.into(),
            source: source.into(),
        }
    }

    pub fn snapshot<E>(path: impl Into<PathBuf>, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        PipelineError::Snapshot {
            path: path.into(),
            source: source.into(),
        }
    }
}

impl From<reqwest::Error> for PipelineError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            PipelineError::Upstream(format!("request timed out: {}", err))
        } else {
            PipelineError::Upstream(err.to_string())
        }
    }
}
