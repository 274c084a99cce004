//! SQLite connection setup.

use std::fs;
use std::path::Path;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::error::{PipelineError, Result};

// ---

/// Open (creating if needed) the SQLite database at `path`.
///
/// The pool holds a single connection: the pipeline is the only writer and
/// runs its steps in sequence. Foreign keys are enforced.
pub async fn connect(path: &Path) -> Result<SqlitePool> {
    // ---
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            PipelineError::storage(
                format!("failed to create database directory {}", parent.display()),
                e,
            )
        })?;
    }

    tracing::info!("Opening database: {}", path.display());

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .map_err(|e| {
            PipelineError::storage(format!("failed to open database {}", path.display()), e)
        })
}

/// Private in-memory database for tests; lives as long as the pool.
#[cfg(test)]
pub(crate) async fn memory_pool() -> SqlitePool {
    // ---
    let options = "sqlite::memory:"
        .parse::<SqliteConnectOptions>()
        .unwrap()
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .unwrap()
}
