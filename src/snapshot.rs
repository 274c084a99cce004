//! JSON snapshots of the raw and enriched datasets.
//!
//! A snapshot is a side record of a run. An existing file is never
//! overwritten; the write is skipped and logged instead.

use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotOutcome {
    Written,
    /// A file was already present at the target path.
    Skipped,
}

/// Serialize `value` as pretty JSON to `path` unless the file exists.
pub fn save_snapshot<T>(value: &T, path: &Path) -> Result<SnapshotOutcome>
where
    T: Serialize + ?Sized,
{
    // ---
    if path.exists() {
        info!(
            "Snapshot already exists at {}; delete it to write a new one",
            path.display()
        );
        return Ok(SnapshotOutcome::Skipped);
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| PipelineError::snapshot(path, e))?;
    }

    let json = serde_json::to_vec_pretty(value).map_err(|e| PipelineError::snapshot(path, e))?;
    fs::write(path, json).map_err(|e| PipelineError::snapshot(path, e))?;

    info!("Snapshot saved to {}", path.display());
    Ok(SnapshotOutcome::Written)
}
