//! Destructive maintenance over a telemetry root.
//!
//! Both managers split the work into a read-only preview and a separate
//! execute call. Nothing is deleted until the caller hands the previewed plan
//! back.
//!
//! - [`CleanupManager`]: loose source recordings directly in the root
//! - [`UndoManager`]: the newest output directory only

mod cleanup;
mod undo;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub use cleanup::{CleanupCandidate, CleanupManager, CleanupPlan, DeleteOutcome};
pub use undo::{SnapshotSummary, UndoManager, UndoOutcome, UndoPlan};

/// Errors from maintenance operations.
#[derive(Error, Debug)]
pub enum MaintenanceError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The plan no longer targets the newest output directory.
    #[error("Undo plan is stale: {planned} is no longer the newest output directory")]
    StalePlan { planned: PathBuf },
}

impl MaintenanceError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for maintenance operations.
pub type MaintenanceResult<T> = Result<T, MaintenanceError>;
