//! Reverse the most recent scan by removing its output directory.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{MaintenanceError, MaintenanceResult};
use crate::compare::{find_snapshots, SnapshotDir};

/// An output directory as shown in the undo preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotSummary {
    pub path: PathBuf,
    pub name: String,
    pub created: NaiveDateTime,
    /// Main-extension files inside the directory.
    pub artifact_count: usize,
}

/// The single directory an undo would remove.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoPlan {
    pub target: SnapshotSummary,
    /// Output directories that stay untouched.
    pub remaining: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoOutcome {
    pub removed: PathBuf,
    pub files_deleted: usize,
}

/// Removes the newest output directory under a root, never more than one.
#[derive(Debug, Clone)]
pub struct UndoManager {
    root: PathBuf,
    main_extension: String,
}

impl UndoManager {
    pub fn new(root: impl Into<PathBuf>, main_extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            main_extension: main_extension.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn count_artifacts(&self, dir: &Path) -> MaintenanceResult<usize> {
        let mut count = 0;
        for entry in fs::read_dir(dir).map_err(|e| MaintenanceError::io(dir, e))? {
            let entry = entry.map_err(|e| MaintenanceError::io(dir, e))?;
            let path = entry.path();
            let is_main = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.eq_ignore_ascii_case(&self.main_extension))
                .unwrap_or(false);
            if is_main && path.is_file() {
                count += 1;
            }
        }
        Ok(count)
    }

    fn summarize(&self, snapshot: SnapshotDir) -> MaintenanceResult<SnapshotSummary> {
        let artifact_count = self.count_artifacts(&snapshot.path)?;
        Ok(SnapshotSummary {
            path: snapshot.path,
            name: snapshot.name,
            created: snapshot.created,
            artifact_count,
        })
    }

    /// All output directories, newest first.
    pub fn preview(&self) -> MaintenanceResult<Vec<SnapshotSummary>> {
        find_snapshots(&self.root)
            .map_err(|e| MaintenanceError::io(&self.root, e))?
            .into_iter()
            .map(|s| self.summarize(s))
            .collect()
    }

    /// Plan removal of the newest output directory, if one exists.
    pub fn plan(&self) -> MaintenanceResult<Option<UndoPlan>> {
        let mut snapshots = self.preview()?.into_iter();
        Ok(snapshots.next().map(|target| UndoPlan {
            target,
            remaining: snapshots.len(),
        }))
    }

    /// Delete the planned directory: its files first, then the directory.
    ///
    /// Refuses a plan whose target is no longer the newest output directory.
    pub fn execute(&self, plan: &UndoPlan) -> MaintenanceResult<UndoOutcome> {
        let newest = find_snapshots(&self.root)
            .map_err(|e| MaintenanceError::io(&self.root, e))?
            .into_iter()
            .next();
        if newest.map(|s| s.path) != Some(plan.target.path.clone()) {
            return Err(MaintenanceError::StalePlan {
                planned: plan.target.path.clone(),
            });
        }

        let dir = &plan.target.path;
        let mut files_deleted = 0;
        for entry in fs::read_dir(dir).map_err(|e| MaintenanceError::io(dir, e))? {
            let entry = entry.map_err(|e| MaintenanceError::io(dir, e))?;
            let path = entry.path();
            let file_type = entry
                .file_type()
                .map_err(|e| MaintenanceError::io(&path, e))?;
            if file_type.is_dir() {
                fs::remove_dir_all(&path).map_err(|e| MaintenanceError::io(&path, e))?;
            } else {
                fs::remove_file(&path).map_err(|e| MaintenanceError::io(&path, e))?;
                files_deleted += 1;
            }
        }
        fs::remove_dir(dir).map_err(|e| MaintenanceError::io(dir, e))?;

        tracing::info!("Undo removed {} ({} files)", dir.display(), files_deleted);
        Ok(UndoOutcome {
            removed: dir.clone(),
            files_deleted,
        })
    }
}
