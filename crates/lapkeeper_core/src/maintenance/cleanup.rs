//! Reclaim space taken by source recordings that have already been curated.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{MaintenanceError, MaintenanceResult};

/// One file eligible for deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupCandidate {
    pub path: PathBuf,
    pub size: u64,
}

/// Previewed deletion set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupPlan {
    pub root: PathBuf,
    pub files: Vec<CleanupCandidate>,
    pub total_bytes: u64,
}

impl CleanupPlan {
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Per-file accounting for a batch delete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteOutcome {
    pub deleted: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

impl DeleteOutcome {
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

/// Finds and removes loose recordings directly under the root.
///
/// Subdirectories are never descended into, so output directories and their
/// curated copies are never candidates.
#[derive(Debug, Clone)]
pub struct CleanupManager {
    root: PathBuf,
    extensions: Vec<String>,
}

impl CleanupManager {
    pub fn new<I, S>(root: impl Into<PathBuf>, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            root: root.into(),
            extensions: extensions
                .into_iter()
                .map(|e| e.into().trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
            .unwrap_or(false)
    }

    /// Enumerate candidates, sorted by path. Nothing is modified.
    pub fn preview(&self) -> MaintenanceResult<CleanupPlan> {
        let mut plan = CleanupPlan {
            root: self.root.clone(),
            ..Default::default()
        };

        let entries = fs::read_dir(&self.root).map_err(|e| MaintenanceError::io(&self.root, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| MaintenanceError::io(&self.root, e))?;
            let path = entry.path();
            let metadata = entry
                .metadata()
                .map_err(|e| MaintenanceError::io(&path, e))?;
            if !metadata.is_file() || !self.matches_extension(&path) {
                continue;
            }
            plan.total_bytes += metadata.len();
            plan.files.push(CleanupCandidate {
                path,
                size: metadata.len(),
            });
        }

        plan.files.sort_by(|a, b| a.path.cmp(&b.path));
        tracing::debug!(
            "Cleanup preview for {}: {} files, {} bytes",
            self.root.display(),
            plan.len(),
            plan.total_bytes
        );
        Ok(plan)
    }

    /// Delete exactly the previewed files, continuing past failures.
    ///
    /// A planned path that is not a direct child of this manager's root is
    /// refused and counted as a failure.
    pub fn execute(&self, plan: &CleanupPlan) -> DeleteOutcome {
        let mut outcome = DeleteOutcome::default();

        for candidate in &plan.files {
            let path = &candidate.path;
            if path.parent() != Some(self.root.as_path()) {
                outcome.failed += 1;
                outcome
                    .errors
                    .push(format!("{}: outside {}", path.display(), self.root.display()));
                continue;
            }

            match fs::remove_file(path) {
                Ok(()) => {
                    tracing::debug!("Deleted {}", path.display());
                    outcome.deleted += 1;
                }
                Err(e) => {
                    tracing::warn!("Failed to delete {}: {}", path.display(), e);
                    outcome.failed += 1;
                    outcome.errors.push(format!("{}: {}", path.display(), e));
                }
            }
        }

        tracing::info!(
            "Cleanup finished: {} deleted, {} failed",
            outcome.deleted,
            outcome.failed
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write(path: &Path, bytes: &[u8]) {
        fs::write(path, bytes).unwrap();
    }

    #[test]
    fn preview_lists_only_root_level_sources() {
        let root = tempdir().unwrap();
        write(&root.path().join("a.ld"), b"12345");
        write(&root.path().join("a.ldx"), b"123");
        write(&root.path().join("notes.txt"), b"x");
        let snapshot = root.path().join("PBs_2024-01-01_100000");
        fs::create_dir(&snapshot).unwrap();
        write(&snapshot.join("kept.ld"), b"x");

        let manager = CleanupManager::new(root.path(), ["ld", "ldx"]);
        let plan = manager.preview().unwrap();

        let names: Vec<_> = plan
            .files
            .iter()
            .map(|c| c.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.ld", "a.ldx"]);
        assert_eq!(plan.total_bytes, 8);
    }

    #[test]
    fn preview_does_not_delete() {
        let root = tempdir().unwrap();
        write(&root.path().join("a.ld"), b"x");
        CleanupManager::new(root.path(), ["ld"]).preview().unwrap();
        assert!(root.path().join("a.ld").exists());
    }

    #[test]
    fn execute_deletes_plan_and_counts_failures() {
        let root = tempdir().unwrap();
        write(&root.path().join("a.ld"), b"x");
        write(&root.path().join("b.ld"), b"x");

        let manager = CleanupManager::new(root.path(), [".LD"]);
        let mut plan = manager.preview().unwrap();
        assert_eq!(plan.len(), 2);

        // Vanishes between preview and execute.
        fs::remove_file(root.path().join("b.ld")).unwrap();
        write(&root.path().join("c.ld"), b"x");
        plan.files.push(CleanupCandidate {
            path: PathBuf::from("/elsewhere/d.ld"),
            size: 1,
        });

        let outcome = manager.execute(&plan);
        assert_eq!(outcome.deleted, 1);
        assert_eq!(outcome.failed, 2);
        assert_eq!(outcome.errors.len(), 2);
        assert!(!outcome.is_complete());
        assert!(root.path().join("c.ld").exists());
    }

    #[test]
    fn missing_root_is_an_error() {
        let root = tempdir().unwrap();
        let manager = CleanupManager::new(root.path().join("missing"), ["ld"]);
        assert!(matches!(manager.preview(), Err(MaintenanceError::Io { .. })));
    }
}
