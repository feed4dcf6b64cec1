//! Copy step - materialises the curated artifacts in a new output directory.
//!
//! The directory is created once per run. Failing to create it aborts the
//! run; a failure on any single artifact is counted and the rest continue.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use chrono::{Duration, Local, NaiveDateTime};

use crate::models::{CopiedArtifact, OperationLogEntry};
use crate::naming::output_dir_name;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, CopyOutput, ScanState, StepOutcome};
use crate::report::{write_operation_log, OperationLogHeader};

/// Copy step for writing the new snapshot.
pub struct CopyStep;

impl CopyStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CopyStep {
    fn default() -> Self {
        Self::new()
    }
}

/// First free `PBs_` directory name at or after `started_at`.
fn unique_output_dir(root: &Path, started_at: NaiveDateTime) -> PathBuf {
    let mut at = started_at;
    loop {
        let candidate = root.join(output_dir_name(&at));
        if !candidate.exists() {
            return candidate;
        }
        at += Duration::seconds(1);
    }
}

/// Copy a file and carry over its modification time.
fn copy_preserving_mtime(source: &Path, destination: &Path) -> io::Result<()> {
    fs::copy(source, destination)?;
    let modified = fs::metadata(source).and_then(|m| m.modified());
    if let Ok(modified) = modified {
        if let Ok(file) = File::options().write(true).open(destination) {
            // Best effort; the copy itself succeeded.
            let _ = file.set_modified(modified);
        }
    }
    Ok(())
}

impl CopyStep {
    fn copy_artifact(
        &self,
        ctx: &Context<'_>,
        dir: &Path,
        artifact: &CopiedArtifact,
        warnings: &mut Vec<String>,
    ) -> Result<OperationLogEntry, String> {
        let source = &artifact.source;
        let destination = dir.join(&artifact.destination_name);
        copy_preserving_mtime(&source.main_path, &destination)
            .map_err(|e| format!("{}: {}", source.file_name(), e))?;

        let companion_destination = if source.companion_path.is_file() {
            let target = dir.join(
                artifact.companion_destination_name(&ctx.settings.curation.companion_extension),
            );
            if let Err(e) = copy_preserving_mtime(&source.companion_path, &target) {
                // Leave no half-copied pair behind.
                let _ = fs::remove_file(&destination);
                return Err(format!("{}: {}", source.companion_path.display(), e));
            }
            Some(target)
        } else {
            let message = format!("{}: companion file missing, copied main file only", source.file_name());
            ctx.logger.warn(&message);
            warnings.push(message);
            None
        };

        Ok(OperationLogEntry {
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            source: source.main_path.clone(),
            destination,
            companion_destination,
            primary: artifact.primary.clone(),
            additional_slots: artifact.additional_slots.clone(),
        })
    }
}

impl PipelineStep for CopyStep {
    fn name(&self) -> &str {
        "Copy"
    }

    fn description(&self) -> &str {
        "Copy personal bests to output directory"
    }

    fn validate_input(&self, _ctx: &Context<'_>, state: &ScanState) -> StepResult<()> {
        if state.curate.is_none() || state.collect.is_none() {
            return Err(StepError::precondition_failed("Curate has not run"));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context<'_>, state: &mut ScanState) -> StepResult<StepOutcome> {
        let (Some(collect), Some(curate)) = (&state.collect, &state.curate) else {
            return Err(StepError::precondition_failed("Curate has not run"));
        };

        if ctx.dry_run {
            for artifact in &curate.artifacts {
                ctx.logger.info(&format!(
                    "[DRY RUN] {} -> {}",
                    artifact.source.file_name(),
                    artifact.destination_name
                ));
            }
            state.copy = Some(CopyOutput::default());
            return Ok(StepOutcome::Skipped("dry run".to_string()));
        }
        if curate.artifacts.is_empty() {
            state.copy = Some(CopyOutput::default());
            return Ok(StepOutcome::Skipped("no personal bests to copy".to_string()));
        }

        let dir = unique_output_dir(&ctx.root, ctx.started_at);
        fs::create_dir(&dir).map_err(|e| StepError::output_directory(&dir, e))?;
        ctx.logger.info(&format!("Created {}", dir.display()));

        let mut out = CopyOutput {
            output_dir: Some(dir.clone()),
            ..Default::default()
        };
        let total = curate.artifacts.len();
        for (i, artifact) in curate.artifacts.iter().enumerate() {
            match self.copy_artifact(ctx, &dir, artifact, &mut out.warnings) {
                Ok(entry) => {
                    ctx.logger.debug(&format!(
                        "Copied {} -> {}",
                        artifact.source.file_name(),
                        artifact.destination_name
                    ));
                    out.copied += 1;
                    out.operation_log.push(entry);
                }
                Err(message) => {
                    ctx.logger.error(&format!("Copy failed: {}", message));
                    out.failures += 1;
                    out.errors.push(message);
                }
            }
            ctx.logger.progress(i + 1, total);
            ctx.report_progress(self.name(), (((i + 1) * 100) / total) as u32, &artifact.destination_name);
        }

        let header = OperationLogHeader {
            started: ctx.started_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            source_dir: ctx.root.clone(),
            files_processed: collect.processed,
            pb_count: curate.slots.len(),
            artifacts_copied: out.copied,
        };
        match write_operation_log(&dir, &header, &out.operation_log) {
            Ok(path) => out.log_path = Some(path),
            Err(e) => {
                let message = format!("Failed to write operation log: {}", e);
                ctx.logger.error(&message);
                out.errors.push(message);
            }
        }

        ctx.logger.info(&format!(
            "Copied {}/{} artifacts ({} failed)",
            out.copied, total, out.failures
        ));
        state.copy = Some(out);
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context<'_>, state: &ScanState) -> StepResult<()> {
        let Some(copy) = &state.copy else {
            return Err(StepError::invalid_output("Copy results not recorded"));
        };
        match &copy.output_dir {
            Some(dir) if dir.is_dir() => Ok(()),
            Some(dir) => Err(StepError::invalid_output(format!(
                "{} does not exist after copy",
                dir.display()
            ))),
            None => Err(StepError::invalid_output("No output directory recorded")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmark::BenchmarkTimes;
    use crate::models::Category;
    use crate::orchestrator::testing::TestHarness;
    use crate::orchestrator::{
        enumerate_sources, CollectStep, CurateStep, Pipeline, PipelineError, ScanRequest,
    };
    use crate::report::OPERATION_LOG_FILE;
    use crate::store::BenchmarkStore;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    const CAR: &str = "bmw_m4_gt3";

    fn harness(cars: &[&str]) -> TestHarness {
        let mut harness = TestHarness::new();
        for car in cars {
            harness.store.set_car_category(car, Category::Gt3).unwrap();
        }
        harness
            .store
            .set_benchmark(Category::Gt3, "monza", BenchmarkTimes::new(100.0, 140.0))
            .unwrap();
        harness
    }

    /// State after Collect and Curate, ready for the copy step.
    fn curated_state(ctx: &Context<'_>) -> ScanState {
        let sources = enumerate_sources(&ctx.root, "ld").unwrap();
        let mut state = ScanState::new("test_scan", sources);
        Pipeline::new()
            .with_step(CollectStep::new())
            .with_step(CurateStep::new())
            .run(ctx, &mut state)
            .unwrap();
        state
    }

    #[test]
    fn one_failed_copy_does_not_stop_the_rest() {
        // A destination name longer than the file system allows.
        let long_car = "x".repeat(300);
        let mut harness = harness(&[CAR, long_car.as_str()]);
        harness.add_source("a.ld", "monza", CAR, &[101.0]);
        harness.add_source("b.ld", "monza", &long_car, &[102.0]);
        let root = harness.root().to_path_buf();

        let result = harness.scanner().run(ScanRequest::new(&root)).unwrap();

        assert_eq!(result.artifacts_planned, 2);
        assert_eq!(result.artifacts_copied, 1);
        assert_eq!(result.copy_failures, 1);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].starts_with("b.ld: "));

        let dir = result.output_dir.unwrap();
        let log = fs::read_to_string(dir.join(OPERATION_LOG_FILE)).unwrap();
        assert!(log.contains("Total PBs identified: 2\nFiles copied: 1\n"));
        assert!(!log.contains("multiple PBs"));

        let copied = &entry_timestamps(&log)[0];
        assert!(NaiveDateTime::parse_from_str(copied, "%Y-%m-%d %H:%M:%S").is_ok());
    }

    /// Timestamps of the `[...]` entry lines in an operation log.
    fn entry_timestamps(log: &str) -> Vec<&str> {
        log.lines()
            .filter_map(|l| l.strip_prefix('[').and_then(|l| l.strip_suffix(']')))
            .collect()
    }

    #[test]
    fn output_directory_failure_aborts_the_run() {
        let mut harness = harness(&[CAR]);
        harness.add_source("a.ld", "monza", CAR, &[101.0]);
        let mut ctx = harness.context();
        let mut state = curated_state(&ctx);

        // A regular file cannot hold the output directory.
        let blocker = ctx.root.join("not_a_dir");
        fs::write(&blocker, b"").unwrap();
        ctx.root = blocker;

        let err = Pipeline::new()
            .with_step(CopyStep::new())
            .run(&ctx, &mut state)
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::StepFailed {
                ref step_name,
                source: StepError::OutputDirectory { .. },
                ..
            } if step_name == "Copy"
        ));
        assert!(state.copy.is_none());
    }

    #[test]
    fn failed_companion_copy_removes_main_copy() {
        let mut harness = harness(&[CAR]);
        harness.add_source("a.ld", "monza", CAR, &[101.0]);
        let ctx = harness.context();
        let state = curated_state(&ctx);
        let artifact = &state.curate.as_ref().unwrap().artifacts[0];

        let out = tempdir().unwrap();
        // A directory in the companion's place makes its copy fail.
        fs::create_dir(out.path().join(artifact.companion_destination_name("ldx"))).unwrap();

        let mut warnings = Vec::new();
        let err = CopyStep::new()
            .copy_artifact(&ctx, out.path(), artifact, &mut warnings)
            .unwrap_err();

        assert!(err.contains("a.ldx"));
        assert!(!out.path().join(&artifact.destination_name).exists());
        assert!(warnings.is_empty());
    }

    #[test]
    fn output_dir_name_skips_taken_seconds() {
        let root = tempdir().unwrap();
        let at = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        fs::create_dir(root.path().join("PBs_2024-05-01_100000")).unwrap();

        let dir = unique_output_dir(root.path(), at);
        assert_eq!(dir, root.path().join("PBs_2024-05-01_100001"));
    }

    #[test]
    fn copy_keeps_modification_time() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("a.ld");
        fs::write(&source, b"data").unwrap();
        let old = std::time::SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_600_000_000);
        File::options()
            .write(true)
            .open(&source)
            .unwrap()
            .set_modified(old)
            .unwrap();

        let target = dir.path().join("b.ld");
        copy_preserving_mtime(&source, &target).unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"data");
        assert_eq!(fs::metadata(&target).unwrap().modified().unwrap(), old);
    }
}
