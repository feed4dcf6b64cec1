//! Core types for the scan pipeline.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDateTime;

use super::input::{InputProvider, ResolutionRequest};
use crate::benchmark::BenchmarkTimes;
use crate::compare::SnapshotDir;
use crate::config::Settings;
use crate::logging::RunLogger;
use crate::models::{
    Category, ConditionBuckets, ConditionComparison, CopiedArtifact, CurationResult, GroupKey,
    OperationLogEntry, PersonalBestSlot, ReportRow, SlotDelta,
};
use crate::report::GapLap;
use crate::store::BenchmarkStore;
use crate::telemetry::TelemetryReader;

/// Progress callback type for reporting pipeline progress.
///
/// Arguments: (step_name, percent_complete, message)
pub type ProgressCallback = Box<dyn Fn(&str, u32, &str) + Send + Sync>;

/// Context passed to pipeline steps.
///
/// Run configuration is read-only. The benchmark store and input provider
/// are the only collaborators a step may mutate, one call at a time.
pub struct Context<'a> {
    /// Application settings.
    pub settings: Settings,
    /// Directory scanned for recordings; output directories are created here.
    pub root: PathBuf,
    /// Where the CSV report goes. `None` disables the file.
    pub report_dir: Option<PathBuf>,
    /// Simulate the copy.
    pub dry_run: bool,
    /// Run identifier used in logs and errors.
    pub run_name: String,
    /// Second-resolution start time; names the output directory and report.
    pub started_at: NaiveDateTime,
    /// Per-run logger.
    pub logger: Arc<RunLogger>,
    reader: &'a dyn TelemetryReader,
    store: RefCell<&'a mut dyn BenchmarkStore>,
    input: RefCell<&'a mut dyn InputProvider>,
    progress_callback: Option<ProgressCallback>,
}

impl<'a> Context<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        settings: Settings,
        root: impl Into<PathBuf>,
        run_name: impl Into<String>,
        started_at: NaiveDateTime,
        logger: Arc<RunLogger>,
        reader: &'a dyn TelemetryReader,
        store: &'a mut dyn BenchmarkStore,
        input: &'a mut dyn InputProvider,
    ) -> Self {
        Self {
            settings,
            root: root.into(),
            report_dir: None,
            dry_run: false,
            run_name: run_name.into(),
            started_at,
            logger,
            reader,
            store: RefCell::new(store),
            input: RefCell::new(input),
            progress_callback: None,
        }
    }

    pub fn with_report_dir(mut self, report_dir: Option<PathBuf>) -> Self {
        self.report_dir = report_dir;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Set the progress callback.
    pub fn with_progress_callback(mut self, callback: Option<ProgressCallback>) -> Self {
        self.progress_callback = callback;
        self
    }

    /// Report progress to callback (if set).
    pub fn report_progress(&self, step_name: &str, percent: u32, message: &str) {
        if let Some(ref callback) = self.progress_callback {
            callback(step_name, percent, message);
        }
    }

    pub fn reader(&self) -> &dyn TelemetryReader {
        self.reader
    }

    /// Run `f` with exclusive access to the benchmark store.
    pub fn with_store<R>(&self, f: impl FnOnce(&mut dyn BenchmarkStore) -> R) -> R {
        let mut store = self.store.borrow_mut();
        f(&mut **store)
    }

    pub fn ask_category(&self, car: &str, suggested: Option<Category>) -> Option<Category> {
        self.input.borrow_mut().provide_category(car, suggested)
    }

    pub fn ask_benchmark(&self, category: Category, track: &str) -> Option<BenchmarkTimes> {
        self.input.borrow_mut().provide_benchmark(category, track)
    }
}

/// Result of a step's execute phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Step completed successfully.
    Success,
    /// Step was skipped (with reason).
    Skipped(String),
}

/// Mutable run state that accumulates results from pipeline steps.
///
/// Each step writes its own section once; later steps only read earlier ones.
#[derive(Debug, Clone, Default)]
pub struct ScanState {
    /// Run identifier.
    pub run_id: String,
    /// Recordings found in the root, sorted.
    pub sources: Vec<PathBuf>,
    /// Collect step results.
    pub collect: Option<CollectOutput>,
    pub curate: Option<CurateOutput>,
    pub compare: Option<CompareOutput>,
    pub copy: Option<CopyOutput>,
    pub report: Option<ReportOutput>,
}

impl ScanState {
    pub fn new(run_id: impl Into<String>, sources: Vec<PathBuf>) -> Self {
        Self {
            run_id: run_id.into(),
            sources,
            ..Default::default()
        }
    }

    /// Gap laps across all groups, in group order.
    pub fn gap_laps(&self) -> Vec<GapLap> {
        let Some(collect) = &self.collect else {
            return Vec::new();
        };
        collect
            .groups
            .iter()
            .flat_map(|(key, buckets)| {
                buckets.gap.iter().map(move |lap| GapLap {
                    track: key.track.clone(),
                    car: key.car.clone(),
                    lap: lap.clone(),
                })
            })
            .collect()
    }

    /// Fold every step's output into the run result.
    ///
    /// Error messages are capped at `max_errors`; counters are not.
    pub fn into_result(self, dry_run: bool, max_errors: usize) -> CurationResult {
        let gap_laps = self.gap_laps().len();
        let mut result = CurationResult {
            dry_run,
            gap_laps,
            ..Default::default()
        };

        let mut errors = Vec::new();
        if let Some(collect) = self.collect {
            result.processed = collect.processed;
            result.skipped = collect.skipped;
            result.warnings.extend(collect.warnings);
            errors.extend(collect.errors);
        }
        if let Some(curate) = self.curate {
            result.pb_count = curate.slots.len();
            result.artifacts_planned = curate.artifacts.len();
        }
        if let Some(compare) = self.compare {
            result.comparisons = compare.comparisons;
            result.warnings.extend(compare.warnings);
        }
        if let Some(copy) = self.copy {
            result.artifacts_copied = copy.copied;
            result.copy_failures = copy.failures;
            result.output_dir = copy.output_dir;
            result.operation_log = copy.operation_log;
            result.warnings.extend(copy.warnings);
            errors.extend(copy.errors);
        }
        if let Some(report) = self.report {
            result.rows = report.rows;
            result.report_path = report.report_path;
            errors.extend(report.errors);
        }

        let dropped = errors.len().saturating_sub(max_errors);
        errors.truncate(max_errors);
        if dropped > 0 {
            errors.push(format!("... and {} more", dropped));
        }
        result.errors = errors;
        result
    }
}

/// Output from the Collect step.
#[derive(Debug, Clone, Default)]
pub struct CollectOutput {
    /// Sources that contributed at least one usable lap.
    pub processed: usize,
    /// Sources skipped (unreadable, unresolved or without usable laps).
    pub skipped: usize,
    /// Classified laps per (track, car).
    pub groups: BTreeMap<GroupKey, ConditionBuckets>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    /// Questions the input provider declined.
    pub unresolved: Vec<ResolutionRequest>,
}

/// Output from the Curate step.
#[derive(Debug, Clone, Default)]
pub struct CurateOutput {
    /// All PB slots, grouped by (track, car), dry before wet.
    pub slots: Vec<PersonalBestSlot>,
    /// One entry per distinct source, in primary slot order.
    pub artifacts: Vec<CopiedArtifact>,
}

/// Output from the Compare step.
#[derive(Debug, Clone, Default)]
pub struct CompareOutput {
    pub previous_snapshot: Option<SnapshotDir>,
    /// Parallel to `CurateOutput::slots`.
    pub deltas: Vec<SlotDelta>,
    pub comparisons: Vec<ConditionComparison>,
    pub warnings: Vec<String>,
}

/// Output from the Copy step.
#[derive(Debug, Clone, Default)]
pub struct CopyOutput {
    pub output_dir: Option<PathBuf>,
    pub copied: usize,
    pub failures: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub operation_log: Vec<OperationLogEntry>,
    pub log_path: Option<PathBuf>,
}

/// Output from the Report step.
#[derive(Debug, Clone, Default)]
pub struct ReportOutput {
    pub rows: Vec<ReportRow>,
    pub report_path: Option<PathBuf>,
    pub errors: Vec<String>,
}
