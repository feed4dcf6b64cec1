//! Entry point for a complete scan.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Local, Timelike};

use super::create_scan_pipeline;
use super::errors::{PipelineError, PipelineResult};
use super::input::InputProvider;
use super::types::{Context, ProgressCallback, ScanState};
use crate::config::Settings;
use crate::logging::{LogCallback, LogConfig, RunLogger};
use crate::models::CurationResult;
use crate::store::BenchmarkStore;
use crate::telemetry::TelemetryReader;

/// Main-extension files directly inside `root`, sorted by path.
pub fn enumerate_sources(root: &Path, main_extension: &str) -> io::Result<Vec<PathBuf>> {
    let mut sources = Vec::new();
    for entry in fs::read_dir(root)? {
        let path = entry?.path();
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case(main_extension))
            .unwrap_or(false);
        if matches && path.is_file() {
            sources.push(path);
        }
    }
    sources.sort();
    Ok(sources)
}

/// What to scan and where side outputs go.
#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub root: PathBuf,
    pub dry_run: bool,
    /// Folder for the CSV report. `None` skips the file.
    pub report_dir: Option<PathBuf>,
    /// Folder for the per-run log file. `None` keeps the log in memory.
    pub log_dir: Option<PathBuf>,
}

impl ScanRequest {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            dry_run: false,
            report_dir: None,
            log_dir: None,
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_report_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.report_dir = Some(dir.into());
        self
    }

    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }
}

/// Runs the scan pipeline against injected collaborators.
pub struct Scanner<'a> {
    settings: Settings,
    store: &'a mut dyn BenchmarkStore,
    reader: &'a dyn TelemetryReader,
    input: &'a mut dyn InputProvider,
    log_callback: Option<LogCallback>,
    progress_callback: Option<ProgressCallback>,
}

impl<'a> Scanner<'a> {
    pub fn new(
        settings: Settings,
        store: &'a mut dyn BenchmarkStore,
        reader: &'a dyn TelemetryReader,
        input: &'a mut dyn InputProvider,
    ) -> Self {
        Self {
            settings,
            store,
            reader,
            input,
            log_callback: None,
            progress_callback: None,
        }
    }

    /// Receive every run-log line as it is written.
    pub fn with_log_callback(mut self, callback: LogCallback) -> Self {
        self.log_callback = Some(callback);
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Run one scan to completion.
    ///
    /// Only setup problems and a failure to create the output directory are
    /// returned as errors. Everything per-file ends up in the result.
    pub fn run(self, request: ScanRequest) -> PipelineResult<CurationResult> {
        let Scanner {
            settings,
            store,
            reader,
            input,
            log_callback,
            progress_callback,
        } = self;

        let now = Local::now().naive_local();
        let started_at = now.with_nanosecond(0).unwrap_or(now);
        let run_name = format!("scan_{}", started_at.format("%Y%m%d_%H%M%S"));

        let log_config = LogConfig::from_settings(&settings.logging);
        let logger = match &request.log_dir {
            Some(dir) => RunLogger::new(&run_name, dir, log_config, log_callback).map_err(|e| {
                PipelineError::setup_failed(
                    &run_name,
                    format!("cannot create run log in {}: {}", dir.display(), e),
                )
            })?,
            None => RunLogger::detached(log_config, log_callback),
        };
        let logger = Arc::new(logger);

        if !request.root.is_dir() {
            return Err(PipelineError::setup_failed(
                &run_name,
                format!("{} is not a directory", request.root.display()),
            ));
        }
        let sources = enumerate_sources(&request.root, &settings.curation.main_extension)
            .map_err(|e| {
                PipelineError::setup_failed(
                    &run_name,
                    format!("cannot list {}: {}", request.root.display(), e),
                )
            })?;

        tracing::info!(
            "Starting {} over {} ({} sources{})",
            run_name,
            request.root.display(),
            sources.len(),
            if request.dry_run { ", dry run" } else { "" }
        );

        let max_errors = settings.curation.max_error_messages;
        let ctx = Context::new(
            settings,
            &request.root,
            &run_name,
            started_at,
            Arc::clone(&logger),
            reader,
            store,
            input,
        )
        .with_report_dir(request.report_dir.clone())
        .with_dry_run(request.dry_run)
        .with_progress_callback(progress_callback);

        let mut state = ScanState::new(&run_name, sources);
        let pipeline = create_scan_pipeline();

        if let Err(e) = pipeline.run(&ctx, &mut state) {
            let partial = state.into_result(request.dry_run, max_errors);
            logger.error(&format!("Scan aborted: {}", e));
            logger.info(&partial.summary());
            tracing::error!("{}", e);
            return Err(e);
        }

        let result = state.into_result(request.dry_run, max_errors);
        logger.success(&result.summary());
        for warning in &result.warnings {
            tracing::warn!("{}", warning);
        }
        tracing::info!("Finished {}: {}", run_name, result.summary());
        logger.flush();
        Ok(result)
    }
}
