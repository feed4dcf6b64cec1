//! Scan pipeline.
//!
//! A scan runs five steps in a fixed order over one telemetry root:
//!
//! ```text
//! Pipeline
//!     ├── Step: Collect  (read, resolve, classify every source)
//!     ├── Step: Curate   (top-N per track/car/condition, dedupe sources)
//!     ├── Step: Compare  (deltas against the newest existing snapshot)
//!     ├── Step: Copy     (new PBs_ directory; skipped on dry runs)
//!     └── Step: Report   (CSV rows for PB slots and gap laps)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use lapkeeper_core::orchestrator::{NoInput, ScanRequest, Scanner};
//!
//! let mut input = NoInput;
//! let result = Scanner::new(settings, &mut store, &reader, &mut input)
//!     .run(ScanRequest::new("/telemetry").with_dry_run(true))?;
//! println!("{}", result.summary());
//! ```

mod errors;
mod input;
mod pipeline;
mod scanner;
mod step;
pub mod steps;
#[cfg(test)]
pub(crate) mod testing;
mod types;

pub use errors::{PipelineError, PipelineResult, StepError, StepResult};
pub use input::{InputProvider, NoInput, ResolutionRequest};
pub use pipeline::{Pipeline, PipelineRunResult};
pub use scanner::{enumerate_sources, ScanRequest, Scanner};
pub use step::PipelineStep;
pub use steps::{CollectStep, CompareStep, CopyStep, CurateStep, ReportStep};
pub use types::{
    CollectOutput, CompareOutput, Context, CopyOutput, CurateOutput, ProgressCallback,
    ReportOutput, ScanState, StepOutcome,
};

/// Create the scan pipeline with all steps in order.
///
/// Compare runs before Copy so the previous snapshot is read before this
/// run's output directory exists.
pub fn create_scan_pipeline() -> Pipeline {
    Pipeline::new()
        .with_step(CollectStep::new())
        .with_step(CurateStep::new())
        .with_step(CompareStep::new())
        .with_step(CopyStep::new())
        .with_step(ReportStep::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_pipeline_order() {
        let pipeline = create_scan_pipeline();
        assert_eq!(
            pipeline.step_names(),
            vec!["Collect", "Curate", "Compare", "Copy", "Report"]
        );
    }
}
