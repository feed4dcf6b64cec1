//! Report step - structured rows for every PB slot and gap lap.
//!
//! Runs on dry runs too; the CSV file is written whenever a report folder is
//! configured.

use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, ReportOutput, ScanState, StepOutcome};
use crate::report::{build_report_rows, report_file_name, write_report_csv};

/// Report step for the CSV sink.
pub struct ReportStep;

impl ReportStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ReportStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for ReportStep {
    fn name(&self) -> &str {
        "Report"
    }

    fn description(&self) -> &str {
        "Write scan report"
    }

    fn validate_input(&self, _ctx: &Context<'_>, state: &ScanState) -> StepResult<()> {
        if state.curate.is_none() || state.compare.is_none() {
            return Err(StepError::precondition_failed("Compare has not run"));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context<'_>, state: &mut ScanState) -> StepResult<StepOutcome> {
        let (Some(curate), Some(compare)) = (&state.curate, &state.compare) else {
            return Err(StepError::precondition_failed("Compare has not run"));
        };

        let gap_laps = state.gap_laps();
        let rows = build_report_rows(&curate.slots, &compare.deltas, &curate.artifacts, &gap_laps);
        if !gap_laps.is_empty() {
            ctx.logger.warn(&format!(
                "{} laps fell between the dry and wet ranges",
                gap_laps.len()
            ));
        }

        let mut out = ReportOutput {
            rows,
            ..Default::default()
        };

        if let Some(report_dir) = &ctx.report_dir {
            let path = report_dir.join(report_file_name(&ctx.started_at));
            match write_report_csv(&out.rows, &path) {
                Ok(()) => {
                    ctx.logger.info(&format!("Report saved to {}", path.display()));
                    out.report_path = Some(path);
                }
                Err(e) => {
                    let message = format!("Failed to write report {}: {}", path.display(), e);
                    ctx.logger.error(&message);
                    out.errors.push(message);
                }
            }
        }

        state.report = Some(out);
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context<'_>, state: &ScanState) -> StepResult<()> {
        if state.report.is_none() {
            return Err(StepError::invalid_output("Report rows not recorded"));
        }
        Ok(())
    }
}
