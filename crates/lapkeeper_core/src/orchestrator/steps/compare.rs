//! Compare step - deltas against the newest existing output directory.
//!
//! Runs before the copy so the snapshot it reads is never the one this run
//! creates.

use crate::compare::{build_comparisons, compare_slots, DeltaComparator};
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{CompareOutput, Context, ScanState, StepOutcome};

/// Compare step for computing per-slot deltas.
pub struct CompareStep;

impl CompareStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CompareStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for CompareStep {
    fn name(&self) -> &str {
        "Compare"
    }

    fn description(&self) -> &str {
        "Compare with previous snapshot"
    }

    fn validate_input(&self, _ctx: &Context<'_>, state: &ScanState) -> StepResult<()> {
        if state.curate.is_none() {
            return Err(StepError::precondition_failed("Curate has not run"));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context<'_>, state: &mut ScanState) -> StepResult<StepOutcome> {
        let Some(curate) = &state.curate else {
            return Err(StepError::precondition_failed("Curate has not run"));
        };

        let comparator = DeltaComparator::new(&ctx.root, &ctx.settings.curation.main_extension);
        let mut warnings = Vec::new();
        let previous = match comparator.previous_snapshot() {
            Ok(previous) => previous,
            Err(e) => {
                let message = format!("Could not read previous snapshot: {}", e);
                ctx.logger.warn(&message);
                warnings.push(message);
                None
            }
        };

        match &previous {
            Some((dir, index)) => ctx.logger.info(&format!(
                "Comparing against {} ({} artifacts)",
                dir.name,
                index.artifact_count()
            )),
            None => ctx.logger.info("No previous snapshot; all personal bests are new"),
        }

        let index = previous.as_ref().map(|(_, index)| index);
        let deltas = compare_slots(&curate.slots, index);
        let comparisons = build_comparisons(&deltas, index);

        let improved = deltas.iter().filter(|d| d.is_improvement).count();
        ctx.logger.info(&format!("{} of {} slots new or improved", improved, deltas.len()));

        state.compare = Some(CompareOutput {
            previous_snapshot: previous.map(|(dir, _)| dir),
            deltas,
            comparisons,
            warnings,
        });
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context<'_>, state: &ScanState) -> StepResult<()> {
        let (Some(curate), Some(compare)) = (&state.curate, &state.compare) else {
            return Err(StepError::invalid_output("Compare results not recorded"));
        };
        if compare.deltas.len() != curate.slots.len() {
            return Err(StepError::invalid_output("One delta per slot expected"));
        }
        Ok(())
    }
}
