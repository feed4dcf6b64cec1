//! Curate step - top-N selection per (track, car) and source deduplication.

use crate::curate::{curate_group, deduplicate};
use crate::naming::slot_file_name;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, CurateOutput, ScanState, StepOutcome};

/// Curate step for picking personal bests.
pub struct CurateStep;

impl CurateStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CurateStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for CurateStep {
    fn name(&self) -> &str {
        "Curate"
    }

    fn description(&self) -> &str {
        "Select personal bests"
    }

    fn validate_input(&self, _ctx: &Context<'_>, state: &ScanState) -> StepResult<()> {
        if state.collect.is_none() {
            return Err(StepError::precondition_failed("Collect has not run"));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context<'_>, state: &mut ScanState) -> StepResult<StepOutcome> {
        let Some(collect) = &state.collect else {
            return Err(StepError::precondition_failed("Collect has not run"));
        };
        let curation = &ctx.settings.curation;

        let mut slots = Vec::new();
        for (key, buckets) in &collect.groups {
            let group = curate_group(&key.track, &key.car, buckets, curation.pb_count);
            ctx.logger.debug(&format!(
                "{} / {}: {} slots",
                key.track,
                key.car,
                group.len()
            ));
            slots.extend(group);
        }

        let artifacts = deduplicate(slots.clone(), |slot| {
            slot_file_name(slot, &curation.main_extension)
        });

        ctx.logger.info(&format!(
            "{} personal bests from {} sources",
            slots.len(),
            artifacts.len()
        ));
        for artifact in artifacts.iter().filter(|a| !a.additional_slots.is_empty()) {
            ctx.logger.debug(&format!(
                "{} covers {} slots",
                artifact.source.file_name(),
                artifact.slot_count()
            ));
        }

        state.curate = Some(CurateOutput { slots, artifacts });
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context<'_>, state: &ScanState) -> StepResult<()> {
        let Some(curate) = &state.curate else {
            return Err(StepError::invalid_output("Curate results not recorded"));
        };
        if curate.artifacts.len() > curate.slots.len() {
            return Err(StepError::invalid_output(format!(
                "{} artifacts for {} slots",
                curate.artifacts.len(),
                curate.slots.len()
            )));
        }
        Ok(())
    }
}
