//! Pipeline step trait definition.

use super::errors::StepResult;
use super::types::{Context, ScanState, StepOutcome};

/// Trait for pipeline steps.
///
/// The pipeline runner calls these methods in order:
///
/// 1. `validate_input` - Check preconditions before execution
/// 2. `execute` - Perform the step's work
/// 3. `validate_output` - Verify the step produced valid output
///
/// # Example
///
/// ```ignore
/// struct CurateStep;
///
/// impl PipelineStep for CurateStep {
///     fn name(&self) -> &str { "Curate" }
///
///     fn validate_input(&self, _ctx: &Context, state: &ScanState) -> StepResult<()> {
///         if state.collect.is_none() {
///             return Err(StepError::precondition_failed("Collect has not run"));
///         }
///         Ok(())
///     }
///
///     fn execute(&self, ctx: &Context, state: &mut ScanState) -> StepResult<StepOutcome> {
///         state.curate = Some(CurateOutput { ... });
///         Ok(StepOutcome::Success)
///     }
///
///     fn validate_output(&self, _ctx: &Context, state: &ScanState) -> StepResult<()> {
///         Ok(())
///     }
/// }
/// ```
pub trait PipelineStep: Send + Sync {
    /// Get the step name (for logging and error context).
    fn name(&self) -> &str;

    /// Validate inputs before execution.
    ///
    /// Checks that earlier steps recorded what this step reads.
    fn validate_input(&self, ctx: &Context<'_>, state: &ScanState) -> StepResult<()>;

    /// Execute the step's main work and record results in `state`.
    ///
    /// Returns `StepOutcome::Skipped` if the step determined it should not
    /// run (not an error).
    fn execute(&self, ctx: &Context<'_>, state: &mut ScanState) -> StepResult<StepOutcome>;

    /// Validate outputs after execution.
    ///
    /// Only called after `execute` returns `Success`.
    fn validate_output(&self, ctx: &Context<'_>, state: &ScanState) -> StepResult<()>;

    /// Human-readable description of what this step does.
    fn description(&self) -> &str {
        self.name()
    }
}
