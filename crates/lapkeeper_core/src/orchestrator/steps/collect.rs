//! Collect step - reads every recording and buckets its classified laps.
//!
//! Per source: read telemetry, resolve the car's category, resolve the
//! track's benchmark pair (asking the input provider for anything missing),
//! classify each lap and add it to its (track, car) bucket. A source that
//! cannot be read or resolved, or has no usable laps, is skipped and the run
//! carries on.

use std::collections::HashSet;
use std::path::Path;

use crate::benchmark::{BenchmarkError, BenchmarkPair, BenchmarkResolver};
use crate::classify::classify_laps;
use crate::models::{Category, GroupKey, LapRecord, SourceArtifact};
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::input::ResolutionRequest;
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{CollectOutput, Context, ScanState, StepOutcome};
use crate::store::normalize_track;

/// Collect step for turning source recordings into classified laps.
pub struct CollectStep;

impl CollectStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CollectStep {
    fn default() -> Self {
        Self::new()
    }
}

/// Why a source was skipped.
enum SkipReason {
    /// The source or the store failed.
    Error(String),
    /// Nothing wrong with the file, but it could not be used this run.
    Warning(String),
}

/// Answers and warnings remembered across sources within one run.
#[derive(Default)]
struct Resolution {
    declined_cars: HashSet<String>,
    declined_tracks: HashSet<(Category, String)>,
    warned_overlaps: HashSet<(String, Category)>,
}

impl CollectStep {
    fn resolve_category(
        &self,
        ctx: &Context<'_>,
        car: &str,
        resolution: &mut Resolution,
        out: &mut CollectOutput,
    ) -> Result<Category, SkipReason> {
        match ctx.with_store(|store| store.car_category(car)) {
            Ok(Some(category)) => return Ok(category),
            Ok(None) => {}
            Err(e) => return Err(SkipReason::Error(e.to_string())),
        }

        let suggested = Category::infer_from_car(car);
        let request = ResolutionRequest::Category {
            car: car.to_string(),
            suggested,
        };
        if resolution.declined_cars.contains(car) {
            return Err(SkipReason::Warning(request.to_string()));
        }

        match ctx.ask_category(car, suggested) {
            Some(category) => {
                match ctx.with_store(|store| store.set_car_category(car, category)) {
                    Ok(()) => ctx
                        .logger
                        .info(&format!("Assigned {} to {}", car, category.name())),
                    Err(e) => ctx
                        .logger
                        .warn(&format!("Could not save category for {}: {}", car, e)),
                }
                Ok(category)
            }
            None => {
                resolution.declined_cars.insert(car.to_string());
                let message = request.to_string();
                out.unresolved.push(request);
                Err(SkipReason::Warning(message))
            }
        }
    }

    fn resolve_pair(
        &self,
        ctx: &Context<'_>,
        resolver: &BenchmarkResolver,
        category: Category,
        track: &str,
        resolution: &mut Resolution,
        out: &mut CollectOutput,
    ) -> Result<BenchmarkPair, SkipReason> {
        match ctx.with_store(|store| resolver.resolve(store, category, track)) {
            Ok(pair) => return Ok(pair),
            Err(BenchmarkError::Missing { .. }) => {}
            Err(e) => return Err(SkipReason::Error(e.to_string())),
        }

        let key = (category, normalize_track(track));
        let request = ResolutionRequest::Benchmark {
            category,
            track: track.to_string(),
        };
        if resolution.declined_tracks.contains(&key) {
            return Err(SkipReason::Warning(request.to_string()));
        }

        let Some(times) = ctx.ask_benchmark(category, track) else {
            resolution.declined_tracks.insert(key);
            let message = request.to_string();
            out.unresolved.push(request);
            return Err(SkipReason::Warning(message));
        };

        match ctx.with_store(|store| store.set_benchmark(category, track, times)) {
            Ok(()) => ctx.logger.info(&format!(
                "Saved {} benchmark for {}: dry {:.3}s, wet {:.3}s",
                category, track, times.dry_seconds, times.wet_seconds
            )),
            Err(e) => ctx
                .logger
                .warn(&format!("Could not save benchmark for {}: {}", track, e)),
        }

        let tolerance = ctx
            .with_store(|store| resolver.tolerance(store, category))
            .map_err(|e| SkipReason::Error(e.to_string()))?;
        BenchmarkPair::from_times(times, tolerance).map_err(|e| SkipReason::Error(e.to_string()))
    }

    fn collect_source(
        &self,
        ctx: &Context<'_>,
        resolver: &BenchmarkResolver,
        path: &Path,
        resolution: &mut Resolution,
        out: &mut CollectOutput,
    ) -> Result<(), SkipReason> {
        let curation = &ctx.settings.curation;
        let artifact = SourceArtifact::new(path, &curation.companion_extension);

        let recording = ctx
            .reader()
            .read(&artifact.main_path, &artifact.companion_path)
            .map_err(|e| SkipReason::Error(e.to_string()))?;

        let category = self.resolve_category(ctx, &recording.car, resolution, out)?;
        let pair = self.resolve_pair(ctx, resolver, category, &recording.track, resolution, out)?;

        let overlap = pair.overlap();
        if overlap.overlaps
            && resolution
                .warned_overlaps
                .insert((normalize_track(&recording.track), category))
        {
            let message = format!(
                "{} ({}): dry/wet thresholds overlap (dry max {:.3}s >= wet min {:.3}s); laps in both ranges count as dry",
                recording.track, category, overlap.dry_max, overlap.wet_min
            );
            ctx.logger.warn(&message);
            out.warnings.push(message);
        }

        let extracted = recording.lap_durations.len();
        let laps = recording
            .lap_durations
            .iter()
            .map(|&duration| LapRecord::new(duration, artifact.clone(), recording.recording_date));
        let mut classified = classify_laps(laps, &pair);

        ctx.logger.debug(&format!(
            "{}: {} / {} [{}] dry {} wet {} gap {} invalid {}",
            artifact.file_name(),
            recording.track,
            recording.car,
            category,
            classified.dry.len(),
            classified.wet.len(),
            classified.gap.len(),
            classified.invalid.len()
        ));

        if classified.has_no_usable_laps() {
            return Err(SkipReason::Warning(format!(
                "no usable laps ({} extracted)",
                extracted
            )));
        }
        if curation.best_lap_per_source {
            classified.reduce_to_best();
        }

        let buckets = out
            .groups
            .entry(GroupKey::new(&recording.track, &recording.car))
            .or_default();
        for lap in classified.into_classified() {
            buckets.push(lap);
        }
        Ok(())
    }
}

impl PipelineStep for CollectStep {
    fn name(&self) -> &str {
        "Collect"
    }

    fn description(&self) -> &str {
        "Read and classify source laps"
    }

    fn validate_input(&self, ctx: &Context<'_>, _state: &ScanState) -> StepResult<()> {
        if !ctx.root.is_dir() {
            return Err(StepError::invalid_input(format!(
                "{} is not a directory",
                ctx.root.display()
            )));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context<'_>, state: &mut ScanState) -> StepResult<StepOutcome> {
        let total = state.sources.len();
        ctx.logger.info(&format!(
            "Found {} recordings in {}",
            total,
            ctx.root.display()
        ));

        let resolver = BenchmarkResolver::new(ctx.settings.curation.default_tolerance);
        let mut resolution = Resolution::default();
        let mut out = CollectOutput::default();

        for (i, path) in state.sources.iter().enumerate() {
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            match self.collect_source(ctx, &resolver, path, &mut resolution, &mut out) {
                Ok(()) => out.processed += 1,
                Err(SkipReason::Error(message)) => {
                    out.skipped += 1;
                    ctx.logger.skip(&file_name, &message);
                    out.errors.push(format!("{}: {}", file_name, message));
                }
                Err(SkipReason::Warning(message)) => {
                    out.skipped += 1;
                    ctx.logger.skip(&file_name, &message);
                    out.warnings.push(format!("{}: {}", file_name, message));
                }
            }

            ctx.logger.progress(i + 1, total);
            let percent = (((i + 1) * 100) / total.max(1)) as u32;
            ctx.report_progress(self.name(), percent, &file_name);
        }

        ctx.logger.info(&format!(
            "Collected {} sources into {} track/car groups ({} skipped)",
            out.processed,
            out.groups.len(),
            out.skipped
        ));
        state.collect = Some(out);
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context<'_>, state: &ScanState) -> StepResult<()> {
        let Some(collect) = &state.collect else {
            return Err(StepError::invalid_output("Collect results not recorded"));
        };
        if collect.processed + collect.skipped != state.sources.len() {
            return Err(StepError::invalid_output(format!(
                "{} sources accounted for, {} found",
                collect.processed + collect.skipped,
                state.sources.len()
            )));
        }
        Ok(())
    }
}
