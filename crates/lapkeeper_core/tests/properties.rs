//! Property-based tests for the classification and curation engine.
//!
//! - Benchmarks always classify as their own condition
//! - Threshold maths stays within its documented bounds
//! - Curation never exceeds N slots and keeps ranks dense
//! - Artifact names decode back to what produced them
//! - Run with ProptestConfig::with_cases(100)

use chrono::NaiveDate;
use proptest::prelude::*;

use lapkeeper_core::benchmark::{
    max_safe_tolerance, overlap, recommended_tolerance, DEFAULT_MARGIN,
    MAX_RECOMMENDED_TOLERANCE, MIN_RECOMMENDED_TOLERANCE,
};
use lapkeeper_core::classify::classify;
use lapkeeper_core::curate::{deduplicate, select_personal_bests};
use lapkeeper_core::models::{Condition, LapClass, LapRecord, SourceArtifact};
use lapkeeper_core::naming::{artifact_file_name, parse_artifact_file_name, round_to_millis};

// ============================================================================
// Strategies
// ============================================================================

fn arb_tolerance() -> impl Strategy<Value = f64> {
    0.001f64..0.999
}

/// (dry, wet) with wet strictly slower.
fn arb_benchmark() -> impl Strategy<Value = (f64, f64)> {
    (30.0f64..300.0).prop_flat_map(|dry| (Just(dry), (dry + 0.01)..(dry + 300.0)))
}

fn arb_condition() -> impl Strategy<Value = Condition> {
    prop_oneof![Just(Condition::Dry), Just(Condition::Wet)]
}

fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (2000i32..2035, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

/// Laps drawn from a handful of source files so some sources repeat.
fn arb_laps() -> impl Strategy<Value = Vec<LapRecord>> {
    proptest::collection::vec((60.0f64..200.0, 0usize..4), 0..30).prop_map(|laps| {
        laps.into_iter()
            .map(|(seconds, source)| {
                LapRecord::new(
                    seconds,
                    SourceArtifact::new(format!("/telemetry/session{source}.ld"), "ldx"),
                    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                )
            })
            .collect()
    })
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: the dry benchmark is always Dry
    #[test]
    fn prop_dry_benchmark_self_classifies(
        (dry, wet) in arb_benchmark(),
        tol in arb_tolerance()
    ) {
        prop_assert_eq!(classify(dry, dry, wet, tol), LapClass::Dry);
    }

    /// Property: the wet benchmark is Wet unless it also sits in the dry range
    #[test]
    fn prop_wet_benchmark_self_classifies(
        (dry, wet) in arb_benchmark(),
        tol in arb_tolerance()
    ) {
        let expected = if wet <= dry * (1.0 + tol) { LapClass::Dry } else { LapClass::Wet };
        prop_assert_eq!(classify(wet, dry, wet, tol), expected);
    }

    /// Property: overlap is exactly wet_min <= dry_max
    #[test]
    fn prop_overlap_matches_definition(
        (dry, wet) in arb_benchmark(),
        tol in arb_tolerance()
    ) {
        let result = overlap(dry, wet, tol);
        prop_assert_eq!(result.overlaps, wet * (1.0 - tol) <= dry * (1.0 + tol));
        prop_assert_eq!(result.overlaps, result.wet_min <= result.dry_max);
    }

    /// Property: Gap only appears when the ranges do not overlap
    #[test]
    fn prop_gap_requires_separated_ranges(
        (dry, wet) in arb_benchmark(),
        tol in arb_tolerance(),
        lap in 10.0f64..700.0
    ) {
        if classify(lap, dry, wet, tol) == LapClass::Gap {
            prop_assert!(!overlap(dry, wet, tol).overlaps);
        }
    }

    /// Property: recommended tolerance is clamped to [0.05, 0.30]
    #[test]
    fn prop_recommended_tolerance_in_bounds((dry, wet) in arb_benchmark()) {
        prop_assert!(max_safe_tolerance(dry, wet).is_some());
        let recommended = recommended_tolerance(dry, wet, DEFAULT_MARGIN).unwrap();
        prop_assert!(recommended >= MIN_RECOMMENDED_TOLERANCE - 1e-9);
        prop_assert!(recommended <= MAX_RECOMMENDED_TOLERANCE + 1e-9);
    }

    /// Property: max safe tolerance is undefined when dry is not faster
    #[test]
    fn prop_max_safe_undefined_when_dry_not_faster(
        wet in 30.0f64..300.0,
        extra in 0.0f64..100.0
    ) {
        prop_assert!(max_safe_tolerance(wet + extra, wet).is_none());
    }

    /// Property: at most N slots, ranks dense from 1, fastest first
    #[test]
    fn prop_pb_slots_bounded_and_dense(laps in arb_laps(), n in 1usize..6) {
        let slots = select_personal_bests("monza", "car", Condition::Dry, &laps, n);

        prop_assert!(slots.len() <= n);
        prop_assert_eq!(slots.len(), laps.len().min(n));
        for (i, slot) in slots.iter().enumerate() {
            prop_assert_eq!(slot.rank as usize, i + 1);
        }
        for pair in slots.windows(2) {
            prop_assert!(pair[0].lap_time <= pair[1].lap_time);
        }
    }

    /// Property: each source is copied once and every slot is accounted for
    #[test]
    fn prop_dedup_never_copies_a_source_twice(
        dry in arb_laps(),
        wet in arb_laps(),
        n in 1usize..5
    ) {
        let mut slots = select_personal_bests("monza", "car", Condition::Dry, &dry, n);
        slots.extend(select_personal_bests("monza", "car", Condition::Wet, &wet, n));
        let slot_count = slots.len();

        let artifacts = deduplicate(slots, |slot| format!("{}_{}.ld", slot.condition, slot.rank));

        prop_assert!(artifacts.len() <= slot_count);
        let covered: usize = artifacts.iter().map(|a| a.slot_count()).sum();
        prop_assert_eq!(covered, slot_count);

        let mut sources: Vec<_> = artifacts.iter().map(|a| a.source.id().to_path_buf()).collect();
        sources.sort();
        sources.dedup();
        prop_assert_eq!(sources.len(), artifacts.len());
    }

    /// Property: artifact names decode to what generated them
    #[test]
    fn prop_artifact_name_round_trip(
        track in "[A-Za-z][A-Za-z0-9]{0,12}",
        car in "[a-z0-9]{1,8}(_[a-z0-9]{1,8}){0,3}",
        condition in arb_condition(),
        rank in 1u32..120,
        lap_time in 30.0f64..600.0,
        date in arb_date()
    ) {
        let name = artifact_file_name(&track, &car, condition, rank, lap_time, date, "ld");
        let parsed = parse_artifact_file_name(&name).unwrap();

        prop_assert_eq!(&parsed.track, &track);
        prop_assert_eq!(&parsed.car, &car);
        prop_assert_eq!(parsed.condition, condition);
        prop_assert_eq!(parsed.rank, rank);
        prop_assert!((parsed.lap_time - round_to_millis(lap_time)).abs() < 1e-6);
        prop_assert_eq!(parsed.date, date);
        prop_assert_eq!(parsed.extension.as_str(), "ld");
    }
}

// ============================================================================
// Fixed scenarios
// ============================================================================

#[test]
fn overlapping_benchmark_scenario() {
    let result = overlap(104.0, 125.0, 0.20);
    assert!(result.overlaps);
    assert!((result.dry_max - 124.8).abs() < 1e-9);
    assert!((result.wet_min - 100.0).abs() < 1e-9);
}

#[test]
fn separated_benchmark_scenario() {
    assert_eq!(classify(120.0, 100.0, 140.0, 0.05), LapClass::Gap);
    assert_eq!(classify(103.0, 100.0, 140.0, 0.05), LapClass::Dry);
    assert_eq!(classify(135.0, 100.0, 140.0, 0.05), LapClass::Wet);
}
