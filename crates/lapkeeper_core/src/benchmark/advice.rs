//! Operator-facing helpers: lap time input and per-category tolerance advice.

use serde::{Deserialize, Serialize};

use super::thresholds::{max_safe_tolerance, overlap, recommended_tolerance, DEFAULT_MARGIN};
use super::BenchmarkResult;
use crate::models::Category;
use crate::store::BenchmarkStore;

/// Interactive benchmark entries must be strictly above this many seconds.
pub const MIN_BENCHMARK_SECONDS: f64 = 30.0;

/// Interactive benchmark entries must be strictly below this many seconds.
pub const MAX_BENCHMARK_SECONDS: f64 = 600.0;

/// Parse `M:SS`, `M:SS.mmm` or plain seconds.
///
/// Returns `None` for anything unparseable or outside the accepted
/// benchmark range (30 s, 600 s).
pub fn parse_lap_time_input(input: &str) -> Option<f64> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    let seconds = match input.split_once(':') {
        Some((minutes, rest)) => {
            let minutes: u32 = minutes.trim().parse().ok()?;
            let rest: f64 = rest.trim().parse().ok()?;
            if !(0.0..60.0).contains(&rest) {
                return None;
            }
            f64::from(minutes) * 60.0 + rest
        }
        None => input.parse().ok()?,
    };

    (seconds.is_finite() && seconds > MIN_BENCHMARK_SECONDS && seconds < MAX_BENCHMARK_SECONDS)
        .then_some(seconds)
}

/// Tightest-gap tolerance advice for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToleranceAdvice {
    /// Track with the smallest recommended tolerance.
    pub track: String,
    pub recommended: f64,
    pub max_safe: f64,
}

/// Recommend a category tolerance from its tightest dry/wet gap.
///
/// Tracks where dry is not faster than wet are ignored. On equal
/// recommendations the first track in store order wins.
pub fn tightest_recommendation(
    store: &dyn BenchmarkStore,
    category: Category,
) -> BenchmarkResult<Option<ToleranceAdvice>> {
    let mut best: Option<ToleranceAdvice> = None;
    for track in store.tracks(category)? {
        let Some(times) = store.benchmark(category, &track)? else {
            continue;
        };
        let (Some(recommended), Some(max_safe)) = (
            recommended_tolerance(times.dry_seconds, times.wet_seconds, DEFAULT_MARGIN),
            max_safe_tolerance(times.dry_seconds, times.wet_seconds),
        ) else {
            continue;
        };
        if best.as_ref().map_or(true, |b| recommended < b.recommended) {
            best = Some(ToleranceAdvice {
                track,
                recommended,
                max_safe,
            });
        }
    }
    Ok(best)
}

/// One track whose dry and wet ranges overlap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlapEntry {
    pub track: String,
    pub dry_max: f64,
    pub wet_min: f64,
}

/// Tracks of a category whose ranges overlap at `tolerance`.
pub fn overlap_report(
    store: &dyn BenchmarkStore,
    category: Category,
    tolerance: f64,
) -> BenchmarkResult<Vec<OverlapEntry>> {
    let mut entries = Vec::new();
    for track in store.tracks(category)? {
        let Some(times) = store.benchmark(category, &track)? else {
            continue;
        };
        let result = overlap(times.dry_seconds, times.wet_seconds, tolerance);
        if result.overlaps {
            entries.push(OverlapEntry {
                track,
                dry_max: result.dry_max,
                wet_min: result.wet_min,
            });
        }
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryBenchmarkStore;

    #[test]
    fn parses_minutes_and_seconds() {
        assert_eq!(parse_lap_time_input("1:44"), Some(104.0));
        assert_eq!(parse_lap_time_input(" 1:44.500 "), Some(104.5));
        assert_eq!(parse_lap_time_input("104.5"), Some(104.5));
    }

    #[test]
    fn rejects_out_of_range_and_garbage() {
        assert_eq!(parse_lap_time_input(""), None);
        assert_eq!(parse_lap_time_input("abc"), None);
        assert_eq!(parse_lap_time_input("1:2:3"), None);
        assert_eq!(parse_lap_time_input("1:75"), None);
        assert_eq!(parse_lap_time_input("30"), None);
        assert_eq!(parse_lap_time_input("10:00"), None);
        assert_eq!(parse_lap_time_input("0:31"), Some(31.0));
    }

    #[test]
    fn tightest_track_wins() {
        let store = MemoryBenchmarkStore::new()
            .with_benchmark(Category::Gt3, "monza", 100.0, 140.0)
            .with_benchmark(Category::Gt3, "spa", 130.0, 150.0)
            .with_benchmark(Category::Gt3, "zolder", 90.0, 85.0);

        let advice = tightest_recommendation(&store, Category::Gt3).unwrap().unwrap();
        assert_eq!(advice.track, "spa");
        // (150 - 130) / 280 = 0.0714 -> 0.0514 -> 0.05
        assert_eq!(advice.recommended, 0.05);
        assert!((advice.max_safe - 0.071428).abs() < 1e-5);
    }

    #[test]
    fn no_advice_without_usable_tracks() {
        let store = MemoryBenchmarkStore::new().with_benchmark(Category::Gt3, "zolder", 90.0, 85.0);
        assert_eq!(tightest_recommendation(&store, Category::Gt3).unwrap(), None);
        assert_eq!(tightest_recommendation(&store, Category::Cup).unwrap(), None);
    }

    #[test]
    fn overlap_report_lists_only_overlapping_tracks() {
        let store = MemoryBenchmarkStore::new()
            .with_benchmark(Category::Gt3, "monza", 100.0, 140.0)
            .with_benchmark(Category::Gt3, "imola", 100.0, 110.0);

        let report = overlap_report(&store, Category::Gt3, 0.05).unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].track, "imola");
        assert!((report[0].dry_max - 105.0).abs() < 1e-9);
    }
}
