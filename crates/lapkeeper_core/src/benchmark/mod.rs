//! Benchmark resolution and tolerance arithmetic.
//!
//! A benchmark pair is the reference dry and wet lap time for one
//! (category, track), plus the tolerance shared by both ranges. Everything
//! here is pure except [`BenchmarkResolver`], which reads the injected
//! [`BenchmarkStore`](crate::store::BenchmarkStore).

mod advice;
mod resolver;
mod thresholds;

pub use advice::{
    overlap_report, parse_lap_time_input, tightest_recommendation, OverlapEntry, ToleranceAdvice,
    MAX_BENCHMARK_SECONDS, MIN_BENCHMARK_SECONDS,
};
pub use resolver::BenchmarkResolver;
pub use thresholds::{
    max_safe_tolerance, overlap, recommended_tolerance, ThresholdOverlap, DEFAULT_MARGIN,
    MAX_RECOMMENDED_TOLERANCE, MIN_RECOMMENDED_TOLERANCE,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Category;
use crate::store::StoreError;

/// Errors from benchmark resolution.
#[derive(Error, Debug)]
pub enum BenchmarkError {
    /// No dry/wet pair is stored for this track. Resolved by the caller.
    #[error("No benchmark for {track} ({category})")]
    Missing { category: Category, track: String },

    #[error("Invalid benchmark: {0}")]
    Invalid(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for benchmark operations.
pub type BenchmarkResult<T> = Result<T, BenchmarkError>;

/// Raw dry/wet benchmark times as stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkTimes {
    pub dry_seconds: f64,
    pub wet_seconds: f64,
}

impl BenchmarkTimes {
    pub fn new(dry_seconds: f64, wet_seconds: f64) -> Self {
        Self {
            dry_seconds,
            wet_seconds,
        }
    }
}

/// Validated benchmark pair used for classification.
///
/// Both times are positive and the tolerance lies in (0, 1). `dry < wet` is
/// not required; overlapping ranges are reported, not rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkPair {
    pub dry_seconds: f64,
    pub wet_seconds: f64,
    pub tolerance: f64,
}

impl BenchmarkPair {
    pub fn new(dry_seconds: f64, wet_seconds: f64, tolerance: f64) -> BenchmarkResult<Self> {
        if !(dry_seconds.is_finite() && dry_seconds > 0.0) {
            return Err(BenchmarkError::Invalid(format!(
                "dry time must be positive, got {dry_seconds}"
            )));
        }
        if !(wet_seconds.is_finite() && wet_seconds > 0.0) {
            return Err(BenchmarkError::Invalid(format!(
                "wet time must be positive, got {wet_seconds}"
            )));
        }
        if !(tolerance.is_finite() && tolerance > 0.0 && tolerance < 1.0) {
            return Err(BenchmarkError::Invalid(format!(
                "tolerance must be in (0, 1), got {tolerance}"
            )));
        }
        Ok(Self {
            dry_seconds,
            wet_seconds,
            tolerance,
        })
    }

    pub fn from_times(times: BenchmarkTimes, tolerance: f64) -> BenchmarkResult<Self> {
        Self::new(times.dry_seconds, times.wet_seconds, tolerance)
    }

    /// Overlap analysis of this pair.
    pub fn overlap(&self) -> ThresholdOverlap {
        overlap(self.dry_seconds, self.wet_seconds, self.tolerance)
    }

    pub fn times(&self) -> BenchmarkTimes {
        BenchmarkTimes::new(self.dry_seconds, self.wet_seconds)
    }
}
