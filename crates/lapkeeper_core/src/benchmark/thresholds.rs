//! Range overlap and tolerance recommendation.

use serde::{Deserialize, Serialize};

/// Safety margin subtracted from the maximum safe tolerance.
pub const DEFAULT_MARGIN: f64 = 0.02;

/// Lower clamp for recommended tolerances.
pub const MIN_RECOMMENDED_TOLERANCE: f64 = 0.05;

/// Upper clamp for recommended tolerances.
pub const MAX_RECOMMENDED_TOLERANCE: f64 = 0.30;

/// Where the dry range ends and the wet range begins.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdOverlap {
    /// `wet_min <= dry_max`.
    pub overlaps: bool,
    /// `dry * (1 + tol)`.
    pub dry_max: f64,
    /// `wet * (1 - tol)`.
    pub wet_min: f64,
}

pub fn overlap(dry: f64, wet: f64, tolerance: f64) -> ThresholdOverlap {
    let dry_max = dry * (1.0 + tolerance);
    let wet_min = wet * (1.0 - tolerance);
    ThresholdOverlap {
        overlaps: wet_min <= dry_max,
        dry_max,
        wet_min,
    }
}

/// Tolerance at which `dry_max == wet_min`.
///
/// `None` unless `dry < wet`.
pub fn max_safe_tolerance(dry: f64, wet: f64) -> Option<f64> {
    if dry.is_nan() || wet.is_nan() || dry >= wet {
        return None;
    }
    Some((wet - dry) / (wet + dry))
}

/// Maximum safe tolerance minus `margin`, clamped to
/// [`MIN_RECOMMENDED_TOLERANCE`, `MAX_RECOMMENDED_TOLERANCE`] and rounded to 0.01.
pub fn recommended_tolerance(dry: f64, wet: f64, margin: f64) -> Option<f64> {
    let max_safe = max_safe_tolerance(dry, wet)?;
    let clamped = (max_safe - margin).clamp(MIN_RECOMMENDED_TOLERANCE, MAX_RECOMMENDED_TOLERANCE);
    Some((clamped * 100.0).round() / 100.0)
}
