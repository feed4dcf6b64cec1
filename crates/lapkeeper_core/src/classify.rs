//! Lap classification against a benchmark pair.
//!
//! Ranges are `benchmark * (1 ± tol)` for each condition. A lap inside the
//! dry range is Dry even when it also falls inside the wet range, so when the
//! ranges overlap no lap can be Gap.

use serde::{Deserialize, Serialize};

use crate::benchmark::BenchmarkPair;
use crate::models::{ClassifiedLap, LapClass, LapRecord};

/// Classify one lap duration. Never fails; out-of-range laps are `Invalid`.
pub fn classify(duration: f64, dry: f64, wet: f64, tolerance: f64) -> LapClass {
    let dry_min = dry * (1.0 - tolerance);
    let dry_max = dry * (1.0 + tolerance);
    let wet_min = wet * (1.0 - tolerance);
    let wet_max = wet * (1.0 + tolerance);

    if dry_min <= duration && duration <= dry_max {
        LapClass::Dry
    } else if wet_min <= duration && duration <= wet_max {
        LapClass::Wet
    } else if dry_max < wet_min && dry_max < duration && duration < wet_min {
        LapClass::Gap
    } else {
        LapClass::Invalid
    }
}

pub fn classify_pair(duration: f64, pair: &BenchmarkPair) -> LapClass {
    classify(duration, pair.dry_seconds, pair.wet_seconds, pair.tolerance)
}

/// Laps of one source split by class, each list in encounter order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedLaps {
    pub dry: Vec<LapRecord>,
    pub wet: Vec<LapRecord>,
    pub gap: Vec<LapRecord>,
    pub invalid: Vec<LapRecord>,
}

impl ClassifiedLaps {
    /// True when no lap is Dry, Wet or Gap.
    pub fn has_no_usable_laps(&self) -> bool {
        self.dry.is_empty() && self.wet.is_empty() && self.gap.is_empty()
    }

    /// Keep only the fastest dry and fastest wet lap. Gap laps are untouched.
    ///
    /// On equal durations the earlier lap is kept.
    pub fn reduce_to_best(&mut self) {
        keep_fastest(&mut self.dry);
        keep_fastest(&mut self.wet);
    }

    /// Usable laps as [`ClassifiedLap`]s: dry, then wet, then gap.
    pub fn into_classified(self) -> impl Iterator<Item = ClassifiedLap> {
        let tag = |class: LapClass| move |lap: LapRecord| ClassifiedLap { lap, class };
        self.dry
            .into_iter()
            .map(tag(LapClass::Dry))
            .chain(self.wet.into_iter().map(tag(LapClass::Wet)))
            .chain(self.gap.into_iter().map(tag(LapClass::Gap)))
    }
}

fn keep_fastest(laps: &mut Vec<LapRecord>) {
    let fastest = laps
        .iter()
        .enumerate()
        .fold(None::<(usize, f64)>, |best, (index, lap)| match best {
            Some((_, time)) if time <= lap.duration_seconds => best,
            _ => Some((index, lap.duration_seconds)),
        })
        .map(|(index, _)| index);

    if let Some(index) = fastest {
        let lap = laps.swap_remove(index);
        laps.clear();
        laps.push(lap);
    }
}

/// Classify every lap and split the results by class.
pub fn classify_laps(laps: impl IntoIterator<Item = LapRecord>, pair: &BenchmarkPair) -> ClassifiedLaps {
    let mut result = ClassifiedLaps::default();
    for lap in laps {
        match classify_pair(lap.duration_seconds, pair) {
            LapClass::Dry => result.dry.push(lap),
            LapClass::Wet => result.wet.push(lap),
            LapClass::Gap => result.gap.push(lap),
            LapClass::Invalid => result.invalid.push(lap),
        }
    }
    result
}
