//! Lap records extracted from telemetry sources.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::enums::{Condition, LapClass};

/// A source recording: the main telemetry file plus its companion metadata file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceArtifact {
    /// Main telemetry file (e.g. `.ld`). Also the artifact's identity.
    pub main_path: PathBuf,
    /// Companion metadata file (e.g. `.ldx`).
    pub companion_path: PathBuf,
}

impl SourceArtifact {
    /// Build an artifact whose companion shares the main file's stem.
    pub fn new(main_path: impl Into<PathBuf>, companion_extension: &str) -> Self {
        let main_path = main_path.into();
        let companion_path = main_path.with_extension(companion_extension);
        Self {
            main_path,
            companion_path,
        }
    }

    /// Identity used for deduplication.
    pub fn id(&self) -> &Path {
        &self.main_path
    }

    /// File name of the main file, for reports and logs.
    pub fn file_name(&self) -> String {
        self.main_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// One lap duration taken from a source. Immutable once extracted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LapRecord {
    pub duration_seconds: f64,
    pub source: SourceArtifact,
    pub recording_date: NaiveDate,
}

impl LapRecord {
    pub fn new(duration_seconds: f64, source: SourceArtifact, recording_date: NaiveDate) -> Self {
        Self {
            duration_seconds,
            source,
            recording_date,
        }
    }
}

/// A lap together with its classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedLap {
    pub lap: LapRecord,
    pub class: LapClass,
}

/// (track, car) grouping key for curation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupKey {
    pub track: String,
    pub car: String,
}

impl GroupKey {
    pub fn new(track: impl Into<String>, car: impl Into<String>) -> Self {
        Self {
            track: track.into(),
            car: car.into(),
        }
    }
}

/// Per-(track, car) buckets of classified laps, in encounter order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConditionBuckets {
    pub dry: Vec<LapRecord>,
    pub wet: Vec<LapRecord>,
    /// Gap laps, kept for the audit rows of the report.
    pub gap: Vec<LapRecord>,
}

impl ConditionBuckets {
    /// Route a classified lap into its bucket. Invalid laps are dropped.
    pub fn push(&mut self, classified: ClassifiedLap) {
        match classified.class {
            LapClass::Dry => self.dry.push(classified.lap),
            LapClass::Wet => self.wet.push(classified.lap),
            LapClass::Gap => self.gap.push(classified.lap),
            LapClass::Invalid => {}
        }
    }

    /// Laps eligible for PB selection under one condition.
    pub fn laps(&self, condition: Condition) -> &[LapRecord] {
        match condition {
            Condition::Dry => &self.dry,
            Condition::Wet => &self.wet,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.dry.is_empty() && self.wet.is_empty() && self.gap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lap(duration: f64) -> LapRecord {
        LapRecord::new(
            duration,
            SourceArtifact::new("/data/monza-car-1-2024.05.01-10.00.00.ld", "ldx"),
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        )
    }

    #[test]
    fn companion_shares_stem() {
        let artifact = SourceArtifact::new("/data/session.ld", "ldx");
        assert_eq!(artifact.companion_path, PathBuf::from("/data/session.ldx"));
        assert_eq!(artifact.file_name(), "session.ld");
    }

    #[test]
    fn buckets_route_by_class_and_drop_invalid() {
        let mut buckets = ConditionBuckets::default();
        buckets.push(ClassifiedLap { lap: lap(100.0), class: LapClass::Dry });
        buckets.push(ClassifiedLap { lap: lap(130.0), class: LapClass::Wet });
        buckets.push(ClassifiedLap { lap: lap(115.0), class: LapClass::Gap });
        buckets.push(ClassifiedLap { lap: lap(10.0), class: LapClass::Invalid });

        assert_eq!(buckets.laps(Condition::Dry).len(), 1);
        assert_eq!(buckets.laps(Condition::Wet).len(), 1);
        assert_eq!(buckets.gap.len(), 1);
    }
}
