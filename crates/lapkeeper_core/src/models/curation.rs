//! Outputs of one curation run.

use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::comparison::ConditionComparison;
use super::enums::{Condition, ReportAction};
use super::laps::SourceArtifact;

/// One of the top-N laps for a (track, car, condition).
///
/// Ranks are dense and start at 1 within their group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalBestSlot {
    pub track: String,
    pub car: String,
    pub condition: Condition,
    pub rank: u32,
    pub lap_time: f64,
    pub source: SourceArtifact,
    pub recording_date: NaiveDate,
}

/// A distinct source file selected for copying.
///
/// The primary slot names the destination file; any other slot that the same
/// source satisfies is attached as an additional slot and not copied again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CopiedArtifact {
    pub source: SourceArtifact,
    /// Destination file name of the main file.
    pub destination_name: String,
    pub primary: PersonalBestSlot,
    pub additional_slots: Vec<PersonalBestSlot>,
}

impl CopiedArtifact {
    /// Total number of PB slots satisfied by this artifact.
    pub fn slot_count(&self) -> usize {
        1 + self.additional_slots.len()
    }

    /// Destination name of the companion file (same stem, other extension).
    pub fn companion_destination_name(&self, companion_extension: &str) -> String {
        let stem = self
            .destination_name
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .unwrap_or(&self.destination_name);
        format!("{}.{}", stem, companion_extension)
    }
}

/// One audit-trail block of the operation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationLogEntry {
    /// Local time of the copy, `YYYY-MM-DD HH:MM:SS`.
    pub timestamp: String,
    pub source: PathBuf,
    pub destination: PathBuf,
    /// Companion destination, when a companion file was copied.
    pub companion_destination: Option<PathBuf>,
    pub primary: PersonalBestSlot,
    pub additional_slots: Vec<PersonalBestSlot>,
}

/// One row of the structured report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub track: String,
    pub car: String,
    /// `dry`, `wet` or `GAP`.
    pub condition: String,
    /// Rank number, or `-` for gap rows.
    pub rank: String,
    /// Display-formatted `M:SS.mmm`.
    pub lap_time: String,
    pub previous_time: String,
    /// Signed delta with three decimals, or `-`.
    pub delta: String,
    pub original_file: String,
    pub new_file: String,
    pub action: ReportAction,
}

/// Aggregate outcome of one scan run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CurationResult {
    /// Sources that produced at least one usable lap.
    pub processed: usize,
    /// Sources skipped (unreadable, no companion, no usable laps, unresolved benchmark).
    pub skipped: usize,
    /// Number of PB slots identified.
    pub pb_count: usize,
    /// Distinct artifacts selected for copying.
    pub artifacts_planned: usize,
    /// Artifacts actually copied (0 on a dry run).
    pub artifacts_copied: usize,
    /// Artifacts whose copy failed.
    pub copy_failures: usize,
    /// Laps that fell between the dry and wet ranges.
    pub gap_laps: usize,
    pub dry_run: bool,
    /// Output directory created for this run (absent on a dry run).
    pub output_dir: Option<PathBuf>,
    /// Structured report file, when one was written.
    pub report_path: Option<PathBuf>,
    pub rows: Vec<ReportRow>,
    pub operation_log: Vec<OperationLogEntry>,
    pub comparisons: Vec<ConditionComparison>,
    /// Non-fatal warnings (threshold overlaps, gap laps).
    pub warnings: Vec<String>,
    /// Bounded list of per-item error messages.
    pub errors: Vec<String>,
}

impl CurationResult {
    /// One-line summary, always available even when items failed.
    pub fn summary(&self) -> String {
        format!(
            "processed {} | skipped {} | PBs {} | copied {}/{}{}",
            self.processed,
            self.skipped,
            self.pb_count,
            self.artifacts_copied,
            self.artifacts_planned,
            if self.copy_failures > 0 {
                format!(" | copy failures {}", self.copy_failures)
            } else {
                String::new()
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot() -> PersonalBestSlot {
        PersonalBestSlot {
            track: "monza".to_string(),
            car: "car".to_string(),
            condition: Condition::Dry,
            rank: 1,
            lap_time: 100.0,
            source: SourceArtifact::new("/x/a.ld", "ldx"),
            recording_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        }
    }

    #[test]
    fn companion_name_swaps_extension() {
        let artifact = CopiedArtifact {
            source: SourceArtifact::new("/x/a.ld", "ldx"),
            destination_name: "monza_car_dry_1st_1m40.000s_2024-01-01.ld".to_string(),
            primary: slot(),
            additional_slots: vec![],
        };
        assert_eq!(
            artifact.companion_destination_name("ldx"),
            "monza_car_dry_1st_1m40.000s_2024-01-01.ldx"
        );
        assert_eq!(artifact.slot_count(), 1);
    }

    #[test]
    fn summary_mentions_failures_only_when_present() {
        let mut result = CurationResult {
            processed: 4,
            skipped: 1,
            pb_count: 3,
            artifacts_planned: 2,
            artifacts_copied: 2,
            ..Default::default()
        };
        assert!(!result.summary().contains("failures"));

        result.copy_failures = 1;
        assert!(result.summary().contains("copy failures 1"));
    }
}
