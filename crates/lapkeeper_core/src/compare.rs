//! Comparison against the previous curation snapshot.
//!
//! A snapshot is an output directory from an earlier run. Its artifact names
//! are decoded back into ranked slots; files whose names do not decode are
//! ignored.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{Condition, ConditionComparison, DeltaStatus, PersonalBestSlot, SlotDelta, SnapshotSlot};
use crate::naming::{parse_artifact_file_name, parse_output_dir_name, round_to_millis, track_token};

/// An output directory found under the telemetry root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotDir {
    pub path: PathBuf,
    pub name: String,
    pub created: NaiveDateTime,
}

/// Output directories directly under `root`, newest first.
///
/// A missing root yields an empty list.
pub fn find_snapshots(root: &Path) -> io::Result<Vec<SnapshotDir>> {
    if !root.is_dir() {
        return Ok(Vec::new());
    }

    let mut snapshots = Vec::new();
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if let Some(created) = parse_output_dir_name(&name) {
            snapshots.push(SnapshotDir {
                path: entry.path(),
                name,
                created,
            });
        }
    }

    snapshots.sort_by(|a, b| b.created.cmp(&a.created));
    Ok(snapshots)
}

/// (track token, car, condition)
pub type SnapshotKey = (String, String, Condition);

/// Decoded contents of one snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapshotIndex {
    slots: BTreeMap<SnapshotKey, Vec<SnapshotSlot>>,
}

impl SnapshotIndex {
    pub fn insert(&mut self, track: &str, car: &str, condition: Condition, slot: SnapshotSlot) {
        let list = self
            .slots
            .entry((track_token(track), car.to_string(), condition))
            .or_default();
        list.push(slot);
        list.sort_by_key(|s| s.rank);
    }

    /// Slots for one group, ordered by rank.
    pub fn slots(&self, track: &str, car: &str, condition: Condition) -> &[SnapshotSlot] {
        self.slots
            .get(&(track_token(track), car.to_string(), condition))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn slot(&self, track: &str, car: &str, condition: Condition, rank: u32) -> Option<&SnapshotSlot> {
        self.slots(track, car, condition)
            .iter()
            .find(|s| s.rank == rank)
    }

    /// Number of decoded artifacts.
    pub fn artifact_count(&self) -> usize {
        self.slots.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Decode every main-extension artifact in a snapshot directory.
pub fn load_snapshot(dir: &Path, main_extension: &str) -> io::Result<SnapshotIndex> {
    let mut index = SnapshotIndex::default();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy().into_owned();
        let Some(parsed) = parse_artifact_file_name(&file_name) else {
            debug!("Ignoring undecodable snapshot file {}", file_name);
            continue;
        };
        if !parsed.extension.eq_ignore_ascii_case(main_extension) {
            continue;
        }
        index.insert(
            &parsed.track,
            &parsed.car,
            parsed.condition,
            SnapshotSlot {
                rank: parsed.rank,
                lap_time: parsed.lap_time,
                file_name,
            },
        );
    }
    Ok(index)
}

/// Match each slot against the previous slot of the same rank.
///
/// Times are compared at millisecond precision. Without a previous snapshot
/// every slot is `New`.
pub fn compare_slots(slots: &[PersonalBestSlot], previous: Option<&SnapshotIndex>) -> Vec<SlotDelta> {
    slots
        .iter()
        .map(|slot| {
            let previous_time = previous
                .and_then(|index| index.slot(&slot.track, &slot.car, slot.condition, slot.rank))
                .map(|prev| prev.lap_time);
            let delta = previous_time.map(|prev| round_to_millis(slot.lap_time) - prev);
            let delta = delta.map(|d| (d * 1000.0).round() / 1000.0);

            let status = match delta {
                None => DeltaStatus::New,
                Some(d) if d < 0.0 => DeltaStatus::Improved,
                Some(d) if d > 0.0 => DeltaStatus::Slower,
                Some(_) => DeltaStatus::Same,
            };

            SlotDelta {
                track: slot.track.clone(),
                car: slot.car.clone(),
                condition: slot.condition,
                rank: slot.rank,
                lap_time: slot.lap_time,
                previous_time,
                delta,
                is_improvement: matches!(status, DeltaStatus::New | DeltaStatus::Improved),
                status,
            }
        })
        .collect()
}

/// Group deltas per (track, car, condition), attaching the previous slot list.
///
/// Groups keep the order in which they first appear in `deltas`.
pub fn build_comparisons(deltas: &[SlotDelta], previous: Option<&SnapshotIndex>) -> Vec<ConditionComparison> {
    let mut comparisons: Vec<ConditionComparison> = Vec::new();
    for delta in deltas {
        let existing = comparisons.iter_mut().find(|c| {
            c.track == delta.track && c.car == delta.car && c.condition == delta.condition
        });
        match existing {
            Some(comparison) => comparison.current.push(delta.clone()),
            None => comparisons.push(ConditionComparison {
                track: delta.track.clone(),
                car: delta.car.clone(),
                condition: delta.condition,
                current: vec![delta.clone()],
                previous: previous
                    .map(|index| index.slots(&delta.track, &delta.car, delta.condition).to_vec())
                    .unwrap_or_default(),
            }),
        }
    }
    comparisons
}

/// Locates and decodes the most recent snapshot under a root.
#[derive(Debug, Clone)]
pub struct DeltaComparator {
    root: PathBuf,
    main_extension: String,
}

impl DeltaComparator {
    pub fn new(root: impl Into<PathBuf>, main_extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            main_extension: main_extension.into(),
        }
    }

    /// Newest snapshot and its index, if any exists.
    pub fn previous_snapshot(&self) -> io::Result<Option<(SnapshotDir, SnapshotIndex)>> {
        let Some(newest) = find_snapshots(&self.root)?.into_iter().next() else {
            return Ok(None);
        };
        let index = load_snapshot(&newest.path, &self.main_extension)?;
        Ok(Some((newest, index)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceArtifact;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn slot(track: &str, condition: Condition, rank: u32, lap_time: f64) -> PersonalBestSlot {
        PersonalBestSlot {
            track: track.to_string(),
            car: "bmw_m4_gt3".to_string(),
            condition,
            rank,
            lap_time,
            source: SourceArtifact::new("/t/a.ld", "ldx"),
            recording_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        }
    }

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"x").unwrap();
    }

    #[test]
    fn finds_snapshots_newest_first() {
        let root = tempdir().unwrap();
        for name in ["PBs_2024-01-01_100000", "PBs_2024-03-01_090000", "PBs_2024-02-01_235959", "PBs_old", "other"] {
            fs::create_dir(root.path().join(name)).unwrap();
        }
        touch(root.path(), "PBs_2024-04-01_000000");

        let names: Vec<String> = find_snapshots(root.path())
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(
            names,
            vec!["PBs_2024-03-01_090000", "PBs_2024-02-01_235959", "PBs_2024-01-01_100000"]
        );
    }

    #[test]
    fn missing_root_has_no_snapshots() {
        let root = tempdir().unwrap();
        assert!(find_snapshots(&root.path().join("absent")).unwrap().is_empty());
    }

    #[test]
    fn loads_main_files_and_skips_malformed() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "monza_bmw_m4_gt3_dry_2nd_1m46.000s_2024-01-01.ld");
        touch(dir.path(), "monza_bmw_m4_gt3_dry_1st_1m45.500s_2024-01-01.ld");
        touch(dir.path(), "monza_bmw_m4_gt3_dry_1st_1m45.500s_2024-01-01.ldx");
        touch(dir.path(), "operation_log.txt");
        touch(dir.path(), "garbage_name.ld");

        let index = load_snapshot(dir.path(), "ld").unwrap();
        assert_eq!(index.artifact_count(), 2);
        let slots = index.slots("monza", "bmw_m4_gt3", Condition::Dry);
        assert_eq!(slots[0].rank, 1);
        assert_eq!(slots[0].lap_time, 105.5);
        assert_eq!(slots[1].rank, 2);
    }

    #[test]
    fn deltas_against_previous_ranks() {
        let mut index = SnapshotIndex::default();
        for (rank, time) in [(1, 105.5), (2, 106.0), (3, 107.0)] {
            index.insert(
                "monza",
                "bmw_m4_gt3",
                Condition::Dry,
                SnapshotSlot {
                    rank,
                    lap_time: time,
                    file_name: format!("r{rank}.ld"),
                },
            );
        }

        let slots = vec![
            slot("monza", Condition::Dry, 1, 105.25),
            slot("monza", Condition::Dry, 2, 106.0004),
            slot("monza", Condition::Dry, 3, 107.5),
            slot("monza", Condition::Wet, 1, 125.0),
        ];
        let deltas = compare_slots(&slots, Some(&index));

        assert_eq!(deltas[0].status, DeltaStatus::Improved);
        assert_eq!(deltas[0].delta, Some(-0.25));
        assert!(deltas[0].is_improvement);
        assert_eq!(deltas[1].status, DeltaStatus::Same);
        assert!(!deltas[1].is_improvement);
        assert_eq!(deltas[2].status, DeltaStatus::Slower);
        assert_eq!(deltas[2].delta, Some(0.5));
        assert_eq!(deltas[3].status, DeltaStatus::New);
        assert_eq!(deltas[3].previous_time, None);
        assert!(deltas[3].is_improvement);
    }

    #[test]
    fn track_names_match_their_tokens() {
        let mut index = SnapshotIndex::default();
        index.insert(
            "Spa-Francorchamps",
            "bmw_m4_gt3",
            Condition::Dry,
            SnapshotSlot {
                rank: 1,
                lap_time: 137.0,
                file_name: "x.ld".to_string(),
            },
        );
        let deltas = compare_slots(&[slot("Spa Francorchamps", Condition::Dry, 1, 136.0)], Some(&index));
        assert_eq!(deltas[0].delta, Some(-1.0));
    }

    #[test]
    fn no_snapshot_means_all_new() {
        let deltas = compare_slots(&[slot("monza", Condition::Dry, 1, 100.0)], None);
        assert_eq!(deltas[0].status, DeltaStatus::New);
        assert_eq!(deltas[0].delta, None);
    }

    #[test]
    fn comparisons_group_by_condition() {
        let mut index = SnapshotIndex::default();
        index.insert(
            "monza",
            "bmw_m4_gt3",
            Condition::Wet,
            SnapshotSlot {
                rank: 1,
                lap_time: 126.0,
                file_name: "w.ld".to_string(),
            },
        );
        let slots = vec![
            slot("monza", Condition::Dry, 1, 100.0),
            slot("monza", Condition::Dry, 2, 101.0),
            slot("monza", Condition::Wet, 1, 125.0),
        ];
        let deltas = compare_slots(&slots, Some(&index));
        let comparisons = build_comparisons(&deltas, Some(&index));

        assert_eq!(comparisons.len(), 2);
        assert_eq!(comparisons[0].condition, Condition::Dry);
        assert_eq!(comparisons[0].current.len(), 2);
        assert!(comparisons[0].previous.is_empty());
        assert_eq!(comparisons[1].previous.len(), 1);
    }

    #[test]
    fn comparator_reads_newest_snapshot() {
        let root = tempdir().unwrap();
        let old = root.path().join("PBs_2024-01-01_100000");
        let new = root.path().join("PBs_2024-02-01_100000");
        fs::create_dir(&old).unwrap();
        fs::create_dir(&new).unwrap();
        touch(&old, "monza_car_dry_1st_1m40.000s_2024-01-01.ld");
        touch(&new, "monza_car_dry_1st_1m39.000s_2024-01-31.ld");

        let (dir, index) = DeltaComparator::new(root.path(), "ld")
            .previous_snapshot()
            .unwrap()
            .unwrap();
        assert_eq!(dir.name, "PBs_2024-02-01_100000");
        assert_eq!(index.slot("monza", "car", Condition::Dry, 1).unwrap().lap_time, 99.0);
    }
}
