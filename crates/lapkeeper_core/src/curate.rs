//! Personal-best selection and artifact deduplication.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::models::{
    Condition, ConditionBuckets, CopiedArtifact, LapRecord, PersonalBestSlot,
};

/// Top `n` fastest laps of one (track, car, condition), ranked from 1.
///
/// The sort is stable and keyed on duration only, so equal times keep their
/// encounter order.
pub fn select_personal_bests(
    track: &str,
    car: &str,
    condition: Condition,
    laps: &[LapRecord],
    n: usize,
) -> Vec<PersonalBestSlot> {
    let mut ordered: Vec<&LapRecord> = laps.iter().collect();
    ordered.sort_by(|a, b| a.duration_seconds.total_cmp(&b.duration_seconds));

    ordered
        .into_iter()
        .take(n)
        .enumerate()
        .map(|(index, lap)| PersonalBestSlot {
            track: track.to_string(),
            car: car.to_string(),
            condition,
            rank: index as u32 + 1,
            lap_time: lap.duration_seconds,
            source: lap.source.clone(),
            recording_date: lap.recording_date,
        })
        .collect()
}

/// PB slots for one (track, car): all dry slots, then all wet slots.
pub fn curate_group(
    track: &str,
    car: &str,
    buckets: &ConditionBuckets,
    n: usize,
) -> Vec<PersonalBestSlot> {
    Condition::ALL
        .iter()
        .flat_map(|&condition| {
            select_personal_bests(track, car, condition, buckets.laps(condition), n)
        })
        .collect()
}

/// Collapse slots into one [`CopiedArtifact`] per distinct source.
///
/// The first slot seen for a source is its primary and names the destination
/// via `name_for`; later slots from the same source become additional slots.
/// Artifacts are returned in order of their primary slot.
pub fn deduplicate<F>(slots: Vec<PersonalBestSlot>, mut name_for: F) -> Vec<CopiedArtifact>
where
    F: FnMut(&PersonalBestSlot) -> String,
{
    let mut index_by_source: HashMap<PathBuf, usize> = HashMap::new();
    let mut artifacts: Vec<CopiedArtifact> = Vec::new();

    for slot in slots {
        match index_by_source.get(slot.source.id()) {
            Some(&index) => artifacts[index].additional_slots.push(slot),
            None => {
                index_by_source.insert(slot.source.id().to_path_buf(), artifacts.len());
                artifacts.push(CopiedArtifact {
                    source: slot.source.clone(),
                    destination_name: name_for(&slot),
                    primary: slot,
                    additional_slots: Vec::new(),
                });
            }
        }
    }

    artifacts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceArtifact;
    use chrono::NaiveDate;

    fn lap(seconds: f64, file: &str) -> LapRecord {
        LapRecord::new(
            seconds,
            SourceArtifact::new(format!("/telemetry/{file}"), "ldx"),
            NaiveDate::from_ymd_opt(2024, 5, 4).unwrap(),
        )
    }

    fn simple_name(slot: &PersonalBestSlot) -> String {
        format!("{}_{}_{}.ld", slot.track, slot.condition, slot.rank)
    }

    #[test]
    fn selects_fastest_with_dense_ranks() {
        let laps = vec![lap(103.0, "a.ld"), lap(101.0, "b.ld"), lap(102.0, "c.ld"), lap(100.5, "d.ld")];
        let slots = select_personal_bests("monza", "car", Condition::Dry, &laps, 3);

        let times: Vec<f64> = slots.iter().map(|s| s.lap_time).collect();
        let ranks: Vec<u32> = slots.iter().map(|s| s.rank).collect();
        assert_eq!(times, vec![100.5, 101.0, 102.0]);
        assert_eq!(ranks, vec![1, 2, 3]);
    }

    #[test]
    fn equal_times_keep_encounter_order() {
        let laps = vec![lap(101.0, "first.ld"), lap(100.0, "x.ld"), lap(101.0, "second.ld")];
        let slots = select_personal_bests("monza", "car", Condition::Wet, &laps, 3);

        assert_eq!(slots[1].source.file_name(), "first.ld");
        assert_eq!(slots[2].source.file_name(), "second.ld");
    }

    #[test]
    fn fewer_laps_than_n() {
        let slots = select_personal_bests("monza", "car", Condition::Dry, &[lap(100.0, "a.ld")], 3);
        assert_eq!(slots.len(), 1);
        assert!(select_personal_bests("monza", "car", Condition::Dry, &[], 3).is_empty());
    }

    #[test]
    fn group_ranks_dry_before_wet() {
        let buckets = ConditionBuckets {
            dry: vec![lap(101.0, "a.ld"), lap(100.0, "b.ld")],
            wet: vec![lap(120.0, "c.ld")],
            gap: vec![lap(110.0, "d.ld")],
        };
        let slots = curate_group("monza", "car", &buckets, 3);

        let labels: Vec<(Condition, u32)> = slots.iter().map(|s| (s.condition, s.rank)).collect();
        assert_eq!(
            labels,
            vec![(Condition::Dry, 1), (Condition::Dry, 2), (Condition::Wet, 1)]
        );
    }

    #[test]
    fn shared_source_is_copied_once() {
        // The same file is dry rank 1 and wet rank 2.
        let buckets = ConditionBuckets {
            dry: vec![lap(100.123, "shared.ld"), lap(101.0, "b.ld")],
            wet: vec![lap(119.0, "c.ld"), lap(120.456, "shared.ld")],
            gap: vec![],
        };
        let slots = curate_group("monza", "car", &buckets, 3);
        assert_eq!(slots.len(), 4);

        let artifacts = deduplicate(slots, simple_name);
        assert_eq!(artifacts.len(), 3);

        let shared = &artifacts[0];
        assert_eq!(shared.source.file_name(), "shared.ld");
        assert_eq!(shared.primary.condition, Condition::Dry);
        assert_eq!(shared.primary.lap_time, 100.123);
        assert_eq!(shared.destination_name, "monza_dry_1.ld");
        assert_eq!(shared.additional_slots.len(), 1);
        assert_eq!(shared.additional_slots[0].condition, Condition::Wet);
        assert_eq!(shared.additional_slots[0].rank, 2);
        assert_eq!(shared.additional_slots[0].lap_time, 120.456);
    }

    #[test]
    fn distinct_sources_map_one_to_one() {
        let slots = select_personal_bests(
            "monza",
            "car",
            Condition::Dry,
            &[lap(100.0, "a.ld"), lap(101.0, "b.ld")],
            3,
        );
        let artifacts = deduplicate(slots, simple_name);
        assert_eq!(artifacts.len(), 2);
        assert!(artifacts.iter().all(|a| a.additional_slots.is_empty()));
    }
}
