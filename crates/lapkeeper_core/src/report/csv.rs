//! Structured CSV report.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::config::write_atomic;
use crate::models::{CopiedArtifact, LapRecord, PersonalBestSlot, ReportAction, ReportRow, SlotDelta};
use crate::naming::format_lap_time_display;

/// Header row, in column order.
pub const REPORT_COLUMNS: [&str; 10] = [
    "track",
    "car",
    "condition",
    "rank",
    "lap_time",
    "previous_time",
    "delta",
    "original_file",
    "new_file",
    "action",
];

const NONE: &str = "-";

/// A lap that fell between the dry and wet ranges of its (track, car).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapLap {
    pub track: String,
    pub car: String,
    pub lap: LapRecord,
}

/// `pb_scan_{YYYYMMDD_HHMMSS}.csv`
pub fn report_file_name(at: &NaiveDateTime) -> String {
    format!("pb_scan_{}.csv", at.format("%Y%m%d_%H%M%S"))
}

/// Rows for every PB slot (in slot order) followed by every gap lap.
///
/// `deltas` runs parallel to `slots`. A slot's `new_file` is the destination
/// of the artifact its source was copied as, which for additional slots is
/// the primary slot's name.
pub fn build_report_rows(
    slots: &[PersonalBestSlot],
    deltas: &[SlotDelta],
    artifacts: &[CopiedArtifact],
    gap_laps: &[GapLap],
) -> Vec<ReportRow> {
    let destinations: HashMap<&Path, &str> = artifacts
        .iter()
        .map(|a| (a.source.id(), a.destination_name.as_str()))
        .collect();

    let pb_rows = slots.iter().enumerate().map(|(i, slot)| {
        let delta = deltas.get(i);
        let previous_time = delta.and_then(|d| d.previous_time);
        let delta = delta.and_then(|d| d.delta);
        ReportRow {
            track: slot.track.clone(),
            car: slot.car.clone(),
            condition: slot.condition.as_str().to_string(),
            rank: slot.rank.to_string(),
            lap_time: format_lap_time_display(slot.lap_time),
            previous_time: previous_time.map_or_else(|| NONE.to_string(), format_lap_time_display),
            delta: delta.map_or_else(|| NONE.to_string(), |d| format!("{:+.3}", d)),
            original_file: slot.source.file_name(),
            new_file: destinations
                .get(slot.source.id())
                .map_or(NONE, |name| *name)
                .to_string(),
            action: ReportAction::Pb,
        }
    });

    let gap_rows = gap_laps.iter().map(|gap| ReportRow {
        track: gap.track.clone(),
        car: gap.car.clone(),
        condition: "GAP".to_string(),
        rank: NONE.to_string(),
        lap_time: format_lap_time_display(gap.lap.duration_seconds),
        previous_time: NONE.to_string(),
        delta: NONE.to_string(),
        original_file: gap.lap.source.file_name(),
        new_file: NONE.to_string(),
        action: ReportAction::GapWarning,
    });

    pb_rows.chain(gap_rows).collect()
}

/// RFC 4180 field: quoted when it holds a comma, quote or line break.
fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn render_csv(rows: &[ReportRow]) -> String {
    let mut out = String::new();
    out.push_str(&REPORT_COLUMNS.join(","));
    out.push_str("\r\n");

    for row in rows {
        let fields = [
            row.track.as_str(),
            row.car.as_str(),
            row.condition.as_str(),
            row.rank.as_str(),
            row.lap_time.as_str(),
            row.previous_time.as_str(),
            row.delta.as_str(),
            row.original_file.as_str(),
            row.new_file.as_str(),
            row.action.as_str(),
        ];
        let line: Vec<String> = fields.iter().map(|f| escape_field(f)).collect();
        out.push_str(&line.join(","));
        out.push_str("\r\n");
    }
    out
}

/// Write the report, creating the parent directory if needed.
pub fn write_report_csv(rows: &[ReportRow], path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    write_atomic(path, &render_csv(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Condition, DeltaStatus, SourceArtifact};
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, 2).unwrap()
    }

    fn slot(file: &str, condition: Condition, rank: u32, lap_time: f64) -> PersonalBestSlot {
        PersonalBestSlot {
            track: "monza".to_string(),
            car: "bmw_m4_gt3".to_string(),
            condition,
            rank,
            lap_time,
            source: SourceArtifact::new(format!("/t/{file}"), "ldx"),
            recording_date: day(),
        }
    }

    fn delta(slot: &PersonalBestSlot, previous: Option<f64>) -> SlotDelta {
        let delta = previous.map(|p| slot.lap_time - p);
        SlotDelta {
            track: slot.track.clone(),
            car: slot.car.clone(),
            condition: slot.condition,
            rank: slot.rank,
            lap_time: slot.lap_time,
            previous_time: previous,
            delta,
            is_improvement: delta.map_or(true, |d| d < 0.0),
            status: if previous.is_some() { DeltaStatus::Improved } else { DeltaStatus::New },
        }
    }

    #[test]
    fn file_name_uses_compact_timestamp() {
        let at = day().and_hms_opt(9, 8, 7).unwrap();
        assert_eq!(report_file_name(&at), "pb_scan_20240402_090807.csv");
    }

    #[test]
    fn rows_cover_slots_and_gaps() {
        let dry = slot("a.ld", Condition::Dry, 1, 100.123);
        let wet = slot("a.ld", Condition::Wet, 2, 120.456);
        let artifacts = vec![CopiedArtifact {
            source: dry.source.clone(),
            destination_name: "monza_bmw_m4_gt3_dry_1st_1m40.123s_2024-04-02.ld".to_string(),
            primary: dry.clone(),
            additional_slots: vec![wet.clone()],
        }];
        let deltas = vec![delta(&dry, Some(100.5)), delta(&wet, None)];
        let gaps = vec![GapLap {
            track: "monza".to_string(),
            car: "bmw_m4_gt3".to_string(),
            lap: LapRecord::new(110.0, SourceArtifact::new("/t/b.ld", "ldx"), day()),
        }];

        let rows = build_report_rows(&[dry, wet], &deltas, &artifacts, &gaps);
        assert_eq!(rows.len(), 3);

        assert_eq!(rows[0].condition, "dry");
        assert_eq!(rows[0].lap_time, "1:40.123");
        assert_eq!(rows[0].previous_time, "1:40.500");
        assert_eq!(rows[0].delta, "-0.377");
        assert_eq!(rows[0].action, ReportAction::Pb);

        assert_eq!(rows[1].previous_time, "-");
        assert_eq!(rows[1].delta, "-");
        assert_eq!(rows[1].new_file, rows[0].new_file);

        assert_eq!(rows[2].condition, "GAP");
        assert_eq!(rows[2].rank, "-");
        assert_eq!(rows[2].new_file, "-");
        assert_eq!(rows[2].original_file, "b.ld");
        assert_eq!(rows[2].action, ReportAction::GapWarning);
    }

    #[test]
    fn positive_delta_has_plus_sign() {
        let s = slot("a.ld", Condition::Dry, 1, 101.0);
        let rows = build_report_rows(&[s.clone()], &[delta(&s, Some(100.75))], &[], &[]);
        assert_eq!(rows[0].delta, "+0.250");
        assert_eq!(rows[0].new_file, "-");
    }

    #[test]
    fn fields_are_quoted_when_needed() {
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn writes_header_and_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reports").join("pb_scan_x.csv");
        let mut s = slot("a.ld", Condition::Dry, 1, 100.0);
        s.track = "Spa, Belgium".to_string();
        let rows = build_report_rows(&[s.clone()], &[delta(&s, None)], &[], &[]);

        write_report_csv(&rows, &path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.split("\r\n").collect();
        assert_eq!(
            lines[0],
            "track,car,condition,rank,lap_time,previous_time,delta,original_file,new_file,action"
        );
        assert_eq!(lines[1], "\"Spa, Belgium\",bmw_m4_gt3,dry,1,1:40.000,-,-,a.ld,-,PB");
    }
}
