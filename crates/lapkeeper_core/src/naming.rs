//! Output directory and artifact file naming.
//!
//! Formats:
//! - output directory: `PBs_{YYYY-MM-DD_HHMMSS}`
//! - artifact: `{track}_{car}_{dry|wet}_{ordinal}_{M}m{SS.mmm}s_{YYYY-MM-DD}.{ext}`
//! - source recording: `{Track}-{car}-{n}-{YYYY.MM.DD}-{HH.MM.SS}.{ext}`
//!
//! The track token never contains `_`, so artifact names decode from both
//! ends: track is the first segment, and date, lap time, ordinal and
//! condition are the last four. Everything in between is the car.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::models::{Condition, PersonalBestSlot};

/// Prefix of every output directory.
pub const OUTPUT_DIR_PREFIX: &str = "PBs_";

const OUTPUT_DIR_TIME_FORMAT: &str = "%Y-%m-%d_%H%M%S";
const ARTIFACT_DATE_FORMAT: &str = "%Y-%m-%d";
const SOURCE_DATE_FORMAT: &str = "%Y.%m.%d";

pub fn output_dir_name(at: &NaiveDateTime) -> String {
    format!("{}{}", OUTPUT_DIR_PREFIX, at.format(OUTPUT_DIR_TIME_FORMAT))
}

/// Timestamp encoded in an output directory name.
pub fn parse_output_dir_name(name: &str) -> Option<NaiveDateTime> {
    let stamp = name.strip_prefix(OUTPUT_DIR_PREFIX)?;
    NaiveDateTime::parse_from_str(stamp, OUTPUT_DIR_TIME_FORMAT).ok()
}

pub fn is_output_dir_name(name: &str) -> bool {
    parse_output_dir_name(name).is_some()
}

/// English ordinal: 1st, 2nd, 3rd, 4th, 11th, 21st, ...
pub fn ordinal(rank: u32) -> String {
    let suffix = match (rank % 10, rank % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{rank}{suffix}")
}

/// Rank from an ordinal. Any of `st`/`nd`/`rd`/`th` is accepted.
pub fn parse_ordinal(text: &str) -> Option<u32> {
    let digits_end = text.find(|c: char| !c.is_ascii_digit())?;
    let (digits, suffix) = text.split_at(digits_end);
    if !matches!(suffix.to_ascii_lowercase().as_str(), "st" | "nd" | "rd" | "th") {
        return None;
    }
    digits.parse().ok().filter(|&rank| rank >= 1)
}

fn total_millis(seconds: f64) -> u64 {
    (seconds.max(0.0) * 1000.0).round() as u64
}

/// Round to the millisecond precision used in file names.
pub fn round_to_millis(seconds: f64) -> f64 {
    total_millis(seconds) as f64 / 1000.0
}

fn split_millis(seconds: f64) -> (u64, u64, u64) {
    let millis = total_millis(seconds);
    (millis / 60_000, (millis / 1000) % 60, millis % 1000)
}

/// `M:SS.mmm`
pub fn format_lap_time_display(seconds: f64) -> String {
    let (minutes, secs, millis) = split_millis(seconds);
    format!("{minutes}:{secs:02}.{millis:03}")
}

/// `{M}m{SS.mmm}s`
pub fn format_lap_time_filename(seconds: f64) -> String {
    let (minutes, secs, millis) = split_millis(seconds);
    format!("{minutes}m{secs:02}.{millis:03}s")
}

/// Seconds from `{M}m{S.mmm}s`; seconds may be unpadded.
pub fn parse_lap_time_filename(text: &str) -> Option<f64> {
    let body = text.strip_suffix('s')?;
    let (minutes, seconds) = body.split_once('m')?;
    if minutes.is_empty() || !minutes.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if seconds.is_empty() || !seconds.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        return None;
    }
    let minutes: u64 = minutes.parse().ok()?;
    let seconds: f64 = seconds.parse().ok()?;
    if seconds >= 60.0 {
        return None;
    }
    Some(round_to_millis(minutes as f64 * 60.0 + seconds))
}

/// Track name as written into artifact names: spaces and underscores become `-`.
pub fn track_token(track: &str) -> String {
    track
        .trim()
        .chars()
        .map(|c| if c == ' ' || c == '_' { '-' } else { c })
        .collect()
}

/// Fields decoded from an artifact file name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactName {
    /// Track token (see [`track_token`]).
    pub track: String,
    pub car: String,
    pub condition: Condition,
    pub rank: u32,
    /// Seconds at millisecond precision.
    pub lap_time: f64,
    pub date: NaiveDate,
    pub extension: String,
}

pub fn artifact_file_name(
    track: &str,
    car: &str,
    condition: Condition,
    rank: u32,
    lap_time: f64,
    date: NaiveDate,
    extension: &str,
) -> String {
    format!(
        "{}_{}_{}_{}_{}_{}.{}",
        track_token(track),
        car,
        condition.as_str(),
        ordinal(rank),
        format_lap_time_filename(lap_time),
        date.format(ARTIFACT_DATE_FORMAT),
        extension
    )
}

/// Destination name for a PB slot.
pub fn slot_file_name(slot: &PersonalBestSlot, extension: &str) -> String {
    artifact_file_name(
        &slot.track,
        &slot.car,
        slot.condition,
        slot.rank,
        slot.lap_time,
        slot.recording_date,
        extension,
    )
}

/// Decode an artifact file name. `None` for anything malformed.
pub fn parse_artifact_file_name(name: &str) -> Option<ArtifactName> {
    let (stem, extension) = name.rsplit_once('.')?;
    if extension.is_empty() {
        return None;
    }

    let parts: Vec<&str> = stem.split('_').collect();
    if parts.len() < 6 {
        return None;
    }
    let n = parts.len();

    let date = NaiveDate::parse_from_str(parts[n - 1], ARTIFACT_DATE_FORMAT).ok()?;
    let lap_time = parse_lap_time_filename(parts[n - 2])?;
    let rank = parse_ordinal(parts[n - 3])?;
    let condition: Condition = parts[n - 4].parse().ok()?;
    let track = parts[0];
    let car = parts[1..n - 4].join("_");
    if track.is_empty() || car.is_empty() {
        return None;
    }

    Some(ArtifactName {
        track: track.to_string(),
        car,
        condition,
        rank,
        lap_time,
        date,
        extension: extension.to_string(),
    })
}

/// Car and date recovered from an original recording name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceNameParts {
    pub car: Option<String>,
    pub date: Option<NaiveDate>,
}

/// Parse `{Track}-{car}-{n}-{YYYY.MM.DD}-{HH.MM.SS}.{ext}`.
///
/// The car is the second `-` segment when there are at least four; the date
/// is the first segment that reads as `YYYY.MM.DD`.
pub fn parse_source_file_name(name: &str) -> SourceNameParts {
    let stem = name.rsplit_once('.').map_or(name, |(stem, _)| stem);
    let parts: Vec<&str> = stem.split('-').collect();

    let car = (parts.len() >= 4)
        .then(|| parts[1].trim())
        .filter(|car| !car.is_empty())
        .map(str::to_string);
    let date = parts
        .iter()
        .find_map(|part| NaiveDate::parse_from_str(part, SOURCE_DATE_FORMAT).ok());

    SourceNameParts { car, date }
}
