//! MoTeC `.ld` / `.ldx` reader.
//!
//! The `.ld` header holds fixed-width, NUL-padded ASCII fields. Lap timing
//! lives in the `.ldx` XML companion as cumulative `Marker@Time` values in
//! microseconds.

use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, Local, NaiveDate};
use tracing::debug;

use super::{SessionRecording, TelemetryError, TelemetryReader, TelemetryResult};
use crate::naming::parse_source_file_name;

const DATE_OFFSET: usize = 94;
const DATE_LEN: usize = 16;
const VEHICLE_OFFSET: usize = 222;
const VENUE_OFFSET: usize = 350;
const NAME_LEN: usize = 64;
const HEADER_LEN: usize = VENUE_OFFSET + NAME_LEN;

const UNKNOWN_CAR: &str = "unknown";

/// Fields read from the `.ld` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LdHeader {
    pub venue: String,
    pub vehicle_id: String,
    /// `DD/MM/YYYY` date, when it parses.
    pub date: Option<NaiveDate>,
}

fn fixed_str(bytes: &[u8], offset: usize, len: usize) -> String {
    let field = &bytes[offset..offset + len];
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).trim().to_string()
}

/// Decode the header fields from the start of an `.ld` file.
pub fn parse_ld_header(bytes: &[u8]) -> Option<LdHeader> {
    if bytes.len() < HEADER_LEN {
        return None;
    }
    let date = fixed_str(bytes, DATE_OFFSET, DATE_LEN);
    Some(LdHeader {
        venue: fixed_str(bytes, VENUE_OFFSET, NAME_LEN),
        vehicle_id: fixed_str(bytes, VEHICLE_OFFSET, NAME_LEN),
        date: NaiveDate::parse_from_str(&date, "%d/%m/%Y").ok(),
    })
}

/// Lap durations from cumulative lap-boundary timestamps (seconds).
///
/// The first timestamp is a lap of its own unless it is zero.
pub fn lap_durations_from_timestamps(timestamps: &[f64]) -> Vec<f64> {
    let mut durations = Vec::with_capacity(timestamps.len());
    if let Some(&first) = timestamps.first() {
        if first != 0.0 {
            durations.push(first);
        }
    }
    durations.extend(timestamps.windows(2).map(|w| w[1] - w[0]));
    durations
}

/// Lap durations from `.ldx` XML.
///
/// Reads every `Markers/Marker@Time`. When there are none, falls back to the
/// children of the element four levels below the root.
pub fn parse_ldx_lap_times(xml: &str) -> Result<Vec<f64>, String> {
    let doc = roxmltree::Document::parse(xml).map_err(|e| format!("XML parse error: {}", e))?;

    let mut timestamps: Vec<f64> = Vec::new();
    for markers in doc
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "Markers")
    {
        for marker in markers
            .children()
            .filter(|n| n.is_element() && n.tag_name().name() == "Marker")
        {
            if let Some(time) = marker.attribute("Time") {
                timestamps.push(parse_micros(time)?);
            }
        }
    }

    if timestamps.is_empty() {
        let nested = first_element_at_depth(doc.root_element(), 4);
        if let Some(node) = nested {
            for child in node.children().filter(|n| n.is_element()) {
                if let Some(time) = child.attribute("Time") {
                    timestamps.push(parse_micros(time)?);
                }
            }
        }
    }

    Ok(lap_durations_from_timestamps(&timestamps))
}

fn parse_micros(text: &str) -> Result<f64, String> {
    text.trim()
        .parse::<f64>()
        .map(|micros| micros * 1e-6)
        .map_err(|_| format!("invalid marker time '{}'", text))
}

fn first_element_at_depth<'a, 'input>(
    node: roxmltree::Node<'a, 'input>,
    depth: usize,
) -> Option<roxmltree::Node<'a, 'input>> {
    let mut current = node;
    for _ in 0..depth {
        current = current.children().find(|n| n.is_element())?;
    }
    Some(current)
}

/// Reads MoTeC recordings.
///
/// Car and date prefer the original file name
/// (`{Track}-{car}-{n}-{YYYY.MM.DD}-{HH.MM.SS}.ld`), then the header. The
/// date finally falls back to the file's modification time.
#[derive(Debug, Clone, Copy, Default)]
pub struct MotecReader;

impl MotecReader {
    pub fn new() -> Self {
        Self
    }

    fn read_header(&self, main: &Path) -> TelemetryResult<LdHeader> {
        let mut buffer = vec![0u8; HEADER_LEN];
        let mut file = File::open(main).map_err(|e| TelemetryError::io(main, e))?;
        let mut filled = 0;
        while filled < HEADER_LEN {
            let n = file
                .read(&mut buffer[filled..])
                .map_err(|e| TelemetryError::io(main, e))?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        parse_ld_header(&buffer[..filled])
            .ok_or_else(|| TelemetryError::parse(main, format!("header shorter than {HEADER_LEN} bytes")))
    }

    fn modified_date(&self, main: &Path) -> TelemetryResult<NaiveDate> {
        let modified = fs::metadata(main)
            .and_then(|m| m.modified())
            .map_err(|e| TelemetryError::io(main, e))?;
        Ok(DateTime::<Local>::from(modified).date_naive())
    }
}

impl TelemetryReader for MotecReader {
    fn read(&self, main: &Path, companion: &Path) -> TelemetryResult<SessionRecording> {
        if !companion.is_file() {
            return Err(TelemetryError::MissingCompanion(companion.to_path_buf()));
        }

        let header = self.read_header(main)?;
        if header.venue.is_empty() {
            return Err(TelemetryError::parse(main, "header has no venue"));
        }

        let file_name = main
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let from_name = parse_source_file_name(&file_name);

        let car = from_name
            .car
            .or_else(|| (!header.vehicle_id.is_empty()).then(|| header.vehicle_id.clone()))
            .unwrap_or_else(|| UNKNOWN_CAR.to_string());
        let recording_date = match from_name.date.or(header.date) {
            Some(date) => date,
            None => self.modified_date(main)?,
        };

        let xml = fs::read_to_string(companion).map_err(|e| TelemetryError::io(companion, e))?;
        let lap_durations =
            parse_ldx_lap_times(&xml).map_err(|message| TelemetryError::parse(companion, message))?;

        debug!(
            "{}: {} @ {} on {}, {} laps",
            file_name,
            car,
            header.venue,
            recording_date,
            lap_durations.len()
        );

        Ok(SessionRecording {
            track: header.venue,
            car,
            recording_date,
            lap_durations,
        })
    }
}
