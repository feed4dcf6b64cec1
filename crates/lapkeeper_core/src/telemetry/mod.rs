//! Telemetry reader port.
//!
//! The scan pipeline only needs four facts from a recording: where it was
//! driven, in which car, on which day, and how long each lap took. The
//! [`TelemetryReader`] trait supplies them; [`MotecReader`] reads MoTeC
//! `.ld`/`.ldx` pairs.

mod motec;

pub use motec::{
    lap_durations_from_timestamps, parse_ld_header, parse_ldx_lap_times, LdHeader, MotecReader,
};

use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while reading a recording.
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Companion file not found: {0}")]
    MissingCompanion(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed recording {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

impl TelemetryError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// What the pipeline needs from one recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecording {
    /// Venue name.
    pub track: String,
    /// Vehicle identifier.
    pub car: String,
    pub recording_date: NaiveDate,
    /// Individual lap durations in seconds, in driving order.
    pub lap_durations: Vec<f64>,
}

/// Reads a recording from its main file and companion file.
pub trait TelemetryReader {
    fn read(&self, main: &Path, companion: &Path) -> TelemetryResult<SessionRecording>;
}
