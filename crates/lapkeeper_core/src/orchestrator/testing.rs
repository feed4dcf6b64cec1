//! Fakes shared by orchestrator tests.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use tempfile::{tempdir, TempDir};

use super::input::InputProvider;
use super::scanner::Scanner;
use super::types::Context;
use crate::benchmark::BenchmarkTimes;
use crate::config::Settings;
use crate::logging::{LogConfig, RunLogger};
use crate::models::Category;
use crate::store::MemoryBenchmarkStore;
use crate::telemetry::{SessionRecording, TelemetryError, TelemetryReader, TelemetryResult};

/// Serves canned recordings keyed by main file name.
#[derive(Default)]
pub struct FakeReader {
    pub sessions: HashMap<String, SessionRecording>,
}

impl TelemetryReader for FakeReader {
    fn read(&self, main: &Path, companion: &Path) -> TelemetryResult<SessionRecording> {
        if !companion.is_file() {
            return Err(TelemetryError::MissingCompanion(companion.to_path_buf()));
        }
        let name = main
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.sessions
            .get(&name)
            .cloned()
            .ok_or_else(|| TelemetryError::parse(main, "unrecognised recording"))
    }
}

/// Answers from fixed tables and records every question asked.
#[derive(Default)]
pub struct ScriptedInput {
    pub categories: HashMap<String, Category>,
    pub benchmarks: HashMap<String, BenchmarkTimes>,
    pub asked: Vec<String>,
}

impl InputProvider for ScriptedInput {
    fn provide_category(&mut self, car: &str, _suggested: Option<Category>) -> Option<Category> {
        self.asked.push(format!("category:{car}"));
        self.categories.get(car).copied()
    }

    fn provide_benchmark(&mut self, _category: Category, track: &str) -> Option<BenchmarkTimes> {
        self.asked.push(format!("benchmark:{track}"));
        self.benchmarks.get(track).copied()
    }
}

pub struct TestHarness {
    pub dir: TempDir,
    pub settings: Settings,
    pub store: MemoryBenchmarkStore,
    pub reader: FakeReader,
    pub input: ScriptedInput,
}

impl TestHarness {
    pub fn new() -> Self {
        Self {
            dir: tempdir().unwrap(),
            settings: Settings::default(),
            store: MemoryBenchmarkStore::new(),
            reader: FakeReader::default(),
            input: ScriptedInput::default(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write a main/companion pair and register its recording.
    pub fn add_source(&mut self, file_name: &str, track: &str, car: &str, laps: &[f64]) -> PathBuf {
        let main = self.root().join(file_name);
        fs::write(&main, b"ld").unwrap();
        fs::write(main.with_extension("ldx"), b"ldx").unwrap();
        self.reader.sessions.insert(
            file_name.to_string(),
            SessionRecording {
                track: track.to_string(),
                car: car.to_string(),
                recording_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
                lap_durations: laps.to_vec(),
            },
        );
        main
    }

    pub fn started_at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    pub fn context(&mut self) -> Context<'_> {
        let logger = Arc::new(RunLogger::detached(LogConfig::default(), None));
        Context::new(
            self.settings.clone(),
            self.dir.path(),
            "test_scan",
            Self::started_at(),
            logger,
            &self.reader,
            &mut self.store,
            &mut self.input,
        )
    }

    pub fn scanner(&mut self) -> Scanner<'_> {
        Scanner::new(self.settings.clone(), &mut self.store, &self.reader, &mut self.input)
    }
}
