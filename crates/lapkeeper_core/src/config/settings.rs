//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Each section can be updated independently for atomic section-level updates.

use serde::{Deserialize, Serialize};

use crate::logging::LogLevel;

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Path-related settings.
    #[serde(default)]
    pub paths: PathSettings,

    /// Curation behaviour.
    #[serde(default)]
    pub curation: CurationSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Identifies one settings section (one TOML table).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSection {
    Paths,
    Curation,
    Logging,
}

impl ConfigSection {
    /// All sections, in file order.
    pub const ALL: [ConfigSection; 3] = [
        ConfigSection::Paths,
        ConfigSection::Curation,
        ConfigSection::Logging,
    ];

    /// Get the TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "paths",
            ConfigSection::Curation => "curation",
            ConfigSection::Logging => "logging",
        }
    }

    /// Comment written above the section header.
    pub fn comment(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "Telemetry, report, log and benchmark locations",
            ConfigSection::Curation => "Personal-best selection and file conventions",
            ConfigSection::Logging => "Logging configuration",
        }
    }
}

/// Path configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    /// Default telemetry directory to scan. Empty means it must be given per run.
    #[serde(default)]
    pub telemetry_root: String,

    /// Folder for structured CSV reports.
    #[serde(default = "default_report_folder")]
    pub report_folder: String,

    /// Folder for log files.
    #[serde(default = "default_logs_folder")]
    pub logs_folder: String,

    /// Benchmark / car-category store.
    #[serde(default = "default_benchmarks_file")]
    pub benchmarks_file: String,
}

fn default_report_folder() -> String {
    "reports".to_string()
}

fn default_logs_folder() -> String {
    ".logs".to_string()
}

fn default_benchmarks_file() -> String {
    ".config/benchmarks.toml".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            telemetry_root: String::new(),
            report_folder: default_report_folder(),
            logs_folder: default_logs_folder(),
            benchmarks_file: default_benchmarks_file(),
        }
    }
}

/// Curation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurationSettings {
    /// Personal bests kept per (track, car, condition).
    #[serde(default = "default_pb_count")]
    pub pb_count: usize,

    /// Tolerance used when a category has none of its own.
    #[serde(default = "default_tolerance")]
    pub default_tolerance: f64,

    /// Extension of the main telemetry file.
    #[serde(default = "default_main_extension")]
    pub main_extension: String,

    /// Extension of the companion metadata file.
    #[serde(default = "default_companion_extension")]
    pub companion_extension: String,

    /// Only the fastest dry and fastest wet lap of each source compete for PBs.
    #[serde(default = "default_true")]
    pub best_lap_per_source: bool,

    /// Cap on per-file error messages kept in a run result.
    #[serde(default = "default_max_error_messages")]
    pub max_error_messages: usize,
}

fn default_pb_count() -> usize {
    3
}

fn default_tolerance() -> f64 {
    0.05
}

fn default_main_extension() -> String {
    "ld".to_string()
}

fn default_companion_extension() -> String {
    "ldx".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_error_messages() -> usize {
    20
}

impl Default for CurationSettings {
    fn default() -> Self {
        Self {
            pb_count: default_pb_count(),
            default_tolerance: default_tolerance(),
            main_extension: default_main_extension(),
            companion_extension: default_companion_extension(),
            best_lap_per_source: true,
            max_error_messages: default_max_error_messages(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Default level when RUST_LOG is not set.
    #[serde(default)]
    pub level: LogLevel,

    /// Also write application logs to the logs folder.
    #[serde(default = "default_true")]
    pub file_logging: bool,

    /// Prefix run-log lines with a timestamp.
    #[serde(default = "default_true")]
    pub show_timestamps: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            file_logging: true,
            show_timestamps: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let settings: Settings = toml::from_str("[curation]\npb_count = 5\n").unwrap();
        assert_eq!(settings.curation.pb_count, 5);
        assert_eq!(settings.curation.default_tolerance, 0.05);
        assert_eq!(settings.curation.main_extension, "ld");
        assert_eq!(settings.paths.report_folder, "reports");
    }

    #[test]
    fn section_names_match_fields() {
        let toml_text = toml::to_string(&Settings::default()).unwrap();
        for section in ConfigSection::ALL {
            assert!(toml_text.contains(&format!("[{}]", section.table_name())));
        }
    }
}
