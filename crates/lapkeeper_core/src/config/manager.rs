//! Config manager for loading, saving, and atomic updates.
//!
//! Key features:
//! - Atomic writes (write to temp file, then rename)
//! - Section-level updates (only modified section is changed)
//! - Validation on load (rejects out-of-range values)
//! - Preserves comments and formatting with toml_edit

use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use toml_edit::{DocumentMut, Item};

use super::settings::{ConfigSection, Settings};

/// Errors that can occur during config operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Failed to parse config for editing: {0}")]
    EditParseError(#[from] toml_edit::TomlError),

    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Result type for config operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

const KNOWN_SECTIONS: [&str; 3] = ["paths", "curation", "logging"];

/// Manages application configuration.
///
/// Handles loading, saving, and atomic section-level updates.
pub struct ConfigManager {
    /// Path to the config file.
    config_path: PathBuf,
    /// Current settings loaded in memory.
    settings: Settings,
}

impl ConfigManager {
    /// Create a new config manager with the given config file path.
    ///
    /// Does not load the config - call `load()` or `load_or_create()` after.
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            settings: Settings::default(),
        }
    }

    /// Get the config file path.
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Get a reference to the current settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Get a mutable reference to the current settings.
    ///
    /// Note: Changes made here are only in memory until `save()` or
    /// `update_section()` is called.
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Load config from file.
    ///
    /// Returns error if file doesn't exist.
    pub fn load(&mut self) -> ConfigResult<()> {
        if !self.config_path.exists() {
            return Err(ConfigError::NotFound(self.config_path.clone()));
        }

        let content = fs::read_to_string(&self.config_path)?;
        let settings: Settings = toml::from_str(&content)?;
        Self::validate(&settings)?;
        self.settings = settings;
        Ok(())
    }

    /// Load config from file, creating with defaults if it doesn't exist.
    ///
    /// Missing keys are filled with defaults and written back.
    pub fn load_or_create(&mut self) -> ConfigResult<()> {
        if self.config_path.exists() {
            let content = fs::read_to_string(&self.config_path)?;
            let (settings, was_modified) = self.parse_validate_and_clean(&content)?;
            self.settings = settings;

            if was_modified {
                for section in ConfigSection::ALL {
                    self.update_section(section)?;
                }
            }
        } else {
            self.settings = Settings::default();
            self.save()?;
        }
        Ok(())
    }

    /// Ensure the report and logs directories exist.
    pub fn ensure_dirs_exist(&self) -> ConfigResult<()> {
        for dir in [self.report_folder(), self.logs_folder()] {
            if !dir.exists() {
                fs::create_dir_all(&dir)?;
            }
        }
        Ok(())
    }

    /// Get the logs folder path.
    pub fn logs_folder(&self) -> PathBuf {
        PathBuf::from(&self.settings.paths.logs_folder)
    }

    /// Get the report folder path.
    pub fn report_folder(&self) -> PathBuf {
        PathBuf::from(&self.settings.paths.report_folder)
    }

    /// Get the benchmark store path.
    pub fn benchmarks_file(&self) -> PathBuf {
        PathBuf::from(&self.settings.paths.benchmarks_file)
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(settings: &Settings) -> ConfigResult<()> {
        let curation = &settings.curation;
        if curation.pb_count == 0 {
            return Err(ConfigError::Invalid {
                key: "curation.pb_count",
                message: "must be at least 1".to_string(),
            });
        }
        let tol = curation.default_tolerance;
        if !(tol.is_finite() && tol > 0.0 && tol < 1.0) {
            return Err(ConfigError::Invalid {
                key: "curation.default_tolerance",
                message: format!("{tol} is outside (0, 1)"),
            });
        }
        if curation.main_extension.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "curation.main_extension",
                message: "must not be empty".to_string(),
            });
        }
        if curation
            .main_extension
            .eq_ignore_ascii_case(&curation.companion_extension)
        {
            return Err(ConfigError::Invalid {
                key: "curation.companion_extension",
                message: "must differ from main_extension".to_string(),
            });
        }
        Ok(())
    }

    /// Parse, validate, and detect content that needs rewriting.
    ///
    /// Returns the settings and whether the file lacks any known key.
    fn parse_validate_and_clean(&self, content: &str) -> ConfigResult<(Settings, bool)> {
        let doc: DocumentMut = content.parse()?;
        let settings: Settings = toml::from_str(content)?;
        Self::validate(&settings)?;

        let defaults: DocumentMut = toml::to_string_pretty(&settings)?.parse()?;
        let mut was_modified = false;
        for section in KNOWN_SECTIONS {
            let Some(expected) = defaults.get(section).and_then(Item::as_table_like) else {
                continue;
            };
            match doc.get(section).and_then(Item::as_table_like) {
                Some(present) => {
                    if expected.iter().any(|(key, _)| !present.contains_key(key)) {
                        was_modified = true;
                    }
                }
                None => was_modified = true,
            }
        }

        Ok((settings, was_modified))
    }

    /// Save the entire config atomically.
    ///
    /// Writes to a temp file first, then renames to ensure atomic write.
    pub fn save(&self) -> ConfigResult<()> {
        let content = self.generate_config_with_comments()?;
        write_atomic(&self.config_path, &content)?;
        Ok(())
    }

    /// Update a specific section atomically.
    ///
    /// This re-reads the file from disk, updates only the specified section,
    /// and writes back atomically. Other sections and their comments are
    /// left untouched.
    pub fn update_section(&mut self, section: ConfigSection) -> ConfigResult<()> {
        let current_content = if self.config_path.exists() {
            fs::read_to_string(&self.config_path)?
        } else {
            String::new()
        };

        let mut doc: DocumentMut = if current_content.is_empty() {
            DocumentMut::new()
        } else {
            current_content.parse()?
        };

        let section_toml = self.section_toml(section)?;
        let section_doc: DocumentMut = section_toml.parse()?;
        let section_table = section_doc.as_table().clone();

        let table_name = section.table_name();
        match doc.get_mut(table_name).and_then(Item::as_table_mut) {
            // Keep the existing header decor (comments) and key order.
            Some(existing) => {
                for (key, item) in section_table.iter() {
                    existing.insert(key, item.clone());
                }
            }
            None => doc[table_name] = Item::Table(section_table),
        }

        write_atomic(&self.config_path, &doc.to_string())?;
        Ok(())
    }

    fn section_toml(&self, section: ConfigSection) -> ConfigResult<String> {
        let text = match section {
            ConfigSection::Paths => toml::to_string_pretty(&self.settings.paths)?,
            ConfigSection::Curation => toml::to_string_pretty(&self.settings.curation)?,
            ConfigSection::Logging => toml::to_string_pretty(&self.settings.logging)?,
        };
        Ok(text)
    }

    /// Generate config content with helpful comments.
    fn generate_config_with_comments(&self) -> ConfigResult<String> {
        let mut output = String::new();

        output.push_str("# LapKeeper Configuration\n");
        output.push_str(
            "# This file is auto-generated. Comments may be preserved on section updates.\n",
        );

        for section in ConfigSection::ALL {
            output.push('\n');
            output.push_str(&format!("# {}\n", section.comment()));
            output.push_str(&format!("[{}]\n", section.table_name()));
            for line in self.section_toml(section)?.lines() {
                output.push_str(line);
                output.push('\n');
            }
        }

        Ok(output)
    }
}

/// Write `content` to `path` atomically.
///
/// Writes `<name>.tmp` beside the target, syncs it, then renames over the target.
pub fn write_atomic(path: &Path, content: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut temp_name: OsString = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    {
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
    }

    fs::rename(&temp_path, path)?;
    Ok(())
}
