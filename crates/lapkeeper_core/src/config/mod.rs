//! Configuration management for LapKeeper.
//!
//! This module provides:
//! - TOML-based configuration with logical sections
//! - Atomic file writes (write to temp, then rename)
//! - Section-level updates (only changed section is modified)
//! - Validation on load with automatic defaults
//!
//! # Example
//!
//! ```no_run
//! use lapkeeper_core::config::{ConfigManager, ConfigSection};
//!
//! // Create manager and load (or create default) config
//! let mut config = ConfigManager::new(".config/settings.toml");
//! config.load_or_create().unwrap();
//!
//! // Read settings
//! println!("PBs per condition: {}", config.settings().curation.pb_count);
//!
//! // Modify a setting
//! config.settings_mut().curation.pb_count = 5;
//!
//! // Save just the curation section atomically
//! config.update_section(ConfigSection::Curation).unwrap();
//! ```

mod manager;
mod settings;

pub use manager::{write_atomic, ConfigError, ConfigManager, ConfigResult};
pub use settings::{ConfigSection, CurationSettings, LoggingSettings, PathSettings, Settings};
