//! Benchmark and car-category storage.
//!
//! The scan pipeline never reads configuration files directly. It talks to a
//! [`BenchmarkStore`], an injected read/write port with two implementations:
//! - [`TomlBenchmarkStore`]: file-backed, every write replaces the whole file atomically
//! - [`MemoryBenchmarkStore`]: in-memory, for embedding and tests
//!
//! Track keys are normalised (lowercase, spaces to underscores) so that
//! `"Spa Francorchamps"` and `"spa_francorchamps"` resolve to the same benchmark.

mod memory;
mod toml_store;

pub use memory::MemoryBenchmarkStore;
pub use toml_store::TomlBenchmarkStore;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::benchmark::BenchmarkTimes;
use crate::models::Category;

/// Errors that can occur while reading or writing the store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to access benchmark store {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse benchmark store: {0}")]
    Parse(#[from] toml_edit::TomlError),

    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Read/write port for benchmark times, tolerances and the car -> category map.
///
/// Missing values are `Ok(None)`, never errors; the caller decides how to
/// resolve them.
pub trait BenchmarkStore {
    /// Category assigned to a car, if known.
    fn car_category(&self, car: &str) -> StoreResult<Option<Category>>;

    /// Assign (or reassign) a car's category.
    fn set_car_category(&mut self, car: &str, category: Category) -> StoreResult<()>;

    /// All known cars, sorted by name.
    fn cars(&self) -> StoreResult<Vec<(String, Category)>>;

    /// Dry/wet benchmark for a track. Only returned when both values exist.
    fn benchmark(&self, category: Category, track: &str) -> StoreResult<Option<BenchmarkTimes>>;

    /// Store both benchmark times for a track.
    fn set_benchmark(
        &mut self,
        category: Category,
        track: &str,
        times: BenchmarkTimes,
    ) -> StoreResult<()>;

    /// Remove a track's benchmarks. Returns whether anything was removed.
    fn remove_benchmark(&mut self, category: Category, track: &str) -> StoreResult<bool>;

    /// Tracks with at least one benchmark time, sorted.
    fn tracks(&self, category: Category) -> StoreResult<Vec<String>>;

    /// Category-specific tolerance, if one was set.
    fn tolerance(&self, category: Category) -> StoreResult<Option<f64>>;

    /// Set the tolerance for one category.
    fn set_tolerance(&mut self, category: Category, tolerance: f64) -> StoreResult<()>;
}

/// Normalise a track name into its lookup key.
pub fn normalize_track(track: &str) -> String {
    track.trim().to_lowercase().replace(' ', "_")
}

/// Reject tolerances outside the open interval (0, 1).
pub(crate) fn check_tolerance(tolerance: f64) -> StoreResult<()> {
    if tolerance.is_finite() && tolerance > 0.0 && tolerance < 1.0 {
        Ok(())
    } else {
        Err(StoreError::invalid(
            "tolerance",
            format!("{} is outside (0, 1)", tolerance),
        ))
    }
}
