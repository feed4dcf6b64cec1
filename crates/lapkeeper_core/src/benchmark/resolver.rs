//! Store-backed benchmark lookup.

use tracing::debug;

use super::{BenchmarkError, BenchmarkPair, BenchmarkResult};
use crate::models::Category;
use crate::store::BenchmarkStore;

/// Resolves a [`BenchmarkPair`] for a (category, track) from a store.
///
/// The tolerance is the category's own when set, otherwise the default.
/// A missing benchmark is reported as [`BenchmarkError::Missing`] so the
/// caller can obtain the value, persist it, and resolve again.
#[derive(Debug, Clone, Copy)]
pub struct BenchmarkResolver {
    default_tolerance: f64,
}

impl BenchmarkResolver {
    pub fn new(default_tolerance: f64) -> Self {
        Self { default_tolerance }
    }

    pub fn default_tolerance(&self) -> f64 {
        self.default_tolerance
    }

    /// Tolerance in effect for a category.
    pub fn tolerance(&self, store: &dyn BenchmarkStore, category: Category) -> BenchmarkResult<f64> {
        Ok(store.tolerance(category)?.unwrap_or(self.default_tolerance))
    }

    pub fn resolve(
        &self,
        store: &dyn BenchmarkStore,
        category: Category,
        track: &str,
    ) -> BenchmarkResult<BenchmarkPair> {
        let times = store
            .benchmark(category, track)?
            .ok_or_else(|| BenchmarkError::Missing {
                category,
                track: track.to_string(),
            })?;
        let tolerance = self.tolerance(store, category)?;
        debug!(
            "Resolved {} {}: dry {:.3}s wet {:.3}s tol {:.2}",
            category, track, times.dry_seconds, times.wet_seconds, tolerance
        );
        BenchmarkPair::from_times(times, tolerance)
    }
}
