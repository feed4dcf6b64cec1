//! In-memory benchmark store.

use std::collections::{BTreeMap, HashMap};

use super::{check_tolerance, normalize_track, BenchmarkStore, StoreResult};
use crate::benchmark::BenchmarkTimes;
use crate::models::Category;

/// Benchmark store kept entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryBenchmarkStore {
    cars: BTreeMap<String, Category>,
    benchmarks: BTreeMap<(Category, String), BenchmarkTimes>,
    tolerances: HashMap<Category, f64>,
}

impl MemoryBenchmarkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder helper: assign a car category.
    pub fn with_car(mut self, car: &str, category: Category) -> Self {
        self.cars.insert(car.to_string(), category);
        self
    }

    /// Builder helper: add a benchmark.
    pub fn with_benchmark(mut self, category: Category, track: &str, dry: f64, wet: f64) -> Self {
        self.benchmarks.insert(
            (category, normalize_track(track)),
            BenchmarkTimes::new(dry, wet),
        );
        self
    }

    /// Builder helper: set a category tolerance.
    pub fn with_tolerance(mut self, category: Category, tolerance: f64) -> Self {
        self.tolerances.insert(category, tolerance);
        self
    }
}

impl BenchmarkStore for MemoryBenchmarkStore {
    fn car_category(&self, car: &str) -> StoreResult<Option<Category>> {
        Ok(self.cars.get(car).copied())
    }

    fn set_car_category(&mut self, car: &str, category: Category) -> StoreResult<()> {
        self.cars.insert(car.to_string(), category);
        Ok(())
    }

    fn cars(&self) -> StoreResult<Vec<(String, Category)>> {
        Ok(self.cars.iter().map(|(k, v)| (k.clone(), *v)).collect())
    }

    fn benchmark(&self, category: Category, track: &str) -> StoreResult<Option<BenchmarkTimes>> {
        Ok(self
            .benchmarks
            .get(&(category, normalize_track(track)))
            .copied())
    }

    fn set_benchmark(
        &mut self,
        category: Category,
        track: &str,
        times: BenchmarkTimes,
    ) -> StoreResult<()> {
        self.benchmarks
            .insert((category, normalize_track(track)), times);
        Ok(())
    }

    fn remove_benchmark(&mut self, category: Category, track: &str) -> StoreResult<bool> {
        Ok(self
            .benchmarks
            .remove(&(category, normalize_track(track)))
            .is_some())
    }

    fn tracks(&self, category: Category) -> StoreResult<Vec<String>> {
        Ok(self
            .benchmarks
            .keys()
            .filter(|(c, _)| *c == category)
            .map(|(_, track)| track.clone())
            .collect())
    }

    fn tolerance(&self, category: Category) -> StoreResult<Option<f64>> {
        Ok(self.tolerances.get(&category).copied())
    }

    fn set_tolerance(&mut self, category: Category, tolerance: f64) -> StoreResult<()> {
        check_tolerance(tolerance)?;
        self.tolerances.insert(category, tolerance);
        Ok(())
    }
}
