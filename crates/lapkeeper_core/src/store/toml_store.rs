//! File-backed benchmark store.
//!
//! Layout:
//!
//! ```toml
//! [cars]
//! porsche_991ii_gt3_r = "gt3"
//!
//! [categories.gt3]
//! tolerance = 0.05
//!
//! [categories.gt3.dry]
//! monza = 107.5
//!
//! [categories.gt3.wet]
//! monza = 125.0
//! ```
//!
//! Every write re-reads the file, edits the document with `toml_edit`
//! (comments and unrelated keys survive) and replaces the file atomically.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use toml_edit::{value, DocumentMut, Item, Table, TableLike};

use super::{check_tolerance, normalize_track, BenchmarkStore, StoreError, StoreResult};
use crate::benchmark::BenchmarkTimes;
use crate::config::write_atomic;
use crate::models::{Category, Condition};

const CARS: &str = "cars";
const CATEGORIES: &str = "categories";
const TOLERANCE: &str = "tolerance";

/// Benchmark store persisted as a TOML file.
#[derive(Debug, Clone)]
pub struct TomlBenchmarkStore {
    path: PathBuf,
}

impl TomlBenchmarkStore {
    /// Create a store backed by `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the current document (empty if the file does not exist yet).
    fn load(&self) -> StoreResult<DocumentMut> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(content.parse::<DocumentMut>()?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(DocumentMut::new()),
            Err(e) => Err(StoreError::io(&self.path, e)),
        }
    }

    /// Read-modify-write the whole document.
    fn modify<R>(&mut self, edit: impl FnOnce(&mut Table) -> StoreResult<R>) -> StoreResult<R> {
        let mut doc = self.load()?;
        let result = edit(doc.as_table_mut())?;
        write_atomic(&self.path, &doc.to_string()).map_err(|e| StoreError::io(&self.path, e))?;
        tracing::debug!("Benchmark store written to {}", self.path.display());
        Ok(result)
    }
}

impl BenchmarkStore for TomlBenchmarkStore {
    fn car_category(&self, car: &str) -> StoreResult<Option<Category>> {
        let doc = self.load()?;
        let Some(item) = doc
            .as_table()
            .get(CARS)
            .and_then(Item::as_table_like)
            .and_then(|cars| cars.get(car))
        else {
            return Ok(None);
        };
        parse_category(car, item).map(Some)
    }

    fn set_car_category(&mut self, car: &str, category: Category) -> StoreResult<()> {
        self.modify(|root| {
            child_table(root, CARS)?.insert(car, value(category.as_str()));
            Ok(())
        })
    }

    fn cars(&self) -> StoreResult<Vec<(String, Category)>> {
        let doc = self.load()?;
        let Some(cars) = doc.as_table().get(CARS).and_then(Item::as_table_like) else {
            return Ok(Vec::new());
        };

        let mut result = Vec::new();
        for (car, item) in cars.iter() {
            // Keys starting with '_' are annotations, not cars
            if car.starts_with('_') {
                continue;
            }
            result.push((car.to_string(), parse_category(car, item)?));
        }
        result.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(result)
    }

    fn benchmark(&self, category: Category, track: &str) -> StoreResult<Option<BenchmarkTimes>> {
        let doc = self.load()?;
        let key = normalize_track(track);

        let dry = condition_table(doc.as_table(), category, Condition::Dry)
            .map(|t| find_time(t, &key))
            .transpose()?
            .flatten();
        let wet = condition_table(doc.as_table(), category, Condition::Wet)
            .map(|t| find_time(t, &key))
            .transpose()?
            .flatten();

        Ok(match (dry, wet) {
            (Some(dry), Some(wet)) => Some(BenchmarkTimes::new(dry, wet)),
            _ => None,
        })
    }

    fn set_benchmark(
        &mut self,
        category: Category,
        track: &str,
        times: BenchmarkTimes,
    ) -> StoreResult<()> {
        let key = normalize_track(track);
        self.modify(|root| {
            let category_table = child_table(child_table(root, CATEGORIES)?, category.as_str())?;
            for (condition, seconds) in [
                (Condition::Dry, times.dry_seconds),
                (Condition::Wet, times.wet_seconds),
            ] {
                let table = child_table(category_table, condition.as_str())?;
                remove_matching(table, &key);
                table.insert(&key, value(seconds));
            }
            Ok(())
        })
    }

    fn remove_benchmark(&mut self, category: Category, track: &str) -> StoreResult<bool> {
        let key = normalize_track(track);
        self.modify(|root| {
            let category_table = child_table(child_table(root, CATEGORIES)?, category.as_str())?;
            let mut removed = false;
            for condition in Condition::ALL {
                removed |= remove_matching(child_table(category_table, condition.as_str())?, &key);
            }
            Ok(removed)
        })
    }

    fn tracks(&self, category: Category) -> StoreResult<Vec<String>> {
        let doc = self.load()?;
        let mut tracks = BTreeSet::new();
        for condition in Condition::ALL {
            if let Some(table) = condition_table(doc.as_table(), category, condition) {
                tracks.extend(
                    table
                        .iter()
                        .filter(|(key, _)| !key.starts_with('_'))
                        .map(|(key, _)| normalize_track(key)),
                );
            }
        }
        Ok(tracks.into_iter().collect())
    }

    fn tolerance(&self, category: Category) -> StoreResult<Option<f64>> {
        let doc = self.load()?;
        let Some(item) = category_table(doc.as_table(), category).and_then(|t| t.get(TOLERANCE))
        else {
            return Ok(None);
        };
        number(item)
            .map(Some)
            .ok_or_else(|| StoreError::invalid(TOLERANCE, "expected a number"))
    }

    fn set_tolerance(&mut self, category: Category, tolerance: f64) -> StoreResult<()> {
        check_tolerance(tolerance)?;
        self.modify(|root| {
            child_table(child_table(root, CATEGORIES)?, category.as_str())?
                .insert(TOLERANCE, value(tolerance));
            Ok(())
        })
    }
}

/// Get or create a child table. New tables are implicit so empty parents
/// produce no header.
fn child_table<'a>(parent: &'a mut Table, key: &str) -> StoreResult<&'a mut Table> {
    let mut table = Table::new();
    table.set_implicit(true);
    parent
        .entry(key)
        .or_insert(Item::Table(table))
        .as_table_mut()
        .ok_or_else(|| StoreError::invalid(key, "expected a table"))
}

fn category_table(root: &Table, category: Category) -> Option<&dyn TableLike> {
    root.get(CATEGORIES)
        .and_then(Item::as_table_like)
        .and_then(|t| t.get(category.as_str()))
        .and_then(Item::as_table_like)
}

fn condition_table(root: &Table, category: Category, condition: Condition) -> Option<&dyn TableLike> {
    category_table(root, category)
        .and_then(|t| t.get(condition.as_str()))
        .and_then(Item::as_table_like)
}

/// Find a track time by normalised key.
fn find_time(table: &dyn TableLike, key: &str) -> StoreResult<Option<f64>> {
    for (name, item) in table.iter() {
        if normalize_track(name) == key {
            return number(item)
                .map(Some)
                .ok_or_else(|| StoreError::invalid(name, "expected a lap time in seconds"));
        }
    }
    Ok(None)
}

/// Remove every key that normalises to `key`.
fn remove_matching(table: &mut Table, key: &str) -> bool {
    let matching: Vec<String> = table
        .iter()
        .filter(|(name, _)| normalize_track(name) == key)
        .map(|(name, _)| name.to_string())
        .collect();
    for name in &matching {
        table.remove(name);
    }
    !matching.is_empty()
}

fn number(item: &Item) -> Option<f64> {
    item.as_float()
        .or_else(|| item.as_integer().map(|i| i as f64))
}

fn parse_category(car: &str, item: &Item) -> StoreResult<Category> {
    item.as_str()
        .ok_or_else(|| StoreError::invalid(car, "expected a category string"))?
        .parse()
        .map_err(|e: String| StoreError::invalid(car, e))
}
