//! Command handlers.
//!
//! Handlers parse nothing themselves: they receive the parsed [`Cli`],
//! call into `lapkeeper_core` and print either text or a JSON envelope.

mod bench;
mod maintenance;
mod scan;

pub use bench::{handle_bench, handle_car, handle_config};
pub use maintenance::{handle_cleanup, handle_undo};
pub use scan::handle_scan;

use std::path::{Path, PathBuf};

use anyhow::bail;
use serde::Serialize;

use lapkeeper_core::config::ConfigManager;
use lapkeeper_core::store::TomlBenchmarkStore;

#[derive(Serialize)]
pub struct JsonOut<T: Serialize> {
    pub ok: bool,
    pub data: T,
}

pub fn print_out<T: Serialize>(
    json: bool,
    data: &[T],
    row: impl Fn(&T) -> String,
) -> anyhow::Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&JsonOut { ok: true, data })?
        );
    } else {
        for d in data {
            println!("{}", row(d));
        }
    }
    Ok(())
}

pub fn print_one<T: Serialize>(json: bool, data: T, row: impl Fn(&T) -> String) -> anyhow::Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&JsonOut { ok: true, data })?
        );
    } else {
        println!("{}", row(&data));
    }
    Ok(())
}

/// The explicit root, else the configured telemetry root.
pub fn telemetry_root(explicit: Option<&Path>, config: &ConfigManager) -> anyhow::Result<PathBuf> {
    if let Some(root) = explicit {
        return Ok(root.to_path_buf());
    }
    let configured = config.settings().paths.telemetry_root.trim();
    if configured.is_empty() {
        bail!(
            "no telemetry directory given and paths.telemetry_root is empty in {}",
            config.path().display()
        );
    }
    Ok(PathBuf::from(configured))
}

pub fn open_store(config: &ConfigManager) -> TomlBenchmarkStore {
    TomlBenchmarkStore::new(config.benchmarks_file())
}
