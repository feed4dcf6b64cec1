use anyhow::{anyhow, Context as _};
use serde::Serialize;
use tracing::{info, warn};

use lapkeeper_core::benchmark::{
    overlap, overlap_report, parse_lap_time_input, tightest_recommendation, BenchmarkResolver,
    BenchmarkTimes, OverlapEntry, ToleranceAdvice,
};
use lapkeeper_core::config::ConfigManager;
use lapkeeper_core::models::Category;
use lapkeeper_core::naming::format_lap_time_display;
use lapkeeper_core::store::{BenchmarkStore, TomlBenchmarkStore};

use super::{open_store, print_one, print_out};
use crate::cli::{BenchCommands, CarCommands, ConfigCommands};

#[derive(Debug, Serialize)]
struct TrackBenchmark {
    category: Category,
    track: String,
    dry_seconds: f64,
    wet_seconds: f64,
    tolerance: f64,
    overlaps: bool,
}

#[derive(Serialize)]
struct Advice {
    category: Category,
    tolerance: f64,
    recommendation: Option<ToleranceAdvice>,
    overlaps: Vec<OverlapEntry>,
}

pub fn handle_bench(config: &ConfigManager, json: bool, command: &BenchCommands) -> anyhow::Result<()> {
    let mut store = open_store(config);
    let resolver = BenchmarkResolver::new(config.settings().curation.default_tolerance);

    match command {
        BenchCommands::Show { category } => {
            let categories: Vec<Category> = match category {
                Some(c) => vec![*c],
                None => Category::all().to_vec(),
            };
            let mut rows = Vec::new();
            for category in categories {
                rows.extend(category_benchmarks(&store, &resolver, category)?);
            }
            print_out(json, &rows, |r| {
                format!(
                    "{}\t{}\tdry {}\twet {}\ttol {:.0}%{}",
                    r.category,
                    r.track,
                    format_lap_time_display(r.dry_seconds),
                    format_lap_time_display(r.wet_seconds),
                    r.tolerance * 100.0,
                    if r.overlaps { "\tOVERLAP" } else { "" }
                )
            })?;
        }
        BenchCommands::Set {
            category,
            track,
            dry,
            wet,
        } => {
            let times = BenchmarkTimes::new(lap_time(dry)?, lap_time(wet)?);
            store
                .set_benchmark(*category, track, times)
                .with_context(|| format!("failed to save {} benchmark for {}", category, track))?;
            info!("Saved {} benchmark for {}", category, track);

            let tolerance = resolver.tolerance(&store, *category)?;
            let check = overlap(times.dry_seconds, times.wet_seconds, tolerance);
            if check.overlaps {
                warn!(
                    "{} {}: dry max {:.3}s reaches wet min {:.3}s at {:.0}% tolerance",
                    category,
                    track,
                    check.dry_max,
                    check.wet_min,
                    tolerance * 100.0
                );
            }
            print_one(json, times, |t| {
                format!(
                    "{} {}: dry {} wet {}",
                    category,
                    track,
                    format_lap_time_display(t.dry_seconds),
                    format_lap_time_display(t.wet_seconds)
                )
            })?;
        }
        BenchCommands::Remove { category, track } => {
            let removed = store.remove_benchmark(*category, track)?;
            print_one(json, removed, |removed| {
                if *removed {
                    format!("removed {} benchmark for {}", category, track)
                } else {
                    format!("no {} benchmark for {}", category, track)
                }
            })?;
        }
        BenchCommands::Tolerance { category, value } => {
            store
                .set_tolerance(*category, *value)
                .with_context(|| format!("failed to set {} tolerance", category))?;
            print_one(json, *value, |v| format!("{} tolerance set to {:.1}%", category, v * 100.0))?;
        }
        BenchCommands::Advise { category } => {
            let tolerance = resolver.tolerance(&store, *category)?;
            let advice = Advice {
                category: *category,
                tolerance,
                recommendation: tightest_recommendation(&store, *category)?,
                overlaps: overlap_report(&store, *category, tolerance)?,
            };
            print_one(json, advice, render_advice)?;
        }
    }
    Ok(())
}

fn category_benchmarks(
    store: &TomlBenchmarkStore,
    resolver: &BenchmarkResolver,
    category: Category,
) -> anyhow::Result<Vec<TrackBenchmark>> {
    let tolerance = resolver.tolerance(store, category)?;
    let mut rows = Vec::new();
    for track in store.tracks(category)? {
        let Some(times) = store.benchmark(category, &track)? else {
            continue;
        };
        rows.push(TrackBenchmark {
            category,
            overlaps: overlap(times.dry_seconds, times.wet_seconds, tolerance).overlaps,
            track,
            dry_seconds: times.dry_seconds,
            wet_seconds: times.wet_seconds,
            tolerance,
        });
    }
    Ok(rows)
}

fn lap_time(input: &str) -> anyhow::Result<f64> {
    parse_lap_time_input(input)
        .ok_or_else(|| anyhow!("'{}' is not a lap time between 0:30 and 10:00", input))
}

fn render_advice(advice: &Advice) -> String {
    let mut lines = vec![format!(
        "{} tolerance: {:.1}%",
        advice.category.name(),
        advice.tolerance * 100.0
    )];
    match &advice.recommendation {
        Some(r) => lines.push(format!(
            "recommended {:.1}% (tightest gap at {}, max safe {:.1}%)",
            r.recommended * 100.0,
            r.track,
            r.max_safe * 100.0
        )),
        None => lines.push("no track with dry faster than wet".to_string()),
    }
    for entry in &advice.overlaps {
        lines.push(format!(
            "OVERLAP {}: dry max {} >= wet min {}",
            entry.track,
            format_lap_time_display(entry.dry_max),
            format_lap_time_display(entry.wet_min)
        ));
    }
    lines.join("\n")
}

#[derive(Serialize)]
struct CarEntry {
    car: String,
    category: Category,
}

pub fn handle_car(config: &ConfigManager, json: bool, command: &CarCommands) -> anyhow::Result<()> {
    let mut store = open_store(config);
    match command {
        CarCommands::Set { car, category } => {
            store
                .set_car_category(car, *category)
                .with_context(|| format!("failed to assign {}", car))?;
            print_one(
                json,
                CarEntry {
                    car: car.clone(),
                    category: *category,
                },
                |e| format!("{} -> {}", e.car, e.category.name()),
            )?;
        }
        CarCommands::List => {
            let cars: Vec<CarEntry> = store
                .cars()?
                .into_iter()
                .map(|(car, category)| CarEntry { car, category })
                .collect();
            print_out(json, &cars, |e| format!("{}\t{}", e.car, e.category))?;
        }
    }
    Ok(())
}

pub fn handle_config(config: &ConfigManager, json: bool, command: &ConfigCommands) -> anyhow::Result<()> {
    match command {
        ConfigCommands::Show => {
            if json {
                print_one(true, config.settings(), |_| String::new())?;
            } else {
                println!("# {}", config.path().display());
                print!("{}", toml::to_string_pretty(config.settings())?);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn lap_time_rejects_garbage() {
        assert_eq!(lap_time("1:47.5").unwrap(), 107.5);
        assert!(lap_time("fast").is_err());
    }

    #[test]
    fn show_flags_overlapping_tracks() {
        let dir = tempdir().unwrap();
        let mut store = TomlBenchmarkStore::new(dir.path().join("benchmarks.toml"));
        store
            .set_benchmark(Category::Gt3, "monza", BenchmarkTimes::new(100.0, 140.0))
            .unwrap();
        store
            .set_benchmark(Category::Gt3, "spa", BenchmarkTimes::new(130.0, 135.0))
            .unwrap();

        let rows = category_benchmarks(&store, &BenchmarkResolver::new(0.05), Category::Gt3).unwrap();
        assert_eq!(rows.len(), 2);
        let spa = rows.iter().find(|r| r.track == "spa").unwrap();
        assert!(spa.overlaps);
        let monza = rows.iter().find(|r| r.track == "monza").unwrap();
        assert!(!monza.overlaps);
    }

    #[test]
    fn advice_mentions_overlaps() {
        let advice = Advice {
            category: Category::Gt4,
            tolerance: 0.05,
            recommendation: None,
            overlaps: vec![OverlapEntry {
                track: "spa".to_string(),
                dry_max: 136.5,
                wet_min: 128.25,
            }],
        };
        let text = render_advice(&advice);
        assert!(text.starts_with("GT4 tolerance: 5.0%"));
        assert!(text.contains("OVERLAP spa: dry max 2:16.500 >= wet min 2:08.250"));
    }
}
