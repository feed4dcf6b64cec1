use std::path::Path;

use anyhow::Context as _;
use serde::Serialize;
use tracing::info;

use lapkeeper_core::config::ConfigManager;
use lapkeeper_core::maintenance::{CleanupManager, DeleteOutcome, UndoManager, UndoOutcome};

use super::{print_one, telemetry_root};
use crate::prompt::confirm;

#[derive(Serialize)]
struct Declined {
    executed: bool,
}

pub fn handle_undo(config: &ConfigManager, json: bool, root: Option<&Path>, yes: bool) -> anyhow::Result<()> {
    let root = telemetry_root(root, config)?;
    let manager = UndoManager::new(&root, config.settings().curation.main_extension.as_str());

    let Some(plan) = manager.plan().context("failed to list output sets")? else {
        return print_one(json, Option::<UndoOutcome>::None, |_| {
            format!("no output sets under {}", root.display())
        });
    };

    if !json {
        println!(
            "Newest output set: {} ({} files, created {})",
            plan.target.name, plan.target.artifact_count, plan.target.created
        );
        println!("{} older set(s) stay untouched", plan.remaining);
    }
    if !confirm("Delete it?", yes)? {
        return print_one(json, Declined { executed: false }, |_| "cancelled".to_string());
    }

    let outcome = manager
        .execute(&plan)
        .with_context(|| format!("failed to delete {}", plan.target.path.display()))?;
    info!("Undo removed {}", outcome.removed.display());
    print_one(json, Some(outcome), |o| match o {
        Some(o) => format!("removed {} ({} files)", o.removed.display(), o.files_deleted),
        None => String::new(),
    })
}

pub fn handle_cleanup(config: &ConfigManager, json: bool, root: Option<&Path>, yes: bool) -> anyhow::Result<()> {
    let root = telemetry_root(root, config)?;
    let curation = &config.settings().curation;
    let manager = CleanupManager::new(
        &root,
        [curation.main_extension.as_str(), curation.companion_extension.as_str()],
    );

    let plan = manager.preview().context("failed to list telemetry files")?;
    if plan.is_empty() {
        return print_one(json, DeleteOutcome::default(), |_| {
            format!("nothing to delete in {}", root.display())
        });
    }

    if !json {
        for file in &plan.files {
            println!("{}", file.path.display());
        }
        println!("{} files, {:.1} MB", plan.len(), plan.total_bytes as f64 / 1_048_576.0);
    }
    if !confirm("Delete these files?", yes)? {
        return print_one(json, Declined { executed: false }, |_| "cancelled".to_string());
    }

    let outcome = manager.execute(&plan);
    info!("Cleanup deleted {} of {} files", outcome.deleted, plan.len());
    print_one(json, outcome, render_outcome)
}

fn render_outcome(outcome: &DeleteOutcome) -> String {
    let mut lines = vec![format!("deleted {}, failed {}", outcome.deleted, outcome.failed)];
    lines.extend(outcome.errors.iter().map(|e| format!("error: {e}")));
    lines.join("\n")
}
