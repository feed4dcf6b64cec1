use std::io;
use std::path::Path;

use anyhow::Context as _;
use tracing::info;

use lapkeeper_core::config::ConfigManager;
use lapkeeper_core::models::{CurationResult, DeltaStatus};
use lapkeeper_core::naming::format_lap_time_display;
use lapkeeper_core::orchestrator::{InputProvider, NoInput, ScanRequest, Scanner};
use lapkeeper_core::telemetry::MotecReader;

use super::{open_store, print_one, telemetry_root};
use crate::prompt::LinePrompt;

pub fn handle_scan(
    config: &ConfigManager,
    json: bool,
    root: Option<&Path>,
    dry_run: bool,
    no_prompt: bool,
) -> anyhow::Result<()> {
    let root = telemetry_root(root, config)?;
    let settings = config.settings().clone();

    let mut store = open_store(config);
    let reader = MotecReader::new();
    let stdin = io::stdin();
    let mut line_prompt = LinePrompt::new(stdin.lock(), io::stderr());
    let mut no_input = NoInput;
    let input: &mut dyn InputProvider = if no_prompt {
        &mut no_input
    } else {
        &mut line_prompt
    };

    let mut request = ScanRequest::new(&root)
        .with_dry_run(dry_run)
        .with_report_dir(config.report_folder());
    if settings.logging.file_logging {
        request = request.with_log_dir(config.logs_folder());
    }

    let mut scanner = Scanner::new(settings, &mut store, &reader, input);
    if !json {
        scanner = scanner.with_log_callback(Box::new(|line: &str| eprintln!("{line}")));
    }

    info!("Scanning {}", root.display());
    let result = scanner
        .run(request)
        .with_context(|| format!("scan of {} failed", root.display()))?;

    print_one(json, result, render_result)
}

fn render_result(result: &CurationResult) -> String {
    let mut out = Vec::new();
    if result.dry_run {
        out.push("[DRY RUN] no files were copied".to_string());
    }
    for comparison in &result.comparisons {
        out.push(format!(
            "{} | {} | {}",
            comparison.track,
            comparison.car,
            comparison.condition.label()
        ));
        for slot in &comparison.current {
            let previous = slot
                .previous_time
                .map(format_lap_time_display)
                .unwrap_or_else(|| "-".to_string());
            let delta = slot.delta.map(|d| format!("{d:+.3}")).unwrap_or_else(|| "-".to_string());
            let status = match slot.status {
                DeltaStatus::New => "new",
                DeltaStatus::Improved => "improved",
                DeltaStatus::Same => "same",
                DeltaStatus::Slower => "slower",
            };
            out.push(format!(
                "  #{} {}  prev {}  {}  {}",
                slot.rank,
                format_lap_time_display(slot.lap_time),
                previous,
                delta,
                status
            ));
        }
    }
    for warning in &result.warnings {
        out.push(format!("warning: {warning}"));
    }
    for error in &result.errors {
        out.push(format!("error: {error}"));
    }
    if let Some(dir) = &result.output_dir {
        out.push(format!("output: {}", dir.display()));
    }
    if let Some(path) = &result.report_path {
        out.push(format!("report: {}", path.display()));
    }
    out.push(result.summary());
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_result_renders_summary_only() {
        let result = CurationResult::default();
        assert_eq!(render_result(&result), result.summary());
    }

    #[test]
    fn dry_run_is_flagged() {
        let result = CurationResult {
            dry_run: true,
            errors: vec!["a.ld: unreadable".to_string()],
            ..Default::default()
        };
        let text = render_result(&result);
        assert!(text.starts_with("[DRY RUN]"));
        assert!(text.contains("error: a.ld: unreadable"));
    }
}
