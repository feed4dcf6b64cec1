//! Human-readable audit trail written into each output directory.

use std::fmt::Write as _;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::write_atomic;
use crate::models::{OperationLogEntry, PersonalBestSlot};
use crate::naming::format_lap_time_display;

/// File name of the operation log inside an output directory.
pub const OPERATION_LOG_FILE: &str = "operation_log.txt";

/// Run-level facts printed above the per-artifact blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationLogHeader {
    pub started: String,
    pub source_dir: PathBuf,
    pub files_processed: usize,
    pub pb_count: usize,
    pub artifacts_copied: usize,
}

fn slot_line(slot: &PersonalBestSlot) -> String {
    format!(
        "{} #{}: {}",
        slot.condition.label(),
        slot.rank,
        format_lap_time_display(slot.lap_time)
    )
}

pub fn render_operation_log(header: &OperationLogHeader, entries: &[OperationLogEntry]) -> String {
    let rule = "=".repeat(60);
    let thin = "-".repeat(60);
    let mut out = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(out, "LapKeeper PB Scan - {}", header.started);
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out);
    let _ = writeln!(out, "Source directory: {}", header.source_dir.display());
    let _ = writeln!(out, "Files processed: {}", header.files_processed);
    let _ = writeln!(out, "Total PBs identified: {}", header.pb_count);
    let _ = writeln!(out, "Files copied: {}", header.artifacts_copied);
    if entries.iter().any(|e| !e.additional_slots.is_empty()) {
        let _ = writeln!(out, "  (Some files contain multiple PBs)");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Operations:");
    let _ = writeln!(out, "{thin}");

    for entry in entries {
        let _ = writeln!(out);
        let _ = writeln!(out, "[{}]", entry.timestamp);
        let _ = writeln!(out, "  Source: {}", entry.source.display());
        let _ = writeln!(out, "  Dest:   {}", entry.destination.display());
        if let Some(companion) = &entry.companion_destination {
            let _ = writeln!(out, "  Companion: {}", companion.display());
        }
        let _ = writeln!(
            out,
            "  Track:  {} | Car: {}",
            entry.primary.track, entry.primary.car
        );
        let _ = writeln!(out, "  {}", slot_line(&entry.primary));
        if !entry.additional_slots.is_empty() {
            let _ = writeln!(out, "  ** File also contains:");
            for extra in &entry.additional_slots {
                let _ = writeln!(out, "     {}", slot_line(extra));
            }
        }
    }

    out
}

/// Write `operation_log.txt` into `dir` and return its path.
pub fn write_operation_log(
    dir: &Path,
    header: &OperationLogHeader,
    entries: &[OperationLogEntry],
) -> io::Result<PathBuf> {
    let path = dir.join(OPERATION_LOG_FILE);
    write_atomic(&path, &render_operation_log(header, entries))?;
    Ok(path)
}
