//! Data models for LapKeeper.
//!
//! This module contains the core data structures used throughout the crate:
//! - Enums for conditions, lap classes, car categories and report actions
//! - Lap records extracted from telemetry sources
//! - Curation outputs (PB slots, copied artifacts, comparisons, run result)

mod comparison;
mod curation;
mod enums;
mod laps;

// Re-export all public types
pub use comparison::{ConditionComparison, SlotDelta, SnapshotSlot};
pub use curation::{CopiedArtifact, CurationResult, OperationLogEntry, PersonalBestSlot, ReportRow};
pub use enums::{Category, Condition, DeltaStatus, LapClass, ReportAction};
pub use laps::{ClassifiedLap, ConditionBuckets, GroupKey, LapRecord, SourceArtifact};
