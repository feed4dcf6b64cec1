//! Comparison of the current run against the previous snapshot.

use serde::{Deserialize, Serialize};

use super::enums::{Condition, DeltaStatus};

/// A slot decoded from a previous snapshot's artifact name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotSlot {
    pub rank: u32,
    /// Lap time at millisecond precision.
    pub lap_time: f64,
    pub file_name: String,
}

/// A current slot matched against the previous slot of the same rank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotDelta {
    pub track: String,
    pub car: String,
    pub condition: Condition,
    pub rank: u32,
    pub lap_time: f64,
    pub previous_time: Option<f64>,
    /// `current - previous`; negative is faster.
    pub delta: Option<f64>,
    /// True when there is no previous slot or the lap got faster.
    pub is_improvement: bool,
    pub status: DeltaStatus,
}

/// Current and previous slots for one (track, car, condition).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionComparison {
    pub track: String,
    pub car: String,
    pub condition: Condition,
    pub current: Vec<SlotDelta>,
    pub previous: Vec<SnapshotSlot>,
}
