//! Core enums used throughout the crate.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Track condition a personal best belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    Dry,
    Wet,
}

impl Condition {
    /// Both conditions in curation order (dry slots are ranked first).
    pub const ALL: [Condition; 2] = [Condition::Dry, Condition::Wet];

    /// Lowercase token used in filenames and config keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::Dry => "dry",
            Condition::Wet => "wet",
        }
    }

    /// Uppercase label used in logs and reports.
    pub fn label(&self) -> &'static str {
        match self {
            Condition::Dry => "DRY",
            Condition::Wet => "WET",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Condition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dry" => Ok(Condition::Dry),
            "wet" => Ok(Condition::Wet),
            other => Err(format!("unknown condition '{}'", other)),
        }
    }
}

/// Result of classifying one lap against a benchmark pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LapClass {
    /// Inside the dry range.
    Dry,
    /// Inside the wet range (and not the dry range).
    Wet,
    /// Strictly between non-overlapping dry and wet ranges.
    Gap,
    /// Too fast, too slow, or otherwise unclassifiable.
    Invalid,
}

impl LapClass {
    /// The PB condition this class feeds, if any.
    pub fn condition(&self) -> Option<Condition> {
        match self {
            LapClass::Dry => Some(Condition::Dry),
            LapClass::Wet => Some(Condition::Wet),
            LapClass::Gap | LapClass::Invalid => None,
        }
    }

    /// Whether the lap is kept for curation or audit.
    pub fn is_usable(&self) -> bool {
        !matches!(self, LapClass::Invalid)
    }
}

/// Car category. Benchmarks and tolerances are scoped per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Gt3,
    Gt4,
    Gt2,
    Cup,
    Tc,
}

impl Category {
    /// Get all categories.
    pub fn all() -> &'static [Category] {
        &[
            Category::Gt3,
            Category::Gt4,
            Category::Gt2,
            Category::Cup,
            Category::Tc,
        ]
    }

    /// Lowercase key used in the benchmark store.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Gt3 => "gt3",
            Category::Gt4 => "gt4",
            Category::Gt2 => "gt2",
            Category::Cup => "cup",
            Category::Tc => "tc",
        }
    }

    /// Get the display name for this category.
    pub fn name(&self) -> &'static str {
        match self {
            Category::Gt3 => "GT3",
            Category::Gt4 => "GT4",
            Category::Gt2 => "GT2",
            Category::Cup => "Cup / Challenge",
            Category::Tc => "Touring Car",
        }
    }

    /// Suggest a category from a car identifier.
    ///
    /// Only a hint for the operator; unknown cars are never auto-assigned.
    pub fn infer_from_car(car: &str) -> Option<Category> {
        let car = car.to_ascii_lowercase();

        if car.contains("_gt3") || car.ends_with("gt3") {
            Some(Category::Gt3)
        } else if car.contains("_gt4") || car.ends_with("gt4") {
            Some(Category::Gt4)
        } else if car.contains("_gt2") || car.ends_with("gt2") {
            Some(Category::Gt2)
        } else if car.contains("cup") || car.contains("challenge") {
            Some(Category::Cup)
        } else if car.contains("_tc") || car.contains("touring") {
            Some(Category::Tc)
        } else {
            None
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Category::all()
            .iter()
            .copied()
            .find(|c| c.as_str() == lower)
            .ok_or_else(|| {
                format!(
                    "unknown category '{}' (expected one of: {})",
                    s,
                    Category::all()
                        .iter()
                        .map(|c| c.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            })
    }
}

/// Tag distinguishing report rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportAction {
    /// Row describes a personal-best slot.
    #[serde(rename = "PB")]
    Pb,
    /// Row describes a lap that fell between the dry and wet ranges.
    #[serde(rename = "GAP_WARNING")]
    GapWarning,
}

impl ReportAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportAction::Pb => "PB",
            ReportAction::GapWarning => "GAP_WARNING",
        }
    }
}

impl fmt::Display for ReportAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a current slot compares with the same slot in the previous snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeltaStatus {
    /// No previous slot with the same rank.
    New,
    /// Faster than the previous slot.
    Improved,
    /// Identical to the millisecond.
    Same,
    /// Slower than the previous slot.
    Slower,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn condition_parses_case_insensitive() {
        assert_eq!("DRY".parse::<Condition>().unwrap(), Condition::Dry);
        assert_eq!("wet".parse::<Condition>().unwrap(), Condition::Wet);
        assert!("gap".parse::<Condition>().is_err());
    }

    #[test]
    fn lap_class_maps_to_condition() {
        assert_eq!(LapClass::Dry.condition(), Some(Condition::Dry));
        assert_eq!(LapClass::Wet.condition(), Some(Condition::Wet));
        assert_eq!(LapClass::Gap.condition(), None);
        assert!(LapClass::Gap.is_usable());
        assert!(!LapClass::Invalid.is_usable());
    }

    #[test]
    fn category_inference_matches_name_hints() {
        assert_eq!(
            Category::infer_from_car("porsche_991ii_gt3_r"),
            Some(Category::Gt3)
        );
        assert_eq!(Category::infer_from_car("alpine_a110_gt4"), Some(Category::Gt4));
        assert_eq!(
            Category::infer_from_car("ferrari_488_challenge_evo"),
            Some(Category::Cup)
        );
        assert_eq!(Category::infer_from_car("mystery_car"), None);
    }

    #[test]
    fn category_round_trips_through_str() {
        for category in Category::all() {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), *category);
        }
        assert!("lmp1".parse::<Category>().is_err());
    }

    #[test]
    fn report_action_serializes_as_tag() {
        let json = serde_json::to_string(&ReportAction::GapWarning).unwrap();
        assert_eq!(json, "\"GAP_WARNING\"");
    }
}
