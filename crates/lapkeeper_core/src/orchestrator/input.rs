//! Caller-supplied answers for values the store does not have.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::benchmark::BenchmarkTimes;
use crate::models::Category;

/// Supplies missing configuration mid-scan.
///
/// Returning `None` declines the request; the affected source is skipped and
/// the same question is not asked again during the run.
pub trait InputProvider {
    /// Category for a car that has none yet. `suggested` is inferred from the name.
    fn provide_category(&mut self, car: &str, suggested: Option<Category>) -> Option<Category>;

    /// Dry and wet benchmark for a track without one.
    fn provide_benchmark(&mut self, category: Category, track: &str) -> Option<BenchmarkTimes>;
}

/// Declines every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInput;

impl InputProvider for NoInput {
    fn provide_category(&mut self, _car: &str, _suggested: Option<Category>) -> Option<Category> {
        None
    }

    fn provide_benchmark(&mut self, _category: Category, _track: &str) -> Option<BenchmarkTimes> {
        None
    }
}

/// A request that went unanswered during a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionRequest {
    Category {
        car: String,
        suggested: Option<Category>,
    },
    Benchmark {
        category: Category,
        track: String,
    },
}

impl fmt::Display for ResolutionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionRequest::Category { car, suggested: Some(s) } => {
                write!(f, "car '{}' has no category (suggested: {})", car, s)
            }
            ResolutionRequest::Category { car, suggested: None } => {
                write!(f, "car '{}' has no category", car)
            }
            ResolutionRequest::Benchmark { category, track } => {
                write!(f, "no {} benchmark for track '{}'", category, track)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_input_declines() {
        let mut input = NoInput;
        assert_eq!(input.provide_category("x", Some(Category::Gt3)), None);
        assert_eq!(input.provide_benchmark(Category::Gt3, "monza"), None);
    }

    #[test]
    fn request_display_mentions_subject() {
        let request = ResolutionRequest::Category {
            car: "bmw_m4_gt3".to_string(),
            suggested: Some(Category::Gt3),
        };
        assert_eq!(
            request.to_string(),
            "car 'bmw_m4_gt3' has no category (suggested: gt3)"
        );
        let request = ResolutionRequest::Benchmark {
            category: Category::Gt4,
            track: "spa".to_string(),
        };
        assert_eq!(request.to_string(), "no gt4 benchmark for track 'spa'");
    }
}
