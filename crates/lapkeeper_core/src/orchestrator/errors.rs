//! Error types for the scan pipeline.
//!
//! Errors carry context that chains through layers:
//! Run → Step → Operation → Detail
//!
//! Per-source and per-artifact failures never become errors here; they are
//! counted in the step outputs instead.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Top-level pipeline error with run context.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A step failed during execution.
    #[error("Scan '{run_name}' failed at step '{step_name}': {source}")]
    StepFailed {
        run_name: String,
        step_name: String,
        #[source]
        source: StepError,
    },

    /// The run could not be set up (missing root, unreadable directory, log file).
    #[error("Scan '{run_name}' setup failed: {message}")]
    SetupFailed { run_name: String, message: String },
}

impl PipelineError {
    /// Create a step failed error.
    pub fn step_failed(
        run_name: impl Into<String>,
        step_name: impl Into<String>,
        source: StepError,
    ) -> Self {
        Self::StepFailed {
            run_name: run_name.into(),
            step_name: step_name.into(),
            source,
        }
    }

    /// Create a setup failed error.
    pub fn setup_failed(run_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SetupFailed {
            run_name: run_name.into(),
            message: message.into(),
        }
    }
}

/// Error from a pipeline step with operation context.
#[derive(Error, Debug)]
pub enum StepError {
    /// Input validation failed.
    #[error("Input validation failed: {0}")]
    InvalidInput(String),

    /// Output validation failed.
    #[error("Output validation failed: {0}")]
    InvalidOutput(String),

    /// An earlier step did not record its output.
    #[error("Precondition not met: {0}")]
    PreconditionFailed(String),

    /// The output directory could not be created. Nothing can be copied.
    #[error("Failed to create output directory {path}: {source}")]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StepError {
    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create an invalid output error.
    pub fn invalid_output(message: impl Into<String>) -> Self {
        Self::InvalidOutput(message.into())
    }

    /// Create a precondition failed error.
    pub fn precondition_failed(message: impl Into<String>) -> Self {
        Self::PreconditionFailed(message.into())
    }

    /// Create an output directory error.
    pub fn output_directory(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::OutputDirectory {
            path: path.into(),
            source,
        }
    }
}

/// Result type for step operations.
pub type StepResult<T> = Result<T, StepError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_directory_error_names_path() {
        let err = StepError::output_directory(
            "/telemetry/PBs_2024-01-01_100000",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.contains("PBs_2024-01-01_100000"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn pipeline_error_chains_context() {
        let step_err = StepError::precondition_failed("Collect has not run");
        let pipeline_err = PipelineError::step_failed("scan_20240101_100000", "Curate", step_err);

        let msg = pipeline_err.to_string();
        assert!(msg.contains("scan_20240101_100000"));
        assert!(msg.contains("Curate"));
        assert!(msg.contains("Collect has not run"));
    }
}
