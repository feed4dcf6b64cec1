//! LapKeeper Core - lap classification and personal-best curation.
//!
//! This crate contains all business logic with zero UI dependencies.
//! It can be driven by the CLI or embedded in another front-end.
//!
//! Data flows one way through the modules:
//! `benchmark` -> `classify` -> `curate` -> `compare` -> `orchestrator`,
//! with `maintenance` operating on the output sets the orchestrator creates.

pub mod benchmark;
pub mod classify;
pub mod compare;
pub mod config;
pub mod curate;
pub mod logging;
pub mod maintenance;
pub mod models;
pub mod naming;
pub mod orchestrator;
pub mod report;
pub mod store;
pub mod telemetry;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
