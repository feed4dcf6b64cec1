//! Pipeline step implementations.
//!
//! Each step handles one phase of a scan.

mod collect;
mod compare;
mod copy;
mod curate;
mod report;

pub use collect::CollectStep;
pub use compare::CompareStep;
pub use copy::CopyStep;
pub use curate::CurateStep;
pub use report::ReportStep;
