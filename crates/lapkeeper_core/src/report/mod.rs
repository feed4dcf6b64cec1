//! Report sink and operation log.
//!
//! - [`write_report_csv`]: one row per PB slot and per gap lap
//! - [`write_operation_log`]: plain-text audit trail of every copied artifact

mod csv;
mod operation_log;

pub use self::csv::{
    build_report_rows, report_file_name, write_report_csv, GapLap, REPORT_COLUMNS,
};
pub use operation_log::{
    render_operation_log, write_operation_log, OperationLogHeader, OPERATION_LOG_FILE,
};
