use crate::moments::MomentWindow;
use std::path::PathBuf;

/// Common error type for parsing and moment reduction.
#[derive(thiserror::Error, Debug)]
pub enum SurveyError {
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("opening {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("creating {}: {source}", .path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line} has no column {column}")]
    MissingColumn { line: String, column: String },
    #[error("line {line}: column {column} has no value at record {record}")]
    MissingValue {
        line: String,
        column: String,
        record: usize,
    },
    #[error("line {line}: column {column} record {record} is not numeric ({raw:?})")]
    NonNumeric {
        line: String,
        column: String,
        record: usize,
        raw: String,
    },
    #[error("gate {gate} has no configured width")]
    MissingGateWidth { gate: u32 },
    #[error("coordinate out of range: {0}")]
    CoordinateOutOfRange(String),
    #[error("moment window {0} is configured more than once")]
    DuplicateWindow(MomentWindow),
    #[error("invalid moment window: {0}")]
    InvalidWindow(String),
    #[error("unknown marker mode {0:?} (expected strict or legacy)")]
    InvalidMarkerMode(String),
}

pub type SurveyResult<T> = Result<T, SurveyError>;
