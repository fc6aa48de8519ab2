//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use thiserror::Error;

/// Errors that can occur while reading and converting frame records
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Invalid value for attribute '{field}': {value:?} (expected {expected})")]
    InvalidAttribute {
        field: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("JSON deserialization failed: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Failed to read frame records: {0}")]
    ReadFailed(#[from] std::io::Error),
}

/// Errors raised when the transaction registry is inconsistent
#[derive(Error, Debug, PartialEq, Eq)]
pub enum LookupError {
    #[error("Transaction {0} is not registered")]
    TransactionNotFound(usize),
}

/// Errors from the frame reconstruction engine
#[derive(Error, Debug)]
pub enum ReconstructError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Lookup(#[from] LookupError),
}

/// A frame arrived for a window the bucket engine already moved past
#[derive(Error, Debug, PartialEq, Eq)]
pub enum OrderingError {
    #[error("Frame is in the past: window {window} precedes current window {current}")]
    FrameInPast { window: usize, current: usize },
}

/// Errors constructing the duration bucket engine
#[derive(Error, Debug, PartialEq, Eq)]
pub enum BucketError {
    #[error("Window width must be positive, got {0}ns")]
    NonPositiveWidth(i64),
}

/// Errors that can occur while summarizing duration samples
#[derive(Error, Debug, PartialEq, Eq)]
pub enum StatsError {
    #[error("Cannot summarize an empty duration sample")]
    EmptySample,
}

/// Errors that can occur during report output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}
