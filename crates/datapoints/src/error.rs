// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for grid access and the codecs.

use crate::grid::Topic;
use std::io;
use thiserror::Error;

/// Result type alias for datapoint operations.
pub type Result<T> = std::result::Result<T, DatapointError>;

/// Errors raised by grids, datapoints and codecs.
#[derive(Debug, Error)]
pub enum DatapointError {
    /// Device id or type is not a usable identifier.
    #[error("Malformed {field}: {reason}")]
    MalformedIdentity { field: &'static str, reason: String },

    /// Binary payload names a grid variant we do not know.
    #[error("Unknown grid variant tag: {0:?}")]
    UnknownVariantTag(String),

    /// A decoder that must infer a time range received no records.
    #[error("Cannot infer a time range from empty {0} input")]
    EmptyInput(&'static str),

    /// Periodic grid lookup outside its configured span.
    #[error("Timestamp {timestamp} outside periodic range [{gte}, {lte}]")]
    RowOutOfRange { timestamp: i64, gte: i64, lte: i64 },

    /// Periodic grid configured with an unusable range or gap.
    #[error("Invalid periodic range: {0}")]
    InvalidRange(String),

    /// Value written to a column of the other topic.
    #[error("Topic mismatch: column belongs to {expected}, value is {got}")]
    TopicMismatch { expected: Topic, got: Topic },

    #[error("Row index {ridx} out of bounds (capacity {capacity})")]
    RowIndexOutOfBounds { ridx: usize, capacity: usize },

    #[error("Column index {cidx} out of bounds for {topic} (bound {bound})")]
    ColumnIndexOutOfBounds {
        topic: Topic,
        cidx: usize,
        bound: usize,
    },

    /// Compact tuple array length differs from its name array.
    #[error("Compact row {row}: {topic} array has {got} entries, expected {expected}")]
    ArityMismatch {
        row: usize,
        topic: Topic,
        expected: usize,
        got: usize,
    },

    /// Truncated or corrupt binary payload.
    #[error("Invalid binary format: {0}")]
    InvalidFormat(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Base64 error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl DatapointError {
    /// True for failures caused by the shape of the input payload rather
    /// than by misuse of the grid API.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            DatapointError::UnknownVariantTag(_)
                | DatapointError::InvalidFormat(_)
                | DatapointError::ArityMismatch { .. }
                | DatapointError::Base64(_)
                | DatapointError::Json(_)
                | DatapointError::Utf8(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DatapointError::RowOutOfRange {
            timestamp: 5,
            gte: 10,
            lte: 20,
        };
        assert_eq!(
            err.to_string(),
            "Timestamp 5 outside periodic range [10, 20]"
        );

        let err = DatapointError::UnknownVariantTag("absolute".into());
        assert_eq!(err.to_string(), "Unknown grid variant tag: \"absolute\"");
    }

    #[test]
    fn test_format_error_classification() {
        assert!(DatapointError::InvalidFormat("short".into()).is_format_error());
        assert!(DatapointError::UnknownVariantTag("x".into()).is_format_error());
        assert!(!DatapointError::EmptyInput("legacy").is_format_error());
        assert!(!DatapointError::TopicMismatch {
            expected: Topic::Data,
            got: Topic::Meta
        }
        .is_format_error());
    }
}
