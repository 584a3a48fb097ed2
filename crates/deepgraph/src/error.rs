//! Error types for deepgraph transforms.

use thiserror::Error;

/// Stable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// E001: Write or delete on a non-writable key
    ReadonlyViolation,
    /// E002: Unrecognised `$` key in a merge layer
    UnknownDirective,
    /// E003: Directive payload of the wrong shape
    InvalidDirective,
}

impl ErrorCode {
    /// Returns the error code string (e.g., "E001").
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::ReadonlyViolation => "E001",
            ErrorCode::UnknownDirective => "E002",
            ErrorCode::InvalidDirective => "E003",
        }
    }
}

/// Error raised by a transform. Nothing has been mutated when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("[E001] key {key} is readonly")]
    ReadonlyViolation { key: String },

    #[error("[E002] unknown directive {key}")]
    UnknownDirective { key: String },

    #[error("[E003] invalid {directive} payload: {reason}")]
    InvalidDirective {
        directive: &'static str,
        reason: &'static str,
    },
}

impl Error {
    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::ReadonlyViolation { .. } => ErrorCode::ReadonlyViolation,
            Error::UnknownDirective { .. } => ErrorCode::UnknownDirective,
            Error::InvalidDirective { .. } => ErrorCode::InvalidDirective,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = Error::ReadonlyViolation { key: "id".into() };
        assert_eq!(err.code().code(), "E001");
        assert_eq!(err.to_string(), "[E001] key id is readonly");

        let err = Error::InvalidDirective {
            directive: "$push",
            reason: "expected a record",
        };
        assert_eq!(err.code(), ErrorCode::InvalidDirective);
        assert_eq!(err.to_string(), "[E003] invalid $push payload: expected a record");
    }
}
