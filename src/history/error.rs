//! Error taxonomy: stable failure codes surfaced as process exit codes.
//!
//! The numeric values are an external contract: scripts branch on the
//! exit status of `cbhist`. New kinds get new values; existing values are
//! never reused or renumbered.

use std::fmt;

/// Stable failure kinds. `Success` is the only non-negative value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,
    ParseError = -1,
    NotFound = -2,
    IncompatibleContentType = -3,
    ClipboardHistoryDisabled = -4,
    AccessDenied = -5,
}

impl ErrorCode {
    /// Numeric value used as the process exit code.
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::ParseError => "ParseError",
            Self::NotFound => "NotFound",
            Self::IncompatibleContentType => "IncompatibleContentType",
            Self::ClipboardHistoryDisabled => "ClipboardHistoryDisabled",
            Self::AccessDenied => "AccessDenied",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raised when converting an integer that is not a known [`ErrorCode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{0} is not a known error code")]
pub struct InvalidErrorCode(pub i32);

impl TryFrom<i32> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Success),
            -1 => Ok(Self::ParseError),
            -2 => Ok(Self::NotFound),
            -3 => Ok(Self::IncompatibleContentType),
            -4 => Ok(Self::ClipboardHistoryDisabled),
            -5 => Ok(Self::AccessDenied),
            other => Err(InvalidErrorCode(other)),
        }
    }
}

/// A domain failure: exactly one [`ErrorCode`] plus a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ClipboardError {
    code: ErrorCode,
    message: String,
}

impl ClipboardError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }
}
