//! Error types for RTF conversion.

use thiserror::Error;

/// Result type for RTF operations.
pub type RtfResult<T> = Result<T, RtfError>;

/// Outcome code of a conversion, for callers that only need pass/fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XamlStatus {
    /// The document converted.
    Ok,
    /// The token stream was malformed; no output was produced.
    InvalidFormat,
}

/// RTF conversion errors.
///
/// The taxonomy is deliberately closed: semantic anomalies in the document
/// are repaired during conversion, only lexical corruption aborts it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RtfError {
    /// The input is not well-formed RTF.
    #[error("Invalid RTF format at byte {offset}: {reason}")]
    InvalidFormat {
        /// Byte offset in the input where the problem was detected
        offset: usize,
        /// Human readable description
        reason: String,
    },
}

impl RtfError {
    /// Create an invalid-format error.
    #[inline]
    pub fn invalid(offset: usize, reason: impl Into<String>) -> Self {
        RtfError::InvalidFormat {
            offset,
            reason: reason.into(),
        }
    }

    /// The status code corresponding to this error.
    #[inline]
    pub fn status(&self) -> XamlStatus {
        match self {
            RtfError::InvalidFormat { .. } => XamlStatus::InvalidFormat,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = RtfError::invalid(12, "bad hex escape");
        assert_eq!(err.to_string(), "Invalid RTF format at byte 12: bad hex escape");
        assert_eq!(err.status(), XamlStatus::InvalidFormat);
    }
}
