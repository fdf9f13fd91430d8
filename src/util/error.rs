//! Error types for attribute I/O and reference resolution.

use thiserror::Error;

/// Main error type for h5attr operations.
///
/// Per-element conversion failures are not errors: they surface as
/// [`Value::Error`](crate::codec::Value::Error) sentinels inside the decoded data.
#[derive(Error, Debug)]
pub enum Error {
    /// Operation is rejected before any native call is made
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Attribute is not writable
    #[error("Attribute is read-only")]
    ReadOnly,

    /// Caller data does not match the datatype
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    /// Buffer has the wrong number of bytes or elements
    #[error("Size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// Value cannot be converted to the on-disk representation
    #[error("Data conversion failure: {0}")]
    Conversion(String),

    /// Datatype descriptor is malformed
    #[error("Invalid datatype: {0}")]
    InvalidDatatype(String),

    /// Native handle could not be acquired
    #[error("Failed to open {kind} handle: {reason}")]
    HandleOpen { kind: String, reason: String },

    /// Raw read failed
    #[error("Read failed: {0}")]
    ReadFailed(String),

    /// Raw write failed
    #[error("Write failed: {0}")]
    WriteFailed(String),

    /// A reference primitive failed
    #[error("Reference resolution failed: {0}")]
    Resolution(String),

    /// Named entity does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Settings file is malformed
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// UTF-8 conversion error
    #[error("Invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an "other" error from a string.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Create an unsupported-operation error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    /// Create a conversion error.
    pub fn conversion(msg: impl Into<String>) -> Self {
        Self::Conversion(msg.into())
    }

    /// Create a type mismatch error.
    pub fn mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// True for errors raised by write pre-flight validation.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported(_))
    }
}

/// Result type alias for h5attr operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = Error::unsupported("cannot write wide-decimal values");
        assert!(e.to_string().contains("wide-decimal"));
        assert!(e.is_unsupported());

        let e = Error::SizeMismatch { expected: 12, actual: 8 };
        assert!(e.to_string().contains("12"));
        assert!(e.to_string().contains("8"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(!err.is_unsupported());
    }
}
