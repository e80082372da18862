//! Error types for the glTF document graph.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for graph, document and container operations.
#[derive(Error, Debug)]
pub enum Error {
    /// File does not exist or cannot be accessed
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Invalid magic bytes at start of a binary container
    #[error("Invalid GLB container: expected glTF magic bytes")]
    InvalidMagic,

    /// Unsupported container or asset version
    #[error("Unsupported glTF version: {0}")]
    UnsupportedVersion(String),

    /// Container is truncated or corrupted
    #[error("Unexpected end of data at position {0}")]
    UnexpectedEof(u64),

    /// Invalid data structure in the container
    #[error("Invalid file structure: {0}")]
    InvalidStructure(String),

    /// Entity was used after it was disposed
    #[error("{kind} has been disposed")]
    Disposed { kind: String },

    /// Edge between entities that live in different graphs
    #[error("Cannot reference {child} from {parent}: entities belong to different graphs")]
    CrossGraph { parent: String, child: String },

    /// Entity id does not resolve inside this graph
    #[error("Unknown entity: {0}")]
    UnknownEntity(String),

    /// Extension property attached to a host type it does not declare
    #[error("{extension} cannot be attached to {parent}")]
    InvalidParent { extension: String, parent: String },

    /// Handle used with the wrong property kind
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    /// Accessor array does not fit the declared element type
    #[error("Invalid accessor array: {0}")]
    InvalidArray(String),

    /// Element index out of bounds
    #[error("Element index {index} out of bounds (count: {count})")]
    ElementOutOfBounds { index: usize, count: usize },

    /// Accessor or texture needs a buffer, but the document has none
    #[error("Missing buffer: {0}")]
    MissingBuffer(String),

    /// Required extension has no registered implementation
    #[error("Missing required extension: {0}")]
    MissingExtension(String),

    /// Two resources resolved to the same URI
    #[error("Duplicate resource URI: {0}")]
    DuplicateUri(String),

    /// External resource could not be resolved
    #[error("Missing resource: {0}")]
    MissingResource(String),

    /// Write operation failed
    #[error("Write failed: {0}")]
    WriteFailed(String),

    /// Memory mapping failed
    #[error("Memory mapping failed: {0}")]
    MmapFailed(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// UTF-8 conversion error
    #[error("Invalid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an "other" error from a string.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Create an invalid structure error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidStructure(msg.into())
    }

    /// Create a type mismatch error.
    pub fn mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

/// Result type alias for document operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = Error::InvalidMagic;
        assert!(e.to_string().contains("magic"));

        let e = Error::ElementOutOfBounds { index: 5, count: 3 };
        assert!(e.to_string().contains("5"));
        assert!(e.to_string().contains("3"));

        let e = Error::Disposed { kind: "Node".into() };
        assert_eq!(e.to_string(), "Node has been disposed");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
