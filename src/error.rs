//! Error types for Sendplan
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur in Sendplan
#[derive(Debug, Error)]
pub enum SendplanError {
    /// Record not found in storage
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller is not allowed to perform the operation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Unknown assignment status
    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    /// Rejected input (duplicate handle, bad date, ...)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for Sendplan operations
pub type Result<T> = std::result::Result<T, SendplanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error() {
        let err = SendplanError::NotFound("plan 42".to_string());
        assert_eq!(err.to_string(), "Not found: plan 42");
    }

    #[test]
    fn test_forbidden_error() {
        let err = SendplanError::Forbidden("assignment belongs to another sender".to_string());
        assert_eq!(err.to_string(), "Forbidden: assignment belongs to another sender");
    }

    #[test]
    fn test_invalid_status_error() {
        let err = SendplanError::InvalidStatus("archived".to_string());
        assert_eq!(err.to_string(), "Invalid status: archived");
    }

    #[test]
    fn test_sqlite_error_conversion() {
        let err: SendplanError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, SendplanError::Sqlite(_)));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: SendplanError = io_err.into();
        assert!(matches!(err, SendplanError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
        let err: SendplanError = json_err.into();
        assert!(matches!(err, SendplanError::Json(_)));
    }
}
