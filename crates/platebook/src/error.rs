//! Error types for platebook.
//!
//! This module defines all error types used by the record store and the
//! record API, together with the HTTP status each one maps to. Client-side
//! failures live in [`crate::client::ClientError`].

use std::path::PathBuf;
use thiserror::Error;

/// Message returned to callers for any infrastructure failure.
pub const INTERNAL_MESSAGE: &str = "internal server error";

/// The main error type for platebook operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Request Errors ===
    /// A required request field was missing or blank.
    #[error("{message}")]
    Validation {
        /// Message reported to the caller.
        message: &'static str,
    },

    /// A record with this plate already exists.
    #[error("plate already registered")]
    Conflict {
        /// The plate that collided.
        plate: String,
    },

    /// No record matched the given plate.
    #[error("plate not found")]
    NotFound {
        /// The plate that was looked up.
        plate: String,
    },

    // === I/O Errors ===
    /// File system or socket operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug, poisoned lock, failed task).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for platebook operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a validation error carrying the caller-facing message.
    #[must_use]
    pub fn validation(message: &'static str) -> Self {
        Self::Validation { message }
    }

    /// Create a duplicate-plate error.
    #[must_use]
    pub fn conflict(plate: impl Into<String>) -> Self {
        Self::Conflict {
            plate: plate.into(),
        }
    }

    /// Create a missing-plate error.
    #[must_use]
    pub fn not_found(plate: impl Into<String>) -> Self {
        Self::NotFound {
            plate: plate.into(),
        }
    }

    /// HTTP status code for this error.
    ///
    /// Request errors map to their 4xx class; everything else is an
    /// infrastructure failure and maps to 500.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation { .. } => 400,
            Self::NotFound { .. } => 404,
            Self::Conflict { .. } => 409,
            _ => 500,
        }
    }

    /// The message that may be shown to API callers.
    ///
    /// Infrastructure errors are collapsed into [`INTERNAL_MESSAGE`]; the
    /// underlying cause is only ever logged.
    #[must_use]
    pub fn public_message(&self) -> String {
        if self.is_request_error() {
            self.to_string()
        } else {
            INTERNAL_MESSAGE.to_string()
        }
    }

    /// Check if this error was caused by the request rather than the server.
    #[must_use]
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. } | Self::Conflict { .. } | Self::NotFound { .. }
        )
    }

    /// Check if this error is a duplicate-plate conflict.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Check if this error reports a missing plate.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::conflict("ABC1234");
        assert_eq!(err.to_string(), "plate already registered");

        let err = Error::not_found("ABC1234");
        assert_eq!(err.to_string(), "plate not found");

        let err = Error::validation("incomplete data");
        assert_eq!(err.to_string(), "incomplete data");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::validation("incomplete data").status_code(), 400);
        assert_eq!(Error::not_found("X").status_code(), 404);
        assert_eq!(Error::conflict("X").status_code(), 409);
        assert_eq!(Error::internal("boom").status_code(), 500);
    }

    #[test]
    fn test_public_message_hides_internal_details() {
        let err = Error::internal("lock poisoned at storage.rs:42");
        assert_eq!(err.public_message(), INTERNAL_MESSAGE);

        let err = Error::DatabaseMigration {
            message: "version mismatch".to_string(),
        };
        assert_eq!(err.public_message(), INTERNAL_MESSAGE);
    }

    #[test]
    fn test_public_message_keeps_request_errors() {
        assert_eq!(
            Error::conflict("ABC1234").public_message(),
            "plate already registered"
        );
        assert_eq!(Error::not_found("ABC1234").public_message(), "plate not found");
    }

    #[test]
    fn test_error_predicates() {
        assert!(Error::conflict("X").is_conflict());
        assert!(!Error::not_found("X").is_conflict());
        assert!(Error::not_found("X").is_not_found());
        assert!(!Error::internal("x").is_request_error());
        assert!(Error::validation("incomplete data").is_request_error());
    }

    #[test]
    fn test_internal_error() {
        let err = Error::internal("something went wrong");
        assert_eq!(err.to_string(), "internal error: something went wrong");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::AddrInUse, "address in use");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("address in use"));
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn test_from_rusqlite_error() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/db.sqlite",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err: Error = sqlite_err.into();
            assert!(matches!(err, Error::DatabaseQuery(_)));
        }
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "invalid bind address".to_string(),
        };
        assert!(err.to_string().contains("invalid bind address"));
    }

    #[test]
    fn test_directory_create_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: io_err,
        };
        assert!(err.to_string().contains("/root/forbidden"));
    }
}
