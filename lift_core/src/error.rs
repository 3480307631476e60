//! Error types for the lift_core library.

use std::fmt;
use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for lift_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Target is absent, or belongs to another user.
    ///
    /// The two cases are deliberately reported the same way.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Caller input was rejected before anything was written
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A schema rule blocks the request, e.g. deleting a referenced exercise
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The entity store could not complete the operation
    #[error("Storage unavailable: {0}")]
    Storage(#[from] StorageError),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Results could not be rendered for the caller
    #[error("Output error: {0}")]
    Output(String),
}

impl Error {
    pub(crate) fn not_found(entity: &'static str, id: impl fmt::Display) -> Self {
        Error::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// Storage failures may succeed if the caller tries again; nothing else will.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Storage(_))
    }
}

/// Field-level rejection of caller input
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Failures inside the entity store
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The stored document could not be interpreted
    #[error("Corrupt store at {path}: {reason}")]
    Corrupt { path: String, reason: String },

    /// A schema rule was violated by data the caller did not supply
    #[error("Integrity violation: {0}")]
    Integrity(String),

    /// In-process store lock was poisoned by a panicking writer
    #[error("Store lock poisoned")]
    Poisoned,
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Storage(StorageError::Io(e))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Storage(StorageError::Json(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_storage_errors_are_retryable() {
        let storage: Error = io::Error::new(io::ErrorKind::Other, "disk gone").into();
        assert!(storage.is_retryable());
        assert!(!storage.is_not_found());

        let missing = Error::not_found("workout", "abc");
        assert!(missing.is_not_found());
        assert!(!missing.is_retryable());

        let invalid: Error = ValidationError::new("notes", "too long").into();
        assert!(!invalid.is_retryable());

        let output = Error::Output("key must be a string".into());
        assert!(!output.is_retryable());
    }

    #[test]
    fn test_validation_error_names_field() {
        let err: Error = ValidationError::new("duration_seconds", "must be positive").into();
        assert_eq!(
            err.to_string(),
            "Validation error: duration_seconds: must be positive"
        );
    }
}
