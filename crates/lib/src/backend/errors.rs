//! Storage error types for the Armory backend.
//!
//! This module defines structured error types for database operations,
//! providing better error context than raw sqlx errors.

use thiserror::Error;

/// Errors that can occur during storage operations.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum BackendError {
    /// A sqlx operation failed.
    #[error("SQL error: {reason}")]
    SqlxError {
        /// Human readable context for the failure
        reason: String,
        /// The underlying sqlx error, if any
        #[source]
        source: Option<sqlx::Error>,
    },

    /// Stored JSON could not be serialized.
    #[error("Serialization failed")]
    SerializationFailed {
        /// The underlying serialization error
        #[source]
        source: serde_json::Error,
    },

    /// Stored JSON could not be deserialized.
    #[error("Deserialization failed")]
    DeserializationFailed {
        /// The underlying deserialization error
        #[source]
        source: serde_json::Error,
    },

    /// A stored value did not match what the schema allows.
    #[error("Corrupt row in {table}: {reason}")]
    CorruptRow {
        /// Table the row was read from
        table: &'static str,
        /// Description of the problem
        reason: String,
    },

    /// Schema migration failed or is unknown.
    #[error("Schema migration failed: {reason}")]
    MigrationFailed {
        /// Description of the failure
        reason: String,
    },
}

impl BackendError {
    /// Check if this error was caused by a unique constraint violation.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            BackendError::SqlxError {
                source: Some(sqlx::Error::Database(db)),
                ..
            } => db.is_unique_violation(),
            _ => false,
        }
    }

    /// Check if this error was caused by a foreign key violation.
    pub fn is_foreign_key_violation(&self) -> bool {
        match self {
            BackendError::SqlxError {
                source: Some(sqlx::Error::Database(db)),
                ..
            } => db.is_foreign_key_violation(),
            _ => false,
        }
    }

    /// Check if this error indicates a data integrity issue.
    pub fn is_integrity_error(&self) -> bool {
        matches!(
            self,
            BackendError::CorruptRow { .. } | BackendError::DeserializationFailed { .. }
        )
    }
}

impl From<BackendError> for crate::Error {
    fn from(err: BackendError) -> Self {
        crate::Error::Backend(err)
    }
}
