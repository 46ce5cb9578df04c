//! Error types for catalog operations.

use thiserror::Error;

use super::ItemId;

/// Errors that can occur while reading or mutating the catalog.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum CatalogError {
    /// No item of this kind has the given id.
    #[error("{kind} {id} not found")]
    ItemNotFound { kind: &'static str, id: ItemId },

    /// Another item of the same kind already uses this name.
    #[error("A {kind} named '{name}' already exists")]
    DuplicateName { kind: &'static str, name: String },

    /// Item names must contain at least one non-whitespace character.
    #[error("{kind} name must not be empty")]
    EmptyName { kind: &'static str },

    /// A foreign reference points at a missing item or at an item of the wrong kind.
    #[error("Field '{field}' must reference an existing {expected} (got {id})")]
    InvalidReference {
        field: &'static str,
        expected: &'static str,
        id: ItemId,
    },

    /// The kind string does not name a catalog kind.
    #[error("Unknown catalog kind: {kind}")]
    UnknownKind { kind: String },

    /// Pagination parameters are out of range.
    #[error("Invalid page: {reason}")]
    InvalidPage { reason: String },
}

impl CatalogError {
    /// Check if this error indicates a missing item or set.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogError::ItemNotFound { .. })
    }

    /// Check if this error is a name collision.
    pub fn is_conflict(&self) -> bool {
        matches!(self, CatalogError::DuplicateName { .. })
    }

    /// Check if this error is caused by invalid client input.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            CatalogError::EmptyName { .. }
                | CatalogError::InvalidReference { .. }
                | CatalogError::UnknownKind { .. }
                | CatalogError::InvalidPage { .. }
        )
    }
}

impl From<CatalogError> for crate::Error {
    fn from(err: CatalogError) -> Self {
        crate::Error::Catalog(err)
    }
}
