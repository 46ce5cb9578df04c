//! Error types for relation operations.

use thiserror::Error;

use super::RelationType;

/// Errors raised by direct relation writes.
///
/// Cascaded writes made by the sync engine use idempotent upserts and
/// deletes, so they never produce `DuplicateRelation` or `NotFound`.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum RelationError {
    /// The user already holds this relation.
    #[error("{target} is already in the user's {relation_type} list")]
    DuplicateRelation {
        target: String,
        relation_type: RelationType,
    },

    /// The relation to delete does not exist.
    #[error("{target} is not in the user's {relation_type} list")]
    NotFound {
        target: String,
        relation_type: RelationType,
    },

    /// The item or set the relation would point at does not exist.
    #[error("{target} not found")]
    TargetNotFound { target: String },

    /// Relations are not supported for this kind.
    #[error("Relations are not supported for '{kind}'")]
    NotRelatable { kind: String },

    /// The relation type string is not favorite, collection or wishlist.
    #[error("Unknown relation type: {value}")]
    UnknownRelationType { value: String },
}

impl RelationError {
    /// Check if this error indicates a missing relation or target.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            RelationError::NotFound { .. } | RelationError::TargetNotFound { .. }
        )
    }

    /// Check if this error is a duplicate relation.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, RelationError::DuplicateRelation { .. })
    }

    /// Check if this error is caused by invalid client input.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            RelationError::NotRelatable { .. } | RelationError::UnknownRelationType { .. }
        )
    }
}

impl From<RelationError> for crate::Error {
    fn from(err: RelationError) -> Self {
        crate::Error::Relation(err)
    }
}
