//! Error types for loadouts

use thiserror::Error;

use super::LoadoutId;
use crate::catalog::{ItemId, ItemKind};

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum LoadoutError {
    /// Unknown id, or a private loadout seen by someone other than its owner.
    #[error("Loadout not found: {id}")]
    NotFound { id: LoadoutId },

    #[error("Only the owner can modify loadout {id}")]
    PermissionDenied { id: LoadoutId },

    #[error("Loadout name must not be empty")]
    EmptyName,

    #[error("Loadout name is longer than {max} characters")]
    NameTooLong { max: usize },

    #[error("Field '{field}' must reference an existing {expected}, got {id}")]
    InvalidComponent {
        field: &'static str,
        expected: ItemKind,
        id: ItemId,
    },

    #[error("Unknown list mode: {value}")]
    UnknownMode { value: String },
}

impl LoadoutError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, LoadoutError::NotFound { .. })
    }

    pub fn is_permission_denied(&self) -> bool {
        matches!(self, LoadoutError::PermissionDenied { .. })
    }

    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            LoadoutError::EmptyName
                | LoadoutError::NameTooLong { .. }
                | LoadoutError::InvalidComponent { .. }
                | LoadoutError::UnknownMode { .. }
        )
    }
}

impl From<LoadoutError> for crate::Error {
    fn from(err: LoadoutError) -> Self {
        crate::Error::Loadout(err)
    }
}
