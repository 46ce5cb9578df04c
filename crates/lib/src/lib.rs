//!
//! Armory: catalog, relation and account services for a game-companion API.
//!
//! ## Core Concepts
//!
//! * **Catalog (`catalog::Catalog`)**: Typed tables of game items (helmets, armors, capes,
//!   weapons, stratagems, boosters, warbonds, ...) plus armor sets that bundle a helmet,
//!   an armor and an optional cape.
//! * **Relations (`relation::Relations`)**: Per-user `favorite` / `collection` / `wishlist`
//!   marks on catalog items and armor sets.
//! * **Sync engine (`sync::SyncEngine`)**: Keeps set-level relations consistent with the
//!   relations on the set's components, in both directions, without re-triggering itself.
//! * **Users (`user::Users`)**: Registration, password hashing, JWT sessions, email
//!   verification and password reset.
//! * **Loadouts (`loadout::Loadouts`)**: User-built, optionally public armor combinations
//!   with likes and favorites.
//! * **Backend (`backend::Backend`)**: The SQLite pool everything above persists into.
//!
//! The [`Armory`] handle wires all of these together.

pub mod backend;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod constants;
pub mod instance;
pub mod loadout;
pub mod relation;
pub mod sync;
pub mod user;

pub use clock::{Clock, SystemClock};
pub use config::{AuthConfig, Config};
pub use instance::{Armory, ArmoryBuilder};

#[cfg(any(test, feature = "testing"))]
pub use clock::FixedClock;

/// Result type used throughout the Armory library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the Armory library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Structured storage errors from the backend module
    #[error(transparent)]
    Backend(backend::BackendError),

    /// Structured catalog errors from the catalog module
    #[error(transparent)]
    Catalog(catalog::CatalogError),

    /// Structured relation errors from the relation module
    #[error(transparent)]
    Relation(relation::RelationError),

    /// Structured account errors from the user module
    #[error(transparent)]
    User(user::UserError),

    /// Structured loadout errors from the loadout module
    #[error(transparent)]
    Loadout(loadout::LoadoutError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Backend(_) => "backend",
            Error::Catalog(_) => "catalog",
            Error::Relation(_) => "relation",
            Error::User(_) => "user",
            Error::Loadout(_) => "loadout",
            Error::Config(_) => "config",
            Error::Io(_) => "io",
            Error::Serialize(_) => "serialize",
        }
    }

    /// Check if this error indicates a resource was not found.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Catalog(err) => err.is_not_found(),
            Error::Relation(err) => err.is_not_found(),
            Error::User(err) => err.is_not_found(),
            Error::Loadout(err) => err.is_not_found(),
            _ => false,
        }
    }

    /// Check if this error indicates a conflict (already exists).
    pub fn is_conflict(&self) -> bool {
        match self {
            Error::Catalog(err) => err.is_conflict(),
            Error::User(err) => err.is_conflict(),
            Error::Backend(err) => err.is_unique_violation(),
            _ => false,
        }
    }

    /// Check if this error is a duplicate user relation.
    ///
    /// Kept apart from [`Error::is_conflict`]: a duplicate relation is a
    /// client-side "already in that list" condition.
    pub fn is_duplicate_relation(&self) -> bool {
        match self {
            Error::Relation(err) => err.is_duplicate(),
            _ => false,
        }
    }

    /// Check if this error indicates permission was denied.
    pub fn is_permission_denied(&self) -> bool {
        match self {
            Error::User(err) => err.is_permission_denied(),
            Error::Loadout(err) => err.is_permission_denied(),
            _ => false,
        }
    }

    /// Check if this error is authentication-related.
    pub fn is_authentication_error(&self) -> bool {
        match self {
            Error::User(err) => err.is_authentication_error(),
            _ => false,
        }
    }

    /// Check if this error is validation-related.
    pub fn is_validation_error(&self) -> bool {
        match self {
            Error::Catalog(err) => err.is_validation_error(),
            Error::Relation(err) => err.is_validation_error(),
            Error::User(err) => err.is_validation_error(),
            Error::Loadout(err) => err.is_validation_error(),
            _ => false,
        }
    }

    /// Check if this error is database/backend-related.
    pub fn is_database_error(&self) -> bool {
        matches!(self, Error::Backend(_))
    }

    /// Check if this error indicates a data integrity issue.
    pub fn is_integrity_error(&self) -> bool {
        match self {
            Error::Backend(err) => err.is_integrity_error(),
            _ => false,
        }
    }

    /// Check if this error is I/O related.
    pub fn is_io_error(&self) -> bool {
        matches!(self, Error::Io(_))
    }
}
