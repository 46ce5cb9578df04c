//! Per-user relations to catalog items and armor sets.
//!
//! A relation is a `(user, target, relation_type)` tuple. Component relations
//! target a catalog item of a relatable kind, set relations target an armor
//! set. Both kinds are unique per tuple and are written through
//! [`Relations`], which notifies hooks and the [`SyncEngine`](crate::sync::SyncEngine)
//! after every row that actually changed.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{ItemId, ItemKind, SetId};
use crate::user::UserId;

mod errors;
mod hooks;
mod service;
mod store;

pub use errors::RelationError;
pub use hooks::{RelationEvent, RelationHook, RelationHookCollection};
pub use service::{Relation, Relations};
pub use store::{ComponentRelationStore, SetRelationStore};

/// The list a user put a target in.
///
/// `Collection` and `Wishlist` are mutually exclusive per target;
/// `Favorite` is independent of both.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    Favorite,
    Collection,
    Wishlist,
}

impl RelationType {
    pub const ALL: [RelationType; 3] = [
        RelationType::Favorite,
        RelationType::Collection,
        RelationType::Wishlist,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationType::Favorite => "favorite",
            RelationType::Collection => "collection",
            RelationType::Wishlist => "wishlist",
        }
    }

    /// The type that must be removed when this one is added.
    pub fn exclusive_counterpart(&self) -> Option<RelationType> {
        match self {
            RelationType::Favorite => None,
            RelationType::Collection => Some(RelationType::Wishlist),
            RelationType::Wishlist => Some(RelationType::Collection),
        }
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationType {
    type Err = RelationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "favorite" => Ok(RelationType::Favorite),
            "collection" => Ok(RelationType::Collection),
            "wishlist" => Ok(RelationType::Wishlist),
            _ => Err(RelationError::UnknownRelationType {
                value: s.to_string(),
            }),
        }
    }
}

/// What a relation points at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RelationTarget {
    Item(ItemKind, ItemId),
    Set(SetId),
}

impl fmt::Display for RelationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelationTarget::Item(kind, id) => write!(f, "{kind} {id}"),
            RelationTarget::Set(id) => write!(f, "armor_set {id}"),
        }
    }
}

/// The family of targets addressed by a relation route.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetKind {
    Item(ItemKind),
    Set,
}

impl TargetKind {
    /// Parse a URL path segment: `sets` or a relatable item kind's segment.
    pub fn from_path_segment(segment: &str) -> Result<Self, RelationError> {
        if segment == "sets" {
            return Ok(TargetKind::Set);
        }
        match ItemKind::from_path_segment(segment) {
            Some(kind) if kind.is_relatable() => Ok(TargetKind::Item(kind)),
            _ => Err(RelationError::NotRelatable {
                kind: segment.to_string(),
            }),
        }
    }

    pub fn target(&self, id: i64) -> RelationTarget {
        match self {
            TargetKind::Item(kind) => RelationTarget::Item(*kind, id),
            TargetKind::Set => RelationTarget::Set(id),
        }
    }
}

/// A stored component relation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ComponentRelation {
    pub user_id: UserId,
    pub kind: ItemKind,
    pub item_id: ItemId,
    pub relation_type: RelationType,
    pub created_at: DateTime<Utc>,
}

/// A stored set relation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SetRelation {
    pub user_id: UserId,
    pub set_id: SetId,
    pub relation_type: RelationType,
    pub created_at: DateTime<Utc>,
}

/// Which lists a user has put one target in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RelationFlags {
    pub favorite: bool,
    pub collection: bool,
    pub wishlist: bool,
}

impl RelationFlags {
    pub(crate) fn from_types(types: &[RelationType]) -> Self {
        Self {
            favorite: types.contains(&RelationType::Favorite),
            collection: types.contains(&RelationType::Collection),
            wishlist: types.contains(&RelationType::Wishlist),
        }
    }
}
