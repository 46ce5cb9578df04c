//! Relation hooks for observing relation writes.
//!
//! Hooks are registered when the [`Armory`](crate::Armory) is built and are
//! called after every relation row that was actually inserted or deleted,
//! including rows written by a cascade. They run before the sync engine
//! reacts to the same write.

use std::sync::Arc;

use crate::Result;
use crate::catalog::{ItemId, ItemKind, SetId};
use crate::sync::{CascadeContext, Handler};
use crate::user::UserId;

use super::{RelationTarget, RelationType};

/// A relation row that was inserted or deleted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelationEvent {
    SetCreated {
        user: UserId,
        set: SetId,
        relation_type: RelationType,
    },
    SetDeleted {
        user: UserId,
        set: SetId,
        relation_type: RelationType,
    },
    ComponentCreated {
        user: UserId,
        kind: ItemKind,
        item: ItemId,
        relation_type: RelationType,
    },
    ComponentDeleted {
        user: UserId,
        kind: ItemKind,
        item: ItemId,
        relation_type: RelationType,
    },
}

impl RelationEvent {
    /// The engine handler that reacts to this event.
    pub fn handler(&self) -> Handler {
        match self {
            RelationEvent::SetCreated { .. } => Handler::SetCreated,
            RelationEvent::SetDeleted { .. } => Handler::SetDeleted,
            RelationEvent::ComponentCreated { .. } => Handler::ComponentCreated,
            RelationEvent::ComponentDeleted { .. } => Handler::ComponentDeleted,
        }
    }

    pub fn user(&self) -> UserId {
        match self {
            RelationEvent::SetCreated { user, .. }
            | RelationEvent::SetDeleted { user, .. }
            | RelationEvent::ComponentCreated { user, .. }
            | RelationEvent::ComponentDeleted { user, .. } => *user,
        }
    }

    pub fn target(&self) -> RelationTarget {
        match self {
            RelationEvent::SetCreated { set, .. } | RelationEvent::SetDeleted { set, .. } => {
                RelationTarget::Set(*set)
            }
            RelationEvent::ComponentCreated { kind, item, .. }
            | RelationEvent::ComponentDeleted { kind, item, .. } => {
                RelationTarget::Item(*kind, *item)
            }
        }
    }

    pub fn relation_type(&self) -> RelationType {
        match self {
            RelationEvent::SetCreated { relation_type, .. }
            | RelationEvent::SetDeleted { relation_type, .. }
            | RelationEvent::ComponentCreated { relation_type, .. }
            | RelationEvent::ComponentDeleted { relation_type, .. } => *relation_type,
        }
    }
}

/// Trait for observers of relation writes.
pub trait RelationHook: Send + Sync {
    /// Called after a relation row was inserted or deleted.
    ///
    /// Hook failures do not roll back the write and do not stop the cascade;
    /// they are logged.
    fn on_relation_changed(&self, event: &RelationEvent, ctx: &CascadeContext) -> Result<()>;
}

/// A collection of relation hooks executed in registration order.
#[derive(Default)]
pub struct RelationHookCollection {
    hooks: Vec<Arc<dyn RelationHook>>,
}

impl RelationHookCollection {
    /// Create a new empty hook collection.
    pub fn new() -> Self {
        Self { hooks: Vec::new() }
    }

    /// Add a hook to the collection.
    pub fn add_hook(&mut self, hook: Arc<dyn RelationHook>) {
        self.hooks.push(hook);
    }

    /// Execute all hooks with the given event.
    ///
    /// A failing hook is logged and the remaining hooks still run. Returns
    /// the number of hooks that failed.
    pub fn execute_hooks(&self, event: &RelationEvent, ctx: &CascadeContext) -> usize {
        let mut failures = 0;
        for hook in &self.hooks {
            if let Err(e) = hook.on_relation_changed(event, ctx) {
                tracing::error!(?event, depth = ctx.depth(), "Relation hook failed: {e}");
                failures += 1;
            }
        }
        failures
    }

    /// Check if there are any hooks registered.
    pub fn has_hooks(&self) -> bool {
        !self.hooks.is_empty()
    }
}

impl std::fmt::Debug for RelationHookCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelationHookCollection")
            .field("len", &self.hooks.len())
            .finish()
    }
}
