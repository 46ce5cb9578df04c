//! Bidirectional synchronization between set relations and component relations.
//!
//! An armor set is made of a helmet, an armor and optionally a cape. The
//! [`SyncEngine`] keeps a user's relation on a set consistent with their
//! relations on its components:
//!
//! * **Downward**: creating or deleting `(user, set, type)` creates or deletes
//!   `(user, component, type)` for each component of the set.
//! * **Upward**: creating `(user, component, type)` creates `(user, set, type)`
//!   for every set whose required components the user now all holds; deleting
//!   it deletes `(user, set, type)` for every set containing the component.
//!
//! The engine never writes rows itself. It is handed a [`RelationWriter`],
//! whose idempotent `ensure_*` / `discard_*` operations report back through
//! [`SyncEngine::dispatch`] for every row that really changed. Each cascade
//! suppresses the handler that would bounce its own writes back (see
//! [`CascadeContext`]), so a single user write fans out at most one level in
//! each direction.
//!
//! Deleting a set relation removes the component relations of that set even
//! when another set the user still holds needs them; nothing is re-derived
//! afterwards. Partially applied cascades are not rolled back: the first
//! failing write aborts the cascade and its error is returned to the caller
//! of the original write, which stays persisted.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::catalog::{ItemId, ItemKind, SetComponents, SetId, SetMembership};
use crate::relation::{RelationEvent, RelationType};
use crate::user::UserId;

mod context;

pub use context::{CascadeContext, Handler};

/// Tunables for upward synchronization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncPolicy {
    /// When true, a set without a cape never gains a relation from its
    /// components. When false, helmet and armor are enough for such a set.
    pub require_cape: bool,
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self { require_cape: true }
    }
}

/// The write path the engine cascades through.
///
/// Every method takes the context the write is made in and must report a
/// change (returning `true`) only when a row was inserted or deleted.
#[async_trait]
pub trait RelationWriter: Send + Sync {
    async fn component_exists(
        &self,
        user: UserId,
        kind: ItemKind,
        item: ItemId,
        relation_type: RelationType,
    ) -> Result<bool>;

    /// Create the component relation if missing.
    async fn ensure_component(
        &self,
        ctx: CascadeContext,
        user: UserId,
        kind: ItemKind,
        item: ItemId,
        relation_type: RelationType,
    ) -> Result<bool>;

    /// Delete the component relation if present.
    async fn discard_component(
        &self,
        ctx: CascadeContext,
        user: UserId,
        kind: ItemKind,
        item: ItemId,
        relation_type: RelationType,
    ) -> Result<bool>;

    /// Create the set relation if missing.
    async fn ensure_set(
        &self,
        ctx: CascadeContext,
        user: UserId,
        set: SetId,
        relation_type: RelationType,
    ) -> Result<bool>;

    /// Delete the set relation if present.
    async fn discard_set(
        &self,
        ctx: CascadeContext,
        user: UserId,
        set: SetId,
        relation_type: RelationType,
    ) -> Result<bool>;
}

/// Reacts to relation writes by propagating them between sets and components.
#[derive(Clone, Debug)]
pub struct SyncEngine {
    membership: SetMembership,
    policy: SyncPolicy,
}

impl SyncEngine {
    pub fn new(membership: SetMembership, policy: SyncPolicy) -> Self {
        Self { membership, policy }
    }

    pub fn policy(&self) -> SyncPolicy {
        self.policy
    }

    /// Route an event to its handler unless the context suppresses it.
    pub async fn dispatch(
        &self,
        writer: &dyn RelationWriter,
        ctx: CascadeContext,
        event: &RelationEvent,
    ) -> Result<()> {
        if ctx.is_suppressed(event.handler()) {
            tracing::trace!(?event, depth = ctx.depth(), "Handler suppressed");
            return Ok(());
        }

        match *event {
            RelationEvent::SetCreated {
                user,
                set,
                relation_type,
            } => {
                self.on_set_relation_created(writer, ctx, user, set, relation_type)
                    .await
            }
            RelationEvent::SetDeleted {
                user,
                set,
                relation_type,
            } => {
                self.on_set_relation_deleted(writer, ctx, user, set, relation_type)
                    .await
            }
            RelationEvent::ComponentCreated {
                user,
                kind,
                item,
                relation_type,
            } => {
                self.on_component_relation_created(writer, ctx, user, kind, item, relation_type)
                    .await
            }
            RelationEvent::ComponentDeleted {
                user,
                kind,
                item,
                relation_type,
            } => {
                self.on_component_relation_deleted(writer, ctx, user, kind, item, relation_type)
                    .await
            }
        }
    }

    /// Give the user the same relation on every component of the set.
    ///
    /// Components are processed helmet, armor, cape. The component writes
    /// do not trigger upward synchronization.
    pub async fn on_set_relation_created(
        &self,
        writer: &dyn RelationWriter,
        ctx: CascadeContext,
        user: UserId,
        set: SetId,
        relation_type: RelationType,
    ) -> Result<()> {
        let components = self.membership.components_of(set).await?;
        let ctx = ctx.cascade(Handler::ComponentCreated);

        for (kind, item) in components.iter() {
            let created = writer
                .ensure_component(ctx, user, kind, item, relation_type)
                .await?;
            tracing::debug!(
                user,
                set,
                %kind,
                item,
                %relation_type,
                created,
                "Propagated set relation to component"
            );
        }
        Ok(())
    }

    /// Remove the relation from every component of the set.
    ///
    /// Components still required by another set the user holds are removed
    /// as well.
    pub async fn on_set_relation_deleted(
        &self,
        writer: &dyn RelationWriter,
        ctx: CascadeContext,
        user: UserId,
        set: SetId,
        relation_type: RelationType,
    ) -> Result<()> {
        let components = self.membership.components_of(set).await?;
        let ctx = ctx.cascade(Handler::ComponentDeleted);

        for (kind, item) in components.iter() {
            let deleted = writer
                .discard_component(ctx, user, kind, item, relation_type)
                .await?;
            tracing::debug!(
                user,
                set,
                %kind,
                item,
                %relation_type,
                deleted,
                "Removed component relation of deleted set relation"
            );
        }
        Ok(())
    }

    /// Materialize the relation on every set the user now fully holds.
    pub async fn on_component_relation_created(
        &self,
        writer: &dyn RelationWriter,
        ctx: CascadeContext,
        user: UserId,
        kind: ItemKind,
        item: ItemId,
        relation_type: RelationType,
    ) -> Result<()> {
        if !kind.is_set_component() {
            return Ok(());
        }
        let candidates = self.membership.sets_with_components(kind, item).await?;
        let ctx = ctx.cascade(Handler::SetCreated);

        for (set, components) in candidates {
            if !self
                .holds_all(writer, user, &components, relation_type)
                .await?
            {
                continue;
            }
            let created = writer.ensure_set(ctx, user, set, relation_type).await?;
            tracing::debug!(
                user,
                set,
                %relation_type,
                created,
                "Completed set from component relations"
            );
        }
        Ok(())
    }

    /// Drop the relation from every set containing the component.
    ///
    /// The other components are not re-checked: losing any one of them is
    /// enough to invalidate the set relation.
    pub async fn on_component_relation_deleted(
        &self,
        writer: &dyn RelationWriter,
        ctx: CascadeContext,
        user: UserId,
        kind: ItemKind,
        item: ItemId,
        relation_type: RelationType,
    ) -> Result<()> {
        if !kind.is_set_component() {
            return Ok(());
        }
        let sets = self.membership.sets_containing(kind, item).await?;
        let ctx = ctx.cascade(Handler::SetDeleted);

        for set in sets {
            let deleted = writer.discard_set(ctx, user, set, relation_type).await?;
            tracing::debug!(user, set, %relation_type, deleted, "Invalidated set relation");
        }
        Ok(())
    }

    /// Whether the user holds `relation_type` on every required component.
    ///
    /// Checks stop at the first missing component. Helmet and armor are
    /// always present on a stored set.
    async fn holds_all(
        &self,
        writer: &dyn RelationWriter,
        user: UserId,
        components: &SetComponents,
        relation_type: RelationType,
    ) -> Result<bool> {
        if components.cape.is_none() && self.policy.require_cape {
            return Ok(false);
        }
        for (kind, item) in components.iter() {
            if !writer
                .component_exists(user, kind, item, relation_type)
                .await?
            {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
