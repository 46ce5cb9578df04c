//! The synchronizing relation write path and the operations the API exposes.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use super::{
    ComponentRelation, ComponentRelationStore, RelationError, RelationEvent, RelationFlags,
    RelationHookCollection, RelationTarget, RelationType, SetRelation, SetRelationStore,
    TargetKind,
};
use crate::Result;
use crate::catalog::{Catalog, ItemId, ItemKind, SetId};
use crate::sync::{CascadeContext, RelationWriter, SyncEngine};
use crate::user::UserId;

/// A relation returned by [`Relations::add`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Relation {
    Component(ComponentRelation),
    Set(SetRelation),
}

/// Relation write path.
///
/// Every insert or delete that changes a row is reported to the registered
/// [`RelationHook`](super::RelationHook)s and then to the [`SyncEngine`],
/// which may cascade further writes back through this same path.
///
/// Cheap to clone; clones share stores, hooks and engine.
#[derive(Clone)]
pub struct Relations {
    inner: Arc<RelationsInner>,
}

struct RelationsInner {
    catalog: Catalog,
    engine: SyncEngine,
    hooks: RelationHookCollection,
}

impl std::fmt::Debug for Relations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Relations")
            .field("engine", &self.inner.engine)
            .field("hooks", &self.inner.hooks)
            .finish()
    }
}

impl Relations {
    pub(crate) fn new(catalog: Catalog, engine: SyncEngine, hooks: RelationHookCollection) -> Self {
        Self {
            inner: Arc::new(RelationsInner {
                catalog,
                engine,
                hooks,
            }),
        }
    }

    /// Store of relations on items of one kind.
    ///
    /// # Errors
    /// * [`RelationError::NotRelatable`] for kinds users cannot relate to
    pub fn components(&self, kind: ItemKind) -> Result<ComponentRelationStore> {
        if !kind.is_relatable() {
            return Err(RelationError::NotRelatable {
                kind: kind.as_str().to_string(),
            }
            .into());
        }
        let catalog = &self.inner.catalog;
        Ok(ComponentRelationStore::new(
            catalog.backend().clone(),
            catalog.clock_arc(),
            kind,
        ))
    }

    /// Store of relations on armor sets.
    pub fn sets(&self) -> SetRelationStore {
        let catalog = &self.inner.catalog;
        SetRelationStore::new(catalog.backend().clone(), catalog.clock_arc())
    }

    pub fn engine(&self) -> &SyncEngine {
        &self.inner.engine
    }

    async fn emit(&self, ctx: CascadeContext, event: RelationEvent) -> Result<()> {
        let hooks = &self.inner.hooks;
        if hooks.has_hooks() {
            // Failures are logged by the collection and never fail the write.
            hooks.execute_hooks(&event, &ctx);
        }
        self.inner.engine.dispatch(self, ctx, &event).await
    }

    /// Feed an event to the sync engine as if a user had just made the write.
    ///
    /// Hooks are not notified since no row changed.
    pub async fn replay(&self, event: RelationEvent) -> Result<()> {
        self.inner
            .engine
            .dispatch(self, CascadeContext::root(), &event)
            .await
    }

    /// Create a component relation on the user's behalf and synchronize sets.
    ///
    /// # Errors
    /// * [`RelationError::DuplicateRelation`] if the user already holds it
    pub async fn create_component(
        &self,
        user: UserId,
        kind: ItemKind,
        item: ItemId,
        relation_type: RelationType,
    ) -> Result<ComponentRelation> {
        let relation = self.components(kind)?.create(user, item, relation_type).await?;
        self.emit(
            CascadeContext::root(),
            RelationEvent::ComponentCreated {
                user,
                kind,
                item,
                relation_type,
            },
        )
        .await?;
        Ok(relation)
    }

    /// Delete a component relation on the user's behalf and synchronize sets.
    ///
    /// # Errors
    /// * [`RelationError::NotFound`] if the user does not hold it
    pub async fn delete_component(
        &self,
        user: UserId,
        kind: ItemKind,
        item: ItemId,
        relation_type: RelationType,
    ) -> Result<()> {
        self.components(kind)?.delete(user, item, relation_type).await?;
        self.emit(
            CascadeContext::root(),
            RelationEvent::ComponentDeleted {
                user,
                kind,
                item,
                relation_type,
            },
        )
        .await
    }

    /// Create a set relation on the user's behalf and synchronize components.
    ///
    /// # Errors
    /// * [`RelationError::DuplicateRelation`] if the user already holds it
    pub async fn create_set(
        &self,
        user: UserId,
        set: SetId,
        relation_type: RelationType,
    ) -> Result<SetRelation> {
        let relation = self.sets().create(user, set, relation_type).await?;
        self.emit(
            CascadeContext::root(),
            RelationEvent::SetCreated {
                user,
                set,
                relation_type,
            },
        )
        .await?;
        Ok(relation)
    }

    /// Delete a set relation on the user's behalf and synchronize components.
    ///
    /// # Errors
    /// * [`RelationError::NotFound`] if the user does not hold it
    pub async fn delete_set(
        &self,
        user: UserId,
        set: SetId,
        relation_type: RelationType,
    ) -> Result<()> {
        self.sets().delete(user, set, relation_type).await?;
        self.emit(
            CascadeContext::root(),
            RelationEvent::SetDeleted {
                user,
                set,
                relation_type,
            },
        )
        .await
    }

    async fn target_exists(&self, target: RelationTarget) -> Result<bool> {
        match target {
            RelationTarget::Item(kind, id) => self.inner.catalog.item_exists(kind, id).await,
            RelationTarget::Set(id) => self.inner.catalog.sets().exists(id).await,
        }
    }

    /// Put a target in one of the user's lists.
    ///
    /// Adding to `collection` removes the target from `wishlist` and vice
    /// versa. The removal goes through the synchronizing write path too.
    ///
    /// # Errors
    /// * [`RelationError::TargetNotFound`] if the item or set does not exist
    /// * [`RelationError::DuplicateRelation`] if it is already in the list
    pub async fn add(
        &self,
        user: UserId,
        target: RelationTarget,
        relation_type: RelationType,
    ) -> Result<Relation> {
        if let RelationTarget::Item(kind, _) = target {
            self.components(kind)?;
        }
        if !self.target_exists(target).await? {
            return Err(RelationError::TargetNotFound {
                target: target.to_string(),
            }
            .into());
        }

        let relation = match target {
            RelationTarget::Item(kind, item) => Relation::Component(
                self.create_component(user, kind, item, relation_type)
                    .await?,
            ),
            RelationTarget::Set(set) => {
                Relation::Set(self.create_set(user, set, relation_type).await?)
            }
        };

        if let Some(other) = relation_type.exclusive_counterpart() {
            let ctx = CascadeContext::root();
            let removed = match target {
                RelationTarget::Item(kind, item) => {
                    self.discard_component(ctx, user, kind, item, other).await?
                }
                RelationTarget::Set(set) => self.discard_set(ctx, user, set, other).await?,
            };
            if removed {
                tracing::debug!(
                    user,
                    %target,
                    from = %other,
                    to = %relation_type,
                    "Moved target between lists"
                );
            }
        }

        Ok(relation)
    }

    /// Take a target out of one of the user's lists.
    ///
    /// # Errors
    /// * [`RelationError::NotFound`] if it is not in the list
    pub async fn remove(
        &self,
        user: UserId,
        target: RelationTarget,
        relation_type: RelationType,
    ) -> Result<()> {
        match target {
            RelationTarget::Item(kind, item) => {
                self.delete_component(user, kind, item, relation_type).await
            }
            RelationTarget::Set(set) => self.delete_set(user, set, relation_type).await,
        }
    }

    /// Which lists the target is in.
    pub async fn check(&self, user: UserId, target: RelationTarget) -> Result<RelationFlags> {
        let types = match target {
            RelationTarget::Item(kind, item) => self.components(kind)?.types_for(user, item).await?,
            RelationTarget::Set(set) => self.sets().types_for(user, set).await?,
        };
        Ok(RelationFlags::from_types(&types))
    }

    /// Ids of the targets of one family in one of the user's lists.
    pub async fn list_ids(
        &self,
        user: UserId,
        kind: TargetKind,
        relation_type: RelationType,
    ) -> Result<Vec<i64>> {
        match kind {
            TargetKind::Item(kind) => {
                self.components(kind)?
                    .list_by_user(user, Some(relation_type))
                    .await
            }
            TargetKind::Set => self.sets().list_by_user(user, Some(relation_type)).await,
        }
    }

    /// The catalog records behind [`list_ids`](Self::list_ids).
    pub async fn list_records(
        &self,
        user: UserId,
        kind: TargetKind,
        relation_type: RelationType,
    ) -> Result<Vec<serde_json::Value>> {
        let ids = self.list_ids(user, kind, relation_type).await?;
        match kind {
            TargetKind::Item(kind) => self.inner.catalog.records_json(kind, &ids).await,
            TargetKind::Set => {
                let sets = self.inner.catalog.sets();
                let mut records = Vec::with_capacity(ids.len());
                for id in ids {
                    records.push(serde_json::to_value(sets.get(id).await?)?);
                }
                Ok(records)
            }
        }
    }
}

#[async_trait]
impl RelationWriter for Relations {
    async fn component_exists(
        &self,
        user: UserId,
        kind: ItemKind,
        item: ItemId,
        relation_type: RelationType,
    ) -> Result<bool> {
        self.components(kind)?.exists(user, item, relation_type).await
    }

    async fn ensure_component(
        &self,
        ctx: CascadeContext,
        user: UserId,
        kind: ItemKind,
        item: ItemId,
        relation_type: RelationType,
    ) -> Result<bool> {
        let created = self
            .components(kind)?
            .get_or_create(user, item, relation_type)
            .await?;
        if created {
            self.emit(
                ctx,
                RelationEvent::ComponentCreated {
                    user,
                    kind,
                    item,
                    relation_type,
                },
            )
            .await?;
        }
        Ok(created)
    }

    async fn discard_component(
        &self,
        ctx: CascadeContext,
        user: UserId,
        kind: ItemKind,
        item: ItemId,
        relation_type: RelationType,
    ) -> Result<bool> {
        let deleted = self
            .components(kind)?
            .delete_if_exists(user, item, relation_type)
            .await?;
        if deleted {
            self.emit(
                ctx,
                RelationEvent::ComponentDeleted {
                    user,
                    kind,
                    item,
                    relation_type,
                },
            )
            .await?;
        }
        Ok(deleted)
    }

    async fn ensure_set(
        &self,
        ctx: CascadeContext,
        user: UserId,
        set: SetId,
        relation_type: RelationType,
    ) -> Result<bool> {
        let created = self.sets().get_or_create(user, set, relation_type).await?;
        if created {
            self.emit(
                ctx,
                RelationEvent::SetCreated {
                    user,
                    set,
                    relation_type,
                },
            )
            .await?;
        }
        Ok(created)
    }

    async fn discard_set(
        &self,
        ctx: CascadeContext,
        user: UserId,
        set: SetId,
        relation_type: RelationType,
    ) -> Result<bool> {
        let deleted = self.sets().delete_if_exists(user, set, relation_type).await?;
        if deleted {
            self.emit(
                ctx,
                RelationEvent::SetDeleted {
                    user,
                    set,
                    relation_type,
                },
            )
            .await?;
        }
        Ok(deleted)
    }
}
