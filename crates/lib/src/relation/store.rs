//! Persistence for component and set relations.
//!
//! The stores only read and write rows. They do not notify anyone and do not
//! enforce collection/wishlist exclusion; [`Relations`](super::Relations)
//! layers both on top.
//!
//! Uniqueness of `(user, target, type)` is the table's primary key, so
//! concurrent writers are serialized by SQLite rather than by application
//! locks. `get_or_create` is a single `INSERT ... ON CONFLICT DO NOTHING`.

use std::sync::Arc;

use super::{ComponentRelation, RelationError, RelationTarget, RelationType, SetRelation};
use crate::backend::{self, Backend, SqlxResultExt};
use crate::catalog::{ItemId, ItemKind, SetId};
use crate::user::UserId;
use crate::{Clock, Result};

fn parse_type(table: &'static str, value: &str) -> Result<RelationType> {
    value.parse().map_err(|_| {
        backend::BackendError::CorruptRow {
            table,
            reason: format!("unknown relation type '{value}'"),
        }
        .into()
    })
}

/// Relations from users to catalog items of one kind.
#[derive(Clone, Debug)]
pub struct ComponentRelationStore {
    backend: Backend,
    clock: Arc<dyn Clock>,
    kind: ItemKind,
}

impl ComponentRelationStore {
    pub(crate) fn new(backend: Backend, clock: Arc<dyn Clock>, kind: ItemKind) -> Self {
        Self {
            backend,
            clock,
            kind,
        }
    }

    /// The item kind this store holds relations for.
    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    fn target(&self, item: ItemId) -> String {
        RelationTarget::Item(self.kind, item).to_string()
    }

    /// Insert a relation.
    ///
    /// # Errors
    /// * [`RelationError::DuplicateRelation`] if the tuple already exists
    /// * [`RelationError::TargetNotFound`] if the user or item does not exist
    pub async fn create(
        &self,
        user: UserId,
        item: ItemId,
        relation_type: RelationType,
    ) -> Result<ComponentRelation> {
        let now = self.clock.now_millis();
        let result = sqlx::query(
            "INSERT INTO item_relations (user_id, item_kind, item_id, relation_type, created_at)
             SELECT ?, kind, id, ?, ? FROM catalog_items WHERE id = ? AND kind = ?",
        )
        .bind(user)
        .bind(relation_type.as_str())
        .bind(now)
        .bind(item)
        .bind(self.kind.as_str())
        .execute(self.backend.pool())
        .await
        .sql_context("Failed to insert item relation");

        match result {
            // The SELECT finds no catalog item of this store's kind.
            Ok(done) if done.rows_affected() == 0 => Err(RelationError::TargetNotFound {
                target: self.target(item),
            }
            .into()),
            Ok(_) => Ok(ComponentRelation {
                user_id: user,
                kind: self.kind,
                item_id: item,
                relation_type,
                created_at: backend::timestamp("item_relations", now)?,
            }),
            Err(crate::Error::Backend(err)) if err.is_unique_violation() => {
                Err(RelationError::DuplicateRelation {
                    target: self.target(item),
                    relation_type,
                }
                .into())
            }
            Err(crate::Error::Backend(err)) if err.is_foreign_key_violation() => {
                Err(RelationError::TargetNotFound {
                    target: self.target(item),
                }
                .into())
            }
            Err(err) => Err(err),
        }
    }

    /// Delete a relation.
    ///
    /// # Errors
    /// * [`RelationError::NotFound`] if the tuple does not exist
    pub async fn delete(
        &self,
        user: UserId,
        item: ItemId,
        relation_type: RelationType,
    ) -> Result<()> {
        if self.delete_if_exists(user, item, relation_type).await? {
            Ok(())
        } else {
            Err(RelationError::NotFound {
                target: self.target(item),
                relation_type,
            }
            .into())
        }
    }

    pub async fn exists(
        &self,
        user: UserId,
        item: ItemId,
        relation_type: RelationType,
    ) -> Result<bool> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT 1 FROM item_relations
             WHERE user_id = ? AND item_kind = ? AND item_id = ? AND relation_type = ?",
        )
        .bind(user)
        .bind(self.kind.as_str())
        .bind(item)
        .bind(relation_type.as_str())
        .fetch_optional(self.backend.pool())
        .await
        .sql_context("Failed to check item relation")?;
        Ok(row.is_some())
    }

    /// Item ids the user holds a relation to, newest first.
    ///
    /// With `relation_type` unset, items held under several types appear once.
    pub async fn list_by_user(
        &self,
        user: UserId,
        relation_type: Option<RelationType>,
    ) -> Result<Vec<ItemId>> {
        let rows: Vec<(i64,)> = sqlx::query_as(
            "SELECT item_id FROM item_relations
             WHERE user_id = ? AND item_kind = ? AND (? IS NULL OR relation_type = ?)
             GROUP BY item_id
             ORDER BY MAX(created_at) DESC, item_id DESC",
        )
        .bind(user)
        .bind(self.kind.as_str())
        .bind(relation_type.map(|t| t.as_str()))
        .bind(relation_type.map(|t| t.as_str()))
        .fetch_all(self.backend.pool())
        .await
        .sql_context("Failed to list item relations")?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Idempotent insert. Returns whether a row was created.
    ///
    /// # Errors
    /// * [`RelationError::TargetNotFound`] if no item of this kind has the id
    pub async fn get_or_create(
        &self,
        user: UserId,
        item: ItemId,
        relation_type: RelationType,
    ) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO item_relations (user_id, item_kind, item_id, relation_type, created_at)
             SELECT ?, kind, id, ?, ? FROM catalog_items WHERE id = ? AND kind = ?
             ON CONFLICT DO NOTHING",
        )
        .bind(user)
        .bind(relation_type.as_str())
        .bind(self.clock.now_millis())
        .bind(item)
        .bind(self.kind.as_str())
        .execute(self.backend.pool())
        .await
        .sql_context("Failed to upsert item relation")?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }
        if !self.item_exists(item).await? {
            return Err(RelationError::TargetNotFound {
                target: self.target(item),
            }
            .into());
        }
        Ok(false)
    }

    async fn item_exists(&self, item: ItemId) -> Result<bool> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT 1 FROM catalog_items WHERE id = ? AND kind = ?")
                .bind(item)
                .bind(self.kind.as_str())
                .fetch_optional(self.backend.pool())
                .await
                .sql_context("Failed to check catalog item")?;
        Ok(row.is_some())
    }

    /// Delete a relation if present. Returns whether a row was removed.
    pub async fn delete_if_exists(
        &self,
        user: UserId,
        item: ItemId,
        relation_type: RelationType,
    ) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM item_relations
             WHERE user_id = ? AND item_kind = ? AND item_id = ? AND relation_type = ?",
        )
        .bind(user)
        .bind(self.kind.as_str())
        .bind(item)
        .bind(relation_type.as_str())
        .execute(self.backend.pool())
        .await
        .sql_context("Failed to delete item relation")?;
        Ok(result.rows_affected() > 0)
    }

    /// Relation types the user holds on one item.
    pub async fn types_for(&self, user: UserId, item: ItemId) -> Result<Vec<RelationType>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT relation_type FROM item_relations
             WHERE user_id = ? AND item_kind = ? AND item_id = ?",
        )
        .bind(user)
        .bind(self.kind.as_str())
        .bind(item)
        .fetch_all(self.backend.pool())
        .await
        .sql_context("Failed to load item relation types")?;
        rows.iter()
            .map(|(value,)| parse_type("item_relations", value))
            .collect()
    }
}

/// Relations from users to armor sets.
#[derive(Clone, Debug)]
pub struct SetRelationStore {
    backend: Backend,
    clock: Arc<dyn Clock>,
}

impl SetRelationStore {
    pub(crate) fn new(backend: Backend, clock: Arc<dyn Clock>) -> Self {
        Self { backend, clock }
    }

    fn target(set: SetId) -> String {
        RelationTarget::Set(set).to_string()
    }

    /// Insert a relation.
    ///
    /// # Errors
    /// * [`RelationError::DuplicateRelation`] if the tuple already exists
    /// * [`RelationError::TargetNotFound`] if the user or set does not exist
    pub async fn create(
        &self,
        user: UserId,
        set: SetId,
        relation_type: RelationType,
    ) -> Result<SetRelation> {
        let now = self.clock.now_millis();
        let result = sqlx::query(
            "INSERT INTO set_relations (user_id, set_id, relation_type, created_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(user)
        .bind(set)
        .bind(relation_type.as_str())
        .bind(now)
        .execute(self.backend.pool())
        .await
        .sql_context("Failed to insert set relation");

        match result {
            Ok(_) => Ok(SetRelation {
                user_id: user,
                set_id: set,
                relation_type,
                created_at: backend::timestamp("set_relations", now)?,
            }),
            Err(crate::Error::Backend(err)) if err.is_unique_violation() => {
                Err(RelationError::DuplicateRelation {
                    target: Self::target(set),
                    relation_type,
                }
                .into())
            }
            Err(crate::Error::Backend(err)) if err.is_foreign_key_violation() => {
                Err(RelationError::TargetNotFound {
                    target: Self::target(set),
                }
                .into())
            }
            Err(err) => Err(err),
        }
    }

    /// Delete a relation.
    ///
    /// # Errors
    /// * [`RelationError::NotFound`] if the tuple does not exist
    pub async fn delete(
        &self,
        user: UserId,
        set: SetId,
        relation_type: RelationType,
    ) -> Result<()> {
        if self.delete_if_exists(user, set, relation_type).await? {
            Ok(())
        } else {
            Err(RelationError::NotFound {
                target: Self::target(set),
                relation_type,
            }
            .into())
        }
    }

    pub async fn exists(
        &self,
        user: UserId,
        set: SetId,
        relation_type: RelationType,
    ) -> Result<bool> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT 1 FROM set_relations WHERE user_id = ? AND set_id = ? AND relation_type = ?",
        )
        .bind(user)
        .bind(set)
        .bind(relation_type.as_str())
        .fetch_optional(self.backend.pool())
        .await
        .sql_context("Failed to check set relation")?;
        Ok(row.is_some())
    }

    /// Set ids the user holds a relation to, newest first.
    pub async fn list_by_user(
        &self,
        user: UserId,
        relation_type: Option<RelationType>,
    ) -> Result<Vec<SetId>> {
        let rows: Vec<(i64,)> = sqlx::query_as(
            "SELECT set_id FROM set_relations
             WHERE user_id = ? AND (? IS NULL OR relation_type = ?)
             GROUP BY set_id
             ORDER BY MAX(created_at) DESC, set_id DESC",
        )
        .bind(user)
        .bind(relation_type.map(|t| t.as_str()))
        .bind(relation_type.map(|t| t.as_str()))
        .fetch_all(self.backend.pool())
        .await
        .sql_context("Failed to list set relations")?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Idempotent insert. Returns whether a row was created.
    pub async fn get_or_create(
        &self,
        user: UserId,
        set: SetId,
        relation_type: RelationType,
    ) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO set_relations (user_id, set_id, relation_type, created_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT DO NOTHING",
        )
        .bind(user)
        .bind(set)
        .bind(relation_type.as_str())
        .bind(self.clock.now_millis())
        .execute(self.backend.pool())
        .await
        .sql_context("Failed to upsert set relation")?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a relation if present. Returns whether a row was removed.
    pub async fn delete_if_exists(
        &self,
        user: UserId,
        set: SetId,
        relation_type: RelationType,
    ) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM set_relations WHERE user_id = ? AND set_id = ? AND relation_type = ?",
        )
        .bind(user)
        .bind(set)
        .bind(relation_type.as_str())
        .execute(self.backend.pool())
        .await
        .sql_context("Failed to delete set relation")?;
        Ok(result.rows_affected() > 0)
    }

    /// Relation types the user holds on one set.
    pub async fn types_for(&self, user: UserId, set: SetId) -> Result<Vec<RelationType>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT relation_type FROM set_relations WHERE user_id = ? AND set_id = ?",
        )
        .bind(user)
        .bind(set)
        .fetch_all(self.backend.pool())
        .await
        .sql_context("Failed to load set relation types")?;
        rows.iter()
            .map(|(value,)| parse_type("set_relations", value))
            .collect()
    }
}
