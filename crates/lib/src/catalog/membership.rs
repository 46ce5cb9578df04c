//! Set membership index.
//!
//! Read-only lookups derived from the `armor_sets` foreign keys. Nothing is
//! cached: each call is a single indexed query.

use serde::Serialize;

use super::{CatalogError, ItemId, ItemKind, SetId};
use crate::Result;
use crate::backend::{Backend, SqlxResultExt};

/// The components an armor set is made of.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SetComponents {
    pub helmet: ItemId,
    pub armor: ItemId,
    pub cape: Option<ItemId>,
}

impl SetComponents {
    /// Present components in propagation order: helmet, armor, cape.
    pub fn iter(&self) -> impl Iterator<Item = (ItemKind, ItemId)> + use<> {
        [
            Some((ItemKind::Helmet, self.helmet)),
            Some((ItemKind::Armor, self.armor)),
            self.cape.map(|cape| (ItemKind::Cape, cape)),
        ]
        .into_iter()
        .flatten()
    }
}

/// Lookups between armor sets and their components.
#[derive(Clone, Debug)]
pub struct SetMembership {
    backend: Backend,
}

impl SetMembership {
    pub(crate) fn new(backend: Backend) -> Self {
        Self { backend }
    }

    /// Ids of all sets that use the given item, in ascending id order.
    ///
    /// Kinds that cannot be set components never belong to a set.
    pub async fn sets_containing(&self, kind: ItemKind, id: ItemId) -> Result<Vec<SetId>> {
        let column = match kind {
            ItemKind::Helmet => "helmet_id",
            ItemKind::Armor => "armor_id",
            ItemKind::Cape => "cape_id",
            _ => return Ok(Vec::new()),
        };

        let rows: Vec<(i64,)> = sqlx::query_as(&format!(
            "SELECT id FROM armor_sets WHERE {column} = ? ORDER BY id"
        ))
        .bind(id)
        .fetch_all(self.backend.pool())
        .await
        .sql_context("Failed to look up sets containing item")?;

        Ok(rows.into_iter().map(|(set,)| set).collect())
    }

    /// Like [`sets_containing`](Self::sets_containing), returning each set's
    /// components from the same query.
    pub async fn sets_with_components(
        &self,
        kind: ItemKind,
        id: ItemId,
    ) -> Result<Vec<(SetId, SetComponents)>> {
        let column = match kind {
            ItemKind::Helmet => "helmet_id",
            ItemKind::Armor => "armor_id",
            ItemKind::Cape => "cape_id",
            _ => return Ok(Vec::new()),
        };

        let rows: Vec<(i64, i64, i64, Option<i64>)> = sqlx::query_as(&format!(
            "SELECT id, helmet_id, armor_id, cape_id FROM armor_sets WHERE {column} = ? ORDER BY id"
        ))
        .bind(id)
        .fetch_all(self.backend.pool())
        .await
        .sql_context("Failed to look up sets containing item")?;

        Ok(rows
            .into_iter()
            .map(|(set, helmet, armor, cape)| {
                (
                    set,
                    SetComponents {
                        helmet,
                        armor,
                        cape,
                    },
                )
            })
            .collect())
    }

    /// The components referenced by a set.
    ///
    /// # Errors
    /// * [`CatalogError::ItemNotFound`] if the set does not exist
    pub async fn components_of(&self, set: SetId) -> Result<SetComponents> {
        let row: Option<(i64, i64, Option<i64>)> =
            sqlx::query_as("SELECT helmet_id, armor_id, cape_id FROM armor_sets WHERE id = ?")
                .bind(set)
                .fetch_optional(self.backend.pool())
                .await
                .sql_context("Failed to look up set components")?;

        match row {
            Some((helmet, armor, cape)) => Ok(SetComponents {
                helmet,
                armor,
                cape,
            }),
            None => Err(CatalogError::ItemNotFound {
                kind: "armor_set",
                id: set,
            }
            .into()),
        }
    }
}
