//! Catalog of game items.
//!
//! Every item kind except armor sets lives in the shared `catalog_items`
//! table, with the kind-specific body stored as JSON and accessed through a
//! typed [`CatalogTable`]. Armor sets reference their components through real
//! foreign keys (see [`ArmorSets`]) so that the set membership index can be
//! answered with plain SQL lookups.
//!
//! Every mutation bumps the [`GlobalVersion`] timestamp that clients poll to
//! invalidate their caches.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::backend::{self, Backend, SqlxResultExt};
use crate::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::{Clock, Result};

mod errors;
pub mod items;
mod membership;
mod sets;
mod table;
mod version;

pub use errors::CatalogError;
pub use membership::{SetComponents, SetMembership};
pub use sets::{ArmorSet, ArmorSets, SetCost};
pub use table::CatalogTable;
pub use version::GlobalVersion;

/// Identifier of a row in `catalog_items`.
pub type ItemId = i64;

/// Identifier of an armor set.
pub type SetId = i64;

/// Kinds of items stored in the catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Helmet,
    Armor,
    Cape,
    Passive,
    Warbond,
    BattlePass,
    Booster,
    Stratagem,
    PrimaryWeapon,
    SecondaryWeapon,
    Throwable,
}

impl ItemKind {
    pub const ALL: [ItemKind; 11] = [
        ItemKind::Helmet,
        ItemKind::Armor,
        ItemKind::Cape,
        ItemKind::Passive,
        ItemKind::Warbond,
        ItemKind::BattlePass,
        ItemKind::Booster,
        ItemKind::Stratagem,
        ItemKind::PrimaryWeapon,
        ItemKind::SecondaryWeapon,
        ItemKind::Throwable,
    ];

    /// Stable name stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Helmet => "helmet",
            ItemKind::Armor => "armor",
            ItemKind::Cape => "cape",
            ItemKind::Passive => "passive",
            ItemKind::Warbond => "warbond",
            ItemKind::BattlePass => "battle_pass",
            ItemKind::Booster => "booster",
            ItemKind::Stratagem => "stratagem",
            ItemKind::PrimaryWeapon => "primary_weapon",
            ItemKind::SecondaryWeapon => "secondary_weapon",
            ItemKind::Throwable => "throwable",
        }
    }

    /// URL path segment for the kind's collection.
    pub fn path_segment(&self) -> &'static str {
        match self {
            ItemKind::Helmet => "helmets",
            ItemKind::Armor => "armors",
            ItemKind::Cape => "capes",
            ItemKind::Passive => "passives",
            ItemKind::Warbond => "warbonds",
            ItemKind::BattlePass => "battle-passes",
            ItemKind::Booster => "boosters",
            ItemKind::Stratagem => "stratagems",
            ItemKind::PrimaryWeapon => "primary",
            ItemKind::SecondaryWeapon => "secondary",
            ItemKind::Throwable => "throwable",
        }
    }

    /// Inverse of [`ItemKind::path_segment`].
    pub fn from_path_segment(segment: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.path_segment() == segment)
    }

    /// Whether users can favorite, collect or wishlist items of this kind.
    pub fn is_relatable(&self) -> bool {
        matches!(
            self,
            ItemKind::Helmet
                | ItemKind::Armor
                | ItemKind::Cape
                | ItemKind::Stratagem
                | ItemKind::PrimaryWeapon
                | ItemKind::SecondaryWeapon
                | ItemKind::Throwable
                | ItemKind::Booster
        )
    }

    /// Whether items of this kind can be part of an armor set.
    pub fn is_set_component(&self) -> bool {
        matches!(self, ItemKind::Helmet | ItemKind::Armor | ItemKind::Cape)
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = CatalogError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| CatalogError::UnknownKind {
                kind: s.to_string(),
            })
    }
}

/// A typed catalog item body.
pub trait CatalogItem: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: ItemKind;

    fn name(&self) -> &str;

    /// Foreign references as `(field, kind, id)`, validated on write.
    fn references(&self) -> Vec<(&'static str, ItemKind, ItemId)> {
        Vec::new()
    }

    /// Price of the item in its own currency.
    fn cost(&self) -> i64 {
        0
    }
}

/// A stored item together with its id and timestamps.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record<T> {
    pub id: i64,
    #[serde(flatten)]
    pub item: T,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Name search plus page selection.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Case-insensitive substring matched against `name` and `name_pt_br`.
    #[serde(default)]
    pub search: Option<String>,
    /// 1-based page number.
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub page_size: Option<u32>,
}

impl ListQuery {
    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search: Some(term.into()),
            ..Self::default()
        }
    }

    /// SQL `LIMIT` and `OFFSET` for this query.
    ///
    /// Oversized pages are clamped to [`MAX_PAGE_SIZE`]; page 0 is rejected.
    pub fn limit_offset(&self) -> Result<(i64, i64)> {
        let page = self.page.unwrap_or(1);
        if page == 0 {
            return Err(CatalogError::InvalidPage {
                reason: "pages start at 1".to_string(),
            }
            .into());
        }
        let size = match self.page_size {
            None | Some(0) => DEFAULT_PAGE_SIZE,
            Some(size) => size.min(MAX_PAGE_SIZE),
        };
        Ok((i64::from(size), i64::from(page - 1) * i64::from(size)))
    }

    /// `LIKE` pattern for the search term, if any.
    pub(crate) fn like_pattern(&self) -> Option<String> {
        let term = self.search.as_deref()?.trim();
        if term.is_empty() {
            return None;
        }
        let escaped = term
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        Some(format!("%{escaped}%"))
    }
}

/// One page of results plus the total number of matches.
#[derive(Clone, Debug, Serialize)]
pub struct Page<T> {
    pub count: i64,
    pub results: Vec<T>,
}

/// Handle to the catalog.
///
/// Cheap to clone; all clones share the same backend and clock.
#[derive(Clone, Debug)]
pub struct Catalog {
    backend: Backend,
    clock: Arc<dyn Clock>,
}

impl Catalog {
    pub(crate) fn new(backend: Backend, clock: Arc<dyn Clock>) -> Self {
        Self { backend, clock }
    }

    pub(crate) fn backend(&self) -> &Backend {
        &self.backend
    }

    pub(crate) fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub(crate) fn clock_arc(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }

    /// Typed access to one item kind.
    pub fn table<T: CatalogItem>(&self) -> CatalogTable<T> {
        CatalogTable::new(self.clone())
    }

    /// Armor sets.
    pub fn sets(&self) -> ArmorSets {
        ArmorSets::new(self.clone())
    }

    /// Reverse and forward lookups between sets and their components.
    pub fn membership(&self) -> SetMembership {
        SetMembership::new(self.backend.clone())
    }

    /// The cache invalidation timestamp.
    pub fn version(&self) -> GlobalVersion {
        GlobalVersion::new(self.backend.clone(), self.clock.clone())
    }

    /// Check whether an item of `kind` with `id` exists.
    pub async fn item_exists(&self, kind: ItemKind, id: ItemId) -> Result<bool> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT 1 FROM catalog_items WHERE kind = ? AND id = ?")
                .bind(kind.as_str())
                .bind(id)
                .fetch_optional(self.backend.pool())
                .await
                .sql_context("Failed to check catalog item")?;
        Ok(row.is_some())
    }

    /// Fetch items of any kind as untyped JSON records, in the order of `ids`.
    ///
    /// Ids with no matching item are skipped.
    pub async fn records_json(
        &self,
        kind: ItemKind,
        ids: &[ItemId],
    ) -> Result<Vec<serde_json::Value>> {
        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            let row: Option<(i64, String, i64, i64)> = sqlx::query_as(
                "SELECT id, data_json, created_at, updated_at FROM catalog_items
                 WHERE kind = ? AND id = ?",
            )
            .bind(kind.as_str())
            .bind(id)
            .fetch_optional(self.backend.pool())
            .await
            .sql_context("Failed to load catalog item")?;

            if let Some(row) = row {
                records.push(json_record(row)?);
            }
        }
        Ok(records)
    }
}

fn json_record(
    (id, data, created_at, updated_at): (i64, String, i64, i64),
) -> Result<serde_json::Value> {
    let mut value: serde_json::Value = backend::from_json(&data)?;
    let created_at = backend::timestamp("catalog_items", created_at)?;
    let updated_at = backend::timestamp("catalog_items", updated_at)?;
    if let Some(map) = value.as_object_mut() {
        map.insert("id".to_string(), id.into());
        map.insert("created_at".to_string(), serde_json::to_value(created_at)?);
        map.insert("updated_at".to_string(), serde_json::to_value(updated_at)?);
    }
    Ok(value)
}
