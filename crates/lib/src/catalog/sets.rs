//! Armor sets: a named helmet + armor + optional cape bundle.

use serde::{Deserialize, Serialize};

use super::items::{Armor, Cape, Helmet};
use super::{Catalog, CatalogError, CatalogTable, ItemId, ItemKind, ListQuery, Page, Record, SetId};
use crate::Result;
use crate::backend::{self, SqlxResultExt};

/// Body of an armor set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArmorSet {
    pub name: String,
    pub helmet_id: ItemId,
    pub armor_id: ItemId,
    #[serde(default)]
    pub cape_id: Option<ItemId>,
}

/// Cost breakdown of an armor set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SetCost {
    pub helmet: i64,
    pub armor: i64,
    /// Zero when the set has no cape.
    pub cape: i64,
    pub total: i64,
}

type Row = (i64, String, i64, i64, Option<i64>, i64, i64);

const SELECT: &str =
    "SELECT id, name, helmet_id, armor_id, cape_id, created_at, updated_at FROM armor_sets";

/// CRUD over the `armor_sets` table.
pub struct ArmorSets {
    catalog: Catalog,
}

impl ArmorSets {
    pub(crate) fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    fn decode(row: Row) -> Result<Record<ArmorSet>> {
        let (id, name, helmet_id, armor_id, cape_id, created_at, updated_at) = row;
        Ok(Record {
            id,
            item: ArmorSet {
                name,
                helmet_id,
                armor_id,
                cape_id,
            },
            created_at: backend::timestamp("armor_sets", created_at)?,
            updated_at: backend::timestamp("armor_sets", updated_at)?,
        })
    }

    fn not_found(id: SetId) -> CatalogError {
        CatalogError::ItemNotFound {
            kind: "armor_set",
            id,
        }
    }

    pub async fn exists(&self, id: SetId) -> Result<bool> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM armor_sets WHERE id = ?")
            .bind(id)
            .fetch_optional(self.catalog.backend().pool())
            .await
            .sql_context("Failed to check armor set")?;
        Ok(row.is_some())
    }

    pub async fn get(&self, id: SetId) -> Result<Record<ArmorSet>> {
        let row: Option<Row> = sqlx::query_as(&format!("{SELECT} WHERE id = ?"))
            .bind(id)
            .fetch_optional(self.catalog.backend().pool())
            .await
            .sql_context("Failed to load armor set")?;
        match row {
            Some(row) => Self::decode(row),
            None => Err(Self::not_found(id).into()),
        }
    }

    /// Lists sets ordered by name, optionally filtered by name.
    pub async fn list(&self, query: &ListQuery) -> Result<Page<Record<ArmorSet>>> {
        let (limit, offset) = query.limit_offset()?;
        let pattern = query.like_pattern();
        let pool = self.catalog.backend().pool();

        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM armor_sets WHERE ? IS NULL OR name LIKE ? ESCAPE '\\'",
        )
        .bind(&pattern)
        .bind(&pattern)
        .fetch_one(pool)
        .await
        .sql_context("Failed to count armor sets")?;

        let rows: Vec<Row> = sqlx::query_as(&format!(
            "{SELECT} WHERE ? IS NULL OR name LIKE ? ESCAPE '\\'
             ORDER BY name COLLATE NOCASE, id LIMIT ? OFFSET ?"
        ))
        .bind(&pattern)
        .bind(&pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .sql_context("Failed to list armor sets")?;

        let results = rows
            .into_iter()
            .map(Self::decode)
            .collect::<Result<Vec<_>>>()?;
        Ok(Page { count, results })
    }

    async fn validate(&self, set: &ArmorSet) -> Result<String> {
        let name = set.name.trim();
        if name.is_empty() {
            return Err(CatalogError::EmptyName { kind: "armor_set" }.into());
        }
        let mut refs = vec![
            ("helmet_id", ItemKind::Helmet, set.helmet_id),
            ("armor_id", ItemKind::Armor, set.armor_id),
        ];
        if let Some(cape) = set.cape_id {
            refs.push(("cape_id", ItemKind::Cape, cape));
        }
        for (field, kind, id) in refs {
            if !self.catalog.item_exists(kind, id).await? {
                return Err(CatalogError::InvalidReference {
                    field,
                    expected: kind.as_str(),
                    id,
                }
                .into());
            }
        }
        Ok(name.to_string())
    }

    fn map_duplicate(name: &str, err: crate::Error) -> crate::Error {
        match &err {
            crate::Error::Backend(b) if b.is_unique_violation() => CatalogError::DuplicateName {
                kind: "armor_set",
                name: name.to_string(),
            }
            .into(),
            _ => err,
        }
    }

    pub async fn insert(&self, set: ArmorSet) -> Result<Record<ArmorSet>> {
        let name = self.validate(&set).await?;
        let now = self.catalog.clock().now_millis();

        let result = sqlx::query(
            "INSERT INTO armor_sets (name, helmet_id, armor_id, cape_id, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&name)
        .bind(set.helmet_id)
        .bind(set.armor_id)
        .bind(set.cape_id)
        .bind(now)
        .bind(now)
        .execute(self.catalog.backend().pool())
        .await
        .sql_context("Failed to insert armor set")
        .map_err(|e| Self::map_duplicate(&name, e))?;

        let id = result.last_insert_rowid();
        tracing::debug!(id, name = %name, "Inserted armor set");
        self.catalog.version().touch().await?;
        self.get(id).await
    }

    pub async fn update(&self, id: SetId, set: ArmorSet) -> Result<Record<ArmorSet>> {
        let name = self.validate(&set).await?;
        let now = self.catalog.clock().now_millis();

        let result = sqlx::query(
            "UPDATE armor_sets
             SET name = ?, helmet_id = ?, armor_id = ?, cape_id = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&name)
        .bind(set.helmet_id)
        .bind(set.armor_id)
        .bind(set.cape_id)
        .bind(now)
        .bind(id)
        .execute(self.catalog.backend().pool())
        .await
        .sql_context("Failed to update armor set")
        .map_err(|e| Self::map_duplicate(&name, e))?;

        if result.rows_affected() == 0 {
            return Err(Self::not_found(id).into());
        }
        self.catalog.version().touch().await?;
        self.get(id).await
    }

    /// Deletes a set. Set relations on it go with it.
    pub async fn delete(&self, id: SetId) -> Result<()> {
        let result = sqlx::query("DELETE FROM armor_sets WHERE id = ?")
            .bind(id)
            .execute(self.catalog.backend().pool())
            .await
            .sql_context("Failed to delete armor set")?;

        if result.rows_affected() == 0 {
            return Err(Self::not_found(id).into());
        }
        self.catalog.version().touch().await?;
        Ok(())
    }

    /// Sums the component costs of a set, counting a missing cape as free.
    pub async fn total_cost(&self, id: SetId) -> Result<SetCost> {
        let set = self.get(id).await?.item;
        let helmet = CatalogTable::<Helmet>::new(self.catalog.clone())
            .get(set.helmet_id)
            .await?
            .item
            .cost;
        let armor = CatalogTable::<Armor>::new(self.catalog.clone())
            .get(set.armor_id)
            .await?
            .item
            .cost;
        let cape = match set.cape_id {
            Some(cape_id) => {
                CatalogTable::<Cape>::new(self.catalog.clone())
                    .get(cape_id)
                    .await?
                    .item
                    .cost
            }
            None => 0,
        };
        Ok(SetCost {
            helmet,
            armor,
            cape,
            total: helmet + armor + cape,
        })
    }
}
