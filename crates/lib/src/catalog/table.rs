use std::marker::PhantomData;

use super::{Catalog, CatalogError, CatalogItem, ItemId, ListQuery, Page, Record};
use crate::Result;
use crate::backend::{self, SqlxResultExt};

/// A typed view over one item kind in `catalog_items`.
///
/// # Type Parameters
/// - `T`: The item body, serialized to the `data_json` column
///
/// Writes validate the item name and its foreign references, map name
/// collisions to [`CatalogError::DuplicateName`] and touch the global version.
pub struct CatalogTable<T: CatalogItem> {
    catalog: Catalog,
    phantom: PhantomData<T>,
}

type Row = (i64, String, i64, i64);

impl<T: CatalogItem> CatalogTable<T> {
    pub(crate) fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            phantom: PhantomData,
        }
    }

    fn decode(row: Row) -> Result<Record<T>> {
        let (id, data, created_at, updated_at) = row;
        Ok(Record {
            id,
            item: backend::from_json(&data)?,
            created_at: backend::timestamp("catalog_items", created_at)?,
            updated_at: backend::timestamp("catalog_items", updated_at)?,
        })
    }

    fn not_found(id: ItemId) -> CatalogError {
        CatalogError::ItemNotFound {
            kind: T::KIND.as_str(),
            id,
        }
    }

    /// Retrieves an item by id.
    ///
    /// # Errors
    /// * [`CatalogError::ItemNotFound`] if no item of this kind has the id
    pub async fn get(&self, id: ItemId) -> Result<Record<T>> {
        let row: Option<Row> = sqlx::query_as(
            "SELECT id, data_json, created_at, updated_at FROM catalog_items
             WHERE kind = ? AND id = ?",
        )
        .bind(T::KIND.as_str())
        .bind(id)
        .fetch_optional(self.catalog.backend().pool())
        .await
        .sql_context("Failed to load catalog item")?;

        match row {
            Some(row) => Self::decode(row),
            None => Err(Self::not_found(id).into()),
        }
    }

    /// Lists items ordered by name, filtered by the query's search term.
    pub async fn list(&self, query: &ListQuery) -> Result<Page<Record<T>>> {
        let (limit, offset) = query.limit_offset()?;
        let pattern = query.like_pattern();
        let pool = self.catalog.backend().pool();

        const FILTER: &str = "kind = ? AND (? IS NULL
            OR name LIKE ? ESCAPE '\\'
            OR json_extract(data_json, '$.name_pt_br') LIKE ? ESCAPE '\\')";

        let (count,): (i64,) =
            sqlx::query_as(&format!("SELECT COUNT(*) FROM catalog_items WHERE {FILTER}"))
                .bind(T::KIND.as_str())
                .bind(&pattern)
                .bind(&pattern)
                .bind(&pattern)
                .fetch_one(pool)
                .await
                .sql_context("Failed to count catalog items")?;

        let rows: Vec<Row> = sqlx::query_as(&format!(
            "SELECT id, data_json, created_at, updated_at FROM catalog_items
             WHERE {FILTER} ORDER BY name COLLATE NOCASE, id LIMIT ? OFFSET ?"
        ))
        .bind(T::KIND.as_str())
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .sql_context("Failed to list catalog items")?;

        let results = rows
            .into_iter()
            .map(Self::decode)
            .collect::<Result<Vec<_>>>()?;
        Ok(Page { count, results })
    }

    async fn validate(&self, item: &T) -> Result<String> {
        let name = item.name().trim();
        if name.is_empty() {
            return Err(CatalogError::EmptyName {
                kind: T::KIND.as_str(),
            }
            .into());
        }
        for (field, kind, id) in item.references() {
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

    fn map_duplicate(&self, name: &str, err: crate::Error) -> crate::Error {
        match &err {
            crate::Error::Backend(b) if b.is_unique_violation() => CatalogError::DuplicateName {
                kind: T::KIND.as_str(),
                name: name.to_string(),
            }
            .into(),
            _ => err,
        }
    }

    /// Inserts a new item and returns the stored record.
    pub async fn insert(&self, item: T) -> Result<Record<T>> {
        let name = self.validate(&item).await?;
        let data = backend::to_json(&item)?;
        let now = self.catalog.clock().now_millis();

        let result = sqlx::query(
            "INSERT INTO catalog_items (kind, name, data_json, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(T::KIND.as_str())
        .bind(&name)
        .bind(&data)
        .bind(now)
        .bind(now)
        .execute(self.catalog.backend().pool())
        .await
        .sql_context("Failed to insert catalog item")
        .map_err(|e| self.map_duplicate(&name, e))?;

        let id = result.last_insert_rowid();
        tracing::debug!(kind = %T::KIND, id, name = %name, "Inserted catalog item");
        self.catalog.version().touch().await?;
        self.get(id).await
    }

    /// Replaces the body of an existing item.
    pub async fn update(&self, id: ItemId, item: T) -> Result<Record<T>> {
        let name = self.validate(&item).await?;
        let data = backend::to_json(&item)?;
        let now = self.catalog.clock().now_millis();

        let result = sqlx::query(
            "UPDATE catalog_items SET name = ?, data_json = ?, updated_at = ?
             WHERE kind = ? AND id = ?",
        )
        .bind(&name)
        .bind(&data)
        .bind(now)
        .bind(T::KIND.as_str())
        .bind(id)
        .execute(self.catalog.backend().pool())
        .await
        .sql_context("Failed to update catalog item")
        .map_err(|e| self.map_duplicate(&name, e))?;

        if result.rows_affected() == 0 {
            return Err(Self::not_found(id).into());
        }
        self.catalog.version().touch().await?;
        self.get(id).await
    }

    /// Deletes an item.
    ///
    /// Armor sets, relations and loadouts that reference the item are removed
    /// by the database's cascading foreign keys.
    pub async fn delete(&self, id: ItemId) -> Result<()> {
        let result = sqlx::query("DELETE FROM catalog_items WHERE kind = ? AND id = ?")
            .bind(T::KIND.as_str())
            .bind(id)
            .execute(self.catalog.backend().pool())
            .await
            .sql_context("Failed to delete catalog item")?;

        if result.rows_affected() == 0 {
            return Err(Self::not_found(id).into());
        }
        tracing::debug!(kind = %T::KIND, id, "Deleted catalog item");
        self.catalog.version().touch().await?;
        Ok(())
    }
}
