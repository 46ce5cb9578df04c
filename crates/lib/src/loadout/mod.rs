//! User-built loadouts.
//!
//! A loadout is a named helmet + armor + cape combination owned by one user.
//! Public loadouts are listed for everyone and can be liked and favorited;
//! private ones are only visible to their owner.

mod errors;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::backend::{self, SqlxResultExt};
use crate::catalog::{Catalog, ItemId, ItemKind, ListQuery, Page};
use crate::user::{User, UserError, UserId};

pub use errors::LoadoutError;

/// Identifier of a loadout.
pub type LoadoutId = i64;

/// Longest accepted loadout name, in characters.
pub const MAX_NAME_LEN: usize = 100;

/// Create or update request.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct NewLoadout {
    pub name: String,
    pub helmet_id: ItemId,
    pub armor_id: ItemId,
    pub cape_id: ItemId,
    #[serde(default)]
    pub is_public: bool,
}

/// A loadout as seen by one viewer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Loadout {
    pub id: LoadoutId,
    pub owner_id: UserId,
    pub owner_username: String,
    pub name: String,
    pub helmet_id: ItemId,
    pub armor_id: ItemId,
    pub cape_id: ItemId,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub like_count: i64,
    pub favorite_count: i64,
    pub is_liked: bool,
    pub is_favorited: bool,
    pub is_mine: bool,
}

/// Which loadouts a listing returns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListMode {
    /// Every public loadout.
    #[serde(alias = "community")]
    Public,
    /// The viewer's own loadouts, public or not.
    #[default]
    Mine,
    /// Public loadouts the viewer favorited.
    Favorites,
}

impl ListMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListMode::Public => "public",
            ListMode::Mine => "mine",
            ListMode::Favorites => "favorites",
        }
    }
}

impl fmt::Display for ListMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListMode {
    type Err = LoadoutError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "public" | "community" => Ok(ListMode::Public),
            "mine" => Ok(ListMode::Mine),
            "favorites" => Ok(ListMode::Favorites),
            _ => Err(LoadoutError::UnknownMode {
                value: s.to_string(),
            }),
        }
    }
}

/// Sort order of a listing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadoutOrdering {
    Newest,
    /// Likes plus favorites, newest first on ties.
    Popular,
}

/// Listing parameters.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct LoadoutQuery {
    #[serde(default)]
    pub mode: ListMode,
    /// Defaults to popular for public listings and newest otherwise.
    #[serde(default)]
    pub ordering: Option<LoadoutOrdering>,
    /// Matched against the loadout name and the owner's username.
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub page_size: Option<u32>,
}

/// Result of a like or favorite toggle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ToggleOutcome {
    /// Whether the viewer likes (or favorites) the loadout after the toggle.
    pub active: bool,
    pub like_count: i64,
    pub favorite_count: i64,
}

#[derive(Clone, Copy)]
enum Mark {
    Like,
    Favorite,
}

impl Mark {
    fn table(self) -> &'static str {
        match self {
            Mark::Like => "loadout_likes",
            Mark::Favorite => "loadout_favorites",
        }
    }
}

type Row = (
    i64,
    i64,
    String,
    String,
    i64,
    i64,
    i64,
    i64,
    i64,
    i64,
    i64,
    i64,
    i64,
    i64,
);

// Binds: viewer, viewer.
const SELECT: &str = "SELECT l.id, l.owner_id, u.username, l.name,
        l.helmet_id, l.armor_id, l.cape_id, l.is_public, l.created_at, l.updated_at,
        (SELECT COUNT(*) FROM loadout_likes k WHERE k.loadout_id = l.id) AS like_count,
        (SELECT COUNT(*) FROM loadout_favorites f WHERE f.loadout_id = l.id) AS favorite_count,
        EXISTS (SELECT 1 FROM loadout_likes k WHERE k.loadout_id = l.id AND k.user_id = ?),
        EXISTS (SELECT 1 FROM loadout_favorites f WHERE f.loadout_id = l.id AND f.user_id = ?)
    FROM loadouts l JOIN users u ON u.id = l.owner_id";

fn decode(row: Row, viewer: Option<UserId>) -> Result<Loadout> {
    let (
        id,
        owner_id,
        owner_username,
        name,
        helmet_id,
        armor_id,
        cape_id,
        is_public,
        created_at,
        updated_at,
        like_count,
        favorite_count,
        is_liked,
        is_favorited,
    ) = row;
    Ok(Loadout {
        id,
        owner_id,
        owner_username,
        name,
        helmet_id,
        armor_id,
        cape_id,
        is_public: is_public != 0,
        created_at: backend::timestamp("loadouts", created_at)?,
        updated_at: backend::timestamp("loadouts", updated_at)?,
        like_count,
        favorite_count,
        is_liked: is_liked != 0,
        is_favorited: is_favorited != 0,
        is_mine: viewer == Some(owner_id),
    })
}

/// Loadout service.
#[derive(Clone, Debug)]
pub struct Loadouts {
    catalog: Catalog,
}

impl Loadouts {
    pub(crate) fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    fn pool(&self) -> &sqlx::SqlitePool {
        self.catalog.backend().pool()
    }

    async fn validate(&self, loadout: &NewLoadout) -> Result<String> {
        let name = loadout.name.trim().to_string();
        if name.is_empty() {
            return Err(LoadoutError::EmptyName.into());
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(LoadoutError::NameTooLong { max: MAX_NAME_LEN }.into());
        }
        let components = [
            ("helmet_id", ItemKind::Helmet, loadout.helmet_id),
            ("armor_id", ItemKind::Armor, loadout.armor_id),
            ("cape_id", ItemKind::Cape, loadout.cape_id),
        ];
        for (field, expected, id) in components {
            if !self.catalog.item_exists(expected, id).await? {
                return Err(LoadoutError::InvalidComponent {
                    field,
                    expected,
                    id,
                }
                .into());
            }
        }
        Ok(name)
    }

    async fn fetch(&self, id: LoadoutId, viewer: Option<UserId>) -> Result<Option<Loadout>> {
        let row: Option<Row> = sqlx::query_as(&format!("{SELECT} WHERE l.id = ?"))
            .bind(viewer)
            .bind(viewer)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .sql_context("Failed to load loadout")?;
        row.map(|row| decode(row, viewer)).transpose()
    }

    /// Get a loadout. Private loadouts are only found by their owner.
    pub async fn get(&self, id: LoadoutId, viewer: Option<UserId>) -> Result<Loadout> {
        match self.fetch(id, viewer).await? {
            Some(loadout) if loadout.is_public || loadout.is_mine => Ok(loadout),
            _ => Err(LoadoutError::NotFound { id }.into()),
        }
    }

    /// Create a loadout owned by `owner`.
    pub async fn create(&self, owner: UserId, loadout: NewLoadout) -> Result<Loadout> {
        let name = self.validate(&loadout).await?;
        let now = self.catalog.clock().now_millis();
        let result = sqlx::query(
            "INSERT INTO loadouts
                (owner_id, name, helmet_id, armor_id, cape_id, is_public, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(owner)
        .bind(&name)
        .bind(loadout.helmet_id)
        .bind(loadout.armor_id)
        .bind(loadout.cape_id)
        .bind(i64::from(loadout.is_public))
        .bind(now)
        .bind(now)
        .execute(self.pool())
        .await
        .sql_context("Failed to insert loadout")?;

        let id = result.last_insert_rowid();
        tracing::debug!(loadout_id = id, owner, "Created loadout");
        self.get(id, Some(owner)).await
    }

    /// Replace a loadout's contents. Only the owner may do this.
    pub async fn update(
        &self,
        actor: UserId,
        id: LoadoutId,
        loadout: NewLoadout,
    ) -> Result<Loadout> {
        let existing = self.get(id, Some(actor)).await?;
        if !existing.is_mine {
            return Err(LoadoutError::PermissionDenied { id }.into());
        }
        let name = self.validate(&loadout).await?;

        sqlx::query(
            "UPDATE loadouts
             SET name = ?, helmet_id = ?, armor_id = ?, cape_id = ?, is_public = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&name)
        .bind(loadout.helmet_id)
        .bind(loadout.armor_id)
        .bind(loadout.cape_id)
        .bind(i64::from(loadout.is_public))
        .bind(self.catalog.clock().now_millis())
        .bind(id)
        .execute(self.pool())
        .await
        .sql_context("Failed to update loadout")?;

        self.get(id, Some(actor)).await
    }

    /// Delete a loadout. Allowed for its owner and for staff.
    pub async fn delete(&self, actor: &User, id: LoadoutId) -> Result<()> {
        let Some(existing) = self.fetch(id, Some(actor.id)).await? else {
            return Err(LoadoutError::NotFound { id }.into());
        };
        if !existing.is_mine {
            if !existing.is_public && !actor.is_staff {
                return Err(LoadoutError::NotFound { id }.into());
            }
            if !actor.is_staff {
                return Err(LoadoutError::PermissionDenied { id }.into());
            }
        }

        sqlx::query("DELETE FROM loadouts WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await
            .sql_context("Failed to delete loadout")?;
        tracing::debug!(loadout_id = id, actor = actor.id, "Deleted loadout");
        Ok(())
    }

    /// List loadouts for `viewer`.
    ///
    /// `Mine` and `Favorites` require a viewer.
    pub async fn list(
        &self,
        viewer: Option<UserId>,
        query: &LoadoutQuery,
    ) -> Result<Page<Loadout>> {
        let page = ListQuery {
            search: query.search.clone(),
            page: query.page,
            page_size: query.page_size,
        };
        let (limit, offset) = page.limit_offset()?;
        let pattern = page.like_pattern();

        let (mut filter, filter_user) = match (query.mode, viewer) {
            (ListMode::Public, _) => ("l.is_public = 1".to_string(), None),
            (ListMode::Mine, Some(user)) => ("l.owner_id = ?".to_string(), Some(user)),
            (ListMode::Favorites, Some(user)) => (
                "l.is_public = 1 AND EXISTS (SELECT 1 FROM loadout_favorites f
                    WHERE f.loadout_id = l.id AND f.user_id = ?)"
                    .to_string(),
                Some(user),
            ),
            (_, None) => return Err(UserError::NotAuthenticated.into()),
        };
        if pattern.is_some() {
            filter.push_str(
                " AND (l.name LIKE ? ESCAPE '\\' OR u.username LIKE ? ESCAPE '\\')",
            );
        }

        let ordering = query.ordering.unwrap_or(match query.mode {
            ListMode::Public => LoadoutOrdering::Popular,
            _ => LoadoutOrdering::Newest,
        });
        let order_by = match ordering {
            LoadoutOrdering::Newest => "l.created_at DESC, l.id DESC",
            LoadoutOrdering::Popular => {
                "(like_count + favorite_count) DESC, l.created_at DESC, l.id DESC"
            }
        };

        let count_sql = format!(
            "SELECT COUNT(*) FROM loadouts l JOIN users u ON u.id = l.owner_id WHERE {filter}"
        );
        let mut count_query = sqlx::query_as::<_, (i64,)>(&count_sql);
        if let Some(user) = filter_user {
            count_query = count_query.bind(user);
        }
        if let Some(pattern) = &pattern {
            count_query = count_query.bind(pattern.clone()).bind(pattern.clone());
        }
        let (count,) = count_query
            .fetch_one(self.pool())
            .await
            .sql_context("Failed to count loadouts")?;

        let select_sql = format!("{SELECT} WHERE {filter} ORDER BY {order_by} LIMIT ? OFFSET ?");
        let mut select_query = sqlx::query_as::<_, Row>(&select_sql).bind(viewer).bind(viewer);
        if let Some(user) = filter_user {
            select_query = select_query.bind(user);
        }
        if let Some(pattern) = &pattern {
            select_query = select_query.bind(pattern.clone()).bind(pattern.clone());
        }
        let rows = select_query
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool())
            .await
            .sql_context("Failed to list loadouts")?;

        let results = rows
            .into_iter()
            .map(|row| decode(row, viewer))
            .collect::<Result<Vec<_>>>()?;
        Ok(Page { count, results })
    }

    /// Like or unlike a visible loadout.
    pub async fn toggle_like(&self, user: UserId, id: LoadoutId) -> Result<ToggleOutcome> {
        self.toggle(Mark::Like, user, id).await
    }

    /// Favorite or unfavorite a visible loadout.
    pub async fn toggle_favorite(&self, user: UserId, id: LoadoutId) -> Result<ToggleOutcome> {
        self.toggle(Mark::Favorite, user, id).await
    }

    async fn toggle(&self, mark: Mark, user: UserId, id: LoadoutId) -> Result<ToggleOutcome> {
        self.get(id, Some(user)).await?;
        let table = mark.table();

        let inserted = sqlx::query(&format!(
            "INSERT INTO {table} (loadout_id, user_id) VALUES (?, ?) ON CONFLICT DO NOTHING"
        ))
        .bind(id)
        .bind(user)
        .execute(self.pool())
        .await
        .sql_context("Failed to add loadout mark")?
        .rows_affected()
            == 1;

        if !inserted {
            sqlx::query(&format!(
                "DELETE FROM {table} WHERE loadout_id = ? AND user_id = ?"
            ))
            .bind(id)
            .bind(user)
            .execute(self.pool())
            .await
            .sql_context("Failed to remove loadout mark")?;
        }

        let loadout = self.get(id, Some(user)).await?;
        Ok(ToggleOutcome {
            active: inserted,
            like_count: loadout.like_count,
            favorite_count: loadout.favorite_count,
        })
    }
}
