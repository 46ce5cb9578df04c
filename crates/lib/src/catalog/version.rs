use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::backend::{self, Backend, SqlxResultExt};
use crate::constants::GLOBAL_RESOURCE;
use crate::{Clock, Result};

/// Catalog-wide cache invalidation timestamp.
///
/// Clients cache catalog responses and compare against [`current`](Self::current)
/// to decide when to refetch.
#[derive(Clone, Debug)]
pub struct GlobalVersion {
    backend: Backend,
    clock: Arc<dyn Clock>,
}

impl GlobalVersion {
    pub(crate) fn new(backend: Backend, clock: Arc<dyn Clock>) -> Self {
        Self { backend, clock }
    }

    /// Record that the catalog changed now.
    pub async fn touch(&self) -> Result<DateTime<Utc>> {
        let now = self.clock.now_millis();
        sqlx::query(
            "INSERT INTO global_version (resource, updated_at) VALUES (?, ?)
             ON CONFLICT(resource) DO UPDATE SET updated_at = excluded.updated_at",
        )
        .bind(GLOBAL_RESOURCE)
        .bind(now)
        .execute(self.backend.pool())
        .await
        .sql_context("Failed to touch global version")?;
        backend::timestamp("global_version", now)
    }

    /// The last catalog change, initialized to now on first read.
    pub async fn current(&self) -> Result<DateTime<Utc>> {
        sqlx::query(
            "INSERT INTO global_version (resource, updated_at) VALUES (?, ?)
             ON CONFLICT DO NOTHING",
        )
        .bind(GLOBAL_RESOURCE)
        .bind(self.clock.now_millis())
        .execute(self.backend.pool())
        .await
        .sql_context("Failed to initialize global version")?;

        let (updated_at,): (i64,) =
            sqlx::query_as("SELECT updated_at FROM global_version WHERE resource = ?")
                .bind(GLOBAL_RESOURCE)
                .fetch_one(self.backend.pool())
                .await
                .sql_context("Failed to read global version")?;
        backend::timestamp("global_version", updated_at)
    }
}
