//! SQLite storage backend.
//!
//! All persistent state (catalog, relations, users, loadouts) lives in a single
//! SQLite database accessed through a sqlx connection pool. The schema is
//! defined in code in the [`schema`] module and initialized on connect.

mod errors;

/// Schema definition and migration system.
pub mod schema;

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};

use crate::Result;

pub use errors::BackendError;

/// Extension trait for sqlx Result types to simplify error handling.
///
/// Similar to `anyhow::Context`, this trait adds a method to convert
/// sqlx errors to `BackendError::SqlxError` with a context message.
pub(crate) trait SqlxResultExt<T> {
    /// Convert sqlx error to BackendError with context message.
    fn sql_context(self, context: &str) -> Result<T>;
}

impl<T> SqlxResultExt<T> for std::result::Result<T, sqlx::Error> {
    fn sql_context(self, context: &str) -> Result<T> {
        self.map_err(|e| {
            BackendError::SqlxError {
                reason: format!("{context}: {e}"),
                source: Some(e),
            }
            .into()
        })
    }
}

/// Decode a BIGINT millisecond column into a UTC timestamp.
pub(crate) fn timestamp(table: &'static str, millis: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis).ok_or_else(|| {
        BackendError::CorruptRow {
            table,
            reason: format!("timestamp out of range: {millis}"),
        }
        .into()
    })
}

/// Serialize a value for a JSON text column.
pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value)
        .map_err(|source| BackendError::SerializationFailed { source }.into())
}

/// Deserialize a JSON text column.
pub(crate) fn from_json<T: DeserializeOwned>(data: &str) -> Result<T> {
    serde_json::from_str(data)
        .map_err(|source| BackendError::DeserializationFailed { source }.into())
}

/// Handle to the SQLite database.
///
/// Cheap to clone; the underlying pool is reference counted.
#[derive(Clone, Debug)]
pub struct Backend {
    pool: SqlitePool,
}

impl Backend {
    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Open a SQLite database at the given path.
    ///
    /// Creates the database file and schema if they don't exist.
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        // File-based SQLite:
        // - journal_mode=WAL: Write-Ahead Logging for better concurrency
        // - synchronous=NORMAL: Balanced durability (safe with WAL)
        // - busy_timeout=5000: Wait up to 5s for locks before failing
        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5))
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .sql_context("Failed to connect to SQLite")?;

        tracing::info!(path = %path.as_ref().display(), "Opened SQLite database");
        Self::from_pool(pool).await
    }

    /// Create an in-memory database.
    ///
    /// The database exists only for the lifetime of this backend. Useful for
    /// testing.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .sql_context("Invalid in-memory SQLite URL")?
            .foreign_keys(true);

        // A single connection that is never recycled: every new connection to
        // `:memory:` would see a fresh, empty database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .sql_context("Failed to create in-memory SQLite")?;

        Self::from_pool(pool).await
    }

    async fn from_pool(pool: SqlitePool) -> Result<Self> {
        let backend = Self { pool };
        schema::initialize(&backend).await?;
        Ok(backend)
    }

    /// Close all pooled connections.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
