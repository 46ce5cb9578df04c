//! SQL schema definitions and migrations.
//!
//! # Migration System
//!
//! Migrations are code-based functions rather than SQL files. Each migration
//! receives the backend and can run whatever statements it needs.
//!
//! ## Adding a New Migration
//!
//! 1. Increment `SCHEMA_VERSION`
//! 2. Add a new `migrate_vN_to_vM` async function
//! 3. Add the migration to the match statement in `run_migration`

use super::{Backend, BackendError, SqlxResultExt};
use crate::Result;

/// Current schema version.
///
/// Increment this when making schema changes that require migration.
pub const SCHEMA_VERSION: i64 = 1;

/// SQL statements to create the schema tables.
///
/// Timestamps are stored as BIGINT milliseconds since the Unix epoch.
pub const CREATE_TABLES: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS schema_version (
        version BIGINT PRIMARY KEY
    )",
    "CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE COLLATE NOCASE,
        email TEXT NOT NULL UNIQUE COLLATE NOCASE,
        password_hash TEXT NOT NULL,
        email_verified BIGINT NOT NULL DEFAULT 0,
        is_staff BIGINT NOT NULL DEFAULT 0,
        date_joined BIGINT NOT NULL,
        last_login BIGINT
    )",
    // Single-use tokens for email verification and password reset.
    // Only the SHA-256 of the token is stored.
    "CREATE TABLE IF NOT EXISTS user_tokens (
        token_hash TEXT PRIMARY KEY NOT NULL,
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        purpose TEXT NOT NULL,
        expires_at BIGINT NOT NULL,
        used_at BIGINT
    )",
    // Every catalog kind except armor sets shares this table. Kind-specific
    // fields live in data_json; name is duplicated for uniqueness and search.
    "CREATE TABLE IF NOT EXISTS catalog_items (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        kind TEXT NOT NULL,
        name TEXT NOT NULL,
        data_json TEXT NOT NULL,
        created_at BIGINT NOT NULL,
        updated_at BIGINT NOT NULL,
        UNIQUE (kind, name)
    )",
    "CREATE TABLE IF NOT EXISTS armor_sets (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        helmet_id INTEGER NOT NULL REFERENCES catalog_items(id) ON DELETE CASCADE,
        armor_id INTEGER NOT NULL REFERENCES catalog_items(id) ON DELETE CASCADE,
        cape_id INTEGER REFERENCES catalog_items(id) ON DELETE CASCADE,
        created_at BIGINT NOT NULL,
        updated_at BIGINT NOT NULL
    )",
    // Component-level relations, one logical store per item kind.
    "CREATE TABLE IF NOT EXISTS item_relations (
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        item_kind TEXT NOT NULL,
        item_id INTEGER NOT NULL REFERENCES catalog_items(id) ON DELETE CASCADE,
        relation_type TEXT NOT NULL,
        created_at BIGINT NOT NULL,
        PRIMARY KEY (user_id, item_kind, item_id, relation_type)
    )",
    "CREATE TABLE IF NOT EXISTS set_relations (
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        set_id INTEGER NOT NULL REFERENCES armor_sets(id) ON DELETE CASCADE,
        relation_type TEXT NOT NULL,
        created_at BIGINT NOT NULL,
        PRIMARY KEY (user_id, set_id, relation_type)
    )",
    "CREATE TABLE IF NOT EXISTS loadouts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        helmet_id INTEGER NOT NULL REFERENCES catalog_items(id) ON DELETE CASCADE,
        armor_id INTEGER NOT NULL REFERENCES catalog_items(id) ON DELETE CASCADE,
        cape_id INTEGER NOT NULL REFERENCES catalog_items(id) ON DELETE CASCADE,
        is_public BIGINT NOT NULL DEFAULT 0,
        created_at BIGINT NOT NULL,
        updated_at BIGINT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS loadout_likes (
        loadout_id INTEGER NOT NULL REFERENCES loadouts(id) ON DELETE CASCADE,
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        PRIMARY KEY (loadout_id, user_id)
    )",
    "CREATE TABLE IF NOT EXISTS loadout_favorites (
        loadout_id INTEGER NOT NULL REFERENCES loadouts(id) ON DELETE CASCADE,
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        PRIMARY KEY (loadout_id, user_id)
    )",
    // Cache invalidation timestamp bumped on every catalog mutation
    "CREATE TABLE IF NOT EXISTS global_version (
        resource TEXT PRIMARY KEY NOT NULL,
        updated_at BIGINT NOT NULL
    )",
];

/// SQL statements to create indexes.
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_catalog_items_kind_name ON catalog_items(kind, name)",
    // Reverse lookups for the set membership index
    "CREATE INDEX IF NOT EXISTS idx_armor_sets_helmet ON armor_sets(helmet_id)",
    "CREATE INDEX IF NOT EXISTS idx_armor_sets_armor ON armor_sets(armor_id)",
    "CREATE INDEX IF NOT EXISTS idx_armor_sets_cape ON armor_sets(cape_id)",
    "CREATE INDEX IF NOT EXISTS idx_item_relations_user_type ON item_relations(user_id, relation_type)",
    "CREATE INDEX IF NOT EXISTS idx_item_relations_item ON item_relations(item_kind, item_id, relation_type)",
    "CREATE INDEX IF NOT EXISTS idx_set_relations_user_type ON set_relations(user_id, relation_type)",
    "CREATE INDEX IF NOT EXISTS idx_set_relations_set ON set_relations(set_id, relation_type)",
    "CREATE INDEX IF NOT EXISTS idx_user_tokens_user ON user_tokens(user_id, purpose)",
    "CREATE INDEX IF NOT EXISTS idx_loadouts_owner ON loadouts(owner_id)",
    "CREATE INDEX IF NOT EXISTS idx_loadouts_public ON loadouts(is_public, created_at)",
];

/// Initialize the database schema.
///
/// Creates tables and indexes if they don't exist, and handles migrations
/// if the schema version has changed.
pub async fn initialize(backend: &Backend) -> Result<()> {
    let pool = backend.pool();

    for statement in CREATE_TABLES {
        sqlx::query(statement)
            .execute(pool)
            .await
            .sql_context(&format!("Schema creation failed - SQL: {statement}"))?;
    }

    let row: Option<(i64,)> = sqlx::query_as("SELECT version FROM schema_version")
        .fetch_optional(pool)
        .await
        .sql_context("Failed to check schema version")?;

    match row {
        None => {
            sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
                .bind(SCHEMA_VERSION)
                .execute(pool)
                .await
                .sql_context("Failed to initialize schema version")?;
        }
        Some((current,)) if current < SCHEMA_VERSION => {
            migrate(backend, current, SCHEMA_VERSION).await?;
        }
        Some((current,)) if current > SCHEMA_VERSION => {
            return Err(BackendError::MigrationFailed {
                reason: format!(
                    "database schema v{current} is newer than supported v{SCHEMA_VERSION}"
                ),
            }
            .into());
        }
        Some(_) => {}
    }

    for statement in CREATE_INDEXES {
        sqlx::query(statement)
            .execute(pool)
            .await
            .sql_context(&format!("Index creation failed - SQL: {statement}"))?;
    }

    Ok(())
}

/// Run migrations sequentially from one schema version to another.
async fn migrate(backend: &Backend, from: i64, to: i64) -> Result<()> {
    tracing::info!(from, to, "Starting SQL schema migration");

    let mut current = from;
    while current < to {
        let next = current + 1;
        tracing::info!(from = current, to = next, "Running migration");

        run_migration(backend, current, next).await?;

        sqlx::query("UPDATE schema_version SET version = ?")
            .bind(next)
            .execute(backend.pool())
            .await
            .sql_context(&format!("Failed to update schema version to {next}"))?;

        current = next;
    }

    tracing::info!(from, to, "All migrations completed successfully");
    Ok(())
}

/// Execute a single migration step.
async fn run_migration(backend: &Backend, from: i64, to: i64) -> Result<()> {
    // No migrations exist yet; v1 is the first released schema.
    let _ = backend;

    Err(BackendError::MigrationFailed {
        reason: format!(
            "Unknown migration path: v{from} to v{to}. \
             This likely means SCHEMA_VERSION was incremented without adding a migration."
        ),
    }
    .into())
}
