//! Database schema migrations
//!
//! Versioned upgrades for mapping stores written by earlier releases, which
//! kept a single mandatory `creator_id` per mapping, had no uniqueness rule
//! over the mapped pair and allowed several votes from the same user on one
//! mapping.
//!
//! # Migration Guidelines
//!
//! 1. **Never modify existing migrations** - they must stay stable for users upgrading
//! 2. **Always add new migrations** - one function per schema change
//! 3. **Keep them idempotent** - every migration checks before it changes anything

use crate::Result;
use sqlx::{Connection, SqliteConnection, SqlitePool};
use tracing::{info, warn};

/// Current schema version
///
/// **IMPORTANT:** Increment this when adding new migrations
const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Get current schema version from database
///
/// Returns 0 if schema_version table doesn't exist or has no rows
pub async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let table_exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM sqlite_master
            WHERE type='table' AND name='schema_version'
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        return Ok(0);
    }

    let version: Option<i32> =
        sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
            .fetch_optional(pool)
            .await?;

    Ok(version.unwrap_or(0))
}

async fn set_schema_version(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;

    Ok(())
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let current_version = get_schema_version(pool).await?;

    if current_version == CURRENT_SCHEMA_VERSION {
        info!("Database schema is up to date (v{})", current_version);
        return Ok(());
    }

    if current_version > CURRENT_SCHEMA_VERSION {
        warn!(
            "Database schema version ({}) is newer than code version ({})",
            current_version, CURRENT_SCHEMA_VERSION
        );
        return Ok(());
    }

    info!(
        "Running database migrations: v{} -> v{}",
        current_version, CURRENT_SCHEMA_VERSION
    );

    if current_version < 1 {
        migrate_v1(pool).await?;
        set_schema_version(pool, 1).await?;
        info!("Migration v1 completed");
    }

    if current_version < 2 {
        migrate_v2(pool).await?;
        set_schema_version(pool, 2).await?;
        info!("Migration v2 completed");
    }

    Ok(())
}

async fn has_column(pool: &SqlitePool, table: &str, column: &str) -> Result<bool> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM pragma_table_info(?) WHERE name = ?",
    )
    .bind(table)
    .bind(column)
    .fetch_one(pool)
    .await?;

    Ok(count > 0)
}

/// Whether `mappings` carries the UNIQUE constraint over the canonical pair and type
async fn has_unique_mapping_constraint(pool: &SqlitePool) -> Result<bool> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM pragma_index_list('mappings') WHERE \"unique\" = 1 AND origin = 'u'",
    )
    .fetch_one(pool)
    .await?;

    Ok(count > 0)
}

/// Migration v1: rebuild `mappings` into the many-to-many creator model
///
/// Earlier stores kept one mandatory `creator_id` per mapping and no
/// uniqueness rule over the pair. The table is rebuilt: creators move to
/// `mapping_creators`, duplicate rows collapse onto the lowest id (votes and
/// creators re-pointed, accepted if any duplicate was) and the UNIQUE
/// constraint is added.
async fn migrate_v1(pool: &SqlitePool) -> Result<()> {
    info!("Running migration v1: rebuild mappings with creator table and unique pairs");

    let legacy_creator = has_column(pool, "mappings", "creator_id").await?;
    if !legacy_creator && has_unique_mapping_constraint(pool).await? {
        info!("  mappings already in current layout - skipping");
        return Ok(());
    }

    // Dropping the old table must not cascade into votes and creators.
    // foreign_keys cannot change inside a transaction, so it is switched on
    // the one connection that runs the rebuild and restored afterwards.
    let mut conn = pool.acquire().await?;
    sqlx::query("PRAGMA foreign_keys = OFF")
        .execute(&mut *conn)
        .await?;
    let rebuilt = rebuild_mappings(&mut conn, legacy_creator).await;
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&mut *conn)
        .await?;
    drop(conn);
    rebuilt?;

    // Indexes went away with the old table
    crate::db::init::create_mappings_table(pool).await?;
    Ok(())
}

const PAIR_COLUMNS: &str = "service_1_name, service_1_pathway_id, service_1_pathway_name, \
     service_2_name, service_2_pathway_id, service_2_pathway_name, type";

async fn rebuild_mappings(conn: &mut SqliteConnection, legacy_creator: bool) -> Result<()> {
    let mut tx = conn.begin().await?;

    if legacy_creator {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO mapping_creators (mapping_id, user_id)
            SELECT m.id, m.creator_id
            FROM mappings m
            JOIN users u ON u.id = m.creator_id
            WHERE m.creator_id IS NOT NULL
            "#,
        )
        .execute(&mut *tx)
        .await?;
        info!("  Backfilled {} creator rows", result.rows_affected());
    }

    sqlx::query(
        r#"
        CREATE TABLE mappings_rebuilt (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            service_1_name TEXT NOT NULL,
            service_1_pathway_id TEXT NOT NULL,
            service_1_pathway_name TEXT NOT NULL,
            service_2_name TEXT NOT NULL,
            service_2_pathway_id TEXT NOT NULL,
            service_2_pathway_name TEXT NOT NULL,
            type TEXT NOT NULL CHECK (type IN ('equivalentTo', 'isPartOf')),
            accepted INTEGER NOT NULL DEFAULT 0,
            UNIQUE (
                service_1_name, service_1_pathway_id, service_1_pathway_name,
                service_2_name, service_2_pathway_id, service_2_pathway_name,
                type
            )
        )
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(&format!(
        "INSERT INTO mappings_rebuilt (id, {cols}, accepted) \
         SELECT MIN(id), {cols}, MAX(accepted) FROM mappings GROUP BY {cols}",
        cols = PAIR_COLUMNS
    ))
    .execute(&mut *tx)
    .await?;

    // Old id -> surviving id for every collapsed duplicate
    let survivor = r#"
        SELECT r.id FROM mappings m
        JOIN mappings_rebuilt r
          ON r.service_1_name = m.service_1_name
         AND r.service_1_pathway_id = m.service_1_pathway_id
         AND r.service_1_pathway_name = m.service_1_pathway_name
         AND r.service_2_name = m.service_2_name
         AND r.service_2_pathway_id = m.service_2_pathway_id
         AND r.service_2_pathway_name = m.service_2_pathway_name
         AND r.type = m.type
        WHERE m.id = {table}.mapping_id
    "#;
    for table in ["votes", "mapping_creators"] {
        sqlx::query(&format!(
            "UPDATE OR IGNORE {table} SET mapping_id = ({select}) \
             WHERE mapping_id NOT IN (SELECT id FROM mappings_rebuilt) \
               AND mapping_id IN (SELECT id FROM mappings)",
            table = table,
            select = survivor.replace("{table}", table)
        ))
        .execute(&mut *tx)
        .await?;

        // Rows that collided with an existing one on the survivor, or point nowhere
        let orphans = sqlx::query(&format!(
            "DELETE FROM {} WHERE mapping_id NOT IN (SELECT id FROM mappings_rebuilt)",
            table
        ))
        .execute(&mut *tx)
        .await?;
        if orphans.rows_affected() > 0 {
            warn!("  Removed {} {} rows of collapsed mappings", orphans.rows_affected(), table);
        }
    }

    let before: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM mappings")
        .fetch_one(&mut *tx)
        .await?;
    let after: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM mappings_rebuilt")
        .fetch_one(&mut *tx)
        .await?;

    sqlx::query("DROP TABLE mappings").execute(&mut *tx).await?;
    sqlx::query("ALTER TABLE mappings_rebuilt RENAME TO mappings")
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    if before > after {
        warn!("  Collapsed {} duplicate mappings", before - after);
    }
    info!("  Rebuilt mappings table ({} rows)", after);
    Ok(())
}

/// Migration v2: collapse duplicate votes and enforce one vote per user and mapping
///
/// The most recent vote (highest id) of each (user, mapping) pair survives.
async fn migrate_v2(pool: &SqlitePool) -> Result<()> {
    info!("Running migration v2: one vote per user and mapping");

    let result = sqlx::query(
        r#"
        DELETE FROM votes
        WHERE id NOT IN (
            SELECT MAX(id) FROM votes GROUP BY mapping_id, user_id
        )
        "#,
    )
    .execute(pool)
    .await?;

    if result.rows_affected() > 0 {
        warn!("  Removed {} duplicate votes", result.rows_affected());
    }

    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_votes_mapping_user ON votes(mapping_id, user_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
