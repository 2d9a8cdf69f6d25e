//! Database initialization
//!
//! Creates the SQLite file on first run, applies the schema idempotently,
//! runs versioned migrations and ensures default settings exist.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Open (creating if needed) the database and bring its schema up to date
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // foreign_keys is a per-connection pragma, so it lives on the connect options
    let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", db_path.display()))?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(5000));

    // Curation traffic is human-paced; a small pool is enough
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;

    // Versioned migrations for databases created by older releases
    crate::db::migrations::run_migrations(&pool).await?;

    crate::db::settings::init_default_settings(&pool).await?;

    Ok(pool)
}

/// Create every table (idempotent)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_schema_version_table(pool).await?;
    create_settings_table(pool).await?;
    create_users_table(pool).await?;
    create_roles_tables(pool).await?;
    create_mappings_table(pool).await?;
    create_mapping_creators_table(pool).await?;
    create_votes_table(pool).await?;
    Ok(())
}

/// Drop every table, children first
pub async fn drop_schema(pool: &SqlitePool) -> Result<()> {
    for table in [
        "votes",
        "mapping_creators",
        "mappings",
        "user_roles",
        "roles",
        "users",
        "settings",
        "schema_version",
    ] {
        sqlx::query(&format!("DROP TABLE IF EXISTS {}", table))
            .execute(pool)
            .await?;
    }
    info!("Dropped all ComPath tables");
    Ok(())
}

/// Drop and recreate the store, leaving it empty but usable
pub async fn reset_database(pool: &SqlitePool) -> Result<()> {
    drop_schema(pool).await?;
    create_schema(pool).await?;
    crate::db::migrations::run_migrations(pool).await?;
    crate::db::settings::init_default_settings(pool).await?;
    Ok(())
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    // An empty password_hash marks a provisioned account that cannot log in
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL DEFAULT '',
            active INTEGER NOT NULL DEFAULT 1,
            confirmed_at TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_roles_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS roles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            description TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_roles (
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            role_id INTEGER NOT NULL REFERENCES roles(id) ON DELETE CASCADE,
            PRIMARY KEY (user_id, role_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub(crate) async fn create_mappings_table(pool: &SqlitePool) -> Result<()> {
    // The UNIQUE clause backs the one-row-per-canonical-pair invariant
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS mappings (
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
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_mappings_side_1 ON mappings(service_1_name, service_1_pathway_id)",
    )
    .execute(pool)
    .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_mappings_side_2 ON mappings(service_2_name, service_2_pathway_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_mapping_creators_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS mapping_creators (
            mapping_id INTEGER NOT NULL REFERENCES mappings(id) ON DELETE CASCADE,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            PRIMARY KEY (mapping_id, user_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_votes_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS votes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            mapping_id INTEGER NOT NULL REFERENCES mappings(id) ON DELETE CASCADE,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            type INTEGER NOT NULL DEFAULT 1,
            changed TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (mapping_id, user_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_votes_user ON votes(user_id)")
        .execute(pool)
        .await?;

    Ok(())
}
