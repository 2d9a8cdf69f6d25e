//! Runtime settings stored in the `settings` table

use crate::model::VOTE_ACCEPTANCE;
use crate::{Error, Result};
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Key of the up-vote quorum setting
pub const VOTE_ACCEPTANCE_KEY: &str = "vote_acceptance";

/// Ensure every runtime setting exists with its default value
pub async fn init_default_settings(pool: &SqlitePool) -> Result<()> {
    ensure_setting(pool, VOTE_ACCEPTANCE_KEY, &VOTE_ACCEPTANCE.to_string()).await?;
    Ok(())
}

/// Ensure a setting exists with the specified default value
///
/// A missing setting is created; a NULL one is reset to the default.
async fn ensure_setting(pool: &SqlitePool, key: &str, default_value: &str) -> Result<()> {
    let value: Option<Option<String>> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(pool)
            .await?;

    match value {
        None => {
            sqlx::query("INSERT OR IGNORE INTO settings (key, value) VALUES (?, ?)")
                .bind(key)
                .bind(default_value)
                .execute(pool)
                .await?;
            info!("Initialized setting '{}' with default value: {}", key, default_value);
        }
        Some(None) => {
            set_setting(pool, key, default_value).await?;
            warn!("Setting '{}' was NULL, reset to default: {}", key, default_value);
        }
        Some(Some(_)) => {}
    }

    Ok(())
}

pub async fn get_setting(pool: &SqlitePool, key: &str) -> Result<Option<String>> {
    let value: Option<Option<String>> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(pool)
            .await?;

    Ok(value.flatten())
}

pub async fn set_setting(pool: &SqlitePool, key: &str, value: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO settings (key, value, updated_at) VALUES (?, ?, CURRENT_TIMESTAMP)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;

    Ok(())
}

/// Up-vote quorum for automatic acceptance
pub async fn load_vote_acceptance(pool: &SqlitePool) -> Result<i64> {
    match get_setting(pool, VOTE_ACCEPTANCE_KEY).await? {
        Some(value) => {
            let quorum = value.trim().parse::<i64>().map_err(|e| {
                Error::Config(format!("Invalid {} '{}': {}", VOTE_ACCEPTANCE_KEY, value, e))
            })?;
            if quorum < 1 {
                return Err(Error::Config(format!(
                    "{} must be at least 1, got {}",
                    VOTE_ACCEPTANCE_KEY, quorum
                )));
            }
            Ok(quorum)
        }
        None => Ok(VOTE_ACCEPTANCE),
    }
}
