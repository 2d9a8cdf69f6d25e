//! User and role persistence
//!
//! Users are opaque curator/voter identities; the `admin` role unlocks
//! force-acceptance and bulk deletion.

use crate::auth::{hash_password, verify_password};
use crate::db::mappings::{mapping_from_row, Mapping};
use crate::db::votes::{vote_from_row, Vote};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::{info, warn};

/// Name of the administrator role
pub const ADMIN_ROLE: &str = "admin";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub active: bool,
    pub confirmed_at: Option<DateTime<Utc>>,
}

/// Everything a user has done in the curation interface
#[derive(Debug, Clone, Serialize)]
pub struct UserActivity {
    pub user: User,
    pub roles: Vec<String>,
    pub mappings: Vec<Mapping>,
    pub votes: Vec<Vote>,
}

fn user_from_row(row: &SqliteRow) -> User {
    User {
        id: row.get("id"),
        email: row.get("email"),
        active: row.get("active"),
        confirmed_at: row.get("confirmed_at"),
    }
}

pub async fn get_user_by_id(pool: &SqlitePool, user_id: i64) -> Result<Option<User>> {
    let row = sqlx::query("SELECT id, email, active, confirmed_at FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.as_ref().map(user_from_row))
}

pub async fn get_user_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let row = sqlx::query("SELECT id, email, active, confirmed_at FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await?;

    Ok(row.as_ref().map(user_from_row))
}

pub async fn list_users(pool: &SqlitePool) -> Result<Vec<User>> {
    let rows = sqlx::query("SELECT id, email, active, confirmed_at FROM users ORDER BY id")
        .fetch_all(pool)
        .await?;

    Ok(rows.iter().map(user_from_row).collect())
}

pub async fn count_users(pool: &SqlitePool) -> Result<i64> {
    Ok(sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?)
}

/// Create a confirmed user, returning `(user, created)`
///
/// An existing account keeps its password, except a provisioned account
/// (empty hash) which receives the given one.
pub async fn make_user(pool: &SqlitePool, email: &str, password: &str) -> Result<(User, bool)> {
    let email = email.trim();
    if email.is_empty() {
        return Err(Error::InvalidInput("email must not be empty".to_string()));
    }

    let existing: Option<(i64, String)> =
        sqlx::query_as("SELECT id, password_hash FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(pool)
            .await?;

    if let Some((user_id, stored_hash)) = existing {
        if stored_hash.is_empty() {
            sqlx::query("UPDATE users SET password_hash = ?, confirmed_at = ? WHERE id = ?")
                .bind(hash_password(password)?)
                .bind(Utc::now())
                .bind(user_id)
                .execute(pool)
                .await?;
            info!("Set password for provisioned user {}", email);
        }
        let user = get_user_by_id(pool, user_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("user {}", user_id)))?;
        return Ok((user, false));
    }

    let result = sqlx::query(
        "INSERT INTO users (email, password_hash, active, confirmed_at) VALUES (?, ?, 1, ?)",
    )
    .bind(email)
    .bind(hash_password(password)?)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    info!("Created user {}", email);
    let user = get_user_by_id(pool, result.last_insert_rowid())
        .await?
        .ok_or_else(|| Error::Internal(format!("user {} vanished after insert", email)))?;
    Ok((user, true))
}

/// Create an account with a placeholder password for a curation import
pub async fn provision_user(pool: &SqlitePool, email: &str) -> Result<User> {
    sqlx::query("INSERT OR IGNORE INTO users (email, password_hash, active) VALUES (?, '', 1)")
        .bind(email)
        .execute(pool)
        .await?;

    warn!(
        "Curator {} did not exist and was created with a placeholder password; \
         run make-user to set one",
        email
    );

    get_user_by_email(pool, email)
        .await?
        .ok_or_else(|| Error::Internal(format!("user {} vanished after insert", email)))
}

/// Check credentials; inactive accounts never authenticate
pub async fn authenticate(pool: &SqlitePool, email: &str, password: &str) -> Result<Option<User>> {
    let row = sqlx::query(
        "SELECT id, email, active, confirmed_at, password_hash FROM users WHERE email = ?",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let stored_hash: String = row.get("password_hash");
    let user = user_from_row(&row);
    if !user.active || !verify_password(password, &stored_hash) {
        return Ok(None);
    }

    Ok(Some(user))
}

/// Role id, creating the role when missing
pub async fn find_or_create_role(pool: &SqlitePool, name: &str) -> Result<i64> {
    sqlx::query("INSERT OR IGNORE INTO roles (name) VALUES (?)")
        .bind(name)
        .execute(pool)
        .await?;

    Ok(sqlx::query_scalar("SELECT id FROM roles WHERE name = ?")
        .bind(name)
        .fetch_one(pool)
        .await?)
}

pub async fn add_role_to_user(pool: &SqlitePool, user_id: i64, role: &str) -> Result<()> {
    let role_id = find_or_create_role(pool, role).await?;
    sqlx::query("INSERT OR IGNORE INTO user_roles (user_id, role_id) VALUES (?, ?)")
        .bind(user_id)
        .bind(role_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Grant the admin role to an existing user
pub async fn make_admin(pool: &SqlitePool, email: &str) -> Result<User> {
    let user = get_user_by_email(pool, email)
        .await?
        .ok_or_else(|| Error::NotFound(format!("user {}", email)))?;

    add_role_to_user(pool, user.id, ADMIN_ROLE).await?;
    info!("Granted {} role to {}", ADMIN_ROLE, email);
    Ok(user)
}

pub async fn roles_of(pool: &SqlitePool, user_id: i64) -> Result<Vec<String>> {
    Ok(sqlx::query_scalar(
        r#"
        SELECT r.name FROM roles r
        JOIN user_roles ur ON ur.role_id = r.id
        WHERE ur.user_id = ?
        ORDER BY r.name
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?)
}

pub async fn is_admin(pool: &SqlitePool, user_id: i64) -> Result<bool> {
    Ok(roles_of(pool, user_id).await?.iter().any(|role| role == ADMIN_ROLE))
}

/// Mappings created and votes cast by a user
pub async fn user_activity(pool: &SqlitePool, user_id: i64) -> Result<Option<UserActivity>> {
    let Some(user) = get_user_by_id(pool, user_id).await? else {
        return Ok(None);
    };

    let mapping_rows = sqlx::query(
        r#"
        SELECT m.* FROM mappings m
        JOIN mapping_creators c ON c.mapping_id = m.id
        WHERE c.user_id = ?
        ORDER BY m.id
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    let mappings = mapping_rows
        .iter()
        .map(mapping_from_row)
        .collect::<Result<Vec<_>>>()?;

    let vote_rows = sqlx::query("SELECT * FROM votes WHERE user_id = ? ORDER BY id")
        .bind(user_id)
        .fetch_all(pool)
        .await?;
    let votes = vote_rows.iter().map(vote_from_row).collect();

    Ok(Some(UserActivity {
        roles: roles_of(pool, user_id).await?,
        user,
        mappings,
        votes,
    }))
}
