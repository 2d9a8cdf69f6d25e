//! Administrative endpoints; every handler requires the admin role

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use compath_common::db::init::reset_database;
use compath_common::db::mappings::delete_all_mappings;
use compath_common::db::users::{self, User, UserActivity};
use serde::Serialize;
use tracing::warn;

use super::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: u64,
}

/// DELETE /api/admin/mappings
pub async fn delete_mappings(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Json<DeleteResponse>> {
    current.require_admin()?;

    let deleted = delete_all_mappings(&state.ctx.db).await?;
    warn!("{} deleted all {} mappings", current.user.email, deleted);
    Ok(Json(DeleteResponse { deleted }))
}

#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub status: String,
}

/// DELETE /api/admin/database
///
/// Drops and recreates the store. User accounts are deleted too, including
/// the caller's.
pub async fn reset_store(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Json<ResetResponse>> {
    current.require_admin()?;

    warn!("{} reset the database", current.user.email);
    reset_database(&state.ctx.db).await?;
    Ok(Json(ResetResponse {
        status: "reset".to_string(),
    }))
}

/// GET /api/admin/users
pub async fn list_users(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Json<Vec<User>>> {
    current.require_admin()?;
    Ok(Json(users::list_users(&state.ctx.db).await?))
}

/// GET /api/admin/users/:id
pub async fn get_user_activity(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<Json<UserActivity>> {
    current.require_admin()?;

    users::user_activity(&state.ctx.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("User {} does not exist", id)))
}
