//! Registered pathway resources

use axum::{extract::State, Json};
use compath_common::registry::ResourceInfo;

use crate::AppState;

/// GET /api/resources
pub async fn list_resources(State(state): State<AppState>) -> Json<Vec<ResourceInfo>> {
    Json(state.ctx.registry.resources())
}
