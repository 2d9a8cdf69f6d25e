//! compath-web library - JSON API over the ComPath mapping store
//!
//! Reads (catalog, inference, export) are public. Proposing, voting and
//! administration require HTTP Basic credentials of a registered user.

use axum::Router;
use compath_common::AppContext;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod error;

pub use error::{ApiError, ApiResult};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub ctx: AppContext,
}

impl AppState {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{delete, get, post};

    // Protected routes (require authentication)
    let protected = Router::new()
        .route("/api/mappings", post(api::propose_mapping))
        .route("/api/mappings/:id/vote/:vote_type", post(api::vote_mapping))
        .route("/api/mappings/:id/accept", post(api::accept_mapping))
        .route("/api/admin/mappings", delete(api::delete_mappings))
        .route("/api/admin/database", delete(api::reset_store))
        .route("/api/admin/users", get(api::list_users))
        .route("/api/admin/users/:id", get(api::get_user_activity))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth_middleware,
        ));

    // Public routes (no authentication)
    let public = Router::new()
        .route("/api/resources", get(api::list_resources))
        .route("/api/mappings", get(api::list_mappings))
        .route("/api/mappings/:id", get(api::get_mapping))
        .route("/api/pathway/infer/hierarchy", get(api::infer_pathway_hierarchy))
        .route(
            "/api/pathway/:resource/:identifier/mappings",
            get(api::pathway_mappings),
        )
        .route("/api/export", get(api::export_tsv))
        .merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
