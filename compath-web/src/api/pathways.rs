//! Pathway-centred reads: inferred hierarchy and mappings of one pathway

use axum::{
    extract::{Path, Query, State},
    Json,
};
use compath_common::db::mappings::{
    get_mappings_by_pathway_id, summarize, MappingSummary,
};
use compath_common::hierarchy::{infer_hierarchy, InferredHierarchy};
use compath_common::PathwayReference;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct InferQuery {
    pub resource: String,
    pub pathway_name: String,
    pub pathway_id: String,
}

#[derive(Debug, Serialize)]
pub struct InferResponse {
    pub pathway: PathwayReference,
    pub inferred: Vec<InferredHierarchy>,
}

/// GET /api/pathway/infer/hierarchy?resource=&pathway_name=&pathway_id=
///
/// Name and identifier must denote the same pathway of `resource`.
pub async fn infer_pathway_hierarchy(
    State(state): State<AppState>,
    Query(query): Query<InferQuery>,
) -> ApiResult<Json<InferResponse>> {
    let registry = &state.ctx.registry;
    let by_name = registry.get_pathway_by_name(&query.resource, &query.pathway_name)?;
    let by_id = registry.get_pathway_by_id(&query.resource, &query.pathway_id)?;

    let record = match (by_name, by_id) {
        (Some(by_name), Some(by_id)) if by_name.identifier == by_id.identifier => by_id,
        (Some(_), Some(_)) => {
            return Err(ApiError::BadRequest(format!(
                "'{}' and '{}' are different pathways in {}",
                query.pathway_name, query.pathway_id, query.resource
            )))
        }
        _ => {
            return Err(ApiError::BadRequest(format!(
                "'{}' ({}) not found in {}",
                query.pathway_name, query.pathway_id, query.resource
            )))
        }
    };

    let pathway = record.reference(&query.resource);
    let inferred = infer_hierarchy(&state.ctx.db, &pathway).await?;
    Ok(Json(InferResponse { pathway, inferred }))
}

/// GET /api/pathway/:resource/:identifier/mappings
pub async fn pathway_mappings(
    State(state): State<AppState>,
    Path((resource, identifier)): Path<(String, String)>,
) -> ApiResult<Json<Vec<MappingSummary>>> {
    state.ctx.registry.ensure_registered(&resource)?;

    let mut summaries = Vec::new();
    for mapping in get_mappings_by_pathway_id(&state.ctx.db, &resource, &identifier).await? {
        summaries.push(summarize(&state.ctx.db, mapping).await?);
    }
    Ok(Json(summaries))
}
