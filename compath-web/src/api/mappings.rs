//! Mapping catalog, proposals, votes and acceptance

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use compath_common::db::mappings::{
    self, get_mapping_by_id, list_mapping_summaries, summarize, MappingFilter, MappingSummary,
    Proposal,
};
use compath_common::db::votes::{cast_vote, VoteOutcome, VoteSignal};
use compath_common::MappingType;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Query parameters of `GET /api/mappings`
#[derive(Debug, Default, Deserialize)]
pub struct MappingQuery {
    pub accepted: Option<bool>,
    #[serde(rename = "type")]
    pub mapping_type: Option<String>,
    pub resource: Option<String>,
}

impl MappingQuery {
    fn filter(self) -> ApiResult<MappingFilter> {
        let mapping_type = match self.mapping_type.as_deref() {
            Some(value) => Some(value.parse::<MappingType>()?),
            None => None,
        };
        Ok(MappingFilter {
            accepted: self.accepted,
            mapping_type,
            resource: self.resource,
        })
    }
}

/// GET /api/mappings
pub async fn list_mappings(
    State(state): State<AppState>,
    Query(query): Query<MappingQuery>,
) -> ApiResult<Json<Vec<MappingSummary>>> {
    let filter = query.filter()?;
    Ok(Json(list_mapping_summaries(&state.ctx.db, &filter).await?))
}

/// GET /api/mappings/:id
pub async fn get_mapping(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<MappingSummary>> {
    let mapping = get_mapping_by_id(&state.ctx.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Mapping {} does not exist", id)))?;
    Ok(Json(summarize(&state.ctx.db, mapping).await?))
}

/// Body of `POST /api/mappings`; pathways are given by name
#[derive(Debug, Deserialize)]
pub struct ProposeRequest {
    pub resource_1: String,
    pub pathway_1: String,
    pub resource_2: String,
    pub pathway_2: String,
    #[serde(rename = "type")]
    pub mapping_type: String,
}

#[derive(Debug, Serialize)]
pub struct ProposeResponse {
    pub mapping: MappingSummary,
    /// false when an existing mapping was claimed instead
    pub created: bool,
    pub outcome: Proposal,
    pub message: String,
}

/// POST /api/mappings
pub async fn propose_mapping(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(request): Json<ProposeRequest>,
) -> ApiResult<(StatusCode, Json<ProposeResponse>)> {
    let ctx = &state.ctx;
    let mapping_type: MappingType = request.mapping_type.parse()?;

    let side_1 = ctx
        .registry
        .resolve_by_name(&request.resource_1, &request.pathway_1)?;
    let side_2 = ctx
        .registry
        .resolve_by_name(&request.resource_2, &request.pathway_2)?;

    if side_1 == side_2 {
        return Err(ApiError::BadRequest(
            "Cannot establish a mapping between the same pathway".to_string(),
        ));
    }

    let (mapping, outcome) = mappings::propose_mapping(
        &ctx.db,
        &ctx.registry,
        side_1,
        side_2,
        mapping_type,
        current.user.id,
    )
    .await?;

    let message = match outcome {
        Proposal::Created => {
            info!("{} proposed mapping {}", current.user.email, mapping.id);
            format!("Mapping {} established", mapping.id)
        }
        Proposal::Claimed => {
            format!("Mapping {} already exists; you were added as a creator", mapping.id)
        }
        Proposal::AlreadyCreator => {
            format!("You already established mapping {}", mapping.id)
        }
    };
    let created = outcome == Proposal::Created;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    let mapping = summarize(&ctx.db, mapping).await?;
    Ok((
        status,
        Json(ProposeResponse {
            mapping,
            created,
            outcome,
            message,
        }),
    ))
}

/// POST /api/mappings/:id/vote/:vote_type
///
/// `vote_type` is `1` (up) or `0` (down). The mapping is accepted once the
/// configured number of up-votes is reached.
pub async fn vote_mapping(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path((id, vote_type)): Path<(i64, String)>,
) -> ApiResult<Json<VoteOutcome>> {
    let signal: VoteSignal = vote_type.parse()?;
    let outcome = cast_vote(
        &state.ctx.db,
        current.user.id,
        id,
        signal,
        state.ctx.vote_acceptance,
    )
    .await?;
    Ok(Json(outcome))
}

#[derive(Debug, Serialize)]
pub struct AcceptResponse {
    pub mapping: mappings::Mapping,
    /// false when the mapping had already been accepted
    pub changed: bool,
}

/// POST /api/mappings/:id/accept (admin)
pub async fn accept_mapping(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<Json<AcceptResponse>> {
    current.require_admin()?;

    match mappings::accept_mapping(&state.ctx.db, id).await? {
        (Some(mapping), changed) => Ok(Json(AcceptResponse { mapping, changed })),
        (None, _) => Err(ApiError::NotFound(format!("Mapping {} does not exist", id))),
    }
}
