//! TSV export of the mapping catalog

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
};
use compath_common::export::export_mappings;
use serde::Deserialize;

use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    #[serde(default)]
    pub accepted_only: bool,
}

/// GET /api/export?accepted_only=
pub async fn export_tsv(
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
) -> ApiResult<impl IntoResponse> {
    let body = export_mappings(&state.ctx.db, query.accepted_only).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/tab-separated-values; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"compath_mappings.tsv\"",
            ),
        ],
        body,
    ))
}
