//! Drug reference lookups.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use herdtrace_core::Drug;
use serde::Deserialize;

use crate::{error::AppError, state::AppState};

use super::{DataResponse, ListResponse};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: Option<String>,
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ListResponse<Drug>>, AppError> {
    let term = query
        .q
        .ok_or_else(|| AppError::validation("Search query is required"))?;
    let db = state.db()?;
    let drugs = db.search_drugs(&term)?;
    Ok(Json(ListResponse::new(drugs)))
}

pub async fn get_by_name(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<DataResponse<Drug>>, AppError> {
    let db = state.db()?;
    let drug = db
        .get_drug(&name)?
        .ok_or_else(|| AppError::not_found("Drug not found"))?;
    Ok(Json(DataResponse::new(drug)))
}
