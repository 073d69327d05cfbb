use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::Movie,
    services::{SearchOutcome, SearchState},
};

use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize)]
pub struct ResultsResponse {
    pub query: Option<String>,
    pub outcome: Option<SearchOutcome>,
    pub state: SearchState,
    pub loading: bool,
    pub movies: Vec<Movie>,
}

impl ResultsResponse {
    fn snapshot(state: &AppState, query: Option<String>, outcome: Option<SearchOutcome>) -> Self {
        Self {
            query,
            outcome,
            state: state.controller.state(),
            loading: state.is_loading(),
            movies: state.controller.results().to_vec(),
        }
    }
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Runs a search and returns the published results once it settles
///
/// A blank query leaves everything untouched and returns the current results.
pub async fn search(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<ResultsResponse>> {
    if params.q.trim().is_empty() {
        return Ok(Json(ResultsResponse::snapshot(&state, None, None)));
    }

    tracing::info!(request_id = %request_id, query = %params.q, "Processing search request");

    let handle = state.controller.search(&params.q, state.begin_search());

    let outcome = match handle {
        Some(handle) => Some(handle.await.map_err(|e| {
            tracing::error!(request_id = %request_id, error = %e, "Search task failed");
            AppError::Internal(e.to_string())
        })?),
        None => None,
    };

    tracing::info!(request_id = %request_id, outcome = ?outcome, "Search request completed");

    Ok(Json(ResultsResponse::snapshot(
        &state,
        Some(params.q),
        outcome,
    )))
}

/// Current results without issuing a search
pub async fn movies(State(state): State<AppState>) -> Json<ResultsResponse> {
    let outcome = state.controller.last_outcome();
    Json(ResultsResponse::snapshot(&state, None, outcome))
}
