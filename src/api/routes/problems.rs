//! Problem catalogue (public).

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};

use super::{parse_id, INVALID_PROBLEM_ID};
use crate::api::AppState;
use crate::error::ApiError;
use crate::models::{Problem, ProblemFilter, ProblemSummary};

/// GET /api/problems?topic=&difficulty=
pub async fn list_problems(
    State(state): State<AppState>,
    query: Result<Query<ProblemFilter>, QueryRejection>,
) -> Result<Json<Vec<ProblemSummary>>, ApiError> {
    let Query(filter) = query?;
    let problems = state.store_call(state.store.list_problems(&filter)).await?;
    Ok(Json(problems))
}

/// GET /api/problems/:id
pub async fn get_problem(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Problem>, ApiError> {
    let id = parse_id(&id, INVALID_PROBLEM_ID)?;
    state
        .store_call(state.store.get_problem(id))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Problem not found".to_string()))
}

/// GET /api/topics
pub async fn list_topics(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.store_call(state.store.list_topics()).await?))
}
