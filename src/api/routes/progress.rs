//! Per-problem progress of the caller.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{parse_id, INVALID_PROBLEM_ID};
use crate::api::AppState;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::models::Progress;

#[derive(Debug, Deserialize)]
pub struct UpdateNotesRequest {
    #[serde(default)]
    pub notes: String,
}

/// GET /api/progress
pub async fn list_progress(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<Vec<Progress>>, ApiError> {
    Ok(Json(
        state
            .store_call(state.store.list_progress(identity.user_id))
            .await?,
    ))
}

/// GET /api/progress/:problem_id
///
/// Untouched problems answer with an unsolved, zero-attempt row.
pub async fn get_problem_progress(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(problem_id): Path<String>,
) -> Result<Json<Progress>, ApiError> {
    let problem_id = parse_id(&problem_id, INVALID_PROBLEM_ID)?;
    let progress = state
        .store_call(state.store.get_progress(identity.user_id, problem_id))
        .await?
        .unwrap_or_else(|| Progress::untouched(identity.user_id, problem_id));
    Ok(Json(progress))
}

/// PUT /api/progress/:problem_id/notes
pub async fn update_notes(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(problem_id): Path<String>,
    payload: Result<Json<UpdateNotesRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(req) = payload?;
    let problem_id = parse_id(&problem_id, INVALID_PROBLEM_ID)?;

    state
        .store_call(
            state
                .store
                .upsert_notes(identity.user_id, problem_id, &req.notes, Utc::now()),
        )
        .await?;

    Ok(Json(json!({ "message": "Notes updated" })))
}
