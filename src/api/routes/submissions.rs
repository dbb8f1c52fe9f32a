//! Code submission and history.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};

use super::{parse_id, INVALID_PROBLEM_ID};
use crate::api::{AppState, SUBMISSION_HISTORY_LIMIT};
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::judge::EvaluationResult;
use crate::models::Submission;
use crate::submission::SubmitRequest;

/// POST /api/submit
pub async fn submit_code(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    payload: Result<Json<SubmitRequest>, JsonRejection>,
) -> Result<Json<EvaluationResult>, ApiError> {
    let Json(req) = payload?;
    let result = state.submissions.submit(&identity, req).await?;
    Ok(Json(result))
}

/// GET /api/submissions/:problem_id
pub async fn list_submissions(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(problem_id): Path<String>,
) -> Result<Json<Vec<Submission>>, ApiError> {
    let problem_id = parse_id(&problem_id, INVALID_PROBLEM_ID)?;
    let submissions = state
        .store_call(state.store.list_submissions(
            identity.user_id,
            problem_id,
            SUBMISSION_HISTORY_LIMIT,
        ))
        .await?;
    Ok(Json(submissions))
}
