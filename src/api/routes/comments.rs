//! Discussion threads under each problem.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::{parse_id, INVALID_PROBLEM_ID};
use crate::api::AppState;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::models::Comment;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub problem_id: String,
    pub content: String,
}

/// GET /api/comments/:problem_id (public)
pub async fn list_comments(
    State(state): State<AppState>,
    Path(problem_id): Path<String>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    let problem_id = parse_id(&problem_id, INVALID_PROBLEM_ID)?;
    Ok(Json(
        state
            .store_call(state.store.list_comments(problem_id))
            .await?,
    ))
}

/// POST /api/comments
pub async fn create_comment(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    payload: Result<Json<CreateCommentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    let Json(req) = payload?;
    let problem_id = parse_id(&req.problem_id, INVALID_PROBLEM_ID)?;
    if req.content.trim().is_empty() {
        return Err(ApiError::BadInput("Content is required".to_string()));
    }

    let comment = Comment {
        id: Uuid::new_v4(),
        problem_id,
        user_id: identity.user_id,
        username: identity.username,
        content: req.content,
        likes: 0,
        created_at: Utc::now(),
    };
    state
        .store_call(state.store.insert_comment(&comment))
        .await?;

    Ok((StatusCode::CREATED, Json(comment)))
}

/// DELETE /api/comments/:id
///
/// Missing and foreign comments get the same 403.
pub async fn delete_comment(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id, "Invalid comment ID")?;

    let deleted = state
        .store_call(state.store.delete_comment(id, identity.user_id))
        .await?;
    if !deleted {
        return Err(ApiError::Forbidden(
            "Comment not found or unauthorized".to_string(),
        ));
    }

    Ok(Json(json!({ "message": "Comment deleted" })))
}
