//! The caller's own account.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::api::AppState;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::models::User;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateApiKeyRequest {
    #[serde(default)]
    pub api_key: String,
}

/// GET /api/profile
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<User>, ApiError> {
    state
        .store_call(state.store.get_user(identity.user_id))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

/// PUT /api/apikey
///
/// An empty key removes the stored one, sending the user back to trial mode.
pub async fn update_api_key(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    payload: Result<Json<UpdateApiKeyRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(req) = payload?;
    let key = Some(req.api_key.trim()).filter(|k| !k.is_empty());

    state
        .store_call(state.store.set_api_key(identity.user_id, key))
        .await?;

    info!(
        "API key {} for {}",
        if key.is_some() { "set" } else { "cleared" },
        identity.username
    );
    Ok(Json(json!({ "message": "API key updated" })))
}
