//! Registration and login.

use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::AppState;
use crate::auth::{hash_password, verify_password, Identity};
use crate::error::ApiError;
use crate::models::User;

const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 30;
const PASSWORD_MIN: usize = 6;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

fn validate_registration(req: &RegisterRequest) -> Result<(), ApiError> {
    let len = req.username.trim().chars().count();
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&len) {
        return Err(ApiError::BadInput(format!(
            "Username must be between {} and {} characters",
            USERNAME_MIN, USERNAME_MAX
        )));
    }
    if req.password.chars().count() < PASSWORD_MIN {
        return Err(ApiError::BadInput(format!(
            "Password must be at least {} characters",
            PASSWORD_MIN
        )));
    }
    Ok(())
}

fn issue_for(state: &AppState, user: User) -> Result<AuthResponse, ApiError> {
    let token = state.auth.issue(&Identity {
        user_id: user.id,
        username: user.username.clone(),
    })?;
    Ok(AuthResponse { token, user })
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let Json(req) = payload?;
    validate_registration(&req)?;

    let user = User::new(req.username.trim(), &hash_password(&req.password), req.api_key);
    state
        .store_call(state.store.create_user(&user))
        .await
        .map_err(|e| match e {
            ApiError::Conflict(_) => ApiError::Conflict("Username already exists".to_string()),
            other => other,
        })?;

    info!("Registered user {}", user.username);
    Ok((StatusCode::CREATED, Json(issue_for(&state, user)?)))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let Json(req) = payload?;
    let invalid = || ApiError::Unauthenticated("Invalid credentials".to_string());

    let user = state
        .store_call(state.store.find_user_by_username(req.username.trim()))
        .await?
        .ok_or_else(invalid)?;
    if !verify_password(&req.password, &user.password_hash) {
        return Err(invalid());
    }

    Ok(Json(issue_for(&state, user)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(username: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            password: password.to_string(),
            api_key: None,
        }
    }

    #[test]
    fn test_registration_bounds() {
        assert!(validate_registration(&request("abc", "123456")).is_ok());
        assert!(validate_registration(&request(&"x".repeat(30), "123456")).is_ok());
        assert!(validate_registration(&request("ab", "123456")).is_err());
        assert!(validate_registration(&request(&"x".repeat(31), "123456")).is_err());
        assert!(validate_registration(&request("alice", "12345")).is_err());
        assert!(validate_registration(&request("   ab   ", "123456")).is_err());
    }
}
