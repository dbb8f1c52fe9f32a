//! REST API
//!
//! Public routes (auth, problem catalogue, comments) and the protected ones
//! behind `AuthUser`. Everything is mounted under `/api`, plus `/health`.

pub mod routes;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::FromRef,
    http::{header, Method},
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::auth::TokenAuthority;
use crate::error::ApiError;
use crate::storage::{self, Store};
use crate::submission::SubmissionService;

/// Number of submissions returned by the history endpoint
pub const SUBMISSION_HISTORY_LIMIT: i64 = 10;

// ============================================================================
// SHARED STATE
// ============================================================================

/// State shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub auth: Arc<dyn TokenAuthority>,
    pub submissions: Arc<SubmissionService>,
    /// Ceiling for a single store call made by a handler
    pub store_timeout: Duration,
}

impl AppState {
    /// Run one store call under the handler deadline.
    pub async fn store_call<T, F>(&self, fut: F) -> Result<T, ApiError>
    where
        F: Future<Output = storage::Result<T>>,
    {
        tokio::time::timeout(self.store_timeout, fut)
            .await
            .map_err(|_| ApiError::StoreTimeout)?
            .map_err(ApiError::from)
    }
}

impl FromRef<AppState> for Arc<dyn TokenAuthority> {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn router(state: AppState) -> Router {
    use routes::{auth, comments, problems, profile, progress, submissions};

    let api = Router::new()
        // Public
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/problems", get(problems::list_problems))
        .route("/problems/:id", get(problems::get_problem))
        .route("/topics", get(problems::list_topics))
        // Protected routes take `AuthUser`; `GET /comments/:id` stays public
        .route("/profile", get(profile::get_profile))
        .route("/apikey", put(profile::update_api_key))
        .route("/progress", get(progress::list_progress))
        .route("/progress/:problem_id", get(progress::get_problem_progress))
        .route("/progress/:problem_id/notes", put(progress::update_notes))
        .route("/submit", post(submissions::submit_code))
        .route("/submissions/:problem_id", get(submissions::list_submissions))
        .route("/comments", post(comments::create_comment))
        // GET takes a problem id, DELETE a comment id
        .route(
            "/comments/:id",
            get(comments::list_comments).delete(comments::delete_comment),
        );

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::ORIGIN, header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Serve `router(state)` on `host:port` until the process stops.
pub async fn serve(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Woohoo DSA API listening on {}", addr);

    axum::serve(listener, router(state)).await?;
    Ok(())
}
