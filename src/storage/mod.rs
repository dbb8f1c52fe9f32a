//! Data persistence layer.
//!
//! `Store` is the typed gateway the services talk to. Two backends:
//! - `pg`: PostgreSQL through a deadpool connection pool
//! - `memory`: process-local tables, for tests and throwaway local runs

pub mod memory;
pub mod pg;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{
    AttemptRecord, Comment, Problem, ProblemFilter, ProblemSummary, Progress, Submission, User,
};

pub use memory::MemoryStore;
pub use pg::{PgConfig, PgStore};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error("storage did not answer within {0:?}")]
    Timeout(std::time::Duration),
}

impl From<tokio_postgres::Error> for StorageError {
    fn from(err: tokio_postgres::Error) -> Self {
        if err.code() == Some(&tokio_postgres::error::SqlState::UNIQUE_VIOLATION) {
            return StorageError::Conflict(err.to_string());
        }
        StorageError::Database(err.to_string())
    }
}

impl From<deadpool_postgres::PoolError> for StorageError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        StorageError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Typed accessors over the five collections.
///
/// Every call is a single round trip; implementations must make each one
/// atomic on its own (the orchestrator relies on `consume_trial` and
/// `record_attempt` not interleaving with themselves).
#[async_trait]
pub trait Store: Send + Sync {
    // ==================== Problems ====================

    async fn insert_problem(&self, problem: &Problem) -> Result<()>;
    async fn get_problem(&self, id: Uuid) -> Result<Option<Problem>>;
    /// Summaries sorted by `(topic_sequence, title)`.
    async fn list_problems(&self, filter: &ProblemFilter) -> Result<Vec<ProblemSummary>>;
    /// Distinct topics, sorted.
    async fn list_topics(&self) -> Result<Vec<String>>;

    // ==================== Users ====================

    /// Fails with `Conflict` when the username is taken.
    async fn create_user(&self, user: &User) -> Result<()>;
    async fn get_user(&self, id: Uuid) -> Result<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn set_api_key(&self, id: Uuid, api_key: Option<&str>) -> Result<()>;
    /// Increment `trial_usage` only while it is below `limit`.
    /// Returns false when nothing was incremented.
    async fn consume_trial(&self, id: Uuid, limit: i32) -> Result<bool>;
    async fn update_solve_stats(&self, id: Uuid, solved_count: i64, at: DateTime<Utc>)
        -> Result<()>;

    // ==================== Progress ====================

    async fn list_progress(&self, user_id: Uuid) -> Result<Vec<Progress>>;
    async fn get_progress(&self, user_id: Uuid, problem_id: Uuid) -> Result<Option<Progress>>;
    /// Upsert keyed by (user, problem). See `Progress::apply_attempt`.
    async fn record_attempt(&self, attempt: &AttemptRecord) -> Result<()>;
    /// Upsert that only touches notes; new rows start unsolved.
    async fn upsert_notes(
        &self,
        user_id: Uuid,
        problem_id: Uuid,
        notes: &str,
        at: DateTime<Utc>,
    ) -> Result<()>;
    async fn count_solved(&self, user_id: Uuid) -> Result<i64>;

    // ==================== Submissions ====================

    async fn insert_submission(&self, submission: &Submission) -> Result<()>;
    /// Newest first.
    async fn list_submissions(
        &self,
        user_id: Uuid,
        problem_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Submission>>;

    // ==================== Comments ====================

    /// Newest first.
    async fn list_comments(&self, problem_id: Uuid) -> Result<Vec<Comment>>;
    async fn insert_comment(&self, comment: &Comment) -> Result<()>;
    /// Deletes only when `owner` wrote the comment. Returns whether a row went away.
    async fn delete_comment(&self, id: Uuid, owner: Uuid) -> Result<bool>;
}

/// Load a problem set, skipping slugs that are already present.
/// Returns how many problems were inserted.
pub async fn seed_problems(store: &dyn Store, problems: &[Problem]) -> Result<usize> {
    let mut inserted = 0;
    for problem in problems {
        match store.insert_problem(problem).await {
            Ok(()) => inserted += 1,
            Err(StorageError::Conflict(_)) => debug!("Problem {} already seeded", problem.slug),
            Err(e) => return Err(e),
        }
    }
    info!("Seeded {}/{} problems", inserted, problems.len());
    Ok(inserted)
}
