//! Woohoo DSA backend
//!
//! A coding-practice service: users browse problems, submit C++ solutions
//! and get a verdict from an LLM acting as the judge.
//!
//! ## Module Structure
//!
//! - `models`: Problems, users, progress, submissions, comments
//! - `storage/`: The `Store` gateway (PostgreSQL and in-memory)
//! - `judge/`: Prompt builder, completion client, verdict parser
//! - `submission`: Submission orchestration and the trial quota
//! - `auth`: Identity tokens, password hashing, request extractor
//! - `api/`: REST API
//! - `config`: Runtime configuration
//! - `error`: HTTP error mapping

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod judge;
pub mod models;
pub mod storage;
pub mod submission;

pub use api::{router, AppState};
pub use auth::{Identity, JwtAuthority, TokenAuthority};
pub use config::{AppConfig, QuotaConfig};
pub use error::ApiError;
pub use judge::{EvaluationResult, Judge, JudgeConfig, JudgeError, JudgeReply, OpenRouterJudge};
pub use models::{Problem, Progress, ProgressStatus, Submission, User};
pub use storage::{MemoryStore, PgConfig, PgStore, Store};
pub use submission::{SubmissionService, SubmitError, SubmitRequest};
