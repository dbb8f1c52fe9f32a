//! Route handlers, grouped by resource.

pub mod auth;
pub mod comments;
pub mod problems;
pub mod profile;
pub mod progress;
pub mod submissions;

use uuid::Uuid;

use crate::error::ApiError;

/// Parse a path id, answering 400 with `message` when it is malformed.
pub(crate) fn parse_id(raw: &str, message: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::BadInput(message.to_string()))
}

pub(crate) const INVALID_PROBLEM_ID: &str = "Invalid problem ID";
