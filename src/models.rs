//! Domain records
//!
//! Problems, users, progress, submissions and comments as they are stored and
//! as they travel over the wire (camelCase JSON).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// PROBLEMS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
        }
    }

    /// Parse the stored/queried label. Matching is exact, like the filter in
    /// the listing query.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Easy" => Some(Self::Easy),
            "Medium" => Some(Self::Medium),
            "Hard" => Some(Self::Hard),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub input: String,
    pub expected: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub difficulty: Difficulty,
    pub topic: String,
    #[serde(default)]
    pub topic_sequence: i32,
    pub description: String,
    #[serde(default)]
    pub starter_code: String,
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
    #[serde(default)]
    pub hint_brute: String,
    #[serde(default)]
    pub hint_optimized: String,
    #[serde(default)]
    pub best_solution: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Problem {
    pub fn summary(&self) -> ProblemSummary {
        ProblemSummary {
            id: self.id,
            title: self.title.clone(),
            slug: self.slug.clone(),
            difficulty: self.difficulty,
            topic: self.topic.clone(),
            topic_sequence: self.topic_sequence,
        }
    }
}

/// Listing projection (no description, tests or solutions)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemSummary {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub difficulty: Difficulty,
    pub topic: String,
    pub topic_sequence: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProblemFilter {
    pub topic: Option<String>,
    pub difficulty: Option<String>,
}

// ============================================================================
// USERS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Submissions judged with the system credential
    pub trial_usage: i32,
    pub solved_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_solve_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: &str, password_hash: &str, api_key: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            api_key: api_key
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),
            trial_usage: 0,
            solved_count: 0,
            last_solve_date: None,
            created_at: Utc::now(),
        }
    }

    /// The user's own judge credential, if one is configured.
    pub fn personal_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.is_empty())
    }
}

// ============================================================================
// PROGRESS
// ============================================================================

/// Ordered: a progress row only ever moves towards `Solved`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    Unsolved,
    Attempted,
    Solved,
}

impl ProgressStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unsolved => "unsolved",
            Self::Attempted => "attempted",
            Self::Solved => "solved",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "unsolved" => Some(Self::Unsolved),
            "attempted" => Some(Self::Attempted),
            "solved" => Some(Self::Solved),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub user_id: Uuid,
    pub problem_id: Uuid,
    pub status: ProgressStatus,
    /// Last submitted code
    pub code: String,
    pub language: String,
    pub attempts: i32,
    pub successful_submissions: i32,
    pub notes: String,
    pub updated_at: DateTime<Utc>,
    pub last_attempted_at: Option<DateTime<Utc>>,
}

impl Progress {
    /// Row returned for a pair that has never been touched.
    pub fn untouched(user_id: Uuid, problem_id: Uuid) -> Self {
        Self {
            user_id,
            problem_id,
            status: ProgressStatus::Unsolved,
            code: String::new(),
            language: String::new(),
            attempts: 0,
            successful_submissions: 0,
            notes: String::new(),
            updated_at: Utc::now(),
            last_attempted_at: None,
        }
    }
}

/// One judged attempt, applied to the progress row as an upsert.
#[derive(Debug, Clone)]
pub struct AttemptRecord {
    pub user_id: Uuid,
    pub problem_id: Uuid,
    pub passed: bool,
    pub code: String,
    pub language: String,
    pub at: DateTime<Utc>,
}

impl Progress {
    /// Apply an attempt to an existing row (or to `untouched` for a new one).
    pub fn apply_attempt(&mut self, attempt: &AttemptRecord) {
        let floor = if attempt.passed {
            ProgressStatus::Solved
        } else {
            ProgressStatus::Attempted
        };
        self.status = self.status.max(floor);
        self.attempts += 1;
        if attempt.passed {
            self.successful_submissions += 1;
        }
        self.code = attempt.code.clone();
        self.language = attempt.language.clone();
        self.last_attempted_at = Some(attempt.at);
        self.updated_at = attempt.at;
    }
}

// ============================================================================
// SUBMISSIONS
// ============================================================================

/// Append-only judge log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: Uuid,
    pub user_id: Uuid,
    pub problem_id: Uuid,
    pub code: String,
    pub language: String,
    pub verdict: String,
    pub feedback: String,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// COMMENTS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub problem_id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub content: String,
    pub likes: i32,
    pub created_at: DateTime<Utc>,
}
