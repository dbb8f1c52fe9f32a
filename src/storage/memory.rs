//! In-memory backend
//!
//! All collections sit behind one lock, so every trait call is atomic.
//! Write failures can be injected to exercise error paths.

use std::collections::{BTreeSet, HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use super::{Result, StorageError, Store};
use crate::models::{
    AttemptRecord, Comment, Problem, ProblemFilter, ProblemSummary, Progress, ProgressStatus,
    Submission, User,
};

/// Writes that can be made to fail with `MemoryStore::fail_on`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteOp {
    ConsumeTrial,
    InsertSubmission,
    RecordAttempt,
    UpdateSolveStats,
}

#[derive(Default)]
struct Tables {
    problems: HashMap<Uuid, Problem>,
    users: HashMap<Uuid, User>,
    progress: HashMap<(Uuid, Uuid), Progress>,
    submissions: Vec<Submission>,
    comments: Vec<Comment>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    failing: RwLock<HashSet<WriteOp>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `op` return a database error.
    pub fn fail_on(&self, op: WriteOp) {
        self.failing.write().insert(op);
    }

    pub fn clear_failures(&self) {
        self.failing.write().clear();
    }

    /// Total number of stored submissions, across users and problems.
    pub fn submission_count(&self) -> usize {
        self.tables.read().submissions.len()
    }

    fn check(&self, op: WriteOp) -> Result<()> {
        if self.failing.read().contains(&op) {
            return Err(StorageError::Database(format!("injected failure: {:?}", op)));
        }
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_problem(&self, problem: &Problem) -> Result<()> {
        let mut tables = self.tables.write();
        if tables.problems.values().any(|p| p.slug == problem.slug) {
            return Err(StorageError::Conflict(format!("problem slug {}", problem.slug)));
        }
        tables.problems.insert(problem.id, problem.clone());
        Ok(())
    }

    async fn get_problem(&self, id: Uuid) -> Result<Option<Problem>> {
        Ok(self.tables.read().problems.get(&id).cloned())
    }

    async fn list_problems(&self, filter: &ProblemFilter) -> Result<Vec<ProblemSummary>> {
        let topic = filter.topic.as_deref().filter(|t| !t.is_empty());
        let difficulty = filter.difficulty.as_deref().filter(|d| !d.is_empty());

        let tables = self.tables.read();
        let mut list: Vec<ProblemSummary> = tables
            .problems
            .values()
            .filter(|p| topic.map_or(true, |t| p.topic == t))
            .filter(|p| difficulty.map_or(true, |d| p.difficulty.as_str() == d))
            .map(Problem::summary)
            .collect();
        list.sort_by(|a, b| {
            a.topic_sequence
                .cmp(&b.topic_sequence)
                .then_with(|| a.title.cmp(&b.title))
        });
        Ok(list)
    }

    async fn list_topics(&self) -> Result<Vec<String>> {
        let tables = self.tables.read();
        let topics: BTreeSet<String> = tables.problems.values().map(|p| p.topic.clone()).collect();
        Ok(topics.into_iter().collect())
    }

    async fn create_user(&self, user: &User) -> Result<()> {
        let mut tables = self.tables.write();
        if tables.users.values().any(|u| u.username == user.username) {
            return Err(StorageError::Conflict(format!("username {}", user.username)));
        }
        tables.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.tables.read().users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .tables
            .read()
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn set_api_key(&self, id: Uuid, api_key: Option<&str>) -> Result<()> {
        if let Some(user) = self.tables.write().users.get_mut(&id) {
            user.api_key = api_key.map(str::to_string);
        }
        Ok(())
    }

    async fn consume_trial(&self, id: Uuid, limit: i32) -> Result<bool> {
        self.check(WriteOp::ConsumeTrial)?;
        let mut tables = self.tables.write();
        match tables.users.get_mut(&id) {
            Some(user) if user.trial_usage < limit => {
                user.trial_usage += 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn update_solve_stats(
        &self,
        id: Uuid,
        solved_count: i64,
        at: DateTime<Utc>,
    ) -> Result<()> {
        self.check(WriteOp::UpdateSolveStats)?;
        if let Some(user) = self.tables.write().users.get_mut(&id) {
            user.solved_count = solved_count;
            user.last_solve_date = Some(at);
        }
        Ok(())
    }

    async fn list_progress(&self, user_id: Uuid) -> Result<Vec<Progress>> {
        let tables = self.tables.read();
        let mut list: Vec<Progress> = tables
            .progress
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(list)
    }

    async fn get_progress(&self, user_id: Uuid, problem_id: Uuid) -> Result<Option<Progress>> {
        Ok(self
            .tables
            .read()
            .progress
            .get(&(user_id, problem_id))
            .cloned())
    }

    async fn record_attempt(&self, attempt: &AttemptRecord) -> Result<()> {
        self.check(WriteOp::RecordAttempt)?;
        let mut tables = self.tables.write();
        tables
            .progress
            .entry((attempt.user_id, attempt.problem_id))
            .or_insert_with(|| Progress::untouched(attempt.user_id, attempt.problem_id))
            .apply_attempt(attempt);
        Ok(())
    }

    async fn upsert_notes(
        &self,
        user_id: Uuid,
        problem_id: Uuid,
        notes: &str,
        at: DateTime<Utc>,
    ) -> Result<()> {
        let mut tables = self.tables.write();
        let row = tables
            .progress
            .entry((user_id, problem_id))
            .or_insert_with(|| Progress::untouched(user_id, problem_id));
        row.notes = notes.to_string();
        row.updated_at = at;
        Ok(())
    }

    async fn count_solved(&self, user_id: Uuid) -> Result<i64> {
        let tables = self.tables.read();
        Ok(tables
            .progress
            .values()
            .filter(|p| p.user_id == user_id && p.status == ProgressStatus::Solved)
            .count() as i64)
    }

    async fn insert_submission(&self, submission: &Submission) -> Result<()> {
        self.check(WriteOp::InsertSubmission)?;
        self.tables.write().submissions.push(submission.clone());
        Ok(())
    }

    async fn list_submissions(
        &self,
        user_id: Uuid,
        problem_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Submission>> {
        let tables = self.tables.read();
        // Pushed in arrival order, so walking backwards is newest first.
        Ok(tables
            .submissions
            .iter()
            .rev()
            .filter(|s| s.user_id == user_id && s.problem_id == problem_id)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn list_comments(&self, problem_id: Uuid) -> Result<Vec<Comment>> {
        let tables = self.tables.read();
        Ok(tables
            .comments
            .iter()
            .rev()
            .filter(|c| c.problem_id == problem_id)
            .cloned()
            .collect())
    }

    async fn insert_comment(&self, comment: &Comment) -> Result<()> {
        self.tables.write().comments.push(comment.clone());
        Ok(())
    }

    async fn delete_comment(&self, id: Uuid, owner: Uuid) -> Result<bool> {
        let mut tables = self.tables.write();
        let before = tables.comments.len();
        tables.comments.retain(|c| !(c.id == id && c.user_id == owner));
        Ok(tables.comments.len() < before)
    }
}
