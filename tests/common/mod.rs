//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use uuid::Uuid;
use woohoo_dsa::auth::{hash_password, Identity};
use woohoo_dsa::models::{
    AttemptRecord, Comment, Difficulty, ProblemFilter, ProblemSummary, Progress, Submission,
    TestCase,
};
use woohoo_dsa::storage::{self, Store};
use woohoo_dsa::{
    Judge, JudgeError, JudgeReply, MemoryStore, Problem, QuotaConfig, SubmissionService,
    SubmitRequest, User,
};

pub const TEST_PASSWORD: &str = "correct-horse";

/// Store deadline used by fixtures that do not test it
pub const STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// What the fake judge does on every call
#[derive(Debug, Clone)]
pub enum JudgeScript {
    Text(String),
    Empty,
    Status(u16),
    /// Sleep, then accept
    Hang(Duration),
}

/// Deterministic judge that counts calls and records credentials.
pub struct ScriptedJudge {
    script: Mutex<JudgeScript>,
    calls: AtomicUsize,
    credentials: Mutex<Vec<String>>,
}

impl ScriptedJudge {
    pub fn new(script: JudgeScript) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script),
            calls: AtomicUsize::new(0),
            credentials: Mutex::new(Vec::new()),
        })
    }

    pub fn text(reply: &str) -> Arc<Self> {
        Self::new(JudgeScript::Text(reply.to_string()))
    }

    pub fn set_script(&self, script: JudgeScript) {
        *self.script.lock() = script;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn credentials(&self) -> Vec<String> {
        self.credentials.lock().clone()
    }
}

#[async_trait]
impl Judge for ScriptedJudge {
    async fn evaluate(&self, _prompt: &str, credential: &str) -> Result<JudgeReply, JudgeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.credentials.lock().push(credential.to_string());

        let script = self.script.lock().clone();
        match script {
            JudgeScript::Text(text) => Ok(JudgeReply::Text(text)),
            JudgeScript::Empty => Ok(JudgeReply::Empty),
            JudgeScript::Status(status) => Err(JudgeError::Provider {
                status,
                message: "upstream error".to_string(),
            }),
            JudgeScript::Hang(delay) => {
                tokio::time::sleep(delay).await;
                Ok(JudgeReply::Text("VERDICT: Accepted".to_string()))
            }
        }
    }
}

/// Store call that `StallingStore` holds back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreCall {
    GetProblem,
    RecordAttempt,
}

/// Delegates to a `MemoryStore`, sleeping `delay` before one chosen call.
pub struct StallingStore {
    inner: Arc<MemoryStore>,
    call: StoreCall,
    delay: Duration,
}

impl StallingStore {
    pub fn new(inner: Arc<MemoryStore>, call: StoreCall, delay: Duration) -> Arc<Self> {
        Arc::new(Self { inner, call, delay })
    }

    async fn stall(&self, call: StoreCall) {
        if self.call == call {
            tokio::time::sleep(self.delay).await;
        }
    }
}

#[async_trait]
impl Store for StallingStore {
    async fn insert_problem(&self, problem: &Problem) -> storage::Result<()> {
        self.inner.insert_problem(problem).await
    }

    async fn get_problem(&self, id: Uuid) -> storage::Result<Option<Problem>> {
        self.stall(StoreCall::GetProblem).await;
        self.inner.get_problem(id).await
    }

    async fn list_problems(&self, filter: &ProblemFilter) -> storage::Result<Vec<ProblemSummary>> {
        self.inner.list_problems(filter).await
    }

    async fn list_topics(&self) -> storage::Result<Vec<String>> {
        self.inner.list_topics().await
    }

    async fn create_user(&self, user: &User) -> storage::Result<()> {
        self.inner.create_user(user).await
    }

    async fn get_user(&self, id: Uuid) -> storage::Result<Option<User>> {
        self.inner.get_user(id).await
    }

    async fn find_user_by_username(&self, username: &str) -> storage::Result<Option<User>> {
        self.inner.find_user_by_username(username).await
    }

    async fn set_api_key(&self, id: Uuid, api_key: Option<&str>) -> storage::Result<()> {
        self.inner.set_api_key(id, api_key).await
    }

    async fn consume_trial(&self, id: Uuid, limit: i32) -> storage::Result<bool> {
        self.inner.consume_trial(id, limit).await
    }

    async fn update_solve_stats(
        &self,
        id: Uuid,
        solved_count: i64,
        at: DateTime<Utc>,
    ) -> storage::Result<()> {
        self.inner.update_solve_stats(id, solved_count, at).await
    }

    async fn list_progress(&self, user_id: Uuid) -> storage::Result<Vec<Progress>> {
        self.inner.list_progress(user_id).await
    }

    async fn get_progress(
        &self,
        user_id: Uuid,
        problem_id: Uuid,
    ) -> storage::Result<Option<Progress>> {
        self.inner.get_progress(user_id, problem_id).await
    }

    async fn record_attempt(&self, attempt: &AttemptRecord) -> storage::Result<()> {
        self.stall(StoreCall::RecordAttempt).await;
        self.inner.record_attempt(attempt).await
    }

    async fn upsert_notes(
        &self,
        user_id: Uuid,
        problem_id: Uuid,
        notes: &str,
        at: DateTime<Utc>,
    ) -> storage::Result<()> {
        self.inner.upsert_notes(user_id, problem_id, notes, at).await
    }

    async fn count_solved(&self, user_id: Uuid) -> storage::Result<i64> {
        self.inner.count_solved(user_id).await
    }

    async fn insert_submission(&self, submission: &Submission) -> storage::Result<()> {
        self.inner.insert_submission(submission).await
    }

    async fn list_submissions(
        &self,
        user_id: Uuid,
        problem_id: Uuid,
        limit: i64,
    ) -> storage::Result<Vec<Submission>> {
        self.inner.list_submissions(user_id, problem_id, limit).await
    }

    async fn list_comments(&self, problem_id: Uuid) -> storage::Result<Vec<Comment>> {
        self.inner.list_comments(problem_id).await
    }

    async fn insert_comment(&self, comment: &Comment) -> storage::Result<()> {
        self.inner.insert_comment(comment).await
    }

    async fn delete_comment(&self, id: Uuid, owner: Uuid) -> storage::Result<bool> {
        self.inner.delete_comment(id, owner).await
    }
}

pub fn two_sum() -> Problem {
    Problem {
        id: Uuid::new_v4(),
        title: "Two Sum".to_string(),
        slug: "two-sum".to_string(),
        difficulty: Difficulty::Easy,
        topic: "Arrays".to_string(),
        topic_sequence: 1,
        description: "Return indices of the two numbers that add up to target.".to_string(),
        starter_code: "class Solution {};".to_string(),
        test_cases: vec![
            TestCase {
                input: "nums = [2,7,11,15], target = 9".to_string(),
                expected: "[0,1]".to_string(),
            },
            TestCase {
                input: "nums = [3,2,4], target = 6".to_string(),
                expected: "[1,2]".to_string(),
            },
        ],
        hint_brute: "Try every pair.".to_string(),
        hint_optimized: "Remember what you have seen.".to_string(),
        best_solution: String::new(),
        created_at: Utc::now(),
    }
}

pub const ACCEPTED: &str = "VERDICT: Accepted\nFEEDBACK: Looks correct.";
pub const WRONG: &str = "VERDICT: Wrong Answer\nFEEDBACK: Fails the second case.";

pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub judge: Arc<ScriptedJudge>,
    pub service: Arc<SubmissionService>,
    pub problem: Problem,
    pub user: User,
}

impl Fixture {
    pub async fn new(judge: Arc<ScriptedJudge>, api_key: Option<&str>, trial_usage: i32) -> Self {
        Self::with_timeout(judge, api_key, trial_usage, Duration::from_secs(5)).await
    }

    pub async fn with_timeout(
        judge: Arc<ScriptedJudge>,
        api_key: Option<&str>,
        trial_usage: i32,
        judge_timeout: Duration,
    ) -> Self {
        let store = Arc::new(MemoryStore::new());
        let problem = two_sum();
        store.insert_problem(&problem).await.unwrap();

        let mut user = User::new(
            "alice",
            &hash_password(TEST_PASSWORD),
            api_key.map(str::to_string),
        );
        user.trial_usage = trial_usage;
        store.create_user(&user).await.unwrap();

        let service = Arc::new(SubmissionService::new(
            store.clone(),
            judge.clone(),
            QuotaConfig { trial_limit: 3 },
            judge_timeout,
            STORE_TIMEOUT,
        ));

        Self {
            store,
            judge,
            service,
            problem,
            user,
        }
    }

    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.user.id,
            username: self.user.username.clone(),
        }
    }

    pub fn request(&self, code: &str) -> SubmitRequest {
        SubmitRequest {
            problem_id: self.problem.id.to_string(),
            code: code.to_string(),
            language: Some("cpp".to_string()),
            api_key: None,
        }
    }

    /// A service over `store` that shares this fixture's judge and data.
    pub fn service_over(&self, store: Arc<dyn Store>, store_timeout: Duration) -> SubmissionService {
        SubmissionService::new(
            store,
            self.judge.clone(),
            QuotaConfig { trial_limit: 3 },
            Duration::from_secs(5),
            store_timeout,
        )
    }

    pub async fn user_now(&self) -> User {
        self.store.get_user(self.user.id).await.unwrap().unwrap()
    }
}
