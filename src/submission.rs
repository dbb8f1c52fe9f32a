//! Submission orchestration
//!
//! One call takes a piece of code from request to stored verdict:
//! validate, pick a judge credential (billing a trial when needed), judge,
//! then persist the submission, the progress row and the solve stats.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::auth::Identity;
use crate::config::QuotaConfig;
use crate::judge::{
    build_evaluation_prompt, parse_verdict, EvaluationResult, Judge, JudgeError, JudgeReply,
};
use crate::models::{AttemptRecord, Submission, User};
use crate::storage::{StorageError, Store};

/// Every submission is stored under this language tag.
pub const SUBMISSION_LANGUAGE: &str = "cpp";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub problem_id: String,
    pub code: String,
    /// Accepted for compatibility; the stored tag is always `SUBMISSION_LANGUAGE`.
    #[serde(default)]
    pub language: Option<String>,
    /// Accepted for compatibility; the key stored on the profile decides.
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("{0}")]
    BadInput(String),

    #[error("Problem not found")]
    ProblemNotFound,

    #[error("User not found")]
    UserNotFound,

    #[error("Trial limit reached ({limit}/{limit}). Please add your OpenRouter API Key in settings to continue.")]
    QuotaExceeded { limit: i32 },

    #[error("Failed to evaluate code: {0}")]
    JudgeFailed(#[from] JudgeError),

    #[error("Failed to save submission")]
    PersistFailed(#[source] StorageError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Which credential pays for a judge call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialGrant {
    /// The user's own key
    Personal(String),
    /// The system key, billed against the trial quota
    Trial,
}

impl CredentialGrant {
    /// Credential handed to the judge; empty means "use the system default".
    pub fn credential(&self) -> &str {
        match self {
            CredentialGrant::Personal(key) => key,
            CredentialGrant::Trial => "",
        }
    }
}

pub struct SubmissionService {
    store: Arc<dyn Store>,
    judge: Arc<dyn Judge>,
    quota: QuotaConfig,
    judge_timeout: Duration,
    store_timeout: Duration,
}

impl SubmissionService {
    pub fn new(
        store: Arc<dyn Store>,
        judge: Arc<dyn Judge>,
        quota: QuotaConfig,
        judge_timeout: Duration,
        store_timeout: Duration,
    ) -> Self {
        Self {
            store,
            judge,
            quota,
            judge_timeout,
            store_timeout,
        }
    }

    pub async fn submit(
        &self,
        identity: &Identity,
        req: SubmitRequest,
    ) -> Result<EvaluationResult, SubmitError> {
        let problem_id = Uuid::parse_str(req.problem_id.trim())
            .map_err(|_| SubmitError::BadInput("Invalid problem ID".to_string()))?;
        if req.code.trim().is_empty() {
            return Err(SubmitError::BadInput("Code is required".to_string()));
        }

        let problem = bounded(self.store_timeout, self.store.get_problem(problem_id))
            .await?
            .ok_or(SubmitError::ProblemNotFound)?;
        let user = bounded(self.store_timeout, self.store.get_user(identity.user_id))
            .await?
            .ok_or(SubmitError::UserNotFound)?;

        let grant = self.grant_credential(&user).await?;
        debug!(
            "Submission by {} for {}: credential={}",
            user.username,
            problem.slug,
            match grant {
                CredentialGrant::Personal(_) => "personal",
                CredentialGrant::Trial => "trial",
            }
        );

        let result = self.judge_code(&build_evaluation_prompt(&problem, &req.code), &grant).await?;

        let now = Utc::now();
        let submission = Submission {
            id: Uuid::new_v4(),
            user_id: user.id,
            problem_id,
            code: req.code.clone(),
            language: SUBMISSION_LANGUAGE.to_string(),
            verdict: result.verdict.clone(),
            feedback: result.feedback.clone(),
            created_at: now,
        };
        let attempt = AttemptRecord {
            user_id: user.id,
            problem_id,
            passed: result.passed,
            code: req.code,
            language: SUBMISSION_LANGUAGE.to_string(),
            at: now,
        };

        // Runs on its own task: a dropped request must not stop it halfway.
        let persist = tokio::spawn(persist_outcome(
            self.store.clone(),
            self.store_timeout,
            submission,
            attempt,
        ));
        match persist.await {
            Ok(outcome) => outcome?,
            Err(e) => {
                return Err(persist_failed(
                    "task",
                    StorageError::Database(e.to_string()),
                ))
            }
        }

        info!(
            "Judged {} for {}: {} (passed={})",
            problem.slug, user.username, result.verdict, result.passed
        );
        Ok(result)
    }

    /// Decide who pays for the judge call.
    ///
    /// A personal key skips the quota entirely. Otherwise one trial is taken
    /// with the store's conditional increment; if that increment errors the
    /// call goes ahead unbilled.
    pub async fn grant_credential(&self, user: &User) -> Result<CredentialGrant, SubmitError> {
        if let Some(key) = user.personal_key() {
            return Ok(CredentialGrant::Personal(key.to_string()));
        }

        let limit = self.quota.trial_limit;
        if user.trial_usage >= limit {
            return Err(SubmitError::QuotaExceeded { limit });
        }

        match bounded(self.store_timeout, self.store.consume_trial(user.id, limit)).await {
            Ok(true) => Ok(CredentialGrant::Trial),
            Ok(false) => {
                debug!("Trial quota for {} ran out concurrently", user.username);
                Err(SubmitError::QuotaExceeded { limit })
            }
            Err(e) => {
                warn!("Failed to bill trial for {}: {}", user.username, e);
                Ok(CredentialGrant::Trial)
            }
        }
    }

    async fn judge_code(
        &self,
        prompt: &str,
        grant: &CredentialGrant,
    ) -> Result<EvaluationResult, SubmitError> {
        let reply = tokio::time::timeout(
            self.judge_timeout,
            self.judge.evaluate(prompt, grant.credential()),
        )
        .await
        .map_err(|_| JudgeError::Timeout(self.judge_timeout))??;

        Ok(match reply {
            JudgeReply::Text(text) => parse_verdict(&text),
            JudgeReply::Empty => EvaluationResult::empty_reply(),
        })
    }
}

/// Await one store call, giving up after `deadline`.
async fn bounded<T, F>(deadline: Duration, call: F) -> Result<T, StorageError>
where
    F: Future<Output = Result<T, StorageError>>,
{
    tokio::time::timeout(deadline, call)
        .await
        .map_err(|_| StorageError::Timeout(deadline))?
}

/// Store the judged attempt: submission row, progress upsert, then solve
/// stats when it passed.
async fn persist_outcome(
    store: Arc<dyn Store>,
    deadline: Duration,
    submission: Submission,
    attempt: AttemptRecord,
) -> Result<(), SubmitError> {
    bounded(deadline, store.insert_submission(&submission))
        .await
        .map_err(|e| persist_failed("submission insert", e))?;

    bounded(deadline, store.record_attempt(&attempt))
        .await
        .map_err(|e| persist_failed("progress upsert", e))?;

    if attempt.passed {
        let solved = bounded(deadline, store.count_solved(attempt.user_id))
            .await
            .map_err(|e| persist_failed("solved count", e))?;
        bounded(deadline, store.update_solve_stats(attempt.user_id, solved, attempt.at))
            .await
            .map_err(|e| persist_failed("solve stats", e))?;
    }
    Ok(())
}

fn persist_failed(step: &str, err: StorageError) -> SubmitError {
    error!("Submission {} failed: {}", step, err);
    SubmitError::PersistFailed(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::WriteOp;
    use crate::storage::MemoryStore;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// Always answers the same text and remembers the credentials it saw.
    struct EchoJudge {
        reply: String,
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Judge for EchoJudge {
        async fn evaluate(&self, _prompt: &str, credential: &str) -> Result<JudgeReply, JudgeError> {
            self.seen.lock().push(credential.to_string());
            Ok(JudgeReply::Text(self.reply.clone()))
        }
    }

    fn service(store: Arc<MemoryStore>) -> (SubmissionService, Arc<EchoJudge>) {
        let judge = Arc::new(EchoJudge {
            reply: "VERDICT: Accepted\nFEEDBACK: fine".to_string(),
            seen: Mutex::new(Vec::new()),
        });
        let svc = SubmissionService::new(
            store,
            judge.clone(),
            QuotaConfig { trial_limit: 3 },
            Duration::from_secs(5),
            Duration::from_secs(5),
        );
        (svc, judge)
    }

    #[tokio::test]
    async fn test_personal_key_skips_quota() {
        let store = Arc::new(MemoryStore::new());
        let mut user = User::new("bob", "x$y", Some("sk-bob".to_string()));
        user.trial_usage = 3;
        store.create_user(&user).await.unwrap();

        let (svc, _) = service(store.clone());
        let grant = svc.grant_credential(&user).await.unwrap();
        assert_eq!(grant, CredentialGrant::Personal("sk-bob".to_string()));
        assert_eq!(grant.credential(), "sk-bob");
        assert_eq!(store.get_user(user.id).await.unwrap().unwrap().trial_usage, 3);
    }

    #[tokio::test]
    async fn test_trial_is_billed() {
        let store = Arc::new(MemoryStore::new());
        let user = User::new("carol", "x$y", None);
        store.create_user(&user).await.unwrap();

        let (svc, _) = service(store.clone());
        assert_eq!(svc.grant_credential(&user).await.unwrap(), CredentialGrant::Trial);
        assert_eq!(store.get_user(user.id).await.unwrap().unwrap().trial_usage, 1);
    }

    #[tokio::test]
    async fn test_stale_user_loses_race() {
        let store = Arc::new(MemoryStore::new());
        let user = User::new("dave", "x$y", None);
        store.create_user(&user).await.unwrap();
        for _ in 0..3 {
            assert!(store.consume_trial(user.id, 3).await.unwrap());
        }

        // `user` still says 0 trials used; the store knows better.
        let (svc, _) = service(store.clone());
        assert!(matches!(
            svc.grant_credential(&user).await,
            Err(SubmitError::QuotaExceeded { limit: 3 })
        ));
    }

    #[tokio::test]
    async fn test_billing_failure_fails_open() {
        let store = Arc::new(MemoryStore::new());
        let user = User::new("erin", "x$y", None);
        store.create_user(&user).await.unwrap();
        store.fail_on(WriteOp::ConsumeTrial);

        let (svc, judge) = service(store.clone());
        let identity = Identity {
            user_id: user.id,
            username: user.username.clone(),
        };
        let problem = crate::models::Problem {
            id: Uuid::new_v4(),
            title: "T".to_string(),
            slug: "t".to_string(),
            difficulty: crate::models::Difficulty::Easy,
            topic: "Arrays".to_string(),
            topic_sequence: 1,
            description: "d".to_string(),
            starter_code: String::new(),
            test_cases: vec![],
            hint_brute: String::new(),
            hint_optimized: String::new(),
            best_solution: String::new(),
            created_at: Utc::now(),
        };
        store.insert_problem(&problem).await.unwrap();

        let result = svc
            .submit(
                &identity,
                SubmitRequest {
                    problem_id: problem.id.to_string(),
                    code: "int main() {}".to_string(),
                    language: Some("python".to_string()),
                    api_key: None,
                },
            )
            .await
            .unwrap();

        assert!(result.passed);
        assert_eq!(judge.seen.lock().as_slice(), [String::new()]);
        assert_eq!(store.get_user(user.id).await.unwrap().unwrap().trial_usage, 0);
        let subs = store.list_submissions(user.id, problem.id, 10).await.unwrap();
        assert_eq!(subs[0].language, SUBMISSION_LANGUAGE);
    }

    #[tokio::test]
    async fn test_rejects_bad_input_before_any_lookup() {
        let store = Arc::new(MemoryStore::new());
        let (svc, judge) = service(store);
        let identity = Identity {
            user_id: Uuid::new_v4(),
            username: "ghost".to_string(),
        };

        let err = svc
            .submit(
                &identity,
                SubmitRequest {
                    problem_id: "not-a-uuid".to_string(),
                    code: "x".to_string(),
                    language: None,
                    api_key: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::BadInput(_)));

        let err = svc
            .submit(
                &identity,
                SubmitRequest {
                    problem_id: Uuid::new_v4().to_string(),
                    code: "   \n".to_string(),
                    language: None,
                    api_key: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::BadInput(_)));
        assert!(judge.seen.lock().is_empty());
    }
}
