//! Judge client
//!
//! Single-turn chat completion against an OpenRouter-compatible endpoint.
//! The client neither retries nor times out on its own; callers own the deadline.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Judge endpoint configuration
#[derive(Clone)]
pub struct JudgeConfig {
    pub api_base: String,
    /// System credential, used when the caller has none
    pub api_key: String,
    pub model: String,
    /// Sent as `HTTP-Referer`
    pub referer: String,
    /// Sent as `X-Title`
    pub title: String,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            api_base: std::env::var("JUDGE_API_BASE")
                .unwrap_or_else(|_| "https://openrouter.ai/api/v1".to_string()),
            api_key: std::env::var("OPENROUTER_API_KEY").unwrap_or_default(),
            model: std::env::var("JUDGE_MODEL")
                .unwrap_or_else(|_| "arcee-ai/trinity-large-preview:free".to_string()),
            referer: std::env::var("JUDGE_REFERER")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            title: std::env::var("JUDGE_TITLE").unwrap_or_else(|_| "Woohoo DSA".to_string()),
        }
    }
}

impl fmt::Debug for JudgeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JudgeConfig")
            .field("api_base", &self.api_base)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("referer", &self.referer)
            .field("title", &self.title)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum JudgeError {
    #[error("judge request failed: {0}")]
    Transport(String),

    #[error("judge api returned status {status}: {message}")]
    Provider { status: u16, message: String },

    #[error("invalid judge response: {0}")]
    Decode(String),

    #[error("judge timed out after {0:?}")]
    Timeout(Duration),
}

/// What came back from a successful round trip
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JudgeReply {
    /// Content of the first choice
    Text(String),
    /// The provider returned zero choices
    Empty,
}

/// Text-completion judge
#[async_trait]
pub trait Judge: Send + Sync {
    /// `credential` may be empty, in which case the implementation falls back
    /// to its own default.
    async fn evaluate(&self, prompt: &str, credential: &str) -> Result<JudgeReply, JudgeError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    /// Absent and `null` both mean no choices.
    #[serde(default)]
    choices: Option<Vec<Choice>>,
    error: Option<ProviderErrorBody>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    message: String,
}

/// HTTP judge backed by an OpenRouter-style `/chat/completions` endpoint
pub struct OpenRouterJudge {
    client: Client,
    config: JudgeConfig,
}

impl OpenRouterJudge {
    pub fn new(config: JudgeConfig) -> Result<Self, JudgeError> {
        let client = Client::builder()
            .build()
            .map_err(|e| JudgeError::Transport(e.to_string()))?;

        info!("Judge client: model={} base={}", config.model, config.api_base);
        Ok(Self { client, config })
    }
}

#[async_trait]
impl Judge for OpenRouterJudge {
    async fn evaluate(&self, prompt: &str, credential: &str) -> Result<JudgeReply, JudgeError> {
        let token = if credential.is_empty() {
            self.config.api_key.as_str()
        } else {
            credential
        };
        if token.is_empty() {
            warn!("Calling judge without any credential");
        }

        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        debug!("Calling judge: model={} prompt_len={}", self.config.model, prompt.len());

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.config.api_base))
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", token))
            .header("HTTP-Referer", &self.config.referer)
            .header("X-Title", &self.config.title)
            .json(&request)
            .send()
            .await
            .map_err(|e| JudgeError::Transport(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| JudgeError::Transport(e.to_string()))?;

        if !status.is_success() {
            warn!("Judge api error - status: {}, body: {}", status, body);
            return Err(JudgeError::Provider {
                status: status.as_u16(),
                message: body,
            });
        }

        let chat: ChatResponse =
            serde_json::from_str(&body).map_err(|e| JudgeError::Decode(e.to_string()))?;

        if let Some(err) = chat.error {
            return Err(JudgeError::Provider {
                status: status.as_u16(),
                message: err.message,
            });
        }

        match chat.choices.unwrap_or_default().into_iter().next() {
            Some(choice) => {
                let content = choice.message.content.unwrap_or_default();
                debug!("Judge response: {}", content);
                Ok(JudgeReply::Text(content))
            }
            None => {
                warn!("Judge returned no choices");
                Ok(JudgeReply::Empty)
            }
        }
    }
}
