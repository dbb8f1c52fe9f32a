//! AI code judge: prompt rendering, the completion client and verdict parsing.

pub mod client;
pub mod prompt;
pub mod verdict;

pub use client::{Judge, JudgeConfig, JudgeError, JudgeReply, OpenRouterJudge};
pub use prompt::build_evaluation_prompt;
pub use verdict::{parse_verdict, EvaluationResult};
