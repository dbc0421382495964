//! Query Decomposer
//!
//! Splits a user question into independently answerable sub-questions. The
//! decomposer, not the orchestrator, decides when a question is atomic.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use ran_assistant_llm::{complete_text, LlmProvider, LlmRequestOptions};
use ran_assistant_tools::{decomposition_user_message, parse_sub_questions, DECOMPOSER_SYSTEM_PROMPT};

use crate::utils::error::{AppError, AppResult};

#[async_trait]
pub trait QueryDecomposer: Send + Sync {
    /// Sub-questions in answer order.
    ///
    /// An `Err` means the decomposer is unavailable; an unparseable reply is
    /// not an error and yields the original question.
    async fn decompose(&self, question: &str) -> AppResult<Vec<String>>;
}

/// Decomposer backed by a text-generation model.
pub struct LlmQueryDecomposer {
    provider: Arc<dyn LlmProvider>,
    timeout: Duration,
}

impl LlmQueryDecomposer {
    pub fn new(provider: Arc<dyn LlmProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }
}

#[async_trait]
impl QueryDecomposer for LlmQueryDecomposer {
    async fn decompose(&self, question: &str) -> AppResult<Vec<String>> {
        let user = decomposition_user_message(question);
        let call = complete_text(
            self.provider.as_ref(),
            DECOMPOSER_SYSTEM_PROMPT,
            &user,
            LlmRequestOptions::deterministic(),
        );

        let reply = tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| {
                AppError::decomposition(format!("no reply within {}s", self.timeout.as_secs()))
            })?
            .map_err(|e| AppError::decomposition(e.to_string()))?;

        let sub_questions = parse_sub_questions(&reply, question);
        tracing::debug!(count = sub_questions.len(), "question decomposed");
        Ok(sub_questions)
    }
}

/// Treats every question as atomic.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughDecomposer;

#[async_trait]
impl QueryDecomposer for PassthroughDecomposer {
    async fn decompose(&self, question: &str) -> AppResult<Vec<String>> {
        Ok(vec![question.trim().to_string()])
    }
}
