//! SQL Synthesizer
//!
//! Turns a sub-question plus a template id into one read-only query. The
//! orchestrator never inspects the result beyond handing it to the backend.

use std::sync::Arc;

use async_trait::async_trait;

use ran_assistant_llm::{complete_text, LlmProvider, LlmRequestOptions};
use ran_assistant_tools::{extract_sql, TemplateCatalog};

use crate::utils::error::{AppError, AppResult};

#[async_trait]
pub trait SqlSynthesizer: Send + Sync {
    async fn synthesize(&self, question: &str, template_id: &str) -> AppResult<String>;
}

/// Synthesizer backed by a text-generation model.
pub struct LlmSqlSynthesizer {
    provider: Arc<dyn LlmProvider>,
    templates: Arc<TemplateCatalog>,
}

impl LlmSqlSynthesizer {
    pub fn new(provider: Arc<dyn LlmProvider>, templates: Arc<TemplateCatalog>) -> Self {
        Self {
            provider,
            templates,
        }
    }
}

#[async_trait]
impl SqlSynthesizer for LlmSqlSynthesizer {
    async fn synthesize(&self, question: &str, template_id: &str) -> AppResult<String> {
        let template = self
            .templates
            .get(template_id)
            .ok_or_else(|| AppError::synthesis(format!("unknown template: {}", template_id)))?;

        let reply = complete_text(
            self.provider.as_ref(),
            &template.system_prompt(),
            &template.user_message(question),
            LlmRequestOptions::deterministic(),
        )
        .await?;

        let query = extract_sql(&reply)
            .map_err(|e| AppError::synthesis(format!("{} ({})", e, template_id)))?;
        tracing::debug!(template = template_id, query = %query, "query synthesized");
        Ok(query)
    }
}
