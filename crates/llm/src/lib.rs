//! RAN Assistant LLM
//!
//! A single text-generation interface used by the question decomposer and the
//! SQL synthesizer, with two implementations:
//! - OpenAI-compatible chat completions (OpenAI, vLLM, LiteLLM gateways, ...)
//! - Ollama (local inference)
//!
//! Also includes the HTTP client factory shared with the Trino backend.

pub mod http_client;
pub mod ollama;
pub mod openai;
pub mod provider;
pub mod types;

use std::sync::Arc;

// Re-export main types
pub use http_client::build_http_client;
pub use ollama::OllamaProvider;
pub use openai::OpenAIProvider;
pub use provider::{complete_text, LlmProvider};
pub use types::*;

/// Build the configured provider.
pub fn create_provider(config: ProviderConfig) -> LlmResult<Arc<dyn LlmProvider>> {
    match config.provider {
        ProviderType::OpenAI => Ok(Arc::new(OpenAIProvider::new(config)?)),
        ProviderType::Ollama => Ok(Arc::new(OllamaProvider::new(config)?)),
    }
}
