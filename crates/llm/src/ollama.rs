//! Ollama Provider
//!
//! Implementation of the LlmProvider trait for Ollama local inference
//! using the ollama-rs native SDK.

use async_trait::async_trait;
use ollama_rs::generation::chat::request::ChatMessageRequest;
use ollama_rs::generation::chat::{ChatMessage, ChatMessageResponse};
use ollama_rs::models::ModelOptions;
use ollama_rs::Ollama;

use super::provider::LlmProvider;
use super::types::{
    LlmError, LlmRequestOptions, LlmResponse, LlmResult, Message, MessageRole, ProviderConfig,
    StopReason, UsageStats,
};
use crate::http_client::build_http_client;

/// Default Ollama API endpoint
const OLLAMA_DEFAULT_URL: &str = "http://localhost:11434";

/// Port Ollama listens on when the URL names none
const OLLAMA_DEFAULT_PORT: u16 = 11434;

/// Ollama provider for local inference
pub struct OllamaProvider {
    config: ProviderConfig,
    client: Ollama,
}

impl OllamaProvider {
    /// Create a new Ollama provider with the given configuration
    pub fn new(config: ProviderConfig) -> LlmResult<Self> {
        let base_url = config.base_url.as_deref().unwrap_or(OLLAMA_DEFAULT_URL);
        let mut url = url::Url::parse(base_url).map_err(|e| LlmError::InvalidRequest {
            message: format!("invalid Ollama URL {}: {}", base_url, e),
        })?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(LlmError::InvalidRequest {
                message: format!("Ollama URL must be http(s) with a host: {}", base_url),
            });
        }
        if url.port().is_none() {
            url.set_port(Some(OLLAMA_DEFAULT_PORT))
                .map_err(|_| LlmError::InvalidRequest {
                    message: format!("cannot set port on Ollama URL {}", base_url),
                })?;
        }

        let mut builder = Ollama::builder().url(url);
        if let Some(proxy) = config.proxy.as_ref() {
            let http_client = build_http_client(Some(proxy), None).map_err(|e| {
                LlmError::Other {
                    message: format!("failed to build HTTP client: {}", e),
                }
            })?;
            builder = builder.reqwest_client(http_client);
        }
        let client = builder.build();

        Ok(Self { config, client })
    }

    fn base_url(&self) -> &str {
        self.config
            .base_url
            .as_deref()
            .unwrap_or(OLLAMA_DEFAULT_URL)
    }

    fn build_chat_request(
        &self,
        messages: &[Message],
        system: Option<&str>,
        request_options: &LlmRequestOptions,
    ) -> ChatMessageRequest {
        let mut chat_messages: Vec<ChatMessage> = Vec::with_capacity(messages.len() + 1);

        if let Some(sys) = system {
            chat_messages.push(ChatMessage::system(sys.to_string()));
        }

        for msg in messages {
            chat_messages.push(match msg.role {
                MessageRole::System => ChatMessage::system(msg.content.clone()),
                MessageRole::User => ChatMessage::user(msg.content.clone()),
                MessageRole::Assistant => ChatMessage::assistant(msg.content.clone()),
            });
        }

        let temperature = request_options
            .temperature_override
            .unwrap_or(self.config.temperature);
        let max_tokens = request_options
            .max_tokens_override
            .unwrap_or(self.config.max_tokens);
        let mut opts = ModelOptions::default().temperature(temperature);
        if max_tokens > 0 {
            opts = opts.num_predict(max_tokens as i32);
        }

        ChatMessageRequest::new(self.config.model.clone(), chat_messages).options(opts)
    }

    fn convert_response(&self, response: ChatMessageResponse) -> LlmResponse {
        let usage = response
            .final_data
            .as_ref()
            .map(|final_data| UsageStats {
                input_tokens: final_data.prompt_eval_count as u32,
                output_tokens: final_data.eval_count as u32,
            })
            .unwrap_or_default();

        let content = response.message.content;
        LlmResponse {
            content: if content.is_empty() { None } else { Some(content) },
            stop_reason: StopReason::EndTurn,
            usage,
            model: response.model,
        }
    }

    fn map_error(&self, msg: String) -> LlmError {
        if msg.contains("connect") || msg.contains("Connection refused") {
            LlmError::ProviderUnavailable {
                message: format!("Cannot connect to Ollama at {}: {}", self.base_url(), msg),
            }
        } else if msg.contains("not found") || msg.contains("404") {
            LlmError::ModelNotFound {
                model: self.config.model.clone(),
            }
        } else {
            LlmError::NetworkError { message: msg }
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &'static str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn send_message(
        &self,
        messages: Vec<Message>,
        system: Option<String>,
        request_options: LlmRequestOptions,
    ) -> LlmResult<LlmResponse> {
        let request = self.build_chat_request(&messages, system.as_deref(), &request_options);

        let response = self
            .client
            .send_chat_messages(request)
            .await
            .map_err(|e| self.map_error(e.to_string()))?;

        Ok(self.convert_response(response))
    }

    async fn health_check(&self) -> LlmResult<()> {
        self.client
            .list_local_models()
            .await
            .map_err(|e| self.map_error(e.to_string()))?;
        Ok(())
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }
}
