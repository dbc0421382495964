//! Application State
//!
//! Process-wide services, built once from the configuration and shared
//! through `Arc`.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use ran_assistant_core::{BackendSet, CapabilityRegistry};
use ran_assistant_llm::{create_provider, LlmProvider};
use ran_assistant_tools::TemplateCatalog;

use crate::backends::build_backends;
use crate::models::settings::AppConfig;
use crate::services::{
    FallbackController, LlmClassifier, LlmQueryDecomposer, LlmSqlSynthesizer, Orchestrator,
};
use crate::utils::error::{AppError, AppResult};

/// Health of one external dependency.
#[derive(Debug, Clone, Serialize)]
pub struct ComponentHealth {
    pub name: String,
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ComponentHealth {
    fn from_result<E: std::fmt::Display>(name: impl Into<String>, result: Result<(), E>) -> Self {
        match result {
            Ok(()) => Self {
                name: name.into(),
                healthy: true,
                error: None,
            },
            Err(e) => Self {
                name: name.into(),
                healthy: false,
                error: Some(e.to_string()),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub llm: ComponentHealth,
    pub backends: Vec<ComponentHealth>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.llm.healthy && self.backends.iter().all(|b| b.healthy)
    }
}

/// Application state shared by every request
pub struct AppState {
    config: AppConfig,
    registry: Arc<CapabilityRegistry>,
    templates: Arc<TemplateCatalog>,
    provider: Arc<dyn LlmProvider>,
    backends: BackendSet,
    classifier: Arc<LlmClassifier>,
    orchestrator: Arc<Orchestrator>,
}

impl AppState {
    /// Build every service from `config`.
    ///
    /// Environment overrides are applied to a copy, so secrets from the
    /// environment never end up in the saved file.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let config = config.with_env_overrides();
        config.validate().map_err(AppError::validation)?;

        let provider = create_provider(config.llm.clone())?;
        tracing::info!(provider = provider.name(), model = provider.model(), "llm provider ready");

        let registry = Arc::new(CapabilityRegistry::builtin());
        let templates = Arc::new(TemplateCatalog::from_registry(&registry));
        let backends = build_backends(&config.backends)?;

        let timeouts = &config.orchestrator;
        let decomposer = Arc::new(LlmQueryDecomposer::new(
            provider.clone(),
            Duration::from_secs(timeouts.decomposition_timeout_seconds),
        ));
        let classifier = Arc::new(LlmClassifier::new(
            provider.clone(),
            registry.clone(),
            Duration::from_secs(timeouts.classification_timeout_seconds),
        ));
        let synthesizer = Arc::new(LlmSqlSynthesizer::new(provider.clone(), templates.clone()));
        let fallback = Arc::new(
            FallbackController::new(backends.clone(), synthesizer, config.fallback.clone())
                .with_synthesis_timeout(Duration::from_secs(timeouts.synthesis_timeout_seconds)),
        );
        let orchestrator = Arc::new(Orchestrator::new(
            registry.clone(),
            decomposer,
            classifier.clone(),
            fallback,
        ));

        Ok(Self {
            config,
            registry,
            templates,
            provider,
            backends,
            classifier,
            orchestrator,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    pub fn templates(&self) -> &TemplateCatalog {
        &self.templates
    }

    pub fn backends(&self) -> &BackendSet {
        &self.backends
    }

    pub fn classifier(&self) -> Arc<LlmClassifier> {
        self.classifier.clone()
    }

    pub fn orchestrator(&self) -> Arc<Orchestrator> {
        self.orchestrator.clone()
    }

    /// Probe the model and every configured backend.
    pub async fn health(&self) -> HealthReport {
        let llm = ComponentHealth::from_result(
            format!("llm:{}", self.provider.name()),
            self.provider.health_check().await,
        );

        let mut backends = Vec::new();
        for kind in self.backends.kinds() {
            let result = match self.backends.get(kind) {
                Some(backend) => backend.health_check().await,
                None => continue,
            };
            backends.push(ComponentHealth::from_result(kind.as_str(), result));
        }

        HealthReport { llm, backends }
    }
}
