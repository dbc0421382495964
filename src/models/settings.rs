//! Settings Models
//!
//! Application configuration stored in config.json.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use ran_assistant_core::ProxyConfig;
use ran_assistant_llm::ProviderConfig;

use crate::services::fallback::FallbackConfig;

/// Environment variable that overrides the configured LLM API key.
pub const API_KEY_ENV: &str = "RAN_ASSISTANT_LLM_API_KEY";

/// Application configuration stored in config.json
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Text-generation provider used for decomposition, classification and synthesis
    #[serde(default)]
    pub llm: ProviderConfig,
    /// Data stores; only configured backends are connected
    #[serde(default)]
    pub backends: BackendsConfig,
    /// Primary/secondary execution behavior
    #[serde(default)]
    pub fallback: FallbackConfig,
    /// Deadlines for the model calls around execution
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
}

/// Connection settings for each backend kind
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trino: Option<TrinoConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postgres: Option<PostgresConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sqlite: Option<SqliteConfig>,
}

impl BackendsConfig {
    pub fn is_empty(&self) -> bool {
        self.trino.is_none() && self.postgres.is_none() && self.sqlite.is_none()
    }
}

/// Trino coordinator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrinoConfig {
    /// Coordinator URL, e.g. `http://trino.internal:8080`
    pub url: String,
    #[serde(default = "default_trino_user")]
    pub user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<ProxyConfig>,
}

fn default_trino_user() -> String {
    "ran-assistant".to_string()
}

/// Postgres server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostgresConfig {
    /// Connection string, e.g. `postgresql://reader@db.internal/ran`
    pub url: String,
    #[serde(default = "default_pool_size")]
    pub max_connections: u32,
}

/// Local SQLite snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqliteConfig {
    pub path: PathBuf,
    #[serde(default = "default_pool_size")]
    pub max_connections: u32,
}

fn default_pool_size() -> u32 {
    4
}

/// Deadlines for model calls made by the orchestrator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Per synthesis call; a timeout counts as an execution error
    #[serde(default = "default_synthesis_timeout")]
    pub synthesis_timeout_seconds: u64,
    /// Per classification call
    #[serde(default = "default_classification_timeout")]
    pub classification_timeout_seconds: u64,
    /// Per decomposition call
    #[serde(default = "default_decomposition_timeout")]
    pub decomposition_timeout_seconds: u64,
}

fn default_synthesis_timeout() -> u64 {
    60
}

fn default_classification_timeout() -> u64 {
    30
}

fn default_decomposition_timeout() -> u64 {
    30
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            synthesis_timeout_seconds: default_synthesis_timeout(),
            classification_timeout_seconds: default_classification_timeout(),
            decomposition_timeout_seconds: default_decomposition_timeout(),
        }
    }
}

impl AppConfig {
    /// Copy of this config with environment overrides applied.
    ///
    /// Overrides are never written back to disk.
    pub fn with_env_overrides(&self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    fn with_overrides_from(&self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = self.clone();
        if let Some(key) = lookup(API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
            config.llm.api_key = Some(key);
        }
        config
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.llm.model.trim().is_empty() {
            return Err("llm.model must not be empty".to_string());
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(format!(
                "Invalid llm.temperature: {}. Must be between 0.0 and 2.0",
                self.llm.temperature
            ));
        }
        if let Some(base_url) = &self.llm.base_url {
            url::Url::parse(base_url).map_err(|e| format!("Invalid llm.base_url {}: {}", base_url, e))?;
        }

        if let Some(trino) = &self.backends.trino {
            let parsed = url::Url::parse(&trino.url)
                .map_err(|e| format!("Invalid backends.trino.url {}: {}", trino.url, e))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(format!("backends.trino.url must be http(s): {}", trino.url));
            }
            if trino.user.trim().is_empty() {
                return Err("backends.trino.user must not be empty".to_string());
            }
        }
        if let Some(postgres) = &self.backends.postgres {
            if !(postgres.url.starts_with("postgres://") || postgres.url.starts_with("postgresql://")) {
                return Err("backends.postgres.url must start with postgres:// or postgresql://".to_string());
            }
            if postgres.max_connections == 0 {
                return Err("backends.postgres.max_connections must be at least 1".to_string());
            }
        }
        if let Some(sqlite) = &self.backends.sqlite {
            if sqlite.path.as_os_str().is_empty() {
                return Err("backends.sqlite.path must not be empty".to_string());
            }
            if sqlite.max_connections == 0 {
                return Err("backends.sqlite.max_connections must be at least 1".to_string());
            }
        }

        if self.fallback.timeout_per_attempt_seconds == 0 {
            return Err("fallback.timeout_per_attempt_seconds must be at least 1".to_string());
        }
        if self.orchestrator.synthesis_timeout_seconds == 0
            || self.orchestrator.classification_timeout_seconds == 0
            || self.orchestrator.decomposition_timeout_seconds == 0
        {
            return Err("orchestrator timeouts must be at least 1 second".to_string());
        }

        Ok(())
    }
}
