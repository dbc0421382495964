//! Shared test doubles: a scripted model, recording backends and a harness
//! wiring them into a real orchestrator.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use ran_assistant_core::{
    BackendKind, BackendSet, CapabilityRegistry, CoreError, CoreResult, QueryBackend, Rows,
};
use ran_assistant_llm::{
    LlmError, LlmProvider, LlmRequestOptions, LlmResponse, LlmResult, Message, ProviderConfig,
    StopReason, UsageStats,
};
use ran_assistant_tools::TemplateCatalog;
use ran_config_assistant::services::{
    FallbackConfig, FallbackController, LlmClassifier, LlmQueryDecomposer, LlmSqlSynthesizer,
    Orchestrator,
};

// ============================================================================
// Scripted model
// ============================================================================

/// Which pipeline stage a model call belongs to, recovered from its prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    Decompose { question: String },
    Classify { question: String, vendor: Option<String> },
    Synthesize { question: String, table: String },
}

type Script = dyn Fn(&Stage) -> LlmResult<String> + Send + Sync;

pub struct ScriptedProvider {
    config: ProviderConfig,
    script: Box<Script>,
    decompose_calls: AtomicUsize,
    classify_calls: AtomicUsize,
    synthesize_calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new(script: impl Fn(&Stage) -> LlmResult<String> + Send + Sync + 'static) -> Self {
        Self {
            config: ProviderConfig::default(),
            script: Box::new(script),
            decompose_calls: AtomicUsize::new(0),
            classify_calls: AtomicUsize::new(0),
            synthesize_calls: AtomicUsize::new(0),
        }
    }

    pub fn decompose_calls(&self) -> usize {
        self.decompose_calls.load(Ordering::SeqCst)
    }

    pub fn classify_calls(&self) -> usize {
        self.classify_calls.load(Ordering::SeqCst)
    }

    pub fn synthesize_calls(&self) -> usize {
        self.synthesize_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.decompose_calls() + self.classify_calls() + self.synthesize_calls()
    }

    fn stage(system: &str, user: &str) -> Stage {
        if system.starts_with("You split questions") {
            Stage::Decompose {
                question: user.trim_start_matches("Q: ").to_string(),
            }
        } else if system.starts_with("You route questions") {
            let (vendor, question) = match user.split_once('\n') {
                Some((first, rest)) if first.starts_with("Vendor: ") => (
                    Some(first.trim_start_matches("Vendor: ").to_string()),
                    rest,
                ),
                _ => (None, user),
            };
            Stage::Classify {
                question: question.trim_start_matches("Q: ").to_string(),
                vendor,
            }
        } else {
            let table = system
                .lines()
                .find_map(|l| l.strip_prefix("Table: "))
                .unwrap_or_default()
                .to_string();
            Stage::Synthesize {
                question: user.trim_start_matches("Question: ").to_string(),
                table,
            }
        }
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    async fn send_message(
        &self,
        messages: Vec<Message>,
        system: Option<String>,
        _request_options: LlmRequestOptions,
    ) -> LlmResult<LlmResponse> {
        let system = system.unwrap_or_default();
        let user = messages.last().map(|m| m.content.clone()).unwrap_or_default();
        let stage = Self::stage(&system, &user);
        let counter = match stage {
            Stage::Decompose { .. } => &self.decompose_calls,
            Stage::Classify { .. } => &self.classify_calls,
            Stage::Synthesize { .. } => &self.synthesize_calls,
        };
        counter.fetch_add(1, Ordering::SeqCst);

        let text = (self.script)(&stage)?;
        Ok(LlmResponse {
            content: Some(text),
            stop_reason: StopReason::EndTurn,
            usage: UsageStats::default(),
            model: "scripted-model".to_string(),
        })
    }

    async fn health_check(&self) -> LlmResult<()> {
        Ok(())
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }
}

pub fn unavailable() -> LlmError {
    LlmError::ProviderUnavailable {
        message: "connection refused".to_string(),
    }
}

/// Default reply for each stage: atomic decomposition, a fenced query that
/// names the table it was asked for.
pub fn default_reply(stage: &Stage) -> LlmResult<String> {
    Ok(match stage {
        Stage::Decompose { question } => serde_json::to_string(&vec![question])
            .map_err(|e| LlmError::Other { message: e.to_string() })?,
        Stage::Classify { .. } => "NONE".to_string(),
        Stage::Synthesize { table, .. } => format!("```sql\nSELECT * FROM {}\n```", table),
    })
}

// ============================================================================
// Recording backend
// ============================================================================

/// Replies with queued results, then with `default_rows` on every call.
pub struct MockBackend {
    kind: BackendKind,
    queued: Mutex<VecDeque<CoreResult<Rows>>>,
    default_rows: Value,
    delay: Option<Duration>,
    queries: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl MockBackend {
    pub fn new(kind: BackendKind, default_rows: Value) -> Self {
        Self {
            kind,
            queued: Mutex::new(VecDeque::new()),
            default_rows,
            delay: None,
            queries: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn empty(kind: BackendKind) -> Self {
        Self::new(kind, Value::Array(vec![]))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn then_rows(self, rows: Value) -> Self {
        let parsed: Rows = serde_json::from_value(rows).unwrap();
        self.queued.lock().unwrap().push_back(Ok(parsed));
        self
    }

    pub fn then_error(self, message: &str) -> Self {
        self.queued
            .lock()
            .unwrap()
            .push_back(Err(CoreError::backend(message)));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl QueryBackend for MockBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    async fn execute(&self, query: &str) -> CoreResult<Rows> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let queued = self.queued.lock().unwrap().pop_front();
        match queued {
            Some(result) => result,
            None => Ok(serde_json::from_value(self.default_rows.clone())?),
        }
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct Harness {
    pub orchestrator: Orchestrator,
    pub provider: Arc<ScriptedProvider>,
    pub trino: Arc<MockBackend>,
    pub postgres: Arc<MockBackend>,
    pub sqlite: Arc<MockBackend>,
}

impl Harness {
    pub fn new(
        provider: ScriptedProvider,
        trino: MockBackend,
        postgres: MockBackend,
        sqlite: MockBackend,
    ) -> Self {
        Self::with_timeouts(provider, trino, postgres, sqlite, Duration::from_secs(5))
    }

    pub fn with_timeouts(
        provider: ScriptedProvider,
        trino: MockBackend,
        postgres: MockBackend,
        sqlite: MockBackend,
        attempt_timeout: Duration,
    ) -> Self {
        let provider = Arc::new(provider);
        let trino = Arc::new(trino);
        let postgres = Arc::new(postgres);
        let sqlite = Arc::new(sqlite);

        let registry = Arc::new(CapabilityRegistry::builtin());
        let templates = Arc::new(TemplateCatalog::from_registry(&registry));
        let backends = BackendSet::new()
            .with(trino.clone())
            .with(postgres.clone())
            .with(sqlite.clone());

        let llm: Arc<dyn LlmProvider> = provider.clone();
        let fallback = FallbackController::new(
            backends,
            Arc::new(LlmSqlSynthesizer::new(llm.clone(), templates)),
            FallbackConfig::default(),
        )
        .with_attempt_timeout(attempt_timeout)
        .with_synthesis_timeout(Duration::from_secs(5));

        let orchestrator = Orchestrator::new(
            registry.clone(),
            Arc::new(LlmQueryDecomposer::new(llm.clone(), Duration::from_secs(5))),
            Arc::new(LlmClassifier::new(llm, registry, Duration::from_secs(5))),
            Arc::new(fallback),
        );

        Self {
            orchestrator,
            provider,
            trino,
            postgres,
            sqlite,
        }
    }

    pub fn backend_calls(&self) -> usize {
        self.trino.calls() + self.postgres.calls() + self.sqlite.calls()
    }
}
