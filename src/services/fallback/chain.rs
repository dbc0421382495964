//! Backend Fallback Chain
//!
//! Two states, linear: the primary route, then exactly one hop to the
//! secondary route when the primary came back empty or failed. The secondary
//! is terminal whatever it returns.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use ran_assistant_core::{
    BackendSet, CoreError, ExecutionAttempt, QueryOutcome, Route, Rows,
};

use crate::services::synthesizer::SqlSynthesizer;
use crate::utils::error::AppError;

/// Why an attempt did not produce usable rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// Query ran but every row was empty or null
    EmptyResult,
    /// The generator returned no usable query
    SynthesisFailed,
    /// Synthesis or execution exceeded its deadline
    Timeout,
    /// Backend not configured or unreachable
    Unavailable,
    /// Network/connection error
    NetworkError,
    /// Backend rejected the query (syntax, permissions, missing table)
    QueryRejected,
    /// Anything else
    Error,
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::EmptyResult => write!(f, "empty_result"),
            FailureReason::SynthesisFailed => write!(f, "synthesis_failed"),
            FailureReason::Timeout => write!(f, "timeout"),
            FailureReason::Unavailable => write!(f, "unavailable"),
            FailureReason::NetworkError => write!(f, "network_error"),
            FailureReason::QueryRejected => write!(f, "query_rejected"),
            FailureReason::Error => write!(f, "error"),
        }
    }
}

impl FailureReason {
    /// Classify an error message into a failure reason
    pub fn from_error_message(msg: &str) -> Self {
        let msg_lower = msg.to_lowercase();

        if msg_lower.contains("unavailable") || msg_lower.contains("not configured") {
            FailureReason::Unavailable
        } else if msg_lower.contains("timeout") || msg_lower.contains("timed out") {
            FailureReason::Timeout
        } else if msg_lower.contains("network") || msg_lower.contains("connection") || msg_lower.contains("socket") {
            FailureReason::NetworkError
        } else if msg_lower.contains("syntax") || msg_lower.contains("does not exist") || msg_lower.contains("permission") {
            FailureReason::QueryRejected
        } else {
            FailureReason::Error
        }
    }

    fn from_backend_error(err: &CoreError) -> Self {
        match err {
            CoreError::Unavailable(_) => FailureReason::Unavailable,
            CoreError::Timeout(_) => FailureReason::Timeout,
            other => Self::from_error_message(&other.to_string()),
        }
    }

    fn from_synthesis_error(err: &AppError) -> Self {
        match err {
            AppError::Timeout(_) => FailureReason::Timeout,
            _ => FailureReason::SynthesisFailed,
        }
    }
}

/// Configuration for fallback behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackConfig {
    /// Timeout per backend execution in seconds
    #[serde(default = "default_timeout")]
    pub timeout_per_attempt_seconds: u64,
    /// Whether to log every attempt, not just transitions
    #[serde(default = "default_log_attempts")]
    pub log_all_attempts: bool,
}

fn default_timeout() -> u64 {
    120
}

fn default_log_attempts() -> bool {
    true
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            timeout_per_attempt_seconds: default_timeout(),
            log_all_attempts: default_log_attempts(),
        }
    }
}

/// Record of one run through the chain.
#[derive(Debug, Clone, Serialize)]
pub struct FallbackRun {
    /// One or two attempts, in order
    pub attempts: Vec<ExecutionAttempt>,
    pub outcome: QueryOutcome,
    /// Why the chain moved to the secondary route, if it did
    pub fallback_reason: Option<FailureReason>,
    /// Timestamp when the run started
    pub started_at: String,
}

impl FallbackRun {
    pub fn fell_back(&self) -> bool {
        self.fallback_reason.is_some()
    }
}

struct AttemptResult {
    attempt: ExecutionAttempt,
    failure: Option<FailureReason>,
}

/// Executes one capability's routes with a single fallback hop.
pub struct FallbackController {
    backends: BackendSet,
    synthesizer: Arc<dyn SqlSynthesizer>,
    config: FallbackConfig,
    attempt_timeout: Duration,
    synthesis_timeout: Duration,
}

impl FallbackController {
    pub fn new(
        backends: BackendSet,
        synthesizer: Arc<dyn SqlSynthesizer>,
        config: FallbackConfig,
    ) -> Self {
        let attempt_timeout = Duration::from_secs(config.timeout_per_attempt_seconds);
        Self {
            backends,
            synthesizer,
            config,
            attempt_timeout,
            synthesis_timeout: Duration::from_secs(60),
        }
    }

    /// Deadline for each synthesis call
    pub fn with_synthesis_timeout(mut self, timeout: Duration) -> Self {
        self.synthesis_timeout = timeout;
        self
    }

    /// Deadline for each backend execution, overriding the config value
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    /// Run the primary route, then the secondary route if needed.
    ///
    /// Never returns an error: failures end as `QueryOutcome::Failure` with a
    /// generic message, and the details stay in the logs and attempts.
    pub async fn execute_with_fallback(
        &self,
        question: &str,
        primary: &Route,
        secondary: &Route,
    ) -> FallbackRun {
        let started_at = chrono::Utc::now().to_rfc3339();

        let first = self.attempt(question, primary).await;
        let reason = match first.failure {
            None if first.attempt.has_data() => {
                let outcome = QueryOutcome::Success(first.attempt.rows.clone().unwrap_or_default());
                return FallbackRun {
                    attempts: vec![first.attempt],
                    outcome,
                    fallback_reason: None,
                    started_at,
                };
            }
            None => FailureReason::EmptyResult,
            Some(reason) => reason,
        };

        if reason == FailureReason::EmptyResult {
            info!(
                from = %primary.backend,
                to = %secondary.backend,
                tool = %primary.tool_name,
                "no valid rows, falling back"
            );
        } else {
            warn!(
                from = %primary.backend,
                to = %secondary.backend,
                tool = %primary.tool_name,
                reason = %reason,
                "primary execution failed, falling back"
            );
        }

        let second = self.attempt(question, secondary).await;
        let outcome = match second.failure {
            None if second.attempt.has_data() => {
                QueryOutcome::Success(second.attempt.rows.clone().unwrap_or_default())
            }
            None => QueryOutcome::no_data(),
            Some(_) => QueryOutcome::query_error(),
        };

        FallbackRun {
            attempts: vec![first.attempt, second.attempt],
            outcome,
            fallback_reason: Some(reason),
            started_at,
        }
    }

    async fn attempt(&self, question: &str, route: &Route) -> AttemptResult {
        let start = Instant::now();
        let synthesis = tokio::time::timeout(
            self.synthesis_timeout,
            self.synthesizer.synthesize(question, &route.template_id),
        )
        .await
        .unwrap_or_else(|_| {
            Err(AppError::timeout(format!(
                "synthesis exceeded {}s",
                self.synthesis_timeout.as_secs()
            )))
        });

        let query = match synthesis {
            Ok(query) => query,
            Err(e) => {
                let reason = FailureReason::from_synthesis_error(&e);
                warn!(backend = %route.backend, template = %route.template_id, error = %e, "query synthesis failed");
                return self.failed(route, None, e.to_string(), reason, start);
            }
        };

        let execution = tokio::time::timeout(
            self.attempt_timeout,
            self.backends.execute(route.backend, &query),
        )
        .await
        .unwrap_or_else(|_| {
            Err(CoreError::timeout(format!(
                "{} query exceeded {}s",
                route.backend,
                self.attempt_timeout.as_secs()
            )))
        });

        match execution {
            Ok(rows) => self.executed(route, query, rows, start),
            Err(e) => {
                let reason = FailureReason::from_backend_error(&e);
                warn!(backend = %route.backend, error = %e, query = %query, "query execution failed");
                self.failed(route, Some(query), e.to_string(), reason, start)
            }
        }
    }

    fn executed(&self, route: &Route, query: String, rows: Rows, start: Instant) -> AttemptResult {
        let duration_ms = start.elapsed().as_millis() as u64;
        if self.config.log_all_attempts {
            info!(backend = %route.backend, rows = rows.len(), duration_ms, "query executed");
        }
        AttemptResult {
            attempt: ExecutionAttempt::executed(route.backend, &route.tool_name, query, rows, duration_ms),
            failure: None,
        }
    }

    fn failed(
        &self,
        route: &Route,
        query: Option<String>,
        error: String,
        reason: FailureReason,
        start: Instant,
    ) -> AttemptResult {
        let duration_ms = start.elapsed().as_millis() as u64;
        debug!(backend = %route.backend, reason = %reason, duration_ms, "attempt failed");
        AttemptResult {
            attempt: ExecutionAttempt::failed(route.backend, &route.tool_name, query, error, duration_ms),
            failure: Some(reason),
        }
    }
}
