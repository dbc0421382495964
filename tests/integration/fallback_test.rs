//! Fallback Controller Integration Tests
//!
//! Exactly one hop, whatever the primary and secondary do.

use std::sync::Arc;
use std::time::Duration;

use ran_assistant_core::{
    BackendKind, BackendSet, CapabilityId, CapabilityRegistry, QueryOutcome, Route,
};
use ran_assistant_llm::LlmProvider;
use ran_assistant_tools::TemplateCatalog;
use ran_config_assistant::services::{
    FailureReason, FallbackConfig, FallbackController, FallbackRun, LlmSqlSynthesizer,
};
use serde_json::json;

use super::support::{default_reply, MockBackend, ScriptedProvider, Stage};

struct Setup {
    controller: FallbackController,
    provider: Arc<ScriptedProvider>,
    postgres: Arc<MockBackend>,
    sqlite: Arc<MockBackend>,
}

fn setup(provider: ScriptedProvider, postgres: MockBackend, sqlite: MockBackend) -> Setup {
    let provider = Arc::new(provider);
    let postgres = Arc::new(postgres);
    let sqlite = Arc::new(sqlite);
    let registry = CapabilityRegistry::builtin();
    let llm: Arc<dyn LlmProvider> = provider.clone();
    let synthesizer = LlmSqlSynthesizer::new(llm, Arc::new(TemplateCatalog::from_registry(&registry)));
    let backends = BackendSet::new().with(postgres.clone()).with(sqlite.clone());
    let controller = FallbackController::new(backends, Arc::new(synthesizer), FallbackConfig::default())
        .with_attempt_timeout(Duration::from_millis(100));

    Setup {
        controller,
        provider,
        postgres,
        sqlite,
    }
}

fn gpl_routes() -> (Route, Route) {
    let registry = CapabilityRegistry::builtin();
    let capability = registry.get(CapabilityId::MavenirGplDu).unwrap();
    (capability.primary.clone(), capability.secondary.clone())
}

async fn run(setup: &Setup) -> FallbackRun {
    let (primary, secondary) = gpl_routes();
    setup
        .controller
        .execute_with_fallback("recommended gapOffset for mavenir DU", &primary, &secondary)
        .await
}

#[tokio::test]
async fn test_primary_rows_stop_the_chain() {
    let s = setup(
        ScriptedProvider::new(default_reply),
        MockBackend::new(BackendKind::Postgres, json!([{"gpl_value": "3"}])),
        MockBackend::new(BackendKind::Sqlite, json!([{"gpl_value": "4"}])),
    );
    let result = run(&s).await;

    assert_eq!(result.attempts.len(), 1);
    assert!(!result.fell_back());
    assert_eq!(s.sqlite.calls(), 0);
    assert_eq!(result.outcome.to_body(), ran_assistant_core::ResponseBody::Rows(
        serde_json::from_value(json!([{"gpl_value": "3"}])).unwrap()
    ));
}

#[tokio::test]
async fn test_empty_primary_makes_exactly_one_secondary_attempt() {
    let s = setup(
        ScriptedProvider::new(default_reply),
        MockBackend::new(BackendKind::Postgres, json!([{"gpl_value": null}])),
        MockBackend::empty(BackendKind::Sqlite),
    );
    let result = run(&s).await;

    assert_eq!(result.attempts.len(), 2);
    assert_eq!(s.postgres.calls(), 1);
    assert_eq!(s.sqlite.calls(), 1);
    assert_eq!(result.fallback_reason, Some(FailureReason::EmptyResult));
    assert_eq!(result.outcome, QueryOutcome::no_data());
}

#[tokio::test]
async fn test_secondary_uses_its_own_template() {
    let s = setup(
        ScriptedProvider::new(default_reply),
        MockBackend::empty(BackendKind::Postgres),
        MockBackend::new(BackendKind::Sqlite, json!([{"gpl_value": "4"}])),
    );
    let result = run(&s).await;

    assert!(result.outcome.is_success());
    assert_eq!(s.postgres.queries(), vec!["SELECT * FROM gpl.mavenir_gpl_du"]);
    assert_eq!(s.sqlite.queries(), vec!["SELECT * FROM mavenir_gpl_du"]);
    assert_eq!(s.provider.synthesize_calls(), 2);
}

#[tokio::test]
async fn test_primary_error_falls_back() {
    let s = setup(
        ScriptedProvider::new(default_reply),
        MockBackend::empty(BackendKind::Postgres).then_error("relation \"gpl.mavenir_gpl_du\" does not exist"),
        MockBackend::new(BackendKind::Sqlite, json!([{"gpl_value": "4"}])),
    );
    let result = run(&s).await;

    assert_eq!(result.fallback_reason, Some(FailureReason::QueryRejected));
    assert!(!result.attempts[0].succeeded);
    assert!(result.attempts[1].succeeded);
    assert!(result.outcome.is_success());
}

#[tokio::test]
async fn test_both_failing_is_a_generic_error() {
    let s = setup(
        ScriptedProvider::new(default_reply),
        MockBackend::empty(BackendKind::Postgres).then_error("password authentication failed"),
        MockBackend::empty(BackendKind::Sqlite).then_error("no such table: mavenir_gpl_du"),
    );
    let result = run(&s).await;

    assert_eq!(result.attempts.len(), 2);
    assert_eq!(result.outcome, QueryOutcome::query_error());
    // raw details stay in the attempts, never in the outcome
    let body = serde_json::to_string(&result.outcome.to_body()).unwrap();
    assert!(!body.contains("password"));
    assert!(!body.contains("no such table"));
}

#[tokio::test]
async fn test_secondary_empty_after_primary_error_is_no_data() {
    let s = setup(
        ScriptedProvider::new(default_reply),
        MockBackend::empty(BackendKind::Postgres).then_error("connection reset"),
        MockBackend::empty(BackendKind::Sqlite),
    );
    let result = run(&s).await;
    assert_eq!(result.fallback_reason, Some(FailureReason::NetworkError));
    assert_eq!(result.outcome, QueryOutcome::no_data());
}

#[tokio::test]
async fn test_synthesis_failure_skips_primary_backend() {
    let provider = ScriptedProvider::new(|stage| match stage {
        Stage::Synthesize { table, .. } if table.starts_with("gpl.") => {
            Ok("I cannot answer that from the available columns.".to_string())
        }
        other => default_reply(other),
    });
    let s = setup(
        provider,
        MockBackend::new(BackendKind::Postgres, json!([{"gpl_value": "3"}])),
        MockBackend::new(BackendKind::Sqlite, json!([{"gpl_value": "4"}])),
    );
    let result = run(&s).await;

    assert_eq!(s.postgres.calls(), 0);
    assert_eq!(s.sqlite.calls(), 1);
    assert_eq!(result.fallback_reason, Some(FailureReason::SynthesisFailed));
    assert!(result.attempts[0].query_text.is_none());
    assert!(result.outcome.is_success());
}

#[tokio::test]
async fn test_write_statement_is_a_synthesis_failure() {
    let provider = ScriptedProvider::new(|stage| match stage {
        Stage::Synthesize { .. } => Ok("```sql\nDELETE FROM gpl.mavenir_gpl_du\n```".to_string()),
        other => default_reply(other),
    });
    let s = setup(
        provider,
        MockBackend::empty(BackendKind::Postgres),
        MockBackend::empty(BackendKind::Sqlite),
    );
    let result = run(&s).await;

    assert_eq!(s.postgres.calls() + s.sqlite.calls(), 0);
    assert_eq!(result.attempts.len(), 2);
    assert_eq!(result.outcome, QueryOutcome::query_error());
}

#[tokio::test]
async fn test_timeout_counts_as_execution_error() {
    let s = setup(
        ScriptedProvider::new(default_reply),
        MockBackend::new(BackendKind::Postgres, json!([{"gpl_value": "3"}]))
            .with_delay(Duration::from_millis(500)),
        MockBackend::new(BackendKind::Sqlite, json!([{"gpl_value": "4"}])),
    );
    let result = run(&s).await;

    assert_eq!(result.fallback_reason, Some(FailureReason::Timeout));
    assert_eq!(result.attempts.len(), 2);
    assert_eq!(result.outcome, QueryOutcome::Success(
        serde_json::from_value(json!([{"gpl_value": "4"}])).unwrap()
    ));
}

#[tokio::test]
async fn test_missing_backend_falls_back() {
    let provider = Arc::new(ScriptedProvider::new(default_reply));
    let sqlite = Arc::new(MockBackend::new(BackendKind::Sqlite, json!([{"gpl_value": "4"}])));
    let registry = CapabilityRegistry::builtin();
    let llm: Arc<dyn LlmProvider> = provider;
    let controller = FallbackController::new(
        BackendSet::new().with(sqlite.clone()),
        Arc::new(LlmSqlSynthesizer::new(llm, Arc::new(TemplateCatalog::from_registry(&registry)))),
        FallbackConfig::default(),
    );
    let (primary, secondary) = gpl_routes();
    let result = controller
        .execute_with_fallback("recommended gapOffset", &primary, &secondary)
        .await;

    assert_eq!(result.fallback_reason, Some(FailureReason::Unavailable));
    assert!(result.outcome.is_success());
}
