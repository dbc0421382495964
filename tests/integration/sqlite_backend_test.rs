//! SQLite Snapshot Integration Tests
//!
//! A real read-only snapshot file serving as the secondary route when the
//! Postgres primary fails.

use std::path::Path;
use std::sync::Arc;

use ran_assistant_core::{
    BackendKind, BackendSet, CapabilityId, CapabilityRegistry, QueryBackend, QueryOutcome,
};
use ran_assistant_llm::LlmProvider;
use ran_assistant_tools::TemplateCatalog;
use ran_config_assistant::backends::SqliteBackend;
use ran_config_assistant::services::{FallbackConfig, FallbackController, LlmSqlSynthesizer};
use rusqlite::Connection;
use serde_json::json;

use super::support::{MockBackend, ScriptedProvider, Stage};

fn seed(path: &Path) {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(
        "CREATE TABLE mavenir_misalignment (
             cell_id TEXT NOT NULL,
             aoi TEXT NOT NULL,
             parameter_name TEXT NOT NULL,
             live_value TEXT,
             gpl_value TEXT
         );
         INSERT INTO mavenir_misalignment VALUES ('MCA001_1', 'MCA', 'gapOffset', '2', '3');
         INSERT INTO mavenir_misalignment VALUES ('MCA001_2', 'MCA', 'gapOffset', '1', '3');
         INSERT INTO mavenir_misalignment VALUES ('MCA002_1', 'MCA', 'gapOffset', '0', '3');
         INSERT INTO mavenir_misalignment VALUES ('DAL001_1', 'DAL', 'gapOffset', '0', '3');",
    )
    .unwrap();
}

#[tokio::test]
async fn test_snapshot_answers_when_postgres_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("snapshot.db");
    seed(&path);

    let provider: Arc<dyn LlmProvider> = Arc::new(ScriptedProvider::new(|stage| match stage {
        Stage::Synthesize { table, .. } => Ok(format!(
            "Here you go:\n```sql\nSELECT COUNT(*) AS misalignments FROM {} WHERE aoi = 'MCA' AND parameter_name = 'gapOffset';\n```",
            table
        )),
        _ => Ok("NONE".to_string()),
    }));
    let registry = CapabilityRegistry::builtin();
    let templates = Arc::new(TemplateCatalog::from_registry(&registry));

    let postgres = Arc::new(MockBackend::empty(BackendKind::Postgres).then_error("connection refused"));
    let sqlite = Arc::new(SqliteBackend::open(&path, 2).unwrap());
    let backends = BackendSet::new().with(postgres.clone()).with(sqlite);

    let controller = FallbackController::new(
        backends,
        Arc::new(LlmSqlSynthesizer::new(provider, templates)),
        FallbackConfig::default(),
    );
    let capability = registry.get(CapabilityId::MavenirMisalignment).unwrap();
    let run = controller
        .execute_with_fallback(
            "How many gapOffset misalignments in MCA for mavenir?",
            &capability.primary,
            &capability.secondary,
        )
        .await;

    assert_eq!(postgres.calls(), 1);
    assert_eq!(run.attempts.len(), 2);
    assert_eq!(run.attempts[1].backend, BackendKind::Sqlite);
    assert_eq!(
        run.outcome,
        QueryOutcome::Success(serde_json::from_value(json!([{"misalignments": 3}])).unwrap())
    );
}

#[tokio::test]
async fn test_snapshot_health_check() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("snapshot.db");
    seed(&path);

    let backend = SqliteBackend::open(&path, 1).unwrap();
    assert!(backend.health_check().await.is_ok());
}
