//! Configuration Integration Tests
//!
//! File-backed config service and state construction from a loaded file.

use std::fs;

use ran_assistant_core::BackendKind;
use ran_assistant_llm::ProviderType;
use ran_config_assistant::models::AppConfig;
use ran_config_assistant::storage::ConfigService;
use ran_config_assistant::{AppError, AppState};

const FULL_CONFIG: &str = r#"{
  "llm": {
    "provider": "openai",
    "model": "qwen2.5-72b-instruct",
    "base_url": "http://vllm.internal:8000/v1",
    "temperature": 0.0
  },
  "backends": {
    "trino": {"url": "http://trino.internal:8080", "user": "ran-reader", "catalog": "hive", "schema": "ran_cm"},
    "postgres": {"url": "postgresql://reader@pg.internal:5432/ran", "max_connections": 8},
    "sqlite": {"path": "/var/lib/ran-assistant/snapshot.db"}
  },
  "fallback": {"timeout_per_attempt_seconds": 45},
  "orchestrator": {"synthesis_timeout_seconds": 20}
}"#;

#[test]
fn test_load_full_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, FULL_CONFIG).unwrap();

    let service = ConfigService::from_path(&path).unwrap();
    let config = service.get_config();
    assert_eq!(config.llm.provider, ProviderType::OpenAI);
    assert_eq!(config.llm.model, "qwen2.5-72b-instruct");
    assert_eq!(config.backends.trino.as_ref().unwrap().catalog.as_deref(), Some("hive"));
    assert_eq!(config.backends.postgres.as_ref().unwrap().max_connections, 8);
    assert_eq!(config.backends.sqlite.as_ref().unwrap().max_connections, 4);
    assert_eq!(config.fallback.timeout_per_attempt_seconds, 45);
    assert!(config.fallback.log_all_attempts);
    assert_eq!(config.orchestrator.synthesis_timeout_seconds, 20);
    assert_eq!(config.orchestrator.classification_timeout_seconds, 30);
}

#[test]
fn test_state_builds_every_configured_backend() {
    let config: AppConfig = serde_json::from_str(FULL_CONFIG).unwrap();
    let state = AppState::from_config(&config).unwrap();
    assert_eq!(
        state.backends().kinds(),
        vec![BackendKind::Trino, BackendKind::Postgres, BackendKind::Sqlite]
    );
}

#[test]
fn test_saved_file_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, FULL_CONFIG).unwrap();

    let service = ConfigService::from_path(&path).unwrap();
    service.save().unwrap();

    let reloaded = ConfigService::from_path(&path).unwrap();
    assert_eq!(
        reloaded.get_config().backends.trino.as_ref().unwrap().url,
        "http://trino.internal:8080"
    );
    // defaults are written out explicitly
    let raw = fs::read_to_string(&path).unwrap();
    assert!(raw.contains("log_all_attempts"));
}

#[test]
fn test_invalid_backend_config_is_rejected_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    fs::write(
        &path,
        r#"{"backends": {"postgres": {"url": "mysql://db.internal/ran"}}}"#,
    )
    .unwrap();

    let err = ConfigService::from_path(&path).unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}
