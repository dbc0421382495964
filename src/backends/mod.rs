//! Backend Executors
//!
//! One `QueryBackend` implementation per data store. Pools and clients are
//! built once here and shared through the `BackendSet`.

pub mod postgres;
pub mod sqlite;
pub mod trino;

use std::sync::Arc;

use ran_assistant_core::BackendSet;

use crate::models::settings::BackendsConfig;
use crate::utils::error::AppResult;

pub use postgres::PostgresBackend;
pub use sqlite::SqliteBackend;
pub use trino::TrinoBackend;

/// Build executors for every configured backend.
pub fn build_backends(config: &BackendsConfig) -> AppResult<BackendSet> {
    let mut backends = BackendSet::new();

    if let Some(trino) = &config.trino {
        backends.register(Arc::new(TrinoBackend::new(trino)?));
        tracing::info!(url = %trino.url, "trino backend configured");
    }
    if let Some(postgres) = &config.postgres {
        backends.register(Arc::new(PostgresBackend::connect(postgres)?));
        tracing::info!(max_connections = postgres.max_connections, "postgres backend configured");
    }
    if let Some(sqlite) = &config.sqlite {
        backends.register(Arc::new(SqliteBackend::open(&sqlite.path, sqlite.max_connections)?));
        tracing::info!(path = %sqlite.path.display(), "sqlite backend configured");
    }

    if backends.kinds().is_empty() {
        tracing::warn!("no backends configured; every query will report an error");
    }
    Ok(backends)
}
