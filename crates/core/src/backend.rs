//! Backend Executor Trait
//!
//! Each data store exposes exactly one operation: run a query string and hand
//! back rows. The orchestrator never depends on column names, quoting style
//! or pagination; it only asks the row normalizer about what comes back.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::capability::BackendKind;
use crate::error::{CoreError, CoreResult};
use crate::rows::Rows;

/// A read-only query executor for one backend.
#[async_trait]
pub trait QueryBackend: Send + Sync {
    /// Which backend this executor talks to.
    fn kind(&self) -> BackendKind;

    /// Execute a single read-only query.
    ///
    /// # Returns
    /// - `Ok(rows)` - possibly empty
    /// - `Err(CoreError)` - network, auth or syntax failure
    async fn execute(&self, query: &str) -> CoreResult<Rows>;

    /// Cheap liveness probe. Defaults to `SELECT 1`.
    async fn health_check(&self) -> CoreResult<()> {
        self.execute("SELECT 1").await.map(|_| ())
    }
}

/// Process-wide set of backend executors, built once at startup.
#[derive(Clone, Default)]
pub struct BackendSet {
    backends: HashMap<BackendKind, Arc<dyn QueryBackend>>,
}

impl BackendSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an executor under its own kind, replacing any previous one.
    pub fn register(&mut self, backend: Arc<dyn QueryBackend>) {
        self.backends.insert(backend.kind(), backend);
    }

    /// Builder-style `register`.
    pub fn with(mut self, backend: Arc<dyn QueryBackend>) -> Self {
        self.register(backend);
        self
    }

    pub fn get(&self, kind: BackendKind) -> Option<Arc<dyn QueryBackend>> {
        self.backends.get(&kind).cloned()
    }

    pub fn contains(&self, kind: BackendKind) -> bool {
        self.backends.contains_key(&kind)
    }

    /// Registered kinds in a stable order.
    pub fn kinds(&self) -> Vec<BackendKind> {
        BackendKind::ALL
            .into_iter()
            .filter(|k| self.backends.contains_key(k))
            .collect()
    }

    /// Execute on the given backend.
    ///
    /// Returns `Err(CoreError::Unavailable)` if no executor is registered.
    pub async fn execute(&self, kind: BackendKind, query: &str) -> CoreResult<Rows> {
        match self.backends.get(&kind) {
            Some(backend) => backend.execute(query).await,
            None => Err(CoreError::unavailable(format!("no {} backend configured", kind))),
        }
    }
}

impl std::fmt::Debug for BackendSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendSet").field("kinds", &self.kinds()).finish()
    }
}
