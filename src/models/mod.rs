//! Data Models

pub mod settings;

pub use settings::{AppConfig, BackendsConfig, OrchestratorConfig, PostgresConfig, SqliteConfig, TrinoConfig};
