//! Services
//!
//! Question routing for the assistant: decomposition, classification, SQL
//! synthesis, the backend fallback chain and the orchestrator tying them
//! together.

pub mod classifier;
pub mod decomposer;
pub mod fallback;
pub mod orchestrator;
pub mod synthesizer;

pub use classifier::{CapabilityClassifier, Classification, ClassifierVerdict, LlmClassifier};
pub use decomposer::{LlmQueryDecomposer, PassthroughDecomposer, QueryDecomposer};
pub use fallback::{FailureReason, FallbackConfig, FallbackController, FallbackRun};
pub use orchestrator::Orchestrator;
pub use synthesizer::{LlmSqlSynthesizer, SqlSynthesizer};
