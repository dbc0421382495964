//! RAN Config Assistant
//!
//! Answers natural-language questions about RAN configuration data. A
//! question is decomposed into sub-questions, each one is routed to a
//! capability, turned into SQL and executed against its primary backend,
//! with a single fallback hop to a secondary backend when the primary comes
//! back empty or fails.
//!
//! Foundational types live in `ran-assistant-core`, model access in
//! `ran-assistant-llm`, and prompt/reply handling in `ran-assistant-tools`.

pub mod backends;
pub mod models;
pub mod services;
pub mod state;
pub mod storage;
pub mod utils;

pub use state::AppState;
pub use utils::error::{AppError, AppResult};
