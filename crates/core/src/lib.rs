//! RAN Assistant Core
//!
//! Foundational types for the RAN configuration assistant workspace. This
//! crate has no knowledge of LLM providers, HTTP, or database drivers.
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`, `CoreResult`)
//! - `rows` - Row model and the empty/null normalizer that gates fallback
//! - `capability` - Capability registry, families, vendors and routes
//! - `outcome` - Execution attempts, routed answers and the response envelope
//! - `backend` - Backend executor trait and the process-wide backend set
//! - `proxy` - Proxy configuration data types shared across workspace crates
//!
//! ## Design Principles
//!
//! 1. **Zero external dependencies beyond serde/async-trait/thiserror**
//! 2. **Closed types at the routing seams** - capabilities and outcomes are enums, not strings
//! 3. **Unidirectional dependency** - this crate depends on nothing else in the workspace

pub mod error;
pub mod rows;
pub mod capability;
pub mod outcome;
pub mod backend;
pub mod proxy;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{CoreError, CoreResult};

// ── Rows ───────────────────────────────────────────────────────────────
pub use rows::{is_empty_result, Row, Rows};

// ── Capabilities ───────────────────────────────────────────────────────
pub use capability::{
    BackendKind, Capability, CapabilityFamily, CapabilityId, CapabilityRegistry,
    ClassificationFailure, FailureKind, Route, Vendor,
};

// ── Outcomes ───────────────────────────────────────────────────────────
pub use outcome::{
    AnswerSet, ExecutionAttempt, QueryOutcome, ResponseBody, ResponseEnvelope, RoutedAnswer,
    SubQuery, ToolInput, NO_DATA_MESSAGE, QUERY_ERROR_MESSAGE, RETRY_LATER_MESSAGE,
};

// ── Backends ───────────────────────────────────────────────────────────
pub use backend::{BackendSet, QueryBackend};

// ── Proxy Types ────────────────────────────────────────────────────────
pub use proxy::{ProxyConfig, ProxyProtocol};
