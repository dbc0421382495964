//! Backend Fallback Service
//!
//! Runs a capability's primary route and, when it yields nothing usable,
//! its single secondary route.

mod chain;

pub use chain::{FailureReason, FallbackConfig, FallbackController, FallbackRun};
