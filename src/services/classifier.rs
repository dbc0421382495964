//! Capability Classifier
//!
//! Asks the model which table answers a sub-question, then projects the free
//! text through the identifier parser and the registry. The model's answer is
//! never trusted beyond that projection.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use ran_assistant_core::{
    BackendKind, Capability, CapabilityFamily, CapabilityRegistry, ClassificationFailure, Route,
    Vendor,
};
use ran_assistant_llm::{complete_text, LlmProvider, LlmRequestOptions};
use ran_assistant_tools::{
    classification_system_prompt, classification_user_message, extract_identifier,
    ExtractedIdentifier,
};

use crate::utils::error::{AppError, AppResult};

/// A sub-question resolved to a capability.
#[derive(Debug, Clone, Serialize)]
pub struct Classification {
    pub capability: Capability,
    pub identifier: ExtractedIdentifier,
}

impl Classification {
    /// Backend owning the namespace the model named, if any.
    pub fn owner(&self) -> Option<BackendKind> {
        self.identifier.owner()
    }

    /// `(primary, secondary)` for this request.
    pub fn routes(&self) -> (&Route, &Route) {
        self.capability.routes_for(self.owner())
    }
}

/// Result of a classification call that reached the model.
#[derive(Debug, Clone)]
pub enum ClassifierVerdict {
    Matched(Classification),
    Unmatched(ClassificationFailure),
}

#[async_trait]
pub trait CapabilityClassifier: Send + Sync {
    /// Classify one sub-question within `family`.
    ///
    /// `Err` is reserved for an unreachable model. A reply that names no
    /// known capability is `Ok(ClassifierVerdict::Unmatched)`.
    async fn classify(
        &self,
        family: CapabilityFamily,
        sub_question: &str,
        vendor_hint: Option<Vendor>,
    ) -> AppResult<ClassifierVerdict>;
}

/// Project a classifier reply onto the registry.
pub fn resolve_reply(
    registry: &CapabilityRegistry,
    family: CapabilityFamily,
    reply: &str,
) -> ClassifierVerdict {
    let Some(identifier) = extract_identifier(reply) else {
        return ClassifierVerdict::Unmatched(ClassificationFailure::no_identifier(reply.trim()));
    };

    match registry.resolve(family, &identifier.normalized) {
        Ok(capability) => ClassifierVerdict::Matched(Classification {
            capability: capability.clone(),
            identifier,
        }),
        Err(failure) => ClassifierVerdict::Unmatched(failure),
    }
}

/// Classifier backed by a text-generation model. One call, no retries.
pub struct LlmClassifier {
    provider: Arc<dyn LlmProvider>,
    registry: Arc<CapabilityRegistry>,
    timeout: Duration,
}

impl LlmClassifier {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        registry: Arc<CapabilityRegistry>,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            registry,
            timeout,
        }
    }
}

#[async_trait]
impl CapabilityClassifier for LlmClassifier {
    async fn classify(
        &self,
        family: CapabilityFamily,
        sub_question: &str,
        vendor_hint: Option<Vendor>,
    ) -> AppResult<ClassifierVerdict> {
        let system = classification_system_prompt(family, &self.registry);
        let user = classification_user_message(sub_question, vendor_hint);
        let call = complete_text(
            self.provider.as_ref(),
            &system,
            &user,
            LlmRequestOptions::deterministic(),
        );

        let reply = tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| {
                AppError::classification(format!("no reply within {}s", self.timeout.as_secs()))
            })?
            .map_err(|e| AppError::classification(e.to_string()))?;

        let verdict = resolve_reply(&self.registry, family, &reply);
        match &verdict {
            ClassifierVerdict::Matched(c) => tracing::debug!(
                family = %family,
                capability = %c.capability.key,
                identifier = %c.identifier.raw,
                "sub-question classified"
            ),
            ClassifierVerdict::Unmatched(failure) => tracing::info!(
                family = %family,
                reason = %failure.reason,
                "classification produced no capability"
            ),
        }
        Ok(verdict)
    }
}
