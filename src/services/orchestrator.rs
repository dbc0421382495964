//! Orchestrator
//!
//! Entry point of every top-level tool. Runs the whole-question pre-check,
//! decomposes, then routes each sub-question through classification and the
//! fallback chain. Sub-question pipelines run concurrently; `join_all` keeps
//! their results in decomposition order.

use std::sync::Arc;

use futures_util::future::join_all;
use tracing::{error, info, warn};

use ran_assistant_core::{
    AnswerSet, CapabilityFamily, CapabilityRegistry, ClassificationFailure, QueryOutcome,
    ResponseEnvelope, RoutedAnswer, SubQuery, ToolInput, RETRY_LATER_MESSAGE,
};
use ran_assistant_tools::{guidance_message, requests_ratio, RATIO_UNSUPPORTED_MESSAGE};

use crate::services::classifier::{CapabilityClassifier, ClassifierVerdict};
use crate::services::decomposer::QueryDecomposer;
use crate::services::fallback::FallbackController;

/// Outcome of one sub-question pipeline.
struct Routed {
    answer: RoutedAnswer,
    classifier_unavailable: bool,
}

pub struct Orchestrator {
    registry: Arc<CapabilityRegistry>,
    decomposer: Arc<dyn QueryDecomposer>,
    classifier: Arc<dyn CapabilityClassifier>,
    fallback: Arc<FallbackController>,
}

impl Orchestrator {
    pub fn new(
        registry: Arc<CapabilityRegistry>,
        decomposer: Arc<dyn QueryDecomposer>,
        classifier: Arc<dyn CapabilityClassifier>,
        fallback: Arc<FallbackController>,
    ) -> Self {
        Self {
            registry,
            decomposer,
            classifier,
            fallback,
        }
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    /// Answer a question with the tool for `family`, flattened into the
    /// two-field envelope.
    pub async fn invoke(&self, family: CapabilityFamily, input: ToolInput) -> ResponseEnvelope {
        let answers = self.answer(family, &input.user_question).await;
        answers.into_envelope(input.user_question)
    }

    /// Answer a question with the tool for `family`.
    pub async fn answer(&self, family: CapabilityFamily, user_question: &str) -> AnswerSet {
        let question = user_question.trim();
        if question.is_empty() {
            return AnswerSet::ShortCircuit(guidance_message(
                family,
                &ClassificationFailure::no_identifier(""),
            ));
        }

        if requests_ratio(question) {
            info!(family = %family, "ratio question short-circuited");
            return AnswerSet::ShortCircuit(RATIO_UNSUPPORTED_MESSAGE.to_string());
        }

        let sub_questions = match self.decomposer.decompose(question).await {
            Ok(subs) if !subs.is_empty() => subs,
            Ok(_) => vec![question.to_string()],
            Err(e) => {
                error!(family = %family, error = %e, "decomposer unavailable");
                return AnswerSet::ShortCircuit(RETRY_LATER_MESSAGE.to_string());
            }
        };
        info!(family = %family, sub_questions = sub_questions.len(), "routing question");

        let pipelines = sub_questions
            .into_iter()
            .map(|text| self.route(family, SubQuery::new(text)));
        let routed = join_all(pipelines).await;

        if routed.iter().all(|r| r.classifier_unavailable) {
            error!(family = %family, "classifier unavailable for every sub-question");
            return AnswerSet::ShortCircuit(RETRY_LATER_MESSAGE.to_string());
        }

        AnswerSet::Routed(routed.into_iter().map(|r| r.answer).collect())
    }

    async fn route(&self, family: CapabilityFamily, sub_question: SubQuery) -> Routed {
        let verdict = self
            .classifier
            .classify(family, &sub_question.text, sub_question.detected_vendor)
            .await;

        match verdict {
            Err(e) => {
                warn!(family = %family, error = %e, "classification call failed");
                Routed {
                    answer: unrouted(sub_question, QueryOutcome::Failure(RETRY_LATER_MESSAGE.to_string())),
                    classifier_unavailable: true,
                }
            }
            Ok(ClassifierVerdict::Unmatched(failure)) => Routed {
                answer: unrouted(
                    sub_question,
                    QueryOutcome::Failure(guidance_message(family, &failure)),
                ),
                classifier_unavailable: false,
            },
            Ok(ClassifierVerdict::Matched(classification)) => {
                let (primary, secondary) = classification.routes();
                info!(
                    capability = %classification.capability.key,
                    vendor = ?sub_question.detected_vendor,
                    primary = %primary.backend,
                    secondary = %secondary.backend,
                    "sub-question routed"
                );
                let run = self
                    .fallback
                    .execute_with_fallback(&sub_question.text, primary, secondary)
                    .await;

                Routed {
                    answer: RoutedAnswer {
                        sub_question,
                        capability: Some(classification.capability.id),
                        attempts: run.attempts,
                        final_result: run.outcome,
                    },
                    classifier_unavailable: false,
                }
            }
        }
    }
}

fn unrouted(sub_question: SubQuery, outcome: QueryOutcome) -> RoutedAnswer {
    RoutedAnswer {
        sub_question,
        capability: None,
        attempts: Vec::new(),
        final_result: outcome,
    }
}
