//! Capability Classifier Integration Tests
//!
//! Runs the model-backed classifier against a scripted provider.

use std::sync::Arc;
use std::time::Duration;

use ran_assistant_core::{
    BackendKind, CapabilityFamily, CapabilityId, CapabilityRegistry, FailureKind, Vendor,
};
use ran_config_assistant::services::{CapabilityClassifier, ClassifierVerdict, LlmClassifier};
use ran_config_assistant::AppError;

use super::support::{unavailable, ScriptedProvider, Stage};

fn classifier(provider: Arc<ScriptedProvider>) -> LlmClassifier {
    LlmClassifier::new(
        provider,
        Arc::new(CapabilityRegistry::builtin()),
        Duration::from_secs(5),
    )
}

fn replying(reply: &'static str) -> Arc<ScriptedProvider> {
    Arc::new(ScriptedProvider::new(move |_| Ok(reply.to_string())))
}

#[tokio::test]
async fn test_classifies_from_free_text_reply() {
    let provider = replying("Looking at the rubric, the answer is hive.ran_cm.ran_ret_state_12hr.");
    let classifier = classifier(provider.clone());

    for _ in 0..5 {
        let verdict = classifier
            .classify(CapabilityFamily::NetworkConfig, "What is the RET tilt for site X?", None)
            .await
            .unwrap();
        match verdict {
            ClassifierVerdict::Matched(c) => {
                assert_eq!(c.capability.id, CapabilityId::RetState12hr);
                assert_eq!(c.routes().0.backend, BackendKind::Trino);
            }
            ClassifierVerdict::Unmatched(f) => panic!("unexpected failure: {f}"),
        }
    }
    assert_eq!(provider.classify_calls(), 5);
}

#[tokio::test]
async fn test_vendor_hint_reaches_the_prompt() {
    let provider = Arc::new(ScriptedProvider::new(|stage| match stage {
        Stage::Classify { vendor: Some(v), .. } if v == "Samsung" => {
            Ok("gpl.samsung_gpl_du".to_string())
        }
        _ => Ok("gpl.mavenir_gpl_du".to_string()),
    }));
    let classifier = classifier(provider);

    let verdict = classifier
        .classify(
            CapabilityFamily::RecommendedConfig,
            "recommended ssbPeriodicity for samsung DU",
            Some(Vendor::Samsung),
        )
        .await
        .unwrap();
    match verdict {
        ClassifierVerdict::Matched(c) => assert_eq!(c.capability.id, CapabilityId::SamsungGplDu),
        ClassifierVerdict::Unmatched(f) => panic!("unexpected failure: {f}"),
    }
}

#[tokio::test]
async fn test_reply_without_identifier_is_a_value_not_an_error() {
    let classifier = classifier(replying("NONE"));
    let verdict = classifier
        .classify(CapabilityFamily::Misalignment, "what's the weather in Dallas", None)
        .await
        .unwrap();
    match verdict {
        ClassifierVerdict::Unmatched(f) => assert_eq!(f.reason, FailureKind::NoIdentifier),
        ClassifierVerdict::Matched(c) => panic!("unexpected match {}", c.capability.key),
    }
}

#[tokio::test]
async fn test_identifier_outside_family_is_no_tool_match() {
    let classifier = classifier(replying("hive.ran_cm.mavenir_du_config"));
    let verdict = classifier
        .classify(CapabilityFamily::Misalignment, "mavenir DU gapOffset", None)
        .await
        .unwrap();
    match verdict {
        ClassifierVerdict::Unmatched(f) => {
            assert_eq!(f.reason, FailureKind::NoToolMatch);
            assert_eq!(f.detail, "mavenir_du_config");
        }
        ClassifierVerdict::Matched(c) => panic!("unexpected match {}", c.capability.key),
    }
}

#[tokio::test]
async fn test_unreachable_model_is_an_error() {
    let provider = Arc::new(ScriptedProvider::new(|_| Err(unavailable())));
    let classifier = classifier(provider.clone());
    let err = classifier
        .classify(CapabilityFamily::NetworkConfig, "ret tilt", None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Classification(_)));
    assert_eq!(provider.classify_calls(), 1);
}
