//! Outcomes and the Response Envelope
//!
//! Internally every sub-question ends in a `QueryOutcome`. Only at the outer
//! boundary is it flattened into the two-field `{user_question, response}`
//! envelope that callers depend on.

use serde::{Deserialize, Serialize};

use crate::capability::{BackendKind, CapabilityId, Vendor};
use crate::rows::{is_empty_result, Rows};

/// Reported when both backends came back without usable rows.
pub const NO_DATA_MESSAGE: &str = "No matching records found for this question.";

/// Reported when the final backend attempt failed. Error details are logged,
/// never returned.
pub const QUERY_ERROR_MESSAGE: &str =
    "An error occurred while querying the data. Please try again later.";

/// Reported when the request as a whole cannot be served right now.
pub const RETRY_LATER_MESSAGE: &str =
    "The assistant is temporarily unavailable. Please try again later.";

/// Input of every top-level tool. Vendor, if any, travels inside the text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInput {
    pub user_question: String,
}

impl ToolInput {
    pub fn new(user_question: impl Into<String>) -> Self {
        Self {
            user_question: user_question.into(),
        }
    }
}

/// One decomposed sub-question with its detected vendor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubQuery {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detected_vendor: Option<Vendor>,
}

impl SubQuery {
    /// Wrap a sub-question, detecting its vendor from the text.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let detected_vendor = Vendor::detect(&text);
        Self {
            text,
            detected_vendor,
        }
    }
}

/// Record of a single backend attempt made by the fallback controller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionAttempt {
    pub backend: BackendKind,
    pub tool_name: String,
    /// `None` when synthesis failed before a query existed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<Rows>,
    /// Whether the query ran without raising.
    pub succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
}

impl ExecutionAttempt {
    /// An attempt whose query ran and returned rows (possibly none).
    pub fn executed(
        backend: BackendKind,
        tool_name: impl Into<String>,
        query_text: impl Into<String>,
        rows: Rows,
        duration_ms: u64,
    ) -> Self {
        Self {
            backend,
            tool_name: tool_name.into(),
            query_text: Some(query_text.into()),
            rows: Some(rows),
            succeeded: true,
            error: None,
            duration_ms,
        }
    }

    /// An attempt that failed during synthesis or execution.
    pub fn failed(
        backend: BackendKind,
        tool_name: impl Into<String>,
        query_text: Option<String>,
        error: impl Into<String>,
        duration_ms: u64,
    ) -> Self {
        Self {
            backend,
            tool_name: tool_name.into(),
            query_text,
            rows: None,
            succeeded: false,
            error: Some(error.into()),
            duration_ms,
        }
    }

    /// Ran without error and produced at least one non-null value.
    pub fn has_data(&self) -> bool {
        self.succeeded && !is_empty_result(self.rows.as_deref())
    }
}

/// Terminal result of one sub-question pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum QueryOutcome {
    /// Rows passed through unmodified.
    Success(Rows),
    /// Expected outcome: nothing matched. Not an error.
    Empty(String),
    /// A user-facing failure or guidance message.
    Failure(String),
}

impl QueryOutcome {
    pub fn no_data() -> Self {
        QueryOutcome::Empty(NO_DATA_MESSAGE.to_string())
    }

    pub fn query_error() -> Self {
        QueryOutcome::Failure(QUERY_ERROR_MESSAGE.to_string())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, QueryOutcome::Success(_))
    }

    /// Flatten into the `response` field of the envelope.
    pub fn to_body(&self) -> ResponseBody {
        match self {
            QueryOutcome::Success(rows) => ResponseBody::Rows(rows.clone()),
            QueryOutcome::Empty(msg) | QueryOutcome::Failure(msg) => {
                ResponseBody::Message(msg.clone())
            }
        }
    }
}

/// Everything the aggregator knows about one sub-question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutedAnswer {
    pub sub_question: SubQuery,
    /// `None` when classification failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capability: Option<CapabilityId>,
    pub attempts: Vec<ExecutionAttempt>,
    pub final_result: QueryOutcome,
}

impl RoutedAnswer {
    pub fn vendor(&self) -> Option<Vendor> {
        self.sub_question.detected_vendor
    }

    /// The two-field envelope for this sub-question.
    pub fn envelope(&self) -> ResponseEnvelope {
        ResponseEnvelope {
            user_question: self.sub_question.text.clone(),
            response: self.final_result.to_body(),
        }
    }
}

/// The `response` field: rows, a message, or one envelope per sub-question.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Rows(Rows),
    Message(String),
    Parts(Vec<ResponseEnvelope>),
}

/// The public contract between the assistant and its callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseEnvelope {
    pub user_question: String,
    pub response: ResponseBody,
}

impl ResponseEnvelope {
    pub fn message(user_question: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            user_question: user_question.into(),
            response: ResponseBody::Message(message.into()),
        }
    }
}

/// Result of answering one whole user question.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerSet {
    /// The pipeline did not run: pre-check or decomposition stopped it.
    ShortCircuit(String),
    /// One answer per sub-question, in decomposition order.
    Routed(Vec<RoutedAnswer>),
}

impl AnswerSet {
    /// Flatten into the envelope for the original question.
    ///
    /// A single sub-question yields its response directly; several yield an
    /// ordered array of per-sub-question envelopes.
    pub fn into_envelope(self, user_question: impl Into<String>) -> ResponseEnvelope {
        let user_question = user_question.into();
        match self {
            AnswerSet::ShortCircuit(message) => ResponseEnvelope::message(user_question, message),
            AnswerSet::Routed(answers) => match answers.as_slice() {
                [] => ResponseEnvelope::message(user_question, NO_DATA_MESSAGE),
                [single] => ResponseEnvelope {
                    user_question,
                    response: single.final_result.to_body(),
                },
                many => ResponseEnvelope {
                    user_question,
                    response: ResponseBody::Parts(many.iter().map(RoutedAnswer::envelope).collect()),
                },
            },
        }
    }
}
