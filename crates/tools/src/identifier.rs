//! Qualified-Identifier Extraction
//!
//! Projects a classifier's free-text reply onto a table-like identifier. Two
//! shapes are recognized, and the leftmost occurrence in the text wins:
//!
//! - a two- or three-part dotted name under a known namespace
//!   (`hive.ran_cm.ran_topology`, `ran_cm.ran_topology`, `gpl.mavenir_gpl_du`)
//! - a bare token following one of the naming conventions
//!   (`mavenir_du_config`, `samsung_misalignment`, `ran_ret_state_12hr`)

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use ran_assistant_core::BackendKind;

/// Namespaces that live in the Trino lake.
pub const TRINO_NAMESPACES: &[&str] = &["hive", "iceberg", "ran_cm"];

/// Namespaces that live in Postgres.
pub const POSTGRES_NAMESPACES: &[&str] = &["gpl", "audit", "cm_snapshot"];

const IDENTIFIER_PATTERN: &str = r"(?i)\b(?:(?:hive|iceberg|ran_cm|gpl|audit|cm_snapshot)\.[a-z0-9_]+(?:\.[a-z0-9_]+)?|(?:mavenir|samsung)_[a-z0-9_]+|ran_[a-z0-9_]+)\b";

fn identifier_regex() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(IDENTIFIER_PATTERN).ok())
        .as_ref()
}

/// An identifier found in classifier output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedIdentifier {
    /// Exactly as matched.
    pub raw: String,
    /// Leading namespace segment, lower-cased, for dotted names.
    pub namespace: Option<String>,
    /// Last path segment, lower-cased.
    pub normalized: String,
}

impl ExtractedIdentifier {
    /// Backend owning this identifier's namespace, if it has one.
    pub fn owner(&self) -> Option<BackendKind> {
        self.namespace.as_deref().and_then(namespace_owner)
    }
}

/// Find the first qualified identifier in `text`.
pub fn extract_identifier(text: &str) -> Option<ExtractedIdentifier> {
    let found = identifier_regex()?.find(text)?;
    let raw = found.as_str().to_string();
    let namespace = raw
        .split_once('.')
        .map(|(ns, _)| ns.to_lowercase());
    let normalized = normalize_identifier(&raw);
    Some(ExtractedIdentifier {
        raw,
        namespace,
        normalized,
    })
}

/// Last path segment, lower-cased.
pub fn normalize_identifier(identifier: &str) -> String {
    identifier
        .trim()
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

/// Which backend owns a namespace prefix. Fixed string comparison.
pub fn namespace_owner(namespace: &str) -> Option<BackendKind> {
    let ns = namespace.trim().trim_end_matches('.').to_lowercase();
    if TRINO_NAMESPACES.contains(&ns.as_str()) {
        Some(BackendKind::Trino)
    } else if POSTGRES_NAMESPACES.contains(&ns.as_str()) {
        Some(BackendKind::Postgres)
    } else {
        None
    }
}
