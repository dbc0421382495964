//! SQL Extraction
//!
//! Pulls a single read-only query out of generated text.
//!
//! Tried in order:
//! - Pass 1: a ```sql fenced block
//! - Pass 2: any fenced block whose body starts with SELECT or WITH
//! - Pass 3: the first SELECT or WITH statement in the bare text

use std::sync::OnceLock;

use regex::Regex;

/// Why generated text did not yield a usable query.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SqlRejection {
    #[error("no SELECT or WITH query found in generated text")]
    NoQuery,

    #[error("generated query is not read-only (contains {0})")]
    NotReadOnly(String),

    #[error("generated text contains more than one statement")]
    MultipleStatements,
}

const WRITE_KEYWORDS: &[&str] = &[
    "insert", "update", "delete", "merge", "drop", "alter", "create", "truncate", "grant",
    "revoke", "call", "copy", "attach", "pragma",
];

fn statement_start() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?i)\bselect\b|\bwith\s+\w+\s+as\s*\(").ok())
        .as_ref()
}

fn word_regex() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"[A-Za-z_]+").ok())
        .as_ref()
}

/// Extract one read-only query, without a trailing semicolon.
pub fn extract_sql(text: &str) -> Result<String, SqlRejection> {
    let candidate = fenced_block(text, true)
        .or_else(|| fenced_block(text, false))
        .or_else(|| bare_statement(text))
        .ok_or(SqlRejection::NoQuery)?;

    let query = candidate.trim().trim_end_matches(';').trim().to_string();
    if query.is_empty() || !starts_with_query_keyword(&query) {
        return Err(SqlRejection::NoQuery);
    }
    if query.contains(';') {
        return Err(SqlRejection::MultipleStatements);
    }
    check_read_only(&query)?;
    Ok(query)
}

fn starts_with_query_keyword(query: &str) -> bool {
    let head = query
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_lowercase();
    head == "select" || head == "with" || head.starts_with('(')
}

/// Reject queries containing a data-modifying keyword outside string literals.
fn check_read_only(query: &str) -> Result<(), SqlRejection> {
    let Some(words) = word_regex() else {
        return Ok(());
    };
    let unquoted = strip_string_literals(query);
    for word in words.find_iter(&unquoted) {
        let lower = word.as_str().to_lowercase();
        if WRITE_KEYWORDS.contains(&lower.as_str()) {
            return Err(SqlRejection::NotReadOnly(lower));
        }
    }
    Ok(())
}

fn strip_string_literals(query: &str) -> String {
    let mut out = String::with_capacity(query.len());
    let mut in_literal = false;
    for c in query.chars() {
        if c == '\'' {
            in_literal = !in_literal;
            out.push(' ');
        } else if !in_literal {
            out.push(c);
        }
    }
    out
}

/// Body of the first fenced block. With `sql_only`, only ```sql fences count.
fn fenced_block(text: &str, sql_only: bool) -> Option<String> {
    let mut remaining = text;
    while let Some(start) = remaining.find("```") {
        let after_marker = &remaining[start + 3..];
        let end = after_marker.find("```")?;
        let block = &after_marker[..end];

        let (lang, body) = match block.find('\n') {
            Some(nl) => (block[..nl].trim(), &block[nl + 1..]),
            None => ("", block),
        };

        if sql_only {
            if lang.eq_ignore_ascii_case("sql") {
                return Some(body.to_string());
            }
        } else if starts_with_query_keyword(body.trim()) {
            return Some(body.to_string());
        }

        remaining = &after_marker[end + 3..];
    }
    None
}

/// From the first SELECT/WITH to the first semicolon or blank line.
fn bare_statement(text: &str) -> Option<String> {
    let start = statement_start()?.find(text)?.start();
    let rest = &text[start..];
    let end = [rest.find(';'), rest.find("\n\n")]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(rest.len());
    Some(rest[..end].to_string())
}
