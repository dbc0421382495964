//! Question Decomposition
//!
//! The decomposer is a model call that splits a compound question into
//! independent sub-questions. This module holds its prompt and a lenient
//! parser for the reply. The parser never fails: when nothing usable comes
//! back, the original question is the only sub-question.

use std::sync::OnceLock;

use regex::Regex;

pub const DECOMPOSER_SYSTEM_PROMPT: &str = r#"You split questions about RAN configuration data into independent sub-questions.

Rules:
- If the question asks about one thing, return it unchanged as the only element.
- Split only when the question asks for several independent facts, for example two vendors, two parameters or two AOIs.
- Each sub-question must stand alone: repeat the vendor, AOI, site and parameter names it needs.
- Never answer the question and never add questions that were not asked.

Reply with a JSON array of strings and nothing else.

Example:
Q: What is the recommended gapOffset for mavenir and for samsung?
A: ["What is the recommended gapOffset for mavenir?", "What is the recommended gapOffset for samsung?"]"#;

/// User turn for the decomposition call.
pub fn decomposition_user_message(question: &str) -> String {
    format!("Q: {}", question.trim())
}

fn list_item_regex() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^\s*(?:\d+[.)]|[-*•])\s+(.+?)\s*$").ok())
        .as_ref()
}

/// Parse a decomposer reply into sub-questions.
///
/// Handles multiple formats:
/// - Pass 1: a JSON array inside a fenced block
/// - Pass 2: a bare JSON array (or `{"sub_questions": [...]}`) anywhere in the text
/// - Pass 3: numbered or bulleted lines
pub fn parse_sub_questions(reply: &str, original: &str) -> Vec<String> {
    let parsed = fenced_json(reply)
        .and_then(|body| json_questions(&body))
        .or_else(|| json_questions(reply))
        .or_else(|| list_items(reply));

    match parsed {
        Some(questions) if !questions.is_empty() => questions,
        _ => {
            tracing::debug!("decomposer reply not parseable, keeping original question");
            vec![original.trim().to_string()]
        }
    }
}

fn fenced_json(text: &str) -> Option<String> {
    let start = text.find("```")?;
    let after = &text[start + 3..];
    let end = after.find("```")?;
    let block = &after[..end];
    let body = block
        .strip_prefix("json")
        .or_else(|| block.strip_prefix("JSON"))
        .unwrap_or(block);
    Some(body.trim().to_string())
}

fn json_questions(text: &str) -> Option<Vec<String>> {
    let trimmed = text.trim();

    if let Ok(serde_json::Value::Object(obj)) = serde_json::from_str::<serde_json::Value>(trimmed) {
        let list = obj
            .get("sub_questions")
            .or_else(|| obj.get("questions"))?;
        return strings_from(list);
    }

    let start = trimmed.find('[')?;
    let end = trimmed.rfind(']')?;
    if end <= start {
        return None;
    }
    let value: serde_json::Value = serde_json::from_str(&trimmed[start..=end]).ok()?;
    strings_from(&value)
}

fn strings_from(value: &serde_json::Value) -> Option<Vec<String>> {
    let items = value.as_array()?;
    let questions: Vec<String> = items
        .iter()
        .filter_map(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if questions.is_empty() {
        None
    } else {
        Some(questions)
    }
}

fn list_items(text: &str) -> Option<Vec<String>> {
    let re = list_item_regex()?;
    let questions: Vec<String> = text
        .lines()
        .filter_map(|line| re.captures(line))
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim_matches('"').trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if questions.is_empty() {
        None
    } else {
        Some(questions)
    }
}
