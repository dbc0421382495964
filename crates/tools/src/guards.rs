//! Whole-Question Pre-Checks
//!
//! Run once on the original question, before decomposition.

use std::sync::OnceLock;

use regex::Regex;

/// Returned instead of running the pipeline for ratio/percentage questions.
pub const RATIO_UNSUPPORTED_MESSAGE: &str = "Percentages and ratios cannot be computed from the \
configuration data. Ask for the underlying counts instead, for example \"How many cells have \
gapOffset misaligned in MCA AOI?\" and \"How many cells are in MCA AOI?\".";

const RATIO_PATTERN: &str = r"(?i)%|\b(?:percentage|percentages|percent|ratio|ratios|proportion|proportions)\b";

fn ratio_regex() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(RATIO_PATTERN).ok()).as_ref()
}

/// True when the question asks for a percentage or ratio metric.
pub fn requests_ratio(question: &str) -> bool {
    ratio_regex().is_some_and(|re| re.is_match(question))
}
