//! Reason code -> natural-language retrieval query

use once_cell::sync::Lazy;
use regex::Regex;

static CAMEL_BOUNDARY: Lazy<Regex> = Lazy::new(|| Regex::new(r"([a-z])([A-Z])").expect("static regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));
static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").expect("static regex"));

pub const QUERY_PREFIX: &str = "guidance about";

/// `FRAUD_SIGNAL` -> `guidance about fraud signal`
pub fn code_to_query(reason_code: &str) -> String {
    let spaced = reason_code.replace(['_', '-'], " ");
    let split = CAMEL_BOUNDARY.replace_all(&spaced, "${1} ${2}");
    let collapsed = WHITESPACE.replace_all(&split, " ");
    format!("{} {}", QUERY_PREFIX, collapsed.trim().to_lowercase())
}

/// Word tokens of the query, used to pick matching sentences
pub fn query_tokens(query: &str) -> Vec<String> {
    WORD.find_iter(query).map(|m| m.as_str().to_string()).collect()
}
