use serde::{Deserialize, Serialize};

/// Body used when no sentence survives extraction
pub const FALLBACK_BODY: &str = "No relevant guidance found in the knowledge index.";

/// Closing line: guidance describes behavior patterns, not people
pub const CLOSING_SENTENCE: &str = "The retrieved guidance focuses on observable transaction and authentication patterns (for example, anomalous transaction amounts, unusual beneficiary additions, or repeated authentication failures) rather than on any individual or account.";

/// Returned by the advisory path when the knowledge base cannot be used
pub const UNAVAILABLE_MESSAGE: &str = "Explanation temporarily unavailable.";

/// One retrieved chunk as used in an explanation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedGuidance {
    pub slot: usize,
    pub score: f32,
    pub sentences: Vec<String>,
}

/// Explanation text plus how it was assembled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub reason_code: String,
    pub query: String,
    pub retrieved: Vec<RetrievedGuidance>,
    /// Scrubbed, deduplicated sentences in retrieval order
    pub summary: Vec<String>,
    pub text: String,
}

impl Explanation {
    pub fn render(reason_code: &str, summary: &[String]) -> String {
        let body = if summary.is_empty() {
            FALLBACK_BODY.to_string()
        } else {
            summary.join(" ")
        };

        format!(
            "Explanation for reason code '{}':\nSummary: {}\nBehavior patterns referenced: {}",
            reason_code, body, CLOSING_SENTENCE
        )
    }
}
