//! Explain Module - retrieval-augmented reason code explanations
//!
//! reason code -> query -> top-K chunks -> sentence extraction -> PII scrub -> template.
//! Deterministic for a fixed knowledge base and embedding model.

pub mod types;
pub mod query;
pub mod extract;
pub mod redact;
pub mod engine;


pub use engine::Explainer;
pub use extract::{extract_relevant_sentences, split_sentences};
pub use query::{code_to_query, query_tokens};
pub use redact::scrub_pii;
pub use types::{Explanation, RetrievedGuidance, FALLBACK_BODY, UNAVAILABLE_MESSAGE};
