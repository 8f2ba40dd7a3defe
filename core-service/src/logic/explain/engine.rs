//! Explainer - reason code in, deterministic guidance text out
//!
//! Read-only over the knowledge base. Never sees decisions or audit state.

use std::sync::Arc;

use once_cell::sync::OnceCell;

use super::extract::extract_relevant_sentences;
use super::query::{code_to_query, query_tokens};
use super::redact::scrub_pii;
use super::types::{Explanation, RetrievedGuidance, UNAVAILABLE_MESSAGE};
use crate::constants::MAX_SENTENCES_PER_CHUNK;
use crate::error::{ExplainError, KnowledgeError, ValidationError};
use crate::logic::knowledge::{l2_normalize, Embedder, KnowledgeBase, KnowledgePaths};

pub struct Explainer {
    paths: KnowledgePaths,
    embedder: Arc<dyn Embedder>,
    top_k: usize,
    knowledge: OnceCell<KnowledgeBase>,
}

impl Explainer {
    /// Knowledge base is loaded from `paths` on first use
    pub fn new(paths: KnowledgePaths, embedder: Arc<dyn Embedder>, top_k: usize) -> Self {
        Self {
            paths,
            embedder,
            top_k: top_k.max(1),
            knowledge: OnceCell::new(),
        }
    }

    /// Use an already-built knowledge base
    pub fn with_knowledge(
        knowledge: KnowledgeBase,
        embedder: Arc<dyn Embedder>,
        top_k: usize,
    ) -> Result<Self, KnowledgeError> {
        check_model(&knowledge, embedder.as_ref())?;
        Ok(Self {
            paths: KnowledgePaths::default(),
            embedder,
            top_k: top_k.max(1),
            knowledge: OnceCell::with_value(knowledge),
        })
    }

    /// Force the load now. Failure here means the explainer is unavailable.
    pub fn preload(&self) -> Result<(), KnowledgeError> {
        self.knowledge().map(|_| ())
    }

    pub fn is_loaded(&self) -> bool {
        self.knowledge.get().is_some()
    }

    fn knowledge(&self) -> Result<&KnowledgeBase, KnowledgeError> {
        self.knowledge
            .get_or_try_init(|| KnowledgeBase::load(&self.paths, self.embedder.model_id()))
    }

    /// Explanation text for a reason code
    pub fn explain(&self, reason_code: &str) -> Result<String, ExplainError> {
        self.explain_detailed(reason_code).map(|e| e.text)
    }

    /// Same as `explain`, but unavailability becomes a fixed advisory message
    pub fn explain_advisory(&self, reason_code: &str) -> Result<String, ValidationError> {
        match self.explain(reason_code) {
            Ok(text) => Ok(text),
            Err(ExplainError::Validation(e)) => Err(e),
            Err(ExplainError::Unavailable(reason)) => {
                log::warn!("Explainer unavailable for '{}': {}", reason_code, reason);
                Ok(UNAVAILABLE_MESSAGE.to_string())
            }
        }
    }

    /// Explanation with the retrieval trace
    pub fn explain_detailed(&self, reason_code: &str) -> Result<Explanation, ExplainError> {
        if reason_code.is_empty() {
            return Err(ValidationError::EmptyReasonCode.into());
        }

        let knowledge = self.knowledge()?;

        let query = code_to_query(reason_code);
        let tokens = query_tokens(&query);

        let mut query_vector = self.embedder.embed(&query)?;
        l2_normalize(&mut query_vector);

        let mut retrieved = Vec::with_capacity(self.top_k);
        let mut summary: Vec<String> = Vec::new();

        for chunk in knowledge.retrieve(&query_vector, self.top_k)? {
            let sentences = extract_relevant_sentences(chunk.text, &tokens, MAX_SENTENCES_PER_CHUNK);
            for sentence in &sentences {
                let cleaned = scrub_pii(sentence);
                if !cleaned.is_empty() && !summary.contains(&cleaned) {
                    summary.push(cleaned);
                }
            }
            retrieved.push(RetrievedGuidance {
                slot: chunk.slot,
                score: chunk.score,
                sentences: sentences.iter().map(|s| scrub_pii(s)).collect(),
            });
        }

        log::debug!(
            "Explained '{}' from slots {:?}",
            reason_code,
            retrieved.iter().map(|r| r.slot).collect::<Vec<_>>()
        );

        let text = Explanation::render(reason_code, &summary);
        Ok(Explanation {
            reason_code: reason_code.to_string(),
            query,
            retrieved,
            summary,
            text,
        })
    }
}

fn check_model(knowledge: &KnowledgeBase, embedder: &dyn Embedder) -> Result<(), KnowledgeError> {
    if knowledge.index().model_id() != embedder.model_id() {
        return Err(KnowledgeError::ModelMismatch {
            index: knowledge.index().model_id().to_string(),
            runtime: embedder.model_id().to_string(),
        });
    }
    Ok(())
}
