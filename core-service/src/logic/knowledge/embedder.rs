//! Sentence embedding models
//!
//! The index and the runtime query must use the same model; the model id
//! is stored in the index file and checked on load.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants::DEFAULT_EMBEDDING_DIM;
use crate::error::KnowledgeError;

/// Maps text to a fixed-dimension vector
pub trait Embedder: Send + Sync {
    /// Stable identifier stored alongside the index
    fn model_id(&self) -> &str;
    fn dimension(&self) -> usize;
    /// Embedding of `text`, L2-normalized (or all zeros when the text has no tokens)
    fn embed(&self, text: &str) -> Result<Vec<f32>, KnowledgeError>;

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, KnowledgeError> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}

// ============================================================================
// VECTOR HELPERS
// ============================================================================

/// Normalize in place. Zero vectors are left untouched; returns false for them.
pub fn l2_normalize(vector: &mut [f32]) -> bool {
    let norm = vector
        .iter()
        .map(|v| f64::from(*v) * f64::from(*v))
        .sum::<f64>()
        .sqrt();
    if norm <= f64::EPSILON {
        return false;
    }
    for v in vector.iter_mut() {
        *v = (f64::from(*v) / norm) as f32;
    }
    true
}

pub fn is_l2_normalized(vector: &[f32]) -> bool {
    if vector.is_empty() {
        return false;
    }
    let norm = vector
        .iter()
        .map(|v| f64::from(*v) * f64::from(*v))
        .sum::<f64>()
        .sqrt();
    (norm - 1.0).abs() <= 1e-3
}

pub fn is_zero(vector: &[f32]) -> bool {
    vector.iter().all(|v| *v == 0.0)
}

// ============================================================================
// HASHING EMBEDDER
// ============================================================================

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").expect("static regex"));

const BIGRAM_WEIGHT: f32 = 0.5;

/// Deterministic, model-free embedder.
///
/// Signed feature hashing of lowercase word unigrams and bigrams into
/// `dimension` CRC32 buckets. Needs no artifacts, so it is the default for
/// offline builds and tests.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
    model_id: String,
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_EMBEDDING_DIM)
    }
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        let dimension = dimension.max(1);
        Self {
            dimension,
            model_id: format!("hashing-v1-{}", dimension),
        }
    }

    fn accumulate(&self, vector: &mut [f32], feature: &str, weight: f32) {
        let h = crc32fast::hash(feature.as_bytes());
        let bucket = (h as usize) % self.dimension;
        let sign = if h & 0x8000_0000 != 0 { -1.0 } else { 1.0 };
        vector[bucket] += sign * weight;
    }
}

impl Embedder for HashingEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, KnowledgeError> {
        let tokens: Vec<String> = WORD_RE
            .find_iter(text)
            .map(|m| m.as_str().to_lowercase())
            .collect();

        let mut vector = vec![0.0f32; self.dimension];
        for token in &tokens {
            self.accumulate(&mut vector, token, 1.0);
        }
        for pair in tokens.windows(2) {
            let bigram = format!("{} {}", pair[0], pair[1]);
            self.accumulate(&mut vector, &bigram, BIGRAM_WEIGHT);
        }

        l2_normalize(&mut vector);
        Ok(vector)
    }
}
