//! ONNX sentence encoder (MiniLM-style)
//!
//! Token ids, attention mask and token type ids go in; the last hidden
//! state is mean-pooled over the attention mask and L2-normalized.
//! Exports that already emit a pooled `[1, H]` embedding are used as-is.

use std::path::Path;

use ndarray::Array2;
use ort::session::{builder::GraphOptimizationLevel, Session, SessionInputValue};
use ort::value::Tensor;
use parking_lot::Mutex;

use super::embedder::{l2_normalize, Embedder};
use super::wordpiece::WordPieceTokenizer;
use crate::error::KnowledgeError;

/// Sequence length cap of the MiniLM family
pub const DEFAULT_MAX_TOKENS: usize = 256;

const PROBE_TEXT: &str = "dimension probe";

pub struct OnnxEmbedder {
    model_id: String,
    dimension: usize,
    tokenizer: WordPieceTokenizer,
    session: Mutex<Session>,
    input_names: Vec<String>,
    output_name: String,
}

impl OnnxEmbedder {
    pub fn load(model_path: &Path, vocab_path: &Path) -> Result<Self, KnowledgeError> {
        let embedding_err = |msg: String| KnowledgeError::Embedding(msg);

        log::info!("Loading sentence encoder from: {}", model_path.display());

        if !model_path.exists() {
            return Err(KnowledgeError::NotFound(model_path.display().to_string()));
        }
        let tokenizer = WordPieceTokenizer::from_vocab_file(vocab_path, DEFAULT_MAX_TOKENS)?;

        let session = Session::builder()
            .map_err(|e| embedding_err(format!("failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| embedding_err(format!("failed to set optimization: {}", e)))?
            .commit_from_file(model_path)
            .map_err(|e| embedding_err(format!("failed to load model: {}", e)))?;

        let input_names: Vec<String> = session.inputs.iter().map(|i| i.name.clone()).collect();
        if !input_names.iter().any(|n| n == "input_ids") {
            return Err(embedding_err(format!("encoder has no 'input_ids' input: {:?}", input_names)));
        }

        let output_name = session
            .outputs
            .iter()
            .find(|o| o.name.contains("sentence_embedding") || o.name.contains("last_hidden_state"))
            .or_else(|| session.outputs.first())
            .map(|o| o.name.clone())
            .ok_or_else(|| embedding_err("encoder has no outputs".to_string()))?;

        let stem = model_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("encoder");

        let mut embedder = Self {
            model_id: String::new(),
            dimension: 0,
            tokenizer,
            session: Mutex::new(session),
            input_names,
            output_name,
        };

        let probe = embedder.encode(PROBE_TEXT)?;
        embedder.dimension = probe.len();
        embedder.model_id = format!("onnx-{}-{}", stem, embedder.dimension);

        log::info!(
            "Sentence encoder '{}' ready (output '{}')",
            embedder.model_id,
            embedder.output_name
        );
        Ok(embedder)
    }

    fn encode(&self, text: &str) -> Result<Vec<f32>, KnowledgeError> {
        let embedding_err = |msg: String| KnowledgeError::Embedding(msg);

        let ids = self.tokenizer.encode(text);
        let len = ids.len();

        let mut inputs: Vec<(String, SessionInputValue<'static>)> = Vec::with_capacity(3);
        for name in &self.input_names {
            let data = match name.as_str() {
                "input_ids" => ids.clone(),
                "attention_mask" => vec![1_i64; len],
                "token_type_ids" => vec![0_i64; len],
                other => return Err(embedding_err(format!("unsupported encoder input '{}'", other))),
            };
            let array = Array2::<i64>::from_shape_vec((1, len), data)
                .map_err(|e| embedding_err(format!("array error: {}", e)))?;
            let tensor = Tensor::from_array(array).map_err(|e| embedding_err(format!("tensor error: {}", e)))?;
            inputs.push((name.clone(), tensor.into()));
        }

        let mut session = self.session.lock();
        let outputs = session
            .run(inputs)
            .map_err(|e| embedding_err(format!("inference failed: {}", e)))?;
        let output = outputs
            .get(self.output_name.as_str())
            .ok_or_else(|| embedding_err(format!("missing output '{}'", self.output_name)))?;
        let (shape, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| embedding_err(format!("extract error: {}", e)))?;
        let dims: Vec<i64> = shape.iter().copied().collect();

        let mut pooled = match dims.as_slice() {
            [1, hidden] => data[..*hidden as usize].to_vec(),
            [1, tokens, hidden] => mean_pool(data, *tokens as usize, *hidden as usize),
            other => return Err(embedding_err(format!("unexpected encoder output shape {:?}", other))),
        };

        l2_normalize(&mut pooled);
        Ok(pooled)
    }
}

/// Mean over the token axis of a `[tokens, hidden]` block (attention mask is all ones)
fn mean_pool(data: &[f32], tokens: usize, hidden: usize) -> Vec<f32> {
    let mut pooled = vec![0.0f32; hidden];
    if tokens == 0 {
        return pooled;
    }
    for row in data.chunks_exact(hidden).take(tokens) {
        for (acc, v) in pooled.iter_mut().zip(row) {
            *acc += *v;
        }
    }
    for v in pooled.iter_mut() {
        *v /= tokens as f32;
    }
    pooled
}

impl Embedder for OnnxEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, KnowledgeError> {
        let vector = self.encode(text)?;
        if vector.len() != self.dimension {
            return Err(KnowledgeError::Dimension {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_pool() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        assert_eq!(mean_pool(&data, 3, 2), vec![3.0, 4.0]);
        assert_eq!(mean_pool(&[], 0, 2), vec![0.0, 0.0]);
    }

    #[test]
    fn test_missing_model_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = OnnxEmbedder::load(&dir.path().join("encoder.onnx"), &dir.path().join("vocab.txt"));
        assert!(matches!(result, Err(KnowledgeError::NotFound(_))));
    }
}
