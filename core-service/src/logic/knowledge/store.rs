//! Knowledge Base - the persisted (chunk list, vector index) pair
//!
//! Loaded once, read-only afterwards. Index slot `i` is chunk `i`; any
//! mismatch between the two files is a load error.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::index::{SearchHit, VectorIndex};
use crate::constants::{DEFAULT_CHUNKS_PATH, DEFAULT_INDEX_PATH};
use crate::error::KnowledgeError;

/// Where the index and chunk list live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgePaths {
    pub index: PathBuf,
    pub chunks: PathBuf,
}

impl Default for KnowledgePaths {
    fn default() -> Self {
        Self {
            index: PathBuf::from(DEFAULT_INDEX_PATH),
            chunks: PathBuf::from(DEFAULT_CHUNKS_PATH),
        }
    }
}

impl KnowledgePaths {
    pub fn new(index: impl Into<PathBuf>, chunks: impl Into<PathBuf>) -> Self {
        Self {
            index: index.into(),
            chunks: chunks.into(),
        }
    }

    /// `vector.index` and `chunks.json` inside `dir`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(dir.join("vector.index"), dir.join("chunks.json"))
    }
}

/// Retrieved chunk with its score
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedChunk<'a> {
    pub slot: usize,
    pub score: f32,
    pub text: &'a str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KnowledgeBase {
    chunks: Vec<String>,
    index: VectorIndex,
}

impl KnowledgeBase {
    pub fn new(chunks: Vec<String>, index: VectorIndex) -> Result<Self, KnowledgeError> {
        if chunks.len() != index.len() {
            return Err(KnowledgeError::Misaligned {
                index: index.len(),
                chunks: chunks.len(),
            });
        }
        Ok(Self { chunks, index })
    }

    /// Load both files and check they belong together and to `model_id`
    pub fn load(paths: &KnowledgePaths, model_id: &str) -> Result<Self, KnowledgeError> {
        let index = VectorIndex::load(&paths.index)?;

        if !paths.chunks.exists() {
            return Err(KnowledgeError::NotFound(paths.chunks.display().to_string()));
        }
        let chunks: Vec<String> = serde_json::from_slice(&fs::read(&paths.chunks)?)?;

        if index.model_id() != model_id {
            return Err(KnowledgeError::ModelMismatch {
                index: index.model_id().to_string(),
                runtime: model_id.to_string(),
            });
        }

        let kb = Self::new(chunks, index)?;
        log::info!(
            "Knowledge base loaded: {} chunks, dim {}, model '{}'",
            kb.len(),
            kb.index.dimension(),
            model_id
        );
        Ok(kb)
    }

    /// Write the index and chunk list
    pub fn persist(&self, paths: &KnowledgePaths) -> Result<(), KnowledgeError> {
        self.index.save(&paths.index)?;

        if let Some(parent) = paths.chunks.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&paths.chunks, serde_json::to_vec_pretty(&self.chunks)?)?;

        log::info!(
            "Knowledge base saved: {} chunks -> {}, {}",
            self.len(),
            paths.index.display(),
            paths.chunks.display()
        );
        Ok(())
    }

    pub fn chunks(&self) -> &[String] {
        &self.chunks
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Top-`k` chunks for an already-normalized query vector
    pub fn retrieve(&self, query: &[f32], k: usize) -> Result<Vec<RetrievedChunk<'_>>, KnowledgeError> {
        let hits = self.index.search(query, k)?;
        Ok(hits
            .into_iter()
            .filter_map(|SearchHit { slot, score }| {
                self.chunks.get(slot).map(|text| RetrievedChunk {
                    slot,
                    score,
                    text: text.as_str(),
                })
            })
            .collect())
    }
}
