//! Offline index build
//!
//! Reads every `*.md` file in the knowledge directory (sorted by path),
//! chunks, embeds and indexes them.

use std::fs;
use std::path::{Path, PathBuf};

use super::chunking::chunk_text;
use super::embedder::{l2_normalize, Embedder};
use super::index::VectorIndex;
use super::store::KnowledgeBase;
use crate::constants::CHUNK_MAX_CHARS;
use crate::error::KnowledgeError;

/// Markdown documents in `dir`, sorted by path. A missing directory has none.
pub fn load_markdown_files(dir: &Path) -> Result<Vec<(PathBuf, String)>, KnowledgeError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().map_or(false, |ext| ext == "md"))
        .collect();
    paths.sort();

    paths
        .into_iter()
        .map(|path| {
            let text = fs::read_to_string(&path)?;
            Ok((path, text))
        })
        .collect()
}

/// Chunk all documents in corpus order
pub fn chunk_documents(documents: &[(PathBuf, String)]) -> Vec<String> {
    documents
        .iter()
        .flat_map(|(_, text)| chunk_text(text, CHUNK_MAX_CHARS))
        .collect()
}

/// Build a knowledge base from the markdown corpus in `dir`
pub fn build_index(dir: &Path, embedder: &dyn Embedder) -> Result<KnowledgeBase, KnowledgeError> {
    let documents = load_markdown_files(dir)?;
    let chunks = chunk_documents(&documents);

    if chunks.is_empty() {
        return Err(KnowledgeError::EmptyCorpus(dir.display().to_string()));
    }

    log::info!(
        "Embedding {} chunks from {} documents with '{}'",
        chunks.len(),
        documents.len(),
        embedder.model_id()
    );

    build_from_chunks(chunks, embedder)
}

/// Embed and index a prepared chunk list
pub fn build_from_chunks(chunks: Vec<String>, embedder: &dyn Embedder) -> Result<KnowledgeBase, KnowledgeError> {
    let mut index = VectorIndex::new(embedder.model_id(), embedder.dimension());
    for mut vector in embedder.embed_batch(&chunks)? {
        l2_normalize(&mut vector);
        index.add(&vector)?;
    }
    KnowledgeBase::new(chunks, index)
}
