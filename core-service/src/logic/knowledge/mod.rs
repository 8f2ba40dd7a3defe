//! Knowledge Module - chunked reference corpus and its vector index
//!
//! ## Structure
//! - `chunking`: whitespace-aware character chunker
//! - `embedder`: Embedder trait, HashingEmbedder
//! - `wordpiece` / `onnx_embedder`: ONNX sentence encoder
//! - `index`: flat inner-product VectorIndex and its file format
//! - `store`: KnowledgeBase (aligned chunk list + index)
//! - `builder`: offline build from a markdown directory

pub mod chunking;
pub mod embedder;
pub mod wordpiece;
pub mod onnx_embedder;
pub mod index;
pub mod store;
pub mod builder;


pub use builder::{build_from_chunks, build_index, load_markdown_files};
pub use chunking::chunk_text;
pub use embedder::{is_l2_normalized, l2_normalize, Embedder, HashingEmbedder};
pub use index::{SearchHit, VectorIndex};
pub use onnx_embedder::OnnxEmbedder;
pub use store::{KnowledgeBase, KnowledgePaths, RetrievedChunk};
