//! Logic Module - Decision & Explanation Engines
//!
//! ## Architecture
//! - `features/` - Fixed-layout transaction feature record
//! - `policy/` - Rule engine (scores + signals -> decision + reason code)
//! - `model/` - Scoring oracle adapter (ONNX classifier, anomaly detector)
//! - `audit/` - Append-only, hash-verifiable decision log
//! - `knowledge/` - Chunked reference corpus and vector index
//! - `explain/` - Reason code -> grounded explanation
//! - `pipeline` - Score, decide, audit; fail-safe policy

pub mod features;
pub mod policy;
pub mod model;
pub mod audit;

pub mod knowledge;
pub mod explain;

pub mod pipeline;
