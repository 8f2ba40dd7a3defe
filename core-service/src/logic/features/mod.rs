//! Features Module - Transaction feature schema
//!
//! Fixed-layout feature record consumed by the scoring models, the rule
//! engine, and the audit fingerprint. Feature engineering from raw
//! transaction logs happens upstream; this module only validates and holds
//! the result.

pub mod layout;
pub mod vector;


// Re-export common types
pub use layout::{
    check_layout_hash, feature_index, layout_hash, FEATURE_COUNT, FEATURE_LAYOUT, FEATURE_VERSION,
    LAYOUT_HASH_METADATA_KEY,
};
pub use vector::{FeatureVector, FeatureVectorBuilder};
