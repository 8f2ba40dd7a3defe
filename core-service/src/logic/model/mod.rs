//! Model Module - Scoring Oracle Adapter
//!
//! Wraps the two pre-trained scoring models behind one interface.
//! Swapping a model means swapping a trait object, nothing else.

pub mod oracle;
pub mod onnx;

// Re-export common types
pub use oracle::{
    normalize_classifier_output, AnomalyDetector, ClassifierOutput, FraudClassifier, ModelVersions,
    ScoringOracle,
};
pub use onnx::{InputBinding, OnnxAnomalyDetector, OnnxClassifier};
