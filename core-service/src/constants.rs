//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults.
//! Deployment paths and thresholds are overridden through `FRAUDSHIELD_*`
//! environment variables, see `config.rs`.

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "FraudShield";

// ============================================
// Scoring artifacts
// ============================================

/// Default path of the supervised fraud classifier
pub const DEFAULT_FRAUD_MODEL_PATH: &str = "models/fraud_model.onnx";

/// Default path of the anomaly detector
pub const DEFAULT_ANOMALY_MODEL_PATH: &str = "models/anomaly_model.onnx";

/// Model names used as keys in `model_versions`
pub const FRAUD_MODEL_NAME: &str = "fraud_model";
pub const ANOMALY_MODEL_NAME: &str = "anomaly_model";

/// Version reported when the deployment does not supply one
pub const UNVERSIONED: &str = "unversioned";

// ============================================
// Audit
// ============================================

/// Default append-only audit sink
pub const DEFAULT_AUDIT_LOG_PATH: &str = "logs/audit_log.jsonl";

// ============================================
// Knowledge index
// ============================================

pub const DEFAULT_INDEX_PATH: &str = "rag/vector.index";
pub const DEFAULT_CHUNKS_PATH: &str = "rag/chunks.json";
pub const DEFAULT_KNOWLEDGE_DIR: &str = "rag/knowledge";

/// Maximum characters per knowledge chunk
pub const CHUNK_MAX_CHARS: usize = 500;

/// Number of chunks retrieved per explanation
pub const DEFAULT_TOP_K: usize = 3;

/// Sentences kept per retrieved chunk
pub const MAX_SENTENCES_PER_CHUNK: usize = 2;

/// Dimension of the built-in hashing embedder
pub const DEFAULT_EMBEDDING_DIM: usize = 384;

// ============================================
// Reserved reason codes
// ============================================

/// Fail-safe reason when the input record cannot be validated
pub const REASON_INPUT_VALIDATION_FAILED: &str = "INPUT_VALIDATION_FAILED";

/// Fail-safe reason when a scoring model is unavailable
pub const REASON_SCORING_UNAVAILABLE: &str = "SCORING_UNAVAILABLE";
