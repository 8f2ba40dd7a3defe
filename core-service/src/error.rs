//! Error taxonomy
//!
//! Decision and explanation paths have separate error types so a failure
//! in one never leaks into the other.

use thiserror::Error;

/// Malformed or wrong-shaped input. Always caller-recoverable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required feature '{0}'")]
    MissingField(String),

    #[error("unknown feature '{0}'")]
    UnknownField(String),

    #[error("feature '{field}' must be numeric, got {found}")]
    NotNumeric { field: String, found: String },

    #[error("feature '{field}' must be finite")]
    NonFinite { field: String },

    #[error("feature '{field}' must be 0 or 1, got {value}")]
    NotBinary { field: String, value: String },

    #[error("feature '{field}' must be non-negative, got {value}")]
    Negative { field: String, value: String },

    #[error("expected exactly one record, got {0}")]
    RecordCount(usize),

    #[error("expected a JSON object record, got {0}")]
    NotARecord(String),

    #[error("score '{name}' out of range: {value}")]
    ScoreOutOfRange { name: &'static str, value: String },

    #[error("reason_code must be a non-empty string")]
    EmptyReasonCode,

    #[error("invalid thresholds: {0}")]
    Thresholds(String),

    #[error("rule '{rule}' produced no usable outcome: {reason}")]
    InvalidRuleOutcome { rule: String, reason: String },

    #[error("invalid setting {key}={value}")]
    InvalidSetting { key: String, value: String },
}

/// Errors on the synchronous decision path.
#[derive(Debug, Error)]
pub enum DecisionError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A scoring model is missing, failed to load or failed to run.
    #[error("scoring oracle unavailable: {0}")]
    OracleUnavailable(String),
}

/// Audit sink failures. Reported to the operator, never used to undo a decision.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("audit log I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("audit record serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("malformed audit record at line {line}: {reason}")]
    Malformed { line: usize, reason: String },
}

/// Knowledge base (chunks, vector index, embedding model) failures.
#[derive(Debug, Error)]
pub enum KnowledgeError {
    #[error("knowledge file not found: {0}")]
    NotFound(String),

    #[error("knowledge I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("chunk list is not valid JSON: {0}")]
    Chunks(#[from] serde_json::Error),

    #[error("vector index format error: {0}")]
    Format(String),

    #[error("vector index checksum mismatch: expected {expected:08x}, got {actual:08x}")]
    Checksum { expected: u32, actual: u32 },

    #[error("index and chunk list misaligned: {index} vectors, {chunks} chunks")]
    Misaligned { index: usize, chunks: usize },

    #[error("embedding model mismatch: index built with '{index}', runtime uses '{runtime}'")]
    ModelMismatch { index: String, runtime: String },

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    Dimension { expected: usize, actual: usize },

    #[error("embedding model error: {0}")]
    Embedding(String),

    #[error("no knowledge documents found in {0}")]
    EmptyCorpus(String),
}

/// Errors on the explanation path.
#[derive(Debug, Error)]
pub enum ExplainError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("explainer unavailable: {0}")]
    Unavailable(String),
}

impl From<KnowledgeError> for ExplainError {
    fn from(err: KnowledgeError) -> Self {
        ExplainError::Unavailable(err.to_string())
    }
}
