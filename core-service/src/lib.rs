//! FraudShield Decision & Explanation Engine
//!
//! Two independent paths share this crate:
//! - decision: `FeatureVector` -> `ScoringOracle` -> `RuleEngine` -> `AuditLog`
//! - explanation: reason code -> `Explainer` over a read-only knowledge index
//!
//! Neither path reads the other's state.

pub mod config;
pub mod constants;
pub mod error;
pub mod logic;

pub use config::{EmbedderKind, Settings};
pub use error::{AuditError, DecisionError, ExplainError, KnowledgeError, ValidationError};
pub use logic::audit::{AuditLog, AuditRecord};
pub use logic::explain::Explainer;
pub use logic::features::{FeatureVector, FeatureVectorBuilder};
pub use logic::model::{ModelVersions, ScoringOracle};
pub use logic::pipeline::{Assessment, AuditOutcome, FraudShield};
pub use logic::policy::{decide, Decision, DecisionCategory, DecisionThresholds, RuleEngine};
