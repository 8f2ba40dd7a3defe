//! Policy Module - Rule Engine
//!
//! Turns the two model scores plus two categorical signals into a fraud
//! decision and a machine-readable reason code.
//!
//! ## Structure
//! - `types`: Core types (DecisionCategory, Decision, ScorePair)
//! - `config`: Decision thresholds
//! - `rules`: Ordered, guarded rules (HardBlockRule, SoftBlockRule, AllowRule)
//! - `engine`: RuleEngine
//!
//! ## Usage
//! ```ignore
//! use crate::logic::policy::{RuleEngine, DecisionCategory};
//!
//! let decision = engine.decide(&features, fraud_probability, anomaly_score)?;
//! match decision.category {
//!     DecisionCategory::Allow => approve(),
//!     DecisionCategory::SoftBlock => queue_for_review(),
//!     DecisionCategory::HardBlock => reject(),
//! }
//! ```

pub mod types;
pub mod config;
pub mod engine;
pub mod rules;

// Re-export main types for convenience
pub use types::{
    reason,
    Decision,
    DecisionCategory,
    RiskSignals,
    RuleOutcome,
    ScorePair,
};

pub use config::DecisionThresholds;

pub use engine::{decide, RuleEngine};

pub use rules::{apply_rules, AllowRule, DecisionRule, HardBlockRule, SoftBlockRule};
