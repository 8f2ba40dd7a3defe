//! Policy Types
//!
//! Core types for fraud decisions.
//! No logic here beyond small helpers - data structures only.

use serde::{Deserialize, Serialize};

// ============================================================================
// REASON CODES
// ============================================================================

/// Stable reason codes. Downstream explanation lookups key off these exact strings.
pub mod reason {
    pub const QR_NEW_BENEFICIARY_HIGH_FRAUD_HIGH_ANOMALY: &str =
        "QR_NEW_BENEFICIARY_HIGH_FRAUD_HIGH_ANOMALY";
    pub const FRAUD_SIGNAL: &str = "FRAUD_SIGNAL";
    pub const ANOMALY_SIGNAL: &str = "ANOMALY_SIGNAL";
    pub const NO_SIGNIFICANT_RISK: &str = "NO_SIGNIFICANT_RISK";

    /// Joins triggered signal names into a composite reason code
    pub const SEPARATOR: &str = "_";
}

// ============================================================================
// DECISION CATEGORY
// ============================================================================

/// Fraud decision tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionCategory {
    /// Let the transaction through
    Allow,
    /// Hold for human review
    SoftBlock,
    /// Reject outright
    HardBlock,
}

impl DecisionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionCategory::Allow => "ALLOW",
            DecisionCategory::SoftBlock => "SOFT_BLOCK",
            DecisionCategory::HardBlock => "HARD_BLOCK",
        }
    }

    pub fn is_block(&self) -> bool {
        !matches!(self, DecisionCategory::Allow)
    }
}

impl std::fmt::Display for DecisionCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// SCORES
// ============================================================================

/// Output of the two scoring models for one feature vector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScorePair {
    /// Classifier fraud probability in [0, 1]
    pub fraud_probability: f64,
    /// Anomaly detector score; lower = more anomalous
    pub anomaly_score: f64,
}

/// Everything a rule may look at
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskSignals {
    pub fraud_probability: f64,
    pub anomaly_score: f64,
    pub is_qr: bool,
    pub beneficiary_is_new: bool,
}

/// What a matching rule produces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleOutcome {
    pub category: DecisionCategory,
    pub reason_code: String,
}

// ============================================================================
// DECISION
// ============================================================================

/// Complete fraud decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    #[serde(rename = "decision")]
    pub category: DecisionCategory,
    pub reason_code: String,
    /// Fraud probability exactly as produced by the classifier
    pub risk_score: f64,
    /// Anomaly score exactly as produced by the detector
    pub anomaly_score: f64,
}

impl Decision {
    /// Safest substitute decision, chosen by callers when no decision could be made
    pub fn fail_safe(reason_code: &str) -> Self {
        Self {
            category: DecisionCategory::Allow,
            reason_code: reason_code.to_string(),
            risk_score: 0.0,
            anomaly_score: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_serializes_screaming_snake() {
        let json = serde_json::to_string(&DecisionCategory::SoftBlock).unwrap();
        assert_eq!(json, "\"SOFT_BLOCK\"");
        assert_eq!(DecisionCategory::HardBlock.to_string(), "HARD_BLOCK");
    }

    #[test]
    fn test_decision_json_shape() {
        let decision = Decision {
            category: DecisionCategory::Allow,
            reason_code: reason::NO_SIGNIFICANT_RISK.to_string(),
            risk_score: 0.1,
            anomaly_score: 0.5,
        };
        let value = serde_json::to_value(&decision).unwrap();
        assert_eq!(value["decision"], "ALLOW");
        assert_eq!(value["reason_code"], "NO_SIGNIFICANT_RISK");
        assert_eq!(value["risk_score"], 0.1);
    }

    #[test]
    fn test_fail_safe() {
        let decision = Decision::fail_safe("INPUT_VALIDATION_FAILED");
        assert_eq!(decision.category, DecisionCategory::Allow);
        assert_eq!(decision.risk_score, 0.0);
        assert!(!decision.category.is_block());
    }
}
