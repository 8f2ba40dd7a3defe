//! Rule Engine
//!
//! Pure decision logic: no I/O, no hidden state, bounded work.
//! Input: FeatureVector + the two model scores
//! Output: Decision

use super::config::DecisionThresholds;
use super::rules::{apply_rules, default_rules, DecisionRule};
use super::types::*;
use crate::error::ValidationError;
use crate::logic::features::FeatureVector;

// ============================================================================
// RULE ENGINE
// ============================================================================

/// Ordered rule list plus thresholds. Immutable once built, safe to share.
pub struct RuleEngine {
    rules: Vec<Box<dyn DecisionRule>>,
    thresholds: DecisionThresholds,
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self {
            rules: default_rules(),
            thresholds: DecisionThresholds::default(),
        }
    }
}

impl RuleEngine {
    /// Default rule order with custom thresholds
    pub fn new(thresholds: DecisionThresholds) -> Result<Self, ValidationError> {
        thresholds.validate()?;
        Ok(Self {
            rules: default_rules(),
            thresholds,
        })
    }

    /// Insert a rule at the given priority (0 = evaluated first).
    /// The terminal `AllowRule` always stays last.
    pub fn with_rule_at(mut self, priority: usize, rule: Box<dyn DecisionRule>) -> Self {
        let at = priority.min(self.rules.len().saturating_sub(1));
        self.rules.insert(at, rule);
        self
    }

    pub fn thresholds(&self) -> &DecisionThresholds {
        &self.thresholds
    }

    /// Rule names in evaluation order
    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Decide for one transaction.
    ///
    /// Scores are copied into the decision unmodified. Out-of-range scores
    /// are a validation error; the engine never substitutes a decision.
    pub fn decide(
        &self,
        features: &FeatureVector,
        fraud_probability: f64,
        anomaly_score: f64,
    ) -> Result<Decision, ValidationError> {
        validate_scores(fraud_probability, anomaly_score)?;

        let signals = RiskSignals {
            fraud_probability,
            anomaly_score,
            is_qr: features.is_qr(),
            beneficiary_is_new: features.beneficiary_is_new(),
        };

        let (rule, outcome) = apply_rules(&self.rules, &signals, &self.thresholds).ok_or_else(|| {
            ValidationError::InvalidRuleOutcome {
                rule: "<none>".to_string(),
                reason: "no rule matched".to_string(),
            }
        })?;
        if outcome.reason_code.is_empty() {
            return Err(ValidationError::InvalidRuleOutcome {
                rule: rule.to_string(),
                reason: "empty reason code".to_string(),
            });
        }

        log::debug!(
            "Decision {} ({}) by {}: fraud={:.4} anomaly={:.4}",
            outcome.category,
            outcome.reason_code,
            rule,
            fraud_probability,
            anomaly_score
        );

        Ok(Decision {
            category: outcome.category,
            reason_code: outcome.reason_code,
            risk_score: fraud_probability,
            anomaly_score,
        })
    }

    /// Decide from a score pair
    pub fn decide_scores(&self, features: &FeatureVector, scores: ScorePair) -> Result<Decision, ValidationError> {
        self.decide(features, scores.fraud_probability, scores.anomaly_score)
    }
}

fn validate_scores(fraud_probability: f64, anomaly_score: f64) -> Result<(), ValidationError> {
    if !fraud_probability.is_finite() || !(0.0..=1.0).contains(&fraud_probability) {
        return Err(ValidationError::ScoreOutOfRange {
            name: "fraud_probability",
            value: fraud_probability.to_string(),
        });
    }
    if !anomaly_score.is_finite() {
        return Err(ValidationError::ScoreOutOfRange {
            name: "anomaly_score",
            value: anomaly_score.to_string(),
        });
    }
    Ok(())
}

// ============================================================================
// MAIN DECISION FUNCTION
// ============================================================================

/// Decision with default rules and thresholds
pub fn decide(
    features: &FeatureVector,
    fraud_probability: f64,
    anomaly_score: f64,
) -> Result<Decision, ValidationError> {
    RuleEngine::default().decide(features, fraud_probability, anomaly_score)
}

// ============================================================================
// TESTS
// ============================================================================
