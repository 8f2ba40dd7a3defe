//! Decision Rules (Extensible)
//!
//! Ordered, guarded rules. The engine evaluates them in priority order and
//! the first rule that returns an outcome wins, so a new rule is added by
//! inserting it at a position rather than by editing branching logic.

use super::config::DecisionThresholds;
use super::types::*;

// ============================================================================
// DECISION RULE TRAIT
// ============================================================================

/// A guarded rule: returns `Some` only when its guard holds
pub trait DecisionRule: Send + Sync {
    fn name(&self) -> &str;
    fn evaluate(&self, signals: &RiskSignals, thresholds: &DecisionThresholds) -> Option<RuleOutcome>;
}

// ============================================================================
// BUILT-IN RULES
// ============================================================================

/// QR payment to a brand-new beneficiary with both scores in the high tier.
///
/// All four conditions are required; anything weaker is left to the soft tier.
pub struct HardBlockRule;

impl DecisionRule for HardBlockRule {
    fn name(&self) -> &str {
        "HardBlockRule"
    }

    fn evaluate(&self, signals: &RiskSignals, thresholds: &DecisionThresholds) -> Option<RuleOutcome> {
        let fires = thresholds.is_high_fraud(signals.fraud_probability)
            && thresholds.is_high_anomaly(signals.anomaly_score)
            && signals.is_qr
            && signals.beneficiary_is_new;

        fires.then(|| RuleOutcome {
            category: DecisionCategory::HardBlock,
            reason_code: reason::QR_NEW_BENEFICIARY_HIGH_FRAUD_HIGH_ANOMALY.to_string(),
        })
    }
}

/// Either score in the soft tier.
///
/// Reason code lists the triggered signals in fixed order, FRAUD_SIGNAL
/// before ANOMALY_SIGNAL.
pub struct SoftBlockRule;

impl SoftBlockRule {
    fn triggered_signals(signals: &RiskSignals, thresholds: &DecisionThresholds) -> Vec<&'static str> {
        let mut triggered = Vec::with_capacity(2);
        if thresholds.is_soft_fraud(signals.fraud_probability) {
            triggered.push(reason::FRAUD_SIGNAL);
        }
        if thresholds.is_soft_anomaly(signals.anomaly_score) {
            triggered.push(reason::ANOMALY_SIGNAL);
        }
        triggered.dedup();
        triggered
    }
}

impl DecisionRule for SoftBlockRule {
    fn name(&self) -> &str {
        "SoftBlockRule"
    }

    fn evaluate(&self, signals: &RiskSignals, thresholds: &DecisionThresholds) -> Option<RuleOutcome> {
        let triggered = Self::triggered_signals(signals, thresholds);
        if triggered.is_empty() {
            return None;
        }

        Some(RuleOutcome {
            category: DecisionCategory::SoftBlock,
            reason_code: triggered.join(reason::SEPARATOR),
        })
    }
}

/// Terminal rule: always matches
pub struct AllowRule;

impl AllowRule {
    pub fn outcome() -> RuleOutcome {
        RuleOutcome {
            category: DecisionCategory::Allow,
            reason_code: reason::NO_SIGNIFICANT_RISK.to_string(),
        }
    }
}

impl DecisionRule for AllowRule {
    fn name(&self) -> &str {
        "AllowRule"
    }

    fn evaluate(&self, _signals: &RiskSignals, _thresholds: &DecisionThresholds) -> Option<RuleOutcome> {
        Some(Self::outcome())
    }
}

/// Default rule order
pub fn default_rules() -> Vec<Box<dyn DecisionRule>> {
    vec![Box::new(HardBlockRule), Box::new(SoftBlockRule), Box::new(AllowRule)]
}

// ============================================================================
// RULE EVALUATION
// ============================================================================

/// Apply rules in order, return the first match and the name of the rule that produced it
pub fn apply_rules<'a>(
    rules: &'a [Box<dyn DecisionRule>],
    signals: &RiskSignals,
    thresholds: &DecisionThresholds,
) -> Option<(&'a str, RuleOutcome)> {
    rules
        .iter()
        .find_map(|rule| rule.evaluate(signals, thresholds).map(|outcome| (rule.name(), outcome)))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn signals(fraud: f64, anomaly: f64, is_qr: bool, new_beneficiary: bool) -> RiskSignals {
        RiskSignals {
            fraud_probability: fraud,
            anomaly_score: anomaly,
            is_qr,
            beneficiary_is_new: new_beneficiary,
        }
    }

    #[test]
    fn test_hard_block_requires_all_four() {
        let t = DecisionThresholds::default();
        assert!(HardBlockRule.evaluate(&signals(0.7, -0.15, true, true), &t).is_some());
        assert!(HardBlockRule.evaluate(&signals(0.69, -0.2, true, true), &t).is_none());
        assert!(HardBlockRule.evaluate(&signals(0.9, -0.14, true, true), &t).is_none());
        assert!(HardBlockRule.evaluate(&signals(0.9, -0.2, false, true), &t).is_none());
        assert!(HardBlockRule.evaluate(&signals(0.9, -0.2, true, false), &t).is_none());
    }

    #[test]
    fn test_soft_block_reason_order() {
        let t = DecisionThresholds::default();
        let both = SoftBlockRule.evaluate(&signals(0.9, -0.2, false, false), &t).unwrap();
        assert_eq!(both.reason_code, "FRAUD_SIGNAL_ANOMALY_SIGNAL");

        let fraud = SoftBlockRule.evaluate(&signals(0.5, 0.0, false, false), &t).unwrap();
        assert_eq!(fraud.reason_code, "FRAUD_SIGNAL");

        let anomaly = SoftBlockRule.evaluate(&signals(0.1, -0.10, false, false), &t).unwrap();
        assert_eq!(anomaly.reason_code, "ANOMALY_SIGNAL");

        assert!(SoftBlockRule.evaluate(&signals(0.49, -0.09, true, true), &t).is_none());
    }

    #[test]
    fn test_first_match_wins() {
        let t = DecisionThresholds::default();
        let rules = default_rules();
        let (name, outcome) = apply_rules(&rules, &signals(0.95, -0.3, true, true), &t).unwrap();
        assert_eq!(name, "HardBlockRule");
        assert_eq!(outcome.category, DecisionCategory::HardBlock);
    }

    #[test]
    fn test_allow_is_terminal() {
        let t = DecisionThresholds::default();
        let rules = default_rules();
        let (name, outcome) = apply_rules(&rules, &signals(0.0, 1.0, false, false), &t).unwrap();
        assert_eq!(name, "AllowRule");
        assert_eq!(outcome.reason_code, "NO_SIGNIFICANT_RISK");
    }

    #[test]
    fn test_empty_rule_list() {
        let t = DecisionThresholds::default();
        assert!(apply_rules(&[], &signals(0.9, -0.9, true, true), &t).is_none());
    }
}
