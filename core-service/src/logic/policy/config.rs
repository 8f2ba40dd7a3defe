//! Policy Configuration
//!
//! Decision thresholds. Defaults reproduce the production rule set;
//! deployments override them through `FRAUDSHIELD_*` variables.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

// ============================================================================
// THRESHOLDS
// ============================================================================

/// Rule thresholds.
///
/// Anomaly thresholds are negative: the detector reports lower scores for
/// more anomalous transactions, and rules fire on `score <= threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecisionThresholds {
    /// Fraud probability at or above which the hard-block combo may fire
    pub high_fraud: f64,
    /// Fraud probability at or above which FRAUD_SIGNAL fires
    pub soft_fraud: f64,
    /// Anomaly score at or below which the hard-block combo may fire
    pub high_anomaly: f64,
    /// Anomaly score at or below which ANOMALY_SIGNAL fires
    pub soft_anomaly: f64,
}

impl Default for DecisionThresholds {
    fn default() -> Self {
        Self {
            high_fraud: 0.7,
            soft_fraud: 0.5,
            high_anomaly: -0.15,
            soft_anomaly: -0.10,
        }
    }
}

impl DecisionThresholds {
    /// Check that the tiers nest: hard conditions imply soft ones
    pub fn validate(&self) -> Result<(), ValidationError> {
        let all = [self.high_fraud, self.soft_fraud, self.high_anomaly, self.soft_anomaly];
        if all.iter().any(|v| !v.is_finite()) {
            return Err(ValidationError::Thresholds("all thresholds must be finite".into()));
        }
        if !(0.0..=1.0).contains(&self.soft_fraud) || !(0.0..=1.0).contains(&self.high_fraud) {
            return Err(ValidationError::Thresholds("fraud thresholds must lie in [0, 1]".into()));
        }
        if self.soft_fraud > self.high_fraud {
            return Err(ValidationError::Thresholds(format!(
                "soft_fraud {} exceeds high_fraud {}",
                self.soft_fraud, self.high_fraud
            )));
        }
        if self.high_anomaly > self.soft_anomaly {
            return Err(ValidationError::Thresholds(format!(
                "high_anomaly {} exceeds soft_anomaly {}",
                self.high_anomaly, self.soft_anomaly
            )));
        }
        Ok(())
    }

    pub fn is_high_fraud(&self, fraud_probability: f64) -> bool {
        fraud_probability >= self.high_fraud
    }

    pub fn is_soft_fraud(&self, fraud_probability: f64) -> bool {
        fraud_probability >= self.soft_fraud
    }

    pub fn is_high_anomaly(&self, anomaly_score: f64) -> bool {
        anomaly_score <= self.high_anomaly
    }

    pub fn is_soft_anomaly(&self, anomaly_score: f64) -> bool {
        anomaly_score <= self.soft_anomaly
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds() {
        let t = DecisionThresholds::default();
        assert_eq!(t.high_fraud, 0.7);
        assert_eq!(t.soft_fraud, 0.5);
        assert_eq!(t.high_anomaly, -0.15);
        assert_eq!(t.soft_anomaly, -0.10);
        assert!(t.validate().is_ok());
    }

    #[test]
    fn test_anomaly_direction() {
        let t = DecisionThresholds::default();
        assert!(t.is_high_anomaly(-0.2));
        assert!(t.is_high_anomaly(-0.15));
        assert!(!t.is_high_anomaly(-0.12));
        assert!(t.is_soft_anomaly(-0.12));
        assert!(!t.is_soft_anomaly(0.3));
    }

    #[test]
    fn test_inverted_tiers_rejected() {
        let t = DecisionThresholds {
            soft_fraud: 0.8,
            ..Default::default()
        };
        assert!(t.validate().is_err());

        let t = DecisionThresholds {
            high_anomaly: -0.05,
            ..Default::default()
        };
        assert!(t.validate().is_err());
    }

    #[test]
    fn test_non_finite_rejected() {
        let t = DecisionThresholds {
            high_fraud: f64::NAN,
            ..Default::default()
        };
        assert!(t.validate().is_err());
    }
}
