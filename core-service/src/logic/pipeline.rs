//! Decision pipeline - score, decide, audit
//!
//! The caller-side composition of the three decision components. The rule
//! engine stays pure; the fail-safe policy for unusable input or missing
//! models lives here.

use serde_json::Value;

use crate::config::Settings;
use crate::constants::{
    ANOMALY_MODEL_NAME, FRAUD_MODEL_NAME, REASON_INPUT_VALIDATION_FAILED, REASON_SCORING_UNAVAILABLE,
};
use crate::error::{AuditError, DecisionError};
use crate::logic::audit::{AuditLog, AuditRecord};
use crate::logic::features::FeatureVector;
use crate::logic::model::{OnnxAnomalyDetector, OnnxClassifier, ScoringOracle};
use crate::logic::policy::{Decision, RuleEngine};

// ============================================================================
// ASSESSMENT
// ============================================================================

/// What happened to the audit record of a decision
#[derive(Debug)]
pub enum AuditOutcome {
    Recorded(AuditRecord),
    /// Write failed. The decision still stands.
    Failed(AuditError),
    /// Fail-safe decisions have no validated feature vector to fingerprint
    Skipped,
}

impl AuditOutcome {
    pub fn is_recorded(&self) -> bool {
        matches!(self, AuditOutcome::Recorded(_))
    }
}

/// A decision plus its audit outcome
#[derive(Debug)]
pub struct Assessment {
    pub decision: Decision,
    pub audit: AuditOutcome,
}

impl Assessment {
    fn fail_safe(reason_code: &str) -> Self {
        Self {
            decision: Decision::fail_safe(reason_code),
            audit: AuditOutcome::Skipped,
        }
    }

    pub fn is_fail_safe(&self) -> bool {
        matches!(self.audit, AuditOutcome::Skipped)
    }
}

// ============================================================================
// FRAUDSHIELD
// ============================================================================

pub struct FraudShield {
    oracle: ScoringOracle,
    engine: RuleEngine,
    audit: AuditLog,
}

impl FraudShield {
    pub fn new(oracle: ScoringOracle, engine: RuleEngine, audit: AuditLog) -> Self {
        Self { oracle, engine, audit }
    }

    /// Load both ONNX models and open the audit sink from settings
    pub fn from_settings(settings: &Settings) -> Result<Self, DecisionError> {
        let classifier = OnnxClassifier::load(&settings.fraud_model_path, FRAUD_MODEL_NAME)?;
        let detector = OnnxAnomalyDetector::load(&settings.anomaly_model_path, ANOMALY_MODEL_NAME)?;
        let oracle = ScoringOracle::new(Box::new(classifier), Box::new(detector), settings.model_versions());
        let engine = RuleEngine::new(settings.thresholds)?;

        Ok(Self::new(oracle, engine, AuditLog::new(&settings.audit_log_path)))
    }

    pub fn oracle(&self) -> &ScoringOracle {
        &self.oracle
    }

    pub fn engine(&self) -> &RuleEngine {
        &self.engine
    }

    pub fn audit_log(&self) -> &AuditLog {
        &self.audit
    }

    /// Score, decide and audit one validated transaction.
    ///
    /// An audit failure is reported on the operator channel and returned in
    /// the assessment; it never changes the decision.
    pub fn assess(&self, features: &FeatureVector) -> Result<Assessment, DecisionError> {
        let scores = self.oracle.score(features)?;
        let decision = self.engine.decide_scores(features, scores)?;

        let audit = match self.audit.record(&decision, features, self.oracle.versions()) {
            Ok(record) => AuditOutcome::Recorded(record),
            Err(e) => {
                log::error!(
                    "Audit write failed for {} ({}): {}",
                    decision.category,
                    decision.reason_code,
                    e
                );
                AuditOutcome::Failed(e)
            }
        };

        Ok(Assessment { decision, audit })
    }

    /// Validate a raw record and assess it, substituting the fail-safe
    /// ALLOW decision when the input or the models are unusable.
    pub fn assess_or_fail_safe(&self, record: &Value) -> Assessment {
        let features = match FeatureVector::from_json(record) {
            Ok(features) => features,
            Err(e) => {
                log::warn!("Fail-safe {}: {}", REASON_INPUT_VALIDATION_FAILED, e);
                return Assessment::fail_safe(REASON_INPUT_VALIDATION_FAILED);
            }
        };

        match self.assess(&features) {
            Ok(assessment) => assessment,
            Err(DecisionError::Validation(e)) => {
                log::warn!("Fail-safe {}: {}", REASON_INPUT_VALIDATION_FAILED, e);
                Assessment::fail_safe(REASON_INPUT_VALIDATION_FAILED)
            }
            Err(DecisionError::OracleUnavailable(msg)) => {
                log::warn!("Fail-safe {}: {}", REASON_SCORING_UNAVAILABLE, msg);
                Assessment::fail_safe(REASON_SCORING_UNAVAILABLE)
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::model::{AnomalyDetector, ClassifierOutput, FraudClassifier, ModelVersions};
    use crate::logic::policy::DecisionCategory;
    use serde_json::json;

    struct StubClassifier(f64);
    impl FraudClassifier for StubClassifier {
        fn classify(&self, _features: &FeatureVector) -> Result<ClassifierOutput, DecisionError> {
            Ok(ClassifierOutput::Probability(self.0))
        }
    }

    struct StubDetector(f64);
    impl AnomalyDetector for StubDetector {
        fn decision_score(&self, _features: &FeatureVector) -> Result<f64, DecisionError> {
            Ok(self.0)
        }
    }

    struct MissingDetector;
    impl AnomalyDetector for MissingDetector {
        fn decision_score(&self, _features: &FeatureVector) -> Result<f64, DecisionError> {
            Err(DecisionError::OracleUnavailable("anomaly_model: model not found".into()))
        }
    }

    fn shield(detector: Box<dyn AnomalyDetector>, fraud: f64, audit: AuditLog) -> FraudShield {
        let oracle = ScoringOracle::new(
            Box::new(StubClassifier(fraud)),
            detector,
            ModelVersions::new().with("fraud_model", "v3").with("anomaly_model", "v1"),
        );
        FraudShield::new(oracle, RuleEngine::default(), audit)
    }

    fn record(is_qr: u8, new_beneficiary: u8) -> Value {
        json!({
            "amount": 9500.0,
            "is_qr": is_qr,
            "device_changed": 1,
            "location_velocity": 120.0,
            "failed_auth_24h": 2,
            "amount_zscore": 3.4,
            "is_night": 1,
            "beneficiary_is_new": new_beneficiary,
            "txn_velocity_24h": 7
        })
    }

    #[test]
    fn test_assess_records_audit() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::new(dir.path().join("audit.jsonl"));
        let shield = shield(Box::new(StubDetector(-0.3)), 0.92, log);

        let features = FeatureVector::from_json(&record(1, 1)).unwrap();
        let assessment = shield.assess(&features).unwrap();

        assert_eq!(assessment.decision.category, DecisionCategory::HardBlock);
        assert!(assessment.audit.is_recorded());

        let records = shield.audit_log().read_records().unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].matches(&features));
        assert_eq!(records[0].model_versions.get("fraud_model"), Some("v3"));
    }

    #[test]
    fn test_audit_failure_keeps_decision() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the log file should be makes the append fail
        let blocked = dir.path().join("audit.jsonl");
        std::fs::create_dir(&blocked).unwrap();
        let shield = shield(Box::new(StubDetector(0.2)), 0.55, AuditLog::new(&blocked));

        let features = FeatureVector::from_json(&record(0, 0)).unwrap();
        let assessment = shield.assess(&features).unwrap();

        assert_eq!(assessment.decision.category, DecisionCategory::SoftBlock);
        assert_eq!(assessment.decision.reason_code, "FRAUD_SIGNAL");
        assert!(matches!(assessment.audit, AuditOutcome::Failed(_)));
    }

    #[test]
    fn test_invalid_record_fails_safe() {
        let dir = tempfile::tempdir().unwrap();
        let shield = shield(Box::new(StubDetector(-0.3)), 0.92, AuditLog::new(dir.path().join("a.jsonl")));

        let mut bad = record(1, 1);
        bad["is_qr"] = json!(3);
        let assessment = shield.assess_or_fail_safe(&bad);

        assert!(assessment.is_fail_safe());
        assert_eq!(assessment.decision.category, DecisionCategory::Allow);
        assert_eq!(assessment.decision.reason_code, "INPUT_VALIDATION_FAILED");
        assert_eq!(assessment.decision.risk_score, 0.0);
        assert_eq!(shield.audit_log().len().unwrap(), 0);
    }

    #[test]
    fn test_missing_model_fails_safe() {
        let dir = tempfile::tempdir().unwrap();
        let shield = shield(Box::new(MissingDetector), 0.92, AuditLog::new(dir.path().join("a.jsonl")));

        let assessment = shield.assess_or_fail_safe(&record(1, 1));
        assert_eq!(assessment.decision.category, DecisionCategory::Allow);
        assert_eq!(assessment.decision.reason_code, "SCORING_UNAVAILABLE");
        assert!(shield.audit_log().is_empty().unwrap());

        let features = FeatureVector::from_json(&record(1, 1)).unwrap();
        assert!(matches!(shield.assess(&features), Err(DecisionError::OracleUnavailable(_))));
    }

    #[test]
    fn test_valid_record_is_not_fail_safe() {
        let dir = tempfile::tempdir().unwrap();
        let shield = shield(Box::new(StubDetector(0.1)), 0.05, AuditLog::new(dir.path().join("a.jsonl")));

        let assessment = shield.assess_or_fail_safe(&json!([record(0, 0)]));
        assert!(!assessment.is_fail_safe());
        assert_eq!(assessment.decision.reason_code, "NO_SIGNIFICANT_RISK");
        assert_eq!(shield.audit_log().len().unwrap(), 1);
    }
}
