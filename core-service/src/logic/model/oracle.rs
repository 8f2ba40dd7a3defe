//! Scoring Oracle - uniform interface over the two scoring models
//!
//! No decision logic here. The oracle only normalizes what the models
//! return so the rule engine always sees a `ScorePair`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::DecisionError;
use crate::logic::features::FeatureVector;
use crate::logic::policy::ScorePair;

// ============================================================================
// MODEL TRAITS
// ============================================================================

/// Raw classifier output
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClassifierOutput {
    /// Class-1 probability
    Probability(f64),
    /// Hard class label only (degraded)
    Label(i64),
}

/// Supervised fraud classifier
pub trait FraudClassifier: Send + Sync {
    fn classify(&self, features: &FeatureVector) -> Result<ClassifierOutput, DecisionError>;
}

/// Unsupervised anomaly detector. Lower score = more anomalous.
pub trait AnomalyDetector: Send + Sync {
    fn decision_score(&self, features: &FeatureVector) -> Result<f64, DecisionError>;
}

// ============================================================================
// MODEL VERSIONS
// ============================================================================

/// Opaque model name -> version map, passed through to audit records untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelVersions(BTreeMap<String, String>);

impl ModelVersions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, model: impl Into<String>, version: impl Into<String>) -> Self {
        self.0.insert(model.into(), version.into());
        self
    }

    pub fn get(&self, model: &str) -> Option<&str> {
        self.0.get(model).map(String::as_str)
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ModelVersions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

// ============================================================================
// SCORING ORACLE
// ============================================================================

/// Both scoring models plus their versions
pub struct ScoringOracle {
    classifier: Box<dyn FraudClassifier>,
    detector: Box<dyn AnomalyDetector>,
    versions: ModelVersions,
}

impl ScoringOracle {
    pub fn new(
        classifier: Box<dyn FraudClassifier>,
        detector: Box<dyn AnomalyDetector>,
        versions: ModelVersions,
    ) -> Self {
        Self {
            classifier,
            detector,
            versions,
        }
    }

    pub fn versions(&self) -> &ModelVersions {
        &self.versions
    }

    /// Score exactly one transaction.
    ///
    /// Model failures propagate as `OracleUnavailable`; no default score
    /// is ever substituted.
    pub fn score(&self, features: &FeatureVector) -> Result<ScorePair, DecisionError> {
        let fraud_probability = normalize_classifier_output(self.classifier.classify(features)?)?;

        let anomaly_score = self.detector.decision_score(features)?;
        if !anomaly_score.is_finite() {
            return Err(DecisionError::OracleUnavailable(format!(
                "anomaly detector returned non-finite score {}",
                anomaly_score
            )));
        }

        Ok(ScorePair {
            fraud_probability,
            anomaly_score,
        })
    }
}

/// Probability passes through if in [0, 1]; a bare label becomes 0.0 or 1.0
pub fn normalize_classifier_output(output: ClassifierOutput) -> Result<f64, DecisionError> {
    match output {
        ClassifierOutput::Probability(p) if p.is_finite() && (0.0..=1.0).contains(&p) => Ok(p),
        ClassifierOutput::Probability(p) => Err(DecisionError::OracleUnavailable(format!(
            "classifier returned probability outside [0, 1]: {}",
            p
        ))),
        ClassifierOutput::Label(label) => {
            log::debug!("Classifier exposes label only, coercing {} to probability", label);
            Ok(if label > 0 { 1.0 } else { 0.0 })
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::features::FeatureVectorBuilder;

    struct FixedClassifier(ClassifierOutput);
    impl FraudClassifier for FixedClassifier {
        fn classify(&self, _features: &FeatureVector) -> Result<ClassifierOutput, DecisionError> {
            Ok(self.0)
        }
    }

    struct FixedDetector(f64);
    impl AnomalyDetector for FixedDetector {
        fn decision_score(&self, _features: &FeatureVector) -> Result<f64, DecisionError> {
            Ok(self.0)
        }
    }

    struct BrokenDetector;
    impl AnomalyDetector for BrokenDetector {
        fn decision_score(&self, _features: &FeatureVector) -> Result<f64, DecisionError> {
            Err(DecisionError::OracleUnavailable("detector not loaded".into()))
        }
    }

    fn features() -> FeatureVector {
        FeatureVectorBuilder::new()
            .amount(120.0)
            .is_qr(false)
            .device_changed(false)
            .location_velocity(0.0)
            .failed_auth_24h(0.0)
            .amount_zscore(0.1)
            .is_night(false)
            .beneficiary_is_new(false)
            .txn_velocity_24h(2.0)
            .build()
            .unwrap()
    }

    fn oracle(output: ClassifierOutput, anomaly: f64) -> ScoringOracle {
        ScoringOracle::new(
            Box::new(FixedClassifier(output)),
            Box::new(FixedDetector(anomaly)),
            ModelVersions::new().with("fraud_model", "v3"),
        )
    }

    #[test]
    fn test_probability_passes_through() {
        let scores = oracle(ClassifierOutput::Probability(0.42), -0.07).score(&features()).unwrap();
        assert_eq!(scores.fraud_probability, 0.42);
        assert_eq!(scores.anomaly_score, -0.07);
    }

    #[test]
    fn test_label_coerced() {
        let one = oracle(ClassifierOutput::Label(1), 0.0).score(&features()).unwrap();
        assert_eq!(one.fraud_probability, 1.0);
        let zero = oracle(ClassifierOutput::Label(0), 0.0).score(&features()).unwrap();
        assert_eq!(zero.fraud_probability, 0.0);
    }

    #[test]
    fn test_bad_probability_is_unavailable() {
        let err = oracle(ClassifierOutput::Probability(1.5), 0.0).score(&features()).unwrap_err();
        assert!(matches!(err, DecisionError::OracleUnavailable(_)));
        let err = oracle(ClassifierOutput::Probability(f64::NAN), 0.0).score(&features()).unwrap_err();
        assert!(matches!(err, DecisionError::OracleUnavailable(_)));
    }

    #[test]
    fn test_detector_failure_propagates() {
        let oracle = ScoringOracle::new(
            Box::new(FixedClassifier(ClassifierOutput::Probability(0.1))),
            Box::new(BrokenDetector),
            ModelVersions::new(),
        );
        assert!(matches!(oracle.score(&features()), Err(DecisionError::OracleUnavailable(_))));
    }

    #[test]
    fn test_versions_serialize_sorted() {
        let versions = ModelVersions::new().with("fraud_model", "v3").with("anomaly_model", "v1");
        let json = serde_json::to_string(&versions).unwrap();
        assert_eq!(json, r#"{"anomaly_model":"v1","fraud_model":"v3"}"#);
        assert_eq!(versions.get("fraud_model"), Some("v3"));
    }
}
