//! Audit Record - one line of the append-only decision log

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::logic::features::FeatureVector;
use crate::logic::model::ModelVersions;
use crate::logic::policy::{Decision, DecisionCategory};

/// Immutable record of a single decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,
    pub decision: DecisionCategory,
    pub risk_score: f64,
    pub anomaly_score: f64,
    pub reason_code: String,
    pub feature_hash: String,
    pub model_versions: ModelVersions,
}

impl AuditRecord {
    pub fn new(decision: &Decision, features: &FeatureVector, model_versions: &ModelVersions) -> Self {
        Self {
            timestamp: Utc::now(),
            decision: decision.category,
            risk_score: decision.risk_score,
            anomaly_score: decision.anomaly_score,
            reason_code: decision.reason_code.clone(),
            feature_hash: feature_hash(features),
            model_versions: model_versions.clone(),
        }
    }

    /// One JSON line, no trailing newline
    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// True if this record fingerprints exactly these model inputs
    pub fn matches(&self, features: &FeatureVector) -> bool {
        self.feature_hash == feature_hash(features)
    }
}

/// Hex SHA-256 over the canonical, layout-ordered feature string
pub fn feature_hash(features: &FeatureVector) -> String {
    let digest = Sha256::digest(features.canonical_string().as_bytes());
    hex::encode(digest)
}
