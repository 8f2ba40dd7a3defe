//! Runtime settings
//!
//! Every value has a default in `constants.rs`; deployments override them
//! with `FRAUDSHIELD_*` environment variables (a `.env` file is honored).

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{KnowledgeError, ValidationError};
use crate::logic::knowledge::{Embedder, HashingEmbedder, KnowledgePaths, OnnxEmbedder};
use crate::logic::model::ModelVersions;
use crate::logic::policy::DecisionThresholds;

/// Which embedding model backs the knowledge index
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedderKind {
    #[default]
    Hashing,
    Onnx,
}

impl FromStr for EmbedderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hashing" => Ok(EmbedderKind::Hashing),
            "onnx" => Ok(EmbedderKind::Onnx),
            other => Err(format!("unknown embedder '{}', expected 'hashing' or 'onnx'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub fraud_model_path: PathBuf,
    pub anomaly_model_path: PathBuf,
    pub fraud_model_version: String,
    pub anomaly_model_version: String,
    pub audit_log_path: PathBuf,
    pub index_path: PathBuf,
    pub chunks_path: PathBuf,
    pub knowledge_dir: PathBuf,
    pub embedder: EmbedderKind,
    pub embedder_model: Option<PathBuf>,
    pub embedder_vocab: Option<PathBuf>,
    pub thresholds: DecisionThresholds,
    pub top_k: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fraud_model_path: PathBuf::from(DEFAULT_FRAUD_MODEL_PATH),
            anomaly_model_path: PathBuf::from(DEFAULT_ANOMALY_MODEL_PATH),
            fraud_model_version: format!("{}@{}", FRAUD_MODEL_NAME, UNVERSIONED),
            anomaly_model_version: format!("{}@{}", ANOMALY_MODEL_NAME, UNVERSIONED),
            audit_log_path: PathBuf::from(DEFAULT_AUDIT_LOG_PATH),
            index_path: PathBuf::from(DEFAULT_INDEX_PATH),
            chunks_path: PathBuf::from(DEFAULT_CHUNKS_PATH),
            knowledge_dir: PathBuf::from(DEFAULT_KNOWLEDGE_DIR),
            embedder: EmbedderKind::default(),
            embedder_model: None,
            embedder_vocab: None,
            thresholds: DecisionThresholds::default(),
            top_k: DEFAULT_TOP_K,
        }
    }
}

impl Settings {
    /// Load from the process environment after reading `.env` if present
    pub fn from_env() -> Result<Self, ValidationError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ValidationError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let path_or = |key: &str, default: PathBuf| get(key).map(PathBuf::from).unwrap_or(default);

        let thresholds = DecisionThresholds {
            high_fraud: parse_or(&get, "FRAUDSHIELD_HIGH_FRAUD", defaults.thresholds.high_fraud)?,
            soft_fraud: parse_or(&get, "FRAUDSHIELD_SOFT_FRAUD", defaults.thresholds.soft_fraud)?,
            high_anomaly: parse_or(&get, "FRAUDSHIELD_HIGH_ANOMALY", defaults.thresholds.high_anomaly)?,
            soft_anomaly: parse_or(&get, "FRAUDSHIELD_SOFT_ANOMALY", defaults.thresholds.soft_anomaly)?,
        };
        thresholds.validate()?;

        let embedder = match get("FRAUDSHIELD_EMBEDDER") {
            Some(raw) => raw.parse().map_err(|_| ValidationError::InvalidSetting {
                key: "FRAUDSHIELD_EMBEDDER".to_string(),
                value: raw.clone(),
            })?,
            None => defaults.embedder,
        };

        let settings = Self {
            fraud_model_path: path_or("FRAUDSHIELD_FRAUD_MODEL", defaults.fraud_model_path),
            anomaly_model_path: path_or("FRAUDSHIELD_ANOMALY_MODEL", defaults.anomaly_model_path),
            fraud_model_version: get("FRAUDSHIELD_FRAUD_MODEL_VERSION").unwrap_or(defaults.fraud_model_version),
            anomaly_model_version: get("FRAUDSHIELD_ANOMALY_MODEL_VERSION")
                .unwrap_or(defaults.anomaly_model_version),
            audit_log_path: path_or("FRAUDSHIELD_AUDIT_LOG", defaults.audit_log_path),
            index_path: path_or("FRAUDSHIELD_INDEX_PATH", defaults.index_path),
            chunks_path: path_or("FRAUDSHIELD_CHUNKS_PATH", defaults.chunks_path),
            knowledge_dir: path_or("FRAUDSHIELD_KNOWLEDGE_DIR", defaults.knowledge_dir),
            embedder,
            embedder_model: get("FRAUDSHIELD_EMBEDDER_MODEL").map(PathBuf::from),
            embedder_vocab: get("FRAUDSHIELD_EMBEDDER_VOCAB").map(PathBuf::from),
            thresholds,
            top_k: parse_or(&get, "FRAUDSHIELD_TOP_K", defaults.top_k)?.max(1),
        };

        log::debug!("Settings loaded: {:?}", settings);
        Ok(settings)
    }

    /// Versions written into every audit record
    pub fn model_versions(&self) -> ModelVersions {
        ModelVersions::new()
            .with(FRAUD_MODEL_NAME, self.fraud_model_version.as_str())
            .with(ANOMALY_MODEL_NAME, self.anomaly_model_version.as_str())
    }

    pub fn knowledge_paths(&self) -> KnowledgePaths {
        KnowledgePaths::new(&self.index_path, &self.chunks_path)
    }

    /// Construct the configured embedding model
    pub fn build_embedder(&self) -> Result<Arc<dyn Embedder>, KnowledgeError> {
        match self.embedder {
            EmbedderKind::Hashing => Ok(Arc::new(HashingEmbedder::default())),
            EmbedderKind::Onnx => {
                let model = self.embedder_model.as_ref().ok_or_else(|| {
                    KnowledgeError::Embedding("FRAUDSHIELD_EMBEDDER_MODEL is not set".to_string())
                })?;
                let vocab = self.embedder_vocab.as_ref().ok_or_else(|| {
                    KnowledgeError::Embedding("FRAUDSHIELD_EMBEDDER_VOCAB is not set".to_string())
                })?;
                Ok(Arc::new(OnnxEmbedder::load(model, vocab)?))
            }
        }
    }
}

fn parse_or<T: FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ValidationError> {
    match get(key) {
        Some(raw) => raw.parse().map_err(|_| ValidationError::InvalidSetting {
            key: key.to_string(),
            value: raw,
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.fraud_model_version, "fraud_model@unversioned");
        assert_eq!(settings.embedder, EmbedderKind::Hashing);
        assert_eq!(settings.top_k, 3);
    }

    #[test]
    fn test_overrides() {
        let settings = Settings::from_lookup(lookup(&[
            ("FRAUDSHIELD_AUDIT_LOG", "/var/log/fs/audit.jsonl"),
            ("FRAUDSHIELD_FRAUD_MODEL_VERSION", "xgb-2024-06"),
            ("FRAUDSHIELD_SOFT_FRAUD", "0.45"),
            ("FRAUDSHIELD_TOP_K", "5"),
            ("FRAUDSHIELD_EMBEDDER", "ONNX"),
            ("FRAUDSHIELD_INDEX_PATH", "   "),
        ]))
        .unwrap();

        assert_eq!(settings.audit_log_path, PathBuf::from("/var/log/fs/audit.jsonl"));
        assert_eq!(settings.thresholds.soft_fraud, 0.45);
        assert_eq!(settings.top_k, 5);
        assert_eq!(settings.embedder, EmbedderKind::Onnx);
        assert_eq!(settings.index_path, PathBuf::from(DEFAULT_INDEX_PATH));
        assert_eq!(settings.model_versions().get("fraud_model"), Some("xgb-2024-06"));
        assert_eq!(settings.model_versions().get("anomaly_model"), Some("anomaly_model@unversioned"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(Settings::from_lookup(lookup(&[("FRAUDSHIELD_HIGH_FRAUD", "high")])).is_err());
        assert!(Settings::from_lookup(lookup(&[("FRAUDSHIELD_EMBEDDER", "bert")])).is_err());
        // soft tier above the hard tier
        assert!(Settings::from_lookup(lookup(&[("FRAUDSHIELD_SOFT_FRAUD", "0.9")])).is_err());
    }

    #[test]
    fn test_onnx_embedder_requires_paths() {
        let settings = Settings {
            embedder: EmbedderKind::Onnx,
            ..Default::default()
        };
        assert!(matches!(settings.build_embedder(), Err(KnowledgeError::Embedding(_))));
    }

    #[test]
    fn test_hashing_embedder_default() {
        let embedder = Settings::default().build_embedder().unwrap();
        assert_eq!(embedder.model_id(), "hashing-v1-384");
        assert_eq!(embedder.dimension(), 384);
    }

    #[test]
    fn test_deserialize_partial() {
        let settings: Settings = serde_json::from_str(r#"{"top_k": 4, "embedder": "onnx"}"#).unwrap();
        assert_eq!(settings.top_k, 4);
        assert_eq!(settings.embedder, EmbedderKind::Onnx);
        assert_eq!(settings.chunks_path, PathBuf::from(DEFAULT_CHUNKS_PATH));
    }
}
