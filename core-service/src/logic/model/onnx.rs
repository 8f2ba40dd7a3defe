//! ONNX Runtime scoring models
//!
//! Loads the exported classifier and anomaly detector and binds the
//! feature record to model inputs by name. Positional input is only
//! accepted as a single `[1, N]` tensor whose column order is the fixed
//! feature layout.

use std::path::Path;

use ndarray::Array2;
use ort::session::{builder::GraphOptimizationLevel, Session, SessionInputValue, SessionOutputs};
use ort::value::Tensor;
use parking_lot::Mutex;

use super::oracle::{AnomalyDetector, ClassifierOutput, FraudClassifier};
use crate::error::DecisionError;
use crate::logic::features::{
    check_layout_hash, layout_hash, FeatureVector, FEATURE_COUNT, FEATURE_LAYOUT, FEATURE_VERSION,
    LAYOUT_HASH_METADATA_KEY,
};

// ============================================================================
// INPUT BINDING
// ============================================================================

/// How the feature record reaches the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputBinding {
    /// One `[1, 1]` input per feature, named after the feature
    PerFeature,
    /// One `[1, N]` input in layout order
    Matrix(String),
}

impl InputBinding {
    /// Match the model's declared inputs against the feature layout
    pub fn from_input_names(names: &[String]) -> Result<Self, String> {
        if names.len() == FEATURE_COUNT && FEATURE_LAYOUT.iter().all(|f| names.iter().any(|n| n == f)) {
            return Ok(InputBinding::PerFeature);
        }

        match names {
            [single] => Ok(InputBinding::Matrix(single.clone())),
            _ => Err(format!(
                "model inputs {:?} match neither the per-feature layout nor a single [1, {}] tensor",
                names, FEATURE_COUNT
            )),
        }
    }

    fn bind(&self, features: &FeatureVector) -> Result<Vec<(String, SessionInputValue<'static>)>, String> {
        let values = features.values_f32();

        match self {
            InputBinding::PerFeature => FEATURE_LAYOUT
                .iter()
                .zip(values.iter())
                .map(|(name, &value)| {
                    let tensor = Tensor::from_array((vec![1_i64, 1], vec![value]))
                        .map_err(|e| format!("tensor error for '{}': {}", name, e))?;
                    Ok((name.to_string(), tensor.into()))
                })
                .collect(),
            InputBinding::Matrix(name) => {
                let array = Array2::<f32>::from_shape_vec((1, FEATURE_COUNT), values.to_vec())
                    .map_err(|e| format!("array error: {}", e))?;
                let tensor = Tensor::from_array(array).map_err(|e| format!("tensor error: {}", e))?;
                Ok(vec![(name.clone(), tensor.into())])
            }
        }
    }
}

// ============================================================================
// SHARED SESSION WRAPPER
// ============================================================================

/// Loaded session plus its resolved input binding.
///
/// `Session::run` needs `&mut`, so the session sits behind a mutex.
struct OnnxModel {
    name: String,
    session: Mutex<Session>,
    binding: InputBinding,
    output_names: Vec<String>,
}

impl OnnxModel {
    fn load(path: &Path, name: &str) -> Result<Self, DecisionError> {
        let unavailable = |msg: String| DecisionError::OracleUnavailable(format!("{}: {}", name, msg));

        log::info!("Loading ONNX model '{}' from: {}", name, path.display());

        if !path.exists() {
            return Err(unavailable(format!("model not found: {}", path.display())));
        }

        let session = Session::builder()
            .map_err(|e| unavailable(format!("failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| unavailable(format!("failed to set optimization: {}", e)))?
            .commit_from_file(path)
            .map_err(|e| unavailable(format!("failed to load model: {}", e)))?;

        let input_names: Vec<String> = session.inputs.iter().map(|i| i.name.clone()).collect();
        let output_names: Vec<String> = session.outputs.iter().map(|o| o.name.clone()).collect();
        let binding = InputBinding::from_input_names(&input_names).map_err(&unavailable)?;

        let declared_layout = session
            .metadata()
            .ok()
            .and_then(|meta| meta.custom(LAYOUT_HASH_METADATA_KEY).ok().flatten());
        match declared_layout.as_deref() {
            Some(declared) => check_layout_hash(declared).map_err(&unavailable)?,
            None => log::warn!(
                "ONNX model '{}' does not declare '{}', layout unchecked",
                name,
                LAYOUT_HASH_METADATA_KEY
            ),
        }

        log::info!(
            "ONNX model '{}' loaded (binding: {:?}, outputs: {:?}, feature layout v{} {:08x})",
            name,
            binding,
            output_names,
            FEATURE_VERSION,
            layout_hash()
        );

        Ok(Self {
            name: name.to_string(),
            session: Mutex::new(session),
            binding,
            output_names,
        })
    }

    fn run<T>(
        &self,
        features: &FeatureVector,
        extract: impl FnOnce(&SessionOutputs<'_>) -> Result<T, String>,
    ) -> Result<T, DecisionError> {
        let unavailable = |msg: String| DecisionError::OracleUnavailable(format!("{}: {}", self.name, msg));

        let inputs = self.binding.bind(features).map_err(unavailable)?;

        let mut session = self.session.lock();
        let outputs = session
            .run(inputs)
            .map_err(|e| unavailable(format!("inference failed: {}", e)))?;

        extract(&outputs).map_err(unavailable)
    }

    fn find_output(&self, pred: impl Fn(&str) -> bool) -> Option<String> {
        self.output_names.iter().find(|n| pred(n.as_str())).cloned()
    }
}

/// Class-1 probability from a `[1, C]`, `[C]` or `[1, 1]` tensor
fn class_one_probability(shape: &[i64], data: &[f32]) -> Option<f64> {
    let classes = shape.last().copied().unwrap_or(0);
    match classes {
        c if c >= 2 => data.get(1).map(|&p| p as f64),
        1 => data.first().map(|&p| p as f64),
        _ => None,
    }
}

// ============================================================================
// CLASSIFIER
// ============================================================================

/// Fraud classifier exported to ONNX.
///
/// Reads the probability output when the export has one, otherwise
/// falls back to the label output.
pub struct OnnxClassifier {
    model: OnnxModel,
    probability_output: Option<String>,
    label_output: Option<String>,
}

impl OnnxClassifier {
    pub fn load(path: impl AsRef<Path>, name: &str) -> Result<Self, DecisionError> {
        let model = OnnxModel::load(path.as_ref(), name)?;
        let probability_output = model.find_output(|n| n.contains("prob"));
        let label_output = model.find_output(|n| n.contains("label"));

        if probability_output.is_none() && label_output.is_none() {
            return Err(DecisionError::OracleUnavailable(format!(
                "{}: no probability or label output in {:?}",
                name, model.output_names
            )));
        }
        if probability_output.is_none() {
            log::warn!("Classifier '{}' has no probability output, using label output", name);
        }

        Ok(Self {
            model,
            probability_output,
            label_output,
        })
    }
}

impl FraudClassifier for OnnxClassifier {
    fn classify(&self, features: &FeatureVector) -> Result<ClassifierOutput, DecisionError> {
        self.model.run(features, |outputs| {
            let probability = match &self.probability_output {
                Some(name) => read_probability(outputs, name),
                None => ProbabilityRead::Absent,
            };
            resolve_classifier_output(probability, || read_label(outputs, self.label_output.as_deref()))
        })
    }
}

/// Probability output as seen at inference time
#[derive(Debug, Clone, PartialEq)]
enum ProbabilityRead {
    /// The model declares no probability output
    Absent,
    Read(f64),
    /// Declared but not a readable float tensor (e.g. a ZipMap export)
    Unreadable(String),
}

fn read_probability(outputs: &SessionOutputs<'_>, name: &str) -> ProbabilityRead {
    let Some(output) = outputs.get(name) else {
        return ProbabilityRead::Unreadable(format!("missing output '{}'", name));
    };
    match output.try_extract_tensor::<f32>() {
        Ok((shape, data)) => {
            let dims: Vec<i64> = shape.iter().copied().collect();
            match class_one_probability(&dims, data) {
                Some(p) => ProbabilityRead::Read(p),
                None => ProbabilityRead::Unreadable(format!("'{}' has unexpected shape {:?}", name, dims)),
            }
        }
        Err(e) => ProbabilityRead::Unreadable(format!(
            "'{}' is not a float tensor, export the classifier without ZipMap: {}",
            name, e
        )),
    }
}

fn read_label(outputs: &SessionOutputs<'_>, name: Option<&str>) -> Result<i64, String> {
    let name = name.ok_or_else(|| "no probability or label output".to_string())?;
    let output = outputs
        .get(name)
        .ok_or_else(|| format!("missing output '{}'", name))?;
    let (_, labels) = output
        .try_extract_tensor::<i64>()
        .map_err(|e| format!("label extract error: {}", e))?;
    labels.first().copied().ok_or_else(|| "empty label output".to_string())
}

/// A label is only used when the model has no probability output at all.
/// An unreadable probability is an error, never downgraded to a label.
fn resolve_classifier_output(
    probability: ProbabilityRead,
    label: impl FnOnce() -> Result<i64, String>,
) -> Result<ClassifierOutput, String> {
    match probability {
        ProbabilityRead::Read(p) => Ok(ClassifierOutput::Probability(p)),
        ProbabilityRead::Unreadable(reason) => Err(format!("probability output unreadable: {}", reason)),
        ProbabilityRead::Absent => label().map(ClassifierOutput::Label),
    }
}

// ============================================================================
// ANOMALY DETECTOR
// ============================================================================

/// Isolation-forest style detector exported to ONNX.
///
/// Reads the decision-function output (`scores`), where lower means more
/// anomalous.
pub struct OnnxAnomalyDetector {
    model: OnnxModel,
    score_output: String,
}

impl OnnxAnomalyDetector {
    pub fn load(path: impl AsRef<Path>, name: &str) -> Result<Self, DecisionError> {
        let model = OnnxModel::load(path.as_ref(), name)?;
        let score_output = model
            .find_output(|n| n.contains("score"))
            .or_else(|| match model.output_names.as_slice() {
                [only] => Some(only.clone()),
                _ => None,
            })
            .ok_or_else(|| {
                DecisionError::OracleUnavailable(format!(
                    "{}: no score output in {:?}",
                    name, model.output_names
                ))
            })?;

        Ok(Self { model, score_output })
    }
}

impl AnomalyDetector for OnnxAnomalyDetector {
    fn decision_score(&self, features: &FeatureVector) -> Result<f64, DecisionError> {
        self.model.run(features, |outputs| {
            let output = outputs
                .get(self.score_output.as_str())
                .ok_or_else(|| format!("missing output '{}'", self.score_output))?;
            let (_, data) = output
                .try_extract_tensor::<f32>()
                .map_err(|e| format!("score extract error: {}", e))?;
            data.first()
                .map(|&s| s as f64)
                .ok_or_else(|| "empty score output".to_string())
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_per_feature_binding() {
        let mut inputs = names(&FEATURE_LAYOUT);
        inputs.reverse();
        assert_eq!(InputBinding::from_input_names(&inputs).unwrap(), InputBinding::PerFeature);
    }

    #[test]
    fn test_matrix_binding() {
        let binding = InputBinding::from_input_names(&names(&["float_input"])).unwrap();
        assert_eq!(binding, InputBinding::Matrix("float_input".to_string()));
    }

    #[test]
    fn test_mismatched_inputs_rejected() {
        assert!(InputBinding::from_input_names(&names(&["amount", "is_qr"])).is_err());
        assert!(InputBinding::from_input_names(&[]).is_err());

        let mut inputs = names(&FEATURE_LAYOUT);
        inputs[0] = "amt".to_string();
        assert!(InputBinding::from_input_names(&inputs).is_err());
    }

    #[test]
    fn test_class_one_probability() {
        assert_eq!(class_one_probability(&[1, 2], &[0.25, 0.75]), Some(0.75));
        assert_eq!(class_one_probability(&[1, 1], &[0.4]), Some(0.4f32 as f64));
        assert_eq!(class_one_probability(&[1, 0], &[]), None);
    }

    #[test]
    fn test_unreadable_probability_is_not_downgraded() {
        let out = resolve_classifier_output(ProbabilityRead::Unreadable("zipmap".into()), || Ok(1));
        assert!(out.unwrap_err().contains("probability output unreadable"));
    }

    #[test]
    fn test_label_used_only_without_probability_output() {
        assert_eq!(
            resolve_classifier_output(ProbabilityRead::Absent, || Ok(1)),
            Ok(ClassifierOutput::Label(1))
        );
        assert_eq!(
            resolve_classifier_output(ProbabilityRead::Read(0.6), || Ok(1)),
            Ok(ClassifierOutput::Probability(0.6))
        );
        assert!(resolve_classifier_output(ProbabilityRead::Absent, || Err("no label".into())).is_err());
    }

    #[test]
    fn test_missing_model_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.onnx");
        assert!(matches!(
            OnnxClassifier::load(&path, "fraud_model"),
            Err(DecisionError::OracleUnavailable(_))
        ));
        assert!(matches!(
            OnnxAnomalyDetector::load(&path, "anomaly_model"),
            Err(DecisionError::OracleUnavailable(_))
        ));
    }
}
