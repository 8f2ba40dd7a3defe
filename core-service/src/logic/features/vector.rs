//! Feature Vector - Core data structure for scoring and audit
//!
//! One validated transaction record with a named field per feature.
//! Values can only enter through the validating constructors below, so a
//! `FeatureVector` that exists always matches the layout in `layout.rs`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::layout::{
    feature_index, is_binary, is_non_negative, FEATURE_COUNT, FEATURE_LAYOUT,
};
use crate::error::ValidationError;

// ============================================================================
// FEATURE VECTOR
// ============================================================================

/// Validated, immutable feature record for exactly one transaction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct FeatureVector {
    amount: f64,
    is_qr: f64,
    device_changed: f64,
    location_velocity: f64,
    failed_auth_24h: f64,
    amount_zscore: f64,
    is_night: f64,
    beneficiary_is_new: f64,
    txn_velocity_24h: f64,
}

impl FeatureVector {
    /// Build from values in layout order
    pub fn from_values(values: [f64; FEATURE_COUNT]) -> Result<Self, ValidationError> {
        for (name, &value) in FEATURE_LAYOUT.iter().zip(values.iter()) {
            validate_value(name, value)?;
        }

        Ok(Self {
            amount: values[0],
            is_qr: values[1],
            device_changed: values[2],
            location_velocity: values[3],
            failed_auth_24h: values[4],
            amount_zscore: values[5],
            is_night: values[6],
            beneficiary_is_new: values[7],
            txn_velocity_24h: values[8],
        })
    }

    /// Build from a JSON record.
    ///
    /// Accepts a single object, or an array holding exactly one object.
    /// Unknown, missing, and non-numeric fields are rejected; nothing is
    /// defaulted.
    pub fn from_json(value: &Value) -> Result<Self, ValidationError> {
        let record = match value {
            Value::Object(map) => map,
            Value::Array(items) => match items.as_slice() {
                [Value::Object(map)] => map,
                [other] => return Err(ValidationError::NotARecord(json_kind(other).to_string())),
                _ => return Err(ValidationError::RecordCount(items.len())),
            },
            other => return Err(ValidationError::NotARecord(json_kind(other).to_string())),
        };

        Self::from_record(record)
    }

    /// Build from a field map
    pub fn from_record(record: &Map<String, Value>) -> Result<Self, ValidationError> {
        if let Some(unknown) = record.keys().find(|k| feature_index(k).is_none()) {
            return Err(ValidationError::UnknownField(unknown.clone()));
        }

        let mut values = [0.0f64; FEATURE_COUNT];
        for (i, name) in FEATURE_LAYOUT.iter().enumerate() {
            let raw = record
                .get(*name)
                .ok_or_else(|| ValidationError::MissingField(name.to_string()))?;
            values[i] = raw.as_f64().ok_or_else(|| ValidationError::NotNumeric {
                field: name.to_string(),
                found: json_kind(raw).to_string(),
            })?;
        }

        Self::from_values(values)
    }

    /// Values in layout order
    pub fn values(&self) -> [f64; FEATURE_COUNT] {
        [
            self.amount,
            self.is_qr,
            self.device_changed,
            self.location_velocity,
            self.failed_auth_24h,
            self.amount_zscore,
            self.is_night,
            self.beneficiary_is_new,
            self.txn_velocity_24h,
        ]
    }

    /// Values in layout order, narrowed for model input tensors
    pub fn values_f32(&self) -> [f32; FEATURE_COUNT] {
        self.values().map(|v| v as f32)
    }

    /// Get feature by name
    pub fn get(&self, name: &str) -> Option<f64> {
        feature_index(name).map(|i| self.values()[i])
    }

    /// Canonical string form: layout-ordered values joined by ','.
    ///
    /// Each value uses Rust's shortest round-trip `f64` rendering, so the
    /// same vector always yields the same bytes.
    pub fn canonical_string(&self) -> String {
        self.values()
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn is_qr(&self) -> bool {
        self.is_qr == 1.0
    }

    pub fn beneficiary_is_new(&self) -> bool {
        self.beneficiary_is_new == 1.0
    }

    pub fn device_changed(&self) -> bool {
        self.device_changed == 1.0
    }

    pub fn is_night(&self) -> bool {
        self.is_night == 1.0
    }

    /// Named JSON object (layout order is not preserved by JSON maps)
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = FEATURE_LAYOUT
            .iter()
            .zip(self.values().iter())
            .map(|(name, value)| (name.to_string(), Value::from(*value)))
            .collect();
        Value::Object(map)
    }
}

impl TryFrom<Value> for FeatureVector {
    type Error = ValidationError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_json(&value)
    }
}

fn validate_value(name: &str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFinite { field: name.to_string() });
    }
    if is_binary(name) && value != 0.0 && value != 1.0 {
        return Err(ValidationError::NotBinary {
            field: name.to_string(),
            value: value.to_string(),
        });
    }
    if is_non_negative(name) && value < 0.0 {
        return Err(ValidationError::Negative {
            field: name.to_string(),
            value: value.to_string(),
        });
    }
    Ok(())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// BUILDER PATTERN
// ============================================================================

/// Builder for creating FeatureVector with named setters.
/// Every feature must be set; `build` never fills in defaults.
#[derive(Debug, Default)]
pub struct FeatureVectorBuilder {
    values: [Option<f64>; FEATURE_COUNT],
    unknown: Option<String>,
}

impl FeatureVectorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn amount(self, value: f64) -> Self {
        self.set("amount", value)
    }

    pub fn is_qr(self, value: bool) -> Self {
        self.set("is_qr", flag(value))
    }

    pub fn device_changed(self, value: bool) -> Self {
        self.set("device_changed", flag(value))
    }

    pub fn location_velocity(self, value: f64) -> Self {
        self.set("location_velocity", value)
    }

    pub fn failed_auth_24h(self, value: f64) -> Self {
        self.set("failed_auth_24h", value)
    }

    pub fn amount_zscore(self, value: f64) -> Self {
        self.set("amount_zscore", value)
    }

    pub fn is_night(self, value: bool) -> Self {
        self.set("is_night", flag(value))
    }

    pub fn beneficiary_is_new(self, value: bool) -> Self {
        self.set("beneficiary_is_new", flag(value))
    }

    pub fn txn_velocity_24h(self, value: f64) -> Self {
        self.set("txn_velocity_24h", value)
    }

    /// Set feature by name. An unknown name fails `build`.
    pub fn set(mut self, name: &str, value: f64) -> Self {
        match feature_index(name) {
            Some(i) => self.values[i] = Some(value),
            None => {
                self.unknown.get_or_insert_with(|| name.to_string());
            }
        }
        self
    }

    pub fn build(self) -> Result<FeatureVector, ValidationError> {
        if let Some(name) = self.unknown {
            return Err(ValidationError::UnknownField(name));
        }
        let mut values = [0.0f64; FEATURE_COUNT];
        for (i, slot) in self.values.iter().enumerate() {
            values[i] = slot.ok_or_else(|| ValidationError::MissingField(FEATURE_LAYOUT[i].to_string()))?;
        }
        FeatureVector::from_values(values)
    }
}

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_json() -> Value {
        json!({
            "amount": 1200.0,
            "is_qr": 1,
            "device_changed": 0,
            "location_velocity": 2,
            "failed_auth_24h": 1,
            "amount_zscore": 2.5,
            "is_night": 0,
            "beneficiary_is_new": 1,
            "txn_velocity_24h": 7
        })
    }

    #[test]
    fn test_from_json_object() {
        let vector = FeatureVector::from_json(&sample_json()).unwrap();
        assert_eq!(vector.amount(), 1200.0);
        assert!(vector.is_qr());
        assert!(vector.beneficiary_is_new());
        assert!(!vector.device_changed());
        assert_eq!(vector.get("txn_velocity_24h"), Some(7.0));
    }

    #[test]
    fn test_from_json_single_element_array() {
        let vector = FeatureVector::from_json(&json!([sample_json()])).unwrap();
        assert_eq!(vector, FeatureVector::from_json(&sample_json()).unwrap());
    }

    #[test]
    fn test_rejects_multiple_records() {
        let err = FeatureVector::from_json(&json!([sample_json(), sample_json()])).unwrap_err();
        assert_eq!(err, ValidationError::RecordCount(2));

        let err = FeatureVector::from_json(&json!([])).unwrap_err();
        assert_eq!(err, ValidationError::RecordCount(0));
    }

    #[test]
    fn test_rejects_positional_array() {
        let err = FeatureVector::from_json(&json!([1200.0, 1, 0, 2, 1, 2.5, 0, 1, 7])).unwrap_err();
        assert_eq!(err, ValidationError::RecordCount(9));
    }

    #[test]
    fn test_missing_field_is_not_defaulted() {
        let mut record = sample_json();
        record.as_object_mut().unwrap().remove("beneficiary_is_new");
        let err = FeatureVector::from_json(&record).unwrap_err();
        assert_eq!(err, ValidationError::MissingField("beneficiary_is_new".into()));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let mut record = sample_json();
        record["is_qrr"] = json!(1);
        let err = FeatureVector::from_json(&record).unwrap_err();
        assert_eq!(err, ValidationError::UnknownField("is_qrr".into()));
    }

    #[test]
    fn test_non_numeric_rejected() {
        let mut record = sample_json();
        record["amount"] = json!("1200");
        assert!(matches!(
            FeatureVector::from_json(&record),
            Err(ValidationError::NotNumeric { .. })
        ));
    }

    #[test]
    fn test_flag_must_be_binary() {
        let mut record = sample_json();
        record["is_qr"] = json!(2);
        assert!(matches!(
            FeatureVector::from_json(&record),
            Err(ValidationError::NotBinary { .. })
        ));
    }

    #[test]
    fn test_counts_must_be_non_negative() {
        let mut record = sample_json();
        record["failed_auth_24h"] = json!(-1);
        assert!(matches!(
            FeatureVector::from_json(&record),
            Err(ValidationError::Negative { .. })
        ));
    }

    #[test]
    fn test_non_finite_rejected() {
        let mut values = FeatureVector::from_json(&sample_json()).unwrap().values();
        values[5] = f64::NAN;
        assert!(matches!(
            FeatureVector::from_values(values),
            Err(ValidationError::NonFinite { .. })
        ));
    }

    #[test]
    fn test_values_follow_layout() {
        let vector = FeatureVector::from_json(&sample_json()).unwrap();
        let values = vector.values();
        for (i, name) in FEATURE_LAYOUT.iter().enumerate() {
            assert_eq!(vector.get(name), Some(values[i]));
        }
    }

    #[test]
    fn test_canonical_string() {
        let vector = FeatureVector::from_json(&sample_json()).unwrap();
        assert_eq!(vector.canonical_string(), "1200,1,0,2,1,2.5,0,1,7");
    }

    #[test]
    fn test_serde_roundtrip_goes_through_validation() {
        let vector = FeatureVector::from_json(&sample_json()).unwrap();
        let text = serde_json::to_string(&vector).unwrap();
        let back: FeatureVector = serde_json::from_str(&text).unwrap();
        assert_eq!(vector, back);

        let bad = r#"{"amount": 1.0}"#;
        assert!(serde_json::from_str::<FeatureVector>(bad).is_err());
    }

    #[test]
    fn test_builder_requires_every_feature() {
        let err = FeatureVectorBuilder::new().amount(10.0).build().unwrap_err();
        assert_eq!(err, ValidationError::MissingField("is_qr".into()));
    }
}
