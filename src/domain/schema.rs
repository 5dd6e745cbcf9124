//! Feature schema shared by the normalizer and the predictor.
//!
//! The schema fixes which form fields become model features and in what
//! order. It is versioned together with the model artifact: a predictor
//! trained on the reduced field set must never receive a full vector.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Versioned feature layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVersion {
    /// All 13 clinical features.
    #[default]
    Full,
    /// 11 features: no major vessels, no thalassemia.
    Reduced,
}

const FULL_FIELDS: [FeatureField; 13] = [
    FeatureField::Age,
    FeatureField::Gender,
    FeatureField::ChestPainType,
    FeatureField::RestingBloodPressure,
    FeatureField::SerumCholesterol,
    FeatureField::FastingBloodSugar,
    FeatureField::EcgResult,
    FeatureField::MaxHeartRate,
    FeatureField::MajorVessels,
    FeatureField::Thalassemia,
    FeatureField::ExerciseAngina,
    FeatureField::Oldpeak,
    FeatureField::StSlope,
];

const REDUCED_FIELDS: [FeatureField; 11] = [
    FeatureField::Age,
    FeatureField::Gender,
    FeatureField::ChestPainType,
    FeatureField::RestingBloodPressure,
    FeatureField::SerumCholesterol,
    FeatureField::FastingBloodSugar,
    FeatureField::EcgResult,
    FeatureField::MaxHeartRate,
    FeatureField::ExerciseAngina,
    FeatureField::Oldpeak,
    FeatureField::StSlope,
];

impl SchemaVersion {
    /// Feature fields in model input order.
    #[must_use]
    pub fn fields(&self) -> &'static [FeatureField] {
        match self {
            Self::Full => &FULL_FIELDS,
            Self::Reduced => &REDUCED_FIELDS,
        }
    }

    #[must_use]
    pub fn feature_count(&self) -> usize {
        self.fields().len()
    }

    /// Whether `field` is part of this layout.
    #[must_use]
    pub fn includes(&self, field: FeatureField) -> bool {
        self.fields().contains(&field)
    }

    /// Canonical model feature names, in order.
    #[must_use]
    pub fn feature_names(&self) -> Vec<&'static str> {
        self.fields().iter().map(|f| f.feature_name()).collect()
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Reduced => "reduced",
        }
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemaVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(Self::Full),
            "reduced" => Ok(Self::Reduced),
            other => Err(format!("Unknown schema version: {other}")),
        }
    }
}

/// A form field that can feed the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureField {
    Age,
    Gender,
    ChestPainType,
    RestingBloodPressure,
    SerumCholesterol,
    FastingBloodSugar,
    EcgResult,
    MaxHeartRate,
    MajorVessels,
    Thalassemia,
    ExerciseAngina,
    Oldpeak,
    StSlope,
}

impl FeatureField {
    /// Name used by the exported model artifact.
    #[must_use]
    pub fn feature_name(&self) -> &'static str {
        match self {
            Self::Age => "age",
            Self::Gender => "sex",
            Self::ChestPainType => "cp",
            Self::RestingBloodPressure => "trestbps",
            Self::SerumCholesterol => "chol",
            Self::FastingBloodSugar => "fbs",
            Self::EcgResult => "restecg",
            Self::MaxHeartRate => "thalach",
            Self::MajorVessels => "ca",
            Self::Thalassemia => "thal",
            Self::ExerciseAngina => "exang",
            Self::Oldpeak => "oldpeak",
            Self::StSlope => "slope",
        }
    }

    /// Human-readable label shown on forms and tables.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Age => "Age",
            Self::Gender => "Gender",
            Self::ChestPainType => "Chest Pain Type",
            Self::RestingBloodPressure => "Resting Blood Pressure",
            Self::SerumCholesterol => "Serum Cholesterol",
            Self::FastingBloodSugar => "Fasting Blood Sugar",
            Self::EcgResult => "ECG Result",
            Self::MaxHeartRate => "Max Heart Rate",
            Self::MajorVessels => "Major Vessels Affected",
            Self::Thalassemia => "Thalassemia",
            Self::ExerciseAngina => "Exercise Angina",
            Self::Oldpeak => "Oldpeak",
            Self::StSlope => "ST Slope",
        }
    }
}

/// Encoded model input, tagged with the layout that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    schema: SchemaVersion,
    values: Vec<f64>,
}

impl FeatureVector {
    /// Build a vector for `schema`.
    ///
    /// # Errors
    /// Returns an error if the value count does not match the schema.
    pub fn new(schema: SchemaVersion, values: Vec<f64>) -> Result<Self, String> {
        if values.len() != schema.feature_count() {
            return Err(format!(
                "Expected {} features for {} schema, got {}",
                schema.feature_count(),
                schema,
                values.len()
            ));
        }
        Ok(Self { schema, values })
    }

    /// Values produced by walking `schema.fields()` one by one.
    pub(crate) fn from_schema_fields(schema: SchemaVersion, values: Vec<f64>) -> Self {
        debug_assert_eq!(values.len(), schema.feature_count());
        Self { schema, values }
    }

    #[must_use]
    pub fn schema(&self) -> SchemaVersion {
        self.schema
    }

    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of a single field, if the schema carries it.
    #[must_use]
    pub fn get(&self, field: FeatureField) -> Option<f64> {
        let idx = self.schema.fields().iter().position(|f| *f == field)?;
        self.values.get(idx).copied()
    }
}

/// Inclusive numeric bounds of an input widget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericBounds {
    pub min: f64,
    pub max: f64,
}

impl NumericBounds {
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }

    #[must_use]
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

/// Bounds of every numeric input field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldBounds {
    pub age: NumericBounds,
    pub resting_blood_pressure: NumericBounds,
    pub serum_cholesterol: NumericBounds,
    pub max_heart_rate: NumericBounds,
    pub oldpeak: NumericBounds,
}

impl Default for FieldBounds {
    fn default() -> Self {
        Self {
            age: NumericBounds::new(29.0, 77.0),
            resting_blood_pressure: NumericBounds::new(94.0, 200.0),
            serum_cholesterol: NumericBounds::new(126.0, 564.0),
            max_heart_rate: NumericBounds::new(71.0, 202.0),
            oldpeak: NumericBounds::new(-2.6, 6.2),
        }
    }
}

impl FieldBounds {
    /// Bounds for a numeric field; `None` for categorical ones.
    #[must_use]
    pub fn for_field(&self, field: FeatureField) -> Option<NumericBounds> {
        match field {
            FeatureField::Age => Some(self.age),
            FeatureField::RestingBloodPressure => Some(self.resting_blood_pressure),
            FeatureField::SerumCholesterol => Some(self.serum_cholesterol),
            FeatureField::MaxHeartRate => Some(self.max_heart_rate),
            FeatureField::Oldpeak => Some(self.oldpeak),
            _ => None,
        }
    }
}
