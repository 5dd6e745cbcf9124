//! Feature normalizer: form input to model vector.

use crate::domain::{
    Categorical, FeatureField, FeatureVector, InputForm, SchemaVersion, ValidationError,
};

/// Encodes an `InputForm` for one schema version.
#[derive(Debug, Clone, Copy)]
pub struct FeatureNormalizer {
    schema: SchemaVersion,
}

impl FeatureNormalizer {
    #[must_use]
    pub fn new(schema: SchemaVersion) -> Self {
        Self { schema }
    }

    #[must_use]
    pub fn schema(&self) -> SchemaVersion {
        self.schema
    }

    /// Validate identity and encode every schema field in order.
    ///
    /// Numeric values pass through unchanged. Categorical values become
    /// their fixed codes.
    ///
    /// # Errors
    /// - `ValidationError::MissingIdentity` if name or IC number is blank
    /// - `ValidationError::MissingField` if the schema needs an optional
    ///   field the form left empty
    pub fn normalize(&self, form: &InputForm) -> Result<FeatureVector, ValidationError> {
        form.identity.validate()?;

        let values = self
            .schema
            .fields()
            .iter()
            .map(|field| encode(form, *field))
            .collect::<Result<Vec<f64>, ValidationError>>()?;

        Ok(FeatureVector::from_schema_fields(self.schema, values))
    }
}

fn encode(form: &InputForm, field: FeatureField) -> Result<f64, ValidationError> {
    let value = match field {
        FeatureField::Age => f64::from(form.age),
        FeatureField::Gender => f64::from(form.gender.code()),
        FeatureField::ChestPainType => f64::from(form.chest_pain_type.code()),
        FeatureField::RestingBloodPressure => f64::from(form.resting_blood_pressure),
        FeatureField::SerumCholesterol => f64::from(form.serum_cholesterol),
        FeatureField::FastingBloodSugar => f64::from(form.fasting_blood_sugar.code()),
        FeatureField::EcgResult => f64::from(form.ecg_result.code()),
        FeatureField::MaxHeartRate => f64::from(form.max_heart_rate),
        FeatureField::MajorVessels => form
            .major_vessels
            .map(|v| f64::from(v.code()))
            .ok_or(ValidationError::MissingField(field.label()))?,
        FeatureField::Thalassemia => form
            .thalassemia
            .map(|t| f64::from(t.code()))
            .ok_or(ValidationError::MissingField(field.label()))?,
        FeatureField::ExerciseAngina => f64::from(form.exercise_angina.code()),
        FeatureField::Oldpeak => form.oldpeak,
        FeatureField::StSlope => f64::from(form.st_slope.code()),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{sample_form, Gender, PatientIdentity, Thalassemia};

    #[test]
    fn test_full_vector_order_and_codes() {
        let mut form = sample_form("Siti", 54, Gender::Female);
        form.thalassemia = Some(Thalassemia::ReversibleDefect);
        let v = FeatureNormalizer::new(SchemaVersion::Full)
            .normalize(&form)
            .expect("valid form");

        assert_eq!(
            v.values(),
            &[54.0, 0.0, 1.0, 130.0, 250.0, 0.0, 0.0, 160.0, 0.0, 2.0, 0.0, 1.2, 1.0]
        );
    }

    #[test]
    fn test_reduced_skips_optional_fields() {
        let mut form = sample_form("Siti", 54, Gender::Male);
        form.major_vessels = None;
        form.thalassemia = None;
        let v = FeatureNormalizer::new(SchemaVersion::Reduced)
            .normalize(&form)
            .expect("valid form");

        assert_eq!(v.len(), 11);
        assert_eq!(v.get(FeatureField::Gender), Some(1.0));
        assert_eq!(v.get(FeatureField::ExerciseAngina), Some(0.0));
    }

    #[test]
    fn test_full_requires_optional_fields() {
        let mut form = sample_form("Siti", 54, Gender::Male);
        form.thalassemia = None;
        assert_eq!(
            FeatureNormalizer::new(SchemaVersion::Full).normalize(&form),
            Err(ValidationError::MissingField("Thalassemia"))
        );
    }

    #[test]
    fn test_blank_identity_rejected_first() {
        let mut form = sample_form("", 54, Gender::Male);
        form.thalassemia = None;
        assert_eq!(
            FeatureNormalizer::new(SchemaVersion::Full).normalize(&form),
            Err(ValidationError::MissingIdentity("Name"))
        );

        form.identity = PatientIdentity::new("Siti", " ");
        assert_eq!(
            FeatureNormalizer::new(SchemaVersion::Reduced).normalize(&form),
            Err(ValidationError::MissingIdentity("IC Number"))
        );
    }

    #[test]
    fn test_numeric_values_pass_through() {
        let mut form = sample_form("Siti", 54, Gender::Male);
        form.oldpeak = -2.6;
        form.serum_cholesterol = 600;
        let v = FeatureNormalizer::new(SchemaVersion::Full)
            .normalize(&form)
            .expect("valid form");
        assert_eq!(v.get(FeatureField::Oldpeak), Some(-2.6));
        assert_eq!(v.get(FeatureField::SerumCholesterol), Some(600.0));
    }
}
