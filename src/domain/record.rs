//! History records produced by the Calculate action.

use std::fmt;

use chrono::{DateTime, FixedOffset};

use super::form::{Categorical, InputForm};
use super::identity::PatientIdentity;
use super::schema::SchemaVersion;

/// Wall-clock format of `HistoryRecord::timestamp`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format an instant with second precision in its own offset.
#[must_use]
pub fn format_timestamp(at: &DateTime<FixedOffset>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a `"NN.NN%"` result string back to its numeric value.
#[must_use]
pub fn parse_percent(text: &str) -> Option<f64> {
    text.trim()
        .trim_end_matches('%')
        .trim_end()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Predicted probability rendered as a percentage with two decimals.
///
/// The numeric value is always the parse of the display string, so
/// sorting and filtering agree with what the user sees.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskPercent {
    value: f64,
    display: String,
}

impl RiskPercent {
    /// Convert a probability in `[0, 1]`; out-of-range input is clamped.
    #[must_use]
    pub fn from_probability(probability: f64) -> Self {
        let percent = if probability.is_nan() {
            0.0
        } else {
            probability.clamp(0.0, 1.0) * 100.0
        };
        let display = format!("{percent:.2}%");
        let value = parse_percent(&display).unwrap_or(percent);
        Self { value, display }
    }

    #[must_use]
    pub fn value(&self) -> f64 {
        self.value
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.display
    }
}

impl fmt::Display for RiskPercent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

/// How an attribute behaves in filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    /// Free text; shown but never filtered by value.
    Text,
    /// Closed label set; filtered by membership.
    Categorical,
    /// Filtered by inclusive range.
    Numeric,
}

/// A column of the history table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    Timestamp,
    Name,
    IcNumber,
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
    Result,
}

impl Attribute {
    /// Every column in table order.
    pub const ALL: [Attribute; 17] = [
        Self::Timestamp,
        Self::Name,
        Self::IcNumber,
        Self::Age,
        Self::Gender,
        Self::ChestPainType,
        Self::RestingBloodPressure,
        Self::SerumCholesterol,
        Self::FastingBloodSugar,
        Self::EcgResult,
        Self::MaxHeartRate,
        Self::MajorVessels,
        Self::Thalassemia,
        Self::ExerciseAngina,
        Self::Oldpeak,
        Self::StSlope,
        Self::Result,
    ];

    /// Columns shown for records of `schema`, in table order.
    #[must_use]
    pub fn columns(schema: SchemaVersion) -> Vec<Attribute> {
        Self::ALL
            .iter()
            .copied()
            .filter(|a| a.applies_to(schema))
            .collect()
    }

    /// Columns a value filter can be applied to.
    #[must_use]
    pub fn filterable(schema: SchemaVersion) -> Vec<Attribute> {
        Self::columns(schema)
            .into_iter()
            .filter(|a| a.kind() != AttributeKind::Text)
            .collect()
    }

    #[must_use]
    pub fn applies_to(&self, schema: SchemaVersion) -> bool {
        match self {
            Self::MajorVessels | Self::Thalassemia => schema == SchemaVersion::Full,
            _ => true,
        }
    }

    #[must_use]
    pub fn kind(&self) -> AttributeKind {
        match self {
            Self::Timestamp | Self::Name | Self::IcNumber => AttributeKind::Text,
            Self::Age
            | Self::RestingBloodPressure
            | Self::SerumCholesterol
            | Self::MaxHeartRate
            | Self::Oldpeak
            | Self::Result => AttributeKind::Numeric,
            _ => AttributeKind::Categorical,
        }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Timestamp => "Timestamp",
            Self::Name => "Name",
            Self::IcNumber => "IC Number",
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
            Self::Result => "Result",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One completed prognosis. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRecord {
    timestamp: String,
    form: InputForm,
    result: RiskPercent,
    schema: SchemaVersion,
}

impl HistoryRecord {
    pub(crate) fn new(
        form: InputForm,
        probability: f64,
        at: &DateTime<FixedOffset>,
        schema: SchemaVersion,
    ) -> Self {
        Self {
            timestamp: format_timestamp(at),
            form,
            result: RiskPercent::from_probability(probability),
            schema,
        }
    }

    #[must_use]
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    #[must_use]
    pub fn identity(&self) -> &PatientIdentity {
        &self.form.identity
    }

    #[must_use]
    pub fn form(&self) -> &InputForm {
        &self.form
    }

    #[must_use]
    pub fn result(&self) -> &RiskPercent {
        &self.result
    }

    #[must_use]
    pub fn schema(&self) -> SchemaVersion {
        self.schema
    }

    /// Numeric value of a range-filterable attribute.
    #[must_use]
    pub fn numeric(&self, attribute: Attribute) -> Option<f64> {
        let form = &self.form;
        match attribute {
            Attribute::Age => Some(f64::from(form.age)),
            Attribute::RestingBloodPressure => Some(f64::from(form.resting_blood_pressure)),
            Attribute::SerumCholesterol => Some(f64::from(form.serum_cholesterol)),
            Attribute::MaxHeartRate => Some(f64::from(form.max_heart_rate)),
            Attribute::Oldpeak => Some(form.oldpeak),
            Attribute::Result => Some(self.result.value()),
            _ => None,
        }
    }

    /// Label of a categorical attribute; `None` when absent or not categorical.
    #[must_use]
    pub fn category(&self, attribute: Attribute) -> Option<&'static str> {
        let form = &self.form;
        match attribute {
            Attribute::Gender => Some(form.gender.label()),
            Attribute::ChestPainType => Some(form.chest_pain_type.label()),
            Attribute::FastingBloodSugar => Some(form.fasting_blood_sugar.label()),
            Attribute::EcgResult => Some(form.ecg_result.label()),
            Attribute::MajorVessels => form.major_vessels.map(Categorical::label),
            Attribute::Thalassemia => form.thalassemia.map(Categorical::label),
            Attribute::ExerciseAngina => Some(form.exercise_angina.label()),
            Attribute::StSlope => Some(form.st_slope.label()),
            _ => None,
        }
    }

    /// Display text of any column.
    #[must_use]
    pub fn cell(&self, attribute: Attribute) -> String {
        match attribute {
            Attribute::Timestamp => self.timestamp.clone(),
            Attribute::Name => self.form.identity.name().to_string(),
            Attribute::IcNumber => self.form.identity.ic_number().to_string(),
            Attribute::Oldpeak => format!("{:.1}", self.form.oldpeak),
            Attribute::Result => self.result.as_str().to_string(),
            other => match other.kind() {
                AttributeKind::Categorical => self.category(other).unwrap_or("-").to_string(),
                _ => self
                    .numeric(other)
                    .map(|v| format!("{v:.0}"))
                    .unwrap_or_default(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::form::{sample_form, Gender};
    use chrono::TimeZone;

    fn kl_time(h: u32, m: u32, s: u32) -> DateTime<FixedOffset> {
        let offset = FixedOffset::east_opt(8 * 3600).expect("valid offset");
        offset
            .with_ymd_and_hms(2024, 3, 14, h, m, s)
            .single()
            .expect("valid time")
    }

    #[test]
    fn test_percent_formatting() {
        let r = RiskPercent::from_probability(0.8361);
        assert_eq!(r.as_str(), "83.61%");
        assert_eq!(r.value(), 83.61);
        assert_eq!(parse_percent("83.61%"), Some(83.61));
    }

    #[test]
    fn test_percent_bounds() {
        assert_eq!(RiskPercent::from_probability(0.0).as_str(), "0.00%");
        assert_eq!(RiskPercent::from_probability(1.0).as_str(), "100.00%");
        assert_eq!(RiskPercent::from_probability(1.5).as_str(), "100.00%");
        assert_eq!(parse_percent("abc%"), None);
    }

    #[test]
    fn test_timestamp_format() {
        assert_eq!(format_timestamp(&kl_time(9, 5, 7)), "2024-03-14 09:05:07");
    }

    #[test]
    fn test_record_cells() {
        let record = HistoryRecord::new(
            sample_form("Lim", 45, Gender::Male),
            0.5,
            &kl_time(10, 0, 0),
            SchemaVersion::Full,
        );
        assert_eq!(record.cell(Attribute::Age), "45");
        assert_eq!(record.cell(Attribute::Gender), "Male");
        assert_eq!(record.cell(Attribute::Oldpeak), "1.2");
        assert_eq!(record.cell(Attribute::Result), "50.00%");
        assert_eq!(record.numeric(Attribute::Result), Some(50.0));
        assert_eq!(record.category(Attribute::Age), None);
    }

    #[test]
    fn test_reduced_columns() {
        let full = Attribute::columns(SchemaVersion::Full);
        let reduced = Attribute::columns(SchemaVersion::Reduced);
        assert_eq!(full.len(), 17);
        assert_eq!(reduced.len(), 15);
        assert_eq!(full.first(), Some(&Attribute::Timestamp));
        assert_eq!(reduced.last(), Some(&Attribute::Result));
        assert!(!Attribute::filterable(SchemaVersion::Full).contains(&Attribute::Name));
    }
}
