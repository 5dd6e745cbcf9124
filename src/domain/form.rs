//! Prognosis form input and its categorical vocabularies.
//!
//! Every categorical field has a fixed label set (what the clinician
//! picks) and a fixed integer code (what the model was trained on).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::identity::PatientIdentity;

/// Errors raised while turning form input into a feature vector.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingIdentity(&'static str),

    #[error("{0} is required for this model")]
    MissingField(&'static str),

    #[error("Unknown {field} option: {value:?}")]
    UnknownCategory { field: &'static str, value: String },
}

/// A closed set of labelled options with model codes.
pub trait Categorical: Sized + Copy + 'static {
    /// Field label used in error messages.
    const FIELD: &'static str;

    /// Every option, in display order.
    const ALL: &'static [Self];

    fn label(self) -> &'static str;

    fn code(self) -> u8;

    /// Look up an option by its display label.
    ///
    /// # Errors
    /// Returns `ValidationError::UnknownCategory` for labels outside the set.
    fn from_label(label: &str) -> Result<Self, ValidationError> {
        let wanted = label.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.label() == wanted)
            .ok_or_else(|| ValidationError::UnknownCategory {
                field: Self::FIELD,
                value: label.to_string(),
            })
    }

    #[must_use]
    fn labels() -> Vec<&'static str> {
        Self::ALL.iter().map(|c| c.label()).collect()
    }
}

macro_rules! categorical {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal {
            $($variant:ident => ($label:literal, $code:literal)),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl Categorical for $name {
            const FIELD: &'static str = $field;
            const ALL: &'static [Self] = &[$(Self::$variant),+];

            fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }

            fn code(self) -> u8 {
                match self {
                    $(Self::$variant => $code,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_label(s)
            }
        }
    };
}

categorical! {
    Gender, "Gender" {
        Male => ("Male", 1),
        Female => ("Female", 0),
    }
}

categorical! {
    ChestPainType, "Chest Pain Type" {
        TypicalAngina => ("Typical Angina", 0),
        AtypicalAngina => ("Atypical Angina", 1),
        NonAnginalPain => ("Non-Anginal Pain", 2),
        Asymptomatic => ("Asymptomatic", 3),
    }
}

categorical! {
    /// Fasting blood sugar relative to 120 mg/dl.
    FastingBloodSugar, "Fasting Blood Sugar" {
        Below120 => ("Below 120", 0),
        Above120 => ("Above 120", 1),
    }
}

categorical! {
    /// Resting electrocardiographic result.
    EcgResult, "ECG Result" {
        Normal => ("Normal", 0),
        SttWaveAbnormality => ("ST-T Wave Abnormality", 1),
        LeftVentricularHypertrophy => ("Left Ventricular Hypertrophy", 2),
    }
}

categorical! {
    /// Number of major vessels coloured by fluoroscopy.
    MajorVessels, "Major Vessels Affected" {
        Zero => ("0", 0),
        One => ("1", 1),
        Two => ("2", 2),
        Three => ("3", 3),
    }
}

categorical! {
    Thalassemia, "Thalassemia" {
        Normal => ("Normal", 0),
        Defect => ("Defect", 1),
        ReversibleDefect => ("Reversible Defect", 2),
    }
}

categorical! {
    ExerciseAngina, "Exercise Angina" {
        Yes => ("Yes", 1),
        No => ("No", 0),
    }
}

categorical! {
    /// Slope of the peak exercise ST segment.
    StSlope, "ST Slope" {
        Upsloping => ("Upsloping", 0),
        Flat => ("Flat", 1),
        Downsloping => ("Downsloping", 2),
    }
}

/// One submission attempt from the prognosis form.
///
/// Numeric fields are expected to already respect the configured
/// `FieldBounds`; the input widget clamps them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputForm {
    #[serde(flatten)]
    pub identity: PatientIdentity,
    #[serde(rename = "Age")]
    pub age: u16,
    #[serde(rename = "Gender")]
    pub gender: Gender,
    #[serde(rename = "Chest Pain Type")]
    pub chest_pain_type: ChestPainType,
    #[serde(rename = "Resting Blood Pressure")]
    pub resting_blood_pressure: u16,
    #[serde(rename = "Serum Cholesterol")]
    pub serum_cholesterol: u16,
    #[serde(rename = "Fasting Blood Sugar")]
    pub fasting_blood_sugar: FastingBloodSugar,
    #[serde(rename = "ECG Result")]
    pub ecg_result: EcgResult,
    #[serde(rename = "Max Heart Rate")]
    pub max_heart_rate: u16,
    #[serde(rename = "Major Vessels Affected", default)]
    pub major_vessels: Option<MajorVessels>,
    #[serde(rename = "Thalassemia", default)]
    pub thalassemia: Option<Thalassemia>,
    #[serde(rename = "Exercise Angina")]
    pub exercise_angina: ExerciseAngina,
    #[serde(rename = "Oldpeak")]
    pub oldpeak: f64,
    #[serde(rename = "ST Slope")]
    pub st_slope: StSlope,
}

#[cfg(test)]
pub(crate) fn sample_form(name: &str, age: u16, gender: Gender) -> InputForm {
    InputForm {
        identity: PatientIdentity::new(name, "850101-14-5523"),
        age,
        gender,
        chest_pain_type: ChestPainType::AtypicalAngina,
        resting_blood_pressure: 130,
        serum_cholesterol: 250,
        fasting_blood_sugar: FastingBloodSugar::Below120,
        ecg_result: EcgResult::Normal,
        max_heart_rate: 160,
        major_vessels: Some(MajorVessels::Zero),
        thalassemia: Some(Thalassemia::Defect),
        exercise_angina: ExerciseAngina::No,
        oldpeak: 1.2,
        st_slope: StSlope::Flat,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_codes() {
        assert_eq!(Gender::Male.code(), 1);
        assert_eq!(Gender::Female.code(), 0);
        assert_eq!(ChestPainType::Asymptomatic.code(), 3);
        assert_eq!(FastingBloodSugar::Above120.code(), 1);
        assert_eq!(EcgResult::LeftVentricularHypertrophy.code(), 2);
        assert_eq!(MajorVessels::Three.code(), 3);
        assert_eq!(Thalassemia::ReversibleDefect.code(), 2);
        assert_eq!(ExerciseAngina::Yes.code(), 1);
        assert_eq!(StSlope::Downsloping.code(), 2);
    }

    #[test]
    fn test_from_label() {
        assert_eq!(
            ChestPainType::from_label("Non-Anginal Pain"),
            Ok(ChestPainType::NonAnginalPain)
        );
        assert_eq!(
            "ST-T Wave Abnormality".parse::<EcgResult>(),
            Ok(EcgResult::SttWaveAbnormality)
        );
        assert_eq!(Gender::from_label(" Female "), Ok(Gender::Female));
    }

    #[test]
    fn test_unknown_label_is_rejected() {
        let err = ChestPainType::from_label("Sharp").expect_err("unknown label");
        assert_eq!(
            err,
            ValidationError::UnknownCategory {
                field: "Chest Pain Type",
                value: "Sharp".to_string()
            }
        );
    }

    #[test]
    fn test_labels_in_display_order() {
        assert_eq!(Gender::labels(), vec!["Male", "Female"]);
        assert_eq!(MajorVessels::labels(), vec!["0", "1", "2", "3"]);
    }

    #[test]
    fn test_form_serializes_labels() {
        let form = sample_form("Aisyah", 52, Gender::Female);
        let json = serde_json::to_value(&form).expect("serialize");
        assert_eq!(json["Chest Pain Type"], "Atypical Angina");
        assert_eq!(json["Gender"], "Female");
        assert_eq!(json["Name"], "Aisyah");
    }
}
