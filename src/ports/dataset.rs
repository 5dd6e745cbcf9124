//! Dataset port: read-only source of the reference heart dataset.
//!
//! The dataset uses the public column codes (`trtbps`, `thalachh`, ...).
//! Note that its `sex` column is coded 0 = Male, 1 = Female, the reverse
//! of the model input coding.

use serde::{Deserialize, Serialize};

use crate::domain::Gender;

/// Errors that can occur while loading the dataset.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("Dataset not found: {0}")]
    NotFound(String),

    #[error("Failed to decode dataset: {0}")]
    Decode(String),

    #[error("Dataset is empty")]
    Empty,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One patient row of the reference dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetRow {
    pub age: f64,
    pub sex: u8,
    pub cp: u8,
    pub trtbps: f64,
    pub chol: f64,
    pub fbs: u8,
    pub restecg: u8,
    pub thalachh: f64,
    pub exng: u8,
    pub oldpeak: f64,
    pub slp: u8,
    pub caa: u8,
    pub thall: u8,
    pub output: u8,
}

impl DatasetRow {
    #[must_use]
    pub fn gender(&self) -> Gender {
        if self.sex == 0 {
            Gender::Male
        } else {
            Gender::Female
        }
    }

    /// Whether the outcome column marks the condition as present.
    #[must_use]
    pub fn presence(&self) -> bool {
        self.output == 1
    }

    #[must_use]
    pub fn value(&self, column: DatasetColumn) -> f64 {
        match column {
            DatasetColumn::Age => self.age,
            DatasetColumn::ChestPain => f64::from(self.cp),
            DatasetColumn::RestingBloodPressure => self.trtbps,
            DatasetColumn::Cholesterol => self.chol,
            DatasetColumn::FastingBloodSugar => f64::from(self.fbs),
            DatasetColumn::RestingEcg => f64::from(self.restecg),
            DatasetColumn::MaxHeartRate => self.thalachh,
            DatasetColumn::ExerciseAngina => f64::from(self.exng),
            DatasetColumn::Oldpeak => self.oldpeak,
            DatasetColumn::Slope => f64::from(self.slp),
            DatasetColumn::MajorVessels => f64::from(self.caa),
            DatasetColumn::Thalassemia => f64::from(self.thall),
            DatasetColumn::Output => f64::from(self.output),
        }
    }
}

/// Columns that can be grouped against gender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetColumn {
    Age,
    ChestPain,
    RestingBloodPressure,
    Cholesterol,
    FastingBloodSugar,
    RestingEcg,
    MaxHeartRate,
    ExerciseAngina,
    Oldpeak,
    Slope,
    MajorVessels,
    Thalassemia,
    Output,
}

impl DatasetColumn {
    pub const ALL: [DatasetColumn; 13] = [
        Self::Age,
        Self::ChestPain,
        Self::RestingBloodPressure,
        Self::Cholesterol,
        Self::FastingBloodSugar,
        Self::RestingEcg,
        Self::MaxHeartRate,
        Self::ExerciseAngina,
        Self::Oldpeak,
        Self::Slope,
        Self::MajorVessels,
        Self::Thalassemia,
        Self::Output,
    ];

    /// CSV header name.
    #[must_use]
    pub fn header(&self) -> &'static str {
        match self {
            Self::Age => "age",
            Self::ChestPain => "cp",
            Self::RestingBloodPressure => "trtbps",
            Self::Cholesterol => "chol",
            Self::FastingBloodSugar => "fbs",
            Self::RestingEcg => "restecg",
            Self::MaxHeartRate => "thalachh",
            Self::ExerciseAngina => "exng",
            Self::Oldpeak => "oldpeak",
            Self::Slope => "slp",
            Self::MajorVessels => "caa",
            Self::Thalassemia => "thall",
            Self::Output => "output",
        }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Age => "Age",
            Self::ChestPain => "Chest Pain Type",
            Self::RestingBloodPressure => "Resting Blood Pressure",
            Self::Cholesterol => "Cholesterol",
            Self::FastingBloodSugar => "Fasting Blood Sugar",
            Self::RestingEcg => "Resting ECG",
            Self::MaxHeartRate => "Max Heart Rate",
            Self::ExerciseAngina => "Exercise Angina",
            Self::Oldpeak => "Oldpeak",
            Self::Slope => "Slope",
            Self::MajorVessels => "Major Vessels",
            Self::Thalassemia => "Thalassemia",
            Self::Output => "Outcome",
        }
    }
}

/// Trait for dataset sources.
pub trait DatasetSource: Send + Sync {
    /// Read every row.
    ///
    /// # Errors
    /// Returns `DatasetError` if the source cannot be read or decoded.
    fn load(&self) -> Result<Vec<DatasetRow>, DatasetError>;

    /// Where the rows come from, for display.
    fn describe(&self) -> String;
}
