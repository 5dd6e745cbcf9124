//! Domain layer: Core business types and logic.
//!
//! This module contains pure Rust types with no I/O.
//! Categorical values serialize as their human-readable labels.

mod form;
mod identity;
mod record;
mod schema;

pub use form::{
    Categorical, ChestPainType, EcgResult, ExerciseAngina, FastingBloodSugar, Gender,
    InputForm, MajorVessels, StSlope, Thalassemia, ValidationError,
};
pub use identity::PatientIdentity;
pub use record::{
    format_timestamp, parse_percent, Attribute, AttributeKind, HistoryRecord, RiskPercent,
    TIMESTAMP_FORMAT,
};
pub use schema::{FeatureField, FeatureVector, FieldBounds, NumericBounds, SchemaVersion};

#[cfg(test)]
pub(crate) use form::sample_form;
