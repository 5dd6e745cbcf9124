//! Predictor port: Trait for the pre-trained risk classifier.
//!
//! The classifier is an opaque function from an encoded feature vector to
//! a probability. Its input layout is versioned by `SchemaVersion`, and a
//! layout disagreement is a deployment error, never a user error.

use crate::domain::{FeatureVector, SchemaVersion};

/// Errors raised when the model artifact and the application disagree.
///
/// These are fatal: nothing the user enters can fix them.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Schema mismatch: predictor expects {expected}, got {found}")]
    SchemaMismatch {
        expected: SchemaVersion,
        found: SchemaVersion,
    },

    #[error("Feature vector has {got} values, model expects {expected}")]
    VectorShape { expected: usize, got: usize },

    #[error("Malformed model: {0}")]
    MalformedModel(String),

    #[error("Model integrity check failed: {0}")]
    Integrity(String),

    #[error("Predictor returned an invalid probability: {0}")]
    InvalidProbability(f64),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for probability predictors.
///
/// Implementations must be pure: the same vector always yields the same
/// probability.
pub trait Predictor: Send + Sync {
    /// Feature layout this predictor was trained on.
    fn schema(&self) -> SchemaVersion;

    /// Probability of the positive class, in `[0, 1]`.
    ///
    /// # Errors
    /// Returns `ConfigurationError` if the vector does not match the model.
    fn predict(&self, features: &FeatureVector) -> Result<f64, ConfigurationError>;

    /// Short identifier of the loaded artifact, for logs and the About screen.
    fn describe(&self) -> String;
}
