//! Prognosis session: Orchestrates the Calculate action.
//!
//! This service coordinates:
//! - Identity and field validation
//! - Feature normalization
//! - Prediction
//! - Ledger append
//!
//! A session owns its ledger. Two sessions never share history.

use std::sync::Arc;

use crate::domain::{HistoryRecord, InputForm, SchemaVersion};
use crate::ports::{Clock, ConfigurationError, Predictor};
use crate::CardialyzeError;

use super::{FeatureNormalizer, Ledger};

pub struct Session<P, C>
where
    P: Predictor,
    C: Clock,
{
    normalizer: FeatureNormalizer,
    predictor: Arc<P>,
    clock: C,
    ledger: Ledger,
}

impl<P, C> Session<P, C>
where
    P: Predictor,
    C: Clock,
{
    /// Create a session with an empty ledger.
    ///
    /// # Errors
    /// Returns `ConfigurationError::SchemaMismatch` if the predictor was
    /// built for another feature layout than the normalizer.
    pub fn new(
        predictor: Arc<P>,
        normalizer: FeatureNormalizer,
        clock: C,
    ) -> Result<Self, ConfigurationError> {
        let expected = normalizer.schema();
        let found = predictor.schema();
        if expected != found {
            return Err(ConfigurationError::SchemaMismatch { expected, found });
        }

        tracing::info!(
            "Session ready: schema={} predictor={}",
            expected,
            predictor.describe()
        );
        Ok(Self {
            normalizer,
            predictor,
            clock,
            ledger: Ledger::new(expected),
        })
    }

    /// Validate, predict and record one submission.
    ///
    /// Nothing is appended and the predictor is not called when validation
    /// fails.
    ///
    /// # Errors
    /// - `CardialyzeError::Validation` for a blank identity or missing field
    /// - `CardialyzeError::Configuration` if the predictor rejects the vector
    ///   or returns a value outside `[0, 1]`
    pub fn calculate(&mut self, form: InputForm) -> crate::Result<&HistoryRecord> {
        let vector = self.normalizer.normalize(&form)?;
        tracing::debug!("Normalized {} features", vector.len());

        let probability = self.predictor.predict(&vector)?;
        if !probability.is_finite() || !(0.0..=1.0).contains(&probability) {
            return Err(CardialyzeError::Configuration(
                ConfigurationError::InvalidProbability(probability),
            ));
        }

        let now = self.clock.now();
        let test = self.ledger.len() + 1;
        let record = self.ledger.append(form, probability, &now);
        tracing::info!("Prognosis recorded: test={} result={}", test, record.result());
        Ok(record)
    }

    #[must_use]
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    #[must_use]
    pub fn schema(&self) -> SchemaVersion {
        self.ledger.schema()
    }

    #[must_use]
    pub fn predictor(&self) -> &P {
        &self.predictor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{sample_form, FeatureVector, Gender, PatientIdentity, ValidationError};
    use crate::ports::FixedClock;
    use chrono::{FixedOffset, TimeZone};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubPredictor {
        schema: SchemaVersion,
        probability: f64,
        calls: AtomicUsize,
    }

    impl StubPredictor {
        fn new(schema: SchemaVersion, probability: f64) -> Arc<Self> {
            Arc::new(Self {
                schema,
                probability,
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl Predictor for StubPredictor {
        fn schema(&self) -> SchemaVersion {
            self.schema
        }

        fn predict(&self, features: &FeatureVector) -> Result<f64, ConfigurationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(features.schema(), self.schema);
            Ok(self.probability)
        }

        fn describe(&self) -> String {
            "stub".to_string()
        }
    }

    fn clock() -> FixedClock {
        let at = FixedOffset::east_opt(8 * 3600)
            .expect("valid offset")
            .with_ymd_and_hms(2024, 7, 1, 8, 0, 0)
            .single()
            .expect("valid time");
        FixedClock::new(at)
    }

    fn session(predictor: &Arc<StubPredictor>) -> Session<StubPredictor, FixedClock> {
        Session::new(
            Arc::clone(predictor),
            FeatureNormalizer::new(predictor.schema()),
            clock(),
        )
        .expect("matching schema")
    }

    #[test]
    fn test_calculate_appends_record() {
        let predictor = StubPredictor::new(SchemaVersion::Full, 0.8361);
        let mut session = session(&predictor);

        let record = session
            .calculate(sample_form("Aminah", 58, Gender::Female))
            .expect("calculate");
        assert_eq!(record.result().as_str(), "83.61%");
        assert_eq!(record.timestamp(), "2024-07-01 08:00:00");
        assert_eq!(session.ledger().len(), 1);
        assert_eq!(predictor.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_blank_identity_never_predicts() {
        let predictor = StubPredictor::new(SchemaVersion::Full, 0.5);
        let mut session = session(&predictor);

        let mut form = sample_form("Aminah", 58, Gender::Female);
        form.identity = PatientIdentity::new("Aminah", "");
        let err = session.calculate(form).expect_err("blank IC");

        assert!(matches!(
            err,
            CardialyzeError::Validation(ValidationError::MissingIdentity("IC Number"))
        ));
        assert!(session.ledger().is_empty());
        assert_eq!(predictor.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_schema_mismatch_rejected_at_construction() {
        let predictor = StubPredictor::new(SchemaVersion::Reduced, 0.5);
        let result = Session::new(
            predictor,
            FeatureNormalizer::new(SchemaVersion::Full),
            clock(),
        );
        assert!(matches!(
            result,
            Err(ConfigurationError::SchemaMismatch {
                expected: SchemaVersion::Full,
                found: SchemaVersion::Reduced,
            })
        ));
    }

    #[test]
    fn test_out_of_range_probability_not_recorded() {
        let predictor = StubPredictor::new(SchemaVersion::Reduced, 1.2);
        let mut session = session(&predictor);

        let err = session
            .calculate(sample_form("Aminah", 58, Gender::Female))
            .expect_err("invalid probability");
        assert!(matches!(
            err,
            CardialyzeError::Configuration(ConfigurationError::InvalidProbability(_))
        ));
        assert!(session.ledger().is_empty());
    }

    #[test]
    fn test_sessions_are_isolated() {
        let predictor = StubPredictor::new(SchemaVersion::Full, 0.2);
        let mut first = session(&predictor);
        let second = session(&predictor);

        first
            .calculate(sample_form("Aminah", 58, Gender::Female))
            .expect("calculate");
        assert_eq!(first.ledger().len(), 1);
        assert!(second.ledger().is_empty());
    }
}
