//! Session history ledger.
//!
//! An append-only, insertion-ordered list of `HistoryRecord`s scoped to one
//! session. Records are never edited, removed, merged or deduplicated, and
//! the ledger lives only in memory.

use chrono::{DateTime, FixedOffset};

use crate::domain::{HistoryRecord, InputForm, SchemaVersion};

use super::query::{self, QueryError, Summary};

/// Lifecycle of a ledger: it leaves `Empty` on the first append and never
/// returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerState {
    Empty,
    NonEmpty,
}

#[derive(Debug, Default)]
pub struct Ledger {
    schema: SchemaVersion,
    records: Vec<HistoryRecord>,
}

impl Ledger {
    /// Create an empty ledger whose records are tagged with `schema`.
    #[must_use]
    pub fn new(schema: SchemaVersion) -> Self {
        Self {
            schema,
            records: Vec::new(),
        }
    }

    /// Record a completed prognosis.
    ///
    /// The result percentage is derived here, once, from `probability`.
    pub fn append(
        &mut self,
        form: InputForm,
        probability: f64,
        now: &DateTime<FixedOffset>,
    ) -> &HistoryRecord {
        let index = self.records.len();
        self.records
            .push(HistoryRecord::new(form, probability, now, self.schema));
        let record = &self.records[index];
        tracing::debug!(
            "Appended test {} at {} result={}",
            index + 1,
            record.timestamp(),
            record.result()
        );
        record
    }

    #[must_use]
    pub fn records(&self) -> &[HistoryRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HistoryRecord> {
        self.records.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn state(&self) -> LedgerState {
        if self.records.is_empty() {
            LedgerState::Empty
        } else {
            LedgerState::NonEmpty
        }
    }

    #[must_use]
    pub fn schema(&self) -> SchemaVersion {
        self.schema
    }

    /// Count, highest and lowest result over the whole ledger.
    ///
    /// # Errors
    /// Returns `QueryError::Empty` before the first append.
    pub fn summarize(&self) -> Result<Summary, QueryError> {
        query::summarize(&self.records)
    }
}

impl<'a> IntoIterator for &'a Ledger {
    type Item = &'a HistoryRecord;
    type IntoIter = std::slice::Iter<'a, HistoryRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{sample_form, Gender};
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn at(second: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(8 * 3600)
            .expect("valid offset")
            .with_ymd_and_hms(2024, 5, 1, 14, 30, second)
            .single()
            .expect("valid time")
    }

    #[test]
    fn test_state_machine() {
        let mut ledger = Ledger::new(SchemaVersion::Full);
        assert_eq!(ledger.state(), LedgerState::Empty);
        assert!(matches!(ledger.summarize(), Err(QueryError::Empty)));

        ledger.append(sample_form("Ali", 50, Gender::Male), 0.25, &at(0));
        assert_eq!(ledger.state(), LedgerState::NonEmpty);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_append_derives_result_and_timestamp() {
        let mut ledger = Ledger::new(SchemaVersion::Reduced);
        let record = ledger.append(sample_form("Ali", 50, Gender::Male), 0.8361, &at(9));
        assert_eq!(record.result().as_str(), "83.61%");
        assert_eq!(record.timestamp(), "2024-05-01 14:30:09");
        assert_eq!(record.schema(), SchemaVersion::Reduced);
    }

    #[test]
    fn test_summary_and_order() {
        let mut ledger = Ledger::new(SchemaVersion::Full);
        for (i, p) in [0.10, 0.555, 0.9999].into_iter().enumerate() {
            let name = format!("Patient {i}");
            ledger.append(sample_form(&name, 40, Gender::Female), p, &at(0));
        }

        let summary = ledger.summarize().expect("non-empty");
        assert_eq!(summary.count, 3);
        assert_eq!(summary.min, 10.0);
        assert_eq!(summary.max, 99.99);

        let names: Vec<&str> = ledger.iter().map(|r| r.identity().name()).collect();
        assert_eq!(names, vec!["Patient 0", "Patient 1", "Patient 2"]);
        let results: Vec<&str> = ledger.iter().map(|r| r.result().as_str()).collect();
        assert_eq!(results, vec!["10.00%", "55.50%", "99.99%"]);
    }

    #[test]
    fn test_identical_submissions_are_kept() {
        let mut ledger = Ledger::new(SchemaVersion::Full);
        ledger.append(sample_form("Ali", 50, Gender::Male), 0.3, &at(1));
        ledger.append(sample_form("Ali", 50, Gender::Male), 0.3, &at(1));
        assert_eq!(ledger.len(), 2);
    }

    proptest! {
        #[test]
        fn prop_summary_bounds_every_result(probs in prop::collection::vec(0.0f64..=1.0, 1..40)) {
            let mut ledger = Ledger::new(SchemaVersion::Full);
            for p in &probs {
                ledger.append(sample_form("Prop", 60, Gender::Male), *p, &at(0));
            }

            let summary = ledger.summarize().expect("non-empty");
            prop_assert_eq!(summary.count, probs.len());
            for record in &ledger {
                let value = record.result().value();
                prop_assert!(summary.min <= value);
                prop_assert!(value <= summary.max);
            }
        }
    }
}
