//! Dataset service: overview statistics of the reference dataset.
//!
//! Rows are loaded once on first success and cached. A load failure is
//! shown on the dataset screen only; it never affects prognosis.

use std::collections::BTreeMap;

use crate::domain::{Categorical, Gender};
use crate::ports::{DatasetColumn, DatasetError, DatasetRow, DatasetSource};

use super::insights::{histogram, Bin};

/// Count of rows with one column value and gender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenderCount {
    pub value: String,
    pub gender: Gender,
    pub count: usize,
}

/// Age histogram of one gender and outcome group.
#[derive(Debug, Clone, PartialEq)]
pub struct AgeGroup {
    pub gender: Gender,
    pub presence: bool,
    pub bins: Vec<Bin>,
}

pub struct DatasetService<S: DatasetSource> {
    source: S,
    rows: Option<Vec<DatasetRow>>,
}

impl<S: DatasetSource> DatasetService<S> {
    pub fn new(source: S) -> Self {
        Self { source, rows: None }
    }

    /// Load the rows, reusing the cached copy after the first success.
    ///
    /// # Errors
    /// Returns `DatasetError` if the source cannot be read.
    pub fn rows(&mut self) -> Result<&[DatasetRow], DatasetError> {
        if self.rows.is_none() {
            tracing::debug!("Loading dataset from {}", self.source.describe());
            self.rows = Some(self.source.load()?);
        }
        Ok(self.rows.as_deref().unwrap_or_default())
    }

    /// Number of rows.
    ///
    /// # Errors
    /// Returns `DatasetError` if the source cannot be read.
    pub fn row_count(&mut self) -> Result<usize, DatasetError> {
        Ok(self.rows()?.len())
    }

    /// Rows counted per (`column` value, gender), sorted by value then gender.
    ///
    /// # Errors
    /// Returns `DatasetError` if the source cannot be read.
    pub fn group_by_gender(
        &mut self,
        column: DatasetColumn,
    ) -> Result<Vec<GenderCount>, DatasetError> {
        Ok(group_by_gender(self.rows()?, column))
    }

    /// (age, cholesterol) points of one gender.
    ///
    /// # Errors
    /// Returns `DatasetError` if the source cannot be read.
    pub fn cholesterol_by_age(&mut self, gender: Gender) -> Result<Vec<(f64, f64)>, DatasetError> {
        Ok(self
            .rows()?
            .iter()
            .filter(|r| r.gender() == gender)
            .map(|r| (r.age, r.chol))
            .collect())
    }

    /// Age histograms split by gender and outcome.
    ///
    /// # Errors
    /// Returns `DatasetError` if the source cannot be read.
    pub fn age_histogram(&mut self, bin_width: f64) -> Result<Vec<AgeGroup>, DatasetError> {
        let rows = self.rows()?;
        let mut groups = Vec::new();
        for gender in Gender::ALL.iter().copied() {
            for presence in [false, true] {
                let ages: Vec<f64> = rows
                    .iter()
                    .filter(|r| r.gender() == gender && r.presence() == presence)
                    .map(|r| r.age)
                    .collect();
                groups.push(AgeGroup {
                    gender,
                    presence,
                    bins: histogram(&ages, bin_width),
                });
            }
        }
        Ok(groups)
    }

    #[must_use]
    pub fn describe(&self) -> String {
        self.source.describe()
    }
}

fn group_by_gender(rows: &[DatasetRow], column: DatasetColumn) -> Vec<GenderCount> {
    // Keyed by the value's total order so numeric columns sort numerically.
    let mut counts: BTreeMap<(u64, &'static str), (f64, Gender, usize)> = BTreeMap::new();
    for row in rows {
        let value = row.value(column);
        let gender = row.gender();
        let key = (order_key(value), gender.label());
        counts.entry(key).or_insert((value, gender, 0)).2 += 1;
    }

    counts
        .into_values()
        .map(|(value, gender, count)| GenderCount {
            value: format_value(value),
            gender,
            count,
        })
        .collect()
}

/// Maps `f64` onto `u64` preserving order.
fn order_key(value: f64) -> u64 {
    let bits = value.to_bits();
    if bits >> 63 == 1 {
        !bits
    } else {
        bits | (1 << 63)
    }
}

fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::dataset::{tests::SAMPLE_CSV, CsvDataset};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        loads: AtomicUsize,
    }

    impl DatasetSource for CountingSource {
        fn load(&self) -> Result<Vec<DatasetRow>, DatasetError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            CsvDataset::read_rows(SAMPLE_CSV.as_bytes())
        }

        fn describe(&self) -> String {
            "sample".to_string()
        }
    }

    fn service() -> DatasetService<CountingSource> {
        DatasetService::new(CountingSource {
            loads: AtomicUsize::new(0),
        })
    }

    #[test]
    fn test_rows_cached() {
        let mut svc = service();
        assert_eq!(svc.row_count().expect("rows"), 6);
        assert_eq!(svc.row_count().expect("rows"), 6);
        assert_eq!(svc.source.loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_group_by_gender_sorted() {
        let mut svc = service();
        let groups = svc
            .group_by_gender(DatasetColumn::ExerciseAngina)
            .expect("groups");

        // sex=1 rows are Female in the dataset coding.
        assert_eq!(
            groups,
            vec![
                GenderCount { value: "0".into(), gender: Gender::Female, count: 3 },
                GenderCount { value: "0".into(), gender: Gender::Male, count: 1 },
                GenderCount { value: "1".into(), gender: Gender::Female, count: 1 },
                GenderCount { value: "1".into(), gender: Gender::Male, count: 1 },
            ]
        );
    }

    #[test]
    fn test_group_fractional_values() {
        let mut svc = service();
        let groups = svc.group_by_gender(DatasetColumn::Oldpeak).expect("groups");
        let values: Vec<&str> = groups.iter().map(|g| g.value.as_str()).collect();
        assert_eq!(values, vec!["0.6", "0.8", "1.4", "1.5", "2.3", "3.5"]);
    }

    #[test]
    fn test_cholesterol_by_age() {
        let mut svc = service();
        let male = svc.cholesterol_by_age(Gender::Male).expect("points");
        assert_eq!(male, vec![(41.0, 204.0), (57.0, 354.0)]);
    }

    #[test]
    fn test_age_histogram_groups() {
        let mut svc = service();
        let groups = svc.age_histogram(10.0).expect("groups");
        assert_eq!(groups.len(), 4);

        let total: usize = groups
            .iter()
            .flat_map(|g| g.bins.iter().map(|b| b.count))
            .sum();
        assert_eq!(total, 6);

        let female_absent = groups
            .iter()
            .find(|g| g.gender == Gender::Female && !g.presence)
            .expect("group");
        assert_eq!(female_absent.bins, vec![Bin { start: 60.0, end: 70.0, count: 1 }]);
    }

    #[test]
    fn test_missing_file_reported() {
        let mut svc = DatasetService::new(CsvDataset::new("does/not/exist.csv"));
        assert!(matches!(svc.row_count(), Err(DatasetError::NotFound(_))));
    }
}
