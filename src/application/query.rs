//! Read-only queries over history records.
//!
//! Every function takes records in ledger order and returns them in the same
//! order. Nothing here mutates or reorders the ledger.

use std::collections::{BTreeSet, HashSet};

use thiserror::Error;

use crate::domain::{Attribute, AttributeKind, HistoryRecord, SchemaVersion};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    #[error("No history available.")]
    Empty,

    #[error(
        "Only one unique {} value found. Please add more {} data to use this filter.",
        .0.label().to_lowercase(),
        .0.label().to_lowercase()
    )]
    FilterNotUsable(Attribute),

    #[error("{attribute} is {kind:?} and does not accept this selector")]
    SelectorMismatch {
        attribute: Attribute,
        kind: AttributeKind,
    },

    #[error("{0} cannot be filtered by value")]
    NotFilterable(Attribute),
}

/// Aggregate over Result values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub max: f64,
    pub min: f64,
}

/// Accepted values of an attribute filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    /// Category labels to keep.
    Categories(BTreeSet<String>),
    /// Inclusive numeric range.
    Range { low: f64, high: f64 },
}

impl Selector {
    /// Categorical selector from any label list.
    pub fn categories<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Categories(labels.into_iter().map(Into::into).collect())
    }

    #[must_use]
    pub fn range(low: f64, high: f64) -> Self {
        Self::Range { low, high }
    }
}

/// Count, highest and lowest Result of `records`.
///
/// # Errors
/// Returns `QueryError::Empty` for an empty sequence.
pub fn summarize<'a, I>(records: I) -> Result<Summary, QueryError>
where
    I: IntoIterator<Item = &'a HistoryRecord>,
{
    let mut values = records.into_iter().map(|r| r.result().value());
    let first = values.next().ok_or(QueryError::Empty)?;

    let summary = values.fold(
        Summary {
            count: 1,
            max: first,
            min: first,
        },
        |acc, v| Summary {
            count: acc.count + 1,
            max: acc.max.max(v),
            min: acc.min.min(v),
        },
    );
    Ok(summary)
}

/// Lowest and highest value of a numeric attribute.
///
/// # Errors
/// - `QueryError::Empty` if no record carries a value
/// - `QueryError::NotFilterable` / `SelectorMismatch` for non-numeric attributes
pub fn value_range<'a, I>(records: I, attribute: Attribute) -> Result<(f64, f64), QueryError>
where
    I: IntoIterator<Item = &'a HistoryRecord>,
{
    expect_kind(attribute, AttributeKind::Numeric)?;

    records
        .into_iter()
        .filter_map(|r| r.numeric(attribute))
        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
        .ok_or(QueryError::Empty)
}

/// Distinct labels of a categorical attribute, in first-seen order.
///
/// # Errors
/// Returns an error for attributes that are not categorical.
pub fn distinct_categories<'a, I>(
    records: I,
    attribute: Attribute,
) -> Result<Vec<&'static str>, QueryError>
where
    I: IntoIterator<Item = &'a HistoryRecord>,
{
    expect_kind(attribute, AttributeKind::Categorical)?;

    let mut seen = Vec::new();
    for label in records.into_iter().filter_map(|r| r.category(attribute)) {
        if !seen.contains(&label) {
            seen.push(label);
        }
    }
    Ok(seen)
}

/// Keep the records whose `attribute` satisfies `selector`.
///
/// A range filter over an attribute whose every value is identical is not
/// usable and is reported rather than applied.
///
/// # Errors
/// - `QueryError::NotFilterable` for text attributes
/// - `QueryError::SelectorMismatch` if the selector kind does not fit
/// - `QueryError::Empty` for a range filter over no records
/// - `QueryError::FilterNotUsable` if min equals max
pub fn filter_by_attribute<'a, I>(
    records: I,
    attribute: Attribute,
    selector: &Selector,
) -> Result<Vec<&'a HistoryRecord>, QueryError>
where
    I: IntoIterator<Item = &'a HistoryRecord>,
{
    match selector {
        Selector::Categories(accepted) => {
            expect_kind(attribute, AttributeKind::Categorical)?;
            Ok(records
                .into_iter()
                .filter(|r| {
                    r.category(attribute)
                        .is_some_and(|label| accepted.contains(label))
                })
                .collect())
        }
        Selector::Range { low, high } => {
            expect_kind(attribute, AttributeKind::Numeric)?;
            let records: Vec<&'a HistoryRecord> = records.into_iter().collect();
            let (min, max) = value_range(records.iter().copied(), attribute)?;
            if min == max {
                return Err(QueryError::FilterNotUsable(attribute));
            }

            let range = *low..=*high;
            Ok(records
                .into_iter()
                .filter(|r| r.numeric(attribute).is_some_and(|v| range.contains(&v)))
                .collect())
        }
    }
}

/// Keep every record whose timestamp is in `timestamps`.
///
/// Records sharing a timestamp are all kept.
pub fn filter_by_timestamp_set<'a, I>(
    records: I,
    timestamps: &HashSet<String>,
) -> Vec<&'a HistoryRecord>
where
    I: IntoIterator<Item = &'a HistoryRecord>,
{
    records
        .into_iter()
        .filter(|r| timestamps.contains(r.timestamp()))
        .collect()
}

/// "Test N - <timestamp>" labels, 1-based by position.
pub fn test_labels<'a, I>(records: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a HistoryRecord>,
{
    records
        .into_iter()
        .enumerate()
        .map(|(i, r)| format!("Test {} - {}", i + 1, r.timestamp()))
        .collect()
}

fn expect_kind(attribute: Attribute, expected: AttributeKind) -> Result<(), QueryError> {
    match attribute.kind() {
        AttributeKind::Text => Err(QueryError::NotFilterable(attribute)),
        kind if kind == expected => Ok(()),
        kind => Err(QueryError::SelectorMismatch { attribute, kind }),
    }
}

/// Rendered history table: fixed columns, one row per shown record.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryTable {
    pub columns: Vec<Attribute>,
    /// 1-based position in the shown sequence and cell text per column.
    pub rows: Vec<(usize, Vec<String>)>,
}

impl HistoryTable {
    /// Build one row per record of `shown`, numbered by position.
    #[must_use]
    pub fn build(shown: &[&HistoryRecord], schema: SchemaVersion) -> Self {
        let columns = Attribute::columns(schema);
        let rows = shown
            .iter()
            .enumerate()
            .map(|(idx, record)| (idx + 1, columns.iter().map(|c| record.cell(*c)).collect()))
            .collect();

        Self { columns, rows }
    }

    #[must_use]
    pub fn headers(&self) -> Vec<&'static str> {
        self.columns.iter().map(Attribute::label).collect()
    }
}
