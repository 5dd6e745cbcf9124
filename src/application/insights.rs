//! Dashboard insights over the session history.

use crate::domain::{Attribute, HistoryRecord};

use super::query::{self, QueryError, Summary};

/// Default serum cholesterol bin width, in mg/dl.
pub const DEFAULT_CHOLESTEROL_BIN_WIDTH: f64 = 20.0;

/// Upper bound on the number of histogram bins.
pub const MAX_HISTOGRAM_BINS: usize = 1_000;

/// A histogram bucket covering `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Box-plot statistics with linearly interpolated quartiles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FiveNumberSummary {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Everything the dashboard shows.
#[derive(Debug, Clone, PartialEq)]
pub struct Insights {
    pub summary: Summary,
    /// (test number, result percent)
    pub trend: Vec<(f64, f64)>,
    /// (age, result percent)
    pub age_vs_result: Vec<(f64, f64)>,
    pub cholesterol_histogram: Vec<Bin>,
    pub max_heart_rate: FiveNumberSummary,
}

impl Insights {
    /// Compute dashboard data for `records` in ledger order.
    ///
    /// # Errors
    /// Returns `QueryError::Empty` when there is no history.
    pub fn compute(records: &[HistoryRecord], bin_width: f64) -> Result<Self, QueryError> {
        let summary = query::summarize(records)?;

        let trend = records
            .iter()
            .enumerate()
            .map(|(i, r)| (i as f64 + 1.0, r.result().value()))
            .collect();
        let age_vs_result = records
            .iter()
            .filter_map(|r| Some((r.numeric(Attribute::Age)?, r.result().value())))
            .collect();

        let cholesterol = column(records, Attribute::SerumCholesterol);
        let heart_rate = column(records, Attribute::MaxHeartRate);
        let max_heart_rate = five_number_summary(&heart_rate).ok_or(QueryError::Empty)?;

        Ok(Self {
            summary,
            trend,
            age_vs_result,
            cholesterol_histogram: histogram(&cholesterol, bin_width),
            max_heart_rate,
        })
    }
}

fn column(records: &[HistoryRecord], attribute: Attribute) -> Vec<f64> {
    records.iter().filter_map(|r| r.numeric(attribute)).collect()
}

/// Fixed-width histogram with bins aligned to multiples of `bin_width`.
///
/// Returns no bins for empty input or a non-positive width. A width too
/// narrow for the data is widened so at most `MAX_HISTOGRAM_BINS` bins
/// are produced.
#[must_use]
pub fn histogram(values: &[f64], bin_width: f64) -> Vec<Bin> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() || !(bin_width.is_finite() && bin_width > 0.0) {
        return Vec::new();
    }

    let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let mut bin_width = bin_width;
    let span = (max / bin_width).floor() - (min / bin_width).floor();
    if !span.is_finite() || span >= MAX_HISTOGRAM_BINS as f64 {
        bin_width = (max - min) / (MAX_HISTOGRAM_BINS - 2) as f64;
        tracing::debug!("Histogram bin width widened to {bin_width}");
    }

    let first = (min / bin_width).floor();
    let span = (max / bin_width).floor() - first;
    // NaN casts to 0; the cap keeps the allocation bounded either way.
    let bins = (span.max(0.0) as usize).min(MAX_HISTOGRAM_BINS - 1) + 1;

    let mut counts = vec![0usize; bins];
    for v in &finite {
        let idx = ((v / bin_width).floor() - first).max(0.0) as usize;
        counts[idx.min(bins - 1)] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| {
            let start = (first + i as f64) * bin_width;
            Bin {
                start,
                end: start + bin_width,
                count,
            }
        })
        .collect()
}

/// Min, quartiles and max of `values`; `None` when empty.
#[must_use]
pub fn five_number_summary(values: &[f64]) -> Option<FiveNumberSummary> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);

    Some(FiveNumberSummary {
        min: sorted[0],
        q1: quantile(&sorted, 0.25),
        median: quantile(&sorted, 0.5),
        q3: quantile(&sorted, 0.75),
        max: sorted[sorted.len() - 1],
    })
}

fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}
