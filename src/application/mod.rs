//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the core use cases of the application.

mod dataset;
mod insights;
mod ledger;
mod normalizer;
pub mod query;
mod session;

pub use dataset::{AgeGroup, DatasetService, GenderCount};
pub use insights::{
    five_number_summary, histogram, Bin, FiveNumberSummary, Insights,
    DEFAULT_CHOLESTEROL_BIN_WIDTH, MAX_HISTOGRAM_BINS,
};
pub use ledger::{Ledger, LedgerState};
pub use normalizer::FeatureNormalizer;
pub use query::{HistoryTable, QueryError, Selector, Summary};
pub use session::Session;
