//! Adapters layer: Concrete implementations of ports.
//!
//! These modules contain the actual integration with external formats:
//! - `gbt`: gradient-boosted tree ensemble loaded from JSON
//! - `dataset`: CSV reader for the reference heart dataset
//! - `sanitize`: PII filtering for logs

pub mod dataset;
pub mod gbt;
pub mod sanitize;
