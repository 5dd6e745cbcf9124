//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the application and external systems (model artifact, dataset
//! file, wall clock).

mod clock;
mod dataset;
mod predictor;

pub use clock::{Clock, FixedClock, SystemClock};
pub use dataset::{DatasetColumn, DatasetError, DatasetRow, DatasetSource};
pub use predictor::{ConfigurationError, Predictor};
