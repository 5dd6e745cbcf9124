//! # Cardialyze
//!
//! Cardiac arrest risk prognosis from clinical form input.
//!
//! This crate provides:
//! - Feature normalization and gradient-boosted tree prediction
//! - A per-session history ledger with filtering and summaries
//! - An overview of the reference heart dataset
//! - Terminal UI for local-only deployment
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core business types (form, identity, schema, history record)
//! - `ports`: Trait definitions for external operations
//! - `adapters`: Concrete implementations (GBT model, CSV dataset, log sanitizer)
//! - `application`: Use cases orchestrating domain and ports
//! - `tui`: Terminal user interface

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod tui;

pub use config::AppConfig;
pub use domain::{HistoryRecord, InputForm, SchemaVersion};

/// Result type for Cardialyze operations
pub type Result<T> = std::result::Result<T, CardialyzeError>;

/// Main error type for Cardialyze
#[derive(Debug, thiserror::Error)]
pub enum CardialyzeError {
    #[error("Invalid patient data: {0}")]
    Validation(#[from] domain::ValidationError),

    #[error("Model configuration error: {0}")]
    Configuration(#[from] ports::ConfigurationError),

    #[error("{0}")]
    Query(#[from] application::QueryError),

    #[error("Dataset error: {0}")]
    Dataset(#[from] ports::DatasetError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
