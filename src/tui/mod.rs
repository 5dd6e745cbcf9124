//! TUI module: Terminal User Interface using Ratatui.
//!
//! Screens:
//! - Dashboard with session insights
//! - Prognosis form and result
//! - Filterable prognosis history
//! - Reference dataset overview
//! - About

mod app;
mod styles;
mod ui;

pub use app::{App, Screen};
pub use styles::ClinicalTheme;
