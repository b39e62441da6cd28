//! ASEAN Health - health spending vs infant mortality analysis
//!
//! Loads two wide indicator CSV tables, reshapes them to long form, builds a
//! before/after snapshot per country with percent changes and an efficiency
//! ratio, and renders the results as static charts and a JSON export.

pub mod charts;
pub mod config;
pub mod data;
pub mod pipeline;
pub mod stats;

pub use config::{DashboardConfig, YearRange};
pub use pipeline::{DashboardData, Pipeline, PipelineError};
