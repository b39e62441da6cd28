//! Charts module - static chart rendering and dashboard data export

mod export;
mod renderer;

use thiserror::Error;

pub use export::export_json;
pub use renderer::{ChartKind, StaticChartRenderer};

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to serialize dashboard data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Drawing failed: {0}")]
    Drawing(String),
    #[error("Nothing to draw: no {0}")]
    NoData(&'static str),
}
