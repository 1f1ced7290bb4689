//! Charts module - Chart rendering

mod axes;
mod plotter;
mod renderer;

use crate::data::TableError;
use thiserror::Error;

pub use axes::{
    Annotation, Artist, Axes, Axis, AxisScale, Dash, Fill, Heatmap, Legend, LegendEntry,
    LegendKey, LegendPlacement, Limits, LineStyle, Norm, Stroke, Text,
};
pub use plotter::{
    ChartRenderer, ANNUAL_RETURNS_TITLE, CUMULATIVE_RETURNS_TITLE, DRAWDOWN_PERIODS_TITLE,
    EXPOSURE_TITLE, MONTHLY_DISTRIBUTION_TITLE, MONTHLY_HEATMAP_TITLE, TOP_EXPOSURES_TITLE,
    UNDERWATER_TITLE,
};
pub use renderer::PlottersBackend;

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Invalid chart input: {0}")]
    Table(#[from] TableError),

    #[error("Drawing backend error: {0}")]
    Backend(String),
}
