//! Portfolio Plots - performance charts for backtested strategies
//!
//! Builds cumulative-return, drawdown, monthly/annual return and exposure
//! charts onto a caller-owned [`Axes`], and rasterises them with plotters.

pub mod charts;
pub mod data;
pub mod stats;
pub mod style;

pub use charts::{Axes, ChartError, ChartRenderer, PlottersBackend};
pub use data::{DataLoader, DrawdownTable, PositionTable, ReturnSeries};
pub use style::{context, ContextProfile, PlottingContext, RenderOptions, StyleOverrides};
