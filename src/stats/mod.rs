//! Stats module - numeric helpers for chart inputs

mod calculator;

pub use calculator::{HistogramBin, StatsCalculator};
