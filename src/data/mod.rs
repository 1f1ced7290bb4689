//! Data module - series types, return aggregation and CSV loading

mod aggregate;
mod loader;
mod series;

pub use aggregate::{aggregate_returns, AggregatedReturns, Granularity, MonthlyTable, Period};
pub use loader::{DataLoader, LoaderError};
pub use series::{DrawdownEpisode, DrawdownTable, PositionTable, ReturnSeries, TableError, CASH_COLUMN};
