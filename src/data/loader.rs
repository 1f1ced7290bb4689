//! CSV Data Loader Module
//! Loads return series, position tables and drawdown tables using Polars.

use crate::data::{DrawdownEpisode, DrawdownTable, PositionTable, ReturnSeries, TableError};
use chrono::NaiveDate;
use polars::prelude::*;
use thiserror::Error;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("Invalid date in column {column}: {value:?}")]
    InvalidDate { column: String, value: String },
    #[error("Malformed table: {0}")]
    Table(#[from] TableError),
    #[error("No data loaded")]
    NoData,
}

/// Handles CSV file loading with Polars and conversion into chart inputs.
pub struct DataLoader {
    df: Option<DataFrame>,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    pub fn new() -> Self {
        Self { df: None }
    }

    /// Load a CSV file using Polars. Dates stay as text until a conversion parses them.
    pub fn load_csv(&mut self, file_path: &str) -> Result<&DataFrame, LoaderError> {
        let df = LazyCsvReader::new(file_path)
            .with_infer_schema_length(Some(10000))
            .finish()?
            .collect()?;

        tracing::debug!(path = file_path, rows = df.height(), "loaded csv");
        self.df = Some(df);
        self.df.as_ref().ok_or(LoaderError::NoData)
    }

    /// Column names of the loaded frame, empty when nothing is loaded.
    pub fn get_columns(&self) -> Vec<String> {
        self.df
            .as_ref()
            .map(|df| {
                df.get_column_names()
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn get_row_count(&self) -> usize {
        self.df.as_ref().map(|df| df.height()).unwrap_or(0)
    }

    /// Set DataFrame directly (frames built in memory).
    pub fn set_dataframe(&mut self, df: DataFrame) {
        self.df = Some(df);
    }

    fn frame(&self) -> Result<&DataFrame, LoaderError> {
        self.df.as_ref().ok_or(LoaderError::NoData)
    }

    /// Build a return series from a date column and a value column.
    ///
    /// The series is named after the value column; nulls become NaN.
    pub fn return_series(
        &self,
        date_col: &str,
        value_col: &str,
    ) -> Result<ReturnSeries, LoaderError> {
        let df = self.frame()?;
        let index = required_dates(df, date_col)?;
        let values = float_values(df, value_col)?;
        Ok(ReturnSeries::new(index, values)?.with_name(value_col))
    }

    /// Build a position table: every column except `date_col` is an instrument.
    pub fn position_table(&self, date_col: &str) -> Result<PositionTable, LoaderError> {
        let df = self.frame()?;
        let index = required_dates(df, date_col)?;

        let columns: Vec<String> = self
            .get_columns()
            .into_iter()
            .filter(|name| name != date_col)
            .collect();

        let mut rows = vec![Vec::with_capacity(columns.len()); self.get_row_count()];
        for name in &columns {
            for (row, value) in rows.iter_mut().zip(float_values(df, name)?) {
                row.push(value);
            }
        }

        Ok(PositionTable::new(index, columns, rows)?)
    }

    /// Build a drawdown table from `peak`, `recovery` and `draw_down` columns.
    /// Empty recovery cells mark drawdowns that have not recovered.
    pub fn drawdown_table(&self) -> Result<DrawdownTable, LoaderError> {
        let df = self.frame()?;
        let peaks = required_dates(df, "peak")?;
        let recoveries = optional_dates(df, "recovery")?;
        let draw_downs = float_values(df, "draw_down")?;

        let episodes = peaks
            .into_iter()
            .zip(recoveries)
            .zip(draw_downs)
            .map(|((peak, recovery), draw_down)| DrawdownEpisode {
                peak,
                recovery,
                draw_down,
            })
            .collect();

        Ok(DrawdownTable::new(episodes))
    }
}

fn float_values(df: &DataFrame, column: &str) -> Result<Vec<f64>, LoaderError> {
    let values = df.column(column)?.cast(&DataType::Float64)?;
    let ca = values.f64()?;
    Ok(ca.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
}

fn optional_dates(df: &DataFrame, column: &str) -> Result<Vec<Option<NaiveDate>>, LoaderError> {
    let values = df.column(column)?.cast(&DataType::String)?;
    let ca = values.as_materialized_series().str()?;

    ca.into_iter()
        .map(|cell| match cell.map(str::trim) {
            None | Some("") => Ok(None),
            Some(text) => NaiveDate::parse_from_str(text, DATE_FORMAT)
                .map(Some)
                .map_err(|_| LoaderError::InvalidDate {
                    column: column.to_string(),
                    value: text.to_string(),
                }),
        })
        .collect()
}

fn required_dates(df: &DataFrame, column: &str) -> Result<Vec<NaiveDate>, LoaderError> {
    optional_dates(df, column)?
        .into_iter()
        .map(|date| {
            date.ok_or_else(|| LoaderError::InvalidDate {
                column: column.to_string(),
                value: String::new(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loader_with(df: DataFrame) -> DataLoader {
        let mut loader = DataLoader::new();
        loader.set_dataframe(df);
        loader
    }

    #[test]
    fn test_no_data() {
        let loader = DataLoader::new();
        assert!(matches!(
            loader.return_series("date", "ret"),
            Err(LoaderError::NoData)
        ));
    }

    #[test]
    fn test_return_series_named_after_column() {
        let df = df!(
            "date" => ["2020-01-02", "2020-01-03"],
            "benchmark" => [0.01, -0.02]
        )
        .unwrap();
        let series = loader_with(df).return_series("date", "benchmark").unwrap();

        assert_eq!(series.name.as_deref(), Some("benchmark"));
        assert_eq!(series.values(), &[0.01, -0.02]);
        assert_eq!(series.index()[1], NaiveDate::from_ymd_opt(2020, 1, 3).unwrap());
    }

    #[test]
    fn test_position_table_excludes_date() {
        let df = df!(
            "date" => ["2020-01-02", "2020-01-03"],
            "cash" => [0.5, 0.4],
            "A" => [0.3, 0.4],
            "B" => [0.2, 0.2]
        )
        .unwrap();
        let table = loader_with(df).position_table("date").unwrap();

        assert_eq!(table.columns(), &["cash", "A", "B"].map(String::from));
        assert_eq!(table.rows()[1], vec![0.4, 0.4, 0.2]);
    }

    #[test]
    fn test_drawdown_table_open_recovery() {
        let df = df!(
            "peak" => ["2020-01-02", "2020-03-02"],
            "recovery" => [Some("2020-02-03"), None],
            "draw_down" => [-0.1, -0.2]
        )
        .unwrap();
        let table = loader_with(df).drawdown_table().unwrap();

        assert_eq!(table.episodes().len(), 2);
        assert!(table.episodes()[1].recovery.is_none());
    }

    #[test]
    fn test_load_csv_drawdowns() {
        let path = std::env::temp_dir().join(format!("drawdowns_{}.csv", std::process::id()));
        std::fs::write(
            &path,
            "peak,recovery,draw_down\n2020-01-02,2020-02-03,-0.1\n2020-03-02,,-0.25\n",
        )
        .unwrap();

        let mut loader = DataLoader::new();
        let loaded = loader.load_csv(path.to_str().unwrap()).map(|df| df.height());
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded.unwrap(), 2);
        assert_eq!(loader.get_columns(), vec!["peak", "recovery", "draw_down"]);
        assert_eq!(loader.get_row_count(), 2);

        let table = loader.drawdown_table().unwrap();
        assert_eq!(table.episodes()[0].recovery, NaiveDate::from_ymd_opt(2020, 2, 3));
        assert!(table.episodes()[1].recovery.is_none());
        assert_eq!(table.episodes()[1].draw_down, -0.25);
    }

    #[test]
    fn test_load_csv_missing_file() {
        let mut loader = DataLoader::new();
        assert!(matches!(
            loader.load_csv("/nonexistent/returns.csv"),
            Err(LoaderError::CsvError(_))
        ));
        assert!(loader.get_columns().is_empty());
        assert_eq!(loader.get_row_count(), 0);
    }

    #[test]
    fn test_invalid_date() {
        let df = df!("date" => ["02/01/2020"], "ret" => [0.01]).unwrap();
        let err = loader_with(df).return_series("date", "ret").unwrap_err();
        assert!(matches!(err, LoaderError::InvalidDate { .. }));
    }
}
