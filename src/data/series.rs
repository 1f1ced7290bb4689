//! Series and Table Module
//! Time-indexed return series, position tables and drawdown episode tables.

use chrono::NaiveDate;
use thiserror::Error;

/// Name of the reserved column holding uninvested weight.
pub const CASH_COLUMN: &str = "cash";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TableError {
    #[error("Index has {index} entries but values have {values}")]
    LengthMismatch { index: usize, values: usize },
    #[error("Row {row} has {found} values, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("Column not found: {0}")]
    MissingColumn(String),
}

/// Ordered, time-indexed sequence of fractional returns (or any value per date).
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnSeries {
    pub name: Option<String>,
    index: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl ReturnSeries {
    pub fn new(index: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self, TableError> {
        if index.len() != values.len() {
            return Err(TableError::LengthMismatch {
                index: index.len(),
                values: values.len(),
            });
        }
        Ok(Self {
            name: None,
            index,
            values,
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn index(&self) -> &[NaiveDate] {
        &self.index
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate `(date, value)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.index.iter().copied().zip(self.values.iter().copied())
    }

    /// Multiply every value by `factor`, keeping name and index.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            name: self.name.clone(),
            index: self.index.clone(),
            values: self.values.iter().map(|v| v * factor).collect(),
        }
    }
}

/// Portfolio weights per date and instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionTable {
    index: Vec<NaiveDate>,
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl PositionTable {
    pub fn new(
        index: Vec<NaiveDate>,
        columns: Vec<String>,
        rows: Vec<Vec<f64>>,
    ) -> Result<Self, TableError> {
        if index.len() != rows.len() {
            return Err(TableError::LengthMismatch {
                index: index.len(),
                values: rows.len(),
            });
        }
        if let Some((row, found)) = rows
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != columns.len())
            .map(|(i, r)| (i, r.len()))
        {
            return Err(TableError::RaggedRow {
                row,
                expected: columns.len(),
                found,
            });
        }
        Ok(Self {
            index,
            columns,
            rows,
        })
    }

    pub fn index(&self) -> &[NaiveDate] {
        &self.index
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    fn position(&self, name: &str) -> Result<usize, TableError> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| TableError::MissingColumn(name.to_string()))
    }

    /// Table without the named column. Fails if the column does not exist.
    pub fn drop_column(&self, name: &str) -> Result<Self, TableError> {
        let pos = self.position(name)?;
        let mut columns = self.columns.clone();
        columns.remove(pos);
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let mut row = row.clone();
                row.remove(pos);
                row
            })
            .collect();

        Ok(Self {
            index: self.index.clone(),
            columns,
            rows,
        })
    }

    /// A single column as a named series.
    pub fn column(&self, name: &str) -> Result<ReturnSeries, TableError> {
        let pos = self.position(name)?;
        let values = self.rows.iter().map(|row| row[pos]).collect();
        Ok(ReturnSeries::new(self.index.clone(), values)?.with_name(name))
    }

    /// Sum across columns for every row.
    pub fn row_sums(&self) -> ReturnSeries {
        ReturnSeries {
            name: None,
            index: self.index.clone(),
            values: self.rows.iter().map(|row| row.iter().sum()).collect(),
        }
    }

    /// Mean of every column, in column order.
    pub fn column_means(&self) -> Vec<(String, f64)> {
        let n = self.rows.len() as f64;
        self.columns
            .iter()
            .enumerate()
            .map(|(j, name)| {
                let total: f64 = self.rows.iter().map(|row| row[j]).sum();
                (name.clone(), total / n)
            })
            .collect()
    }
}

/// One drawdown: from `peak` down to `draw_down` and back at `recovery`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawdownEpisode {
    pub peak: NaiveDate,
    /// `None` while the drawdown has not recovered yet.
    pub recovery: Option<NaiveDate>,
    pub draw_down: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawdownTable {
    episodes: Vec<DrawdownEpisode>,
}

impl DrawdownTable {
    pub fn new(episodes: Vec<DrawdownEpisode>) -> Self {
        Self { episodes }
    }

    pub fn episodes(&self) -> &[DrawdownEpisode] {
        &self.episodes
    }

    /// Deepest episodes, at most `top` of them.
    ///
    /// Rows are grouped by recovery date and each group keeps its minimum
    /// `draw_down` (first one wins on ties). Groups are then stably sorted
    /// ascending by `draw_down`. Unrecovered rows have no group and are dropped.
    pub fn worst(&self, top: usize) -> Vec<DrawdownEpisode> {
        let mut groups: Vec<DrawdownEpisode> = Vec::new();
        for episode in &self.episodes {
            let Some(recovery) = episode.recovery else {
                continue;
            };
            match groups.iter_mut().find(|g| g.recovery == Some(recovery)) {
                Some(existing) if episode.draw_down < existing.draw_down => *existing = *episode,
                Some(_) => {}
                None => groups.push(*episode),
            }
        }

        // group-by output is keyed, so order by recovery before ranking
        groups.sort_by_key(|g| g.recovery);
        groups.sort_by(|a, b| a.draw_down.total_cmp(&b.draw_down));
        groups.truncate(top);
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_series_length_mismatch() {
        let err = ReturnSeries::new(vec![d(2020, 1, 1)], vec![0.1, 0.2]).unwrap_err();
        assert_eq!(err, TableError::LengthMismatch { index: 1, values: 2 });
    }

    #[test]
    fn test_ragged_positions() {
        let err = PositionTable::new(
            vec![d(2020, 1, 1)],
            vec!["cash".into(), "A".into()],
            vec![vec![0.5]],
        )
        .unwrap_err();
        assert!(matches!(err, TableError::RaggedRow { row: 0, .. }));
    }

    #[test]
    fn test_drop_missing_column() {
        let table = PositionTable::new(vec![d(2020, 1, 1)], vec!["A".into()], vec![vec![1.0]])
            .unwrap();
        assert_eq!(
            table.drop_column(CASH_COLUMN).unwrap_err(),
            TableError::MissingColumn("cash".into())
        );
    }

    #[test]
    fn test_drop_sum_and_means() {
        let table = PositionTable::new(
            vec![d(2020, 1, 1), d(2020, 1, 2)],
            vec!["cash".into(), "A".into(), "B".into()],
            vec![vec![0.7, 0.1, 0.2], vec![0.5, 0.3, 0.2]],
        )
        .unwrap();
        let invested = table.drop_column(CASH_COLUMN).unwrap();
        assert_eq!(invested.columns(), &["A".to_string(), "B".to_string()]);

        let sums = invested.row_sums();
        assert!((sums.values()[0] - 0.3).abs() < 1e-12);
        assert!((sums.values()[1] - 0.5).abs() < 1e-12);

        let means = invested.column_means();
        assert!((means[0].1 - 0.2).abs() < 1e-12);
        assert!((means[1].1 - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_worst_groups_by_recovery() {
        let table = DrawdownTable::new(vec![
            DrawdownEpisode {
                peak: d(2020, 1, 1),
                recovery: Some(d(2020, 3, 1)),
                draw_down: -0.10,
            },
            DrawdownEpisode {
                peak: d(2020, 1, 15),
                recovery: Some(d(2020, 3, 1)),
                draw_down: -0.25,
            },
            DrawdownEpisode {
                peak: d(2020, 4, 1),
                recovery: Some(d(2020, 5, 1)),
                draw_down: -0.05,
            },
            DrawdownEpisode {
                peak: d(2020, 6, 1),
                recovery: Some(d(2020, 8, 1)),
                draw_down: -0.20,
            },
            DrawdownEpisode {
                peak: d(2020, 9, 1),
                recovery: None,
                draw_down: -0.90,
            },
        ]);

        let worst = table.worst(2);
        assert_eq!(worst.len(), 2);
        assert_eq!(worst[0].peak, d(2020, 1, 15));
        assert_eq!(worst[0].draw_down, -0.25);
        assert_eq!(worst[1].peak, d(2020, 6, 1));
    }

    #[test]
    fn test_worst_ties_keep_recovery_order() {
        let table = DrawdownTable::new(vec![
            DrawdownEpisode {
                peak: d(2021, 5, 1),
                recovery: Some(d(2021, 6, 1)),
                draw_down: -0.1,
            },
            DrawdownEpisode {
                peak: d(2021, 1, 1),
                recovery: Some(d(2021, 2, 1)),
                draw_down: -0.1,
            },
        ]);
        let worst = table.worst(5);
        assert_eq!(worst.len(), 2);
        assert_eq!(worst[0].recovery, Some(d(2021, 2, 1)));
        assert_eq!(worst[1].recovery, Some(d(2021, 6, 1)));
    }
}
