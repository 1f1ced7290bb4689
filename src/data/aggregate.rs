//! Return Aggregation Module
//! Compounds periodic returns into monthly or yearly buckets.

use crate::data::ReturnSeries;
use chrono::Datelike;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Monthly,
    Yearly,
}

/// Calendar bucket. `month` is `None` for yearly buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    pub year: i32,
    pub month: Option<u32>,
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.month {
            Some(month) => write!(f, "{}-{:02}", self.year, month),
            None => write!(f, "{}", self.year),
        }
    }
}

/// Compounded return per period, in chronological order.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedReturns {
    pub granularity: Granularity,
    pub periods: Vec<(Period, f64)>,
}

impl AggregatedReturns {
    pub fn values(&self) -> Vec<f64> {
        self.periods.iter().map(|(_, v)| *v).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// Pivot monthly buckets into a year × month table.
    ///
    /// Only months that occur in some year become columns. Yearly buckets
    /// produce a single unnamed column.
    pub fn unstack(&self) -> MonthlyTable {
        let mut years: Vec<i32> = self.periods.iter().map(|(p, _)| p.year).collect();
        years.dedup();
        let mut months: Vec<u32> = self.periods.iter().filter_map(|(p, _)| p.month).collect();
        months.sort_unstable();
        months.dedup();

        let width = months.len().max(1);
        let mut cells = vec![vec![None; width]; years.len()];
        for (period, value) in &self.periods {
            let row = years.iter().position(|y| *y == period.year);
            let col = match period.month {
                Some(m) => months.iter().position(|x| *x == m),
                None => Some(0),
            };
            if let (Some(row), Some(col)) = (row, col) {
                cells[row][col] = Some(*value);
            }
        }

        MonthlyTable {
            years,
            months,
            cells,
        }
    }
}

/// Year rows by month columns. Missing cells are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyTable {
    pub years: Vec<i32>,
    pub months: Vec<u32>,
    pub cells: Vec<Vec<Option<f64>>>,
}

impl MonthlyTable {
    /// Dense copy with missing cells replaced by `fill`.
    pub fn filled(&self, fill: f64) -> Vec<Vec<f64>> {
        self.cells
            .iter()
            .map(|row| row.iter().map(|c| c.unwrap_or(fill)).collect())
            .collect()
    }
}

fn compound(values: &[f64]) -> f64 {
    values.iter().fold(1.0_f64, |acc, r| acc * (1.0 + r)) - 1.0
}

/// Compound `series` into calendar buckets.
pub fn aggregate_returns(series: &ReturnSeries, granularity: Granularity) -> AggregatedReturns {
    let mut grouped: BTreeMap<Period, Vec<f64>> = BTreeMap::new();
    for (date, ret) in series.iter() {
        if !ret.is_finite() {
            continue;
        }
        let period = match granularity {
            Granularity::Monthly => Period {
                year: date.year(),
                month: Some(date.month()),
            },
            Granularity::Yearly => Period {
                year: date.year(),
                month: None,
            },
        };
        grouped.entry(period).or_default().push(ret);
    }

    AggregatedReturns {
        granularity,
        periods: grouped
            .into_iter()
            .map(|(period, vals)| (period, compound(&vals)))
            .collect(),
    }
}
