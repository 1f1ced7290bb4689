//! Tick label formatters.

use chrono::NaiveDate;

/// `0.12345` -> `"0.12"`
pub fn two_dec_places(x: f64) -> String {
    format!("{:.2}", x)
}

/// `0.256` -> `"26%"`
pub fn percentage(x: f64) -> String {
    format!("{:.0}%", x * 100.0)
}

/// How an axis turns tick values into labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TickFormat {
    /// Shortest natural representation.
    #[default]
    Plain,
    TwoDecimals,
    Percentage,
    /// Tick values are day ordinals (see [`date_to_x`]).
    Date,
}

impl TickFormat {
    pub fn format(&self, value: f64) -> String {
        match self {
            TickFormat::Plain => {
                let rounded = (value * 1e6).round() / 1e6;
                format!("{}", rounded)
            }
            TickFormat::TwoDecimals => two_dec_places(value),
            TickFormat::Percentage => percentage(value),
            TickFormat::Date => x_to_date(value)
                .map(|d| d.format("%Y-%m").to_string())
                .unwrap_or_default(),
        }
    }
}

/// Map a date onto the numeric x-axis (days since 0001-01-01).
pub fn date_to_x(date: NaiveDate) -> f64 {
    use chrono::Datelike;
    date.num_days_from_ce() as f64
}

pub fn x_to_date(x: f64) -> Option<NaiveDate> {
    if !x.is_finite() {
        return None;
    }
    NaiveDate::from_num_days_from_ce_opt(x.round() as i32)
}
