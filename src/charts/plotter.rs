//! Chart Plotter Module
//! Portfolio performance charts drawn onto a caller-owned [`Axes`].
//!
//! Every operation runs inside the renderer's presentation context (unless
//! opted out), appends its artists to the axes and hands the same axes back.

use crate::charts::axes::{Axes, Fill, Heatmap, LegendPlacement, LineStyle};
use crate::charts::ChartError;
use crate::data::{
    aggregate_returns, DrawdownTable, Granularity, PositionTable, ReturnSeries, CASH_COLUMN,
};
use crate::stats::StatsCalculator;
use crate::style::palette::{
    cubehelix, Colormap, BLACK, CORAL, FOREST_GREEN, GRAY, LIGHT_BLUE, ORANGE, PALETTE,
    STEEL_BLUE,
};
use crate::style::{date_to_x, try_with_context, with_context, RenderOptions, TickFormat};

pub const CUMULATIVE_RETURNS_TITLE: &str = "Strategy Cumulative Returns";
pub const DRAWDOWN_PERIODS_TITLE: &str = "Top 5 Drawdown Periods";
pub const UNDERWATER_TITLE: &str = "Underwater Plot";
pub const MONTHLY_HEATMAP_TITLE: &str = "Monthly Returns (%)";
pub const ANNUAL_RETURNS_TITLE: &str = "Annual Returns";
pub const MONTHLY_DISTRIBUTION_TITLE: &str = "Distribution of Monthly Returns";
pub const EXPOSURE_TITLE: &str = "Total non cash exposure (%)";
pub const TOP_EXPOSURES_TITLE: &str = "Top 10 securities exposure (%)";

const CUMULATIVE_LABEL: &str = "Cumulative returns";
const HISTOGRAM_BINS: usize = 20;
const LEGEND_COLUMNS: usize = 5;
const RETURNS_TICK_SIZE: f64 = 10.0;

/// Renders one chart kind per call onto a caller-owned [`Axes`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ChartRenderer {
    options: RenderOptions,
}

impl ChartRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Strategy curve, optional benchmark curve and a dashed zero line.
    pub fn cumulative_returns<'a>(
        &self,
        axes: &'a mut Axes,
        strategy: &ReturnSeries,
        benchmark: Option<&ReturnSeries>,
        title: &str,
    ) -> &'a mut Axes {
        tracing::debug!(
            points = strategy.len(),
            benchmark = benchmark.is_some(),
            "rendering cumulative returns"
        );
        with_context(axes, &self.options, |ax| {
            ax.set_y_format(TickFormat::TwoDecimals);
            ax.plot_series(
                strategy,
                LineStyle::new(FOREST_GREEN).width(3.0).alpha(0.6),
                Some("Strategy"),
            );

            if let Some(benchmark) = benchmark {
                ax.plot_series(
                    benchmark,
                    LineStyle::new(GRAY).width(2.0).alpha(0.6),
                    benchmark.name.as_deref(),
                );
            }

            ax.axhline(0.0, LineStyle::new(BLACK).width(2.0).dashed(), None);
            ax.set_ylabel(CUMULATIVE_LABEL);
            ax.set_title(title);
            ax.legend(LegendPlacement::Best);
        })
    }

    /// Cumulative returns with the `top` deepest drawdowns shaded.
    pub fn drawdown_periods<'a>(
        &self,
        axes: &'a mut Axes,
        cum_returns: &ReturnSeries,
        drawdowns: &DrawdownTable,
        top: usize,
        title: &str,
    ) -> &'a mut Axes {
        let worst = drawdowns.worst(top);
        tracing::debug!(
            episodes = drawdowns.episodes().len(),
            shaded = worst.len(),
            "rendering drawdown periods"
        );
        with_context(axes, &self.options, |ax| {
            ax.set_y_format(TickFormat::TwoDecimals);
            ax.plot_series(cum_returns, LineStyle::new(PALETTE[0]), Some(CUMULATIVE_LABEL));

            // deepest episode gets the darkest color
            let colors: Vec<_> = cubehelix(worst.len()).into_iter().rev().collect();
            for (episode, color) in worst.iter().zip(colors) {
                if let Some(recovery) = episode.recovery {
                    ax.axvspan(date_to_x(episode.peak), date_to_x(recovery), Fill::new(color, 0.4));
                }
            }

            ax.set_title(title);
            ax.set_ylabel(CUMULATIVE_LABEL);
            ax.legend(LegendPlacement::Best);
            ax.set_xlabel("");
        })
    }

    /// Filled drawdown magnitude over time.
    pub fn underwater<'a>(
        &self,
        axes: &'a mut Axes,
        drawdown: &ReturnSeries,
        title: &str,
    ) -> &'a mut Axes {
        tracing::debug!(points = drawdown.len(), "rendering underwater plot");
        with_context(axes, &self.options, |ax| {
            ax.set_y_format(TickFormat::Percentage);
            ax.fill_series(drawdown, Fill::new(CORAL, 0.7), drawdown.name.as_deref());
            ax.set_ylabel("Drawdown");
            ax.set_title(title);
            ax.legend(LegendPlacement::Best);
            ax.set_xlabel("");
        })
    }

    /// Year × month table of compounded returns in percent.
    pub fn monthly_heatmap<'a>(
        &self,
        axes: &'a mut Axes,
        returns: &ReturnSeries,
        title: &str,
    ) -> &'a mut Axes {
        let table = aggregate_returns(returns, Granularity::Monthly).unstack();
        tracing::debug!(
            years = table.years.len(),
            months = table.months.len(),
            "rendering monthly heatmap"
        );

        let values: Vec<Vec<f64>> = table
            .filled(0.0)
            .into_iter()
            .map(|row| row.into_iter().map(|v| v * 100.0).collect())
            .collect();
        let heatmap = Heatmap::new(
            table.years.iter().map(|y| y.to_string()).collect(),
            table.months.iter().map(|m| m.to_string()).collect(),
            values,
        )
        .colormap(Colormap::rd_yl_gn().reversed())
        .centered(0.0)
        .annotate(1, 9.0);

        with_context(axes, &self.options, |ax| {
            ax.heatmap(heatmap);
            ax.set_ylabel("Year");
            ax.set_xlabel("Month");
            ax.set_title(title);
        })
    }

    /// Compounded yearly returns as horizontal bars, newest year first.
    pub fn annual_returns<'a>(
        &self,
        axes: &'a mut Axes,
        returns: &ReturnSeries,
        title: &str,
    ) -> &'a mut Axes {
        let yearly = aggregate_returns(returns, Granularity::Yearly);
        let mean = StatsCalculator::mean(&yearly.values());
        tracing::debug!(years = yearly.periods.len(), mean, "rendering annual returns");

        let (labels, values): (Vec<String>, Vec<f64>) = yearly
            .periods
            .iter()
            .rev()
            .map(|(period, value)| (period.to_string(), *value))
            .unzip();

        with_context(axes, &self.options, |ax| {
            ax.set_x_format(TickFormat::Percentage);
            ax.set_x_tick_size(RETURNS_TICK_SIZE);
            ax.axvline(
                mean,
                LineStyle::new(STEEL_BLUE).width(4.0).alpha(0.7).dashed(),
                Some("mean"),
            );
            ax.barh(labels, values, Fill::new(PALETTE[0], 0.7), None);
            ax.axvline(0.0, LineStyle::new(BLACK).width(3.0), None);

            ax.set_ylabel("Year");
            ax.set_xlabel("Returns");
            ax.set_title(title);
            ax.legend(LegendPlacement::Best);
        })
    }

    /// Histogram of compounded monthly returns.
    pub fn monthly_return_distribution<'a>(
        &self,
        axes: &'a mut Axes,
        returns: &ReturnSeries,
        title: &str,
    ) -> &'a mut Axes {
        let monthly = aggregate_returns(returns, Granularity::Monthly).values();
        let mean = StatsCalculator::mean(&monthly);
        tracing::debug!(months = monthly.len(), mean, "rendering monthly distribution");

        with_context(axes, &self.options, |ax| {
            ax.set_x_format(TickFormat::Percentage);
            ax.set_x_tick_size(RETURNS_TICK_SIZE);
            ax.hist(&monthly, HISTOGRAM_BINS, Fill::new(ORANGE, 0.8), None);
            ax.axvline(
                mean,
                LineStyle::new(STEEL_BLUE).width(4.0).dashed(),
                Some("mean"),
            );
            ax.axvline(0.0, LineStyle::new(BLACK).width(3.0).alpha(0.75), None);

            ax.legend(LegendPlacement::Best);
            ax.set_ylabel("Number of months");
            ax.set_xlabel("Returns");
            ax.set_title(title);
        })
    }

    /// Summed non-cash weight per date, in percent.
    ///
    /// Fails with [`crate::data::TableError::MissingColumn`] without a `cash` column.
    pub fn exposure<'a>(
        &self,
        axes: &'a mut Axes,
        positions: &PositionTable,
        title: &str,
    ) -> Result<&'a mut Axes, ChartError> {
        let invested = positions.drop_column(CASH_COLUMN)?;
        let total = invested.row_sums().scaled(100.0);
        tracing::debug!(rows = total.len(), "rendering exposure");

        try_with_context(axes, &self.options, |ax| {
            ax.set_y_format(TickFormat::TwoDecimals);
            ax.fill_series(&total, Fill::new(LIGHT_BLUE, 1.0), None);
            ax.set_title(title);
            Ok(())
        })
    }

    /// The `top` instruments by mean weight, each as a line in percent.
    ///
    /// Fails with [`crate::data::TableError::MissingColumn`] without a `cash` column.
    pub fn top_exposures<'a>(
        &self,
        axes: &'a mut Axes,
        positions: &PositionTable,
        top: usize,
        title: &str,
    ) -> Result<&'a mut Axes, ChartError> {
        let invested = positions.drop_column(CASH_COLUMN)?;
        let ranked = StatsCalculator::top_n(&invested.column_means(), top);
        tracing::debug!(
            instruments = invested.columns().len(),
            plotted = ranked.len(),
            "rendering top exposures"
        );

        try_with_context(axes, &self.options, |ax| {
            ax.set_y_format(TickFormat::TwoDecimals);
            for (name, _) in &ranked {
                let series = positions.column(name)?.scaled(100.0);
                ax.plot_series(&series, LineStyle::default(), Some(name.as_str()));
            }
            ax.legend(LegendPlacement::Below {
                columns: LEGEND_COLUMNS,
            });
            ax.set_title(title);
            Ok::<(), ChartError>(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::axes::{Artist, AxisScale, LegendKey};
    use crate::data::{DrawdownEpisode, TableError};
    use crate::style::Style;
    use chrono::{Days, Months, NaiveDate};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn daily(values: &[f64]) -> ReturnSeries {
        let start = d(2020, 1, 1);
        let index = (0..values.len() as u64).map(|i| start + Days::new(i)).collect();
        ReturnSeries::new(index, values.to_vec()).unwrap()
    }

    fn positions() -> PositionTable {
        PositionTable::new(
            vec![d(2020, 1, 1), d(2020, 1, 2)],
            vec!["cash".into(), "A".into(), "B".into()],
            vec![vec![0.7, 0.2, 0.1], vec![0.6, 0.3, 0.1]],
        )
        .unwrap()
    }

    fn legend_labels(axes: &Axes) -> Vec<String> {
        axes.legend_box()
            .map(|l| l.entries.iter().map(|e| e.label.clone()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_cumulative_returns_without_benchmark() {
        let renderer = ChartRenderer::default();
        let mut axes = Axes::new();
        renderer.cumulative_returns(&mut axes, &daily(&[1.0, 1.1]), None, CUMULATIVE_RETURNS_TITLE);

        assert_eq!(axes.lines().count(), 1);
        assert_eq!(legend_labels(&axes), vec!["Strategy"]);
        assert_eq!(axes.title().unwrap().text, CUMULATIVE_RETURNS_TITLE);
        assert_eq!(axes.y_axis().format, TickFormat::TwoDecimals);
        assert!(axes
            .artists()
            .iter()
            .any(|a| matches!(a, Artist::HLine { y, .. } if *y == 0.0)));
    }

    #[test]
    fn test_cumulative_returns_benchmark_label() {
        let renderer = ChartRenderer::default();
        let mut axes = Axes::new();
        let benchmark = daily(&[1.0, 1.05]).with_name("SPX");
        renderer.cumulative_returns(&mut axes, &daily(&[1.0, 1.1]), Some(&benchmark), "t");

        assert_eq!(axes.lines().count(), 2);
        assert_eq!(legend_labels(&axes), vec!["Strategy", "SPX"]);
        let strategy = axes.lines().next().unwrap();
        match strategy {
            Artist::Line { stroke, .. } => {
                assert_eq!(stroke.color, FOREST_GREEN);
                assert_eq!(stroke.width, 3.0);
                assert_eq!(stroke.alpha, 0.6);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_context_sizes_title_and_restores() {
        let renderer = ChartRenderer::default();
        let mut axes = Axes::new();
        renderer.cumulative_returns(&mut axes, &daily(&[1.0]), None, "t");

        assert_eq!(axes.title().unwrap().size, renderer.options().context.style().title_size);
        assert_eq!(*axes.style(), Style::default());

        let plain = ChartRenderer::new(RenderOptions::without_context());
        let mut axes = Axes::new();
        plain.cumulative_returns(&mut axes, &daily(&[1.0]), None, "t");
        assert_eq!(axes.title().unwrap().size, Style::default().title_size);
    }

    #[test]
    fn test_drawdown_periods_shades_top_k() {
        let table = DrawdownTable::new(vec![
            DrawdownEpisode {
                peak: d(2020, 1, 2),
                recovery: Some(d(2020, 1, 5)),
                draw_down: -0.05,
            },
            DrawdownEpisode {
                peak: d(2020, 1, 6),
                recovery: Some(d(2020, 1, 9)),
                draw_down: -0.20,
            },
            DrawdownEpisode {
                peak: d(2020, 1, 10),
                recovery: Some(d(2020, 1, 12)),
                draw_down: -0.10,
            },
        ]);
        let renderer = ChartRenderer::default();
        let mut axes = Axes::new();
        renderer.drawdown_periods(&mut axes, &daily(&[1.0; 15]), &table, 2, DRAWDOWN_PERIODS_TITLE);

        assert_eq!(
            axes.spans(),
            vec![
                (date_to_x(d(2020, 1, 6)), date_to_x(d(2020, 1, 9))),
                (date_to_x(d(2020, 1, 10)), date_to_x(d(2020, 1, 12))),
            ]
        );
        assert_eq!(legend_labels(&axes), vec![CUMULATIVE_LABEL]);
        assert!(axes.x_axis().label.is_none());

        let fills: Vec<_> = axes
            .artists()
            .iter()
            .filter_map(|a| match a {
                Artist::Span { fill, .. } => Some(*fill),
                _ => None,
            })
            .collect();
        assert_eq!(fills[0].color, cubehelix(2)[1]);
        assert_eq!(fills[0].alpha, 0.4);
    }

    #[test]
    fn test_drawdown_periods_top_larger_than_table() {
        let table = DrawdownTable::new(vec![DrawdownEpisode {
            peak: d(2020, 1, 2),
            recovery: Some(d(2020, 1, 3)),
            draw_down: -0.01,
        }]);
        let mut axes = Axes::new();
        ChartRenderer::default().drawdown_periods(&mut axes, &daily(&[1.0; 4]), &table, 5, "t");
        assert_eq!(axes.spans().len(), 1);
    }

    #[test]
    fn test_underwater_area() {
        let mut axes = Axes::new();
        let drawdown = daily(&[0.0, -0.1, -0.05]).with_name("drawdown");
        ChartRenderer::default().underwater(&mut axes, &drawdown, UNDERWATER_TITLE);

        assert_eq!(axes.y_axis().format, TickFormat::Percentage);
        assert!(axes.x_axis().label.is_none());
        match &axes.artists()[0] {
            Artist::Area { fill, points, .. } => {
                assert_eq!(fill.color, CORAL);
                assert_eq!(points.len(), 3);
            }
            other => panic!("unexpected artist {:?}", other),
        }
        assert_eq!(legend_labels(&axes), vec!["drawdown"]);
    }

    #[test]
    fn test_monthly_heatmap_two_years() {
        let start = d(2018, 1, 15);
        let index = (0..24).map(|i| start + Months::new(i)).collect();
        let mut values = vec![0.01; 24];
        values[0] = -0.02;
        let returns = ReturnSeries::new(index, values).unwrap();

        let mut axes = Axes::new();
        ChartRenderer::default().monthly_heatmap(&mut axes, &returns, MONTHLY_HEATMAP_TITLE);

        let Artist::Heatmap(heatmap) = &axes.artists()[0] else {
            panic!("expected heatmap");
        };
        assert_eq!(heatmap.rows(), 2);
        assert_eq!(heatmap.cols(), 12);
        assert!((heatmap.values[0][0] + 2.0).abs() < 1e-9);
        assert_eq!(heatmap.annotation_text(0, 1).as_deref(), Some("1.0"));
        assert_eq!(axes.y_axis().label.as_ref().unwrap().text, "Year");
    }

    #[test]
    fn test_monthly_heatmap_fills_missing_with_zero() {
        let returns = ReturnSeries::new(
            vec![d(2019, 12, 2), d(2020, 1, 2)],
            vec![0.05, 0.02],
        )
        .unwrap();
        let mut axes = Axes::new();
        ChartRenderer::default().monthly_heatmap(&mut axes, &returns, "t");

        let Artist::Heatmap(heatmap) = &axes.artists()[0] else {
            panic!("expected heatmap");
        };
        assert_eq!(heatmap.col_labels, vec!["1", "12"]);
        assert_eq!(heatmap.values[0][0], 0.0);
        assert_eq!(heatmap.values[1][1], 0.0);
    }

    #[test]
    fn test_annual_returns_descending_years() {
        let returns = ReturnSeries::new(
            vec![d(2019, 3, 1), d(2020, 3, 2), d(2021, 3, 1)],
            vec![0.10, -0.05, 0.25],
        )
        .unwrap();
        let mut axes = Axes::new();
        ChartRenderer::default().annual_returns(&mut axes, &returns, ANNUAL_RETURNS_TITLE);

        match &axes.y_axis().scale {
            AxisScale::Categories { labels, .. } => {
                assert_eq!(labels, &vec!["2021", "2020", "2019"]);
            }
            AxisScale::Linear => panic!("expected categories"),
        }
        let mean_line = axes.artists().iter().find_map(|a| match a {
            Artist::VLine { x, label, stroke } if label.is_some() => Some((*x, *stroke)),
            _ => None,
        });
        let (x, stroke) = mean_line.unwrap();
        assert!((x - 0.1).abs() < 1e-12);
        assert_eq!(stroke.color, STEEL_BLUE);
        assert_eq!(legend_labels(&axes), vec!["mean"]);
        assert_eq!(axes.x_axis().format, TickFormat::Percentage);
        assert_eq!(axes.x_axis().tick_size, 10.0);
        assert_ne!(axes.y_axis().tick_size, 10.0);
    }

    #[test]
    fn test_monthly_distribution_histogram() {
        let start = d(2019, 1, 10);
        let index = (0..30).map(|i| start + Months::new(i)).collect();
        let values = (0..30).map(|i| (i as f64 - 15.0) / 100.0).collect();
        let returns = ReturnSeries::new(index, values).unwrap();

        let mut axes = Axes::new();
        ChartRenderer::default().monthly_return_distribution(&mut axes, &returns, "t");

        let Artist::Histogram { bins, fill, .. } = &axes.artists()[0] else {
            panic!("expected histogram");
        };
        assert_eq!(bins.len(), 20);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 30);
        assert_eq!(fill.color, ORANGE);
        assert_eq!(legend_labels(&axes), vec!["mean"]);
        assert!(matches!(
            axes.legend_box().unwrap().entries[0].key,
            LegendKey::Line(_)
        ));
        assert_eq!(axes.x_axis().tick_size, 10.0);
    }

    #[test]
    fn test_exposure_percent() {
        let mut axes = Axes::new();
        ChartRenderer::default()
            .exposure(&mut axes, &positions(), EXPOSURE_TITLE)
            .unwrap();

        let Artist::Area { points, fill, .. } = &axes.artists()[0] else {
            panic!("expected area");
        };
        assert!((points[0].1 - 30.0).abs() < 1e-9);
        assert!((points[1].1 - 40.0).abs() < 1e-9);
        assert_eq!(fill.color, LIGHT_BLUE);
        assert_eq!(axes.title().unwrap().text, EXPOSURE_TITLE);
    }

    #[test]
    fn test_exposure_requires_cash() {
        let table = PositionTable::new(vec![d(2020, 1, 1)], vec!["A".into()], vec![vec![1.0]])
            .unwrap();
        let mut axes = Axes::new();
        let err = ChartRenderer::default()
            .exposure(&mut axes, &table, "t")
            .unwrap_err();
        assert!(matches!(
            err,
            ChartError::Table(TableError::MissingColumn(ref c)) if c == "cash"
        ));
        assert!(axes.is_empty());
        assert_eq!(*axes.style(), Style::default());
    }

    #[test]
    fn test_top_exposures_picks_largest_mean() {
        let mut axes = Axes::new();
        ChartRenderer::default()
            .top_exposures(&mut axes, &positions(), 1, TOP_EXPOSURES_TITLE)
            .unwrap();

        assert_eq!(axes.lines().count(), 1);
        assert_eq!(legend_labels(&axes), vec!["A"]);
        assert_eq!(
            axes.legend_box().unwrap().placement,
            LegendPlacement::Below { columns: 5 }
        );
        let Artist::Line { points, .. } = axes.lines().next().unwrap() else {
            unreachable!();
        };
        assert!((points[1].1 - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_top_exposures_requires_cash() {
        let table = PositionTable::new(vec![d(2020, 1, 1)], vec!["A".into()], vec![vec![1.0]])
            .unwrap();
        let mut axes = Axes::new();
        assert!(ChartRenderer::default()
            .top_exposures(&mut axes, &table, 3, "t")
            .is_err());
    }
}
