//! Static Chart Renderer
//! Rasterises an [`Axes`] onto a plotters drawing area (bitmap or SVG).
//!
//! Layout:
//! 1. Figure background, then the title caption
//! 2. Plot panel with tick labels (categorical axes get one label per slot)
//! 3. Artists in the order they were added
//! 4. Legend inside the panel (upper right) or in a strip below it

use crate::charts::axes::{
    Artist, Axes, AxisScale, Dash, Fill, Heatmap, Legend, LegendEntry, LegendKey,
    LegendPlacement, Limits, Stroke,
};
use crate::charts::ChartError;
use crate::style::palette::{text_color_on, BLACK, WHITE};
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

const FONT: &str = "sans-serif";
const MARGIN: i32 = 10;
const LEGEND_KEY_WIDTH: i32 = 20;
const DASH_SIZE: u32 = 6;
const DASH_SPACING: u32 = 4;

type Chart<'a, DB> = ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

fn backend_err<E: std::error::Error>(err: E) -> ChartError {
    ChartError::Backend(err.to_string())
}

fn fill_style(fill: Fill) -> ShapeStyle {
    fill.color.mix(fill.alpha).filled()
}

fn stroke_style(stroke: Stroke) -> ShapeStyle {
    stroke
        .color
        .mix(stroke.alpha)
        .stroke_width(stroke.width.round().max(1.0) as u32)
}

/// Rows needed to lay `entries` out in `columns` columns.
fn legend_rows(entries: usize, columns: usize) -> usize {
    entries.div_ceil(columns.max(1))
}

fn legend_row_height(font_size: f64) -> i32 {
    (font_size * 1.5).ceil() as i32
}

/// Rough text width; good enough to size legend boxes.
fn text_width(text: &str, font_size: f64) -> i32 {
    (text.chars().count() as f64 * font_size * 0.6).ceil() as i32
}

/// Renders [`Axes`] with plotters.
pub struct PlottersBackend;

impl PlottersBackend {
    /// Draw `axes` filling `area`. An axes with nothing on it leaves a blank panel.
    pub fn draw<DB: DrawingBackend>(
        area: &DrawingArea<DB, Shift>,
        axes: &Axes,
    ) -> Result<(), ChartError> {
        area.fill(&axes.figure_facecolor()).map_err(backend_err)?;

        let Some(limits) = axes.view_limits() else {
            tracing::warn!("axes has no artists, leaving area blank");
            return Ok(());
        };

        let (plot_area, legend_strip) = match axes.legend_box() {
            Some(legend) => match legend.placement {
                LegendPlacement::Below { columns } => {
                    let rows = legend_rows(legend.entries.len(), columns) as i32;
                    let strip = rows * legend_row_height(legend.font_size) + 2 * MARGIN;
                    let (_, height) = area.dim_in_pixel();
                    let (top, bottom) = area.split_vertically(height as i32 - strip);
                    (top, Some((bottom, legend, columns)))
                }
                LegendPlacement::Best => (area.clone(), None),
            },
            None => (area.clone(), None),
        };

        let mut chart = Self::build_chart(&plot_area, axes, limits)?;
        Self::draw_mesh(&mut chart, axes)?;

        for artist in axes.artists() {
            Self::draw_artist(&mut chart, artist, limits)?;
        }
        Self::draw_categories(&plot_area, &chart, axes, limits)?;

        match (axes.legend_box(), legend_strip) {
            (_, Some((strip, legend, columns))) => {
                let (width, _) = strip.dim_in_pixel();
                let cell = width as i32 / columns.max(1) as i32;
                Self::draw_legend_entries(
                    &strip,
                    &legend.entries,
                    legend.font_size,
                    (MARGIN, MARGIN),
                    cell,
                    columns,
                )?;
            }
            (Some(legend), None) => Self::draw_inset_legend(&plot_area, &chart, legend)?,
            (None, None) => {}
        }

        area.present().map_err(backend_err)?;
        Ok(())
    }

    fn build_chart<'a, DB: DrawingBackend>(
        area: &'a DrawingArea<DB, Shift>,
        axes: &Axes,
        limits: Limits,
    ) -> Result<Chart<'a, DB>, ChartError> {
        let x_area = (axes.x_axis().tick_size * 2.0) as i32
            + axes.x_axis().label.as_ref().map_or(0, |l| (l.size * 1.5) as i32);
        let y_area = (axes.y_axis().tick_size * 4.0) as i32
            + axes.y_axis().label.as_ref().map_or(0, |l| (l.size * 1.5) as i32);

        let mut builder = ChartBuilder::on(area);
        builder
            .margin(MARGIN)
            .x_label_area_size(x_area)
            .y_label_area_size(y_area);
        if let Some(title) = axes.title() {
            builder.caption(&title.text, (FONT, title.size));
        }

        builder
            .build_cartesian_2d(limits.x.0..limits.x.1, limits.y.0..limits.y.1)
            .map_err(backend_err)
    }

    fn draw_mesh<DB: DrawingBackend>(chart: &mut Chart<'_, DB>, axes: &Axes) -> Result<(), ChartError> {
        let x_axis = axes.x_axis();
        let y_axis = axes.y_axis();
        // categorical labels are placed per slot by draw_categories
        let x_fmt = |v: &f64| match x_axis.scale {
            AxisScale::Linear => x_axis.tick_label(*v),
            AxisScale::Categories { .. } => String::new(),
        };
        let y_fmt = |v: &f64| match y_axis.scale {
            AxisScale::Linear => y_axis.tick_label(*v),
            AxisScale::Categories { .. } => String::new(),
        };

        let plot_bg = axes.facecolor();
        chart
            .plotting_area()
            .fill(&plot_bg)
            .map_err(backend_err)?;

        let mut mesh = chart.configure_mesh();
        mesh.disable_x_mesh()
            .disable_y_mesh()
            .x_label_formatter(&x_fmt)
            .y_label_formatter(&y_fmt)
            .x_label_style((FONT, x_axis.tick_size))
            .y_label_style((FONT, y_axis.tick_size));

        if let Some(label) = &x_axis.label {
            mesh.x_desc(label.text.as_str()).axis_desc_style((FONT, label.size));
        }
        if let Some(label) = &y_axis.label {
            mesh.y_desc(label.text.as_str()).axis_desc_style((FONT, label.size));
        }

        mesh.draw().map_err(backend_err)
    }

    fn draw_line<DB: DrawingBackend>(
        chart: &mut Chart<'_, DB>,
        points: Vec<(f64, f64)>,
        stroke: Stroke,
    ) -> Result<(), ChartError> {
        let style = stroke_style(stroke);
        match stroke.dash {
            Dash::Solid => chart
                .draw_series(LineSeries::new(points, style))
                .map(|_| ())
                .map_err(backend_err),
            Dash::Dashed => chart
                .draw_series(DashedLineSeries::new(points, DASH_SIZE, DASH_SPACING, style))
                .map(|_| ())
                .map_err(backend_err),
        }
    }

    fn draw_artist<DB: DrawingBackend>(
        chart: &mut Chart<'_, DB>,
        artist: &Artist,
        limits: Limits,
    ) -> Result<(), ChartError> {
        match artist {
            Artist::Line { points, stroke, .. } => Self::draw_line(chart, points.clone(), *stroke),
            Artist::HLine { y, stroke, .. } => {
                Self::draw_line(chart, vec![(limits.x.0, *y), (limits.x.1, *y)], *stroke)
            }
            Artist::VLine { x, stroke, .. } => {
                Self::draw_line(chart, vec![(*x, limits.y.0), (*x, limits.y.1)], *stroke)
            }
            Artist::Area {
                points,
                baseline,
                fill,
                ..
            } => chart
                .draw_series(AreaSeries::new(points.iter().copied(), *baseline, fill_style(*fill)))
                .map(|_| ())
                .map_err(backend_err),
            Artist::Span { x0, x1, fill } => chart
                .draw_series(std::iter::once(Rectangle::new(
                    [(*x0, limits.y.0), (*x1, limits.y.1)],
                    fill_style(*fill),
                )))
                .map(|_| ())
                .map_err(backend_err),
            Artist::BarH {
                values,
                height,
                fill,
                ..
            } => {
                let half = height / 2.0;
                chart
                    .draw_series(values.iter().enumerate().map(|(i, v)| {
                        let y = i as f64;
                        Rectangle::new([(0.0, y - half), (*v, y + half)], fill_style(*fill))
                    }))
                    .map(|_| ())
                    .map_err(backend_err)
            }
            Artist::Histogram { bins, fill, .. } => chart
                .draw_series(bins.iter().map(|bin| {
                    Rectangle::new(
                        [(bin.lower, 0.0), (bin.upper, bin.count as f64)],
                        fill_style(*fill),
                    )
                }))
                .map(|_| ())
                .map_err(backend_err),
            Artist::Heatmap(heatmap) => Self::draw_heatmap(chart, heatmap),
        }
    }

    fn draw_heatmap<DB: DrawingBackend>(
        chart: &mut Chart<'_, DB>,
        heatmap: &Heatmap,
    ) -> Result<(), ChartError> {
        let rows = heatmap.rows();
        for row in 0..rows {
            // first row on top
            let y = (rows - 1 - row) as f64;
            for col in 0..heatmap.cols() {
                let x = col as f64;
                let color = heatmap.cell_color(row, col);
                chart
                    .draw_series(std::iter::once(Rectangle::new(
                        [(x, y), (x + 1.0, y + 1.0)],
                        color.filled(),
                    )))
                    .map_err(backend_err)?;

                if let (Some(text), Some(annotation)) =
                    (heatmap.annotation_text(row, col), heatmap.annotation)
                {
                    let ink = text_color_on(color);
                    let style = (FONT, annotation.size)
                        .into_font()
                        .color(&ink)
                        .pos(Pos::new(HPos::Center, VPos::Center));
                    chart
                        .draw_series(std::iter::once(Text::new(text, (x + 0.5, y + 0.5), style)))
                        .map_err(backend_err)?;
                }
            }
        }
        Ok(())
    }

    /// One tick label per category slot.
    fn draw_categories<DB: DrawingBackend>(
        area: &DrawingArea<DB, Shift>,
        chart: &Chart<'_, DB>,
        axes: &Axes,
        limits: Limits,
    ) -> Result<(), ChartError> {
        let (x_range, y_range) = area.get_pixel_range();
        let to_local = |(px, py): (i32, i32)| (px - x_range.start, py - y_range.start);
        let plot = chart.plotting_area();

        if let AxisScale::Categories { labels, offset } = &axes.x_axis().scale {
            let style = (FONT, axes.x_axis().tick_size)
                .into_font()
                .color(&BLACK)
                .pos(Pos::new(HPos::Center, VPos::Top));
            for (i, label) in labels.iter().enumerate() {
                let (px, py) = to_local(plot.map_coordinate(&(i as f64 + offset, limits.y.0)));
                area.draw(&Text::new(label.as_str(), (px, py + 5), style.clone()))
                    .map_err(backend_err)?;
            }
        }

        if let AxisScale::Categories { labels, offset } = &axes.y_axis().scale {
            let style = (FONT, axes.y_axis().tick_size)
                .into_font()
                .color(&BLACK)
                .pos(Pos::new(HPos::Right, VPos::Center));
            for (i, label) in labels.iter().enumerate() {
                let (px, py) = to_local(plot.map_coordinate(&(limits.x.0, i as f64 + offset)));
                area.draw(&Text::new(label.as_str(), (px - 5, py), style.clone()))
                    .map_err(backend_err)?;
            }
        }
        Ok(())
    }

    /// Boxed legend in the upper-right corner of the plot panel.
    fn draw_inset_legend<DB: DrawingBackend>(
        area: &DrawingArea<DB, Shift>,
        chart: &Chart<'_, DB>,
        legend: &Legend,
    ) -> Result<(), ChartError> {
        let (area_x, area_y) = area.get_pixel_range();
        let (plot_x, plot_y) = chart.plotting_area().get_pixel_range();

        let row_h = legend_row_height(legend.font_size);
        let widest = legend
            .entries
            .iter()
            .map(|e| text_width(&e.label, legend.font_size))
            .max()
            .unwrap_or(0);
        let box_w = LEGEND_KEY_WIDTH + widest + 3 * MARGIN;
        let box_h = legend.entries.len() as i32 * row_h + MARGIN;

        let right = plot_x.end - area_x.start - MARGIN;
        let top = plot_y.start - area_y.start + MARGIN;
        let left = right - box_w;

        area.draw(&Rectangle::new(
            [(left, top), (right, top + box_h)],
            WHITE.mix(0.8).filled(),
        ))
        .map_err(backend_err)?;
        area.draw(&Rectangle::new(
            [(left, top), (right, top + box_h)],
            BLACK.mix(0.3).stroke_width(1),
        ))
        .map_err(backend_err)?;

        Self::draw_legend_entries(
            area,
            &legend.entries,
            legend.font_size,
            (left + MARGIN / 2, top + MARGIN / 2),
            box_w,
            1,
        )
    }

    /// Entries laid out row by row, `columns` per row, `cell_w` pixels apart.
    fn draw_legend_entries<DB: DrawingBackend>(
        area: &DrawingArea<DB, Shift>,
        entries: &[LegendEntry],
        font_size: f64,
        origin: (i32, i32),
        cell_w: i32,
        columns: usize,
    ) -> Result<(), ChartError> {
        let row_h = legend_row_height(font_size);
        let label_style = (FONT, font_size)
            .into_font()
            .color(&BLACK)
            .pos(Pos::new(HPos::Left, VPos::Center));

        for (i, entry) in entries.iter().enumerate() {
            let col = (i % columns.max(1)) as i32;
            let row = (i / columns.max(1)) as i32;
            let x = origin.0 + col * cell_w;
            let y = origin.1 + row * row_h + row_h / 2;

            let key = match entry.key {
                LegendKey::Line(stroke) => area.draw(&PathElement::new(
                    vec![(x, y), (x + LEGEND_KEY_WIDTH, y)],
                    stroke_style(stroke),
                )),
                LegendKey::Patch(fill) => area.draw(&Rectangle::new(
                    [(x, y - row_h / 4), (x + LEGEND_KEY_WIDTH, y + row_h / 4)],
                    fill_style(fill),
                )),
            };
            key.map_err(backend_err)?;

            area.draw(&Text::new(
                entry.label.as_str(),
                (x + LEGEND_KEY_WIDTH + 6, y),
                label_style.clone(),
            ))
            .map_err(backend_err)?;
        }
        Ok(())
    }
}
