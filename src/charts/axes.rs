//! Drawing Surface Module
//! A retained set of chart artists that render calls append to.
//!
//! `Axes` is the surface every chart operation mutates. It records what
//! should be drawn (lines, areas, bands, bars, histogram bins, heatmap cells,
//! labels, legend) without touching pixels, so it can be inspected directly
//! or handed to a backend such as [`crate::charts::PlottersBackend`].

use crate::data::ReturnSeries;
use crate::stats::{HistogramBin, StatsCalculator};
use crate::style::palette::{cycle_color, CenteredNorm, Colormap};
use crate::style::{date_to_x, Style, TickFormat};
use plotters::style::RGBColor;
use std::mem;

/// Fraction of the data range added on each side of an axis.
const MARGIN: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dash {
    #[default]
    Solid,
    Dashed,
}

/// Requested line appearance. A missing width takes the active style's width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineStyle {
    pub color: Option<RGBColor>,
    pub alpha: f64,
    pub width: Option<f64>,
    pub dash: Dash,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            color: None,
            alpha: 1.0,
            width: None,
            dash: Dash::Solid,
        }
    }
}

impl LineStyle {
    pub fn new(color: RGBColor) -> Self {
        Self {
            color: Some(color),
            ..Self::default()
        }
    }

    pub fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }

    pub fn dashed(mut self) -> Self {
        self.dash = Dash::Dashed;
        self
    }
}

/// Resolved line appearance stored on artists.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: RGBColor,
    pub alpha: f64,
    pub width: f64,
    pub dash: Dash,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fill {
    pub color: RGBColor,
    pub alpha: f64,
}

impl Fill {
    pub fn new(color: RGBColor, alpha: f64) -> Self {
        Self { color, alpha }
    }
}

/// Text with the font size that was active when it was set.
#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    pub text: String,
    pub size: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AxisScale {
    Linear,
    /// Label `i` sits at coordinate `i + offset`.
    Categories { labels: Vec<String>, offset: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    pub scale: AxisScale,
    pub format: TickFormat,
    pub label: Option<Text>,
    pub tick_size: f64,
}

impl Axis {
    fn new(tick_size: f64) -> Self {
        Self {
            scale: AxisScale::Linear,
            format: TickFormat::Plain,
            label: None,
            tick_size,
        }
    }

    /// Category label at `value`, if `value` is a category position.
    pub fn category_at(&self, value: f64) -> Option<&str> {
        let AxisScale::Categories { labels, offset } = &self.scale else {
            return None;
        };
        let slot = value - offset;
        let idx = slot.round();
        if (slot - idx).abs() > 1e-6 || idx < 0.0 {
            return None;
        }
        labels.get(idx as usize).map(String::as_str)
    }

    pub fn tick_label(&self, value: f64) -> String {
        match &self.scale {
            AxisScale::Linear => self.format.format(value),
            AxisScale::Categories { .. } => self.category_at(value).unwrap_or_default().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Norm {
    Linear { min: f64, max: f64 },
    Centered(CenteredNorm),
}

impl Norm {
    pub fn apply(&self, value: f64) -> f64 {
        match self {
            Norm::Linear { min, max } if max > min => (value - min) / (max - min),
            Norm::Linear { .. } => 0.5,
            Norm::Centered(norm) => norm.apply(value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Annotation {
    pub decimals: usize,
    pub size: f64,
}

/// Colored grid of values; row 0 is drawn at the top.
#[derive(Debug, Clone, PartialEq)]
pub struct Heatmap {
    pub row_labels: Vec<String>,
    pub col_labels: Vec<String>,
    pub values: Vec<Vec<f64>>,
    pub colormap: Colormap,
    pub norm: Norm,
    pub annotation: Option<Annotation>,
}

impl Heatmap {
    pub fn new(row_labels: Vec<String>, col_labels: Vec<String>, values: Vec<Vec<f64>>) -> Self {
        let finite = values.iter().flatten().copied().filter(|v| v.is_finite());
        let (min, max) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        Self {
            row_labels,
            col_labels,
            values,
            colormap: Colormap::rd_yl_gn(),
            norm: Norm::Linear { min, max },
            annotation: None,
        }
    }

    pub fn colormap(mut self, colormap: Colormap) -> Self {
        self.colormap = colormap;
        self
    }

    /// Map colors symmetrically around `center`.
    pub fn centered(mut self, center: f64) -> Self {
        self.norm = Norm::Centered(CenteredNorm::fit(center, self.values.iter().flatten()));
        self
    }

    pub fn annotate(mut self, decimals: usize, size: f64) -> Self {
        self.annotation = Some(Annotation { decimals, size });
        self
    }

    pub fn rows(&self) -> usize {
        self.values.len()
    }

    pub fn cols(&self) -> usize {
        self.col_labels.len()
    }

    pub fn cell_color(&self, row: usize, col: usize) -> RGBColor {
        self.colormap.sample(self.norm.apply(self.values[row][col]))
    }

    pub fn annotation_text(&self, row: usize, col: usize) -> Option<String> {
        self.annotation
            .map(|a| format!("{:.*}", a.decimals, self.values[row][col]))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Artist {
    Line {
        points: Vec<(f64, f64)>,
        stroke: Stroke,
        label: Option<String>,
    },
    /// Filled region between the points and `baseline`.
    Area {
        points: Vec<(f64, f64)>,
        baseline: f64,
        fill: Fill,
        label: Option<String>,
    },
    /// Vertical band over the full y-range.
    Span { x0: f64, x1: f64, fill: Fill },
    HLine {
        y: f64,
        stroke: Stroke,
        label: Option<String>,
    },
    VLine {
        x: f64,
        stroke: Stroke,
        label: Option<String>,
    },
    /// Bar `i` spans `[0, values[i]]` horizontally around y = i.
    BarH {
        values: Vec<f64>,
        height: f64,
        fill: Fill,
        label: Option<String>,
    },
    Histogram {
        bins: Vec<HistogramBin>,
        fill: Fill,
        label: Option<String>,
    },
    Heatmap(Heatmap),
}

impl Artist {
    pub fn label(&self) -> Option<&str> {
        match self {
            Artist::Line { label, .. }
            | Artist::Area { label, .. }
            | Artist::HLine { label, .. }
            | Artist::VLine { label, .. }
            | Artist::BarH { label, .. }
            | Artist::Histogram { label, .. } => label.as_deref(),
            Artist::Span { .. } | Artist::Heatmap(_) => None,
        }
    }

    fn legend_key(&self) -> Option<LegendKey> {
        match self {
            Artist::Line { stroke, .. } | Artist::HLine { stroke, .. } | Artist::VLine { stroke, .. } => {
                Some(LegendKey::Line(*stroke))
            }
            Artist::Area { fill, .. } | Artist::BarH { fill, .. } | Artist::Histogram { fill, .. } => {
                Some(LegendKey::Patch(*fill))
            }
            Artist::Span { .. } | Artist::Heatmap(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegendPlacement {
    /// Inside the plot, upper right.
    Best,
    /// Under the plot, entries laid out row by row.
    Below { columns: usize },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LegendKey {
    Line(Stroke),
    Patch(Fill),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub label: String,
    pub key: LegendKey,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Legend {
    pub entries: Vec<LegendEntry>,
    pub placement: LegendPlacement,
    pub font_size: f64,
}

/// Data-space bounds of an axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Limits {
    pub x: (f64, f64),
    pub y: (f64, f64),
}

/// Caller-owned chart surface.
#[derive(Debug, Clone, PartialEq)]
pub struct Axes {
    style: Style,
    artists: Vec<Artist>,
    title: Option<Text>,
    x: Axis,
    y: Axis,
    legend: Option<Legend>,
    facecolor: Option<RGBColor>,
    figure_facecolor: Option<RGBColor>,
}

impl Default for Axes {
    fn default() -> Self {
        Self::new()
    }
}

impl Axes {
    pub fn new() -> Self {
        let style = Style::default();
        Self {
            style,
            artists: Vec::new(),
            title: None,
            x: Axis::new(style.tick_size),
            y: Axis::new(style.tick_size),
            legend: None,
            facecolor: None,
            figure_facecolor: None,
        }
    }

    pub fn style(&self) -> &Style {
        &self.style
    }

    /// Swap in a new active style, returning the previous one.
    pub fn replace_style(&mut self, style: Style) -> Style {
        mem::replace(&mut self.style, style)
    }

    pub fn artists(&self) -> &[Artist] {
        &self.artists
    }

    pub fn title(&self) -> Option<&Text> {
        self.title.as_ref()
    }

    pub fn x_axis(&self) -> &Axis {
        &self.x
    }

    pub fn y_axis(&self) -> &Axis {
        &self.y
    }

    pub fn legend_box(&self) -> Option<&Legend> {
        self.legend.as_ref()
    }

    /// Panel background, fixed by the first drawing call.
    pub fn facecolor(&self) -> RGBColor {
        self.facecolor.unwrap_or(self.style.axes_facecolor)
    }

    pub fn figure_facecolor(&self) -> RGBColor {
        self.figure_facecolor.unwrap_or(self.style.figure_facecolor)
    }

    pub fn is_empty(&self) -> bool {
        self.artists.is_empty()
    }

    /// Line artists in drawing order.
    pub fn lines(&self) -> impl Iterator<Item = &Artist> {
        self.artists
            .iter()
            .filter(|a| matches!(a, Artist::Line { .. }))
    }

    /// `(x0, x1)` of every vertical band.
    pub fn spans(&self) -> Vec<(f64, f64)> {
        self.artists
            .iter()
            .filter_map(|a| match a {
                Artist::Span { x0, x1, .. } => Some((*x0, *x1)),
                _ => None,
            })
            .collect()
    }

    fn push(&mut self, artist: Artist) {
        if self.facecolor.is_none() {
            self.facecolor = Some(self.style.axes_facecolor);
            self.figure_facecolor = Some(self.style.figure_facecolor);
        }
        self.artists.push(artist);
    }

    fn stroke(&self, style: LineStyle) -> Stroke {
        let color = style.color.unwrap_or_else(|| cycle_color(self.lines().count()));
        Stroke {
            color,
            alpha: style.alpha,
            width: style.width.unwrap_or(self.style.line_width),
            dash: style.dash,
        }
    }

    fn date_axis(&mut self) {
        if self.x.format == TickFormat::Plain {
            self.x.format = TickFormat::Date;
            self.x.tick_size = self.style.tick_size;
        }
    }

    pub fn plot(&mut self, points: Vec<(f64, f64)>, style: LineStyle, label: Option<&str>) {
        let stroke = self.stroke(style);
        self.push(Artist::Line {
            points,
            stroke,
            label: label.map(str::to_string),
        });
    }

    /// Line over a date-indexed series; the x-axis switches to dates.
    pub fn plot_series(&mut self, series: &ReturnSeries, style: LineStyle, label: Option<&str>) {
        self.date_axis();
        let points = series.iter().map(|(d, v)| (date_to_x(d), v)).collect();
        self.plot(points, style, label);
    }

    /// Filled area between a date-indexed series and zero.
    pub fn fill_series(&mut self, series: &ReturnSeries, fill: Fill, label: Option<&str>) {
        self.date_axis();
        let points = series.iter().map(|(d, v)| (date_to_x(d), v)).collect();
        self.push(Artist::Area {
            points,
            baseline: 0.0,
            fill,
            label: label.map(str::to_string),
        });
    }

    pub fn axvspan(&mut self, x0: f64, x1: f64, fill: Fill) {
        self.push(Artist::Span { x0, x1, fill });
    }

    pub fn axhline(&mut self, y: f64, style: LineStyle, label: Option<&str>) {
        let stroke = self.stroke(style);
        self.push(Artist::HLine {
            y,
            stroke,
            label: label.map(str::to_string),
        });
    }

    pub fn axvline(&mut self, x: f64, style: LineStyle, label: Option<&str>) {
        let stroke = self.stroke(style);
        self.push(Artist::VLine {
            x,
            stroke,
            label: label.map(str::to_string),
        });
    }

    /// Horizontal bars, one per category, bottom to top.
    pub fn barh(&mut self, labels: Vec<String>, values: Vec<f64>, fill: Fill, label: Option<&str>) {
        self.y.scale = AxisScale::Categories { labels, offset: 0.0 };
        self.y.tick_size = self.style.tick_size;
        self.push(Artist::BarH {
            values,
            height: 0.5,
            fill,
            label: label.map(str::to_string),
        });
    }

    pub fn hist(&mut self, values: &[f64], bins: usize, fill: Fill, label: Option<&str>) {
        let bins = StatsCalculator::histogram(values, bins);
        self.push(Artist::Histogram {
            bins,
            fill,
            label: label.map(str::to_string),
        });
    }

    /// Heatmap cells with categorical axes; the first row is shown on top.
    pub fn heatmap(&mut self, heatmap: Heatmap) {
        self.x.scale = AxisScale::Categories {
            labels: heatmap.col_labels.clone(),
            offset: 0.5,
        };
        self.y.scale = AxisScale::Categories {
            labels: heatmap.row_labels.iter().rev().cloned().collect(),
            offset: 0.5,
        };
        self.x.tick_size = self.style.tick_size;
        self.y.tick_size = self.style.tick_size;
        self.push(Artist::Heatmap(heatmap));
    }

    pub fn set_title(&mut self, title: &str) {
        self.title = text(title, self.style.title_size);
    }

    /// An empty label removes the axis label.
    pub fn set_xlabel(&mut self, label: &str) {
        self.x.label = text(label, self.style.label_size);
    }

    pub fn set_ylabel(&mut self, label: &str) {
        self.y.label = text(label, self.style.label_size);
    }

    pub fn set_x_format(&mut self, format: TickFormat) {
        self.x.format = format;
        self.x.tick_size = self.style.tick_size;
    }

    pub fn set_y_format(&mut self, format: TickFormat) {
        self.y.format = format;
        self.y.tick_size = self.style.tick_size;
    }

    /// Fixed x tick label size, independent of the active style.
    pub fn set_x_tick_size(&mut self, size: f64) {
        self.x.tick_size = size;
    }

    /// Legend over every labelled artist drawn so far.
    pub fn legend(&mut self, placement: LegendPlacement) {
        let entries: Vec<LegendEntry> = self
            .artists
            .iter()
            .filter_map(|a| {
                let label = a.label()?;
                let key = a.legend_key()?;
                Some(LegendEntry {
                    label: label.to_string(),
                    key,
                })
            })
            .collect();

        if entries.is_empty() {
            tracing::debug!("no labelled artists, legend skipped");
            self.legend = None;
            return;
        }
        self.legend = Some(Legend {
            entries,
            placement,
            font_size: self.style.legend_size,
        });
    }

    /// Bounds of everything drawn, without margins.
    pub fn data_limits(&self) -> Option<Limits> {
        let mut x = Extent::default();
        let mut y = Extent::default();

        for artist in &self.artists {
            match artist {
                Artist::Line { points, .. } => {
                    for &(px, py) in points {
                        x.add(px);
                        y.add(py);
                    }
                }
                Artist::Area {
                    points, baseline, ..
                } => {
                    for &(px, py) in points {
                        x.add(px);
                        y.add(py);
                    }
                    y.add(*baseline);
                }
                Artist::Span { x0, x1, .. } => {
                    x.add(*x0);
                    x.add(*x1);
                }
                Artist::HLine { y: v, .. } => y.add(*v),
                Artist::VLine { x: v, .. } => x.add(*v),
                Artist::BarH { values, height, .. } => {
                    x.add(0.0);
                    for v in values {
                        x.add(*v);
                    }
                    if !values.is_empty() {
                        y.add(-height);
                        y.add(values.len() as f64 - 1.0 + height);
                    }
                }
                Artist::Histogram { bins, .. } => {
                    for bin in bins {
                        x.add(bin.lower);
                        x.add(bin.upper);
                        y.add(0.0);
                        y.add(bin.count as f64);
                    }
                }
                Artist::Heatmap(h) => {
                    x.add(0.0);
                    x.add(h.cols() as f64);
                    y.add(0.0);
                    y.add(h.rows() as f64);
                }
            }
        }

        Some(Limits {
            x: x.bounds()?,
            y: y.bounds()?,
        })
    }

    /// Bounds used for drawing: data limits plus margins, tight for heatmaps.
    pub fn view_limits(&self) -> Option<Limits> {
        let limits = self.data_limits()?;
        if self.artists.iter().any(|a| matches!(a, Artist::Heatmap(_))) {
            return Some(limits);
        }
        let x_margin = if self.x.format == TickFormat::Date {
            0.0
        } else {
            MARGIN
        };
        Some(Limits {
            x: pad(limits.x, x_margin),
            y: pad(limits.y, MARGIN),
        })
    }
}

fn text(value: &str, size: f64) -> Option<Text> {
    if value.is_empty() {
        None
    } else {
        Some(Text {
            text: value.to_string(),
            size,
        })
    }
}

fn pad((lo, hi): (f64, f64), margin: f64) -> (f64, f64) {
    if hi > lo {
        let delta = (hi - lo) * margin;
        (lo - delta, hi + delta)
    } else {
        let delta = if lo == 0.0 { 1.0 } else { lo.abs() * 0.1 };
        (lo - delta, hi + delta)
    }
}

#[derive(Default)]
struct Extent(Option<(f64, f64)>);

impl Extent {
    fn add(&mut self, v: f64) {
        if !v.is_finite() {
            return;
        }
        self.0 = Some(match self.0 {
            Some((lo, hi)) => (lo.min(v), hi.max(v)),
            None => (v, v),
        });
    }

    fn bounds(&self) -> Option<(f64, f64)> {
        self.0
    }
}
