//! Presentation Context Module
//! Scoped styling (line width, font sizes, background colors) for chart rendering.
//!
//! A [`PlottingContext`] resolves to a [`Style`]. Rendering through
//! [`with_context`] installs that style on the axes for the duration of one
//! render call and restores the previous style afterwards.

use crate::charts::Axes;
use crate::style::palette::{gray, WHITE};
use plotters::style::RGBColor;
use serde::{Deserialize, Serialize};
use std::ops::{Deref, DerefMut};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContextError {
    #[error("Invalid plotting context: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Size profile of the output medium.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextProfile {
    Paper,
    #[default]
    Notebook,
    Talk,
    Poster,
}

impl ContextProfile {
    pub fn scale(self) -> f64 {
        match self {
            ContextProfile::Paper => 0.8,
            ContextProfile::Notebook => 1.0,
            ContextProfile::Talk => 1.5,
            ContextProfile::Poster => 2.0,
        }
    }
}

/// Resolved styling parameters captured by artists when they are created.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Style {
    pub line_width: f64,
    pub title_size: f64,
    pub label_size: f64,
    pub tick_size: f64,
    pub legend_size: f64,
    pub axes_facecolor: RGBColor,
    pub figure_facecolor: RGBColor,
}

impl Default for Style {
    /// Global defaults that apply outside any context.
    fn default() -> Self {
        Self {
            line_width: 1.5,
            title_size: 12.0,
            label_size: 10.0,
            tick_size: 10.0,
            legend_size: 10.0,
            axes_facecolor: WHITE,
            figure_facecolor: WHITE,
        }
    }
}

/// Color given either as a gray level or as RGB components.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorSpec {
    Gray(f64),
    Rgb(u8, u8, u8),
}

impl ColorSpec {
    pub fn to_rgb(self) -> RGBColor {
        match self {
            ColorSpec::Gray(level) => gray(level),
            ColorSpec::Rgb(r, g, b) => RGBColor(r, g, b),
        }
    }
}

/// Caller-supplied style parameters. `None` leaves the context value in place.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StyleOverrides {
    pub line_width: Option<f64>,
    pub title_size: Option<f64>,
    pub label_size: Option<f64>,
    pub tick_size: Option<f64>,
    pub legend_size: Option<f64>,
    pub axes_facecolor: Option<ColorSpec>,
    pub figure_facecolor: Option<ColorSpec>,
}

impl StyleOverrides {
    /// Values every chart context starts from.
    pub fn presentation_defaults() -> Self {
        Self {
            line_width: Some(1.5),
            axes_facecolor: Some(ColorSpec::Gray(0.995)),
            figure_facecolor: Some(ColorSpec::Gray(0.97)),
            ..Self::default()
        }
    }

    /// Field-wise merge where `self` wins over `fallback`.
    pub fn or(self, fallback: Self) -> Self {
        Self {
            line_width: self.line_width.or(fallback.line_width),
            title_size: self.title_size.or(fallback.title_size),
            label_size: self.label_size.or(fallback.label_size),
            tick_size: self.tick_size.or(fallback.tick_size),
            legend_size: self.legend_size.or(fallback.legend_size),
            axes_facecolor: self.axes_facecolor.or(fallback.axes_facecolor),
            figure_facecolor: self.figure_facecolor.or(fallback.figure_facecolor),
        }
    }

    fn apply(&self, style: &mut Style) {
        if let Some(v) = self.line_width {
            style.line_width = v;
        }
        if let Some(v) = self.title_size {
            style.title_size = v;
        }
        if let Some(v) = self.label_size {
            style.label_size = v;
        }
        if let Some(v) = self.tick_size {
            style.tick_size = v;
        }
        if let Some(v) = self.legend_size {
            style.legend_size = v;
        }
        if let Some(c) = self.axes_facecolor {
            style.axes_facecolor = c.to_rgb();
        }
        if let Some(c) = self.figure_facecolor {
            style.figure_facecolor = c.to_rgb();
        }
    }
}

/// Presentation configuration: profile, font scale and caller overrides.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlottingContext {
    pub profile: ContextProfile,
    pub font_scale: f64,
    pub overrides: StyleOverrides,
}

impl Default for PlottingContext {
    fn default() -> Self {
        context(ContextProfile::Notebook, 1.5, None)
    }
}

/// Build a context, merging `overrides` over the presentation defaults.
pub fn context(
    profile: ContextProfile,
    font_scale: f64,
    overrides: Option<StyleOverrides>,
) -> PlottingContext {
    PlottingContext {
        profile,
        font_scale,
        overrides: overrides
            .unwrap_or_default()
            .or(StyleOverrides::presentation_defaults()),
    }
}

impl PlottingContext {
    pub fn new(profile: ContextProfile, font_scale: f64, overrides: Option<StyleOverrides>) -> Self {
        context(profile, font_scale, overrides)
    }

    /// Parse a context from JSON. Missing fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self, ContextError> {
        let parsed: PlottingContext = serde_json::from_str(text)?;
        Ok(context(parsed.profile, parsed.font_scale, Some(parsed.overrides)))
    }

    /// Resolve to concrete style values.
    pub fn style(&self) -> Style {
        let scale = self.profile.scale();
        let font = scale * self.font_scale;

        let mut style = Style {
            line_width: 1.5 * scale,
            title_size: 12.0 * font,
            label_size: 12.0 * font,
            tick_size: 11.0 * font,
            legend_size: 11.0 * font,
            ..Style::default()
        };
        self.overrides.apply(&mut style);
        style
    }
}

/// Per-call rendering configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    pub context: PlottingContext,
    /// Run inside `context`; when false the axes' current style is used.
    pub set_context: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            context: PlottingContext::default(),
            set_context: true,
        }
    }
}

impl RenderOptions {
    pub fn without_context() -> Self {
        Self {
            set_context: false,
            ..Self::default()
        }
    }
}

/// Installs a style on an [`Axes`] and restores the previous one on drop.
pub struct ContextScope<'a> {
    axes: &'a mut Axes,
    previous: Style,
}

impl<'a> ContextScope<'a> {
    pub fn enter(axes: &'a mut Axes, style: Style) -> Self {
        let previous = axes.replace_style(style);
        tracing::trace!(?style, "entered plotting context");
        Self { axes, previous }
    }
}

impl Deref for ContextScope<'_> {
    type Target = Axes;

    fn deref(&self) -> &Axes {
        self.axes
    }
}

impl DerefMut for ContextScope<'_> {
    fn deref_mut(&mut self) -> &mut Axes {
        self.axes
    }
}

impl Drop for ContextScope<'_> {
    fn drop(&mut self) {
        self.axes.replace_style(self.previous);
        tracing::trace!("left plotting context");
    }
}

/// Run `render` on `axes`, inside the configured context unless opted out.
pub fn with_context<'a, F>(axes: &'a mut Axes, options: &RenderOptions, render: F) -> &'a mut Axes
where
    F: FnOnce(&mut Axes),
{
    if options.set_context {
        let mut scope = ContextScope::enter(axes, options.context.style());
        render(&mut *scope);
    } else {
        render(axes);
    }
    axes
}

/// Fallible variant of [`with_context`]; the scope is released on error too.
pub fn try_with_context<'a, F, E>(
    axes: &'a mut Axes,
    options: &RenderOptions,
    render: F,
) -> Result<&'a mut Axes, E>
where
    F: FnOnce(&mut Axes) -> Result<(), E>,
{
    if options.set_context {
        let mut scope = ContextScope::enter(axes, options.context.style());
        render(&mut *scope)?;
    } else {
        render(axes)?;
    }
    Ok(axes)
}
