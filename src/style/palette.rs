//! Color Palette Module
//! Named colors, the cubehelix sequential palette and the RdYlGn diverging map.

use plotters::style::RGBColor;
use std::f64::consts::PI;

pub const BLACK: RGBColor = RGBColor(0, 0, 0);
pub const WHITE: RGBColor = RGBColor(255, 255, 255);
pub const FOREST_GREEN: RGBColor = RGBColor(34, 139, 34);
pub const GRAY: RGBColor = RGBColor(128, 128, 128);
pub const CORAL: RGBColor = RGBColor(255, 127, 80);
pub const ORANGE: RGBColor = RGBColor(255, 165, 0);
pub const STEEL_BLUE: RGBColor = RGBColor(70, 130, 180);
pub const LIGHT_BLUE: RGBColor = RGBColor(173, 216, 230);
/// Text drawn on light heatmap cells.
pub const DARK_TEXT: RGBColor = RGBColor(38, 38, 38);

/// Default color cycle for series without an explicit color.
pub const PALETTE: [RGBColor; 10] = [
    RGBColor(31, 119, 180),  // Blue
    RGBColor(255, 127, 14),  // Orange
    RGBColor(44, 160, 44),   // Green
    RGBColor(214, 39, 40),   // Red
    RGBColor(148, 103, 189), // Purple
    RGBColor(140, 86, 75),   // Brown
    RGBColor(227, 119, 194), // Pink
    RGBColor(127, 127, 127), // Gray
    RGBColor(188, 189, 34),  // Olive
    RGBColor(23, 190, 207),  // Cyan
];

/// Color for the `index`-th series of a chart.
pub fn cycle_color(index: usize) -> RGBColor {
    PALETTE[index % PALETTE.len()]
}

/// Gray level in `[0, 1]`, 0 is black.
pub fn gray(level: f64) -> RGBColor {
    let v = channel(level);
    RGBColor(v, v, v)
}

fn channel(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Sequential cubehelix palette of `n` colors, light to dark.
pub fn cubehelix(n: usize) -> Vec<RGBColor> {
    const START: f64 = 0.0;
    const ROT: f64 = 0.4;
    const GAMMA: f64 = 1.0;
    const HUE: f64 = 0.8;
    const LIGHT: f64 = 0.85;
    const DARK: f64 = 0.15;

    let component = |x: f64, p0: f64, p1: f64| {
        let xg = x.powf(GAMMA);
        let a = HUE * xg * (1.0 - xg) / 2.0;
        let phi = 2.0 * PI * (START / 3.0 + ROT * x);
        xg + a * (p0 * phi.cos() + p1 * phi.sin())
    };

    (0..n)
        .map(|i| {
            let x = if n > 1 {
                LIGHT + (DARK - LIGHT) * i as f64 / (n - 1) as f64
            } else {
                LIGHT
            };
            RGBColor(
                channel(component(x, -0.14861, 1.78277)),
                channel(component(x, -0.29227, -0.90649)),
                channel(component(x, 1.97294, 0.0)),
            )
        })
        .collect()
}

const RD_YL_GN: [RGBColor; 11] = [
    RGBColor(165, 0, 38),
    RGBColor(215, 48, 39),
    RGBColor(244, 109, 67),
    RGBColor(253, 174, 97),
    RGBColor(254, 224, 139),
    RGBColor(255, 255, 191),
    RGBColor(217, 239, 139),
    RGBColor(166, 217, 106),
    RGBColor(102, 189, 99),
    RGBColor(26, 152, 80),
    RGBColor(0, 104, 55),
];

/// Continuous colormap over `[0, 1]` built from evenly spaced stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Colormap {
    stops: &'static [RGBColor],
    reversed: bool,
}

impl Colormap {
    /// Red (low) through yellow to green (high).
    pub fn rd_yl_gn() -> Self {
        Self {
            stops: &RD_YL_GN,
            reversed: false,
        }
    }

    pub fn reversed(self) -> Self {
        Self {
            reversed: !self.reversed,
            ..self
        }
    }

    pub fn sample(&self, t: f64) -> RGBColor {
        let t = if t.is_nan() { 0.5 } else { t.clamp(0.0, 1.0) };
        let t = if self.reversed { 1.0 - t } else { t };

        let last = self.stops.len() - 1;
        let pos = t * last as f64;
        let lo = (pos.floor() as usize).min(last);
        let hi = (lo + 1).min(last);
        let frac = pos - lo as f64;

        let (a, b) = (self.stops[lo], self.stops[hi]);
        let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * frac).round() as u8;
        RGBColor(mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
    }
}

/// Maps values symmetrically around `center` onto `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CenteredNorm {
    pub center: f64,
    pub half_range: f64,
}

impl CenteredNorm {
    /// Widest distance from `center` among the finite `values`.
    pub fn fit<'a>(center: f64, values: impl IntoIterator<Item = &'a f64>) -> Self {
        let half_range = values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold(0.0_f64, |acc, v| acc.max((v - center).abs()));
        Self { center, half_range }
    }

    pub fn apply(&self, value: f64) -> f64 {
        if self.half_range == 0.0 {
            return 0.5;
        }
        0.5 + (value - self.center) / (2.0 * self.half_range)
    }
}

/// WCAG relative luminance of a color.
pub fn relative_luminance(color: RGBColor) -> f64 {
    let lin = |c: u8| {
        let c = c as f64 / 255.0;
        if c <= 0.03928 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    0.2126 * lin(color.0) + 0.7152 * lin(color.1) + 0.0722 * lin(color.2)
}

/// Readable annotation color on top of `background`.
pub fn text_color_on(background: RGBColor) -> RGBColor {
    if relative_luminance(background) > 0.408 {
        DARK_TEXT
    } else {
        WHITE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cubehelix_light_to_dark() {
        let colors = cubehelix(5);
        assert_eq!(colors.len(), 5);
        let lum: Vec<f64> = colors.iter().map(|c| relative_luminance(*c)).collect();
        assert!(lum.windows(2).all(|w| w[0] > w[1]));
        assert_eq!(cubehelix(1).len(), 1);
        assert!(cubehelix(0).is_empty());
    }

    #[test]
    fn test_colormap_ends_and_reverse() {
        let cmap = Colormap::rd_yl_gn();
        assert_eq!(cmap.sample(0.0), RD_YL_GN[0]);
        assert_eq!(cmap.sample(1.0), RD_YL_GN[10]);
        assert_eq!(cmap.sample(0.5), RD_YL_GN[5]);
        assert_eq!(cmap.reversed().sample(0.0), RD_YL_GN[10]);
        assert_eq!(cmap.reversed().reversed(), cmap);
    }

    #[test]
    fn test_centered_norm() {
        let norm = CenteredNorm::fit(0.0, &[-2.0, 1.0, f64::NAN]);
        assert_eq!(norm.half_range, 2.0);
        assert_eq!(norm.apply(0.0), 0.5);
        assert_eq!(norm.apply(-2.0), 0.0);
        assert_eq!(norm.apply(1.0), 0.75);
        assert_eq!(CenteredNorm::fit(0.0, &[0.0]).apply(0.0), 0.5);
    }

    #[test]
    fn test_text_color_contrast() {
        assert_eq!(text_color_on(WHITE), DARK_TEXT);
        assert_eq!(text_color_on(BLACK), WHITE);
    }
}
