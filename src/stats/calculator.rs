//! Statistics Calculator Module
//! Small numeric helpers the charts need: means, histogram bins, top-N ranking.

use statrs::statistics::Statistics;

/// One histogram bin covering `[lower, upper)` (the last bin is closed).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Handles statistical calculations for chart inputs.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Arithmetic mean of the finite values, NaN when there are none.
    pub fn mean(values: &[f64]) -> f64 {
        values.iter().copied().filter(|v| v.is_finite()).mean()
    }

    /// Split finite values into `bins` equal-width bins between min and max.
    ///
    /// A constant sample gets the unit range `[v - 0.5, v + 0.5]`.
    pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
        let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if finite.is_empty() || bins == 0 {
            return Vec::new();
        }

        let mut min = finite.iter().copied().fold(f64::INFINITY, f64::min);
        let mut max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if min == max {
            min -= 0.5;
            max += 0.5;
        }

        let width = (max - min) / bins as f64;
        let mut counts = vec![0usize; bins];
        for v in &finite {
            let idx = (((v - min) / width).floor() as usize).min(bins - 1);
            counts[idx] += 1;
        }

        counts
            .into_iter()
            .enumerate()
            .map(|(i, count)| HistogramBin {
                lower: min + i as f64 * width,
                upper: if i + 1 == bins {
                    max
                } else {
                    min + (i + 1) as f64 * width
                },
                count,
            })
            .collect()
    }

    /// The `n` entries with the largest score, highest first. Ties keep input order.
    pub fn top_n<T: Clone>(scored: &[(T, f64)], n: usize) -> Vec<(T, f64)> {
        let mut ranked = scored.to_vec();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(n);
        ranked
    }
}
