//! Trend comparison shown by the compare stage.
//!
//! Historical series are fixed demo samples per time range. The newest sample is
//! replaced by the card's own value so the comparison always ends on the
//! current result.

use crate::types::{CompareTimeRange, TestResultConfig};
use eframe::egui::{self, Pos2};

/// Width of the sparkline box.
pub const SPARKLINE_WIDTH: f32 = 228.0;
/// Height of the sparkline box.
pub const SPARKLINE_HEIGHT: f32 = 40.0;
/// Lower bound of the crop target band, in ppm.
pub const TARGET_MIN: f64 = 38.0;
/// Upper bound of the crop target band, in ppm.
pub const TARGET_MAX: f64 = 52.0;
/// Range used until one is picked.
pub const DEFAULT_RANGE: CompareTimeRange = CompareTimeRange::Season;

const SAMPLES_14D: [f64; 14] = [34., 37., 35., 38., 36., 39., 40., 42., 41., 43., 44., 45., 44., 46.];

const SAMPLES_30D: [f64; 30] = [
    31., 33., 32., 35., 36., 38., 37., 39., 41., 40., 44., 46., 45., 43., 47., 48., 50., 49., 51.,
    52., 53., 51., 48., 46., 44., 45., 47., 48., 49., 50.,
];

const SAMPLES_60D: [f64; 60] = [
    28., 29., 30., 32., 31., 33., 35., 36., 38., 39., 41., 42., 40., 39., 43., 45., 46., 48., 47.,
    49., 52., 50., 48., 47., 46., 45., 44., 43., 42., 41., 43., 44., 45., 46., 47., 49., 51., 52.,
    53., 51., 49., 48., 47., 45., 44., 43., 42., 41., 42., 44., 45., 46., 47., 48., 49., 50., 52.,
    51., 50., 49.,
];

const SAMPLES_90D: [f64; 90] = [
    26., 27., 28., 29., 30., 31., 33., 32., 34., 36., 37., 39., 41., 40., 38., 37., 36., 38., 40.,
    42., 44., 45., 46., 45., 44., 43., 42., 41., 40., 39., 41., 42., 43., 44., 46., 48., 49., 50.,
    51., 52., 50., 48., 47., 46., 45., 43., 44., 45., 46., 48., 49., 51., 53., 55., 54., 53., 51.,
    50., 48., 47., 46., 45., 44., 43., 42., 41., 42., 43., 44., 45., 46., 47., 48., 49., 50., 50.,
    49., 48., 47., 46., 47., 48., 49., 50., 52., 53., 54., 55., 56., 57.,
];

const SAMPLES_SEASON: [f64; 60] = [
    32., 34., 33., 35., 37., 36., 38., 39., 41., 40., 42., 44., 43., 45., 47., 46., 48., 49., 50.,
    48., 46., 45., 44., 43., 42., 41., 40., 42., 43., 44., 45., 46., 47., 48., 50., 51., 52., 53.,
    52., 51., 50., 49., 47., 45., 44., 42., 41., 40., 39., 41., 42., 43., 44., 45., 47., 48., 49.,
    50., 51., 52.,
];

/// Demo samples for a time range, oldest first.
pub fn samples(range: CompareTimeRange) -> &'static [f64] {
    match range {
        CompareTimeRange::Days14 => &SAMPLES_14D,
        CompareTimeRange::Days30 => &SAMPLES_30D,
        CompareTimeRange::Days60 => &SAMPLES_60D,
        CompareTimeRange::Days90 => &SAMPLES_90D,
        CompareTimeRange::Season => &SAMPLES_SEASON,
    }
}

/// The series to display, ending on the current value when it is known.
pub fn display_series(range: CompareTimeRange, current: Option<f64>) -> Vec<f64> {
    let mut series = samples(range).to_vec();
    if let (Some(value), Some(last)) = (current, series.last_mut()) {
        *last = value;
    }
    series
}

/// Makes sure a config opened on the compare stage has a range selected.
pub fn ensure_defaults(config: &mut TestResultConfig) -> bool {
    if config.compare_trend_enabled == Some(true) && config.compare_time_range.is_some() {
        return false;
    }
    config.compare_trend_enabled = Some(true);
    config.compare_time_range.get_or_insert(DEFAULT_RANGE);
    true
}

/// Median, high and low of a series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendStats {
    /// Median, averaging the middle pair for even lengths
    pub median: f64,
    /// Largest sample
    pub high: f64,
    /// Smallest sample
    pub low: f64,
}

impl TrendStats {
    /// Computes the stats, or `None` for an empty series.
    pub fn compute(series: &[f64]) -> Option<Self> {
        if series.is_empty() {
            return None;
        }
        let mut sorted = series.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let mid = sorted.len() / 2;
        let median = if sorted.len() % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) / 2.0
        } else {
            sorted[mid]
        };
        Some(Self {
            median,
            high: sorted[sorted.len() - 1],
            low: sorted[0],
        })
    }
}

/// Sparkline points inside the `SPARKLINE_WIDTH` by `SPARKLINE_HEIGHT` box.
#[derive(Debug, Clone, PartialEq)]
pub struct Sparkline {
    /// Points, left to right, with y growing downwards
    pub points: Vec<Pos2>,
    /// y of the dashed reference line through the last value
    pub reference_y: f32,
}

impl Sparkline {
    /// Scales a series into the sparkline box.
    pub fn compute(series: &[f64]) -> Self {
        let (min, max) = min_max(series);
        let span = if max - min == 0.0 { 1.0 } else { max - min };
        let y_of = |v: f64| SPARKLINE_HEIGHT - ((v - min) / span) as f32 * SPARKLINE_HEIGHT;

        let last_index = series.len().saturating_sub(1);
        let points = series
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                let x = if series.len() == 1 {
                    SPARKLINE_WIDTH
                } else {
                    i as f32 / last_index as f32 * SPARKLINE_WIDTH
                };
                egui::pos2(x, y_of(v))
            })
            .collect();

        Self {
            points,
            reference_y: series.last().map(|&v| y_of(v)).unwrap_or(SPARKLINE_HEIGHT),
        }
    }
}

fn min_max(series: &[f64]) -> (f64, f64) {
    series
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}

/// Placement of the target band and current-value marker, in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetBand {
    /// Left edge of the band
    pub start: f64,
    /// Width of the band
    pub width: f64,
    /// Position of the current value
    pub marker: f64,
}

impl TargetBand {
    /// Places the band over the span covering the series, the band and the current value.
    pub fn compute(series: &[f64], current: f64) -> Self {
        let (lo, hi) = min_max(series);
        let min = lo.min(TARGET_MIN).min(current);
        let max = hi.max(TARGET_MAX).max(current);
        let span = if max - min == 0.0 { 1.0 } else { max - min };
        let pct = |v: f64| (v / span * 100.0).clamp(0.0, 100.0);
        Self {
            start: pct(TARGET_MIN - min),
            width: pct(TARGET_MAX - TARGET_MIN),
            marker: pct(current - min),
        }
    }
}

/// Sentence comparing the current value to the median and the target band.
pub fn summary(current: f64, stats: &TrendStats) -> String {
    let median_side = if current >= stats.median { "above" } else { "below" };
    let band = if current > TARGET_MAX {
        "above"
    } else if current < TARGET_MIN {
        "below"
    } else {
        "within"
    };
    format!("Current result is {median_side} your seasonal median and {band} crop target range.")
}
