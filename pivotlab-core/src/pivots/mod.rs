//! Pivot detection: three interchangeable turning-point scanners.
//!
//! Every detector consumes a bar slice and returns pivots in scan order (not
//! sorted by price). A series too short for the chosen window yields an empty
//! list, never an error.

pub mod fractal;
pub mod smoothed;
pub mod zigzag;

pub use fractal::fractal_pivots;
pub use smoothed::{savgol_smooth, smoothed_pivots};
pub use zigzag::zigzag_pivots;

use serde::{Deserialize, Serialize};

use crate::domain::{Bar, Pivot, PivotKind};

/// Half-width of the raw High/Low window used to measure a pivot's swing.
pub const SWING_WINDOW: usize = 5;

fn default_deviation_pct() -> f64 {
    0.015
}

fn default_smoothing_window() -> usize {
    5
}

fn default_polyorder() -> usize {
    3
}

fn default_fractal_window() -> usize {
    2
}

/// Pivot detection algorithm and its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum PivotMethod {
    /// Deviation-filtered alternating swing points.
    #[serde(rename = "zigzag")]
    ZigZag {
        #[serde(default = "default_deviation_pct")]
        deviation_pct: f64,
    },
    /// Extrema of Savitzky-Golay smoothed High/Low.
    Smoothed {
        #[serde(default = "default_smoothing_window")]
        window: usize,
        #[serde(default = "default_polyorder")]
        polyorder: usize,
        #[serde(default)]
        min_swing_pct: Option<f64>,
    },
    /// Bill Williams fractals with `window` bars on each side.
    Fractal {
        #[serde(default = "default_fractal_window")]
        window: usize,
        #[serde(default)]
        min_swing_pct: Option<f64>,
    },
}

impl Default for PivotMethod {
    fn default() -> Self {
        Self::ZigZag {
            deviation_pct: default_deviation_pct(),
        }
    }
}

impl PivotMethod {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ZigZag { .. } => "zigzag",
            Self::Smoothed { .. } => "smoothed",
            Self::Fractal { .. } => "fractal",
        }
    }
}

/// Run the configured detector.
pub fn detect_pivots(bars: &[Bar], method: &PivotMethod) -> Vec<Pivot> {
    let pivots = match *method {
        PivotMethod::ZigZag { deviation_pct } => zigzag_pivots(bars, deviation_pct),
        PivotMethod::Smoothed {
            window,
            polyorder,
            min_swing_pct,
        } => filter_by_swing(bars, smoothed_pivots(bars, window, polyorder), min_swing_pct),
        PivotMethod::Fractal {
            window,
            min_swing_pct,
        } => filter_by_swing(bars, fractal_pivots(bars, window), min_swing_pct),
    };
    tracing::debug!(
        method = method.name(),
        bars = bars.len(),
        pivots = pivots.len(),
        "pivots detected"
    );
    pivots
}

/// Drop pivots whose local swing is below `min_swing_pct`.
///
/// `None` or a non-positive threshold disables the filter.
pub fn filter_by_swing(bars: &[Bar], pivots: Vec<Pivot>, min_swing_pct: Option<f64>) -> Vec<Pivot> {
    match min_swing_pct {
        Some(pct) if pct > 0.0 => pivots
            .into_iter()
            .filter(|p| swing_pct(bars, p) >= pct)
            .collect(),
        _ => pivots,
    }
}

/// Relative move from the pivot to the opposite extreme of the raw bars in
/// `[index - SWING_WINDOW, index + SWING_WINDOW]`.
///
/// Support pivots measure up to the highest High, resistance pivots down to
/// the lowest Low. Non-positive pivot prices measure as 0.
pub fn swing_pct(bars: &[Bar], pivot: &Pivot) -> f64 {
    if bars.is_empty() || pivot.price <= 0.0 {
        return 0.0;
    }
    let start = pivot.index.saturating_sub(SWING_WINDOW);
    let end = (pivot.index + SWING_WINDOW).min(bars.len() - 1);
    let window = &bars[start..=end];

    match pivot.kind {
        PivotKind::Support => {
            let highest = window.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
            (highest - pivot.price) / pivot.price
        }
        PivotKind::Resistance => {
            let lowest = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
            (pivot.price - lowest) / pivot.price
        }
    }
}

/// Synthetic bars with explicit highs and lows; close is the midpoint.
#[cfg(test)]
pub(crate) fn bars_from_high_low(highs: &[f64], lows: &[f64]) -> Vec<Bar> {
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    highs
        .iter()
        .zip(lows)
        .enumerate()
        .map(|(i, (&high, &low))| {
            let mid = (high + low) / 2.0;
            Bar {
                timestamp: base + chrono::Duration::days(i as i64),
                open: mid,
                high,
                low,
                close: mid,
                volume: 1000.0,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_serde_defaults() {
        let m: PivotMethod = from_json(r#"{"method":"fractal"}"#);
        assert_eq!(
            m,
            PivotMethod::Fractal {
                window: 2,
                min_swing_pct: None
            }
        );
        let m: PivotMethod = from_json(r#"{"method":"smoothed","window":7}"#);
        assert_eq!(
            m,
            PivotMethod::Smoothed {
                window: 7,
                polyorder: 3,
                min_swing_pct: None
            }
        );
        assert_eq!(PivotMethod::default().name(), "zigzag");
    }

    fn from_json(json: &str) -> PivotMethod {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn swing_measures_opposite_extreme() {
        let highs = [12.0, 11.0, 10.5, 11.5, 13.0];
        let lows = [11.0, 10.0, 9.0, 10.0, 12.0];
        let bars = bars_from_high_low(&highs, &lows);

        let support = Pivot::support(9.0, 2);
        assert!((swing_pct(&bars, &support) - 4.0 / 9.0).abs() < 1e-12);

        let resistance = Pivot::resistance(13.0, 4);
        assert!((swing_pct(&bars, &resistance) - 4.0 / 13.0).abs() < 1e-12);
    }

    #[test]
    fn swing_filter_drops_shallow_pivots() {
        let highs = [10.2, 10.1, 10.05, 10.1, 10.2];
        let lows = [10.0, 9.95, 9.9, 9.95, 10.0];
        let bars = bars_from_high_low(&highs, &lows);
        let pivots = vec![Pivot::support(9.9, 2)];

        assert!(filter_by_swing(&bars, pivots.clone(), Some(0.05)).is_empty());
        assert_eq!(filter_by_swing(&bars, pivots.clone(), Some(0.01)).len(), 1);
        assert_eq!(filter_by_swing(&bars, pivots.clone(), None).len(), 1);
        assert_eq!(filter_by_swing(&bars, pivots, Some(0.0)).len(), 1);
    }

    #[test]
    fn detect_dispatches_and_keeps_indices_in_range() {
        let highs: Vec<f64> = (0..40).map(|i| 101.0 + (i as f64 * 0.5).sin() * 8.0).collect();
        let lows: Vec<f64> = highs.iter().map(|h| h - 2.0).collect();
        let bars = bars_from_high_low(&highs, &lows);

        for method in [
            PivotMethod::default(),
            PivotMethod::Smoothed {
                window: 5,
                polyorder: 3,
                min_swing_pct: None,
            },
            PivotMethod::Fractal {
                window: 2,
                min_swing_pct: Some(0.01),
            },
        ] {
            let pivots = detect_pivots(&bars, &method);
            assert!(!pivots.is_empty(), "{} found nothing", method.name());
            assert!(pivots.iter().all(|p| p.index < bars.len()));
        }
    }
}
