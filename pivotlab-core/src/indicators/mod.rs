//! Reference indicator implementations.
//!
//! The analysis core treats indicator series as opaque input; these three
//! exist so the runner can build the series a strategy bundle asks for.
//! Each works on a chosen bar column (close by default) and exposes a
//! `*_of_series` helper for arbitrary `f64` slices.

pub mod ema;
pub mod rsi;
pub mod sma;

pub use ema::{ema_of_series, Ema};
pub use rsi::{rsi_of_series, Rsi};
pub use sma::{sma_of_series, Sma};

use crate::domain::BarColumn;

/// Indicator name: `sma_20` on close, `sma_20_high` on another column.
pub(crate) fn indicator_name(prefix: &str, period: usize, source: BarColumn) -> String {
    match source {
        BarColumn::Close => format!("{prefix}_{period}"),
        other => format!("{prefix}_{period}_{}", format!("{other:?}").to_ascii_lowercase()),
    }
}

/// Create synthetic bars from close prices for testing.
///
/// Generates plausible OHLV: open = prev_close (or close for first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<crate::domain::Bar> {
    use crate::domain::Bar;
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                timestamp: base + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
