//! Bill Williams fractal pivots.
//!
//! A support fractal is a Low strictly below the Lows of the `window` bars on
//! each side; a resistance fractal is a High strictly above the neighbouring
//! Highs. Equal values disqualify. The classic pattern is `window = 2`
//! (five bars).

use crate::domain::{Bar, Pivot};

pub fn fractal_pivots(bars: &[Bar], window: usize) -> Vec<Pivot> {
    let window = window.max(1);
    let n = bars.len();
    let mut pivots = Vec::new();
    if n < 2 * window + 1 {
        return pivots;
    }

    for i in window..n - window {
        let neighbours = (1..=window).flat_map(|j| [&bars[i - j], &bars[i + j]]);

        let low = bars[i].low;
        if neighbours.clone().all(|b| low < b.low) {
            pivots.push(Pivot::support(low, i));
        }

        let high = bars[i].high;
        if neighbours.clone().all(|b| high > b.high) {
            pivots.push(Pivot::resistance(high, i));
        }
    }
    pivots
}
