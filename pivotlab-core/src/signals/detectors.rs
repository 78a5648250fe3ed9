//! Stateless crossover/threshold detectors over aligned numeric series.
//!
//! Comparisons involving `NaN` are false, so undefined values never fire.

use super::event::SignalSeries;

/// `+1` where `s1` crosses above `s2`, `-1` where it crosses below.
///
/// Both inputs are forward-filled onto a common index of length
/// `max(len1, len2)` first; a shorter series repeats its last value. A cross
/// needs the previous bar to be at or on the other side (`<=` / `>=`) and the
/// current bar strictly past. Index 0 is always 0.
pub fn detect_crossover(s1: &[f64], s2: &[f64]) -> SignalSeries {
    let len = s1.len().max(s2.len());
    let a = forward_fill(s1, len);
    let b = forward_fill(s2, len);

    let mut out = vec![0i8; len];
    for i in 1..len {
        out[i] = cross_flag(a[i - 1], a[i], b[i - 1], b[i]);
    }
    out
}

/// `+1` where `series` crosses up through `level`, `-1` where it crosses
/// down. No forward fill: a `NaN` on either side of a bar suppresses it.
pub fn detect_threshold(series: &[f64], level: f64) -> SignalSeries {
    let mut out = vec![0i8; series.len()];
    for i in 1..series.len() {
        out[i] = cross_flag(series[i - 1], series[i], level, level);
    }
    out
}

/// `1` on every bar where `series > level`, else `0`.
pub fn detect_price_above_level(series: &[f64], level: f64) -> SignalSeries {
    series.iter().map(|&v| i8::from(v > level)).collect()
}

fn cross_flag(prev_a: f64, curr_a: f64, prev_b: f64, curr_b: f64) -> i8 {
    if prev_a <= prev_b && curr_a > curr_b {
        1
    } else if prev_a >= prev_b && curr_a < curr_b {
        -1
    } else {
        0
    }
}

/// Copy `values` into a vector of length `len`, replacing `NaN` and missing
/// tail entries with the last defined value. Leading `NaN`s stay `NaN`.
fn forward_fill(values: &[f64], len: usize) -> Vec<f64> {
    let mut out = Vec::with_capacity(len);
    let mut last = f64::NAN;
    for i in 0..len {
        match values.get(i) {
            Some(v) if !v.is_nan() => {
                last = *v;
                out.push(*v);
            }
            _ => out.push(last),
        }
    }
    out
}
