//! Smoothed-extrema pivots.
//!
//! High and Low are smoothed with a Savitzky-Golay filter (a least-squares
//! polynomial fit over a sliding odd-length window). A bar is a support pivot
//! when its smoothed Low is the minimum of the surrounding window, and a
//! resistance pivot when its smoothed High is the maximum. The pivot price is
//! the raw Low/High of that bar.

use crate::domain::{column_values, Bar, BarColumn, Pivot};

/// Detect pivots on smoothed High/Low.
///
/// An even `window` is bumped to the next odd value. Returns an empty list when
/// the series is not longer than the window.
pub fn smoothed_pivots(bars: &[Bar], window: usize, polyorder: usize) -> Vec<Pivot> {
    let window = odd_window(window);
    let n = bars.len();
    if n <= window {
        return Vec::new();
    }

    let lows = column_values(bars, BarColumn::Low);
    let highs = column_values(bars, BarColumn::High);
    let smooth_low = savgol_smooth(&lows, window, polyorder);
    let smooth_high = savgol_smooth(&highs, window, polyorder);

    let half = window / 2;
    let mut pivots = Vec::new();
    for i in half..n - half {
        let span = (i - half)..=(i + half);

        let lowest = smooth_low[span.clone()]
            .iter()
            .copied()
            .fold(f64::INFINITY, f64::min);
        if smooth_low[i] == lowest {
            pivots.push(Pivot::support(lows[i], i));
        }

        let highest = smooth_high[span]
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        if smooth_high[i] == highest {
            pivots.push(Pivot::resistance(highs[i], i));
        }
    }
    pivots
}

fn odd_window(window: usize) -> usize {
    let window = window.max(1);
    if window % 2 == 0 {
        window + 1
    } else {
        window
    }
}

/// Savitzky-Golay smoothing.
///
/// Interior samples use the centred convolution weights. The first and last
/// `window / 2` samples are evaluated from the polynomial fitted to the first
/// and last full window. `polyorder` is clamped to `window - 1`. If the input
/// is shorter than the window, or the fit is degenerate, the input is returned
/// unchanged.
pub fn savgol_smooth(values: &[f64], window: usize, polyorder: usize) -> Vec<f64> {
    let window = odd_window(window);
    let n = values.len();
    if n < window || window == 1 {
        return values.to_vec();
    }
    let polyorder = polyorder.min(window - 1);
    let half = window / 2;

    let mut weights_at = Vec::with_capacity(window);
    for pos in 0..window {
        match savgol_weights(window, polyorder, pos as f64 - half as f64) {
            Some(w) => weights_at.push(w),
            None => return values.to_vec(),
        }
    }

    let apply = |weights: &[f64], start: usize| -> f64 {
        weights
            .iter()
            .zip(&values[start..start + window])
            .map(|(w, v)| w * v)
            .sum()
    };

    let mut out = vec![0.0; n];
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = if i < half {
            apply(&weights_at[i], 0)
        } else if i >= n - half {
            let start = n - window;
            apply(&weights_at[i - start], start)
        } else {
            apply(&weights_at[half], i - half)
        };
    }
    out
}

/// Weights `w` such that `sum(w[j] * y[j])` is the least-squares polynomial of
/// degree `polyorder`, fitted to `window` samples at offsets `-half..=half`,
/// evaluated at offset `at`.
fn savgol_weights(window: usize, polyorder: usize, at: f64) -> Option<Vec<f64>> {
    let m = polyorder + 1;
    let half = (window / 2) as f64;
    let xs: Vec<f64> = (0..window).map(|j| j as f64 - half).collect();

    // Normal matrix AᵀA with A[j][k] = x_j^k.
    let mut normal = vec![vec![0.0; m]; m];
    for (r, row) in normal.iter_mut().enumerate() {
        for (c, cell) in row.iter_mut().enumerate() {
            *cell = xs.iter().map(|x| x.powi((r + c) as i32)).sum();
        }
    }
    let rhs: Vec<f64> = (0..m).map(|k| at.powi(k as i32)).collect();
    let coef = solve_linear(normal, rhs)?;

    Some(
        xs.iter()
            .map(|x| {
                coef.iter()
                    .enumerate()
                    .map(|(k, c)| c * x.powi(k as i32))
                    .sum()
            })
            .collect(),
    )
}

/// Gaussian elimination with partial pivoting. `None` if singular.
fn solve_linear(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot_row = (col..n).max_by(|&r1, &r2| a[r1][col].abs().total_cmp(&a[r2][col].abs()))?;
        if a[pivot_row][col].abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot_row);
        b.swap(col, pivot_row);

        for row in (col + 1)..n {
            let factor = a[row][col] / a[col][col];
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = ((row + 1)..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Some(x)
}
