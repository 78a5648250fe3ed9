//! Price/indicator divergence.
//!
//! Bullish: two consecutive indicator lows where the indicator makes a higher
//! low while the close makes a lower low. Bearish: two consecutive indicator
//! highs where the indicator makes a lower high while the close makes a
//! higher high. Price is compared at the indicator's extremum bars.

use serde::{Deserialize, Serialize};

use crate::components::IndicatorValues;
use crate::domain::{column_values, Bar, BarColumn};

use super::event::SignalSeries;

fn default_indicator() -> String {
    "rsi_14".to_string()
}

fn default_lookback() -> usize {
    20
}

fn default_order() -> usize {
    5
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extremum {
    Min,
    Max,
}

/// Indices of strict local extrema.
///
/// `i` qualifies when `values[i]` is strictly below (`Min`) or above (`Max`)
/// every neighbour within `order` bars; neighbour indices outside the series
/// are clipped to the nearest end, so the first and last samples never
/// qualify. `NaN` never qualifies and disqualifies its neighbours.
pub fn relative_extrema(values: &[f64], order: usize, kind: Extremum) -> Vec<usize> {
    let n = values.len();
    let order = order.max(1);
    let beats = |a: f64, b: f64| match kind {
        Extremum::Min => a < b,
        Extremum::Max => a > b,
    };

    (0..n)
        .filter(|&i| {
            (1..=order).all(|k| {
                let before = i.saturating_sub(k);
                let after = (i + k).min(n - 1);
                beats(values[i], values[before]) && beats(values[i], values[after])
            })
        })
        .collect()
}

/// Divergence detector configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DivergenceModel {
    pub name: String,
    /// Indicator series name, e.g. `rsi_14`.
    #[serde(default = "default_indicator")]
    pub indicator: String,
    /// Maximum bar distance between the two extrema compared.
    #[serde(default = "default_lookback")]
    pub lookback: usize,
    /// Neighbourhood half-width for extremum detection.
    #[serde(default = "default_order")]
    pub order: usize,
}

impl DivergenceModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            indicator: default_indicator(),
            lookback: default_lookback(),
            order: default_order(),
        }
    }

    pub fn with_indicator(mut self, indicator: impl Into<String>) -> Self {
        self.indicator = indicator.into();
        self
    }

    /// `+1` on bullish, `-1` on bearish divergence bars. All zeros when the
    /// indicator is missing.
    pub fn generate_signals(&self, bars: &[Bar], indicators: &IndicatorValues) -> SignalSeries {
        let n = bars.len();
        let mut signals = vec![0i8; n];
        let Some(series) = indicators
            .get_series(&self.indicator)
            .or_else(|| indicators.get_series(&self.indicator.to_ascii_lowercase()))
        else {
            tracing::debug!(model = %self.name, indicator = %self.indicator, "indicator missing");
            return signals;
        };

        let indicator = &series[..series.len().min(n)];
        let closes = column_values(bars, BarColumn::Close);

        for (kind, flag) in [(Extremum::Min, 1i8), (Extremum::Max, -1i8)] {
            let price_ext = relative_extrema(&closes, self.order, kind);
            let ind_ext = relative_extrema(indicator, self.order, kind);
            if price_ext.len() < 2 || ind_ext.len() < 2 {
                continue;
            }

            for pair in ind_ext.windows(2) {
                let (prev, curr) = (pair[0], pair[1]);
                if curr - prev > self.lookback {
                    continue;
                }
                let diverges = match kind {
                    Extremum::Min => {
                        indicator[curr] > indicator[prev] && closes[curr] < closes[prev]
                    }
                    Extremum::Max => {
                        indicator[curr] < indicator[prev] && closes[curr] > closes[prev]
                    }
                };
                if diverges {
                    signals[curr] = flag;
                }
            }
        }
        signals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    #[test]
    fn extrema_clip_at_edges() {
        let v = [1.0, 3.0, 2.0, 5.0, 0.5, 4.0];
        assert_eq!(relative_extrema(&v, 1, Extremum::Min), vec![2, 4]);
        assert_eq!(relative_extrema(&v, 1, Extremum::Max), vec![1, 3]);
        // order 2: index 4 must beat 2,3,5 and the clipped 5 again
        assert_eq!(relative_extrema(&v, 2, Extremum::Min), vec![4]);
    }

    #[test]
    fn extrema_reject_ties_and_nan() {
        let v = [3.0, 1.0, 1.0, 3.0, f64::NAN, 0.0, 2.0];
        assert!(relative_extrema(&v, 1, Extremum::Min).is_empty());
    }

    /// Two price lows (100 then 95) with indicator lows rising (20 then 30).
    fn bullish_fixture() -> (Vec<Bar>, IndicatorValues) {
        let closes = [
            110.0, 108.0, 100.0, 108.0, 110.0, 109.0, 107.0, 95.0, 107.0, 109.0, 110.0,
        ];
        let rsi = vec![
            50.0, 40.0, 20.0, 40.0, 50.0, 48.0, 45.0, 30.0, 45.0, 48.0, 50.0,
        ];
        let iv: IndicatorValues = vec![("rsi_14", rsi)].into_iter().collect();
        (make_bars(&closes), iv)
    }

    fn model() -> DivergenceModel {
        DivergenceModel {
            order: 2,
            ..DivergenceModel::new("div")
        }
    }

    #[test]
    fn bullish_divergence_flags_second_low() {
        let (bars, iv) = bullish_fixture();
        let signals = model().generate_signals(&bars, &iv);
        assert_eq!(signals.len(), bars.len());
        assert_eq!(signals[7], 1);
        assert_eq!(signals.iter().filter(|&&s| s != 0).count(), 1);
    }

    #[test]
    fn lookback_limits_distance() {
        let (bars, iv) = bullish_fixture();
        let m = DivergenceModel {
            lookback: 4,
            ..model()
        };
        assert!(m.generate_signals(&bars, &iv).iter().all(|&s| s == 0));
    }

    #[test]
    fn bearish_divergence_mirrors() {
        let closes: Vec<f64> = [
            110.0, 108.0, 100.0, 108.0, 110.0, 109.0, 107.0, 95.0, 107.0, 109.0, 110.0,
        ]
        .iter()
        .map(|c| 220.0 - c)
        .collect();
        let rsi: Vec<f64> = [
            50.0, 40.0, 20.0, 40.0, 50.0, 48.0, 45.0, 30.0, 45.0, 48.0, 50.0,
        ]
        .iter()
        .map(|r| 100.0 - r)
        .collect();
        let iv: IndicatorValues = vec![("rsi_14", rsi)].into_iter().collect();

        let signals = model().generate_signals(&make_bars(&closes), &iv);
        assert_eq!(signals[7], -1);
        assert_eq!(signals.iter().filter(|&&s| s != 0).count(), 1);
    }

    #[test]
    fn missing_indicator_is_all_zero() {
        let (bars, _) = bullish_fixture();
        let signals = model().generate_signals(&bars, &IndicatorValues::new());
        assert_eq!(signals, vec![0; bars.len()]);
    }

    #[test]
    fn indicator_name_lookup_is_case_tolerant() {
        let (bars, iv) = bullish_fixture();
        let m = model().with_indicator("RSI_14");
        assert_eq!(m.generate_signals(&bars, &iv)[7], 1);
    }
}
