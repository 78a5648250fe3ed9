//! Indicator trait and the named indicator series container.
//!
//! Indicators are pure functions: bar history in, numeric series out. The
//! signal layer never computes indicators itself; it reads them by name from
//! an `IndicatorValues` map built once per analysis pass.

use crate::domain::Bar;
use std::collections::BTreeMap;

/// Trait for indicators.
///
/// Indicators take a full bar series and produce a numeric output series of
/// the same length. The first `lookback()` values should be `f64::NAN` (warmup).
///
/// # Look-ahead contamination guard
/// No indicator value at bar t may depend on price data from bar t+1 or later.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_20", "rsi_14").
    fn name(&self) -> &str;

    /// Number of bars needed before the indicator produces valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    ///
    /// Returns a `Vec<f64>` of the same length as `bars`.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

/// Named indicator series aligned 1:1 with a bar series.
///
/// Keys are kept in name order so that rules picking "the first two moving
/// averages" are deterministic. `NaN` entries mean "undefined".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorValues {
    series: BTreeMap<String, Vec<f64>>,
}

impl IndicatorValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a named indicator series, replacing any previous one.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        self.series.insert(name.into(), values);
    }

    /// Get the indicator value at a specific bar index.
    pub fn get(&self, name: &str, bar_index: usize) -> Option<f64> {
        self.series
            .get(name)
            .and_then(|v| v.get(bar_index).copied())
    }

    /// Get the full series for a named indicator.
    pub fn get_series(&self, name: &str) -> Option<&[f64]> {
        self.series.get(name).map(|v| v.as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.series.contains_key(name)
    }

    /// Series names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(|k| k.as_str())
    }

    /// Number of indicator series stored.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Vec<f64>)> for IndicatorValues {
    fn from_iter<T: IntoIterator<Item = (K, Vec<f64>)>>(iter: T) -> Self {
        let mut iv = Self::new();
        for (name, values) in iter {
            iv.insert(name, values);
        }
        iv
    }
}

/// Compute every indicator once over `bars`.
pub fn precompute(bars: &[Bar], indicators: &[Box<dyn Indicator>]) -> IndicatorValues {
    let mut iv = IndicatorValues::new();
    for indicator in indicators {
        let series = indicator.compute(bars);
        debug_assert_eq!(
            series.len(),
            bars.len(),
            "indicator '{}' produced {} values for {} bars",
            indicator.name(),
            series.len(),
            bars.len(),
        );
        iv.insert(indicator.name(), series);
    }
    tracing::debug!(count = iv.len(), bars = bars.len(), "indicators precomputed");
    iv
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{make_bars, Ema, Sma};

    #[test]
    fn indicator_values_insert_and_get() {
        let mut iv = IndicatorValues::new();
        iv.insert(
            "sma_20",
            vec![f64::NAN; 19]
                .into_iter()
                .chain(vec![100.0, 101.0])
                .collect(),
        );
        assert!(iv.get("sma_20", 0).unwrap().is_nan());
        assert_eq!(iv.get("sma_20", 19), Some(100.0));
        assert_eq!(iv.get("sma_20", 20), Some(101.0));
        assert_eq!(iv.get("sma_20", 21), None); // out of bounds
    }

    #[test]
    fn indicator_values_missing_name() {
        let iv = IndicatorValues::new();
        assert_eq!(iv.get("nonexistent", 0), None);
        assert!(!iv.contains("nonexistent"));
    }

    #[test]
    fn names_are_sorted() {
        let iv: IndicatorValues = vec![
            ("sma_50", vec![1.0]),
            ("ema_10", vec![1.0]),
            ("rsi_14", vec![1.0]),
        ]
        .into_iter()
        .collect();
        let names: Vec<&str> = iv.names().collect();
        assert_eq!(names, vec!["ema_10", "rsi_14", "sma_50"]);
        assert_eq!(iv.len(), 3);
    }

    #[test]
    fn precompute_multiple_indicators() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0]);
        let indicators: Vec<Box<dyn Indicator>> =
            vec![Box::new(Sma::new(3)), Box::new(Ema::new(3))];
        let iv = precompute(&bars, &indicators);

        assert_eq!(iv.len(), 2);
        assert_eq!(iv.get_series("sma_3").unwrap().len(), 5);
        // SMA[2] = mean(10,11,12) = 11.0
        assert!((iv.get("sma_3", 2).unwrap() - 11.0).abs() < 1e-10);
        assert!(iv.get("ema_3", 1).unwrap().is_nan());
    }
}
