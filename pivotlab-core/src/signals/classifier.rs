//! Supervised signal model: a random forest predicting the sign of the
//! forward return from a chosen set of feature columns.
//!
//! Labels are `+1` when the close `target_window` bars ahead is more than
//! `target_threshold` above today's close, `-1` when it is more than that
//! below, else `0`.

use serde::{Deserialize, Serialize};

use crate::components::IndicatorValues;
use crate::domain::{column_values, Bar, BarColumn};

use super::event::SignalSeries;
use super::forest::{ForestConfig, TrainedForest};

/// Fewest labelled rows a forest is fitted on.
pub const MIN_TRAINING_SAMPLES: usize = 10;

fn default_target_window() -> usize {
    5
}

fn default_target_threshold() -> f64 {
    0.01
}

/// Untrained part of a classifier model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    pub name: String,
    /// Indicator series names or raw bar columns (`close`, `volume`, ...).
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default = "default_target_window")]
    pub target_window: usize,
    #[serde(default = "default_target_threshold")]
    pub target_threshold: f64,
    #[serde(default)]
    pub forest: ForestConfig,
}

impl ClassifierConfig {
    pub fn new(name: impl Into<String>, features: Vec<String>) -> Self {
        Self {
            name: name.into(),
            features,
            target_window: default_target_window(),
            target_threshold: default_target_threshold(),
            forest: ForestConfig::default(),
        }
    }
}

/// Result of a training attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainOutcome {
    Trained { samples: usize, features: usize },
    /// Too few labelled rows (or no resolvable feature); the model was left
    /// as it was.
    InsufficientData { samples: usize },
}

impl TrainOutcome {
    pub fn is_trained(&self) -> bool {
        matches!(self, Self::Trained { .. })
    }
}

/// Classifier config plus its fitted forest, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierModel {
    #[serde(flatten)]
    pub config: ClassifierConfig,
    #[serde(default)]
    pub trained: Option<TrainedForest>,
}

impl ClassifierModel {
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            config,
            trained: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn is_trained(&self) -> bool {
        self.trained.is_some()
    }

    /// Fit the forest on every labelled row of `bars`.
    pub fn train(&mut self, bars: &[Bar], indicators: &IndicatorValues) -> TrainOutcome {
        let columns = resolve_features(&self.config.features, bars, indicators);
        if columns.is_empty() {
            tracing::warn!(model = %self.config.name, "no configured feature could be resolved");
            return TrainOutcome::InsufficientData { samples: 0 };
        }

        let rows = feature_rows(&columns, bars.len());
        let closes = column_values(bars, BarColumn::Close);
        let mut x = Vec::with_capacity(rows.len());
        let mut y = Vec::with_capacity(rows.len());
        for (index, row) in rows {
            if let Some(label) = label_at(
                &closes,
                index,
                self.config.target_window,
                self.config.target_threshold,
            ) {
                x.push(row);
                y.push(label);
            }
        }

        if x.len() < MIN_TRAINING_SAMPLES {
            tracing::warn!(
                model = %self.config.name,
                samples = x.len(),
                required = MIN_TRAINING_SAMPLES,
                "not enough data to train"
            );
            return TrainOutcome::InsufficientData { samples: x.len() };
        }

        let names: Vec<String> = columns.into_iter().map(|(name, _)| name).collect();
        let features = names.len();
        let samples = x.len();
        self.trained = Some(TrainedForest::fit(&self.config.forest, names, &x, &y));
        tracing::info!(model = %self.config.name, samples, features, "classifier trained");
        TrainOutcome::Trained { samples, features }
    }

    /// Predicted class per bar; `0` where the model is untrained, a feature
    /// is missing, or a row has an undefined value.
    pub fn generate_signals(&self, bars: &[Bar], indicators: &IndicatorValues) -> SignalSeries {
        let mut signals = vec![0i8; bars.len()];
        let Some(forest) = &self.trained else {
            return signals;
        };

        let columns = resolve_features(&forest.feature_names, bars, indicators);
        if columns.len() != forest.feature_names.len() {
            tracing::debug!(model = %self.config.name, "trained feature missing at inference");
            return signals;
        }

        for (index, row) in feature_rows(&columns, bars.len()) {
            signals[index] = forest.predict(&row);
        }
        signals
    }
}

/// Look up each feature as an indicator series, then as a raw bar column.
/// Unresolvable names are dropped.
fn resolve_features(
    names: &[String],
    bars: &[Bar],
    indicators: &IndicatorValues,
) -> Vec<(String, Vec<f64>)> {
    names
        .iter()
        .filter_map(|name| {
            let values = match indicators.get_series(name) {
                Some(series) => series.to_vec(),
                None => column_values(bars, BarColumn::from_name(name)?),
            };
            Some((name.clone(), values))
        })
        .collect()
}

/// Rows `0..n` where every column is defined, with their bar index.
fn feature_rows(columns: &[(String, Vec<f64>)], n: usize) -> Vec<(usize, Vec<f64>)> {
    (0..n)
        .filter_map(|i| {
            let row: Option<Vec<f64>> = columns
                .iter()
                .map(|(_, values)| values.get(i).copied().filter(|v| !v.is_nan()))
                .collect();
            row.map(|r| (i, r))
        })
        .collect()
}

/// Forward-return label at `index`, or `None` past the labelled range.
fn label_at(closes: &[f64], index: usize, window: usize, threshold: f64) -> Option<i8> {
    let entry = *closes.get(index)?;
    let future = *index.checked_add(window).and_then(|j| closes.get(j))?;
    if entry <= 0.0 {
        return None;
    }
    let change = (future - entry) / entry;
    Some(if change > threshold {
        1
    } else if change < -threshold {
        -1
    } else {
        0
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    fn wave_closes(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + (i as f64 * 0.3).sin() * 10.0)
            .collect()
    }

    fn small_forest(features: &[&str]) -> ClassifierConfig {
        let mut config =
            ClassifierConfig::new("clf", features.iter().map(|s| s.to_string()).collect());
        config.forest.n_trees = 15;
        config
    }

    #[test]
    fn labels() {
        let closes = [100.0, 100.5, 102.0, 98.0];
        assert_eq!(label_at(&closes, 0, 1, 0.01), Some(0));
        assert_eq!(label_at(&closes, 0, 2, 0.01), Some(1));
        assert_eq!(label_at(&closes, 0, 3, 0.01), Some(-1));
        assert_eq!(label_at(&closes, 1, 3, 0.01), None);
        assert_eq!(label_at(&closes, 2, usize::MAX, 0.01), None);
    }

    #[test]
    fn oversized_target_window_refuses_training() {
        let bars = make_bars(&wave_closes(40));
        let mut config = small_forest(&["close"]);
        config.target_window = usize::MAX;
        let mut model = ClassifierModel::new(config);
        assert_eq!(
            model.train(&bars, &IndicatorValues::new()),
            TrainOutcome::InsufficientData { samples: 0 }
        );
        assert!(!model.is_trained());
    }

    #[test]
    fn too_few_rows_stay_untrained() {
        let bars = make_bars(&wave_closes(14));
        let mut model = ClassifierModel::new(small_forest(&["close"]));
        // 14 bars with a 5-bar window leaves 9 labelled rows.
        assert_eq!(
            model.train(&bars, &IndicatorValues::new()),
            TrainOutcome::InsufficientData { samples: 9 }
        );
        assert!(!model.is_trained());
        assert_eq!(
            model.generate_signals(&bars, &IndicatorValues::new()),
            vec![0; 14]
        );
    }

    #[test]
    fn unresolvable_features_refuse_training() {
        let bars = make_bars(&wave_closes(60));
        let mut model = ClassifierModel::new(small_forest(&["macd", "sentiment"]));
        assert!(!model.train(&bars, &IndicatorValues::new()).is_trained());
    }

    #[test]
    fn trains_on_indicator_and_raw_columns() {
        let closes = wave_closes(120);
        let bars = make_bars(&closes);
        let momentum: Vec<f64> = (0..closes.len())
            .map(|i| if i < 3 { f64::NAN } else { closes[i] - closes[i - 3] })
            .collect();
        let iv: IndicatorValues = vec![("mom_3", momentum)].into_iter().collect();

        let mut model = ClassifierModel::new(small_forest(&["mom_3", "Close", "unknown"]));
        let outcome = model.train(&bars, &iv);
        // rows 3..=114 are both defined and labelled
        assert_eq!(
            outcome,
            TrainOutcome::Trained {
                samples: 112,
                features: 2
            }
        );

        let signals = model.generate_signals(&bars, &iv);
        assert_eq!(signals.len(), bars.len());
        assert!(signals[..3].iter().all(|&s| s == 0));
        assert!(signals.iter().all(|s| (-1..=1).contains(s)));
        assert!(signals.iter().any(|&s| s != 0));
    }

    #[test]
    fn missing_feature_at_inference_yields_zeros() {
        let closes = wave_closes(80);
        let bars = make_bars(&closes);
        let iv: IndicatorValues = vec![("level", closes.clone())].into_iter().collect();

        let mut model = ClassifierModel::new(small_forest(&["level"]));
        assert!(model.train(&bars, &iv).is_trained());
        assert_eq!(
            model.generate_signals(&bars, &IndicatorValues::new()),
            vec![0; 80]
        );
    }

    #[test]
    fn serialized_model_keeps_forest() {
        let bars = make_bars(&wave_closes(60));
        let mut model = ClassifierModel::new(small_forest(&["close", "volume"]));
        model.train(&bars, &IndicatorValues::new());

        let json = serde_json::to_value(&model).unwrap();
        assert_eq!(json["name"], "clf");
        assert_eq!(json["target_window"], 5);
        let back: ClassifierModel = serde_json::from_value(json).unwrap();
        assert_eq!(back, model);
        assert_eq!(
            back.generate_signals(&bars, &IndicatorValues::new()),
            model.generate_signals(&bars, &IndicatorValues::new())
        );
    }

    #[test]
    fn config_defaults_when_deserializing() {
        let model: ClassifierModel =
            serde_json::from_str(r#"{"name":"m","features":["close"]}"#).unwrap();
        assert_eq!(model.config.target_window, 5);
        assert_eq!(model.config.target_threshold, 0.01);
        assert_eq!(model.config.forest.n_trees, 100);
        assert!(!model.is_trained());
    }
}
