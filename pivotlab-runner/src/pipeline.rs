//! End-to-end analysis pass: indicators, levels, rule and model events, and
//! forward evaluation of every event.

use std::collections::BTreeMap;

use pivotlab_core::components::{precompute, required_indicators, FeatureConfig, IndicatorValues};
use pivotlab_core::domain::{Bar, Level};
use pivotlab_core::evaluation::Evaluation;
use pivotlab_core::signals::{extract_rule_events, SignalEvent, TrainOutcome};
use pivotlab_core::strategy::Strategy;

use crate::config::AnalysisConfig;

/// Features computed for every pass so the crossover and RSI rules have
/// inputs even without a strategy bundle.
pub fn default_features() -> FeatureConfig {
    ["sma_20", "sma_50", "rsi_14"]
        .into_iter()
        .map(|name| (name.to_string(), BTreeMap::new()))
        .collect()
}

/// Compute every indicator `features` names. Entries naming no known
/// indicator are logged and skipped.
pub fn indicator_values(bars: &[Bar], features: &FeatureConfig) -> IndicatorValues {
    let (indicators, errors) = required_indicators(features);
    for error in &errors {
        tracing::warn!(error = %error, "skipping feature");
    }
    precompute(bars, &indicators)
}

/// Default features overlaid with the strategy's own selections.
pub fn features_for(strategy: Option<&Strategy>) -> FeatureConfig {
    let mut features = default_features();
    if let Some(strategy) = strategy {
        features.extend(strategy.feature_config.clone());
    }
    features
}

#[derive(Debug, Clone, Default)]
pub struct Analysis {
    pub levels: Vec<Level>,
    /// Rule and model events in bar order.
    pub events: Vec<SignalEvent>,
    pub evaluation: Evaluation,
}

/// Run one analysis pass.
pub fn analyze(bars: &[Bar], config: &AnalysisConfig, strategy: Option<&Strategy>) -> Analysis {
    let indicators = indicator_values(bars, &features_for(strategy));
    let levels = config.levels.analyze(bars);

    let mut events = extract_rule_events(bars, &indicators);
    if let Some(strategy) = strategy {
        events.extend(strategy.generate_all_signals(bars, &indicators));
    }
    // Stable: same-bar events keep rule-then-model order.
    events.sort_by_key(|e| e.index);

    let evaluation = config.evaluation.evaluate(bars, &events);
    tracing::info!(
        bars = bars.len(),
        levels = levels.len(),
        events = events.len(),
        win_rate = evaluation.win_rate(),
        "analysis complete"
    );

    Analysis {
        levels,
        events,
        evaluation,
    }
}

/// Train every trainable model of `strategy` on `bars`.
pub fn train_strategy(strategy: &mut Strategy, bars: &[Bar]) -> Vec<(String, TrainOutcome)> {
    let indicators = indicator_values(bars, &features_for(Some(strategy)));
    let outcomes = strategy.train_all(bars, &indicators);
    for (name, outcome) in &outcomes {
        match outcome {
            TrainOutcome::Trained { samples, features } => {
                tracing::info!(model = %name, samples, features, "model trained")
            }
            TrainOutcome::InsufficientData { samples } => {
                tracing::warn!(model = %name, samples, "model left untrained")
            }
        }
    }
    outcomes
}
