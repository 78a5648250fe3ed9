//! Strategy bundle: named feature selections plus the signal models that
//! consume them.
//!
//! Bundles serialize to a JSON object
//! `{ "name", "feature_config", "models": [ { "type": .., .. } ] }`. Model
//! entries go through the model registry; entries it rejects are skipped with
//! a warning so one stale entry does not make the whole bundle unreadable.

use serde_json::{json, Value};
use thiserror::Error;

use crate::components::{required_indicators, FactoryError, FeatureConfig, Indicator, IndicatorValues};
use crate::domain::Bar;
use crate::signals::{events_from_series, ModelError, SignalEvent, SignalModel, TrainOutcome};

#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("strategy JSON has no \"name\" string")]
    MissingName,

    #[error("invalid feature_config: {0}")]
    FeatureConfig(#[source] serde_json::Error),

    #[error(transparent)]
    Model(#[from] ModelError),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Strategy {
    pub name: String,
    /// Indicator name → parameters.
    pub feature_config: FeatureConfig,
    pub models: Vec<SignalModel>,
}

impl Strategy {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Add a model, replacing any model with the same name. The new model
    /// goes to the end of the list.
    pub fn add_model(&mut self, model: impl Into<SignalModel>) {
        let model = model.into();
        self.models.retain(|m| m.name() != model.name());
        self.models.push(model);
    }

    pub fn model(&self, name: &str) -> Option<&SignalModel> {
        self.models.iter().find(|m| m.name() == name)
    }

    pub fn model_mut(&mut self, name: &str) -> Option<&mut SignalModel> {
        self.models.iter_mut().find(|m| m.name() == name)
    }

    /// Indicators the feature config asks for, plus the entries that named
    /// no known indicator.
    pub fn indicators(&self) -> (Vec<Box<dyn Indicator>>, Vec<FactoryError>) {
        required_indicators(&self.feature_config)
    }

    /// Train every trainable model. Returns `(model name, outcome)` pairs.
    pub fn train_all(
        &mut self,
        bars: &[Bar],
        indicators: &IndicatorValues,
    ) -> Vec<(String, TrainOutcome)> {
        self.models
            .iter_mut()
            .filter_map(|m| {
                let outcome = m.train(bars, indicators)?;
                Some((m.name().to_string(), outcome))
            })
            .collect()
    }

    /// Events from every model, grouped by model in list order and by bar
    /// inside each model.
    pub fn generate_all_signals(
        &self,
        bars: &[Bar],
        indicators: &IndicatorValues,
    ) -> Vec<SignalEvent> {
        let mut events = Vec::new();
        for model in &self.models {
            let series = model.generate_signals(bars, indicators);
            let name = model.name();
            events.extend(events_from_series(bars, &series, name, |_| {
                format!("{name} Signal Generated")
            }));
        }
        tracing::debug!(
            strategy = %self.name,
            models = self.models.len(),
            events = events.len(),
            "strategy signals generated"
        );
        events
    }

    pub fn to_value(&self) -> Result<Value, StrategyError> {
        let models = self
            .models
            .iter()
            .map(SignalModel::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(json!({
            "name": self.name,
            "feature_config": self.feature_config,
            "models": models,
        }))
    }

    /// Read a bundle. Unreadable model entries are skipped.
    pub fn from_value(value: &Value) -> Result<Self, StrategyError> {
        let name = value
            .get("name")
            .and_then(Value::as_str)
            .ok_or(StrategyError::MissingName)?
            .to_string();

        let feature_config = match value.get("feature_config") {
            None | Some(Value::Null) => FeatureConfig::new(),
            Some(v) => serde_json::from_value(v.clone()).map_err(StrategyError::FeatureConfig)?,
        };

        let mut models = Vec::new();
        let entries = value.get("models").and_then(Value::as_array);
        for entry in entries.into_iter().flatten() {
            match SignalModel::from_value(entry) {
                Ok(model) => models.push(model),
                Err(e) => tracing::warn!(strategy = %name, error = %e, "skipping signal model"),
            }
        }

        Ok(Self {
            name,
            feature_config,
            models,
        })
    }
}
