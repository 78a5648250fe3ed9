//! Signal models: the closed set of bar → signal-series producers, plus the
//! type-tag registry used to read them back from JSON.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::components::IndicatorValues;
use crate::domain::Bar;

use super::classifier::{ClassifierModel, TrainOutcome};
use super::divergence::DivergenceModel;
use super::event::SignalSeries;

/// JSON key carrying the model type tag.
pub const TYPE_KEY: &str = "type";

#[derive(Debug, Clone, PartialEq)]
pub enum SignalModel {
    Divergence(DivergenceModel),
    Classifier(ClassifierModel),
}

impl SignalModel {
    pub fn name(&self) -> &str {
        match self {
            Self::Divergence(m) => &m.name,
            Self::Classifier(m) => m.name(),
        }
    }

    /// Registry tag of this variant.
    pub fn type_tag(&self) -> &'static str {
        match self {
            Self::Divergence(_) => "divergence",
            Self::Classifier(_) => "classifier",
        }
    }

    /// Per-bar signal series, same length as `bars`.
    pub fn generate_signals(&self, bars: &[Bar], indicators: &IndicatorValues) -> SignalSeries {
        match self {
            Self::Divergence(m) => m.generate_signals(bars, indicators),
            Self::Classifier(m) => m.generate_signals(bars, indicators),
        }
    }

    /// Train the model if it is trainable. Rule-based models return `None`.
    pub fn train(&mut self, bars: &[Bar], indicators: &IndicatorValues) -> Option<TrainOutcome> {
        match self {
            Self::Divergence(_) => None,
            Self::Classifier(m) => Some(m.train(bars, indicators)),
        }
    }

    /// JSON object of the model's fields plus its `"type"` tag.
    pub fn to_value(&self) -> Result<Value, ModelError> {
        let body = match self {
            Self::Divergence(m) => serde_json::to_value(m),
            Self::Classifier(m) => serde_json::to_value(m),
        }
        .map_err(|source| ModelError::Invalid {
            tag: self.type_tag().to_string(),
            source,
        })?;

        let mut object = match body {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        object.insert(TYPE_KEY.to_string(), Value::String(self.type_tag().to_string()));
        Ok(Value::Object(object))
    }

    /// Build a model from a tagged JSON object via the registry.
    pub fn from_value(value: &Value) -> Result<Self, ModelError> {
        let tag = value
            .get(TYPE_KEY)
            .and_then(Value::as_str)
            .ok_or(ModelError::MissingType)?;
        let (_, build) = REGISTRY
            .iter()
            .find(|(name, _)| *name == tag)
            .ok_or_else(|| ModelError::UnknownType(tag.to_string()))?;

        let mut body = value.clone();
        if let Value::Object(map) = &mut body {
            map.remove(TYPE_KEY);
        }
        build(body).map_err(|source| ModelError::Invalid {
            tag: tag.to_string(),
            source,
        })
    }
}

impl From<DivergenceModel> for SignalModel {
    fn from(m: DivergenceModel) -> Self {
        Self::Divergence(m)
    }
}

impl From<ClassifierModel> for SignalModel {
    fn from(m: ClassifierModel) -> Self {
        Self::Classifier(m)
    }
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("signal model entry has no \"type\" tag")]
    MissingType,

    #[error("unknown signal model type: {0}")]
    UnknownType(String),

    #[error("invalid {tag} model: {source}")]
    Invalid {
        tag: String,
        #[source]
        source: serde_json::Error,
    },
}

type Constructor = fn(Value) -> Result<SignalModel, serde_json::Error>;

fn build_divergence(value: Value) -> Result<SignalModel, serde_json::Error> {
    serde_json::from_value::<DivergenceModel>(value).map(SignalModel::Divergence)
}

fn build_classifier(value: Value) -> Result<SignalModel, serde_json::Error> {
    serde_json::from_value::<ClassifierModel>(value).map(SignalModel::Classifier)
}

/// Type tag → constructor.
static REGISTRY: &[(&str, Constructor)] = &[
    ("divergence", build_divergence),
    ("classifier", build_classifier),
];

/// Tags the registry knows, in registration order.
pub fn registered_types() -> impl Iterator<Item = &'static str> {
    REGISTRY.iter().map(|(tag, _)| *tag)
}
