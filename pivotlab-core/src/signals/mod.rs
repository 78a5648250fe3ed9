//! Signal layer: detectors, the rule engine, and the two signal models.
//!
//! Signals read bars and precomputed indicator series only; they never
//! compute indicators themselves.

pub mod classifier;
pub mod detectors;
pub mod divergence;
pub mod event;
pub mod forest;
pub mod model;
pub mod rules;

pub use classifier::{ClassifierConfig, ClassifierModel, TrainOutcome, MIN_TRAINING_SAMPLES};
pub use detectors::{detect_crossover, detect_price_above_level, detect_threshold};
pub use divergence::{relative_extrema, DivergenceModel, Extremum};
pub use event::{events_from_series, Side, SignalEvent, SignalSeries};
pub use forest::{ForestConfig, TrainedForest};
pub use model::{registered_types, ModelError, SignalModel};
pub use rules::extract_rule_events;
