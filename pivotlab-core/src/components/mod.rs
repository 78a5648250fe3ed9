//! Components shared by the level and signal layers.
//!
//! - Indicator trait and the named indicator series container
//! - Factory turning a strategy bundle's feature config into indicators

pub mod factory;
pub mod indicator;

pub use factory::{create_indicator, required_indicators, FactoryError, FeatureConfig};
pub use indicator::{precompute, Indicator, IndicatorValues};
