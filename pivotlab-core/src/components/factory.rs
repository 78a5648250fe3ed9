//! Factory system: converts feature-config entries into indicator trait objects.
//!
//! A strategy bundle stores its feature selections as
//! `name -> { param -> value }`. The entry name doubles as the indicator
//! spec: `sma_20`, `ema_10_high`, or a bare kind (`rsi`) whose period comes
//! from the `period` parameter.

use std::collections::{BTreeMap, HashSet};

use crate::domain::BarColumn;
use crate::indicators::{Ema, Rsi, Sma};

use super::indicator::Indicator;

/// Feature selections of a strategy bundle.
pub type FeatureConfig = BTreeMap<String, BTreeMap<String, f64>>;

/// Errors that can occur during component construction.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FactoryError {
    #[error("Unknown indicator type: {0}")]
    UnknownIndicator(String),
    #[error("Invalid period in indicator spec: {0}")]
    InvalidPeriod(String),
    #[error("Unknown source column in indicator spec: {0}")]
    UnknownSource(String),
}

/// Extract a named usize parameter, falling back to `default`.
fn param_usize(params: &BTreeMap<String, f64>, name: &str, default: usize) -> usize {
    params
        .get(name)
        .copied()
        .filter(|v| v.is_finite() && *v >= 1.0)
        .map(|v| v as usize)
        .unwrap_or(default)
}

/// Create an indicator from a feature-config entry.
pub fn create_indicator(
    spec: &str,
    params: &BTreeMap<String, f64>,
) -> Result<Box<dyn Indicator>, FactoryError> {
    let mut parts = spec.split('_');
    let kind = parts.next().unwrap_or_default().to_ascii_lowercase();

    let default_period = match kind.as_str() {
        "sma" | "ema" => 20,
        "rsi" => 14,
        _ => return Err(FactoryError::UnknownIndicator(spec.to_string())),
    };

    let period = match parts.next() {
        Some(token) => match token.parse::<usize>() {
            Ok(p) if p >= 1 => p,
            _ => return Err(FactoryError::InvalidPeriod(spec.to_string())),
        },
        None => param_usize(params, "period", default_period),
    };

    let source = match parts.next() {
        Some(token) => BarColumn::from_name(token)
            .ok_or_else(|| FactoryError::UnknownSource(spec.to_string()))?,
        None => BarColumn::Close,
    };

    Ok(match kind.as_str() {
        "sma" => Box::new(Sma::on(source, period)),
        "ema" => Box::new(Ema::on(source, period)),
        _ => Box::new(Rsi::on(source, period)),
    })
}

/// Resolve every indicator a feature config asks for.
///
/// Entries that do not name an indicator are returned as errors alongside the
/// built list so the caller can report them; duplicates (same resulting
/// indicator name) are built once.
pub fn required_indicators(
    features: &FeatureConfig,
) -> (Vec<Box<dyn Indicator>>, Vec<FactoryError>) {
    let mut seen = HashSet::new();
    let mut indicators: Vec<Box<dyn Indicator>> = Vec::new();
    let mut errors = Vec::new();

    for (spec, params) in features {
        match create_indicator(spec, params) {
            Ok(ind) => {
                if seen.insert(ind.name().to_string()) {
                    indicators.push(ind);
                }
            }
            Err(e) => errors.push(e),
        }
    }

    (indicators, errors)
}
