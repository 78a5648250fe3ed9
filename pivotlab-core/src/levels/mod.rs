//! Support/resistance levels: pivot detection followed by clustering.

pub mod clusterer;

pub use clusterer::{time_weight, LevelClusterer};

use serde::{Deserialize, Serialize};

use crate::domain::{Bar, Level};
use crate::pivots::{detect_pivots, PivotMethod};

fn default_clustering_pct() -> f64 {
    0.02
}

fn default_recency_factor() -> f64 {
    1.0
}

fn default_min_strength() -> f64 {
    1.0
}

/// Detector + clusterer + strength floor, as configured under `[levels]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelsAnalyzer {
    #[serde(default = "default_clustering_pct")]
    pub clustering_pct: f64,
    #[serde(default = "default_recency_factor")]
    pub recency_factor: f64,
    /// Levels weaker than this are dropped.
    #[serde(default = "default_min_strength")]
    pub min_strength: f64,
    #[serde(default)]
    pub method: PivotMethod,
}

impl Default for LevelsAnalyzer {
    fn default() -> Self {
        Self {
            method: PivotMethod::default(),
            clustering_pct: default_clustering_pct(),
            recency_factor: default_recency_factor(),
            min_strength: default_min_strength(),
        }
    }
}

impl LevelsAnalyzer {
    /// Levels for `bars`, strongest first.
    pub fn analyze(&self, bars: &[Bar]) -> Vec<Level> {
        let pivots = detect_pivots(bars, &self.method);
        let levels = LevelClusterer::new(self.clustering_pct).cluster(
            &pivots,
            bars.len(),
            self.recency_factor,
        );
        let before = levels.len();
        let levels: Vec<Level> = levels
            .into_iter()
            .filter(|l| l.strength >= self.min_strength)
            .collect();
        if levels.len() < before {
            tracing::debug!(
                dropped = before - levels.len(),
                min_strength = self.min_strength,
                "weak levels filtered"
            );
        }
        levels
    }
}
