//! Analysis configuration (TOML).
//!
//! ```toml
//! [levels]
//! clustering_pct = 0.02
//! recency_factor = 1.0
//! min_strength = 1.0
//!
//! [levels.method]
//! method = "zigzag"
//! deviation_pct = 0.015
//!
//! [evaluation]
//! forward_window = 5
//! threshold = 0.01
//! ```
//!
//! Every key is optional; missing keys take the defaults shown above.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use pivotlab_core::evaluation::SignalEvaluator;
use pivotlab_core::levels::LevelsAnalyzer;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub levels: LevelsAnalyzer,
    #[serde(default)]
    pub evaluation: SignalEvaluator,
}

impl AnalysisConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject values no analysis could use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let levels = &self.levels;
        if !levels.clustering_pct.is_finite() || levels.clustering_pct < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "levels.clustering_pct must be a non-negative number, got {}",
                levels.clustering_pct
            )));
        }
        if !levels.recency_factor.is_finite() || levels.recency_factor < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "levels.recency_factor must be a non-negative number, got {}",
                levels.recency_factor
            )));
        }
        if self.evaluation.forward_window == 0 {
            return Err(ConfigError::Invalid(
                "evaluation.forward_window must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Deterministic BLAKE3 hash of the JSON form of this config.
    pub fn config_hash(&self) -> String {
        let json = serde_json::to_string(self).unwrap_or_default();
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}
