//! PivotLab Runner: analysis orchestration on top of `pivotlab-core`.
//!
//! - TOML analysis config with a BLAKE3 config hash
//! - CSV bar loading, with a synthetic random walk for demos
//! - The levels/signals/evaluation pipeline and model training
//! - Directory-backed strategy bundle store
//! - JSON report export

pub mod config;
pub mod data_loader;
pub mod pipeline;
pub mod report;
pub mod store;

pub use config::{AnalysisConfig, ConfigError};
pub use data_loader::{dataset_hash, load_csv, read_csv, synthetic_bars, LoadError, LoadedBars};
pub use pipeline::{analyze, default_features, features_for, indicator_values, train_strategy, Analysis};
pub use report::{AnalysisReport, SCHEMA_VERSION};
pub use store::StrategyStore;

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn config_is_send_sync() {
        assert_send::<AnalysisConfig>();
        assert_sync::<AnalysisConfig>();
    }

    #[test]
    fn loaded_bars_is_send_sync() {
        assert_send::<LoadedBars>();
        assert_sync::<LoadedBars>();
    }

    #[test]
    fn analysis_and_report_are_send_sync() {
        assert_send::<Analysis>();
        assert_sync::<Analysis>();
        assert_send::<AnalysisReport>();
        assert_sync::<AnalysisReport>();
    }

    #[test]
    fn store_is_send_sync() {
        assert_send::<StrategyStore>();
        assert_sync::<StrategyStore>();
    }
}
