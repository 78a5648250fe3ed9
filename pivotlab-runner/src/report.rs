//! Analysis report: levels, events and their evaluation plus the provenance
//! needed to reproduce them.
//!
//! Reports carry a `schema_version`; newer versions are rejected on load.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;

use pivotlab_core::domain::Level;
use pivotlab_core::evaluation::Evaluation;
use pivotlab_core::signals::SignalEvent;

use crate::config::AnalysisConfig;
use crate::data_loader::LoadedBars;
use crate::pipeline::Analysis;

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub schema_version: u32,
    /// BLAKE3 over config hash, dataset hash and strategy name.
    pub report_id: String,
    pub strategy: Option<String>,
    pub bar_count: usize,
    pub synthetic: bool,
    pub dataset_hash: String,
    pub config_hash: String,
    pub levels: Vec<Level>,
    pub events: Vec<SignalEvent>,
    pub evaluation: Evaluation,
}

impl AnalysisReport {
    pub fn new(
        data: &LoadedBars,
        config: &AnalysisConfig,
        strategy: Option<&str>,
        analysis: Analysis,
    ) -> Self {
        let config_hash = config.config_hash();
        let canonical = json!({
            "config_hash": &config_hash,
            "dataset_hash": &data.dataset_hash,
            "strategy": strategy,
        });
        let report_id = blake3::hash(canonical.to_string().as_bytes())
            .to_hex()
            .to_string();

        Self {
            schema_version: SCHEMA_VERSION,
            report_id,
            strategy: strategy.map(str::to_string),
            bar_count: data.bars.len(),
            synthetic: data.synthetic,
            dataset_hash: data.dataset_hash.clone(),
            config_hash,
            levels: analysis.levels,
            events: analysis.events,
            evaluation: analysis.evaluation,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize AnalysisReport to JSON")
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let report: Self =
            serde_json::from_str(json).context("failed to deserialize AnalysisReport from JSON")?;
        if report.schema_version > SCHEMA_VERSION {
            bail!(
                "unsupported schema version {} (max supported: {})",
                report.schema_version,
                SCHEMA_VERSION
            );
        }
        Ok(report)
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        std::fs::write(path, self.to_json()?)
            .with_context(|| format!("failed to write {}", path.display()))
    }

    /// Plain-text summary for the terminal.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let source = if self.synthetic { " (synthetic)" } else { "" };
        out.push_str(&format!(
            "Report {}  bars: {}{}\n",
            &self.report_id[..self.report_id.len().min(12)],
            self.bar_count,
            source
        ));
        if let Some(name) = &self.strategy {
            out.push_str(&format!("Strategy: {name}\n"));
        }

        out.push_str(&format!("\nLevels ({}):\n", self.levels.len()));
        for level in &self.levels {
            out.push_str(&format!(
                "  {:>10.2}  [{:.2} - {:.2}]  strength {:.2}  hits {}\n",
                level.price, level.min_price, level.max_price, level.strength, level.hit_count
            ));
        }

        out.push_str(&format!("\nSignals ({}):\n", self.events.len()));
        for event in &self.events {
            out.push_str(&format!(
                "  {}  {:<4}  {:>10.2}  {}\n",
                event.timestamp,
                event.side.as_str(),
                event.value,
                event.description
            ));
        }

        let e = &self.evaluation;
        out.push_str(&format!(
            "\nEvaluation: {} scored, {} correct, {} incorrect, win rate {:.1}%\n",
            e.total_signals,
            e.correct_calls,
            e.incorrect_calls,
            e.win_rate() * 100.0
        ));
        out
    }
}
