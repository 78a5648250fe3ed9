//! Directory-backed strategy store.
//!
//! One pretty-printed JSON file per bundle at `<dir>/<name>.json`, written
//! from `Strategy::to_value` and read back through `Strategy::from_value`.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

use pivotlab_core::strategy::Strategy;

#[derive(Debug, Clone)]
pub struct StrategyStore {
    dir: PathBuf,
}

impl StrategyStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create strategy directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn contains(&self, name: &str) -> bool {
        self.path_for(name).map(|p| p.exists()).unwrap_or(false)
    }

    /// Write a bundle, replacing any bundle with the same name.
    pub fn save(&self, strategy: &Strategy) -> Result<PathBuf> {
        let path = self.path_for(&strategy.name)?;
        let value = strategy
            .to_value()
            .with_context(|| format!("Failed to serialize strategy '{}'", strategy.name))?;
        let json = serde_json::to_string_pretty(&value).context("Failed to encode strategy JSON")?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!(strategy = %strategy.name, path = %path.display(), "strategy saved");
        Ok(path)
    }

    /// Read a bundle. `None` if no bundle with that name exists.
    pub fn load(&self, name: &str) -> Result<Option<Strategy>> {
        let path = self.path_for(name)?;
        if !path.exists() {
            return Ok(None);
        }
        let json = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let value: serde_json::Value =
            serde_json::from_str(&json).with_context(|| format!("Invalid JSON in {}", path.display()))?;
        let strategy = Strategy::from_value(&value)
            .with_context(|| format!("Invalid strategy bundle in {}", path.display()))?;
        Ok(Some(strategy))
    }

    /// Names of stored bundles, sorted.
    pub fn list_available(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = std::fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to list {}", self.dir.display()))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("json"))
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .collect();
        names.sort();
        Ok(names)
    }

    /// Delete a bundle. Returns whether a file was removed.
    pub fn remove(&self, name: &str) -> Result<bool> {
        let path = self.path_for(name)?;
        if !path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&path)
            .with_context(|| format!("Failed to remove {}", path.display()))?;
        Ok(true)
    }

    fn path_for(&self, name: &str) -> Result<PathBuf> {
        let valid = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\', '\0']);
        if !valid {
            bail!("invalid strategy name '{name}'");
        }
        Ok(self.dir.join(format!("{name}.json")))
    }
}
