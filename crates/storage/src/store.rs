use std::fs;
use std::path::PathBuf;

use backtester::BacktestResult;
use chrono::{DateTime, Utc};
use core_types::Period;
use serde::{Deserialize, Serialize};
use strategies::params::TradingStrategy;

use crate::error::StorageError;

/// One named, reusable backtest setup, optionally with the result of its
/// last run attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedConfig {
    pub name: String,
    pub strategy: TradingStrategy,
    pub period: Period,
    pub initial_capital: f64,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<BacktestResult>,
}

/// The persistence seam for saved configurations.
///
/// `load` and `save_all` are the primitive operations; everything else is a
/// load-modify-rewrite on top of them.
pub trait ConfigStore {
    fn load(&self) -> Result<Vec<SavedConfig>, StorageError>;
    fn save_all(&self, configs: &[SavedConfig]) -> Result<(), StorageError>;

    /// Inserts or replaces the configuration with the same name.
    fn upsert(&self, config: SavedConfig) -> Result<(), StorageError> {
        let mut all = self.load()?;
        match all.iter_mut().find(|c| c.name == config.name) {
            Some(existing) => *existing = config,
            None => all.push(config),
        }
        self.save_all(&all)
    }

    fn get(&self, name: &str) -> Result<SavedConfig, StorageError> {
        self.load()?
            .into_iter()
            .find(|c| c.name == name)
            .ok_or_else(|| StorageError::NotFound(name.to_string()))
    }

    fn delete(&self, name: &str) -> Result<(), StorageError> {
        let mut all = self.load()?;
        let before = all.len();
        all.retain(|c| c.name != name);
        if all.len() == before {
            return Err(StorageError::NotFound(name.to_string()));
        }
        self.save_all(&all)
    }
}

/// A `ConfigStore` backed by one pretty-printed JSON file.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ConfigStore for JsonFileStore {
    /// A missing file is an empty store, not an error.
    fn load(&self) -> Result<Vec<SavedConfig>, StorageError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn save_all(&self, configs: &[SavedConfig]) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(configs)?;
        fs::write(&self.path, raw)?;
        tracing::debug!(path = %self.path.display(), count = configs.len(), "config store rewritten");
        Ok(())
    }
}
