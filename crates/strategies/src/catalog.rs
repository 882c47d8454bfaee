//! In-memory registry of user-defined strategies.
//!
//! Mirrors the upstream CRUD surface: create/read/update/delete by id, plus
//! start/stop, which toggle live execution separately from parameter updates.

use std::collections::HashMap;

use chrono::Utc;
use uuid::Uuid;

use crate::error::StrategyError;
use crate::params::{StrategyParams, TradingStrategy};

#[derive(Debug, Default)]
pub struct StrategyCatalog {
    strategies: HashMap<Uuid, TradingStrategy>,
}

impl StrategyCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new strategy, assigning its immutable identity and
    /// timestamps. The definition is validated before it is admitted.
    pub fn create(&mut self, mut strategy: TradingStrategy) -> Result<TradingStrategy, StrategyError> {
        strategy.validate()?;
        let id = Uuid::new_v4();
        let now = Utc::now();
        strategy.id = Some(id);
        strategy.enabled = false;
        strategy.created_at = Some(now);
        strategy.updated_at = Some(now);
        self.strategies.insert(id, strategy.clone());
        Ok(strategy)
    }

    pub fn get(&self, id: Uuid) -> Result<&TradingStrategy, StrategyError> {
        self.strategies.get(&id).ok_or(StrategyError::NotFound(id))
    }

    pub fn list(&self) -> Vec<&TradingStrategy> {
        let mut all: Vec<_> = self.strategies.values().collect();
        all.sort_by_key(|s| s.created_at);
        all
    }

    /// Replaces the market and parameters of a stopped strategy.
    ///
    /// Enabled strategies are immutable; callers must stop them first.
    pub fn update(
        &mut self,
        id: Uuid,
        market: String,
        params: StrategyParams,
    ) -> Result<&TradingStrategy, StrategyError> {
        let existing = self.strategies.get_mut(&id).ok_or(StrategyError::NotFound(id))?;
        if existing.enabled {
            return Err(StrategyError::EnabledStrategyImmutable(id));
        }
        params.validate()?;
        if market.is_empty() {
            return Err(StrategyError::InvalidParameters("market must not be empty".to_string()));
        }
        existing.market = market;
        existing.params = params;
        existing.updated_at = Some(Utc::now());
        Ok(existing)
    }

    pub fn delete(&mut self, id: Uuid) -> Result<TradingStrategy, StrategyError> {
        self.strategies.remove(&id).ok_or(StrategyError::NotFound(id))
    }

    /// Marks the strategy as running on the live execution path.
    pub fn start(&mut self, id: Uuid) -> Result<(), StrategyError> {
        self.set_enabled(id, true)
    }

    /// Takes the strategy off the live execution path.
    pub fn stop(&mut self, id: Uuid) -> Result<(), StrategyError> {
        self.set_enabled(id, false)
    }

    fn set_enabled(&mut self, id: Uuid, enabled: bool) -> Result<(), StrategyError> {
        let existing = self.strategies.get_mut(&id).ok_or(StrategyError::NotFound(id))?;
        if existing.enabled != enabled {
            existing.enabled = enabled;
            existing.updated_at = Some(Utc::now());
            tracing::info!(strategy_id = %id, enabled, "strategy execution state changed");
        }
        Ok(())
    }
}
