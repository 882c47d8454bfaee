//! Strategy definitions as the dashboard and the persistence layer see them.
//!
//! The JSON shape mirrors the upstream API: a strategy object carries a
//! `type` discriminator, a `params` object specific to that type, a market
//! code, and an enabled flag.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StrategyError;

/// Parameters for the volatility-breakout strategy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolatilityBreakoutParams {
    /// Breakout coefficient applied to the trailing range.
    pub k: f64,
    /// Number of trailing bars the range is measured over.
    pub period: usize,
    /// Take-profit threshold, percent.
    pub profit_target: f64,
    /// Stop-loss threshold, percent.
    pub stop_loss: f64,
}

impl VolatilityBreakoutParams {
    pub fn validate(&self) -> Result<(), StrategyError> {
        if !(self.k > 0.0) {
            return Err(StrategyError::InvalidParameters("k must be greater than 0".to_string()));
        }
        if self.period == 0 {
            return Err(StrategyError::InvalidParameters("period must be greater than 0".to_string()));
        }
        validate_exit_thresholds(self.profit_target, self.stop_loss)
    }
}

/// Parameters for the moving-average crossover strategy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovingAverageParams {
    pub short_period: usize,
    pub long_period: usize,
    /// Take-profit threshold, percent.
    pub profit_target: f64,
    /// Stop-loss threshold, percent.
    pub stop_loss: f64,
}

impl MovingAverageParams {
    pub fn validate(&self) -> Result<(), StrategyError> {
        if self.short_period == 0 || self.long_period == 0 {
            return Err(StrategyError::InvalidParameters(
                "moving-average periods must be greater than 0".to_string(),
            ));
        }
        if self.short_period >= self.long_period {
            return Err(StrategyError::InvalidParameters(
                "short period must be less than long period".to_string(),
            ));
        }
        validate_exit_thresholds(self.profit_target, self.stop_loss)
    }
}

/// Parameters for the RSI threshold strategy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RsiParams {
    pub period: usize,
    /// RSI level below which the market is considered oversold.
    pub oversold: f64,
    /// RSI level above which the market is considered overbought.
    pub overbought: f64,
    /// Take-profit threshold, percent.
    pub profit_target: f64,
    /// Stop-loss threshold, percent.
    pub stop_loss: f64,
}

impl RsiParams {
    pub fn validate(&self) -> Result<(), StrategyError> {
        if self.period == 0 {
            return Err(StrategyError::InvalidParameters("period must be greater than 0".to_string()));
        }
        if !(0.0..=100.0).contains(&self.oversold) || !(0.0..=100.0).contains(&self.overbought) {
            return Err(StrategyError::InvalidParameters(
                "RSI thresholds must be between 0 and 100".to_string(),
            ));
        }
        if self.oversold >= self.overbought {
            return Err(StrategyError::InvalidParameters(
                "oversold threshold must be below overbought threshold".to_string(),
            ));
        }
        validate_exit_thresholds(self.profit_target, self.stop_loss)
    }
}

fn validate_exit_thresholds(profit_target: f64, stop_loss: f64) -> Result<(), StrategyError> {
    if !(profit_target > 0.0) {
        return Err(StrategyError::InvalidParameters(
            "profitTarget must be greater than 0".to_string(),
        ));
    }
    if !(stop_loss > 0.0) {
        return Err(StrategyError::InvalidParameters("stopLoss must be greater than 0".to_string()));
    }
    Ok(())
}

/// The tagged union of all parameter sets, discriminated by the `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "params")]
pub enum StrategyParams {
    #[serde(rename = "VOLATILITY_BREAKOUT")]
    VolatilityBreakout(VolatilityBreakoutParams),
    #[serde(rename = "MOVING_AVERAGE")]
    MovingAverage(MovingAverageParams),
    #[serde(rename = "RSI")]
    Rsi(RsiParams),
}

impl StrategyParams {
    pub fn validate(&self) -> Result<(), StrategyError> {
        match self {
            StrategyParams::VolatilityBreakout(p) => p.validate(),
            StrategyParams::MovingAverage(p) => p.validate(),
            StrategyParams::Rsi(p) => p.validate(),
        }
    }

    /// Take-profit threshold shared by all strategy types, percent.
    pub fn profit_target(&self) -> f64 {
        match self {
            StrategyParams::VolatilityBreakout(p) => p.profit_target,
            StrategyParams::MovingAverage(p) => p.profit_target,
            StrategyParams::Rsi(p) => p.profit_target,
        }
    }

    /// Stop-loss threshold shared by all strategy types, percent.
    pub fn stop_loss(&self) -> f64 {
        match self {
            StrategyParams::VolatilityBreakout(p) => p.stop_loss,
            StrategyParams::MovingAverage(p) => p.stop_loss,
            StrategyParams::Rsi(p) => p.stop_loss,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            StrategyParams::VolatilityBreakout(_) => "VOLATILITY_BREAKOUT",
            StrategyParams::MovingAverage(_) => "MOVING_AVERAGE",
            StrategyParams::Rsi(_) => "RSI",
        }
    }
}

/// A user-defined strategy as stored in the catalog and the config store.
///
/// Identity is immutable once assigned by the catalog; parameters may only
/// change while the strategy is disabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradingStrategy {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub market: String,
    #[serde(flatten)]
    pub params: StrategyParams,
    #[serde(default)]
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl TradingStrategy {
    pub fn new(market: impl Into<String>, params: StrategyParams) -> Self {
        Self {
            id: None,
            market: market.into(),
            params,
            enabled: false,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn validate(&self) -> Result<(), StrategyError> {
        if self.market.is_empty() {
            return Err(StrategyError::InvalidParameters("market must not be empty".to_string()));
        }
        self.params.validate()
    }
}
