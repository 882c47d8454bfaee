use serde::Deserialize;

use crate::error::ConfigError;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub feed: FeedSettings,
    #[serde(default)]
    pub simulation: SimulationSettings,
    #[serde(default)]
    pub risk: RiskLimits,
}

impl Settings {
    /// Rejects settings that would misbehave at runtime rather than letting them
    /// surface later as confusing feed or simulation behavior.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.feed.url.is_empty() {
            return Err(ConfigError::ValidationError("feed.url must not be empty".to_string()));
        }
        if self.feed.base_backoff_ms == 0 {
            return Err(ConfigError::ValidationError(
                "feed.base_backoff_ms must be greater than 0".to_string(),
            ));
        }
        if self.feed.max_backoff_ms < self.feed.base_backoff_ms {
            return Err(ConfigError::ValidationError(
                "feed.max_backoff_ms must be at least feed.base_backoff_ms".to_string(),
            ));
        }
        if self.feed.trade_history_limit == 0 {
            return Err(ConfigError::ValidationError(
                "feed.trade_history_limit must be greater than 0".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&self.risk.max_position_size_pct) {
            return Err(ConfigError::ValidationError(
                "risk.max_position_size_pct must be between 0 and 100".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            feed: FeedSettings::default(),
            simulation: SimulationSettings::default(),
            risk: RiskLimits::default(),
        }
    }
}

/// Contains parameters for the live market-data connection.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedSettings {
    /// WebSocket endpoint of the market-data feed.
    pub url: String,
    /// Session identifier sent in the first element of every control frame.
    pub ticket: String,
    /// Frame format directive sent in the last element of every control frame.
    pub format: String,
    /// Initial reconnect delay. Doubles on every failed attempt.
    pub base_backoff_ms: u64,
    /// Upper bound on the reconnect delay.
    pub max_backoff_ms: u64,
    /// How many recent trades a market projection retains.
    pub trade_history_limit: usize,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            url: "wss://api.upbit.com/websocket/v1".to_string(),
            ticket: "uptick".to_string(),
            format: "DEFAULT".to_string(),
            base_backoff_ms: 500,
            max_backoff_ms: 30_000,
            trade_history_limit: 50,
        }
    }
}

/// Contains parameters for the backtesting simulator.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Minimum wall-clock gap between closing a position and the next entry.
    /// The original dashboard enforced one minute to avoid churning on 1m bars.
    pub min_reentry_interval_ms: i64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self { min_reentry_interval_ms: 60_000 }
    }
}

/// Contains the limits the risk manager enforces against live trading.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RiskLimits {
    /// Maximum accumulated loss for a single day, in quote currency.
    pub max_daily_loss: f64,
    /// Maximum fraction of available balance allocated to one position, percent.
    pub max_position_size_pct: f64,
    /// Maximum number of trades for a single day.
    pub max_daily_trades: u32,
    /// Maximum tolerated drawdown from the session equity peak, percent.
    pub max_drawdown_pct: f64,
    /// Whether breaching any limit actually stops trading, or limits are advisory.
    pub stop_trading_on_max_loss: bool,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            max_daily_loss: 100_000.0,
            max_position_size_pct: 20.0,
            max_daily_trades: 10,
            max_drawdown_pct: 10.0,
            stop_trading_on_max_loss: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_validate() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn backoff_bounds_are_checked() {
        let mut settings = Settings::default();
        settings.feed.max_backoff_ms = settings.feed.base_backoff_ms - 1;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn position_size_must_be_a_percentage() {
        let mut settings = Settings::default();
        settings.risk.max_position_size_pct = 150.0;
        assert!(settings.validate().is_err());
    }
}
