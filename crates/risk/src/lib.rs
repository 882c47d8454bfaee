//! The daily-limit risk manager.
//!
//! A synchronous, advisory gate: callers record every settled trade through
//! [`RiskManager::on_trade`] and consult [`RiskManager::is_trading_allowed`]
//! before opening the next position. The manager never places or blocks orders
//! itself.

use chrono::{DateTime, NaiveDate};
use configuration::RiskLimits;
use serde::{Deserialize, Serialize};

/// Which limit tripped the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StopReason {
    MaxDailyLoss,
    MaxDailyTrades,
    MaxDrawdown,
}

/// A point-in-time snapshot of the manager's state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskStatus {
    pub trading_allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<StopReason>,
    /// Accumulated loss for the current UTC day, as a positive magnitude.
    pub daily_loss: f64,
    pub daily_trades: u32,
    /// Percent decline from the session equity peak.
    pub current_drawdown_pct: f64,
}

/// Tracks daily loss, trade count and session drawdown against configured
/// limits.
///
/// Daily counters reset at the UTC day boundary, observed lazily from trade
/// timestamps. Equity is session-relative: it starts at zero and accumulates
/// realized profit, so drawdown is measured against the best point of the
/// session rather than an account balance.
pub struct RiskManager {
    limits: RiskLimits,
    current_day: Option<NaiveDate>,
    daily_loss: f64,
    daily_trades: u32,
    equity: f64,
    equity_peak: f64,
    stopped: Option<StopReason>,
}

impl RiskManager {
    pub fn new(limits: RiskLimits) -> Self {
        Self {
            limits,
            current_day: None,
            daily_loss: 0.0,
            daily_trades: 0,
            equity: 0.0,
            equity_peak: 0.0,
            stopped: None,
        }
    }

    /// Records one settled trade and re-evaluates the limits.
    ///
    /// `timestamp` is milliseconds since epoch; a trade on a new UTC day
    /// resets the daily counters (and any active stop) before it is counted.
    pub fn on_trade(&mut self, profit: f64, timestamp: i64) {
        let day = DateTime::from_timestamp_millis(timestamp)
            .map(|ts| ts.date_naive())
            .unwrap_or_default();
        if self.current_day != Some(day) {
            if self.current_day.is_some() {
                tracing::info!(%day, "daily risk counters reset");
            }
            self.current_day = Some(day);
            self.daily_loss = 0.0;
            self.daily_trades = 0;
            self.stopped = None;
        }

        self.daily_trades += 1;
        if profit < 0.0 {
            self.daily_loss += -profit;
        }
        self.equity += profit;
        if self.equity > self.equity_peak {
            self.equity_peak = self.equity;
        }

        if self.limits.stop_trading_on_max_loss {
            self.check_limits();
        }
    }

    fn check_limits(&mut self) {
        if self.stopped.is_some() {
            return;
        }
        let breach = if self.daily_loss >= self.limits.max_daily_loss {
            Some(StopReason::MaxDailyLoss)
        } else if self.daily_trades > self.limits.max_daily_trades {
            Some(StopReason::MaxDailyTrades)
        } else if self.current_drawdown_pct() >= self.limits.max_drawdown_pct {
            Some(StopReason::MaxDrawdown)
        } else {
            None
        };
        if let Some(reason) = breach {
            tracing::warn!(?reason, daily_loss = self.daily_loss, trades = self.daily_trades, "risk limit breached, trading stopped");
            self.stopped = Some(reason);
        }
    }

    fn current_drawdown_pct(&self) -> f64 {
        if self.equity_peak > 0.0 {
            (self.equity_peak - self.equity) / self.equity_peak * 100.0
        } else {
            0.0
        }
    }

    /// Synchronous advisory gate for new entries.
    pub fn is_trading_allowed(&self) -> bool {
        self.stopped.is_none()
    }

    /// Manually re-opens the gate. Daily counters are left intact, so the
    /// very next trade can trip the same limit again.
    pub fn resume_trading(&mut self) {
        if self.stopped.take().is_some() {
            tracing::info!("trading manually resumed");
        }
    }

    pub fn status(&self) -> RiskStatus {
        RiskStatus {
            trading_allowed: self.stopped.is_none(),
            stop_reason: self.stopped,
            daily_loss: self.daily_loss,
            daily_trades: self.daily_trades,
            current_drawdown_pct: self.current_drawdown_pct(),
        }
    }

    /// Replaces the limits; existing counters and any active stop are kept.
    pub fn update_limits(&mut self, limits: RiskLimits) {
        self.limits = limits;
    }

    /// Suggested order amount for one position, in quote currency.
    pub fn suggested_position_size(&self, available_balance: f64) -> f64 {
        available_balance.max(0.0) * self.limits.max_position_size_pct / 100.0
    }
}
