use serde::{Deserialize, Serialize};

/// A comprehensive, standardized report of a strategy's performance.
///
/// This struct is the final output of the `PerformanceAnalyzer` and serves as
/// the data transfer object for backtest results throughout the system.
///
/// Degenerate denominators never produce errors here: `profit_factor` and
/// `recovery_factor` are `f64::INFINITY` when the loss side is zero but the
/// profit side is not, and `sharpe_ratio` is `0.0` when the return series has
/// no variance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReport {
    // I. Core profitability
    pub total_profit: f64,
    pub profit_rate: f64,
    /// Closed round trips; entries still open at the end of a ledger never count.
    pub total_trades: usize,
    pub win_count: usize,
    pub loss_count: usize,
    /// Percent of closed trades that were profitable.
    pub win_rate: f64,

    // II. Trade-level statistics (magnitudes for the averages, signed extremes)
    pub average_win: f64,
    pub average_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub profit_factor: f64,
    pub expectancy: f64,

    // III. Risk and drawdown
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    pub recovery_factor: f64,

    // IV. Return buckets and behavioral patterns
    pub monthly_returns: Vec<MonthlyReturn>,
    pub daily_returns: Vec<DailyReturn>,
    pub trade_patterns: TradePatterns,
}

impl PerformanceReport {
    /// Creates a new, zeroed-out report. Used as the result for an empty ledger.
    pub fn new() -> Self {
        Self {
            total_profit: 0.0,
            profit_rate: 0.0,
            total_trades: 0,
            win_count: 0,
            loss_count: 0,
            win_rate: 0.0,
            average_win: 0.0,
            average_loss: 0.0,
            largest_win: 0.0,
            largest_loss: 0.0,
            profit_factor: 0.0,
            expectancy: 0.0,
            max_drawdown: 0.0,
            sharpe_ratio: 0.0,
            recovery_factor: 0.0,
            monthly_returns: Vec::new(),
            daily_returns: Vec::new(),
            trade_patterns: TradePatterns::default(),
        }
    }
}

impl Default for PerformanceReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Aggregate return for one calendar month (`YYYY-MM`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyReturn {
    pub month: String,
    pub profit: f64,
    pub profit_rate: f64,
    pub trades: usize,
}

/// Aggregate return for one calendar day (`YYYY-MM-DD`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyReturn {
    pub date: String,
    pub profit: f64,
    pub profit_rate: f64,
    pub trades: usize,
}

/// Per-band value for the four time-of-day buckets
/// (09-12 / 12-15 / 15-18 / everything else).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TimeBuckets<T> {
    pub morning: T,
    pub afternoon: T,
    pub evening: T,
    pub night: T,
}

/// Average holding duration in minutes, split by trade outcome.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HoldingTime {
    pub profitable: f64,
    pub unprofitable: f64,
}

/// Closed-trade counts per traded-volume tercile.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VolumeProfile {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

/// Behavioral statistics mined from the ledger.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradePatterns {
    pub time_of_day: TimeBuckets<usize>,
    pub profit_by_time: TimeBuckets<f64>,
    pub consecutive_wins: usize,
    pub consecutive_losses: usize,
    pub average_holding_time: HoldingTime,
    pub volume_profile: VolumeProfile,
}

/// Benchmark-relative risk measures over a daily-return series.
///
/// Zero-denominator cases resolve to sentinels, never errors: ratios over a
/// zero beta, zero variance, or zero downside deviation are `0.0`; Calmar over
/// a zero drawdown is `f64::INFINITY` when the return is positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskMetrics {
    /// Empirical 95% value-at-risk, expressed as a positive loss magnitude.
    pub value_at_risk: f64,
    /// Mean of the returns at or below the VaR threshold, as a positive loss.
    pub expected_shortfall: f64,
    pub beta: f64,
    pub correlation: f64,
    pub information_ratio: f64,
    pub sortino_ratio: f64,
    pub treynor_ratio: f64,
    pub calmar_ratio: f64,
}
