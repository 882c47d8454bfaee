use analytics::{PerformanceAnalyzer, PerformanceReport};
use configuration::SimulationSettings;
use core_types::{Candle, LedgerEntry, TradeSide};
use serde::{Deserialize, Serialize};
use strategies::factory::create_strategy;
use strategies::params::StrategyParams;
use strategies::Signal;

use crate::error::BacktesterError;

/// The complete output of one simulation run: the full trade ledger plus the
/// performance report derived from it. Computed once, never re-derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestResult {
    pub ledger: Vec<LedgerEntry>,
    pub report: PerformanceReport,
}

/// Why a position was closed. Only used for logging; the ledger itself is
/// reason-agnostic.
#[derive(Debug, Clone, Copy, PartialEq)]
enum ExitReason {
    StopLoss,
    ProfitTarget,
    Signal,
    EndOfData,
}

struct OpenPosition {
    entry_price: f64,
    volume: f64,
}

/// The bar-by-bar simulator.
///
/// Entries execute at the bar close with the full balance
/// (`volume = balance / price`). While positioned, each bar is checked in a
/// fixed priority order: stop-loss against the bar low, then profit-target
/// against the bar high, then the strategy's own Exit signal at the close.
/// A bar wide enough to breach both thresholds resolves to the stop-loss.
pub struct Backtester {
    settings: SimulationSettings,
}

impl Backtester {
    pub fn new(settings: SimulationSettings) -> Self {
        Self { settings }
    }

    /// Runs the full simulation over `candles` and analyzes the ledger.
    ///
    /// An empty candle series is an error, never an empty report: the caller
    /// must be able to distinguish "no data" from "no trades".
    pub fn run(
        &self,
        params: &StrategyParams,
        candles: &[Candle],
        initial_capital: f64,
    ) -> Result<BacktestResult, BacktesterError> {
        if candles.is_empty() {
            return Err(BacktesterError::DataUnavailable);
        }

        let mut strategy = create_strategy(params)?;
        let profit_target = params.profit_target() / 100.0;
        let stop_loss = params.stop_loss() / 100.0;
        let reentry_interval_ms = self.settings.min_reentry_interval_ms;

        let capital = initial_capital.max(1.0);
        let mut balance = capital;
        let mut cumulative_profit = 0.0;
        let mut ledger: Vec<LedgerEntry> = Vec::new();
        let mut position: Option<OpenPosition> = None;
        let mut last_exit_ts: Option<i64> = None;

        tracing::info!(
            strategy = params.type_name(),
            bars = candles.len(),
            capital,
            "starting simulation"
        );

        for (index, candle) in candles.iter().enumerate() {
            let signal = strategy.evaluate(candle)?;
            let is_last_bar = index == candles.len() - 1;

            if let Some(open) = position.as_ref() {
                let entry_price = open.entry_price;
                let volume = open.volume;
                let stop_price = entry_price * (1.0 - stop_loss);
                let target_price = entry_price * (1.0 + profit_target);

                let exit = if candle.low_price <= stop_price {
                    Some((stop_price, ExitReason::StopLoss))
                } else if candle.high_price >= target_price {
                    Some((target_price, ExitReason::ProfitTarget))
                } else if signal == Some(Signal::Exit) {
                    Some((candle.trade_price, ExitReason::Signal))
                } else if is_last_bar {
                    Some((candle.trade_price, ExitReason::EndOfData))
                } else {
                    None
                };

                if let Some((exit_price, reason)) = exit {
                    position = None;
                    let profit = (exit_price - entry_price) * volume;
                    let profit_rate = (exit_price / entry_price - 1.0) * 100.0;
                    balance += profit;
                    cumulative_profit += profit;

                    tracing::debug!(
                        ?reason,
                        exit_price,
                        profit,
                        balance,
                        "closing position"
                    );

                    ledger.push(LedgerEntry {
                        timestamp: candle.timestamp,
                        side: TradeSide::Sell,
                        price: exit_price,
                        volume,
                        profit: Some(profit),
                        profit_rate: Some(profit_rate),
                        balance,
                        cumulative_profit,
                        cumulative_profit_rate: cumulative_profit / capital * 100.0,
                    });
                    last_exit_ts = Some(candle.timestamp);
                }
            } else if signal == Some(Signal::Enter) && !is_last_bar {
                // Whipsaw guard: no new entry until the re-entry interval has
                // elapsed since the last exit.
                let reentry_allowed = last_exit_ts
                    .is_none_or(|ts| candle.timestamp - ts >= reentry_interval_ms);
                if reentry_allowed {
                    let volume = balance / candle.trade_price;
                    tracing::debug!(price = candle.trade_price, volume, "opening position");
                    ledger.push(LedgerEntry {
                        timestamp: candle.timestamp,
                        side: TradeSide::Buy,
                        price: candle.trade_price,
                        volume,
                        profit: None,
                        profit_rate: None,
                        balance,
                        cumulative_profit,
                        cumulative_profit_rate: cumulative_profit / capital * 100.0,
                    });
                    position = Some(OpenPosition { entry_price: candle.trade_price, volume });
                }
            }
        }

        let report = PerformanceAnalyzer::new().analyze(&ledger, capital);
        tracing::info!(
            trades = report.total_trades,
            total_profit = report.total_profit,
            "simulation finished"
        );

        Ok(BacktestResult { ledger, report })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strategies::params::VolatilityBreakoutParams;

    fn breakout(k: f64, period: usize, profit_target: f64, stop_loss: f64) -> StrategyParams {
        StrategyParams::VolatilityBreakout(VolatilityBreakoutParams {
            k,
            period,
            profit_target,
            stop_loss,
        })
    }

    fn candle(ts: i64, open: f64, high: f64, low: f64, close: f64) -> Candle {
        Candle {
            timestamp: ts,
            opening_price: open,
            high_price: high,
            low_price: low,
            trade_price: close,
            candle_acc_trade_volume: 10.0,
        }
    }

    fn backtester() -> Backtester {
        Backtester::new(SimulationSettings::default())
    }

    #[test]
    fn empty_candles_is_an_error_not_an_empty_report() {
        let result = backtester().run(&breakout(0.5, 5, 1.0, 2.0), &[], 1_000_000.0);
        assert!(matches!(result, Err(BacktesterError::DataUnavailable)));
    }

    #[test]
    fn rising_series_enters_once_and_exits_at_profit_target() {
        // Bars climb one unit per minute. The first bar breaks its own target
        // (open 100 + 0.5 * range 1 = 100.5 < close 101), and the third bar's
        // high reaches the 1% profit target at 102.01.
        let candles: Vec<Candle> = (0..100)
            .map(|i| {
                let base = 100.0 + i as f64;
                candle(i * 60_000, base, base + 1.0, base, base + 1.0)
            })
            .collect();

        let result = backtester().run(&breakout(0.5, 5, 1.0, 2.0), &candles, 1_000_000.0).unwrap();

        assert_eq!(result.ledger.len(), 2);
        let entry = &result.ledger[0];
        let exit = &result.ledger[1];
        assert_eq!(entry.side, TradeSide::Buy);
        assert_eq!(entry.price, 101.0);
        assert_eq!(exit.side, TradeSide::Sell);
        assert!((exit.price - 102.01).abs() < 1e-9);
        assert!((exit.profit.unwrap() - 10_000.0).abs() < 1e-6);
        assert!((exit.cumulative_profit_rate - 1.0).abs() < 1e-9);
        assert_eq!(result.report.total_trades, 1);
        assert_eq!(result.report.win_count, 1);
    }

    #[test]
    fn stop_loss_wins_when_a_bar_breaches_both_thresholds() {
        let candles = vec![
            // Entry: range 1, target 100.5, close 101.
            candle(0, 100.0, 101.0, 100.0, 101.0),
            // Wide bar: low 90 breaches the 2% stop (98.98) and high 110
            // breaches the 1% target (102.01).
            candle(60_000, 101.0, 110.0, 90.0, 100.0),
        ];

        let result = backtester().run(&breakout(0.5, 5, 1.0, 2.0), &candles, 1_000_000.0).unwrap();

        let exit = &result.ledger[1];
        assert!((exit.price - 98.98).abs() < 1e-9);
        assert!((exit.profit_rate.unwrap() - (-2.0)).abs() < 1e-9);
        assert_eq!(result.report.loss_count, 1);
    }

    #[test]
    fn open_position_is_force_closed_at_the_final_bar() {
        let candles = vec![
            candle(0, 100.0, 101.0, 100.0, 101.0),
            // Final bar: neither threshold reached, position closed at 101.5.
            candle(60_000, 101.0, 102.0, 100.5, 101.5),
        ];

        let result = backtester().run(&breakout(0.5, 5, 1.0, 2.0), &candles, 1_000_000.0).unwrap();

        assert_eq!(result.ledger.len(), 2);
        let exit = &result.ledger[1];
        assert_eq!(exit.price, 101.5);
        assert!(exit.profit.unwrap() > 0.0);
    }

    #[test]
    fn reentry_is_blocked_inside_the_minimum_interval() {
        // 30-second bars: stop-loss exit on bar 1, a fresh breakout on bar 2.
        let candles = vec![
            candle(0, 100.0, 101.0, 100.0, 101.0),
            candle(30_000, 100.0, 101.0, 98.0, 98.0),
            candle(60_000, 100.0, 104.0, 100.0, 104.0),
            candle(90_000, 104.0, 104.5, 103.5, 104.0),
        ];
        let params = breakout(0.5, 5, 1.0, 2.0);

        let default_run = backtester().run(&params, &candles, 1_000_000.0).unwrap();
        // Entry, stop-loss exit; the bar-2 breakout is only 30s after the exit.
        assert_eq!(default_run.ledger.len(), 2);

        let eager = Backtester::new(SimulationSettings { min_reentry_interval_ms: 0 });
        let eager_run = eager.run(&params, &candles, 1_000_000.0).unwrap();
        assert!(eager_run.ledger.len() > 2);
    }

    #[test]
    fn non_positive_capital_is_clamped_to_one() {
        let candles = vec![
            candle(0, 100.0, 101.0, 100.0, 101.0),
            candle(60_000, 101.0, 102.0, 100.5, 101.5),
        ];

        let result = backtester().run(&breakout(0.5, 5, 1.0, 2.0), &candles, 0.0).unwrap();

        let entry = &result.ledger[0];
        assert!((entry.volume - 1.0 / 101.0).abs() < 1e-12);
        assert_eq!(entry.balance, 1.0);
    }

    #[test]
    fn flat_series_produces_no_trades() {
        let candles: Vec<Candle> =
            (0..50).map(|i| candle(i * 60_000, 100.0, 100.0, 100.0, 100.0)).collect();

        let result = backtester().run(&breakout(0.5, 5, 1.0, 2.0), &candles, 1_000_000.0).unwrap();

        assert!(result.ledger.is_empty());
        assert_eq!(result.report.total_trades, 0);
    }
}
