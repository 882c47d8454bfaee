use chrono::{DateTime, Timelike, Utc};
use core_types::{LedgerEntry, TradeSide};

use crate::report::{
    DailyReturn, HoldingTime, MonthlyReturn, PerformanceReport, RiskMetrics, TimeBuckets,
    TradePatterns, VolumeProfile,
};

/// Trading days used to annualize the Sharpe ratio and the Calmar numerator.
const ANNUALIZATION_DAYS: f64 = 252.0;

/// A stateless calculator for deriving performance metrics from a trade ledger.
#[derive(Debug, Default)]
pub struct PerformanceAnalyzer {}

/// A completed round trip reconstructed from a BUY entry and its paired SELL.
struct RoundTrip {
    entry_ts: i64,
    exit_ts: i64,
    volume: f64,
    profit: f64,
}

impl PerformanceAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes the full report for one ledger.
    ///
    /// The ledger must be in emission order (the simulator guarantees this).
    /// Infallible by design: an empty ledger is a zeroed report and every
    /// degenerate denominator resolves to its documented sentinel.
    pub fn analyze(&self, trades: &[LedgerEntry], initial_capital: f64) -> PerformanceReport {
        let mut report = PerformanceReport::new();
        if trades.is_empty() {
            return report;
        }

        let round_trips = pair_round_trips(trades);

        self.calculate_profitability(&round_trips, initial_capital, &mut report);
        self.calculate_drawdown(trades, initial_capital, &mut report);
        report.sharpe_ratio = self.calculate_sharpe(trades);
        self.calculate_recovery(initial_capital, &mut report);
        report.monthly_returns = self.bucket_monthly(trades);
        report.daily_returns = self.bucket_daily(trades);
        report.trade_patterns = self.analyze_patterns(&round_trips);

        report
    }

    fn calculate_profitability(
        &self,
        round_trips: &[RoundTrip],
        initial_capital: f64,
        report: &mut PerformanceReport,
    ) {
        report.total_trades = round_trips.len();

        let mut gross_profit = 0.0;
        let mut gross_loss = 0.0;
        for trip in round_trips {
            report.total_profit += trip.profit;
            if trip.profit > 0.0 {
                report.win_count += 1;
                gross_profit += trip.profit;
                report.largest_win = report.largest_win.max(trip.profit);
            } else {
                report.loss_count += 1;
                gross_loss += trip.profit.abs();
                report.largest_loss = report.largest_loss.min(trip.profit);
            }
        }

        if initial_capital > 0.0 {
            report.profit_rate = report.total_profit / initial_capital * 100.0;
        }
        if report.total_trades > 0 {
            report.win_rate = report.win_count as f64 / report.total_trades as f64 * 100.0;
        }
        if report.win_count > 0 {
            report.average_win = gross_profit / report.win_count as f64;
        }
        if report.loss_count > 0 {
            report.average_loss = gross_loss / report.loss_count as f64;
        }

        // Gross loss of zero is a defined degenerate case, not an error.
        report.profit_factor = if gross_loss > 0.0 {
            gross_profit / gross_loss
        } else if gross_profit > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        let win_fraction = report.win_rate / 100.0;
        report.expectancy =
            win_fraction * report.average_win - (1.0 - win_fraction) * report.average_loss;
    }

    /// Largest peak-to-trough decline of the balance curve, as a percent of
    /// the peak. The curve is seeded with the initial capital so a ledger that
    /// only ever loses still shows a drawdown.
    fn calculate_drawdown(
        &self,
        trades: &[LedgerEntry],
        initial_capital: f64,
        report: &mut PerformanceReport,
    ) {
        let mut peak = initial_capital;
        let mut max_drawdown: f64 = 0.0;
        for trade in trades {
            if trade.balance > peak {
                peak = trade.balance;
            } else if peak > 0.0 {
                let drawdown = (peak - trade.balance) / peak * 100.0;
                max_drawdown = max_drawdown.max(drawdown);
            }
        }
        report.max_drawdown = max_drawdown;
    }

    /// Annualized Sharpe over per-day balance returns; zero when the return
    /// series is empty or has no variance.
    fn calculate_sharpe(&self, trades: &[LedgerEntry]) -> f64 {
        let daily_returns = daily_balance_returns(trades);
        if daily_returns.len() < 2 {
            return 0.0;
        }
        let mean = mean(&daily_returns);
        let std_dev = std_dev(&daily_returns);
        if std_dev == 0.0 {
            return 0.0;
        }
        mean / std_dev * ANNUALIZATION_DAYS.sqrt()
    }

    fn calculate_recovery(&self, initial_capital: f64, report: &mut PerformanceReport) {
        let drawdown_amount = report.max_drawdown / 100.0 * initial_capital;
        report.recovery_factor = if drawdown_amount > 0.0 {
            report.total_profit / drawdown_amount
        } else if report.total_profit > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };
    }

    fn bucket_monthly(&self, trades: &[LedgerEntry]) -> Vec<MonthlyReturn> {
        bucket_by_key(trades, |ts| ts.format("%Y-%m").to_string())
            .into_iter()
            .map(|(month, b)| MonthlyReturn {
                month,
                profit: b.profit,
                profit_rate: b.profit_rate(),
                trades: b.trades,
            })
            .collect()
    }

    fn bucket_daily(&self, trades: &[LedgerEntry]) -> Vec<DailyReturn> {
        bucket_by_key(trades, |ts| ts.format("%Y-%m-%d").to_string())
            .into_iter()
            .map(|(date, b)| DailyReturn {
                date,
                profit: b.profit,
                profit_rate: b.profit_rate(),
                trades: b.trades,
            })
            .collect()
    }

    fn analyze_patterns(&self, round_trips: &[RoundTrip]) -> TradePatterns {
        let mut patterns = TradePatterns::default();

        let mut win_streak = 0usize;
        let mut loss_streak = 0usize;
        let mut profitable_minutes = Vec::new();
        let mut unprofitable_minutes = Vec::new();

        for trip in round_trips {
            // Time-of-day bands keyed by the entry hour.
            let hour = timestamp_utc(trip.entry_ts).hour();
            let (count, profit_sum) = match hour {
                9..=11 => (&mut patterns.time_of_day.morning, &mut patterns.profit_by_time.morning),
                12..=14 => {
                    (&mut patterns.time_of_day.afternoon, &mut patterns.profit_by_time.afternoon)
                }
                15..=17 => (&mut patterns.time_of_day.evening, &mut patterns.profit_by_time.evening),
                _ => (&mut patterns.time_of_day.night, &mut patterns.profit_by_time.night),
            };
            *count += 1;
            *profit_sum += trip.profit;

            // Streaks reset on the opposite outcome.
            if trip.profit > 0.0 {
                win_streak += 1;
                loss_streak = 0;
                patterns.consecutive_wins = patterns.consecutive_wins.max(win_streak);
            } else {
                loss_streak += 1;
                win_streak = 0;
                patterns.consecutive_losses = patterns.consecutive_losses.max(loss_streak);
            }

            let held_minutes = (trip.exit_ts - trip.entry_ts) as f64 / 60_000.0;
            if trip.profit > 0.0 {
                profitable_minutes.push(held_minutes);
            } else {
                unprofitable_minutes.push(held_minutes);
            }
        }

        patterns.average_holding_time = HoldingTime {
            profitable: if profitable_minutes.is_empty() { 0.0 } else { mean(&profitable_minutes) },
            unprofitable: if unprofitable_minutes.is_empty() {
                0.0
            } else {
                mean(&unprofitable_minutes)
            },
        };
        patterns.volume_profile = volume_terciles(round_trips);

        patterns
    }

    /// Benchmark-relative risk measures over aligned daily-return series.
    ///
    /// The two series are truncated to their common length; an empty overlap
    /// yields all-zero metrics.
    pub fn risk_metrics(&self, returns: &[f64], benchmark: &[f64]) -> RiskMetrics {
        let n = returns.len().min(benchmark.len());
        let zeroed = RiskMetrics {
            value_at_risk: 0.0,
            expected_shortfall: 0.0,
            beta: 0.0,
            correlation: 0.0,
            information_ratio: 0.0,
            sortino_ratio: 0.0,
            treynor_ratio: 0.0,
            calmar_ratio: 0.0,
        };
        if n == 0 {
            return zeroed;
        }
        let returns = &returns[..n];
        let benchmark = &benchmark[..n];

        let mut metrics = zeroed;

        // Empirical 95% VaR: the 5th percentile of the distribution,
        // sign-flipped to a positive loss magnitude.
        let mut sorted = returns.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let var_index = (0.05 * n as f64).floor() as usize;
        let var_threshold = sorted[var_index.min(n - 1)];
        metrics.value_at_risk = (-var_threshold).max(0.0);

        let tail: Vec<f64> = returns.iter().copied().filter(|r| *r <= var_threshold).collect();
        if !tail.is_empty() {
            metrics.expected_shortfall = (-mean(&tail)).max(0.0);
        }

        let mean_return = mean(returns);
        let mean_benchmark = mean(benchmark);
        let benchmark_variance = variance(benchmark);
        let covariance = covariance(returns, benchmark);

        if benchmark_variance > 0.0 {
            metrics.beta = covariance / benchmark_variance;
        }

        let return_std = variance(returns).sqrt();
        let benchmark_std = benchmark_variance.sqrt();
        if return_std > 0.0 && benchmark_std > 0.0 {
            metrics.correlation = covariance / (return_std * benchmark_std);
        }

        let excess: Vec<f64> = returns.iter().zip(benchmark).map(|(r, b)| r - b).collect();
        let tracking_error = variance(&excess).sqrt();
        if tracking_error > 0.0 {
            metrics.information_ratio = mean(&excess) / tracking_error;
        }

        // Downside deviation uses only the negative returns.
        let downside_sq: f64 =
            returns.iter().filter(|r| **r < 0.0).map(|r| r * r).sum::<f64>() / n as f64;
        let downside_dev = downside_sq.sqrt();
        if downside_dev > 0.0 {
            metrics.sortino_ratio = mean_return / downside_dev;
        }

        if metrics.beta != 0.0 {
            metrics.treynor_ratio = (mean_return - mean_benchmark) / metrics.beta;
        }

        // Calmar: annualized return over the max drawdown of the compounded curve.
        let annualized = mean_return * ANNUALIZATION_DAYS;
        let drawdown = max_drawdown_of_returns(returns);
        metrics.calmar_ratio = if drawdown > 0.0 {
            annualized / drawdown
        } else if annualized > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        metrics
    }
}

/// Pairs each BUY entry with the SELL that closes it, in ledger order.
/// A trailing entry with no exit (only possible in a live ledger) is dropped.
fn pair_round_trips(trades: &[LedgerEntry]) -> Vec<RoundTrip> {
    let mut round_trips = Vec::new();
    let mut open: Option<&LedgerEntry> = None;
    for trade in trades {
        match trade.side {
            TradeSide::Buy => open = Some(trade),
            TradeSide::Sell => {
                if let Some(entry) = open.take() {
                    round_trips.push(RoundTrip {
                        entry_ts: entry.timestamp,
                        exit_ts: trade.timestamp,
                        volume: trade.volume,
                        profit: trade.profit.unwrap_or(0.0),
                    });
                }
            }
        }
    }
    round_trips
}

struct Bucket {
    profit: f64,
    /// Balance just before the bucket's first entry settled.
    start_balance: f64,
    trades: usize,
}

impl Bucket {
    fn profit_rate(&self) -> f64 {
        if self.start_balance > 0.0 { self.profit / self.start_balance * 100.0 } else { 0.0 }
    }
}

/// Groups ledger entries by a calendar key, attributing each exit's realized
/// profit to the bucket of its exit timestamp. A round trip held across a
/// bucket boundary therefore books its whole profit where it closed, and the
/// bucket profits always sum to the ledger's total profit.
fn bucket_by_key(
    trades: &[LedgerEntry],
    key: impl Fn(&DateTime<Utc>) -> String,
) -> Vec<(String, Bucket)> {
    use std::collections::BTreeMap;

    let mut buckets: BTreeMap<String, Bucket> = BTreeMap::new();
    for trade in trades {
        let bucket = buckets.entry(key(&timestamp_utc(trade.timestamp))).or_insert(Bucket {
            profit: 0.0,
            start_balance: trade.balance - trade.profit.unwrap_or(0.0),
            trades: 0,
        });
        if trade.is_exit() {
            bucket.profit += trade.profit.unwrap_or(0.0);
            bucket.trades += 1;
        }
    }
    buckets.into_iter().collect()
}

fn daily_balance_returns(trades: &[LedgerEntry]) -> Vec<f64> {
    bucket_by_key(trades, |ts| ts.format("%Y-%m-%d").to_string())
        .into_iter()
        .map(|(_, b)| b.profit_rate() / 100.0)
        .collect()
}

fn volume_terciles(round_trips: &[RoundTrip]) -> VolumeProfile {
    let mut profile = VolumeProfile::default();
    let volumes: Vec<f64> = round_trips.iter().map(|t| t.volume).collect();
    if volumes.is_empty() {
        return profile;
    }
    if volumes.len() < 3 {
        profile.medium = volumes.len();
        return profile;
    }

    let mut sorted = volumes.clone();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let third = sorted.len() / 3;
    let low_cut = sorted[third];
    let high_cut = sorted[sorted.len() - third];

    for v in &volumes {
        if *v >= high_cut {
            profile.high += 1;
        } else if *v < low_cut {
            profile.low += 1;
        } else {
            profile.medium += 1;
        }
    }
    profile
}

fn timestamp_utc(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() { 0.0 } else { values.iter().sum::<f64>() / values.len() as f64 }
}

fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64
}

fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

fn covariance(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n == 0 {
        return 0.0;
    }
    let mean_a = mean(&a[..n]);
    let mean_b = mean(&b[..n]);
    a[..n].iter().zip(&b[..n]).map(|(x, y)| (x - mean_a) * (y - mean_b)).sum::<f64>() / n as f64
}

/// Max drawdown (as a positive fraction) of the equity curve compounded from
/// a return series.
fn max_drawdown_of_returns(returns: &[f64]) -> f64 {
    let mut equity = 1.0;
    let mut peak = 1.0f64;
    let mut max_dd = 0.0f64;
    for r in returns {
        equity *= 1.0 + r;
        if equity > peak {
            peak = equity;
        } else if peak > 0.0 {
            max_dd = max_dd.max((peak - equity) / peak);
        }
    }
    max_dd
}
