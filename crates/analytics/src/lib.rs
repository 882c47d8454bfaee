//! Performance analytics over simulated or live trade ledgers.
//!
//! The analyzer is a pure function of the ledger: feeding it the same entries
//! always produces the same report, which is what makes backtest results
//! reproducible and comparable across runs. It is also infallible; degenerate
//! inputs resolve to zeroed reports and documented sentinel values.

pub mod engine;
pub mod report;

pub use engine::PerformanceAnalyzer;
pub use report::{
    DailyReturn, HoldingTime, MonthlyReturn, PerformanceReport, RiskMetrics, TimeBuckets,
    TradePatterns, VolumeProfile,
};
