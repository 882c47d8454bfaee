//! The bar-by-bar backtest simulator.
//!
//! Strictly sequential: each bar is seen exactly once, in order, and no
//! decision ever looks ahead. The simulator owns execution mechanics (sizing,
//! exits, the ledger); the strategy only emits entry and exit intents.

pub mod engine;
pub mod error;

pub use engine::{BacktestResult, Backtester};
pub use error::BacktesterError;
