//! # Uptick Strategy Library
//!
//! This crate contains the trading logic for the Uptick system. It defines a
//! universal `Strategy` trait and provides the three concrete rule sets the
//! dashboard offers: volatility breakout, moving-average crossover, and RSI.
//!
//! ## Architectural Principles
//!
//! - **Pure logic crate:** No knowledge of transports, storage, or execution.
//!   It depends only on `core-types`.
//! - **Strategy-agnostic engine:** By using the `Strategy` trait, the
//!   `backtester` can replay any strategy without knowing its internals.
//! - **Extensibility:** Adding a strategy means a new module, a new
//!   `StrategyParams` variant, and a new arm in the factory.

pub mod catalog;
pub mod error;
pub mod factory;
pub mod moving_average;
pub mod params;
pub mod rsi;
pub mod volatility_breakout;

// Re-export the key components to create a clean, public-facing API.
pub use catalog::StrategyCatalog;
pub use error::StrategyError;
pub use factory::create_strategy;
pub use moving_average::MovingAverage;
pub use params::{
    MovingAverageParams, RsiParams, StrategyParams, TradingStrategy, VolatilityBreakoutParams,
};
pub use rsi::Rsi;
pub use volatility_breakout::VolatilityBreakout;

use core_types::Candle;

/// The action a strategy requests from the engine for the current bar.
///
/// Strategies only express entry and reversal-exit intent; profit targets and
/// stop losses are enforced by the simulator itself, in a fixed priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Enter,
    Exit,
}

/// The core trait that all trading strategies must implement.
///
/// The `&mut self` in `evaluate` is crucial, as every strategy maintains
/// internal state (rolling ranges, previous indicator values). The
/// `Send` bound allows strategy instances to be moved into worker tasks;
/// independent runs for different strategies are fully independent.
pub trait Strategy: Send {
    /// Evaluates the strategy against the latest bar.
    ///
    /// Only data up to and including this bar may influence the outcome; the
    /// simulator guarantees bars arrive strictly in order and never replays.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(Signal))` - if the strategy's conditions are met on this bar.
    /// * `Ok(None)` - if no action should be taken.
    /// * `Err(StrategyError)` - if an error occurs during evaluation.
    fn evaluate(&mut self, candle: &Candle) -> Result<Option<Signal>, StrategyError>;
}
