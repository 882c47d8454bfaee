use thiserror::Error;

#[derive(Error, Debug)]
pub enum BacktesterError {
    #[error("No candle data available for the requested market and period")]
    DataUnavailable,

    #[error("Strategy error during simulation: {0}")]
    Strategy(#[from] strategies::error::StrategyError),
}
