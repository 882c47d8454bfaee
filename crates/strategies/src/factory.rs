use crate::error::StrategyError;
use crate::moving_average::MovingAverage;
use crate::params::StrategyParams;
use crate::rsi::Rsi;
use crate::volatility_breakout::VolatilityBreakout;
use crate::Strategy;

/// Creates a fresh strategy instance from a parameter set.
///
/// Every call returns a new instance with clean internal state, so a second
/// backtest of the same definition re-derives its indicators from scratch.
/// The match is exhaustive; the compiler will flag a new `StrategyParams`
/// variant that is not handled here.
pub fn create_strategy(params: &StrategyParams) -> Result<Box<dyn Strategy>, StrategyError> {
    match params {
        StrategyParams::VolatilityBreakout(p) => Ok(Box::new(VolatilityBreakout::new(*p)?)),
        StrategyParams::MovingAverage(p) => Ok(Box::new(MovingAverage::new(*p)?)),
        StrategyParams::Rsi(p) => Ok(Box::new(Rsi::new(*p)?)),
    }
}
