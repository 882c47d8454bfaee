use std::collections::VecDeque;

use core_types::Candle;

use crate::error::StrategyError;
use crate::params::VolatilityBreakoutParams;
use crate::{Signal, Strategy};

/// The volatility-breakout strategy.
///
/// A target price is derived from the bar's open plus `k` times the trailing
/// high-low range. A close strictly above the target is a breakout entry; a
/// close falling back at least 1% below the target is a reversal exit. On a
/// flat series the range is zero, the target collapses onto the open, and the
/// strict comparison guarantees no entry ever fires.
pub struct VolatilityBreakout {
    params: VolatilityBreakoutParams,
    // Trailing (high, low) pairs for the range window, most recent last.
    window: VecDeque<(f64, f64)>,
}

impl VolatilityBreakout {
    pub fn new(params: VolatilityBreakoutParams) -> Result<Self, StrategyError> {
        params.validate()?;
        Ok(Self { params, window: VecDeque::with_capacity(params.period + 1) })
    }

    fn trailing_range(&self) -> f64 {
        let mut high = f64::MIN;
        let mut low = f64::MAX;
        for &(h, l) in &self.window {
            high = high.max(h);
            low = low.min(l);
        }
        (high - low).max(0.0)
    }
}

impl Strategy for VolatilityBreakout {
    fn evaluate(&mut self, candle: &Candle) -> Result<Option<Signal>, StrategyError> {
        self.window.push_back((candle.high_price, candle.low_price));
        if self.window.len() > self.params.period {
            self.window.pop_front();
        }

        let range = self.trailing_range();
        let target = candle.opening_price + range * self.params.k;

        tracing::trace!(
            code = "volatility_breakout",
            range,
            target,
            close = candle.trade_price,
            "evaluated bar"
        );

        if candle.trade_price > target {
            return Ok(Some(Signal::Enter));
        }
        if candle.trade_price <= target * 0.99 {
            return Ok(Some(Signal::Exit));
        }
        Ok(None)
    }
}
