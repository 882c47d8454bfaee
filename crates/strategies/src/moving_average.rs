use core_types::Candle;
use ta::Next;
use ta::indicators::SimpleMovingAverage as Sma;

use crate::error::StrategyError;
use crate::params::MovingAverageParams;
use crate::{Signal, Strategy};

/// The moving-average crossover strategy.
///
/// A golden cross (short SMA crossing above the long SMA) is an entry; a dead
/// cross is a reversal exit. Crossovers are detected against the previous
/// bar's values, which implicitly handles the indicator warm-up period.
pub struct MovingAverage {
    ma_short: Sma,
    ma_long: Sma,
    // State: the previous values of both MAs to detect a crossover event.
    prev_short: Option<f64>,
    prev_long: Option<f64>,
}

impl MovingAverage {
    pub fn new(params: MovingAverageParams) -> Result<Self, StrategyError> {
        params.validate()?;
        Ok(Self {
            ma_short: Sma::new(params.short_period)
                .map_err(|e| StrategyError::IndicatorError(e.to_string()))?,
            ma_long: Sma::new(params.long_period)
                .map_err(|e| StrategyError::IndicatorError(e.to_string()))?,
            prev_short: None,
            prev_long: None,
        })
    }
}

impl Strategy for MovingAverage {
    fn evaluate(&mut self, candle: &Candle) -> Result<Option<Signal>, StrategyError> {
        let short = self.ma_short.next(candle.trade_price);
        let long = self.ma_long.next(candle.trade_price);

        let mut signal = None;
        if let (Some(prev_short), Some(prev_long)) = (self.prev_short, self.prev_long) {
            let golden_cross = prev_short <= prev_long && short > long;
            let dead_cross = prev_short >= prev_long && short < long;

            if golden_cross {
                signal = Some(Signal::Enter);
            } else if dead_cross {
                signal = Some(Signal::Exit);
            }
        }

        self.prev_short = Some(short);
        self.prev_long = Some(long);
        Ok(signal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> MovingAverageParams {
        MovingAverageParams { short_period: 2, long_period: 4, profit_target: 1.0, stop_loss: 1.0 }
    }

    fn bar(ts: i64, close: f64) -> Candle {
        Candle {
            timestamp: ts,
            opening_price: close,
            high_price: close,
            low_price: close,
            trade_price: close,
            candle_acc_trade_volume: 1.0,
        }
    }

    fn feed(strategy: &mut MovingAverage, closes: &[f64]) -> Vec<Option<Signal>> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| strategy.evaluate(&bar(i as i64 * 60_000, c)).unwrap())
            .collect()
    }

    #[test]
    fn golden_cross_after_downtrend_enters() {
        let mut strategy = MovingAverage::new(params()).unwrap();
        // Falling prices keep short below long, then a sharp rally crosses it above.
        let signals = feed(&mut strategy, &[110.0, 108.0, 106.0, 104.0, 102.0, 100.0, 120.0, 130.0]);
        assert!(signals.contains(&Some(Signal::Enter)));
        // The cross happens on the rally, not during the decline.
        assert!(signals[..6].iter().all(|s| *s != Some(Signal::Enter)));
    }

    #[test]
    fn dead_cross_after_uptrend_exits() {
        let mut strategy = MovingAverage::new(params()).unwrap();
        let signals = feed(&mut strategy, &[100.0, 102.0, 104.0, 106.0, 108.0, 110.0, 90.0, 80.0]);
        assert!(signals.contains(&Some(Signal::Exit)));
    }

    #[test]
    fn flat_series_produces_no_signal() {
        let mut strategy = MovingAverage::new(params()).unwrap();
        let signals = feed(&mut strategy, &[100.0, 100.0, 100.0, 100.0, 100.0, 100.0, 100.0]);
        assert!(signals.iter().all(|s| s.is_none()));
    }
}
