use core_types::Candle;
use ta::Next;
use ta::indicators::RelativeStrengthIndex;

use crate::error::StrategyError;
use crate::params::RsiParams;
use crate::{Signal, Strategy};

/// The RSI threshold strategy.
///
/// Entry fires when the RSI crosses down through the oversold level (buying
/// the washout), exit when it crosses up through the overbought level. Both
/// are edge-triggered against the previous bar's RSI so a market parked in an
/// extreme zone does not re-signal on every bar.
pub struct Rsi {
    params: RsiParams,
    rsi: RelativeStrengthIndex,
    prev_rsi: Option<f64>,
}

impl Rsi {
    pub fn new(params: RsiParams) -> Result<Self, StrategyError> {
        params.validate()?;
        Ok(Self {
            params,
            rsi: RelativeStrengthIndex::new(params.period)
                .map_err(|e| StrategyError::IndicatorError(e.to_string()))?,
            prev_rsi: None,
        })
    }
}

impl Strategy for Rsi {
    fn evaluate(&mut self, candle: &Candle) -> Result<Option<Signal>, StrategyError> {
        let value = self.rsi.next(candle.trade_price);

        let mut signal = None;
        if let Some(prev) = self.prev_rsi {
            if prev >= self.params.oversold && value < self.params.oversold {
                signal = Some(Signal::Enter);
            } else if prev <= self.params.overbought && value > self.params.overbought {
                signal = Some(Signal::Exit);
            }
        }

        self.prev_rsi = Some(value);
        Ok(signal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> RsiParams {
        RsiParams { period: 3, oversold: 30.0, overbought: 70.0, profit_target: 1.0, stop_loss: 1.0 }
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

    fn feed(strategy: &mut Rsi, closes: impl IntoIterator<Item = f64>) -> Vec<Option<Signal>> {
        closes
            .into_iter()
            .enumerate()
            .map(|(i, c)| strategy.evaluate(&bar(i as i64 * 60_000, c)).unwrap())
            .collect()
    }

    #[test]
    fn washout_crosses_into_oversold_once() {
        let mut strategy = Rsi::new(params()).unwrap();
        // Flat warm-up, then a steady decline drives the RSI down through 30.
        let mut closes = vec![100.0; 5];
        closes.extend((1..=15).map(|i| 100.0 - i as f64));
        let signals = feed(&mut strategy, closes);

        let entries = signals.iter().filter(|s| **s == Some(Signal::Enter)).count();
        assert_eq!(entries, 1);
        assert!(signals[..5].iter().all(|s| s.is_none()));
    }

    #[test]
    fn recovery_crosses_into_overbought() {
        let mut strategy = Rsi::new(params()).unwrap();
        let mut closes = vec![100.0; 5];
        closes.extend((1..=10).map(|i| 100.0 - i as f64)); // down to 90
        closes.extend((1..=25).map(|i| 90.0 + i as f64)); // strong recovery
        let signals = feed(&mut strategy, closes);

        assert!(signals.contains(&Some(Signal::Enter)));
        assert!(signals.contains(&Some(Signal::Exit)));
    }

    #[test]
    fn parked_in_oversold_does_not_re_signal() {
        let mut strategy = Rsi::new(params()).unwrap();
        let mut closes = vec![100.0; 5];
        closes.extend((1..=10).map(|i| 100.0 - i as f64));
        closes.extend(vec![90.0; 10]); // flat at the bottom
        let signals = feed(&mut strategy, closes);

        let entries = signals.iter().filter(|s| **s == Some(Signal::Enter)).count();
        assert_eq!(entries, 1);
    }
}
