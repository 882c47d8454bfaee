use backtester::BacktestResult;
use chrono::{DateTime, Utc};
use core_types::Period;
use serde::{Deserialize, Serialize};
use strategies::params::TradingStrategy;

use crate::error::StorageError;

/// A self-contained backtest export: everything needed to reproduce and audit
/// one run in a single JSON artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub exported_at: DateTime<Utc>,
    pub strategy: TradingStrategy,
    pub period: Period,
    pub initial_capital: f64,
    pub result: BacktestResult,
}

impl ExportDocument {
    pub fn new(
        strategy: TradingStrategy,
        period: Period,
        initial_capital: f64,
        result: BacktestResult,
    ) -> Self {
        Self { exported_at: Utc::now(), strategy, period, initial_capital, result }
    }

    pub fn to_json(&self) -> Result<String, StorageError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analytics::PerformanceReport;
    use strategies::params::{StrategyParams, VolatilityBreakoutParams};

    #[test]
    fn export_embeds_the_full_run_context() {
        let strategy = TradingStrategy::new(
            "KRW-BTC",
            StrategyParams::VolatilityBreakout(VolatilityBreakoutParams {
                k: 0.5,
                period: 5,
                profit_target: 1.0,
                stop_loss: 2.0,
            }),
        );
        let result = BacktestResult { ledger: Vec::new(), report: PerformanceReport::new() };
        let doc = ExportDocument::new(strategy, Period::OneMonth, 1_000_000.0, result);

        let json: serde_json::Value = serde_json::from_str(&doc.to_json().unwrap()).unwrap();
        assert_eq!(json["period"], "1M");
        assert_eq!(json["initialCapital"], 1_000_000.0);
        assert_eq!(json["strategy"]["type"], "VOLATILITY_BREAKOUT");
        assert!(json["exportedAt"].is_string());
        assert!(json["result"]["ledger"].is_array());
    }
}
