use serde::{Deserialize, Serialize};

use crate::enums::TradeSide;

/// One historical OHLC bar, in the upstream candle API's field naming
/// (`trade_price` is the close).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Bar timestamp, milliseconds since epoch.
    pub timestamp: i64,
    pub opening_price: f64,
    pub high_price: f64,
    pub low_price: f64,
    pub trade_price: f64,
    pub candle_acc_trade_volume: f64,
}

impl Candle {
    /// High-low range of the bar.
    pub fn range(&self) -> f64 {
        self.high_price - self.low_price
    }
}

/// One entry in the append-only trade ledger produced by a simulation run.
///
/// Entries are emitted strictly in timestamp order and never mutated afterwards.
/// `profit`/`profit_rate` are only present on exits (paired against the entry);
/// the cumulative fields track the whole run up to and including this entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    /// Execution timestamp, milliseconds since epoch.
    pub timestamp: i64,
    #[serde(rename = "type")]
    pub side: TradeSide,
    pub price: f64,
    pub volume: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profit: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profit_rate: Option<f64>,
    /// Cash balance after this execution settled.
    pub balance: f64,
    pub cumulative_profit: f64,
    pub cumulative_profit_rate: f64,
}

impl LedgerEntry {
    /// Whether this entry closed a position (exits carry realized profit).
    pub fn is_exit(&self) -> bool {
        self.side == TradeSide::Sell
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_entry_uses_frontend_field_names() {
        let entry = LedgerEntry {
            timestamp: 1700000000000,
            side: TradeSide::Sell,
            price: 101.0,
            volume: 2.0,
            profit: Some(2.0),
            profit_rate: Some(1.0),
            balance: 1002.0,
            cumulative_profit: 2.0,
            cumulative_profit_rate: 0.2,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["type"], "SELL");
        assert_eq!(json["profitRate"], 1.0);
        assert_eq!(json["cumulativeProfitRate"], 0.2);
    }

    #[test]
    fn entry_profit_fields_are_omitted_when_absent() {
        let entry = LedgerEntry {
            timestamp: 0,
            side: TradeSide::Buy,
            price: 100.0,
            volume: 1.0,
            profit: None,
            profit_rate: None,
            balance: 0.0,
            cumulative_profit: 0.0,
            cumulative_profit_rate: 0.0,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("profit").is_none());
        assert!(!entry.is_exit());
    }
}
