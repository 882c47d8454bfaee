use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// The three logical channel types the upstream feed multiplexes over one socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Ticker,
    Trade,
    Orderbook,
}

impl ChannelKind {
    /// The `type` tag used on the wire for both control frames and inbound frames.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::Ticker => "ticker",
            ChannelKind::Trade => "trade",
            ChannelKind::Orderbook => "orderbook",
        }
    }

    /// All channel kinds, in the order control frames list them.
    pub const ALL: [ChannelKind; 3] = [ChannelKind::Ticker, ChannelKind::Trade, ChannelKind::Orderbook];
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    /// Returns the opposite side of the trade.
    pub fn opposite(&self) -> Self {
        match self {
            TradeSide::Buy => TradeSide::Sell,
            TradeSide::Sell => TradeSide::Buy,
        }
    }

    /// Direction multiplier for P&L: +1 for a long entry, -1 for a short entry.
    pub fn sign(&self) -> f64 {
        match self {
            TradeSide::Buy => 1.0,
            TradeSide::Sell => -1.0,
        }
    }
}

/// Taker side of a tick on the public trade stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AskBid {
    Ask,
    Bid,
}

/// Price direction relative to the previous close, as tagged by the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeDirection {
    Rise,
    Even,
    Fall,
}

/// The lookback window for a backtest run, in the upstream API's period notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "1M")]
    OneMonth,
    #[serde(rename = "3M")]
    ThreeMonths,
    #[serde(rename = "6M")]
    SixMonths,
    #[serde(rename = "1Y")]
    OneYear,
}

impl Period {
    /// Number of one-minute candles covering the period.
    pub fn candle_count(&self) -> usize {
        match self {
            Period::OneMonth => 43_200,    // 30d * 24h * 60m
            Period::ThreeMonths => 129_600,
            Period::SixMonths => 259_200,
            Period::OneYear => 525_600,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::OneMonth => "1M",
            Period::ThreeMonths => "3M",
            Period::SixMonths => "6M",
            Period::OneYear => "1Y",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1M" => Ok(Period::OneMonth),
            "3M" => Ok(Period::ThreeMonths),
            "6M" => Ok(Period::SixMonths),
            "1Y" => Ok(Period::OneYear),
            other => Err(CoreError::InvalidInput(
                "period".to_string(),
                format!("'{}' is not one of 1M, 3M, 6M, 1Y", other),
            )),
        }
    }
}
