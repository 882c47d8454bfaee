//! Typed views of the upstream market-data frames.
//!
//! Every inbound frame carries a `type` tag and a `code` (market identifier);
//! together they attribute the frame to exactly one [`ChannelKey`]. The enum is
//! internally tagged so decoding and dispatch are a single exhaustive match
//! rather than runtime field inspection.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::enums::{AskBid, ChangeDirection, ChannelKind};

/// Identifies one logical live-data subscription: a channel type plus a market code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelKey {
    pub kind: ChannelKind,
    pub code: String,
}

impl ChannelKey {
    pub fn new(kind: ChannelKind, code: impl Into<String>) -> Self {
        Self { kind, code: code.into() }
    }
}

impl fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.code)
    }
}

/// Snapshot of the current price state of one market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerTick {
    pub code: String,
    pub opening_price: f64,
    pub high_price: f64,
    pub low_price: f64,
    pub trade_price: f64,
    pub prev_closing_price: f64,
    pub change: ChangeDirection,
    pub change_price: f64,
    pub change_rate: f64,
    pub signed_change_price: f64,
    pub signed_change_rate: f64,
    pub trade_volume: f64,
    pub acc_trade_volume: f64,
    pub acc_trade_price: f64,
    /// Feed-assigned timestamp, milliseconds since epoch.
    pub timestamp: i64,
}

/// One execution on the public trade stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeTick {
    pub code: String,
    pub trade_price: f64,
    pub trade_volume: f64,
    pub ask_bid: AskBid,
    pub prev_closing_price: f64,
    pub change: ChangeDirection,
    pub change_price: f64,
    /// Execution time, milliseconds since epoch.
    pub trade_timestamp: i64,
    /// Feed-assigned timestamp, milliseconds since epoch.
    pub timestamp: i64,
    pub sequential_id: u64,
}

/// One rung of the order book ladder: best ask/bid pair at a depth level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderbookUnit {
    pub ask_price: f64,
    pub bid_price: f64,
    pub ask_size: f64,
    pub bid_size: f64,
}

/// Full order book snapshot for one market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderbookSnapshot {
    pub code: String,
    pub total_ask_size: f64,
    pub total_bid_size: f64,
    pub orderbook_units: Vec<OrderbookUnit>,
    /// Feed-assigned timestamp, milliseconds since epoch.
    pub timestamp: i64,
}

/// The closed set of messages the feed can deliver, dispatched by the `type` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MarketMessage {
    Ticker(TickerTick),
    Trade(TradeTick),
    Orderbook(OrderbookSnapshot),
}

impl MarketMessage {
    /// The market code this message belongs to.
    pub fn code(&self) -> &str {
        match self {
            MarketMessage::Ticker(t) => &t.code,
            MarketMessage::Trade(t) => &t.code,
            MarketMessage::Orderbook(o) => &o.code,
        }
    }

    pub fn kind(&self) -> ChannelKind {
        match self {
            MarketMessage::Ticker(_) => ChannelKind::Ticker,
            MarketMessage::Trade(_) => ChannelKind::Trade,
            MarketMessage::Orderbook(_) => ChannelKind::Orderbook,
        }
    }

    /// The unique channel key this message is attributable to.
    pub fn channel_key(&self) -> ChannelKey {
        ChannelKey::new(self.kind(), self.code())
    }
}
