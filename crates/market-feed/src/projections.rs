//! Per-market read models over the shared message stream.
//!
//! A [`MarketProjection`] binds to one market code: it takes one reference on
//! each of the market's three channels, observes the message stream, and folds
//! matching messages into a snapshot consumers can read at any time. Dropping
//! the projection releases the references and the observer again.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use core_types::{ChannelKey, ChannelKind, MarketMessage, OrderbookSnapshot, TickerTick, TradeTick};

use crate::connection::MarketFeed;
use crate::observers::ObserverId;

/// The folded state of one market. Pure with respect to the stream: the same
/// message sequence always produces the same state.
#[derive(Debug, Clone)]
pub struct ProjectionState {
    capacity: usize,
    ticker: Option<TickerTick>,
    /// Most recent first.
    trades: VecDeque<TradeTick>,
    orderbook: Option<OrderbookSnapshot>,
}

impl ProjectionState {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            ticker: None,
            trades: VecDeque::with_capacity(capacity.max(1)),
            orderbook: None,
        }
    }

    /// Folds one message into the state.
    ///
    /// Tickers replace wholesale; trades prepend with FIFO eviction at
    /// capacity; an orderbook with the same timestamp as the current one is
    /// dropped (the feed re-sends unchanged books).
    pub fn apply(&mut self, message: &MarketMessage) {
        match message {
            MarketMessage::Ticker(ticker) => {
                self.ticker = Some(ticker.clone());
            }
            MarketMessage::Trade(trade) => {
                self.trades.push_front(trade.clone());
                self.trades.truncate(self.capacity);
            }
            MarketMessage::Orderbook(orderbook) => {
                let duplicate =
                    self.orderbook.as_ref().is_some_and(|b| b.timestamp == orderbook.timestamp);
                if !duplicate {
                    self.orderbook = Some(orderbook.clone());
                }
            }
        }
    }

    pub fn ticker(&self) -> Option<&TickerTick> {
        self.ticker.as_ref()
    }

    pub fn trades(&self) -> &VecDeque<TradeTick> {
        &self.trades
    }

    pub fn orderbook(&self) -> Option<&OrderbookSnapshot> {
        self.orderbook.as_ref()
    }

    pub fn clear_trades(&mut self) {
        self.trades.clear();
    }
}

/// Live view of one market, kept current by the feed.
pub struct MarketProjection {
    feed: MarketFeed,
    code: String,
    state: Arc<Mutex<ProjectionState>>,
    observer: ObserverId,
}

impl MarketProjection {
    /// Subscribes the market's three channels and starts folding its messages.
    pub fn bind(feed: &MarketFeed, code: impl Into<String>) -> Self {
        let code = code.into();
        for kind in ChannelKind::ALL {
            feed.subscribe(ChannelKey::new(kind, code.clone()));
        }

        let state = Arc::new(Mutex::new(ProjectionState::new(
            feed.settings().trade_history_limit,
        )));
        let observer = {
            let state = Arc::clone(&state);
            let code = code.clone();
            feed.add_message_observer(move |message| {
                if message.code() == code {
                    state.lock().unwrap_or_else(|e| e.into_inner()).apply(message);
                }
            })
        };

        Self { feed: feed.clone(), code, state, observer }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn ticker(&self) -> Option<TickerTick> {
        self.lock_state().ticker().cloned()
    }

    /// The retained trades, most recent first.
    pub fn trades(&self) -> Vec<TradeTick> {
        self.lock_state().trades().iter().cloned().collect()
    }

    pub fn orderbook(&self) -> Option<OrderbookSnapshot> {
        self.lock_state().orderbook().cloned()
    }

    pub fn clear_trades(&self) {
        self.lock_state().clear_trades();
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, ProjectionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for MarketProjection {
    fn drop(&mut self) {
        self.feed.remove_message_observer(self.observer);
        for kind in ChannelKind::ALL {
            self.feed.unsubscribe(&ChannelKey::new(kind, self.code.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use configuration::FeedSettings;
    use core_types::{AskBid, ChangeDirection};

    fn ticker(code: &str, price: f64, ts: i64) -> MarketMessage {
        MarketMessage::Ticker(TickerTick {
            code: code.to_string(),
            opening_price: price,
            high_price: price,
            low_price: price,
            trade_price: price,
            prev_closing_price: price,
            change: ChangeDirection::Even,
            change_price: 0.0,
            change_rate: 0.0,
            signed_change_price: 0.0,
            signed_change_rate: 0.0,
            trade_volume: 1.0,
            acc_trade_volume: 1.0,
            acc_trade_price: price,
            timestamp: ts,
        })
    }

    fn trade(code: &str, sequential_id: u64) -> MarketMessage {
        MarketMessage::Trade(TradeTick {
            code: code.to_string(),
            trade_price: 100.0,
            trade_volume: 1.0,
            ask_bid: AskBid::Bid,
            prev_closing_price: 100.0,
            change: ChangeDirection::Even,
            change_price: 0.0,
            trade_timestamp: sequential_id as i64,
            timestamp: sequential_id as i64,
            sequential_id,
        })
    }

    fn orderbook(code: &str, ts: i64, total_ask: f64) -> MarketMessage {
        MarketMessage::Orderbook(OrderbookSnapshot {
            code: code.to_string(),
            total_ask_size: total_ask,
            total_bid_size: 1.0,
            orderbook_units: Vec::new(),
            timestamp: ts,
        })
    }

    #[test]
    fn trades_are_bounded_and_most_recent_first() {
        let mut state = ProjectionState::new(3);
        for id in 1..=5 {
            state.apply(&trade("KRW-BTC", id));
        }
        let ids: Vec<u64> = state.trades().iter().map(|t| t.sequential_id).collect();
        assert_eq!(ids, vec![5, 4, 3]);
    }

    #[test]
    fn ticker_replaces_wholesale() {
        let mut state = ProjectionState::new(3);
        state.apply(&ticker("KRW-BTC", 100.0, 1));
        state.apply(&ticker("KRW-BTC", 105.0, 2));
        assert_eq!(state.ticker().map(|t| t.trade_price), Some(105.0));
    }

    #[test]
    fn duplicate_orderbook_timestamps_are_suppressed() {
        let mut state = ProjectionState::new(3);
        state.apply(&orderbook("KRW-BTC", 1000, 5.0));
        // Same timestamp with different content: kept as-is.
        state.apply(&orderbook("KRW-BTC", 1000, 9.0));
        assert_eq!(state.orderbook().map(|b| b.total_ask_size), Some(5.0));

        state.apply(&orderbook("KRW-BTC", 2000, 9.0));
        assert_eq!(state.orderbook().map(|b| b.total_ask_size), Some(9.0));
    }

    fn offline_feed() -> MarketFeed {
        MarketFeed::new(FeedSettings {
            url: "ws://127.0.0.1:9".to_string(),
            trade_history_limit: 2,
            ..FeedSettings::default()
        })
    }

    #[tokio::test]
    async fn projection_holds_and_releases_channel_references() {
        let feed = offline_feed();
        {
            let projection = MarketProjection::bind(&feed, "KRW-BTC");
            assert_eq!(feed.desired_set().len(), 3);
            assert_eq!(projection.code(), "KRW-BTC");

            // A second projection on the same market adds references, not channels.
            let second = MarketProjection::bind(&feed, "KRW-BTC");
            assert_eq!(feed.desired_set().len(), 3);
            drop(second);
            assert_eq!(feed.desired_set().len(), 3);
        }
        assert!(feed.desired_set().is_empty());
    }

    #[tokio::test]
    async fn projection_only_folds_its_own_market() {
        let feed = offline_feed();
        let projection = MarketProjection::bind(&feed, "KRW-BTC");

        feed.dispatch_message(&ticker("KRW-BTC", 100.0, 1));
        feed.dispatch_message(&ticker("KRW-ETH", 999.0, 2));
        feed.dispatch_message(&trade("KRW-BTC", 1));
        feed.dispatch_message(&trade("KRW-BTC", 2));
        feed.dispatch_message(&trade("KRW-BTC", 3));

        assert_eq!(projection.ticker().map(|t| t.trade_price), Some(100.0));
        let ids: Vec<u64> = projection.trades().iter().map(|t| t.sequential_id).collect();
        assert_eq!(ids, vec![3, 2]);

        projection.clear_trades();
        assert!(projection.trades().is_empty());
    }
}
