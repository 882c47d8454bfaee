pub mod enums;
pub mod error;
pub mod market;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{AskBid, ChangeDirection, ChannelKind, Period, TradeSide};
pub use error::CoreError;
pub use market::{ChannelKey, MarketMessage, OrderbookSnapshot, OrderbookUnit, TickerTick, TradeTick};
pub use structs::{Candle, LedgerEntry};
