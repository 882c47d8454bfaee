//! Persistence for named backtest configurations and result exports.
//!
//! The store mirrors the behavior of a browser's local storage: the whole
//! document is read once and rewritten wholesale on every change. There is no
//! partial update, which keeps the on-disk artifact trivially inspectable and
//! the round trip exact.

pub mod error;
pub mod export;
pub mod store;

pub use error::StorageError;
pub use export::ExportDocument;
pub use store::{ConfigStore, JsonFileStore, SavedConfig};
