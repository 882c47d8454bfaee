//! The live market-data distribution layer.
//!
//! One WebSocket connection is shared by every consumer in the process. The
//! [`MarketFeed`] handle owns the connection task; the subscription registry
//! reference-counts interest per channel so consumers can come and go without
//! coordinating with each other, and [`MarketProjection`]s turn the raw
//! message stream into per-market state snapshots.

pub mod connection;
pub mod observers;
pub mod projections;
pub mod protocol;
pub mod registry;

pub use connection::{ConnectionState, MarketFeed};
pub use observers::{ObserverId, Observers};
pub use projections::{MarketProjection, ProjectionState};
pub use registry::SubscriptionRegistry;
