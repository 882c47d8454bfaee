//! The shared WebSocket connection.
//!
//! One [`MarketFeed`] handle owns one background tokio task that connects,
//! subscribes, reads, and reconnects with exponential backoff. The handle is
//! cheap to clone; every clone talks to the same connection and the same
//! subscription registry.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use configuration::FeedSettings;
use core_types::{ChannelKey, MarketMessage};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::observers::{ObserverId, Observers};
use crate::protocol;
use crate::registry::SubscriptionRegistry;

/// Lifecycle of the shared connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

struct FeedInner {
    settings: FeedSettings,
    state: Mutex<ConnectionState>,
    attempts: AtomicU32,
    registry: Mutex<SubscriptionRegistry>,
    status_observers: Observers<ConnectionState>,
    message_observers: Observers<MarketMessage>,
    // Present iff a connection session is active; doubles as the
    // connect/disconnect idempotency latch.
    shutdown_tx: Mutex<Option<watch::Sender<bool>>>,
    outbound_tx: Mutex<Option<mpsc::UnboundedSender<String>>>,
}

/// Handle to the process-wide market-data connection.
#[derive(Clone)]
pub struct MarketFeed {
    inner: Arc<FeedInner>,
}

impl MarketFeed {
    pub fn new(settings: FeedSettings) -> Self {
        Self {
            inner: Arc::new(FeedInner {
                settings,
                state: Mutex::new(ConnectionState::Disconnected),
                attempts: AtomicU32::new(0),
                registry: Mutex::new(SubscriptionRegistry::new()),
                status_observers: Observers::new(),
                message_observers: Observers::new(),
                shutdown_tx: Mutex::new(None),
                outbound_tx: Mutex::new(None),
            }),
        }
    }

    /// Starts the connection task. Idempotent: calling while a session is
    /// already active does nothing.
    pub fn connect(&self) {
        let mut shutdown_guard = self.lock_shutdown();
        if shutdown_guard.is_some() {
            debug!("connect ignored, session already active");
            return;
        }
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        *shutdown_guard = Some(shutdown_tx);
        drop(shutdown_guard);

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        *self.lock_outbound() = Some(outbound_tx);

        self.set_state(ConnectionState::Connecting);
        let feed = self.clone();
        tokio::spawn(async move {
            connection_loop(feed, shutdown_rx, outbound_rx).await;
        });
    }

    /// Stops the connection task. Idempotent: calling while disconnected does
    /// nothing. The retry timer is cancelled and the attempt counter reset.
    pub fn disconnect(&self) {
        let Some(shutdown_tx) = self.lock_shutdown().take() else {
            debug!("disconnect ignored, no active session");
            return;
        };
        let _ = shutdown_tx.send(true);
        *self.lock_outbound() = None;
        self.inner.attempts.store(0, Ordering::Relaxed);
        self.set_state(ConnectionState::Disconnected);
    }

    pub fn state(&self) -> ConnectionState {
        *self.inner.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Failed connection attempts since the last successful handshake.
    pub fn attempts(&self) -> u32 {
        self.inner.attempts.load(Ordering::Relaxed)
    }

    pub fn settings(&self) -> &FeedSettings {
        &self.inner.settings
    }

    pub fn add_status_observer(
        &self,
        callback: impl Fn(&ConnectionState) + Send + Sync + 'static,
    ) -> ObserverId {
        self.inner.status_observers.add(callback)
    }

    pub fn remove_status_observer(&self, id: ObserverId) {
        self.inner.status_observers.remove(id);
    }

    pub fn add_message_observer(
        &self,
        callback: impl Fn(&MarketMessage) + Send + Sync + 'static,
    ) -> ObserverId {
        self.inner.message_observers.add(callback)
    }

    pub fn remove_message_observer(&self, id: ObserverId) {
        self.inner.message_observers.remove(id);
    }

    /// Adds one reference to a channel. When this changes the desired set and
    /// the connection is up, the full control frame is resent.
    pub fn subscribe(&self, key: ChannelKey) {
        let changed = self.lock_registry().subscribe(key);
        if changed {
            self.resend_control_frame();
        }
    }

    /// Releases one reference to a channel. Releasing an unknown channel is a
    /// no-op.
    pub fn unsubscribe(&self, key: &ChannelKey) {
        let changed = self.lock_registry().unsubscribe(key);
        if changed {
            self.resend_control_frame();
        }
    }

    /// The channels currently wanted by at least one consumer.
    pub fn desired_set(&self) -> Vec<ChannelKey> {
        self.lock_registry().desired_set()
    }

    fn control_frame(&self) -> String {
        let desired = self.desired_set();
        protocol::control_frame(&self.inner.settings.ticket, &self.inner.settings.format, &desired)
    }

    fn resend_control_frame(&self) {
        if self.state() != ConnectionState::Connected {
            return;
        }
        if let Some(tx) = self.lock_outbound().as_ref() {
            let frame = self.control_frame();
            debug!(%frame, "desired set changed, resending control frame");
            let _ = tx.send(frame);
        }
    }

    fn set_state(&self, state: ConnectionState) {
        let changed = {
            let mut current = self.inner.state.lock().unwrap_or_else(|e| e.into_inner());
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        };
        if changed {
            info!(?state, "connection state changed");
            self.inner.status_observers.notify(&state);
        }
    }

    pub(crate) fn dispatch_message(&self, message: &MarketMessage) {
        self.inner.message_observers.notify(message);
    }

    fn lock_shutdown(&self) -> std::sync::MutexGuard<'_, Option<watch::Sender<bool>>> {
        self.inner.shutdown_tx.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_outbound(&self) -> std::sync::MutexGuard<'_, Option<mpsc::UnboundedSender<String>>> {
        self.inner.outbound_tx.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_registry(&self) -> std::sync::MutexGuard<'_, SubscriptionRegistry> {
        self.inner.registry.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Connects, subscribes, reads, and reconnects until shut down.
async fn connection_loop(
    feed: MarketFeed,
    mut shutdown_rx: watch::Receiver<bool>,
    mut outbound_rx: mpsc::UnboundedReceiver<String>,
) {
    let base_backoff = Duration::from_millis(feed.inner.settings.base_backoff_ms);
    let max_backoff = Duration::from_millis(feed.inner.settings.max_backoff_ms);
    let mut backoff = base_backoff;
    let url = feed.inner.settings.url.clone();

    loop {
        if *shutdown_rx.borrow() {
            return;
        }
        feed.set_state(ConnectionState::Connecting);
        info!(%url, "connecting to market-data feed");

        let stream = match tokio_tungstenite::connect_async(url.as_str()).await {
            Ok((stream, _response)) => {
                backoff = base_backoff;
                feed.inner.attempts.store(0, Ordering::Relaxed);
                stream
            }
            Err(e) => {
                feed.set_state(ConnectionState::Disconnected);
                let attempt = feed.inner.attempts.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(%e, attempt, "connection failed, retrying in {backoff:?}");
                tokio::select! {
                    _ = tokio::time::sleep(backoff) => {}
                    _ = shutdown_rx.changed() => return,
                }
                backoff = (backoff * 2).min(max_backoff);
                continue;
            }
        };

        if *shutdown_rx.borrow() {
            return;
        }
        feed.set_state(ConnectionState::Connected);
        let (mut write, mut read) = stream.split();

        // Replay the full desired set so a reconnect restores exactly the
        // channels consumers currently want, regardless of churn while down.
        let frame = feed.control_frame();
        debug!(%frame, "sending control frame");
        if let Err(e) = write.send(Message::Text(frame.into())).await {
            warn!(%e, "failed to send control frame");
            feed.set_state(ConnectionState::Disconnected);
            continue;
        }

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    let _ = write.close().await;
                    return;
                }
                message = read.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            match protocol::decode_message(text.as_bytes()) {
                                Ok(decoded) => feed.dispatch_message(&decoded),
                                Err(e) => warn!(%e, "dropping malformed frame"),
                            }
                        }
                        Some(Ok(Message::Binary(data))) => {
                            match protocol::decode_message(&data) {
                                Ok(decoded) => feed.dispatch_message(&decoded),
                                Err(e) => warn!(%e, "dropping malformed frame"),
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            let _ = write.send(Message::Pong(data)).await;
                        }
                        Some(Ok(Message::Close(_))) => {
                            warn!("server closed the connection");
                            break;
                        }
                        Some(Err(e)) => {
                            warn!(%e, "read error");
                            break;
                        }
                        None => {
                            warn!("stream ended");
                            break;
                        }
                        _ => {}
                    }
                }
                Some(frame) = outbound_rx.recv() => {
                    if let Err(e) = write.send(Message::Text(frame.into())).await {
                        warn!(%e, "send error");
                        break;
                    }
                }
            }
        }

        feed.set_state(ConnectionState::Disconnected);
        warn!("disconnected, reconnecting in {backoff:?}");
        tokio::select! {
            _ = tokio::time::sleep(backoff) => {}
            _ = shutdown_rx.changed() => return,
        }
        backoff = (backoff * 2).min(max_backoff);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::ChannelKind;

    fn offline_feed() -> MarketFeed {
        // Nothing listens here; connect attempts fail fast and keep retrying.
        MarketFeed::new(FeedSettings {
            url: "ws://127.0.0.1:9".to_string(),
            ..FeedSettings::default()
        })
    }

    #[tokio::test]
    async fn connect_and_disconnect_are_idempotent() {
        let feed = offline_feed();
        assert_eq!(feed.state(), ConnectionState::Disconnected);

        feed.connect();
        assert_ne!(feed.state(), ConnectionState::Disconnected);
        feed.connect();

        feed.disconnect();
        assert_eq!(feed.state(), ConnectionState::Disconnected);
        assert_eq!(feed.attempts(), 0);
        feed.disconnect();
        assert_eq!(feed.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn status_observers_see_the_connecting_transition() {
        let feed = offline_feed();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let id = feed.add_status_observer(move |state| {
            seen_clone.lock().unwrap().push(*state);
        });

        feed.connect();
        assert_eq!(seen.lock().unwrap().first(), Some(&ConnectionState::Connecting));

        feed.disconnect();
        assert!(seen.lock().unwrap().contains(&ConnectionState::Disconnected));
        feed.remove_status_observer(id);
    }

    #[tokio::test]
    async fn subscriptions_are_tracked_while_disconnected() {
        let feed = offline_feed();
        let key = ChannelKey::new(ChannelKind::Ticker, "KRW-BTC");

        feed.subscribe(key.clone());
        feed.subscribe(key.clone());
        assert_eq!(feed.desired_set(), vec![key.clone()]);

        feed.unsubscribe(&key);
        assert_eq!(feed.desired_set(), vec![key.clone()]);
        feed.unsubscribe(&key);
        assert!(feed.desired_set().is_empty());
    }
}
