use std::collections::HashMap;

use core_types::ChannelKey;

/// Reference-counted interest per channel.
///
/// Consumers express interest independently; a channel stays in the desired
/// set as long as at least one reference is outstanding. Counts never go
/// negative: releasing an unknown channel is a no-op.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    counts: HashMap<ChannelKey, usize>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one reference. Returns `true` when the desired set changed,
    /// i.e. this was the channel's first reference.
    pub fn subscribe(&mut self, key: ChannelKey) -> bool {
        let count = self.counts.entry(key).or_insert(0);
        *count += 1;
        *count == 1
    }

    /// Releases one reference. Returns `true` when the desired set changed,
    /// i.e. the last reference was released.
    pub fn unsubscribe(&mut self, key: &ChannelKey) -> bool {
        match self.counts.get_mut(key) {
            Some(count) if *count > 1 => {
                *count -= 1;
                false
            }
            Some(_) => {
                self.counts.remove(key);
                true
            }
            None => false,
        }
    }

    /// The channels with a positive reference count, in a deterministic order.
    pub fn desired_set(&self) -> Vec<ChannelKey> {
        let mut keys: Vec<ChannelKey> = self.counts.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn refcount(&self, key: &ChannelKey) -> usize {
        self.counts.get(key).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::ChannelKind;

    fn ticker(code: &str) -> ChannelKey {
        ChannelKey::new(ChannelKind::Ticker, code)
    }

    #[test]
    fn desired_set_tracks_positive_refcounts() {
        let mut registry = SubscriptionRegistry::new();

        assert!(registry.subscribe(ticker("KRW-BTC")));
        // Second consumer of the same channel: no change to the desired set.
        assert!(!registry.subscribe(ticker("KRW-BTC")));
        assert!(registry.subscribe(ticker("KRW-ETH")));

        assert_eq!(registry.desired_set(), vec![ticker("KRW-BTC"), ticker("KRW-ETH")]);
        assert_eq!(registry.refcount(&ticker("KRW-BTC")), 2);

        assert!(!registry.unsubscribe(&ticker("KRW-BTC")));
        assert!(registry.unsubscribe(&ticker("KRW-BTC")));
        assert_eq!(registry.desired_set(), vec![ticker("KRW-ETH")]);
    }

    #[test]
    fn releasing_an_unknown_channel_is_a_no_op() {
        let mut registry = SubscriptionRegistry::new();
        assert!(!registry.unsubscribe(&ticker("KRW-BTC")));
        assert_eq!(registry.refcount(&ticker("KRW-BTC")), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn desired_set_order_is_deterministic() {
        let mut registry = SubscriptionRegistry::new();
        registry.subscribe(ticker("KRW-XRP"));
        registry.subscribe(ticker("KRW-BTC"));
        registry.subscribe(ChannelKey::new(ChannelKind::Orderbook, "KRW-BTC"));

        let set = registry.desired_set();
        let mut sorted = set.clone();
        sorted.sort();
        assert_eq!(set, sorted);
    }
}
