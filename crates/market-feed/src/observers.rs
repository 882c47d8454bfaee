use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

/// Opaque registration token. Removing a token that was already removed (or
/// never issued) is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Registered<T> {
    id: u64,
    callback: Callback<T>,
}

/// An ordered list of callbacks for one event kind.
///
/// Dispatch snapshots the list before invoking anything, so a callback that
/// adds or removes observers never deadlocks and never affects the current
/// dispatch round. A panicking callback is isolated: later observers in the
/// same round still run.
pub struct Observers<T> {
    inner: Mutex<Vec<Registered<T>>>,
    next_id: Mutex<u64>,
}

impl<T> Default for Observers<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Observers<T> {
    pub fn new() -> Self {
        Self { inner: Mutex::new(Vec::new()), next_id: Mutex::new(0) }
    }

    pub fn add(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> ObserverId {
        let id = {
            let mut next = self.next_id.lock().unwrap_or_else(|e| e.into_inner());
            let id = *next;
            *next += 1;
            id
        };
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.push(Registered { id, callback: Arc::new(callback) });
        ObserverId(id)
    }

    pub fn remove(&self, id: ObserverId) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.retain(|r| r.id != id.0);
    }

    /// Invokes every registered callback in registration order.
    pub fn notify(&self, value: &T) {
        let snapshot: Vec<Callback<T>> = {
            let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            inner.iter().map(|r| Arc::clone(&r.callback)).collect()
        };
        for callback in snapshot {
            if catch_unwind(AssertUnwindSafe(|| callback(value))).is_err() {
                tracing::warn!("observer panicked during dispatch; skipping it");
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn observers_run_in_registration_order() {
        let observers: Observers<u32> = Observers::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for label in ["a", "b", "c"] {
            let seen = Arc::clone(&seen);
            observers.add(move |_| seen.lock().unwrap().push(label));
        }
        observers.notify(&0);

        assert_eq!(*seen.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn removed_observer_no_longer_fires_and_double_remove_is_safe() {
        let observers: Observers<u32> = Observers::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let hits_clone = Arc::clone(&hits);
        let id = observers.add(move |_| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
        });
        observers.notify(&0);
        observers.remove(id);
        observers.remove(id);
        observers.notify(&0);

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(observers.is_empty());
    }

    #[test]
    fn panicking_observer_does_not_block_later_ones() {
        let observers: Observers<u32> = Observers::new();
        let hits = Arc::new(AtomicUsize::new(0));

        observers.add(|_| panic!("boom"));
        let hits_clone = Arc::clone(&hits);
        observers.add(move |_| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
        });
        observers.notify(&0);

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn observer_added_during_dispatch_joins_the_next_round() {
        let observers: Arc<Observers<u32>> = Arc::new(Observers::new());
        let hits = Arc::new(AtomicUsize::new(0));

        let observers_clone = Arc::clone(&observers);
        let hits_clone = Arc::clone(&hits);
        observers.add(move |_| {
            let hits_inner = Arc::clone(&hits_clone);
            observers_clone.add(move |_| {
                hits_inner.fetch_add(1, Ordering::SeqCst);
            });
        });

        observers.notify(&0);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        observers.notify(&0);
        assert!(hits.load(Ordering::SeqCst) >= 1);
    }
}
