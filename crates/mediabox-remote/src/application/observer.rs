//! State-change notification.
//!
//! Observers are held by [`Weak`] reference: registering does not keep the
//! observer's owner alive, and an observer that has been dropped is pruned
//! on the next notification.
//!
//! Observers are called synchronously while the manager holds its
//! notification-order lock.  The state lock is already released, so an
//! observer may call `is_connected`, `state` and `host`.  It must not drive
//! `connect` or `disconnect` to completion (for example with `block_on`):
//! both take the notification-order lock and would deadlock.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use mediabox_core::StateChange;

use crate::application::transport::ConnectionError;

/// Receives connection state notifications.
#[cfg_attr(test, mockall::automock)]
pub trait ConnectionObserver: Send + Sync {
    /// Called exactly once per real `Disconnected ⇄ Connected` transition.
    fn on_state_changed(&self, change: StateChange);

    /// Called when a connect attempt fails.  The state does not change.
    fn on_connect_failed(&self, _host: &str, _error: &ConnectionError) {}
}

/// Weakly held list of observers.
#[derive(Default)]
pub struct ObserverRegistry {
    observers: Mutex<Vec<Weak<dyn ConnectionObserver>>>,
}

impl ObserverRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `observer` without taking ownership of it.
    pub fn register<O: ConnectionObserver + 'static>(&self, observer: &Arc<O>) {
        let observer: Arc<dyn ConnectionObserver> = observer.clone();
        self.lock().push(Arc::downgrade(&observer));
    }

    /// Number of registered observers that are still alive.
    pub fn len(&self) -> usize {
        self.lock().iter().filter(|w| w.strong_count() > 0).count()
    }

    /// Returns `true` if no live observer is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Tells every live observer about `change`.
    pub fn notify_state_changed(&self, change: StateChange) {
        for observer in self.live() {
            observer.on_state_changed(change);
        }
    }

    /// Tells every live observer that connecting to `host` failed.
    pub fn notify_connect_failed(&self, host: &str, error: &ConnectionError) {
        for observer in self.live() {
            observer.on_connect_failed(host, error);
        }
    }

    /// Upgrades live observers and prunes dead ones.
    ///
    /// The strong references only live for the duration of one notification.
    fn live(&self) -> Vec<Arc<dyn ConnectionObserver>> {
        let mut observers = self.lock();
        observers.retain(|w| w.strong_count() > 0);
        observers.iter().filter_map(Weak::upgrade).collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Weak<dyn ConnectionObserver>>> {
        self.observers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
