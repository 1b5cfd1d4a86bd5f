use crate::event::{CacheEvent, EventType};
use crate::types::Subscription;

/// Signal manager for cache event notifications
///
/// Callbacks either see every decision or only the event types they
/// subscribed to, so a hit-rate counter need not filter out writes.
pub struct SignalManager {
    callbacks: std::sync::RwLock<Vec<Subscription>>,
}

impl std::fmt::Debug for SignalManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalManager")
            .field("callback_count", &self.callback_count())
            .finish()
    }
}

impl SignalManager {
    pub fn new() -> Self {
        Self {
            callbacks: std::sync::RwLock::new(Vec::new()),
        }
    }

    /// Add a callback for every event
    pub fn add_callback<F>(&self, callback: F)
    where
        F: Fn(&CacheEvent) + Send + Sync + 'static,
    {
        self.subscribe(None, callback);
    }

    /// Add a callback for the given event types only
    pub fn add_callback_for<F>(&self, event_types: &[EventType], callback: F)
    where
        F: Fn(&CacheEvent) + Send + Sync + 'static,
    {
        self.subscribe(Some(event_types.to_vec()), callback);
    }

    fn subscribe<F>(&self, filter: Option<Vec<EventType>>, callback: F)
    where
        F: Fn(&CacheEvent) + Send + Sync + 'static,
    {
        if let Ok(mut callbacks) = self.callbacks.write() {
            callbacks.push(Subscription {
                filter,
                callback: Box::new(callback),
            });
        }
    }

    /// Emit event to every subscriber interested in its type
    pub fn emit(&self, event: CacheEvent) {
        tracing::trace!(event_type = ?event.event_type, url = %event.url, "emitting cache event");
        if let Ok(callbacks) = self.callbacks.read() {
            for subscription in callbacks.iter().filter(|s| s.wants(event.event_type)) {
                (subscription.callback)(&event);
            }
        }
    }

    /// Clear all callbacks
    pub fn clear_callbacks(&self) {
        if let Ok(mut callbacks) = self.callbacks.write() {
            callbacks.clear();
        }
    }

    /// Get number of registered callbacks
    pub fn callback_count(&self) -> usize {
        self.callbacks.read().map(|c| c.len()).unwrap_or(0)
    }
}

impl Default for SignalManager {
    fn default() -> Self {
        Self::new()
    }
}
