//! Type definitions for signal system

use crate::event::{CacheEvent, EventType};

/// Event callback type
pub type EventCallback = Box<dyn Fn(&CacheEvent) + Send + Sync>;

/// A registered callback and the event types it listens to
pub(crate) struct Subscription {
    /// `None` listens to every event
    pub(crate) filter: Option<Vec<EventType>>,
    pub(crate) callback: EventCallback,
}

impl Subscription {
    pub(crate) fn wants(&self, event_type: EventType) -> bool {
        self.filter
            .as_ref()
            .is_none_or(|types| types.contains(&event_type))
    }
}
