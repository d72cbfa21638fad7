//! Callbacks this crate has installed into a client's handler slots.
//!
//! A slot is a property on the client object that the client invokes on its
//! own schedule (the token-expiry timer keeps firing after the app stops
//! caring). Before a callback is dropped, its slot must stop pointing at it.

#[cfg(test)]
#[path = "slots_test.rs"]
mod slots_test;

use std::collections::HashMap;

use super::SessionEvent;

/// Installed callbacks by event, for one client instance.
pub struct HandlerSlots<F> {
    slots: HashMap<SessionEvent, F>,
}

impl<F> HandlerSlots<F> {
    #[must_use]
    pub fn new() -> Self {
        Self { slots: HashMap::new() }
    }

    /// Record `callback` as the occupant of `event`'s slot, returning the
    /// callback it replaces.
    pub fn insert(&mut self, event: SessionEvent, callback: F) -> Option<F> {
        self.slots.insert(event, callback)
    }

    pub fn remove(&mut self, event: SessionEvent) -> Option<F> {
        self.slots.remove(&event)
    }

    #[must_use]
    pub fn owns(&self, event: SessionEvent) -> bool {
        self.slots.contains_key(&event)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Detach every owned slot, then drop the callbacks.
    pub fn release(&mut self, mut detach: impl FnMut(SessionEvent)) {
        let owned = std::mem::take(&mut self.slots);
        for event in owned.keys() {
            detach(*event);
        }
        drop(owned);
    }
}

impl<F> Default for HandlerSlots<F> {
    fn default() -> Self {
        Self::new()
    }
}
