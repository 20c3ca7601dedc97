//! Event handler that remembers what it was given.

use std::sync::Mutex;

use eventide_core::bus::EventHandler;
use eventide_core::event::EventMessage;

/// Records every event delivered to it, in delivery order.
#[derive(Debug)]
pub struct RecordingEventHandler {
    name: String,
    handled: Mutex<Vec<EventMessage>>,
}

impl RecordingEventHandler {
    /// Creates a handler identified by `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handled: Mutex::new(Vec::new()),
        }
    }

    /// Returns a snapshot of the events handled so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn handled(&self) -> Vec<EventMessage> {
        self.handled.lock().unwrap().clone()
    }

    /// Event types handled so far, in delivery order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn handled_types(&self) -> Vec<&'static str> {
        self.handled
            .lock()
            .unwrap()
            .iter()
            .map(EventMessage::event_type)
            .collect()
    }
}

impl EventHandler for RecordingEventHandler {
    fn name(&self) -> &str {
        &self.name
    }

    fn handle(&self, event: &EventMessage) {
        self.handled.lock().unwrap().push(event.clone());
    }
}
