//! Aggregate abstraction and version bookkeeping.
//!
//! An aggregate starts at version `-1`. Every replayed event moves the
//! original version up by one, every tracked change moves the current version
//! up by one:
//!
//! ```text
//! current_version == original_version + changes.len()
//! ```

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

use crate::downcast::AsAny;
use crate::event::{DomainEvent, EventMessage};

/// Version of an aggregate that has never had an event applied.
pub const NEW_AGGREGATE_VERSION: i64 = -1;

/// State shared by every aggregate: identity, version and pending changes.
#[derive(Debug, Clone)]
pub struct AggregateBase {
    id: String,
    version: i64,
    changes: Vec<EventMessage>,
}

impl AggregateBase {
    /// Creates the base for a brand-new aggregate.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: NEW_AGGREGATE_VERSION,
            changes: Vec::new(),
        }
    }

    /// The aggregate identity.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The version as of load time.
    #[must_use]
    pub fn original_version(&self) -> i64 {
        self.version
    }

    /// The version including pending changes.
    #[must_use]
    pub fn current_version(&self) -> i64 {
        self.version + self.pending_count()
    }

    /// Records one replayed event.
    pub fn increment_version(&mut self) {
        self.version += 1;
    }

    /// Queues an event for persistence.
    pub fn track_change(&mut self, event: EventMessage) {
        let before = self.current_version();
        self.changes.push(event);
        debug_assert_eq!(self.current_version(), before + 1);
        debug_assert_eq!(
            self.current_version(),
            self.original_version() + self.pending_count()
        );
    }

    /// Pending changes, in persistence order.
    #[must_use]
    pub fn changes(&self) -> &[EventMessage] {
        &self.changes
    }

    /// Drops all pending changes.
    pub fn clear_changes(&mut self) {
        self.changes.clear();
        debug_assert_eq!(self.current_version(), self.original_version());
    }

    #[allow(clippy::cast_possible_wrap)]
    fn pending_count(&self) -> i64 {
        self.changes.len() as i64
    }
}

/// Returned when an aggregate has no handler for an event type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("aggregate {aggregate_type} has no handler for event type {event_type}")]
pub struct UnhandledEvent {
    /// The aggregate that received the event.
    pub aggregate_type: &'static str,
    /// The event type without a handler.
    pub event_type: String,
}

/// Trait for aggregate roots that reconstitute from event history.
///
/// Implementors supply the base state and the event handling hook; the
/// protocol methods are provided.
pub trait Aggregate: AsAny + fmt::Debug + Send + Sync {
    /// The aggregate type name used by the factory and the stream namer.
    fn aggregate_type(&self) -> &'static str;

    /// Shared aggregate state.
    fn base(&self) -> &AggregateBase;

    /// Shared aggregate state, mutably.
    fn base_mut(&mut self) -> &mut AggregateBase;

    /// Mutates domain state for one event. Usually delegates to an
    /// [`Appliers`] table.
    ///
    /// # Errors
    ///
    /// Returns [`UnhandledEvent`] if the aggregate does not know the event type.
    fn mutate(&mut self, event: &EventMessage) -> Result<(), UnhandledEvent>;

    /// Returns the aggregate identifier.
    fn aggregate_id(&self) -> &str {
        self.base().id()
    }

    /// Returns the version as of load time.
    fn original_version(&self) -> i64 {
        self.base().original_version()
    }

    /// Returns the version including pending changes.
    fn current_version(&self) -> i64 {
        self.base().current_version()
    }

    /// Records one replayed event.
    fn increment_version(&mut self) {
        self.base_mut().increment_version();
    }

    /// Applies an event to the aggregate.
    ///
    /// Replay passes `is_new = false`; business operations pass
    /// `is_new = true`, which also queues the event for persistence.
    ///
    /// # Panics
    ///
    /// Panics if the aggregate has no handler for the event type. That is a
    /// wiring bug, not a runtime condition.
    fn apply(&mut self, event: EventMessage, is_new: bool) {
        if let Err(err) = self.mutate(&event) {
            panic!("{err}");
        }
        if is_new {
            self.track_change(event);
        }
    }

    /// Queues an event for persistence without applying it.
    fn track_change(&mut self, event: EventMessage) {
        self.base_mut().track_change(event);
    }

    /// Returns uncommitted events produced by command handling.
    fn changes(&self) -> &[EventMessage] {
        self.base().changes()
    }

    /// Clears uncommitted events after persistence.
    fn clear_changes(&mut self) {
        self.base_mut().clear_changes();
    }
}

/// An aggregate that can be registered with an aggregate factory.
pub trait AggregateKind: Aggregate + Sized + 'static {
    /// The aggregate type name.
    const AGGREGATE_TYPE: &'static str;

    /// Creates a brand-new instance with the given identity.
    fn with_id(id: String) -> Self;
}

type ApplyFn<A> = Box<dyn Fn(&mut A, &EventMessage) -> bool + Send + Sync>;

/// Table of event handlers keyed by event type name.
///
/// Built once, usually in a `static LazyLock`, and consulted by
/// [`Aggregate::mutate`].
pub struct Appliers<A> {
    handlers: HashMap<&'static str, ApplyFn<A>>,
}

impl<A: Aggregate + 'static> Appliers<A> {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registers the handler for `E`, replacing any earlier one.
    #[must_use]
    pub fn on<E: DomainEvent>(mut self, handler: fn(&mut A, &E)) -> Self {
        let apply = move |aggregate: &mut A, message: &EventMessage| match message.payload_as::<E>()
        {
            Some(event) => {
                handler(aggregate, event);
                true
            }
            None => false,
        };
        self.handlers.insert(E::EVENT_TYPE, Box::new(apply));
        self
    }

    /// Whether a handler is registered for `event_type`.
    #[must_use]
    pub fn handles(&self, event_type: &str) -> bool {
        self.handlers.contains_key(event_type)
    }

    /// Runs the handler registered for the event's type.
    ///
    /// # Errors
    ///
    /// Returns [`UnhandledEvent`] if no handler is registered for the event
    /// type, or the payload is not the registered event.
    pub fn dispatch(&self, aggregate: &mut A, event: &EventMessage) -> Result<(), UnhandledEvent> {
        let applied = self
            .handlers
            .get(event.event_type())
            .is_some_and(|apply| apply(aggregate, event));
        if applied {
            Ok(())
        } else {
            Err(UnhandledEvent {
                aggregate_type: aggregate.aggregate_type(),
                event_type: event.event_type().to_owned(),
            })
        }
    }
}

impl<A: Aggregate + 'static> Default for Appliers<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> fmt::Debug for Appliers<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut event_types: Vec<_> = self.handlers.keys().collect();
        event_types.sort_unstable();
        f.debug_struct("Appliers")
            .field("event_types", &event_types)
            .finish()
    }
}
