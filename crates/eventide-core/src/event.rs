//! Domain events and the envelope that carries them.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::downcast::AsAny;

/// Header stamped by the repository with the owning aggregate's identity.
pub const AGGREGATE_ID_HEADER: &str = "aggregate_id";
/// Header carrying the correlation ID of the command that produced an event.
pub const CORRELATION_ID_HEADER: &str = "correlation_id";
/// Header carrying the ID of the message that caused an event.
pub const CAUSATION_ID_HEADER: &str = "causation_id";

/// Opaque event metadata, persisted alongside the payload.
pub type Headers = BTreeMap<String, serde_json::Value>;

/// Trait that all domain events implement.
pub trait DomainEvent: Serialize + DeserializeOwned + fmt::Debug + Send + Sync + 'static {
    /// The event type name used for persistence, dispatch and routing.
    const EVENT_TYPE: &'static str;
}

/// Object-safe view of a [`DomainEvent`], implemented for every domain event.
pub trait EventPayload: AsAny + fmt::Debug + Send + Sync {
    /// Returns the event type name.
    fn event_type(&self) -> &'static str;

    /// Serializes the payload to JSON.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if the payload cannot be represented as JSON.
    fn to_data(&self) -> Result<serde_json::Value, serde_json::Error>;
}

impl<E: DomainEvent> EventPayload for E {
    fn event_type(&self) -> &'static str {
        E::EVENT_TYPE
    }

    fn to_data(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// A domain event payload plus its persistence metadata.
///
/// Envelopes built with [`EventMessage::new`] start uncommitted; envelopes
/// produced by replay are committed. Once committed an envelope stays
/// committed.
#[derive(Debug, Clone)]
pub struct EventMessage {
    aggregate_id: String,
    event_id: Uuid,
    payload: Arc<dyn EventPayload>,
    headers: Headers,
    version: Option<i64>,
    committed: bool,
}

impl EventMessage {
    /// Wraps a new, uncommitted event for `aggregate_id`.
    ///
    /// `version` is the stream position the event is expected to occupy, if
    /// known.
    pub fn new<E: DomainEvent>(
        aggregate_id: impl Into<String>,
        event: E,
        version: Option<i64>,
    ) -> Self {
        Self {
            aggregate_id: aggregate_id.into(),
            event_id: Uuid::new_v4(),
            payload: Arc::new(event),
            headers: Headers::new(),
            version,
            committed: false,
        }
    }

    /// Rebuilds a committed envelope read back from a stream.
    #[must_use]
    pub fn replayed(
        aggregate_id: impl Into<String>,
        event_id: Uuid,
        payload: Arc<dyn EventPayload>,
        headers: Headers,
        version: i64,
    ) -> Self {
        Self {
            aggregate_id: aggregate_id.into(),
            event_id,
            payload,
            headers,
            version: Some(version),
            committed: true,
        }
    }

    /// The identity of the aggregate this event belongs to.
    #[must_use]
    pub fn aggregate_id(&self) -> &str {
        &self.aggregate_id
    }

    /// Unique event identifier.
    #[must_use]
    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    /// The event type name of the payload.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        self.payload().event_type()
    }

    /// The type-erased payload.
    #[must_use]
    pub fn payload(&self) -> &dyn EventPayload {
        &*self.payload
    }

    /// The payload as `E`, or `None` if it is another event.
    #[must_use]
    pub fn payload_as<E: DomainEvent>(&self) -> Option<&E> {
        AsAny::as_any(self.payload()).downcast_ref::<E>()
    }

    /// All headers, ordered by key.
    #[must_use]
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// A single header value.
    #[must_use]
    pub fn header(&self, key: &str) -> Option<&serde_json::Value> {
        self.headers.get(key)
    }

    /// Sets a header, replacing any previous value for `key`.
    pub fn set_header(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.headers.insert(key.into(), value.into());
    }

    /// The stream position of this event, if assigned.
    #[must_use]
    pub fn version(&self) -> Option<i64> {
        self.version
    }

    /// Whether the event has been persisted to the event store.
    #[must_use]
    pub fn committed(&self) -> bool {
        self.committed
    }

    /// Marks the event as persisted. Calling it again has no effect.
    pub fn commit(&mut self) {
        self.committed = true;
    }

    pub(crate) fn restamp(&mut self, version: i64) {
        self.version = Some(version);
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct SomeEvent {
        item: String,
        count: u32,
    }

    impl DomainEvent for SomeEvent {
        const EVENT_TYPE: &'static str = "SomeEvent";
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct SomeOtherEvent {
        order_id: String,
    }

    impl DomainEvent for SomeOtherEvent {
        const EVENT_TYPE: &'static str = "SomeOtherEvent";
    }

    fn some_event() -> SomeEvent {
        SomeEvent {
            item: "Some String".into(),
            count: 43,
        }
    }

    #[test]
    fn test_new_event_message_is_uncommitted_with_empty_headers() {
        // Act
        let message = EventMessage::new("agg-1", some_event(), Some(5));

        // Assert
        assert_eq!(message.aggregate_id(), "agg-1");
        assert_eq!(message.event_type(), "SomeEvent");
        assert_eq!(message.version(), Some(5));
        assert!(!message.committed());
        assert!(message.headers().is_empty());
    }

    #[test]
    fn test_payload_as_returns_typed_event() {
        let message = EventMessage::new("agg-1", some_event(), None);

        assert_eq!(message.payload_as::<SomeEvent>(), Some(&some_event()));
        assert!(message.payload_as::<SomeOtherEvent>().is_none());
    }

    #[test]
    fn test_set_header_accepts_strings_numbers_and_json() {
        let mut message = EventMessage::new("agg-1", some_event(), None);

        message.set_header("a", "abc");
        message.set_header("b", 3);
        message.set_header("c", serde_json::json!({ "item": "x" }));

        assert_eq!(message.header("a"), Some(&serde_json::json!("abc")));
        assert_eq!(message.header("b"), Some(&serde_json::json!(3)));
        assert_eq!(message.header("c"), Some(&serde_json::json!({ "item": "x" })));
        assert_eq!(
            message.headers().keys().collect::<Vec<_>>(),
            vec!["a", "b", "c"]
        );
    }

    #[test]
    fn test_set_header_overwrites_existing_key() {
        let mut message = EventMessage::new("agg-1", some_event(), None);

        message.set_header("a", "first");
        message.set_header("a", "second");

        assert_eq!(message.headers().len(), 1);
        assert_eq!(message.header("a"), Some(&serde_json::json!("second")));
    }

    #[test]
    fn test_commit_is_irreversible() {
        let mut message = EventMessage::new("agg-1", some_event(), None);

        message.commit();
        message.commit();

        assert!(message.committed());
        assert!(message.clone().committed());
    }

    #[test]
    fn test_replayed_message_is_committed() {
        let event_id = Uuid::new_v4();
        let mut headers = Headers::new();
        headers.insert(AGGREGATE_ID_HEADER.into(), serde_json::json!("agg-1"));

        let message = EventMessage::replayed("agg-1", event_id, Arc::new(some_event()), headers, 7);

        assert!(message.committed());
        assert_eq!(message.event_id(), event_id);
        assert_eq!(message.version(), Some(7));
        assert_eq!(message.header(AGGREGATE_ID_HEADER), Some(&serde_json::json!("agg-1")));
    }

    #[test]
    fn test_to_data_serializes_payload() {
        let message = EventMessage::new("agg-1", some_event(), None);

        let data = message.payload().to_data().unwrap();

        assert_eq!(data, serde_json::json!({ "item": "Some String", "count": 43 }));
    }
}
