//! Event store that fails on demand.

use async_trait::async_trait;
use eventide_core::error::StoreError;
use eventide_core::store::{
    EventData, EventStore, ExpectedVersion, RecordedEvent, StreamReader, StreamWriter,
};
use eventide_event_store::InMemoryEventStore;

type Failure = fn() -> StoreError;

/// An event store that returns a scripted error. Useful for testing how
/// store failures are translated.
///
/// By default both reads and appends fail. [`FailingEventStore::on_append`]
/// serves reads from a real in-memory store and only fails appends.
#[derive(Debug, Clone)]
pub struct FailingEventStore {
    failure: Failure,
    reads_from: Option<InMemoryEventStore>,
}

impl FailingEventStore {
    /// Fails every read and append with `failure()`.
    #[must_use]
    pub fn new(failure: Failure) -> Self {
        Self {
            failure,
            reads_from: None,
        }
    }

    /// Fails with [`StoreError::TemporarilyUnavailable`].
    #[must_use]
    pub fn unavailable() -> Self {
        Self::new(|| StoreError::TemporarilyUnavailable)
    }

    /// Fails with [`StoreError::Unauthorized`].
    #[must_use]
    pub fn unauthorized() -> Self {
        Self::new(|| StoreError::Unauthorized)
    }

    /// Reads from `store`; fails every append with `failure()`.
    #[must_use]
    pub fn on_append(store: InMemoryEventStore, failure: Failure) -> Self {
        Self {
            failure,
            reads_from: Some(store),
        }
    }
}

impl EventStore for FailingEventStore {
    fn stream_reader(&self, stream_name: &str) -> Box<dyn StreamReader> {
        match &self.reads_from {
            Some(store) => store.stream_reader(stream_name),
            None => Box::new(Failing(self.failure)),
        }
    }

    fn stream_writer(&self, _stream_name: &str) -> Box<dyn StreamWriter> {
        Box::new(Failing(self.failure))
    }
}

struct Failing(Failure);

#[async_trait]
impl StreamReader for Failing {
    async fn next(&mut self) -> Result<RecordedEvent, StoreError> {
        Err((self.0)())
    }
}

#[async_trait]
impl StreamWriter for Failing {
    async fn append(
        &mut self,
        _expected_version: ExpectedVersion,
        _events: Vec<EventData>,
    ) -> Result<(), StoreError> {
        Err((self.0)())
    }
}
