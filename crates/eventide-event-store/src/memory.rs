//! In-memory event store.
//!
//! Streams live in a single map behind an `RwLock`. An append takes the
//! write lock once, so the expected-version check and the write are atomic
//! with respect to every other reader and writer of the same store.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use tracing::{debug, trace};

use eventide_core::error::StoreError;
use eventide_core::store::{
    EventData, EventStore, ExpectedVersion, RecordedEvent, StreamReader, StreamWriter,
};

#[derive(Debug, Default)]
struct Stream {
    events: Vec<RecordedEvent>,
    deleted: bool,
}

impl Stream {
    fn head(&self) -> Option<i64> {
        self.events.len().checked_sub(1).map(position_of)
    }
}

type Streams = Arc<RwLock<HashMap<String, Stream>>>;

/// Event store that keeps every stream in process memory.
///
/// Clones share the same streams.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventStore {
    streams: Streams,
}

impl InMemoryEventStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Position of the last event in `stream_name`, `None` if the stream does
    /// not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Deleted`] for a deleted stream.
    pub fn stream_head(&self, stream_name: &str) -> Result<Option<i64>, StoreError> {
        let streams = self.streams.read().map_err(poisoned)?;
        match streams.get(stream_name) {
            None => Ok(None),
            Some(stream) if stream.deleted => Err(deleted(stream_name)),
            Some(stream) => Ok(stream.head()),
        }
    }

    /// Every event in `stream_name`, in stream order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] or [`StoreError::Deleted`] if the
    /// stream cannot be read.
    pub fn read_all(&self, stream_name: &str) -> Result<Vec<RecordedEvent>, StoreError> {
        let streams = self.streams.read().map_err(poisoned)?;
        match streams.get(stream_name) {
            None => Err(not_found(stream_name)),
            Some(stream) if stream.deleted => Err(deleted(stream_name)),
            Some(stream) => Ok(stream.events.clone()),
        }
    }

    /// Hard deletes `stream_name`. The name can never be written again.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the stream does not exist.
    pub fn delete_stream(&self, stream_name: &str) -> Result<(), StoreError> {
        let mut streams = self.streams.write().map_err(poisoned)?;
        let stream = streams
            .get_mut(stream_name)
            .ok_or_else(|| not_found(stream_name))?;
        stream.deleted = true;
        stream.events.clear();
        debug!(stream = stream_name, "stream deleted");
        Ok(())
    }
}

impl EventStore for InMemoryEventStore {
    fn stream_reader(&self, stream_name: &str) -> Box<dyn StreamReader> {
        Box::new(InMemoryStreamReader {
            streams: Arc::clone(&self.streams),
            stream_name: stream_name.to_owned(),
            cursor: 0,
        })
    }

    fn stream_writer(&self, stream_name: &str) -> Box<dyn StreamWriter> {
        Box::new(InMemoryStreamWriter {
            streams: Arc::clone(&self.streams),
            stream_name: stream_name.to_owned(),
        })
    }
}

/// Reads one event per call; appends made after the reader was opened are
/// visible to it.
struct InMemoryStreamReader {
    streams: Streams,
    stream_name: String,
    cursor: usize,
}

#[async_trait]
impl StreamReader for InMemoryStreamReader {
    async fn next(&mut self) -> Result<RecordedEvent, StoreError> {
        let streams = self.streams.read().map_err(poisoned)?;
        let stream = match streams.get(&self.stream_name) {
            None => return Err(not_found(&self.stream_name)),
            Some(stream) if stream.deleted => return Err(deleted(&self.stream_name)),
            Some(stream) => stream,
        };
        let event = stream
            .events
            .get(self.cursor)
            .cloned()
            .ok_or(StoreError::NoMoreEvents)?;
        self.cursor += 1;
        trace!(stream = %self.stream_name, position = event.stream_position, "event read");
        Ok(event)
    }
}

struct InMemoryStreamWriter {
    streams: Streams,
    stream_name: String,
}

#[async_trait]
impl StreamWriter for InMemoryStreamWriter {
    async fn append(
        &mut self,
        expected_version: ExpectedVersion,
        events: Vec<EventData>,
    ) -> Result<(), StoreError> {
        let mut streams = self.streams.write().map_err(poisoned)?;

        let head = match streams.get(&self.stream_name) {
            Some(stream) if stream.deleted => return Err(deleted(&self.stream_name)),
            Some(stream) => stream.head(),
            None => None,
        };
        if !expected_version.matches(head) {
            debug!(
                stream = %self.stream_name,
                expected = %expected_version,
                ?head,
                "append rejected"
            );
            return Err(StoreError::WrongExpectedVersion {
                stream: self.stream_name.clone(),
                expected: expected_version,
                actual: head,
            });
        }

        if events.is_empty() {
            return Ok(());
        }
        let count = events.len();
        let stream = streams.entry(self.stream_name.clone()).or_default();
        for event in events {
            let stream_position = position_of(stream.events.len());
            stream.events.push(RecordedEvent {
                event_id: event.event_id,
                event_type: event.event_type,
                stream_position,
                data: event.data,
                metadata: event.metadata,
            });
        }
        debug!(stream = %self.stream_name, count, head = ?stream.head(), "events appended");
        Ok(())
    }
}

#[allow(clippy::cast_possible_wrap)]
fn position_of(len: usize) -> i64 {
    len as i64
}

fn not_found(stream_name: &str) -> StoreError {
    StoreError::NotFound {
        stream: stream_name.to_owned(),
    }
}

fn deleted(stream_name: &str) -> StoreError {
    StoreError::Deleted {
        stream: stream_name.to_owned(),
    }
}

fn poisoned<T>(err: PoisonError<T>) -> StoreError {
    StoreError::Other(format!("in-memory event store lock poisoned: {err}").into())
}
