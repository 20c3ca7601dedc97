//! Event store port.
//!
//! The store is an append-only log of named streams. Reading is lazy and
//! forward-only; writing is a single compare-and-append primitive governed by
//! [`ExpectedVersion`]. Implementations must make an append all-or-nothing.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::error::StoreError;
use crate::event::{EventMessage, Headers};

/// Concurrency policy for an append.
///
/// The numeric encoding is `-2` for [`Any`](Self::Any), `-1` for
/// [`NoStream`](Self::NoStream) and `v >= 0` for [`Exact`](Self::Exact).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExpectedVersion {
    /// Append unconditionally.
    Any,
    /// The stream must not exist yet.
    NoStream,
    /// The stream head must be exactly this position.
    Exact(i64),
}

/// Rejected numeric expected version (anything below `-2`).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("invalid expected version {0}; use -2 (any), -1 (no stream) or a position >= 0")]
pub struct InvalidExpectedVersion(pub i64);

impl ExpectedVersion {
    /// Numeric value of [`ExpectedVersion::Any`].
    pub const ANY: i64 = -2;
    /// Numeric value of [`ExpectedVersion::NoStream`].
    pub const NO_STREAM: i64 = -1;

    /// The numeric encoding of this policy.
    #[must_use]
    pub fn as_raw(self) -> i64 {
        match self {
            Self::Any => Self::ANY,
            Self::NoStream => Self::NO_STREAM,
            Self::Exact(version) => version,
        }
    }

    /// Whether an append is allowed against a stream whose head is `head`
    /// (`None` when the stream does not exist).
    #[must_use]
    pub fn matches(self, head: Option<i64>) -> bool {
        match self {
            Self::Any => true,
            Self::NoStream => head.is_none(),
            Self::Exact(version) => head == Some(version),
        }
    }

    /// The position the first appended event will occupy, if the policy
    /// pins the stream head.
    #[must_use]
    pub fn next_position(self) -> Option<i64> {
        match self {
            Self::Any => None,
            Self::NoStream => Some(0),
            Self::Exact(version) => Some(version + 1),
        }
    }
}

impl TryFrom<i64> for ExpectedVersion {
    type Error = InvalidExpectedVersion;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        match raw {
            Self::ANY => Ok(Self::Any),
            Self::NO_STREAM => Ok(Self::NoStream),
            version if version >= 0 => Ok(Self::Exact(version)),
            invalid => Err(InvalidExpectedVersion(invalid)),
        }
    }
}

impl fmt::Display for ExpectedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any"),
            Self::NoStream => f.write_str("no stream"),
            Self::Exact(version) => write!(f, "{version}"),
        }
    }
}

/// Store-native form of an event to be appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventData {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Event type name for deserialization routing.
    pub event_type: String,
    /// Serialized event payload.
    pub data: serde_json::Value,
    /// Serialized headers.
    pub metadata: serde_json::Value,
}

impl TryFrom<&EventMessage> for EventData {
    type Error = serde_json::Error;

    fn try_from(message: &EventMessage) -> Result<Self, Self::Error> {
        Ok(Self {
            event_id: message.event_id(),
            event_type: message.event_type().to_owned(),
            data: message.payload().to_data()?,
            metadata: serde_json::to_value(message.headers())?,
        })
    }
}

/// Store-native form of an event read back from a stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedEvent {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Event type name for deserialization routing.
    pub event_type: String,
    /// Position of the event within its stream, starting at `0`.
    pub stream_position: i64,
    /// Serialized event payload.
    pub data: serde_json::Value,
    /// Serialized headers.
    pub metadata: serde_json::Value,
}

impl RecordedEvent {
    /// Decodes the metadata into a header map. Missing metadata yields no
    /// headers.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if the metadata is not a JSON object.
    pub fn scan_headers(&self) -> Result<Headers, serde_json::Error> {
        if self.metadata.is_null() {
            return Ok(Headers::new());
        }
        Headers::deserialize(&self.metadata)
    }
}

/// Lazy, forward-only reader over one stream.
#[async_trait]
pub trait StreamReader: Send {
    /// Advances to the next event.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoMoreEvents`] once the stream is exhausted, and
    /// the store's failure otherwise (`NotFound`, `Unauthorized`, ...).
    async fn next(&mut self) -> Result<RecordedEvent, StoreError>;
}

/// Compare-and-append writer for one stream.
#[async_trait]
pub trait StreamWriter: Send {
    /// Appends `events` to the head of the stream if `expected_version`
    /// matches. Either every event is written or none is.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::WrongExpectedVersion`] on a concurrency
    /// conflict, or the store's failure otherwise.
    async fn append(
        &mut self,
        expected_version: ExpectedVersion,
        events: Vec<EventData>,
    ) -> Result<(), StoreError>;
}

/// Append-only log of named streams.
pub trait EventStore: Send + Sync {
    /// Opens a reader positioned before the first event of `stream_name`.
    fn stream_reader(&self, stream_name: &str) -> Box<dyn StreamReader>;

    /// Opens a writer for `stream_name`.
    fn stream_writer(&self, stream_name: &str) -> Box<dyn StreamWriter>;
}
