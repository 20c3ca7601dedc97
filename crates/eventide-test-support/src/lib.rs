//! Shared test doubles for eventide crates.

mod clock;
mod handler;
mod store;

pub use clock::FixedClock;
pub use handler::RecordingEventHandler;
pub use store::FailingEventStore;
