//! Storage backends for the repository's event store port.
//!
//! Only the in-memory backend ships here; it is the reference for the
//! compare-and-append contract and the store used by tests and the demo API.

pub mod memory;

pub use memory::InMemoryEventStore;
