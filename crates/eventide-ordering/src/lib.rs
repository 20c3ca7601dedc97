//! Order lifecycle bounded context.
//!
//! Orders are placed, then either shipped or cancelled. The context owns the
//! `Order` aggregate, its events, the command and query handlers, and the
//! wiring that plugs them into an event-sourced repository.

pub mod application;
pub mod domain;
pub mod error;
pub mod wiring;

pub use error::OrderError;
