//! Upcasting trait objects to `Any`.

use std::any::Any;

/// Access to a value as `dyn Any`, implemented for every `'static` type.
///
/// Used as a supertrait so `dyn Aggregate` and `dyn EventPayload` can be
/// downcast to their concrete types. Call it on the trait object itself
/// (`AsAny::as_any(&*boxed)`), not on the `Box`/`Arc` holding it.
pub trait AsAny {
    /// Borrows `self` as `dyn Any`.
    fn as_any(&self) -> &dyn Any;

    /// Converts a boxed `self` into `Box<dyn Any>`.
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}
