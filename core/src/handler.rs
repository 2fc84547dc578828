//! Event handler traits and the shared handler type stored in props.
//!
//! Host elements receive callbacks through `on*` props. The engine never calls them
//! itself: it hands them to the renderer as bindings, and the renderer invokes them when
//! the host tree reports an interaction. Handlers therefore only need a shared reference
//! to the [`Event`] that fired.
//!
//! - [`Handler`] - the callback trait, implemented for every `Fn(&Event)` closure
//! - [`EventHandler`] - a cheaply clonable, reference-counted handler used as a prop value

use std::rc::Rc;
use core::{any::type_name, fmt::Debug};

use crate::event::Event;

/// Callback invoked when a bound host event fires.
pub trait Handler: 'static {
    /// Handles the event.
    fn handle(&self, event: &Event);
}

impl<F> Handler for F
where
    F: Fn(&Event) + 'static,
{
    fn handle(&self, event: &Event) {
        self(event);
    }
}

impl Debug for dyn Handler {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(type_name::<Self>())
    }
}

/// A reference-counted event handler.
///
/// Two handlers compare equal only when they share the same allocation, which is what
/// structural descriptor equality needs: a freshly created closure is a different
/// handler even if its code is identical.
#[derive(Clone)]
pub struct EventHandler(Rc<dyn Handler>);

impl EventHandler {
    /// Wraps a handler.
    pub fn new(handler: impl Handler) -> Self {
        Self(Rc::new(handler))
    }

    /// Invokes the handler.
    pub fn call(&self, event: &Event) {
        self.0.handle(event);
    }

    /// Returns `true` when both values point at the same handler.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for EventHandler {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl Debug for EventHandler {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("EventHandler")
    }
}

impl<F> From<F> for EventHandler
where
    F: Fn(&Event) + 'static,
{
    fn from(value: F) -> Self {
        Self::new(value)
    }
}
