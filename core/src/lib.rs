//! # Rivulet core
//!
//! Rivulet turns immutable descriptor trees into a persistent tree of instances and keeps
//! a host tree in sync with it.
//!
//! - [`Descriptor`]s describe what should be on screen: text, host elements and
//!   user [`Component`]s.
//! - [`Instance`]s own the lifecycle of one tree position across renders.
//! - Re-rendering a host element reconciles its children by key and queues structural
//!   [`DiffOp`]s, which are applied to the host tree in one batch per pass.
//! - The host tree itself sits behind the [`Renderer`] trait.
//!
//! ```ignore
//! let mut engine = Engine::new(renderer);
//! engine.render(element("ul").children([text("one"), text("two")]), "app")?;
//! ```

#[macro_use]
mod macros;

pub mod component;
mod context;
pub mod descriptor;
pub mod engine;
mod error;
pub mod event;
pub mod handler;
pub mod id;
pub mod instance;
mod patch;
pub mod reconcile;
pub mod renderer;
pub mod resolve;

#[cfg(test)]
mod tests;

pub use component::{Component, ComponentId, ComponentType, Lifecycle, Patch, Scope, Updater};
pub use descriptor::{
    CHILDREN, CompositeDescriptor, Descriptor, Element, Identity, KEY, Props, Record, State, Value,
    component, create_element, element, text,
};
pub use engine::{Engine, EngineBuilder};
pub use error::Error;
pub use event::Event;
pub use handler::{EventHandler, Handler};
pub use id::{NodeId, Segment};
pub use instance::{CompositeInstance, HostInstance, Instance, Phase, TextInstance};
pub use reconcile::{DiffOp, JoinKey};
pub use renderer::{Placement, Renderer};
pub use resolve::instantiate;
