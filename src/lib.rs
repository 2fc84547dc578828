#![doc = include_str!("../README.md")]
#![allow(clippy::multiple_crate_versions)]

pub mod logging;

#[doc(inline)]
pub use rivulet_core::*;

/// The in-memory renderer.
pub use rivulet_memory as memory;

pub mod prelude {
    //! Commonly used items in one import.
    //!
    //! ```rust,ignore
    //! use rivulet::prelude::*;
    //! ```
    pub use rivulet_core::{
        Component, Descriptor, Element, Engine, EngineBuilder, Error, Event, EventHandler,
        Lifecycle, NodeId, Props, Renderer, Scope, State, Updater, Value, component,
        create_element, el, element, props, text,
    };
    pub use rivulet_memory::{DEFAULT_CONTAINER, Document, DocumentBuilder};
}
