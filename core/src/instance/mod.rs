//! Persistent instances owning the lifecycle of one tree position.
//!
//! An instance is created the first time a descriptor appears at a position and lives
//! for as long as later descriptors at that position stay update-compatible with it.
//! Incompatible descriptors discard the instance together with its subtree.

mod composite;
mod host;
mod text;

use std::{format, rc::Rc, string::String};
use core::cell::RefCell;

pub use composite::{CompositeInstance, Phase};
pub use host::HostInstance;
pub use text::TextInstance;

use crate::{
    Error,
    component::ComponentId,
    context::Reconciler,
    descriptor::{Descriptor, Identity},
    id::NodeId,
    renderer::Renderer,
};

/// Composite instances are shared with the engine registry, which only keeps weak
/// references to them.
pub type SharedComposite = Rc<RefCell<CompositeInstance>>;

/// A mounted (or about to be mounted) position in the instance tree.
#[derive(Debug)]
pub enum Instance {
    /// Text leaf.
    Text(TextInstance),
    /// Host element.
    Host(HostInstance),
    /// User component.
    Composite(SharedComposite),
}

impl Instance {
    /// Mounts the instance created from `source` at `id` and returns its markup.
    ///
    /// Host instances read their children from `source`; they do not keep a copy.
    pub(crate) fn mount<R: Renderer>(
        &mut self,
        source: &Descriptor,
        id: NodeId,
        ctx: &mut Reconciler<'_, R>,
    ) -> Result<R::Markup, Error> {
        match (self, source) {
            (Self::Text(text), Descriptor::Text(_)) => Ok(text.mount(id, ctx)),
            (Self::Host(host), Descriptor::Element(element)) => {
                host.mount(id, element.children_ref(), ctx)
            }
            (Self::Composite(composite), Descriptor::Composite(_)) => {
                CompositeInstance::mount(composite, id, ctx)
            }
            (instance, source) => Err(Error::UnsupportedDescriptor(format!(
                "cannot mount a {} instance from <{}>",
                instance.kind(),
                source.label()
            ))),
        }
    }

    /// Reconciles the instance against an update-compatible descriptor.
    pub(crate) fn update<R: Renderer>(
        &mut self,
        next: &Descriptor,
        ctx: &mut Reconciler<'_, R>,
    ) -> Result<(), Error> {
        match (self, next) {
            (Self::Text(text), Descriptor::Text(value)) => text.update(value, ctx),
            (Self::Host(host), Descriptor::Element(element)) => host.update(element, ctx),
            (Self::Composite(composite), Descriptor::Composite(descriptor)) => {
                CompositeInstance::update(composite, Some(descriptor.clone()), None, ctx)
            }
            (instance, next) => Err(Error::UnsupportedDescriptor(format!(
                "cannot update a {} instance with <{}>",
                instance.kind(),
                next.label()
            ))),
        }
    }

    /// Unregisters every binding in the subtree and releases its composites.
    pub(crate) fn unmount<R: Renderer>(&mut self, ctx: &mut Reconciler<'_, R>) {
        match self {
            Self::Text(_) => {}
            Self::Host(host) => host.unmount(ctx),
            Self::Composite(composite) => CompositeInstance::unmount(composite, ctx),
        }
    }

    /// Returns `true` if the instance may be updated to `next`, i.e. if its current
    /// descriptor [is update-compatible](Descriptor::is_update_compatible) with `next`.
    #[must_use]
    pub fn accepts(&self, next: &Descriptor) -> bool {
        let next = next.identity();
        match self {
            Self::Text(_) => next == Identity::Text,
            Self::Host(host) => host.element().identity() == next,
            Self::Composite(composite) => composite.borrow().descriptor().identity() == next,
        }
    }

    /// Returns the explicit key of the current descriptor.
    #[must_use]
    pub fn key(&self) -> Option<String> {
        match self {
            Self::Text(_) => None,
            Self::Host(host) => host.element().key_ref().map(Into::into),
            Self::Composite(composite) => composite.borrow().descriptor().key_ref().map(Into::into),
        }
    }

    /// Returns the node id assigned at mount time.
    #[must_use]
    pub fn node_id(&self) -> Option<NodeId> {
        match self {
            Self::Text(text) => text.node_id().cloned(),
            Self::Host(host) => host.node_id().cloned(),
            Self::Composite(composite) => composite.borrow().node_id().cloned(),
        }
    }

    /// Returns the component handle of a composite instance.
    #[must_use]
    pub fn component_id(&self) -> Option<ComponentId> {
        match self {
            Self::Composite(composite) => composite.borrow().id(),
            _ => None,
        }
    }

    /// Instance kind, for diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Host(_) => "host",
            Self::Composite(_) => "composite",
        }
    }
}

#[cfg(test)]
mod tests {
    use std::vec;

    use super::*;
    use crate::{
        component::{Component, Lifecycle},
        descriptor::{Props, component, element, text},
        resolve::instantiate,
    };

    struct Plain;

    impl Component for Plain {
        fn create(_props: &Props) -> Self {
            Self
        }

        fn lifecycle() -> Lifecycle<Self> {
            Lifecycle::new()
        }
    }

    #[test]
    fn accepts_agrees_with_update_compatibility() {
        let candidates: Vec<Descriptor> = vec![
            text("a"),
            text(1),
            element("div").into(),
            element("div").prop("x", 1).child(text("c")).into(),
            element("div").key("k").into(),
            element("span").key("k").into(),
            component::<Plain>().into(),
            component::<Plain>().key("k").into(),
            component::<Plain>().prop("x", 1).into(),
        ];
        for current in &candidates {
            let instance = instantiate(current).expect("resolve");
            for next in &candidates {
                assert_eq!(
                    instance.accepts(next),
                    current.is_update_compatible(next),
                    "{} -> {}",
                    current.label(),
                    next.label()
                );
            }
        }
    }
}
