//! The engine owning mounted roots and running reconciliation passes.

use std::{collections::BTreeMap, collections::VecDeque, rc::Rc, string::String, vec::Vec};
use core::{cell::RefCell, fmt};

use crate::{
    Error,
    component::{Component, ComponentId, ComponentType, Patch, UpdateQueue},
    context::{Reconciler, Registry},
    descriptor::{Descriptor, State},
    event::Event,
    id::NodeId,
    instance::{CompositeInstance, Instance},
    renderer::Renderer,
    resolve::instantiate,
};

/// Default bound on state changes applied by one [`Engine::flush_updates`] call.
pub const DEFAULT_MAX_UPDATE_ROUNDS: usize = 64;

/// Builder for [`Engine`].
#[derive(Debug, Clone, Copy)]
pub struct EngineBuilder {
    root_index: usize,
    max_update_rounds: usize,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineBuilder {
    /// Creates a builder with default configuration.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            root_index: 0,
            max_update_rounds: DEFAULT_MAX_UPDATE_ROUNDS,
        }
    }

    /// Sets the index the first rendered root is assigned.
    #[must_use]
    pub const fn with_root_index(mut self, index: usize) -> Self {
        self.root_index = index;
        self
    }

    /// Bounds the number of queued state changes one flush applies before giving up.
    #[must_use]
    pub const fn with_max_update_rounds(mut self, rounds: usize) -> Self {
        self.max_update_rounds = rounds;
        self
    }

    /// Creates an engine rendering through `renderer`.
    #[must_use]
    pub fn build<R: Renderer>(self, renderer: R) -> Engine<R> {
        Engine {
            renderer,
            roots: BTreeMap::new(),
            registry: Registry::default(),
            updates: Rc::new(RefCell::new(VecDeque::new())),
            next_root: self.root_index,
            max_update_rounds: self.max_update_rounds,
        }
    }
}

struct Root {
    id: NodeId,
    instance: Instance,
}

/// Reconciliation engine.
///
/// Each mount target holds at most one root. Components request state changes through
/// their [`Updater`](crate::Updater); the engine applies them one pass at a time after the
/// pass, event dispatch or [`Engine::request_update`] call that produced them.
pub struct Engine<R: Renderer> {
    renderer: R,
    roots: BTreeMap<String, Root>,
    registry: Registry,
    updates: Rc<UpdateQueue>,
    next_root: usize,
    max_update_rounds: usize,
}

impl<R: Renderer> fmt::Debug for Engine<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("targets", &self.roots.keys().collect::<Vec<_>>())
            .field("components", &self.registry.len())
            .field("pending_updates", &self.updates.borrow().len())
            .field("next_root", &self.next_root)
            .finish_non_exhaustive()
    }
}

impl<R: Renderer> Engine<R> {
    /// Creates an engine with default configuration.
    #[must_use]
    pub fn new(renderer: R) -> Self {
        EngineBuilder::new().build(renderer)
    }

    /// Returns a builder for configuring an engine.
    #[must_use]
    pub const fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Mounts `descriptor` into `target`, replacing any previous content.
    ///
    /// The root takes the next root index; a root previously rendered into `target` is
    /// unmounted first. Returns the id of the new root.
    ///
    /// # Errors
    ///
    /// Fails if the descriptor cannot be resolved, a component cannot render, or the
    /// renderer rejects the target.
    pub fn render(&mut self, descriptor: impl Into<Descriptor>, target: &str) -> Result<NodeId, Error> {
        let descriptor = descriptor.into();
        let id = NodeId::root(self.next_root);
        self.next_root += 1;
        let _span = tracing::debug_span!("render", mount_target = target, root = %id).entered();

        let mut instance = instantiate(&descriptor)?;
        let mut ctx = Reconciler::new(&mut self.renderer, &mut self.registry, Rc::downgrade(&self.updates));
        if let Some(mut previous) = self.roots.remove(target) {
            tracing::debug!(previous = %previous.id, "replacing root");
            previous.instance.unmount(&mut ctx);
        }
        let markup = instance.mount(&descriptor, id.clone(), &mut ctx)?;
        ctx.renderer().mount(target, markup)?;
        ctx.finish()?;

        self.roots.insert(
            target.into(),
            Root {
                id: id.clone(),
                instance,
            },
        );
        self.flush_updates()?;
        Ok(id)
    }

    /// Reconciles the root in `target` against `descriptor`.
    ///
    /// A compatible root is updated in place; otherwise it is replaced under the same
    /// root id.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::UnknownTarget`] if nothing was rendered into `target`, or with
    /// whatever the pass raises.
    pub fn update(&mut self, descriptor: impl Into<Descriptor>, target: &str) -> Result<(), Error> {
        let descriptor = descriptor.into();
        let root = self
            .roots
            .get_mut(target)
            .ok_or_else(|| Error::UnknownTarget(target.into()))?;
        let _span = tracing::debug_span!("update", mount_target = target, root = %root.id).entered();

        let mut ctx = Reconciler::new(&mut self.renderer, &mut self.registry, Rc::downgrade(&self.updates));
        if root.instance.accepts(&descriptor) {
            root.instance.update(&descriptor, &mut ctx)?;
        } else {
            root.instance.unmount(&mut ctx);
            let mut instance = instantiate(&descriptor)?;
            let markup = instance.mount(&descriptor, root.id.clone(), &mut ctx)?;
            ctx.renderer().mount(target, markup)?;
            root.instance = instance;
        }
        ctx.finish()?;
        self.flush_updates()
    }

    /// Requests a state change for a mounted component and applies it.
    ///
    /// Requests for components that are no longer mounted are ignored.
    ///
    /// # Errors
    ///
    /// Propagates failures of the update pass.
    pub fn request_update(&mut self, component: ComponentId, patch: impl Into<Patch>) -> Result<(), Error> {
        self.updates.borrow_mut().push_back((component, patch.into()));
        self.flush_updates()
    }

    /// Applies queued state changes, one pass each, until the queue is empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UpdateLimitExceeded`] once more changes than the configured bound
    /// were applied in one call; the remaining queue is discarded.
    pub fn flush_updates(&mut self) -> Result<(), Error> {
        let mut applied = 0;
        loop {
            let next = self.updates.borrow_mut().pop_front();
            let Some((id, patch)) = next else {
                return Ok(());
            };
            if applied == self.max_update_rounds {
                self.updates.borrow_mut().clear();
                tracing::warn!(limit = self.max_update_rounds, "state updates did not settle");
                return Err(Error::UpdateLimitExceeded(self.max_update_rounds));
            }
            applied += 1;

            let Some(composite) = self.registry.get(id) else {
                tracing::trace!(component = %id, "ignoring update for an unmounted component");
                continue;
            };
            let _span = tracing::debug_span!("state_update", component = %id).entered();
            let mut ctx =
                Reconciler::new(&mut self.renderer, &mut self.registry, Rc::downgrade(&self.updates));
            CompositeInstance::update(&composite, None, Some(patch), &mut ctx)?;
            ctx.finish()?;
        }
    }

    /// Invokes the handler bound to the event's target, then applies the state changes
    /// it requested. Returns `false` when nothing is bound.
    ///
    /// # Errors
    ///
    /// Propagates failures of the resulting update passes.
    pub fn dispatch(&mut self, event: &Event) -> Result<bool, Error> {
        let Some(handler) = self.renderer.binding(event.target(), event.name()) else {
            tracing::trace!(node = %event.target(), event = event.name(), "no binding");
            return Ok(false);
        };
        handler.call(event);
        self.flush_updates()?;
        Ok(true)
    }

    /// Unmounts the root in `target` and clears the target. Returns `false` if nothing
    /// was rendered there.
    ///
    /// # Errors
    ///
    /// Fails if the renderer cannot clear the target.
    pub fn unmount(&mut self, target: &str) -> Result<bool, Error> {
        let Some(mut root) = self.roots.remove(target) else {
            return Ok(false);
        };
        let mut ctx = Reconciler::new(&mut self.renderer, &mut self.registry, Rc::downgrade(&self.updates));
        root.instance.unmount(&mut ctx);
        ctx.renderer().clear(target)?;
        ctx.finish()?;
        tracing::debug!(mount_target = target, root = %root.id, "unmounted");
        Ok(true)
    }

    /// Current state of a mounted component.
    #[must_use]
    pub fn state_of(&self, component: ComponentId) -> Option<State> {
        self.registry
            .get(component)
            .map(|composite| composite.borrow().state().clone())
    }

    /// Mounted components of type `C`, oldest first.
    #[must_use]
    pub fn components_of<C: Component>(&self) -> Vec<ComponentId> {
        let ty = ComponentType::of::<C>();
        self.registry
            .iter()
            .filter(|(_, composite)| composite.borrow().descriptor().component() == ty)
            .map(|(id, _)| id)
            .collect()
    }

    /// The root instance rendered into `target`.
    #[must_use]
    pub fn root(&self, target: &str) -> Option<&Instance> {
        self.roots.get(target).map(|root| &root.instance)
    }

    /// The root id of `target`.
    #[must_use]
    pub fn root_id(&self, target: &str) -> Option<&NodeId> {
        self.roots.get(target).map(|root| &root.id)
    }

    /// Provides access to the renderer.
    #[must_use]
    pub const fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Provides mutable access to the renderer.
    #[must_use]
    pub const fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }
}
