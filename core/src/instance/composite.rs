use std::boxed::Box;
use core::fmt;

use super::{Instance, SharedComposite};
use crate::{
    Error,
    component::{AnyComponent, ComponentId, Patch, Scope, Updater},
    context::Reconciler,
    descriptor::{CompositeDescriptor, State},
    id::NodeId,
    renderer::Renderer,
    resolve::instantiate,
};

/// Lifecycle phase of a composite instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Not mounted yet, or discarded.
    #[default]
    Unmounted,
    /// Mounted and idle.
    Mounted,
    /// Running an update.
    Updating,
}

/// Instance wrapping one user component.
///
/// Owns the component value, its live state and exactly one rendered child instance,
/// which shares the composite's node id.
pub struct CompositeInstance {
    descriptor: CompositeDescriptor,
    node_id: Option<NodeId>,
    component: Option<Box<dyn AnyComponent>>,
    state: State,
    rendered: Option<Box<Instance>>,
    updater: Option<Updater>,
    phase: Phase,
}

impl fmt::Debug for CompositeInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeInstance")
            .field("component", &self.descriptor.component().name())
            .field("node_id", &self.node_id)
            .field("phase", &self.phase)
            .field("state", &self.state)
            .field("rendered", &self.rendered)
            .finish_non_exhaustive()
    }
}

impl CompositeInstance {
    pub(crate) fn new(descriptor: CompositeDescriptor) -> Self {
        Self {
            descriptor,
            node_id: None,
            component: None,
            state: State::new(),
            rendered: None,
            updater: None,
            phase: Phase::Unmounted,
        }
    }

    /// The descriptor this instance was last reconciled against.
    #[must_use]
    pub const fn descriptor(&self) -> &CompositeDescriptor {
        &self.descriptor
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &State {
        &self.state
    }

    /// Current lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Node id assigned at mount; shared with the rendered child.
    #[must_use]
    pub const fn node_id(&self) -> Option<&NodeId> {
        self.node_id.as_ref()
    }

    /// Handle under which the engine registered this component.
    #[must_use]
    pub fn id(&self) -> Option<ComponentId> {
        self.updater.as_ref().map(Updater::id)
    }

    /// The single rendered child.
    #[must_use]
    pub fn rendered(&self) -> Option<&Instance> {
        self.rendered.as_deref()
    }

    pub(crate) fn mount<R: Renderer>(
        this: &SharedComposite,
        id: NodeId,
        ctx: &mut Reconciler<'_, R>,
    ) -> Result<R::Markup, Error> {
        let updater = ctx.register(this);
        let mut guard = this.borrow_mut();
        let inner = &mut *guard;

        let mut component = inner.descriptor.component().construct(inner.descriptor.props_ref());
        if !component.can_render() {
            ctx.release(updater.id());
            return Err(Error::MissingRender {
                component: component.name(),
            });
        }
        inner.state = component.initial_state(inner.descriptor.props_ref());
        inner.node_id = Some(id.clone());

        let scope = Scope::new(inner.descriptor.props_ref(), &inner.state, &updater);
        component.before_mount(&scope);
        let rendered = component.render(&scope).ok_or(Error::MissingRender {
            component: component.name(),
        })?;
        let mut child = instantiate(&rendered)?;
        let markup = child.mount(&rendered, id, ctx)?;

        tracing::debug!(component = component.name(), id = %updater.id(), "mounted");
        let schedule = component.has_after_mount();
        inner.component = Some(component);
        inner.rendered = Some(Box::new(child));
        inner.updater = Some(updater);
        inner.phase = Phase::Mounted;
        drop(guard);

        if schedule {
            ctx.schedule_after_mount(this.clone());
        }
        Ok(markup)
    }

    /// Runs one update.
    ///
    /// `next` is supplied when a parent re-renders, `patch` when the component asked
    /// for a state change. The patch is merged before the `should_update` gate runs, so
    /// a suppressed update still commits its state.
    pub(crate) fn update<R: Renderer>(
        this: &SharedComposite,
        next: Option<CompositeDescriptor>,
        patch: Option<Patch>,
        ctx: &mut Reconciler<'_, R>,
    ) -> Result<(), Error> {
        let mut guard = this.borrow_mut();
        let inner = &mut *guard;
        if inner.phase != Phase::Mounted {
            tracing::trace!(phase = ?inner.phase, "skipping update of an idle composite");
            return Ok(());
        }
        let (Some(component), Some(updater), Some(id)) = (
            inner.component.as_mut(),
            inner.updater.clone(),
            inner.node_id.clone(),
        ) else {
            return Err(Error::NotMounted { kind: "composite" });
        };
        inner.phase = Phase::Updating;

        let prev_props = inner.descriptor.props_ref().clone();
        let prev_state = inner.state.clone();
        if let Some(next) = next {
            inner.descriptor = next;
        }
        let next_state = match patch {
            Some(patch) => {
                let partial = patch.resolve(&inner.state);
                inner.state.merged(partial)
            }
            None => inner.state.clone(),
        };

        let current = Scope::new(&prev_props, &prev_state, &updater);
        if component.should_update(&current, inner.descriptor.props_ref(), &next_state)
            == Some(false)
        {
            tracing::debug!(component = component.name(), "update suppressed by should_update");
            inner.state = next_state;
            inner.phase = Phase::Mounted;
            return Ok(());
        }
        component.before_update(&current, inner.descriptor.props_ref(), &next_state);
        inner.state = next_state;

        let scope = Scope::new(inner.descriptor.props_ref(), &inner.state, &updater);
        let next_rendered = component.render(&scope).ok_or(Error::MissingRender {
            component: component.name(),
        })?;
        let rendered = inner
            .rendered
            .as_mut()
            .ok_or(Error::NotMounted { kind: "composite" })?;

        if rendered.accepts(&next_rendered) {
            rendered.update(&next_rendered, ctx)?;
            component.after_update(&scope, &prev_props, &prev_state);
        } else {
            tracing::debug!(
                component = component.name(),
                node = %id,
                root = next_rendered.label(),
                "rendered root changed shape, replacing subtree"
            );
            rendered.unmount(ctx);
            let mut fresh = instantiate(&next_rendered)?;
            let markup = fresh.mount(&next_rendered, id.clone(), ctx)?;
            ctx.renderer().replace_node(&id, markup)?;
            **rendered = fresh;
        }
        inner.phase = Phase::Mounted;
        Ok(())
    }

    pub(crate) fn unmount<R: Renderer>(this: &SharedComposite, ctx: &mut Reconciler<'_, R>) {
        let mut inner = this.borrow_mut();
        if let Some(id) = inner.id() {
            ctx.release(id);
        }
        if let Some(rendered) = inner.rendered.as_mut() {
            rendered.unmount(ctx);
        }
        inner.component = None;
        inner.phase = Phase::Unmounted;
    }

    pub(crate) fn run_after_mount(this: &SharedComposite) {
        let mut guard = this.borrow_mut();
        let inner = &mut *guard;
        if inner.phase != Phase::Mounted {
            return;
        }
        if let (Some(component), Some(updater)) = (inner.component.as_mut(), inner.updater.as_ref()) {
            let scope = Scope::new(inner.descriptor.props_ref(), &inner.state, updater);
            component.after_mount(&scope);
        }
    }
}
