//! The component contract.
//!
//! A component is a concrete Rust type implementing [`Component`]. Its lifecycle hooks
//! are declared through a [`Lifecycle`] capability struct: every hook is an optional
//! function pointer, so the engine asks "does this component have an `after_mount`?"
//! by checking a field rather than probing a dynamically assembled object.
//!
//! ```ignore
//! struct Counter;
//!
//! impl Component for Counter {
//!     fn create(_props: &Props) -> Self {
//!         Self
//!     }
//!
//!     fn initial_state(&self, _props: &Props) -> State {
//!         State::new().with("count", 0)
//!     }
//!
//!     fn lifecycle() -> Lifecycle<Self> {
//!         Lifecycle::new().render(Self::render)
//!     }
//! }
//!
//! impl Counter {
//!     fn render(&self, scope: &Scope<'_>) -> Descriptor {
//!         let count = scope.state().get("count").and_then(Value::as_int).unwrap_or(0);
//!         let onclick = scope.handler(move |updater, _| {
//!             updater.set_state(State::new().with("count", count + 1));
//!         });
//!         element("button").prop("onclick", onclick).child(text(count)).into()
//!     }
//! }
//! ```
//!
//! State changes never run synchronously inside a hook or handler. [`Updater::set_state`]
//! queues the request and the engine drains the queue once the current pass is over.

use std::{boxed::Box, collections::VecDeque, rc::Weak};
use core::{
    any::{TypeId, type_name},
    cell::RefCell,
    fmt,
};

use crate::{
    descriptor::{Descriptor, Props, State},
    event::Event,
    handler::EventHandler,
};

/// A user-defined component.
pub trait Component: Sized + 'static {
    /// Constructs the component from its initial props.
    fn create(props: &Props) -> Self;

    /// Returns the state the component starts with.
    fn initial_state(&self, _props: &Props) -> State {
        State::new()
    }

    /// Declares which lifecycle capabilities the component provides.
    fn lifecycle() -> Lifecycle<Self>;
}

/// Renders the component from its current props and state.
pub type RenderFn<C> = fn(&C, &Scope<'_>) -> Descriptor;
/// Hook run before the first render or right after mount.
pub type MountFn<C> = fn(&mut C, &Scope<'_>);
/// Hook receiving a props/state pair next to the current scope.
pub type UpdateFn<C> = fn(&mut C, &Scope<'_>, &Props, &State);
/// Gate deciding whether an update renders.
pub type ShouldUpdateFn<C> = fn(&C, &Scope<'_>, &Props, &State) -> bool;

/// Capability set of a component. Every entry is optional; a component without
/// `render` fails to mount.
pub struct Lifecycle<C> {
    render: Option<RenderFn<C>>,
    before_mount: Option<MountFn<C>>,
    after_mount: Option<MountFn<C>>,
    before_update: Option<UpdateFn<C>>,
    after_update: Option<UpdateFn<C>>,
    should_update: Option<ShouldUpdateFn<C>>,
}

impl<C> Lifecycle<C> {
    /// Creates an empty capability set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            render: None,
            before_mount: None,
            after_mount: None,
            before_update: None,
            after_update: None,
            should_update: None,
        }
    }

    /// Sets the render operation.
    #[must_use]
    pub const fn render(mut self, render: RenderFn<C>) -> Self {
        self.render = Some(render);
        self
    }

    /// Runs before the first render.
    #[must_use]
    pub const fn before_mount(mut self, hook: MountFn<C>) -> Self {
        self.before_mount = Some(hook);
        self
    }

    /// Runs once the pass that mounted the component has been applied.
    #[must_use]
    pub const fn after_mount(mut self, hook: MountFn<C>) -> Self {
        self.after_mount = Some(hook);
        self
    }

    /// Runs before an update renders, with the next props and state.
    #[must_use]
    pub const fn before_update(mut self, hook: UpdateFn<C>) -> Self {
        self.before_update = Some(hook);
        self
    }

    /// Runs after an incremental update, with the previous props and state.
    #[must_use]
    pub const fn after_update(mut self, hook: UpdateFn<C>) -> Self {
        self.after_update = Some(hook);
        self
    }

    /// Decides, from the next props and state, whether an update renders.
    #[must_use]
    pub const fn should_update(mut self, gate: ShouldUpdateFn<C>) -> Self {
        self.should_update = Some(gate);
        self
    }
}

impl<C> Default for Lifecycle<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for Lifecycle<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifecycle")
            .field("render", &self.render.is_some())
            .field("before_mount", &self.before_mount.is_some())
            .field("after_mount", &self.after_mount.is_some())
            .field("before_update", &self.before_update.is_some())
            .field("after_update", &self.after_update.is_some())
            .field("should_update", &self.should_update.is_some())
            .finish()
    }
}

/// Opaque reference to a component definition, compared by type identity.
#[derive(Clone, Copy)]
pub struct ComponentType {
    id: TypeId,
    name: &'static str,
    construct: fn(&Props) -> Box<dyn AnyComponent>,
}

impl ComponentType {
    /// Returns the component type of `C`.
    #[must_use]
    pub fn of<C: Component>() -> Self {
        Self {
            id: TypeId::of::<C>(),
            name: type_name::<C>(),
            construct: construct::<C>,
        }
    }

    /// Returns the component's type name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn construct(&self, props: &Props) -> Box<dyn AnyComponent> {
        (self.construct)(props)
    }
}

impl PartialEq for ComponentType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ComponentType {}

impl fmt::Debug for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ComponentType").field(&self.name).finish()
    }
}

fn construct<C: Component>(props: &Props) -> Box<dyn AnyComponent> {
    let component = C::create(props);
    Box::new(Erased {
        component,
        lifecycle: C::lifecycle(),
    })
}

/// Handle identifying one mounted composite inside an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(u64);

impl ComponentId {
    pub(crate) const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A requested state change.
pub enum Patch {
    /// Entries to merge into the state.
    Merge(State),
    /// Computes the entries to merge from the state current when the update runs.
    With(Box<dyn FnOnce(&State) -> State>),
}

impl Patch {
    /// Produces the partial state to merge into `current`.
    #[must_use]
    pub fn resolve(self, current: &State) -> State {
        match self {
            Self::Merge(patch) => patch,
            Self::With(compute) => compute(current),
        }
    }
}

impl From<State> for Patch {
    fn from(value: State) -> Self {
        Self::Merge(value)
    }
}

impl fmt::Debug for Patch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Merge(state) => f.debug_tuple("Merge").field(state).finish(),
            Self::With(_) => f.write_str("With(..)"),
        }
    }
}

/// Queue of pending state changes, drained by the engine between passes.
pub(crate) type UpdateQueue = RefCell<VecDeque<(ComponentId, Patch)>>;

/// Weak handle a component uses to request its own re-reconciliation.
///
/// The handle does not keep the engine alive. Once the engine is dropped, or the
/// component is unmounted, requests are ignored.
#[derive(Clone)]
pub struct Updater {
    id: ComponentId,
    queue: Weak<UpdateQueue>,
}

impl Updater {
    pub(crate) const fn new(id: ComponentId, queue: Weak<UpdateQueue>) -> Self {
        Self { id, queue }
    }

    /// Returns the component this updater targets.
    #[must_use]
    pub const fn id(&self) -> ComponentId {
        self.id
    }

    /// Queues a shallow merge of `patch` into the component's state.
    pub fn set_state(&self, patch: State) {
        self.enqueue(Patch::Merge(patch));
    }

    /// Queues a state change computed from the state current when the update runs.
    pub fn update_state(&self, compute: impl FnOnce(&State) -> State + 'static) {
        self.enqueue(Patch::With(Box::new(compute)));
    }

    fn enqueue(&self, patch: Patch) {
        if let Some(queue) = self.queue.upgrade() {
            queue.borrow_mut().push_back((self.id, patch));
        } else {
            tracing::trace!(component = %self.id, "dropping state change for a released engine");
        }
    }
}

impl fmt::Debug for Updater {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Updater").field("id", &self.id).finish()
    }
}

/// What a hook or render call sees of its component.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    props: &'a Props,
    state: &'a State,
    updater: &'a Updater,
}

impl<'a> Scope<'a> {
    pub(crate) const fn new(props: &'a Props, state: &'a State, updater: &'a Updater) -> Self {
        Self {
            props,
            state,
            updater,
        }
    }

    /// Current props.
    #[must_use]
    pub const fn props(&self) -> &'a Props {
        self.props
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &'a State {
        self.state
    }

    /// The component's updater.
    #[must_use]
    pub const fn updater(&self) -> &'a Updater {
        self.updater
    }

    /// Queues a shallow state merge. Shorthand for `scope.updater().set_state(patch)`.
    pub fn set_state(&self, patch: State) {
        self.updater.set_state(patch);
    }

    /// Builds an event handler that can request state changes.
    pub fn handler(&self, handler: impl Fn(&Updater, &Event) + 'static) -> EventHandler {
        let updater = self.updater.clone();
        EventHandler::new(move |event: &Event| handler(&updater, event))
    }
}

/// Type-erased component together with its capability set.
pub(crate) trait AnyComponent {
    fn name(&self) -> &'static str;
    fn initial_state(&self, props: &Props) -> State;
    fn can_render(&self) -> bool;
    fn has_after_mount(&self) -> bool;
    fn render(&self, scope: &Scope<'_>) -> Option<Descriptor>;
    fn before_mount(&mut self, scope: &Scope<'_>);
    fn after_mount(&mut self, scope: &Scope<'_>);
    fn before_update(&mut self, scope: &Scope<'_>, next_props: &Props, next_state: &State);
    fn after_update(&mut self, scope: &Scope<'_>, prev_props: &Props, prev_state: &State);
    /// `None` when the component has no gate.
    fn should_update(&self, scope: &Scope<'_>, next_props: &Props, next_state: &State)
    -> Option<bool>;
}

struct Erased<C> {
    component: C,
    lifecycle: Lifecycle<C>,
}

impl<C: Component> AnyComponent for Erased<C> {
    fn name(&self) -> &'static str {
        type_name::<C>()
    }

    fn initial_state(&self, props: &Props) -> State {
        self.component.initial_state(props)
    }

    fn can_render(&self) -> bool {
        self.lifecycle.render.is_some()
    }

    fn has_after_mount(&self) -> bool {
        self.lifecycle.after_mount.is_some()
    }

    fn render(&self, scope: &Scope<'_>) -> Option<Descriptor> {
        self.lifecycle
            .render
            .map(|render| render(&self.component, scope))
    }

    fn before_mount(&mut self, scope: &Scope<'_>) {
        if let Some(hook) = self.lifecycle.before_mount {
            hook(&mut self.component, scope);
        }
    }

    fn after_mount(&mut self, scope: &Scope<'_>) {
        if let Some(hook) = self.lifecycle.after_mount {
            hook(&mut self.component, scope);
        }
    }

    fn before_update(&mut self, scope: &Scope<'_>, next_props: &Props, next_state: &State) {
        if let Some(hook) = self.lifecycle.before_update {
            hook(&mut self.component, scope, next_props, next_state);
        }
    }

    fn after_update(&mut self, scope: &Scope<'_>, prev_props: &Props, prev_state: &State) {
        if let Some(hook) = self.lifecycle.after_update {
            hook(&mut self.component, scope, prev_props, prev_state);
        }
    }

    fn should_update(
        &self,
        scope: &Scope<'_>,
        next_props: &Props,
        next_state: &State,
    ) -> Option<bool> {
        self.lifecycle
            .should_update
            .map(|gate| gate(&self.component, scope, next_props, next_state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    struct Plain;

    impl Component for Plain {
        fn create(_props: &Props) -> Self {
            Self
        }

        fn lifecycle() -> Lifecycle<Self> {
            Lifecycle::new()
        }
    }

    struct Other;

    impl Component for Other {
        fn create(_props: &Props) -> Self {
            Self
        }

        fn lifecycle() -> Lifecycle<Self> {
            Lifecycle::new().render(|_, _| crate::text("other"))
        }
    }

    #[test]
    fn component_types_compare_by_type() {
        assert_eq!(ComponentType::of::<Plain>(), ComponentType::of::<Plain>());
        assert_ne!(ComponentType::of::<Plain>(), ComponentType::of::<Other>());
    }

    #[test]
    fn erased_reports_capabilities() {
        let plain = ComponentType::of::<Plain>().construct(&Props::new());
        let other = ComponentType::of::<Other>().construct(&Props::new());
        assert!(!plain.can_render());
        assert!(other.can_render());
        assert!(!other.has_after_mount());
    }

    #[test]
    fn updater_queues_until_engine_is_gone() {
        let queue: Rc<UpdateQueue> = Rc::new(RefCell::new(VecDeque::new()));
        let updater = Updater::new(ComponentId::new(1), Rc::downgrade(&queue));
        updater.set_state(State::new().with("a", 1));
        updater.update_state(|_| State::new().with("b", 2));
        assert_eq!(queue.borrow().len(), 2);

        drop(queue);
        updater.set_state(State::new());
    }

    #[test]
    fn computed_patch_sees_current_state() {
        let patch = Patch::With(Box::new(|state: &State| {
            let count = state.get("count").and_then(crate::Value::as_int).unwrap_or(0);
            State::new().with("count", count + 1)
        }));
        let resolved = patch.resolve(&State::new().with("count", 4));
        assert_eq!(resolved.get("count"), Some(&crate::Value::Int(5)));
    }
}
