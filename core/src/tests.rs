use std::{
    collections::BTreeMap,
    format,
    rc::Rc,
    string::{String, ToString},
    vec::Vec,
};
use core::cell::{Cell, RefCell};

use crate::{
    Error,
    component::{Component, Lifecycle, Scope, UpdateQueue},
    context::{Reconciler, Registry},
    descriptor::{Descriptor, Props, State, Value, component, element, text},
    engine::{Engine, EngineBuilder},
    event::Event,
    handler::EventHandler,
    id::NodeId,
    instance::{Instance, Phase},
    reconcile::{DiffOp, MountedChild, child_id, reconcile_children},
    renderer::{Placement, Renderer},
    resolve::instantiate,
};

pub const TARGET: &str = "app";

/// A renderer call, without payloads that cannot be compared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Register(String, String),
    Unregister(String, String),
    ApplyAttribute(String, String, String),
    RemoveAttribute(String, String),
    ReplaceText(String, String),
    ReplaceNode(String, String),
    Delete(String, usize),
    Insert(String, usize),
    Mount(String),
    Clear(String),
}

/// Renderer producing markup strings and recording every mutation.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub calls: Vec<Call>,
    targets: BTreeMap<String, String>,
    bindings: BTreeMap<(String, String), EventHandler>,
}

impl RecordingRenderer {
    /// Markup last mounted into the harness target.
    pub fn markup(&self) -> &str {
        self.targets.get(TARGET).map_or("", String::as_str)
    }

    /// Bound `node:event` pairs.
    pub fn bound(&self) -> Vec<String> {
        self.bindings
            .keys()
            .map(|(node, event)| format!("{node}:{event}"))
            .collect()
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|call| matches(call)).count()
    }
}

impl Renderer for RecordingRenderer {
    type Markup = String;
    type Node = String;

    fn serialize_leaf(&mut self, id: &NodeId, text: &str) -> String {
        format!(r#"<span data-id="{id}">{text}</span>"#)
    }

    fn serialize_element(
        &mut self,
        id: &NodeId,
        tag: &str,
        attributes: Vec<(String, String)>,
        children: Vec<String>,
    ) -> String {
        let attributes: String = attributes
            .iter()
            .map(|(name, value)| format!(r#" {name}="{value}""#))
            .collect();
        format!(
            r#"<{tag} data-id="{id}"{attributes}>{}</{tag}>"#,
            children.concat()
        )
    }

    fn register_binding(&mut self, id: &NodeId, event: &str, handler: EventHandler) {
        self.calls.push(Call::Register(id.to_string(), event.into()));
        self.bindings.insert((id.to_string(), event.into()), handler);
    }

    fn unregister_binding(&mut self, id: &NodeId, event: &str) {
        self.calls.push(Call::Unregister(id.to_string(), event.into()));
        self.bindings.remove(&(id.to_string(), event.into()));
    }

    fn binding(&self, id: &NodeId, event: &str) -> Option<EventHandler> {
        self.bindings.get(&(id.to_string(), event.into())).cloned()
    }

    fn apply_attribute(&mut self, id: &NodeId, name: &str, value: &str) -> Result<(), Error> {
        self.calls
            .push(Call::ApplyAttribute(id.to_string(), name.into(), value.into()));
        Ok(())
    }

    fn remove_attribute(&mut self, id: &NodeId, name: &str) -> Result<(), Error> {
        self.calls.push(Call::RemoveAttribute(id.to_string(), name.into()));
        Ok(())
    }

    fn replace_text(&mut self, id: &NodeId, text: &str) -> Result<(), Error> {
        self.calls.push(Call::ReplaceText(id.to_string(), text.into()));
        Ok(())
    }

    fn replace_node(&mut self, id: &NodeId, markup: String) -> Result<(), Error> {
        self.calls.push(Call::ReplaceNode(id.to_string(), markup));
        Ok(())
    }

    fn delete_node(&mut self, parent: &NodeId, index: usize) -> Result<String, Error> {
        self.calls.push(Call::Delete(parent.to_string(), index));
        Ok(format!("{parent}[{index}]"))
    }

    fn insert_node(
        &mut self,
        parent: &NodeId,
        index: usize,
        _content: Placement<String, String>,
    ) -> Result<(), Error> {
        self.calls.push(Call::Insert(parent.to_string(), index));
        Ok(())
    }

    fn mount(&mut self, target: &str, markup: String) -> Result<(), Error> {
        self.calls.push(Call::Mount(target.into()));
        self.targets.insert(target.into(), markup);
        Ok(())
    }

    fn clear(&mut self, target: &str) -> Result<(), Error> {
        self.calls.push(Call::Clear(target.into()));
        self.targets.remove(target);
        Ok(())
    }
}

/// A single flat child list under root `0`, for exercising the patch executor.
#[derive(Debug, Default)]
pub struct ListRenderer {
    items: Vec<String>,
}

impl ListRenderer {
    pub fn with(items: &[&str]) -> Self {
        Self {
            items: items.iter().map(ToString::to_string).collect(),
        }
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    fn check(parent: &NodeId) -> Result<(), Error> {
        if *parent == NodeId::root(0) {
            Ok(())
        } else {
            Err(Error::InvalidParent(parent.clone()))
        }
    }
}

impl Renderer for ListRenderer {
    type Markup = String;
    type Node = String;

    fn serialize_leaf(&mut self, _id: &NodeId, text: &str) -> String {
        text.into()
    }

    fn serialize_element(
        &mut self,
        _id: &NodeId,
        tag: &str,
        _attributes: Vec<(String, String)>,
        _children: Vec<String>,
    ) -> String {
        tag.into()
    }

    fn register_binding(&mut self, _id: &NodeId, _event: &str, _handler: EventHandler) {}

    fn unregister_binding(&mut self, _id: &NodeId, _event: &str) {}

    fn binding(&self, _id: &NodeId, _event: &str) -> Option<EventHandler> {
        None
    }

    fn apply_attribute(&mut self, _id: &NodeId, _name: &str, _value: &str) -> Result<(), Error> {
        Ok(())
    }

    fn remove_attribute(&mut self, _id: &NodeId, _name: &str) -> Result<(), Error> {
        Ok(())
    }

    fn replace_text(&mut self, _id: &NodeId, _text: &str) -> Result<(), Error> {
        Ok(())
    }

    fn replace_node(&mut self, _id: &NodeId, _markup: String) -> Result<(), Error> {
        Ok(())
    }

    fn delete_node(&mut self, parent: &NodeId, index: usize) -> Result<String, Error> {
        Self::check(parent)?;
        if index >= self.items.len() {
            return Err(Error::IndexOutOfBounds {
                parent: parent.clone(),
                index,
                len: self.items.len(),
            });
        }
        Ok(self.items.remove(index))
    }

    fn insert_node(
        &mut self,
        parent: &NodeId,
        index: usize,
        content: Placement<String, String>,
    ) -> Result<(), Error> {
        Self::check(parent)?;
        if index > self.items.len() {
            return Err(Error::IndexOutOfBounds {
                parent: parent.clone(),
                index,
                len: self.items.len(),
            });
        }
        let (Placement::Node(item) | Placement::Markup(item)) = content;
        self.items.insert(index, item);
        Ok(())
    }

    fn mount(&mut self, _target: &str, _markup: String) -> Result<(), Error> {
        Ok(())
    }

    fn clear(&mut self, _target: &str) -> Result<(), Error> {
        self.items.clear();
        Ok(())
    }
}

/// Engine over a [`RecordingRenderer`] with a single mount target.
pub struct Harness {
    pub engine: Engine<RecordingRenderer>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            engine: Engine::new(RecordingRenderer::default()),
        }
    }

    pub fn with_builder(builder: EngineBuilder) -> Self {
        Self {
            engine: builder.build(RecordingRenderer::default()),
        }
    }

    pub fn render(&mut self, root: impl Into<Descriptor>) -> Result<NodeId, Error> {
        self.engine.render(root, TARGET)
    }

    pub fn update_root(&mut self, root: Descriptor) -> Result<(), Error> {
        self.engine.update(root, TARGET)
    }

    pub const fn renderer(&self) -> &RecordingRenderer {
        self.engine.renderer()
    }

    pub const fn renderer_mut(&mut self) -> &mut RecordingRenderer {
        self.engine.renderer_mut()
    }
}

/// Mounts `before` as the children of root `0`, reconciles them against `after` and
/// returns the queued operations without applying them.
pub fn diff(before: &[Descriptor], after: &[Descriptor]) -> Vec<DiffOp<String>> {
    let mut renderer = RecordingRenderer::default();
    let mut registry = Registry::default();
    let updates: Rc<UpdateQueue> = Rc::default();
    let parent = NodeId::root(0);
    let mut ctx = Reconciler::new(&mut renderer, &mut registry, Rc::downgrade(&updates));

    let mut children = Vec::new();
    for (index, descriptor) in before.iter().enumerate() {
        let mut instance = instantiate(descriptor).expect("resolve");
        instance
            .mount(descriptor, child_id(&parent, descriptor, index), &mut ctx)
            .expect("mount");
        children.push(MountedChild { instance, index });
    }
    reconcile_children(&parent, children, after, &mut ctx).expect("reconcile");
    ctx.pending().to_vec()
}

thread_local! {
    static RENDERS: Cell<usize> = const { Cell::new(0) };
    static HOOKS: RefCell<Vec<&'static str>> = const { RefCell::new(Vec::new()) };
}

fn renders() -> usize {
    RENDERS.with(Cell::get)
}

fn hooks() -> Vec<&'static str> {
    HOOKS.with(|hooks| hooks.borrow().clone())
}

fn reset() {
    RENDERS.with(|renders| renders.set(0));
    HOOKS.with(|hooks| hooks.borrow_mut().clear());
}

fn log(hook: &'static str) {
    HOOKS.with(|hooks| hooks.borrow_mut().push(hook));
}

fn count_of(state: &State) -> i64 {
    state.get("count").and_then(Value::as_int).unwrap_or(0)
}

/// Counter whose button increments its state.
struct Counter;

impl Component for Counter {
    fn create(_props: &Props) -> Self {
        Self
    }

    fn initial_state(&self, props: &Props) -> State {
        State::new().with("count", props.get("start").and_then(Value::as_int).unwrap_or(0))
    }

    fn lifecycle() -> Lifecycle<Self> {
        Lifecycle::new()
            .render(Self::render)
            .before_mount(|_, _| log("before_mount"))
            .after_mount(|_, _| log("after_mount"))
            .before_update(|_, _, _, _| log("before_update"))
            .after_update(|_, _, _, _| log("after_update"))
    }
}

impl Counter {
    fn render(&self, scope: &Scope<'_>) -> Descriptor {
        RENDERS.with(|renders| renders.set(renders.get() + 1));
        let count = count_of(scope.state());
        let onclick = scope.handler(move |updater, _| {
            updater.update_state(|state| State::new().with("count", count_of(state) + 1));
        });
        element("button")
            .prop("onclick", onclick)
            .child(text(count))
            .into()
    }
}

/// Never re-renders after mount.
struct Frozen;

impl Component for Frozen {
    fn create(_props: &Props) -> Self {
        Self
    }

    fn lifecycle() -> Lifecycle<Self> {
        Lifecycle::new()
            .render(|_, scope| {
                RENDERS.with(|renders| renders.set(renders.get() + 1));
                element("p").child(text(count_of(scope.state()))).into()
            })
            .before_update(|_, _, _, _| log("before_update"))
            .after_update(|_, _, _, _| log("after_update"))
            .should_update(|_, _, _, _| false)
    }
}

/// Renders its `tag` state as the root element.
struct Shape;

impl Component for Shape {
    fn create(_props: &Props) -> Self {
        Self
    }

    fn initial_state(&self, _props: &Props) -> State {
        State::new().with("tag", "div")
    }

    fn lifecycle() -> Lifecycle<Self> {
        Lifecycle::new()
            .render(|_, scope| {
                let tag = scope.state().get("tag").and_then(Value::as_str).unwrap_or("div");
                element(tag).child(text("body")).into()
            })
            .after_update(|_, _, _, _| log("after_update"))
    }
}

/// Wraps a counter in a `div` keyed by its `key` state.
struct Keyed;

impl Component for Keyed {
    fn create(_props: &Props) -> Self {
        Self
    }

    fn initial_state(&self, _props: &Props) -> State {
        State::new().with("key", "x")
    }

    fn lifecycle() -> Lifecycle<Self> {
        Lifecycle::new()
            .render(|_, scope| {
                let key = scope.state().get("key").and_then(Value::as_str).unwrap_or("x");
                element("div").key(key).child(component::<Counter>()).into()
            })
            .after_update(|_, _, _, _| log("after_update"))
    }
}

/// Has no render capability.
struct Blank;

impl Component for Blank {
    fn create(_props: &Props) -> Self {
        Self
    }

    fn lifecycle() -> Lifecycle<Self> {
        Lifecycle::new()
    }
}

/// Requests another update every time it updates.
struct Restless;

impl Component for Restless {
    fn create(_props: &Props) -> Self {
        Self
    }

    fn lifecycle() -> Lifecycle<Self> {
        Lifecycle::new()
            .render(|_, scope| text(count_of(scope.state())))
            .after_update(|_, scope, _, _| {
                scope
                    .updater()
                    .update_state(|state| State::new().with("count", count_of(state) + 1));
            })
    }
}

/// Loads its content right after mount.
struct Loader;

impl Component for Loader {
    fn create(_props: &Props) -> Self {
        Self
    }

    fn lifecycle() -> Lifecycle<Self> {
        Lifecycle::new()
            .render(|_, scope| {
                let loaded = scope.state().get("loaded").and_then(Value::as_bool).unwrap_or(false);
                element("p")
                    .child(text(if loaded { "ready" } else { "loading" }))
                    .into()
            })
            .after_mount(|_, scope| scope.set_state(State::new().with("loaded", true)))
    }
}

#[test]
fn mount_assigns_path_ids() {
    let mut harness = Harness::new();
    let root = element("div").child(element("span").child(text("a")));
    let id = harness.render(root).expect("mount");

    assert_eq!(id.to_string(), "0");
    assert_eq!(
        harness.renderer().markup(),
        r#"<div data-id="0"><span data-id="0.0"><span data-id="0.0.0">a</span></span></div>"#
    );
}

#[test]
fn roots_take_consecutive_indices() {
    let mut harness = Harness::with_builder(EngineBuilder::new().with_root_index(5));
    assert_eq!(harness.render(text("a")).expect("first").to_string(), "5");
    assert_eq!(harness.render(text("b")).expect("second").to_string(), "6");
    assert_eq!(harness.renderer().markup(), r#"<span data-id="6">b</span>"#);
}

#[test]
fn rerender_unmounts_previous_root() {
    let mut harness = Harness::new();
    harness.render(component::<Counter>()).expect("first");
    let first = harness.engine.components_of::<Counter>();
    assert_eq!(first.len(), 1);

    harness.render(component::<Counter>()).expect("second");
    let second = harness.engine.components_of::<Counter>();
    assert_eq!(second.len(), 1);
    assert_ne!(first, second);
    assert!(harness.engine.state_of(first[0]).is_none());
    assert_eq!(harness.renderer().bound(), ["1:click"]);
}

#[test]
fn hooks_run_in_lifecycle_order() {
    reset();
    let mut harness = Harness::new();
    harness.render(component::<Counter>()).expect("mount");
    assert_eq!(hooks(), ["before_mount", "after_mount"]);

    let id = harness.engine.components_of::<Counter>()[0];
    harness
        .engine
        .request_update(id, State::new().with("count", 3))
        .expect("update");
    assert_eq!(hooks(), ["before_mount", "after_mount", "before_update", "after_update"]);
    assert_eq!(
        harness.renderer().calls.last(),
        Some(&Call::ReplaceText("0.0".into(), "3".into()))
    );
}

#[test]
fn dispatch_routes_events_to_handlers() {
    let mut harness = Harness::new();
    let root = harness
        .render(component::<Counter>().prop("start", 41))
        .expect("mount");
    let id = harness.engine.components_of::<Counter>()[0];

    assert!(harness.engine.dispatch(&Event::new("click", root.clone())).expect("dispatch"));
    assert_eq!(count_of(&harness.engine.state_of(id).expect("state")), 42);
    assert!(!harness.engine.dispatch(&Event::new("keyup", root)).expect("dispatch"));
}

#[test]
fn gate_commits_state_without_rendering() {
    let mut harness = Harness::new();
    harness.render(component::<Frozen>()).expect("mount");
    let id = harness.engine.components_of::<Frozen>()[0];
    reset();
    harness.renderer_mut().calls.clear();

    harness
        .engine
        .request_update(id, State::new().with("count", 1))
        .expect("update");

    assert_eq!(count_of(&harness.engine.state_of(id).expect("state")), 1);
    assert_eq!(renders(), 0);
    assert!(hooks().is_empty());
    assert!(harness.renderer().calls.is_empty());
}

#[test]
fn changed_root_type_replaces_the_subtree() {
    let mut harness = Harness::new();
    harness.render(component::<Shape>()).expect("mount");
    let id = harness.engine.components_of::<Shape>()[0];
    reset();
    harness.renderer_mut().calls.clear();

    harness
        .engine
        .request_update(id, State::new().with("tag", "span"))
        .expect("update");

    assert_eq!(
        harness.renderer().calls,
        [Call::ReplaceNode(
            "0".into(),
            r#"<span data-id="0"><span data-id="0.0">body</span></span>"#.into()
        )]
    );
    assert!(hooks().is_empty());

    harness
        .engine
        .request_update(id, State::new().with("tag", "span"))
        .expect("update");
    assert_eq!(hooks(), ["after_update"]);
}

#[test]
fn changed_root_key_replaces_the_subtree() {
    let mut harness = Harness::new();
    harness.render(component::<Keyed>()).expect("mount");
    let outer = harness.engine.components_of::<Keyed>()[0];
    let inner = harness.engine.components_of::<Counter>()[0];
    harness
        .engine
        .request_update(inner, State::new().with("count", 5))
        .expect("bump");
    reset();
    harness.renderer_mut().calls.clear();

    harness
        .engine
        .request_update(outer, State::new().with("key", "y"))
        .expect("rekey");

    let renderer = harness.renderer();
    assert_eq!(renderer.count(|call| matches!(call, Call::ReplaceNode(..))), 1);
    assert_eq!(
        renderer.count(|call| matches!(call, Call::Insert(..) | Call::Delete(..))),
        0
    );
    assert!(renderer.calls.contains(&Call::ReplaceNode(
        "0".into(),
        r#"<div data-id="0"><button data-id="0.0"><span data-id="0.0.0">0</span></button></div>"#
            .into()
    )));
    // The fresh counter mounts; neither component reports an update.
    assert_eq!(hooks(), ["before_mount", "after_mount"]);

    let counters = harness.engine.components_of::<Counter>();
    assert_eq!(counters.len(), 1);
    assert_ne!(counters[0], inner);
    assert!(harness.engine.state_of(inner).is_none());
    assert_eq!(count_of(&harness.engine.state_of(counters[0]).expect("state")), 0);

    let rendered_key = match harness.engine.root(TARGET) {
        Some(Instance::Composite(composite)) => {
            composite.borrow().rendered().and_then(Instance::key)
        }
        _ => None,
    };
    assert_eq!(rendered_key.as_deref(), Some("y"));
}

#[test]
fn missing_render_fails_the_mount() {
    let mut harness = Harness::new();
    let error = harness.render(component::<Blank>()).expect_err("no render");
    assert!(matches!(error, Error::MissingRender { .. }));
    assert!(harness.engine.components_of::<Blank>().is_empty());
}

#[test]
fn text_updates_are_idempotent() {
    let mut harness = Harness::new();
    harness.render(element("p").child(text("a"))).expect("mount");
    for _ in 0..2 {
        harness
            .update_root(element("p").child(text("b")).into())
            .expect("update");
    }
    assert_eq!(
        harness
            .renderer()
            .count(|call| matches!(call, Call::ReplaceText(..))),
        1
    );
}

#[test]
fn removing_a_subtree_unregisters_its_bindings() {
    let handler = || EventHandler::new(|_: &Event| {});
    let row = |key: &str| {
        element("li")
            .key(key)
            .prop("onclick", handler())
            .child(element("button").prop("onmousedown", handler()))
    };
    let mut harness = Harness::new();
    harness
        .render(element("ul").child(row("a")).child(row("b")))
        .expect("mount");
    assert_eq!(
        harness.renderer().bound(),
        ["0.$a:click", "0.$a.0:mousedown", "0.$b:click", "0.$b.0:mousedown"]
    );

    harness
        .update_root(element("ul").child(row("a")).into())
        .expect("update");
    assert_eq!(harness.renderer().bound(), ["0.$a:click", "0.$a.0:mousedown"]);
    assert!(harness
        .renderer()
        .calls
        .contains(&Call::Delete("0".into(), 1)));
}

#[test]
fn keyed_reorder_keeps_component_state() {
    let row = |key: &str| component::<Counter>().key(key);
    let mut harness = Harness::new();
    harness
        .render(element("ul").child(row("a")).child(row("b")))
        .expect("mount");
    let ids = harness.engine.components_of::<Counter>();
    harness
        .engine
        .request_update(ids[1], State::new().with("count", 7))
        .expect("update");

    harness
        .update_root(element("ul").child(row("b")).child(row("a")).into())
        .expect("reorder");

    assert_eq!(harness.engine.components_of::<Counter>(), ids);
    assert_eq!(count_of(&harness.engine.state_of(ids[1]).expect("state")), 7);
    assert_eq!(
        harness
            .renderer()
            .count(|call| matches!(call, Call::Insert(..))),
        2
    );
}

#[test]
fn after_mount_state_changes_apply_after_the_pass() {
    let mut harness = Harness::new();
    harness.render(component::<Loader>()).expect("mount");
    let id = harness.engine.components_of::<Loader>()[0];
    assert_eq!(
        harness.engine.state_of(id).expect("state").get("loaded"),
        Some(&Value::Bool(true))
    );
    assert_eq!(
        harness.renderer().calls.last(),
        Some(&Call::ReplaceText("0.0".into(), "ready".into()))
    );
}

#[test]
fn runaway_updates_hit_the_limit() {
    let mut harness = Harness::with_builder(EngineBuilder::new().with_max_update_rounds(4));
    harness.render(component::<Restless>()).expect("mount");
    let id = harness.engine.components_of::<Restless>()[0];
    let error = harness
        .engine
        .request_update(id, State::new().with("count", 1))
        .expect_err("limit");
    assert_eq!(error, Error::UpdateLimitExceeded(4));
}

#[test]
fn unmount_releases_components() {
    let mut harness = Harness::new();
    harness.render(component::<Counter>()).expect("mount");
    let id = harness.engine.components_of::<Counter>()[0];
    let composite = match harness.engine.root(TARGET) {
        Some(crate::Instance::Composite(composite)) => composite.clone(),
        _ => panic!("expected a composite root"),
    };

    assert!(harness.engine.unmount(TARGET).expect("unmount"));
    assert_eq!(composite.borrow().phase(), Phase::Unmounted);
    assert!(harness.renderer().bound().is_empty());
    assert!(harness.renderer().markup().is_empty());

    harness
        .engine
        .request_update(id, State::new().with("count", 1))
        .expect("stale request is ignored");
    assert!(!harness.engine.unmount(TARGET).expect("nothing left"));
}

#[test]
fn builder_macros_match_the_builders() {
    let built = element("ul")
        .props(State::new().with("class", "todo"))
        .child(element("li").child(text("first")));
    let written = el!("ul" { "class" => "todo" } [el!("li" [text("first")])]);
    assert_eq!(written, built);
    assert_eq!(props! {}, State::new());
    assert_eq!(props! { "a" => 1, "b" => "x" }.len(), 2);
}
