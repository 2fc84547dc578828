//! The descriptor model: immutable values describing what to render.
//!
//! A render pass produces a fresh [`Descriptor`] tree every time. Descriptors carry no
//! behavior; the only question the engine asks of them is whether two descriptors at
//! the same tree position are *update-compatible* (see
//! [`Descriptor::is_update_compatible`]). Compatible descriptors reuse the existing
//! instance, incompatible ones replace it.
//!
//! Three shapes exist:
//!
//! - [`Descriptor::Text`] - a text leaf; numbers become their decimal text
//! - [`Descriptor::Element`] - a host element with a tag, optional key, props and children
//! - [`Descriptor::Composite`] - an invocation of a user [`Component`]
//!
//! ```ignore
//! use rivulet_core::{element, text};
//!
//! let list = element("ul")
//!     .prop("class", "items")
//!     .child(element("li").key("a").child(text("first")))
//!     .child(element("li").key("b").child(text("second")));
//! ```

use std::{
    format,
    rc::Rc,
    string::{String, ToString},
    vec::Vec,
};
use core::fmt;

use indexmap::IndexMap;

use crate::{
    Error,
    component::{Component, ComponentType},
    handler::EventHandler,
};

/// Name of the prop that carries a composite's children.
pub const CHILDREN: &str = "children";

/// Name of the config entry that [`create_element`] lifts into the descriptor key.
pub const KEY: &str = "key";

/// A prop or state value.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    /// Absent value. Never serialized as an attribute.
    #[default]
    Null,
    /// Boolean flag. `false` is treated as absent when serializing attributes.
    Bool(bool),
    /// Integer number.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Text.
    Str(String),
    /// Ordered list of values.
    List(Vec<Value>),
    /// Callback bound through an `on*` prop.
    Handler(EventHandler),
    /// Child descriptors (the `children` prop of a composite). Shared, so cloning props
    /// never copies the subtree.
    Children(Rc<[Descriptor]>),
}

impl Value {
    /// Returns the attribute text for this value, or `None` if it must not be written.
    #[must_use]
    pub fn to_attribute(&self) -> Option<String> {
        match self {
            Self::Null | Self::Bool(false) | Self::Handler(_) | Self::Children(_) => None,
            Self::Bool(true) => Some("true".into()),
            Self::Int(value) => Some(value.to_string()),
            Self::Float(value) => Some(value.to_string()),
            Self::Str(value) => Some(value.clone()),
            Self::List(values) => Some(
                values
                    .iter()
                    .filter_map(Self::to_attribute)
                    .collect::<Vec<_>>()
                    .join(","),
            ),
        }
    }

    /// Returns `true` for [`Value::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the text if this is a string value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the integer if this is an integer value.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the number as a float for integer and float values.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Int(value) => Some(*value as f64),
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the flag if this is a boolean value.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the items if this is a list value.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(values) => Some(values),
            _ => None,
        }
    }

    /// Returns the handler if this is a handler value.
    #[must_use]
    pub const fn as_handler(&self) -> Option<&EventHandler> {
        match self {
            Self::Handler(handler) => Some(handler),
            _ => None,
        }
    }

    /// Returns the descriptors if this is a children value.
    #[must_use]
    pub fn as_children(&self) -> Option<&[Descriptor]> {
        match self {
            Self::Children(children) => Some(&children[..]),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Str(value) => f.write_str(value),
            Self::List(values) => {
                for (position, value) in values.iter().enumerate() {
                    if position > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{value}")?;
                }
                Ok(())
            }
            Self::Handler(_) => f.write_str("[handler]"),
            Self::Children(children) => write!(f, "[{} children]", children.len()),
        }
    }
}

macro_rules! impl_value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Self::$variant(value.into())
                }
            }
        )*
    };
}

impl_value_from!(
    bool => Bool,
    i32 => Int,
    i64 => Int,
    u32 => Int,
    f64 => Float,
    f32 => Float,
    String => Str,
    &str => Str,
    EventHandler => Handler,
    Vec<Descriptor> => Children,
);

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        i64::try_from(value).map_or(Self::Float(value as f64), Self::Int)
    }
}

impl From<Vec<Self>> for Value {
    fn from(value: Vec<Self>) -> Self {
        Self::List(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Insertion-ordered string to [`Value`] map used for props and state.
///
/// Equality ignores entry order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    entries: IndexMap<String, Value>,
}

/// Props passed to an element or component.
pub type Props = Record;

/// Live state of a component.
pub type State = Record;

impl Record {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Builder form of [`Record::insert`].
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Sets an entry, keeping its original position if it already existed.
    ///
    /// Returns the previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(name.into(), value.into())
    }

    /// Returns the value stored under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    /// Removes and returns the value stored under `name`.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.entries.shift_remove(name)
    }

    /// Returns `true` if an entry named `name` exists.
    #[must_use]
    pub fn contains_key(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Iterates over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Iterates over entry names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the record has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Shallow merge: entries in `patch` overwrite, every other entry is retained.
    pub fn merge(&mut self, patch: Self) {
        for (name, value) in patch.entries {
            self.insert(name, value);
        }
    }

    /// Returns a copy of `self` with `patch` merged in.
    #[must_use]
    pub fn merged(&self, patch: Self) -> Self {
        let mut next = self.clone();
        next.merge(patch);
        next
    }

    /// Returns the descriptors stored in the `children` entry, if any.
    #[must_use]
    pub fn children(&self) -> &[Descriptor] {
        self.get(CHILDREN)
            .and_then(Value::as_children)
            .unwrap_or_default()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut record = Self::new();
        for (name, value) in iter {
            record.insert(name, value);
        }
        record
    }
}

/// Immutable description of one node of the tree to render.
#[derive(Debug, Clone, PartialEq)]
pub enum Descriptor {
    /// A text leaf.
    Text(String),
    /// A host element.
    Element(Element),
    /// A user component invocation.
    Composite(CompositeDescriptor),
}

impl Descriptor {
    /// Returns the explicit key, if any. Text never has one.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Text(_) => None,
            Self::Element(element) => element.key_ref(),
            Self::Composite(composite) => composite.key_ref(),
        }
    }

    /// Returns `true` for text descriptors.
    #[must_use]
    pub const fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    /// Decides whether an instance built from `self` may be updated to `next`.
    ///
    /// True when both are text, or when both are the same kind of node with the same tag
    /// (or component type) and the same key. Two absent keys count as the same key.
    #[must_use]
    pub fn is_update_compatible(&self, next: &Self) -> bool {
        self.identity() == next.identity()
    }

    /// The part of the descriptor that [`Descriptor::is_update_compatible`] compares.
    #[must_use]
    pub fn identity(&self) -> Identity<'_> {
        match self {
            Self::Text(_) => Identity::Text,
            Self::Element(element) => element.identity(),
            Self::Composite(composite) => composite.identity(),
        }
    }

    /// Short label used in logs: the text marker, the tag, or the component name.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Text(_) => "#text",
            Self::Element(element) => &element.tag,
            Self::Composite(composite) => composite.component.name(),
        }
    }
}

/// Kind, tag or component type, and key of a descriptor.
///
/// Two descriptors are update-compatible exactly when their identities are equal.
/// Instances report the identity of the descriptor they were last reconciled against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity<'a> {
    /// Any text leaf.
    Text,
    /// A host element.
    Element {
        /// Element tag.
        tag: &'a str,
        /// Explicit key.
        key: Option<&'a str>,
    },
    /// A component invocation.
    Composite {
        /// Component type.
        component: ComponentType,
        /// Explicit key.
        key: Option<&'a str>,
    },
}

impl From<Element> for Descriptor {
    fn from(value: Element) -> Self {
        Self::Element(value)
    }
}

impl From<CompositeDescriptor> for Descriptor {
    fn from(value: CompositeDescriptor) -> Self {
        Self::Composite(value)
    }
}

impl From<String> for Descriptor {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Descriptor {
    fn from(value: &str) -> Self {
        Self::Text(value.into())
    }
}

macro_rules! impl_text_from_number {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Descriptor {
                fn from(value: $ty) -> Self {
                    Self::Text(value.to_string())
                }
            }
        )*
    };
}

impl_text_from_number!(i32, i64, u32, u64, usize, f32, f64);

impl TryFrom<Value> for Descriptor {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Str(text) => Ok(Self::Text(text)),
            Value::Int(number) => Ok(Self::from(number)),
            Value::Float(number) => Ok(Self::from(number)),
            Value::Children(children) if children.len() == 1 => Ok(children[0].clone()),
            other => Err(Error::UnsupportedDescriptor(format!("{other:?}"))),
        }
    }
}

/// A host element descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    tag: String,
    key: Option<String>,
    props: Props,
    children: Vec<Descriptor>,
}

impl Element {
    /// Creates an element with the given tag and no props or children.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            key: None,
            props: Props::new(),
            children: Vec::new(),
        }
    }

    /// Sets the identity key.
    #[must_use]
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Sets one prop.
    #[must_use]
    pub fn prop(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props.insert(name, value);
        self
    }

    /// Replaces all props.
    #[must_use]
    pub fn props(mut self, props: Props) -> Self {
        self.props = props;
        self
    }

    /// Appends one child.
    #[must_use]
    pub fn child(mut self, child: impl Into<Descriptor>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Appends several children.
    #[must_use]
    pub fn children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Descriptor>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    /// Returns the tag.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Returns the explicit key, if any.
    #[must_use]
    pub fn key_ref(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Returns the props.
    #[must_use]
    pub const fn props_ref(&self) -> &Props {
        &self.props
    }

    /// Returns the children.
    #[must_use]
    pub fn children_ref(&self) -> &[Descriptor] {
        &self.children
    }

    /// Identity used for update compatibility.
    #[must_use]
    pub fn identity(&self) -> Identity<'_> {
        Identity::Element {
            tag: &self.tag,
            key: self.key.as_deref(),
        }
    }

    /// Copy of the tag, key and props, leaving the children behind.
    pub(crate) fn without_children(&self) -> Self {
        Self {
            tag: self.tag.clone(),
            key: self.key.clone(),
            props: self.props.clone(),
            children: Vec::new(),
        }
    }
}

/// A component invocation. Children live in the `children` prop.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeDescriptor {
    component: ComponentType,
    key: Option<String>,
    props: Props,
}

impl CompositeDescriptor {
    /// Creates an invocation of the given component type.
    #[must_use]
    pub fn new(component: ComponentType) -> Self {
        Self {
            component,
            key: None,
            props: Props::new(),
        }
    }

    /// Creates an invocation of `C`.
    #[must_use]
    pub fn of<C: Component>() -> Self {
        Self::new(ComponentType::of::<C>())
    }

    /// Sets the identity key.
    #[must_use]
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Sets one prop.
    #[must_use]
    pub fn prop(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props.insert(name, value);
        self
    }

    /// Replaces all props, keeping any children already set.
    #[must_use]
    pub fn props(mut self, props: Props) -> Self {
        let children = self.props.remove(CHILDREN);
        self.props = props;
        if let Some(children) = children {
            self.props.insert(CHILDREN, children);
        }
        self
    }

    /// Folds child descriptors into the `children` prop.
    #[must_use]
    pub fn children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Descriptor>,
    {
        let children: Rc<[Descriptor]> = children.into_iter().map(Into::into).collect();
        self.props.insert(CHILDREN, Value::Children(children));
        self
    }

    /// Returns the component type.
    #[must_use]
    pub const fn component(&self) -> ComponentType {
        self.component
    }

    /// Returns the explicit key, if any.
    #[must_use]
    pub fn key_ref(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Returns the props, including `children`.
    #[must_use]
    pub const fn props_ref(&self) -> &Props {
        &self.props
    }

    /// Identity used for update compatibility.
    #[must_use]
    pub fn identity(&self) -> Identity<'_> {
        Identity::Composite {
            component: self.component,
            key: self.key.as_deref(),
        }
    }
}

/// Creates a text descriptor from a string or number.
#[must_use]
pub fn text(value: impl ToString) -> Descriptor {
    Descriptor::Text(value.to_string())
}

/// Starts a host element descriptor.
#[must_use]
pub fn element(tag: impl Into<String>) -> Element {
    Element::new(tag)
}

/// Starts an invocation of component `C`.
#[must_use]
pub fn component<C: Component>() -> CompositeDescriptor {
    CompositeDescriptor::of::<C>()
}

/// Builds an element from a config record, lifting its `key` entry into the descriptor
/// key. The key is removed from the props either way.
#[must_use]
pub fn create_element<I>(tag: impl Into<String>, mut config: Props, children: I) -> Descriptor
where
    I: IntoIterator,
    I::Item: Into<Descriptor>,
{
    let key = config.remove(KEY).and_then(|key| match key {
        Value::Null => None,
        other => Some(other.to_string()),
    });
    let mut element = Element::new(tag).props(config).children(children);
    element.key = key;
    element.into()
}
