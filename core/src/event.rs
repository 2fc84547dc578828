//! Host events delivered to bound handlers.

use std::string::String;

use crate::id::NodeId;

/// Returns the event name for an event property, or `None` if `prop` is not one.
///
/// Event properties are named `on` followed by an ASCII letter (`onclick`, `onKeyUp`);
/// the event name is the remainder, lowercased.
#[must_use]
pub fn event_name(prop: &str) -> Option<String> {
    let rest = prop.strip_prefix("on")?;
    if rest.chars().next()?.is_ascii_alphabetic() {
        Some(rest.to_ascii_lowercase())
    } else {
        None
    }
}

/// An interaction reported by the host tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    name: String,
    target: NodeId,
    value: Option<String>,
}

impl Event {
    /// Creates an event of the given type targeting a node.
    #[must_use]
    pub fn new(name: impl Into<String>, target: NodeId) -> Self {
        Self {
            name: name.into(),
            target,
            value: None,
        }
    }

    /// Attaches the current value of the target, as input elements report it.
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Returns the event type (`click`, `keyup`, ...).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the node the event was dispatched to.
    #[must_use]
    pub const fn target(&self) -> &NodeId {
        &self.target
    }

    /// Returns the target's value, if the host reported one.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_event_props() {
        assert_eq!(event_name("onclick").as_deref(), Some("click"));
        assert_eq!(event_name("onKeyUp").as_deref(), Some("keyup"));
        assert_eq!(event_name("on"), None);
        assert_eq!(event_name("on-click"), None);
        assert_eq!(event_name("class"), None);
        assert_eq!(event_name("one"), Some("e".into()));
    }
}
