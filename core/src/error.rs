//! Error types produced while mounting and reconciling instance trees.

use std::string::String;

use crate::id::NodeId;

/// Errors raised by the reconciliation engine and its renderers.
///
/// None of these are recoverable: a pass that fails leaves the instance tree in an
/// unspecified state and must not be resumed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The resolver was handed something that is not a text, host element or component.
    #[error("unsupported descriptor: {0}")]
    UnsupportedDescriptor(String),
    /// The component's lifecycle does not provide a render capability.
    #[error("component `{component}` does not define a render operation")]
    MissingRender {
        /// Type name of the offending component.
        component: &'static str,
    },
    /// A patch addressed a parent node that is no longer part of the host tree.
    #[error("parent node `{0}` is not attached to the host tree")]
    InvalidParent(NodeId),
    /// A renderer operation addressed a node that does not exist.
    #[error("node `{0}` is not attached to the host tree")]
    UnknownNode(NodeId),
    /// An instance was asked to update or unmount before it was mounted.
    #[error("{kind} instance used before it was mounted")]
    NotMounted {
        /// Instance kind (`text`, `host`, `composite`).
        kind: &'static str,
    },
    /// The mount target is not known to the renderer.
    #[error("mount target `{0}` does not exist")]
    UnknownTarget(String),
    /// A patch tried to place a node outside its parent's child range.
    #[error("index {index} is out of bounds for parent `{parent}` with {len} children")]
    IndexOutOfBounds {
        /// Parent the operation addressed.
        parent: NodeId,
        /// Requested child index.
        index: usize,
        /// Number of children the parent currently has.
        len: usize,
    },
    /// State updates kept scheduling further updates past the configured bound.
    #[error("state updates did not settle after {0} rounds")]
    UpdateLimitExceeded(usize),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::string::ToString;

    #[test]
    fn missing_render_names_component() {
        let error = Error::MissingRender { component: "Counter" };
        assert_eq!(
            error.to_string(),
            "component `Counter` does not define a render operation"
        );
    }

    #[test]
    fn invalid_parent_displays_path() {
        let error = Error::InvalidParent(NodeId::root(0).child_index(3));
        assert_eq!(
            error.to_string(),
            "parent node `0.3` is not attached to the host tree"
        );
    }
}
