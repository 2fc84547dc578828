//! The host collaborator the engine renders through.

use std::{string::String, vec::Vec};

use crate::{Error, handler::EventHandler, id::NodeId};

/// Content placed into the host tree by the patch executor.
#[derive(Debug)]
pub enum Placement<N, M> {
    /// A node captured from the tree earlier in the same patch.
    Node(N),
    /// Freshly serialized markup.
    Markup(M),
}

/// Host tree operations the engine depends on.
///
/// `Markup` is what mounting an instance produces (a markup string, a detached node
/// tree, ...). `Node` is what the host hands back when a node is deleted so that it can
/// be reinserted elsewhere.
///
/// Every method that addresses a node by id must fail with [`Error::UnknownNode`] (or
/// [`Error::InvalidParent`] for parent-addressed operations) when the id is not attached.
pub trait Renderer {
    /// Serialized form of a subtree.
    type Markup;
    /// Detached host node captured by [`Renderer::delete_node`].
    type Node;

    /// Serializes a text leaf tagged with `id`.
    fn serialize_leaf(&mut self, id: &NodeId, text: &str) -> Self::Markup;

    /// Serializes an element tagged with `id` around its already serialized children.
    fn serialize_element(
        &mut self,
        id: &NodeId,
        tag: &str,
        attributes: Vec<(String, String)>,
        children: Vec<Self::Markup>,
    ) -> Self::Markup;

    /// Binds `handler` to `event` on the node `id`, replacing any existing binding.
    fn register_binding(&mut self, id: &NodeId, event: &str, handler: EventHandler);

    /// Drops the binding of `event` on the node `id`, if there is one.
    fn unregister_binding(&mut self, id: &NodeId, event: &str);

    /// Returns the handler bound to `event` on the node `id`.
    fn binding(&self, id: &NodeId, event: &str) -> Option<EventHandler>;

    /// Writes an attribute on a mounted element.
    ///
    /// # Errors
    ///
    /// Fails if `id` does not address a mounted element.
    fn apply_attribute(&mut self, id: &NodeId, name: &str, value: &str) -> Result<(), Error>;

    /// Removes an attribute from a mounted element.
    ///
    /// # Errors
    ///
    /// Fails if `id` does not address a mounted element.
    fn remove_attribute(&mut self, id: &NodeId, name: &str) -> Result<(), Error>;

    /// Replaces the content of a mounted text leaf.
    ///
    /// # Errors
    ///
    /// Fails if `id` does not address a mounted text leaf.
    fn replace_text(&mut self, id: &NodeId, text: &str) -> Result<(), Error>;

    /// Replaces the node `id` and its whole subtree with `markup`.
    ///
    /// # Errors
    ///
    /// Fails if `id` does not address a mounted node.
    fn replace_node(&mut self, id: &NodeId, markup: Self::Markup) -> Result<(), Error>;

    /// Detaches the child at `index` of `parent` and returns it.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::InvalidParent`] if `parent` is not mounted, or
    /// [`Error::IndexOutOfBounds`] if it has no child at `index`.
    fn delete_node(&mut self, parent: &NodeId, index: usize) -> Result<Self::Node, Error>;

    /// Inserts content before the child currently at `index` of `parent`, or appends it
    /// when `index` equals the number of children.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::InvalidParent`] if `parent` is not mounted, or
    /// [`Error::IndexOutOfBounds`] if `index` is past the end.
    fn insert_node(
        &mut self,
        parent: &NodeId,
        index: usize,
        content: Placement<Self::Node, Self::Markup>,
    ) -> Result<(), Error>;

    /// Replaces everything inside the mount target with `markup`.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::UnknownTarget`] if the target does not exist.
    fn mount(&mut self, target: &str, markup: Self::Markup) -> Result<(), Error>;

    /// Removes everything inside the mount target.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::UnknownTarget`] if the target does not exist.
    fn clear(&mut self, target: &str) -> Result<(), Error>;
}
