use std::collections::{BTreeMap, HashMap};

use rivulet_core::{Error, EventHandler, NodeId, Placement, Renderer};

use crate::node::HostNode;

/// Attribute carrying each node's id in the HTML output unless configured otherwise.
pub const DEFAULT_ID_ATTRIBUTE: &str = "data-rivulet-id";

/// Container a [`Document`] provides when no container is configured.
pub const DEFAULT_CONTAINER: &str = "root";

/// Builder for [`Document`].
#[derive(Debug, Clone)]
pub struct DocumentBuilder {
    containers: Vec<String>,
    id_attribute: String,
}

impl Default for DocumentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentBuilder {
    /// Creates a builder with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            containers: Vec::new(),
            id_attribute: DEFAULT_ID_ATTRIBUTE.into(),
        }
    }

    /// Adds a named container that roots can be mounted into.
    #[must_use]
    pub fn with_container(mut self, name: impl Into<String>) -> Self {
        self.containers.push(name.into());
        self
    }

    /// Sets the attribute the HTML output uses for node ids.
    #[must_use]
    pub fn with_id_attribute(mut self, name: impl Into<String>) -> Self {
        self.id_attribute = name.into();
        self
    }

    /// Finalises the builder. Without any configured container the document gets
    /// [`DEFAULT_CONTAINER`].
    #[must_use]
    pub fn build(self) -> Document {
        let mut containers = self.containers;
        if containers.is_empty() {
            containers.push(DEFAULT_CONTAINER.into());
        }
        Document {
            containers: containers.into_iter().map(|name| (name, Vec::new())).collect(),
            bindings: HashMap::new(),
            id_attribute: self.id_attribute,
        }
    }
}

/// An in-memory host tree.
///
/// Holds a set of named containers, each containing the nodes of at most one mounted
/// root, plus the event bindings registered on those nodes.
#[derive(Debug)]
pub struct Document {
    containers: BTreeMap<String, Vec<HostNode>>,
    bindings: HashMap<(NodeId, String), EventHandler>,
    id_attribute: String,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Creates a document with the default container.
    #[must_use]
    pub fn new() -> Self {
        DocumentBuilder::new().build()
    }

    /// Returns a builder for configuring a document.
    #[must_use]
    pub fn builder() -> DocumentBuilder {
        DocumentBuilder::new()
    }

    /// Nodes currently inside `container`.
    #[must_use]
    pub fn container(&self, container: &str) -> Option<&[HostNode]> {
        self.containers.get(container).map(Vec::as_slice)
    }

    /// Serializes `container` as HTML.
    #[must_use]
    pub fn to_html(&self, container: &str) -> Option<String> {
        let nodes = self.containers.get(container)?;
        let mut out = String::new();
        for node in nodes {
            node.write_html(&mut out, &self.id_attribute);
        }
        Some(out)
    }

    /// Finds the node `id` in any container.
    #[must_use]
    pub fn find(&self, id: &NodeId) -> Option<&HostNode> {
        self.containers
            .values()
            .flatten()
            .find_map(|node| node.find(id))
    }

    fn find_mut(&mut self, id: &NodeId) -> Option<&mut HostNode> {
        self.containers
            .values_mut()
            .flatten()
            .find_map(|node| node.find_mut(id))
    }

    fn children_mut(&mut self, parent: &NodeId) -> Result<&mut Vec<HostNode>, Error> {
        match self.find_mut(parent) {
            Some(HostNode::Element { children, .. }) => Ok(children),
            _ => Err(Error::InvalidParent(parent.clone())),
        }
    }

    /// Number of registered event bindings.
    #[must_use]
    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }
}

impl Renderer for Document {
    type Markup = HostNode;
    type Node = HostNode;

    fn serialize_leaf(&mut self, id: &NodeId, text: &str) -> HostNode {
        HostNode::Text {
            id: id.clone(),
            text: text.into(),
        }
    }

    fn serialize_element(
        &mut self,
        id: &NodeId,
        tag: &str,
        attributes: Vec<(String, String)>,
        children: Vec<HostNode>,
    ) -> HostNode {
        HostNode::Element {
            id: id.clone(),
            tag: tag.into(),
            attributes,
            children,
        }
    }

    fn register_binding(&mut self, id: &NodeId, event: &str, handler: EventHandler) {
        tracing::trace!(node = %id, event, "bind");
        self.bindings.insert((id.clone(), event.into()), handler);
    }

    fn unregister_binding(&mut self, id: &NodeId, event: &str) {
        if self.bindings.remove(&(id.clone(), event.into())).is_some() {
            tracing::trace!(node = %id, event, "unbind");
        }
    }

    fn binding(&self, id: &NodeId, event: &str) -> Option<EventHandler> {
        self.bindings.get(&(id.clone(), event.into())).cloned()
    }

    fn apply_attribute(&mut self, id: &NodeId, name: &str, value: &str) -> Result<(), Error> {
        let node = self.find_mut(id).ok_or_else(|| Error::UnknownNode(id.clone()))?;
        if node.set_attribute(name, value) {
            Ok(())
        } else {
            Err(Error::UnknownNode(id.clone()))
        }
    }

    fn remove_attribute(&mut self, id: &NodeId, name: &str) -> Result<(), Error> {
        let node = self.find_mut(id).ok_or_else(|| Error::UnknownNode(id.clone()))?;
        if node.remove_attribute(name) {
            Ok(())
        } else {
            Err(Error::UnknownNode(id.clone()))
        }
    }

    fn replace_text(&mut self, id: &NodeId, text: &str) -> Result<(), Error> {
        match self.find_mut(id) {
            Some(HostNode::Text { text: current, .. }) => {
                text.clone_into(current);
                Ok(())
            }
            _ => Err(Error::UnknownNode(id.clone())),
        }
    }

    fn replace_node(&mut self, id: &NodeId, markup: HostNode) -> Result<(), Error> {
        let node = self.find_mut(id).ok_or_else(|| Error::UnknownNode(id.clone()))?;
        *node = markup;
        Ok(())
    }

    fn delete_node(&mut self, parent: &NodeId, index: usize) -> Result<HostNode, Error> {
        let children = self.children_mut(parent)?;
        if index >= children.len() {
            return Err(Error::IndexOutOfBounds {
                parent: parent.clone(),
                index,
                len: children.len(),
            });
        }
        Ok(children.remove(index))
    }

    fn insert_node(
        &mut self,
        parent: &NodeId,
        index: usize,
        content: Placement<HostNode, HostNode>,
    ) -> Result<(), Error> {
        let children = self.children_mut(parent)?;
        if index > children.len() {
            return Err(Error::IndexOutOfBounds {
                parent: parent.clone(),
                index,
                len: children.len(),
            });
        }
        let (Placement::Node(node) | Placement::Markup(node)) = content;
        children.insert(index, node);
        Ok(())
    }

    fn mount(&mut self, target: &str, markup: HostNode) -> Result<(), Error> {
        let container = self
            .containers
            .get_mut(target)
            .ok_or_else(|| Error::UnknownTarget(target.into()))?;
        container.clear();
        container.push(markup);
        tracing::debug!(container = target, "mounted");
        Ok(())
    }

    fn clear(&mut self, target: &str) -> Result<(), Error> {
        self.containers
            .get_mut(target)
            .ok_or_else(|| Error::UnknownTarget(target.into()))?
            .clear();
        Ok(())
    }
}
