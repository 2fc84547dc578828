//! Host nodes of the in-memory document.

use core::fmt::Write;

use rivulet_core::NodeId;

/// One node of the document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "lowercase"))]
pub enum HostNode {
    /// A text leaf.
    Text {
        /// Id of the instance that produced the leaf.
        id: NodeId,
        /// Text content.
        text: String,
    },
    /// An element.
    Element {
        /// Id of the instance that produced the element.
        id: NodeId,
        /// Tag name.
        tag: String,
        /// Attributes in insertion order.
        attributes: Vec<(String, String)>,
        /// Child nodes in document order.
        children: Vec<HostNode>,
    },
}

impl HostNode {
    /// The node's id.
    #[must_use]
    pub const fn id(&self) -> &NodeId {
        match self {
            Self::Text { id, .. } | Self::Element { id, .. } => id,
        }
    }

    /// The tag name, or `None` for text.
    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        match self {
            Self::Text { .. } => None,
            Self::Element { tag, .. } => Some(tag),
        }
    }

    /// Child nodes; empty for text.
    #[must_use]
    pub fn children(&self) -> &[Self] {
        match self {
            Self::Text { .. } => &[],
            Self::Element { children, .. } => children,
        }
    }

    /// Value of the attribute `name`.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        match self {
            Self::Text { .. } => None,
            Self::Element { attributes, .. } => attributes
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str()),
        }
    }

    /// Concatenated text of the subtree.
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Self::Text { text, .. } => out.push_str(text),
            Self::Element { children, .. } => {
                for child in children {
                    child.collect_text(out);
                }
            }
        }
    }

    /// Depth-first search for the node `id` in this subtree.
    #[must_use]
    pub fn find(&self, id: &NodeId) -> Option<&Self> {
        if self.id() == id {
            return Some(self);
        }
        if !self.id().contains(id) {
            return None;
        }
        self.children().iter().find_map(|child| child.find(id))
    }

    pub(crate) fn find_mut(&mut self, id: &NodeId) -> Option<&mut Self> {
        if self.id() == id {
            return Some(self);
        }
        if !self.id().contains(id) {
            return None;
        }
        match self {
            Self::Text { .. } => None,
            Self::Element { children, .. } => children.iter_mut().find_map(|child| child.find_mut(id)),
        }
    }

    pub(crate) fn set_attribute(&mut self, name: &str, value: &str) -> bool {
        let Self::Element { attributes, .. } = self else {
            return false;
        };
        if let Some(slot) = attributes.iter_mut().find(|(key, _)| key == name) {
            value.clone_into(&mut slot.1);
        } else {
            attributes.push((name.into(), value.into()));
        }
        true
    }

    pub(crate) fn remove_attribute(&mut self, name: &str) -> bool {
        let Self::Element { attributes, .. } = self else {
            return false;
        };
        attributes.retain(|(key, _)| key != name);
        true
    }

    /// Serializes the subtree as HTML, tagging every element with `id_attribute`.
    ///
    /// Text leaves are wrapped in a `span` so that they stay addressable.
    pub fn write_html(&self, out: &mut String, id_attribute: &str) {
        match self {
            Self::Text { id, text } => {
                let _ = write!(out, r#"<span {id_attribute}="{id}">"#);
                escape_into(out, text);
                out.push_str("</span>");
            }
            Self::Element {
                id,
                tag,
                attributes,
                children,
            } => {
                let _ = write!(out, r#"<{tag} {id_attribute}="{id}""#);
                for (name, value) in attributes {
                    let _ = write!(out, r#" {name}=""#);
                    escape_into(out, value);
                    out.push('"');
                }
                out.push('>');
                for child in children {
                    child.write_html(out, id_attribute);
                }
                let _ = write!(out, "</{tag}>");
            }
        }
    }
}

fn escape_into(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> HostNode {
        let root = NodeId::root(0);
        HostNode::Element {
            id: root.clone(),
            tag: "p".into(),
            attributes: vec![("title".into(), "a \"b\"".into())],
            children: vec![HostNode::Text {
                id: root.child_index(0),
                text: "1 < 2 & 3".into(),
            }],
        }
    }

    #[test]
    fn html_is_escaped() {
        let mut out = String::new();
        sample().write_html(&mut out, "data-id");
        assert_eq!(
            out,
            r#"<p data-id="0" title="a &quot;b&quot;"><span data-id="0.0">1 &lt; 2 &amp; 3</span></p>"#
        );
    }

    #[test]
    fn find_walks_the_path() {
        let node = sample();
        let leaf = NodeId::root(0).child_index(0);
        assert_eq!(node.find(&leaf).map(HostNode::text_content).as_deref(), Some("1 < 2 & 3"));
        assert!(node.find(&NodeId::root(1)).is_none());
    }

    #[test]
    fn attributes_keep_their_position() {
        let mut node = sample();
        assert!(node.set_attribute("class", "x"));
        assert!(node.set_attribute("title", "y"));
        assert_eq!(node.attribute("title"), Some("y"));
        assert!(node.remove_attribute("title"));
        assert_eq!(node.attribute("title"), None);
        assert_eq!(node.attribute("class"), Some("x"));
    }
}
