//! Hierarchical node addressing.
//!
//! A [`NodeId`] is the path from a root to one position in the rendered tree. It is
//! assigned once, when an instance is mounted, and never recomputed afterwards: a child
//! that moves inside its parent keeps the id it was created with. The host tree uses the
//! same ids to find nodes, so ids double as stable diagnostic keys.

use std::{string::String, vec::Vec};
use core::fmt;

/// One step of a [`NodeId`] path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Segment {
    /// Position of an unkeyed child (or the index of a root).
    Index(usize),
    /// Explicit key of a keyed child.
    Key(String),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "{index}"),
            Self::Key(key) => {
                f.write_str("$")?;
                for c in key.chars() {
                    if matches!(c, '.' | '\\') {
                        f.write_str("\\")?;
                    }
                    write!(f, "{c}")?;
                }
                Ok(())
            }
        }
    }
}

/// Path identifier of a mounted node, displayed as dot-separated segments (`0.1.$row`).
///
/// `.` and `\` inside a key are written with a leading `\`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(Vec<Segment>);

impl NodeId {
    /// Creates the id of the root mounted under the given root index.
    #[must_use]
    pub fn root(index: usize) -> Self {
        Self(std::vec![Segment::Index(index)])
    }

    /// Returns the id of a child below this node.
    #[must_use]
    pub fn child(&self, segment: Segment) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment);
        Self(segments)
    }

    /// Returns the id of the unkeyed child at `index`.
    #[must_use]
    pub fn child_index(&self, index: usize) -> Self {
        self.child(Segment::Index(index))
    }

    /// Returns the id of the keyed child `key`.
    #[must_use]
    pub fn child_key(&self, key: impl Into<String>) -> Self {
        self.child(Segment::Key(key.into()))
    }

    /// Returns the parent id, or `None` for a root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.0.len() > 1 {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        } else {
            None
        }
    }

    /// Number of segments; a root has depth 1.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Returns the path segments.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    /// Returns `true` if `self` is `other` or one of its ancestors.
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        other.0.starts_with(&self.0)
    }

    /// Parses the display form back into an id.
    ///
    /// Returns `None` for an empty string, a segment that is neither a number nor a
    /// `$`-prefixed key, or a dangling `\` escape.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        if text.is_empty() {
            return None;
        }
        let mut segments = Vec::new();
        let mut raw = String::new();
        let mut chars = text.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => raw.push(chars.next()?),
                '.' => segments.push(parse_segment(&std::mem::take(&mut raw))?),
                _ => raw.push(c),
            }
        }
        segments.push(parse_segment(&raw)?);
        Some(Self(segments))
    }
}

fn parse_segment(raw: &str) -> Option<Segment> {
    raw.strip_prefix('$').map_or_else(
        || raw.parse().ok().map(Segment::Index),
        |key| Some(Segment::Key(key.into())),
    )
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, segment) in self.0.iter().enumerate() {
            if position > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for NodeId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
