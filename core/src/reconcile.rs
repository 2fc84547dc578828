//! Keyed reconciliation of a host element's children.
//!
//! Previous children are joined with the next descriptors by key: the explicit key when
//! one is given, otherwise the child's position. A reused child that changed position
//! produces a [`DiffOp::Move`], a replaced or new child a [`DiffOp::Insert`], and any
//! previous child left without a partner a [`DiffOp::Remove`]. The operations are only
//! queued here; [`crate::patch`] decides the order they reach the host tree in.

use std::{
    collections::{BTreeMap, BTreeSet},
    format,
    string::String,
    vec::Vec,
};
use core::fmt;

use crate::{
    Error,
    context::Reconciler,
    descriptor::Descriptor,
    id::NodeId,
    instance::Instance,
    renderer::Renderer,
    resolve::instantiate,
};

/// A structural change to one parent's child list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffOp<M> {
    /// Relocates an existing child.
    Move {
        /// Parent whose children are reordered.
        parent: NodeId,
        /// Index the child was mounted at.
        from: usize,
        /// Index the child ends up at.
        to: usize,
    },
    /// Deletes an existing child.
    Remove {
        /// Parent losing the child.
        parent: NodeId,
        /// Index the child was mounted at.
        from: usize,
    },
    /// Places freshly mounted markup.
    Insert {
        /// Parent receiving the child.
        parent: NodeId,
        /// Index the child ends up at.
        to: usize,
        /// Markup of the new subtree.
        markup: M,
    },
}

impl<M> DiffOp<M> {
    /// The parent the operation applies to.
    #[must_use]
    pub const fn parent(&self) -> &NodeId {
        match self {
            Self::Move { parent, .. } | Self::Remove { parent, .. } | Self::Insert { parent, .. } => {
                parent
            }
        }
    }
}

/// Key joining a previous child with a next descriptor.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum JoinKey {
    /// Key given on the descriptor.
    Explicit(String),
    /// Position of an unkeyed child.
    Position(usize),
}

impl JoinKey {
    /// Join key of the descriptor at `index`.
    #[must_use]
    pub fn of(descriptor: &Descriptor, index: usize) -> Self {
        descriptor
            .key()
            .map_or(Self::Position(index), |key| Self::Explicit(key.into()))
    }
}

impl fmt::Display for JoinKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit(key) => write!(f, "${key}"),
            Self::Position(index) => write_base36(f, *index),
        }
    }
}

fn write_base36(f: &mut fmt::Formatter<'_>, mut value: usize) -> fmt::Result {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut buf = [0u8; 16];
    let mut pos = buf.len();
    loop {
        pos -= 1;
        buf[pos] = DIGITS[value % 36];
        value /= 36;
        if value == 0 {
            break;
        }
    }
    f.write_str(core::str::from_utf8(&buf[pos..]).map_err(|_| fmt::Error)?)
}

/// A mounted child together with the index it currently occupies in the host tree.
#[derive(Debug)]
pub(crate) struct MountedChild {
    pub(crate) instance: Instance,
    pub(crate) index: usize,
}

impl MountedChild {
    fn join_key(&self) -> JoinKey {
        self.instance
            .key()
            .map_or(JoinKey::Position(self.index), JoinKey::Explicit)
    }
}

/// Node id of the child `descriptor` mounted at `index` under `parent`.
///
/// Keyed children are addressed by key so that their ids survive reordering.
pub(crate) fn child_id(parent: &NodeId, descriptor: &Descriptor, index: usize) -> NodeId {
    descriptor
        .key()
        .map_or_else(|| parent.child_index(index), |key| parent.child_key(key))
}

/// Fails with [`Error::UnsupportedDescriptor`] if two siblings share an explicit key.
///
/// Keyed children are addressed by key, so a repeated key would give two host nodes
/// the same id.
pub(crate) fn ensure_unique_keys(parent: &NodeId, children: &[Descriptor]) -> Result<(), Error> {
    let mut seen = BTreeSet::new();
    for key in children.iter().filter_map(Descriptor::key) {
        if !seen.insert(key) {
            tracing::warn!(parent = %parent, key, "duplicate child key");
            return Err(Error::UnsupportedDescriptor(format!(
                "duplicate key `{key}` among the children of `{parent}`"
            )));
        }
    }
    Ok(())
}

/// Reconciles `previous` against `next`, queueing structural operations on `ctx`.
///
/// Returns the new child list in `next` order. Nothing is queued if `next` repeats a
/// key.
pub(crate) fn reconcile_children<R: Renderer>(
    parent: &NodeId,
    previous: Vec<MountedChild>,
    next: &[Descriptor],
    ctx: &mut Reconciler<'_, R>,
) -> Result<Vec<MountedChild>, Error> {
    ensure_unique_keys(parent, next)?;
    // Mounted siblings always have distinct join keys.
    let mut pending: BTreeMap<JoinKey, MountedChild> = previous
        .into_iter()
        .map(|child| (child.join_key(), child))
        .collect();

    let mut children = Vec::with_capacity(next.len());
    for (index, descriptor) in next.iter().enumerate() {
        let key = JoinKey::of(descriptor, index);
        match pending.remove(&key) {
            Some(mut child) if child.instance.accepts(descriptor) => {
                child.instance.update(descriptor, ctx)?;
                if child.index != index {
                    tracing::trace!(parent = %parent, key = %key, from = child.index, to = index, "move");
                    ctx.push(DiffOp::Move {
                        parent: parent.clone(),
                        from: child.index,
                        to: index,
                    });
                    child.index = index;
                }
                children.push(child);
            }
            stale => {
                if let Some(mut stale) = stale {
                    ctx.push(DiffOp::Remove {
                        parent: parent.clone(),
                        from: stale.index,
                    });
                    stale.instance.unmount(ctx);
                }
                let mut instance = instantiate(descriptor)?;
                let markup = instance.mount(descriptor, child_id(parent, descriptor, index), ctx)?;
                ctx.push(DiffOp::Insert {
                    parent: parent.clone(),
                    to: index,
                    markup,
                });
                children.push(MountedChild { instance, index });
            }
        }
    }

    let mut orphans: Vec<MountedChild> = pending.into_values().collect();
    orphans.sort_by_key(|child| child.index);
    for mut orphan in orphans {
        ctx.push(DiffOp::Remove {
            parent: parent.clone(),
            from: orphan.index,
        });
        orphan.instance.unmount(ctx);
    }
    Ok(children)
}

#[cfg(test)]
mod tests {
    use std::{format, string::ToString, vec};

    use super::*;
    use crate::{
        descriptor::{element, text},
        tests::diff,
    };

    fn keyed(keys: &[&str]) -> Vec<Descriptor> {
        keys.iter()
            .map(|key| element("li").key(*key).child(text(*key)).into())
            .collect()
    }

    fn summarize(ops: &[DiffOp<String>]) -> Vec<String> {
        ops.iter()
            .map(|op| match op {
                DiffOp::Move { from, to, .. } => format!("move {from}->{to}"),
                DiffOp::Remove { from, .. } => format!("remove {from}"),
                DiffOp::Insert { to, .. } => format!("insert {to}"),
            })
            .collect()
    }

    #[test]
    fn join_keys_display_base36() {
        assert_eq!(JoinKey::Position(0).to_string(), "0");
        assert_eq!(JoinKey::Position(35).to_string(), "z");
        assert_eq!(JoinKey::Position(36).to_string(), "10");
        assert_eq!(JoinKey::Explicit("a".into()).to_string(), "$a");
    }

    #[test]
    fn keyed_children_get_key_segments() {
        let parent = NodeId::root(0);
        let child: Descriptor = element("li").key("x").into();
        assert_eq!(child_id(&parent, &child, 4).to_string(), "0.$x");
        assert_eq!(child_id(&parent, &text("t"), 4).to_string(), "0.4");
    }

    #[test]
    fn repeated_keys_are_rejected() {
        let parent = NodeId::root(0);
        assert!(ensure_unique_keys(&parent, &keyed(&["a", "b"])).is_ok());
        assert!(ensure_unique_keys(&parent, &[text("a"), text("a")]).is_ok());
        let err = ensure_unique_keys(&parent, &keyed(&["a", "b", "a"])).unwrap_err();
        assert_eq!(
            err,
            Error::UnsupportedDescriptor("duplicate key `a` among the children of `0`".into())
        );
    }

    #[test]
    fn rotation_moves_every_child() {
        let ops = diff(&keyed(&["a", "b", "c"]), &keyed(&["c", "a", "b"]));
        assert_eq!(summarize(&ops), ["move 2->0", "move 0->1", "move 1->2"]);
    }

    #[test]
    fn insertion_in_the_middle() {
        let ops = diff(&keyed(&["a", "b"]), &keyed(&["a", "c", "b"]));
        assert_eq!(summarize(&ops), ["insert 1", "move 1->2"]);
    }

    #[test]
    fn append_emits_a_single_insert() {
        let ops = diff(&keyed(&["a", "b"]), &keyed(&["a", "b", "c"]));
        assert_eq!(summarize(&ops), ["insert 2"]);
    }

    #[test]
    fn removals_follow_placements() {
        let ops = diff(&keyed(&["a", "b", "c", "d"]), &keyed(&["d", "b"]));
        assert_eq!(summarize(&ops), ["move 3->0", "remove 0", "remove 2"]);
    }

    #[test]
    fn incompatible_child_is_replaced_in_place() {
        let before = vec![text("a"), element("p").into()];
        let after = vec![text("b"), element("div").into()];
        let ops = diff(&before, &after);
        assert_eq!(summarize(&ops), ["remove 1", "insert 1"]);
    }
}
