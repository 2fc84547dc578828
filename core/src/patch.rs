//! Applies queued structural operations to the host tree.
//!
//! Operations are applied in two phases. The first detaches every node that is removed
//! or moved; the second places inserted markup and moved nodes at their final indices.
//!
//! Within one parent, detaching runs from the highest source index down so that the
//! indices still to be read are unaffected, and placing runs from the lowest target index
//! up so that every node ahead of a target index is already where it belongs. Across
//! parents, detaching handles deeper parents first (a parent being moved is still
//! attached while its own children are detached) and placing handles shallower parents
//! first (a moved parent is back in the tree before its children are placed).

use std::vec::Vec;
use core::cmp::Reverse;

use crate::{
    Error,
    reconcile::DiffOp,
    renderer::{Placement, Renderer},
};

/// Applies `ops` to `renderer`.
///
/// # Errors
///
/// Propagates the first renderer failure, typically [`Error::InvalidParent`].
pub(crate) fn apply<R: Renderer>(renderer: &mut R, ops: Vec<DiffOp<R::Markup>>) -> Result<(), Error> {
    let _span = tracing::debug_span!("patch", ops = ops.len()).entered();

    let mut detach: Vec<usize> = ops
        .iter()
        .enumerate()
        .filter(|(_, op)| matches!(op, DiffOp::Move { .. } | DiffOp::Remove { .. }))
        .map(|(position, _)| position)
        .collect();
    detach.sort_by(|&a, &b| {
        let (a, b) = (&ops[a], &ops[b]);
        Reverse(a.parent().depth())
            .cmp(&Reverse(b.parent().depth()))
            .then_with(|| a.parent().cmp(b.parent()))
            .then_with(|| Reverse(source(a)).cmp(&Reverse(source(b))))
    });

    let mut captured: Vec<Option<R::Node>> = ops.iter().map(|_| None).collect();
    for &position in &detach {
        let op = &ops[position];
        let node = renderer.delete_node(op.parent(), source(op))?;
        if matches!(op, DiffOp::Move { .. }) {
            captured[position] = Some(node);
        }
    }

    let mut place: Vec<usize> = ops
        .iter()
        .enumerate()
        .filter(|(_, op)| !matches!(op, DiffOp::Remove { .. }))
        .map(|(position, _)| position)
        .collect();
    place.sort_by(|&a, &b| {
        let (a, b) = (&ops[a], &ops[b]);
        a.parent()
            .depth()
            .cmp(&b.parent().depth())
            .then_with(|| a.parent().cmp(b.parent()))
            .then_with(|| target(a).cmp(&target(b)))
    });

    let mut slots: Vec<Option<DiffOp<R::Markup>>> = ops.into_iter().map(Some).collect();
    for position in place {
        let Some(op) = slots[position].take() else {
            continue;
        };
        match op {
            DiffOp::Insert { parent, to, markup } => {
                renderer.insert_node(&parent, to, Placement::Markup(markup))?;
            }
            DiffOp::Move { parent, to, .. } => {
                if let Some(node) = captured[position].take() {
                    renderer.insert_node(&parent, to, Placement::Node(node))?;
                }
            }
            DiffOp::Remove { .. } => {}
        }
    }
    tracing::trace!(detached = detach.len(), "patch applied");
    Ok(())
}

const fn source<M>(op: &DiffOp<M>) -> usize {
    match op {
        DiffOp::Move { from, .. } | DiffOp::Remove { from, .. } => *from,
        DiffOp::Insert { to, .. } => *to,
    }
}

const fn target<M>(op: &DiffOp<M>) -> usize {
    match op {
        DiffOp::Move { to, .. } | DiffOp::Insert { to, .. } => *to,
        DiffOp::Remove { from, .. } => *from,
    }
}
