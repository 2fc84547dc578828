//! The reconciliation context shared by one pass.

use std::{collections::BTreeMap, rc::Rc, rc::Weak, vec::Vec};
use core::cell::RefCell;

use crate::{
    Error,
    component::{ComponentId, UpdateQueue, Updater},
    instance::{CompositeInstance, SharedComposite},
    patch,
    reconcile::DiffOp,
    renderer::Renderer,
};

/// Mounted composites, addressed by [`ComponentId`].
///
/// The registry only holds weak references: the instance tree owns every composite.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    next: u64,
    live: BTreeMap<ComponentId, Weak<RefCell<CompositeInstance>>>,
}

impl Registry {
    pub(crate) fn register(&mut self, composite: Weak<RefCell<CompositeInstance>>) -> ComponentId {
        self.next += 1;
        let id = ComponentId::new(self.next);
        self.live.insert(id, composite);
        id
    }

    pub(crate) fn release(&mut self, id: ComponentId) {
        self.live.remove(&id);
    }

    pub(crate) fn get(&self, id: ComponentId) -> Option<SharedComposite> {
        self.live.get(&id).and_then(Weak::upgrade)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (ComponentId, SharedComposite)> + '_ {
        self.live
            .iter()
            .filter_map(|(id, composite)| composite.upgrade().map(|composite| (*id, composite)))
    }

    pub(crate) fn len(&self) -> usize {
        self.live.len()
    }
}

/// State of one reconciliation pass.
///
/// Created at the outermost `render` or update entry and threaded by reference through
/// every call that can recurse into children reconciliation. The operation queue is
/// flushed exactly once, when the outermost children update returns to depth zero.
pub(crate) struct Reconciler<'a, R: Renderer> {
    renderer: &'a mut R,
    registry: &'a mut Registry,
    updates: Weak<UpdateQueue>,
    queue: Vec<DiffOp<R::Markup>>,
    depth: usize,
    mounted: Vec<SharedComposite>,
}

impl<'a, R: Renderer> Reconciler<'a, R> {
    pub(crate) const fn new(
        renderer: &'a mut R,
        registry: &'a mut Registry,
        updates: Weak<UpdateQueue>,
    ) -> Self {
        Self {
            renderer,
            registry,
            updates,
            queue: Vec::new(),
            depth: 0,
            mounted: Vec::new(),
        }
    }

    pub(crate) fn renderer(&mut self) -> &mut R {
        self.renderer
    }

    pub(crate) fn push(&mut self, op: DiffOp<R::Markup>) {
        self.queue.push(op);
    }

    /// Marks the start of a children update.
    pub(crate) const fn enter(&mut self) {
        self.depth += 1;
    }

    /// Marks the end of a children update, flushing the queue at the outermost level.
    pub(crate) fn leave(&mut self) -> Result<(), Error> {
        self.depth = self.depth.saturating_sub(1);
        if self.depth == 0 {
            self.flush()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Error> {
        if self.queue.is_empty() {
            return Ok(());
        }
        let ops = core::mem::take(&mut self.queue);
        patch::apply(self.renderer, ops)
    }

    pub(crate) fn register(&mut self, composite: &SharedComposite) -> Updater {
        let id = self.registry.register(Rc::downgrade(composite));
        Updater::new(id, self.updates.clone())
    }

    pub(crate) fn release(&mut self, id: ComponentId) {
        self.registry.release(id);
    }

    /// Defers a composite's post-mount hook to the end of the pass.
    pub(crate) fn schedule_after_mount(&mut self, composite: SharedComposite) {
        self.mounted.push(composite);
    }

    #[cfg(test)]
    pub(crate) fn pending(&self) -> &[DiffOp<R::Markup>] {
        &self.queue
    }

    /// Completes the pass: applies anything still queued, then runs post-mount hooks in
    /// mount order.
    pub(crate) fn finish(mut self) -> Result<(), Error> {
        self.depth = 0;
        self.flush()?;
        for composite in core::mem::take(&mut self.mounted) {
            CompositeInstance::run_after_mount(&composite);
        }
        Ok(())
    }
}
