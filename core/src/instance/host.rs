use std::vec::Vec;

use crate::{
    Error,
    context::Reconciler,
    descriptor::{CHILDREN, Descriptor, Element, Value},
    event::event_name,
    id::NodeId,
    reconcile::{self, MountedChild},
    renderer::Renderer,
    resolve::instantiate,
};

/// Instance of a host element: its tag, props and ordered child instances.
#[derive(Debug)]
pub struct HostInstance {
    /// Tag, key and props; children live in `children` as instances.
    element: Element,
    node_id: Option<NodeId>,
    children: Vec<MountedChild>,
}

impl HostInstance {
    pub(crate) fn new(element: &Element) -> Self {
        Self {
            element: element.without_children(),
            node_id: None,
            children: Vec::new(),
        }
    }

    /// The descriptor this instance was last reconciled against, without its children.
    #[must_use]
    pub const fn element(&self) -> &Element {
        &self.element
    }

    /// Node id assigned at mount.
    #[must_use]
    pub const fn node_id(&self) -> Option<&NodeId> {
        self.node_id.as_ref()
    }

    /// Child instances in host order.
    pub fn children(&self) -> impl Iterator<Item = &crate::Instance> {
        self.children.iter().map(|child| &child.instance)
    }

    pub(crate) fn mount<R: Renderer>(
        &mut self,
        id: NodeId,
        next: &[Descriptor],
        ctx: &mut Reconciler<'_, R>,
    ) -> Result<R::Markup, Error> {
        reconcile::ensure_unique_keys(&id, next)?;
        let mut attributes = Vec::new();
        for (name, value) in self.element.props_ref().iter() {
            if name == CHILDREN {
                continue;
            }
            if let Some(event) = event_name(name) {
                if let Value::Handler(handler) = value {
                    ctx.renderer().register_binding(&id, &event, handler.clone());
                }
                continue;
            }
            if let Some(text) = value.to_attribute() {
                attributes.push((name.into(), text));
            }
        }

        let mut markups = Vec::with_capacity(next.len());
        let mut children = Vec::with_capacity(next.len());
        for (index, child) in next.iter().enumerate() {
            let mut instance = instantiate(child)?;
            markups.push(instance.mount(child, reconcile::child_id(&id, child, index), ctx)?);
            children.push(MountedChild { instance, index });
        }
        self.children = children;

        let markup = ctx
            .renderer()
            .serialize_element(&id, self.element.tag(), attributes, markups);
        self.node_id = Some(id);
        Ok(markup)
    }

    pub(crate) fn update<R: Renderer>(
        &mut self,
        next: &Element,
        ctx: &mut Reconciler<'_, R>,
    ) -> Result<(), Error> {
        let id = self.node_id.clone().ok_or(Error::NotMounted { kind: "host" })?;
        // Rejected before anything reaches the host tree.
        reconcile::ensure_unique_keys(&id, next.children_ref())?;
        self.update_props(&id, next, ctx)?;
        self.element = next.without_children();

        ctx.enter();
        let previous = core::mem::take(&mut self.children);
        self.children = reconcile::reconcile_children(&id, previous, next.children_ref(), ctx)?;
        ctx.leave()
    }

    fn update_props<R: Renderer>(
        &self,
        id: &NodeId,
        next: &Element,
        ctx: &mut Reconciler<'_, R>,
    ) -> Result<(), Error> {
        let previous = self.element.props_ref();
        let next = next.props_ref();

        for (name, _) in previous.iter() {
            if name == CHILDREN || next.contains_key(name) {
                continue;
            }
            if let Some(event) = event_name(name) {
                ctx.renderer().unregister_binding(id, &event);
            } else {
                ctx.renderer().remove_attribute(id, name)?;
            }
        }

        for (name, value) in next.iter() {
            if name == CHILDREN {
                continue;
            }
            if let Some(event) = event_name(name) {
                if previous.contains_key(name) {
                    ctx.renderer().unregister_binding(id, &event);
                }
                if let Value::Handler(handler) = value {
                    ctx.renderer().register_binding(id, &event, handler.clone());
                }
            } else if let Some(text) = value.to_attribute() {
                ctx.renderer().apply_attribute(id, name, &text)?;
            } else {
                ctx.renderer().remove_attribute(id, name)?;
            }
        }
        Ok(())
    }

    pub(crate) fn unmount<R: Renderer>(&mut self, ctx: &mut Reconciler<'_, R>) {
        if let Some(id) = &self.node_id {
            for name in self.element.props_ref().keys() {
                if let Some(event) = event_name(name) {
                    ctx.renderer().unregister_binding(id, &event);
                }
            }
        }
        for child in &mut self.children {
            child.instance.unmount(ctx);
        }
    }
}
