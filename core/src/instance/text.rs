use std::string::String;

use crate::{Error, context::Reconciler, id::NodeId, renderer::Renderer};

/// Leaf instance holding the current text of a text descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextInstance {
    text: String,
    node_id: Option<NodeId>,
}

impl TextInstance {
    pub(crate) const fn new(text: String) -> Self {
        Self {
            text,
            node_id: None,
        }
    }

    /// Current text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Node id assigned at mount.
    #[must_use]
    pub const fn node_id(&self) -> Option<&NodeId> {
        self.node_id.as_ref()
    }

    pub(crate) fn mount<R: Renderer>(&mut self, id: NodeId, ctx: &mut Reconciler<'_, R>) -> R::Markup {
        let markup = ctx.renderer().serialize_leaf(&id, &self.text);
        self.node_id = Some(id);
        markup
    }

    /// Replaces the host text in place when it changed. Never queues diff operations.
    pub(crate) fn update<R: Renderer>(
        &mut self,
        next: &str,
        ctx: &mut Reconciler<'_, R>,
    ) -> Result<(), Error> {
        if self.text == next {
            return Ok(());
        }
        let id = self.node_id.as_ref().ok_or(Error::NotMounted { kind: "text" })?;
        ctx.renderer().replace_text(id, next)?;
        tracing::trace!(node = %id, "text replaced");
        self.text = next.into();
        Ok(())
    }
}
