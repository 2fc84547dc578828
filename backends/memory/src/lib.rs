//! In-memory document renderer for Rivulet.
//!
//! [`Document`] implements [`rivulet_core::Renderer`] over a plain tree of [`HostNode`]s.
//! It is the backend used by tests and by tools that want HTML or a JSON snapshot of a
//! rendered tree without a real host.
//!
//! ```ignore
//! let mut engine = Engine::new(Document::new());
//! engine.render(element("p").child(text("hello")), "root")?;
//! assert_eq!(
//!     engine.renderer().to_html("root").as_deref(),
//!     Some(r#"<p data-rivulet-id="0"><span data-rivulet-id="0.0">hello</span></p>"#),
//! );
//! ```

mod document;
mod node;


pub use document::{DEFAULT_CONTAINER, DEFAULT_ID_ATTRIBUTE, Document, DocumentBuilder};
pub use node::HostNode;
