//! # Instance resolution
//!
//! [`instantiate`] maps a descriptor to the instance variant that will own its lifecycle:
//!
//! ```text
//! Descriptor::Text       ──> Instance::Text       (TextInstance)
//! Descriptor::Element    ──> Instance::Host       (HostInstance)
//! Descriptor::Composite  ──> Instance::Composite  (CompositeInstance)
//! ```
//!
//! Resolution is pure: it allocates an unmounted instance and touches neither the
//! renderer nor any engine state, so it runs both at initial mount and whenever
//! reconciliation decides to replace a subtree.

use std::{format, rc::Rc};
use core::cell::RefCell;

use crate::{
    Error,
    descriptor::Descriptor,
    instance::{CompositeInstance, HostInstance, Instance, TextInstance},
};

/// Creates the unmounted instance for `descriptor`.
///
/// # Errors
///
/// Returns [`Error::UnsupportedDescriptor`] when an element's tag cannot name a host node.
pub fn instantiate(descriptor: &Descriptor) -> Result<Instance, Error> {
    match descriptor {
        Descriptor::Text(text) => Ok(Instance::Text(TextInstance::new(text.clone()))),
        Descriptor::Element(element) => {
            if !is_valid_tag(element.tag()) {
                return Err(Error::UnsupportedDescriptor(format!(
                    "`{}` is not a valid host tag",
                    element.tag()
                )));
            }
            Ok(Instance::Host(HostInstance::new(element)))
        }
        Descriptor::Composite(composite) => Ok(Instance::Composite(Rc::new(RefCell::new(
            CompositeInstance::new(composite.clone()),
        )))),
    }
}

/// Host tags start with an ASCII letter and contain only ASCII alphanumerics and `-`.
fn is_valid_tag(tag: &str) -> bool {
    let mut chars = tag.chars();
    chars.next().is_some_and(|first| first.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-')
}
