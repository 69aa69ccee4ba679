//! Focus trap
//!
//! Keeps keyboard tab-navigation cycling inside a container. The context is
//! recomputed on every evaluation, so it never goes stale if the container's
//! contents change.

use crate::host::{Document, Host};
use crate::types::NodeId;

/// Whether `node` is keyboard-reachable and enabled
pub fn is_focusable<D: Document + ?Sized>(doc: &D, node: NodeId) -> bool {
    if doc.has_attribute(node, "disabled") {
        return false;
    }
    if let Some(tabindex) = doc.attribute(node, "tabindex") {
        if let Ok(value) = tabindex.trim().parse::<i32>() {
            return value >= 0;
        }
    }
    match doc.tag_name(node).as_str() {
        "a" | "area" => doc.has_attribute(node, "href"),
        "button" | "input" | "select" | "textarea" => true,
        _ => false,
    }
}

/// Focusable descendants of `root`, in document order
pub fn focusable_elements<D: Document + ?Sized>(doc: &D, root: NodeId) -> Vec<NodeId> {
    doc.descendants(root)
        .into_iter()
        .filter(|n| is_focusable(doc, *n))
        .collect()
}

/// First and last focusable elements of a container
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FocusTrapContext {
    pub container: NodeId,
    pub first: Option<NodeId>,
    pub last: Option<NodeId>,
}

impl FocusTrapContext {
    pub fn compute<D: Document + ?Sized>(doc: &D, container: NodeId) -> Self {
        let focusables = focusable_elements(doc, container);
        Self {
            container,
            first: focusables.first().copied(),
            last: focusables.last().copied(),
        }
    }

    /// Handle a Tab press. Returns true when focus was moved and the
    /// default must be prevented.
    pub fn handle_tab<H: Host + ?Sized>(&self, host: &mut H, backward: bool) -> bool {
        let (Some(first), Some(last)) = (self.first, self.last) else {
            return false;
        };
        let active = host.active_element();

        let inside = active.is_some_and(|a| host.contains(self.container, a));
        let target = if !inside {
            Some(if backward { last } else { first })
        } else if backward && active == Some(first) {
            Some(last)
        } else if !backward && active == Some(last) {
            Some(first)
        } else {
            None
        };

        match target {
            Some(node) => {
                tracing::trace!(node, backward, "focus trap wrap");
                host.focus(node);
                true
            }
            None => false,
        }
    }
}
