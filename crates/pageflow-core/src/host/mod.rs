//! Host abstraction
//!
//! The controller never touches a browser directly. Everything it reads or
//! writes goes through two traits:
//!
//! - [`Document`]: element queries, attributes, classes, focus
//! - [`Environment`]: viewport geometry, timers, intersection watchers
//!
//! `pageflow-web` implements both over `web-sys`. [`MemoryHost`] implements
//! both in memory with a virtual clock for tests.

mod memory;
mod selector;

pub use memory::{MemoryHost, NodeSnapshot};
pub use selector::Selector;

use crate::types::{NodeId, ObserverOptions, TimerHandle, TimerTask, Watcher};

/// Read/write access to the document tree
///
/// Queries that fail (invalid selector, detached node) return empty results
/// rather than errors.
pub trait Document {
    /// All elements matching `selector`, in document order
    fn query_all(&self, selector: &str) -> Vec<NodeId>;

    /// First element matching `selector`
    fn query(&self, selector: &str) -> Option<NodeId> {
        self.query_all(selector).into_iter().next()
    }

    /// Descendants of `root` matching `selector`, in document order
    fn query_within(&self, root: NodeId, selector: &str) -> Vec<NodeId>;

    /// All descendants of `root`, in document order
    fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        self.query_within(root, "*")
    }

    fn element_by_id(&self, id: &str) -> Option<NodeId>;

    fn body(&self) -> Option<NodeId>;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Whether `node` is `ancestor` or one of its descendants
    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.parent(n);
        }
        false
    }

    /// Nearest inclusive ancestor with the given (lowercase) tag
    fn closest_tag(&self, node: NodeId, tag: &str) -> Option<NodeId> {
        let mut current = Some(node);
        while let Some(n) = current {
            if self.tag_name(n) == tag {
                return Some(n);
            }
            current = self.parent(n);
        }
        None
    }

    /// Lowercase tag name
    fn tag_name(&self, node: NodeId) -> String;

    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;
    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str);
    fn remove_attribute(&mut self, node: NodeId, name: &str);

    fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.attribute(node, name).is_some()
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool;
    fn add_class(&mut self, node: NodeId, class: &str);
    fn remove_class(&mut self, node: NodeId, class: &str);

    /// Inline style property, if set
    fn style(&self, node: NodeId, property: &str) -> Option<String>;
    fn set_style(&mut self, node: NodeId, property: &str, value: &str);

    /// Intrinsic height of an image, 0.0 when unknown or not an image
    fn natural_height(&self, node: NodeId) -> f64;

    fn active_element(&self) -> Option<NodeId>;
    fn focus(&mut self, node: NodeId);
}

/// Viewport, timers and visibility notification
pub trait Environment {
    fn viewport_width(&self) -> f64;

    /// Vertical scroll offset of the document
    fn scroll_y(&self) -> f64;

    /// Rendered height of an element
    fn offset_height(&self, node: NodeId) -> f64;

    /// Top of the element's box relative to the viewport
    fn client_top(&self, node: NodeId) -> f64;

    /// Start an animated scroll to an absolute document offset
    fn smooth_scroll_to(&mut self, top: f64);

    /// Replace the address fragment without navigating
    fn replace_fragment(&mut self, fragment: &str);

    fn supports_touch(&self) -> bool;

    /// Run `task` once after `delay_ms`
    fn set_timeout(&mut self, delay_ms: u32, task: TimerTask) -> TimerHandle;

    /// Run `task` every `period_ms` until cleared
    fn set_interval(&mut self, period_ms: u32, task: TimerTask) -> TimerHandle;

    /// Cancel a timeout or interval. Unknown handles are ignored.
    fn clear_timer(&mut self, handle: TimerHandle);

    /// Whether viewport-intersection notification is available at all
    fn supports_intersection(&self) -> bool;

    /// Register `node` with `watcher`. The first registration for a watcher
    /// fixes its options. Returns false when the capability is missing.
    fn observe(&mut self, watcher: Watcher, node: NodeId, options: &ObserverOptions) -> bool;

    fn unobserve(&mut self, watcher: Watcher, node: NodeId);

    /// Drop every registration of `watcher`
    fn disconnect(&mut self, watcher: Watcher);
}

/// Everything the controller needs from its environment
pub trait Host: Document + Environment {}

impl<T: Document + Environment> Host for T {}
