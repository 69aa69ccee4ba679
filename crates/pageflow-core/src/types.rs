//! Core type definitions for the interaction controller
//!
//! This module centralizes type aliases and small value types used
//! throughout the crate for consistency and discoverability.

/// Opaque handle to a document element
///
/// Handles are issued by the host and stay valid for the lifetime of the
/// page. The controller never interprets them beyond equality.
pub type NodeId = u32;

/// Handle returned by the host timer facility
pub type TimerHandle = i32;

/// Keys the controller reacts to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Escape,
    Tab,
    Other,
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` value
    pub fn from_dom(key: &str) -> Self {
        match key {
            "Escape" | "Esc" => Key::Escape,
            "Tab" => Key::Tab,
            _ => Key::Other,
        }
    }
}

/// Identifies one of the intersection watchers owned by the controller
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Watcher {
    /// Scroll-triggered reveal
    Reveal,
    /// Deferred image source swap
    LazyImage,
}

impl Watcher {
    /// All watchers, in teardown order
    pub fn all() -> &'static [Watcher] {
        &[Watcher::Reveal, Watcher::LazyImage]
    }
}

/// Options for an intersection watcher
#[derive(Clone, Debug, PartialEq)]
pub struct ObserverOptions {
    /// Fraction of the element that must be visible
    pub threshold: f64,
    /// CSS margin applied to the root (viewport) box
    pub root_margin: String,
}

impl Default for ObserverOptions {
    fn default() -> Self {
        Self {
            threshold: 0.0,
            root_margin: String::from("0px"),
        }
    }
}

/// Deferred work scheduled through the host timer facility
///
/// Hosts hand the task back via [`crate::PageEvent::Timer`] when it fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerTask {
    /// Entrance of the menu item at `index`, for the open cycle `generation`
    MenuItemEnter { generation: u32, index: usize },
    /// Resize quiet period elapsed
    ResizeSettled { generation: u32 },
    /// Load-stagger settle delay elapsed
    RevealSettle,
    /// Load-stagger reveal of the element at `index`
    RevealStagger { index: usize },
    /// Slider interval tick
    SliderAdvance,
    /// Clear the touch marker on `node`
    TouchRelease { node: NodeId },
}
