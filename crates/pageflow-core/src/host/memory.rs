//! In-memory host for testing.
//!
//! Provides a tree of elements, a virtual clock driving timers, and
//! scriptable intersection notifications. Nothing touches a browser.

use std::collections::{BTreeMap, BTreeSet};

use super::selector::{Selector, SelectorTarget};
use super::{Document, Environment};
use crate::controller::{Disposition, PageController, PageEvent};
use crate::error::PageflowResult;
use crate::focus::focusable_elements;
use crate::types::{Key, NodeId, ObserverOptions, TimerHandle, TimerTask, Watcher};

/// A single element in the in-memory tree
#[derive(Clone, Debug, Default)]
struct MemoryNode {
    tag: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attributes: BTreeMap<String, String>,
    classes: Vec<String>,
    styles: BTreeMap<String, String>,
    offset_height: f64,
    /// Top relative to the document, not the viewport
    document_top: f64,
    natural_height: f64,
}

/// Comparable view of an element's markers
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeSnapshot {
    pub attributes: BTreeMap<String, String>,
    pub classes: BTreeSet<String>,
    pub styles: BTreeMap<String, String>,
}

#[derive(Clone, Debug)]
struct PendingTimer {
    handle: TimerHandle,
    due: u64,
    period: Option<u64>,
    task: TimerTask,
}

/// In-memory document and environment.
pub struct MemoryHost {
    nodes: Vec<MemoryNode>,
    active: Option<NodeId>,
    viewport_width: f64,
    scroll_y: f64,
    touch: bool,
    intersection: bool,
    /// Virtual time in ms
    now: u64,
    next_handle: TimerHandle,
    timers: Vec<PendingTimer>,
    observers: BTreeMap<Watcher, ObserverOptions>,
    observed: BTreeMap<Watcher, BTreeSet<NodeId>>,
    scroll_requests: Vec<f64>,
    fragment: Option<String>,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    /// Create a host holding only a `body` element, 1200px wide, with
    /// intersection support and no touch support.
    pub fn new() -> Self {
        Self {
            nodes: vec![MemoryNode {
                tag: String::from("body"),
                ..Default::default()
            }],
            active: None,
            viewport_width: 1200.0,
            scroll_y: 0.0,
            touch: false,
            intersection: true,
            now: 0,
            next_handle: 1,
            timers: Vec::new(),
            observers: BTreeMap::new(),
            observed: BTreeMap::new(),
            scroll_requests: Vec::new(),
            fragment: None,
        }
    }

    /// Host without viewport-intersection support
    pub fn without_intersection() -> Self {
        Self {
            intersection: false,
            ..Self::new()
        }
    }

    // ========== Tree Building ==========

    /// Append a new element with `tag` under `parent`.
    pub fn append(&mut self, parent: NodeId, tag: &str) -> NodeId {
        let id = self.nodes.len() as NodeId;
        self.nodes.push(MemoryNode {
            tag: tag.to_ascii_lowercase(),
            parent: Some(parent),
            ..Default::default()
        });
        self.node_mut(parent).children.push(id);
        id
    }

    /// Append an element and set attributes in one go. A `class` attribute
    /// is split into classes.
    pub fn append_with(&mut self, parent: NodeId, tag: &str, attributes: &[(&str, &str)]) -> NodeId {
        let id = self.append(parent, tag);
        for (name, value) in attributes {
            self.set_attribute(id, name, value);
        }
        id
    }

    pub fn set_offset_height(&mut self, node: NodeId, height: f64) {
        self.node_mut(node).offset_height = height;
    }

    pub fn set_document_top(&mut self, node: NodeId, top: f64) {
        self.node_mut(node).document_top = top;
    }

    pub fn set_natural_height(&mut self, node: NodeId, height: f64) {
        self.node_mut(node).natural_height = height;
    }

    // ========== Environment Controls ==========

    pub fn set_viewport_width(&mut self, width: f64) {
        self.viewport_width = width;
    }

    pub fn set_scroll_y(&mut self, y: f64) {
        self.scroll_y = y;
    }

    pub fn set_touch(&mut self, touch: bool) {
        self.touch = touch;
    }

    /// Current virtual time in ms
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Number of timers not yet fired or cleared
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Whether `node` is registered with `watcher`
    pub fn is_observed(&self, watcher: Watcher, node: NodeId) -> bool {
        self.observed
            .get(&watcher)
            .is_some_and(|set| set.contains(&node))
    }

    pub fn observed_count(&self, watcher: Watcher) -> usize {
        self.observed.get(&watcher).map_or(0, BTreeSet::len)
    }

    /// Like [`Document::query_all`], but reports selectors the matcher
    /// cannot parse instead of matching nothing.
    pub fn try_query_all(&self, selector: &str) -> PageflowResult<Vec<NodeId>> {
        self.try_select(0, selector, true)
    }

    /// Options a watcher was created with
    pub fn observer_options(&self, watcher: Watcher) -> Option<&ObserverOptions> {
        self.observers.get(&watcher)
    }

    /// Smooth scroll targets requested so far
    pub fn scroll_requests(&self) -> &[f64] {
        &self.scroll_requests
    }

    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    /// Attributes, classes and inline styles of `node`
    pub fn snapshot(&self, node: NodeId) -> NodeSnapshot {
        let n = self.node(node);
        NodeSnapshot {
            attributes: n.attributes.clone(),
            classes: n.classes.iter().cloned().collect(),
            styles: n.styles.clone(),
        }
    }

    // ========== Driving a Controller ==========

    /// Deliver an event to `controller`.
    pub fn dispatch(&mut self, controller: &mut PageController, event: PageEvent) -> Disposition {
        controller.handle(self, event)
    }

    /// Simulate a click on `target`.
    pub fn click(&mut self, controller: &mut PageController, target: NodeId) -> Disposition {
        self.dispatch(controller, PageEvent::Click { target })
    }

    /// Simulate a key press. Unhandled tabs move focus in document order.
    pub fn key(&mut self, controller: &mut PageController, key: Key, shift: bool) -> Disposition {
        let disposition = self.dispatch(controller, PageEvent::KeyDown { key, shift });
        if key == Key::Tab && !disposition.prevent_default {
            self.default_tab(shift);
        }
        disposition
    }

    /// Browser default for Tab: next (or previous) focusable element in the
    /// document, stopping at the ends.
    fn default_tab(&mut self, backward: bool) {
        let order = focusable_elements(self, 0);
        let position = self
            .active
            .and_then(|a| order.iter().position(|n| *n == a));
        let next = match (position, backward) {
            (None, false) => order.first().copied(),
            (None, true) => order.last().copied(),
            (Some(i), false) => order.get(i + 1).copied(),
            (Some(i), true) => i.checked_sub(1).and_then(|j| order.get(j).copied()),
        };
        if let Some(node) = next {
            self.active = Some(node);
        }
    }

    /// Advance virtual time by `ms`, firing every timer that comes due in
    /// order.
    pub fn advance(&mut self, controller: &mut PageController, ms: u64) {
        let until = self.now + ms;
        while let Some(task) = self.pop_due(until) {
            controller.handle(self, PageEvent::Timer(task));
        }
        self.now = until;
    }

    /// Report an intersection change for `node` to every watcher observing
    /// it. Returns how many notifications were delivered.
    pub fn intersect(
        &mut self,
        controller: &mut PageController,
        node: NodeId,
        intersecting: bool,
    ) -> usize {
        let watchers: Vec<Watcher> = Watcher::all()
            .iter()
            .copied()
            .filter(|w| self.is_observed(*w, node))
            .collect();
        for watcher in &watchers {
            controller.handle(
                self,
                PageEvent::Intersection {
                    watcher: *watcher,
                    target: node,
                    intersecting,
                },
            );
        }
        watchers.len()
    }

    /// Remove and return the earliest timer due at or before `until`,
    /// moving the clock to its due time. Intervals are rescheduled.
    fn pop_due(&mut self, until: u64) -> Option<TimerTask> {
        let position = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= until)
            .min_by_key(|(_, t)| (t.due, t.handle))
            .map(|(i, _)| i)?;

        let timer = self.timers.remove(position);
        self.now = self.now.max(timer.due);
        if let Some(period) = timer.period {
            self.timers.push(PendingTimer {
                due: timer.due + period,
                ..timer.clone()
            });
        }
        Some(timer.task)
    }

    fn node(&self, id: NodeId) -> &MemoryNode {
        &self.nodes[id as usize]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut MemoryNode {
        &mut self.nodes[id as usize]
    }

    fn preorder(&self, root: NodeId, out: &mut Vec<NodeId>) {
        for child in &self.node(root).children {
            out.push(*child);
            self.preorder(*child, out);
        }
    }

    fn try_select(
        &self,
        root: NodeId,
        selector: &str,
        include_root: bool,
    ) -> PageflowResult<Vec<NodeId>> {
        let selector = Selector::parse(selector)?;
        let mut candidates = Vec::new();
        if include_root {
            candidates.push(root);
        }
        self.preorder(root, &mut candidates);
        Ok(candidates
            .into_iter()
            .filter(|n| selector.matches(self, *n))
            .collect())
    }

    fn select(&self, root: NodeId, selector: &str, include_root: bool) -> Vec<NodeId> {
        self.try_select(root, selector, include_root)
            .unwrap_or_else(|err| {
                tracing::debug!(%err, "ignoring invalid selector");
                Vec::new()
            })
    }
}

impl SelectorTarget for MemoryHost {
    fn target_tag(&self, node: NodeId) -> &str {
        &self.node(node).tag
    }

    fn target_attr(&self, node: NodeId, name: &str) -> Option<String> {
        self.attribute(node, name)
    }

    fn target_has_class(&self, node: NodeId, class: &str) -> bool {
        self.has_class(node, class)
    }

    fn target_parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).parent
    }
}

impl Document for MemoryHost {
    fn query_all(&self, selector: &str) -> Vec<NodeId> {
        self.select(0, selector, true)
    }

    fn query_within(&self, root: NodeId, selector: &str) -> Vec<NodeId> {
        self.select(root, selector, false)
    }

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        (0..self.nodes.len() as NodeId)
            .find(|n| self.node(*n).attributes.get("id").map(String::as_str) == Some(id))
    }

    fn body(&self) -> Option<NodeId> {
        Some(0)
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).parent
    }

    fn tag_name(&self, node: NodeId) -> String {
        self.node(node).tag.clone()
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        let n = self.node(node);
        if name == "class" {
            return (!n.classes.is_empty()).then(|| n.classes.join(" "));
        }
        n.attributes.get(name).cloned()
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        let n = self.node_mut(node);
        if name == "class" {
            n.classes = value.split_whitespace().map(String::from).collect();
            return;
        }
        n.attributes.insert(name.to_string(), value.to_string());
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) {
        let n = self.node_mut(node);
        if name == "class" {
            n.classes.clear();
            return;
        }
        n.attributes.remove(name);
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.node(node).classes.iter().any(|c| c == class)
    }

    fn add_class(&mut self, node: NodeId, class: &str) {
        if !self.has_class(node, class) {
            self.node_mut(node).classes.push(class.to_string());
        }
    }

    fn remove_class(&mut self, node: NodeId, class: &str) {
        self.node_mut(node).classes.retain(|c| c != class);
    }

    fn style(&self, node: NodeId, property: &str) -> Option<String> {
        self.node(node).styles.get(property).cloned()
    }

    fn set_style(&mut self, node: NodeId, property: &str, value: &str) {
        self.node_mut(node)
            .styles
            .insert(property.to_string(), value.to_string());
    }

    fn natural_height(&self, node: NodeId) -> f64 {
        self.node(node).natural_height
    }

    fn active_element(&self) -> Option<NodeId> {
        self.active
    }

    fn focus(&mut self, node: NodeId) {
        self.active = Some(node);
    }
}

impl Environment for MemoryHost {
    fn viewport_width(&self) -> f64 {
        self.viewport_width
    }

    fn scroll_y(&self) -> f64 {
        self.scroll_y
    }

    fn offset_height(&self, node: NodeId) -> f64 {
        self.node(node).offset_height
    }

    fn client_top(&self, node: NodeId) -> f64 {
        self.node(node).document_top - self.scroll_y
    }

    fn smooth_scroll_to(&mut self, top: f64) {
        self.scroll_requests.push(top);
    }

    fn replace_fragment(&mut self, fragment: &str) {
        self.fragment = Some(fragment.to_string());
    }

    fn supports_touch(&self) -> bool {
        self.touch
    }

    fn set_timeout(&mut self, delay_ms: u32, task: TimerTask) -> TimerHandle {
        let handle = self.next_handle;
        self.next_handle += 1;
        self.timers.push(PendingTimer {
            handle,
            due: self.now + u64::from(delay_ms),
            period: None,
            task,
        });
        handle
    }

    fn set_interval(&mut self, period_ms: u32, task: TimerTask) -> TimerHandle {
        let handle = self.next_handle;
        self.next_handle += 1;
        // Browsers clamp zero-period intervals; so do we, to keep `advance` finite.
        let period = u64::from(period_ms.max(1));
        self.timers.push(PendingTimer {
            handle,
            due: self.now + period,
            period: Some(period),
            task,
        });
        handle
    }

    fn clear_timer(&mut self, handle: TimerHandle) {
        self.timers.retain(|t| t.handle != handle);
    }

    fn supports_intersection(&self) -> bool {
        self.intersection
    }

    fn observe(&mut self, watcher: Watcher, node: NodeId, options: &ObserverOptions) -> bool {
        if !self.intersection {
            return false;
        }
        self.observers
            .entry(watcher)
            .or_insert_with(|| options.clone());
        self.observed.entry(watcher).or_default().insert(node);
        true
    }

    fn unobserve(&mut self, watcher: Watcher, node: NodeId) {
        if let Some(set) = self.observed.get_mut(&watcher) {
            set.remove(&node);
        }
    }

    fn disconnect(&mut self, watcher: Watcher) {
        self.observed.remove(&watcher);
        self.observers.remove(&watcher);
    }
}
