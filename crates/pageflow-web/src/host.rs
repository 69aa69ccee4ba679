//! Browser host
//!
//! Implements the core `Document` and `Environment` traits over `web-sys`.
//! Elements are registered on first sight and tagged with their `NodeId`,
//! so the same element always maps to the same id. Timer and observer
//! callbacks re-enter the controller through the [`Dispatcher`].

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Weak;

use js_sys::{Array, Reflect};
use pageflow_core::{
    Document, Environment, NodeId, ObserverOptions, PageEvent, PageflowError, PageflowResult,
    TimerHandle, TimerTask, Watcher,
};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    Element, EventTarget, HtmlElement, HtmlImageElement, IntersectionObserver,
    IntersectionObserverEntry, IntersectionObserverInit, NodeList, ScrollBehavior,
    ScrollToOptions, Window,
};

use crate::runtime::Dispatcher;

/// Property carrying the registry id on each known element
const NODE_KEY: &str = "__pageflowId";

struct Observer {
    inner: IntersectionObserver,
    _callback: Closure<dyn FnMut(Array)>,
}

/// A scheduled timeout or interval and the callback the browser holds
struct Timer {
    browser: i32,
    repeating: bool,
    callback: Closure<dyn FnMut()>,
}

pub struct WebHost {
    window: Window,
    document: web_sys::Document,
    nodes: RefCell<Vec<Element>>,
    dispatcher: Weak<Dispatcher>,
    next_timer: TimerHandle,
    timers: BTreeMap<TimerHandle, Timer>,
    /// Callbacks of finished or cancelled timers. One of them may still be
    /// on the stack, so they are dropped on the next expiry or release.
    retired: Vec<Closure<dyn FnMut()>>,
    observers: BTreeMap<Watcher, Observer>,
}

/// Registry id stored on `value`, if it is a registered element.
pub(crate) fn node_id(value: &JsValue) -> Option<NodeId> {
    Reflect::get(value, &JsValue::from_str(NODE_KEY))
        .ok()
        .and_then(|v| v.as_f64())
        .map(|id| id as NodeId)
}

pub(crate) fn host_error(op: &'static str, err: JsValue) -> PageflowError {
    PageflowError::host(op, err.as_string().unwrap_or_else(|| format!("{err:?}")))
}

fn report(result: Result<(), JsValue>, op: &'static str) {
    if let Err(err) = result {
        tracing::debug!(error = %host_error(op, err), "dom call failed");
    }
}

/// The global window and its document.
pub fn browser() -> PageflowResult<(Window, web_sys::Document)> {
    let window = web_sys::window().ok_or_else(|| PageflowError::host("window", "no global window"))?;
    let document = window
        .document()
        .ok_or_else(|| PageflowError::host("document", "window has no document"))?;
    Ok((window, document))
}

impl WebHost {
    pub fn new(window: Window, document: web_sys::Document, dispatcher: Weak<Dispatcher>) -> Self {
        Self {
            window,
            document,
            nodes: RefCell::new(Vec::new()),
            dispatcher,
            next_timer: 0,
            timers: BTreeMap::new(),
            retired: Vec::new(),
            observers: BTreeMap::new(),
        }
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn document(&self) -> &web_sys::Document {
        &self.document
    }

    /// Id for `element`, registering it if needed. Ids left behind by an
    /// earlier host are overwritten.
    pub fn register(&self, element: Element) -> NodeId {
        let mut nodes = self.nodes.borrow_mut();
        if let Some(id) = node_id(&element) {
            if nodes.get(id as usize) == Some(&element) {
                return id;
            }
        }
        let id = nodes.len() as NodeId;
        let _ = Reflect::set(
            &element,
            &JsValue::from_str(NODE_KEY),
            &JsValue::from_f64(f64::from(id)),
        );
        nodes.push(element);
        id
    }

    /// Id for an event target, when the target is an element.
    pub fn node_for(&self, target: Option<EventTarget>) -> Option<NodeId> {
        target
            .and_then(|t| t.dyn_into::<Element>().ok())
            .map(|e| self.register(e))
    }

    pub fn element(&self, node: NodeId) -> Option<Element> {
        self.nodes.borrow().get(node as usize).cloned()
    }

    fn html(&self, node: NodeId) -> Option<HtmlElement> {
        self.element(node)
            .and_then(|e| e.dyn_into::<HtmlElement>().ok())
    }

    fn collect(&self, list: Result<NodeList, JsValue>, selector: &str) -> Vec<NodeId> {
        let list = match list {
            Ok(list) => list,
            Err(_) => {
                tracing::debug!(selector, "ignoring invalid selector");
                return Vec::new();
            }
        };
        (0..list.length())
            .filter_map(|i| list.item(i))
            .filter_map(|n| n.dyn_into::<Element>().ok())
            .map(|e| self.register(e))
            .collect()
    }

    fn schedule(&mut self, delay_ms: u32, task: TimerTask, repeating: bool) -> TimerHandle {
        self.next_timer = self.next_timer.wrapping_add(1).max(1);
        let handle = self.next_timer;

        let dispatcher = self.dispatcher.clone();
        let callback = Closure::<dyn FnMut()>::new(move || {
            if let Some(dispatcher) = dispatcher.upgrade() {
                dispatcher.dispatch_timer(handle, task);
            }
        });
        let function: &js_sys::Function = callback.as_ref().unchecked_ref();
        let delay = i32::try_from(delay_ms).unwrap_or(i32::MAX);
        let scheduled = if repeating {
            self.window
                .set_interval_with_callback_and_timeout_and_arguments_0(function, delay)
        } else {
            self.window
                .set_timeout_with_callback_and_timeout_and_arguments_0(function, delay)
        };

        match scheduled {
            Ok(browser) => {
                self.timers.insert(
                    handle,
                    Timer {
                        browser,
                        repeating,
                        callback,
                    },
                );
                handle
            }
            Err(err) => {
                report(Err(err), "set_timer");
                -1
            }
        }
    }

    /// A timer fired. Timeouts are forgotten; their callback is retired
    /// because it is the one running.
    pub fn expire(&mut self, handle: TimerHandle) {
        self.retired.clear();
        if self.timers.get(&handle).is_some_and(|t| !t.repeating) {
            if let Some(timer) = self.timers.remove(&handle) {
                self.retired.push(timer.callback);
            }
        }
    }

    /// Timers scheduled and not yet fired or cleared
    pub fn timer_count(&self) -> usize {
        self.timers.len()
    }

    /// Live intersection observers
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    fn cancel(&self, timer: &Timer) {
        if timer.repeating {
            self.window.clear_interval_with_handle(timer.browser);
        } else {
            self.window.clear_timeout_with_handle(timer.browser);
        }
    }

    fn create_observer(
        &self,
        watcher: Watcher,
        options: &ObserverOptions,
    ) -> Result<Observer, JsValue> {
        let dispatcher = self.dispatcher.clone();
        let callback = Closure::<dyn FnMut(Array)>::new(move |entries: Array| {
            let Some(dispatcher) = dispatcher.upgrade() else {
                return;
            };
            for entry in entries.iter() {
                let entry: IntersectionObserverEntry = entry.unchecked_into();
                let Some(target) = node_id(&entry.target()) else {
                    continue;
                };
                dispatcher.dispatch(PageEvent::Intersection {
                    watcher,
                    target,
                    intersecting: entry.is_intersecting(),
                });
            }
        });

        let init = IntersectionObserverInit::new();
        init.set_threshold(&JsValue::from_f64(options.threshold));
        init.set_root_margin(&options.root_margin);
        let inner = IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init)?;
        Ok(Observer {
            inner,
            _callback: callback,
        })
    }

    /// Stop every timer and observer.
    pub fn release(&mut self) {
        for timer in std::mem::take(&mut self.timers).into_values() {
            self.cancel(&timer);
        }
        self.retired.clear();
        for observer in std::mem::take(&mut self.observers).into_values() {
            observer.inner.disconnect();
        }
    }
}

impl Drop for WebHost {
    fn drop(&mut self) {
        self.release();
    }
}

impl Document for WebHost {
    fn query_all(&self, selector: &str) -> Vec<NodeId> {
        self.collect(self.document.query_selector_all(selector), selector)
    }

    fn query_within(&self, root: NodeId, selector: &str) -> Vec<NodeId> {
        match self.element(root) {
            Some(root) => self.collect(root.query_selector_all(selector), selector),
            None => Vec::new(),
        }
    }

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.document
            .get_element_by_id(id)
            .map(|e| self.register(e))
    }

    fn body(&self) -> Option<NodeId> {
        self.document.body().map(|b| self.register(b.into()))
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.element(node)
            .and_then(|e| e.parent_element())
            .map(|e| self.register(e))
    }

    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        match (self.element(ancestor), self.element(node)) {
            (Some(a), Some(n)) => a.contains(Some(&*n)),
            _ => false,
        }
    }

    fn tag_name(&self, node: NodeId) -> String {
        self.element(node)
            .map(|e| e.tag_name().to_ascii_lowercase())
            .unwrap_or_default()
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.element(node).and_then(|e| e.get_attribute(name))
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(e) = self.element(node) {
            report(e.set_attribute(name, value), "set_attribute");
        }
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) {
        if let Some(e) = self.element(node) {
            report(e.remove_attribute(name), "remove_attribute");
        }
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.element(node)
            .is_some_and(|e| e.class_list().contains(class))
    }

    fn add_class(&mut self, node: NodeId, class: &str) {
        if let Some(e) = self.element(node) {
            report(e.class_list().add_1(class), "add_class");
        }
    }

    fn remove_class(&mut self, node: NodeId, class: &str) {
        if let Some(e) = self.element(node) {
            report(e.class_list().remove_1(class), "remove_class");
        }
    }

    fn style(&self, node: NodeId, property: &str) -> Option<String> {
        self.html(node)
            .and_then(|e| e.style().get_property_value(property).ok())
            .filter(|v| !v.is_empty())
    }

    fn set_style(&mut self, node: NodeId, property: &str, value: &str) {
        if let Some(e) = self.html(node) {
            report(e.style().set_property(property, value), "set_style");
        }
    }

    fn natural_height(&self, node: NodeId) -> f64 {
        self.element(node)
            .and_then(|e| e.dyn_into::<HtmlImageElement>().ok())
            .map(|img| f64::from(img.natural_height()))
            .unwrap_or(0.0)
    }

    fn active_element(&self) -> Option<NodeId> {
        self.document.active_element().map(|e| self.register(e))
    }

    fn focus(&mut self, node: NodeId) {
        if let Some(e) = self.html(node) {
            report(e.focus(), "focus");
        }
    }
}

impl Environment for WebHost {
    fn viewport_width(&self) -> f64 {
        self.window
            .inner_width()
            .ok()
            .and_then(|w| w.as_f64())
            .unwrap_or(0.0)
    }

    fn scroll_y(&self) -> f64 {
        self.window.scroll_y().unwrap_or(0.0)
    }

    fn offset_height(&self, node: NodeId) -> f64 {
        self.html(node)
            .map(|e| f64::from(e.offset_height()))
            .unwrap_or(0.0)
    }

    fn client_top(&self, node: NodeId) -> f64 {
        self.element(node)
            .map(|e| e.get_bounding_client_rect().top())
            .unwrap_or(0.0)
    }

    fn smooth_scroll_to(&mut self, top: f64) {
        let options = ScrollToOptions::new();
        options.set_top(top);
        options.set_behavior(ScrollBehavior::Smooth);
        self.window.scroll_to_with_scroll_to_options(&options);
    }

    fn replace_fragment(&mut self, fragment: &str) {
        match self.window.history() {
            Ok(history) => report(
                history.replace_state_with_url(&JsValue::NULL, "", Some(fragment)),
                "replace_state",
            ),
            Err(err) => report(Err(err), "history"),
        }
    }

    fn supports_touch(&self) -> bool {
        Reflect::has(&self.window, &JsValue::from_str("ontouchstart")).unwrap_or(false)
    }

    fn set_timeout(&mut self, delay_ms: u32, task: TimerTask) -> TimerHandle {
        self.schedule(delay_ms, task, false)
    }

    fn set_interval(&mut self, period_ms: u32, task: TimerTask) -> TimerHandle {
        self.schedule(period_ms, task, true)
    }

    fn clear_timer(&mut self, handle: TimerHandle) {
        if let Some(timer) = self.timers.remove(&handle) {
            self.cancel(&timer);
            self.retired.push(timer.callback);
        }
    }

    fn supports_intersection(&self) -> bool {
        Reflect::has(&self.window, &JsValue::from_str("IntersectionObserver")).unwrap_or(false)
    }

    fn observe(&mut self, watcher: Watcher, node: NodeId, options: &ObserverOptions) -> bool {
        if !self.supports_intersection() {
            return false;
        }
        let Some(element) = self.element(node) else {
            return false;
        };
        if !self.observers.contains_key(&watcher) {
            match self.create_observer(watcher, options) {
                Ok(observer) => {
                    self.observers.insert(watcher, observer);
                }
                Err(err) => {
                    report(Err(err), "intersection_observer");
                    return false;
                }
            }
        }
        if let Some(observer) = self.observers.get(&watcher) {
            observer.inner.observe(&element);
        }
        true
    }

    fn unobserve(&mut self, watcher: Watcher, node: NodeId) {
        if let (Some(observer), Some(element)) = (self.observers.get(&watcher), self.element(node)) {
            observer.inner.unobserve(&element);
        }
    }

    fn disconnect(&mut self, watcher: Watcher) {
        if let Some(observer) = self.observers.remove(&watcher) {
            observer.inner.disconnect();
        }
    }
}
