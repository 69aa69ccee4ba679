//! DOM listeners and event dispatch
//!
//! The controller and the host live together behind one `RefCell`. Every
//! callback (listener, timer, observer) goes through [`Dispatcher`]. An
//! event that arrives while another is being handled is dropped.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use pageflow_core::{
    Disposition, Key, PageController, PageEvent, PageflowConfig, PageflowResult, TimerHandle,
    TimerTask,
};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{Event, EventTarget, KeyboardEvent};

use crate::host::{browser, host_error, WebHost};

/// A registered DOM listener, removed on drop
struct Listener {
    target: EventTarget,
    kind: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

impl Drop for Listener {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.kind, self.callback.as_ref().unchecked_ref());
    }
}

/// How a DOM event becomes a page event
#[derive(Clone, Copy, Debug)]
enum Translate {
    Fixed(PageEvent),
    Click,
    KeyDown,
    TouchStart,
    TouchEnd,
}

impl Translate {
    fn page_event(self, host: &WebHost, event: &Event) -> Option<PageEvent> {
        match self {
            Translate::Fixed(page_event) => Some(page_event),
            Translate::Click => host
                .node_for(event.target())
                .map(|target| PageEvent::Click { target }),
            Translate::KeyDown => {
                let key = event.dyn_ref::<KeyboardEvent>()?;
                Some(PageEvent::KeyDown {
                    key: Key::from_dom(&key.key()),
                    shift: key.shift_key(),
                })
            }
            Translate::TouchStart => host
                .node_for(event.target())
                .map(|target| PageEvent::TouchStart { target }),
            Translate::TouchEnd => host
                .node_for(event.target())
                .map(|target| PageEvent::TouchEnd { target }),
        }
    }
}

struct Runtime {
    controller: PageController,
    host: WebHost,
    listeners: Vec<Listener>,
}

pub struct Dispatcher {
    runtime: RefCell<Runtime>,
}

impl Dispatcher {
    pub fn new(config: PageflowConfig) -> PageflowResult<Rc<Self>> {
        let (window, document) = browser()?;
        Ok(Rc::new_cyclic(|weak| Self {
            runtime: RefCell::new(Runtime {
                controller: PageController::new(config),
                host: WebHost::new(window, document, weak.clone()),
                listeners: Vec::new(),
            }),
        }))
    }

    /// Run `f` with exclusive access, or return `None` when busy.
    fn with<R>(&self, f: impl FnOnce(&mut Runtime) -> R) -> Option<R> {
        match self.runtime.try_borrow_mut() {
            Ok(mut runtime) => Some(f(&mut runtime)),
            Err(_) => {
                tracing::debug!("dispatcher busy, event dropped");
                None
            }
        }
    }

    pub fn dispatch(&self, event: PageEvent) -> Disposition {
        self.with(|rt| rt.controller.handle(&mut rt.host, event))
            .unwrap_or_default()
    }

    /// Deliver a fired timer. The host forgets one-shot timers first.
    pub fn dispatch_timer(&self, handle: TimerHandle, task: TimerTask) {
        self.with(|rt| {
            rt.host.expire(handle);
            rt.controller.handle(&mut rt.host, PageEvent::Timer(task));
        });
    }

    fn dispatch_dom(&self, translate: Translate, event: &Event) {
        let disposition = self
            .with(|rt| {
                let page_event = translate.page_event(&rt.host, event)?;
                Some(rt.controller.handle(&mut rt.host, page_event))
            })
            .flatten()
            .unwrap_or_default();

        if disposition.prevent_default {
            event.prevent_default();
        }
        if disposition.stop_propagation {
            event.stop_propagation();
        }
    }

    /// Attach the controller and bind DOM listeners. When the document has
    /// already passed `DOMContentLoaded` (or `load`), the matching lifecycle
    /// events are delivered right away.
    pub fn attach(self: &Rc<Self>) -> PageflowResult<bool> {
        let weak = Rc::downgrade(self);
        let attached = self
            .with(|rt| -> PageflowResult<bool> {
                if !rt.controller.attach(&mut rt.host) {
                    return Ok(false);
                }
                rt.listeners = bind_listeners(&rt.host, &weak)?;
                Ok(true)
            })
            .unwrap_or(Ok(false))?;

        if attached {
            let state = self
                .with(|rt| rt.host.document().ready_state())
                .unwrap_or_default();
            tracing::debug!(%state, listeners = self.listener_count(), "attached");
            if state != "loading" {
                self.dispatch(PageEvent::Ready);
            }
            if state == "complete" {
                self.dispatch(PageEvent::Loaded);
            }
        }
        Ok(attached)
    }

    pub fn detach(&self) {
        self.with(|rt| {
            rt.listeners.clear();
            rt.controller.detach(&mut rt.host);
            rt.host.release();
        });
    }

    pub fn listener_count(&self) -> usize {
        self.with(|rt| rt.listeners.len()).unwrap_or(0)
    }

    pub fn timer_count(&self) -> usize {
        self.with(|rt| rt.host.timer_count()).unwrap_or(0)
    }

    pub fn observer_count(&self) -> usize {
        self.with(|rt| rt.host.observer_count()).unwrap_or(0)
    }

    pub fn pending_images(&self) -> usize {
        self.with(|rt| rt.controller.lazy().map_or(0, |lazy| lazy.pending_count()))
            .unwrap_or(0)
    }

    pub fn is_menu_open(&self) -> bool {
        self.with(|rt| rt.controller.is_menu_open())
            .unwrap_or(false)
    }

    pub fn open_menu(&self) -> bool {
        self.with(|rt| rt.controller.open_menu(&mut rt.host))
            .unwrap_or(false)
    }

    pub fn close_menu(&self) -> bool {
        self.with(|rt| rt.controller.close_menu(&mut rt.host))
            .unwrap_or(false)
    }
}

fn listen(
    target: &EventTarget,
    kind: &'static str,
    translate: Translate,
    dispatcher: &Weak<Dispatcher>,
) -> PageflowResult<Listener> {
    let dispatcher = dispatcher.clone();
    let callback = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
        if let Some(dispatcher) = dispatcher.upgrade() {
            dispatcher.dispatch_dom(translate, &event);
        }
    });
    target
        .add_event_listener_with_callback(kind, callback.as_ref().unchecked_ref())
        .map_err(|err| host_error("add_event_listener", err))?;
    Ok(Listener {
        target: target.clone(),
        kind,
        callback,
    })
}

fn bind_listeners(host: &WebHost, dispatcher: &Weak<Dispatcher>) -> PageflowResult<Vec<Listener>> {
    let document: &EventTarget = host.document();
    let window: &EventTarget = host.window();
    let bindings = [
        (document, "DOMContentLoaded", Translate::Fixed(PageEvent::Ready)),
        (window, "load", Translate::Fixed(PageEvent::Loaded)),
        (document, "click", Translate::Click),
        (document, "keydown", Translate::KeyDown),
        (document, "touchstart", Translate::TouchStart),
        (document, "touchend", Translate::TouchEnd),
        (window, "resize", Translate::Fixed(PageEvent::Resize)),
        (window, "scroll", Translate::Fixed(PageEvent::Scroll)),
    ];
    bindings
        .into_iter()
        .map(|(target, kind, translate)| listen(target, kind, translate, dispatcher))
        .collect()
}
