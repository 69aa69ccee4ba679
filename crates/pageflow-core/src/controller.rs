//! Page controller
//!
//! Owns one instance of every component and routes host events to them.
//! The host delivers everything as a [`PageEvent`]: DOM input, timer
//! expiry, and intersection notifications. The returned [`Disposition`]
//! tells the host what to do with the original DOM event.

use crate::anchor::AnchorNavigator;
use crate::config::PageflowConfig;
use crate::header::HeaderShadow;
use crate::host::Host;
use crate::lazy::LazyImageLoader;
use crate::menu::MenuController;
use crate::reveal::RevealEngine;
use crate::sizing::apply_image_sizing;
use crate::slider::CrossfadeSlider;
use crate::touch::TouchFeedback;
use crate::types::{Key, NodeId, TimerTask, Watcher};

/// Events delivered by the host
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageEvent {
    /// Document parsed (`DOMContentLoaded`)
    Ready,
    /// All resources loaded (`load`)
    Loaded,
    /// Click anywhere in the document
    Click { target: NodeId },
    KeyDown { key: Key, shift: bool },
    Resize,
    Scroll,
    TouchStart { target: NodeId },
    TouchEnd { target: NodeId },
    Timer(TimerTask),
    Intersection {
        watcher: Watcher,
        target: NodeId,
        intersecting: bool,
    },
}

/// What the host should do with the DOM event that was handled
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Disposition {
    pub prevent_default: bool,
    pub stop_propagation: bool,
}

impl Disposition {
    fn prevent() -> Self {
        Self {
            prevent_default: true,
            stop_propagation: false,
        }
    }

    fn stop() -> Self {
        Self {
            prevent_default: false,
            stop_propagation: true,
        }
    }
}

/// Interaction state controller for one page
pub struct PageController {
    config: PageflowConfig,
    attached: bool,
    menu: Option<MenuController>,
    reveal: RevealEngine,
    slider: Option<CrossfadeSlider>,
    lazy: Option<LazyImageLoader>,
    anchors: AnchorNavigator,
    header: Option<HeaderShadow>,
    touch: Option<TouchFeedback>,
}

impl Default for PageController {
    fn default() -> Self {
        Self::new(PageflowConfig::default())
    }
}

impl PageController {
    pub fn new(config: PageflowConfig) -> Self {
        Self {
            reveal: RevealEngine::new(&config),
            anchors: AnchorNavigator::new(&config),
            config,
            attached: false,
            menu: None,
            slider: None,
            lazy: None,
            header: None,
            touch: None,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Bind every component whose elements and capabilities are present.
    /// Components with nothing to bind stay inactive. Calling `attach` on
    /// an attached controller does nothing and returns false.
    pub fn attach<H: Host + ?Sized>(&mut self, host: &mut H) -> bool {
        if self.attached {
            tracing::debug!("controller already attached");
            return false;
        }
        self.menu = MenuController::attach(host, &self.config);
        self.slider = CrossfadeSlider::attach(host, &self.config);
        self.lazy = LazyImageLoader::attach(host, &self.config);
        self.header = HeaderShadow::attach(host, &self.config);
        self.touch = TouchFeedback::attach(host, &self.config);
        self.attached = true;

        tracing::debug!(
            menu = self.menu.is_some(),
            slider = self.slider.is_some(),
            lazy = self.lazy.is_some(),
            header = self.header.is_some(),
            touch = self.touch.is_some(),
            "controller attached"
        );
        true
    }

    /// Undo `attach`: close the menu, stop timers, release watchers and
    /// remove the markers components own.
    pub fn detach<H: Host + ?Sized>(&mut self, host: &mut H) {
        if !self.attached {
            return;
        }
        if let Some(mut menu) = self.menu.take() {
            menu.detach(host);
        }
        if let Some(slider) = self.slider.take() {
            slider.detach(host);
        }
        if let Some(mut lazy) = self.lazy.take() {
            lazy.detach(host);
        }
        if let Some(header) = self.header.take() {
            header.detach(host);
        }
        if let Some(mut touch) = self.touch.take() {
            touch.detach(host);
        }
        self.reveal.detach(host);
        self.attached = false;
        tracing::debug!("controller detached");
    }

    pub fn menu(&self) -> Option<&MenuController> {
        self.menu.as_ref()
    }

    pub fn slider(&self) -> Option<&CrossfadeSlider> {
        self.slider.as_ref()
    }

    pub fn reveal(&self) -> &RevealEngine {
        &self.reveal
    }

    pub fn lazy(&self) -> Option<&LazyImageLoader> {
        self.lazy.as_ref()
    }

    pub fn is_menu_open(&self) -> bool {
        self.menu.as_ref().is_some_and(MenuController::is_open)
    }

    pub fn open_menu<H: Host + ?Sized>(&mut self, host: &mut H) -> bool {
        self.menu.as_mut().is_some_and(|m| m.open(host))
    }

    pub fn close_menu<H: Host + ?Sized>(&mut self, host: &mut H) -> bool {
        self.menu.as_mut().is_some_and(|m| m.close(host))
    }

    /// Route one host event.
    pub fn handle<H: Host + ?Sized>(&mut self, host: &mut H, event: PageEvent) -> Disposition {
        if !self.attached {
            return Disposition::default();
        }

        match event {
            PageEvent::Ready => {
                self.reveal.start(host);
            }
            PageEvent::Loaded => {
                apply_image_sizing(host);
            }
            PageEvent::Click { target } => {
                if let Some(menu) = self.menu.as_mut() {
                    if menu.on_click(host, target) {
                        return Disposition::stop();
                    }
                }
                if self.anchors.on_click(host, target) {
                    return Disposition::prevent();
                }
            }
            PageEvent::KeyDown { key, shift } => match (key, self.menu.as_mut()) {
                (Key::Escape, Some(menu)) => {
                    menu.on_escape(host);
                }
                (Key::Tab, Some(menu)) => {
                    if menu.on_tab(host, shift) {
                        return Disposition::prevent();
                    }
                }
                _ => {}
            },
            PageEvent::Resize => {
                if let Some(menu) = self.menu.as_mut() {
                    menu.on_resize(host);
                }
            }
            PageEvent::Scroll => {
                if let Some(header) = self.header.as_ref() {
                    header.on_scroll(host);
                }
            }
            PageEvent::TouchStart { target } => {
                if let Some(touch) = self.touch.as_mut() {
                    touch.on_touch_start(host, target);
                }
            }
            PageEvent::TouchEnd { target } => {
                if let Some(touch) = self.touch.as_mut() {
                    touch.on_touch_end(host, target);
                }
            }
            PageEvent::Timer(task) => self.route_timer(host, task),
            PageEvent::Intersection {
                watcher,
                target,
                intersecting,
            } => match watcher {
                Watcher::Reveal => self.reveal.on_intersection(host, target, intersecting),
                Watcher::LazyImage => {
                    if let Some(lazy) = self.lazy.as_mut() {
                        lazy.on_intersection(host, target, intersecting);
                    }
                }
            },
        }
        Disposition::default()
    }

    fn route_timer<H: Host + ?Sized>(&mut self, host: &mut H, task: TimerTask) {
        let handled = self.menu.as_mut().is_some_and(|m| m.on_timer(host, task))
            || self.reveal.on_timer(host, task)
            || self.slider.as_mut().is_some_and(|s| s.on_timer(host, task))
            || self.touch.as_mut().is_some_and(|t| t.on_timer(host, task));
        if !handled {
            tracing::trace!(?task, "timer with no owner");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryHost;

    #[test]
    fn test_events_ignored_before_attach() {
        let mut host = MemoryHost::new();
        let toggle = host.append_with(0, "button", &[("class", "menu-toggle")]);
        host.append_with(0, "ul", &[("id", "primary-menu")]);
        let mut controller = PageController::default();

        let disposition = controller.handle(&mut host, PageEvent::Click { target: toggle });
        assert_eq!(disposition, Disposition::default());
        assert!(!controller.is_menu_open());
    }

    #[test]
    fn test_attach_is_idempotent() {
        let mut host = MemoryHost::new();
        let photo = host.append_with(0, "div", &[("class", "why-media")]);
        let frame = host.append_with(photo, "div", &[("class", "big-photo")]);
        host.append(frame, "img");
        host.append(frame, "img");
        let mut controller = PageController::default();

        assert!(controller.attach(&mut host));
        assert!(!controller.attach(&mut host));
        assert_eq!(host.pending_timers(), 1);
    }

    #[test]
    fn test_empty_page_attaches_quietly() {
        let mut host = MemoryHost::new();
        let mut controller = PageController::default();
        assert!(controller.attach(&mut host));
        controller.handle(&mut host, PageEvent::Ready);
        controller.handle(&mut host, PageEvent::Resize);
        controller.handle(&mut host, PageEvent::Scroll);
        controller.handle(&mut host, PageEvent::KeyDown { key: Key::Escape, shift: false });
        assert!(controller.menu().is_none());
        assert!(controller.slider().is_none());
        assert!(!controller.open_menu(&mut host));
    }

    #[test]
    fn test_toggle_click_stops_propagation() {
        let mut host = MemoryHost::new();
        let toggle = host.append_with(0, "button", &[("class", "menu-toggle")]);
        host.append_with(0, "ul", &[("id", "primary-menu")]);
        let mut controller = PageController::default();
        controller.attach(&mut host);

        let disposition = controller.handle(&mut host, PageEvent::Click { target: toggle });
        assert!(disposition.stop_propagation);
        assert!(controller.is_menu_open());
    }

    #[test]
    fn test_detach_releases_everything() {
        let mut host = MemoryHost::new();
        host.append_with(0, "button", &[("class", "menu-toggle")]);
        host.append_with(0, "ul", &[("id", "primary-menu")]);
        host.append_with(0, "img", &[("data-src", "a.jpg")]);
        host.append_with(0, "div", &[("data-animate", "")]);
        let mut controller = PageController::default();
        controller.attach(&mut host);
        controller.handle(&mut host, PageEvent::Ready);
        controller.open_menu(&mut host);

        controller.detach(&mut host);
        assert!(!controller.is_attached());
        assert!(!controller.is_menu_open());
        assert_eq!(host.pending_timers(), 0);
        assert_eq!(host.observed_count(Watcher::Reveal), 0);
        assert_eq!(host.observed_count(Watcher::LazyImage), 0);
        assert!(controller.attach(&mut host));
    }
}
