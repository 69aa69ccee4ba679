//! Menu controller
//!
//! Owns the menu state and every marker it puts on the document. `open()`
//! records what it added so `close()` can take exactly that back off.

use super::state::{MenuState, MenuTrigger};
use crate::config::PageflowConfig;
use crate::focus::FocusTrapContext;
use crate::host::Host;
use crate::timing::{Debouncer, StaggerPolicy};
use crate::types::{NodeId, TimerHandle, TimerTask};

/// Markers added by one `open()`, undone by the matching `close()`
#[derive(Clone, Debug, Default)]
struct Applied {
    menu_class: bool,
    body_class: bool,
    /// Items that lacked the entered marker when the menu opened
    items: Vec<NodeId>,
    item_timers: Vec<TimerHandle>,
}

/// Navigation menu controller
pub struct MenuController {
    toggle: NodeId,
    menu: NodeId,
    body: Option<NodeId>,
    state: MenuState,
    /// Bumped on every open so stale entrance timers are ignored
    generation: u32,
    applied: Applied,
    resize: Debouncer,
    item_stagger: StaggerPolicy,
    breakpoint: f64,
    item_selector: String,
    link_selector: String,
    expanded_attr: String,
    open_class: String,
    scroll_lock_class: String,
    entered_class: String,
}

impl MenuController {
    /// Bind to the toggle and menu container. Returns `None` when either is
    /// missing from the page.
    pub fn attach<H: Host + ?Sized>(host: &mut H, config: &PageflowConfig) -> Option<Self> {
        let toggle = host.query(&config.selectors.menu_toggle);
        let menu = host.query(&config.selectors.menu);
        let (Some(toggle), Some(menu)) = (toggle, menu) else {
            tracing::debug!(
                toggle = toggle.is_some(),
                menu = menu.is_some(),
                "menu not attached"
            );
            return None;
        };

        let markers = &config.markers;
        host.set_attribute(toggle, &markers.expanded_attr, "false");

        Some(Self {
            toggle,
            menu,
            body: host.body(),
            state: MenuState::Closed,
            generation: 0,
            applied: Applied::default(),
            resize: Debouncer::new(config.timings.resize_debounce_ms),
            item_stagger: StaggerPolicy::new(config.timings.menu_item_step_ms),
            breakpoint: config.layout.mobile_breakpoint_px,
            item_selector: config.selectors.menu_item.clone(),
            link_selector: config.selectors.menu_link.clone(),
            expanded_attr: markers.expanded_attr.clone(),
            open_class: markers.menu_open_class.clone(),
            scroll_lock_class: markers.scroll_lock_class.clone(),
            entered_class: markers.item_entered_class.clone(),
        })
    }

    pub fn state(&self) -> MenuState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state.is_open()
    }

    /// Open the menu. No-op when already open.
    pub fn open<H: Host + ?Sized>(&mut self, host: &mut H) -> bool {
        self.apply(host, MenuTrigger::Open)
    }

    /// Close the menu. No-op when already closed.
    pub fn close<H: Host + ?Sized>(&mut self, host: &mut H) -> bool {
        self.apply(host, MenuTrigger::Close)
    }

    pub fn toggle<H: Host + ?Sized>(&mut self, host: &mut H) -> bool {
        self.apply(host, MenuTrigger::Toggle)
    }

    /// Route a document click. Returns true when the click hit the toggle
    /// and must not propagate further.
    pub fn on_click<H: Host + ?Sized>(&mut self, host: &mut H, target: NodeId) -> bool {
        if host.contains(self.toggle, target) {
            self.toggle(host);
            return true;
        }
        if !self.is_open() {
            return false;
        }

        if !host.contains(self.menu, target) {
            self.apply(host, MenuTrigger::OutsideClick);
            return false;
        }

        let on_link = host
            .query_within(self.menu, &self.link_selector)
            .into_iter()
            .any(|link| host.contains(link, target));
        if on_link {
            let mobile = host.viewport_width() <= self.breakpoint;
            self.apply(host, MenuTrigger::LinkClick { mobile });
        }
        false
    }

    /// Escape closes the menu and returns focus to the toggle.
    pub fn on_escape<H: Host + ?Sized>(&mut self, host: &mut H) -> bool {
        if self.apply(host, MenuTrigger::Escape) {
            host.focus(self.toggle);
            return true;
        }
        false
    }

    /// Tab while open is kept inside the menu. Returns true when the
    /// default must be prevented.
    pub fn on_tab<H: Host + ?Sized>(&mut self, host: &mut H, backward: bool) -> bool {
        if !self.is_open() {
            return false;
        }
        FocusTrapContext::compute(host, self.menu).handle_tab(host, backward)
    }

    pub fn on_resize<H: Host + ?Sized>(&mut self, host: &mut H) {
        self.resize
            .trigger(host, |generation| TimerTask::ResizeSettled { generation });
    }

    /// Handle a timer owned by the menu. Returns false for foreign tasks.
    pub fn on_timer<H: Host + ?Sized>(&mut self, host: &mut H, task: TimerTask) -> bool {
        match task {
            TimerTask::ResizeSettled { generation } => {
                if self.resize.settle(generation) {
                    let desktop = host.viewport_width() > self.breakpoint;
                    self.apply(host, MenuTrigger::ResizeSettled { desktop });
                }
                true
            }
            TimerTask::MenuItemEnter { generation, index } => {
                if self.is_open() && generation == self.generation {
                    if let Some(item) = self.applied.items.get(index) {
                        host.add_class(*item, &self.entered_class);
                    }
                }
                true
            }
            _ => false,
        }
    }

    /// Close and drop pending work.
    pub fn detach<H: Host + ?Sized>(&mut self, host: &mut H) {
        self.close(host);
        self.resize.cancel(host);
    }

    fn apply<H: Host + ?Sized>(&mut self, host: &mut H, trigger: MenuTrigger) -> bool {
        let Some(next) = self.state.transition(trigger) else {
            return false;
        };
        tracing::debug!(?trigger, from = ?self.state, to = ?next, "menu transition");
        match next {
            MenuState::Open => self.enter_open(host),
            MenuState::Closed => self.enter_closed(host),
        }
        self.state = next;
        true
    }

    fn enter_open<H: Host + ?Sized>(&mut self, host: &mut H) {
        self.generation = self.generation.wrapping_add(1);
        let mut applied = Applied::default();

        if !host.has_class(self.menu, &self.open_class) {
            host.add_class(self.menu, &self.open_class);
            applied.menu_class = true;
        }
        host.set_attribute(self.toggle, &self.expanded_attr, "true");
        if let Some(body) = self.body {
            if !host.has_class(body, &self.scroll_lock_class) {
                host.add_class(body, &self.scroll_lock_class);
                applied.body_class = true;
            }
        }

        applied.items = host
            .query_within(self.menu, &self.item_selector)
            .into_iter()
            .filter(|item| !host.has_class(*item, &self.entered_class))
            .collect();
        for index in 0..applied.items.len() {
            let task = TimerTask::MenuItemEnter {
                generation: self.generation,
                index,
            };
            applied
                .item_timers
                .push(host.set_timeout(self.item_stagger.delay(index), task));
        }

        self.applied = applied;
    }

    fn enter_closed<H: Host + ?Sized>(&mut self, host: &mut H) {
        let applied = std::mem::take(&mut self.applied);

        for handle in applied.item_timers {
            host.clear_timer(handle);
        }
        for item in applied.items {
            host.remove_class(item, &self.entered_class);
        }
        if applied.menu_class {
            host.remove_class(self.menu, &self.open_class);
        }
        host.set_attribute(self.toggle, &self.expanded_attr, "false");
        if let (true, Some(body)) = (applied.body_class, self.body) {
            host.remove_class(body, &self.scroll_lock_class);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Document, MemoryHost};

    struct Page {
        host: MemoryHost,
        toggle: NodeId,
        menu: NodeId,
        items: Vec<NodeId>,
        links: Vec<NodeId>,
    }

    fn page() -> Page {
        let mut host = MemoryHost::new();
        let header = host.append_with(0, "header", &[("class", "site-header")]);
        let toggle = host.append_with(header, "button", &[("class", "menu-toggle")]);
        let menu = host.append_with(header, "ul", &[("id", "primary-menu")]);
        let mut items = Vec::new();
        let mut links = Vec::new();
        for href in ["#home", "#classes", "#contact"] {
            let li = host.append(menu, "li");
            links.push(host.append_with(li, "a", &[("href", href)]));
            items.push(li);
        }
        Page {
            host,
            toggle,
            menu,
            items,
            links,
        }
    }

    fn attach(page: &mut Page) -> MenuController {
        MenuController::attach(&mut page.host, &PageflowConfig::default()).unwrap()
    }

    #[test]
    fn test_attach_requires_both_elements() {
        let mut host = MemoryHost::new();
        host.append_with(0, "button", &[("class", "menu-toggle")]);
        assert!(MenuController::attach(&mut host, &PageflowConfig::default()).is_none());
    }

    #[test]
    fn test_attach_marks_collapsed() {
        let mut page = page();
        attach(&mut page);
        assert_eq!(
            page.host.attribute(page.toggle, "aria-expanded").as_deref(),
            Some("false")
        );
    }

    #[test]
    fn test_open_applies_markers() {
        let mut page = page();
        let mut menu = attach(&mut page);

        assert!(menu.open(&mut page.host));
        assert!(page.host.has_class(page.menu, "is-open"));
        assert!(page.host.has_class(0, "menu-open"));
        assert_eq!(
            page.host.attribute(page.toggle, "aria-expanded").as_deref(),
            Some("true")
        );
    }

    #[test]
    fn test_open_is_idempotent() {
        let mut page = page();
        let mut menu = attach(&mut page);

        menu.open(&mut page.host);
        let timers = page.host.pending_timers();
        let snapshot = page.host.snapshot(page.menu);

        assert!(!menu.open(&mut page.host));
        assert_eq!(page.host.pending_timers(), timers);
        assert_eq!(page.host.snapshot(page.menu), snapshot);
    }

    #[test]
    fn test_close_while_closed_is_noop() {
        let mut page = page();
        let mut menu = attach(&mut page);
        assert!(!menu.close(&mut page.host));
        assert_eq!(menu.state(), MenuState::Closed);
    }

    #[test]
    fn test_items_enter_staggered() {
        let mut page = page();
        let mut menu = attach(&mut page);
        menu.open(&mut page.host);
        assert_eq!(page.host.pending_timers(), page.items.len());

        menu.on_timer(
            &mut page.host,
            TimerTask::MenuItemEnter {
                generation: 1,
                index: 1,
            },
        );
        assert!(page.host.has_class(page.items[1], "is-entered"));
        assert!(!page.host.has_class(page.items[0], "is-entered"));
    }

    #[test]
    fn test_stale_item_timer_ignored_after_close() {
        let mut page = page();
        let mut menu = attach(&mut page);
        menu.open(&mut page.host);
        menu.close(&mut page.host);

        assert_eq!(page.host.pending_timers(), 0);
        menu.on_timer(
            &mut page.host,
            TimerTask::MenuItemEnter {
                generation: 1,
                index: 0,
            },
        );
        assert!(!page.host.has_class(page.items[0], "is-entered"));
    }

    #[test]
    fn test_close_preserves_preexisting_markers() {
        let mut page = page();
        page.host.add_class(0, "menu-open");
        let mut menu = attach(&mut page);

        menu.open(&mut page.host);
        menu.close(&mut page.host);
        assert!(page.host.has_class(0, "menu-open"));
    }

    #[test]
    fn test_toggle_click_consumed() {
        let mut page = page();
        let mut menu = attach(&mut page);
        assert!(menu.on_click(&mut page.host, page.toggle));
        assert!(menu.is_open());
        assert!(menu.on_click(&mut page.host, page.toggle));
        assert!(!menu.is_open());
    }

    #[test]
    fn test_link_click_gated_by_breakpoint() {
        let mut page = page();
        let mut menu = attach(&mut page);

        page.host.set_viewport_width(1200.0);
        menu.open(&mut page.host);
        menu.on_click(&mut page.host, page.links[0]);
        assert!(menu.is_open());

        page.host.set_viewport_width(700.0);
        menu.on_click(&mut page.host, page.links[0]);
        assert!(!menu.is_open());
    }

    #[test]
    fn test_click_inside_menu_off_link_keeps_open() {
        let mut page = page();
        let mut menu = attach(&mut page);
        page.host.set_viewport_width(700.0);
        menu.open(&mut page.host);
        menu.on_click(&mut page.host, page.items[2]);
        assert!(menu.is_open());
    }

    #[test]
    fn test_escape_returns_focus() {
        let mut page = page();
        let mut menu = attach(&mut page);
        menu.open(&mut page.host);
        page.host.focus(page.links[1]);

        assert!(menu.on_escape(&mut page.host));
        assert!(!menu.is_open());
        assert_eq!(page.host.active_element(), Some(page.toggle));
        assert!(!menu.on_escape(&mut page.host));
    }

    #[test]
    fn test_tab_ignored_while_closed() {
        let mut page = page();
        let mut menu = attach(&mut page);
        page.host.focus(page.links[2]);
        assert!(!menu.on_tab(&mut page.host, false));
        assert_eq!(page.host.active_element(), Some(page.links[2]));
    }
}
