//! Page Integration Tests
//!
//! Drives a full `PageController` over `MemoryHost` with the virtual clock.

use pageflow_core::{
    Document, Key, MemoryHost, NodeId, NodeSnapshot, PageController, PageEvent, Watcher,
};

/// A landing page with header, menu, sections, slider and lazy images.
struct LandingPage {
    host: MemoryHost,
    controller: PageController,
    toggle: NodeId,
    toggle_icon: NodeId,
    menu: NodeId,
    items: Vec<NodeId>,
    links: Vec<NodeId>,
    sections: Vec<NodeId>,
    slides: Vec<NodeId>,
    lazy: NodeId,
    outside: NodeId,
}

impl LandingPage {
    fn build(mut host: MemoryHost) -> Self {
        let header = host.append_with(0, "header", &[("class", "site-header")]);
        host.set_offset_height(header, 72.0);
        let toggle = host.append_with(header, "button", &[("class", "menu-toggle")]);
        let toggle_icon = host.append(toggle, "span");
        let menu = host.append_with(header, "ul", &[("id", "primary-menu")]);

        let mut items = Vec::new();
        let mut links = Vec::new();
        for href in ["#classes", "#tutors", "#contact"] {
            let li = host.append(menu, "li");
            links.push(host.append_with(li, "a", &[("href", href)]));
            items.push(li);
        }

        let main = host.append(0, "main");
        let mut sections = Vec::new();
        for (i, id) in ["classes", "tutors", "contact"].iter().enumerate() {
            let section = host.append_with(main, "section", &[("id", id), ("class", "section")]);
            host.set_document_top(section, 800.0 * (i as f64 + 1.0));
            sections.push(section);
        }

        let media = host.append_with(main, "div", &[("class", "why-media")]);
        let photo = host.append_with(media, "div", &[("class", "big-photo")]);
        let slides = (0..3).map(|_| host.append(photo, "img")).collect();

        let lazy = host.append_with(main, "img", &[("data-src", "/img/team.jpg")]);
        let outside = host.append(main, "p");

        Self {
            host,
            controller: PageController::default(),
            toggle,
            toggle_icon,
            menu,
            items,
            links,
            sections,
            slides,
            lazy,
            outside,
        }
    }

    fn new() -> Self {
        Self::build(MemoryHost::new())
    }

    fn start(mut self) -> Self {
        self.controller.attach(&mut self.host);
        self.host.dispatch(&mut self.controller, PageEvent::Ready);
        self
    }

    fn click(&mut self, target: NodeId) -> pageflow_core::Disposition {
        self.host.click(&mut self.controller, target)
    }

    fn advance(&mut self, ms: u64) {
        self.host.advance(&mut self.controller, ms);
    }

    fn menu_snapshot(&self) -> Vec<NodeSnapshot> {
        let mut nodes = vec![0, self.toggle, self.menu];
        nodes.extend(&self.items);
        nodes.iter().map(|n| self.host.snapshot(*n)).collect()
    }

    fn active_slides(&self) -> Vec<usize> {
        self.slides
            .iter()
            .enumerate()
            .filter(|(_, s)| self.host.has_class(**s, "is-active"))
            .map(|(i, _)| i)
            .collect()
    }
}

// ========== Menu ==========

#[test]
fn test_open_close_restores_every_marker() {
    let mut page = LandingPage::new().start();
    let before = page.menu_snapshot();

    page.click(page.toggle);
    page.advance(500);
    assert!(page.items.iter().all(|i| page.host.has_class(*i, "is-entered")));
    assert_ne!(page.menu_snapshot(), before);

    page.click(page.toggle);
    assert_eq!(page.menu_snapshot(), before);
}

#[test]
fn test_close_mid_entrance_leaves_no_residue() {
    let mut page = LandingPage::new().start();
    let before = page.menu_snapshot();

    page.click(page.toggle);
    page.advance(60);
    page.click(page.toggle);
    page.advance(500);

    assert_eq!(page.menu_snapshot(), before);
}

#[test]
fn test_open_twice_matches_open_once() {
    let mut page = LandingPage::new().start();
    page.controller.open_menu(&mut page.host);
    page.advance(500);
    let once = page.menu_snapshot();

    assert!(!page.controller.open_menu(&mut page.host));
    page.advance(500);
    assert_eq!(page.menu_snapshot(), once);
}

#[test]
fn test_menu_items_enter_staggered() {
    let mut page = LandingPage::new().start();
    page.click(page.toggle);

    let entered = |page: &LandingPage| {
        page.items
            .iter()
            .filter(|i| page.host.has_class(**i, "is-entered"))
            .count()
    };
    page.advance(0);
    assert_eq!(entered(&page), 1);
    page.advance(50);
    assert_eq!(entered(&page), 2);
    page.advance(49);
    assert_eq!(entered(&page), 2);
    page.advance(1);
    assert_eq!(entered(&page), 3);
}

#[test]
fn test_click_on_toggle_child_toggles() {
    let mut page = LandingPage::new().start();
    let disposition = page.click(page.toggle_icon);
    assert!(disposition.stop_propagation);
    assert!(page.controller.is_menu_open());
}

#[test]
fn test_outside_click_closes() {
    let mut page = LandingPage::new().start();
    page.click(page.toggle);
    page.click(page.outside);
    assert!(!page.controller.is_menu_open());
    assert_eq!(
        page.host.attribute(page.toggle, "aria-expanded").as_deref(),
        Some("false")
    );
}

#[test]
fn test_link_click_closes_only_on_mobile() {
    let mut page = LandingPage::new().start();

    page.host.set_viewport_width(1200.0);
    page.click(page.toggle);
    page.click(page.links[0]);
    assert!(page.controller.is_menu_open());

    page.host.set_viewport_width(700.0);
    page.click(page.links[0]);
    assert!(!page.controller.is_menu_open());
}

#[test]
fn test_link_click_at_breakpoint_is_mobile() {
    let mut page = LandingPage::new().start();

    page.host.set_viewport_width(981.0);
    page.click(page.toggle);
    page.click(page.links[1]);
    assert!(page.controller.is_menu_open());

    page.host.set_viewport_width(980.0);
    page.click(page.links[1]);
    assert!(!page.controller.is_menu_open());
}

#[test]
fn test_mobile_link_click_also_scrolls() {
    let mut page = LandingPage::new().start();
    page.host.set_viewport_width(700.0);
    page.click(page.toggle);

    let disposition = page.click(page.links[2]);
    assert!(disposition.prevent_default);
    assert!(!page.controller.is_menu_open());
    assert_eq!(page.host.scroll_requests(), &[2400.0 - 72.0]);
    assert_eq!(page.host.fragment(), Some("#contact"));
}

#[test]
fn test_escape_closes_and_focuses_toggle() {
    let mut page = LandingPage::new().start();
    page.click(page.toggle);
    page.host.focus(page.links[1]);

    page.host.key(&mut page.controller, Key::Escape, false);
    assert!(!page.controller.is_menu_open());
    assert_eq!(page.host.active_element(), Some(page.toggle));
}

#[test]
fn test_focus_wraps_inside_open_menu() {
    let mut page = LandingPage::new().start();
    let [a, b, c] = [page.links[0], page.links[1], page.links[2]];
    page.click(page.toggle);

    page.host.focus(c);
    assert!(page.host.key(&mut page.controller, Key::Tab, false).prevent_default);
    assert_eq!(page.host.active_element(), Some(a));

    assert!(!page.host.key(&mut page.controller, Key::Tab, false).prevent_default);
    assert_eq!(page.host.active_element(), Some(b));

    page.host.focus(a);
    assert!(page.host.key(&mut page.controller, Key::Tab, true).prevent_default);
    assert_eq!(page.host.active_element(), Some(c));
}

#[test]
fn test_focus_not_trapped_when_closed() {
    let mut page = LandingPage::new().start();
    page.host.focus(page.links[2]);
    let disposition = page.host.key(&mut page.controller, Key::Tab, false);
    assert!(!disposition.prevent_default);
    assert_ne!(page.host.active_element(), Some(page.links[0]));
}

#[test]
fn test_resize_burst_closes_once_after_quiet_period() {
    let mut page = LandingPage::new().start();
    page.host.set_viewport_width(700.0);
    page.click(page.toggle);

    for i in 0..5 {
        if i == 4 {
            page.host.set_viewport_width(1300.0);
        }
        page.host.dispatch(&mut page.controller, PageEvent::Resize);
        if i < 4 {
            page.advance(20);
        }
    }

    page.advance(249);
    assert!(page.controller.is_menu_open(), "closed before the quiet period");
    page.advance(1);
    assert!(!page.controller.is_menu_open());

    // No second evaluation is pending.
    page.controller.open_menu(&mut page.host);
    page.advance(1000);
    assert!(page.controller.is_menu_open());
}

#[test]
fn test_resize_settling_below_breakpoint_keeps_menu() {
    let mut page = LandingPage::new().start();
    page.host.set_viewport_width(700.0);
    page.click(page.toggle);

    page.host.set_viewport_width(1300.0);
    page.host.dispatch(&mut page.controller, PageEvent::Resize);
    page.advance(100);
    page.host.set_viewport_width(980.0);
    page.host.dispatch(&mut page.controller, PageEvent::Resize);
    page.advance(1000);

    assert!(page.controller.is_menu_open());
}

// ========== Reveal ==========

#[test]
fn test_load_stagger_timeline() {
    let mut page = LandingPage::new().start();
    let shown = |page: &LandingPage| {
        page.sections
            .iter()
            .filter(|s| page.host.has_class(**s, "show"))
            .count()
    };

    page.advance(99);
    assert_eq!(shown(&page), 0);
    page.advance(1);
    assert_eq!(shown(&page), 1);
    page.advance(80);
    assert_eq!(shown(&page), 2);
    page.advance(80);
    assert_eq!(shown(&page), 3);

    assert!(page
        .sections
        .iter()
        .all(|s| !page.host.is_observed(Watcher::Reveal, *s)));
}

#[test]
fn test_scroll_reveal_fires_once() {
    let mut page = LandingPage::new();
    let card = page.host.append_with(0, "div", &[("data-animate", "")]);
    let mut page = page.start();

    assert_eq!(page.host.intersect(&mut page.controller, card, true), 1);
    assert!(page.host.has_class(card, "show"));

    assert_eq!(page.host.intersect(&mut page.controller, card, false), 0);
    assert_eq!(page.host.intersect(&mut page.controller, card, true), 0);
    assert!(page.host.has_class(card, "show"));
}

#[test]
fn test_scroll_reveal_before_stagger() {
    let mut page = LandingPage::new().start();
    let last = page.sections[2];

    page.host.intersect(&mut page.controller, last, true);
    assert!(page.host.has_class(last, "show"));

    page.advance(1000);
    assert!(page.sections.iter().all(|s| page.host.has_class(*s, "show")));
}

#[test]
fn test_ready_twice_does_not_double_register() {
    let mut page = LandingPage::new().start();
    let timers = page.host.pending_timers();
    let observed = page.host.observed_count(Watcher::Reveal);

    page.host.dispatch(&mut page.controller, PageEvent::Ready);
    assert_eq!(page.host.pending_timers(), timers);
    assert_eq!(page.host.observed_count(Watcher::Reveal), observed);
}

// ========== Slider ==========

#[test]
fn test_slider_cycles_circularly() {
    let mut page = LandingPage::new().start();
    assert_eq!(page.active_slides(), vec![0]);

    let mut sequence = Vec::new();
    for _ in 0..6 {
        page.advance(4000);
        let active = page.active_slides();
        assert_eq!(active.len(), 1, "exactly one visible slide");
        sequence.push(active[0]);
    }
    assert_eq!(sequence, vec![1, 2, 0, 1, 2, 0]);
}

#[test]
fn test_slider_not_paused_by_scroll_or_resize() {
    let mut page = LandingPage::new().start();
    page.advance(3999);
    page.host.dispatch(&mut page.controller, PageEvent::Scroll);
    page.host.dispatch(&mut page.controller, PageEvent::Resize);
    page.advance(1);
    assert_eq!(page.active_slides(), vec![1]);
}

// ========== Lazy images ==========

#[test]
fn test_lazy_image_loads_on_first_intersection() {
    let mut page = LandingPage::new().start();
    assert_eq!(page.host.attribute(page.lazy, "src"), None);

    page.host.intersect(&mut page.controller, page.lazy, true);
    assert_eq!(
        page.host.attribute(page.lazy, "src").as_deref(),
        Some("/img/team.jpg")
    );
    assert!(!page.host.has_attribute(page.lazy, "data-src"));
    assert_eq!(page.host.intersect(&mut page.controller, page.lazy, true), 0);
}

#[test]
fn test_without_intersection_page_still_works() {
    let mut page = LandingPage::build(MemoryHost::without_intersection()).start();

    assert!(page.controller.lazy().is_none());
    assert!(page.host.has_attribute(page.lazy, "data-src"));
    assert_eq!(page.host.attribute(page.lazy, "src"), None);

    page.advance(1000);
    assert!(page.sections.iter().all(|s| page.host.has_class(*s, "show")));
    page.click(page.toggle);
    assert!(page.controller.is_menu_open());
}

// ========== Supplemented behaviour ==========

#[test]
fn test_header_shadow_follows_scroll() {
    let mut page = LandingPage::new().start();
    let header = page.host.query(".site-header").unwrap();

    page.host.set_scroll_y(120.0);
    page.host.dispatch(&mut page.controller, PageEvent::Scroll);
    assert!(page.host.has_class(header, "is-scrolled"));

    page.host.set_scroll_y(10.0);
    page.host.dispatch(&mut page.controller, PageEvent::Scroll);
    assert!(!page.host.has_class(header, "is-scrolled"));
}

#[test]
fn test_touch_feedback_released_after_delay() {
    let mut host = MemoryHost::new();
    host.set_touch(true);
    let card = host.append_with(0, "div", &[("class", "testi-card")]);
    let mut controller = PageController::default();
    controller.attach(&mut host);

    host.dispatch(&mut controller, PageEvent::TouchStart { target: card });
    host.dispatch(&mut controller, PageEvent::TouchEnd { target: card });
    host.advance(&mut controller, 299);
    assert!(host.has_class(card, "is-touched"));
    host.advance(&mut controller, 1);
    assert!(!host.has_class(card, "is-touched"));
}

#[test]
fn test_loaded_sizes_images() {
    let mut page = LandingPage::new().start();
    page.host.set_natural_height(page.slides[0], 600.0);
    page.host.dispatch(&mut page.controller, PageEvent::Loaded);
    assert_eq!(
        page.host.style(page.slides[0], "height").as_deref(),
        Some("auto")
    );
    assert_eq!(page.host.style(page.slides[1], "height"), None);
}
