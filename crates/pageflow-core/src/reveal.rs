//! Reveal engine
//!
//! Two triggers converge on one terminal effect, the shown marker class:
//!
//! - **Load stagger**: on ready, elements matching the load selector are
//!   tagged with the animate attribute, then revealed in document order
//!   after a settle delay, `step` ms apart.
//! - **Scroll**: every tagged element is registered with the reveal watcher
//!   and revealed on its first intersecting notification.
//!
//! Revealing is fire-once: a revealed element is unregistered and every
//! later notification or stagger tick for it is a no-op.

use std::collections::BTreeSet;

use crate::config::PageflowConfig;
use crate::host::Host;
use crate::timing::StaggerPolicy;
use crate::types::{NodeId, ObserverOptions, TimerHandle, TimerTask, Watcher};

/// Reveal engine state
pub struct RevealEngine {
    load_selector: String,
    animate_attr: String,
    shown_class: String,
    settle_ms: u32,
    stagger: StaggerPolicy,
    options: ObserverOptions,
    /// Load-stagger targets, in document order
    staged: Vec<NodeId>,
    /// Elements currently registered with the reveal watcher
    observed: BTreeSet<NodeId>,
    timers: Vec<TimerHandle>,
    started: bool,
}

impl RevealEngine {
    pub fn new(config: &PageflowConfig) -> Self {
        Self {
            load_selector: config.selectors.load_reveal.clone(),
            animate_attr: config.markers.animate_attr.clone(),
            shown_class: config.markers.shown_class.clone(),
            settle_ms: config.timings.reveal_settle_ms,
            stagger: StaggerPolicy::new(config.timings.reveal_step_ms),
            options: config.reveal_observer.options(),
            staged: Vec::new(),
            observed: BTreeSet::new(),
            timers: Vec::new(),
            started: false,
        }
    }

    /// Run both modes. Only the first call has any effect.
    pub fn start<H: Host + ?Sized>(&mut self, host: &mut H) {
        if self.started {
            return;
        }
        self.started = true;
        self.start_load_stagger(host);
        self.start_scroll(host);
    }

    fn start_load_stagger<H: Host + ?Sized>(&mut self, host: &mut H) {
        self.staged = host.query_all(&self.load_selector);
        if self.staged.is_empty() {
            return;
        }
        for node in &self.staged {
            if !host.has_attribute(*node, &self.animate_attr) {
                host.set_attribute(*node, &self.animate_attr, "");
            }
        }
        tracing::debug!(count = self.staged.len(), "load stagger scheduled");
        self.timers
            .push(host.set_timeout(self.settle_ms, TimerTask::RevealSettle));
    }

    fn start_scroll<H: Host + ?Sized>(&mut self, host: &mut H) {
        if !host.supports_intersection() {
            tracing::debug!("intersection unavailable, scroll reveal disabled");
            return;
        }
        let selector = format!("[{}]", self.animate_attr);
        for node in host.query_all(&selector) {
            if self.is_revealed(host, node) || self.observed.contains(&node) {
                continue;
            }
            if host.observe(Watcher::Reveal, node, &self.options) {
                self.observed.insert(node);
            }
        }
        tracing::debug!(count = self.observed.len(), "scroll reveal observing");
    }

    pub fn is_revealed<H: Host + ?Sized>(&self, host: &H, node: NodeId) -> bool {
        host.has_class(node, &self.shown_class)
    }

    /// Mark `node` shown and stop watching it. Returns false when it was
    /// already shown.
    pub fn reveal<H: Host + ?Sized>(&mut self, host: &mut H, node: NodeId) -> bool {
        if self.observed.remove(&node) {
            host.unobserve(Watcher::Reveal, node);
        }
        if self.is_revealed(host, node) {
            return false;
        }
        tracing::trace!(node, "reveal");
        host.add_class(node, &self.shown_class);
        true
    }

    pub fn on_intersection<H: Host + ?Sized>(&mut self, host: &mut H, node: NodeId, intersecting: bool) {
        if intersecting && self.observed.contains(&node) {
            self.reveal(host, node);
        }
    }

    /// Handle a timer owned by the engine. Returns false for foreign tasks.
    pub fn on_timer<H: Host + ?Sized>(&mut self, host: &mut H, task: TimerTask) -> bool {
        match task {
            TimerTask::RevealSettle => {
                self.timers.clear();
                for index in 0..self.staged.len() {
                    let delay = self.stagger.delay(index);
                    self.timers
                        .push(host.set_timeout(delay, TimerTask::RevealStagger { index }));
                }
                true
            }
            TimerTask::RevealStagger { index } => {
                if let Some(node) = self.staged.get(index).copied() {
                    self.reveal(host, node);
                }
                true
            }
            _ => false,
        }
    }

    /// Number of elements still registered with the watcher
    pub fn observed_count(&self) -> usize {
        self.observed.len()
    }

    /// Cancel pending stagger ticks and release the watcher.
    pub fn detach<H: Host + ?Sized>(&mut self, host: &mut H) {
        for handle in self.timers.drain(..) {
            host.clear_timer(handle);
        }
        if !self.observed.is_empty() {
            host.disconnect(Watcher::Reveal);
            self.observed.clear();
        }
        self.staged.clear();
        self.started = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Document, MemoryHost};

    fn engine() -> RevealEngine {
        RevealEngine::new(&PageflowConfig::default())
    }

    #[test]
    fn test_load_targets_get_animate_marker() {
        let mut host = MemoryHost::new();
        let hero = host.append_with(0, "div", &[("class", "hero-left")]);
        let plain = host.append(0, "div");
        let mut engine = engine();

        engine.start(&mut host);
        assert!(host.has_attribute(hero, "data-animate"));
        assert!(!host.has_attribute(plain, "data-animate"));
        assert!(host.is_observed(Watcher::Reveal, hero));
    }

    #[test]
    fn test_start_is_idempotent() {
        let mut host = MemoryHost::new();
        host.append_with(0, "section", &[("class", "section")]);
        let mut engine = engine();

        engine.start(&mut host);
        let timers = host.pending_timers();
        engine.start(&mut host);
        assert_eq!(host.pending_timers(), timers);
        assert_eq!(engine.observed_count(), 1);
    }

    #[test]
    fn test_reveal_unregisters() {
        let mut host = MemoryHost::new();
        let card = host.append_with(0, "div", &[("data-animate", "")]);
        let mut engine = engine();
        engine.start(&mut host);

        engine.on_intersection(&mut host, card, false);
        assert!(!host.has_class(card, "show"));

        engine.on_intersection(&mut host, card, true);
        assert!(host.has_class(card, "show"));
        assert!(!host.is_observed(Watcher::Reveal, card));
        assert!(!engine.reveal(&mut host, card));
    }

    #[test]
    fn test_observer_options() {
        let mut host = MemoryHost::new();
        host.append_with(0, "div", &[("data-animate", "")]);
        let mut engine = engine();
        engine.start(&mut host);

        let options = host.observer_options(Watcher::Reveal).unwrap();
        assert_eq!(options.root_margin, "0px 0px -50px 0px");
    }

    #[test]
    fn test_already_shown_not_observed() {
        let mut host = MemoryHost::new();
        let card = host.append_with(0, "div", &[("data-animate", ""), ("class", "show")]);
        let mut engine = engine();
        engine.start(&mut host);
        assert!(!host.is_observed(Watcher::Reveal, card));
    }

    #[test]
    fn test_no_intersection_still_staggers() {
        let mut host = MemoryHost::without_intersection();
        let hero = host.append_with(0, "div", &[("class", "hero-right")]);
        let mut engine = engine();
        engine.start(&mut host);

        assert_eq!(engine.observed_count(), 0);
        engine.on_timer(&mut host, TimerTask::RevealSettle);
        engine.on_timer(&mut host, TimerTask::RevealStagger { index: 0 });
        assert!(host.has_class(hero, "show"));
    }
}
