//! Touch feedback for hover-styled cards
//!
//! Touch screens have no hover, so cards get a touched marker while a
//! finger is down and for a short while after it lifts.

use std::collections::BTreeMap;

use crate::config::PageflowConfig;
use crate::host::Host;
use crate::types::{NodeId, TimerHandle, TimerTask};

pub struct TouchFeedback {
    cards: Vec<NodeId>,
    class: String,
    release_ms: u32,
    releases: BTreeMap<NodeId, TimerHandle>,
}

impl TouchFeedback {
    /// `None` on hosts without touch support.
    pub fn attach<H: Host + ?Sized>(host: &mut H, config: &PageflowConfig) -> Option<Self> {
        if !host.supports_touch() {
            return None;
        }
        Some(Self {
            cards: host.query_all(&config.selectors.touch_card),
            class: config.markers.touched_class.clone(),
            release_ms: config.timings.touch_release_ms,
            releases: BTreeMap::new(),
        })
    }

    fn card_for<H: Host + ?Sized>(&self, host: &H, target: NodeId) -> Option<NodeId> {
        self.cards
            .iter()
            .copied()
            .find(|card| host.contains(*card, target))
    }

    pub fn on_touch_start<H: Host + ?Sized>(&mut self, host: &mut H, target: NodeId) {
        let Some(card) = self.card_for(host, target) else {
            return;
        };
        if let Some(handle) = self.releases.remove(&card) {
            host.clear_timer(handle);
        }
        host.add_class(card, &self.class);
    }

    pub fn on_touch_end<H: Host + ?Sized>(&mut self, host: &mut H, target: NodeId) {
        let Some(card) = self.card_for(host, target) else {
            return;
        };
        if let Some(handle) = self.releases.remove(&card) {
            host.clear_timer(handle);
        }
        let handle = host.set_timeout(self.release_ms, TimerTask::TouchRelease { node: card });
        self.releases.insert(card, handle);
    }

    pub fn on_timer<H: Host + ?Sized>(&mut self, host: &mut H, task: TimerTask) -> bool {
        let TimerTask::TouchRelease { node } = task else {
            return false;
        };
        self.releases.remove(&node);
        host.remove_class(node, &self.class);
        true
    }

    pub fn detach<H: Host + ?Sized>(&mut self, host: &mut H) {
        for (card, handle) in std::mem::take(&mut self.releases) {
            host.clear_timer(handle);
            host.remove_class(card, &self.class);
        }
    }
}
