//! Lazy image loader
//!
//! Swaps a deferred source into `src` the first time an image intersects
//! the viewport. Without intersection support images are left alone and
//! load through their default behaviour.

use std::collections::BTreeSet;

use crate::config::PageflowConfig;
use crate::host::Host;
use crate::types::{NodeId, ObserverOptions, Watcher};

pub struct LazyImageLoader {
    deferred_attr: String,
    pending: BTreeSet<NodeId>,
}

impl LazyImageLoader {
    /// Register every image carrying the deferred source attribute.
    /// Returns `None` when the host has no intersection support.
    pub fn attach<H: Host + ?Sized>(host: &mut H, config: &PageflowConfig) -> Option<Self> {
        if !host.supports_intersection() {
            tracing::debug!("intersection unavailable, lazy loading disabled");
            return None;
        }

        let deferred_attr = config.markers.deferred_src_attr.clone();
        let selector = format!("img[{}]", deferred_attr);
        let options = ObserverOptions::default();
        let pending: BTreeSet<NodeId> = host
            .query_all(&selector)
            .into_iter()
            .filter(|img| host.observe(Watcher::LazyImage, *img, &options))
            .collect();
        tracing::debug!(count = pending.len(), "lazy images registered");

        Some(Self {
            deferred_attr,
            pending,
        })
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn on_intersection<H: Host + ?Sized>(&mut self, host: &mut H, img: NodeId, intersecting: bool) {
        if !intersecting || !self.pending.remove(&img) {
            return;
        }
        if let Some(src) = host.attribute(img, &self.deferred_attr) {
            tracing::trace!(img, %src, "lazy image loaded");
            host.set_attribute(img, "src", &src);
            host.remove_attribute(img, &self.deferred_attr);
        }
        host.unobserve(Watcher::LazyImage, img);
    }

    pub fn detach<H: Host + ?Sized>(&mut self, host: &mut H) {
        host.disconnect(Watcher::LazyImage);
        self.pending.clear();
    }
}
