//! Smooth in-page anchor navigation
//!
//! Intercepts clicks on `#fragment` links, scrolls smoothly to the target
//! with the fixed header's height subtracted, then replaces the address
//! fragment without a second jump.

use crate::config::PageflowConfig;
use crate::host::Host;
use crate::types::NodeId;

pub struct AnchorNavigator {
    header_selector: String,
    header_fallback: f64,
}

impl AnchorNavigator {
    pub fn new(config: &PageflowConfig) -> Self {
        Self {
            header_selector: config.selectors.header.clone(),
            header_fallback: config.layout.header_fallback_px,
        }
    }

    /// Fragment of the in-page link enclosing `target`, if any.
    /// Empty and bare `#` fragments are not navigation targets.
    pub fn fragment_for<H: Host + ?Sized>(host: &H, target: NodeId) -> Option<String> {
        let link = host.closest_tag(target, "a")?;
        let href = host.attribute(link, "href")?;
        if !href.starts_with('#') || href == "#" {
            return None;
        }
        Some(href)
    }

    /// Rendered header height, or the fallback when there is no header or
    /// it does not render.
    pub fn header_height<H: Host + ?Sized>(&self, host: &H) -> f64 {
        host.query(&self.header_selector)
            .map(|header| host.offset_height(header))
            .filter(|height| *height > 0.0)
            .unwrap_or(self.header_fallback)
    }

    /// Document offset to scroll to so `element` sits just below the header
    pub fn scroll_target<H: Host + ?Sized>(&self, host: &H, element: NodeId) -> f64 {
        host.client_top(element) + host.scroll_y() - self.header_height(host)
    }

    /// Handle a click. Returns true when navigation was taken over and the
    /// default must be prevented.
    pub fn on_click<H: Host + ?Sized>(&self, host: &mut H, target: NodeId) -> bool {
        let Some(href) = Self::fragment_for(host, target) else {
            return false;
        };
        let Some(element) = host.element_by_id(&href[1..]) else {
            tracing::trace!(%href, "anchor target not found");
            return false;
        };

        let top = self.scroll_target(host, element);
        tracing::debug!(%href, top, "smooth scroll");
        host.smooth_scroll_to(top);
        host.replace_fragment(&href);
        true
    }
}
