//! Header shadow on scroll

use crate::config::PageflowConfig;
use crate::host::Host;
use crate::types::NodeId;

/// Toggles the scrolled marker on the site header
pub struct HeaderShadow {
    header: NodeId,
    offset: f64,
    class: String,
}

impl HeaderShadow {
    /// `None` when the page has no header.
    pub fn attach<H: Host + ?Sized>(host: &mut H, config: &PageflowConfig) -> Option<Self> {
        let header = host.query(&config.selectors.header)?;
        let shadow = Self {
            header,
            offset: config.layout.header_shadow_offset_px,
            class: config.markers.header_scrolled_class.clone(),
        };
        shadow.on_scroll(host);
        Some(shadow)
    }

    pub fn on_scroll<H: Host + ?Sized>(&self, host: &mut H) {
        if host.scroll_y() > self.offset {
            host.add_class(self.header, &self.class);
        } else {
            host.remove_class(self.header, &self.class);
        }
    }

    pub fn detach<H: Host + ?Sized>(self, host: &mut H) {
        host.remove_class(self.header, &self.class);
    }
}
