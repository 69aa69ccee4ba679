//! Controller configuration
//!
//! One canonical set of selectors, marker names and timings. Every field has
//! a default so a page can override only what differs from its markup.

use serde::{Deserialize, Serialize};

use crate::error::{PageflowError, PageflowResult};
use crate::types::ObserverOptions;

/// Selectors for the elements the controller operates on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selectors {
    pub menu_toggle: String,
    pub menu: String,
    pub menu_item: String,
    pub menu_link: String,
    pub header: String,
    /// Elements tagged for load-stagger reveal
    pub load_reveal: String,
    pub slider_image: String,
    pub touch_card: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            menu_toggle: String::from(".menu-toggle"),
            menu: String::from("#primary-menu"),
            menu_item: String::from("li"),
            menu_link: String::from("a"),
            header: String::from(".site-header"),
            load_reveal: String::from(
                ".hero-left, .hero-right, .section, .class-card, .tutor-card, .testi-card, .contact-card",
            ),
            slider_image: String::from(".why-media .big-photo img"),
            touch_card: String::from(".class-card, .tutor-card, .testi-card, .contact-card"),
        }
    }
}

/// Attribute and class names read from and written to the document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Markers {
    /// Attribute tagging elements for scroll reveal
    pub animate_attr: String,
    /// Attribute holding a deferred image source
    pub deferred_src_attr: String,
    pub expanded_attr: String,
    pub shown_class: String,
    pub menu_open_class: String,
    pub scroll_lock_class: String,
    pub item_entered_class: String,
    pub slide_class: String,
    pub slide_active_class: String,
    pub slider_frame_class: String,
    pub header_scrolled_class: String,
    pub touched_class: String,
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            animate_attr: String::from("data-animate"),
            deferred_src_attr: String::from("data-src"),
            expanded_attr: String::from("aria-expanded"),
            shown_class: String::from("show"),
            menu_open_class: String::from("is-open"),
            scroll_lock_class: String::from("menu-open"),
            item_entered_class: String::from("is-entered"),
            slide_class: String::from("slide"),
            slide_active_class: String::from("is-active"),
            slider_frame_class: String::from("slider-frame"),
            header_scrolled_class: String::from("is-scrolled"),
            touched_class: String::from("is-touched"),
        }
    }
}

/// Timing constants, all in milliseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    pub menu_item_step_ms: u32,
    pub resize_debounce_ms: u32,
    pub reveal_settle_ms: u32,
    pub reveal_step_ms: u32,
    pub slider_interval_ms: u32,
    pub touch_release_ms: u32,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            menu_item_step_ms: 50,
            resize_debounce_ms: 250,
            reveal_settle_ms: 100,
            reveal_step_ms: 80,
            slider_interval_ms: 4000,
            touch_release_ms: 300,
        }
    }
}

/// Layout thresholds, in CSS pixels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Layout {
    /// Widths at or below this are the mobile layout
    pub mobile_breakpoint_px: f64,
    /// Header height used when no header renders
    pub header_fallback_px: f64,
    /// Scroll offset past which the header gets its shadow
    pub header_shadow_offset_px: f64,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            mobile_breakpoint_px: 980.0,
            header_fallback_px: 60.0,
            header_shadow_offset_px: 50.0,
        }
    }
}

/// Full controller configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageflowConfig {
    pub selectors: Selectors,
    pub markers: Markers,
    pub timings: Timings,
    pub layout: Layout,
    /// Options for the scroll reveal watcher
    pub reveal_observer: RevealObserver,
}

/// Scroll reveal watcher settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealObserver {
    pub threshold: f64,
    /// Negative values fire before the element reaches the viewport edge
    pub bottom_margin_px: f64,
}

impl Default for RevealObserver {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            bottom_margin_px: -50.0,
        }
    }
}

impl RevealObserver {
    /// Observer options as handed to the host
    pub fn options(&self) -> ObserverOptions {
        ObserverOptions {
            threshold: self.threshold,
            root_margin: format!("0px 0px {}px 0px", self.bottom_margin_px),
        }
    }
}

impl PageflowConfig {
    /// Parse a (possibly partial) JSON configuration and validate it.
    pub fn from_json(json: &str) -> PageflowResult<Self> {
        let config: PageflowConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the controller cannot run with.
    pub fn validate(&self) -> PageflowResult<()> {
        if self.timings.slider_interval_ms == 0 {
            return Err(PageflowError::InvalidConfig {
                field: "timings.slider_interval_ms",
                reason: "must be greater than zero",
            });
        }
        if !(0.0..=1.0).contains(&self.reveal_observer.threshold) {
            return Err(PageflowError::InvalidConfig {
                field: "reveal_observer.threshold",
                reason: "must be within 0.0..=1.0",
            });
        }
        if self.layout.mobile_breakpoint_px <= 0.0 {
            return Err(PageflowError::InvalidConfig {
                field: "layout.mobile_breakpoint_px",
                reason: "must be positive",
            });
        }
        Ok(())
    }
}
