//! Crossfade slider
//!
//! Cycles the active marker through a sequence of images on a fixed
//! interval. The styling layer turns the marker into an opacity transition:
//!
//! - every image carries the slide marker (stacked, zero opacity)
//! - the current image also carries the active marker (full opacity)
//! - the shared wrapper carries the frame marker (positioning context)
//!
//! Moving the active marker from one image to the next is the crossfade.

use crate::config::PageflowConfig;
use crate::host::Host;
use crate::types::{NodeId, TimerHandle, TimerTask};

/// Minimum number of images for the slider to run
pub const MIN_SLIDES: usize = 2;

/// Ordered images and the index of the visible one
///
/// Invariant: `current < images.len()` whenever `images` is non-empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SliderState {
    images: Vec<NodeId>,
    current: usize,
}

impl SliderState {
    /// `None` when there are fewer than [`MIN_SLIDES`] images.
    pub fn new(images: Vec<NodeId>) -> Option<Self> {
        (images.len() >= MIN_SLIDES).then_some(Self { images, current: 0 })
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn images(&self) -> &[NodeId] {
        &self.images
    }

    /// Step circularly. Returns `(outgoing, incoming)`.
    pub fn advance(&mut self) -> (NodeId, NodeId) {
        let outgoing = self.images[self.current];
        self.current = (self.current + 1) % self.images.len();
        (outgoing, self.images[self.current])
    }
}

/// Running crossfade slider
pub struct CrossfadeSlider {
    state: SliderState,
    interval: TimerHandle,
    slide_class: String,
    active_class: String,
    frame_class: String,
    frame: Option<NodeId>,
}

impl CrossfadeSlider {
    /// Find the images and start the interval. Returns `None`, touching
    /// nothing, when fewer than two images match.
    pub fn attach<H: Host + ?Sized>(host: &mut H, config: &PageflowConfig) -> Option<Self> {
        let images = host.query_all(&config.selectors.slider_image);
        let Some(state) = SliderState::new(images) else {
            tracing::debug!("slider not started: fewer than {} images", MIN_SLIDES);
            return None;
        };

        let markers = &config.markers;
        for (i, image) in state.images().iter().enumerate() {
            host.add_class(*image, &markers.slide_class);
            if i == 0 {
                host.add_class(*image, &markers.slide_active_class);
            } else {
                host.remove_class(*image, &markers.slide_active_class);
            }
        }
        let frame = host.parent(state.images()[0]);
        if let Some(frame) = frame {
            host.add_class(frame, &markers.slider_frame_class);
        }

        let interval = host.set_interval(config.timings.slider_interval_ms, TimerTask::SliderAdvance);
        tracing::debug!(images = state.images().len(), "slider started");

        Some(Self {
            state,
            interval,
            slide_class: markers.slide_class.clone(),
            active_class: markers.slide_active_class.clone(),
            frame_class: markers.slider_frame_class.clone(),
            frame,
        })
    }

    pub fn state(&self) -> &SliderState {
        &self.state
    }

    /// Fade the current image out and the next one in.
    pub fn advance<H: Host + ?Sized>(&mut self, host: &mut H) {
        let (outgoing, incoming) = self.state.advance();
        host.remove_class(outgoing, &self.active_class);
        host.add_class(incoming, &self.active_class);
    }

    pub fn on_timer<H: Host + ?Sized>(&mut self, host: &mut H, task: TimerTask) -> bool {
        if task != TimerTask::SliderAdvance {
            return false;
        }
        self.advance(host);
        true
    }

    /// Stop the interval and remove the slider markers.
    pub fn detach<H: Host + ?Sized>(self, host: &mut H) {
        host.clear_timer(self.interval);
        for image in self.state.images() {
            host.remove_class(*image, &self.slide_class);
            host.remove_class(*image, &self.active_class);
        }
        if let Some(frame) = self.frame {
            host.remove_class(frame, &self.frame_class);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Document, MemoryHost};

    fn gallery(count: usize) -> (MemoryHost, NodeId, Vec<NodeId>) {
        let mut host = MemoryHost::new();
        let media = host.append_with(0, "div", &[("class", "why-media")]);
        let photo = host.append_with(media, "div", &[("class", "big-photo")]);
        let images = (0..count).map(|_| host.append(photo, "img")).collect();
        (host, photo, images)
    }

    #[test]
    fn test_needs_two_images() {
        let (mut host, photo, images) = gallery(1);
        assert!(CrossfadeSlider::attach(&mut host, &PageflowConfig::default()).is_none());
        assert_eq!(host.pending_timers(), 0);
        assert!(!host.has_class(images[0], "slide"));
        assert!(!host.has_class(photo, "slider-frame"));
    }

    #[test]
    fn test_initial_markers() {
        let (mut host, photo, images) = gallery(3);
        let slider = CrossfadeSlider::attach(&mut host, &PageflowConfig::default()).unwrap();

        assert_eq!(slider.state().current(), 0);
        assert!(host.has_class(photo, "slider-frame"));
        assert!(images.iter().all(|i| host.has_class(*i, "slide")));
        assert!(host.has_class(images[0], "is-active"));
        assert!(!host.has_class(images[1], "is-active"));
        assert_eq!(host.pending_timers(), 1);
    }

    #[test]
    fn test_advance_wraps() {
        let (mut host, _, images) = gallery(2);
        let mut slider = CrossfadeSlider::attach(&mut host, &PageflowConfig::default()).unwrap();

        slider.advance(&mut host);
        assert!(host.has_class(images[1], "is-active"));
        assert!(!host.has_class(images[0], "is-active"));
        slider.advance(&mut host);
        assert_eq!(slider.state().current(), 0);
        assert!(host.has_class(images[0], "is-active"));
    }

    #[test]
    fn test_detach_clears_interval() {
        let (mut host, photo, images) = gallery(2);
        let slider = CrossfadeSlider::attach(&mut host, &PageflowConfig::default()).unwrap();
        slider.detach(&mut host);
        assert_eq!(host.pending_timers(), 0);
        assert!(!host.has_class(images[0], "is-active"));
        assert!(!host.has_class(photo, "slider-frame"));
    }
}
