//! Image sizing guard
//!
//! After load, images that know their natural height but have no inline
//! height get `height: auto`, so late-decoding images do not shift layout.

use crate::host::Host;

/// Apply the guard to every image. Returns how many images were changed.
pub fn apply_image_sizing<H: Host + ?Sized>(host: &mut H) -> usize {
    let mut changed = 0;
    for img in host.query_all("img") {
        let explicit = host.style(img, "height").is_some_and(|h| !h.is_empty());
        if !explicit && host.natural_height(img) > 0.0 {
            host.set_style(img, "height", "auto");
            changed += 1;
        }
    }
    if changed > 0 {
        tracing::debug!(changed, "image heights set to auto");
    }
    changed
}
