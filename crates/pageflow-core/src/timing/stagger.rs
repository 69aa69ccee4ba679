//! Index-based stagger delays

/// Delay policy for a sequence of items animated one after another
///
/// `delay(index) = index * step`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StaggerPolicy {
    /// Added per item, in ms
    pub step_ms: u32,
}

impl StaggerPolicy {
    pub const fn new(step_ms: u32) -> Self {
        Self { step_ms }
    }

    /// Delay for the item at `index`. Saturates instead of overflowing.
    #[inline]
    pub fn delay(&self, index: usize) -> u32 {
        let index = u32::try_from(index).unwrap_or(u32::MAX);
        index.saturating_mul(self.step_ms)
    }
}
