//! Timing policies
//!
//! Pure functions and small state holders for staggered and debounced work.
//! Neither touches a clock: callers schedule through the host and hand the
//! results back, so tests can run against a virtual clock.

mod debounce;
mod stagger;

pub use debounce::Debouncer;
pub use stagger::StaggerPolicy;
