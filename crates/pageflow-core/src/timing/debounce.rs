//! Trailing-edge debounce
//!
//! Each trigger cancels the previously scheduled timer and bumps a
//! generation. A settle notification is acted on only when its generation
//! is the latest one.

use crate::host::Environment;
use crate::types::{TimerHandle, TimerTask};

/// Debounce state for one event source
#[derive(Clone, Debug, Default)]
pub struct Debouncer {
    quiet_ms: u32,
    generation: u32,
    pending: Option<TimerHandle>,
}

impl Debouncer {
    pub fn new(quiet_ms: u32) -> Self {
        Self {
            quiet_ms,
            generation: 0,
            pending: None,
        }
    }

    /// Record a trigger: cancel the pending settle and schedule a new one
    /// built by `task` from the new generation.
    pub fn trigger<E, F>(&mut self, env: &mut E, task: F)
    where
        E: Environment + ?Sized,
        F: FnOnce(u32) -> TimerTask,
    {
        if let Some(handle) = self.pending.take() {
            env.clear_timer(handle);
        }
        self.generation = self.generation.wrapping_add(1);
        self.pending = Some(env.set_timeout(self.quiet_ms, task(self.generation)));
    }

    /// Accept a settle notification. Returns true only for the latest
    /// generation, and only once.
    pub fn settle(&mut self, generation: u32) -> bool {
        if generation != self.generation || self.pending.is_none() {
            return false;
        }
        self.pending = None;
        true
    }

    /// Drop any pending settle
    pub fn cancel<E: Environment + ?Sized>(&mut self, env: &mut E) {
        if let Some(handle) = self.pending.take() {
            env.clear_timer(handle);
        }
    }
}
