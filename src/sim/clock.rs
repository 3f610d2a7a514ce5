//! Fixed-step simulation clock
//!
//! One call to [`Clock::advance`] is one step of exactly 1/60 s. Real frame
//! time is never consulted, so a slow display slows the game down instead of
//! making it skip ahead.

use serde::{Deserialize, Serialize};

use crate::consts::STEP_SECS;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clock {
    /// Steps taken since the run started, paused steps included
    ticks: u64,
}

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance one step and return the new step number
    pub fn advance(&mut self) -> u64 {
        self.ticks += 1;
        self.ticks
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Elapsed simulated time
    pub fn elapsed_secs(&self) -> f32 {
        self.ticks as f32 * STEP_SECS
    }

    /// Elapsed simulated time, truncated to whole seconds
    pub fn whole_secs(&self) -> u64 {
        self.ticks / crate::consts::STEP_RATE as u64
    }
}
