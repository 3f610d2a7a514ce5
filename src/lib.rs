//! Flappy Rewind - a side-scrolling arcade simulation
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, spawning, collisions, rewind history)
//! - `controller`: Run lifecycle and the command/event boundary
//! - `settings`: Difficulty presets and tunables
//! - `highscores`: Completed-run records and the local leaderboard
//! - `error`: Rejection and failure types

pub mod controller;
pub mod error;
pub mod highscores;
pub mod settings;
pub mod sim;

pub use controller::RunController;
pub use error::{Rejection, SettingsError, SubmitError};
pub use highscores::{
    HighScores, RecordSink, RecordWorker, RunRecord, SubmitReply, SubmitResponse,
};
pub use settings::{Difficulty, DifficultyParams, Settings};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation rate. Every duration below is counted in steps of 1/60 s.
    pub const STEP_RATE: u32 = 60;
    /// Seconds represented by one step, regardless of real frame time
    pub const STEP_SECS: f32 = 1.0 / STEP_RATE as f32;

    /// Playfield dimensions (x grows right, y grows down)
    pub const FIELD_WIDTH: f32 = 400.0;
    pub const FIELD_HEIGHT: f32 = 600.0;

    /// Actor defaults
    pub const ACTOR_X: f32 = 80.0;
    pub const ACTOR_WIDTH: f32 = 34.0;
    pub const ACTOR_HEIGHT: f32 = 24.0;
    /// Orientation clamp in degrees
    pub const ACTOR_MIN_ANGLE: f32 = -30.0;
    pub const ACTOR_MAX_ANGLE: f32 = 90.0;

    /// Obstacle defaults
    pub const OBSTACLE_WIDTH: f32 = 52.0;
    pub const OBSTACLE_MIN_EDGE: f32 = 50.0;
    /// Entities are dropped once they are this far past the left edge
    pub const RETIRE_MARGIN: f32 = 50.0;

    /// Power-up defaults
    pub const POWER_UP_SIZE: f32 = 30.0;
    /// Horizontal offset of a power-up from its obstacle's spawn point
    pub const POWER_UP_LEAD: f32 = 100.0;
    pub const SHRINK_FACTOR: f32 = 0.6;

    /// Area-clear ability
    pub const AREA_CLEAR_RANGE: f32 = 400.0;
    pub const AREA_CLEAR_COOLDOWN_SECS: u32 = 20;
    pub const AREA_CLEAR_BASE_AWARD: u64 = 5;
    pub const AREA_CLEAR_PER_OBSTACLE: u64 = 2;

    /// Time-rewind ability
    pub const REWIND_COOLDOWN_SECS: u32 = 25;
    /// History window: 3 seconds of steps
    pub const HISTORY_CAPACITY: usize = 3 * STEP_RATE as usize;
    /// Minimum recorded history before a rewind is allowed (1 second)
    pub const REWIND_MIN_HISTORY: usize = STEP_RATE as usize;
    /// Frozen steps after a rewind (1 second)
    pub const REWIND_PAUSE_TICKS: u32 = STEP_RATE;
}

/// Convert whole seconds to simulation steps
#[inline]
pub fn secs_to_ticks(secs: u32) -> u32 {
    secs * consts::STEP_RATE
}

/// Whole seconds a countdown would display (rounded up)
#[inline]
pub fn display_secs(ticks: u32) -> u32 {
    ticks.div_ceil(consts::STEP_RATE)
}
