//! Bounded history of whole-simulation snapshots
//!
//! One [`Snapshot`] is recorded per unpaused step, after collisions have been
//! resolved. The buffer keeps the most recent `capacity` of them and drops
//! the oldest first. Snapshots own their entity lists outright, so mutating
//! the live lists can never alter recorded history.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::state::{Obstacle, PowerUp, SimulationState};

/// Recorded state at one step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Clock step at which this snapshot was taken
    pub step: u64,
    pub actor_y: f32,
    pub actor_vel: f32,
    pub score: u64,
    pub obstacles: Vec<Obstacle>,
    pub power_ups: Vec<PowerUp>,
}

impl Snapshot {
    pub fn capture(state: &SimulationState) -> Self {
        Self {
            step: state.clock.ticks(),
            actor_y: state.actor.pos.y,
            actor_vel: state.actor.vel,
            score: state.score,
            obstacles: state.obstacles.clone(),
            power_ups: state.power_ups.clone(),
        }
    }
}

/// FIFO ring of snapshots, oldest at the front
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    entries: VecDeque<Snapshot>,
    capacity: usize,
}

impl HistoryBuffer {
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "HistoryBuffer capacity must be > 0");
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a snapshot, returning the evicted oldest one when full
    pub fn push(&mut self, snapshot: Snapshot) -> Option<Snapshot> {
        debug_assert!(
            self.entries.back().is_none_or(|last| last.step < snapshot.step),
            "snapshots must be appended in increasing step order"
        );
        let evicted = if self.entries.len() == self.capacity {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(snapshot);
        evicted
    }

    /// The furthest point a rewind can reach
    pub fn oldest(&self) -> Option<&Snapshot> {
        self.entries.front()
    }

    pub fn latest(&self) -> Option<&Snapshot> {
        self.entries.back()
    }

    /// Snapshot recorded `steps_back` appends before the latest one
    pub fn steps_ago(&self, steps_back: usize) -> Option<&Snapshot> {
        let idx = self.entries.len().checked_sub(steps_back + 1)?;
        self.entries.get(idx)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Snapshot> {
        self.entries.iter()
    }
}
