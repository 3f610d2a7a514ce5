//! Collision detection and scoring
//!
//! Runs once per step, in a fixed order: playfield bounds, obstacles,
//! obstacle scoring, then power-up collection. Entities are visited in
//! creation order and the first overlapping power-up wins.

use glam::Vec2;

use super::powerup;
use super::state::SimulationState;
use crate::consts::FIELD_HEIGHT;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Strict overlap: touching edges do not count
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.max.x > other.min.x
            && self.min.x < other.max.x
            && self.max.y > other.min.y
            && self.min.y < other.max.y
    }

    /// Horizontal spans overlap (strictly)
    pub fn overlaps_x(&self, min_x: f32, max_x: f32) -> bool {
        self.max.x > min_x && self.min.x < max_x
    }
}

/// What ended the run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Actor left the playfield vertically
    Boundary,
    /// Actor hit the obstacle with this ID
    Obstacle { id: u32 },
}

/// Result of a collision pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionResult {
    Clear,
    Terminated(Termination),
}

/// Run every collision and scoring rule for this step
pub fn resolve(state: &mut SimulationState) -> CollisionResult {
    if let Some(t) = check_boundary(state) {
        return CollisionResult::Terminated(t);
    }
    if let Some(t) = check_obstacles(state) {
        return CollisionResult::Terminated(t);
    }
    award_passed_obstacles(state);
    collect_power_up(state);
    CollisionResult::Clear
}

/// Any part of the actor outside the playfield ends the run, unless shielded
/// (then the actor is pulled back inside and stopped).
pub fn check_boundary(state: &mut SimulationState) -> Option<Termination> {
    let actor = &mut state.actor;
    let out_of_bounds = actor.pos.y + actor.size.y > FIELD_HEIGHT || actor.pos.y < 0.0;
    if !out_of_bounds {
        return None;
    }
    if !powerup::shield_active(&state.active_power_up) {
        return Some(Termination::Boundary);
    }
    actor.pos.y = actor.pos.y.clamp(0.0, FIELD_HEIGHT - actor.size.y);
    actor.stop();
    None
}

/// The actor must be fully inside the opening of every obstacle it overlaps
/// horizontally. A shield ignores hits without moving the actor.
pub fn check_obstacles(state: &SimulationState) -> Option<Termination> {
    if powerup::shield_active(&state.active_power_up) {
        return None;
    }
    let bounds = state.actor.bounds();
    state
        .obstacles
        .iter()
        .find(|ob| {
            bounds.overlaps_x(ob.x, ob.trailing_edge())
                && (bounds.min.y < ob.top_height || bounds.max.y > ob.bottom_y())
        })
        .map(|ob| Termination::Obstacle { id: ob.id })
}

/// Score every obstacle whose trailing edge has just passed the actor.
/// Returns the points awarded.
pub fn award_passed_obstacles(state: &mut SimulationState) -> u64 {
    let actor_x = state.actor.pos.x;
    let per_obstacle = powerup::points_per_obstacle(&state.active_power_up);
    let mut points = 0;
    for ob in state.obstacles.iter_mut() {
        if !ob.scored && ob.trailing_edge() < actor_x {
            ob.scored = true;
            points += per_obstacle;
        }
    }
    if points > 0 {
        state.add_score(points);
    }
    points
}

/// Collect the first uncollected power-up the actor overlaps, if any
pub fn collect_power_up(state: &mut SimulationState) -> Option<u32> {
    let bounds = state.actor.bounds();
    let idx = state
        .power_ups
        .iter()
        .position(|p| !p.collected && bounds.overlaps(&p.bounds()))?;
    let id = state.power_ups[idx].id;
    powerup::collect(state, idx);
    Some(id)
}
