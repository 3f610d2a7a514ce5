//! Obstacle and power-up generation
//!
//! Obstacles appear at the right edge every `spawn_interval` unpaused steps.
//! Some carry a power-up placed in the middle of their opening, a little
//! further downrange.

use glam::Vec2;
use rand::Rng;

use super::state::{Obstacle, PowerUp, PowerUpKind, SimulationState};
use crate::consts::*;

/// Scroll every obstacle and power-up left by the run's scroll speed
pub fn advance_entities(state: &mut SimulationState) {
    let speed = state.params.scroll_speed;
    for ob in state.obstacles.iter_mut() {
        ob.x -= speed;
    }
    for p in state.power_ups.iter_mut() {
        p.pos.x -= speed;
    }
}

/// Drop entities that have moved past the left edge plus margin
pub fn retire_offscreen(state: &mut SimulationState) {
    let before = (state.obstacles.len(), state.power_ups.len());
    state
        .obstacles
        .retain(|ob| ob.trailing_edge() > -RETIRE_MARGIN);
    state.power_ups.retain(|p| p.pos.x > -RETIRE_MARGIN);
    let retired = (
        before.0 - state.obstacles.len(),
        before.1 - state.power_ups.len(),
    );
    if retired != (0, 0) {
        log::trace!(
            "Retired {} obstacles, {} power-ups",
            retired.0,
            retired.1
        );
    }
}

/// Count one unpaused step and spawn on the configured cadence
pub fn maybe_spawn(state: &mut SimulationState) -> bool {
    state.spawn_counter += 1;
    let interval = state.settings.spawn_interval.max(1) as u64;
    if state.spawn_counter % interval == 0 {
        create_obstacle(state);
        true
    } else {
        false
    }
}

/// Spawn an obstacle at the right edge with a random opening, and maybe a
/// power-up inside that opening
pub fn create_obstacle(state: &mut SimulationState) -> u32 {
    let gap = state.params.gap;
    let min = OBSTACLE_MIN_EDGE;
    let max = FIELD_HEIGHT - gap - OBSTACLE_MIN_EDGE;
    let top_height = if max > min {
        state.rng.random_range(min..max)
    } else {
        min
    };

    let id = state.next_entity_id();
    let obstacle = Obstacle::new(id, FIELD_WIDTH, top_height, gap);
    let gap_center = obstacle.gap_center();
    state.obstacles.push(obstacle);
    log::trace!("Spawned obstacle {} with opening at {:.1}", id, top_height);

    let chance = state.settings.power_up_chance.clamp(0.0, 1.0);
    if state.rng.random_bool(chance) {
        let kind = PowerUpKind::ALL[state.rng.random_range(0..PowerUpKind::ALL.len())];
        let pid = state.next_entity_id();
        state.power_ups.push(PowerUp::new(
            pid,
            kind,
            Vec2::new(FIELD_WIDTH + POWER_UP_LEAD, gap_center),
        ));
        log::trace!("Spawned {} power-up {}", kind.as_str(), pid);
    }

    id
}
