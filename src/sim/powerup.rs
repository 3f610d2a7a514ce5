//! Power-up state machine
//!
//! At most one power-up is active. Collecting another first reverts the
//! current one, so effects never stack. Every kind is described by a single
//! [`PowerUpHandler`] entry; nothing else switches on the kind.

use super::state::{Actor, ActivePowerUp, GameEvent, PowerUpKind, SimulationState};
use crate::consts::SHRINK_FACTOR;
use crate::display_secs;

/// Behavior of one power-up kind
pub struct PowerUpHandler {
    /// Applied when the power-up becomes active
    pub activate: fn(&mut Actor),
    /// Reverts everything `activate` did
    pub deactivate: fn(&mut Actor),
    /// Points for each obstacle passed while active
    pub points_per_obstacle: u64,
    /// Boundaries and obstacles cannot end the run
    pub shields: bool,
}

fn no_effect(_: &mut Actor) {}

fn shrink(actor: &mut Actor) {
    actor.scale_size(SHRINK_FACTOR);
}

fn restore(actor: &mut Actor) {
    actor.restore_size();
}

static SHIELD: PowerUpHandler = PowerUpHandler {
    activate: no_effect,
    deactivate: no_effect,
    points_per_obstacle: 1,
    shields: true,
};

static SCORE_MULTIPLIER: PowerUpHandler = PowerUpHandler {
    activate: no_effect,
    deactivate: no_effect,
    points_per_obstacle: 2,
    shields: false,
};

static SHRINK: PowerUpHandler = PowerUpHandler {
    activate: shrink,
    deactivate: restore,
    points_per_obstacle: 1,
    shields: false,
};

impl PowerUpKind {
    pub fn handler(&self) -> &'static PowerUpHandler {
        match self {
            PowerUpKind::Shield => &SHIELD,
            PowerUpKind::ScoreMultiplier => &SCORE_MULTIPLIER,
            PowerUpKind::Shrink => &SHRINK,
        }
    }
}

pub fn shield_active(active: &ActivePowerUp) -> bool {
    active.kind().is_some_and(|k| k.handler().shields)
}

pub fn points_per_obstacle(active: &ActivePowerUp) -> u64 {
    active.kind().map_or(1, |k| k.handler().points_per_obstacle)
}

/// Mark the power-up at `idx` collected and make it the active one
pub fn collect(state: &mut SimulationState, idx: usize) {
    let power_up = &mut state.power_ups[idx];
    power_up.collected = true;
    let (kind, duration) = (power_up.kind, power_up.duration_ticks);
    state.power_ups_collected += 1;
    activate(state, kind, duration);
}

/// Activate `kind`, reverting any current power-up first
pub fn activate(state: &mut SimulationState, kind: PowerUpKind, duration_ticks: u32) {
    deactivate(state);
    state.active_power_up = ActivePowerUp::Active {
        kind,
        remaining_ticks: duration_ticks,
    };
    (kind.handler().activate)(&mut state.actor);
    log::debug!("Power-up {} active for {} steps", kind.as_str(), duration_ticks);
    state.events.push(GameEvent::PowerUpActivated {
        kind,
        remaining_secs: display_secs(duration_ticks),
    });
}

/// Revert the active power-up, if any
pub fn deactivate(state: &mut SimulationState) {
    if let ActivePowerUp::Active { kind, .. } = state.active_power_up {
        (kind.handler().deactivate)(&mut state.actor);
        state.active_power_up = ActivePowerUp::None;
        log::debug!("Power-up {} expired", kind.as_str());
        state.events.push(GameEvent::PowerUpDeactivated { kind });
    }
}

/// Count the active power-up down by one step; reaching zero reverts it
pub fn decay(state: &mut SimulationState) {
    let ActivePowerUp::Active {
        kind,
        remaining_ticks,
    } = &mut state.active_power_up
    else {
        return;
    };
    let shown_before = display_secs(*remaining_ticks);
    *remaining_ticks = remaining_ticks.saturating_sub(1);
    let (kind, remaining) = (*kind, *remaining_ticks);

    if remaining == 0 {
        deactivate(state);
    } else if display_secs(remaining) != shown_before {
        state.events.push(GameEvent::PowerUpTimer {
            kind,
            remaining_secs: display_secs(remaining),
        });
    }
}
