//! Cooldown-gated active abilities
//!
//! Both abilities are rejected unless the run is in progress and their own
//! cooldown has run out. A rejected activation leaves the state untouched.

use glam::Vec2;

use super::state::{AbilityKind, EffectMarker, GameEvent, RunPhase, SimulationState};
use crate::consts::*;
use crate::display_secs;
use crate::error::Rejection;

fn check_ready(state: &SimulationState, kind: AbilityKind) -> Result<(), Rejection> {
    if state.phase != RunPhase::Running {
        return Err(Rejection::WrongPhase { phase: state.phase });
    }
    let ability = state.ability(kind);
    if !ability.is_ready() {
        return Err(Rejection::CoolingDown {
            ability: kind,
            remaining_ticks: ability.cooldown_ticks,
        });
    }
    Ok(())
}

/// Remove every obstacle strictly inside `(actor_x, actor_x + range)`.
/// Awards `5 + 2 * cleared` points and returns the number cleared.
pub fn activate_area_clear(state: &mut SimulationState) -> Result<usize, Rejection> {
    check_ready(state, AbilityKind::AreaClear)?;

    let actor = &state.actor;
    let (lo, hi) = (actor.pos.x, actor.pos.x + AREA_CLEAR_RANGE);
    let origin = Vec2::new(actor.pos.x, actor.pos.y + actor.size.y / 2.0);

    let before = state.obstacles.len();
    state.obstacles.retain(|ob| !(ob.x > lo && ob.x < hi));
    let cleared = before - state.obstacles.len();

    state
        .effects
        .push(EffectMarker::new(AbilityKind::AreaClear, origin));
    state.start_cooldown(AbilityKind::AreaClear);
    state.add_score(AREA_CLEAR_BASE_AWARD + AREA_CLEAR_PER_OBSTACLE * cleared as u64);
    log::debug!("Area clear removed {} obstacles", cleared);
    Ok(cleared)
}

/// Restore the oldest recorded snapshot and freeze the simulation briefly.
/// Returns the step the state was rolled back to.
pub fn activate_rewind(state: &mut SimulationState) -> Result<u64, Rejection> {
    check_ready(state, AbilityKind::Rewind)?;

    let recorded = state.history.len();
    if recorded < REWIND_MIN_HISTORY {
        return Err(Rejection::InsufficientHistory {
            recorded,
            required: REWIND_MIN_HISTORY,
        });
    }
    // The buffer never holds more than one window, so the oldest entry is
    // always min(len, window) steps back.
    let Some(past) = state.history.oldest().cloned() else {
        return Err(Rejection::InsufficientHistory {
            recorded,
            required: REWIND_MIN_HISTORY,
        });
    };

    state.actor.pos.y = past.actor_y;
    state.actor.vel = past.actor_vel;
    state.actor.rotation = state.actor.rotation_from_velocity();
    state.obstacles = past.obstacles;
    state.power_ups = past.power_ups;
    state.set_score(past.score);

    state.effects.push(EffectMarker::new(
        AbilityKind::Rewind,
        Vec2::new(FIELD_WIDTH / 2.0, FIELD_HEIGHT / 2.0),
    ));
    state.start_cooldown(AbilityKind::Rewind);
    state.pause_ticks = REWIND_PAUSE_TICKS;
    state.events.push(GameEvent::Rewound { to_step: past.step });
    log::debug!(
        "Rewound {} steps to step {}",
        state.clock.ticks().saturating_sub(past.step),
        past.step
    );
    Ok(past.step)
}

/// Count both cooldowns down by one step
pub fn decay_cooldowns(state: &mut SimulationState) {
    for kind in [AbilityKind::AreaClear, AbilityKind::Rewind] {
        let ability = state.ability_mut(kind);
        if ability.cooldown_ticks == 0 {
            continue;
        }
        let shown_before = display_secs(ability.cooldown_ticks);
        ability.cooldown_ticks -= 1;
        let shown = display_secs(ability.cooldown_ticks);
        if shown != shown_before {
            state.events.push(GameEvent::CooldownChanged {
                ability: kind,
                remaining_secs: shown,
            });
        }
    }
}

/// Age effect markers and drop expired ones
pub fn decay_effects(state: &mut SimulationState) {
    state.effects.retain_mut(|fx| {
        fx.lifetime_ticks = fx.lifetime_ticks.saturating_sub(1);
        fx.lifetime_ticks > 0
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{Difficulty, Settings};
    use crate::sim::history::Snapshot;
    use crate::sim::state::{Obstacle, PowerUp, PowerUpKind};

    fn running() -> SimulationState {
        let mut s = SimulationState::new(&Settings::default(), Difficulty::Normal, 5);
        s.phase = RunPhase::Running;
        s
    }

    fn record(s: &mut SimulationState, steps: usize) {
        for _ in 0..steps {
            s.clock.advance();
            s.actor.pos.y += 1.0;
            s.score += 1;
            let snapshot = Snapshot::capture(s);
            s.history.push(snapshot);
        }
    }

    #[test]
    fn test_area_clear_removes_only_strictly_inside() {
        let mut s = running();
        for (id, x) in [(1, 80.0), (2, 81.0), (3, 300.0), (4, 479.0), (5, 480.0), (6, 20.0)] {
            s.obstacles.push(Obstacle::new(id, x, 100.0, 200.0));
        }
        s.power_ups.push(PowerUp::new(9, PowerUpKind::Shield, Vec2::new(200.0, 200.0)));

        assert_eq!(activate_area_clear(&mut s), Ok(3));
        let left: Vec<u32> = s.obstacles.iter().map(|o| o.id).collect();
        assert_eq!(left, vec![1, 5, 6]);
        assert_eq!(s.score, 5 + 2 * 3);
        assert_eq!(s.power_ups.len(), 1);
        assert_eq!(s.area_clear.cooldown_ticks, 20 * 60);
        assert_eq!(s.effects.len(), 1);
    }

    #[test]
    fn test_area_clear_with_nothing_in_range() {
        let mut s = running();
        assert_eq!(activate_area_clear(&mut s), Ok(0));
        assert_eq!(s.score, 5);
    }

    #[test]
    fn test_area_clear_rejected_on_cooldown() {
        let mut s = running();
        activate_area_clear(&mut s).unwrap();
        let score = s.score;
        assert!(matches!(
            activate_area_clear(&mut s),
            Err(Rejection::CoolingDown { ability: AbilityKind::AreaClear, .. })
        ));
        assert_eq!(s.score, score);
    }

    #[test]
    fn test_abilities_rejected_when_not_running() {
        let mut s = SimulationState::new(&Settings::default(), Difficulty::Normal, 5);
        assert_eq!(
            activate_area_clear(&mut s),
            Err(Rejection::WrongPhase { phase: RunPhase::Idle })
        );
        s.phase = RunPhase::Ended;
        assert_eq!(
            activate_rewind(&mut s),
            Err(Rejection::WrongPhase { phase: RunPhase::Ended })
        );
    }

    #[test]
    fn test_rewind_needs_one_second_of_history() {
        let mut s = running();
        record(&mut s, 59);
        let y = s.actor.pos.y;
        assert_eq!(
            activate_rewind(&mut s),
            Err(Rejection::InsufficientHistory { recorded: 59, required: 60 })
        );
        assert_eq!(s.actor.pos.y, y);
        assert!(s.rewind.is_ready());
        assert_eq!(s.pause_ticks, 0);
    }

    #[test]
    fn test_rewind_restores_oldest_snapshot() {
        let mut s = running();
        s.obstacles.push(Obstacle::new(1, 300.0, 100.0, 200.0));
        record(&mut s, 200);
        let oldest = s.history.oldest().unwrap().clone();
        assert_eq!(oldest.step, 21);

        s.obstacles.push(Obstacle::new(2, 350.0, 100.0, 200.0));
        s.obstacles[0].scored = true;
        s.power_ups.push(PowerUp::new(3, PowerUpKind::Shrink, Vec2::new(200.0, 200.0)));

        assert_eq!(activate_rewind(&mut s), Ok(21));
        assert_eq!(s.actor.pos.y, oldest.actor_y);
        assert_eq!(s.actor.vel, oldest.actor_vel);
        assert_eq!(s.score, oldest.score);
        assert_eq!(s.obstacles, oldest.obstacles);
        assert!(s.power_ups.is_empty());
        assert_eq!(s.pause_ticks, REWIND_PAUSE_TICKS);
        assert_eq!(s.rewind.cooldown_ticks, 25 * 60);
        // History is read, not consumed
        assert_eq!(s.history.len(), HISTORY_CAPACITY);
    }

    #[test]
    fn test_rewind_young_run_uses_first_snapshot() {
        let mut s = running();
        record(&mut s, 75);
        assert_eq!(activate_rewind(&mut s), Ok(1));
        assert_eq!(s.score, 1);
    }

    #[test]
    fn test_cooldowns_decay_and_report_seconds() {
        let mut s = running();
        s.area_clear.cooldown_ticks = 61;
        s.rewind.cooldown_ticks = 0;
        decay_cooldowns(&mut s);
        assert_eq!(s.area_clear.cooldown_ticks, 60);
        assert_eq!(s.rewind.cooldown_ticks, 0);
        assert_eq!(
            s.drain_events(),
            vec![GameEvent::CooldownChanged {
                ability: AbilityKind::AreaClear,
                remaining_secs: 1
            }]
        );
        for _ in 0..100 {
            decay_cooldowns(&mut s);
        }
        assert!(s.area_clear.is_ready());
    }

    #[test]
    fn test_effects_expire() {
        let mut s = running();
        activate_area_clear(&mut s).unwrap();
        for _ in 0..29 {
            decay_effects(&mut s);
        }
        assert_eq!(s.effects.len(), 1);
        decay_effects(&mut s);
        assert!(s.effects.is_empty());
    }
}
