//! Fixed timestep simulation tick
//!
//! Core game loop that advances simulation deterministically. Each call is
//! one 1/60 s step; during a post-rewind pause the step only counts the
//! pause down.

use super::ability;
use super::collision::{self, CollisionResult, Termination};
use super::history::Snapshot;
use super::powerup;
use super::spawn;
use super::state::{GameEvent, RunPhase, SimulationState};
use crate::consts::FIELD_HEIGHT;
use crate::error::Rejection;

/// Commands for a single tick, applied before the step runs
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub jump: bool,
    pub area_clear: bool,
    pub rewind: bool,
    /// Idle/demo mode - autopilot plays the game
    pub idle_mode: bool,
}

/// What a tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Run not in progress; nothing happened
    Inactive,
    /// Post-rewind pause; only the pause counter moved
    Paused,
    Stepped,
    /// This step ended the run
    Ended(Termination),
}

/// Set the actor's velocity to the jump impulse
pub fn jump(state: &mut SimulationState) -> Result<(), Rejection> {
    if state.phase != RunPhase::Running {
        return Err(Rejection::WrongPhase { phase: state.phase });
    }
    let impulse = state.settings.jump_impulse;
    state.actor.jump(impulse);
    Ok(())
}

fn apply_input(state: &mut SimulationState, input: &TickInput) {
    if input.jump {
        if let Err(e) = jump(state) {
            log::debug!("Jump ignored: {}", e);
        }
    }
    if input.area_clear {
        if let Err(e) = ability::activate_area_clear(state) {
            log::debug!("Area clear ignored: {}", e);
        }
    }
    if input.rewind {
        if let Err(e) = ability::activate_rewind(state) {
            log::debug!("Rewind ignored: {}", e);
        }
    }
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut SimulationState, input: &TickInput) -> StepOutcome {
    if input.idle_mode {
        let auto = autopilot(state);
        apply_input(state, &auto);
    }
    apply_input(state, input);

    if state.phase != RunPhase::Running {
        return StepOutcome::Inactive;
    }
    state.clock.advance();

    if state.pause_ticks > 0 {
        state.pause_ticks -= 1;
        return StepOutcome::Paused;
    }

    // Actor physics
    let gravity = state.params.gravity;
    state.actor.apply_gravity(gravity);
    state.actor.integrate();

    // Entities
    spawn::advance_entities(state);
    spawn::retire_offscreen(state);
    spawn::maybe_spawn(state);

    // Timers
    powerup::decay(state);
    ability::decay_cooldowns(state);
    ability::decay_effects(state);

    if let CollisionResult::Terminated(cause) = collision::resolve(state) {
        end_run(state, cause);
        return StepOutcome::Ended(cause);
    }

    let snapshot = Snapshot::capture(state);
    state.history.push(snapshot);
    StepOutcome::Stepped
}

fn end_run(state: &mut SimulationState, cause: Termination) {
    state.phase = RunPhase::Ended;
    let elapsed_secs = state.clock.whole_secs();
    log::info!(
        "Run ended ({:?}): score {}, {} power-ups, {}s",
        cause,
        state.score,
        state.power_ups_collected,
        elapsed_secs
    );
    state.events.push(GameEvent::RunEnded {
        final_score: state.score,
        power_ups_collected: state.power_ups_collected,
        elapsed_secs,
    });
}

/// Simple heuristic player: hop whenever the actor sinks toward the lower
/// edge of the next opening, and burn area clear when about to hit a wall.
pub fn autopilot(state: &SimulationState) -> TickInput {
    let actor = &state.actor;
    let (top, bottom) = (actor.pos.y, actor.pos.y + actor.size.y);
    let next = state
        .obstacles
        .iter()
        .find(|ob| ob.trailing_edge() >= actor.pos.x);

    let floor = next.map_or(FIELD_HEIGHT * 0.6, |ob| ob.bottom_y() - 12.0);
    let jump = actor.vel >= 0.0 && bottom > floor;

    let area_clear = state.area_clear.is_ready()
        && next.is_some_and(|ob| {
            let close = ob.x - (actor.pos.x + actor.size.x) < 30.0;
            let misaligned = top < ob.top_height || bottom > ob.bottom_y();
            close && misaligned
        });

    TickInput {
        jump,
        area_clear,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::secs_to_ticks;
    use crate::settings::{Difficulty, Settings};
    use crate::sim::state::{Obstacle, PowerUp, PowerUpKind};
    use glam::Vec2;
    use proptest::prelude::*;

    /// No automatic spawning, so tests control every entity
    fn quiet_settings() -> Settings {
        Settings {
            spawn_interval: 1_000_000,
            ..Settings::default()
        }
    }

    fn running(settings: &Settings, difficulty: Difficulty) -> SimulationState {
        let mut s = SimulationState::new(settings, difficulty, 2024);
        s.phase = RunPhase::Running;
        s
    }

    /// Keep the actor hovering around the middle of the field
    fn hover(state: &SimulationState) -> TickInput {
        TickInput {
            jump: state.actor.vel > 0.0 && state.actor.pos.y > 320.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_tick_idle_does_nothing() {
        let mut s = SimulationState::new(&Settings::default(), Difficulty::Normal, 1);
        let input = TickInput {
            jump: true,
            ..Default::default()
        };
        assert_eq!(tick(&mut s, &input), StepOutcome::Inactive);
        assert_eq!(s.actor.vel, 0.0);
        assert_eq!(s.clock.ticks(), 0);
        assert!(s.history.is_empty());
    }

    #[test]
    fn test_jump_sets_impulse() {
        let mut s = running(&quiet_settings(), Difficulty::Normal);
        s.actor.vel = 4.0;
        jump(&mut s).unwrap();
        assert_eq!(s.actor.vel, -9.0);
    }

    #[test]
    fn test_one_snapshot_per_step() {
        let mut s = running(&quiet_settings(), Difficulty::Normal);
        for i in 1..=10u64 {
            assert_eq!(tick(&mut s, &TickInput::default()), StepOutcome::Stepped);
            assert_eq!(s.history.len() as u64, i);
            assert_eq!(s.history.latest().unwrap().step, i);
            assert_eq!(s.history.latest().unwrap().actor_y, s.actor.pos.y);
        }
    }

    #[test]
    fn test_history_capped_at_window() {
        let mut s = running(&quiet_settings(), Difficulty::Normal);
        for _ in 0..400 {
            let input = hover(&s);
            tick(&mut s, &input);
        }
        assert_eq!(s.phase, RunPhase::Running);
        assert_eq!(s.history.len(), HISTORY_CAPACITY);
        assert_eq!(s.history.oldest().unwrap().step, 400 - 180 + 1);
    }

    #[test]
    fn test_passing_obstacle_scores_exactly_once() {
        let mut s = running(&quiet_settings(), Difficulty::Normal);
        s.obstacles.push(Obstacle::new(1, 100.0, 150.0, 300.0));

        for step in 1..=60 {
            let input = hover(&s);
            assert_eq!(tick(&mut s, &input), StepOutcome::Stepped);
            // x = 100 - 3 * step; trailing edge passes x = 80 at step 25
            let expected = if step >= 25 { 1 } else { 0 };
            assert_eq!(s.score, expected, "step {step}");
        }
        assert!(s.obstacles[0].scored);
        let score_events = s
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::ScoreChanged { .. }))
            .count();
        assert_eq!(score_events, 1);
    }

    #[test]
    fn test_shield_clamps_at_floor_and_keeps_running() {
        let mut s = running(&quiet_settings(), Difficulty::Normal);
        powerup::activate(&mut s, PowerUpKind::Shield, secs_to_ticks(3));
        s.actor.pos.y = FIELD_HEIGHT - ACTOR_HEIGHT - 1.0;
        s.actor.vel = 6.0;
        assert_eq!(tick(&mut s, &TickInput::default()), StepOutcome::Stepped);
        assert_eq!(s.actor.pos.y, FIELD_HEIGHT - ACTOR_HEIGHT);
        assert_eq!(s.actor.vel, 0.0);
        assert_eq!(s.actor.rotation, 0.0);
        assert_eq!(s.phase, RunPhase::Running);
    }

    #[test]
    fn test_shield_clamps_at_ceiling() {
        let mut s = running(&quiet_settings(), Difficulty::Normal);
        powerup::activate(&mut s, PowerUpKind::Shield, secs_to_ticks(3));
        s.actor.pos.y = 2.0;
        s.actor.vel = -9.0;
        tick(&mut s, &TickInput::default());
        assert_eq!(s.actor.pos.y, 0.0);
        assert_eq!(s.actor.vel, 0.0);
        assert_eq!(s.phase, RunPhase::Running);
    }

    #[test]
    fn test_falling_out_ends_run() {
        let mut s = running(&quiet_settings(), Difficulty::Normal);
        let mut outcome = StepOutcome::Stepped;
        for _ in 0..100 {
            outcome = tick(&mut s, &TickInput::default());
            if outcome != StepOutcome::Stepped {
                break;
            }
        }
        assert_eq!(outcome, StepOutcome::Ended(Termination::Boundary));
        assert_eq!(s.phase, RunPhase::Ended);
        assert!(s.events.iter().any(|e| matches!(e, GameEvent::RunEnded { .. })));
        // Terminal: later ticks do nothing
        let ticks = s.clock.ticks();
        assert_eq!(tick(&mut s, &TickInput::default()), StepOutcome::Inactive);
        assert_eq!(s.clock.ticks(), ticks);
    }

    #[test]
    fn test_shrink_lasts_exactly_300_steps() {
        let mut s = running(&quiet_settings(), Difficulty::Normal);
        let pos = Vec2::new(s.actor.pos.x, s.actor.pos.y + s.actor.size.y / 2.0);
        s.power_ups.push(PowerUp::new(1, PowerUpKind::Shrink, pos));
        let base = s.actor.base_size;

        for step in 1..=301 {
            let input = hover(&s);
            assert_eq!(tick(&mut s, &input), StepOutcome::Stepped);
            if step <= 300 {
                assert_eq!(s.actor.size, base * SHRINK_FACTOR, "step {step}");
            } else {
                assert_eq!(s.actor.size, base, "step {step}");
            }
        }
        assert_eq!(s.power_ups_collected, 1);
    }

    #[test]
    fn test_rewind_restores_and_pauses_sixty_steps() {
        let mut s = running(&quiet_settings(), Difficulty::Normal);
        s.obstacles.push(Obstacle::new(1, 390.0, 150.0, 300.0));
        for _ in 0..120 {
            let input = hover(&s);
            tick(&mut s, &input);
        }
        assert_eq!(s.phase, RunPhase::Running);
        let target = s.history.steps_ago(s.history.len().min(HISTORY_CAPACITY) - 1).unwrap().clone();
        assert_eq!(target.step, 1);

        let rewind = TickInput {
            rewind: true,
            ..Default::default()
        };
        assert_eq!(tick(&mut s, &rewind), StepOutcome::Paused);
        assert_eq!(s.actor.pos.y, target.actor_y);
        assert_eq!(s.actor.vel, target.actor_vel);
        assert_eq!(s.score, target.score);
        assert_eq!(s.obstacles, target.obstacles);
        assert_eq!(s.power_ups, target.power_ups);

        // The rewinding tick itself was the first frozen step
        let frozen = (s.actor.pos.y, s.actor.vel, s.obstacles.clone(), s.rewind.cooldown_ticks);
        let history_len = s.history.len();
        for _ in 1..REWIND_PAUSE_TICKS {
            assert_eq!(tick(&mut s, &TickInput::default()), StepOutcome::Paused);
        }
        assert_eq!(
            (s.actor.pos.y, s.actor.vel, s.obstacles.clone(), s.rewind.cooldown_ticks),
            frozen
        );
        assert_eq!(s.history.len(), history_len);

        assert_eq!(tick(&mut s, &TickInput::default()), StepOutcome::Stepped);
        assert_eq!(s.actor.vel, target.actor_vel + 0.5);
        assert_eq!(s.rewind.cooldown_ticks, secs_to_ticks(REWIND_COOLDOWN_SECS) - 1);
    }

    #[test]
    fn test_rewind_with_short_history_is_noop() {
        let mut s = running(&quiet_settings(), Difficulty::Normal);
        for _ in 0..30 {
            let input = hover(&s);
            tick(&mut s, &input);
        }
        let rewind = TickInput {
            rewind: true,
            ..Default::default()
        };
        assert_eq!(tick(&mut s, &rewind), StepOutcome::Stepped);
        assert_eq!(s.history.len(), 31);
        assert_eq!(s.pause_ticks, 0);
        assert!(s.rewind.is_ready());
    }

    #[test]
    fn test_determinism() {
        let mut a = SimulationState::new(&Settings::default(), Difficulty::Hard, 99999);
        let mut b = SimulationState::new(&Settings::default(), Difficulty::Hard, 99999);
        a.phase = RunPhase::Running;
        b.phase = RunPhase::Running;
        let input = TickInput {
            idle_mode: true,
            ..Default::default()
        };
        for _ in 0..1500 {
            tick(&mut a, &input);
            tick(&mut b, &input);
        }
        assert_eq!(a.clock.ticks(), b.clock.ticks());
        assert_eq!(a.score, b.score);
        assert_eq!(a.obstacles, b.obstacles);
        assert_eq!(a.power_ups, b.power_ups);
        assert_eq!(a.actor.pos, b.actor.pos);
    }

    proptest! {
        #[test]
        fn prop_velocity_accumulates_gravity(steps in 1usize..30, hard in any::<bool>()) {
            let difficulty = if hard { Difficulty::Hard } else { Difficulty::Easy };
            let mut s = running(&quiet_settings(), difficulty);
            let gravity = difficulty.params().gravity;
            for _ in 0..steps {
                let before = s.actor.vel;
                prop_assert_eq!(tick(&mut s, &TickInput::default()), StepOutcome::Stepped);
                prop_assert!(s.actor.vel > before);
                prop_assert!((s.actor.vel - before - gravity).abs() < 1e-5);
            }
        }
    }
}
