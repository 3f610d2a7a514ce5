//! Simulation state and core entity types
//!
//! Everything a run mutates lives in [`SimulationState`], which is owned by
//! the run controller and handed to each subsystem by exclusive reference.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::clock::Clock;
use super::collision::Aabb;
use super::history::HistoryBuffer;
use crate::consts::*;
use crate::settings::{Difficulty, DifficultyParams, Settings};
use crate::{display_secs, secs_to_ticks};

/// Top-level run phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RunPhase {
    /// Waiting for a start command
    #[default]
    Idle,
    /// Active gameplay
    Running,
    /// Run terminated; waiting for restart or return to menu
    Ended,
}

/// The player-controlled actor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    /// Top-left corner. `x` never changes during a run.
    pub pos: Vec2,
    /// Vertical velocity (positive is down)
    pub vel: f32,
    /// Current size (shrinks under the shrink power-up)
    pub size: Vec2,
    /// Size outside of any power-up
    pub base_size: Vec2,
    /// Orientation in degrees, derived from velocity
    pub rotation: f32,
}

impl Default for Actor {
    fn default() -> Self {
        let size = Vec2::new(ACTOR_WIDTH, ACTOR_HEIGHT);
        Self {
            pos: Vec2::new(ACTOR_X, FIELD_HEIGHT / 2.0),
            vel: 0.0,
            size,
            base_size: size,
            rotation: 0.0,
        }
    }
}

impl Actor {
    pub fn apply_gravity(&mut self, gravity: f32) {
        self.vel += gravity;
    }

    /// Move by the current velocity and refresh the orientation
    pub fn integrate(&mut self) {
        self.pos.y += self.vel;
        self.rotation = self.rotation_from_velocity();
    }

    pub fn jump(&mut self, impulse: f32) {
        self.vel = impulse;
        self.rotation = self.rotation_from_velocity();
    }

    /// Kill vertical motion
    pub fn stop(&mut self) {
        self.vel = 0.0;
        self.rotation = self.rotation_from_velocity();
    }

    /// Tilt angle for presentation: nose up while rising, down while falling
    pub fn rotation_from_velocity(&self) -> f32 {
        (self.vel * 3.0).clamp(ACTOR_MIN_ANGLE, ACTOR_MAX_ANGLE)
    }

    /// Scale relative to the base size (never compounds)
    pub fn scale_size(&mut self, factor: f32) {
        self.size = self.base_size * factor;
    }

    pub fn restore_size(&mut self) {
        self.size = self.base_size;
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::new(self.pos, self.pos + self.size)
    }
}

/// A pair of obstacles with a vertical opening between them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: u32,
    /// Left edge
    pub x: f32,
    /// Height of the upper obstacle (top edge of the opening)
    pub top_height: f32,
    /// Opening size, frozen when the obstacle was created
    pub gap: f32,
    pub width: f32,
    /// Set once when the actor passes it, never cleared
    pub scored: bool,
}

impl Obstacle {
    pub fn new(id: u32, x: f32, top_height: f32, gap: f32) -> Self {
        Self {
            id,
            x,
            top_height,
            gap,
            width: OBSTACLE_WIDTH,
            scored: false,
        }
    }

    /// Where the lower obstacle starts
    pub fn bottom_y(&self) -> f32 {
        self.top_height + self.gap
    }

    pub fn trailing_edge(&self) -> f32 {
        self.x + self.width
    }

    /// Vertical midpoint of the opening
    pub fn gap_center(&self) -> f32 {
        self.top_height + self.gap / 2.0
    }
}

/// Power-up kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PowerUpKind {
    /// Obstacles and boundaries cannot end the run
    Shield,
    /// Each passed obstacle is worth double
    ScoreMultiplier,
    /// Actor shrinks to 60%
    Shrink,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 3] = [
        PowerUpKind::Shield,
        PowerUpKind::ScoreMultiplier,
        PowerUpKind::Shrink,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PowerUpKind::Shield => "shield",
            PowerUpKind::ScoreMultiplier => "score-multiplier",
            PowerUpKind::Shrink => "shrink",
        }
    }

    pub fn duration_secs(&self) -> u32 {
        match self {
            PowerUpKind::Shield => 3,
            PowerUpKind::ScoreMultiplier | PowerUpKind::Shrink => 5,
        }
    }
}

/// A collectible power-up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerUp {
    pub id: u32,
    pub kind: PowerUpKind,
    /// `x` is the left edge, `y` the vertical centre
    pub pos: Vec2,
    pub size: Vec2,
    pub duration_ticks: u32,
    pub collected: bool,
}

impl PowerUp {
    pub fn new(id: u32, kind: PowerUpKind, pos: Vec2) -> Self {
        Self {
            id,
            kind,
            pos,
            size: Vec2::splat(POWER_UP_SIZE),
            duration_ticks: secs_to_ticks(kind.duration_secs()),
            collected: false,
        }
    }

    pub fn bounds(&self) -> Aabb {
        let half_h = self.size.y / 2.0;
        Aabb::new(
            Vec2::new(self.pos.x, self.pos.y - half_h),
            Vec2::new(self.pos.x + self.size.x, self.pos.y + half_h),
        )
    }
}

/// The single active power-up slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ActivePowerUp {
    #[default]
    None,
    Active { kind: PowerUpKind, remaining_ticks: u32 },
}

impl ActivePowerUp {
    pub fn kind(&self) -> Option<PowerUpKind> {
        match self {
            ActivePowerUp::None => None,
            ActivePowerUp::Active { kind, .. } => Some(*kind),
        }
    }

    pub fn is(&self, kind: PowerUpKind) -> bool {
        self.kind() == Some(kind)
    }

    pub fn remaining_ticks(&self) -> u32 {
        match self {
            ActivePowerUp::None => 0,
            ActivePowerUp::Active {
                remaining_ticks, ..
            } => *remaining_ticks,
        }
    }
}

/// Player-invoked abilities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbilityKind {
    /// Removes obstacles directly ahead of the actor
    AreaClear,
    /// Restores the oldest recorded snapshot
    Rewind,
}

impl AbilityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AbilityKind::AreaClear => "area-clear",
            AbilityKind::Rewind => "time-rewind",
        }
    }

    pub fn max_cooldown_ticks(&self) -> u32 {
        match self {
            AbilityKind::AreaClear => secs_to_ticks(AREA_CLEAR_COOLDOWN_SECS),
            AbilityKind::Rewind => secs_to_ticks(REWIND_COOLDOWN_SECS),
        }
    }

    /// Lifetime of the visual marker left by an activation
    pub fn effect_lifetime_ticks(&self) -> u32 {
        match self {
            AbilityKind::AreaClear => STEP_RATE / 2,
            AbilityKind::Rewind => STEP_RATE,
        }
    }
}

/// Cooldown tracking for one ability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ability {
    pub kind: AbilityKind,
    pub cooldown_ticks: u32,
    pub max_cooldown_ticks: u32,
}

impl Ability {
    pub fn new(kind: AbilityKind) -> Self {
        Self {
            kind,
            cooldown_ticks: 0,
            max_cooldown_ticks: kind.max_cooldown_ticks(),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.cooldown_ticks == 0
    }
}

/// Short-lived marker left by an ability activation (presentation only)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectMarker {
    pub ability: AbilityKind,
    pub origin: Vec2,
    pub lifetime_ticks: u32,
    pub max_lifetime_ticks: u32,
}

impl EffectMarker {
    pub fn new(ability: AbilityKind, origin: Vec2) -> Self {
        let lifetime = ability.effect_lifetime_ticks();
        Self {
            ability,
            origin,
            lifetime_ticks: lifetime,
            max_lifetime_ticks: lifetime,
        }
    }
}

/// Outbound notifications for the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    ScoreChanged {
        score: u64,
    },
    PowerUpActivated {
        kind: PowerUpKind,
        remaining_secs: u32,
    },
    /// Whole-second countdown of the active power-up changed
    PowerUpTimer {
        kind: PowerUpKind,
        remaining_secs: u32,
    },
    PowerUpDeactivated {
        kind: PowerUpKind,
    },
    /// Whole-second cooldown of an ability changed (0 means ready)
    CooldownChanged {
        ability: AbilityKind,
        remaining_secs: u32,
    },
    Rewound {
        to_step: u64,
    },
    RunEnded {
        final_score: u64,
        power_ups_collected: u32,
        elapsed_secs: u64,
    },
}

/// Complete state of one run
#[derive(Debug, Clone)]
pub struct SimulationState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub difficulty: Difficulty,
    /// Copied from the difficulty preset at run start
    pub params: DifficultyParams,
    /// Copied from the settings at run start
    pub settings: Settings,
    pub phase: RunPhase,
    pub clock: Clock,
    /// Non-paused steps; drives the spawn cadence
    pub spawn_counter: u64,
    pub score: u64,
    pub power_ups_collected: u32,
    pub actor: Actor,
    /// In creation order
    pub obstacles: Vec<Obstacle>,
    /// In creation order
    pub power_ups: Vec<PowerUp>,
    pub active_power_up: ActivePowerUp,
    pub area_clear: Ability,
    pub rewind: Ability,
    pub effects: Vec<EffectMarker>,
    pub history: HistoryBuffer,
    /// Frozen steps remaining after a rewind
    pub pause_ticks: u32,
    /// Pending outbound events
    pub events: Vec<GameEvent>,
    next_id: u32,
}

impl SimulationState {
    /// Create a fresh, idle state for the given difficulty
    pub fn new(settings: &Settings, difficulty: Difficulty, seed: u64) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            difficulty,
            params: difficulty.params(),
            settings: settings.clone(),
            phase: RunPhase::Idle,
            clock: Clock::new(),
            spawn_counter: 0,
            score: 0,
            power_ups_collected: 0,
            actor: Actor::default(),
            obstacles: Vec::new(),
            power_ups: Vec::new(),
            active_power_up: ActivePowerUp::None,
            area_clear: Ability::new(AbilityKind::AreaClear),
            rewind: Ability::new(AbilityKind::Rewind),
            effects: Vec::new(),
            history: HistoryBuffer::new(HISTORY_CAPACITY),
            pause_ticks: 0,
            events: Vec::new(),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn ability(&self, kind: AbilityKind) -> &Ability {
        match kind {
            AbilityKind::AreaClear => &self.area_clear,
            AbilityKind::Rewind => &self.rewind,
        }
    }

    pub fn ability_mut(&mut self, kind: AbilityKind) -> &mut Ability {
        match kind {
            AbilityKind::AreaClear => &mut self.area_clear,
            AbilityKind::Rewind => &mut self.rewind,
        }
    }

    pub fn add_score(&mut self, points: u64) {
        self.set_score(self.score + points);
    }

    pub fn set_score(&mut self, score: u64) {
        self.score = score;
        self.events.push(GameEvent::ScoreChanged { score });
    }

    /// Put an ability on full cooldown and announce it
    pub fn start_cooldown(&mut self, kind: AbilityKind) {
        let ability = self.ability_mut(kind);
        ability.cooldown_ticks = ability.max_cooldown_ticks;
        let remaining_secs = display_secs(ability.cooldown_ticks);
        self.events.push(GameEvent::CooldownChanged {
            ability: kind,
            remaining_secs,
        });
    }

    pub fn is_paused(&self) -> bool {
        self.pause_ticks > 0
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}
