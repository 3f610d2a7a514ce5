//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only (one call = 1/60 s)
//! - Seeded RNG only
//! - Stable iteration order (creation order)
//! - No rendering or platform dependencies

pub mod ability;
pub mod clock;
pub mod collision;
pub mod history;
pub mod powerup;
pub mod spawn;
pub mod state;
pub mod tick;

pub use clock::Clock;
pub use collision::{Aabb, CollisionResult, Termination};
pub use history::{HistoryBuffer, Snapshot};
pub use powerup::PowerUpHandler;
pub use state::{
    Ability, AbilityKind, ActivePowerUp, Actor, EffectMarker, GameEvent, Obstacle, PowerUp,
    PowerUpKind, RunPhase, SimulationState,
};
pub use tick::{StepOutcome, TickInput, autopilot, tick};
