//! Game settings and difficulty presets
//!
//! Difficulty is chosen before a run starts and its parameters are copied
//! into the run, so editing settings mid-run never reaches live entities.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;

/// Difficulty preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

/// Physics parameters fixed by a difficulty preset
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyParams {
    /// Added to vertical velocity every step
    pub gravity: f32,
    /// Horizontal distance obstacles and power-ups travel per step
    pub scroll_speed: f32,
    /// Vertical opening of newly created obstacles
    pub gap: f32,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "EASY",
            Difficulty::Normal => "NORMAL",
            Difficulty::Hard => "HARD",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "normal" | "norm" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    pub fn all() -> [Difficulty; 3] {
        [Difficulty::Easy, Difficulty::Normal, Difficulty::Hard]
    }

    /// Physics parameters for this preset
    pub fn params(&self) -> DifficultyParams {
        match self {
            Difficulty::Easy => DifficultyParams {
                gravity: 0.4,
                scroll_speed: 1.5,
                gap: 220.0,
            },
            Difficulty::Normal => DifficultyParams {
                gravity: 0.5,
                scroll_speed: 3.0,
                gap: 200.0,
            },
            Difficulty::Hard => DifficultyParams {
                gravity: 0.5,
                scroll_speed: 4.0,
                gap: 200.0,
            },
        }
    }
}

/// Tunables shared by every difficulty
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Difficulty selected when no explicit one is given
    pub difficulty: Difficulty,
    /// Vertical velocity set by a jump (negative is up)
    pub jump_impulse: f32,
    /// Steps between obstacle spawns
    pub spawn_interval: u32,
    /// Probability that an obstacle carries a power-up
    pub power_up_chance: f64,
    /// Seed for the first run; later runs derive their seeds from it
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Normal,
            jump_impulse: -9.0,
            spawn_interval: 90,
            power_up_chance: 0.25,
            seed: None,
        }
    }
}

impl Settings {
    /// Parse settings from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load settings from a JSON file, falling back to defaults
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path)
            .map_err(SettingsError::from)
            .and_then(|json| Self::from_json(&json))
        {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("Using default settings ({})", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        std::fs::write(path, self.to_json()?)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}
