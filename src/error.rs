//! Error types
//!
//! Commands that arrive in the wrong state are ordinary input races, so they
//! come back as a [`Rejection`] rather than a fault. Failures at the
//! persistence boundary are reported as [`SubmitError`] and only ever logged.

use std::error::Error;
use std::fmt;

use crate::sim::{AbilityKind, RunPhase};

/// Why a command was ignored. A rejected command never changes state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The command is not valid in the current run phase
    WrongPhase { phase: RunPhase },
    /// The ability is still cooling down
    CoolingDown { ability: AbilityKind, remaining_ticks: u32 },
    /// Not enough recorded history to rewind
    InsufficientHistory { recorded: usize, required: usize },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongPhase { phase } => write!(f, "command not valid while {phase:?}"),
            Self::CoolingDown {
                ability,
                remaining_ticks,
            } => write!(f, "{} cooling down ({remaining_ticks} steps left)", ability.as_str()),
            Self::InsufficientHistory { recorded, required } => {
                write!(f, "rewind needs {required} recorded steps, have {recorded}")
            }
        }
    }
}

impl Error for Rejection {}

/// Failure reported by a [`RecordSink`](crate::highscores::RecordSink).
#[derive(Debug)]
pub enum SubmitError {
    /// The remote service could not be reached
    Unavailable,
    /// The service answered but refused the record
    Refused { message: String },
    /// The record or response could not be (de)serialized
    Encoding(serde_json::Error),
    /// Local storage or the submission worker failed
    Io(std::io::Error),
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable => write!(f, "record service unavailable"),
            Self::Refused { message } => write!(f, "record refused: {message}"),
            Self::Encoding(e) => write!(f, "record encoding failed: {e}"),
            Self::Io(e) => write!(f, "record I/O failed: {e}"),
        }
    }
}

impl Error for SubmitError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Encoding(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for SubmitError {
    fn from(e: serde_json::Error) -> Self {
        Self::Encoding(e)
    }
}

impl From<std::io::Error> for SubmitError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// Failure loading or saving [`Settings`](crate::settings::Settings).
#[derive(Debug)]
pub enum SettingsError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "settings I/O failed: {e}"),
            Self::Parse(e) => write!(f, "settings are not valid JSON: {e}"),
        }
    }
}

impl Error for SettingsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Parse(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for SettingsError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e)
    }
}
