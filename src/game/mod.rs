//! Game rules - stats, decay, feeding, duels
//!
//! Everything here is a pure function of stored state and an explicit `now`,
//! except `challenge` (live offers) and `service` (database read-modify-write).

pub mod care;
pub mod challenge;
pub mod decay;
pub mod duel;
pub mod food;
pub mod level;
pub mod service;

pub use challenge::{Challenge, ChallengeBook, ChallengeId};
pub use duel::DuelOutcome;
pub use food::{Food, find_food, get_foods};

use crate::error::{GameError, Result};

/// Upper bound of health, hunger and happiness
pub const STAT_MAX: i64 = 100;
/// Weight never drops below this
pub const MIN_WEIGHT: i64 = 1;

pub const DEFAULT_NAME: &str = "Макака";
pub const DEFAULT_HEALTH: i64 = 100;
pub const DEFAULT_HUNGER: i64 = 0;
pub const DEFAULT_HAPPINESS: i64 = 50;
pub const DEFAULT_WEIGHT: i64 = 10;

/// Stakes offered on the bet keyboard
pub const STAKES: &[i64] = &[1, 3, 5, 10];

pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 20;

pub fn clamp_stat(value: i64) -> i64 {
    value.clamp(0, STAT_MAX)
}

/// Validate and normalize a monkey name
pub fn validate_name(raw: &str) -> Result<String> {
    let name = raw.trim();
    let len = name.chars().count();
    if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&len) {
        return Err(GameError::InvalidName(name.to_string()));
    }
    let allowed = name
        .chars()
        .all(|c| c.is_alphanumeric() || c == ' ' || c == '-' || c == '_');
    if !allowed {
        return Err(GameError::InvalidName(name.to_string()));
    }
    Ok(name.to_string())
}
