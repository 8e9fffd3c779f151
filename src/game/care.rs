//! Feeding, walking and the daily reward

use chrono::{DateTime, Duration, Local, Utc};

use super::{Food, clamp_stat};
use crate::db::Monkey;
use crate::error::{GameError, Result};

pub const WALK_HAPPINESS: i64 = 15;
pub const DAILY_WEIGHT: i64 = 1;
pub const DAILY_HAPPINESS: i64 = 5;

/// Time until the daily reward can be claimed again, None if available.
/// The reward resets at local midnight.
pub fn daily_remaining(last_daily: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Option<Duration> {
    let last = last_daily?.with_timezone(&Local).date_naive();
    let now_local = now.with_timezone(&Local);
    if now_local.date_naive() > last {
        return None;
    }
    let midnight = last
        .succ_opt()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .and_then(|naive| naive.and_local_timezone(Local).earliest());
    match midnight {
        Some(next) => Some((next.with_timezone(&Utc) - now).max(Duration::zero())),
        None => Some(Duration::zero()),
    }
}

impl Monkey {
    pub fn feed(&mut self, food: &'static Food, now: DateTime<Utc>) -> Result<()> {
        if let Some(remaining) = food.cooldown_remaining(self.last_fed, now) {
            return Err(GameError::FoodCooldown { food: food.name, remaining });
        }
        self.hunger = clamp_stat(self.hunger - food.hunger_decrease);
        self.happiness = clamp_stat(self.happiness + food.happiness_gain);
        self.weight += food.weight_gain;
        self.last_fed = Some(now);
        Ok(())
    }

    pub fn walk(&mut self) {
        self.happiness = clamp_stat(self.happiness + WALK_HAPPINESS);
    }

    pub fn claim_daily(&mut self, now: DateTime<Utc>) -> Result<()> {
        if let Some(remaining) = daily_remaining(self.last_daily, now) {
            return Err(GameError::DailyNotReady(remaining));
        }
        self.weight += DAILY_WEIGHT;
        self.happiness = clamp_stat(self.happiness + DAILY_HAPPINESS);
        self.last_daily = Some(now);
        Ok(())
    }
}
