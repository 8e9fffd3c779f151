//! Lazy stat decay
//!
//! Stats are not ticked by a scheduler. Whenever a monkey is read for an
//! interactive action, the whole intervals elapsed since each stat's checkpoint
//! are applied and the checkpoint moves forward by exactly those intervals, so a
//! partial interval carries over to the next read.

use chrono::{DateTime, Duration, Utc};

use super::{STAT_MAX, clamp_stat};
use crate::db::Monkey;

pub const HAPPINESS_PENALTY: i64 = 10;
pub const HUNGER_PENALTY: i64 = 5;
pub const HEALTH_PENALTY: i64 = 5;

/// Hunger at which health starts to drain
pub const STARVATION: i64 = STAT_MAX;

pub fn happiness_interval() -> Duration {
    Duration::hours(1)
}

pub fn hunger_interval() -> Duration {
    Duration::hours(2)
}

pub fn health_interval() -> Duration {
    Duration::hours(1)
}

/// Result of applying one decay rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub value: i64,
    pub checkpoint: DateTime<Utc>,
    /// Whole intervals consumed; zero means nothing to persist
    pub intervals: i64,
}

impl Step {
    fn unchanged(value: i64, checkpoint: DateTime<Utc>) -> Self {
        Self { value, checkpoint, intervals: 0 }
    }
}

fn whole_intervals(checkpoint: DateTime<Utc>, now: DateTime<Utc>, interval: Duration) -> i64 {
    if now <= checkpoint {
        return 0;
    }
    (now - checkpoint).num_milliseconds() / interval.num_milliseconds()
}

fn advance(
    value: i64,
    checkpoint: DateTime<Utc>,
    now: DateTime<Utc>,
    interval: Duration,
    per_interval: i64,
) -> Step {
    let n = whole_intervals(checkpoint, now, interval);
    if n == 0 {
        return Step::unchanged(value, checkpoint);
    }
    Step {
        value: clamp_stat(value.saturating_add(per_interval.saturating_mul(n))),
        checkpoint: checkpoint + interval * n as i32,
        intervals: n,
    }
}

/// -10 happiness per full hour, floored at 0
pub fn decay_happiness(happiness: i64, checkpoint: DateTime<Utc>, now: DateTime<Utc>) -> Step {
    advance(happiness, checkpoint, now, happiness_interval(), -HAPPINESS_PENALTY)
}

/// +5 hunger per full two hours, capped at 100
pub fn decay_hunger(hunger: i64, checkpoint: DateTime<Utc>, now: DateTime<Utc>) -> Step {
    advance(hunger, checkpoint, now, hunger_interval(), HUNGER_PENALTY)
}

/// -5 health per full hour, only while starving
pub fn decay_health(
    health: i64,
    hunger: i64,
    checkpoint: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Step {
    if hunger < STARVATION {
        return Step::unchanged(health, checkpoint);
    }
    advance(health, checkpoint, now, health_interval(), -HEALTH_PENALTY)
}

/// Instant at which a hunger step crossed into starvation, if it did
pub fn starvation_onset(
    hunger_before: i64,
    checkpoint_before: DateTime<Utc>,
    step: &Step,
) -> Option<DateTime<Utc>> {
    if hunger_before >= STARVATION || step.value < STARVATION {
        return None;
    }
    let missing = STARVATION - hunger_before;
    let blocks = (missing + HUNGER_PENALTY - 1) / HUNGER_PENALTY;
    Some(checkpoint_before + hunger_interval() * blocks as i32)
}

impl Monkey {
    /// Apply happiness, hunger and health decay in that order.
    /// Returns true when something has to be written back.
    pub fn apply_decay(&mut self, now: DateTime<Utc>) -> bool {
        let happiness = decay_happiness(self.happiness, self.last_happiness_decay, now);
        let hunger = decay_hunger(self.hunger, self.last_hunger_decay, now);

        // Health only drains from the moment starvation began
        let mut health_checkpoint = self.last_health_decay;
        if let Some(onset) = starvation_onset(self.hunger, self.last_hunger_decay, &hunger) {
            health_checkpoint = health_checkpoint.max(onset);
        }
        let health = decay_health(self.health, hunger.value, health_checkpoint, now);

        let changed = happiness.intervals > 0
            || hunger.intervals > 0
            || health.intervals > 0
            || health.checkpoint != self.last_health_decay;

        self.happiness = happiness.value;
        self.last_happiness_decay = happiness.checkpoint;
        self.hunger = hunger.value;
        self.last_hunger_decay = hunger.checkpoint;
        self.health = health.value;
        self.last_health_decay = health.checkpoint;

        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_happiness_exact_hours() {
        for h in 0..15 {
            let step = decay_happiness(80, t0(), t0() + Duration::hours(h));
            assert_eq!(step.value, 80 - (10 * h).min(80), "after {} hours", h);
            assert_eq!(step.checkpoint, t0() + Duration::hours(h));
            assert_eq!(step.intervals, h);
        }
    }

    #[test]
    fn test_happiness_keeps_partial_hour() {
        let now = t0() + Duration::minutes(150);
        let step = decay_happiness(50, t0(), now);
        assert_eq!(step.value, 30);
        assert_eq!(step.checkpoint, t0() + Duration::hours(2));

        // the remaining 30 minutes count towards the next hour
        let later = now + Duration::minutes(30);
        let next = decay_happiness(step.value, step.checkpoint, later);
        assert_eq!(next.value, 20);
        assert_eq!(next.checkpoint, t0() + Duration::hours(3));
    }

    #[test]
    fn test_hunger_needs_full_two_hours() {
        let step = decay_hunger(10, t0(), t0() + Duration::minutes(119));
        assert_eq!(step.value, 10);
        assert_eq!(step.intervals, 0);
        assert_eq!(step.checkpoint, t0());

        let step = decay_hunger(10, t0(), t0() + Duration::minutes(120));
        assert_eq!(step.value, 15);
        assert_eq!(step.intervals, 1);
        assert_eq!(step.checkpoint, t0() + Duration::hours(2));
    }

    #[test]
    fn test_hunger_capped() {
        let step = decay_hunger(90, t0(), t0() + Duration::hours(20));
        assert_eq!(step.value, 100);
        assert_eq!(step.checkpoint, t0() + Duration::hours(20));
    }

    #[test]
    fn test_health_untouched_while_not_starving() {
        for hunger in [0, 50, 99] {
            let step = decay_health(100, hunger, t0(), t0() + Duration::days(30));
            assert_eq!(step.value, 100);
            assert_eq!(step.checkpoint, t0());
            assert_eq!(step.intervals, 0);
        }
    }

    #[test]
    fn test_health_drains_while_starving() {
        let step = decay_health(100, 100, t0(), t0() + Duration::minutes(190));
        assert_eq!(step.value, 85);
        assert_eq!(step.checkpoint, t0() + Duration::hours(3));

        let step = decay_health(12, 100, t0(), t0() + Duration::hours(10));
        assert_eq!(step.value, 0);
    }

    #[test]
    fn test_decay_idempotent_at_same_instant() {
        let now = t0() + Duration::minutes(313);
        let first = decay_happiness(90, t0(), now);
        let second = decay_happiness(first.value, first.checkpoint, now);
        assert_eq!(first.value, second.value);
        assert_eq!(second.intervals, 0);

        let first = decay_hunger(0, t0(), now);
        let second = decay_hunger(first.value, first.checkpoint, now);
        assert_eq!(first.value, second.value);
        assert_eq!(second.intervals, 0);

        let first = decay_health(70, 100, t0(), now);
        let second = decay_health(first.value, 100, first.checkpoint, now);
        assert_eq!(first.value, second.value);
        assert_eq!(second.intervals, 0);
    }

    #[test]
    fn test_clock_going_backwards_is_noop() {
        let step = decay_happiness(50, t0(), t0() - Duration::hours(5));
        assert_eq!(step.value, 50);
        assert_eq!(step.checkpoint, t0());
    }

    #[test]
    fn test_starvation_onset() {
        // 90 -> 100 takes two blocks
        let step = decay_hunger(90, t0(), t0() + Duration::hours(10));
        assert_eq!(starvation_onset(90, t0(), &step), Some(t0() + Duration::hours(4)));
        // 93 -> 100 still needs two blocks (+5 each)
        let step = decay_hunger(93, t0(), t0() + Duration::hours(10));
        assert_eq!(starvation_onset(93, t0(), &step), Some(t0() + Duration::hours(4)));
        // already starving, no new onset
        let step = decay_hunger(100, t0(), t0() + Duration::hours(10));
        assert_eq!(starvation_onset(100, t0(), &step), None);
        // not starving yet
        let step = decay_hunger(10, t0(), t0() + Duration::hours(2));
        assert_eq!(starvation_onset(10, t0(), &step), None);
    }

    #[test]
    fn test_apply_decay_full_order() {
        let mut m = Monkey::new(1, t0());
        m.hunger = 90;
        m.happiness = 50;
        m.health = 100;

        // hunger hits 100 after 4h, health drains for the 6 hours after that
        let changed = m.apply_decay(t0() + Duration::hours(10));
        assert!(changed);
        assert_eq!(m.happiness, 0);
        assert_eq!(m.hunger, 100);
        assert_eq!(m.health, 70);
        assert_eq!(m.last_health_decay, t0() + Duration::hours(10));
    }

    #[test]
    fn test_apply_decay_no_backdated_health_penalty() {
        let mut m = Monkey::new(1, t0());
        m.hunger = 95;
        // stale health checkpoint from long before starvation
        m.last_health_decay = t0() - Duration::days(3);
        m.last_hunger_decay = t0();

        m.apply_decay(t0() + Duration::hours(2) + Duration::minutes(30));
        assert_eq!(m.hunger, 100);
        assert_eq!(m.health, 100);
        assert_eq!(m.last_health_decay, t0() + Duration::hours(2));

        m.apply_decay(t0() + Duration::hours(4));
        assert_eq!(m.health, 90);
    }

    #[test]
    fn test_apply_decay_reports_nothing_to_write() {
        let mut m = Monkey::new(1, t0());
        assert!(!m.apply_decay(t0() + Duration::minutes(59)));
        assert_eq!(m.happiness, 50);
        assert_eq!(m.last_happiness_decay, t0());
    }
}
