//! Duel resolution - eligibility, winner draw, stake transfer

use rand::Rng;

use super::{MIN_WEIGHT, clamp_stat};
use crate::db::Monkey;
use crate::error::{GameError, Ineligibility, Result};

/// A monkey this hungry or hungrier refuses to fight
pub const FIGHT_HUNGER_LIMIT: i64 = 70;

pub const WIN_EXPERIENCE: i64 = 25;
pub const LOSS_EXPERIENCE: i64 = 10;
pub const LOSS_HAPPINESS_PENALTY: i64 = 10;
pub const LOSS_HEALTH_PENALTY: i64 = 10;

/// Settled duel with both fighters' updated state
#[derive(Debug, Clone)]
pub struct DuelOutcome {
    pub winner: Monkey,
    pub loser: Monkey,
    pub stake: i64,
    /// What the loser actually lost, less than the stake at the weight floor
    pub weight_lost: i64,
    pub winner_levels: i64,
    pub loser_levels: i64,
}

impl DuelOutcome {
    pub fn is_winner(&self, monkey_id: i64) -> bool {
        self.winner.id == monkey_id
    }

    pub fn fighter(&self, monkey_id: i64) -> Option<&Monkey> {
        if self.winner.id == monkey_id {
            Some(&self.winner)
        } else if self.loser.id == monkey_id {
            Some(&self.loser)
        } else {
            None
        }
    }
}

pub fn validate_stake(stake: i64) -> Result<()> {
    if stake < 1 {
        return Err(GameError::InvalidStake(stake));
    }
    Ok(())
}

/// Check that a monkey can enter a duel for `stake`
pub fn check_eligible(monkey: &Monkey, stake: i64) -> Result<()> {
    let reason = if monkey.health <= 0 {
        Some(Ineligibility::NoHealth)
    } else if monkey.hunger >= FIGHT_HUNGER_LIMIT {
        Some(Ineligibility::TooHungry)
    } else if monkey.weight < stake {
        Some(Ineligibility::NotEnoughWeight)
    } else {
        None
    };
    match reason {
        Some(reason) => Err(GameError::NotEligible {
            name: monkey.name.clone(),
            reason,
        }),
        None => Ok(()),
    }
}

/// Pick a winner uniformly at random and settle the stake
pub fn resolve<R: Rng + ?Sized>(
    challenger: Monkey,
    opponent: Monkey,
    stake: i64,
    rng: &mut R,
) -> Result<DuelOutcome> {
    validate_stake(stake)?;
    check_eligible(&challenger, stake)?;
    check_eligible(&opponent, stake)?;

    let (mut winner, mut loser) = if rng.gen_bool(0.5) {
        (challenger, opponent)
    } else {
        (opponent, challenger)
    };

    let new_loser_weight = (loser.weight - stake).max(MIN_WEIGHT);
    let weight_lost = loser.weight - new_loser_weight;
    loser.weight = new_loser_weight;
    winner.weight += stake;

    loser.happiness = clamp_stat(loser.happiness - LOSS_HAPPINESS_PENALTY);
    loser.health = clamp_stat(loser.health - LOSS_HEALTH_PENALTY);

    let winner_levels = winner.gain_experience(WIN_EXPERIENCE);
    let loser_levels = loser.gain_experience(LOSS_EXPERIENCE);

    Ok(DuelOutcome {
        winner,
        loser,
        stake,
        weight_lost,
        winner_levels,
        loser_levels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn fighter(id: i64, weight: i64) -> Monkey {
        let mut m = Monkey::new(id * 10, Utc::now());
        m.id = id;
        m.name = format!("m{}", id);
        m.weight = weight;
        m
    }

    #[test]
    fn test_weight_transfer() {
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let out = resolve(fighter(1, 20), fighter(2, 30), 5, &mut rng).unwrap();
            let (winner_before, loser_before) = if out.winner.id == 1 { (20, 30) } else { (30, 20) };
            assert_eq!(out.winner.weight, winner_before + 5);
            assert_eq!(out.loser.weight, loser_before - 5);
            assert_eq!(out.weight_lost, 5);
        }
    }

    #[test]
    fn test_loser_weight_clamped_at_one() {
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let out = resolve(fighter(1, 10), fighter(2, 10), 10, &mut rng).unwrap();
            assert_eq!(out.winner.weight, 20);
            assert_eq!(out.loser.weight, 1);
            assert_eq!(out.weight_lost, 9);
        }
    }

    #[test]
    fn test_both_outcomes_happen() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut challenger_wins = 0;
        for _ in 0..200 {
            let out = resolve(fighter(1, 10), fighter(2, 10), 1, &mut rng).unwrap();
            if out.is_winner(1) {
                challenger_wins += 1;
            }
        }
        assert!(challenger_wins > 50 && challenger_wins < 150);
    }

    #[test]
    fn test_loser_penalties_and_experience() {
        let mut rng = StdRng::seed_from_u64(1);
        let out = resolve(fighter(1, 10), fighter(2, 10), 1, &mut rng).unwrap();
        assert_eq!(out.winner.experience, WIN_EXPERIENCE);
        assert_eq!(out.loser.experience, LOSS_EXPERIENCE);
        assert_eq!(out.loser.happiness, 50 - LOSS_HAPPINESS_PENALTY);
        assert_eq!(out.loser.health, 100 - LOSS_HEALTH_PENALTY);
        assert_eq!(out.winner.health, 100);
        assert_eq!(out.winner.happiness, 50);
    }

    #[test]
    fn test_winner_level_up_cascade() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut a = fighter(1, 10);
        a.experience = 90;
        let mut b = fighter(2, 10);
        b.experience = 95;
        let out = resolve(a, b, 1, &mut rng).unwrap();
        assert_eq!(out.winner_levels, 1);
        assert_eq!(out.winner.level, 2);
        assert_eq!(out.loser_levels, 1);
    }

    #[test]
    fn test_ineligible_fighters() {
        let mut rng = StdRng::seed_from_u64(0);

        let mut sick = fighter(1, 10);
        sick.health = 0;
        let err = resolve(sick, fighter(2, 10), 1, &mut rng).unwrap_err();
        assert!(matches!(err, GameError::NotEligible { reason: Ineligibility::NoHealth, .. }));

        let mut hungry = fighter(2, 10);
        hungry.hunger = FIGHT_HUNGER_LIMIT;
        let err = resolve(fighter(1, 10), hungry, 1, &mut rng).unwrap_err();
        assert!(matches!(err, GameError::NotEligible { reason: Ineligibility::TooHungry, .. }));

        let err = resolve(fighter(1, 4), fighter(2, 10), 5, &mut rng).unwrap_err();
        assert!(matches!(
            err,
            GameError::NotEligible { reason: Ineligibility::NotEnoughWeight, .. }
        ));
    }

    #[test]
    fn test_invalid_stake() {
        let mut rng = StdRng::seed_from_u64(0);
        let err = resolve(fighter(1, 10), fighter(2, 10), 0, &mut rng).unwrap_err();
        assert!(matches!(err, GameError::InvalidStake(0)));
    }
}
