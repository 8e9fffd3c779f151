//! Player actions - read, decay, mutate, write
//!
//! Callers hold the database lock for the whole call, so each action is a
//! consistent read-modify-write within this process.

use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::info;

use super::{Challenge, DuelOutcome, Food, duel, find_food, validate_name};
use crate::db::{Database, Monkey};
use crate::error::{GameError, Result};

fn persist_decay(db: &Database, mut monkey: Monkey, now: DateTime<Utc>) -> Result<Monkey> {
    if monkey.apply_decay(now) {
        db.save_monkey(&monkey)?;
    }
    Ok(monkey)
}

/// Current state of a user's monkey with decay applied
pub fn refresh_monkey(db: &Database, user_id: i64, now: DateTime<Utc>) -> Result<Monkey> {
    let monkey = db.get_or_create_monkey(user_id, now)?;
    persist_decay(db, monkey, now)
}

pub fn refresh_monkey_by_id(db: &Database, monkey_id: i64, now: DateTime<Utc>) -> Result<Monkey> {
    let monkey = db
        .get_monkey(monkey_id)?
        .ok_or(GameError::MonkeyNotFound(monkey_id))?;
    persist_decay(db, monkey, now)
}

pub fn feed(
    db: &Database,
    user_id: i64,
    food_id: u8,
    now: DateTime<Utc>,
) -> Result<(Monkey, &'static Food)> {
    let food = find_food(food_id).ok_or(GameError::UnknownFood(food_id))?;
    let mut monkey = refresh_monkey(db, user_id, now)?;
    monkey.feed(food, now)?;
    db.save_monkey(&monkey)?;
    info!(user_id, monkey_id = monkey.id, food = food.name, weight = monkey.weight, "Monkey fed");
    Ok((monkey, food))
}

pub fn walk(db: &Database, user_id: i64, now: DateTime<Utc>) -> Result<Monkey> {
    let mut monkey = refresh_monkey(db, user_id, now)?;
    monkey.walk();
    db.save_monkey(&monkey)?;
    Ok(monkey)
}

pub fn claim_daily(db: &Database, user_id: i64, now: DateTime<Utc>) -> Result<Monkey> {
    let mut monkey = refresh_monkey(db, user_id, now)?;
    monkey.claim_daily(now)?;
    db.save_monkey(&monkey)?;
    info!(user_id, monkey_id = monkey.id, "Daily reward claimed");
    Ok(monkey)
}

pub fn rename(db: &Database, user_id: i64, raw_name: &str, now: DateTime<Utc>) -> Result<Monkey> {
    let name = validate_name(raw_name)?;
    let mut monkey = refresh_monkey(db, user_id, now)?;
    monkey.name = name;
    db.save_monkey(&monkey)?;
    Ok(monkey)
}

/// Validate an offer and build it; nothing is recorded yet
pub fn prepare_challenge(
    db: &Database,
    challenger_user: i64,
    opponent_monkey: i64,
    stake: i64,
    now: DateTime<Utc>,
) -> Result<Challenge> {
    duel::validate_stake(stake)?;
    let challenger = refresh_monkey(db, challenger_user, now)?;
    if challenger.weight < stake {
        return Err(GameError::NotEnoughWeight {
            have: challenger.weight,
            need: stake,
        });
    }
    let opponent = refresh_monkey_by_id(db, opponent_monkey, now)?;
    if opponent.user_id == challenger_user {
        return Err(GameError::SelfChallenge);
    }
    Ok(Challenge::new(&challenger, &opponent, stake, now))
}

/// Settle an accepted offer. Preconditions are checked again on current state;
/// on failure nothing but pending decay is written.
pub fn settle_challenge<R: Rng + ?Sized>(
    db: &Database,
    challenge: &Challenge,
    rng: &mut R,
    now: DateTime<Utc>,
) -> Result<DuelOutcome> {
    let challenger = refresh_monkey_by_id(db, challenge.challenger_monkey, now)?;
    let opponent = refresh_monkey_by_id(db, challenge.opponent_monkey, now)?;

    let outcome = duel::resolve(challenger, opponent, challenge.stake, rng)?;
    let fight_id = db.apply_duel(&outcome, challenge.challenger_monkey, now)?;

    info!(
        challenge_id = %challenge.id,
        fight_id,
        winner = outcome.winner.id,
        loser = outcome.loser.id,
        stake = outcome.stake,
        "Duel settled"
    );
    Ok(outcome)
}
