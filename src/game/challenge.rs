//! Live duel offers
//!
//! An offer goes `OFFERED -> {ACCEPTED | DECLINED | EXPIRED}`. Every terminal
//! transition goes through a claim that removes the entry under the lock, so
//! exactly one of them wins. Offers live in memory only and are lost on restart.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

use crate::db::Monkey;
use crate::error::{GameError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChallengeId(String);

impl ChallengeId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }
}

impl From<&str> for ChallengeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for ChallengeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A proposed duel waiting for the opponent
#[derive(Debug, Clone)]
pub struct Challenge {
    pub id: ChallengeId,
    pub challenger_user: i64,
    pub challenger_monkey: i64,
    pub challenger_name: String,
    pub opponent_user: i64,
    pub opponent_monkey: i64,
    pub opponent_name: String,
    pub stake: i64,
    pub created_at: DateTime<Utc>,
    /// Message id of the accept/decline prompt in the opponent's chat
    pub prompt_message: Option<i32>,
}

impl Challenge {
    pub fn new(challenger: &Monkey, opponent: &Monkey, stake: i64, now: DateTime<Utc>) -> Self {
        Self {
            id: ChallengeId::generate(),
            challenger_user: challenger.user_id,
            challenger_monkey: challenger.id,
            challenger_name: challenger.name.clone(),
            opponent_user: opponent.user_id,
            opponent_monkey: opponent.id,
            opponent_name: opponent.name.clone(),
            stake,
            created_at: now,
            prompt_message: None,
        }
    }
}

struct Pending {
    challenge: Challenge,
    timer: Option<AbortHandle>,
}

/// Owner of all open offers
#[derive(Clone, Default)]
pub struct ChallengeBook {
    pending: Arc<Mutex<HashMap<ChallengeId, Pending>>>,
}

impl ChallengeBook {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ChallengeId, Pending>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a new offer (NONE -> OFFERED)
    pub fn open(&self, challenge: Challenge) -> ChallengeId {
        let id = challenge.id.clone();
        info!(
            challenge_id = %id,
            challenger = challenge.challenger_user,
            opponent = challenge.opponent_user,
            stake = challenge.stake,
            "Challenge offered"
        );
        self.lock().insert(id.clone(), Pending { challenge, timer: None });
        id
    }

    /// Arm the expiry timer. `on_expire` runs only if nobody claimed the
    /// offer first; a claim aborts the timer. Returns false if the offer is
    /// already gone.
    pub fn schedule_expiry<F, Fut>(&self, id: &ChallengeId, after: Duration, on_expire: F) -> bool
    where
        F: FnOnce(Challenge) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut pending = self.lock();
        let Some(entry) = pending.get_mut(id) else {
            return false;
        };

        let book = self.clone();
        let expired_id = id.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let expired = book.lock().remove(&expired_id).map(|p| p.challenge);
            if let Some(challenge) = expired {
                info!(challenge_id = %challenge.id, "Challenge expired");
                on_expire(challenge).await;
            }
        });

        if let Some(previous) = entry.timer.replace(task.abort_handle()) {
            previous.abort();
        }
        true
    }

    /// Open an offer and deliver its prompt with `send`, which resolves to the
    /// prompt's message id. If delivery fails the offer is withdrawn before a
    /// timer exists; otherwise the expiry timer is armed.
    pub async fn deliver<S, SendFut, E, F, Fut>(
        &self,
        challenge: Challenge,
        timeout: Duration,
        send: S,
        on_expire: F,
    ) -> Result<ChallengeId>
    where
        S: FnOnce(Challenge) -> SendFut,
        SendFut: Future<Output = std::result::Result<i32, E>>,
        E: fmt::Display,
        F: FnOnce(Challenge) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let id = self.open(challenge.clone());
        match send(challenge).await {
            Ok(message_id) => {
                self.attach_prompt(&id, message_id);
                self.schedule_expiry(&id, timeout, on_expire);
                Ok(id)
            }
            Err(e) => {
                self.claim(&id);
                warn!(challenge_id = %id, error = %e, "Challenge not delivered");
                Err(GameError::OpponentUnreachable(e.to_string()))
            }
        }
    }

    pub fn attach_prompt(&self, id: &ChallengeId, message_id: i32) -> bool {
        match self.lock().get_mut(id) {
            Some(entry) => {
                entry.challenge.prompt_message = Some(message_id);
                true
            }
            None => false,
        }
    }

    /// Remove and return an offer, cancelling its timer
    pub fn claim(&self, id: &ChallengeId) -> Option<Challenge> {
        let entry = self.lock().remove(id)?;
        if let Some(timer) = entry.timer {
            timer.abort();
        }
        debug!(challenge_id = %id, "Challenge claimed");
        Some(entry.challenge)
    }

    /// Claim on behalf of the opponent answering the prompt.
    /// Nobody but the addressed opponent can resolve an offer.
    pub fn claim_as_opponent(&self, id: &ChallengeId, user_id: i64) -> Result<Challenge> {
        let entry = {
            let mut pending = self.lock();
            match pending.get(id) {
                None => return Err(GameError::ChallengeGone),
                Some(p) if p.challenge.opponent_user != user_id => {
                    return Err(GameError::NotYourChallenge);
                }
                Some(_) => {}
            }
            pending.remove(id).ok_or(GameError::ChallengeGone)?
        };
        if let Some(timer) = entry.timer {
            timer.abort();
        }
        Ok(entry.challenge)
    }

    #[cfg(test)]
    pub fn get(&self, id: &ChallengeId) -> Option<Challenge> {
        self.lock().get(id).map(|p| p.challenge.clone())
    }

    #[cfg(test)]
    pub fn contains(&self, id: &ChallengeId) -> bool {
        self.lock().contains_key(id)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
