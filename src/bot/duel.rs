//! Duel flow: opponent choice, offer, answer and expiry

use chrono::Utc;
use teloxide::prelude::*;
use teloxide::types::MessageId;
use tracing::{error, info, warn};

use super::media::{self, MediaKind};
use super::{Db, HandlerResult, Target, keyboards, show, texts};
use crate::config::Settings;
use crate::error::GameError;
use crate::game::{Challenge, ChallengeBook, ChallengeId, DuelOutcome, service};

pub async fn show_opponents(
    bot: &Bot,
    target: Target,
    user_id: i64,
    db: &Db,
    settings: &Settings,
) -> HandlerResult {
    let (monkey, candidates) = {
        let db = db.lock().await;
        let monkey = service::refresh_monkey(&db, user_id, Utc::now())?;
        let candidates = db.opponent_candidates(user_id, settings.opponent_choices)?;
        (monkey, candidates)
    };

    if candidates.is_empty() {
        show(bot, target, texts::no_opponents(), keyboards::back_to_menu()).await
    } else {
        show(bot, target, texts::choose_opponent(&monkey), keyboards::opponents(&candidates)).await
    }
}

pub async fn pick_opponent(
    bot: &Bot,
    target: Target,
    user_id: i64,
    opponent_id: i64,
    db: &Db,
) -> HandlerResult {
    let (monkey, opponent) = {
        let db = db.lock().await;
        let now = Utc::now();
        let monkey = service::refresh_monkey(&db, user_id, now)?;
        let opponent = service::refresh_monkey_by_id(&db, opponent_id, now)?;
        (monkey, opponent)
    };
    if opponent.user_id == user_id {
        return Err(GameError::SelfChallenge.into());
    }

    show(
        bot,
        target,
        texts::choose_bet(&monkey, &opponent),
        keyboards::bets(opponent.id, monkey.weight),
    )
    .await
}

/// Open an offer and deliver the prompt to the opponent.
/// If the prompt cannot be delivered the offer is withdrawn at once.
#[allow(clippy::too_many_arguments)]
pub async fn offer(
    bot: &Bot,
    target: Target,
    user_id: i64,
    opponent_id: i64,
    stake: i64,
    db: &Db,
    book: &ChallengeBook,
    settings: &Settings,
) -> HandlerResult {
    let challenge = {
        let db = db.lock().await;
        service::prepare_challenge(&db, user_id, opponent_id, stake, Utc::now())?
    };
    let timeout_secs = settings.challenge_timeout.as_secs();
    let expiry_bot = bot.clone();
    book.deliver(
        challenge.clone(),
        settings.challenge_timeout,
        |offer| async move {
            bot.send_message(
                ChatId(offer.opponent_user),
                texts::challenge_prompt(&offer, timeout_secs),
            )
            .reply_markup(keyboards::challenge_response(&offer.id))
            .await
            .map(|prompt| prompt.id.0)
        },
        move |expired| notify_expired(expiry_bot, expired),
    )
    .await?;

    show(
        bot,
        target,
        texts::challenge_sent(&challenge, timeout_secs),
        keyboards::back_to_menu(),
    )
    .await
}

async fn notify_expired(bot: Bot, challenge: Challenge) {
    if let Err(e) = bot
        .send_message(
            ChatId(challenge.challenger_user),
            texts::challenge_expired_for_challenger(&challenge),
        )
        .await
    {
        warn!(challenge_id = %challenge.id, error = %e, "Failed to notify challenger about expiry");
    }

    if let Some(message_id) = challenge.prompt_message {
        if let Err(e) = bot
            .edit_message_text(
                ChatId(challenge.opponent_user),
                MessageId(message_id),
                texts::challenge_expired_prompt(&challenge),
            )
            .await
        {
            warn!(challenge_id = %challenge.id, error = %e, "Failed to close expired prompt");
        }
    }
}

pub async fn accept(
    bot: &Bot,
    target: Target,
    user_id: i64,
    id: &ChallengeId,
    db: &Db,
    book: &ChallengeBook,
    settings: &Settings,
) -> HandlerResult {
    let challenge = book.claim_as_opponent(id, user_id)?;
    let settled = {
        let db = db.lock().await;
        service::settle_challenge(&db, &challenge, &mut rand::thread_rng(), Utc::now())
    };

    let outcome = match settled {
        Ok(outcome) => outcome,
        Err(e) => return abort(bot, target, &challenge, &e).await,
    };

    let challenger_chat = ChatId(challenge.challenger_user);
    let opponent_chat = target.chat_id;
    for chat in [challenger_chat, opponent_chat] {
        media::send_animation(bot, chat, &settings.media_dir, MediaKind::Fight, "start", "").await;
    }

    show(
        bot,
        target,
        texts::duel_result(&outcome, challenge.opponent_monkey),
        keyboards::after_fight(),
    )
    .await?;
    if let Err(e) = bot
        .send_message(
            challenger_chat,
            texts::duel_result(&outcome, challenge.challenger_monkey),
        )
        .reply_markup(keyboards::after_fight())
        .await
    {
        warn!(challenge_id = %challenge.id, error = %e, "Failed to send result to challenger");
    }

    send_verdict(bot, challenger_chat, &outcome, challenge.challenger_monkey, settings).await;
    send_verdict(bot, opponent_chat, &outcome, challenge.opponent_monkey, settings).await;
    Ok(())
}

async fn send_verdict(bot: &Bot, chat: ChatId, outcome: &DuelOutcome, monkey_id: i64, settings: &Settings) {
    let key = if outcome.is_winner(monkey_id) { "win" } else { "lose" };
    let weight = outcome
        .fighter(monkey_id)
        .map(texts::current_weight)
        .unwrap_or_default();
    media::send_animation(bot, chat, &settings.media_dir, MediaKind::Fight, key, &weight).await;
}

/// The offer was claimed but could not be settled; tell both sides
async fn abort(bot: &Bot, target: Target, challenge: &Challenge, err: &GameError) -> HandlerResult {
    let text = abort_text(challenge, err);

    if let Err(e) = bot
        .send_message(ChatId(challenge.challenger_user), text.clone())
        .await
    {
        warn!(challenge_id = %challenge.id, error = %e, "Failed to notify challenger");
    }
    show(bot, target, text, keyboards::back_to_menu()).await
}

/// Notice sent to both parties when an accepted offer cannot be settled
fn abort_text(challenge: &Challenge, err: &GameError) -> String {
    let reason = if err.is_internal() {
        error!(challenge_id = %challenge.id, error = %err, "Duel settlement failed");
        texts::GENERIC_ERROR.to_string()
    } else {
        info!(challenge_id = %challenge.id, reason = %err, "Duel cancelled");
        err.user_message()
    };
    texts::challenge_aborted(&reason)
}

pub async fn decline(
    bot: &Bot,
    target: Target,
    user_id: i64,
    id: &ChallengeId,
    book: &ChallengeBook,
) -> HandlerResult {
    let challenge = book.claim_as_opponent(id, user_id)?;
    info!(challenge_id = %challenge.id, "Challenge declined");

    if let Err(e) = bot
        .send_message(
            ChatId(challenge.challenger_user),
            texts::challenge_declined_for_challenger(&challenge),
        )
        .await
    {
        warn!(challenge_id = %challenge.id, error = %e, "Failed to notify challenger");
    }
    show(
        bot,
        target,
        texts::challenge_declined_prompt(&challenge),
        keyboards::back_to_menu(),
    )
    .await
}
