//! Inline keyboards

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use super::callback::CallbackAction;
use crate::db::MonkeySummary;
use crate::game::{ChallengeId, STAKES, get_foods};

fn button(label: impl Into<String>, action: CallbackAction) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(label, action.data())
}

fn back_row() -> Vec<InlineKeyboardButton> {
    vec![button("⬅️ В меню", CallbackAction::MainMenu)]
}

pub fn main_menu() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![button("🐒 Моя макака", CallbackAction::MyMonkey)],
        vec![
            button("🍌 Покормить", CallbackAction::SelectFood),
            button("🎁 Ежедневная награда", CallbackAction::Daily),
        ],
        vec![
            button("⚔️ Вызвать на бой", CallbackAction::ChallengeMenu),
            button("🚶 Выгулять", CallbackAction::Walk),
        ],
        vec![
            button("🏆 Топ по весу", CallbackAction::Top),
            button("✏️ Имя", CallbackAction::Rename),
        ],
        vec![button("ℹ️ Помощь", CallbackAction::Help)],
    ])
}

/// Food choice, two per row
pub fn food_selection() -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = get_foods()
        .chunks(2)
        .map(|chunk| {
            chunk
                .iter()
                .map(|food| {
                    let label = format!("{} (+{} кг)", food.title(), food.weight_gain);
                    button(label, CallbackAction::FoodInfo(food.id))
                })
                .collect()
        })
        .collect();
    rows.push(vec![button("⬅️ Назад", CallbackAction::MainMenu)]);
    InlineKeyboardMarkup::new(rows)
}

pub fn food_info(food_id: u8) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![button("✅ Покормить этой едой", CallbackAction::Feed(food_id))],
        vec![button("⬅️ Выбрать другую еду", CallbackAction::SelectFood)],
    ])
}

pub fn opponents(candidates: &[MonkeySummary]) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = candidates
        .iter()
        .map(|c| {
            let label = format!("🐒 {} ({} кг, ур. {})", c.name, c.weight, c.level);
            vec![button(label, CallbackAction::PickOpponent(c.monkey_id))]
        })
        .collect();
    rows.push(vec![button("🔄 Другие соперники", CallbackAction::ChallengeMenu)]);
    rows.push(back_row());
    InlineKeyboardMarkup::new(rows)
}

/// Stakes the challenger can afford
pub fn bets(opponent: i64, weight: i64) -> InlineKeyboardMarkup {
    let affordable: Vec<i64> = STAKES.iter().copied().filter(|s| *s <= weight).collect();
    let mut rows: Vec<Vec<InlineKeyboardButton>> = affordable
        .chunks(2)
        .map(|chunk| {
            chunk
                .iter()
                .map(|stake| button(format!("{} кг", stake), CallbackAction::Bet { opponent, stake: *stake }))
                .collect()
        })
        .collect();
    rows.push(vec![button("❌ Отмена", CallbackAction::CancelChallenge)]);
    InlineKeyboardMarkup::new(rows)
}

pub fn challenge_response(id: &ChallengeId) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        button("🥊 Принять бой", CallbackAction::Accept(id.clone())),
        button("❌ Отклонить", CallbackAction::Decline(id.clone())),
    ]])
}

pub fn after_fight() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![button("⚔️ Новый бой", CallbackAction::ChallengeMenu)],
        back_row(),
    ])
}

pub fn back_to_menu() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![back_row()])
}

/// Buttons attached to messages sent through inline mode
pub fn inline_actions(monkey_id: i64) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            button("🐒 Инфо", CallbackAction::MonkeyInfo(monkey_id)),
            button("🍌 Кормить", CallbackAction::SelectFood),
        ],
        vec![
            button("⚔️ Вызвать на бой", CallbackAction::PickOpponent(monkey_id)),
            button("🏆 Топ", CallbackAction::Top),
        ],
    ])
}
