//! Game error types

use chrono::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GameError {
    #[error("invalid monkey name: {0}")]
    InvalidName(String),

    #[error("unknown food id: {0}")]
    UnknownFood(u8),

    #[error("food {food} is on cooldown for {remaining}")]
    FoodCooldown { food: &'static str, remaining: Duration },

    #[error("daily reward not ready for {0}")]
    DailyNotReady(Duration),

    #[error("not enough weight: have {have}, need {need}")]
    NotEnoughWeight { have: i64, need: i64 },

    #[error("invalid stake: {0}")]
    InvalidStake(i64),

    #[error("cannot challenge own monkey")]
    SelfChallenge,

    #[error("monkey not found: {0}")]
    MonkeyNotFound(i64),

    #[error("challenge is no longer available")]
    ChallengeGone,

    #[error("challenge belongs to another user")]
    NotYourChallenge,

    #[error("opponent is unreachable: {0}")]
    OpponentUnreachable(String),

    #[error("monkey {name} cannot fight: {reason}")]
    NotEligible { name: String, reason: Ineligibility },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Why a monkey cannot take part in a duel right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ineligibility {
    NoHealth,
    TooHungry,
    NotEnoughWeight,
}

impl std::fmt::Display for Ineligibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Ineligibility::NoHealth => "no health left",
            Ineligibility::TooHungry => "too hungry",
            Ineligibility::NotEnoughWeight => "not enough weight for the stake",
        };
        f.write_str(text)
    }
}

pub type Result<T> = std::result::Result<T, GameError>;

/// Format a duration as "Xч Yм"
pub fn format_remaining(d: Duration) -> String {
    let mins = d.num_minutes().max(0);
    format!("{}ч {}м", mins / 60, mins % 60)
}

impl GameError {
    /// Internal failures are logged and hidden behind a generic message
    pub fn is_internal(&self) -> bool {
        matches!(self, GameError::Database(_))
    }

    /// Text shown to the player
    pub fn user_message(&self) -> String {
        match self {
            GameError::InvalidName(_) => {
                "❌ Имя должно быть от 2 до 20 символов: буквы, цифры, пробел, дефис или подчёркивание".to_string()
            }
            GameError::UnknownFood(_) => "❌ Еда не найдена".to_string(),
            GameError::FoodCooldown { food, remaining } => format!(
                "⏳ Нельзя кормить этой едой!\n\nДо следующего кормления {}:\n{}\n\nВыберите другую еду.",
                food,
                format_remaining(*remaining)
            ),
            GameError::DailyNotReady(remaining) => format!(
                "⏳ Ежедневная награда еще не доступна!\n\nСледующая награда через:\n{}\n\nЗаходите завтра!",
                format_remaining(*remaining)
            ),
            GameError::NotEnoughWeight { have, .. } => {
                format!("❌ Недостаточно веса. У вас: {} кг", have)
            }
            GameError::InvalidStake(_) => "❌ Недопустимая ставка".to_string(),
            GameError::SelfChallenge => "❌ Нельзя вызвать на бой самого себя".to_string(),
            GameError::MonkeyNotFound(_) => "❌ Макака не найдена".to_string(),
            GameError::ChallengeGone => "⌛ Вызов больше не действителен".to_string(),
            GameError::NotYourChallenge => "❌ Этот вызов адресован не вам".to_string(),
            GameError::OpponentUnreachable(_) => {
                "❌ Не удалось доставить вызов сопернику. Возможно, он ещё не запускал бота.".to_string()
            }
            GameError::NotEligible { name, reason } => {
                let why = match reason {
                    Ineligibility::NoHealth => "нет здоровья",
                    Ineligibility::TooHungry => "слишком голодна",
                    Ineligibility::NotEnoughWeight => "не хватает веса для ставки",
                };
                format!("❌ Бой отменён: макака {} не может драться ({})", name, why)
            }
            GameError::Database(_) => "❌ Произошла ошибка, попробуйте позже".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_error_is_internal() {
        let err = GameError::from(rusqlite::Error::InvalidQuery);
        assert!(err.is_internal());
        assert!(err.to_string().contains("database error"));
    }

    #[test]
    fn test_validation_errors_are_user_facing() {
        assert!(!GameError::SelfChallenge.is_internal());
        assert!(!GameError::ChallengeGone.is_internal());
        assert!(!GameError::NotEnoughWeight { have: 2, need: 5 }.is_internal());
    }

    #[test]
    fn test_not_enough_weight_message_shows_current_weight() {
        let err = GameError::NotEnoughWeight { have: 3, need: 10 };
        assert!(err.user_message().contains("3 кг"));
    }

    #[test]
    fn test_format_remaining() {
        assert_eq!(format_remaining(Duration::minutes(125)), "2ч 5м");
        assert_eq!(format_remaining(Duration::seconds(59)), "0ч 0м");
        assert_eq!(format_remaining(Duration::minutes(-5)), "0ч 0м");
    }

    #[test]
    fn test_ineligible_message_names_monkey() {
        let err = GameError::NotEligible {
            name: "Бобо".to_string(),
            reason: Ineligibility::TooHungry,
        };
        let text = err.user_message();
        assert!(text.contains("Бобо"));
        assert!(text.contains("голодна"));
    }
}
