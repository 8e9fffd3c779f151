//! Callback data carried by inline keyboard buttons

use crate::game::ChallengeId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    MainMenu,
    MyMonkey,
    SelectFood,
    FoodInfo(u8),
    Feed(u8),
    Daily,
    Walk,
    Top,
    Help,
    Rename,
    /// Public card of any monkey
    MonkeyInfo(i64),
    ChallengeMenu,
    PickOpponent(i64),
    Bet { opponent: i64, stake: i64 },
    CancelChallenge,
    Accept(ChallengeId),
    Decline(ChallengeId),
}

impl CallbackAction {
    pub fn parse(data: &str) -> Option<Self> {
        let action = match data {
            "menu" => Self::MainMenu,
            "my" => Self::MyMonkey,
            "food" => Self::SelectFood,
            "daily" => Self::Daily,
            "walk" => Self::Walk,
            "top" => Self::Top,
            "help" => Self::Help,
            "rename" => Self::Rename,
            "fight" => Self::ChallengeMenu,
            "fight:cancel" => Self::CancelChallenge,
            _ => return Self::parse_with_args(data),
        };
        Some(action)
    }

    fn parse_with_args(data: &str) -> Option<Self> {
        if let Some(id) = data.strip_prefix("food:") {
            return id.parse().ok().map(Self::FoodInfo);
        }
        if let Some(id) = data.strip_prefix("feed:") {
            return id.parse().ok().map(Self::Feed);
        }
        if let Some(id) = data.strip_prefix("info:") {
            return id.parse().ok().map(Self::MonkeyInfo);
        }
        if let Some(id) = data.strip_prefix("fight:pick:") {
            return id.parse().ok().map(Self::PickOpponent);
        }
        if let Some(rest) = data.strip_prefix("fight:bet:") {
            let (opponent, stake) = rest.split_once(':')?;
            return Some(Self::Bet {
                opponent: opponent.parse().ok()?,
                stake: stake.parse().ok()?,
            });
        }
        if let Some(id) = data.strip_prefix("duel:accept:") {
            return (!id.is_empty()).then(|| Self::Accept(ChallengeId::from(id)));
        }
        if let Some(id) = data.strip_prefix("duel:decline:") {
            return (!id.is_empty()).then(|| Self::Decline(ChallengeId::from(id)));
        }
        None
    }

    pub fn data(&self) -> String {
        match self {
            Self::MainMenu => "menu".to_string(),
            Self::MyMonkey => "my".to_string(),
            Self::SelectFood => "food".to_string(),
            Self::FoodInfo(id) => format!("food:{}", id),
            Self::Feed(id) => format!("feed:{}", id),
            Self::Daily => "daily".to_string(),
            Self::Walk => "walk".to_string(),
            Self::Top => "top".to_string(),
            Self::Help => "help".to_string(),
            Self::Rename => "rename".to_string(),
            Self::MonkeyInfo(id) => format!("info:{}", id),
            Self::ChallengeMenu => "fight".to_string(),
            Self::PickOpponent(id) => format!("fight:pick:{}", id),
            Self::Bet { opponent, stake } => format!("fight:bet:{}:{}", opponent, stake),
            Self::CancelChallenge => "fight:cancel".to_string(),
            Self::Accept(id) => format!("duel:accept:{}", id),
            Self::Decline(id) => format!("duel:decline:{}", id),
        }
    }
}
