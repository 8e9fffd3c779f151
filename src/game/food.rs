//! Food catalog - what a monkey can eat

use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone)]
pub struct Food {
    pub id: u8,
    pub name: &'static str,
    pub emoji: &'static str,
    pub weight_gain: i64,
    pub happiness_gain: i64,
    pub hunger_decrease: i64,
    pub cooldown_hours: i64,
    /// Key of the feeding animation
    pub media_key: &'static str,
}

pub const FOODS: &[Food] = &[
    Food {
        id: 1,
        name: "Банан",
        emoji: "🍌",
        weight_gain: 1,
        happiness_gain: 10,
        hunger_decrease: 30,
        cooldown_hours: 5,
        media_key: "banana",
    },
    Food {
        id: 2,
        name: "Мясо",
        emoji: "🥩",
        weight_gain: 3,
        happiness_gain: 5,
        hunger_decrease: 50,
        cooldown_hours: 8,
        media_key: "meat",
    },
    Food {
        id: 3,
        name: "Торт",
        emoji: "🍰",
        weight_gain: 5,
        happiness_gain: 20,
        hunger_decrease: 70,
        cooldown_hours: 12,
        media_key: "cake",
    },
    Food {
        id: 4,
        name: "Салат",
        emoji: "🥗",
        weight_gain: 2,
        happiness_gain: 15,
        hunger_decrease: 40,
        cooldown_hours: 6,
        media_key: "salad",
    },
];

impl Food {
    pub fn title(&self) -> String {
        format!("{} {}", self.emoji, self.name)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::hours(self.cooldown_hours)
    }

    /// Time left until this food may be given again, None if allowed now
    pub fn cooldown_remaining(
        &self,
        last_fed: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Option<Duration> {
        let last_fed = last_fed?;
        let ready_at = last_fed + self.cooldown();
        if now >= ready_at {
            None
        } else {
            Some(ready_at - now)
        }
    }
}

pub fn get_foods() -> &'static [Food] {
    FOODS
}

pub fn find_food(id: u8) -> Option<&'static Food> {
    FOODS.iter().find(|f| f.id == id)
}
