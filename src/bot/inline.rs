//! Inline mode: `@bot <query>` from any chat

use std::sync::Arc;

use chrono::{DateTime, Utc};
use teloxide::prelude::*;
use teloxide::types::{
    InlineKeyboardMarkup, InlineQueryResult, InlineQueryResultArticle, InputMessageContent,
    InputMessageContentText,
};
use tracing::debug;

use super::{Db, HandlerResult, account, keyboards, texts};
use crate::config::Settings;
use crate::db::{Database, MonkeySummary};
use crate::error::Result;
use crate::game::{get_foods, service};

const SEARCH_LIMIT: usize = 5;
const CACHE_TIME_SECS: u32 = 60;

#[derive(Debug, PartialEq, Eq)]
enum Intent {
    Info,
    Feed,
    Fight,
    Top,
    Search(String),
}

fn classify(query: &str) -> Intent {
    let query = query.trim().to_lowercase();
    match query.as_str() {
        "" | "info" | "мой" | "макака" => Intent::Info,
        "feed" | "кормить" | "еда" => Intent::Feed,
        "fight" | "бой" | "драка" => Intent::Fight,
        "top" | "топ" | "рейтинг" => Intent::Top,
        _ => Intent::Search(query),
    }
}

fn article(
    id: impl Into<String>,
    title: impl Into<String>,
    description: impl Into<String>,
    text: String,
    keyboard: InlineKeyboardMarkup,
) -> InlineQueryResult {
    InlineQueryResult::Article(
        InlineQueryResultArticle::new(
            id,
            title,
            InputMessageContent::Text(InputMessageContentText::new(text)),
        )
        .description(description)
        .reply_markup(keyboard),
    )
}

fn summary_text(m: &MonkeySummary) -> String {
    let owner = m
        .username
        .as_deref()
        .map(|u| format!("\nВладелец: @{}", u))
        .unwrap_or_default();
    format!("🐒 {}\nВес: {} кг\nУровень: {}{}", m.name, m.weight, m.level, owner)
}

fn build_results(
    db: &Database,
    user_id: i64,
    intent: Intent,
    settings: &Settings,
    now: DateTime<Utc>,
) -> Result<Vec<InlineQueryResult>> {
    let results = match intent {
        Intent::Info => {
            let monkey = service::refresh_monkey(db, user_id, now)?;
            vec![article(
                "info",
                format!("🐒 {}", monkey.name),
                format!("Вес: {} кг, уровень {}", monkey.weight, monkey.level),
                texts::monkey_card(&monkey, now),
                keyboards::inline_actions(monkey.id),
            )]
        }

        Intent::Feed => get_foods()
            .iter()
            .map(|food| {
                article(
                    format!("food:{}", food.id),
                    food.title(),
                    format!("+{} кг, КД {}ч", food.weight_gain, food.cooldown_hours),
                    texts::food_info(food),
                    keyboards::food_info(food.id),
                )
            })
            .collect(),

        Intent::Fight => db
            .opponent_candidates(user_id, settings.opponent_choices)?
            .iter()
            .map(|c| {
                article(
                    format!("fight:{}", c.monkey_id),
                    format!("⚔️ {}", c.name),
                    format!("{} кг, ур. {}", c.weight, c.level),
                    format!("⚔️ Вызов на бой!\n\n{}", summary_text(c)),
                    keyboards::inline_actions(c.monkey_id),
                )
            })
            .collect(),

        Intent::Top => {
            let top = db.top_monkeys(settings.top_limit)?;
            vec![article(
                "top",
                "🏆 Топ макак",
                "Самые тяжёлые макаки",
                texts::top_short(&top),
                keyboards::back_to_menu(),
            )]
        }

        Intent::Search(fragment) => db
            .search_monkeys(&fragment, SEARCH_LIMIT)?
            .iter()
            .map(|m| {
                article(
                    format!("monkey:{}", m.monkey_id),
                    format!("🐒 {}", m.name),
                    format!("{} кг, ур. {}", m.weight, m.level),
                    summary_text(m),
                    keyboards::inline_actions(m.monkey_id),
                )
            })
            .collect(),
    };

    if results.is_empty() {
        return Ok(vec![article(
            "none",
            "😕 Ничего не найдено",
            "Попробуйте info, feed, fight или top",
            "😕 Ничего не найдено".to_string(),
            keyboards::back_to_menu(),
        )]);
    }
    Ok(results)
}

pub async fn handle_inline(bot: Bot, q: InlineQuery, db: Db, settings: Arc<Settings>) -> HandlerResult {
    let user = account(&q.from);
    let intent = classify(&q.query);
    debug!(user_id = user.id, ?intent, "Inline query");

    let results = {
        let db = db.lock().await;
        db.upsert_user(&user)?;
        build_results(&db, user.id, intent, &settings, Utc::now())?
    };

    bot.answer_inline_query(q.id, results)
        .cache_time(CACHE_TIME_SECS)
        .is_personal(true)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_keywords() {
        assert_eq!(classify(""), Intent::Info);
        assert_eq!(classify("  Мой "), Intent::Info);
        assert_eq!(classify("еда"), Intent::Feed);
        assert_eq!(classify("FIGHT"), Intent::Fight);
        assert_eq!(classify("рейтинг"), Intent::Top);
        assert_eq!(classify("Бобо"), Intent::Search("бобо".to_string()));
    }

    #[test]
    fn test_results_for_every_intent() {
        let db = Database::open_in_memory().unwrap();
        let now = Utc::now();
        db.get_or_create_monkey(1, now).unwrap();
        let settings = Settings::default();

        assert_eq!(build_results(&db, 1, Intent::Info, &settings, now).unwrap().len(), 1);
        assert_eq!(
            build_results(&db, 1, Intent::Feed, &settings, now).unwrap().len(),
            get_foods().len()
        );
        assert_eq!(build_results(&db, 1, Intent::Top, &settings, now).unwrap().len(), 1);
    }

    #[test]
    fn test_empty_search_falls_back() {
        let db = Database::open_in_memory().unwrap();
        let settings = Settings::default();
        let results =
            build_results(&db, 1, Intent::Search("nobody".into()), &settings, Utc::now()).unwrap();
        assert_eq!(results.len(), 1);
        match &results[0] {
            InlineQueryResult::Article(a) => assert_eq!(a.id, "none"),
            _ => panic!("expected article"),
        }
    }

    #[test]
    fn test_fight_without_opponents_falls_back() {
        let db = Database::open_in_memory().unwrap();
        db.get_or_create_monkey(1, Utc::now()).unwrap();
        let results =
            build_results(&db, 1, Intent::Fight, &Settings::default(), Utc::now()).unwrap();
        assert_eq!(results.len(), 1);
    }
}
