//! Message texts

use chrono::{DateTime, Utc};

use crate::db::{Monkey, MonkeySummary};
use crate::error::format_remaining;
use crate::game::care::{DAILY_HAPPINESS, DAILY_WEIGHT, WALK_HAPPINESS, daily_remaining};
use crate::game::duel::FIGHT_HUNGER_LIMIT;
use crate::game::level::EXPERIENCE_PER_LEVEL;
use crate::game::{Challenge, DuelOutcome, Food, STAT_MAX, get_foods};

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━";
const MEDALS: &[&str] = &["🥇", "🥈", "🥉"];

pub const GENERIC_ERROR: &str = "❌ Произошла ошибка, попробуйте позже";

pub fn welcome() -> String {
    "🎮 Добро пожаловать в Боевые Макаки! 🐒\n\n\
    • 🍽️ 4 вида еды с разными эффектами\n\
    • 🎁 Ежедневная награда (+1 кг каждый день)\n\
    • ⚔️ Бои на вес с другими игроками\n\
    • 🎯 Инлайн-режим: напишите @бот в любом чате\n\n\
    👇 Выбери действие:"
        .to_string()
}

pub fn help() -> String {
    let mut text = String::from(
        "📖 Помощь по игре\n\n\
        Команды:\n\
        /start - начать игру\n\
        /my - моя макака\n\
        /top - топ игроков\n\
        /name - переименовать макаку\n\
        /help - эта справка\n\n\
        Инлайн-режим: info, feed, fight, top или часть имени макаки\n\n\
        Виды еды:\n",
    );
    for food in get_foods() {
        text.push_str(&format!(
            "{}: +{} кг, КД {}ч\n",
            food.title(),
            food.weight_gain,
            food.cooldown_hours
        ));
    }
    text.push_str(&format!(
        "\nМакака голодает со временем и грустит без внимания. \
        Голодная макака (голод {}+) не дерётся, а изголодавшаяся теряет здоровье.",
        FIGHT_HUNGER_LIMIT
    ));
    text
}

pub fn monkey_card(monkey: &Monkey, now: DateTime<Utc>) -> String {
    let daily = match daily_remaining(monkey.last_daily, now) {
        None => "✅ Доступна".to_string(),
        Some(left) => format!("⏳ Через: {}", format_remaining(left)),
    };
    format!(
        "🐒 {}\n{}\n\
        🏋️ Вес: {} кг\n\
        ⭐ Уровень: {}\n\
        📊 Опыт: {}/{}\n\
        ❤️ Здоровье: {}/{}\n\
        🍖 Сытость: {}/{}\n\
        😊 Настроение: {}/{}\n\
        {}\n\
        🎁 Ежедневная награда: {}",
        monkey.name,
        RULE,
        monkey.weight,
        monkey.level,
        monkey.experience,
        EXPERIENCE_PER_LEVEL,
        monkey.health,
        STAT_MAX,
        monkey.satiety(),
        STAT_MAX,
        monkey.happiness,
        STAT_MAX,
        RULE,
        daily
    )
}

/// Short card shown to other players
pub fn public_card(monkey: &Monkey, fights: (i64, i64)) -> String {
    format!(
        "🐒 {}\nВес: {} кг\nУровень: {}\nОпыт: {}/{}\nБоёв: {} (побед: {})",
        monkey.name,
        monkey.weight,
        monkey.level,
        monkey.experience,
        EXPERIENCE_PER_LEVEL,
        fights.0,
        fights.1
    )
}

pub fn food_menu() -> String {
    let mut text = String::from("🍽️ Выберите еду для макаки:\n\n");
    for food in get_foods() {
        text.push_str(&format!(
            "{}: +{} кг, КД {}ч\n",
            food.title(),
            food.weight_gain,
            food.cooldown_hours
        ));
    }
    text
}

pub fn food_info(food: &Food) -> String {
    format!(
        "{}\n{}\n\
        🏋️ Прибавка веса: +{} кг\n\
        😊 Радость: +{}\n\
        🍖 Сытость: +{}\n\
        ⏳ Кулдаун: {} часов\n\
        {}\n\
        Покормить макаку этой едой?",
        food.title(),
        RULE,
        food.weight_gain,
        food.happiness_gain,
        food.hunger_decrease,
        food.cooldown_hours,
        RULE
    )
}

pub fn fed(monkey: &Monkey, food: &Food) -> String {
    format!(
        "✅ Макака накормлена!\n\n🍽️ {}\n🏋️ Вес: {} кг\n😊 Настроение: {}/{}\n🍖 Сытость: {}/{}",
        food.title(),
        monkey.weight,
        monkey.happiness,
        STAT_MAX,
        monkey.satiety(),
        STAT_MAX
    )
}

pub fn daily_claimed(monkey: &Monkey) -> String {
    format!(
        "✅ Ежедневная награда получена!\n\n🎁 +{} кг к весу\n😊 +{} к настроению\n🏋️ Текущий вес: {} кг",
        DAILY_WEIGHT, DAILY_HAPPINESS, monkey.weight
    )
}

pub fn walked(monkey: &Monkey) -> String {
    format!(
        "🚶 Прогулка успешна!\n\n😊 Настроение: +{}\nТекущее настроение: {}/{}",
        WALK_HAPPINESS, monkey.happiness, STAT_MAX
    )
}

pub fn current_weight(monkey: &Monkey) -> String {
    format!("Текущий вес: {} кг", monkey.weight)
}

pub fn top(entries: &[MonkeySummary]) -> String {
    if entries.is_empty() {
        return "📊 Топ пуст!\nБудьте первым!".to_string();
    }
    let mut lines = vec![format!("🏆 ТОП-{} МАКАК 🏆", entries.len()), RULE.to_string()];
    for (idx, entry) in entries.iter().enumerate() {
        let place = MEDALS
            .get(idx)
            .map(|m| m.to_string())
            .unwrap_or_else(|| format!("{}.", idx + 1));
        let owner = entry
            .username
            .as_deref()
            .map(|u| format!("@{}", u))
            .unwrap_or_else(|| "Без юзернейма".to_string());
        lines.push(format!(
            "{} {}\n   🏋️ {} кг | ⭐ Ур. {}\n   👤 {}",
            place, entry.name, entry.weight, entry.level, owner
        ));
    }
    lines.push(RULE.to_string());
    lines.join("\n")
}

pub fn top_short(entries: &[MonkeySummary]) -> String {
    if entries.is_empty() {
        return "🏆 Топ пуст!".to_string();
    }
    let mut text = String::from("🏆 ТОП МАКАК:\n");
    for (idx, entry) in entries.iter().enumerate() {
        let place = MEDALS.get(idx).copied().unwrap_or("•");
        text.push_str(&format!("{} {} - {} кг\n", place, entry.name, entry.weight));
    }
    text
}

pub fn choose_opponent(monkey: &Monkey) -> String {
    format!(
        "⚔️ Выберите соперника\n{}\n🐒 Вы: {}\n🏋️ Вес: {} кг",
        RULE, monkey.name, monkey.weight
    )
}

pub fn no_opponents() -> String {
    "😕 Соперников не найдено!\nПригласите друзей!".to_string()
}

pub fn choose_bet(monkey: &Monkey, opponent: &Monkey) -> String {
    format!(
        "⚔️ Соперник найден!\n{}\n🐒 Вы: {}\n🏋️ Вес: {} кг\n\n🥊 Соперник: {}\n🏋️ Вес: {} кг\n{}\n👇 Выберите ставку:",
        RULE, monkey.name, monkey.weight, opponent.name, opponent.weight, RULE
    )
}

pub fn challenge_sent(challenge: &Challenge, timeout_secs: u64) -> String {
    format!(
        "📨 Вызов отправлен!\n\n🥊 Соперник: {}\n💰 Ставка: {} кг\n⏳ Ждём ответа {} сек.",
        challenge.opponent_name, challenge.stake, timeout_secs
    )
}

pub fn challenge_prompt(challenge: &Challenge, timeout_secs: u64) -> String {
    format!(
        "⚔️ Вас вызывают на бой!\n{}\n🐒 {} вызывает вашу макаку {}\n💰 Ставка: {} кг\n{}\n⏳ На ответ {} сек.",
        RULE, challenge.challenger_name, challenge.opponent_name, challenge.stake, RULE, timeout_secs
    )
}

pub fn challenge_expired_for_challenger(challenge: &Challenge) -> String {
    format!(
        "⌛ {} не ответил(а) на вызов ({} кг). Бой не состоялся.",
        challenge.opponent_name, challenge.stake
    )
}

pub fn challenge_expired_prompt(challenge: &Challenge) -> String {
    format!(
        "⌛ Вызов от {} истёк ({} кг).",
        challenge.challenger_name, challenge.stake
    )
}

pub fn challenge_declined_for_challenger(challenge: &Challenge) -> String {
    format!("❌ {} отклонил(а) ваш вызов.", challenge.opponent_name)
}

pub fn challenge_declined_prompt(challenge: &Challenge) -> String {
    format!("❌ Вы отклонили вызов от {}.", challenge.challenger_name)
}

pub fn challenge_aborted(reason: &str) -> String {
    format!("{}\n\nСтавки не списаны.", reason)
}

/// Fight summary from the point of view of `monkey_id`
pub fn duel_result(outcome: &DuelOutcome, monkey_id: i64) -> String {
    let won = outcome.is_winner(monkey_id);
    let (me, other) = if won {
        (&outcome.winner, &outcome.loser)
    } else {
        (&outcome.loser, &outcome.winner)
    };
    let (icon, verdict, levels) = if won {
        (
            "🎉",
            format!("Вы победили {} и забираете {} кг!", other.name, outcome.stake),
            outcome.winner_levels,
        )
    } else {
        (
            "😔",
            format!("{} победил(а). Вы теряете {} кг.", other.name, outcome.weight_lost),
            outcome.loser_levels,
        )
    };
    let mut text = format!(
        "{} БОЙ ЗАВЕРШЁН!\n{}\n{}\n\n🏋️ Ваш вес: {} кг\n⭐ Уровень: {} ({}/{})\n❤️ Здоровье: {}/{}\n😊 Настроение: {}/{}",
        icon,
        RULE,
        verdict,
        me.weight,
        me.level,
        me.experience,
        EXPERIENCE_PER_LEVEL,
        me.health,
        STAT_MAX,
        me.happiness,
        STAT_MAX
    );
    if levels > 0 {
        text.push_str(&format!("\n🆙 Новый уровень! +{}", levels));
    }
    text.push('\n');
    text.push_str(RULE);
    text
}

pub fn rename_prompt() -> String {
    "✏️ Введите новое имя макаки (2-20 символов: буквы, цифры, пробел, - или _)".to_string()
}

pub fn renamed(monkey: &Monkey) -> String {
    format!("✅ Теперь вашу макаку зовут {}", monkey.name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::duel;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn monkey(id: i64, name: &str) -> Monkey {
        let mut m = Monkey::new(id * 100, Utc::now());
        m.id = id;
        m.name = name.to_string();
        m
    }

    #[test]
    fn test_card_shows_satiety() {
        let mut m = monkey(1, "Бобо");
        m.hunger = 30;
        let card = monkey_card(&m, Utc::now());
        assert!(card.contains("Бобо"));
        assert!(card.contains("Сытость: 70/100"));
        assert!(card.contains("✅ Доступна"));
    }

    #[test]
    fn test_top_medals_and_numbers() {
        let entries: Vec<MonkeySummary> = (1..=4)
            .map(|i| MonkeySummary {
                monkey_id: i,
                user_id: i,
                name: format!("m{}", i),
                weight: 50 - i,
                level: 1,
                username: (i % 2 == 0).then(|| format!("u{}", i)),
            })
            .collect();
        let text = top(&entries);
        assert!(text.contains("🥇 m1"));
        assert!(text.contains("4. m4"));
        assert!(text.contains("@u2"));
        assert!(text.contains("Без юзернейма"));
    }

    #[test]
    fn test_expiry_notice() {
        let challenge = Challenge::new(&monkey(1, "Альфа"), &monkey(2, "Бета"), 5, Utc::now());
        let text = challenge_expired_for_challenger(&challenge);
        assert!(text.contains("Бета"));
        assert!(text.contains("Бой не состоялся"));
        assert!(!text.contains("возвращается"));
    }

    #[test]
    fn test_empty_top() {
        assert!(top(&[]).contains("пуст"));
    }

    #[test]
    fn test_duel_result_both_sides() {
        let mut rng = StdRng::seed_from_u64(5);
        let out = duel::resolve(monkey(1, "Альфа"), monkey(2, "Бета"), 3, &mut rng).unwrap();
        let winner_text = duel_result(&out, out.winner.id);
        let loser_text = duel_result(&out, out.loser.id);
        assert!(winner_text.contains("Вы победили"));
        assert!(winner_text.contains("13 кг"));
        assert!(loser_text.contains("Вы теряете 3 кг"));
    }
}
