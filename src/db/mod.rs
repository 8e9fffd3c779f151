//! Database module - SQLite storage for players, monkeys and fights

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::game::{
    DEFAULT_HAPPINESS, DEFAULT_HEALTH, DEFAULT_HUNGER, DEFAULT_NAME, DEFAULT_WEIGHT, DuelOutcome,
};

/// Telegram account that owns a monkey
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Monkey record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Monkey {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub health: i64,
    pub hunger: i64, // higher = hungrier
    pub happiness: i64,
    pub level: i64,
    pub experience: i64,
    pub weight: i64,
    pub last_fed: Option<DateTime<Utc>>,
    pub last_daily: Option<DateTime<Utc>>,
    pub last_happiness_decay: DateTime<Utc>,
    pub last_hunger_decay: DateTime<Utc>,
    pub last_health_decay: DateTime<Utc>,
}

impl Monkey {
    /// Fresh monkey with default stats, all decay checkpoints at `now`
    pub fn new(user_id: i64, now: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            user_id,
            name: DEFAULT_NAME.to_string(),
            health: DEFAULT_HEALTH,
            hunger: DEFAULT_HUNGER,
            happiness: DEFAULT_HAPPINESS,
            level: 1,
            experience: 0,
            weight: DEFAULT_WEIGHT,
            last_fed: None,
            last_daily: None,
            last_happiness_decay: now,
            last_hunger_decay: now,
            last_health_decay: now,
        }
    }

    /// Satiety as shown to players (inverse of hunger)
    pub fn satiety(&self) -> i64 {
        crate::game::STAT_MAX - self.hunger
    }
}

/// Leaderboard / search row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonkeySummary {
    pub monkey_id: i64,
    pub user_id: i64,
    pub name: String,
    pub weight: i64,
    pub level: i64,
    pub username: Option<String>,
}

/// Fight log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FightRecord {
    pub id: i64,
    pub fighter1_id: i64,
    pub fighter2_id: i64,
    pub winner_id: i64,
    pub stake: i64,
    pub fight_time: DateTime<Utc>,
    pub fighter1_name: Option<String>,
    pub fighter2_name: Option<String>,
}

const MONKEY_COLUMNS: &str = "id, user_id, name, health, hunger, happiness, level, experience, weight, \
     last_fed, last_daily, last_happiness_decay, last_hunger_decay, last_health_decay";

/// Columns added after the first release: (name, backfill NULLs with now)
const LATER_TIMESTAMP_COLUMNS: &[(&str, bool)] = &[
    ("last_daily", false),
    ("last_happiness_decay", true),
    ("last_hunger_decay", true),
    ("last_health_decay", true),
];

fn parse_ts(value: Option<String>) -> Option<DateTime<Utc>> {
    value
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|d| d.with_timezone(&Utc))
}

fn monkey_from_row(row: &Row<'_>) -> rusqlite::Result<Monkey> {
    let checkpoint = |idx: usize| -> rusqlite::Result<DateTime<Utc>> {
        Ok(parse_ts(row.get(idx)?).unwrap_or_else(Utc::now))
    };
    Ok(Monkey {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        health: row.get(3)?,
        hunger: row.get(4)?,
        happiness: row.get(5)?,
        level: row.get(6)?,
        experience: row.get(7)?,
        weight: row.get(8)?,
        last_fed: parse_ts(row.get(9)?),
        last_daily: parse_ts(row.get(10)?),
        last_happiness_decay: checkpoint(11)?,
        last_hunger_decay: checkpoint(12)?,
        last_health_decay: checkpoint(13)?,
    })
}

fn summary_from_row(row: &Row<'_>) -> rusqlite::Result<MonkeySummary> {
    Ok(MonkeySummary {
        monkey_id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        weight: row.get(3)?,
        level: row.get(4)?,
        username: row.get(5)?,
    })
}

/// Escape LIKE wildcards so a search fragment matches literally
fn like_pattern(fragment: &str) -> String {
    let escaped = fragment
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn write_monkey(conn: &Connection, monkey: &Monkey) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE monkeys SET name = ?1, health = ?2, hunger = ?3, happiness = ?4, level = ?5,
            experience = ?6, weight = ?7, last_fed = ?8, last_daily = ?9,
            last_happiness_decay = ?10, last_hunger_decay = ?11, last_health_decay = ?12
         WHERE id = ?13",
        params![
            monkey.name,
            monkey.health,
            monkey.hunger,
            monkey.happiness,
            monkey.level,
            monkey.experience,
            monkey.weight,
            monkey.last_fed.map(|t| t.to_rfc3339()),
            monkey.last_daily.map(|t| t.to_rfc3339()),
            monkey.last_happiness_decay.to_rfc3339(),
            monkey.last_hunger_decay.to_rfc3339(),
            monkey.last_health_decay.to_rfc3339(),
            monkey.id,
        ],
    )?;
    Ok(())
}

fn insert_fight(
    conn: &Connection,
    fighter1_id: i64,
    fighter2_id: i64,
    winner_id: i64,
    stake: i64,
    at: DateTime<Utc>,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO fights (fighter1_id, fighter2_id, winner_id, stake, fight_time)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![fighter1_id, fighter2_id, winner_id, stake, at.to_rfc3339()],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Database wrapper
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Private in-memory database, used by tests and dry runs
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS users (
                user_id INTEGER PRIMARY KEY,
                username TEXT,
                first_name TEXT,
                last_name TEXT,
                created_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS monkeys (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                name TEXT NOT NULL DEFAULT 'Макака',
                health INTEGER NOT NULL DEFAULT 100,
                hunger INTEGER NOT NULL DEFAULT 0,
                happiness INTEGER NOT NULL DEFAULT 50,
                level INTEGER NOT NULL DEFAULT 1,
                experience INTEGER NOT NULL DEFAULT 0,
                weight INTEGER NOT NULL DEFAULT 10,
                last_fed TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_monkeys_user ON monkeys (user_id);
            CREATE TABLE IF NOT EXISTS fights (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                fighter1_id INTEGER NOT NULL,
                fighter2_id INTEGER NOT NULL,
                winner_id INTEGER NOT NULL,
                stake INTEGER NOT NULL,
                fight_time TEXT NOT NULL
            );",
        )?;

        // Migration: add timestamp columns if missing, backfill decay checkpoints
        for &(column, backfill) in LATER_TIMESTAMP_COLUMNS {
            let exists = self
                .conn
                .prepare(&format!("SELECT {} FROM monkeys LIMIT 1", column))
                .is_ok();
            if !exists {
                self.conn.execute(
                    &format!("ALTER TABLE monkeys ADD COLUMN {} TEXT", column),
                    [],
                )?;
            }
            if backfill {
                self.conn.execute(
                    &format!("UPDATE monkeys SET {} = ?1 WHERE {} IS NULL", column, column),
                    params![Utc::now().to_rfc3339()],
                )?;
            }
        }

        Ok(())
    }

    /// Insert user or refresh their profile fields
    pub fn upsert_user(&self, user: &User) -> Result<()> {
        self.conn.execute(
            "INSERT INTO users (user_id, username, first_name, last_name, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(user_id) DO UPDATE SET
                username = excluded.username,
                first_name = excluded.first_name,
                last_name = excluded.last_name",
            params![
                user.id,
                user.username,
                user.first_name,
                user.last_name,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Newest monkey of a user
    pub fn active_monkey(&self, user_id: i64) -> Result<Option<Monkey>> {
        let monkey = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM monkeys WHERE user_id = ?1 ORDER BY id DESC LIMIT 1",
                    MONKEY_COLUMNS
                ),
                params![user_id],
                monkey_from_row,
            )
            .optional()?;
        Ok(monkey)
    }

    pub fn get_monkey(&self, id: i64) -> Result<Option<Monkey>> {
        let monkey = self
            .conn
            .query_row(
                &format!("SELECT {} FROM monkeys WHERE id = ?1", MONKEY_COLUMNS),
                params![id],
                monkey_from_row,
            )
            .optional()?;
        Ok(monkey)
    }

    /// Active monkey of a user, hatching a new one on first contact
    pub fn get_or_create_monkey(&self, user_id: i64, now: DateTime<Utc>) -> Result<Monkey> {
        if let Some(monkey) = self.active_monkey(user_id)? {
            return Ok(monkey);
        }

        let mut monkey = Monkey::new(user_id, now);
        self.conn.execute(
            "INSERT INTO monkeys (user_id, name, health, hunger, happiness, level, experience, weight,
                last_happiness_decay, last_hunger_decay, last_health_decay)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9, ?9)",
            params![
                monkey.user_id,
                monkey.name,
                monkey.health,
                monkey.hunger,
                monkey.happiness,
                monkey.level,
                monkey.experience,
                monkey.weight,
                now.to_rfc3339(),
            ],
        )?;
        monkey.id = self.conn.last_insert_rowid();
        Ok(monkey)
    }

    /// Persist all mutable fields of a monkey in one statement
    pub fn save_monkey(&self, monkey: &Monkey) -> Result<()> {
        write_monkey(&self.conn, monkey)?;
        Ok(())
    }

    /// Append fight record
    #[cfg(test)]
    pub fn record_fight(
        &self,
        fighter1_id: i64,
        fighter2_id: i64,
        winner_id: i64,
        stake: i64,
        at: DateTime<Utc>,
    ) -> Result<i64> {
        Ok(insert_fight(&self.conn, fighter1_id, fighter2_id, winner_id, stake, at)?)
    }

    /// Write both fighters and the fight record atomically
    pub fn apply_duel(
        &self,
        outcome: &DuelOutcome,
        challenger_id: i64,
        at: DateTime<Utc>,
    ) -> Result<i64> {
        let tx = self.conn.unchecked_transaction()?;
        write_monkey(&tx, &outcome.winner)?;
        write_monkey(&tx, &outcome.loser)?;
        let opponent_id = if outcome.winner.id == challenger_id {
            outcome.loser.id
        } else {
            outcome.winner.id
        };
        let fight_id = insert_fight(
            &tx,
            challenger_id,
            opponent_id,
            outcome.winner.id,
            outcome.stake,
            at,
        )?;
        tx.commit()?;
        Ok(fight_id)
    }

    /// Most recent fights first
    pub fn recent_fights(&self, limit: usize) -> Result<Vec<FightRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT f.id, f.fighter1_id, f.fighter2_id, f.winner_id, f.stake, f.fight_time,
                    m1.name, m2.name
             FROM fights f
             LEFT JOIN monkeys m1 ON m1.id = f.fighter1_id
             LEFT JOIN monkeys m2 ON m2.id = f.fighter2_id
             ORDER BY f.id DESC
             LIMIT ?1",
        )?;

        let fights = stmt
            .query_map(params![limit as i64], |row| {
                Ok(FightRecord {
                    id: row.get(0)?,
                    fighter1_id: row.get(1)?,
                    fighter2_id: row.get(2)?,
                    winner_id: row.get(3)?,
                    stake: row.get(4)?,
                    fight_time: parse_ts(row.get(5)?).unwrap_or_else(Utc::now),
                    fighter1_name: row.get(6)?,
                    fighter2_name: row.get(7)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(fights)
    }

    pub fn count_fights(&self, monkey_id: i64) -> Result<(i64, i64)> {
        let (total, wins) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(winner_id = ?1), 0)
             FROM fights WHERE fighter1_id = ?1 OR fighter2_id = ?1",
            params![monkey_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok((total, wins))
    }

    /// Heaviest active monkeys, one per user
    pub fn top_monkeys(&self, limit: usize) -> Result<Vec<MonkeySummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT m.id, m.user_id, m.name, m.weight, m.level, u.username
             FROM monkeys m
             LEFT JOIN users u ON u.user_id = m.user_id
             WHERE m.id = (SELECT MAX(id) FROM monkeys WHERE user_id = m.user_id)
             ORDER BY m.weight DESC, m.level DESC
             LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit as i64], summary_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Monkeys whose name or owner username contains `fragment`
    pub fn search_monkeys(&self, fragment: &str, limit: usize) -> Result<Vec<MonkeySummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT m.id, m.user_id, m.name, m.weight, m.level, u.username
             FROM monkeys m
             LEFT JOIN users u ON u.user_id = m.user_id
             WHERE m.id = (SELECT MAX(id) FROM monkeys WHERE user_id = m.user_id)
               AND (m.name LIKE ?1 ESCAPE '\\' OR u.username LIKE ?1 ESCAPE '\\')
             ORDER BY m.weight DESC
             LIMIT ?2",
        )?;
        let rows = stmt
            .query_map(params![like_pattern(fragment), limit as i64], summary_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Random active monkeys of other users
    pub fn opponent_candidates(&self, user_id: i64, limit: usize) -> Result<Vec<MonkeySummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT m.id, m.user_id, m.name, m.weight, m.level, u.username
             FROM monkeys m
             LEFT JOIN users u ON u.user_id = m.user_id
             WHERE m.user_id != ?1
               AND m.id = (SELECT MAX(id) FROM monkeys WHERE user_id = m.user_id)
             ORDER BY RANDOM()
             LIMIT ?2",
        )?;
        let rows = stmt
            .query_map(params![user_id, limit as i64], summary_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn user(id: i64, username: &str) -> User {
        User {
            id,
            username: Some(username.to_string()),
            first_name: None,
            last_name: None,
        }
    }

    fn monkey_with(db: &Database, user_id: i64, name: &str, weight: i64) -> Monkey {
        db.upsert_user(&user(user_id, &format!("user{}", user_id))).unwrap();
        let mut m = db.get_or_create_monkey(user_id, Utc::now()).unwrap();
        m.name = name.to_string();
        m.weight = weight;
        db.save_monkey(&m).unwrap();
        m
    }

    #[test]
    fn test_get_or_create_monkey_is_stable() {
        let db = Database::open_in_memory().unwrap();
        let now = Utc::now();
        let first = db.get_or_create_monkey(42, now).unwrap();
        let second = db.get_or_create_monkey(42, now).unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.weight, DEFAULT_WEIGHT);
        assert_eq!(second.health, DEFAULT_HEALTH);
        assert_eq!(second.level, 1);
    }

    #[test]
    fn test_save_monkey_roundtrips_checkpoints() {
        let db = Database::open_in_memory().unwrap();
        let now = Utc::now();
        let mut m = db.get_or_create_monkey(1, now).unwrap();
        m.hunger = 40;
        m.last_hunger_decay = now - Duration::hours(3);
        m.last_fed = Some(now);
        db.save_monkey(&m).unwrap();

        let loaded = db.get_monkey(m.id).unwrap().unwrap();
        assert_eq!(loaded.hunger, 40);
        assert_eq!(
            loaded.last_hunger_decay.timestamp_millis(),
            m.last_hunger_decay.timestamp_millis()
        );
        assert!(loaded.last_fed.is_some());
        assert!(loaded.last_daily.is_none());
    }

    #[test]
    fn test_upsert_user_updates_username() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_user(&user(5, "old")).unwrap();
        db.upsert_user(&user(5, "new")).unwrap();
        db.get_or_create_monkey(5, Utc::now()).unwrap();
        let top = db.top_monkeys(5).unwrap();
        assert_eq!(top[0].username.as_deref(), Some("new"));
    }

    #[test]
    fn test_top_monkeys_orders_by_weight() {
        let db = Database::open_in_memory().unwrap();
        monkey_with(&db, 1, "Лёгкая", 5);
        monkey_with(&db, 2, "Тяжёлая", 50);
        monkey_with(&db, 3, "Средняя", 20);

        let top = db.top_monkeys(2).unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].name, "Тяжёлая");
        assert_eq!(top[1].name, "Средняя");
    }

    #[test]
    fn test_search_escapes_wildcards() {
        let db = Database::open_in_memory().unwrap();
        monkey_with(&db, 1, "Кинг_Конг", 10);
        monkey_with(&db, 2, "КингХКонг", 10);

        let found = db.search_monkeys("г_К", 10).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Кинг_Конг");
    }

    #[test]
    fn test_search_matches_username() {
        let db = Database::open_in_memory().unwrap();
        monkey_with(&db, 77, "Бобо", 10);
        let found = db.search_monkeys("user77", 10).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].monkey_id, db.active_monkey(77).unwrap().unwrap().id);
    }

    #[test]
    fn test_opponent_candidates_excludes_self() {
        let db = Database::open_in_memory().unwrap();
        monkey_with(&db, 1, "Я", 10);
        monkey_with(&db, 2, "Он", 10);
        monkey_with(&db, 3, "Она", 10);

        let candidates = db.opponent_candidates(1, 10).unwrap();
        assert_eq!(candidates.len(), 2);
        assert!(candidates.iter().all(|c| c.user_id != 1));
    }

    #[test]
    fn test_record_fight_and_counts() {
        let db = Database::open_in_memory().unwrap();
        let a = monkey_with(&db, 1, "Альфа", 10);
        let b = monkey_with(&db, 2, "Бета", 10);
        db.record_fight(a.id, b.id, a.id, 3, Utc::now()).unwrap();
        db.record_fight(b.id, a.id, b.id, 1, Utc::now()).unwrap();

        assert_eq!(db.count_fights(a.id).unwrap(), (2, 1));
        let fights = db.recent_fights(10).unwrap();
        assert_eq!(fights.len(), 2);
        assert_eq!(fights[0].stake, 1);
        assert_eq!(fights[0].fighter1_name.as_deref(), Some("Бета"));
    }

    #[test]
    fn test_migration_adds_missing_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.db");
        let path = path.to_str().unwrap();
        {
            let conn = Connection::open(path).unwrap();
            conn.execute_batch(
                "CREATE TABLE monkeys (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id INTEGER NOT NULL,
                    name TEXT NOT NULL DEFAULT 'Макака',
                    health INTEGER NOT NULL DEFAULT 100,
                    hunger INTEGER NOT NULL DEFAULT 0,
                    happiness INTEGER NOT NULL DEFAULT 50,
                    level INTEGER NOT NULL DEFAULT 1,
                    experience INTEGER NOT NULL DEFAULT 0,
                    weight INTEGER NOT NULL DEFAULT 10,
                    last_fed TEXT
                );
                INSERT INTO monkeys (user_id) VALUES (9);",
            )
            .unwrap();
        }

        let db = Database::open(path).unwrap();
        let m = db.active_monkey(9).unwrap().unwrap();
        assert!(m.last_daily.is_none());
        assert!(Utc::now() - m.last_hunger_decay < Duration::minutes(1));
    }
}
