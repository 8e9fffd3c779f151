//! Command line and runtime configuration
//!
//! Every option can also come from the environment (or a `.env` file).

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

pub const DEFAULT_DB_PATH: &str = "macaco_bot.db";

#[derive(Parser, Debug)]
#[command(name = "macaco-bot")]
#[command(author, version, about = "🐒 Боевые Макаки - Telegram monkey duels")]
pub struct Cli {
    /// SQLite database file
    #[arg(long, global = true, env = "MACACO_DB", default_value = DEFAULT_DB_PATH)]
    pub db: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start Telegram bot
    Bot(BotArgs),

    /// Open TUI dashboard
    Tui,

    /// Print the weight leaderboard
    Top {
        /// Number of monkeys to show
        #[arg(short, long, default_value = "10")]
        limit: usize,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Print recent fights
    Fights {
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Create or upgrade the database schema
    Migrate,
}

#[derive(Args, Debug, Clone)]
pub struct BotArgs {
    /// Telegram bot token
    #[arg(short, long, env = "BOT_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Seconds an opponent has to answer a challenge
    #[arg(long, env = "CHALLENGE_TIMEOUT_SECS", default_value = "60")]
    pub challenge_timeout: u64,

    /// Directory with GIF animations
    #[arg(long, env = "MACACO_MEDIA_DIR", default_value = "images")]
    pub media_dir: PathBuf,

    /// Entries shown in the leaderboard
    #[arg(long, default_value = "5")]
    pub top_limit: usize,
}

/// Settings shared with the bot handlers
#[derive(Debug, Clone)]
pub struct Settings {
    pub challenge_timeout: Duration,
    pub media_dir: PathBuf,
    pub top_limit: usize,
    /// How many opponents to offer in the challenge menu
    pub opponent_choices: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            challenge_timeout: Duration::from_secs(60),
            media_dir: PathBuf::from("images"),
            top_limit: 5,
            opponent_choices: 5,
        }
    }
}

impl From<&BotArgs> for Settings {
    fn from(args: &BotArgs) -> Self {
        Self {
            challenge_timeout: Duration::from_secs(args.challenge_timeout.max(1)),
            media_dir: args.media_dir.clone(),
            top_limit: args.top_limit.max(1),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bot_args_defaults() {
        let cli = Cli::try_parse_from(["macaco-bot", "bot", "--token", "123:abc"]).unwrap();
        let Some(Commands::Bot(args)) = cli.command else {
            panic!("expected bot command");
        };
        assert_eq!(args.token, "123:abc");
        let settings = Settings::from(&args);
        assert_eq!(settings.top_limit, 5);
        assert_eq!(settings.media_dir, PathBuf::from("images"));
    }

    #[test]
    fn test_challenge_timeout_override() {
        let cli = Cli::try_parse_from([
            "macaco-bot",
            "bot",
            "--token",
            "t",
            "--challenge-timeout",
            "120",
        ])
        .unwrap();
        let Some(Commands::Bot(args)) = cli.command else {
            panic!("expected bot command");
        };
        assert_eq!(Settings::from(&args).challenge_timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_zero_timeout_clamped() {
        let cli = Cli::try_parse_from([
            "macaco-bot", "bot", "--token", "t", "--challenge-timeout", "0",
        ])
        .unwrap();
        let Some(Commands::Bot(args)) = cli.command else {
            panic!("expected bot command");
        };
        assert_eq!(Settings::from(&args).challenge_timeout, Duration::from_secs(1));
    }

    #[test]
    fn test_global_db_flag() {
        let cli = Cli::try_parse_from(["macaco-bot", "top", "--db", "other.db", "--json"]).unwrap();
        assert_eq!(cli.db, "other.db");
        assert!(matches!(cli.command, Some(Commands::Top { json: true, limit: 10 })));
    }

    #[test]
    fn test_no_subcommand_defaults_to_none() {
        let cli = Cli::try_parse_from(["macaco-bot"]).unwrap();
        assert!(cli.command.is_none());
    }
}
