//! macaco-bot - "Боевые Макаки" Telegram bot and operator tools

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use macaco_bot::Database;
use macaco_bot::config::{Cli, Commands, Settings};
use macaco_bot::tui::App;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Bot(args)) => {
            println!("Starting Telegram bot...");
            println!("База данных: {}", cli.db);
            let settings = Settings::from(&args);
            macaco_bot::bot::run_bot(args.token, &cli.db, settings).await?;
        }

        Some(Commands::Top { limit, json }) => {
            let db = Database::open(&cli.db)?;
            let top = db.top_monkeys(limit)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&top)?);
            } else {
                println!("Top monkeys by weight:");
                println!("{:-<60}", "");
                for (idx, m) in top.iter().enumerate() {
                    println!(
                        "{:>3}. {:20} | {:>4} kg | lvl {:>3} | {}",
                        idx + 1,
                        m.name,
                        m.weight,
                        m.level,
                        m.username.as_deref().unwrap_or("-")
                    );
                }
            }
        }

        Some(Commands::Fights { limit }) => {
            let db = Database::open(&cli.db)?;
            let fights = db.recent_fights(limit)?;
            println!("Recent fights:");
            println!("{:-<60}", "");
            for f in &fights {
                let name = |id: i64, n: &Option<String>| n.clone().unwrap_or_else(|| format!("#{}", id));
                let first = name(f.fighter1_id, &f.fighter1_name);
                let second = name(f.fighter2_id, &f.fighter2_name);
                let winner = if f.winner_id == f.fighter1_id { &first } else { &second };
                println!(
                    "{} | {} vs {} | {} kg | winner: {}",
                    f.fight_time.format("%Y-%m-%d %H:%M"),
                    first,
                    second,
                    f.stake,
                    winner
                );
            }
        }

        Some(Commands::Migrate) => {
            Database::open(&cli.db)?;
            info!(db = %cli.db, "Schema is up to date");
        }

        Some(Commands::Tui) | None => {
            // Default: show TUI
            let mut app = App::new(Database::open(&cli.db)?)?;
            app.run()?;
        }
    }

    Ok(())
}
