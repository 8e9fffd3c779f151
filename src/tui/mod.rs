//! TUI module - Terminal dashboard with ratatui

use anyhow::Result;
use crossterm::{
    ExecutableCommand,
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
};
use std::io::{Stdout, stdout};

use crate::db::{Database, FightRecord, MonkeySummary};

type Tui = Terminal<CrosstermBackend<Stdout>>;

const TOP_ROWS: usize = 20;
const FIGHT_ROWS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pane {
    Top,
    Fights,
}

/// App state for TUI
pub struct App {
    db: Database,
    top: Vec<MonkeySummary>,
    fights: Vec<FightRecord>,
    focus: Pane,
    should_quit: bool,
}

impl App {
    pub fn new(db: Database) -> Result<Self> {
        let mut app = Self {
            db,
            top: Vec::new(),
            fights: Vec::new(),
            focus: Pane::Top,
            should_quit: false,
        };
        app.refresh()?;
        Ok(app)
    }

    fn refresh(&mut self) -> Result<()> {
        self.top = self.db.top_monkeys(TOP_ROWS)?;
        self.fights = self.db.recent_fights(FIGHT_ROWS)?;
        Ok(())
    }

    /// Run the TUI application
    pub fn run(&mut self) -> Result<()> {
        let mut terminal = init_terminal()?;

        while !self.should_quit {
            terminal.draw(|frame| self.render(frame))?;
            self.handle_events()?;
        }

        restore_terminal()?;
        Ok(())
    }

    fn pane_block(&self, pane: Pane, title: &'static str) -> Block<'static> {
        let style = if self.focus == pane {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        Block::default().borders(Borders::ALL).title(title).border_style(style)
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(10),
                Constraint::Length(3),
            ])
            .split(area);

        let header = Paragraph::new(format!(
            "🐒 Боевые Макаки - {} monkeys on the board, {} recent fights",
            self.top.len(),
            self.fights.len()
        ))
        .style(Style::default().fg(Color::Cyan).bold())
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(header, chunks[0]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(chunks[1]);

        let top_rows: Vec<Row> = self
            .top
            .iter()
            .enumerate()
            .map(|(idx, m)| {
                Row::new(vec![
                    Cell::from(format!("{}", idx + 1)),
                    Cell::from(m.name.clone()),
                    Cell::from(format!("{} kg", m.weight)),
                    Cell::from(format!("{}", m.level)),
                    Cell::from(m.username.clone().unwrap_or_else(|| "-".to_string())),
                ])
            })
            .collect();

        let top = Table::new(
            top_rows,
            [
                Constraint::Length(4),
                Constraint::Min(12),
                Constraint::Length(8),
                Constraint::Length(5),
                Constraint::Min(10),
            ],
        )
        .header(Row::new(vec!["#", "Monkey", "Weight", "Lvl", "Owner"]).style(Style::default().bold()))
        .block(self.pane_block(Pane::Top, "Leaderboard"));
        frame.render_widget(top, body[0]);

        let fight_rows: Vec<Row> = self
            .fights
            .iter()
            .map(|f| {
                let name = |id: i64, n: &Option<String>| n.clone().unwrap_or_else(|| format!("#{}", id));
                let first = name(f.fighter1_id, &f.fighter1_name);
                let second = name(f.fighter2_id, &f.fighter2_name);
                let winner = if f.winner_id == f.fighter1_id { first.clone() } else { second.clone() };
                Row::new(vec![
                    Cell::from(f.fight_time.format("%m-%d %H:%M").to_string()),
                    Cell::from(first),
                    Cell::from(second),
                    Cell::from(format!("{} kg", f.stake)),
                    Cell::from(winner).style(Style::default().fg(Color::Green)),
                ])
            })
            .collect();

        let fights = Table::new(
            fight_rows,
            [
                Constraint::Length(12),
                Constraint::Min(10),
                Constraint::Min(10),
                Constraint::Length(7),
                Constraint::Min(10),
            ],
        )
        .header(Row::new(vec!["Time", "Challenger", "Opponent", "Stake", "Winner"]).style(Style::default().bold()))
        .block(self.pane_block(Pane::Fights, "Recent fights"));
        frame.render_widget(fights, body[1]);

        let footer = Paragraph::new("q: quit | r: refresh | tab: switch pane")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(footer, chunks[2]);
    }

    fn handle_events(&mut self) -> Result<()> {
        if event::poll(std::time::Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
                KeyCode::Char('r') => self.refresh()?,
                KeyCode::Tab => {
                    self.focus = match self.focus {
                        Pane::Top => Pane::Fights,
                        Pane::Fights => Pane::Top,
                    };
                }
                _ => {}
            }
        }
        Ok(())
    }
}

fn init_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    Ok(terminal)
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_app_loads_board() {
        let db = Database::open_in_memory().unwrap();
        db.get_or_create_monkey(1, Utc::now()).unwrap();
        db.get_or_create_monkey(2, Utc::now()).unwrap();
        let app = App::new(db).unwrap();
        assert_eq!(app.top.len(), 2);
        assert!(app.fights.is_empty());
        assert_eq!(app.focus, Pane::Top);
    }
}
