//! macaco-bot - "Боевые Макаки", a Telegram virtual pet with weight duels
//!
//! Monkeys get hungry and sad over time, grow fat on food and fight each
//! other for kilograms.

pub mod bot;
pub mod config;
pub mod db;
pub mod error;
pub mod game;
pub mod tui;

pub use db::Database;
pub use error::GameError;
