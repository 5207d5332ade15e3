//! CLI argument definitions for keepsake
//!
//! This module contains all clap-derived structs and enums for CLI parsing.

mod core;
mod gift;
mod letter;
mod loot;
mod quiz;

pub use core::{Cli, Commands};
pub use gift::GiftCommand;
pub use letter::LetterCommand;
pub use loot::LootCommand;
pub use quiz::QuizCommand;
