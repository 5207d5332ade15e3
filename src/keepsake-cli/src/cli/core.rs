//! Core CLI definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::gift::GiftCommand;
use super::letter::LetterCommand;
use super::loot::LootCommand;
use super::quiz::QuizCommand;

#[derive(Parser)]
#[command(name = "keepsake")]
#[command(about = "Quiz rewards, gift draws and a letter, from the terminal", long_about = None)]
pub struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Store file to use instead of the configured one
    #[arg(long, global = true, env = "KEEPSAKE_STORE")]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Score-based rewards (roll, history, stats, odds)
    #[command(visible_alias = "l")]
    Loot {
        #[command(subcommand)]
        command: LootCommand,
    },

    /// The one-shot gift draw
    #[command(visible_alias = "g")]
    Gift {
        #[command(subcommand)]
        command: GiftCommand,
    },

    /// Take the quiz or look at past attempts
    #[command(visible_alias = "q")]
    Quiz {
        #[command(subcommand)]
        command: QuizCommand,
    },

    /// Unlock or check the letter
    Letter {
        #[command(subcommand)]
        command: LetterCommand,
    },

    /// Show or change stored preferences
    Prefs {
        /// Enable or disable music
        #[arg(long)]
        music: Option<bool>,

        /// Theme name (e.g. "light", "dark")
        #[arg(long)]
        theme: Option<String>,

        /// Name shown in greetings
        #[arg(long)]
        recipient: Option<String>,
    },

    /// Configure catalog and store locations
    #[command(visible_alias = "c")]
    Configure {
        /// Store file path
        #[arg(long)]
        store_path: Option<PathBuf>,

        /// Loot catalog JSON
        #[arg(long)]
        loot_catalog: Option<PathBuf>,

        /// Gift catalog JSON
        #[arg(long)]
        gift_catalog: Option<PathBuf>,

        /// Question bank JSON
        #[arg(long)]
        questions: Option<PathBuf>,

        /// Letter code (only its SHA-256 is saved)
        #[arg(long)]
        letter_code: Option<String>,

        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}
