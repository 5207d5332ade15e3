//! CLI definitions for the letter command

use clap::Subcommand;

#[derive(Subcommand)]
pub enum LetterCommand {
    /// Enter the code to unlock the letter
    Unlock {
        /// The code; prompts when omitted
        code: Option<String>,
    },

    /// Show whether the letter is unlocked
    Status,
}
