//! CLI definitions for the quiz command

use clap::Subcommand;

#[derive(Subcommand)]
pub enum QuizCommand {
    /// List the questions
    Questions,

    /// Answer the questions and draw a reward
    Take {
        /// Answers as choice numbers starting at 1, `-` to skip.
        /// Prompts for each question when omitted.
        answers: Vec<String>,

        /// Seed for a reproducible reward draw
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Best score, attempts and average
    Stats,
}
