//! CLI definitions for the loot command

use clap::Subcommand;

#[derive(Subcommand)]
pub enum LootCommand {
    /// Draw a reward for a quiz score
    Roll {
        /// Quiz score, normally 0-100
        #[arg(allow_negative_numbers = true)]
        score: i64,

        /// Seed for a reproducible draw
        #[arg(long)]
        seed: Option<u64>,

        /// Don't add the reward to the history
        #[arg(long)]
        no_record: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List recent rewards, newest last
    History,

    /// Count rewards per rarity tier
    Stats,

    /// Show tier probabilities for a score
    Odds {
        #[arg(allow_negative_numbers = true)]
        score: i64,
    },
}
