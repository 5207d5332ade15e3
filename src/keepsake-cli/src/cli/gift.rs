//! CLI definitions for the gift command

use clap::Subcommand;

#[derive(Subcommand)]
pub enum GiftCommand {
    /// Draw a gift (once per run)
    Draw {
        /// Seed for a reproducible draw
        #[arg(long)]
        seed: Option<u64>,

        /// Skip the reveal animation
        #[arg(long)]
        instant: bool,

        /// Claim the gift without asking
        #[arg(short, long)]
        yes: bool,
    },

    /// List gifts with their drop rates
    Odds,
}
