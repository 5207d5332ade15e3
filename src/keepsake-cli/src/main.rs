mod cli;
mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::configure::ConfigUpdate;
use commands::Session;
use config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Commands::Configure {
        store_path,
        loot_catalog,
        gift_catalog,
        questions,
        letter_code,
        show,
    } = cli.command
    {
        let update = ConfigUpdate {
            store_path,
            loot_catalog,
            gift_catalog,
            questions,
            letter_code,
        };
        return commands::configure::handle(update, show);
    }

    let config = Config::load()?;
    let mut session = Session::open(config, cli.store.as_deref())?;
    session.welcome();

    match cli.command {
        Commands::Loot { command } => commands::loot::handle(command, &mut session)?,
        Commands::Gift { command } => commands::gift::handle(command, &session)?,
        Commands::Quiz { command } => commands::quiz::handle(command, &mut session)?,
        Commands::Letter { command } => commands::letter::handle(command, &mut session)?,
        Commands::Prefs {
            music,
            theme,
            recipient,
        } => commands::prefs::handle(&mut session, music, theme, recipient)?,
        Commands::Configure { .. } => unreachable!("handled above"),
    }

    Ok(())
}

/// Log to stderr so rendered output on stdout stays clean
fn init_tracing(verbose: bool) {
    let default = if verbose { "keepsake=debug" } else { "keepsake=info" };
    let filter = tracing_subscriber::EnvFilter::try_from_env("KEEPSAKE_LOG")
        .or_else(|_| tracing_subscriber::EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| default.into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
