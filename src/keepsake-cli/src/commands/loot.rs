//! Loot command handlers

use super::{bar, random_source, Session};
use crate::cli::LootCommand;
use anyhow::{Context, Result};
use keepsake::{LootResult, RarityTier, RewardHistoryEntry};

/// Handle the loot command
pub fn handle(command: LootCommand, session: &mut Session) -> Result<()> {
    match command {
        LootCommand::Roll {
            score,
            seed,
            no_record,
            json,
        } => roll(session, score, seed, !no_record, json),
        LootCommand::History => history(session),
        LootCommand::Stats => stats(session),
        LootCommand::Odds { score } => odds(session, score),
    }
}

fn roll(
    session: &mut Session,
    score: i64,
    seed: Option<u64>,
    record: bool,
    json: bool,
) -> Result<()> {
    let engine = session.loot_engine();
    let loot = engine
        .generate(score, random_source(seed).as_mut())
        .context("Failed to generate a reward")?;

    if record {
        keepsake::record_loot(session.store_mut(), &loot);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&loot)?);
    } else {
        println!("{}", format_loot(&loot));
    }
    Ok(())
}

fn history(session: &Session) -> Result<()> {
    let entries = keepsake::reward_history(session.store());
    if entries.is_empty() {
        println!("No rewards yet. Try 'keepsake quiz take'.");
        return Ok(());
    }
    for entry in &entries {
        println!("{}", format_history_entry(entry));
    }
    Ok(())
}

fn stats(session: &Session) -> Result<()> {
    let engine = session.loot_engine();
    let catalog = engine.catalog();
    for (tier, count) in keepsake::rarity_stats(session.store(), catalog.rarities()) {
        let label = catalog.rarity(&tier).map_or(tier.as_str(), |r| r.label.as_str());
        println!("{:<12} {:>4}", label, count);
    }
    Ok(())
}

fn odds(session: &Session, score: i64) -> Result<()> {
    let engine = session.loot_engine();
    if let Some(row) = engine.drop_table(score) {
        println!("Score {} uses the table from {}", score, row.min_score);
    }
    for (tier, probability) in engine.odds(score) {
        println!("{}", format_odds_line(tier, probability));
    }
    Ok(())
}

pub fn format_loot(loot: &LootResult) -> String {
    let mut out = format!("[{}] {}", loot.rarity.label, loot.item.name);
    if let Some(icon) = &loot.item.icon {
        out = format!("{} {}", icon, out);
    }
    if !loot.item.description.is_empty() {
        out.push_str(&format!("\n    {}", loot.item.description));
    }
    if let Some(rolled) = &loot.rolled_from {
        out.push_str(&format!("\n    (rolled {}, none in stock)", rolled));
    }
    out
}

fn format_history_entry(entry: &RewardHistoryEntry) -> String {
    format!(
        "{}  {:>3}  {:<8} {}",
        entry.date.format("%Y-%m-%d %H:%M"),
        entry.score,
        entry.rarity,
        entry.item
    )
}

fn format_odds_line(tier: &RarityTier, probability: f64) -> String {
    format!(
        "{:<12} {} {:>6.2}%",
        tier.label,
        bar(probability, 20),
        probability * 100.0
    )
}
