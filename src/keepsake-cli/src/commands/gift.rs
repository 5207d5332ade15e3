//! Gift draw command handlers

use super::{bar, prompt_confirmation, random_source, Session};
use crate::cli::GiftCommand;
use anyhow::{Context, Result};
use keepsake::{DrawSession, GiftCatalog, GiftCatalogEntry, RandomSource, RevealSchedule};
use std::io::{self, Write};

/// Handle the gift command
pub fn handle(command: GiftCommand, session: &Session) -> Result<()> {
    match command {
        GiftCommand::Draw { seed, instant, yes } => draw(session, seed, instant, yes),
        GiftCommand::Odds => odds(&session.gift_catalog()),
    }
}

fn draw(session: &Session, seed: Option<u64>, instant: bool, yes: bool) -> Result<()> {
    let catalog = session.gift_catalog();
    let schedule = if instant {
        RevealSchedule::instant()
    } else {
        RevealSchedule::default()
    };
    // One CLI run is one draw session
    let mut draw = DrawSession::with_schedule(schedule);

    let icons: Vec<&str> = catalog.entries().iter().map(|g| g.icon.as_str()).collect();
    let gift = run_draw(&mut draw, &catalog, random_source(seed).as_mut(), |tick| {
        if let Some(icon) = spinner_frame(&icons, tick) {
            print!("\r  {}  ", icon);
            let _ = io::stdout().flush();
        }
    })?;
    println!("\r");
    println!("{}", format_gift(&gift));

    if (yes || prompt_confirmation("Claim this gift?")?) && draw.claim() {
        println!("Claimed! 🎁");
    }
    Ok(())
}

/// Draw, play the reveal and commit. Fails if `draw` was already used.
fn run_draw(
    draw: &mut DrawSession,
    catalog: &GiftCatalog,
    rng: &mut dyn RandomSource,
    on_tick: impl FnMut(u32),
) -> Result<GiftCatalogEntry> {
    let reveal = draw
        .begin_draw(catalog, rng)
        .context("The gift has already been drawn")?;
    let outcome = reveal.run(on_tick);
    draw.complete(outcome)
        .cloned()
        .context("The draw was interrupted")
}

fn odds(catalog: &GiftCatalog) -> Result<()> {
    for entry in catalog.entries() {
        println!(
            "{} {:<24} {} {:>10}  {}",
            entry.icon,
            entry.title,
            bar(entry.drop_rate, 20),
            format_rate(entry.drop_rate),
            entry.rarity
        );
    }
    let total = catalog.total_rate();
    if total < 1.0 {
        println!(
            "Remaining {} falls back to {}",
            format_rate(1.0 - total),
            catalog.fallback().title
        );
    }
    Ok(())
}

/// Icon shown on a reveal tick, cycling through the catalog
fn spinner_frame<'a>(icons: &[&'a str], tick: u32) -> Option<&'a str> {
    if icons.is_empty() {
        return None;
    }
    Some(icons[tick as usize % icons.len()])
}

fn format_gift(gift: &GiftCatalogEntry) -> String {
    let mut out = format!("{} {}  {}", gift.icon, gift.title, gift.rarity);
    if !gift.description.is_empty() {
        out.push_str(&format!("\n    {}", gift.description));
    }
    out
}

/// Percentage with enough precision to show one-in-a-million odds
fn format_rate(rate: f64) -> String {
    let percent = rate * 100.0;
    if percent >= 1.0 || percent == 0.0 {
        format!("{:.2}%", percent)
    } else {
        format!("{:.4}%", percent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keepsake::{Catalog, SequenceRandom};

    #[test]
    fn test_spinner_cycles() {
        let icons = ["a", "b", "c"];
        assert_eq!(spinner_frame(&icons, 0), Some("a"));
        assert_eq!(spinner_frame(&icons, 4), Some("b"));
        assert_eq!(spinner_frame(&[], 1), None);
    }

    #[test]
    fn test_format_rate() {
        assert_eq!(format_rate(0.25), "25.00%");
        assert_eq!(format_rate(0.001), "0.1000%");
        assert_eq!(format_rate(0.000001), "0.0001%");
        assert_eq!(format_rate(0.0), "0.00%");
    }

    #[test]
    fn test_format_gift_uses_rarity_label() {
        let catalog = GiftCatalog::embedded();
        let gift = catalog.fallback();
        let text = format_gift(gift);
        assert!(text.contains(&gift.title));
        assert!(text.contains(gift.rarity.label()));
    }

    #[test]
    fn test_run_draw_once_per_session() {
        let catalog = GiftCatalog::embedded();
        let mut draw = DrawSession::with_schedule(RevealSchedule::instant());
        let mut rng = SequenceRandom::constant(0.1);

        let gift = run_draw(&mut draw, &catalog, &mut rng, |_| {}).unwrap();
        assert_eq!(gift.id, catalog.entries()[0].id);
        assert!(draw.has_drawn());

        assert!(run_draw(&mut draw, &catalog, &mut rng, |_| {}).is_err());
        assert_eq!(rng.consumed(), 1);
        assert!(draw.claim());
    }
}
