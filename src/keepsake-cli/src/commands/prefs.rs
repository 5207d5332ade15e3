//! Preference command handler

use super::Session;
use anyhow::Result;
use keepsake::Preferences;

/// Apply any given changes, then print the stored preferences
pub fn handle(
    session: &mut Session,
    music: Option<bool>,
    theme: Option<String>,
    recipient: Option<String>,
) -> Result<()> {
    let mut prefs = session.store().preferences();
    if apply(&mut prefs, music, theme, recipient) {
        session.store_mut().save_preferences(&prefs);
    }

    println!("Music:     {}", if prefs.music_enabled { "on" } else { "off" });
    println!("Theme:     {}", prefs.theme);
    println!("Recipient: {}", prefs.recipient_name);
    Ok(())
}

/// Returns whether anything changed
fn apply(
    prefs: &mut Preferences,
    music: Option<bool>,
    theme: Option<String>,
    recipient: Option<String>,
) -> bool {
    let mut changed = false;
    if let Some(music) = music {
        prefs.music_enabled = music;
        changed = true;
    }
    if let Some(theme) = theme {
        prefs.theme = theme;
        changed = true;
    }
    if let Some(name) = recipient {
        prefs.recipient_name = name;
        changed = true;
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_only_given_fields() {
        let mut prefs = Preferences::default();
        assert!(!apply(&mut prefs, None, None, None));
        assert_eq!(prefs, Preferences::default());

        assert!(apply(&mut prefs, Some(true), Some("dark".into()), None));
        assert!(prefs.music_enabled);
        assert_eq!(prefs.theme, "dark");
        assert_eq!(prefs.recipient_name, "Laura");
    }
}
