//! Configuration command handlers
//!
//! Handles the `configure` subcommand for catalog and store locations.

use crate::config::Config;
use anyhow::Result;
use keepsake::letter::hash_code;
use std::path::PathBuf;

/// Requested changes to the configuration
#[derive(Debug, Default)]
pub struct ConfigUpdate {
    pub store_path: Option<PathBuf>,
    pub loot_catalog: Option<PathBuf>,
    pub gift_catalog: Option<PathBuf>,
    pub questions: Option<PathBuf>,
    pub letter_code: Option<String>,
}

impl ConfigUpdate {
    fn is_empty(&self) -> bool {
        self.store_path.is_none()
            && self.loot_catalog.is_none()
            && self.gift_catalog.is_none()
            && self.questions.is_none()
            && self.letter_code.is_none()
    }

    fn apply(self, config: &mut Config) {
        if let Some(path) = self.store_path {
            config.store_path = Some(path);
        }
        if let Some(path) = self.loot_catalog {
            config.loot_catalog = Some(path);
        }
        if let Some(path) = self.gift_catalog {
            config.gift_catalog = Some(path);
        }
        if let Some(path) = self.questions {
            config.questions = Some(path);
        }
        if let Some(code) = self.letter_code {
            config.letter_code_sha256 = Some(hash_code(&code));
        }
    }
}

/// Handle the configure command
pub fn handle(update: ConfigUpdate, show: bool) -> Result<()> {
    let mut config = Config::load()?;

    if show {
        show_config(&config);
        return Ok(());
    }

    if update.is_empty() {
        show_usage();
        return Ok(());
    }

    update.apply(&mut config);
    config.save()?;
    if let Ok(path) = Config::config_path() {
        println!("Config saved to: {}", path.display());
    }

    Ok(())
}

/// Display current configuration
fn show_config(config: &Config) {
    let describe = |path: &Option<PathBuf>| {
        path.as_ref()
            .map_or_else(|| "built-in".to_string(), |p| p.display().to_string())
    };

    match config.store_path(None) {
        Ok(path) => println!("Store:        {}", path.display()),
        Err(e) => println!("Store:        unavailable ({})", e),
    }
    println!("Loot catalog: {}", describe(&config.loot_catalog));
    println!("Gift catalog: {}", describe(&config.gift_catalog));
    println!("Questions:    {}", describe(&config.questions));
    println!(
        "Letter code:  {}",
        if config.letter_code_sha256.is_some() {
            "custom"
        } else {
            "default"
        }
    );

    if let Ok(path) = Config::config_path() {
        println!("Config file: {}", path.display());
    }
}

/// Show usage help for the configure command
fn show_usage() {
    println!("Usage: keepsake configure --loot-catalog loot.json --gift-catalog gifts.json");
    println!("   or: keepsake configure --store-path ~/keepsake.json");
    println!("   or: keepsake configure --show");
    println!();
    println!("Catalogs that fail to load are replaced by the built-in ones.");
}
