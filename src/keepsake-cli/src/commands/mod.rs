//! Command handlers for the keepsake CLI
//!
//! Each subcommand has its own module with handler functions. [`Session`]
//! carries what they share: the open store and the configured catalogs.

pub mod configure;
pub mod gift;
pub mod letter;
pub mod loot;
pub mod prefs;
pub mod quiz;

use crate::config::Config;
use anyhow::Result;
use keepsake::{
    Catalog, FileBackend, GiftCatalog, LetterGate, LootEngine, QuestionBank, RandomSource,
    RngSource, Store,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

const WELCOME_KEY: &str = "welcome";

pub struct Session {
    config: Config,
    store: Store<FileBackend>,
}

impl Session {
    pub fn open(config: Config, store_override: Option<&Path>) -> Result<Self> {
        let path = config.store_path(store_override)?;
        debug!("Using store {}", path.display());
        Ok(Self {
            store: Store::open_file(path),
            config,
        })
    }

    pub fn store(&self) -> &Store<FileBackend> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut Store<FileBackend> {
        &mut self.store
    }

    pub fn loot_engine(&self) -> LootEngine {
        LootEngine::new(load_catalog(self.config.loot_catalog.as_ref()))
    }

    pub fn gift_catalog(&self) -> GiftCatalog {
        load_catalog(self.config.gift_catalog.as_ref())
    }

    pub fn question_bank(&self) -> QuestionBank {
        load_catalog(self.config.questions.as_ref())
    }

    pub fn letter_gate(&self) -> LetterGate {
        self.config
            .letter_code_sha256
            .as_deref()
            .map(LetterGate::from_hash)
            .unwrap_or_default()
    }

    /// Greet the recipient the first time any command runs against a store
    pub fn welcome(&mut self) {
        let name = self.store.preferences().recipient_name;
        self.store.run_once(WELCOME_KEY, || {
            eprintln!("Welcome, {}! Every quiz earns a reward, and one gift is waiting.", name);
        });
    }
}

fn load_catalog<C: Catalog>(path: Option<&PathBuf>) -> C {
    match path {
        Some(path) => C::load_or_default(path),
        None => C::embedded(),
    }
}

/// Entropy for a draw: seeded when asked, the thread RNG otherwise
pub fn random_source(seed: Option<u64>) -> Box<dyn RandomSource> {
    match seed {
        Some(seed) => Box::new(RngSource::seeded(seed)),
        None => Box::new(RngSource(rand::thread_rng())),
    }
}

/// Ask a question on stdout and read one trimmed line
pub fn prompt(question: &str) -> Result<String> {
    print!("{}", question);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(input.trim().to_string())
}

/// Prompt user for confirmation
pub fn prompt_confirmation(question: &str) -> Result<bool> {
    Ok(prompt(&format!("{} [y/N] ", question))?.eq_ignore_ascii_case("y"))
}

/// Fixed-width bar for a probability in `[0, 1]`
pub fn bar(probability: f64, width: usize) -> String {
    let filled = (probability.clamp(0.0, 1.0) * width as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "·".repeat(width - filled))
}
