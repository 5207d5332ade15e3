//! # keepsake
//!
//! Reward engine for a small keepsake site - quiz-gated loot, a one-shot gift
//! draw, and the local history behind them.
//!
//! This library provides:
//! - A score-tiered loot engine (drop table by score, weighted rarity, item pick)
//! - A flat-probability gift draw with a once-per-session lock and claim step
//! - Bounded reward and score history on top of a JSON key-value store
//! - Catalog loading with an embedded fallback for every catalog
//!
//! Nothing here touches a DOM; rendering belongs to the host.
//!
//! ## Example
//!
//! ```
//! use keepsake::{Catalog, LootCatalog, LootEngine, RngSource, Store};
//!
//! let engine = LootEngine::new(LootCatalog::embedded());
//! let mut rng = RngSource::seeded(7);
//! let mut store = Store::in_memory();
//!
//! let loot = engine.generate(90, &mut rng).expect("default catalog is valid");
//! keepsake::record_loot(&mut store, &loot);
//!
//! assert_eq!(keepsake::reward_history(&store).len(), 1);
//! ```

pub mod catalog;
pub mod gift;
pub mod history;
pub mod letter;
pub mod loot;
pub mod quiz;
pub mod rng;
pub mod storage;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used items
#[doc(inline)]
pub use catalog::{
    Catalog, CatalogError, DropTableRow, GiftCatalog, GiftCatalogEntry, GiftRarity, LootCatalog,
    Question, QuestionBank, RarityTier, RewardItem, TierWeights,
};
#[doc(inline)]
pub use gift::{
    draw_gift, draw_gift_with_sample, DrawSession, DrawSnapshot, Reveal, RevealCancel,
    RevealOutcome, RevealSchedule,
};
#[doc(inline)]
pub use history::{
    quiz_stats, rarity_stats, record_attempt, record_attempt_at, record_loot, record_loot_at,
    reward_history, QuizRecord, QuizStats, RewardHistoryEntry, ScoreHistoryEntry,
    MAX_REWARD_HISTORY, MAX_SCORE_HISTORY,
};
#[doc(inline)]
pub use letter::LetterGate;
#[doc(inline)]
pub use loot::{
    draw_rarity, generate_loot, resolve_drop_table, select_item, weighted_tier, DrawError,
    LootEngine, LootResult,
};
#[doc(inline)]
pub use quiz::{complete_quiz, score_answers, QuizOutcome, ScoreBand};
#[doc(inline)]
pub use rng::{RandomSource, RngSource, SequenceRandom};
#[doc(inline)]
pub use storage::{Backend, FileBackend, MemoryBackend, Preferences, StorageError, Store};
