//! Quiz record and reward history bookkeeping
//!
//! All history lives in one `quizData` value. Each function here is a single
//! read-modify-write of that value through [`Store::update`].

use crate::catalog::RarityTier;
use crate::loot::LootResult;
use crate::storage::{Backend, Store, QUIZ_DATA_KEY};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Rewards kept in the rolling history
pub const MAX_REWARD_HISTORY: usize = 10;

/// Quiz attempts kept in the rolling score history
pub const MAX_SCORE_HISTORY: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardHistoryEntry {
    pub item: String,
    pub rarity: String,
    pub score: i64,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreHistoryEntry {
    pub score: i64,
    pub date: DateTime<Utc>,
    /// Chosen answer per question, `None` when skipped
    #[serde(default)]
    pub answers: Vec<Option<usize>>,
}

/// Persisted quiz progress
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizRecord {
    /// Highest score ever reached
    #[serde(rename = "bestScore", default)]
    pub best_score: i64,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default)]
    pub rewards: Vec<RewardHistoryEntry>,
    #[serde(rename = "scoreHistory", default)]
    pub score_history: Vec<ScoreHistoryEntry>,
}

/// Summary shown on the quiz page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QuizStats {
    #[serde(rename = "bestScore")]
    pub best_score: i64,
    pub attempts: u32,
    #[serde(rename = "averageScore")]
    pub average_score: i64,
}

/// Keep only the last `max` entries
fn truncate_front<T>(entries: &mut Vec<T>, max: usize) {
    if entries.len() > max {
        entries.drain(..entries.len() - max);
    }
}

/// Append a loot result to the reward history, stamped with the current time
pub fn record_loot<B: Backend>(store: &mut Store<B>, result: &LootResult) -> QuizRecord {
    record_loot_at(store, result, Utc::now())
}

/// Append a loot result to the reward history, evicting the oldest entries
/// beyond [`MAX_REWARD_HISTORY`]
pub fn record_loot_at<B: Backend>(
    store: &mut Store<B>,
    result: &LootResult,
    now: DateTime<Utc>,
) -> QuizRecord {
    let entry = RewardHistoryEntry {
        item: result.item.name.clone(),
        rarity: result.rarity.id.clone(),
        score: result.score,
        date: now,
    };
    debug!(item = %entry.item, rarity = %entry.rarity, "recording reward");

    store.update(QUIZ_DATA_KEY, QuizRecord::default(), |record| {
        record.rewards.push(entry);
        truncate_front(&mut record.rewards, MAX_REWARD_HISTORY);
    })
}

/// Stored reward history, oldest first
pub fn reward_history<B: Backend>(store: &Store<B>) -> Vec<RewardHistoryEntry> {
    store.quiz_data().rewards
}

/// Count stored rewards per tier.
///
/// Every tier in `tiers` appears in the result (in the given order), zero
/// when absent from history. History entries naming other tiers are ignored.
pub fn rarity_stats<B: Backend>(store: &Store<B>, tiers: &[RarityTier]) -> Vec<(String, usize)> {
    let history = reward_history(store);
    tiers
        .iter()
        .map(|tier| {
            let count = history.iter().filter(|r| r.rarity == tier.id).count();
            (tier.id.clone(), count)
        })
        .collect()
}

/// Record a finished quiz attempt with the current time
pub fn record_attempt<B: Backend>(
    store: &mut Store<B>,
    score: i64,
    answers: &[Option<usize>],
) -> QuizRecord {
    record_attempt_at(store, score, answers, Utc::now())
}

/// Record a finished quiz attempt: raise the best score, count the attempt,
/// and append to the score history bounded to [`MAX_SCORE_HISTORY`]
pub fn record_attempt_at<B: Backend>(
    store: &mut Store<B>,
    score: i64,
    answers: &[Option<usize>],
    now: DateTime<Utc>,
) -> QuizRecord {
    store.update(QUIZ_DATA_KEY, QuizRecord::default(), |record| {
        record.best_score = record.best_score.max(score);
        record.attempts = record.attempts.saturating_add(1);
        record.score_history.push(ScoreHistoryEntry {
            score,
            date: now,
            answers: answers.to_vec(),
        });
        truncate_front(&mut record.score_history, MAX_SCORE_HISTORY);
    })
}

/// Best score, attempt count and rounded mean over the score history
pub fn quiz_stats<B: Backend>(store: &Store<B>) -> QuizStats {
    let record = store.quiz_data();
    let average_score = if record.score_history.is_empty() {
        0
    } else {
        let total: i64 = record.score_history.iter().map(|a| a.score).sum();
        (total as f64 / record.score_history.len() as f64).round() as i64
    };

    QuizStats {
        best_score: record.best_score,
        attempts: record.attempts,
        average_score,
    }
}
