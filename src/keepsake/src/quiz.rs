//! Quiz scoring and the end-of-quiz reward flow

use crate::catalog::QuestionBank;
use crate::history::{record_attempt, record_loot};
use crate::loot::{LootEngine, LootResult};
use crate::rng::RandomSource;
use crate::storage::{Backend, Store};
use serde::Serialize;
use tracing::warn;

/// Percentage of correct answers, rounded to the nearest integer.
///
/// Missing or out-of-range answers count as wrong. An empty bank scores 0.
pub fn score_answers(bank: &QuestionBank, answers: &[Option<usize>]) -> i64 {
    if bank.is_empty() {
        return 0;
    }
    let correct = bank
        .questions()
        .iter()
        .enumerate()
        .filter(|(i, q)| answers.get(*i).copied().flatten() == Some(q.answer_index))
        .count();
    (correct as f64 / bank.len() as f64 * 100.0).round() as i64
}

/// Result banner tier, matching the default drop-table thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBand {
    Trophy,
    Celebration,
    Encouragement,
}

impl ScoreBand {
    pub fn from_score(score: i64) -> Self {
        if score >= 85 {
            ScoreBand::Trophy
        } else if score >= 60 {
            ScoreBand::Celebration
        } else {
            ScoreBand::Encouragement
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            ScoreBand::Trophy => "🏆",
            ScoreBand::Celebration => "🎉",
            ScoreBand::Encouragement => "😊",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizOutcome {
    pub score: i64,
    pub band: ScoreBand,
    /// `None` when the catalog could not produce a reward
    pub loot: Option<LootResult>,
}

/// Score a finished quiz, draw its reward and persist both.
///
/// A misconfigured loot catalog is logged and yields an outcome without loot;
/// the attempt is still recorded.
pub fn complete_quiz<B: Backend>(
    store: &mut Store<B>,
    engine: &LootEngine,
    bank: &QuestionBank,
    answers: &[Option<usize>],
    rng: &mut dyn RandomSource,
) -> QuizOutcome {
    let score = score_answers(bank, answers);

    let loot = match engine.generate(score, rng) {
        Ok(loot) => {
            record_loot(store, &loot);
            Some(loot)
        }
        Err(e) => {
            warn!("Unable to generate a reward for score {}: {}", score, e);
            None
        }
    };
    record_attempt(store, score, answers);

    QuizOutcome {
        score,
        band: ScoreBand::from_score(score),
        loot,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{
        Catalog, DropTableRow, LootCatalog, Question, RarityTier, TierWeights,
    };
    use crate::rng::{RngSource, SequenceRandom};

    fn bank(n: usize) -> QuestionBank {
        QuestionBank::new(
            (0..n)
                .map(|i| Question {
                    id: format!("q{}", i),
                    question: "?".into(),
                    choices: vec!["a".into(), "b".into()],
                    answer_index: 1,
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_score_rounds_percentage() {
        let b = bank(3);
        assert_eq!(score_answers(&b, &[Some(1), Some(1), Some(0)]), 67);
        assert_eq!(score_answers(&b, &[Some(1), Some(1), Some(1)]), 100);
        assert_eq!(score_answers(&b, &[]), 0);
    }

    #[test]
    fn test_skipped_and_extra_answers() {
        let b = bank(2);
        assert_eq!(score_answers(&b, &[None, Some(1), Some(1)]), 50);
        assert_eq!(score_answers(&bank(0), &[Some(1)]), 0);
    }

    #[test]
    fn test_default_bank_perfect_score() {
        let b = QuestionBank::embedded();
        let answers: Vec<Option<usize>> =
            b.questions().iter().map(|q| Some(q.answer_index)).collect();
        assert_eq!(score_answers(&b, &answers), 100);
    }

    #[test]
    fn test_score_bands() {
        assert_eq!(ScoreBand::from_score(100), ScoreBand::Trophy);
        assert_eq!(ScoreBand::from_score(85), ScoreBand::Trophy);
        assert_eq!(ScoreBand::from_score(84), ScoreBand::Celebration);
        assert_eq!(ScoreBand::from_score(60), ScoreBand::Celebration);
        assert_eq!(ScoreBand::from_score(59), ScoreBand::Encouragement);
        assert_eq!(ScoreBand::Trophy.icon(), "🏆");
    }

    #[test]
    fn test_complete_quiz_records_everything() {
        let mut store = Store::in_memory();
        let engine = LootEngine::new(LootCatalog::embedded());
        let b = bank(4);
        let outcome = complete_quiz(
            &mut store,
            &engine,
            &b,
            &[Some(1), Some(1), Some(1), Some(0)],
            &mut RngSource::seeded(11),
        );
        assert_eq!(outcome.score, 75);
        assert_eq!(outcome.band, ScoreBand::Celebration);
        assert!(outcome.loot.is_some());

        let record = store.quiz_data();
        assert_eq!(record.attempts, 1);
        assert_eq!(record.best_score, 75);
        assert_eq!(record.rewards.len(), 1);
        assert_eq!(record.score_history[0].answers.len(), 4);
    }

    #[test]
    fn test_misconfigured_catalog_still_records_attempt() {
        let catalog = LootCatalog::new(
            vec![RarityTier {
                id: "COMMON".into(),
                label: "Common".into(),
                color: "#fff".into(),
            }],
            vec![DropTableRow {
                min_score: 0,
                weights: TierWeights::new([("COMMON".to_string(), 0)]),
            }],
            vec![],
        )
        .unwrap();
        let engine = LootEngine::new(catalog);
        let mut store = Store::in_memory();

        let outcome = complete_quiz(
            &mut store,
            &engine,
            &bank(1),
            &[Some(1)],
            &mut SequenceRandom::constant(0.5),
        );
        assert!(outcome.loot.is_none());
        let record = store.quiz_data();
        assert_eq!(record.attempts, 1);
        assert!(record.rewards.is_empty());
    }
}
