//! Score-tiered loot engine
//!
//! A score picks a drop table, the table's weights pick a rarity tier, and a
//! uniform pick among that tier's items produces the reward. Everything here is
//! a pure function of (score, catalog, random source).

use crate::catalog::{DropTableRow, LootCatalog, RarityTier, RewardItem, TierWeights};
use crate::rng::RandomSource;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DrawError {
    /// The catalog cannot produce a well-defined draw
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("No item for rarity `{0}`")]
    NoItemForTier(String),
}

/// Outcome of one loot draw
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LootResult {
    pub item: RewardItem,
    /// Tier of the awarded item, with its display metadata
    pub rarity: RarityTier,
    pub score: i64,
    /// Tier the weights rolled when it had no items and a neighbour was used
    #[serde(rename = "rolledFrom", default, skip_serializing_if = "Option::is_none")]
    pub rolled_from: Option<String>,
}

/// Find the drop table that applies to `score`.
///
/// Rows are considered by descending `min_score`; the first with
/// `min_score <= score` wins. Scores below every threshold get the lowest
/// row. Equal thresholds keep catalog order. Returns `None` only for an empty
/// slice.
pub fn resolve_drop_table(score: i64, rows: &[DropTableRow]) -> Option<&DropTableRow> {
    let mut sorted: Vec<&DropTableRow> = rows.iter().collect();
    sorted.sort_by_key(|row| Reverse(row.min_score));

    sorted
        .into_iter()
        .find(|row| row.min_score <= score)
        .or_else(|| rows.iter().min_by_key(|row| row.min_score))
}

/// Weighted pick over ordered tier weights.
///
/// Draws `r * total` and subtracts weights in declaration order until the
/// remainder reaches zero or below. Zero-weight tiers are skipped so they can
/// never be returned.
pub fn weighted_tier<'a>(
    weights: &'a TierWeights,
    rng: &mut dyn RandomSource,
) -> Result<&'a str, DrawError> {
    let total = weights.total();
    if total == 0 {
        return Err(DrawError::Configuration(
            "drop table weights sum to zero".into(),
        ));
    }

    let mut remaining = rng.next_f64() * total as f64;
    let mut last_reachable = None;
    for (tier, weight) in weights.iter() {
        if weight == 0 {
            continue;
        }
        last_reachable = Some(tier);
        remaining -= f64::from(weight);
        if remaining <= 0.0 {
            return Ok(tier);
        }
    }

    // Only reachable through float rounding at the very top of the range
    last_reachable.ok_or_else(|| DrawError::Configuration("no reachable tier".into()))
}

/// Roll a rarity tier for `score`
pub fn draw_rarity<'a>(
    score: i64,
    catalog: &'a LootCatalog,
    rng: &mut dyn RandomSource,
) -> Result<&'a RarityTier, DrawError> {
    let table = resolve_drop_table(score, catalog.drop_tables())
        .ok_or_else(|| DrawError::Configuration("catalog has no drop tables".into()))?;
    let tier = weighted_tier(&table.weights, rng)?;
    debug!(score, min_score = table.min_score, tier, "rolled rarity");

    catalog
        .rarity(tier)
        .ok_or_else(|| DrawError::Configuration(format!("rarity `{}` has no metadata", tier)))
}

/// Uniform pick among the items of one tier
pub fn select_item<'a>(
    tier: &str,
    catalog: &'a LootCatalog,
    rng: &mut dyn RandomSource,
) -> Result<&'a RewardItem, DrawError> {
    let candidates: Vec<&RewardItem> = catalog.items_of(tier).collect();
    if candidates.is_empty() {
        return Err(DrawError::NoItemForTier(tier.to_string()));
    }
    Ok(candidates[rng.next_index(candidates.len())])
}

/// Roll a tier and an item for `score`.
///
/// If the rolled tier has no items, lower tiers are tried first (nearest
/// first), then higher ones. Only a catalog without any items fails.
pub fn generate_loot(
    score: i64,
    catalog: &LootCatalog,
    rng: &mut dyn RandomSource,
) -> Result<LootResult, DrawError> {
    let rolled = draw_rarity(score, catalog, rng)?;

    match select_item(&rolled.id, catalog, rng) {
        Ok(item) => Ok(LootResult {
            item: item.clone(),
            rarity: rolled.clone(),
            score,
            rolled_from: None,
        }),
        Err(DrawError::NoItemForTier(_)) => {
            let fallback = fallback_tiers(catalog, &rolled.id)
                .find(|tier| catalog.items_of(&tier.id).next().is_some())
                .ok_or_else(|| DrawError::Configuration("catalog has no items".into()))?;
            warn!(
                "No item for rarity {}, substituting {}",
                rolled.id, fallback.id
            );
            let item = select_item(&fallback.id, catalog, rng)?;
            Ok(LootResult {
                item: item.clone(),
                rarity: fallback.clone(),
                score,
                rolled_from: Some(rolled.id.clone()),
            })
        }
        Err(e) => Err(e),
    }
}

/// Tiers to try when `rolled` is empty: lower ones nearest-first, then higher
fn fallback_tiers<'a>(
    catalog: &'a LootCatalog,
    rolled: &str,
) -> impl Iterator<Item = &'a RarityTier> {
    let tiers = catalog.rarities();
    let idx = catalog.tier_index(rolled).unwrap_or(0);
    tiers[..idx]
        .iter()
        .rev()
        .chain(tiers.iter().skip(idx + 1))
}

/// Loot engine bound to one catalog.
///
/// Holds no mutable state, so a single engine can serve any number of draws.
#[derive(Debug, Clone)]
pub struct LootEngine {
    catalog: LootCatalog,
}

impl LootEngine {
    pub fn new(catalog: LootCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &LootCatalog {
        &self.catalog
    }

    pub fn drop_table(&self, score: i64) -> Option<&DropTableRow> {
        resolve_drop_table(score, self.catalog.drop_tables())
    }

    pub fn draw_rarity(
        &self,
        score: i64,
        rng: &mut dyn RandomSource,
    ) -> Result<&RarityTier, DrawError> {
        draw_rarity(score, &self.catalog, rng)
    }

    pub fn generate(&self, score: i64, rng: &mut dyn RandomSource) -> Result<LootResult, DrawError> {
        generate_loot(score, &self.catalog, rng)
    }

    /// Probability of each declared tier at `score`, in declaration order
    pub fn odds(&self, score: i64) -> Vec<(&RarityTier, f64)> {
        let Some(table) = self.drop_table(score) else {
            return Vec::new();
        };
        let total = table.weights.total();
        self.catalog
            .rarities()
            .iter()
            .map(|tier| {
                let weight = table.weights.weight(&tier.id).unwrap_or(0);
                let p = if total == 0 {
                    0.0
                } else {
                    f64::from(weight) / total as f64
                };
                (tier, p)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::rng::{RngSource, SequenceRandom};

    fn tier(id: &str) -> RarityTier {
        RarityTier {
            id: id.to_string(),
            label: id.to_lowercase(),
            color: "#000000".to_string(),
        }
    }

    fn row(min_score: i64, weights: &[(&str, u32)]) -> DropTableRow {
        DropTableRow {
            min_score,
            weights: TierWeights::new(weights.iter().map(|(t, w)| (t.to_string(), *w))),
        }
    }

    fn item(name: &str, rarity: &str) -> RewardItem {
        RewardItem {
            name: name.to_string(),
            rarity: rarity.to_string(),
            description: String::new(),
            icon: None,
        }
    }

    #[test]
    fn test_concrete_85_lands_in_rare() {
        let weights = row(0, &[("COMMON", 80), ("RARE", 18), ("EPIC", 2)]).weights;
        let mut rng = SequenceRandom::constant(0.85);
        assert_eq!(weighted_tier(&weights, &mut rng).unwrap(), "RARE");
    }

    #[test]
    fn test_weighted_boundaries() {
        // Power-of-two total keeps every boundary exact in f64
        let weights = row(0, &[("COMMON", 2), ("RARE", 1), ("EPIC", 1)]).weights;
        let pick = |r: f64| weighted_tier(&weights, &mut SequenceRandom::constant(r)).unwrap();
        assert_eq!(pick(0.0), "COMMON");
        assert_eq!(pick(0.5), "COMMON");
        assert_eq!(pick(0.5001), "RARE");
        assert_eq!(pick(0.75), "RARE");
        assert_eq!(pick(0.7501), "EPIC");
        assert_eq!(pick(0.999_999), "EPIC");
    }

    #[test]
    fn test_zero_weight_never_returned() {
        let weights = row(0, &[("COMMON", 0), ("RARE", 5), ("EPIC", 0)]).weights;
        assert_eq!(
            weighted_tier(&weights, &mut SequenceRandom::constant(0.0)).unwrap(),
            "RARE"
        );
        let mut rng = RngSource::seeded(3);
        for _ in 0..1_000 {
            assert_eq!(weighted_tier(&weights, &mut rng).unwrap(), "RARE");
        }
    }

    #[test]
    fn test_all_zero_weights_is_configuration_error() {
        let weights = row(0, &[("COMMON", 0), ("RARE", 0)]).weights;
        let err = weighted_tier(&weights, &mut SequenceRandom::constant(0.5)).unwrap_err();
        assert!(matches!(err, DrawError::Configuration(_)));
    }

    #[test]
    fn test_empirical_frequencies_converge() {
        let weights = row(0, &[("COMMON", 60), ("RARE", 30), ("EPIC", 10)]).weights;
        let mut rng = RngSource::seeded(12_345);
        let n = 10_000;
        let mut counts = [0u32; 3];
        for _ in 0..n {
            match weighted_tier(&weights, &mut rng).unwrap() {
                "COMMON" => counts[0] += 1,
                "RARE" => counts[1] += 1,
                "EPIC" => counts[2] += 1,
                other => panic!("unexpected tier {other}"),
            }
        }
        for (count, expected) in counts.iter().zip([0.60, 0.30, 0.10]) {
            let freq = f64::from(*count) / f64::from(n);
            assert!(
                (freq - expected).abs() < 0.03,
                "frequency {freq} too far from {expected}"
            );
        }
    }

    #[test]
    fn test_resolve_picks_highest_applicable() {
        let rows = vec![
            row(0, &[("C", 1)]),
            row(60, &[("C", 2)]),
            row(85, &[("C", 3)]),
        ];
        assert_eq!(resolve_drop_table(0, &rows).unwrap().min_score, 0);
        assert_eq!(resolve_drop_table(59, &rows).unwrap().min_score, 0);
        assert_eq!(resolve_drop_table(60, &rows).unwrap().min_score, 60);
        assert_eq!(resolve_drop_table(84, &rows).unwrap().min_score, 60);
        assert_eq!(resolve_drop_table(85, &rows).unwrap().min_score, 85);
        assert_eq!(resolve_drop_table(100, &rows).unwrap().min_score, 85);
    }

    #[test]
    fn test_resolve_unordered_rows_and_low_score_fallback() {
        let rows = vec![
            row(85, &[("C", 3)]),
            row(20, &[("C", 1)]),
            row(60, &[("C", 2)]),
        ];
        assert_eq!(resolve_drop_table(70, &rows).unwrap().min_score, 60);
        // Below every threshold: the lowest row, not the first declared
        assert_eq!(resolve_drop_table(5, &rows).unwrap().min_score, 20);
        assert_eq!(resolve_drop_table(-50, &rows).unwrap().min_score, 20);
        assert!(resolve_drop_table(5, &[]).is_none());
    }

    #[test]
    fn test_resolve_ties_keep_catalog_order() {
        let rows = vec![row(50, &[("C", 1)]), row(50, &[("C", 2)])];
        let picked = resolve_drop_table(70, &rows).unwrap();
        assert_eq!(picked.weights.weight("C"), Some(1));
        let fallback = resolve_drop_table(10, &rows).unwrap();
        assert_eq!(fallback.weights.weight("C"), Some(1));
    }

    #[test]
    fn test_resolve_is_monotonic() {
        let catalog = LootCatalog::embedded();
        let rows = catalog.drop_tables();
        let mut previous = i64::MIN;
        for score in -20..=150 {
            let min = resolve_drop_table(score, rows).unwrap().min_score;
            assert!(min >= previous, "score {score} resolved to lower table");
            previous = min;
        }
    }

    #[test]
    fn test_generate_is_deterministic() {
        let engine = LootEngine::new(LootCatalog::embedded());
        for score in [0, 60, 85, 100] {
            let a = engine.generate(score, &mut RngSource::seeded(99)).unwrap();
            let b = engine.generate(score, &mut RngSource::seeded(99)).unwrap();
            assert_eq!(a, b);
            assert_eq!(a.score, score);
            assert_eq!(a.item.rarity, a.rarity.id);
        }
    }

    #[test]
    fn test_generate_with_scripted_sequence() {
        let engine = LootEngine::new(LootCatalog::embedded());
        // Score 90 uses {40, 40, 20}; 0.9 lands in EPIC, 0.0 picks the first EPIC item
        let mut rng = SequenceRandom::new(vec![0.9, 0.0]);
        let loot = engine.generate(90, &mut rng).unwrap();
        assert_eq!(loot.rarity.id, "EPIC");
        assert_eq!(loot.rarity.label, "Épique");
        assert_eq!(loot.item.name, "Week-end surprise");
        assert_eq!(loot.rolled_from, None);
    }

    #[test]
    fn test_select_item_reports_empty_tier() {
        let catalog = LootCatalog::new(
            vec![tier("COMMON"), tier("RARE")],
            vec![row(0, &[("COMMON", 1), ("RARE", 1)])],
            vec![item("a", "COMMON")],
        )
        .unwrap();
        let err = select_item("RARE", &catalog, &mut SequenceRandom::constant(0.0)).unwrap_err();
        assert_eq!(err, DrawError::NoItemForTier("RARE".into()));
    }

    #[test]
    fn test_empty_tier_falls_back_lower_first() {
        let catalog = LootCatalog::new(
            vec![tier("COMMON"), tier("RARE"), tier("EPIC")],
            vec![row(0, &[("RARE", 1)])],
            vec![item("low", "COMMON"), item("high", "EPIC")],
        )
        .unwrap();
        let loot = generate_loot(50, &catalog, &mut SequenceRandom::constant(0.3)).unwrap();
        assert_eq!(loot.item.name, "low");
        assert_eq!(loot.rarity.id, "COMMON");
        assert_eq!(loot.rolled_from.as_deref(), Some("RARE"));
    }

    #[test]
    fn test_empty_tier_falls_back_upward_when_nothing_below() {
        let catalog = LootCatalog::new(
            vec![tier("COMMON"), tier("RARE")],
            vec![row(0, &[("COMMON", 1)])],
            vec![item("shiny", "RARE")],
        )
        .unwrap();
        let loot = generate_loot(0, &catalog, &mut SequenceRandom::constant(0.5)).unwrap();
        assert_eq!(loot.item.name, "shiny");
        assert_eq!(loot.rolled_from.as_deref(), Some("COMMON"));
    }

    #[test]
    fn test_catalog_without_items_fails() {
        let catalog =
            LootCatalog::new(vec![tier("COMMON")], vec![row(0, &[("COMMON", 1)])], vec![])
                .unwrap();
        let err = generate_loot(0, &catalog, &mut SequenceRandom::constant(0.5)).unwrap_err();
        assert!(matches!(err, DrawError::Configuration(_)));
    }

    #[test]
    fn test_fallback_catalog_still_generates() {
        let catalog = LootCatalog::load_or_default("/no/such/dir/loot.json");
        let engine = LootEngine::new(catalog);
        let loot = engine.generate(72, &mut RngSource::seeded(1)).unwrap();
        assert!(engine.catalog().rarity(&loot.rarity.id).is_some());
    }

    #[test]
    fn test_odds_sum_to_one() {
        let engine = LootEngine::new(LootCatalog::embedded());
        let odds = engine.odds(0);
        assert_eq!(odds.len(), 3);
        assert!((odds[0].1 - 0.80).abs() < 1e-12);
        let total: f64 = odds.iter().map(|(_, p)| p).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }
}
