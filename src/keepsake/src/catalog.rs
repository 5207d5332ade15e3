//! Reward, gift and question catalogs
//!
//! Catalogs arrive as JSON (a file next to the host, or text the host fetched)
//! and are validated on the way in. When loading fails the embedded default
//! catalog is substituted so the experience keeps working offline.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::warn;

const EMBEDDED_LOOT: &str = include_str!("../data/loot.json");
const EMBEDDED_GIFTS: &str = include_str!("../data/gifts.json");
const EMBEDDED_QUIZ: &str = include_str!("../data/quiz.json");

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid catalog: {0}")]
    Invalid(String),
}

/// Shared loading behaviour for every catalog kind.
pub trait Catalog: Sized + serde::de::DeserializeOwned {
    /// Human-readable kind, used in log lines
    const KIND: &'static str;

    /// JSON compiled into the binary
    const EMBEDDED: &'static str;

    /// Parse and validate a catalog from JSON text
    fn from_json(json: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a catalog from a file
    fn load<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// The built-in default catalog
    fn embedded() -> Self {
        Self::from_json(Self::EMBEDDED)
            .unwrap_or_else(|e| panic!("embedded {} catalog is invalid: {}", Self::KIND, e))
    }

    /// Load from a file, falling back to the embedded catalog on any failure
    fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(catalog) => catalog,
            Err(e) => {
                warn!(
                    "Failed to load {} catalog from {}, using embedded default: {}",
                    Self::KIND,
                    path.display(),
                    e
                );
                Self::embedded()
            }
        }
    }

    /// Parse fetched text, falling back to the embedded catalog when the
    /// fetch produced nothing (`None`, e.g. a non-success status) or the
    /// text does not validate
    fn from_json_or_default(json: Option<&str>) -> Self {
        let Some(json) = json else {
            warn!("No {} catalog supplied, using embedded default", Self::KIND);
            return Self::embedded();
        };
        Self::from_json(json).unwrap_or_else(|e| {
            warn!("Invalid {} catalog, using embedded default: {}", Self::KIND, e);
            Self::embedded()
        })
    }
}

/// JSON objects whose key order carries meaning, kept as ordered pairs.
///
/// Order is preserved when deserializing straight from text; going through an
/// intermediate `serde_json::Value` would sort the keys.
mod ordered {
    use serde::de::{Deserialize, Deserializer, Error, MapAccess, Visitor};
    use serde::ser::{Serialize, SerializeMap, Serializer};
    use std::fmt;
    use std::marker::PhantomData;

    #[allow(clippy::ptr_arg)]
    pub fn serialize<S, V>(entries: &Vec<(String, V)>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        V: Serialize,
    {
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (key, value) in entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D, V>(deserializer: D) -> Result<Vec<(String, V)>, D::Error>
    where
        D: Deserializer<'de>,
        V: Deserialize<'de>,
    {
        struct OrderedVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedVisitor<V> {
            type Value = Vec<(String, V)>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries: Vec<(String, V)> =
                    Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, V>()? {
                    if entries.iter().any(|(k, _)| *k == key) {
                        return Err(A::Error::custom(format!("duplicate key `{}`", key)));
                    }
                    entries.push((key, value));
                }
                Ok(entries)
            }
        }

        deserializer.deserialize_map(OrderedVisitor(PhantomData))
    }
}

// ---------------------------------------------------------------------------
// Score-tiered loot catalog
// ---------------------------------------------------------------------------

/// Rarity tier with display metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RarityTier {
    pub id: String,
    pub label: String,
    pub color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RarityStyle {
    label: String,
    color: String,
}

/// Tier weights in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TierWeights(Vec<(String, u32)>);

impl TierWeights {
    pub fn new(pairs: impl IntoIterator<Item = (String, u32)>) -> Self {
        Self(pairs.into_iter().collect())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.0.iter().map(|(tier, w)| (tier.as_str(), *w))
    }

    /// Sum of all weights
    pub fn total(&self) -> u64 {
        self.0.iter().map(|(_, w)| u64::from(*w)).sum()
    }

    pub fn weight(&self, tier: &str) -> Option<u32> {
        self.0.iter().find(|(t, _)| t == tier).map(|(_, w)| *w)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for TierWeights {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ordered::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for TierWeights {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        ordered::deserialize(deserializer).map(TierWeights)
    }
}

/// Score-gated tier weights. Applies to every score `>= min_score`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropTableRow {
    #[serde(rename = "minScore")]
    pub min_score: i64,
    pub weights: TierWeights,
}

/// A reward that can be won through the loot engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardItem {
    pub name: String,
    pub rarity: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawLootCatalog {
    #[serde(with = "ordered")]
    rarities: Vec<(String, RarityStyle)>,
    #[serde(rename = "dropTables")]
    drop_tables: Vec<DropTableRow>,
    items: Vec<RewardItem>,
}

/// Rarities, score-gated drop tables and the items they resolve to.
///
/// Immutable once built; every engine borrows it read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawLootCatalog", into = "RawLootCatalog")]
pub struct LootCatalog {
    rarities: Vec<RarityTier>,
    drop_tables: Vec<DropTableRow>,
    items: Vec<RewardItem>,
}

impl LootCatalog {
    /// Build a catalog, checking that every tier reference is declared
    pub fn new(
        rarities: Vec<RarityTier>,
        drop_tables: Vec<DropTableRow>,
        items: Vec<RewardItem>,
    ) -> Result<Self, CatalogError> {
        if rarities.is_empty() {
            return Err(CatalogError::Invalid("no rarities declared".into()));
        }
        if drop_tables.is_empty() {
            return Err(CatalogError::Invalid("no drop tables declared".into()));
        }
        for (i, tier) in rarities.iter().enumerate() {
            if rarities[..i].iter().any(|t| t.id == tier.id) {
                return Err(CatalogError::Invalid(format!("duplicate rarity `{}`", tier.id)));
            }
        }

        let declared = |id: &str| rarities.iter().any(|t| t.id == id);

        for row in &drop_tables {
            if let Some((tier, _)) = row.weights.iter().find(|&(tier, _)| !declared(tier)) {
                return Err(CatalogError::Invalid(format!(
                    "drop table minScore={} weights undeclared rarity `{}`",
                    row.min_score, tier
                )));
            }
        }
        if let Some(item) = items.iter().find(|item| !declared(&item.rarity)) {
            return Err(CatalogError::Invalid(format!(
                "item `{}` has undeclared rarity `{}`",
                item.name, item.rarity
            )));
        }

        Ok(Self {
            rarities,
            drop_tables,
            items,
        })
    }

    pub fn rarities(&self) -> &[RarityTier] {
        &self.rarities
    }

    pub fn drop_tables(&self) -> &[DropTableRow] {
        &self.drop_tables
    }

    pub fn items(&self) -> &[RewardItem] {
        &self.items
    }

    /// Look up a rarity tier by identifier
    pub fn rarity(&self, id: &str) -> Option<&RarityTier> {
        self.rarities.iter().find(|t| t.id == id)
    }

    /// Position of a tier in declaration order
    pub fn tier_index(&self, id: &str) -> Option<usize> {
        self.rarities.iter().position(|t| t.id == id)
    }

    /// Items belonging to one tier, in catalog order
    pub fn items_of(&self, tier: &str) -> impl Iterator<Item = &RewardItem> {
        let tier = tier.to_string();
        self.items.iter().filter(move |item| item.rarity == tier)
    }
}

impl TryFrom<RawLootCatalog> for LootCatalog {
    type Error = CatalogError;

    fn try_from(raw: RawLootCatalog) -> Result<Self, Self::Error> {
        let rarities = raw
            .rarities
            .into_iter()
            .map(|(id, style)| RarityTier {
                id,
                label: style.label,
                color: style.color,
            })
            .collect();
        LootCatalog::new(rarities, raw.drop_tables, raw.items)
    }
}

impl From<LootCatalog> for RawLootCatalog {
    fn from(catalog: LootCatalog) -> Self {
        RawLootCatalog {
            rarities: catalog
                .rarities
                .into_iter()
                .map(|t| {
                    (
                        t.id,
                        RarityStyle {
                            label: t.label,
                            color: t.color,
                        },
                    )
                })
                .collect(),
            drop_tables: catalog.drop_tables,
            items: catalog.items,
        }
    }
}

impl Catalog for LootCatalog {
    const KIND: &'static str = "loot";
    const EMBEDDED: &'static str = EMBEDDED_LOOT;
}

// ---------------------------------------------------------------------------
// Flat-probability gift catalog
// ---------------------------------------------------------------------------

/// Presentational rarity of a gift. Not related to [`RarityTier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum GiftRarity {
    Common,
    Rare,
    Legendary,
    Mythic,
}

impl GiftRarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            GiftRarity::Common => "common",
            GiftRarity::Rare => "rare",
            GiftRarity::Legendary => "legendary",
            GiftRarity::Mythic => "mythic",
        }
    }

    /// Star-prefixed label shown next to a revealed gift
    pub fn label(&self) -> &'static str {
        match self {
            GiftRarity::Common => "⭐ Commun",
            GiftRarity::Rare => "⭐⭐ Rare",
            GiftRarity::Legendary => "⭐⭐⭐ Légendaire",
            GiftRarity::Mythic => "⭐⭐⭐⭐ Mythique",
        }
    }
}

impl From<String> for GiftRarity {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "rare" => GiftRarity::Rare,
            "legendary" => GiftRarity::Legendary,
            "mythic" => GiftRarity::Mythic,
            _ => GiftRarity::Common,
        }
    }
}

impl std::fmt::Display for GiftRarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A gift with an absolute drop probability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GiftCatalogEntry {
    pub id: u32,
    #[serde(default)]
    pub icon: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    /// Absolute probability in `[0, 1]`
    #[serde(rename = "dropRate")]
    pub drop_rate: f64,
    pub rarity: GiftRarity,
}

/// Ordered gift catalog. The first entry is the designated fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<GiftCatalogEntry>", into = "Vec<GiftCatalogEntry>")]
pub struct GiftCatalog {
    entries: Vec<GiftCatalogEntry>,
}

impl GiftCatalog {
    pub fn new(entries: Vec<GiftCatalogEntry>) -> Result<Self, CatalogError> {
        if entries.is_empty() {
            return Err(CatalogError::Invalid("gift catalog is empty".into()));
        }
        if let Some(bad) = entries
            .iter()
            .find(|g| !g.drop_rate.is_finite() || !(0.0..=1.0).contains(&g.drop_rate))
        {
            return Err(CatalogError::Invalid(format!(
                "gift {} has drop rate {} outside [0, 1]",
                bad.id, bad.drop_rate
            )));
        }

        let catalog = Self { entries };
        let total = catalog.total_rate();
        if total > 1.0 + 1e-9 {
            warn!(
                "Gift drop rates sum to {:.6}; entries past 1.0 are unreachable",
                total
            );
        }
        Ok(catalog)
    }

    pub fn entries(&self) -> &[GiftCatalogEntry] {
        &self.entries
    }

    /// Entry returned when a sample falls past every cumulative threshold
    pub fn fallback(&self) -> &GiftCatalogEntry {
        &self.entries[0]
    }

    /// Sum of every drop rate
    pub fn total_rate(&self) -> f64 {
        self.entries.iter().map(|g| g.drop_rate).sum()
    }

    pub fn get(&self, id: u32) -> Option<&GiftCatalogEntry> {
        self.entries.iter().find(|g| g.id == id)
    }
}

impl TryFrom<Vec<GiftCatalogEntry>> for GiftCatalog {
    type Error = CatalogError;

    fn try_from(entries: Vec<GiftCatalogEntry>) -> Result<Self, Self::Error> {
        GiftCatalog::new(entries)
    }
}

impl From<GiftCatalog> for Vec<GiftCatalogEntry> {
    fn from(catalog: GiftCatalog) -> Self {
        catalog.entries
    }
}

impl Catalog for GiftCatalog {
    const KIND: &'static str = "gift";
    const EMBEDDED: &'static str = EMBEDDED_GIFTS;
}

// ---------------------------------------------------------------------------
// Quiz questions
// ---------------------------------------------------------------------------

/// Multiple-choice question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub question: String,
    pub choices: Vec<String>,
    #[serde(rename = "answerIndex")]
    pub answer_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Question>", into = "Vec<Question>")]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    pub fn new(questions: Vec<Question>) -> Result<Self, CatalogError> {
        for q in &questions {
            if q.choices.is_empty() {
                return Err(CatalogError::Invalid(format!("question `{}` has no choices", q.id)));
            }
            if q.answer_index >= q.choices.len() {
                return Err(CatalogError::Invalid(format!(
                    "question `{}` answer index {} out of range",
                    q.id, q.answer_index
                )));
            }
        }
        Ok(Self { questions })
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

impl TryFrom<Vec<Question>> for QuestionBank {
    type Error = CatalogError;

    fn try_from(questions: Vec<Question>) -> Result<Self, Self::Error> {
        QuestionBank::new(questions)
    }
}

impl From<QuestionBank> for Vec<Question> {
    fn from(bank: QuestionBank) -> Self {
        bank.questions
    }
}

impl Catalog for QuestionBank {
    const KIND: &'static str = "quiz";
    const EMBEDDED: &'static str = EMBEDDED_QUIZ;
}
