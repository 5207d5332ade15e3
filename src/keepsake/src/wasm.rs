//! WebAssembly bindings for keepsake
//!
//! JSON strings cross the boundary in both directions. Randomness comes from
//! `Math.random` and persistence from the page's `localStorage`.

use crate::catalog::{Catalog, GiftCatalog, LootCatalog, QuestionBank};
use crate::gift::DrawSession;
use crate::history::{quiz_stats, rarity_stats, record_loot, reward_history};
use crate::letter::LetterGate;
use crate::loot::{LootEngine as RustLootEngine, LootResult};
use crate::quiz::{complete_quiz, score_answers as rust_score_answers};
use crate::rng::RandomSource;
use crate::storage::{Backend, StorageError, Store};
use js_sys::{Function, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

struct MathRandom;

impl RandomSource for MathRandom {
    fn next_f64(&mut self) -> f64 {
        js_sys::Math::random()
    }
}

/// `window.localStorage`, or nothing when the page forbids it
struct LocalStorageBackend {
    storage: Option<JsValue>,
}

impl LocalStorageBackend {
    fn new() -> Self {
        let storage = Reflect::get(&js_sys::global(), &JsValue::from_str("localStorage"))
            .ok()
            .filter(|v| !v.is_undefined() && !v.is_null());
        Self { storage }
    }

    fn call(&self, method: &str, args: &[JsValue]) -> Result<JsValue, StorageError> {
        let storage = self
            .storage
            .as_ref()
            .ok_or_else(|| StorageError::Unavailable("localStorage is not available".into()))?;
        let func: Function = Reflect::get(storage, &JsValue::from_str(method))
            .map_err(js_error)?
            .dyn_into()
            .map_err(js_error)?;
        let args: js_sys::Array = args.iter().collect();
        Reflect::apply(&func, storage, &args).map_err(js_error)
    }
}

fn js_error(e: JsValue) -> StorageError {
    StorageError::Unavailable(format!("{:?}", e))
}

impl Backend for LocalStorageBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.call("getItem", &[JsValue::from_str(key)])?.as_string())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.call("setItem", &[JsValue::from_str(key), JsValue::from_str(value)])?;
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        self.call("removeItem", &[JsValue::from_str(key)])?;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let storage = self
            .storage
            .as_ref()
            .ok_or_else(|| StorageError::Unavailable("localStorage is not available".into()))?;
        let len = Reflect::get(storage, &JsValue::from_str("length"))
            .map_err(js_error)?
            .as_f64()
            .unwrap_or(0.0) as u32;
        let mut keys = Vec::with_capacity(len as usize);
        for i in 0..len {
            if let Some(key) = self.call("key", &[JsValue::from(i)])?.as_string() {
                keys.push(key);
            }
        }
        Ok(keys)
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.call("clear", &[])?;
        Ok(())
    }
}

fn web_store() -> Store<LocalStorageBackend> {
    Store::new(LocalStorageBackend::new())
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(|e| JsValue::from_str(&format!("Serialize failed: {}", e)))
}

/// Answers arrive as indices with `-1` meaning "skipped"
fn answers_from_js(answers: &[i32]) -> Vec<Option<usize>> {
    answers
        .iter()
        .map(|&a| usize::try_from(a).ok())
        .collect()
}

/// Score-tiered loot engine
#[wasm_bindgen]
pub struct LootEngine {
    inner: RustLootEngine,
}

#[wasm_bindgen]
impl LootEngine {
    /// Build from fetched catalog JSON; `undefined` or invalid JSON selects
    /// the built-in catalog
    #[wasm_bindgen(constructor)]
    pub fn new(catalog_json: Option<String>) -> LootEngine {
        let catalog = LootCatalog::from_json_or_default(catalog_json.as_deref());
        LootEngine {
            inner: RustLootEngine::new(catalog),
        }
    }

    /// Draw a reward for `score`, returned as JSON
    #[wasm_bindgen(js_name = generateLoot)]
    pub fn generate_loot(&self, score: f64) -> Result<String, JsValue> {
        let loot = self
            .inner
            .generate(score.round() as i64, &mut MathRandom)
            .map_err(|e| JsValue::from_str(&format!("Unable to generate a reward: {}", e)))?;
        to_json(&loot)
    }

    /// Append a result from `generateLoot` to the stored history
    #[wasm_bindgen(js_name = recordLoot)]
    pub fn record_loot(&self, loot_json: &str) -> Result<(), JsValue> {
        let loot: LootResult = serde_json::from_str(loot_json)
            .map_err(|e| JsValue::from_str(&format!("Parse failed: {}", e)))?;
        record_loot(&mut web_store(), &loot);
        Ok(())
    }

    /// Score the answers, draw and record the reward, as JSON
    #[wasm_bindgen(js_name = completeQuiz)]
    pub fn complete_quiz(
        &self,
        questions_json: Option<String>,
        answers: Vec<i32>,
    ) -> Result<String, JsValue> {
        let bank = QuestionBank::from_json_or_default(questions_json.as_deref());
        let outcome = complete_quiz(
            &mut web_store(),
            &self.inner,
            &bank,
            &answers_from_js(&answers),
            &mut MathRandom,
        );
        to_json(&outcome)
    }

    /// Per-tier reward counts as a JSON object
    #[wasm_bindgen(js_name = rarityStats)]
    pub fn rarity_stats(&self) -> Result<String, JsValue> {
        let stats: serde_json::Map<String, serde_json::Value> =
            rarity_stats(&web_store(), self.inner.catalog().rarities())
                .into_iter()
                .map(|(tier, count)| (tier, serde_json::Value::from(count)))
                .collect();
        to_json(&stats)
    }

    #[wasm_bindgen(js_name = rewardHistory)]
    pub fn reward_history(&self) -> Result<String, JsValue> {
        to_json(&reward_history(&web_store()))
    }

    #[wasm_bindgen(js_name = quizStats)]
    pub fn quiz_stats(&self) -> Result<String, JsValue> {
        to_json(&quiz_stats(&web_store()))
    }
}

/// One-per-page gift draw
#[wasm_bindgen]
pub struct GiftDraw {
    catalog: GiftCatalog,
    session: DrawSession,
}

#[wasm_bindgen]
impl GiftDraw {
    #[wasm_bindgen(constructor)]
    pub fn new(catalog_json: Option<String>) -> GiftDraw {
        GiftDraw {
            catalog: GiftCatalog::from_json_or_default(catalog_json.as_deref()),
            session: DrawSession::new(),
        }
    }

    /// Start the draw. Returns `false` if a draw already ran; the page should
    /// call `finishReveal` after `revealDurationMs`.
    #[wasm_bindgen(js_name = beginDraw)]
    pub fn begin_draw(&mut self) -> bool {
        self.session
            .begin_draw(&self.catalog, &mut MathRandom)
            .is_some()
    }

    /// Disclose the drawn gift as JSON, or `undefined` if nothing is pending
    #[wasm_bindgen(js_name = finishReveal)]
    pub fn finish_reveal(&mut self) -> Result<Option<String>, JsValue> {
        self.session.finish_reveal().map(to_json).transpose()
    }

    /// Stop the reveal (e.g. on navigation); the draw stays used up
    #[wasm_bindgen(js_name = cancelReveal)]
    pub fn cancel_reveal(&mut self) {
        self.session.cancel_reveal();
    }

    #[wasm_bindgen(js_name = claim)]
    pub fn claim(&mut self) -> bool {
        self.session.claim()
    }

    #[wasm_bindgen(js_name = state)]
    pub fn state(&self) -> Result<String, JsValue> {
        to_json(&self.session.snapshot())
    }

    #[wasm_bindgen(js_name = revealDurationMs)]
    pub fn reveal_duration_ms(&self) -> f64 {
        crate::gift::RevealSchedule::default().duration.as_millis() as f64
    }

    #[wasm_bindgen(js_name = revealTickMs)]
    pub fn reveal_tick_ms(&self) -> f64 {
        crate::gift::RevealSchedule::default().tick.as_millis() as f64
    }
}

impl Default for GiftDraw {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Percentage score for a list of answer indices (`-1` = skipped)
#[wasm_bindgen(js_name = scoreAnswers)]
pub fn score_answers(questions_json: Option<String>, answers: Vec<i32>) -> f64 {
    let bank = QuestionBank::from_json_or_default(questions_json.as_deref());
    rust_score_answers(&bank, &answers_from_js(&answers)) as f64
}

/// Check a letter code without recording anything
#[wasm_bindgen(js_name = verifyLetterCode)]
pub fn verify_letter_code(code: &str) -> bool {
    LetterGate::default().verify(code)
}

/// Check the letter code and remember a successful unlock
#[wasm_bindgen(js_name = unlockLetter)]
pub fn unlock_letter(code: &str) -> bool {
    LetterGate::default().unlock(&mut web_store(), code)
}

#[wasm_bindgen(js_name = isLetterUnlocked)]
pub fn is_letter_unlocked() -> bool {
    web_store().is_letter_unlocked()
}
