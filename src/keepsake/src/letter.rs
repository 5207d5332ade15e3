//! Code gate in front of the personal letter.
//!
//! Only a digest of the code is kept, but this is a courtesy gate: anyone
//! reading the bundle or the store can get past it.

use crate::storage::{Backend, Store};
use sha2::{Digest, Sha256};
use tracing::info;

/// SHA-256 of the default unlock code
pub const DEFAULT_CODE_SHA256: &str =
    "3b5417065ec9f6f77c409f964126d2654f7350722285e366c3a52eb2d3c26ac2";

/// Normalise user input the way codes are compared: trimmed, lowercase
fn normalize(code: &str) -> String {
    code.trim().to_lowercase()
}

/// Hex SHA-256 of a normalised code
pub fn hash_code(code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize(code).as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LetterGate {
    expected_hash: String,
}

impl Default for LetterGate {
    fn default() -> Self {
        Self::from_hash(DEFAULT_CODE_SHA256)
    }
}

impl LetterGate {
    /// Gate for a known plain-text code
    pub fn new(code: &str) -> Self {
        Self {
            expected_hash: hash_code(code),
        }
    }

    /// Gate from a precomputed hex digest
    pub fn from_hash(hex_digest: &str) -> Self {
        Self {
            expected_hash: hex_digest.trim().to_lowercase(),
        }
    }

    /// Check a code. Blank input never matches.
    pub fn verify(&self, input: &str) -> bool {
        if input.trim().is_empty() {
            return false;
        }
        hash_code(input) == self.expected_hash
    }

    /// Verify and, on success, remember the unlock in `store`
    pub fn unlock<B: Backend>(&self, store: &mut Store<B>, input: &str) -> bool {
        if !self.verify(input) {
            return false;
        }
        store.unlock_letter();
        info!("Letter unlocked");
        true
    }
}
