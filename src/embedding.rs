//! Compact deterministic word embeddings.
//!
//! Every vocabulary word gets a fixed 8-dimensional vector drawn from a
//! ChaCha stream seeded by an FNV-1a hash of the word, so the same word
//! yields the same vector in every process. The table is used only as a
//! diversity fallback during sampling, never for semantic scoring.

use std::collections::BTreeMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::store::PatternStore;

pub const EMBEDDING_DIM: usize = 8;

/// Vocabulary word → fixed low-dimensional vector. A `BTreeMap` keeps
/// iteration (and therefore indexed sampling) in a reproducible order.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EmbeddingTable {
    vectors: BTreeMap<String, [f32; EMBEDDING_DIM]>,
}

impl EmbeddingTable {
    /// Assign a vector to every word appearing in any retained pattern.
    pub fn build(store: &PatternStore) -> Self {
        let mut vectors = BTreeMap::new();
        for (id, _, _) in store.iter() {
            for word in store.words(id) {
                if !vectors.contains_key(word) {
                    vectors.insert(word.to_string(), vector_for(word));
                }
            }
        }
        Self { vectors }
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn get(&self, word: &str) -> Option<&[f32; EMBEDDING_DIM]> {
        self.vectors.get(word)
    }

    /// The idx-th vocabulary word in sorted order. Linear scan; only the
    /// diversity fallback calls this, a handful of times per step.
    pub fn nth_word(&self, idx: usize) -> Option<&str> {
        self.vectors.keys().nth(idx).map(String::as_str)
    }

    pub fn estimated_bytes(&self) -> usize {
        self.vectors
            .keys()
            .map(|w| w.len() + EMBEDDING_DIM * std::mem::size_of::<f32>())
            .sum()
    }
}

/// Deterministic vector for `word`: normal(0, 0.5) samples from a
/// word-hash-seeded stream.
fn vector_for(word: &str) -> [f32; EMBEDDING_DIM] {
    let mut rng = ChaCha8Rng::seed_from_u64(fnv1a(word));
    let mut v = [0.0f32; EMBEDDING_DIM];
    for slot in &mut v {
        *slot = gaussian(&mut rng) * 0.5;
    }
    v
}

/// FNV-1a, 64-bit. Stable across processes, unlike `DefaultHasher`.
fn fnv1a(s: &str) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    let mut hash = OFFSET;
    for byte in s.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

/// Standard normal sample via Box-Muller.
fn gaussian(rng: &mut ChaCha8Rng) -> f32 {
    let u1: f64 = rng.gen::<f64>().max(1e-12);
    let u2: f64 = rng.gen();
    ((-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_word_same_vector() {
        assert_eq!(vector_for("learning"), vector_for("learning"));
        assert_ne!(vector_for("learning"), vector_for("machine"));
    }

    #[test]
    fn test_build_covers_pattern_vocabulary() {
        let store = PatternStore::from_ranked(vec![
            ("machine learning".to_string(), 5),
            ("learning fast".to_string(), 3),
        ]);
        let table = EmbeddingTable::build(&store);
        assert_eq!(table.len(), 3); // machine, learning, fast
        assert!(table.get("learning").is_some());
        assert!(table.get("slow").is_none());
    }

    #[test]
    fn test_nth_word_sorted_order() {
        let store = PatternStore::from_ranked(vec![
            ("zebra".to_string(), 2),
            ("ant".to_string(), 2),
        ]);
        let table = EmbeddingTable::build(&store);
        assert_eq!(table.nth_word(0), Some("ant"));
        assert_eq!(table.nth_word(1), Some("zebra"));
        assert_eq!(table.nth_word(2), None);
    }
}
