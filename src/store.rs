//! Pattern arena.
//!
//! Retained patterns live in an index-addressed arena rather than nested
//! string-keyed maps: pattern text and frequency are parallel columns and
//! a side map interns text → id. The transition graph and the activation
//! engine work in `PatternId` space and only touch strings at the edges.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Index of a retained pattern in the arena.
pub type PatternId = usize;

/// Arena of retained patterns with their accumulated weights ("frequency").
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PatternStore {
    texts: Vec<String>,
    freqs: Vec<u32>,
    index: HashMap<String, PatternId>,
}

impl PatternStore {
    /// Build the arena from an already-filtered, ranked pattern list.
    /// Ids follow the given order, so rank order is reproducible.
    pub fn from_ranked(ranked: Vec<(String, u32)>) -> Self {
        let mut store = Self {
            texts: Vec::with_capacity(ranked.len()),
            freqs: Vec::with_capacity(ranked.len()),
            index: HashMap::with_capacity(ranked.len()),
        };
        for (text, freq) in ranked {
            let id = store.texts.len();
            store.index.insert(text.clone(), id);
            store.texts.push(text);
            store.freqs.push(freq);
        }
        store
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    pub fn text(&self, id: PatternId) -> &str {
        &self.texts[id]
    }

    pub fn freq(&self, id: PatternId) -> u32 {
        self.freqs[id]
    }

    pub fn id_of(&self, text: &str) -> Option<PatternId> {
        self.index.get(text).copied()
    }

    /// Whitespace-split words of a pattern.
    pub fn words(&self, id: PatternId) -> impl Iterator<Item = &str> {
        self.texts[id].split_whitespace()
    }

    /// Iterate `(id, text, freq)` in id order.
    pub fn iter(&self) -> impl Iterator<Item = (PatternId, &str, u32)> {
        self.texts
            .iter()
            .zip(self.freqs.iter())
            .enumerate()
            .map(|(id, (text, &freq))| (id, text.as_str(), freq))
    }

    /// Advisory byte accounting: text bytes plus the frequency column and
    /// interning map keys.
    pub fn estimated_bytes(&self) -> usize {
        let text_bytes: usize = self.texts.iter().map(|t| t.len()).sum();
        // texts appear twice (column + intern key), freqs are u32,
        // each intern entry also carries a usize value
        text_bytes * 2 + self.freqs.len() * 4 + self.index.len() * std::mem::size_of::<usize>()
    }
}
