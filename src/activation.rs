//! Context activation: the sparse retrieval core.
//!
//! Given a context string, score every stored pattern by word overlap and
//! return only the top slice — the "active" set the generator is allowed
//! to see. Results are memoized behind a pluggable cache keyed by the
//! trailing characters of the context; the default policy is a size-capped
//! LRU so a long-lived model cannot grow without bound.

use std::collections::{HashMap, HashSet};

use crate::store::{PatternId, PatternStore};

/// Minimum activation score for a pattern to be considered at all.
const ACTIVATION_THRESHOLD: f64 = 0.3;

/// Keep the top 1/N of passing patterns (at least one).
const TOP_DIVISOR: usize = 10;

/// Context characters used as the cache key.
const CACHE_KEY_CHARS: usize = 20;

/// A ranked activation: pattern id and its score.
pub type Activation = (PatternId, f64);

/// Memoization policy for activation results. Implementations own their
/// eviction strategy; the activation logic never needs to know it.
pub trait ActivationCache: Send {
    /// Look up a previously computed activation list, refreshing its
    /// recency if the policy tracks one.
    fn get(&mut self, key: &str) -> Option<&[Activation]>;
    fn put(&mut self, key: String, value: Vec<Activation>);
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn clear(&mut self);
    /// Advisory byte accounting for the efficiency report.
    fn estimated_bytes(&self) -> usize;
}

/// Size-capped LRU over a stamp-annotated map. Eviction scans for the
/// oldest stamp; capacities stay small enough that the O(n) scan is noise
/// next to the full pattern scan a miss already costs.
pub struct LruActivationCache {
    capacity: usize,
    next_stamp: u64,
    entries: HashMap<String, (u64, Vec<Activation>)>,
}

impl LruActivationCache {
    pub const DEFAULT_CAPACITY: usize = 4096;

    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            next_stamp: 0,
            entries: HashMap::new(),
        }
    }
}

impl Default for LruActivationCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

impl ActivationCache for LruActivationCache {
    fn get(&mut self, key: &str) -> Option<&[Activation]> {
        let stamp = self.next_stamp;
        match self.entries.get_mut(key) {
            Some((last_used, value)) => {
                *last_used = stamp;
                self.next_stamp += 1;
                Some(value.as_slice())
            }
            None => None,
        }
    }

    fn put(&mut self, key: String, value: Vec<Activation>) {
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            if let Some(oldest) = self
                .entries
                .iter()
                .min_by_key(|(_, (stamp, _))| *stamp)
                .map(|(k, _)| k.clone())
            {
                self.entries.remove(&oldest);
            }
        }
        let stamp = self.next_stamp;
        self.next_stamp += 1;
        self.entries.insert(key, (stamp, value));
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.next_stamp = 0;
    }

    fn estimated_bytes(&self) -> usize {
        self.entries
            .iter()
            .map(|(k, (_, v))| k.len() + 8 + v.len() * (std::mem::size_of::<PatternId>() + 8))
            .sum()
    }
}

/// Outcome of one activation lookup.
pub struct ActivationResult {
    pub active: Vec<Activation>,
    pub cache_hit: bool,
}

/// Activate the patterns relevant to `context`.
///
/// On a cache miss this scans every stored pattern: score = (overlap /
/// pattern word count) × min(freq / 10, 1), kept above the activation
/// threshold, sorted descending, trimmed to the top tenth. The full scan
/// is the deliberate trade: no index, linear cost per miss, guaranteed
/// sparsity of the returned set.
pub fn active_patterns(
    store: &PatternStore,
    cache: &mut dyn ActivationCache,
    context: &str,
) -> ActivationResult {
    let key = suffix_key(context);
    if let Some(cached) = cache.get(&key) {
        return ActivationResult { active: cached.to_vec(), cache_hit: true };
    }

    let context_words: HashSet<&str> = context.split_whitespace().collect();
    let mut active: Vec<Activation> = Vec::new();

    for (id, _, freq) in store.iter() {
        let pattern_words: HashSet<&str> = store.words(id).collect();
        let overlap = pattern_words.intersection(&context_words).count();
        if overlap == 0 {
            continue;
        }
        let semantic_score = overlap as f64 / pattern_words.len() as f64;
        let frequency_score = (f64::from(freq) / 10.0).min(1.0);
        let score = semantic_score * frequency_score;
        if score > ACTIVATION_THRESHOLD {
            active.push((id, score));
        }
    }

    active.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    let keep = (active.len() / TOP_DIVISOR).max(1);
    active.truncate(keep);

    cache.put(key, active.clone());
    ActivationResult { active, cache_hit: false }
}

/// Trailing `CACHE_KEY_CHARS` characters of the context, char-boundary safe.
fn suffix_key(context: &str) -> String {
    let chars = context.chars().count();
    if chars <= CACHE_KEY_CHARS {
        context.to_string()
    } else {
        context.chars().skip(chars - CACHE_KEY_CHARS).collect()
    }
}
