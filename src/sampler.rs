//! Next-token candidate aggregation and temperature sampling.
//!
//! Candidates come from two pathways: transition-graph edges out of active
//! patterns, and direct lexical extensions of an active pattern among the
//! stored set. Both are damped by an anti-repetition penalty keyed on the
//! recent context window. When the pool is too thin, a few random
//! vocabulary words are injected at a floor score so sampling always has
//! somewhere to go.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::activation::Activation;
use crate::embedding::EmbeddingTable;
use crate::graph::PatternGraph;
use crate::store::PatternStore;

/// Boost applied to the direct-extension pathway.
const EXTENSION_BOOST: f64 = 10.0;

/// Penalty when a candidate appeared in the last 6 / last 10 context tokens.
const PENALTY_RECENT_6: f64 = 0.3;
const PENALTY_RECENT_10: f64 = 0.5;

/// Floor score for diversity-injected vocabulary words.
const DIVERSITY_SCORE: f64 = 0.01;

/// Inject random words only while the pool has fewer candidates than this.
const MIN_CANDIDATES: usize = 3;

/// Candidate scores keyed by token, accumulated in first-seen order so the
/// final list is reproducible.
#[derive(Default)]
pub struct CandidatePool {
    entries: Vec<(String, f64)>,
    index: std::collections::HashMap<String, usize>,
}

impl CandidatePool {
    fn add(&mut self, token: &str, score: f64) {
        match self.index.get(token) {
            Some(&i) => self.entries[i].1 += score,
            None => {
                self.index.insert(token.to_string(), self.entries.len());
                self.entries.push((token.to_string(), score));
            }
        }
    }

    fn contains(&self, token: &str) -> bool {
        self.index.contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[(String, f64)] {
        &self.entries
    }
}

/// Aggregate next-token candidates for one generation step.
///
/// `context_tokens` is the trailing context window the activation ran on;
/// the repetition penalty looks at its last 6 and last 10 entries.
pub fn collect_candidates(
    store: &PatternStore,
    graph: &PatternGraph,
    active: &[Activation],
    context_tokens: &[String],
) -> CandidatePool {
    let mut pool = CandidatePool::default();
    let recent_6 = tail_set(context_tokens, 6);
    let recent_10 = tail_set(context_tokens, 10);

    for &(pattern, activation_score) in active {
        // Pathway (a): transition-graph edges.
        for edge in graph.edges(pattern) {
            let Some(candidate) = store.words(edge.target).next() else { continue };
            let penalty = repetition_penalty(candidate, &recent_6, &recent_10);
            pool.add(candidate, activation_score * f64::from(edge.count) * penalty);
        }

        // Pathway (b): direct lexical extensions among stored patterns.
        let prefix: Vec<&str> = store.words(pattern).collect();
        if prefix.is_empty() {
            continue;
        }
        let src_freq = f64::from(store.freq(pattern)).max(1.0);
        for (other, _, other_freq) in store.iter() {
            let words: Vec<&str> = store.words(other).collect();
            if words.len() > prefix.len() && words[..prefix.len()] == prefix[..] {
                let next_word = words[prefix.len()];
                let penalty = repetition_penalty(next_word, &recent_6, &recent_10);
                let extension_factor = f64::from(other_freq) / src_freq;
                pool.add(next_word, activation_score * extension_factor * EXTENSION_BOOST * penalty);
            }
        }
    }

    pool
}

/// Inject up to 3 random vocabulary words when the pool is thin, skipping
/// words already present in the last 8 context tokens. At most 5 draws.
pub fn inject_diversity(
    pool: &mut CandidatePool,
    vocab: &EmbeddingTable,
    context_tokens: &[String],
    rng: &mut ChaCha8Rng,
) {
    if pool.len() >= MIN_CANDIDATES || vocab.is_empty() {
        return;
    }
    let recent_8 = tail_set(context_tokens, 8);
    let mut added = 0;
    for _ in 0..5 {
        if added >= 3 {
            break;
        }
        let idx = rng.gen_range(0..vocab.len());
        let Some(word) = vocab.nth_word(idx) else { continue };
        if pool.contains(word) || recent_8.contains(word) {
            continue;
        }
        pool.add(word, DIVERSITY_SCORE);
        added += 1;
    }
}

/// Pick one candidate. Temperature > 0: numerically stabilized softmax
/// (max subtracted before exponentiation) and a weighted draw; a
/// non-finite mass falls back to argmax. Temperature ≤ 0: argmax with
/// first-wins ties.
pub fn sample(pool: &CandidatePool, temperature: f64, rng: &mut ChaCha8Rng) -> Option<String> {
    let entries = pool.entries();
    if entries.is_empty() {
        return None;
    }
    if temperature <= 0.0 {
        return Some(argmax(entries).to_string());
    }

    let max_score = entries.iter().map(|(_, s)| *s).fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = entries
        .iter()
        .map(|(_, s)| ((s - max_score) / temperature).exp())
        .collect();
    let mass: f64 = exps.iter().sum();
    if !mass.is_finite() || mass <= 0.0 {
        // softmax degenerated; highest score wins
        return Some(argmax(entries).to_string());
    }

    let mut draw = rng.gen::<f64>() * mass;
    for (i, weight) in exps.iter().enumerate() {
        draw -= weight;
        if draw <= 0.0 {
            return Some(entries[i].0.clone());
        }
    }
    // floating-point slack lands on the last candidate
    entries.last().map(|(t, _)| t.clone())
}

fn argmax(entries: &[(String, f64)]) -> &str {
    let mut best = &entries[0];
    for entry in &entries[1..] {
        if entry.1 > best.1 {
            best = entry;
        }
    }
    &best.0
}

fn tail_set(tokens: &[String], n: usize) -> std::collections::HashSet<&str> {
    tokens[tokens.len().saturating_sub(n)..]
        .iter()
        .map(String::as_str)
        .collect()
}

fn repetition_penalty(
    candidate: &str,
    recent_6: &std::collections::HashSet<&str>,
    recent_10: &std::collections::HashSet<&str>,
) -> f64 {
    if recent_6.contains(candidate) {
        PENALTY_RECENT_6
    } else if recent_10.contains(candidate) {
        PENALTY_RECENT_10
    } else {
        1.0
    }
}
