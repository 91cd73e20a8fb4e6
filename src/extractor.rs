//! Parallel pattern mining and utility-based selection.
//!
//! Stage 1 (parallel): every text unit produces all n-grams of length
//! `1..=max_pattern_length` that pass the semantic-value filter, weighted
//! by position/length/keyword heuristics. The corpus is split into
//! near-equal shards, one per worker, and partial tallies merge by
//! key-wise summation — commutative, so shard completion order never
//! changes the result.
//!
//! Stage 2 (serial): patterns below the occurrence threshold are dropped,
//! the rest are ranked by an approximate conditional-probability utility,
//! and the top `max_patterns` survive.

use std::collections::HashMap;
use std::thread;

use rayon::prelude::*;

use crate::tokenizer::tokenize;

/// Upper bound on extraction workers regardless of hardware concurrency.
pub const MAX_WORKERS: usize = 32;

/// Stop words that carry no semantic value on their own.
const STOP_WORDS: [&str; 14] = [
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
];

/// Keywords that boost the weight of patterns appearing near them.
const CONTEXT_KEYWORDS: [&str; 4] = ["machine", "learning", "artificial", "intelligence"];

/// Per-pattern extraction tally: accumulated heuristic weight plus the raw
/// number of occurrences. The weight becomes the stored frequency; the
/// occurrence count is what `min_frequency` filters on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tally {
    pub weight: u32,
    pub count: u32,
}

/// Mine all weighted patterns from `units`, sharded across the rayon pool.
///
/// Worker count is `min(available_parallelism, MAX_WORKERS)`; each shard
/// is independent and a panicking shard aborts the whole extraction.
pub fn extract_patterns(units: &[&str], max_pattern_length: usize) -> HashMap<String, Tally> {
    if units.is_empty() {
        return HashMap::new();
    }
    let workers = worker_count();
    let shard_len = (units.len() / workers).max(1);

    units
        .par_chunks(shard_len)
        .map(|shard| extract_shard(shard, max_pattern_length))
        .reduce(HashMap::new, merge_tallies)
}

/// Mine one corpus shard. Public so tests can re-shard the same corpus
/// and verify that the merge is order-independent.
pub fn extract_shard(shard: &[&str], max_pattern_length: usize) -> HashMap<String, Tally> {
    let mut tallies: HashMap<String, Tally> = HashMap::new();
    for unit in shard {
        let tokens = tokenize(unit);
        for n in 1..=max_pattern_length {
            if n > tokens.len() {
                break;
            }
            for start in 0..=(tokens.len() - n) {
                let pattern = tokens[start..start + n].join(" ");
                if !has_semantic_value(&pattern) {
                    continue;
                }
                let weight = pattern_weight(&tokens, start, n);
                let tally = tallies.entry(pattern).or_default();
                tally.weight += weight;
                tally.count += 1;
            }
        }
    }
    tallies
}

/// Key-wise sum of two partial tallies.
pub fn merge_tallies(
    mut acc: HashMap<String, Tally>,
    other: HashMap<String, Tally>,
) -> HashMap<String, Tally> {
    for (pattern, tally) in other {
        let entry = acc.entry(pattern).or_default();
        entry.weight += tally.weight;
        entry.count += tally.count;
    }
    acc
}

/// A pattern is semantically valuable unless it is a lone stop word, pure
/// punctuation, or contains no non-stop word longer than 2 characters.
pub fn has_semantic_value(pattern: &str) -> bool {
    let words: Vec<&str> = pattern.split_whitespace().collect();

    if words.len() == 1 && STOP_WORDS.contains(&words[0]) {
        return false;
    }

    let pure_punctuation = !pattern.is_empty()
        && pattern
            .chars()
            .all(|c| !(c.is_alphanumeric() || c == '_' || c.is_whitespace()));
    if pure_punctuation {
        return false;
    }

    words
        .iter()
        .any(|w| !STOP_WORDS.contains(w) && w.chars().count() > 2)
}

/// Heuristic weight of the n-gram at `tokens[start..start + len]`.
///
/// Base 1, +1 when touching the start or end of the unit, +(len − 1) for
/// longer spans, +2 when a context keyword appears within ±2 tokens.
fn pattern_weight(tokens: &[String], start: usize, len: usize) -> u32 {
    let mut weight = 1;

    if start == 0 || start + len == tokens.len() {
        weight += 1;
    }
    weight += (len - 1) as u32;

    let ctx_start = start.saturating_sub(2);
    let ctx_end = (start + len + 2).min(tokens.len());
    let context = tokens[ctx_start..ctx_end].join(" ");
    if CONTEXT_KEYWORDS.iter().any(|kw| context.contains(kw)) {
        weight += 2;
    }

    weight
}

/// Rank by utility and keep the top `max_patterns`.
///
/// Patterns seen fewer than `min_frequency` times are dropped first. For a
/// multi-word pattern the utility approximates P(last word | prefix):
/// prefix mass is the summed frequency of all surviving patterns whose
/// text starts with the prefix (plain string prefix, not token-aware), and
/// utility = freq²/mass; single words score their frequency. Ties break on
/// pattern text so ranking is reproducible across runs.
pub fn filter_by_utility(
    tallies: HashMap<String, Tally>,
    min_frequency: u32,
    max_patterns: usize,
) -> Vec<(String, u32)> {
    let frequent: HashMap<&str, u32> = tallies
        .iter()
        .filter(|(_, t)| t.count >= min_frequency)
        .map(|(p, t)| (p.as_str(), t.weight))
        .collect();

    let mut scored: Vec<(&str, u32, f64)> = frequent
        .iter()
        .map(|(&pattern, &freq)| {
            let words: Vec<&str> = pattern.split_whitespace().collect();
            let utility = if words.len() > 1 {
                let prefix = words[..words.len() - 1].join(" ");
                let prefix_mass: u32 = frequent
                    .iter()
                    .filter(|(p, _)| p.starts_with(&prefix))
                    .map(|(_, &f)| f)
                    .sum();
                if prefix_mass > 0 {
                    freq as f64 * (freq as f64 / prefix_mass as f64)
                } else {
                    freq as f64
                }
            } else {
                freq as f64
            };
            (pattern, freq, utility)
        })
        .collect();

    scored.sort_by(|a, b| {
        b.2.partial_cmp(&a.2)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(b.0))
    });
    scored.truncate(max_patterns);

    scored
        .into_iter()
        .map(|(pattern, freq, _)| (pattern.to_string(), freq))
        .collect()
}

fn worker_count() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(MAX_WORKERS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semantic_value() {
        assert!(has_semantic_value("machine learning"));
        assert!(has_semantic_value("cat"));
        assert!(!has_semantic_value("the"));
        assert!(!has_semantic_value("!"));
        assert!(!has_semantic_value("?!."));
        // only stop words and short words
        assert!(!has_semantic_value("on it"));
        // stop word plus a significant word passes
        assert!(has_semantic_value("the mat"));
    }

    #[test]
    fn test_pattern_weight_position_and_length() {
        let tokens: Vec<String> = ["deep", "nets", "overfit"].iter().map(|s| s.to_string()).collect();
        // start of unit, single token: 1 + 1
        assert_eq!(pattern_weight(&tokens, 0, 1), 2);
        // middle single token: 1
        assert_eq!(pattern_weight(&tokens, 1, 1), 1);
        // trailing bigram: 1 + 1 + 1
        assert_eq!(pattern_weight(&tokens, 1, 2), 3);
    }

    #[test]
    fn test_pattern_weight_keyword_context() {
        let tokens: Vec<String> =
            ["machine", "learning", "rules", "everything"].iter().map(|s| s.to_string()).collect();
        // "rules" sits within 2 tokens of "machine"/"learning": +2
        assert_eq!(pattern_weight(&tokens, 2, 1), 3);
    }

    #[test]
    fn test_merge_is_commutative() {
        let corpus = ["the cat sat on the mat", "the dog sat on the rug", "cats sat quietly"];
        let whole = extract_patterns(&corpus, 3);

        let a = extract_shard(&corpus[..1], 3);
        let b = extract_shard(&corpus[1..], 3);
        let ab = merge_tallies(a.clone(), b.clone());
        let ba = merge_tallies(b, a);

        assert_eq!(whole, ab);
        assert_eq!(ab, ba);
    }

    #[test]
    fn test_min_frequency_uses_occurrence_count() {
        let corpus = ["the cat sat on the mat", "the dog sat on the rug"];
        let tallies = extract_patterns(&corpus, 2);
        let kept = filter_by_utility(tallies, 2, 1000);
        let names: Vec<&str> = kept.iter().map(|(p, _)| p.as_str()).collect();

        // "sat on" occurs in both units
        assert!(names.contains(&"sat on"));
        // "the mat" occurs once; its weight (3) exceeds 2 but the count does not
        assert!(!names.contains(&"the mat"));
    }

    #[test]
    fn test_max_patterns_cap() {
        let corpus = ["alpha beta gamma delta", "alpha beta gamma delta"];
        let tallies = extract_patterns(&corpus, 3);
        let kept = filter_by_utility(tallies, 1, 3);
        assert_eq!(kept.len(), 3);
    }

    #[test]
    fn test_single_token_utility_is_frequency() {
        let mut tallies = HashMap::new();
        tallies.insert("cat".to_string(), Tally { weight: 9, count: 3 });
        tallies.insert("dog".to_string(), Tally { weight: 4, count: 2 });
        let kept = filter_by_utility(tallies, 1, 10);
        assert_eq!(kept[0], ("cat".to_string(), 9));
        assert_eq!(kept[1], ("dog".to_string(), 4));
    }
}
