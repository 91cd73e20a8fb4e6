//! Integration tests for the pattern engine.
//!
//! Covers the full pipeline: extraction, filtering, graph construction,
//! activation caching, generation, and persistence round trips.

use patternlm::data::{medium_corpus, tiny_corpus};
use patternlm::extractor::{extract_patterns, extract_shard, merge_tallies};
use patternlm::{EngineConfig, LmError, PatternEngine};

fn small_config() -> EngineConfig {
    EngineConfig {
        max_pattern_length: 3,
        min_frequency: 2,
        max_patterns: 100,
        seed: 42,
    }
}

fn trained_engine() -> PatternEngine {
    let mut engine = PatternEngine::new(small_config()).unwrap();
    engine.train(&medium_corpus()).unwrap();
    engine
}

// ---------------------------------------------------------------------------
// Training invariants
// ---------------------------------------------------------------------------

#[test]
fn test_training_caps_and_threshold() {
    let engine = trained_engine();
    assert!(engine.is_trained());
    assert!(engine.store.len() <= 100);
    for (_, _, freq) in engine.store.iter() {
        assert!(freq >= 2, "stored frequency below min_frequency");
    }
    assert_eq!(engine.stats.patterns_stored, engine.store.len());
    assert!(engine.stats.memory_bytes > 0);
    assert!(!engine.embeddings.is_empty());
}

#[test]
fn test_retrain_replaces_state() {
    let mut engine = trained_engine();
    assert!(engine.store.id_of("machine learning").is_some());
    engine.train(&tiny_corpus()).unwrap();
    assert!(engine.store.id_of("machine learning").is_none());
    assert!(engine.store.id_of("sat on").is_some());
    assert_eq!(engine.stats.total_generations, 0);
}

#[test]
fn test_min_frequency_filters_rare_bigrams() {
    let config = EngineConfig {
        max_pattern_length: 2,
        min_frequency: 2,
        max_patterns: 1000,
        seed: 42,
    };
    let mut engine = PatternEngine::new(config).unwrap();
    engine
        .train(&["the cat sat on the mat", "the dog sat on the rug"])
        .unwrap();

    // "sat on" occurs in both units and must survive
    assert!(engine.store.id_of("sat on").is_some());
    // "the mat" occurs once and must be dropped
    assert!(engine.store.id_of("the mat").is_none());
}

#[test]
fn test_extraction_merge_is_shard_order_independent() {
    let corpus = medium_corpus();
    let whole = extract_patterns(&corpus, 3);

    // re-shard by hand in two different ways and merge in reverse order
    let (left, right) = corpus.split_at(7);
    let coarse = merge_tallies(extract_shard(right, 3), extract_shard(left, 3));

    let fine = corpus
        .chunks(2)
        .rev()
        .map(|shard| extract_shard(shard, 3))
        .fold(std::collections::HashMap::new(), merge_tallies);

    assert_eq!(whole, coarse);
    assert_eq!(whole, fine);
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

#[test]
fn test_generate_zero_length_returns_tokenized_prompt() {
    let mut engine = trained_engine();
    let out = engine.generate("the cat", 0, 0.0).unwrap();
    assert_eq!(out, "the cat");
}

#[test]
fn test_generate_extends_prompt() {
    let mut engine = trained_engine();
    let out = engine.generate("machine learning", 10, 0.7).unwrap();
    assert!(out.starts_with("machine learning"));
    assert!(out.split_whitespace().count() >= 2);
}

#[test]
fn test_generate_is_seed_deterministic() {
    let mut a = trained_engine();
    let mut b = trained_engine();
    assert_eq!(
        a.generate("machine learning models", 12, 0.7).unwrap(),
        b.generate("machine learning models", 12, 0.7).unwrap()
    );
}

#[test]
fn test_generate_respects_max_length() {
    let mut engine = trained_engine();
    let prompt_tokens = 2;
    let out = engine.generate("machine learning", 5, 0.0).unwrap();
    assert!(out.split_whitespace().count() <= prompt_tokens + 5);
}

#[test]
fn test_repeated_context_hits_cache() {
    let mut engine = trained_engine();
    let first = engine.generate("machine learning", 1, 0.0).unwrap();
    let hits_before = engine.stats.cache_hits;
    let second = engine.generate("machine learning", 1, 0.0).unwrap();
    assert!(engine.stats.cache_hits > hits_before, "second call must hit the cache");
    assert_eq!(first, second);
}

#[test]
fn test_stats_accumulate_across_generations() {
    let mut engine = trained_engine();
    engine.generate("machine learning", 5, 0.7).unwrap();
    engine.generate("artificial intelligence", 5, 0.7).unwrap();
    assert_eq!(engine.stats.total_generations, 2);
    assert!(engine.stats.activations > 0);

    let report = engine.efficiency_report().unwrap();
    assert!(report.avg_activations_per_generation > 0.0);
    assert!(report.sparsity_ratio > 0.0 && report.sparsity_ratio < 1.0);
}

#[test]
fn test_report_before_training() {
    let engine = PatternEngine::new(small_config()).unwrap();
    assert!(matches!(engine.efficiency_report(), Err(LmError::NotTrained)));
}

#[test]
fn test_unknown_prompt_dead_ends_unchanged() {
    let mut engine = trained_engine();
    // no stored pattern shares a word with this prompt
    let out = engine.generate("zzz qqq", 10, 0.0).unwrap();
    assert_eq!(out, "zzz qqq");
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[test]
fn test_generate_before_training() {
    let mut engine = PatternEngine::new(small_config()).unwrap();
    assert!(matches!(engine.generate("anything", 5, 0.7), Err(LmError::NotTrained)));
}

#[test]
fn test_invalid_config_rejected() {
    let config = EngineConfig { max_patterns: 10, ..small_config() };
    assert!(matches!(PatternEngine::new(config), Err(LmError::InvalidConfig(_))));
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[test]
fn test_save_load_round_trip() {
    let path = std::env::temp_dir().join("patternlm_roundtrip_test.json");
    let _ = std::fs::remove_file(&path);

    let engine = trained_engine();
    engine.save(&path).unwrap();

    let mut restored = PatternEngine::new(small_config()).unwrap();
    restored.load(&path).unwrap();

    assert_eq!(restored.store.len(), engine.store.len());
    for (id, text, freq) in engine.store.iter() {
        assert_eq!(restored.store.id_of(text), Some(id));
        assert_eq!(restored.store.freq(id), freq);
    }
    assert_eq!(restored.graph.edge_count(), engine.graph.edge_count());
    assert_eq!(restored.embeddings.len(), engine.embeddings.len());
    assert_eq!(restored.stats.patterns_stored, engine.stats.patterns_stored);

    // fresh engine and restored engine agree at temperature 0
    let mut fresh = trained_engine();
    assert_eq!(
        restored.generate("machine learning", 8, 0.0).unwrap(),
        fresh.generate("machine learning", 8, 0.0).unwrap()
    );

    std::fs::remove_file(&path).ok();
}

#[test]
fn test_load_corrupt_blob() {
    let path = std::env::temp_dir().join("patternlm_corrupt_test.json");
    std::fs::write(&path, "{ not valid json").unwrap();

    let mut engine = trained_engine();
    let patterns_before = engine.store.len();
    let err = engine.load(&path).unwrap_err();
    assert!(matches!(err, LmError::PersistenceCorrupt(_)));
    // failed load leaves the model untouched
    assert_eq!(engine.store.len(), patterns_before);

    std::fs::remove_file(&path).ok();
}

#[test]
fn test_load_missing_file() {
    let mut engine = PatternEngine::new(small_config()).unwrap();
    let err = engine.load("/definitely/not/here.json").unwrap_err();
    assert!(matches!(err, LmError::PersistenceNotFound(_)));
}
