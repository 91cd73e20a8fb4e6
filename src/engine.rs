//! PatternEngine — the unified model API.
//!
//! Owns the trained state (pattern arena, transition graph, embeddings,
//! activation cache, counters) and orchestrates the pipeline:
//! train → extract ∥ → filter → graph → embeddings, and
//! generate → activate → aggregate → sample, step by step.
//!
//! Concurrency contract: training's extraction phase fans out over the
//! rayon pool; everything else is single-threaded. The engine holds no
//! internal locks — concurrent calls against one instance need external
//! synchronization, while independent instances are fully isolated.

use std::path::Path;
use std::time::Instant;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::activation::{active_patterns, ActivationCache, LruActivationCache};
use crate::embedding::EmbeddingTable;
use crate::errors::{LmError, Result};
use crate::extractor::{extract_patterns, filter_by_utility};
use crate::graph::PatternGraph;
use crate::sampler::{collect_candidates, inject_diversity, sample};
use crate::stats::{EfficiencyReport, ModelStats};
use crate::store::PatternStore;
use crate::tokenizer::tokenize;

/// Trailing tokens used as the generation context window.
const CONTEXT_WINDOW: usize = 8;

// ---------------------------------------------------------------------------
// EngineConfig
// ---------------------------------------------------------------------------

/// Extraction and sampling parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Longest n-gram mined from the corpus (1..=20).
    pub max_pattern_length: usize,
    /// Minimum occurrences for a pattern to survive filtering (≥ 1).
    pub min_frequency: u32,
    /// Retained-set cap after utility ranking (100..=100_000).
    pub max_patterns: usize,
    /// Seed for the generation RNG; same seed, same outputs.
    pub seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_pattern_length: 5,
            min_frequency: 2,
            max_patterns: 10_000,
            seed: 42,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if !(1..=20).contains(&self.max_pattern_length) {
            return Err(LmError::InvalidConfig(format!(
                "max_pattern_length must be in 1..=20, got {}",
                self.max_pattern_length
            )));
        }
        if self.min_frequency < 1 {
            return Err(LmError::InvalidConfig("min_frequency must be >= 1".into()));
        }
        if !(100..=100_000).contains(&self.max_patterns) {
            return Err(LmError::InvalidConfig(format!(
                "max_patterns must be in 100..=100000, got {}",
                self.max_patterns
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// PatternEngine
// ---------------------------------------------------------------------------

pub struct PatternEngine {
    pub config: EngineConfig,
    pub store: PatternStore,
    pub graph: PatternGraph,
    pub embeddings: EmbeddingTable,
    pub stats: ModelStats,
    cache: Box<dyn ActivationCache>,
    rng: ChaCha8Rng,
}

impl PatternEngine {
    /// Build an untrained engine with the default LRU activation cache.
    pub fn new(config: EngineConfig) -> Result<Self> {
        Self::with_cache(config, Box::new(LruActivationCache::default()))
    }

    /// Build an untrained engine with a caller-supplied cache policy.
    pub fn with_cache(config: EngineConfig, cache: Box<dyn ActivationCache>) -> Result<Self> {
        config.validate()?;
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Ok(Self {
            config,
            store: PatternStore::default(),
            graph: PatternGraph::default(),
            embeddings: EmbeddingTable::default(),
            stats: ModelStats::default(),
            cache,
            rng,
        })
    }

    pub fn is_trained(&self) -> bool {
        !self.store.is_empty()
    }

    // =======================================================================
    // Training
    // =======================================================================

    /// Mine, rank, and link patterns from `corpus`, replacing all learned
    /// state. Fails with `EmptyCorpus` when no unit contains text.
    pub fn train(&mut self, corpus: &[&str]) -> Result<()> {
        if corpus.iter().all(|unit| unit.trim().is_empty()) {
            return Err(LmError::EmptyCorpus);
        }
        let started = Instant::now();

        let tallies = extract_patterns(corpus, self.config.max_pattern_length);
        info!(extracted = tallies.len(), "pattern extraction complete");

        let ranked = filter_by_utility(tallies, self.config.min_frequency, self.config.max_patterns);
        info!(retained = ranked.len(), "utility filter complete");

        let store = PatternStore::from_ranked(ranked);
        let units: Vec<Vec<String>> = corpus.iter().map(|unit| tokenize(unit)).collect();
        let graph = PatternGraph::build(&store, &units);
        info!(nodes = graph.node_count(), edges = graph.edge_count(), "transition graph built");

        let embeddings = EmbeddingTable::build(&store);
        info!(vocabulary = embeddings.len(), "embeddings assigned");

        self.store = store;
        self.graph = graph;
        self.embeddings = embeddings;
        self.cache.clear();
        self.stats = ModelStats { patterns_stored: self.store.len(), ..ModelStats::default() };
        self.refresh_memory_estimate();
        self.rng = ChaCha8Rng::seed_from_u64(self.config.seed);

        info!(
            patterns = self.store.len(),
            memory_bytes = self.stats.memory_bytes,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "training complete"
        );
        Ok(())
    }

    // =======================================================================
    // Generation
    // =======================================================================

    /// Iteratively extend `prompt` by up to `max_length` tokens.
    ///
    /// Each step activates patterns for the trailing context window,
    /// aggregates graph and extension candidates with anti-repetition
    /// penalties, and samples with the given temperature (≤ 0 is argmax).
    /// Stops early at a dead end (no active patterns) or an empty
    /// candidate pool; `max_length = 0` returns the tokenized prompt
    /// unchanged. Deterministic for a fixed seed and trained state.
    pub fn generate(&mut self, prompt: &str, max_length: usize, temperature: f64) -> Result<String> {
        if !self.is_trained() {
            return Err(LmError::NotTrained);
        }
        self.stats.total_generations += 1;

        let mut tokens = tokenize(prompt);
        for step in 0..max_length {
            let window_start = tokens.len().saturating_sub(CONTEXT_WINDOW);
            let window = &tokens[window_start..];
            let context = window.join(" ");

            let result = active_patterns(&self.store, self.cache.as_mut(), &context);
            if result.cache_hit {
                self.stats.cache_hits += 1;
            }
            self.stats.activations += result.active.len() as u64;
            if result.active.is_empty() {
                debug!(step, "no active patterns; stopping");
                break;
            }

            let mut pool = collect_candidates(&self.store, &self.graph, &result.active, window);
            inject_diversity(&mut pool, &self.embeddings, window, &mut self.rng);
            if pool.is_empty() {
                debug!(step, "no candidates; stopping");
                break;
            }

            match sample(&pool, temperature, &mut self.rng) {
                Some(token) => {
                    debug!(step, token = token.as_str(), candidates = pool.len(), "token sampled");
                    tokens.push(token);
                }
                None => break,
            }
        }

        self.refresh_memory_estimate();
        Ok(tokens.join(" "))
    }

    // =======================================================================
    // Reporting
    // =======================================================================

    pub fn efficiency_report(&self) -> Result<EfficiencyReport> {
        if !self.is_trained() {
            return Err(LmError::NotTrained);
        }
        Ok(self.stats.report())
    }

    pub fn model_info(&self) -> ModelInfo {
        ModelInfo {
            is_trained: self.is_trained(),
            patterns: self.store.len(),
            vocabulary_words: self.embeddings.len(),
            graph_nodes: self.graph.node_count(),
            graph_edges: self.graph.edge_count(),
            cached_contexts: self.cache.len(),
            memory_bytes: self.stats.memory_bytes,
            config: self.config.clone(),
        }
    }

    fn refresh_memory_estimate(&mut self) {
        self.stats.memory_bytes = self.store.estimated_bytes()
            + self.graph.estimated_bytes()
            + self.embeddings.estimated_bytes()
            + self.cache.estimated_bytes();
    }

    // =======================================================================
    // Persistence
    // =======================================================================

    /// Serialize config, patterns, graph, embeddings, and stats as one
    /// JSON blob. Parent directories are created as needed.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let data = SaveData {
            config: self.config.clone(),
            patterns: self.store.clone(),
            graph: self.graph.clone(),
            embeddings: self.embeddings.clone(),
            stats: self.stats.clone(),
        };
        let json = serde_json::to_string_pretty(&data)
            .map_err(|e| LmError::PersistenceCorrupt(e.to_string()))?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, json)?;
        info!(path = %path.display(), "model saved");
        Ok(())
    }

    /// Replace all in-memory state from a saved blob. The file is parsed
    /// completely before anything is swapped, so a corrupt blob leaves
    /// the engine untouched.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LmError::PersistenceNotFound(path.display().to_string())
            } else {
                LmError::Io(e)
            }
        })?;
        let data: SaveData =
            serde_json::from_str(&json).map_err(|e| LmError::PersistenceCorrupt(e.to_string()))?;
        data.config.validate()?;

        self.config = data.config;
        self.store = data.patterns;
        self.graph = data.graph;
        self.embeddings = data.embeddings;
        self.stats = data.stats;
        self.cache.clear();
        self.rng = ChaCha8Rng::seed_from_u64(self.config.seed);

        info!(path = %path.display(), patterns = self.store.len(), "model loaded");
        Ok(())
    }
}

/// Structural summary of a model instance.
#[derive(Clone, Debug, Serialize)]
pub struct ModelInfo {
    pub is_trained: bool,
    pub patterns: usize,
    pub vocabulary_words: usize,
    pub graph_nodes: usize,
    pub graph_edges: usize,
    pub cached_contexts: usize,
    pub memory_bytes: usize,
    pub config: EngineConfig,
}

// ---------------------------------------------------------------------------
// Serializable blob for save/load
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize)]
struct SaveData {
    config: EngineConfig,
    patterns: PatternStore,
    graph: PatternGraph,
    embeddings: EmbeddingTable,
    stats: ModelStats,
}
