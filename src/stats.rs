//! Model counters and the efficiency report.
//!
//! Counters are mutated only by training and generation; the report is a
//! pure read. The memory figure is an advisory byte-accounting sum, not a
//! budget — nothing evicts based on it.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ModelStats {
    /// Patterns retained by the last train call.
    pub patterns_stored: usize,
    /// Advisory estimate over patterns, graph, embeddings, and cache.
    pub memory_bytes: usize,
    /// Total pattern activations across all generation steps.
    pub activations: u64,
    /// Activation-cache hits across all generation steps.
    pub cache_hits: u64,
    /// Number of generate calls.
    pub total_generations: u64,
}

/// Snapshot handed to callers by `efficiency_report`.
#[derive(Clone, Debug, Serialize)]
pub struct EfficiencyReport {
    pub patterns_stored: usize,
    pub memory_bytes: usize,
    /// Fraction of stored patterns *not* activated per generation.
    pub sparsity_ratio: f64,
    /// Cache hits per generate call; steps within one call can each hit,
    /// so this can exceed 1.
    pub cache_hit_rate: f64,
    pub avg_activations_per_generation: f64,
}

impl ModelStats {
    pub fn report(&self) -> EfficiencyReport {
        let avg_activations = if self.total_generations > 0 {
            self.activations as f64 / self.total_generations as f64
        } else {
            0.0
        };
        let sparsity_ratio = if self.patterns_stored > 0 {
            1.0 - avg_activations / self.patterns_stored as f64
        } else {
            0.0
        };
        let cache_hit_rate = if self.total_generations > 0 {
            self.cache_hits as f64 / self.total_generations as f64
        } else {
            0.0
        };
        EfficiencyReport {
            patterns_stored: self.patterns_stored,
            memory_bytes: self.memory_bytes,
            sparsity_ratio,
            cache_hit_rate,
            avg_activations_per_generation: avg_activations,
        }
    }
}
