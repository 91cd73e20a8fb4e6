//! Pattern transition graph.
//!
//! Directed edges between retained patterns that co-occur within a small
//! token window. Stored as adjacency lists indexed by `PatternId`; an edge
//! carries the literal bridging tokens (or the direct-adjacency sentinel)
//! and an occurrence count. The graph is owned by the trained model and
//! rebuilt wholesale by every train call.

use serde::{Deserialize, Serialize};

use crate::store::{PatternId, PatternStore};

/// Sentinel bridge label for adjacent pattern occurrences.
pub const DIRECT: &str = "__DIRECT__";

/// Maximum token gap between linked pattern occurrences.
const PROXIMITY_WINDOW: usize = 3;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    /// `DIRECT` or the literal tokens between the two occurrences.
    pub bridge: String,
    pub target: PatternId,
    pub count: u32,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PatternGraph {
    adjacency: Vec<Vec<Edge>>,
}

impl PatternGraph {
    /// Scan tokenized corpus units and link every ordered pair of pattern
    /// occurrences `(A ends at e, B starts at s)` with `s ≥ e` and
    /// `s − e ≤ PROXIMITY_WINDOW`. Quadratic in occurrences per unit,
    /// bounded by the retained-set size and the small window.
    pub fn build(store: &PatternStore, units: &[Vec<String>]) -> Self {
        let mut graph = Self { adjacency: vec![Vec::new(); store.len()] };

        // Pattern word lists, split once.
        let pattern_words: Vec<Vec<&str>> =
            (0..store.len()).map(|id| store.words(id).collect()).collect();

        for tokens in units {
            let occurrences = find_occurrences(tokens, &pattern_words);
            for (i, &(_, end1, src)) in occurrences.iter().enumerate() {
                for &(start2, _, dst) in &occurrences[i + 1..] {
                    if start2 >= end1 && start2 - end1 <= PROXIMITY_WINDOW {
                        if start2 == end1 {
                            graph.bump(src, DIRECT, dst);
                        } else {
                            let bridge = tokens[end1..start2].join(" ");
                            graph.bump(src, &bridge, dst);
                        }
                    }
                }
            }
        }
        graph
    }

    fn bump(&mut self, src: PatternId, bridge: &str, dst: PatternId) {
        let edges = &mut self.adjacency[src];
        if let Some(edge) = edges.iter_mut().find(|e| e.target == dst && e.bridge == bridge) {
            edge.count += 1;
        } else {
            edges.push(Edge { bridge: bridge.to_string(), target: dst, count: 1 });
        }
    }

    pub fn edges(&self, src: PatternId) -> &[Edge] {
        self.adjacency.get(src).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of patterns with at least one outgoing edge.
    pub fn node_count(&self) -> usize {
        self.adjacency.iter().filter(|e| !e.is_empty()).count()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum()
    }

    pub fn estimated_bytes(&self) -> usize {
        self.adjacency
            .iter()
            .flatten()
            .map(|e| e.bridge.len() + std::mem::size_of::<PatternId>() + 4)
            .sum()
    }
}

/// All `(start, end, id)` occurrences of retained patterns in `tokens`,
/// by exact token-sequence match, in ascending start order.
fn find_occurrences(
    tokens: &[String],
    pattern_words: &[Vec<&str>],
) -> Vec<(usize, usize, PatternId)> {
    let mut found = Vec::new();
    for start in 0..tokens.len() {
        for (id, words) in pattern_words.iter().enumerate() {
            let end = start + words.len();
            if end <= tokens.len()
                && words.iter().zip(&tokens[start..end]).all(|(w, t)| *w == t.as_str())
            {
                found.push((start, end, id));
            }
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;

    fn store_of(patterns: &[(&str, u32)]) -> PatternStore {
        PatternStore::from_ranked(
            patterns.iter().map(|(p, f)| (p.to_string(), *f)).collect(),
        )
    }

    #[test]
    fn test_direct_adjacency_edge() {
        let store = store_of(&[("the cat", 2), ("sat", 2)]);
        let units = vec![tokenize("the cat sat")];
        let graph = PatternGraph::build(&store, &units);

        let edges = graph.edges(0);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].bridge, DIRECT);
        assert_eq!(edges[0].target, 1);
        assert_eq!(edges[0].count, 1);
    }

    #[test]
    fn test_bridged_edge_carries_tokens() {
        let store = store_of(&[("cat", 2), ("mat", 2)]);
        let units = vec![tokenize("cat on the mat")];
        let graph = PatternGraph::build(&store, &units);

        let edges = graph.edges(0);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].bridge, "on the");
        assert_eq!(edges[0].target, 1);
    }

    #[test]
    fn test_window_limit() {
        let store = store_of(&[("cat", 2), ("mat", 2)]);
        // four bridging tokens: outside the proximity window
        let units = vec![tokenize("cat sat down upon one mat")];
        let graph = PatternGraph::build(&store, &units);
        assert!(graph.edges(0).is_empty());
    }

    #[test]
    fn test_edge_counts_accumulate() {
        let store = store_of(&[("cat", 2), ("sat", 2)]);
        let units = vec![tokenize("cat sat"), tokenize("cat sat")];
        let graph = PatternGraph::build(&store, &units);
        assert_eq!(graph.edges(0)[0].count, 2);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.node_count(), 1);
    }
}
