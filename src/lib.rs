//! patternlm — a sparse pattern-mining language model.
//!
//! Instead of dense learned weights, the model mines frequent token
//! n-grams ("patterns") from a corpus, ranks them by predictive utility,
//! and links the survivors into a weighted transition graph. At inference
//! time only the small subset of patterns relevant to the current context
//! is activated, so per-step cost and memory stay far below a neural LM.
//!
//! Pipeline:
//!   - Tokenizer: lowercase word/punctuation split with entity folding
//!   - Extractor: parallel weighted n-gram mining + utility filter
//!   - Graph: transitions between co-occurring retained patterns
//!   - Activation: sparse context retrieval behind a bounded LRU cache
//!   - Sampler: graph + extension candidates, anti-repetition,
//!     temperature softmax
//!   - Engine: train / generate / report / save / load

pub mod activation;
pub mod data;
pub mod embedding;
pub mod engine;
pub mod errors;
pub mod extractor;
pub mod graph;
pub mod sampler;
pub mod stats;
pub mod store;
pub mod tokenizer;

pub use engine::{EngineConfig, PatternEngine};
pub use errors::{LmError, Result};
pub use stats::EfficiencyReport;
