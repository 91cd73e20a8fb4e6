//! Built-in demo corpora for the REPL, examples, and tests.

/// A handful of repetitive sentences; enough for the smallest configs.
pub fn tiny_corpus() -> Vec<&'static str> {
    vec![
        "the cat sat on the mat",
        "the dog sat on the rug",
        "the cat sat on the rug",
        "the dog sat on the mat",
        "the cat ran over the mat",
        "the dog ran over the rug",
    ]
}

/// A small machine-learning themed corpus. Repeats core phrases so that
/// bigrams and trigrams clear the default frequency threshold, and leans
/// on the extractor's keyword set so weighting paths get exercised.
pub fn medium_corpus() -> Vec<&'static str> {
    vec![
        "machine learning is a subset of artificial intelligence",
        "machine learning models learn patterns from data",
        "artificial intelligence systems learn from experience",
        "deep learning is a subset of machine learning",
        "neural networks learn patterns from large datasets",
        "machine learning algorithms improve with more data",
        "artificial intelligence will transform many industries",
        "pattern recognition is central to machine learning",
        "machine learning systems require training data",
        "deep learning models require large datasets",
        "training data quality matters for machine learning",
        "artificial intelligence research moves quickly",
        "neural networks are inspired by the brain",
        "pattern recognition systems learn from examples",
        "machine learning is everywhere in modern software",
        "data quality determines model quality",
        "learning algorithms generalize from training data",
        "intelligence emerges from simple learning rules",
        "machine learning pipelines process raw data",
        "artificial intelligence needs careful evaluation",
    ]
}
