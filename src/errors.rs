//! patternlm error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LmError {
    /// Extraction parameters outside their accepted ranges.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Generation or reporting requested before any successful training.
    #[error("model has not been trained")]
    NotTrained,

    /// Training corpus contained no usable text units.
    #[error("training corpus is empty")]
    EmptyCorpus,

    /// Persisted model file does not exist.
    #[error("model file not found: {0}")]
    PersistenceNotFound(String),

    /// Persisted model blob could not be decoded.
    #[error("model file is corrupt or incompatible: {0}")]
    PersistenceCorrupt(String),

    /// Underlying filesystem failure during save/load.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LmError>;
