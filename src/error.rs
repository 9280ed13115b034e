//! Error types for nlq-eval.

use thiserror::Error;

/// Result type for nlq-eval operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for nlq-eval operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// IO error while reading a corpus file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Corpus file is not valid annotation JSON (including a missing
    /// `queries` root key).
    #[error("Corpus parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Gold and test corpora cannot be compared.
    #[error("Corpus mismatch: {0}")]
    CorpusMismatch(String),

    /// A temporal value could not be parsed.
    #[error("Temporal parse error: {0}")]
    Temporal(String),
}

impl Error {
    /// Create a corpus mismatch error.
    pub fn corpus_mismatch(msg: impl Into<String>) -> Self {
        Error::CorpusMismatch(msg.into())
    }

    /// Create a temporal parse error.
    pub fn temporal(msg: impl Into<String>) -> Self {
        Error::Temporal(msg.into())
    }
}
