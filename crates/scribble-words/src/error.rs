//! Error types for loading word lists.

use std::path::PathBuf;

/// Errors that can occur while building a word bank.
#[derive(Debug, thiserror::Error)]
pub enum WordBankError {
    /// The word file couldn't be read.
    #[error("cannot read word file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The word file isn't valid JSON in the expected shape.
    #[error("cannot parse word file: {0}")]
    Parse(#[from] serde_json::Error),

    /// The default theme has no words at any difficulty, so there is
    /// nothing to fall back to.
    #[error("default theme {0:?} has no words")]
    Empty(String),
}
