//! Error taxonomy for corpus access.

use std::path::PathBuf;
use thiserror::Error;

pub type CorpusResult<T> = std::result::Result<T, CorpusError>;

#[derive(Debug, Error)]
pub enum CorpusError {
    /// The corpus root is missing or cannot be enumerated. Fails the whole call.
    #[error("corpus unavailable at {}: {source}", .root.display())]
    CorpusUnavailable {
        root: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A single file could not be read. Search skips it; fetch reports it.
    #[error("cannot read {}: {source}", .path.display())]
    FileUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("example not found: {name}")]
    NotFound { name: String },

    /// The requested name would resolve outside the corpus root.
    #[error("invalid example name: {name:?}")]
    InvalidName { name: String },

    #[error("invalid corpus glob {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}

impl CorpusError {
    pub fn unavailable(root: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::CorpusUnavailable {
            root: root.into(),
            source,
        }
    }

    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
