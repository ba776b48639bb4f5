//! Storage errors
//!
//! Everything that touches the filesystem reports a [`StorageError`].
//! These are the only failures allowed to abort a round.

use std::path::PathBuf;

/// Failure reading or writing artifacts, summaries or history
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// IO error at a path
    #[error("io error at {path}: {source}")]
    Io {
        /// File or directory involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// A history line that is not a round record
    #[error("corrupt history record at {path}:{line}: {source}")]
    CorruptRecord {
        /// History file
        path: PathBuf,
        /// One-based line number
        line: usize,
        /// Decode error
        #[source]
        source: serde_json::Error,
    },

    /// A record that could not be encoded
    #[error("failed to encode round record: {0}")]
    Encode(#[from] serde_json::Error),

    /// An attachment name that is not a plain file name
    #[error("unsafe attachment name {0:?}")]
    UnsafeName(String),

    /// A blocking storage task panicked or was cancelled
    #[error("storage task failed: {0}")]
    Task(String),
}

impl StorageError {
    /// Create IO error for path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create corrupt-record error
    pub fn corrupt_record(path: impl Into<PathBuf>, line: usize, source: serde_json::Error) -> Self {
        Self::CorruptRecord {
            path: path.into(),
            line,
            source,
        }
    }
}
