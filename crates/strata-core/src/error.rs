//! Error types for Strata Core
//!
//! - [`GenerationError`]: the generator failed or answered with unusable
//!   text; always recovered by the fallback path
//! - [`RoundError`]: what a caller can actually see fail, storage only
//!   (plus internal state-machine misuse)
//! - [`ConfigError`]: configuration could not be loaded

use crate::state::RoundState;
use std::path::PathBuf;
use strata_constitutional::StorageError;

/// Failure of the external generation call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    /// The request could not be sent or the response not read
    #[error("transport error: {0}")]
    Transport(String),

    /// The service answered with a non-success status
    #[error("generation service returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, truncated
        body: String,
    },

    /// No answer within the configured time
    #[error("generation timed out after {secs}s")]
    Timeout {
        /// Configured limit
        secs: u64,
    },

    /// The answer was empty
    #[error("generation returned empty output")]
    Empty,

    /// The answer is not an HTML document
    #[error("generation output is not HTML")]
    NotHtml,

    /// The response did not have the expected shape
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl GenerationError {
    /// Create transport error from any displayable error
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }
}

/// Illegal round state transition
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    /// Transition not allowed from the current state
    #[error("illegal round transition {from} -> {to}")]
    IllegalTransition {
        /// Current state
        from: RoundState,
        /// Requested state
        to: RoundState,
    },
}

/// Errors that abort a round
#[derive(Debug, thiserror::Error)]
pub enum RoundError {
    /// Reading or writing the artifact, summary or history failed
    #[error("storage failed: {0}")]
    Storage(#[from] StorageError),

    /// The orchestrator attempted an illegal transition
    #[error(transparent)]
    State(#[from] StateError),
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("io error reading {path}: {source}")]
    Io {
        /// Config file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for [`StrataConfig`](crate::StrataConfig)
    #[error("invalid config {path}: {source}")]
    Parse {
        /// Config file
        path: PathBuf,
        /// Decode error
        #[source]
        source: toml::de::Error,
    },

    /// An environment override could not be parsed
    #[error("invalid value for {var}: {value}")]
    InvalidEnv {
        /// Variable name
        var: String,
        /// Offending value
        value: String,
    },
}

impl ConfigError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
