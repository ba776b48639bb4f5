//! Strata Core - Round Orchestrator
//!
//! Runs generation rounds against a target:
//! - Writes attachments next to the artifact
//! - Decides first round vs later round from the store
//! - Calls the generator and validates its output
//! - Substitutes a deterministic fallback when generation fails
//! - Merges later rounds into the existing artifact
//! - Writes the artifact, its summary and the round record
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use strata_constitutional::FsStore;
//! use strata_core::{RoundInput, RoundOrchestrator, StrataConfig};
//!
//! # async fn example(generator: Arc<dyn strata_core::Generator>) -> Result<(), Box<dyn std::error::Error>> {
//! let config = StrataConfig::load(None)?;
//! let store = Arc::new(FsStore::new(&config.workspace_root));
//! let orchestrator = RoundOrchestrator::from_config(&config, generator, store);
//!
//! let outcome = orchestrator.run(RoundInput::new("Todo App", "A todo list")).await?;
//! println!("round {} written ({})", outcome.record.round, outcome.record.path);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

// Core modules
pub mod attachment;
pub mod config;
pub mod error;
pub mod fallback;
pub mod gate;
pub mod generator;
pub mod orchestrator;
pub mod pipeline;
pub mod state;

// Re-exports for convenience
pub use attachment::{decode_data_url, materialize, AttachmentError, Fetcher};
pub use config::{GenerationConfig, StrataConfig};
pub use error::{ConfigError, GenerationError, RoundError, StateError};
pub use fallback::fallback_document;
pub use gate::{GatePass, RoundGate};
pub use generator::{clean_output, validate_output, GenerationRequest, Generator};
pub use orchestrator::{RoundInput, RoundOrchestrator, RoundOutcome};
pub use pipeline::{merge_html, ComposedArtifact};
pub use state::{RoundMachine, RoundState};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for running rounds
    pub use crate::{
        GenerationRequest, Generator, RoundInput, RoundOrchestrator, RoundOutcome, StrataConfig,
    };
    pub use strata_artifact::{RoundPath, RoundRecord, TargetId};
    pub use strata_constitutional::{ArtifactStore, FsStore};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
