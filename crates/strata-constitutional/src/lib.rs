//! Strata Constitutional Layer
//!
//! The trusted boundary between HTML files and Strata's decomposed
//! [`Document`](strata_artifact::Document) form.
//!
//! # Core Operations
//!
//! - **Ingress**: [`extract`] splits an HTML file into regions
//! - **Egress**: [`compose`] renders regions into exactly one document shell
//! - **Storage**: [`ArtifactStore`] / [`FsStore`] hold artifacts, summaries
//!   and round history
//!
//! # Architecture
//!
//! ```text
//! index.html → extract → Document → (merge) → Document → compose → index.html
//!                                                               ↘ README.md
//! ```
//!
//! # Example
//!
//! ```rust
//! use strata_artifact::Document;
//! use strata_constitutional::{compose, extract};
//!
//! let document = Document::new()
//!     .with_title("Counter")
//!     .with_body("<button id=\"inc\">+</button>")
//!     .with_script("function inc() {}");
//! let html = compose(&document);
//! assert_eq!(extract(&html).document, document);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod compose;
pub mod error;
pub mod extract;
pub mod store;
pub mod summary;

pub use compose::compose;
pub use error::StorageError;
pub use extract::{extract, Extraction, ExtractionAmbiguity};
pub use store::{is_safe_attachment_name, ArtifactStore, FsStore};
pub use summary::render_summary;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
