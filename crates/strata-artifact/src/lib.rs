//! Strata Artifact Model
//!
//! Data shared by every stage of a generation round.
//!
//! # Core Concepts
//!
//! - [`Document`]: an artifact decomposed into title, style, body and script
//! - [`RoundRecord`]: append-only metadata of one round
//! - [`ContentHash`]: Blake3 digest of written artifacts
//! - [`TargetId`]: stable identity of a generation target
//! - [`Attachment`]: a named file supplied with a round
//! - [`keyed`]: the later-supersedes-earlier fold used by every merge
//!
//! # Example
//!
//! ```rust
//! use strata_artifact::{ContentHash, RoundPath, RoundRecord, TargetId};
//!
//! let target = TargetId::from_task("Todo App");
//! assert_eq!(target.as_str(), "todo-app");
//!
//! let record = RoundRecord::new(1, "Todo App", "a todo list", RoundPath::Fresh, ContentHash::of_text("<html></html>"));
//! assert!(record.success);
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

mod attachment;
mod document;
mod hash;
pub mod keyed;
mod record;
mod target;

pub use attachment::Attachment;
pub use document::{Document, Region};
pub use hash::{ContentHash, HashError};
pub use keyed::{supersede, Collision, Keyed, Ledger, Superseded};
pub use record::{RoundPath, RoundRecord};
pub use target::TargetId;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
