//! Strata Composition
//!
//! Merges a new generation round into the previous artifact without
//! duplicating or losing earlier work.
//!
//! # Rules
//!
//! - [`merge_scripts`]: routines are overwritten by name, new-only routines
//!   are appended, loose statements are deduplicated
//! - [`merge_markup`]: keyed sections are overwritten by key, unkeyed markup
//!   is appended whole, elements the script uses are never lost
//! - [`merge_documents`]: both of the above plus style and title selection
//!
//! Every overwrite goes through [`strata_artifact::supersede`], so "defined
//! later wins" means the same thing for routines and sections.
//!
//! # Example
//!
//! ```rust
//! use strata_composition::merge_script_text;
//!
//! let merged = merge_script_text(
//!     "function add(a, b) { return a + b; }",
//!     "function add(a, b) { return +a + +b; }\nfunction sub(a, b) { return a - b; }",
//! );
//! assert!(merged.script.starts_with("function add(a, b) { return +a + +b; }"));
//! assert_eq!(merged.collisions.len(), 1);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod collision;
mod document;
mod markup;
mod script;

pub use collision::{CollisionScope, MergeCollision};
pub use document::{merge_documents, DocumentMerge};
pub use markup::{merge_markup, MarkupMerge, MarkupStrategy};
pub use script::{merge_script_text, merge_scripts, ScriptMerge};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
