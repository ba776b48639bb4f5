//! Whole-document merging

use crate::collision::MergeCollision;
use crate::markup::{merge_markup, MarkupStrategy};
use crate::script::merge_scripts;
use strata_artifact::Document;
use strata_symbol::FunctionCatalog;

/// Result of merging a new round into the previous document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentMerge {
    /// Merged regions
    pub document: Document,
    /// Everything the new round superseded, script first
    pub collisions: Vec<MergeCollision>,
    /// Ids restored from the old body
    pub restored: Vec<String>,
    /// How the bodies were combined
    pub markup_strategy: MarkupStrategy,
}

/// Merge `new` into `old`
///
/// Script and body are merged; style and title are taken from `new`
/// when it has them, otherwise kept from `old`.
#[must_use]
pub fn merge_documents(old: &Document, new: &Document) -> DocumentMerge {
    let script = merge_scripts(
        &old.script,
        &FunctionCatalog::parse(&old.script),
        &FunctionCatalog::parse(&new.script),
    );
    let markup = merge_markup(&old.body, &new.body, &script.script);

    let document = Document::new()
        .with_title(prefer_new(&old.title, &new.title))
        .with_style(prefer_new(&old.style, &new.style))
        .with_body(markup.body)
        .with_script(script.script);

    let mut collisions = script.collisions;
    collisions.extend(markup.collisions);

    tracing::debug!(
        collisions = collisions.len(),
        restored = markup.restored.len(),
        strategy = ?markup.strategy,
        "documents merged"
    );

    DocumentMerge {
        document,
        collisions,
        restored: markup.restored,
        markup_strategy: markup.strategy,
    }
}

fn prefer_new<'a>(old: &'a str, new: &'a str) -> &'a str {
    if new.trim().is_empty() {
        old
    } else {
        new
    }
}
