//! Extract, merge and compose
//!
//! The pure part of a round. No I/O; the orchestrator and the offline
//! `merge` command both go through here.

use strata_artifact::Document;
use strata_composition::{merge_documents, MergeCollision};
use strata_constitutional::{compose, extract, Extraction, ExtractionAmbiguity};

/// A composed artifact and how it came to be
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedArtifact {
    /// Final HTML
    pub html: String,
    /// Regions the HTML was composed from
    pub document: Document,
    /// Definitions superseded by the newer side
    pub collisions: Vec<MergeCollision>,
    /// Regions dropped as ambiguous, from either side
    pub ambiguities: Vec<ExtractionAmbiguity>,
    /// Element ids restored from the older side
    pub restored: Vec<String>,
}

impl ComposedArtifact {
    fn from_document(document: Document) -> Self {
        Self {
            html: compose(&document),
            document,
            collisions: Vec::new(),
            ambiguities: Vec::new(),
            restored: Vec::new(),
        }
    }
}

/// Compose generated HTML on its own (first round)
#[must_use]
pub fn compose_fresh(generated: &str) -> ComposedArtifact {
    let Extraction {
        document,
        ambiguities,
    } = extract(generated);
    ComposedArtifact {
        ambiguities,
        ..ComposedArtifact::from_document(document)
    }
}

/// Compose a fixed document (fallback)
#[must_use]
pub fn compose_document(document: Document) -> ComposedArtifact {
    ComposedArtifact::from_document(document)
}

/// Merge generated HTML into an already extracted prior artifact
#[must_use]
pub fn merge_into(prior: Extraction, generated: &str) -> ComposedArtifact {
    let newer = extract(generated);
    let merge = merge_documents(&prior.document, &newer.document);

    let mut ambiguities = prior.ambiguities;
    ambiguities.extend(newer.ambiguities);

    ComposedArtifact {
        collisions: merge.collisions,
        ambiguities,
        restored: merge.restored,
        ..ComposedArtifact::from_document(merge.document)
    }
}

/// Merge two complete HTML documents, `new_html` winning
#[must_use]
pub fn merge_html(old_html: &str, new_html: &str) -> ComposedArtifact {
    merge_into(extract(old_html), new_html)
}
