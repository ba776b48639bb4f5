//! Body markup merging
//!
//! Keyed sections follow the same overwrite-by-identity rule as routines.
//! Markup with no keys at all is never interleaved: the old body is kept
//! whole and the new body is appended after it.

use crate::collision::{CollisionScope, MergeCollision};
use std::collections::HashSet;
use std::ops::Range;
use strata_artifact::supersede;
use strata_symbol::{element_spans, referenced_ids, sections, MarkupSection};

/// How the bodies were combined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkupStrategy {
    /// Nothing to merge: bodies were identical or one side was blank
    Unchanged,
    /// Section-by-section, by key
    Keyed,
    /// Old body then new body
    Flat,
}

/// Merged body plus what was superseded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupMerge {
    /// Body markup
    pub body: String,
    /// Section keys present on both sides
    pub collisions: Vec<MergeCollision>,
    /// Ids re-appended from the old body because the script still uses them
    pub restored: Vec<String>,
    /// Strategy used
    pub strategy: MarkupStrategy,
}

impl MarkupMerge {
    fn unchanged(body: &str) -> Self {
        Self {
            body: body.to_owned(),
            collisions: Vec::new(),
            restored: Vec::new(),
            strategy: MarkupStrategy::Unchanged,
        }
    }
}

/// Merge a new round's body markup into the previous body
///
/// `merged_script` is the script the body will ship with; elements it
/// looks up by id that existed in `old` are guaranteed to survive.
#[must_use]
pub fn merge_markup(old: &str, new: &str, merged_script: &str) -> MarkupMerge {
    if old.trim() == new.trim() || new.trim().is_empty() {
        return MarkupMerge::unchanged(old);
    }
    if old.trim().is_empty() {
        return MarkupMerge::unchanged(new);
    }

    let old_sections = sections(old);
    let new_sections = sections(new);
    let keyed = |s: &[MarkupSection]| s.iter().any(|section| section.key.is_some());

    let mut merge = if keyed(&old_sections) || keyed(&new_sections) {
        merge_keyed(old_sections, new_sections)
    } else {
        merge_flat(old, new, &old_sections, &new_sections)
    };

    restore_referenced(&mut merge, old, merged_script);
    for collision in &merge.collisions {
        collision.trace();
    }
    merge
}

fn merge_keyed(old: Vec<MarkupSection>, new: Vec<MarkupSection>) -> MarkupMerge {
    let old_keys: HashSet<String> = old.iter().filter_map(|s| s.key.clone()).collect();
    let new_keys: HashSet<String> = new.iter().filter_map(|s| s.key.clone()).collect();
    // Old sections no new key overwrites
    let kept: HashSet<String> = old
        .iter()
        .filter(|s| s.key.as_ref().map_or(true, |key| !new_keys.contains(key)))
        .map(|s| s.text.clone())
        .collect();
    // A section already kept verbatim is only re-applied when it overwrites
    // a key; fingerprint keys can differ between documents.
    let additions = new.into_iter().filter(|s| match &s.key {
        Some(key) if old_keys.contains(key) => true,
        _ => !kept.contains(&s.text),
    });

    let merged = supersede(old, additions);
    let body = merged
        .items
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    let collisions = merged
        .collisions
        .into_iter()
        .map(|c| MergeCollision::new(CollisionScope::Section, c.key, c.identical))
        .collect();

    MarkupMerge {
        body,
        collisions,
        restored: Vec::new(),
        strategy: MarkupStrategy::Keyed,
    }
}

fn merge_flat(
    old: &str,
    new: &str,
    old_sections: &[MarkupSection],
    new_sections: &[MarkupSection],
) -> MarkupMerge {
    // Appending a body that is already there would duplicate it every round
    let already_present = old.contains(new.trim())
        || new_sections
            .iter()
            .all(|n| old_sections.iter().any(|o| o.text == n.text));
    let body = if already_present {
        old.to_owned()
    } else {
        format!("{}\n{}", old.trim_end(), new.trim())
    };
    tracing::debug!("no keyed sections, appending new body after old");
    MarkupMerge {
        body,
        collisions: Vec::new(),
        restored: Vec::new(),
        strategy: MarkupStrategy::Flat,
    }
}

/// Re-append old elements the script references but the merge dropped
fn restore_referenced(merge: &mut MarkupMerge, old: &str, script: &str) {
    let wanted = referenced_ids(script);
    if wanted.is_empty() {
        return;
    }
    let present = element_spans(&merge.body);
    let old_spans = element_spans(old);

    let missing: Vec<(&String, &Range<usize>)> = wanted
        .iter()
        .filter(|id| !present.contains_key(id.as_str()))
        .filter_map(|id| old_spans.get_key_value(id.as_str()))
        .collect();

    for (id, span) in &missing {
        // Restoring an ancestor restores this element too
        let nested = missing.iter().any(|(other, outer)| {
            other != id && outer.start <= span.start && span.end <= outer.end
        });
        if nested {
            continue;
        }
        tracing::info!(id = %id, "restoring element referenced by the merged script");
        merge.body.push('\n');
        merge.body.push_str(&old[(*span).clone()]);
        merge.restored.push((*id).clone());
    }
}
