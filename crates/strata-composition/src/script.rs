//! Script merging
//!
//! Routines are overwritten by name: a routine the new round defines
//! replaces the old one at the old position, old-only routines are kept
//! byte-for-byte, and new-only routines follow in new order. Loose
//! statements are concatenated old-then-new; a new statement whose text
//! the old script already carries is dropped.

use crate::collision::{CollisionScope, MergeCollision};
use std::collections::HashSet;
use strata_artifact::{supersede, Ledger};
use strata_symbol::{FunctionCatalog, LooseStatement};

/// Merged script plus what was superseded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptMerge {
    /// Script text
    pub script: String,
    /// Names defined on both sides
    pub collisions: Vec<MergeCollision>,
}

/// Merge a new round's script into the previous one
///
/// `old_text` must be the text `old` was parsed from; it is returned
/// verbatim when `new` is empty so a round that produced no script never
/// erases existing behavior.
#[must_use]
pub fn merge_scripts(old_text: &str, old: &FunctionCatalog, new: &FunctionCatalog) -> ScriptMerge {
    if new.is_empty() {
        tracing::debug!("new round produced no script, keeping previous script");
        return ScriptMerge {
            script: old_text.to_owned(),
            collisions: Vec::new(),
        };
    }

    let mut collisions = Vec::new();

    let routines = supersede(old.entries().cloned(), new.entries().cloned());
    for c in routines.collisions {
        let same = match (old.get(&c.key), new.get(&c.key)) {
            (Some(before), Some(after)) => before.params == after.params,
            _ => true,
        };
        collisions.push(
            MergeCollision::new(CollisionScope::Routine, c.key, c.identical).with_signature(same),
        );
    }

    // A binding and a routine of one name cannot both be declared. The
    // new routine replaces an old binding; an old routine is kept over a
    // new binding.
    let old_loose = old
        .loose()
        .iter()
        .filter(|s| s.binding.as_deref().map_or(true, |name| !new.contains(name)));
    let new_loose = new.loose().iter().filter(|s| match s.binding.as_deref() {
        Some(name) if old.contains(name) && !new.contains(name) => {
            tracing::warn!(name, "new binding shadows a kept routine, binding dropped");
            false
        }
        _ => true,
    });

    // Repeats within one side are intentional; only a new statement the
    // old script already has is dropped.
    let old_texts: HashSet<&str> = old.loose().iter().map(|s| s.text.trim()).collect();
    let new_loose = new_loose
        .filter(|s| s.binding.is_some() || !old_texts.contains(s.text.trim()));

    let mut ledger: Ledger<LooseStatement> = Ledger::new();
    for statement in old_loose.chain(new_loose) {
        ledger.record(statement.clone());
    }
    let loose = ledger.finish();
    collisions.extend(
        loose
            .collisions
            .into_iter()
            .map(|c| MergeCollision::new(CollisionScope::Binding, c.key, c.identical)),
    );

    for collision in &collisions {
        collision.trace();
    }

    let merged = FunctionCatalog::from_parts(routines.items, loose.items);
    ScriptMerge {
        script: merged.render(),
        collisions,
    }
}

/// Parse both scripts and merge
#[must_use]
pub fn merge_script_text(old: &str, new: &str) -> ScriptMerge {
    merge_scripts(old, &FunctionCatalog::parse(old), &FunctionCatalog::parse(new))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(script: &str) -> Vec<String> {
        FunctionCatalog::parse(script).names().map(str::to_owned).collect()
    }

    #[test]
    fn new_definition_wins_at_old_position() {
        let old = "function add(a, b) { return a + b; }";
        let new = "function add(a, b) { return Number(a) + Number(b); }\nfunction sub(a, b) { return a - b; }";
        let merged = merge_script_text(old, new);
        assert_eq!(
            merged.script,
            "function add(a, b) { return Number(a) + Number(b); }\n\nfunction sub(a, b) { return a - b; }"
        );
        assert_eq!(
            merged.collisions,
            vec![MergeCollision::new(CollisionScope::Routine, "add", false).with_signature(true)]
        );
    }

    #[test]
    fn old_only_routines_keep_their_order_and_text() {
        let old = "function a() { return 1; }\nfunction b() { return 2; }\nfunction c() { return 3; }";
        let new = "function d() {}\nfunction b() { return 20; }";
        let merged = merge_script_text(old, new);
        assert_eq!(names(&merged.script), vec!["a", "b", "c", "d"]);
        assert!(merged.script.contains("function a() { return 1; }"));
        assert!(merged.script.contains("function c() { return 3; }"));
        assert!(merged.script.contains("function b() { return 20; }"));
    }

    #[test]
    fn empty_new_script_returns_old_verbatim() {
        let old = "  function keep() {}\n\n\ninit()  ";
        let merged = merge_script_text(old, "  // nothing here\n");
        assert_eq!(merged.script, old);
        assert!(merged.collisions.is_empty());
    }

    #[test]
    fn loose_statements_are_deduplicated() {
        let old = "function go() {}\ndocument.getElementById('go').addEventListener('click', go);";
        let new = "function go() { run(); }\ndocument.getElementById('go').addEventListener('click', go);\ninit();";
        let merged = merge_script_text(old, new);
        assert_eq!(
            merged.script,
            "function go() { run(); }\n\ndocument.getElementById('go').addEventListener('click', go);\ninit();"
        );
    }

    #[test]
    fn repeated_old_statements_survive() {
        let merged = merge_script_text("function a() {}\ntick();\ntick();", "function b() {}");
        assert_eq!(merged.script.matches("tick();").count(), 2);
    }

    #[test]
    fn new_statement_already_in_old_is_emitted_once() {
        let merged = merge_script_text("tick();\ntick();", "tick();\nstart();");
        assert_eq!(merged.script, "tick();\ntick();\nstart();");
    }

    #[test]
    fn rebound_names_resolve_in_place() {
        let old = "let count = 0;\nrender();\nconst label = 'a';";
        let new = "let count = 10;";
        let merged = merge_script_text(old, new);
        assert_eq!(merged.script, "let count = 10;\nrender();\nconst label = 'a';");
        assert_eq!(merged.collisions[0].scope, CollisionScope::Binding);
    }

    #[test]
    fn new_routine_replaces_old_binding_of_same_name() {
        let old = "let handler = null;\nfunction draw() {}";
        let new = "function handler() {}";
        let merged = merge_script_text(old, new);
        assert_eq!(merged.script, "function draw() {}\n\nfunction handler() {}");
    }

    #[test]
    fn old_routine_is_kept_over_new_binding() {
        let old = "function size() { return 1; }";
        let new = "const size = 3;\nshow();";
        let merged = merge_script_text(old, new);
        assert_eq!(merged.script, "function size() { return 1; }\n\nshow();");
    }

    #[test]
    fn merging_with_itself_is_stable() {
        let script = "// state\nlet n = 0;\nfunction inc() { n += 1; }\nbutton.onclick = inc;";
        let once = merge_script_text(script, script);
        let twice = merge_script_text(&once.script, script);
        assert_eq!(names(&once.script), vec!["inc"]);
        assert_eq!(once.script, twice.script);
        assert!(once.collisions.iter().all(|c| c.identical));
    }
}
