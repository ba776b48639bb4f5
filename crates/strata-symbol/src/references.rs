//! Element ids a script looks up
//!
//! Recognizes `getElementById('x')` and `querySelector('#x')` /
//! `querySelectorAll('#x')` with a plain id selector. Dynamic ids are not
//! resolvable and are ignored.

use indexmap::IndexSet;
use once_cell::sync::Lazy;
use regex::Regex;

static BY_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"getElementById\(\s*['"`]([A-Za-z][\w:.-]*)['"`]\s*\)"#)
        .expect("invalid getElementById regex")
});

static BY_SELECTOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"querySelector(?:All)?\(\s*['"`]#([A-Za-z][\w-]*)['"`]\s*\)"#)
        .expect("invalid querySelector regex")
});

/// Ids referenced by `script`, in first-reference order
#[must_use]
pub fn referenced_ids(script: &str) -> IndexSet<String> {
    let mut found: Vec<(usize, String)> = BY_ID
        .captures_iter(script)
        .chain(BY_SELECTOR.captures_iter(script))
        .filter_map(|caps| {
            let id = caps.get(1)?;
            Some((id.start(), id.as_str().to_owned()))
        })
        .collect();
    found.sort_by_key(|(at, _)| *at);
    found.into_iter().map(|(_, id)| id).collect()
}
