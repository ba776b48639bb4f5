//! Round summary rendering
//!
//! The summary is a short `README.md` written next to the artifact after
//! every round.

use std::fmt::Write;
use strata_artifact::{RoundPath, RoundRecord};
use strata_symbol::FunctionCatalog;

/// Routines listed under "Key Functions"
const KEY_FUNCTIONS: usize = 5;

/// Render the summary for `record`, describing `script`
#[must_use]
pub fn render_summary(record: &RoundRecord, script: &str) -> String {
    let catalog = FunctionCatalog::parse(script);
    let mut out = String::new();

    let _ = writeln!(out, "# {}\n", record.task);
    let _ = writeln!(out, "## Overview\n{}\n", record.brief.trim());
    let _ = writeln!(out, "**Round:** {}  ", record.round);
    let status = match record.path {
        RoundPath::Fallback => "Fallback (generation failed)",
        RoundPath::Fresh => "Generated",
        RoundPath::Merged => "Generated and merged into the previous round",
    };
    let _ = writeln!(out, "**Status:** {status}  ");
    let _ = writeln!(out, "**Artifact:** `{}`\n", record.artifact_hash.short());

    out.push_str("## Features\n");
    if record.round == 1 {
        let _ = writeln!(out, "- Initial implementation of {}", record.task);
    } else {
        let _ = writeln!(out, "- Updates from round {}", record.round);
        out.push_str("- Keeps functionality from earlier rounds\n");
    }
    out.push_str("- Self-contained HTML file with inline CSS and JavaScript\n");

    let names: Vec<&str> = catalog.names().take(KEY_FUNCTIONS).collect();
    if !names.is_empty() {
        out.push_str("\n## Key Functions\n");
        for name in names {
            let _ = writeln!(out, "- `{name}()`");
        }
    }

    if script.contains("addEventListener") {
        out.push_str("\n## Event Handling\n- Interactive elements with event listeners\n");
    }

    out.push_str("\n## Usage\n");
    out.push_str("Open `index.html` in any modern browser. No build step or server is required.\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_artifact::ContentHash;

    fn record(round: u32, path: RoundPath) -> RoundRecord {
        RoundRecord::new(
            round,
            "Todo App",
            "A small todo list",
            path,
            ContentHash::of_text("x"),
        )
    }

    #[test]
    fn lists_at_most_five_functions() {
        let script = (0..7)
            .map(|i| format!("function f{i}() {{}}"))
            .collect::<Vec<_>>()
            .join("\n");
        let summary = render_summary(&record(1, RoundPath::Fresh), &script);
        assert!(summary.starts_with("# Todo App\n"));
        assert!(summary.contains("- `f4()`"));
        assert!(!summary.contains("- `f5()`"));
        assert!(summary.contains("Initial implementation of Todo App"));
    }

    #[test]
    fn reports_fallback_and_listeners() {
        let summary = render_summary(
            &record(3, RoundPath::Fallback),
            "btn.addEventListener('click', go);",
        );
        assert!(summary.contains("**Status:** Fallback (generation failed)"));
        assert!(summary.contains("## Event Handling"));
        assert!(summary.contains("Updates from round 3"));
        assert!(!summary.contains("## Key Functions"));
    }
}
