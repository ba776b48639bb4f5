//! Artifact composition
//!
//! Renders a [`Document`] into one well-formed HTML file: one doctype, one
//! `<html>`, one `<head>` with one `<style>`, one `<body>` ending in one
//! `<script>`. Region text is guarded so it cannot close its own element.

use strata_artifact::Document;
use strata_symbol::html::{HtmlScanner, NodeKind};

/// Shell elements that must not appear inside body markup
const SHELL_ELEMENTS: &[&str] = &["html", "head", "body"];

/// Render `document` as a complete HTML file
#[must_use]
pub fn compose(document: &Document) -> String {
    let title = escape_text(document.title.trim());
    let style = guard_style(document.style.trim());
    let body = strip_shell(document.body.trim());
    let script = guard_script(document.script.trim());

    let mut out = String::with_capacity(256 + style.len() + body.len() + script.len());
    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    out.push_str("    <meta charset=\"UTF-8\">\n");
    out.push_str(
        "    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n",
    );
    out.push_str(&format!("    <title>{title}</title>\n"));
    out.push_str("    <style>\n");
    push_block(&mut out, &style);
    out.push_str("    </style>\n</head>\n<body>\n");
    push_block(&mut out, &body);
    out.push_str("    <script>\n");
    push_block(&mut out, &script);
    out.push_str("    </script>\n</body>\n</html>\n");
    out
}

fn push_block(out: &mut String, block: &str) {
    if !block.is_empty() {
        out.push_str(block);
        out.push('\n');
    }
}

/// `</script` → `<\/script`, and `<!--` → `<\!--` ahead of a `<script`
///
/// A `<!--` only matters to the HTML parser when a `<script` follows it,
/// so other occurrences are left alone. A `<!--` that is rewritten changes
/// the meaning of a regex literal with the `u` flag that contains it.
#[must_use]
pub fn guard_script(script: &str) -> String {
    let script = break_sequence(script, "</script", script.len());
    match script.to_ascii_lowercase().rfind("<script") {
        Some(last_open) => break_sequence(&script, "<!--", last_open),
        None => script,
    }
}

/// `</style` → `<\/style`
#[must_use]
pub fn guard_style(style: &str) -> String {
    break_sequence(style, "</style", style.len())
}

/// Escape text for element content
#[must_use]
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Drop doctype and `html`/`head`/`body` tags from body markup
fn strip_shell(markup: &str) -> String {
    let mut out = String::with_capacity(markup.len());
    for node in HtmlScanner::new(markup) {
        let shell = match &node.kind {
            NodeKind::Doctype => true,
            NodeKind::Start(tag) => SHELL_ELEMENTS.contains(&tag.name.as_str()),
            NodeKind::End(name) => SHELL_ELEMENTS.contains(&name.as_str()),
            _ => false,
        };
        if !shell {
            out.push_str(&markup[node.span]);
        }
    }
    out.trim().to_owned()
}

/// Insert a backslash after the `<` of every ASCII case-insensitive
/// occurrence of `needle`, keeping the original casing
/// Insert `\` after the `<` of each `needle` starting before `until`
fn break_sequence(haystack: &str, needle: &str, until: usize) -> String {
    let lower = haystack.to_ascii_lowercase();
    let mut out = String::with_capacity(haystack.len());
    let mut last = 0;
    for (at, _) in lower.match_indices(needle).take_while(|(at, _)| *at < until) {
        out.push_str(&haystack[last..=at]);
        out.push('\\');
        last = at + 1;
    }
    out.push_str(&haystack[last..]);
    out
}
