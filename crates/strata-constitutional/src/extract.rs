//! Region extraction
//!
//! Splits a full HTML document into [`Document`] regions with the tag
//! scanner from `strata-symbol`, so a `</script>` or `<body>` inside a
//! string literal or comment never moves a boundary.
//!
//! Extraction never fails. A region whose close cannot be found is dropped
//! and reported as an [`ExtractionAmbiguity`].

use serde::{Deserialize, Serialize};
use std::fmt;
use strata_artifact::{Document, Region};
use strata_symbol::html::{HtmlScanner, NodeKind, StartTag};

/// Tags that belong to the document shell, never to body markup
const SHELL_TAGS: &[&str] = &["html", "head", "body", "meta", "link", "title", "base"];

/// Script types that are executable classic or module code
const EXECUTABLE_TYPES: &[&str] = &[
    "",
    "text/javascript",
    "application/javascript",
    "module",
];

/// A region that could not be cleanly delimited
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionAmbiguity {
    /// Affected region
    pub region: Region,
    /// Byte offset of the unterminated construct
    pub offset: usize,
    /// What was unterminated
    pub construct: String,
}

impl fmt::Display for ExtractionAmbiguity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unterminated {} at byte {} treated as empty {}",
            self.construct, self.offset, self.region
        )
    }
}

/// Regions of one document plus anything that had to be dropped
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Extracted regions
    pub document: Document,
    /// Unterminated constructs that were treated as empty
    pub ambiguities: Vec<ExtractionAmbiguity>,
}

/// What the node after a start tag belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lift {
    Script,
    Style,
    Title,
}

impl Lift {
    fn region(self) -> Region {
        match self {
            Self::Script => Region::Script,
            Self::Style => Region::Style,
            Self::Title => Region::Title,
        }
    }
}

/// Extract title, style, body markup and script from `html`
#[must_use]
pub fn extract(html: &str) -> Extraction {
    let has_body = HtmlScanner::new(html)
        .any(|n| matches!(&n.kind, NodeKind::Start(tag) if tag.name == "body"));

    let mut scripts: Vec<&str> = Vec::new();
    let mut styles: Vec<&str> = Vec::new();
    let mut title: Option<String> = None;
    let mut body = String::new();
    let mut ambiguities = Vec::new();

    let mut in_head = false;
    let mut in_body = !has_body;
    let mut body_started = false;
    // Set between a lifted start tag and its end tag
    let mut lifting: Option<Lift> = None;

    for node in HtmlScanner::new(html) {
        let text = &html[node.span.clone()];
        match &node.kind {
            NodeKind::RawText {
                element,
                terminated,
            } => {
                if !terminated {
                    let region = lifting.map_or(Region::Body, Lift::region);
                    ambiguities.push(ExtractionAmbiguity {
                        region,
                        offset: node.span.start,
                        construct: format!("<{element}>"),
                    });
                    continue;
                }
                match lifting {
                    Some(Lift::Script) => scripts.push(text),
                    Some(Lift::Style) => styles.push(text),
                    Some(Lift::Title) => {
                        if title.is_none() {
                            title = Some(decode_entities(text.trim()));
                        }
                    }
                    None if in_body && !in_head => body.push_str(text),
                    None => {}
                }
                continue;
            }
            NodeKind::Start(tag) => {
                // A document title precedes all body content; later ones
                // (SVG titles) are markup
                let document_title = in_head || (!body_started && body.trim_start().is_empty());
                if let Some(lift) = lift_for(tag, document_title) {
                    if tag.opens_element() {
                        lifting = Some(lift);
                    }
                    continue;
                }
                match tag.name.as_str() {
                    "head" => in_head = true,
                    "body" => {
                        in_head = false;
                        in_body = true;
                        body_started = true;
                    }
                    _ => {}
                }
                if tag.name != "title" && SHELL_TAGS.contains(&tag.name.as_str()) {
                    continue;
                }
            }
            NodeKind::End(name) => {
                if lifting.is_some() && matches!(name.as_str(), "script" | "style" | "title") {
                    lifting = None;
                    continue;
                }
                if name == "head" {
                    in_head = false;
                }
                if name != "title" && SHELL_TAGS.contains(&name.as_str()) {
                    continue;
                }
            }
            NodeKind::Doctype => continue,
            NodeKind::Comment { terminated: false } => {
                ambiguities.push(ExtractionAmbiguity {
                    region: Region::Body,
                    offset: node.span.start,
                    construct: "<!--".to_owned(),
                });
                continue;
            }
            NodeKind::Comment { .. } | NodeKind::Text => {}
        }
        if in_body && !in_head {
            body.push_str(text);
        }
    }

    for ambiguity in &ambiguities {
        tracing::warn!(%ambiguity, "extraction ambiguity");
    }

    let document = Document::new()
        .with_title(title.unwrap_or_default())
        .with_style(join_blocks(&styles))
        .with_body(body.trim())
        .with_script(join_blocks(&scripts));

    Extraction {
        document,
        ambiguities,
    }
}

/// Which region a start tag's content is lifted into, if any
fn lift_for(tag: &StartTag, document_title: bool) -> Option<Lift> {
    match tag.name.as_str() {
        "style" => Some(Lift::Style),
        "title" if document_title => Some(Lift::Title),
        "script" if is_inline_executable(tag) => Some(Lift::Script),
        _ => None,
    }
}

fn is_inline_executable(tag: &StartTag) -> bool {
    if tag.attr("src").is_some() {
        return false;
    }
    let kind = tag.attr("type").unwrap_or("").trim().to_ascii_lowercase();
    EXECUTABLE_TYPES.contains(&kind.as_str())
}

fn join_blocks(blocks: &[&str]) -> String {
    blocks
        .iter()
        .map(|b| b.trim())
        .filter(|b| !b.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Decode the entities the composer escapes in titles
fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Counter &amp; Co</title>
    <style>
body { margin: 0; }
    </style>
</head>
<body>
    <h1 id="title">Count</h1>
    <button id="inc">+</button>
    <script>
function inc() { n++; }
    </script>
    <script>
document.getElementById('inc').onclick = inc;
    </script>
</body>
</html>"#;

    #[test]
    fn splits_a_full_page() {
        let Extraction {
            document,
            ambiguities,
        } = extract(PAGE);
        assert!(ambiguities.is_empty());
        assert_eq!(document.title, "Counter & Co");
        assert_eq!(document.style, "body { margin: 0; }");
        assert_eq!(
            document.body,
            "<h1 id=\"title\">Count</h1>\n    <button id=\"inc\">+</button>"
        );
        assert_eq!(
            document.script,
            "function inc() { n++; }\n\ndocument.getElementById('inc').onclick = inc;"
        );
    }

    #[test]
    fn absent_regions_are_empty() {
        let document = extract("").document;
        assert!(document.is_blank());

        let document = extract("<html><body><p>only markup</p></body></html>").document;
        assert_eq!(document.body, "<p>only markup</p>");
        assert_eq!(document.script, "");
        assert_eq!(document.style, "");
    }

    #[test]
    fn closing_tags_inside_script_strings_do_not_end_body() {
        let html = r#"<body><div id="a"></div><script>const s = "<body></div>";</script></body>"#;
        let document = extract(html).document;
        assert_eq!(document.body, "<div id=\"a\"></div>");
        assert_eq!(document.script, r#"const s = "<body></div>";"#);
    }

    #[test]
    fn external_and_data_scripts_stay_in_markup() {
        let html = r#"<body><script src="x.js"></script><script type="application/json">{"a":1}</script><script>go();</script></body>"#;
        let document = extract(html).document;
        assert_eq!(
            document.body,
            r#"<script src="x.js"></script><script type="application/json">{"a":1}</script>"#
        );
        assert_eq!(document.script, "go();");
    }

    #[test]
    fn head_scripts_and_body_styles_are_lifted() {
        let html = "<head><script>a();</script></head><body><style>p{}</style><p>x</p><script>b();</script></body>";
        let document = extract(html).document;
        assert_eq!(document.script, "a();\n\nb();");
        assert_eq!(document.style, "p{}");
        assert_eq!(document.body, "<p>x</p>");
    }

    #[test]
    fn fragment_without_body_element() {
        let html = "<!DOCTYPE html><title>T</title><div id=\"x\">x</div><script>x();</script>";
        let document = extract(html).document;
        assert_eq!(document.title, "T");
        assert_eq!(document.body, "<div id=\"x\">x</div>");
        assert_eq!(document.script, "x();");
    }

    #[test]
    fn svg_title_in_body_stays_in_markup() {
        let html = r#"<head><title>App</title></head><body><svg id="chart"><title>Sales chart</title><rect/></svg></body>"#;
        let document = extract(html).document;
        assert_eq!(document.title, "App");
        assert_eq!(
            document.body,
            r#"<svg id="chart"><title>Sales chart</title><rect/></svg>"#
        );
    }

    #[test]
    fn fragment_title_after_markup_stays_in_markup() {
        let html = "<div id=\"x\"><svg><title>Dot</title></svg></div>";
        let extraction = extract(html);
        assert_eq!(extraction.document.title, "");
        assert_eq!(extraction.document.body, html);
    }

    #[test]
    fn unterminated_script_is_an_ambiguity() {
        let html = "<body><p>kept</p><script>function broken() {";
        let extraction = extract(html);
        assert_eq!(extraction.document.body, "<p>kept</p>");
        assert_eq!(extraction.document.script, "");
        assert_eq!(extraction.ambiguities.len(), 1);
        assert_eq!(extraction.ambiguities[0].region, Region::Script);
    }

    #[test]
    fn unterminated_comment_is_an_ambiguity() {
        let extraction = extract("<body><p>a</p><!-- never closed <p>b</p>");
        assert_eq!(extraction.document.body, "<p>a</p>");
        assert_eq!(extraction.ambiguities[0].region, Region::Body);
    }
}
