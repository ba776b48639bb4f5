//! Markup sections and element ids
//!
//! Body markup is split into top-level [`MarkupSection`]s. A section is keyed
//! by its element id (`#chart`), or, without one, by a structural
//! fingerprint (`section.card.wide`) when that fingerprint occurs once in the
//! document. Keys are what lets a later round replace a section instead of
//! duplicating it.

use crate::html::{HtmlScanner, NodeKind, StartTag};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use std::ops::Range;
use strata_artifact::Keyed;

/// Start tags that implicitly close an open `<p>`
const CLOSES_PARAGRAPH: &[&str] = &[
    "address", "article", "aside", "blockquote", "details", "div", "dl", "fieldset",
    "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "main",
    "nav", "ol", "p", "pre", "section", "table", "ul",
];

/// What a section is made of
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionKind {
    /// A top-level element and everything inside it
    Element {
        /// Lowercased tag name
        tag: String,
    },
    /// A non-blank run of character data
    Text,
    /// A comment
    Comment,
}

/// One top-level unit of body markup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupSection {
    /// Exact source text (text runs are trimmed)
    pub text: String,
    /// Stable key, when one could be determined
    pub key: Option<String>,
    /// Section kind
    pub kind: SectionKind,
    /// Byte range in the source markup
    pub span: Range<usize>,
}

impl Keyed for MarkupSection {
    fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }
}

/// Split markup into top-level sections and assign keys
#[must_use]
pub fn sections(markup: &str) -> Vec<MarkupSection> {
    let mut out: Vec<(MarkupSection, Option<StartTag>)> = Vec::new();
    let mut stack: Vec<String> = Vec::new();
    let mut open: Option<(usize, StartTag)> = None;

    let close_open = |end: usize, open: &mut Option<(usize, StartTag)>, out: &mut Vec<_>| {
        if let Some((start, tag)) = open.take() {
            out.push(element_section(markup, start..end, tag));
        }
    };

    for node in HtmlScanner::new(markup) {
        match node.kind {
            NodeKind::Start(tag) => {
                if stack.last().is_some_and(|top| top == "p")
                    && CLOSES_PARAGRAPH.contains(&tag.name.as_str())
                {
                    stack.pop();
                    if stack.is_empty() {
                        close_open(node.span.start, &mut open, &mut out);
                    }
                }
                if stack.is_empty() {
                    if tag.opens_element() {
                        stack.push(tag.name.clone());
                        open = Some((node.span.start, tag));
                    } else {
                        out.push(element_section(markup, node.span, tag));
                    }
                } else if tag.opens_element() {
                    stack.push(tag.name);
                }
            }
            NodeKind::End(name) => {
                if let Some(pos) = stack.iter().rposition(|n| *n == name) {
                    stack.truncate(pos);
                    if stack.is_empty() {
                        close_open(node.span.end, &mut open, &mut out);
                    }
                }
            }
            NodeKind::Text if stack.is_empty() => {
                let text = markup[node.span.clone()].trim();
                if !text.is_empty() {
                    out.push((
                        MarkupSection {
                            text: text.to_string(),
                            key: None,
                            kind: SectionKind::Text,
                            span: node.span,
                        },
                        None,
                    ));
                }
            }
            NodeKind::Comment { .. } if stack.is_empty() => {
                out.push((
                    MarkupSection {
                        text: markup[node.span.clone()].to_string(),
                        key: None,
                        kind: SectionKind::Comment,
                        span: node.span,
                    },
                    None,
                ));
            }
            _ => {}
        }
    }
    close_open(markup.trim_end().len(), &mut open, &mut out);

    assign_keys(out)
}

fn element_section(
    markup: &str,
    span: Range<usize>,
    tag: StartTag,
) -> (MarkupSection, Option<StartTag>) {
    (
        MarkupSection {
            text: markup[span.clone()].trim_end().to_string(),
            key: None,
            kind: SectionKind::Element {
                tag: tag.name.clone(),
            },
            span,
        },
        Some(tag),
    )
}

/// `tag.class1.class2`
fn fingerprint(tag: &StartTag) -> String {
    let mut print = tag.name.clone();
    if let Some(classes) = tag.attr("class") {
        for class in classes.split_whitespace() {
            print.push('.');
            print.push_str(class);
        }
    }
    print
}

fn assign_keys(raw: Vec<(MarkupSection, Option<StartTag>)>) -> Vec<MarkupSection> {
    let mut print_counts: HashMap<String, usize> = HashMap::new();
    for (_, tag) in &raw {
        if let Some(tag) = tag {
            if id_of(tag).is_none() {
                *print_counts.entry(fingerprint(tag)).or_default() += 1;
            }
        }
    }

    let mut seen_ids: HashSet<String> = HashSet::new();
    raw.into_iter()
        .map(|(mut section, tag)| {
            if let Some(tag) = tag {
                section.key = match id_of(&tag) {
                    // Duplicate ids: only the first occurrence is addressable
                    Some(id) => seen_ids.insert(id.to_string()).then(|| format!("#{id}")),
                    None => {
                        let print = fingerprint(&tag);
                        (print_counts.get(&print) == Some(&1)).then_some(print)
                    }
                };
            }
            section
        })
        .collect()
}

fn id_of(tag: &StartTag) -> Option<&str> {
    tag.attr("id").map(str::trim).filter(|id| !id.is_empty())
}

/// Outer spans of every element carrying an `id`, first occurrence wins
#[must_use]
pub fn element_spans(markup: &str) -> IndexMap<String, Range<usize>> {
    let mut spans: IndexMap<String, Range<usize>> = IndexMap::new();
    let mut stack: Vec<(String, usize, Option<String>)> = Vec::new();

    let record = |id: Option<String>, span: Range<usize>, spans: &mut IndexMap<_, _>| {
        if let Some(id) = id {
            spans.entry(id).or_insert(span);
        }
    };

    for node in HtmlScanner::new(markup) {
        match node.kind {
            NodeKind::Start(tag) => {
                if stack.last().is_some_and(|(top, _, _)| top == "p")
                    && CLOSES_PARAGRAPH.contains(&tag.name.as_str())
                {
                    if let Some((_, start, id)) = stack.pop() {
                        record(id, start..node.span.start, &mut spans);
                    }
                }
                let id = id_of(&tag).map(str::to_string);
                if tag.opens_element() {
                    stack.push((tag.name, node.span.start, id));
                } else {
                    record(id, node.span, &mut spans);
                }
            }
            NodeKind::End(name) => {
                if let Some(pos) = stack.iter().rposition(|(n, _, _)| *n == name) {
                    for (_, start, id) in stack.drain(pos..) {
                        record(id, start..node.span.end, &mut spans);
                    }
                }
            }
            _ => {}
        }
    }
    for (_, start, id) in stack {
        record(id, start..markup.len(), &mut spans);
    }

    // Elements are recorded when they close; restore document order.
    spans.sort_by(|_, a, _, b| a.start.cmp(&b.start));
    spans
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn keys(markup: &str) -> Vec<Option<String>> {
        sections(markup).into_iter().map(|s| s.key).collect()
    }

    #[test]
    fn splits_top_level_elements() {
        let markup = r#"
<header><h1>Title</h1></header>
<section id="chart"><canvas id="c"></canvas></section>
<footer>bye</footer>
"#;
        let found = sections(markup);
        assert_eq!(found.len(), 3);
        assert_eq!(found[1].text, r#"<section id="chart"><canvas id="c"></canvas></section>"#);
        assert_eq!(
            keys(markup),
            vec![
                Some("header".to_string()),
                Some("#chart".to_string()),
                Some("footer".to_string())
            ]
        );
    }

    #[test]
    fn repeated_fingerprints_are_unkeyed() {
        let markup = "<p>a</p><p>b</p><div class=\"card\">c</div>";
        assert_eq!(keys(markup), vec![None, None, Some("div.card".to_string())]);
    }

    #[test]
    fn duplicate_ids_key_first_only() {
        let markup = "<div id=\"x\">1</div><div id=\"x\">2</div>";
        assert_eq!(keys(markup), vec![Some("#x".to_string()), None]);
    }

    #[test]
    fn text_and_comments_are_sections() {
        let found = sections("hello <!-- note --> <br>");
        assert_eq!(found[0].kind, SectionKind::Text);
        assert_eq!(found[0].text, "hello");
        assert_eq!(found[1].kind, SectionKind::Comment);
        assert_eq!(found[2].kind, SectionKind::Element { tag: "br".to_string() });
    }

    #[test]
    fn unclosed_paragraph_closed_by_block() {
        let found = sections("<p>intro<div id=\"app\"></div>");
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].text, "<p>intro");
        assert_eq!(found[1].key.as_deref(), Some("#app"));
    }

    #[test]
    fn unclosed_element_runs_to_end() {
        let found = sections("<main id=\"m\"><p>x</p>\n\n");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text, "<main id=\"m\"><p>x</p>");
    }

    #[test]
    fn nested_markup_in_attributes_and_scripts() {
        let markup = r#"<div id="a" title="</div>"><textarea></div></textarea></div><div id="b"></div>"#;
        let found = sections(markup);
        assert_eq!(found.len(), 2);
        assert_eq!(found[1].key.as_deref(), Some("#b"));
    }

    #[test]
    fn element_spans_cover_nested_ids() {
        let markup = r#"<section id="s"><canvas id="c"></canvas><input id="i"></section>"#;
        let spans = element_spans(markup);
        assert_eq!(spans.keys().collect::<Vec<_>>(), vec!["s", "c", "i"]);
        assert_eq!(&markup[spans["c"].clone()], r#"<canvas id="c"></canvas>"#);
        assert_eq!(&markup[spans["i"].clone()], r#"<input id="i">"#);
        assert_eq!(&markup[spans["s"].clone()], markup);
    }
}
