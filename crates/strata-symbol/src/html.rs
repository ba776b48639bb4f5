//! HTML tag scanner
//!
//! A flat, allocation-light scanner over HTML text. It does not build a tree;
//! callers track depth themselves. It knows exactly as much HTML as region
//! extraction and sectioning need:
//!
//! - quoted attribute values may contain `>`
//! - comments, doctypes and processing instructions are single nodes
//! - raw-text elements (`script`, `style`, `textarea`, `title`) swallow
//!   their content up to the matching close tag, so markup-looking text in a
//!   script never produces nodes
//!
//! Unterminated comments and raw-text bodies run to the end of input and are
//! flagged, never fatal.

use std::ops::Range;

/// Elements that never have content or a close tag
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Elements whose content is raw text
pub const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

/// Is `name` a void element
#[inline]
#[must_use]
pub fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

/// One attribute of a start tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Lowercased attribute name
    pub name: String,
    /// Raw value without quotes (empty for bare attributes)
    pub value: String,
}

/// Parsed start tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTag {
    /// Lowercased element name
    pub name: String,
    /// Attributes in source order
    pub attributes: Vec<Attribute>,
    /// Written as `<x/>`
    pub self_closing: bool,
}

impl StartTag {
    /// First value of an attribute
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Whether this tag opens an element that must be closed
    #[inline]
    #[must_use]
    pub fn opens_element(&self) -> bool {
        !self.self_closing && !is_void(&self.name)
    }
}

/// Kind of a scanned node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// `<!DOCTYPE …>` or other `<!…>` / `<?…>` declarations
    Doctype,
    /// `<!-- … -->`
    Comment {
        /// False when `-->` was never found
        terminated: bool,
    },
    /// `<name …>`
    Start(StartTag),
    /// `</name>`
    End(String),
    /// Content of a raw-text element
    RawText {
        /// Owning element
        element: String,
        /// False when the close tag was never found
        terminated: bool,
    },
    /// Character data between tags
    Text,
}

/// A node and the byte range it covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// What was scanned
    pub kind: NodeKind,
    /// Byte range in the scanned text
    pub span: Range<usize>,
}

/// Iterator over the nodes of an HTML text
#[derive(Debug, Clone)]
pub struct HtmlScanner<'a> {
    src: &'a str,
    pos: usize,
    pending_raw: Option<String>,
}

impl<'a> HtmlScanner<'a> {
    /// Scan `src` from the start
    #[inline]
    #[must_use]
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            pending_raw: None,
        }
    }

    /// Scanned text
    #[inline]
    #[must_use]
    pub fn source(&self) -> &'a str {
        self.src
    }

    fn bytes(&self) -> &'a [u8] {
        self.src.as_bytes()
    }

    fn raw_text(&mut self, element: String) -> Node {
        let start = self.pos;
        let (end, terminated) = match find_close_tag(self.src, start, &element) {
            Some(end) => (end, true),
            None => (self.src.len(), false),
        };
        self.pos = end;
        Node {
            kind: NodeKind::RawText {
                element,
                terminated,
            },
            span: start..end,
        }
    }

    fn text(&mut self) -> Node {
        let start = self.pos;
        let bytes = self.bytes();
        let mut i = start + 1;
        while i < bytes.len() {
            if bytes[i] == b'<' && starts_markup(bytes, i) {
                break;
            }
            i += 1;
        }
        self.pos = i;
        Node {
            kind: NodeKind::Text,
            span: start..i,
        }
    }

    fn comment(&mut self) -> Node {
        let start = self.pos;
        let (end, terminated) = match self.src[start + 4..].find("-->") {
            Some(off) => (start + 4 + off + 3, true),
            None => (self.src.len(), false),
        };
        self.pos = end;
        Node {
            kind: NodeKind::Comment { terminated },
            span: start..end,
        }
    }

    fn declaration(&mut self) -> Node {
        let start = self.pos;
        let end = self.src[start..]
            .find('>')
            .map_or(self.src.len(), |off| start + off + 1);
        self.pos = end;
        Node {
            kind: NodeKind::Doctype,
            span: start..end,
        }
    }

    fn end_tag(&mut self) -> Node {
        let start = self.pos;
        let bytes = self.bytes();
        let mut i = start + 2;
        while i < bytes.len() && is_name_byte(bytes[i]) {
            i += 1;
        }
        let name = self.src[start + 2..i].to_ascii_lowercase();
        let end = self.src[i..].find('>').map_or(self.src.len(), |off| i + off + 1);
        self.pos = end;
        Node {
            kind: NodeKind::End(name),
            span: start..end,
        }
    }

    fn start_tag(&mut self) -> Node {
        let start = self.pos;
        match parse_start_tag(self.src, start) {
            Some((tag, end)) => {
                self.pos = end;
                if tag.opens_element() && RAW_TEXT_ELEMENTS.contains(&tag.name.as_str()) {
                    self.pending_raw = Some(tag.name.clone());
                }
                Node {
                    kind: NodeKind::Start(tag),
                    span: start..end,
                }
            }
            // `<` followed by a name but never closed: the rest is text
            None => {
                self.pos = self.src.len();
                Node {
                    kind: NodeKind::Text,
                    span: start..self.src.len(),
                }
            }
        }
    }
}

impl Iterator for HtmlScanner<'_> {
    type Item = Node;

    fn next(&mut self) -> Option<Node> {
        if let Some(element) = self.pending_raw.take() {
            let node = self.raw_text(element);
            if !node.span.is_empty() {
                return Some(node);
            }
            if let NodeKind::RawText {
                terminated: false, ..
            } = node.kind
            {
                return Some(node);
            }
        }

        if self.pos >= self.src.len() {
            return None;
        }

        let bytes = self.bytes();
        let i = self.pos;
        if bytes[i] != b'<' || !starts_markup(bytes, i) {
            return Some(self.text());
        }

        let node = match bytes.get(i + 1) {
            Some(b'!') if self.src[i..].starts_with("<!--") => self.comment(),
            Some(b'!' | b'?') => self.declaration(),
            Some(b'/') => self.end_tag(),
            _ => self.start_tag(),
        };
        Some(node)
    }
}

/// Does the `<` at `i` begin a tag, comment or declaration
fn starts_markup(bytes: &[u8], i: usize) -> bool {
    match bytes.get(i + 1) {
        Some(b) if b.is_ascii_alphabetic() => true,
        Some(b'!' | b'?') => true,
        Some(b'/') => bytes.get(i + 2).is_some_and(u8::is_ascii_alphabetic),
        _ => false,
    }
}

#[inline]
fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b':' || b == b'_'
}

/// Parse `<name attr=…>` at `start`; returns the tag and the end offset
fn parse_start_tag(src: &str, start: usize) -> Option<(StartTag, usize)> {
    let bytes = src.as_bytes();
    let mut i = start + 1;
    while i < bytes.len() && is_name_byte(bytes[i]) {
        i += 1;
    }
    let name = src[start + 1..i].to_ascii_lowercase();
    let mut attributes = Vec::new();

    loop {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        match bytes.get(i)? {
            b'>' => {
                return Some((
                    StartTag {
                        name,
                        attributes,
                        self_closing: false,
                    },
                    i + 1,
                ))
            }
            b'/' if bytes.get(i + 1) == Some(&b'>') => {
                return Some((
                    StartTag {
                        name,
                        attributes,
                        self_closing: true,
                    },
                    i + 2,
                ))
            }
            b'/' => {
                i += 1;
                continue;
            }
            _ => {}
        }

        let name_start = i;
        while i < bytes.len()
            && !bytes[i].is_ascii_whitespace()
            && !matches!(bytes[i], b'=' | b'>' | b'/')
        {
            i += 1;
        }
        let attr_name = src[name_start..i].to_ascii_lowercase();

        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let mut value = String::new();
        if bytes.get(i) == Some(&b'=') {
            i += 1;
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            match *bytes.get(i)? {
                quote @ (b'"' | b'\'') => {
                    let close = src[i + 1..].find(quote as char)? + i + 1;
                    value = src[i + 1..close].to_string();
                    i = close + 1;
                }
                _ => {
                    let value_start = i;
                    while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' {
                        i += 1;
                    }
                    value = src[value_start..i].to_string();
                }
            }
        }
        if !attr_name.is_empty() {
            attributes.push(Attribute {
                name: attr_name,
                value,
            });
        }
    }
}

/// Offset of `</element` (case-insensitive, followed by a delimiter) at or after `from`
#[must_use]
pub fn find_close_tag(src: &str, from: usize, element: &str) -> Option<usize> {
    let bytes = src.as_bytes();
    let mut i = from;
    while let Some(off) = src[i..].find("</") {
        let at = i + off;
        let name_end = at + 2 + element.len();
        if name_end <= bytes.len()
            && bytes[at + 2..name_end].eq_ignore_ascii_case(element.as_bytes())
            && bytes
                .get(name_end)
                .map_or(true, |&b| b.is_ascii_whitespace() || matches!(b, b'>' | b'/'))
        {
            return Some(at);
        }
        i = at + 2;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(src: &str) -> Vec<String> {
        HtmlScanner::new(src)
            .map(|n| match n.kind {
                NodeKind::Doctype => "doctype".to_string(),
                NodeKind::Comment { .. } => "comment".to_string(),
                NodeKind::Start(tag) => format!("<{}>", tag.name),
                NodeKind::End(name) => format!("</{name}>"),
                NodeKind::RawText { element, .. } => format!("raw:{element}"),
                NodeKind::Text => format!("text:{}", &src[n.span]),
            })
            .collect()
    }

    #[test]
    fn scans_simple_document() {
        assert_eq!(
            kinds("<!DOCTYPE html><p class=a>hi</p>"),
            vec!["doctype", "<p>", "text:hi", "</p>"]
        );
    }

    #[test]
    fn quoted_attribute_may_contain_gt() {
        let nodes: Vec<_> = HtmlScanner::new(r#"<div data-x="a > b" id='main'>x</div>"#).collect();
        let NodeKind::Start(tag) = &nodes[0].kind else {
            panic!("expected start tag");
        };
        assert_eq!(tag.attr("data-x"), Some("a > b"));
        assert_eq!(tag.attr("id"), Some("main"));
        assert_eq!(nodes.len(), 3);
    }

    #[test]
    fn script_content_is_raw() {
        let src = "<script>if (a < b) { s = '<div>'; }</script><p>x</p>";
        assert_eq!(
            kinds(src),
            vec!["<script>", "raw:script", "</script>", "<p>", "text:x", "</p>"]
        );
    }

    #[test]
    fn close_tag_lookup_is_case_insensitive() {
        let src = "<style>a{}</STYLE >";
        assert_eq!(kinds(src), vec!["<style>", "raw:style", "</style>"]);
    }

    #[test]
    fn close_tag_needs_delimiter() {
        assert_eq!(find_close_tag("x</scripts></script>", 0, "script"), Some(11));
    }

    #[test]
    fn close_tag_lookup_survives_multibyte_text() {
        assert_eq!(find_close_tag("</scrié</script>", 0, "script"), Some(8));
    }

    #[test]
    fn unterminated_script_is_flagged() {
        let nodes: Vec<_> = HtmlScanner::new("<script>let a = 1;").collect();
        assert_eq!(nodes.len(), 2);
        assert_eq!(
            nodes[1].kind,
            NodeKind::RawText {
                element: "script".to_string(),
                terminated: false
            }
        );
    }

    #[test]
    fn empty_script_yields_no_raw_node() {
        assert_eq!(kinds("<script></script>"), vec!["<script>", "</script>"]);
    }

    #[test]
    fn stray_lt_is_text() {
        assert_eq!(kinds("a < b"), vec!["text:a < b"]);
    }

    #[test]
    fn comment_swallows_tags() {
        assert_eq!(kinds("<!-- <p> -->x"), vec!["comment", "text:x"]);
    }

    #[test]
    fn self_closing_and_void() {
        let nodes: Vec<_> = HtmlScanner::new("<br><svg/>").collect();
        let NodeKind::Start(br) = &nodes[0].kind else { panic!() };
        let NodeKind::Start(svg) = &nodes[1].kind else { panic!() };
        assert!(!br.opens_element());
        assert!(!svg.opens_element());
    }
}
