//! Function catalog
//!
//! Top-level routines of a script, by name, in first-definition order. A
//! routine is a function declaration, a `const`/`let`/`var` binding whose
//! value is a function or arrow expression, or a class. Anything else at top
//! level is kept as a [`LooseStatement`].

use crate::lexer::{tokenize, Token, TokenKind};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strata_artifact::{Keyed, Ledger};

/// How a routine was declared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// `function name(…) {…}` (also `async` and generator forms)
    Declaration,
    /// `const name = (…) => …` and friends
    Binding,
    /// `class Name {…}`
    Class,
}

/// One named top-level routine
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct FunctionEntry {
    /// Routine name
    pub name: String,
    /// Declaration form
    pub kind: EntryKind,
    /// Parameter list as written, parentheses included (empty for classes)
    pub params: String,
    /// Full source text, leading comments included
    pub text: String,
    /// Position in the catalog
    pub index: usize,
}

impl PartialEq for FunctionEntry {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.kind == other.kind && self.text == other.text
    }
}

impl Keyed for FunctionEntry {
    fn key(&self) -> Option<&str> {
        Some(&self.name)
    }
}

/// A top-level statement that is not a routine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LooseStatement {
    /// Source text, leading comments included
    pub text: String,
    /// Name bound, for a single-declarator `const`/`let`/`var`
    pub binding: Option<String>,
}

impl LooseStatement {
    /// Unbound statement
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            binding: None,
        }
    }
}

impl Keyed for LooseStatement {
    fn key(&self) -> Option<&str> {
        self.binding.as_deref()
    }
}

/// A routine name defined more than once within one script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogCollision {
    /// Routine name
    pub name: String,
    /// Parameter lists match
    pub same_signature: bool,
    /// Both definitions have identical text
    pub identical: bool,
}

/// Named routines plus everything else, in source order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionCatalog {
    entries: IndexMap<String, FunctionEntry>,
    loose: Vec<LooseStatement>,
    collisions: Vec<CatalogCollision>,
}

impl FunctionCatalog {
    /// Build a catalog from script text
    ///
    /// Never fails. A name defined twice keeps the last definition's text
    /// at the first definition's position.
    #[must_use]
    pub fn parse(script: &str) -> Self {
        let mut ledger = Ledger::new();
        let mut loose = Vec::new();
        let mut collisions = Vec::new();

        for item in Statements::new(script) {
            match item {
                Item::Routine(entry) => {
                    let params = entry.params.clone();
                    let text = entry.text.clone();
                    if let Some(previous) = ledger.record(entry) {
                        let collision = CatalogCollision {
                            name: previous.name,
                            same_signature: previous.params == params,
                            identical: previous.text == text,
                        };
                        tracing::debug!(
                            name = %collision.name,
                            same_signature = collision.same_signature,
                            "routine redefined, later definition kept"
                        );
                        collisions.push(collision);
                    }
                }
                Item::Loose(statement) => loose.push(statement),
            }
        }

        let entries = ledger.finish().items;
        Self::from_parts(entries, loose).with_collisions(collisions)
    }

    /// Assemble a catalog from already-resolved parts
    ///
    /// Entries are expected to have unique names; a repeated name keeps
    /// the later entry.
    #[must_use]
    pub fn from_parts(
        entries: impl IntoIterator<Item = FunctionEntry>,
        loose: impl IntoIterator<Item = LooseStatement>,
    ) -> Self {
        let mut map: IndexMap<String, FunctionEntry> = IndexMap::new();
        for mut entry in entries {
            entry.index = map.len();
            if let Some(slot) = map.get_mut(&entry.name) {
                entry.index = slot.index;
                *slot = entry;
                continue;
            }
            map.insert(entry.name.clone(), entry);
        }
        Self {
            entries: map,
            loose: loose.into_iter().collect(),
            collisions: Vec::new(),
        }
    }

    fn with_collisions(mut self, collisions: Vec<CatalogCollision>) -> Self {
        self.collisions = collisions;
        self
    }

    /// Routine by name
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FunctionEntry> {
        self.entries.get(name)
    }

    /// Whether a routine exists
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Routine names in catalog order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Routines in catalog order
    pub fn entries(&self) -> impl Iterator<Item = &FunctionEntry> {
        self.entries.values()
    }

    /// Loose statements in source order
    #[inline]
    #[must_use]
    pub fn loose(&self) -> &[LooseStatement] {
        &self.loose
    }

    /// Redefinitions found while parsing
    #[inline]
    #[must_use]
    pub fn collisions(&self) -> &[CatalogCollision] {
        &self.collisions
    }

    /// Number of routines
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// No routines and no loose statements
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.loose.is_empty()
    }

    /// Script text: routines, a blank line, then loose statements
    #[must_use]
    pub fn render(&self) -> String {
        let routines: Vec<&str> = self.entries.values().map(|e| e.text.as_str()).collect();
        let loose: Vec<&str> = self.loose.iter().map(|s| s.text.as_str()).collect();
        [routines.join("\n\n"), loose.join("\n")]
            .into_iter()
            .filter(|block| !block.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Identifiers that end a line without ending the expression
const CONTINUING_WORDS: &[&str] = &[
    "else", "catch", "finally", "in", "of", "instanceof", "extends",
];

/// Identifiers that never end an expression
const NON_TERMINAL_WORDS: &[&str] = &[
    "else", "do", "try", "finally", "in", "of", "instanceof", "typeof", "new", "delete",
    "void", "case", "extends", "async", "await", "yield", "const", "let", "var",
];

/// Punctuators that, leading a line, continue the previous one
const CONTINUING_PUNCTS: &[&str] = &[
    ".", "?.", "(", "[", ",", "?", ":", "=", "=>", "+", "-", "*", "/", "%", "**", "&&", "||",
    "??", "&", "|", "^", "<", ">", "<=", ">=", "==", "===", "!=", "!==", "<<", ">>", ">>>",
    "+=", "-=", "*=", "/=", "%=", "**=", "&=", "|=", "^=", "&&=", "||=", "??=", "<<=",
    ">>=", ">>>=",
];

enum Item {
    Routine(FunctionEntry),
    Loose(LooseStatement),
}

/// Splits a script into top-level items
struct Statements<'a> {
    src: &'a str,
    code: Vec<Token>,
    comments: Vec<Token>,
    /// Next code token
    at: usize,
    /// Next unclaimed comment
    comment_at: usize,
    /// End of the previous item
    prev_end: usize,
}

impl<'a> Statements<'a> {
    fn new(src: &'a str) -> Self {
        let (comments, code) = tokenize(src)
            .into_iter()
            .partition(|t| t.kind == TokenKind::Comment);
        Self {
            src,
            code,
            comments,
            at: 0,
            comment_at: 0,
            prev_end: 0,
        }
    }

    fn text(&self, i: usize) -> &'a str {
        self.code.get(i).map_or("", |t| t.text(self.src))
    }

    fn is_punct(&self, i: usize, p: &str) -> bool {
        self.code.get(i).is_some_and(|t| t.is_punct(self.src, p))
    }

    fn ident(&self, i: usize) -> Option<&'a str> {
        self.code
            .get(i)
            .filter(|t| t.kind == TokenKind::Ident)
            .map(|t| t.text(self.src))
    }

    fn newline_before(&self, i: usize) -> bool {
        self.code.get(i).is_some_and(|t| t.newline_before)
    }

    /// Index of the bracket closing the one at `open`
    fn matching(&self, open: usize) -> Option<usize> {
        let mut depth = 0usize;
        for (i, token) in self.code.iter().enumerate().skip(open) {
            if token.kind != TokenKind::Punct {
                continue;
            }
            match token.text(self.src) {
                "(" | "[" | "{" => depth += 1,
                ")" | "]" | "}" => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return Some(i);
                    }
                }
                _ => {}
            }
        }
        None
    }

    fn ends_expression(&self, i: usize) -> bool {
        let Some(token) = self.code.get(i) else {
            return false;
        };
        let text = token.text(self.src);
        match token.kind {
            TokenKind::Ident => !NON_TERMINAL_WORDS.contains(&text),
            TokenKind::Punct => matches!(text, ")" | "]" | "}" | "++" | "--"),
            TokenKind::Comment => false,
            _ => true,
        }
    }

    fn continues(&self, i: usize, in_do: bool) -> bool {
        let Some(token) = self.code.get(i) else {
            return false;
        };
        let text = token.text(self.src);
        match token.kind {
            TokenKind::Ident => CONTINUING_WORDS.contains(&text) || (in_do && text == "while"),
            TokenKind::Punct => CONTINUING_PUNCTS.contains(&text),
            _ => false,
        }
    }

    /// Last token of the statement starting at `start`
    fn statement_end(&self, start: usize) -> usize {
        let last = self.code.len() - 1;
        let in_do = self.text(start) == "do";
        let head_close = match self.text(start) {
            "if" | "for" | "while" | "with" if self.is_punct(start + 1, "(") => {
                self.matching(start + 1)
            }
            _ => None,
        };

        let mut depth = 0usize;
        for i in start..=last {
            let token = self.code[i];
            if token.kind == TokenKind::Punct {
                match token.text(self.src) {
                    "(" | "[" | "{" => depth += 1,
                    ")" | "]" | "}" => depth = depth.saturating_sub(1),
                    ";" if depth == 0 => return i,
                    _ => {}
                }
            }
            if depth == 0
                && Some(i) != head_close
                && self.newline_before(i + 1)
                && self.ends_expression(i)
                && !self.continues(i + 1, in_do)
            {
                return i;
            }
        }
        last
    }

    /// `function name(…) {…}` with `fn_at` pointing at `function`
    fn declaration(&self, fn_at: usize) -> Option<(String, EntryKind, String, usize)> {
        let mut i = fn_at + 1;
        if self.is_punct(i, "*") {
            i += 1;
        }
        let name = self.ident(i)?;
        let open = i + 1;
        if !self.is_punct(open, "(") {
            return None;
        }
        let close = self.matching(open)?;
        if !self.is_punct(close + 1, "{") {
            return None;
        }
        let body_end = self.matching(close + 1)?;
        let params = self.span_text(open, close);
        Some((name.to_owned(), EntryKind::Declaration, params, body_end))
    }

    fn class(&self, class_at: usize) -> Option<(String, EntryKind, String, usize)> {
        let name = self.ident(class_at + 1)?;
        let body = (class_at + 2..self.code.len()).find(|&i| self.is_punct(i, "{"))?;
        let end = self.matching(body)?;
        Some((name.to_owned(), EntryKind::Class, String::new(), end))
    }

    /// `const name = <function or arrow>`; `None` for any other binding
    fn binding(&self, kw_at: usize, end: usize) -> Option<(String, EntryKind, String, usize)> {
        let name = self.ident(kw_at + 1)?;
        if !self.is_punct(kw_at + 2, "=") {
            return None;
        }
        let mut v = kw_at + 3;
        if self.text(v) == "async" && !self.newline_before(v + 1) {
            v += 1;
        }

        let params = if self.text(v) == "function" {
            let mut open = v + 1;
            if self.is_punct(open, "*") {
                open += 1;
            }
            if self.ident(open).is_some() {
                open += 1;
            }
            if !self.is_punct(open, "(") {
                return None;
            }
            let close = self.matching(open)?;
            self.span_text(open, close)
        } else if self.is_punct(v, "(") {
            let close = self.matching(v)?;
            if !self.is_punct(close + 1, "=>") {
                return None;
            }
            self.span_text(v, close)
        } else if self.ident(v).is_some() && self.is_punct(v + 1, "=>") {
            self.text(v).to_owned()
        } else {
            return None;
        };

        // A second declarator makes this more than one routine
        if self.has_top_level_comma(kw_at + 3, end) {
            return None;
        }
        Some((name.to_owned(), EntryKind::Binding, params, end))
    }

    fn has_top_level_comma(&self, from: usize, to: usize) -> bool {
        let mut depth = 0usize;
        for i in from..=to {
            match self.text(i) {
                "(" | "[" | "{" if self.code[i].kind == TokenKind::Punct => depth += 1,
                ")" | "]" | "}" if self.code[i].kind == TokenKind::Punct => {
                    depth = depth.saturating_sub(1);
                }
                "," if depth == 0 => return true,
                _ => {}
            }
        }
        false
    }

    /// Name bound by a simple single-declarator binding statement
    fn bound_name(&self, kw_at: usize, end: usize) -> Option<String> {
        if !matches!(self.text(kw_at), "const" | "let" | "var") {
            return None;
        }
        let name = self.ident(kw_at + 1)?;
        if self.has_top_level_comma(kw_at + 1, end) {
            return None;
        }
        Some(name.to_owned())
    }

    fn span_text(&self, first: usize, last: usize) -> String {
        self.src[self.code[first].start..self.code[last].end].to_owned()
    }

    /// Source text from the leading comments of `first` through `last`,
    /// plus a trailing comment on the same line
    fn claim(&mut self, first: usize, last: usize) -> String {
        let first_start = self.code[first].start;
        let mut end = self.code[last].end;
        let next_code = self.code.get(last + 1).map_or(self.src.len(), |t| t.start);

        while self
            .comments
            .get(self.comment_at)
            .is_some_and(|c| c.start < self.prev_end)
        {
            self.comment_at += 1;
        }
        let start = self
            .comments
            .get(self.comment_at)
            .filter(|c| c.end <= first_start)
            .map_or(first_start, |c| c.start);
        while self
            .comments
            .get(self.comment_at)
            .is_some_and(|c| c.end <= first_start)
        {
            self.comment_at += 1;
        }
        while let Some(c) = self.comments.get(self.comment_at) {
            if c.start < end || c.start >= next_code || c.newline_before {
                break;
            }
            end = c.end;
            self.comment_at += 1;
        }

        self.prev_end = end;
        self.src[start..end].to_owned()
    }

    fn next_item(&mut self) -> Option<Item> {
        while self.is_punct(self.at, ";") {
            self.prev_end = self.code[self.at].end;
            self.at += 1;
        }
        let first = self.at;
        if first >= self.code.len() {
            return None;
        }

        let routine = match self.text(first) {
            "function" => self.declaration(first),
            "async" if self.text(first + 1) == "function" && !self.newline_before(first + 1) => {
                self.declaration(first + 1)
            }
            "class" => self.class(first),
            "const" | "let" | "var" => self.binding(first, self.statement_end(first)),
            _ => None,
        };

        let item = if let Some((name, kind, params, mut last)) = routine {
            if kind == EntryKind::Binding
                && !self.is_punct(last, ";")
                && self.is_punct(last + 1, ";")
            {
                last += 1;
            }
            self.at = last + 1;
            Item::Routine(FunctionEntry {
                name,
                kind,
                params,
                text: self.claim(first, last),
                index: 0,
            })
        } else {
            let last = self.statement_end(first);
            self.at = last + 1;
            let binding = self.bound_name(first, last);
            Item::Loose(LooseStatement {
                text: self.claim(first, last),
                binding,
            })
        };
        Some(item)
    }
}

impl Iterator for Statements<'_> {
    type Item = Item;

    fn next(&mut self) -> Option<Item> {
        self.next_item()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(catalog: &FunctionCatalog) -> Vec<&str> {
        catalog.names().collect()
    }

    #[test]
    fn recognizes_declaration_forms() {
        let script = r"
function plain(a, b) { return a + b; }
async function fetchData() { await go(); }
function* ids() { yield 1; }
const arrow = (x) => x * 2;
let single = y => y + 1;
var expr = function (z) { return z; };
const later = async () => { await tick(); };
class Widget { render() { return 1; } }
";
        let catalog = FunctionCatalog::parse(script);
        assert_eq!(
            names(&catalog),
            vec!["plain", "fetchData", "ids", "arrow", "single", "expr", "later", "Widget"]
        );
        assert!(catalog.loose().is_empty());
        assert_eq!(catalog.get("arrow").map(|e| e.kind), Some(EntryKind::Binding));
        assert_eq!(catalog.get("Widget").map(|e| e.kind), Some(EntryKind::Class));
        assert_eq!(catalog.get("plain").map(|e| e.params.as_str()), Some("(a, b)"));
        assert_eq!(
            catalog.get("expr").map(|e| e.text.as_str()),
            Some("var expr = function (z) { return z; };")
        );
    }

    #[test]
    fn braces_in_literals_do_not_end_a_body() {
        let script = r#"function tricky() {
  const s = "}";
  const t = `${ "{" }`;
  const r = /}/;
  return "</script>";
}
function after() {}"#;
        let catalog = FunctionCatalog::parse(script);
        assert_eq!(names(&catalog), vec!["tricky", "after"]);
        let tricky = catalog.get("tricky").map(|e| e.text.clone()).unwrap_or_default();
        assert!(tricky.ends_with("return \"</script>\";\n}"));
    }

    #[test]
    fn leading_comments_belong_to_the_routine() {
        let script = "// adds things\n/* really */\nfunction add(a, b) { return a + b; } // inline\nlet x = 1;";
        let catalog = FunctionCatalog::parse(script);
        assert_eq!(
            catalog.get("add").map(|e| e.text.as_str()),
            Some("// adds things\n/* really */\nfunction add(a, b) { return a + b; } // inline")
        );
        assert_eq!(catalog.loose()[0].text, "let x = 1;");
    }

    #[test]
    fn redefinition_keeps_last_text_at_first_position() {
        let script = "function a() { return 1; }\nfunction b() {}\nfunction a() { return 2; }";
        let catalog = FunctionCatalog::parse(script);
        assert_eq!(names(&catalog), vec!["a", "b"]);
        assert_eq!(
            catalog.get("a").map(|e| e.text.as_str()),
            Some("function a() { return 2; }")
        );
        assert_eq!(
            catalog.collisions(),
            &[CatalogCollision {
                name: "a".into(),
                same_signature: true,
                identical: false,
            }]
        );
    }

    #[test]
    fn signature_change_is_reported() {
        let catalog = FunctionCatalog::parse("function f(a) {}\nfunction f(a, b) {}");
        assert!(!catalog.collisions()[0].same_signature);
    }

    #[test]
    fn loose_statements_by_line_breaks() {
        let script = "const count = 0\nlet items = [\n  1,\n  2\n]\ndocument\n  .getElementById('go')\n  .addEventListener('click', run)\nif (ready)\n  start()\nelse\n  wait()\ninit();";
        let catalog = FunctionCatalog::parse(script);
        assert_eq!(catalog.len(), 0);
        let texts: Vec<&str> = catalog.loose().iter().map(|s| s.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "const count = 0",
                "let items = [\n  1,\n  2\n]",
                "document\n  .getElementById('go')\n  .addEventListener('click', run)",
                "if (ready)\n  start()\nelse\n  wait()",
                "init();",
            ]
        );
        assert_eq!(catalog.loose()[0].binding.as_deref(), Some("count"));
        assert_eq!(catalog.loose()[2].binding, None);
    }

    #[test]
    fn multi_line_arrow_binding_ends_at_statement_end() {
        let script = "const handler = (e) =>\n  e.preventDefault()\nhandler(ev)";
        let catalog = FunctionCatalog::parse(script);
        assert_eq!(
            catalog.get("handler").map(|e| e.text.as_str()),
            Some("const handler = (e) =>\n  e.preventDefault()")
        );
        assert_eq!(catalog.loose()[0].text, "handler(ev)");
    }

    #[test]
    fn multiple_declarators_stay_loose() {
        let catalog = FunctionCatalog::parse("let a = () => 1, b = 2;");
        assert_eq!(catalog.len(), 0);
        assert_eq!(catalog.loose()[0].binding, None);
    }

    #[test]
    fn empty_statements_are_dropped() {
        let catalog = FunctionCatalog::parse(";;\n;");
        assert!(catalog.is_empty());
    }

    #[test]
    fn render_lays_out_routines_then_loose() {
        let catalog = FunctionCatalog::parse("init();\nfunction a() {}\nlet x = 1;");
        assert_eq!(catalog.render(), "function a() {}\n\ninit();\nlet x = 1;");
    }

    #[test]
    fn from_parts_reindexes() {
        let entry = |name: &str| FunctionEntry {
            name: name.into(),
            kind: EntryKind::Declaration,
            params: "()".into(),
            text: format!("function {name}() {{}}"),
            index: 99,
        };
        let catalog = FunctionCatalog::from_parts([entry("a"), entry("b")], []);
        let indices: Vec<usize> = catalog.entries().map(|e| e.index).collect();
        assert_eq!(indices, vec![0, 1]);
    }
}
