//! JavaScript lexer
//!
//! Just enough of ECMAScript lexical grammar to find statement and body
//! boundaries without being fooled by braces or tags inside literals:
//! strings, template literals (with nested `${}` expressions), comments,
//! regular-expression literals and multi-character punctuators.
//!
//! Regex-vs-division uses the classic previous-token rule. The lexer never
//! fails: unterminated literals end at the line break or end of input.

/// Token category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Identifier or keyword
    Ident,
    /// Numeric literal
    Number,
    /// `'…'` or `"…"`
    Str,
    /// `` `…` ``, including nested substitutions
    Template,
    /// `/…/flags`
    Regex,
    /// Operator or bracket
    Punct,
    /// `// …` or `/* … */`
    Comment,
}

/// A lexed token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    /// Category
    pub kind: TokenKind,
    /// Start byte offset
    pub start: usize,
    /// End byte offset (exclusive)
    pub end: usize,
    /// A line terminator separates this token from the previous one
    pub newline_before: bool,
}

impl Token {
    /// Source text of this token
    #[inline]
    #[must_use]
    pub fn text<'a>(&self, src: &'a str) -> &'a str {
        &src[self.start..self.end]
    }

    /// Is this the punctuator `p`
    #[inline]
    #[must_use]
    pub fn is_punct(&self, src: &str, p: &str) -> bool {
        self.kind == TokenKind::Punct && self.text(src) == p
    }
}

/// Longest-first multi-character punctuators
const PUNCTUATORS: &[&str] = &[
    ">>>=", "...", "===", "!==", "**=", "<<=", ">>=", ">>>", "&&=", "||=", "??=", "=>", "==",
    "!=", "<=", ">=", "&&", "||", "??", "?.", "++", "--", "+=", "-=", "*=", "/=", "%=", "&=",
    "|=", "^=", "**", "<<", ">>",
];

/// Keywords after which a `/` starts a regular expression
const REGEX_PRECEDING_KEYWORDS: &[&str] = &[
    "return", "typeof", "instanceof", "in", "of", "new", "delete", "void", "throw", "case",
    "do", "else", "yield", "await",
];

/// Tokenize a script, comments included
#[must_use]
pub fn tokenize(src: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(src);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token() {
        tokens.push(token);
    }
    tokens
}

/// Streaming lexer state
#[derive(Debug)]
pub struct Lexer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    newline: bool,
    prev: Option<(TokenKind, usize, usize)>,
}

impl<'a> Lexer<'a> {
    /// Lex `src` from the start
    #[must_use]
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            newline: false,
            prev: None,
        }
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek(0) {
            match b {
                b'\n' | b'\r' => self.newline = true,
                b' ' | b'\t' | 0x0b | 0x0c => {}
                // U+2028 / U+2029 are line terminators; U+00A0 / U+FEFF are blanks
                0xe2 if self.src[self.pos..].starts_with(['\u{2028}', '\u{2029}']) => {
                    self.newline = true;
                    self.pos += 3;
                    continue;
                }
                0xc2 if self.src[self.pos..].starts_with('\u{a0}') => {
                    self.pos += 2;
                    continue;
                }
                0xef if self.src[self.pos..].starts_with('\u{feff}') => {
                    self.pos += 3;
                    continue;
                }
                _ => return,
            }
            self.pos += 1;
        }
    }

    /// Next token, or `None` at end of input
    pub fn next_token(&mut self) -> Option<Token> {
        self.skip_whitespace();
        let first = self.peek(0)?;
        let start = self.pos;
        let newline_before = self.newline;

        let kind = match first {
            b'/' if self.peek(1) == Some(b'/') => {
                self.line_comment();
                TokenKind::Comment
            }
            b'/' if self.peek(1) == Some(b'*') => {
                self.block_comment();
                TokenKind::Comment
            }
            b'/' if self.regex_allowed() && self.regex() => TokenKind::Regex,
            b'"' | b'\'' => {
                self.string(first);
                TokenKind::Str
            }
            b'`' => {
                self.template();
                TokenKind::Template
            }
            b'0'..=b'9' => {
                self.number();
                TokenKind::Number
            }
            b'.' if self.peek(1).is_some_and(|b| b.is_ascii_digit()) => {
                self.number();
                TokenKind::Number
            }
            b if is_ident_start(b) => {
                self.ident();
                TokenKind::Ident
            }
            _ => {
                self.punct();
                TokenKind::Punct
            }
        };

        let token = Token {
            kind,
            start,
            end: self.pos,
            newline_before,
        };
        if kind != TokenKind::Comment {
            self.newline = false;
            self.prev = Some((kind, start, self.pos));
        }
        Some(token)
    }

    fn regex_allowed(&self) -> bool {
        let Some((kind, start, end)) = self.prev else {
            return true;
        };
        let text = &self.src[start..end];
        match kind {
            TokenKind::Ident => REGEX_PRECEDING_KEYWORDS.contains(&text),
            TokenKind::Punct => !matches!(text, ")" | "]" | "++" | "--"),
            _ => false,
        }
    }

    fn line_comment(&mut self) {
        while let Some(b) = self.peek(0) {
            if b == b'\n' || b == b'\r' {
                break;
            }
            self.pos += 1;
        }
    }

    fn block_comment(&mut self) {
        let body_start = self.pos + 2;
        let end = self.src[body_start..]
            .find("*/")
            .map_or(self.src.len(), |off| body_start + off + 2);
        if self.src[self.pos..end].contains('\n') {
            self.newline = true;
        }
        self.pos = end;
    }

    /// Try to scan a regex literal; leaves `pos` untouched on failure
    fn regex(&mut self) -> bool {
        let mut i = self.pos + 1;
        let mut in_class = false;
        loop {
            match self.bytes.get(i) {
                None | Some(b'\n' | b'\r') => return false,
                Some(b'\\') => i += 2,
                Some(b'[') => {
                    in_class = true;
                    i += 1;
                }
                Some(b']') => {
                    in_class = false;
                    i += 1;
                }
                Some(b'/') if !in_class => break,
                Some(_) => i += 1,
            }
        }
        i += 1;
        while self.bytes.get(i).is_some_and(|b| b.is_ascii_alphabetic()) {
            i += 1;
        }
        self.pos = i.min(self.bytes.len());
        true
    }

    fn string(&mut self, quote: u8) {
        self.pos += 1;
        while let Some(b) = self.peek(0) {
            match b {
                b'\\' => self.pos += 2,
                b'\n' | b'\r' => return,
                _ if b == quote => {
                    self.pos += 1;
                    return;
                }
                _ => self.pos += 1,
            }
        }
        self.pos = self.pos.min(self.bytes.len());
    }

    fn template(&mut self) {
        self.pos += 1;
        while let Some(b) = self.peek(0) {
            match b {
                b'\\' => self.pos += 2,
                b'`' => {
                    self.pos += 1;
                    return;
                }
                b'$' if self.peek(1) == Some(b'{') => {
                    self.pos += 2;
                    self.substitution();
                }
                _ => self.pos += 1,
            }
        }
        self.pos = self.pos.min(self.bytes.len());
    }

    /// Skip a `${ … }` body, consuming the closing brace
    fn substitution(&mut self) {
        let saved_newline = self.newline;
        self.prev = None;
        let mut depth = 0usize;
        while let Some(token) = self.next_token() {
            if token.kind != TokenKind::Punct {
                continue;
            }
            match token.text(self.src) {
                "{" => depth += 1,
                "}" if depth == 0 => break,
                "}" => depth -= 1,
                _ => {}
            }
        }
        self.newline = saved_newline;
    }

    fn number(&mut self) {
        self.pos += 1;
        while self
            .peek(0)
            .is_some_and(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'.')
        {
            self.pos += 1;
        }
    }

    fn ident(&mut self) {
        self.pos += 1;
        while self.peek(0).is_some_and(is_ident_continue) {
            self.pos += 1;
        }
    }

    fn punct(&mut self) {
        let rest = &self.src[self.pos..];
        if let Some(p) = PUNCTUATORS.iter().find(|p| rest.starts_with(**p)) {
            self.pos += p.len();
        } else {
            // Single character; step over a whole code point
            self.pos += rest.chars().next().map_or(1, char::len_utf8);
        }
    }
}

#[inline]
fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$' || b == b'#' || b >= 0x80
}

#[inline]
fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b >= 0x80
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lex(src: &str) -> Vec<(TokenKind, &str)> {
        tokenize(src)
            .into_iter()
            .map(|t| (t.kind, t.text(src)))
            .collect()
    }

    #[test]
    fn braces_in_strings_are_not_punctuation() {
        let toks = lex(r#"let s = "}{"; let t = '</script>';"#);
        assert!(toks.contains(&(TokenKind::Str, r#""}{""#)));
        assert!(toks.contains(&(TokenKind::Str, "'</script>'")));
        assert_eq!(toks.iter().filter(|(_, t)| *t == "}").count(), 0);
    }

    #[test]
    fn template_with_nested_substitution_is_one_token() {
        let src = "`a ${ {x: `b ${c}`}.x } d` + 1";
        let toks = lex(src);
        assert_eq!(toks[0], (TokenKind::Template, "`a ${ {x: `b ${c}`}.x } d`"));
        assert_eq!(toks[1], (TokenKind::Punct, "+"));
    }

    #[test]
    fn regex_versus_division() {
        let toks = lex("x = a / b / c; y = /}/g.test(s);");
        assert_eq!(toks.iter().filter(|(k, _)| *k == TokenKind::Regex).count(), 1);
        assert!(toks.contains(&(TokenKind::Regex, "/}/g")));
    }

    #[test]
    fn regex_with_slash_in_class() {
        let toks = lex("const r = /[/]+/;");
        assert!(toks.contains(&(TokenKind::Regex, "/[/]+/")));
    }

    #[test]
    fn comments_and_newlines() {
        let tokens = tokenize("a /* x\n y */ b // tail\nc");
        let src_kinds: Vec<_> = tokens.iter().map(|t| (t.kind, t.newline_before)).collect();
        assert_eq!(
            src_kinds,
            vec![
                (TokenKind::Ident, false),
                (TokenKind::Comment, false),
                (TokenKind::Ident, true),
                (TokenKind::Comment, false),
                (TokenKind::Ident, true),
            ]
        );
    }

    #[test]
    fn arrow_and_spread_punctuators() {
        let toks = lex("(...a) => a?.b ?? c");
        let puncts: Vec<_> = toks
            .iter()
            .filter(|(k, _)| *k == TokenKind::Punct)
            .map(|(_, t)| *t)
            .collect();
        assert_eq!(puncts, vec!["(", "...", ")", "=>", "?.", "??"]);
    }

    #[test]
    fn unterminated_string_stops_at_line_end() {
        let toks = lex("'abc\nnext");
        assert_eq!(toks[0], (TokenKind::Str, "'abc"));
        assert_eq!(toks[1], (TokenKind::Ident, "next"));
    }
}
