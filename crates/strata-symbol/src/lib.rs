//! # Strata Symbol
//!
//! Scanners that turn the text regions of an artifact into keyed symbols:
//!
//! - [`html`]: a flat tag scanner that understands raw-text elements
//! - [`lexer`]: a JavaScript lexer that is never fooled by literals
//! - [`FunctionCatalog`]: named top-level routines of a script
//! - [`sections`]: top-level markup sections keyed by id or fingerprint
//! - [`referenced_ids`]: element ids a script looks up
//!
//! ## Example
//!
//! ```rust
//! use strata_symbol::FunctionCatalog;
//!
//! let catalog = FunctionCatalog::parse("function draw() {}\nconst reset = () => draw();");
//! assert_eq!(catalog.names().collect::<Vec<_>>(), ["draw", "reset"]);
//! ```

pub mod html;
pub mod lexer;

mod catalog;
mod markup;
mod references;

pub use catalog::{CatalogCollision, EntryKind, FunctionCatalog, FunctionEntry, LooseStatement};
pub use markup::{element_spans, sections, MarkupSection, SectionKind};
pub use references::referenced_ids;

#[cfg(test)]
mod properties {
    use super::*;
    use proptest::prelude::*;

    /// Well-formed pieces joined without regard for nesting
    fn tag_soup() -> impl Strategy<Value = String> {
        let piece = prop_oneof![
            Just("<div>"),
            Just("</div>"),
            Just("<p>"),
            Just("</p>"),
            Just("<br>"),
            Just("<span id=\"x\">"),
            Just("</span>"),
            Just("<!-- note -->"),
            Just("hello "),
            Just("\n"),
        ];
        prop::collection::vec(piece, 0..16).prop_map(|pieces| pieces.concat())
    }

    proptest! {
        #[test]
        fn tokens_cover_everything_but_blanks(src in any::<String>()) {
            let tokens = lexer::tokenize(&src);
            let mut last = 0;
            for token in &tokens {
                prop_assert!(last <= token.start && token.start < token.end);
                prop_assert!(token.end <= src.len());
                let gap = &src[last..token.start];
                prop_assert!(
                    gap.chars().all(|c| c.is_whitespace() || c == '\u{feff}'),
                    "non-blank gap between tokens: {:?}",
                    gap
                );
                let _ = token.text(&src);
                last = token.end;
            }
            prop_assert!(
                src[last..].chars().all(|c| c.is_whitespace() || c == '\u{feff}'),
                "non-blank trailing text: {:?}",
                &src[last..]
            );
        }

        #[test]
        fn catalog_finds_every_named_routine(
            names in prop::collection::btree_set("[a-z]{1,6}", 0..6),
            arrows in any::<bool>(),
        ) {
            let script = names
                .iter()
                .map(|name| if arrows {
                    format!("const f_{name} = () => {{ return 1; }};")
                } else {
                    format!("function f_{name}() {{ return 1; }}")
                })
                .collect::<Vec<_>>()
                .join("\n");
            let catalog = FunctionCatalog::parse(&script);
            let expected: Vec<String> = names.iter().map(|n| format!("f_{n}")).collect();
            prop_assert_eq!(catalog.names().collect::<Vec<_>>(), expected);
            prop_assert!(catalog.loose().is_empty());
        }

        #[test]
        fn sections_are_ordered_slices_of_the_markup(markup in tag_soup()) {
            let mut last = 0;
            for section in sections(&markup) {
                prop_assert!(last <= section.span.start);
                prop_assert!(section.span.end <= markup.len());
                prop_assert!(markup[section.span.clone()].contains(section.text.as_str()));
                last = section.span.end;
            }
        }
    }
}
