//! Attribute scanner: `--key=value` pairs out of a directive line.
//!
//! Built on the token stream from [`crate::lexer`]. The scanner only looks
//! at depth 0 of what it is given, so a section's `--items=(...)` body is
//! never mistaken for the section's own attributes.

use crate::lexer::{RawValue, Span, Token, TokenKind, tokenize};
use indexmap::IndexMap;

/// One scanned attribute with the spans diagnostics point at.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub key: String,
    pub value: RawValue,
    /// Whole `--key=value` token.
    pub span: Span,
    pub key_span: Span,
    pub value_span: Span,
}

/// Attribute name → attribute, in first-seen order. A repeated key keeps its
/// first position but takes the last value.
pub type AttributeMap = IndexMap<String, Attribute>;

/// Scan every depth-0 attribute in `line`.
///
/// Never fails: `--key=` with no usable value is left out so the caller
/// falls back to its default.
#[must_use]
pub fn scan_attributes(line: &str) -> AttributeMap {
    attributes_of(&tokenize(line))
}

/// Like [`scan_attributes`], with values flattened to their raw text.
#[must_use]
pub fn scan(line: &str) -> IndexMap<String, String> {
    scan_attributes(line)
        .into_iter()
        .map(|(key, attr)| (key, attr.value.to_string()))
        .collect()
}

/// Depth-0 attributes of an already tokenized fragment.
pub fn attributes_of(tokens: &[Token]) -> AttributeMap {
    let mut map = AttributeMap::new();
    let mut depth = 0usize;

    for token in tokens {
        match &token.kind {
            TokenKind::BlockOpen { .. } => depth += 1,
            TokenKind::BlockClose => depth = depth.saturating_sub(1),
            TokenKind::Attribute {
                key,
                key_span,
                value: Some(value),
                value_span,
            } if depth == 0 => {
                map.insert(
                    key.clone(),
                    Attribute {
                        key: key.clone(),
                        value: value.clone(),
                        span: token.span.clone(),
                        key_span: key_span.clone(),
                        value_span: value_span.clone(),
                    },
                );
            }
            _ => {}
        }
    }

    map
}

// ─── Segments ────────────────────────────────────────────────────────────

/// A directive token plus the attribute tokens that belong to it.
#[derive(Debug, Clone)]
pub struct Segment<'t> {
    pub directive: &'t Token,
    pub name: &'t str,
    /// Block nesting depth the directive sits at.
    pub depth: usize,
    /// Attribute tokens in source order, including ones without a value.
    pub attributes: Vec<&'t Token>,
}

/// Split a token stream into per-directive segments.
///
/// Attributes attach to the last directive at their own depth, so in
/// `!section --items=(!text --content=a) --gap=4` the `--gap` belongs to the
/// section and `--content` to the text.
pub fn segments(tokens: &[Token]) -> Vec<Segment<'_>> {
    let mut segments: Vec<Segment<'_>> = Vec::new();
    let mut owners: Vec<Option<usize>> = vec![None];
    let mut depth = 0usize;

    for token in tokens {
        match &token.kind {
            TokenKind::Directive { name, .. } => {
                owners[depth] = Some(segments.len());
                segments.push(Segment {
                    directive: token,
                    name,
                    depth,
                    attributes: Vec::new(),
                });
            }
            TokenKind::Attribute { .. } => {
                if let Some(idx) = owners[depth] {
                    segments[idx].attributes.push(token);
                }
            }
            TokenKind::BlockOpen { .. } => {
                depth += 1;
                owners.truncate(depth);
                owners.push(None);
            }
            TokenKind::BlockClose => {
                if depth > 0 {
                    owners.truncate(depth);
                    depth -= 1;
                }
            }
            TokenKind::Delimiter => owners[depth] = None,
            TokenKind::Stray(_) => {}
        }
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn scan_quoted_and_bare() {
        let attrs = scan(r#"--content="Hello World" --animate=fadeIn --duration=2"#);
        assert_eq!(attrs["content"], "Hello World");
        assert_eq!(attrs["animate"], "fadeIn");
        assert_eq!(attrs["duration"], "2");
    }

    #[test]
    fn last_occurrence_wins() {
        let attrs = scan("--size=10 --color=red --size=20");
        assert_eq!(attrs["size"], "20");
        let keys: Vec<&str> = attrs.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["size", "color"]);
    }

    #[test]
    fn malformed_key_is_omitted() {
        let attrs = scan("--content= --color=blue --muted");
        assert!(!attrs.contains_key("content"));
        assert!(!attrs.contains_key("muted"));
        assert_eq!(attrs["color"], "blue");
    }

    #[test]
    fn nested_block_is_not_scanned() {
        let attrs = scan("!section --gap=16 --items=(!text --content=inner --gap=3) --cols=2");
        assert_eq!(attrs["gap"], "16");
        assert_eq!(attrs["cols"], "2");
        assert!(!attrs.contains_key("content"));
        assert!(!attrs.contains_key("items"));
    }

    #[test]
    fn segments_attach_to_owning_directive() {
        let tokens = tokenize("!section --items=(!text --content=a, !image --src=b) --gap=4");
        let segs = segments(&tokens);
        let names: Vec<(&str, usize, usize)> = segs
            .iter()
            .map(|s| (s.name, s.depth, s.attributes.len()))
            .collect();
        assert_eq!(names, vec![("section", 0, 1), ("text", 1, 1), ("image", 1, 1)]);
    }
}
