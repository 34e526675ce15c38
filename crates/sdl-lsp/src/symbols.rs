//! Document symbols: an outline entry for every directive, nested ones included.

use crate::position::document_position;
use sdl_core::lexer::{RawValue, Token, TokenKind, tokenize};
use sdl_core::model::DirectiveKind;
use sdl_core::scanner::segments;
use tower_lsp::lsp_types::*;

/// Compute a flat symbol list for the document at `uri`.
///
/// Directives inside a section's `--items=(...)` carry the section as their
/// container name.
#[allow(deprecated)] // SymbolInformation::deprecated is deprecated but required
pub fn compute_symbols(uri: &Url, text: &str) -> Vec<SymbolInformation> {
    let tokens = tokenize(text);
    let mut containers: Vec<String> = Vec::new();
    let mut symbols = Vec::new();

    for segment in segments(&tokens) {
        let Some(kind) = DirectiveKind::from_name(segment.name) else {
            continue;
        };
        let name = symbol_name(kind, &segment.attributes);
        containers.truncate(segment.depth);

        let end = segment
            .attributes
            .last()
            .map_or(segment.directive.span.end, |attr| attr.span.end);
        symbols.push(SymbolInformation {
            name: name.clone(),
            kind: symbol_kind(kind),
            location: Location {
                uri: uri.clone(),
                range: Range {
                    start: document_position(text, segment.directive.span.start),
                    end: document_position(text, end),
                },
            },
            tags: None,
            deprecated: None,
            container_name: segment.depth.checked_sub(1).and_then(|d| containers.get(d).cloned()),
        });

        if kind == DirectiveKind::Section {
            containers.resize(segment.depth, String::new());
            containers.push(name);
        }
    }

    symbols
}

/// `text "Hello"`, `image logo.png`, or just the directive name.
fn symbol_name(kind: DirectiveKind, attributes: &[&Token]) -> String {
    let label_key = match kind {
        DirectiveKind::Text => Some("content"),
        DirectiveKind::Image | DirectiveKind::Video => Some("src"),
        DirectiveKind::Transition => Some("type"),
        DirectiveKind::Scene => Some("title"),
        DirectiveKind::Section => None,
    };
    let label = label_key.and_then(|wanted| {
        attributes.iter().rev().find_map(|token| match &token.kind {
            TokenKind::Attribute {
                key,
                value: Some(RawValue::Bare(v) | RawValue::Quoted(v)),
                ..
            } if key == wanted || (wanted == "title" && key == "name") => Some(v.as_str()),
            _ => None,
        })
    });

    match label {
        Some(label) if kind == DirectiveKind::Text => format!("{kind} \"{}\"", truncate(label, 32)),
        Some(label) => format!("{kind} {}", truncate(label, 32)),
        None => kind.to_string(),
    }
}

fn symbol_kind(kind: DirectiveKind) -> SymbolKind {
    match kind {
        DirectiveKind::Scene => SymbolKind::MODULE,
        DirectiveKind::Section => SymbolKind::NAMESPACE,
        DirectiveKind::Text => SymbolKind::STRING,
        DirectiveKind::Transition => SymbolKind::EVENT,
        DirectiveKind::Image | DirectiveKind::Video => SymbolKind::FILE,
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &s[..idx]),
        None => s.to_string(),
    }
}
