//! Tokenizer for SDL directive text.
//!
//! One linear pass turns a line (or a multi-line section block) into
//! directive, attribute, block and delimiter tokens. Quoted values are
//! single tokens, so parentheses and commas inside quotes never change the
//! block depth. Built on `winnow` 0.7 for the small fixed-shape pieces.
//!
//! The tokenizer never fails: anything it cannot classify becomes a
//! [`TokenKind::Stray`] token and the parsers decide what to do with it.

use crate::model::DirectiveKind;
use std::fmt;
use winnow::error::ContextError;
use winnow::prelude::*;
use winnow::token::{take_till, take_while};

/// Byte range into the tokenized input.
pub type Span = std::ops::Range<usize>;

/// Directive prefix: `!` for components, `!!` for the scene line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prefix {
    Inline,
    Scene,
}

impl Prefix {
    pub fn as_str(self) -> &'static str {
        match self {
            Prefix::Inline => "!",
            Prefix::Scene => "!!",
        }
    }
}

/// An attribute value exactly as written, before schema coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// `"..."`, with escapes already resolved.
    Quoted(String),
    /// A bare token: number, boolean, or unquoted symbol.
    Bare(String),
    /// A `[a, b, c]` array literal.
    List(Vec<String>),
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Quoted(s) | RawValue::Bare(s) => f.write_str(s),
            RawValue::List(items) => write!(f, "[{}]", items.join(",")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// `!name` or `!!name`.
    Directive { prefix: Prefix, name: String },
    /// `--key=value`. `value` is `None` for `--key=` or `--key` with nothing usable.
    Attribute {
        key: String,
        key_span: Span,
        value: Option<RawValue>,
        value_span: Span,
    },
    /// `--key=(`, the opening of a nested block.
    BlockOpen { key: String },
    /// `)` closing a nested block.
    BlockClose,
    /// `,` between siblings.
    Delimiter,
    /// Anything else, up to the next whitespace.
    Stray(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn directive_name(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Directive { name, .. } => Some(name),
            _ => None,
        }
    }
}

// ─── Entry point ─────────────────────────────────────────────────────────

/// Tokenize SDL text in a single pass.
#[must_use]
pub fn tokenize(source: &str) -> Vec<Token> {
    tokenize_in_block(source, 0)
}

/// Tokenize text that starts inside `depth` open `--key=(` blocks, such as
/// one line from the middle of a multi-line section.
#[must_use]
pub fn tokenize_in_block(source: &str, depth: usize) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut rest = source;
    let mut depth = depth;

    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            break;
        }
        let start = source.len() - rest.len();

        let kind = if rest.starts_with('#') {
            if is_scene_marker(&rest[1..]) {
                // Scene line: `# !!scene`
                rest = &rest[1..];
                continue;
            }
            let _ = take_till::<_, _, ContextError>(0.., '\n').parse_next(&mut rest);
            continue;
        } else if rest.starts_with('!') {
            lex_directive(&mut rest, depth)
        } else if rest.starts_with("--") {
            lex_attribute(source, &mut rest, depth)
        } else if rest.starts_with(')') {
            rest = &rest[1..];
            depth = depth.saturating_sub(1);
            TokenKind::BlockClose
        } else if rest.starts_with(',') {
            rest = &rest[1..];
            TokenKind::Delimiter
        } else {
            lex_stray(&mut rest, depth)
        };

        if matches!(kind, TokenKind::BlockOpen { .. }) {
            depth += 1;
        }
        if let TokenKind::Stray(ref s) = kind {
            log::trace!("stray token `{s}` at offset {start}");
        }

        let end = source.len() - rest.len();
        tokens.push(Token {
            kind,
            span: start..end,
        });
    }

    tokens
}

/// Whether the text after a `#` is a scene directive (`# !scene`,
/// `# !!scene`). Any other `#` starts a comment, including `# !text ...`.
pub fn is_scene_marker(after_hash: &str) -> bool {
    let mut rest = after_hash.trim_start();
    if take_while::<_, _, ContextError>(1..=2, '!').parse_next(&mut rest).is_err() {
        return false;
    }
    parse_identifier(&mut rest).is_ok_and(|name| name == DirectiveKind::Scene.name())
}

/// Number of `(` blocks open after `source`, starting from `depth`.
pub fn depth_after(source: &str, depth: usize) -> usize {
    tokenize_in_block(source, depth)
        .iter()
        .fold(depth, |depth, token| match token.kind {
            TokenKind::BlockOpen { .. } => depth + 1,
            TokenKind::BlockClose => depth.saturating_sub(1),
            _ => depth,
        })
}

// ─── Token lexers ────────────────────────────────────────────────────────

fn parse_identifier<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-').parse_next(input)
}

fn lex_directive(rest: &mut &str, depth: usize) -> TokenKind {
    let checkpoint = *rest;
    let bangs: &str = take_while::<_, _, ContextError>(1.., '!')
        .parse_next(rest)
        .unwrap_or_default();
    let prefix = match bangs.len() {
        1 => Some(Prefix::Inline),
        2 => Some(Prefix::Scene),
        _ => None,
    };

    match (prefix, parse_identifier.parse_next(rest)) {
        (Some(prefix), Ok(name)) => TokenKind::Directive {
            prefix,
            name: name.to_string(),
        },
        _ => {
            *rest = checkpoint;
            lex_stray(rest, depth)
        }
    }
}

fn lex_attribute(source: &str, rest: &mut &str, depth: usize) -> TokenKind {
    let offset = |rest: &str| source.len() - rest.len();

    *rest = &rest[2..];
    let key_start = offset(*rest);
    let Ok(key) = parse_identifier.parse_next(rest) else {
        let tail = take_bare(rest, depth);
        return TokenKind::Stray(format!("--{tail}"));
    };
    let key = key.to_string();
    let key_span = key_start..offset(*rest);

    if !rest.starts_with('=') {
        let at = offset(*rest);
        return TokenKind::Attribute {
            key,
            key_span,
            value: None,
            value_span: at..at,
        };
    }
    *rest = &rest[1..];

    if rest.starts_with('(') {
        *rest = &rest[1..];
        return TokenKind::BlockOpen { key };
    }

    let value_start = offset(*rest);
    let value = if rest.starts_with('"') {
        match lex_quoted(rest) {
            Some(s) => Some(RawValue::Quoted(s)),
            None => {
                // Unterminated quote swallows the rest of the line.
                let _ = take_till::<_, _, ContextError>(0.., '\n').parse_next(rest);
                None
            }
        }
    } else if rest.starts_with('[') {
        let list = lex_list(rest);
        if list.is_none() {
            take_bare(rest, depth);
        }
        list.map(RawValue::List)
    } else {
        let bare = take_bare(rest, depth);
        (!bare.is_empty()).then(|| RawValue::Bare(bare.to_string()))
    };

    TokenKind::Attribute {
        key,
        key_span,
        value,
        value_span: value_start..offset(*rest),
    }
}

fn lex_stray(rest: &mut &str, depth: usize) -> TokenKind {
    let mut word = take_bare(rest, depth);
    if word.is_empty() {
        // A lone terminator character; consume it so the lexer always advances.
        let len = rest.chars().next().map_or(0, char::len_utf8);
        word = &rest[..len];
        *rest = &rest[len..];
    }
    TokenKind::Stray(word.to_string())
}

/// Bare tokens end at whitespace, and also at `,` / `)` inside a block.
fn take_bare<'a>(rest: &mut &'a str, depth: usize) -> &'a str {
    take_till::<_, _, ContextError>(0.., |c: char| {
        c.is_whitespace() || (depth > 0 && (c == ',' || c == ')'))
    })
    .parse_next(rest)
    .unwrap_or_default()
}

/// Parse `"..."` resolving `\"`, `\\` and `\n`. `None` if unterminated.
fn lex_quoted(rest: &mut &str) -> Option<String> {
    let body = rest.strip_prefix('"')?;
    let mut out = String::new();
    let mut chars = body.char_indices();

    while let Some((i, c)) = chars.next() {
        match c {
            '"' => {
                *rest = &body[i + 1..];
                return Some(out);
            }
            '\\' => match chars.next() {
                Some((_, 'n')) => out.push('\n'),
                Some((_, escaped)) => out.push(escaped),
                None => break,
            },
            _ => out.push(c),
        }
    }
    None
}

/// Parse a `[a, "b c", 3]` literal into its raw item strings.
fn lex_list(rest: &mut &str) -> Option<Vec<String>> {
    let body = rest.strip_prefix('[')?;
    let mut items = Vec::new();
    let mut cursor = body;

    loop {
        cursor = cursor.trim_start();
        if let Some(after) = cursor.strip_prefix(']') {
            *rest = after;
            return Some(items);
        }
        if cursor.starts_with('"') {
            items.push(lex_quoted(&mut cursor)?);
        } else {
            let item: &str = take_till::<_, _, ContextError>(1.., |c: char| c == ',' || c == ']')
                .parse_next(&mut cursor)
                .ok()?;
            let item = item.trim();
            if !item.is_empty() {
                items.push(item.to_string());
            }
        }
        cursor = cursor.trim_start();
        if let Some(after) = cursor.strip_prefix(',') {
            cursor = after;
        } else if !cursor.starts_with(']') {
            return None;
        }
    }
}
