//! Section parser: the one recursive directive.
//!
//! `!section --cols=2 --items=(!text --content=A, !section --items=(...))`
//!
//! Works on the token stream from [`crate::lexer`]. Finding the end of an
//! `--items=(` block and splitting its body into siblings are both single
//! linear depth-counting scans over tokens. Siblings are separated either by
//! a depth-0 comma or by the next depth-0 directive; both forms parse the
//! same way.

use crate::config::SdlConfig;
use crate::directive::coerce_record;
use crate::error::{SdlError, SdlResult};
use crate::lexer::{Token, TokenKind, tokenize};
use crate::model::{DirectiveKind, ParsedComponent, Value};
use crate::parser::{ComponentResult, parse_component_tokens, stray_errors};
use crate::scanner::attributes_of;
use crate::schema::{self, ITEMS_KEY};

/// Parse a `!section` directive and everything nested in it.
///
/// # Errors
/// Structural problems only: input not starting with `!section`,
/// unbalanced parentheses, or an unknown or disallowed child directive.
pub fn parse_section(input: &str, config: &SdlConfig) -> SdlResult<ComponentResult> {
    let tokens = tokenize(input);
    match tokens.first() {
        Some(first) if first.directive_name() == Some(DirectiveKind::Section.name()) => {}
        other => {
            return Err(SdlError::MissingDirective {
                expected: "!section",
                offset: other.map_or(0, |t| t.span.start),
            });
        }
    }

    let siblings = split_siblings(&tokens)?;
    if siblings.len() > 1 {
        log::debug!("ignoring {} trailing directive(s) after !section", siblings.len() - 1);
    }
    parse_section_tokens(siblings[0], config)
}

/// Parse one section from its own token slice. `tokens[0]` is the directive.
pub(crate) fn parse_section_tokens(tokens: &[Token], config: &SdlConfig) -> SdlResult<ComponentResult> {
    let blocks = top_level_blocks(tokens)?;
    build_section(tokens, &blocks, config)
}

fn build_section(
    tokens: &[Token],
    blocks: &[(usize, usize)],
    config: &SdlConfig,
) -> SdlResult<ComponentResult> {
    let dir = schema::directive(DirectiveKind::Section);
    let parsed = coerce_record(dir, &attributes_of(&tokens[1..]), config);
    let mut data = parsed.data;
    let mut errors = parsed.errors;
    errors.extend(stray_errors(tokens));
    let mut items: Option<Vec<ParsedComponent>> = None;

    for &(open, close) in blocks {
        let key = match &tokens[open].kind {
            TokenKind::BlockOpen { key } => key.as_str(),
            _ => continue,
        };
        if key != ITEMS_KEY {
            errors.push(format!("Unexpected (...) block: --{key}"));
            continue;
        }
        if items.is_some() {
            errors.push(format!("Duplicate --{ITEMS_KEY} block; keeping the first"));
            continue;
        }

        let mut children = Vec::new();
        for (idx, sibling) in split_siblings(&tokens[open + 1..close])?.into_iter().enumerate() {
            let Some(first) = sibling.first() else {
                continue;
            };
            let Some(name) = first.directive_name() else {
                errors.push(format!("{ITEMS_KEY}[{idx}]: expected a directive, found `{}`", describe(first)));
                continue;
            };
            match DirectiveKind::from_name(name) {
                None => {
                    return Err(SdlError::UnknownDirective {
                        name: name.to_string(),
                        offset: first.span.start,
                    });
                }
                Some(kind) if !kind.nests_in_section() => {
                    return Err(SdlError::NotAllowedInSection {
                        name: name.to_string(),
                        offset: first.span.start,
                    });
                }
                Some(_) => {}
            }
            let child = parse_component_tokens(sibling, config)?;
            errors.extend(
                child
                    .errors
                    .into_iter()
                    .map(|e| format!("{ITEMS_KEY}[{idx}] !{name}: {e}")),
            );
            children.push(child.component);
        }
        items = Some(children);
    }

    data.insert(ITEMS_KEY.to_string(), Value::Items(items.unwrap_or_default()));
    Ok(ComponentResult {
        component: ParsedComponent::new(DirectiveKind::Section, data),
        errors,
    })
}

// ─── Depth scanning ──────────────────────────────────────────────────────

/// Index of the `)` matching the block opened at `open`.
///
/// Depth starts at 1 after the opener and the match is the first token that
/// brings it back to 0.
pub fn find_block_end(tokens: &[Token], open: usize) -> SdlResult<usize> {
    let mut depth = 1usize;
    for (idx, token) in tokens.iter().enumerate().skip(open + 1) {
        match token.kind {
            TokenKind::BlockOpen { .. } => depth += 1,
            TokenKind::BlockClose => {
                depth -= 1;
                if depth == 0 {
                    return Ok(idx);
                }
            }
            _ => {}
        }
    }

    let key = match &tokens[open].kind {
        TokenKind::BlockOpen { key } => key.clone(),
        _ => String::new(),
    };
    Err(SdlError::UnbalancedBlock {
        key,
        depth,
        offset: tokens[open].span.start,
    })
}

/// `(open, close)` index pairs of every depth-0 block in `tokens`.
pub(crate) fn top_level_blocks(tokens: &[Token]) -> SdlResult<Vec<(usize, usize)>> {
    let mut blocks = Vec::new();
    let mut idx = 0;
    while idx < tokens.len() {
        match tokens[idx].kind {
            TokenKind::BlockOpen { .. } => {
                let close = find_block_end(tokens, idx)?;
                blocks.push((idx, close));
                idx = close + 1;
                continue;
            }
            TokenKind::BlockClose => {
                return Err(SdlError::UnexpectedClose {
                    offset: tokens[idx].span.start,
                });
            }
            _ => {}
        }
        idx += 1;
    }
    Ok(blocks)
}

/// Split a balanced token run into siblings.
///
/// A new sibling starts at every depth-0 directive and after every depth-0
/// comma. Tokens before the first directive form their own run so callers
/// can report them.
pub fn split_siblings(tokens: &[Token]) -> SdlResult<Vec<&[Token]>> {
    let mut siblings = Vec::new();
    let mut start: Option<usize> = None;
    let mut open_blocks: Vec<usize> = Vec::new();

    for (idx, token) in tokens.iter().enumerate() {
        let depth = open_blocks.len();
        match &token.kind {
            TokenKind::BlockOpen { .. } => open_blocks.push(idx),
            TokenKind::BlockClose => {
                if open_blocks.pop().is_none() {
                    return Err(SdlError::UnexpectedClose {
                        offset: token.span.start,
                    });
                }
            }
            TokenKind::Delimiter if depth == 0 => {
                if let Some(s) = start.take() {
                    siblings.push(&tokens[s..idx]);
                }
                continue;
            }
            TokenKind::Directive { .. } if depth == 0 => {
                if let Some(s) = start.replace(idx) {
                    siblings.push(&tokens[s..idx]);
                }
                continue;
            }
            _ => {}
        }
        if start.is_none() {
            start = Some(idx);
        }
    }

    if let Some(&outermost) = open_blocks.first() {
        let key = match &tokens[outermost].kind {
            TokenKind::BlockOpen { key } => key.clone(),
            _ => String::new(),
        };
        return Err(SdlError::UnbalancedBlock {
            key,
            depth: open_blocks.len(),
            offset: tokens[outermost].span.start,
        });
    }

    if let Some(s) = start {
        siblings.push(&tokens[s..]);
    }
    Ok(siblings)
}

fn describe(token: &Token) -> String {
    match &token.kind {
        TokenKind::Attribute { key, .. } | TokenKind::BlockOpen { key } => format!("--{key}"),
        TokenKind::Stray(s) => s.clone(),
        TokenKind::Directive { name, .. } => format!("!{name}"),
        TokenKind::BlockClose => ")".into(),
        TokenKind::Delimiter => ",".into(),
    }
}
