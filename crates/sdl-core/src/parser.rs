//! Document parser: SDL text → [`SceneDocument`].
//!
//! A document is a sequence of blocks. Most blocks are one line; a section
//! whose `--items=(` is left open continues on the following lines until
//! its parentheses balance. Lines starting with `#` are comments unless the
//! `#` is followed by a directive (`# !!scene ...`).
//!
//! Parsing a document never fails. A block with a structural error is
//! recorded as [`DocumentError::Structural`] and skipped; recovered problems
//! become [`DocumentError::Validation`].

use crate::config::SdlConfig;
use crate::directive::{coerce_record, default_record};
use crate::error::{SdlError, SdlResult};
use crate::lexer::{Prefix, Token, TokenKind, depth_after, is_scene_marker, tokenize};
use crate::model::{DirectiveKind, DocumentError, ParsedComponent, SceneDocument};
use crate::scanner::attributes_of;
use crate::schema;
use crate::section::{self, split_siblings, top_level_blocks};

/// One parsed component plus its recovered validation problems.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentResult {
    pub component: ParsedComponent,
    pub errors: Vec<String>,
}

type ComponentParser = fn(&[Token], &SdlConfig) -> SdlResult<ComponentResult>;

/// Component parser for `kind`.
pub fn parser_for(kind: DirectiveKind) -> ComponentParser {
    match kind {
        DirectiveKind::Section => section::parse_section_tokens,
        DirectiveKind::Scene
        | DirectiveKind::Text
        | DirectiveKind::Image
        | DirectiveKind::Video
        | DirectiveKind::Transition => parse_leaf_tokens,
    }
}

/// Parse a single directive line of any kind.
///
/// # Errors
/// Structural problems: no leading directive, an unknown directive name, or
/// unbalanced parentheses.
pub fn parse_component(input: &str, config: &SdlConfig) -> SdlResult<ComponentResult> {
    let tokens = tokenize(input);
    let siblings = split_siblings(&tokens)?;
    let Some(first) = siblings.first() else {
        return Err(SdlError::MissingDirective {
            expected: "!<directive>",
            offset: 0,
        });
    };
    let mut result = parse_component_tokens(first, config)?;
    for extra in &siblings[1..] {
        if let Some(token) = extra.first() {
            result
                .errors
                .push(format!("Ignoring extra input at offset {}", token.span.start));
        }
    }
    Ok(result)
}

/// Dispatch a token slice that starts with a directive to its parser.
pub(crate) fn parse_component_tokens(tokens: &[Token], config: &SdlConfig) -> SdlResult<ComponentResult> {
    let Some(first) = tokens.first() else {
        return Err(SdlError::MissingDirective {
            expected: "!<directive>",
            offset: 0,
        });
    };
    let Some(name) = first.directive_name() else {
        return Err(SdlError::MissingDirective {
            expected: "!<directive>",
            offset: first.span.start,
        });
    };
    let kind = DirectiveKind::from_name(name).ok_or_else(|| SdlError::UnknownDirective {
        name: name.to_string(),
        offset: first.span.start,
    })?;
    parser_for(kind)(tokens, config)
}

fn parse_leaf_tokens(tokens: &[Token], config: &SdlConfig) -> SdlResult<ComponentResult> {
    let kind = tokens
        .first()
        .and_then(Token::directive_name)
        .and_then(DirectiveKind::from_name)
        .ok_or(SdlError::MissingDirective {
            expected: "!<directive>",
            offset: tokens.first().map_or(0, |t| t.span.start),
        })?;

    let blocks = top_level_blocks(tokens)?;
    let parsed = coerce_record(schema::directive(kind), &attributes_of(&tokens[1..]), config);
    let mut errors = parsed.errors;
    errors.extend(stray_errors(tokens));
    for (open, _) in blocks {
        if let TokenKind::BlockOpen { key } = &tokens[open].kind {
            errors.push(format!("Unexpected (...) block: --{key}"));
        }
    }

    Ok(ComponentResult {
        component: ParsedComponent::new(kind, parsed.data),
        errors,
    })
}

/// One message per depth-0 stray token, e.g. `!text hello --content=a`.
pub(crate) fn stray_errors(tokens: &[Token]) -> Vec<String> {
    let mut depth = 0usize;
    let mut errors = Vec::new();
    for token in tokens {
        match &token.kind {
            TokenKind::BlockOpen { .. } => depth += 1,
            TokenKind::BlockClose => depth = depth.saturating_sub(1),
            TokenKind::Stray(text) if depth == 0 => errors.push(format!("Ignoring stray `{text}`")),
            _ => {}
        }
    }
    errors
}

// ─── Documents ───────────────────────────────────────────────────────────

/// Parse a whole scene file.
#[must_use]
pub fn parse_document(input: &str, config: &SdlConfig) -> SceneDocument {
    let mut doc = SceneDocument {
        scene: default_record(schema::directive(DirectiveKind::Scene), config),
        components: Vec::new(),
        errors: Vec::new(),
    };
    let mut has_scene = false;
    let mut has_transition = false;

    for block in split_blocks(input) {
        let tokens = tokenize(&block.text);
        let line_of = |offset: usize| block.line + block.text[..offset.min(block.text.len())].matches('\n').count();

        let parsed = split_siblings(&tokens).and_then(|siblings| {
            siblings
                .into_iter()
                .map(|sibling| parse_sibling(&block.text, sibling, config))
                .collect::<SdlResult<Vec<_>>>()
        });
        let siblings = match parsed {
            Ok(siblings) => siblings,
            Err(error) => {
                let line = error.offset().map_or(block.line, line_of);
                log::debug!("structural error on line {}: {error}", line + 1);
                doc.errors.push(DocumentError::Structural { line, error });
                continue;
            }
        };

        for sibling in siblings {
            let (line, outcome) = match sibling {
                Sibling::Orphan { offset, text } => {
                    doc.errors.push(DocumentError::Validation {
                        line: line_of(offset),
                        message: format!("Ignoring `{text}` outside a directive"),
                    });
                    continue;
                }
                Sibling::Component { offset, prefix, result } => {
                    let line = line_of(offset);
                    let kind = result.component.kind;
                    if prefix == Prefix::Scene && kind != DirectiveKind::Scene {
                        doc.errors.push(DocumentError::Validation {
                            line,
                            message: format!("`!!` is reserved for the scene directive; use `!{kind}`"),
                        });
                    }
                    (line, result)
                }
            };
            doc.errors.extend(
                outcome
                    .errors
                    .into_iter()
                    .map(|message| DocumentError::Validation { line, message }),
            );

            match outcome.component.kind {
                DirectiveKind::Scene if has_scene => doc.errors.push(DocumentError::Validation {
                    line,
                    message: "Duplicate scene directive; keeping the first".into(),
                }),
                DirectiveKind::Scene => {
                    has_scene = true;
                    doc.scene = outcome.component.data;
                }
                DirectiveKind::Transition if has_transition => doc.errors.push(DocumentError::Validation {
                    line,
                    message: "Only one transition per scene; ignoring this one".into(),
                }),
                DirectiveKind::Transition => {
                    has_transition = true;
                    doc.components.push(outcome.component);
                }
                _ => doc.components.push(outcome.component),
            }
        }
    }

    doc
}

enum Sibling {
    Orphan {
        offset: usize,
        text: String,
    },
    Component {
        offset: usize,
        prefix: Prefix,
        result: ComponentResult,
    },
}

fn parse_sibling(source: &str, tokens: &[Token], config: &SdlConfig) -> SdlResult<Sibling> {
    let (Some(first), Some(last)) = (tokens.first(), tokens.last()) else {
        return Err(SdlError::MissingDirective {
            expected: "!<directive>",
            offset: 0,
        });
    };
    match &first.kind {
        TokenKind::Directive { prefix, .. } => Ok(Sibling::Component {
            offset: first.span.start,
            prefix: *prefix,
            result: parse_component_tokens(tokens, config)?,
        }),
        _ => Ok(Sibling::Orphan {
            offset: first.span.start,
            text: source[first.span.start..last.span.end].trim().to_string(),
        }),
    }
}

// ─── Block splitting ─────────────────────────────────────────────────────

/// A run of source lines parsed as one unit.
#[derive(Debug, PartialEq)]
struct Block {
    /// Zero-based line of the first line in the block.
    line: usize,
    text: String,
}

/// Group lines into blocks, joining lines while a `--key=(` block is open.
fn split_blocks(input: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut open: Option<Block> = None;

    for (idx, line) in input.lines().enumerate() {
        let block = match open.take() {
            Some(mut block) => {
                block.text.push('\n');
                block.text.push_str(line);
                block
            }
            None if is_comment_or_blank(line) => continue,
            None => Block {
                line: idx,
                text: line.to_string(),
            },
        };
        if depth_after(&block.text, 0) == 0 {
            blocks.push(block);
        } else {
            open = Some(block);
        }
    }

    // An unclosed block at end of input still goes to the parser, which
    // reports the imbalance.
    blocks.extend(open);
    blocks
}

fn is_comment_or_blank(line: &str) -> bool {
    let trimmed = line.trim();
    match trimmed.strip_prefix('#') {
        Some(rest) => !is_scene_marker(rest),
        None => trimmed.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Value;
    use pretty_assertions::assert_eq;

    fn doc(input: &str) -> SceneDocument {
        parse_document(input, &SdlConfig::default())
    }

    #[test]
    fn parse_minimal_document() {
        let d = doc("# !!scene --duration=8 --background=black\n!text --content=\"Hi\"\n");
        assert!(d.errors.is_empty(), "{:?}", d.errors);
        assert_eq!(d.scene["duration"], Value::Number(8.0));
        assert_eq!(d.components.len(), 1);
        assert_eq!(d.components[0].kind, DirectiveKind::Text);
    }

    #[test]
    fn parse_empty_document() {
        let d = doc("");
        assert!(d.components.is_empty());
        assert_eq!(d.scene["duration"], Value::Number(5.0));
        assert_eq!(d.scene["background"], Value::from("transparent"));
    }

    #[test]
    fn comments_are_skipped() {
        let d = doc("# a comment\n# another\n!image --src=a.png\n");
        assert_eq!(d.components.len(), 1);
        assert!(d.errors.is_empty());
    }

    #[test]
    fn commented_out_component_stays_commented() {
        let d = doc("# !text --content=old\n!text --content=new\n#!image --src=a.png\n");
        assert!(d.errors.is_empty(), "{:?}", d.errors);
        assert_eq!(d.components.len(), 1);
        assert_eq!(d.components[0].get("content"), Some(&Value::from("new")));
    }

    #[test]
    fn composer_scene_line_is_accepted() {
        let d = doc("# !scene --duration=3\n");
        assert_eq!(d.scene["duration"], Value::Number(3.0));
        assert!(d.errors.is_empty());
    }

    #[test]
    fn multi_line_section() {
        let input = "!section --cols=2 --items=(\n  !text --content=A,\n  !text --content=B\n)\n!text --content=after\n";
        let d = doc(input);
        assert!(d.errors.is_empty(), "{:?}", d.errors);
        assert_eq!(d.components.len(), 2);
        assert_eq!(d.components[0].items().len(), 2);
    }

    #[test]
    fn structural_error_skips_block_only() {
        let d = doc("!text --content=ok\n!section --items=(!widget --x=1)\n!image --src=b.png\n");
        assert_eq!(d.components.len(), 2);
        assert_eq!(d.errors.len(), 1);
        assert!(d.errors[0].is_structural());
        assert_eq!(d.errors[0].line(), 1);
    }

    #[test]
    fn unclosed_section_reports_start_line() {
        let d = doc("!text --content=ok\n!section --items=(\n!text --content=x\n");
        assert_eq!(d.components.len(), 1);
        assert!(matches!(
            &d.errors[0],
            DocumentError::Structural { line: 1, error: SdlError::UnbalancedBlock { depth: 1, .. } }
        ));
    }

    #[test]
    fn validation_errors_carry_lines() {
        let d = doc("!!scene\n!text --size=12\n");
        assert_eq!(
            d.errors,
            vec![DocumentError::Validation {
                line: 1,
                message: "Missing required field: content".into()
            }]
        );
    }

    #[test]
    fn second_transition_is_ignored() {
        let d = doc("!transition --type=fade\n!transition --type=wipe\n");
        let transitions: Vec<_> = d.components_of(DirectiveKind::Transition).collect();
        assert_eq!(transitions.len(), 1);
        assert_eq!(transitions[0].get("type"), Some(&Value::from("fade")));
        assert_eq!(d.errors.len(), 1);
    }

    #[test]
    fn duplicate_scene_keeps_first() {
        let d = doc("!!scene --duration=2\n!!scene --duration=9\n");
        assert_eq!(d.scene["duration"], Value::Number(2.0));
        assert_eq!(d.errors.len(), 1);
    }

    #[test]
    fn double_bang_on_component_is_flagged() {
        let d = doc("!!text --content=x\n");
        assert_eq!(d.components.len(), 1);
        assert_eq!(d.errors.len(), 1);
    }

    #[test]
    fn orphan_attributes_are_reported() {
        let d = doc("--content=loose\n!text --content=x\n");
        assert_eq!(d.components.len(), 1);
        assert_eq!(
            d.errors,
            vec![DocumentError::Validation {
                line: 0,
                message: "Ignoring `--content=loose` outside a directive".into()
            }]
        );
    }

    #[test]
    fn stray_words_are_reported() {
        let d = doc("!text hello --content=x\n");
        assert_eq!(d.components.len(), 1);
        assert_eq!(
            d.errors,
            vec![DocumentError::Validation {
                line: 0,
                message: "Ignoring stray `hello`".into()
            }]
        );
    }

    #[test]
    fn two_directives_on_one_line() {
        let d = doc("!text --content=a !image --src=b.png\n");
        assert_eq!(d.components.len(), 2);
    }

    #[test]
    fn parse_component_dispatches_by_name() {
        let config = SdlConfig::default();
        let r = parse_component("!transition --type=zoom", &config).unwrap();
        assert_eq!(r.component.kind, DirectiveKind::Transition);
        let err = parse_component("!sparkle --x=1", &config).unwrap_err();
        assert!(matches!(err, SdlError::UnknownDirective { .. }));
    }

    #[test]
    fn block_splitting_joins_open_lines() {
        let blocks = split_blocks("!section --items=(\n!text --content=a\n)\n\n# note\n!text --content=b");
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].line, 0);
        assert_eq!(blocks[1].line, 5);
    }
}
