//! Hover: schema documentation for the directive or argument under the cursor.
//!
//! - Hovering `!name` → directive description and examples.
//! - Hovering `--key=value` → argument type, default, range and allowed values.

use crate::position::{byte_offset, line_at, line_range};
use sdl_core::adapter::{AdapterSet, CommandContext, attribute_documentation, directive_documentation};
use sdl_core::lexer::{TokenKind, tokenize_in_block};
use sdl_core::schema::{self, ITEMS_KEY};
use tower_lsp::lsp_types::*;

/// Compute hover information at the given position.
pub fn compute_hover(adapters: &AdapterSet, text: &str, pos: Position) -> Option<Hover> {
    let line_number = pos.line as usize;
    let line = line_at(text, line_number)?;
    let ctx = CommandContext::from_document(text, line_number, byte_offset(line, pos.character))?;

    let tokens = tokenize_in_block(ctx.line_content, ctx.block_depth);
    let idx = tokens
        .iter()
        .position(|t| t.span.start <= ctx.cursor && ctx.cursor < t.span.end)?;
    let token = &tokens[idx];

    let info = match &token.kind {
        TokenKind::Directive { name, .. } => {
            let dir = schema::lookup(name)?;
            format!("**{}{}**\n\n{}", dir.prefix.as_str(), dir.name(), directive_documentation(dir))
        }
        TokenKind::Attribute { key, .. } | TokenKind::BlockOpen { key } => {
            let owner = adapters.adapter_at(&ctx)?.directive();
            if key == ITEMS_KEY && matches!(token.kind, TokenKind::BlockOpen { .. }) {
                format!("**--{ITEMS_KEY}** on `!{}`\n\nNested components, separated by commas.", owner.name())
            } else {
                let spec = owner.attribute(key)?;
                format!(
                    "**--{}** on `!{}`\n\n{}",
                    spec.name,
                    owner.name(),
                    attribute_documentation(spec)
                )
            }
        }
        _ => return None,
    };

    Some(make_hover(&info, line_range(line_number, line, token.span.clone())))
}

fn make_hover(content: &str, range: Range) -> Hover {
    Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value: content.to_string(),
        }),
        range: Some(range),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hover_text(text: &str, line: u32, character: u32) -> Option<String> {
        let adapters = AdapterSet::new().unwrap();
        compute_hover(&adapters, text, Position::new(line, character)).map(|hover| match hover.contents {
            HoverContents::Markup(markup) => markup.value,
            other => panic!("unexpected hover contents {other:?}"),
        })
    }

    #[test]
    fn hover_on_directive() {
        let info = hover_text("!image --src=a.png", 0, 2).unwrap();
        assert!(info.starts_with("**!image**"));
    }

    #[test]
    fn hover_on_alias_shows_canonical_argument() {
        let info = hover_text("!text --size=40", 0, 8).unwrap();
        assert!(info.starts_with("**--fontSize** on `!text`"));
        assert!(info.contains("range `8..400`"));
    }

    #[test]
    fn hover_resolves_nested_owner() {
        let text = "!section --gap=2 --items=(\n  !video --src=a.mp4 --muted=true\n)";
        let info = hover_text(text, 1, 24).unwrap();
        assert!(info.starts_with("**--muted** on `!video`"));
        let info = hover_text(text, 0, 20).unwrap();
        assert!(info.starts_with("**--items** on `!section`"));
    }

    #[test]
    fn hover_on_unknown_returns_none() {
        assert!(hover_text("!text --sparkle=1", 0, 9).is_none());
        assert!(hover_text("# just a comment", 0, 4).is_none());
        assert!(hover_text("!text", 3, 0).is_none());
    }
}
