//! Completions: adapter suggestions → LSP completion items.

use crate::position::{byte_offset, line_at, line_range};
use sdl_core::adapter::{self, AdapterSet, CommandContext};
use tower_lsp::lsp_types::*;

/// Compute completions at the given cursor position.
pub fn compute_completions(adapters: &AdapterSet, text: &str, pos: Position) -> Vec<CompletionItem> {
    let line_number = pos.line as usize;
    let Some(line) = line_at(text, line_number) else {
        return Vec::new();
    };
    let Some(ctx) = CommandContext::from_document(text, line_number, byte_offset(line, pos.character)) else {
        return Vec::new();
    };

    adapters
        .provide_completions(&ctx)
        .into_iter()
        .enumerate()
        .map(|(idx, item)| to_lsp_item(item, idx, line_number, line))
        .collect()
}

fn to_lsp_item(item: adapter::CompletionItem, idx: usize, line_number: usize, line: &str) -> CompletionItem {
    let kind = match item.kind {
        adapter::CompletionKind::Directive => CompletionItemKind::KEYWORD,
        adapter::CompletionKind::Argument => CompletionItemKind::PROPERTY,
        adapter::CompletionKind::Value => CompletionItemKind::VALUE,
    };
    CompletionItem {
        label: item.label,
        kind: Some(kind),
        documentation: (!item.documentation.is_empty()).then(|| {
            Documentation::MarkupContent(MarkupContent {
                kind: MarkupKind::Markdown,
                value: item.documentation,
            })
        }),
        // Keep schema order instead of the editor's alphabetical sort.
        sort_text: Some(format!("{idx:03}")),
        filter_text: Some(line[item.replace_range.clone()].to_string()).filter(|s| !s.is_empty()),
        text_edit: Some(CompletionTextEdit::Edit(TextEdit {
            range: line_range(line_number, line, item.replace_range),
            new_text: item.insert_text,
        })),
        command: item.retrigger.then(|| Command {
            title: "Suggest".to_string(),
            command: "editor.action.triggerSuggest".to_string(),
            arguments: None,
        }),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn complete(text: &str, line: u32, character: u32) -> Vec<CompletionItem> {
        let adapters = AdapterSet::new().unwrap();
        compute_completions(&adapters, text, Position::new(line, character))
    }

    fn labels(items: &[CompletionItem]) -> Vec<&str> {
        items.iter().map(|i| i.label.as_str()).collect()
    }

    #[test]
    fn bang_offers_directives() {
        let items = complete("!!scene\n!", 1, 1);
        assert_eq!(items.len(), 6);
        assert_eq!(items[1].label, "!text");
        assert_eq!(items[1].kind, Some(CompletionItemKind::KEYWORD));
        assert!(items[1].command.is_some());
    }

    #[test]
    fn argument_edit_replaces_partial() {
        let items = complete("!transition --ty", 0, 16);
        assert_eq!(labels(&items), vec!["--type"]);
        let Some(CompletionTextEdit::Edit(edit)) = &items[0].text_edit else {
            panic!("expected a text edit");
        };
        assert_eq!(edit.new_text, "--type=");
        assert_eq!(edit.range.start, Position::new(0, 12));
        assert_eq!(edit.range.end, Position::new(0, 16));
    }

    #[test]
    fn value_items_do_not_retrigger() {
        let items = complete("!transition --easing=", 0, 21);
        assert_eq!(
            labels(&items),
            vec!["linear", "ease-in", "ease-out", "ease-in-out", "spring"]
        );
        assert!(items.iter().all(|i| i.command.is_none()));
    }

    #[test]
    fn utf16_cursor_after_multibyte_text() {
        // `é` is one UTF-16 unit but two bytes.
        let text = "!text --content=é --po";
        let items = complete(text, 0, 22);
        assert_eq!(labels(&items), vec!["--position"]);
        let Some(CompletionTextEdit::Edit(edit)) = &items[0].text_edit else {
            panic!("expected a text edit");
        };
        assert_eq!(edit.range.start, Position::new(0, 18));
    }

    #[test]
    fn nested_line_offers_only_nestable_directives() {
        let items = complete("!section --items=(\n  !", 1, 3);
        assert_eq!(labels(&items), vec!["!text", "!image", "!video", "!section"]);
    }

    #[test]
    fn past_end_of_document_is_empty() {
        assert!(complete("!text", 4, 0).is_empty());
    }
}
