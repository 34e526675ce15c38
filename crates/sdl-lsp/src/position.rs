//! LSP positions are UTF-16 code units; `sdl-core` works in bytes.

use tower_lsp::lsp_types::{Position, Range};

/// Line `n` of `text`, without its line terminator. A trailing empty line
/// after a final `\n` counts as a line.
pub fn line_at(text: &str, n: usize) -> Option<&str> {
    text.split('\n').nth(n).map(|line| line.strip_suffix('\r').unwrap_or(line))
}

/// Byte offset in `line` of UTF-16 column `character`, clamped to the line.
pub fn byte_offset(line: &str, character: u32) -> usize {
    let mut units = 0u32;
    for (idx, ch) in line.char_indices() {
        if units >= character {
            return idx;
        }
        units += ch.len_utf16() as u32;
    }
    line.len()
}

/// UTF-16 column of byte offset `byte` in `line`.
pub fn utf16_column(line: &str, byte: usize) -> u32 {
    line.char_indices()
        .take_while(|(idx, _)| *idx < byte)
        .map(|(_, ch)| ch.len_utf16() as u32)
        .sum()
}

/// LSP range for a byte span within one line.
pub fn line_range(line_number: usize, line: &str, span: std::ops::Range<usize>) -> Range {
    let line_number = line_number as u32;
    Range {
        start: Position::new(line_number, utf16_column(line, span.start)),
        end: Position::new(line_number, utf16_column(line, span.end)),
    }
}

/// LSP position of byte `offset` in the whole document.
pub fn document_position(text: &str, offset: usize) -> Position {
    let offset = offset.min(text.len());
    let before = &text[..floor_char_boundary(text, offset)];
    let line = before.matches('\n').count() as u32;
    let line_start = before.rfind('\n').map_or(0, |idx| idx + 1);
    Position::new(line, utf16_column(&text[line_start..], offset - line_start))
}

fn floor_char_boundary(text: &str, mut offset: usize) -> usize {
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}
