//! Rope-based conversions between byte offsets and LSP positions.
//!
//! Mapping records and service spans work in byte offsets; the editor talks
//! in line/character positions. All conversions go through a [`Rope`] so
//! multi-byte characters are handled consistently.

use ropey::Rope;
use std::ops::Range;
use tower_lsp::lsp_types::Position;

/// Converts a byte offset into an LSP position, clamping past-the-end
/// offsets to the end of the text.
pub fn position_at(rope: &Rope, byte_offset: usize) -> Position {
    let byte = byte_offset.min(rope.len_bytes());
    let char_idx = rope.byte_to_char(byte);
    let line = rope.char_to_line(char_idx);
    let character = char_idx - rope.line_to_char(line);

    Position {
        line: line as u32,
        character: character as u32,
    }
}

/// Converts an LSP position into a byte offset.
///
/// Returns `None` when the line does not exist; a character offset past the
/// end of its line clamps to the line end.
pub fn offset_at(rope: &Rope, position: Position) -> Option<usize> {
    let line = position.line as usize;
    if line >= rope.len_lines() {
        return None;
    }

    let line_start = rope.line_to_char(line);
    let line_end = if line + 1 < rope.len_lines() {
        rope.line_to_char(line + 1)
    } else {
        rope.len_chars()
    };
    let char_idx = (line_start + position.character as usize).min(line_end);

    Some(rope.char_to_byte(char_idx))
}

/// Converts a half-open byte range into an LSP range.
pub fn range_from_span(rope: &Rope, span: Range<usize>) -> tower_lsp::lsp_types::Range {
    tower_lsp::lsp_types::Range {
        start: position_at(rope, span.start),
        end: position_at(rope, span.end),
    }
}
