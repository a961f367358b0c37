//! Structural characters and plain-text helpers.

/// Ends a block.
pub const PARAGRAPH_SEPARATOR: char = '\u{2029}';
/// Hard line break inside a block.
pub const LINE_SEPARATOR: char = '\u{2028}';
/// Opens a frame or a table cell.
pub const FRAME_BEGIN: char = '\u{FDD0}';
/// Closes a frame or a table.
pub const FRAME_END: char = '\u{FDD1}';
/// Stands in for an inline object such as an image.
pub const OBJECT_REPLACEMENT: char = '\u{FFFC}';
/// Non-breaking space.
pub const NBSP: char = '\u{00A0}';

/// Returns `true` for characters that terminate a block.
pub fn is_block_separator(c: char) -> bool {
    matches!(c, PARAGRAPH_SEPARATOR | FRAME_BEGIN | FRAME_END)
}

/// Split text into the contents of consecutive blocks. `\n`, `\r\n`, `\r`
/// and the structural separators all end a block.
pub(crate) fn split_blocks(text: &str) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                pieces.push(std::mem::take(&mut current));
            }
            '\n' => pieces.push(std::mem::take(&mut current)),
            c if is_block_separator(c) => pieces.push(std::mem::take(&mut current)),
            c => current.push(c),
        }
    }
    pieces.push(current);
    pieces
}

/// Map structural characters to their plain-text rendition.
pub(crate) fn to_plain(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            PARAGRAPH_SEPARATOR | LINE_SEPARATOR | FRAME_BEGIN | FRAME_END => '\n',
            NBSP => ' ',
            c => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_blocks_handles_all_newlines() {
        assert_eq!(split_blocks("a\r\nb\rc\nd"), vec!["a", "b", "c", "d"]);
        assert_eq!(split_blocks("tail\n"), vec!["tail", ""]);
    }

    #[test]
    fn test_split_blocks_on_frame_markers() {
        assert_eq!(split_blocks("x\u{FDD0}y\u{2029}z"), vec!["x", "y", "z"]);
    }

    #[test]
    fn test_to_plain() {
        assert_eq!(to_plain("a\u{2029}b\u{2028}c\u{a0}d"), "a\nb\nc d");
    }
}
