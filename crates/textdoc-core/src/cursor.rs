//! Cursors and selections.
//!
//! A [`TextCursor`] is a position plus an anchor inside a mutably borrowed
//! [`TextDocument`]. All editing done by the copy helper and the HTML importer
//! goes through a cursor, the same way an interactive editor would drive the
//! document. [`DocumentSelection`] is the read-only counterpart used when a
//! document is only read (as the source of a copy).
//!
//! # Example
//!
//! ```rust
//! use textdoc_core::{MoveMode, MoveOperation, TextCursor, TextDocument};
//!
//! let mut doc = TextDocument::new();
//! let mut cursor = TextCursor::new(&mut doc);
//! cursor.insert_text("Hello World");
//! cursor.move_position(MoveOperation::StartOfBlock, MoveMode::MoveAnchor);
//! cursor.move_position(MoveOperation::EndOfBlock, MoveMode::KeepAnchor);
//! assert_eq!(cursor.selected_text(), "Hello World");
//! ```

use std::ops::{Range, RangeInclusive};

use unicode_segmentation::UnicodeSegmentation;

use crate::document::{DEFAULT_CHAR_FORMAT, TextDocument};
use crate::error::{Result, TextDocumentError};
use crate::format::{Format, FormatKind, FramePosition, ObjectIndex};
use crate::fragment::DocumentFragment;
use crate::structure::{Block, Frame, TableCell, TextList, TextTable};
use crate::text::{OBJECT_REPLACEMENT, PARAGRAPH_SEPARATOR};

/// Whether a move drags the anchor along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MoveMode {
    /// Collapse the selection at the new position.
    #[default]
    MoveAnchor,
    /// Keep the anchor and extend the selection.
    KeepAnchor,
}

/// Cursor movements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOperation {
    /// Start of the document.
    Start,
    /// End of the document (before the final separator).
    End,
    /// One grapheme cluster forward.
    NextCharacter,
    /// One grapheme cluster back.
    PreviousCharacter,
    /// Start of the current block.
    StartOfBlock,
    /// End of the current block.
    EndOfBlock,
    /// Start of the next block.
    NextBlock,
    /// Start of the previous block.
    PreviousBlock,
}

/// Rectangle of table cells covered by a complex selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    /// First row.
    pub first_row: usize,
    /// Number of rows.
    pub rows: usize,
    /// First column.
    pub first_column: usize,
    /// Number of columns.
    pub columns: usize,
}

/// Read-only selection over a document.
#[derive(Debug, Clone, Copy)]
pub struct DocumentSelection<'a> {
    doc: &'a TextDocument,
    position: usize,
    anchor: usize,
}

impl<'a> DocumentSelection<'a> {
    /// Selection from `anchor` to `position` (clamped to the document).
    pub fn new(doc: &'a TextDocument, anchor: usize, position: usize) -> Self {
        let max = doc.len() - 1;
        Self {
            doc,
            position: position.min(max),
            anchor: anchor.min(max),
        }
    }

    /// Everything but the final separator.
    pub fn whole_document(doc: &'a TextDocument) -> Self {
        Self::new(doc, 0, doc.len() - 1)
    }

    /// The document the selection reads from.
    pub fn document(&self) -> &'a TextDocument {
        self.doc
    }

    /// Moving end.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Fixed end.
    pub fn anchor(&self) -> usize {
        self.anchor
    }

    /// Returns `true` if anchor and position differ.
    pub fn has_selection(&self) -> bool {
        self.position != self.anchor
    }

    /// Smaller end.
    pub fn selection_start(&self) -> usize {
        self.position.min(self.anchor)
    }

    /// Larger end.
    pub fn selection_end(&self) -> usize {
        self.position.max(self.anchor)
    }

    /// Table of a complex selection: the innermost frame at the position is a
    /// table and the anchor lies in a different cell of it.
    pub fn current_table(&self) -> Option<TextTable<'a>> {
        self.doc.table_at(self.position)
    }

    fn complex_cells(&self) -> Option<(TextTable<'a>, TableCell, TableCell)> {
        if !self.has_selection() {
            return None;
        }
        let table = self.doc.frame_at(self.position)?.as_table()?;
        let at_position = table.cell_at_position(self.position)?;
        let at_anchor = table.cell_at_position(self.anchor)?;
        if at_position.marker_position == at_anchor.marker_position {
            return None;
        }
        Some((table, at_position, at_anchor))
    }

    /// Returns `true` if the ends lie in different cells of one table.
    pub fn has_complex_selection(&self) -> bool {
        self.complex_cells().is_some()
    }

    /// The cell rectangle spanned by the top-left slots of the two end cells.
    pub fn selected_table_cells(&self) -> Option<CellRange> {
        let (_, a, b) = self.complex_cells()?;
        let first_row = a.row.min(b.row);
        let first_column = a.column.min(b.column);
        Some(CellRange {
            first_row,
            rows: a.row.max(b.row) - first_row + 1,
            first_column,
            columns: a.column.max(b.column) - first_column + 1,
        })
    }

    /// Simple selection range widened so that no frame is cut in half.
    pub fn adjusted_range(&self) -> Range<usize> {
        let mut start = self.selection_start();
        let mut end = self.selection_end();
        if start == end {
            return start..end;
        }
        let frames = self.doc.frames();
        loop {
            let mut changed = false;
            for frame in &frames {
                let begin = frame.first_position() - 1;
                let last = frame.last_position();
                let holds = |p: usize| begin < p && p <= last;
                if holds(start) && !holds(end) && end > last {
                    start = begin;
                    changed = true;
                }
                if holds(end) && !holds(start) && start <= begin && end < last + 1 {
                    end = last + 1;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
        start..end
    }
}

/// An editing cursor.
pub struct TextCursor<'a> {
    doc: &'a mut TextDocument,
    position: usize,
    anchor: usize,
    char_format: Option<Format>,
}

impl std::fmt::Debug for TextCursor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextCursor")
            .field("position", &self.position)
            .field("anchor", &self.anchor)
            .finish()
    }
}

impl<'a> TextCursor<'a> {
    /// Cursor at the start of `doc`.
    pub fn new(doc: &'a mut TextDocument) -> Self {
        Self {
            doc,
            position: 0,
            anchor: 0,
            char_format: None,
        }
    }

    /// Cursor at `position`.
    pub fn at(doc: &'a mut TextDocument, position: usize) -> Result<Self> {
        let mut cursor = Self::new(doc);
        cursor.set_position(position, MoveMode::MoveAnchor)?;
        Ok(cursor)
    }

    /// The document being edited.
    pub fn document(&self) -> &TextDocument {
        self.doc
    }

    /// Mutable access to the document being edited.
    pub fn document_mut(&mut self) -> &mut TextDocument {
        self.doc
    }

    /// Current position.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Anchor position.
    pub fn anchor(&self) -> usize {
        self.anchor
    }

    /// Move to `position`.
    pub fn set_position(&mut self, position: usize, mode: MoveMode) -> Result<()> {
        if position >= self.doc.len() {
            return Err(TextDocumentError::PositionOutOfRange {
                position,
                len: self.doc.len(),
            });
        }
        self.move_to(position, mode);
        Ok(())
    }

    pub(crate) fn move_to(&mut self, position: usize, mode: MoveMode) {
        self.position = position.min(self.doc.len() - 1);
        if mode == MoveMode::MoveAnchor {
            self.anchor = self.position;
        }
        self.char_format = None;
    }

    /// Apply a movement. Returns `false` if the cursor could not move.
    pub fn move_position(&mut self, operation: MoveOperation, mode: MoveMode) -> bool {
        let (number, start) = self.doc.locate_block(self.position);
        let block_end = start + self.doc.block(number).map_or(1, |b| b.length()) - 1;
        let target = match operation {
            MoveOperation::Start => Some(0),
            MoveOperation::End => Some(self.doc.len() - 1),
            MoveOperation::StartOfBlock => Some(start),
            MoveOperation::EndOfBlock => Some(block_end),
            MoveOperation::NextBlock => (block_end + 1 < self.doc.len()).then_some(block_end + 1),
            MoveOperation::PreviousBlock => number
                .checked_sub(1)
                .map(|previous| self.doc.block_start(previous)),
            MoveOperation::NextCharacter => {
                if self.position == block_end {
                    (block_end + 1 < self.doc.len()).then_some(block_end + 1)
                } else {
                    let text = self.doc.text_range(start..block_end);
                    Some(start + next_grapheme(&text, self.position - start))
                }
            }
            MoveOperation::PreviousCharacter => {
                if self.position == start {
                    self.position.checked_sub(1)
                } else {
                    let text = self.doc.text_range(start..block_end);
                    Some(start + previous_grapheme(&text, self.position - start))
                }
            }
        };
        match target {
            Some(target) if target != self.position || mode == MoveMode::MoveAnchor => {
                let moved = target != self.position;
                self.move_to(target, mode);
                moved
            }
            _ => false,
        }
    }

    /// Returns `true` if anchor and position differ.
    pub fn has_selection(&self) -> bool {
        self.position != self.anchor
    }

    /// Smaller end of the selection.
    pub fn selection_start(&self) -> usize {
        self.position.min(self.anchor)
    }

    /// Larger end of the selection.
    pub fn selection_end(&self) -> usize {
        self.position.max(self.anchor)
    }

    /// Raw selected text.
    pub fn selected_text(&self) -> String {
        self.doc
            .text_range(self.selection_start()..self.selection_end())
    }

    /// Collapse the selection at the position.
    pub fn clear_selection(&mut self) {
        self.anchor = self.position;
    }

    /// Read-only view of this cursor's selection.
    pub fn selection(&self) -> DocumentSelection<'_> {
        DocumentSelection::new(self.doc, self.anchor, self.position)
    }

    /// Delete the selection. Cell selections clear the selected cells;
    /// other selections are widened to whole frames first.
    pub fn remove_selected_text(&mut self) {
        if !self.has_selection() {
            return;
        }
        let selection = self.selection();
        let cells = selection.selected_table_cells().and_then(|range| {
            let table = selection.current_table()?;
            let mut cells: Vec<TableCell> = table
                .cells()
                .into_iter()
                .filter(|c| {
                    c.row >= range.first_row
                        && c.row < range.first_row + range.rows
                        && c.column >= range.first_column
                        && c.column < range.first_column + range.columns
                })
                .collect();
            cells.sort_by_key(|c| std::cmp::Reverse(c.first_position));
            Some(cells)
        });
        let range = selection.adjusted_range();

        self.doc.begin_edit_block();
        let position = match cells {
            Some(cells) => {
                let mut position = self.selection_start();
                for cell in cells {
                    let len = cell.last_position - cell.first_position;
                    self.doc.remove_range(cell.first_position, len);
                    position = cell.first_position;
                }
                position
            }
            None => {
                self.doc.remove_range(range.start, range.len());
                range.start
            }
        };
        self.doc.end_edit_block();
        self.move_to(position, MoveMode::MoveAnchor);
    }

    // ---------------------------------------------------------------------
    // Insertion
    // ---------------------------------------------------------------------

    /// Insert text in the cursor's char format, replacing the selection.
    pub fn insert_text(&mut self, text: &str) {
        let format = self.char_format();
        self.insert_text_with_format(text, &format);
    }

    /// Insert text in `format`, replacing the selection.
    pub fn insert_text_with_format(&mut self, text: &str, format: &Format) {
        let format = format.converted(FormatKind::Char).with_object_index(None);
        let index = self.doc.formats_mut().intern(&format);
        self.insert_text_indexed(text, index);
    }

    pub(crate) fn insert_text_indexed(&mut self, text: &str, format: usize) {
        self.doc.begin_edit_block();
        self.remove_selected_text();
        let end = self.doc.insert_text_indexed(self.position, text, format);
        self.doc.end_edit_block();
        self.move_to(end, MoveMode::MoveAnchor);
    }

    /// Start a new block with the current block and char formats.
    pub fn insert_block(&mut self) {
        let block = self.block_format();
        let chars = self.char_format();
        self.insert_block_with_formats(&block, &chars);
    }

    /// Start a new block with the given formats.
    pub fn insert_block_with_formats(&mut self, block_format: &Format, char_format: &Format) {
        let block = self
            .doc
            .formats_mut()
            .intern(&block_format.converted(FormatKind::Block));
        let chars = self
            .doc
            .formats_mut()
            .intern(&char_format.converted(FormatKind::Char).with_object_index(None));
        self.insert_separator_indexed(PARAGRAPH_SEPARATOR, block, chars);
    }

    pub(crate) fn insert_separator_indexed(
        &mut self,
        separator: char,
        block_format: usize,
        char_format: usize,
    ) {
        self.doc.begin_edit_block();
        self.remove_selected_text();
        self.doc
            .insert_separator(self.position, separator, block_format, char_format);
        self.doc.end_edit_block();
        self.move_to(self.position + 1, MoveMode::MoveAnchor);
    }

    /// Insert an inline image. Floating images record their position in the
    /// image format.
    pub fn insert_image(&mut self, format: &Format, position: FramePosition) {
        let mut image = format.converted(FormatKind::Image).with_object_index(None);
        if position != FramePosition::InFlow {
            image.set_frame_position(position);
        }
        let index = self.doc.formats_mut().intern(&image);
        self.doc.begin_edit_block();
        self.remove_selected_text();
        let end = self
            .doc
            .insert_plain(self.position, &OBJECT_REPLACEMENT.to_string(), index);
        self.doc.end_edit_block();
        self.move_to(end, MoveMode::MoveAnchor);
    }

    /// Insert a table and move into its first cell.
    pub fn insert_table(
        &mut self,
        rows: usize,
        columns: usize,
        format: &Format,
    ) -> Result<ObjectIndex> {
        if rows == 0 || columns == 0 {
            return Err(TextDocumentError::InvalidTableDimensions { rows, columns });
        }
        self.doc.begin_edit_block();
        self.remove_selected_text();
        let position = self.position;
        let object = self.doc.insert_table(position, rows, columns, format);
        self.doc.end_edit_block();
        let object = object?;
        self.move_to(position + 1, MoveMode::MoveAnchor);
        Ok(object)
    }

    /// Insert an empty frame and move into it.
    pub fn insert_frame(&mut self, format: &Format) -> Result<ObjectIndex> {
        self.doc.begin_edit_block();
        self.remove_selected_text();
        let position = self.position;
        let object = self.doc.insert_frame(position, format);
        self.doc.end_edit_block();
        let object = object?;
        self.move_to(position + 1, MoveMode::MoveAnchor);
        Ok(object)
    }

    /// Paste a fragment at the cursor.
    pub fn insert_fragment(&mut self, fragment: &DocumentFragment) {
        fragment.insert(self);
    }

    // ---------------------------------------------------------------------
    // Formats
    // ---------------------------------------------------------------------

    /// Block at the cursor position.
    pub fn block(&self) -> Block<'_> {
        let (number, start) = self.doc.locate_block(self.position);
        Block {
            doc: self.doc,
            number,
            position: start,
            length: self.doc.block(number).map_or(1, |b| b.length()),
        }
    }

    /// Number of the block at the cursor position.
    pub fn block_number(&self) -> usize {
        self.doc.locate_block(self.position).0
    }

    /// Format of the current block.
    pub fn block_format(&self) -> Format {
        self.doc
            .formats()
            .format(self.doc.block_format_index(self.block_number()))
            .clone()
    }

    /// Char format of the current block.
    pub fn block_char_format(&self) -> Format {
        self.doc
            .formats()
            .format(self.doc.block_char_format_index(self.block_number()))
            .clone()
    }

    /// Format used for text typed at the cursor: an explicitly set format,
    /// otherwise the format of the character before the cursor (or of the
    /// first character when the cursor opens a non-empty block).
    pub fn char_format(&self) -> Format {
        if let Some(format) = &self.char_format {
            return format.clone();
        }
        let (number, start) = self.doc.locate_block(self.position);
        let length = self.doc.block(number).map_or(1, |b| b.length());
        let index = if self.position == start && length > 1 {
            self.doc.fragment_at(self.position).map(|r| r.format)
        } else if self.position == 0 {
            Some(self.doc.block_char_format_index(0))
        } else {
            self.doc.fragment_at(self.position - 1).map(|r| r.format)
        };
        self.doc
            .formats()
            .format(index.unwrap_or(DEFAULT_CHAR_FORMAT))
            .converted(FormatKind::Char)
            .with_object_index(None)
    }

    fn selected_blocks(&self) -> RangeInclusive<usize> {
        let first = self.doc.locate_block(self.selection_start()).0;
        let last = self.doc.locate_block(self.selection_end()).0;
        first..=last
    }

    /// Replace the format of the selected blocks (or the current block).
    pub fn set_block_format(&mut self, format: &Format) {
        self.doc.begin_edit_block();
        for number in self.selected_blocks() {
            let applied = self.doc.set_block_format(number, format);
            debug_assert!(applied.is_ok());
        }
        self.doc.end_edit_block();
    }

    /// Merge into the format of the selected blocks (or the current block).
    pub fn merge_block_format(&mut self, format: &Format) {
        self.doc.begin_edit_block();
        for number in self.selected_blocks() {
            let applied = self.doc.merge_block_format(number, format);
            debug_assert!(applied.is_ok());
        }
        self.doc.end_edit_block();
    }

    /// Replace the char format of the selected blocks (or the current block).
    pub fn set_block_char_format(&mut self, format: &Format) {
        self.doc.begin_edit_block();
        for number in self.selected_blocks() {
            let applied = self.doc.set_block_char_format(number, format);
            debug_assert!(applied.is_ok());
        }
        self.doc.end_edit_block();
    }

    /// Merge into the char format of the selected blocks (or the current block).
    pub fn merge_block_char_format(&mut self, format: &Format) {
        self.doc.begin_edit_block();
        for number in self.selected_blocks() {
            let applied = self.doc.merge_block_char_format(number, format);
            debug_assert!(applied.is_ok());
        }
        self.doc.end_edit_block();
    }

    /// Set the char format of the selection, or of text typed next.
    pub fn set_char_format(&mut self, format: &Format) {
        if self.has_selection() {
            let range = self.selection_start()..self.selection_end();
            let applied = self.doc.set_char_format(range, format);
            debug_assert!(applied.is_ok());
        } else {
            self.char_format = Some(format.converted(FormatKind::Char).with_object_index(None));
        }
    }

    /// Merge into the char format of the selection, or of text typed next.
    pub fn merge_char_format(&mut self, format: &Format) {
        if self.has_selection() {
            let range = self.selection_start()..self.selection_end();
            let applied = self.doc.merge_char_format(range, format);
            debug_assert!(applied.is_ok());
        } else {
            let mut current = self.char_format();
            current.merge(&format.clone().with_object_index(None));
            self.char_format = Some(current);
        }
    }

    /// Create a list object and make the selected blocks its items.
    pub fn create_list(&mut self, format: &Format) -> ObjectIndex {
        let object = self
            .doc
            .create_object(&format.converted(FormatKind::List));
        let link = Format::block().with_object_index(Some(object));
        self.merge_block_format(&link);
        object
    }

    /// List the current block belongs to.
    pub fn current_list(&self) -> Option<TextList<'_>> {
        let object = self.block_format().object_index()?;
        self.doc.list(object)
    }

    /// Innermost table at the cursor.
    pub fn current_table(&self) -> Option<TextTable<'_>> {
        self.doc.table_at(self.position)
    }

    /// Innermost frame at the cursor, `None` for the root frame.
    pub fn current_frame(&self) -> Option<Frame<'_>> {
        self.doc.frame_at(self.position)
    }

    /// Run `f` inside one edit block.
    pub fn edit_block<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.doc.begin_edit_block();
        let result = f(self);
        self.doc.end_edit_block();
        result
    }
}

/// Char offset of the grapheme boundary after `offset` in `text`.
fn next_grapheme(text: &str, offset: usize) -> usize {
    let mut chars = 0;
    for grapheme in text.graphemes(true) {
        chars += grapheme.chars().count();
        if chars > offset {
            return chars;
        }
    }
    chars
}

/// Char offset of the grapheme boundary before `offset` in `text`.
fn previous_grapheme(text: &str, offset: usize) -> usize {
    let mut chars = 0;
    let mut previous = 0;
    for grapheme in text.graphemes(true) {
        if chars >= offset {
            break;
        }
        previous = chars;
        chars += grapheme.chars().count();
    }
    previous
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_move() {
        let mut doc = TextDocument::new();
        let mut cursor = TextCursor::new(&mut doc);
        cursor.insert_text("ab\ncd");
        assert_eq!(cursor.position(), 5);
        assert!(cursor.move_position(MoveOperation::StartOfBlock, MoveMode::MoveAnchor));
        assert_eq!(cursor.position(), 3);
        assert!(cursor.move_position(MoveOperation::PreviousBlock, MoveMode::MoveAnchor));
        assert_eq!(cursor.position(), 0);
        assert!(cursor.move_position(MoveOperation::End, MoveMode::KeepAnchor));
        assert_eq!(cursor.selected_text(), "ab\u{2029}cd");
        assert!(!cursor.move_position(MoveOperation::NextBlock, MoveMode::MoveAnchor));
    }

    #[test]
    fn test_grapheme_movement() {
        let mut doc = TextDocument::from_plain_text("e\u{301}x");
        let mut cursor = TextCursor::new(&mut doc);
        cursor.move_position(MoveOperation::NextCharacter, MoveMode::MoveAnchor);
        assert_eq!(cursor.position(), 2);
        cursor.move_position(MoveOperation::PreviousCharacter, MoveMode::MoveAnchor);
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_char_format_rules() {
        let mut doc = TextDocument::new();
        let mut bold = Format::char();
        bold.set_font_weight(700);
        doc.insert_text(0, "ab", &bold).unwrap();
        doc.insert_text(2, "cd", &Format::char()).unwrap();

        let mut cursor = TextCursor::at(&mut doc, 0).unwrap();
        assert!(cursor.char_format().is_bold());
        cursor.set_position(2, MoveMode::MoveAnchor).unwrap();
        assert!(cursor.char_format().is_bold());
        cursor.set_position(3, MoveMode::MoveAnchor).unwrap();
        assert!(!cursor.char_format().is_bold());

        cursor.set_char_format(&bold);
        cursor.insert_text("X");
        let inserted = cursor.document().fragment_at(3).unwrap().format;
        assert!(cursor.document().formats().format(inserted).is_bold());
    }

    #[test]
    fn test_replace_selection() {
        let mut doc = TextDocument::from_plain_text("hello world");
        let mut cursor = TextCursor::at(&mut doc, 0).unwrap();
        cursor.set_position(5, MoveMode::KeepAnchor).unwrap();
        cursor.insert_text("goodbye");
        assert_eq!(doc.to_plain_text(), "goodbye world");
    }

    #[test]
    fn test_create_list_links_blocks() {
        let mut doc = TextDocument::from_plain_text("a\nb\nc");
        let mut cursor = TextCursor::at(&mut doc, 0).unwrap();
        cursor.set_position(2, MoveMode::KeepAnchor).unwrap();
        let list = cursor.create_list(&Format::list(crate::format::ListStyle::Decimal));
        assert_eq!(doc.list(list).unwrap().count(), 2);
        assert_eq!(doc.lists().len(), 1);
    }

    #[test]
    fn test_table_insert_moves_into_first_cell() {
        let mut doc = TextDocument::new();
        let mut cursor = TextCursor::new(&mut doc);
        let table = cursor.insert_table(2, 2, &Format::table(2)).unwrap();
        assert_eq!(cursor.position(), 1);
        assert_eq!(cursor.current_table().unwrap().object_index(), table);
        cursor.insert_text("x");
        let view = doc.table(table).unwrap();
        let cell = view.cell_at(0, 0).unwrap();
        assert_eq!(doc.text_range(cell.first_position..cell.last_position), "x");
    }

    #[test]
    fn test_complex_selection_detection() {
        let mut doc = TextDocument::new();
        let table = doc.insert_table(0, 2, 2, &Format::table(2)).unwrap();
        let (a, d) = {
            let view = doc.table(table).unwrap();
            (view.cell_at(0, 0).unwrap(), view.cell_at(1, 1).unwrap())
        };
        let selection = DocumentSelection::new(&doc, a.first_position, d.first_position);
        assert!(selection.has_complex_selection());
        assert_eq!(
            selection.selected_table_cells(),
            Some(CellRange {
                first_row: 0,
                rows: 2,
                first_column: 0,
                columns: 2
            })
        );

        let inside = DocumentSelection::new(&doc, a.first_position, a.first_position);
        assert!(!inside.has_complex_selection());
    }

    #[test]
    fn test_adjusted_range_widens_to_frame() {
        let mut doc = TextDocument::from_plain_text("ab");
        doc.insert_table(1, 1, 1, &Format::table(1)).unwrap();
        // a FDD0 FDD1 b ¶  (table occupies 1..=2)
        let selection = DocumentSelection::new(&doc, 0, 2);
        assert_eq!(selection.adjusted_range(), 0..3);
        let selection = DocumentSelection::new(&doc, 2, 4);
        assert_eq!(selection.adjusted_range(), 1..4);
    }
}
