//! Replaying a selection of one document into another.
//!
//! [`CopyHelper`] walks the source selection fragment by fragment and
//! re-creates it at a destination cursor. Formats are re-interned in the
//! destination's [`FormatCollection`](crate::FormatCollection); formats that
//! reference a shared object (list, table, frame) get a destination object
//! created from the object's own definition, once per source object.
//!
//! Selections whose ends lie in different cells of one table are copied as a
//! new table holding just the selected cell rectangle.

use std::collections::HashMap;

use tracing::{debug, trace, warn};

use crate::cursor::{DocumentSelection, MoveMode, TextCursor};
use crate::document::{DEFAULT_BLOCK_FORMAT, TextDocument};
use crate::format::{Format, ObjectIndex};
use crate::text::{FRAME_BEGIN, PARAGRAPH_SEPARATOR, is_block_separator};

/// Copies a selection of a source document to a destination cursor.
pub struct CopyHelper<'s, 'c, 'd> {
    src: &'s TextDocument,
    selection: DocumentSelection<'s>,
    cursor: &'c mut TextCursor<'d>,
    insert_pos: usize,
    force_char_format: bool,
    primary_char_format: usize,
    format_map: HashMap<usize, usize>,
    object_map: HashMap<ObjectIndex, ObjectIndex>,
}

impl<'s, 'c, 'd> CopyHelper<'s, 'c, 'd> {
    /// Prepare a copy of `selection` to `cursor`. With `force_char_format`
    /// every copied character takes `char_format` instead of its own.
    pub fn new(
        selection: DocumentSelection<'s>,
        cursor: &'c mut TextCursor<'d>,
        force_char_format: bool,
        char_format: &Format,
    ) -> Self {
        let primary_char_format = cursor.document_mut().formats_mut().intern(char_format);
        let insert_pos = cursor.position();
        Self {
            src: selection.document(),
            selection,
            cursor,
            insert_pos,
            force_char_format,
            primary_char_format,
            format_map: HashMap::new(),
            object_map: HashMap::new(),
        }
    }

    /// Run the copy. The cursor ends up after the inserted content.
    pub fn copy(mut self) {
        if !self.selection.has_selection() {
            return;
        }
        self.cursor.document_mut().begin_edit_block();
        if self.selection.has_complex_selection() {
            self.copy_cells();
        } else {
            let range = self.selection.adjusted_range();
            debug!(start = range.start, end = range.end, "copy range");
            self.append_fragments(range.start, range.end);
        }
        self.cursor.document_mut().end_edit_block();
        self.cursor.move_to(self.insert_pos, MoveMode::MoveAnchor);
    }

    fn dst(&mut self) -> &mut TextDocument {
        self.cursor.document_mut()
    }

    /// Destination object for a source object, created on first use.
    fn convert_object(&mut self, object: ObjectIndex) -> ObjectIndex {
        if let Some(&mapped) = self.object_map.get(&object) {
            return mapped;
        }
        let definition = self
            .src
            .formats()
            .object_format(object)
            .cloned()
            .unwrap_or_default();
        let mapped = self.dst().formats_mut().create_object_index(&definition);
        self.object_map.insert(object, mapped);
        mapped
    }

    /// Intern a source format in the destination, forcing `object` when given.
    fn convert_format(&mut self, format: &Format, object: Option<ObjectIndex>) -> usize {
        let mut format = format.clone();
        match object {
            Some(object) => format.set_object_index(Some(object)),
            None => {
                if let Some(source) = format.object_index() {
                    let mapped = self.convert_object(source);
                    format.set_object_index(Some(mapped));
                }
            }
        }
        let index = self.dst().formats_mut().intern(&format);
        debug_assert_eq!(self.dst().formats().format(index).kind(), format.kind());
        index
    }

    fn convert_format_index(&mut self, index: usize) -> usize {
        if let Some(&mapped) = self.format_map.get(&index) {
            return mapped;
        }
        let format = self.src.formats().format(index).clone();
        let mapped = self.convert_format(&format, None);
        self.format_map.insert(index, mapped);
        mapped
    }

    fn append_fragments(&mut self, mut pos: usize, end: usize) {
        while pos < end {
            pos += self.append_fragment(pos, end, None);
        }
    }

    /// Copy the part of the fragment at `pos` that lies before `end`; returns
    /// the number of characters consumed.
    fn append_fragment(&mut self, pos: usize, end: usize, object: Option<ObjectIndex>) -> usize {
        let src = self.src;
        let Some(run) = src.fragment_at(pos) else {
            debug_assert!(false, "no fragment at {pos}");
            return end - pos;
        };

        let char_format = if self.force_char_format && object.is_none() {
            self.primary_char_format
        } else if object.is_some() {
            let format = src.formats().format(run.format).clone();
            self.convert_format(&format, object)
        } else {
            self.convert_format_index(run.format)
        };

        let offset = pos - run.position;
        let count = (run.len - offset).min(end - pos);

        let next_block = src.find_block(pos + 1);
        let mut block_format = DEFAULT_BLOCK_FORMAT;
        if let Some(block) = next_block
            && block.position() == pos + 1
        {
            block_format = self.convert_format_index(block.format_index());
        } else if pos == 0 && self.insert_pos == 0 {
            if let Some(first) = src.block(0) {
                let format = self.convert_format_index(first.format_index());
                let chars = self.convert_format_index(first.char_format_index());
                self.dst().set_block_format_index(0, format);
                self.dst().set_block_char_format_index(0, chars);
            }
        }

        let text = src.text_range(pos..pos + count);
        let mut chars = text.chars();
        if let (Some(c), None) = (chars.next(), chars.next())
            && is_block_separator(c)
        {
            trace!(pos, separator = ?c, "copy separator");
            let at = self.insert_pos;
            self.dst().insert_separator(at, c, block_format, char_format);
            self.insert_pos += 1;
            return count;
        }

        if let Some(block) = next_block
            && block.list().is_some()
        {
            let dst = self.cursor.document();
            let (dst_block, _) = dst.locate_block(self.insert_pos);
            let in_list = dst
                .formats()
                .format(dst.block_format_index(dst_block))
                .object_index()
                .is_some_and(|o| dst.list(o).is_some());
            if !in_list {
                let list_block = self.convert_format_index(block.format_index());
                let list_chars = self.convert_format_index(block.char_format_index());
                let at = self.insert_pos;
                self.dst()
                    .insert_separator(at, PARAGRAPH_SEPARATOR, list_block, list_chars);
                self.insert_pos += 1;
            }
        }

        trace!(pos, count, "copy text");
        let at = self.insert_pos;
        self.insert_pos = self.dst().insert_plain(at, &text, char_format);
        if let Some(block) = next_block
            && block.user_state() != -1
        {
            let (dst_block, _) = self.dst().locate_block(at);
            if let Err(error) = self.dst().set_user_state(dst_block, block.user_state()) {
                warn!(%error, block = dst_block, "user state not copied");
            }
        }
        count
    }

    /// Copy the selected cell rectangle as a new table.
    fn copy_cells(&mut self) {
        let src = self.src;
        let (Some(table), Some(range)) = (
            self.selection.current_table(),
            self.selection.selected_table_cells(),
        ) else {
            return;
        };
        debug!(
            first_row = range.first_row,
            rows = range.rows,
            first_column = range.first_column,
            columns = range.columns,
            "copy table cells"
        );

        let mut table_format = table.format().clone();
        table_format.set_table_columns(range.columns);
        table_format.clear_column_width_constraints();
        let object = self.dst().formats_mut().create_object_index(&table_format);

        let row_end = range.first_row + range.rows;
        let column_end = range.first_column + range.columns;
        for r in range.first_row..row_end {
            for c in range.first_column..column_end {
                let Some(cell) = table.cell_at(r, c) else {
                    continue;
                };
                // A spanning cell is emitted once, at the first slot it covers
                // inside the rectangle.
                if (r, c) != (cell.row.max(range.first_row), cell.column.max(range.first_column)) {
                    continue;
                }
                let mut cell_format = cell.format(src).clone();
                let row_span = (cell.row + cell.row_span).min(row_end) - r;
                let column_span = (cell.column + cell.column_span).min(column_end) - c;
                cell_format.set_table_cell_row_span(row_span);
                cell_format.set_table_cell_column_span(column_span);
                let char_format = self.convert_format(&cell_format, Some(object));

                let block_format = match src.find_block(cell.first_position) {
                    Some(block) if block.position() == cell.first_position => {
                        self.convert_format_index(block.format_index())
                    }
                    _ => DEFAULT_BLOCK_FORMAT,
                };
                let at = self.insert_pos;
                self.dst().insert_separator(at, FRAME_BEGIN, block_format, char_format);
                self.insert_pos += 1;

                if cell.last_position > cell.first_position {
                    self.append_fragments(cell.first_position, cell.last_position);
                }
            }
        }

        let last = table.last_position();
        self.append_fragment(last, last + 1, Some(object));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Color;

    fn copy_all(src: &TextDocument) -> TextDocument {
        let mut dst = TextDocument::new();
        {
            let mut cursor = TextCursor::new(&mut dst);
            CopyHelper::new(
                DocumentSelection::whole_document(src),
                &mut cursor,
                false,
                &Format::char(),
            )
            .copy();
        }
        dst
    }

    #[test]
    fn test_copy_text_and_blocks() {
        let src = TextDocument::from_plain_text("one\ntwo\nthree");
        let dst = copy_all(&src);
        assert_eq!(dst.to_plain_text(), "one\ntwo\nthree");
        assert_eq!(dst.block_count(), 3);
    }

    #[test]
    fn test_first_block_format_carried_over() {
        let mut src = TextDocument::from_plain_text("title\nbody");
        let mut heading = Format::block();
        heading.set_heading_level(1);
        src.set_block_format(0, &heading).unwrap();
        let mut body = Format::block();
        body.set_indent(2);
        src.set_block_format(1, &body).unwrap();

        let dst = copy_all(&src);
        assert_eq!(dst.block(0).unwrap().format().heading_level(), 1);
        assert_eq!(dst.block(1).unwrap().format().indent(), 2);
    }

    #[test]
    fn test_shared_format_interned_once() {
        let mut src = TextDocument::new();
        let mut bold_red = Format::char();
        bold_red.set_font_weight(700);
        bold_red.set_foreground(Color::rgb(255, 0, 0));
        src.insert_text(0, "aa", &bold_red).unwrap();
        src.insert_text(2, "bb", &Format::char()).unwrap();
        src.insert_text(4, "cc", &bold_red).unwrap();

        let dst = copy_all(&src);
        let runs: Vec<_> = dst.fragments().collect();
        assert_eq!(runs[0].format, runs[2].format);
        assert!(dst.formats().format(runs[0].format).is_bold());
    }

    #[test]
    fn test_lists_get_new_objects() {
        let mut src = TextDocument::from_plain_text("x\ny");
        {
            let mut cursor = TextCursor::new(&mut src);
            cursor.set_position(2, MoveMode::KeepAnchor).unwrap();
            cursor.create_list(&Format::list(crate::format::ListStyle::Square));
        }
        let dst = copy_all(&src);
        let lists = dst.lists();
        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0].count(), 2);
        assert_eq!(lists[0].format().list_style(), crate::format::ListStyle::Square);
    }

    #[test]
    fn test_user_state_carried() {
        let mut src = TextDocument::from_plain_text("a\nb");
        src.set_user_state(1, 42).unwrap();
        let dst = copy_all(&src);
        assert_eq!(dst.block(1).unwrap().user_state(), 42);
    }

    #[test]
    fn test_forced_char_format() {
        let mut src = TextDocument::new();
        let mut italic = Format::char();
        italic.set_font_italic(true);
        src.insert_text(0, "abc", &italic).unwrap();

        let mut dst = TextDocument::new();
        let mut bold = Format::char();
        bold.set_font_weight(700);
        {
            let mut cursor = TextCursor::new(&mut dst);
            let selection = DocumentSelection::whole_document(&src);
            CopyHelper::new(selection, &mut cursor, true, &bold).copy();
            assert_eq!(cursor.position(), 3);
        }
        let format = dst.formats().format(dst.fragment_at(0).unwrap().format);
        assert!(format.is_bold());
        assert!(!format.font_italic());
    }

    #[test]
    fn test_empty_selection_copies_nothing() {
        let src = TextDocument::from_plain_text("abc");
        let mut dst = TextDocument::new();
        {
            let mut cursor = TextCursor::new(&mut dst);
            let selection = DocumentSelection::new(&src, 1, 1);
            CopyHelper::new(selection, &mut cursor, false, &Format::char()).copy();
        }
        assert!(dst.is_empty());
        assert_eq!(dst.revision(), 0);
    }
}
