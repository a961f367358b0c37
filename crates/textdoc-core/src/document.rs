//! The formatted document model.
//!
//! A [`TextDocument`] owns a [`FragmentStore`] (text plus char format runs), a
//! [`FormatCollection`], and the block table. Every document ends with one
//! implicit paragraph separator, so an empty document has length 1 and a
//! single block.
//!
//! # Mutations and notifications
//!
//! All mutations go through a handful of primitives (insert text, insert a
//! separator, remove, set formats). Each primitive bumps an internal
//! generation counter and records the touched region. Outside an edit block
//! every primitive is reported to subscribers immediately; inside
//! [`TextDocument::begin_edit_block`] / [`TextDocument::end_edit_block`] the
//! changes are merged and reported once, when the outermost block ends.
//!
//! # Example
//!
//! ```rust
//! use textdoc_core::{Format, TextDocument};
//!
//! let mut doc = TextDocument::new();
//! doc.insert_text(0, "Hello\nWorld", &Format::char()).unwrap();
//! assert_eq!(doc.block_count(), 2);
//! assert_eq!(doc.to_plain_text(), "Hello\nWorld");
//! ```

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::ops::Range;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::block_index::BlockIndex;
use crate::error::{Result, TextDocumentError};
use crate::format::{Format, FormatKind, ObjectIndex};
use crate::format_table::FormatCollection;
use crate::html::exporter::{ExportMode, HtmlExporter};
use crate::html::importer::{HtmlImporter, ImportMode};
use crate::storage::{FragmentRun, FragmentStore};
use crate::structure::{Block, Frame, FrameTree, TableCell, TextList, TextTable};
use crate::text::{
    FRAME_BEGIN, FRAME_END, PARAGRAPH_SEPARATOR, is_block_separator, split_blocks, to_plain,
};

/// Index of the default char format in every document.
pub const DEFAULT_CHAR_FORMAT: usize = 0;
/// Index of the default block format in every document.
pub const DEFAULT_BLOCK_FORMAT: usize = 1;

/// A resource a document can refer to by name (images, style sheets).
#[derive(Debug, Clone, PartialEq)]
pub enum Resource {
    /// An image with its natural size.
    Image {
        /// Width in pixels.
        width: f64,
        /// Height in pixels.
        height: f64,
    },
    /// Textual resource.
    Text(String),
    /// Opaque bytes.
    Binary(Vec<u8>),
}

/// Resolves resource names during import.
pub trait ResourceProvider {
    /// Look up a resource by name.
    fn resource(&self, name: &str) -> Option<Resource>;
}

/// Change notification delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentChange {
    /// Revision before the change.
    pub old_revision: u64,
    /// Revision after the change.
    pub new_revision: u64,
    /// First affected position.
    pub position: usize,
    /// Characters removed (format-only changes report the touched length).
    pub chars_removed: usize,
    /// Characters added (format-only changes report the touched length).
    pub chars_added: usize,
}

#[derive(Debug, Clone, Copy)]
struct PendingChange {
    position: usize,
    removed: usize,
    added: usize,
}

#[derive(Debug, Clone, Copy)]
struct BlockData {
    len: usize,
    format: usize,
    user_state: i32,
}

type Subscriber = Box<dyn FnMut(&DocumentChange)>;

/// A rich-text document.
pub struct TextDocument {
    store: FragmentStore,
    formats: FormatCollection,
    blocks: Vec<BlockData>,
    block_index: BlockIndex,
    first_block_char_format: usize,
    root_frame_format: Format,
    title: String,
    resources: BTreeMap<String, Resource>,
    edit_depth: usize,
    pending: Option<PendingChange>,
    subscribers: Vec<Subscriber>,
    revision: u64,
    generation: u64,
    undo_enabled: bool,
    undo_steps: usize,
    structure: RefCell<Option<(u64, Rc<FrameTree>)>>,
}

impl std::fmt::Debug for TextDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextDocument")
            .field("len", &self.len())
            .field("blocks", &self.blocks.len())
            .field("formats", &self.formats.len())
            .field("revision", &self.revision)
            .finish()
    }
}

impl Default for TextDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceProvider for TextDocument {
    fn resource(&self, name: &str) -> Option<Resource> {
        self.resources.get(name).cloned()
    }
}

impl TextDocument {
    /// Create an empty document (one empty block).
    pub fn new() -> Self {
        let mut store = FragmentStore::new();
        store.insert(0, &PARAGRAPH_SEPARATOR.to_string(), DEFAULT_CHAR_FORMAT);
        Self {
            store,
            formats: FormatCollection::new(),
            blocks: vec![BlockData {
                len: 1,
                format: DEFAULT_BLOCK_FORMAT,
                user_state: -1,
            }],
            block_index: BlockIndex::single(1),
            first_block_char_format: DEFAULT_CHAR_FORMAT,
            root_frame_format: Format::frame(),
            title: String::new(),
            resources: BTreeMap::new(),
            edit_depth: 0,
            pending: None,
            subscribers: Vec::new(),
            revision: 0,
            generation: 0,
            undo_enabled: true,
            undo_steps: 0,
            structure: RefCell::new(None),
        }
    }

    /// Create a document holding `text` in the default formats.
    pub fn from_plain_text(text: &str) -> Self {
        let mut doc = Self::new();
        doc.insert_text_indexed(0, text, DEFAULT_CHAR_FORMAT);
        doc
    }

    /// Length in characters, including the final separator.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns `true` if the document holds no content beyond its final separator.
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    /// Character at `position`.
    pub fn char_at(&self, position: usize) -> Option<char> {
        self.store.char_at(position)
    }

    /// Raw text in `range` (separators included).
    pub fn text_range(&self, range: Range<usize>) -> String {
        self.store.text(range)
    }

    /// Raw text without the final separator.
    pub fn to_raw_text(&self) -> String {
        self.store.text(0..self.len() - 1)
    }

    /// Text with structural characters mapped to newlines and non-breaking
    /// spaces to plain spaces.
    pub fn to_plain_text(&self) -> String {
        to_plain(&self.to_raw_text())
    }

    /// Serialize the whole document as HTML.
    pub fn to_html(&self) -> String {
        HtmlExporter::new(self).to_html(ExportMode::Document)
    }

    /// Replace the content with imported HTML.
    pub fn set_html(&mut self, html: &str) {
        debug!(len = html.len(), "set_html");
        self.edit_block(|doc| {
            doc.clear();
            HtmlImporter::new(doc, html, ImportMode::Document, None).import();
        });
    }

    /// Replace the content with plain text.
    pub fn set_plain_text(&mut self, text: &str) {
        self.edit_block(|doc| {
            doc.clear();
            doc.insert_text_indexed(0, text, DEFAULT_CHAR_FORMAT);
        });
    }

    /// Remove all content, formats, objects, metadata and resources.
    pub fn clear(&mut self) {
        let old_len = self.len();
        self.store = FragmentStore::new();
        self.store
            .insert(0, &PARAGRAPH_SEPARATOR.to_string(), DEFAULT_CHAR_FORMAT);
        self.formats = FormatCollection::new();
        self.blocks = vec![BlockData {
            len: 1,
            format: DEFAULT_BLOCK_FORMAT,
            user_state: -1,
        }];
        self.block_index = BlockIndex::single(1);
        self.first_block_char_format = DEFAULT_CHAR_FORMAT;
        self.root_frame_format = Format::frame();
        self.title.clear();
        self.resources.clear();
        self.record_change(0, old_len - 1, 0);
    }

    /// Interned formats of this document.
    pub fn formats(&self) -> &FormatCollection {
        &self.formats
    }

    pub(crate) fn formats_mut(&mut self) -> &mut FormatCollection {
        &mut self.formats
    }

    /// Formatted runs in document order.
    pub fn fragments(&self) -> impl Iterator<Item = FragmentRun> + '_ {
        self.store.runs()
    }

    /// The run containing `position`.
    pub fn fragment_at(&self, position: usize) -> Option<FragmentRun> {
        self.store.run_at(position)
    }

    // ---------------------------------------------------------------------
    // Blocks
    // ---------------------------------------------------------------------

    /// Number of blocks.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// All blocks in order.
    pub fn blocks(&self) -> impl Iterator<Item = Block<'_>> + '_ {
        let mut position = 0;
        self.blocks.iter().enumerate().map(move |(number, data)| {
            let block = Block {
                doc: self,
                number,
                position,
                length: data.len,
            };
            position += data.len;
            block
        })
    }

    /// Block number `number`.
    pub fn block(&self, number: usize) -> Option<Block<'_>> {
        let data = self.blocks.get(number)?;
        Some(Block {
            doc: self,
            number,
            position: self.block_start(number),
            length: data.len,
        })
    }

    /// Block containing `position`.
    pub fn find_block(&self, position: usize) -> Option<Block<'_>> {
        if position >= self.len() {
            return None;
        }
        let (number, start) = self.locate_block(position);
        Some(Block {
            doc: self,
            number,
            position: start,
            length: self.blocks[number].len,
        })
    }

    /// `(block number, block start)` for a valid position.
    pub(crate) fn locate_block(&self, position: usize) -> (usize, usize) {
        self.block_index.locate(position)
    }

    pub(crate) fn block_start(&self, number: usize) -> usize {
        self.block_index.start(number)
    }

    pub(crate) fn block_format_index(&self, number: usize) -> usize {
        self.blocks[number].format
    }

    pub(crate) fn block_char_format_index(&self, number: usize) -> usize {
        if number == 0 {
            return self.first_block_char_format;
        }
        let separator = self.block_start(number) - 1;
        self.store
            .format_at(separator)
            .unwrap_or(DEFAULT_CHAR_FORMAT)
    }

    pub(crate) fn block_user_state(&self, number: usize) -> i32 {
        self.blocks[number].user_state
    }

    fn check_block(&self, number: usize) -> Result<()> {
        if number < self.blocks.len() {
            Ok(())
        } else {
            Err(TextDocumentError::PositionOutOfRange {
                position: number,
                len: self.blocks.len(),
            })
        }
    }

    /// Replace the format of a block. The block keeps its list membership
    /// unless `format` names an object of its own.
    pub fn set_block_format(&mut self, number: usize, format: &Format) -> Result<()> {
        self.check_block(number)?;
        let mut format = format.converted(FormatKind::Block);
        if format.object_index().is_none() {
            let current = self.formats.format(self.blocks[number].format).object_index();
            format.set_object_index(current);
        }
        let index = self.formats.intern(&format);
        self.set_block_format_index(number, index);
        Ok(())
    }

    /// Merge properties into the format of a block.
    pub fn merge_block_format(&mut self, number: usize, format: &Format) -> Result<()> {
        self.check_block(number)?;
        let mut merged = self.formats.format(self.blocks[number].format).clone();
        merged.merge(format);
        let index = self.formats.intern(&merged);
        self.set_block_format_index(number, index);
        Ok(())
    }

    pub(crate) fn set_block_format_index(&mut self, number: usize, index: usize) {
        if self.blocks[number].format == index {
            return;
        }
        self.blocks[number].format = index;
        let start = self.block_start(number);
        let len = self.blocks[number].len;
        self.record_change(start, len, len);
    }

    /// Replace the char format of a block (the format of the separator that
    /// opens it). The object index of the separator is preserved.
    pub fn set_block_char_format(&mut self, number: usize, format: &Format) -> Result<()> {
        self.check_block(number)?;
        let mut format = format.converted(FormatKind::Char);
        let current = self.block_char_format_index(number);
        if format.object_index().is_none() {
            format.set_object_index(self.formats.format(current).object_index());
        }
        let index = self.formats.intern(&format);
        self.set_block_char_format_index(number, index);
        Ok(())
    }

    /// Merge properties into the char format of a block.
    pub fn merge_block_char_format(&mut self, number: usize, format: &Format) -> Result<()> {
        self.check_block(number)?;
        let mut merged = self
            .formats
            .format(self.block_char_format_index(number))
            .clone();
        merged.merge(format);
        let index = self.formats.intern(&merged);
        self.set_block_char_format_index(number, index);
        Ok(())
    }

    pub(crate) fn set_block_char_format_index(&mut self, number: usize, index: usize) {
        if number == 0 {
            if self.first_block_char_format != index {
                self.first_block_char_format = index;
                self.record_change(0, 0, 0);
            }
            return;
        }
        let separator = self.block_start(number) - 1;
        self.store.set_format(separator..separator + 1, index);
        self.record_change(separator, 1, 1);
    }

    /// Attach an application-defined state to a block.
    pub fn set_user_state(&mut self, number: usize, state: i32) -> Result<()> {
        self.check_block(number)?;
        self.blocks[number].user_state = state;
        Ok(())
    }

    /// Space between `number` and the block before it once margins collapse:
    /// the larger of the previous bottom margin and this top margin.
    pub fn collapsed_margin_before(&self, number: usize) -> Option<f64> {
        let block = self.block(number)?;
        let top = block.format().top_margin();
        Some(match block.previous() {
            Some(previous) => previous.format().bottom_margin().max(top),
            None => top,
        })
    }

    // ---------------------------------------------------------------------
    // Text primitives
    // ---------------------------------------------------------------------

    fn check_position(&self, position: usize) -> Result<()> {
        if position < self.len() {
            Ok(())
        } else {
            Err(TextDocumentError::PositionOutOfRange {
                position,
                len: self.len(),
            })
        }
    }

    /// Insert `text` at `position`. Newlines and separators start new blocks
    /// that copy the format of the block the text is inserted into.
    pub fn insert_text(&mut self, position: usize, text: &str, format: &Format) -> Result<()> {
        self.check_position(position)?;
        let index = self.formats.intern(&format.converted(FormatKind::Char));
        self.insert_text_indexed(position, text, index);
        Ok(())
    }

    /// Insert text with an interned char format; returns the position after it.
    pub(crate) fn insert_text_indexed(
        &mut self,
        position: usize,
        text: &str,
        format: usize,
    ) -> usize {
        let (number, _) = self.locate_block(position);
        let block_format = self.blocks[number].format;
        let mut position = position;
        self.begin_edit_block();
        let pieces = split_blocks(text);
        let last = pieces.len() - 1;
        for (i, piece) in pieces.into_iter().enumerate() {
            position = self.insert_plain(position, &piece, format);
            if i < last {
                self.insert_separator(position, PARAGRAPH_SEPARATOR, block_format, format);
                position += 1;
            }
        }
        self.end_edit_block();
        position
    }

    /// Insert text that contains no block separators; returns the position after it.
    pub(crate) fn insert_plain(&mut self, position: usize, text: &str, format: usize) -> usize {
        if text.is_empty() {
            return position;
        }
        debug_assert!(!text.chars().any(is_block_separator));
        let added = text.chars().count();
        let (number, _) = self.locate_block(position);
        self.store.insert(position, text, format);
        self.blocks[number].len += added;
        self.block_index.grow(number, added);
        trace!(position, added, format, "insert text");
        self.record_change(position, 0, added);
        position + added
    }

    /// Insert a paragraph separator at `position`; the text after it forms a
    /// new block with the given formats.
    pub fn insert_block(
        &mut self,
        position: usize,
        block_format: &Format,
        char_format: &Format,
    ) -> Result<()> {
        self.check_position(position)?;
        let block = self.formats.intern(&block_format.converted(FormatKind::Block));
        let chars = self.formats.intern(&char_format.converted(FormatKind::Char));
        self.insert_separator(position, PARAGRAPH_SEPARATOR, block, chars);
        Ok(())
    }

    /// Insert a block separator. The block containing `position` keeps its
    /// data; the new block after the separator gets `block_format`.
    pub(crate) fn insert_separator(
        &mut self,
        position: usize,
        separator: char,
        block_format: usize,
        char_format: usize,
    ) {
        debug_assert!(is_block_separator(separator));
        let (number, start) = self.locate_block(position);
        self.store
            .insert(position, &separator.to_string(), char_format);
        let left = position - start + 1;
        let right = self.blocks[number].len - (position - start);
        self.blocks[number].len = left;
        self.blocks.insert(
            number + 1,
            BlockData {
                len: right,
                format: block_format,
                user_state: -1,
            },
        );
        self.block_index.split(number, position + 1);
        debug_assert_eq!(self.block_index.len(), self.blocks.len());
        trace!(position, ?separator, block_format, char_format, "insert separator");
        self.record_change(position, 0, 1);
    }

    /// Remove `len` characters at `position`. The final separator cannot be removed.
    pub fn remove(&mut self, position: usize, len: usize) -> Result<()> {
        let end = position + len;
        if end >= self.len() {
            return Err(TextDocumentError::PositionOutOfRange {
                position: end,
                len: self.len(),
            });
        }
        self.remove_range(position, len);
        Ok(())
    }

    pub(crate) fn remove_range(&mut self, position: usize, len: usize) {
        if len == 0 {
            return;
        }
        let end = position + len;
        let (first, first_start) = self.locate_block(position);
        let (last, last_start) = self.locate_block(end);
        let last_end = last_start + self.blocks[last].len;
        self.store.remove(position, len);
        self.blocks[first].len = (position - first_start) + (last_end - end);
        self.blocks.drain(first + 1..=last);
        self.block_index.join(first, last, len);
        debug_assert_eq!(self.block_index.len(), self.blocks.len());
        trace!(position, len, "remove");
        self.record_change(position, len, 0);
    }

    // ---------------------------------------------------------------------
    // Char formats
    // ---------------------------------------------------------------------

    fn check_format_range(&self, range: &Range<usize>) -> Result<()> {
        if range.start <= range.end && range.end <= self.len() {
            Ok(())
        } else {
            Err(TextDocumentError::PositionOutOfRange {
                position: range.end,
                len: self.len(),
            })
        }
    }

    /// Replace the char format of every character in `range`, keeping the
    /// object indices already present.
    pub fn set_char_format(&mut self, range: Range<usize>, format: &Format) -> Result<()> {
        self.check_format_range(&range)?;
        let format = format.converted(FormatKind::Char);
        let formats = &mut self.formats;
        self.store.map_formats(range.clone(), |old| {
            let mut updated = format.clone();
            if updated.object_index().is_none() {
                updated.set_object_index(formats.format(old).object_index());
            }
            formats.intern(&updated)
        });
        self.record_change(range.start, range.len(), range.len());
        Ok(())
    }

    /// Merge properties into the char format of every character in `range`.
    pub fn merge_char_format(&mut self, range: Range<usize>, format: &Format) -> Result<()> {
        self.check_format_range(&range)?;
        let formats = &mut self.formats;
        self.store.map_formats(range.clone(), |old| {
            let mut merged = formats.format(old).clone();
            merged.merge(format);
            formats.intern(&merged)
        });
        self.record_change(range.start, range.len(), range.len());
        Ok(())
    }

    pub(crate) fn set_char_format_index(&mut self, range: Range<usize>, index: usize) {
        self.store.set_format(range.clone(), index);
        self.record_change(range.start, range.len(), range.len());
    }

    // ---------------------------------------------------------------------
    // Objects, frames, tables, lists
    // ---------------------------------------------------------------------

    /// Register a shared object (list, table or frame).
    pub fn create_object(&mut self, format: &Format) -> ObjectIndex {
        self.formats.create_object_index(format)
    }

    /// Kind of a registered object.
    pub fn object_kind(&self, object: ObjectIndex) -> Option<FormatKind> {
        self.formats.object_kind(object)
    }

    /// Replace an object's definition.
    pub fn set_object_format(&mut self, object: ObjectIndex, format: &Format) {
        self.formats.set_object_format(object, format);
        self.record_change(0, 0, 0);
    }

    pub(crate) fn frame_tree(&self) -> Rc<FrameTree> {
        if let Some((generation, tree)) = self.structure.borrow().as_ref()
            && *generation == self.generation
        {
            return Rc::clone(tree);
        }
        let tree = Rc::new(FrameTree::build(
            &self.store.separators(),
            &self.formats,
            self.len(),
        ));
        *self.structure.borrow_mut() = Some((self.generation, Rc::clone(&tree)));
        tree
    }

    /// All frames and tables in document order.
    pub fn frames(&self) -> Vec<Frame<'_>> {
        let tree = self.frame_tree();
        (0..tree.nodes.len())
            .map(|node| Frame {
                doc: self,
                tree: Rc::clone(&tree),
                node,
            })
            .collect()
    }

    /// Innermost frame containing `position`; `None` means the root frame.
    pub fn frame_at(&self, position: usize) -> Option<Frame<'_>> {
        let tree = self.frame_tree();
        let node = tree.innermost_at(position)?;
        Some(Frame {
            doc: self,
            tree,
            node,
        })
    }

    /// Table with the given object index.
    pub fn table(&self, object: ObjectIndex) -> Option<TextTable<'_>> {
        let tree = self.frame_tree();
        let node = tree.by_object(object)?;
        Frame {
            doc: self,
            tree,
            node,
        }
        .as_table()
    }

    /// Innermost table containing `position`.
    pub fn table_at(&self, position: usize) -> Option<TextTable<'_>> {
        let mut frame = self.frame_at(position);
        while let Some(current) = frame {
            if let Some(table) = current.as_table() {
                return Some(table);
            }
            frame = current.parent();
        }
        None
    }

    /// List with the given object index.
    pub fn list(&self, object: ObjectIndex) -> Option<TextList<'_>> {
        (self.formats.object_kind(object) == Some(FormatKind::List)).then_some(TextList {
            doc: self,
            object,
        })
    }

    /// Lists that have at least one item, in order of first appearance.
    pub fn lists(&self) -> Vec<TextList<'_>> {
        let mut seen: Vec<ObjectIndex> = Vec::new();
        for data in &self.blocks {
            if let Some(object) = self.formats.format(data.format).object_index()
                && self.formats.object_kind(object) == Some(FormatKind::List)
                && !seen.contains(&object)
            {
                seen.push(object);
            }
        }
        seen.into_iter()
            .map(|object| TextList { doc: self, object })
            .collect()
    }

    /// Insert an empty `rows` × `columns` table at `position`.
    pub fn insert_table(
        &mut self,
        position: usize,
        rows: usize,
        columns: usize,
        format: &Format,
    ) -> Result<ObjectIndex> {
        self.check_position(position)?;
        if rows == 0 || columns == 0 {
            return Err(TextDocumentError::InvalidTableDimensions { rows, columns });
        }
        let mut definition = format.converted(FormatKind::Table);
        definition.set_table_columns(columns);
        let object = self.formats.create_object_index(&definition);
        let cell = self
            .formats
            .intern(&Format::char().with_object_index(Some(object)));

        debug!(position, rows, columns, ?object, "insert table");
        self.begin_edit_block();
        for i in 0..rows * columns {
            self.insert_separator(position + i, FRAME_BEGIN, DEFAULT_BLOCK_FORMAT, cell);
        }
        self.insert_separator(position + rows * columns, FRAME_END, DEFAULT_BLOCK_FORMAT, cell);
        self.end_edit_block();
        Ok(object)
    }

    /// Insert an empty frame at `position`.
    pub fn insert_frame(&mut self, position: usize, format: &Format) -> Result<ObjectIndex> {
        self.check_position(position)?;
        let object = self
            .formats
            .create_object_index(&format.converted(FormatKind::Frame));
        let marker = self
            .formats
            .intern(&Format::char().with_object_index(Some(object)));
        debug!(position, ?object, "insert frame");
        self.begin_edit_block();
        self.insert_separator(position, FRAME_BEGIN, DEFAULT_BLOCK_FORMAT, marker);
        self.insert_separator(position + 1, FRAME_END, DEFAULT_BLOCK_FORMAT, marker);
        self.end_edit_block();
        Ok(object)
    }

    fn table_cell(&self, table: ObjectIndex, row: usize, column: usize) -> Result<TableCell> {
        let view = self.table(table).ok_or(TextDocumentError::NotATable(table.0))?;
        view.cell_at(row, column)
            .ok_or(TextDocumentError::CellOutOfRange { row, column })
    }

    /// Replace a cell's format. Spans and the table link are preserved.
    pub fn set_cell_format(
        &mut self,
        table: ObjectIndex,
        row: usize,
        column: usize,
        format: &Format,
    ) -> Result<()> {
        let cell = self.table_cell(table, row, column)?;
        let mut updated = format.converted(FormatKind::Char);
        updated.set_object_index(Some(table));
        updated.set_table_cell_row_span(cell.row_span);
        updated.set_table_cell_column_span(cell.column_span);
        let index = self.formats.intern(&updated);
        self.set_char_format_index(cell.marker_position..cell.marker_position + 1, index);
        Ok(())
    }

    /// Merge the `rows` × `columns` rectangle anchored at `(row, column)` into
    /// one cell. Content of the covered cells is appended to the merged cell.
    pub fn merge_cells(
        &mut self,
        table: ObjectIndex,
        row: usize,
        column: usize,
        rows: usize,
        columns: usize,
    ) -> Result<()> {
        let view = self.table(table).ok_or(TextDocumentError::NotATable(table.0))?;
        if rows == 0 || columns == 0 {
            return Err(TextDocumentError::InvalidMerge("empty span".into()));
        }
        if row + rows > view.rows() || column + columns > view.columns() {
            return Err(TextDocumentError::CellOutOfRange {
                row: row + rows - 1,
                column: column + columns - 1,
            });
        }
        let anchor = view
            .cell_at(row, column)
            .ok_or(TextDocumentError::CellOutOfRange { row, column })?;
        if anchor.row != row || anchor.column != column {
            return Err(TextDocumentError::InvalidMerge(
                "rectangle starts inside a spanning cell".into(),
            ));
        }

        let mut covered: Vec<TableCell> = Vec::new();
        for cell in view.cells() {
            let inside_rows = cell.row >= row && cell.row + cell.row_span <= row + rows;
            let inside_columns =
                cell.column >= column && cell.column + cell.column_span <= column + columns;
            let overlaps = cell.row < row + rows
                && cell.row + cell.row_span > row
                && cell.column < column + columns
                && cell.column + cell.column_span > column;
            if !overlaps {
                continue;
            }
            if !(inside_rows && inside_columns) {
                return Err(TextDocumentError::InvalidMerge(
                    "a cell crosses the rectangle boundary".into(),
                ));
            }
            if cell.marker_position != anchor.marker_position {
                covered.push(cell);
            }
        }
        drop(view);

        debug!(?table, row, column, rows, columns, covered = covered.len(), "merge cells");
        self.begin_edit_block();

        // Detach covered cells back to front so earlier positions stay valid.
        covered.sort_by_key(|cell| std::cmp::Reverse(cell.marker_position));
        let mut moved: Vec<Vec<(String, usize)>> = Vec::new();
        for cell in &covered {
            let runs: Vec<(String, usize)> = self
                .store
                .runs()
                .filter(|run| run.end() > cell.first_position && run.position < cell.last_position)
                .map(|run| {
                    let from = run.position.max(cell.first_position);
                    let to = run.end().min(cell.last_position);
                    (self.store.text(from..to), run.format)
                })
                .collect();
            if !runs.is_empty() {
                moved.push(runs);
            }
            self.remove_range(cell.marker_position, cell.last_position - cell.marker_position);
        }

        let mut format = self.formats.format(anchor.format_index).clone();
        format.set_table_cell_row_span(rows);
        format.set_table_cell_column_span(columns);
        let index = self.formats.intern(&format);
        self.set_char_format_index(anchor.marker_position..anchor.marker_position + 1, index);

        if !moved.is_empty() {
            let merged = self.table_cell(table, row, column)?;
            let (last_block, _) = self.locate_block(merged.last_position);
            let block_format = self.blocks[last_block].format;
            let mut position = merged.last_position;
            for runs in moved.into_iter().rev() {
                let first_format = runs[0].1;
                if position > merged.first_position {
                    self.insert_separator(
                        position,
                        PARAGRAPH_SEPARATOR,
                        block_format,
                        first_format,
                    );
                    position += 1;
                }
                for (text, format) in runs {
                    position = self.insert_raw_mixed(position, &text, format, block_format);
                }
            }
        }

        self.end_edit_block();
        Ok(())
    }

    /// Re-insert stored text that may contain separators, turning each into a
    /// paragraph separator.
    fn insert_raw_mixed(
        &mut self,
        position: usize,
        text: &str,
        format: usize,
        block_format: usize,
    ) -> usize {
        let pieces = split_blocks(text);
        let last = pieces.len() - 1;
        let mut position = position;
        for (i, piece) in pieces.into_iter().enumerate() {
            position = self.insert_plain(position, &piece, format);
            if i < last {
                self.insert_separator(position, PARAGRAPH_SEPARATOR, block_format, format);
                position += 1;
            }
        }
        position
    }

    // ---------------------------------------------------------------------
    // Metadata and resources
    // ---------------------------------------------------------------------

    /// Document title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Set the document title.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Format of the root frame.
    pub fn root_frame_format(&self) -> &Format {
        &self.root_frame_format
    }

    /// Replace the format of the root frame.
    pub fn set_root_frame_format(&mut self, format: &Format) {
        self.root_frame_format = format.converted(FormatKind::Frame);
        self.record_change(0, 0, 0);
    }

    /// Named resources.
    pub fn resources(&self) -> &BTreeMap<String, Resource> {
        &self.resources
    }

    /// Add or replace a named resource.
    pub fn add_resource(&mut self, name: impl Into<String>, resource: Resource) {
        self.resources.insert(name.into(), resource);
    }

    /// Copy over the resources of `other` that this document lacks.
    pub fn merge_cached_resources(&mut self, other: &TextDocument) {
        for (name, resource) in &other.resources {
            self.resources
                .entry(name.clone())
                .or_insert_with(|| resource.clone());
        }
    }

    // ---------------------------------------------------------------------
    // Edit blocks, notifications, undo bookkeeping
    // ---------------------------------------------------------------------

    /// Open an edit block. Blocks nest; changes are reported when the
    /// outermost one ends.
    pub fn begin_edit_block(&mut self) {
        self.edit_depth += 1;
    }

    /// Close an edit block.
    pub fn end_edit_block(&mut self) {
        self.edit_depth = self.edit_depth.saturating_sub(1);
        if self.edit_depth == 0 {
            self.flush_changes();
        }
    }

    /// Run `f` inside an edit block.
    pub fn edit_block<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.begin_edit_block();
        let result = f(self);
        self.end_edit_block();
        result
    }

    /// Returns `true` while an edit block is open.
    pub fn is_in_edit_block(&self) -> bool {
        self.edit_depth > 0
    }

    /// Register a change observer.
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&DocumentChange) + 'static,
    {
        self.subscribers.push(Box::new(callback));
    }

    /// Number of reported changes so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Enable or disable undo bookkeeping. Disabling drops recorded steps.
    pub fn set_undo_redo_enabled(&mut self, enabled: bool) {
        self.undo_enabled = enabled;
        if !enabled {
            self.undo_steps = 0;
        }
    }

    /// Returns `true` if undo bookkeeping is enabled.
    pub fn is_undo_redo_enabled(&self) -> bool {
        self.undo_enabled
    }

    /// Number of undo steps recorded (one per outermost edit block).
    pub fn available_undo_steps(&self) -> usize {
        self.undo_steps
    }

    fn record_change(&mut self, position: usize, removed: usize, added: usize) {
        self.generation += 1;
        self.pending = Some(match self.pending {
            Some(pending) => PendingChange {
                position: pending.position.min(position),
                removed: pending.removed + removed,
                added: pending.added + added,
            },
            None => PendingChange {
                position,
                removed,
                added,
            },
        });
        if self.edit_depth == 0 {
            self.flush_changes();
        }
    }

    fn flush_changes(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        let old_revision = self.revision;
        self.revision += 1;
        if self.undo_enabled {
            self.undo_steps += 1;
        }
        let change = DocumentChange {
            old_revision,
            new_revision: self.revision,
            position: pending.position,
            chars_removed: pending.removed,
            chars_added: pending.added,
        };
        debug!(
            revision = self.revision,
            position = change.position,
            removed = change.chars_removed,
            added = change.chars_added,
            "document changed"
        );
        for subscriber in &mut self.subscribers {
            subscriber(&change);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Color;
    use std::cell::Cell;

    #[test]
    fn test_empty_document() {
        let doc = TextDocument::new();
        assert_eq!(doc.len(), 1);
        assert!(doc.is_empty());
        assert_eq!(doc.block_count(), 1);
        assert_eq!(doc.to_plain_text(), "");
    }

    #[test]
    fn test_insert_text_creates_blocks() {
        let mut doc = TextDocument::new();
        doc.insert_text(0, "one\ntwo\r\nthree", &Format::char()).unwrap();
        assert_eq!(doc.block_count(), 3);
        let texts: Vec<String> = doc.blocks().map(|b| b.text()).collect();
        assert_eq!(texts, vec!["one", "two", "three"]);
        assert_eq!(doc.find_block(5).unwrap().number(), 1);
        assert_eq!(doc.find_block(4).unwrap().position(), 4);
    }

    #[test]
    fn test_insert_block_splits_and_keeps_left_data() {
        let mut doc = TextDocument::from_plain_text("abcd");
        doc.set_user_state(0, 7).unwrap();
        let mut heading = Format::block();
        heading.set_heading_level(2);
        doc.insert_block(2, &heading, &Format::char()).unwrap();

        assert_eq!(doc.block_count(), 2);
        assert_eq!(doc.block(0).unwrap().text(), "ab");
        assert_eq!(doc.block(0).unwrap().user_state(), 7);
        assert_eq!(doc.block(1).unwrap().text(), "cd");
        assert_eq!(doc.block(1).unwrap().format().heading_level(), 2);
        assert_eq!(doc.block(1).unwrap().user_state(), -1);
    }

    #[test]
    fn test_remove_merges_blocks() {
        let mut doc = TextDocument::from_plain_text("ab\ncd\nef");
        let mut fmt = Format::block();
        fmt.set_top_margin(4.0);
        doc.set_block_format(0, &fmt).unwrap();
        doc.remove(1, 3).unwrap();
        assert_eq!(doc.to_plain_text(), "ad\nef");
        assert_eq!(doc.block_count(), 2);
        assert_eq!(doc.block(0).unwrap().format().top_margin(), 4.0);
    }

    #[test]
    fn test_cannot_remove_final_separator() {
        let mut doc = TextDocument::from_plain_text("ab");
        assert!(matches!(
            doc.remove(0, 3),
            Err(TextDocumentError::PositionOutOfRange { .. })
        ));
        doc.remove(0, 2).unwrap();
        assert!(doc.is_empty());
    }

    #[test]
    fn test_char_formats_preserve_object_index() {
        let mut doc = TextDocument::new();
        let table = doc.insert_table(0, 1, 2, &Format::table(2)).unwrap();
        let mut red = Format::char();
        red.set_foreground(Color::rgb(255, 0, 0));
        doc.set_char_format(0..1, &red).unwrap();
        let marker = doc.formats().format(doc.fragment_at(0).unwrap().format);
        assert_eq!(marker.object_index(), Some(table));
        assert_eq!(marker.foreground(), Some(Color::rgb(255, 0, 0)));
    }

    #[test]
    fn test_table_structure() {
        let mut doc = TextDocument::from_plain_text("x");
        let table = doc.insert_table(1, 2, 2, &Format::table(2)).unwrap();
        let view = doc.table(table).unwrap();
        assert_eq!((view.rows(), view.columns()), (2, 2));
        let cell = view.cell_at(1, 0).unwrap();
        assert_eq!(cell.marker_position, 3);
        assert_eq!(cell.first_position, 4);
        assert_eq!(cell.last_position, 4);
        assert_eq!(doc.table_at(4).unwrap().object_index(), table);
        assert!(doc.table_at(0).is_none());
    }

    #[test]
    fn test_merge_cells_moves_content() {
        let mut doc = TextDocument::new();
        let table = doc.insert_table(0, 1, 2, &Format::table(2)).unwrap();
        // cell (0,1) content starts after its marker at 1
        doc.insert_text(2, "b", &Format::char()).unwrap();
        doc.insert_text(1, "a", &Format::char()).unwrap();
        doc.merge_cells(table, 0, 0, 1, 2).unwrap();

        let view = doc.table(table).unwrap();
        let cell = view.cell_at(0, 1).unwrap();
        assert_eq!((cell.row, cell.column, cell.column_span), (0, 0, 2));
        assert_eq!(view.cells().len(), 1);
        assert_eq!(doc.to_plain_text(), "\na\nb\n");
    }

    #[test]
    fn test_merge_cells_rejects_partial_overlap() {
        let mut doc = TextDocument::new();
        let table = doc.insert_table(0, 2, 2, &Format::table(2)).unwrap();
        doc.merge_cells(table, 0, 0, 2, 1).unwrap();
        assert!(matches!(
            doc.merge_cells(table, 1, 0, 1, 2),
            Err(TextDocumentError::InvalidMerge(_))
        ));
        assert!(matches!(
            doc.merge_cells(table, 0, 0, 3, 1),
            Err(TextDocumentError::CellOutOfRange { .. })
        ));
    }

    #[test]
    fn test_edit_block_reports_once() {
        let mut doc = TextDocument::new();
        let count = Rc::new(Cell::new(0));
        let seen = Rc::clone(&count);
        doc.subscribe(move |_| seen.set(seen.get() + 1));

        doc.edit_block(|doc| {
            doc.insert_text(0, "a", &Format::char()).unwrap();
            doc.insert_text(1, "b", &Format::char()).unwrap();
        });
        assert_eq!(count.get(), 1);
        assert_eq!(doc.revision(), 1);

        doc.insert_text(0, "c", &Format::char()).unwrap();
        assert_eq!(count.get(), 2);
        assert_eq!(doc.available_undo_steps(), 2);

        doc.set_undo_redo_enabled(false);
        doc.insert_text(0, "d", &Format::char()).unwrap();
        assert_eq!(doc.available_undo_steps(), 0);
    }

    #[test]
    fn test_collapsed_margin() {
        let mut doc = TextDocument::from_plain_text("A\nB");
        let mut fmt = Format::block();
        fmt.set_top_margin(12.0);
        fmt.set_bottom_margin(12.0);
        doc.set_block_format(0, &fmt).unwrap();
        doc.set_block_format(1, &fmt).unwrap();
        assert_eq!(doc.collapsed_margin_before(1), Some(12.0));
    }

    #[test]
    fn test_block_char_format_follows_separator() {
        let mut doc = TextDocument::from_plain_text("a\nb");
        let mut bold = Format::char();
        bold.set_font_weight(700);
        doc.set_block_char_format(1, &bold).unwrap();
        assert!(doc.block(1).unwrap().char_format().is_bold());
        assert!(doc.formats().format(doc.fragment_at(1).unwrap().format).is_bold());
        assert!(!doc.block(0).unwrap().char_format().is_bold());
    }

    #[test]
    fn test_merge_cached_resources_keeps_existing() {
        let mut a = TextDocument::new();
        let mut b = TextDocument::new();
        a.add_resource("logo", Resource::Text("mine".into()));
        b.add_resource("logo", Resource::Text("theirs".into()));
        b.add_resource("icon", Resource::Image { width: 4.0, height: 2.0 });
        a.merge_cached_resources(&b);
        assert_eq!(a.resource("logo"), Some(Resource::Text("mine".into())));
        assert!(a.resource("icon").is_some());
    }
}
