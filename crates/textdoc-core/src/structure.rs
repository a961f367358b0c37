//! Read-only views over the document structure.
//!
//! Blocks, lists, frames and tables are not stored as separate trees. Blocks
//! are tracked by the [`TextDocument`], list membership is read from block
//! formats, and frames/tables are rebuilt from the frame marker characters
//! into a [`FrameTree`] that the document caches until the next mutation.
//!
//! ```text
//!  x ⟨FDD0 cell⟩ a ⟨FDD0 cell⟩ b ⟨FDD1⟩ ¶
//!    └─ table ──────────────────────┘
//! ```

use std::rc::Rc;

use tracing::warn;

use crate::document::TextDocument;
use crate::format::{Format, FormatKind, ObjectIndex};
use crate::format_table::FormatCollection;
use crate::text::{FRAME_BEGIN, FRAME_END};

/// A cell in a table grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableCell {
    /// Row of the top-left slot.
    pub row: usize,
    /// Column of the top-left slot.
    pub column: usize,
    /// Rows covered.
    pub row_span: usize,
    /// Columns covered.
    pub column_span: usize,
    /// First content position.
    pub first_position: usize,
    /// Position of the separator closing the cell.
    pub last_position: usize,
    /// Char format index of the cell marker.
    pub format_index: usize,
    /// Position of the cell marker.
    pub marker_position: usize,
}

impl TableCell {
    /// Cell format (including the table's object index and spans).
    pub fn format<'a>(&self, doc: &'a TextDocument) -> &'a Format {
        doc.formats().format(self.format_index)
    }

    /// Returns `true` if `position` lies inside the cell.
    pub fn contains(&self, position: usize) -> bool {
        self.first_position <= position && position <= self.last_position
    }
}

#[derive(Debug, Clone)]
pub(crate) struct TableGrid {
    pub rows: usize,
    pub columns: usize,
    slots: Vec<Option<usize>>,
    pub cells: Vec<TableCell>,
}

impl TableGrid {
    /// Lay the cells out in document order, skipping slots already taken by
    /// spanning cells above.
    fn build(
        markers: &[(usize,
        usize)],
        end: usize,
        columns: usize,
        formats: &FormatCollection,
    ) -> Self {
        let columns = columns.max(1);
        let mut rows = markers.len().div_ceil(columns);
        let mut slots: Vec<Option<usize>> = vec![None; rows * columns];
        let mut cells = Vec::with_capacity(markers.len());
        let mut slot = 0;

        for (i, &(marker, format_index)) in markers.iter().enumerate() {
            let format = formats.format(format_index);
            while slot < slots.len() && slots[slot].is_some() {
                slot += 1;
            }
            let row = slot / columns;
            let column = slot % columns;
            let row_span = format.table_cell_row_span();
            let column_span = format.table_cell_column_span().min(columns - column);

            if row + row_span > rows {
                rows = row + row_span;
                slots.resize(rows * columns, None);
            }
            for r in row..row + row_span {
                for c in column..column + column_span {
                    let target = &mut slots[r * columns + c];
                    if target.is_none() {
                        *target = Some(i);
                    }
                }
            }

            let last_position = markers.get(i + 1).map_or(end, |&(next, _)| next);
            cells.push(TableCell {
                row,
                column,
                row_span,
                column_span,
                first_position: marker + 1,
                last_position,
                format_index,
                marker_position: marker,
            });
        }

        Self {
            rows,
            columns,
            slots,
            cells,
        }
    }

    pub fn cell_at(&self, row: usize, column: usize) -> Option<&TableCell> {
        if row >= self.rows || column >= self.columns {
            return None;
        }
        self.slots[row * self.columns + column].map(|i| &self.cells[i])
    }
}

#[derive(Debug, Clone)]
pub(crate) struct FrameNode {
    pub object: ObjectIndex,
    pub begin: usize,
    pub end: usize,
    pub markers: Vec<(usize, usize)>,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    pub grid: Option<TableGrid>,
}

impl FrameNode {
    fn contains(&self, position: usize) -> bool {
        self.begin < position && position <= self.end
    }
}

/// Frames and tables of one document revision.
#[derive(Debug, Clone, Default)]
pub(crate) struct FrameTree {
    pub nodes: Vec<FrameNode>,
}

impl FrameTree {
    pub fn build(
        separators: &[(usize,
        char,
        usize)],
        formats: &FormatCollection,
        len: usize,
    ) -> Self {
        let mut nodes: Vec<FrameNode> = Vec::new();
        let mut stack: Vec<usize> = Vec::new();

        for &(position, c, format_index) in separators {
            if c != FRAME_BEGIN && c != FRAME_END {
                continue;
            }
            let Some(object) = formats.format(format_index).object_index() else {
                warn!(position, "frame marker without object");
                continue;
            };
            if c == FRAME_BEGIN {
                let is_table = formats.object_kind(object) == Some(FormatKind::Table);
                if let Some(&top) = stack.last()
                    && nodes[top].object == object
                {
                    if is_table {
                        nodes[top].markers.push((position, format_index));
                        continue;
                    }
                    warn!(position, "nested begin marker for open frame");
                }
                let parent = stack.last().copied();
                nodes.push(FrameNode {
                    object,
                    begin: position,
                    end: len.saturating_sub(1),
                    markers: vec![(position, format_index)],
                    parent,
                    children: Vec::new(),
                    grid: None,
                });
                let index = nodes.len() - 1;
                if let Some(parent) = parent {
                    nodes[parent].children.push(index);
                }
                stack.push(index);
            } else if let Some(depth) = stack.iter().rposition(|&n| nodes[n].object == object) {
                for &open in &stack[depth..] {
                    nodes[open].end = position;
                }
                stack.truncate(depth);
            } else {
                warn!(position, "unmatched frame end marker");
            }
        }

        for node in &mut nodes {
            if let Some(format) = formats.object_format(node.object)
                && format.kind() == FormatKind::Table
            {
                node.grid = Some(TableGrid::build(
                    &node.markers,
                    node.end,
                    format.table_columns(),
                    formats,
                ));
            }
        }

        Self { nodes }
    }

    /// Innermost frame containing `position`.
    pub fn innermost_at(&self, position: usize) -> Option<usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.contains(position))
            .max_by_key(|(_, node)| node.begin)
            .map(|(i, _)| i)
    }

    pub fn by_object(&self, object: ObjectIndex) -> Option<usize> {
        self.nodes.iter().position(|node| node.object == object)
    }
}

/// A block (paragraph) of a document.
#[derive(Clone, Copy)]
pub struct Block<'a> {
    pub(crate) doc: &'a TextDocument,
    pub(crate) number: usize,
    pub(crate) position: usize,
    pub(crate) length: usize,
}

impl std::fmt::Debug for Block<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Block")
            .field("number", &self.number)
            .field("position", &self.position)
            .field("length", &self.length)
            .finish()
    }
}

impl<'a> Block<'a> {
    /// Ordinal of the block.
    pub fn number(&self) -> usize {
        self.number
    }

    /// Position of the first character.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Length including the closing separator.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Returns `true` if `position` is inside the block or on its separator.
    pub fn contains(&self, position: usize) -> bool {
        self.position <= position && position < self.position + self.length
    }

    /// Text without the closing separator.
    pub fn text(&self) -> String {
        self.doc
            .text_range(self.position..self.position + self.length - 1)
    }

    /// Interned block format index.
    pub fn format_index(&self) -> usize {
        self.doc.block_format_index(self.number)
    }

    /// Block format.
    pub fn format(&self) -> &'a Format {
        self.doc.formats().format(self.format_index())
    }

    /// Interned block char format index.
    pub fn char_format_index(&self) -> usize {
        self.doc.block_char_format_index(self.number)
    }

    /// Char format of the block (the format of the separator that opens it).
    pub fn char_format(&self) -> &'a Format {
        self.doc.formats().format(self.char_format_index())
    }

    /// Application-defined state, -1 when unset.
    pub fn user_state(&self) -> i32 {
        self.doc.block_user_state(self.number)
    }

    /// The list this block is an item of.
    pub fn list(&self) -> Option<TextList<'a>> {
        let object = self.format().object_index()?;
        self.doc.list(object)
    }

    /// Following block.
    pub fn next(&self) -> Option<Block<'a>> {
        self.doc.block(self.number + 1)
    }

    /// Preceding block.
    pub fn previous(&self) -> Option<Block<'a>> {
        self.number.checked_sub(1).and_then(|n| self.doc.block(n))
    }
}

/// A list object and its items.
#[derive(Clone, Copy)]
pub struct TextList<'a> {
    pub(crate) doc: &'a TextDocument,
    pub(crate) object: ObjectIndex,
}

impl std::fmt::Debug for TextList<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextList")
            .field("object", &self.object)
            .field("count", &self.count())
            .finish()
    }
}

impl<'a> TextList<'a> {
    /// Object index of the list.
    pub fn object_index(&self) -> ObjectIndex {
        self.object
    }

    /// List definition.
    pub fn format(&self) -> &'a Format {
        self.doc
            .formats()
            .object_format(self.object)
            .unwrap_or_else(|| self.doc.formats().format(0))
    }

    /// Member blocks in document order.
    pub fn items(&self) -> Vec<Block<'a>> {
        self.doc
            .blocks()
            .filter(|block| block.format().object_index() == Some(self.object))
            .collect()
    }

    /// Number of items.
    pub fn count(&self) -> usize {
        self.items().len()
    }

    /// Zero-based item number of `block`, if it belongs to this list.
    pub fn item_number(&self, block: &Block<'_>) -> Option<usize> {
        self.items().iter().position(|b| b.number == block.number)
    }
}

/// A frame (including tables).
#[derive(Clone)]
pub struct Frame<'a> {
    pub(crate) doc: &'a TextDocument,
    pub(crate) tree: Rc<FrameTree>,
    pub(crate) node: usize,
}

impl std::fmt::Debug for Frame<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let node = self.node();
        f.debug_struct("Frame")
            .field("object", &node.object)
            .field("begin", &node.begin)
            .field("end", &node.end)
            .finish()
    }
}

impl<'a> Frame<'a> {
    fn node(&self) -> &FrameNode {
        &self.tree.nodes[self.node]
    }

    /// Object index of the frame.
    pub fn object_index(&self) -> ObjectIndex {
        self.node().object
    }

    /// Frame (or table) definition.
    pub fn format(&self) -> &'a Format {
        let doc = self.doc;
        doc.formats()
            .object_format(self.object_index())
            .unwrap_or_else(|| doc.formats().format(0))
    }

    /// First position inside the frame.
    pub fn first_position(&self) -> usize {
        self.node().begin + 1
    }

    /// Position of the closing marker.
    pub fn last_position(&self) -> usize {
        self.node().end
    }

    /// Enclosing frame, `None` for top-level frames.
    pub fn parent(&self) -> Option<Frame<'a>> {
        self.node().parent.map(|node| Frame {
            doc: self.doc,
            tree: Rc::clone(&self.tree),
            node,
        })
    }

    /// Directly nested frames.
    pub fn child_frames(&self) -> Vec<Frame<'a>> {
        self.node()
            .children
            .iter()
            .map(|&node| Frame {
                doc: self.doc,
                tree: Rc::clone(&self.tree),
                node,
            })
            .collect()
    }

    /// Returns `true` if this frame is a table.
    pub fn is_table(&self) -> bool {
        self.node().grid.is_some()
    }

    /// This frame as a table.
    pub fn as_table(&self) -> Option<TextTable<'a>> {
        self.is_table().then(|| TextTable {
            frame: self.clone(),
        })
    }
}

/// A table: a frame with a cell grid.
#[derive(Clone, Debug)]
pub struct TextTable<'a> {
    frame: Frame<'a>,
}

impl<'a> TextTable<'a> {
    fn grid(&self) -> &TableGrid {
        match &self.frame.node().grid {
            Some(grid) => grid,
            None => unreachable!("table view over a plain frame"),
        }
    }

    /// The underlying frame.
    pub fn frame(&self) -> &Frame<'a> {
        &self.frame
    }

    /// Object index of the table.
    pub fn object_index(&self) -> ObjectIndex {
        self.frame.object_index()
    }

    /// Table definition.
    pub fn format(&self) -> &'a Format {
        self.frame.format()
    }

    /// Row count.
    pub fn rows(&self) -> usize {
        self.grid().rows
    }

    /// Column count.
    pub fn columns(&self) -> usize {
        self.grid().columns
    }

    /// Cell covering slot `(row, column)`.
    pub fn cell_at(&self, row: usize, column: usize) -> Option<TableCell> {
        self.grid().cell_at(row, column).copied()
    }

    /// Cell containing `position`.
    pub fn cell_at_position(&self, position: usize) -> Option<TableCell> {
        self.grid()
            .cells
            .iter()
            .find(|cell| cell.contains(position))
            .copied()
    }

    /// All cells in document order.
    pub fn cells(&self) -> Vec<TableCell> {
        self.grid().cells.clone()
    }

    /// First position inside the table.
    pub fn first_position(&self) -> usize {
        self.frame.first_position()
    }

    /// Position of the closing marker.
    pub fn last_position(&self) -> usize {
        self.frame.last_position()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(formats: &mut FormatCollection, table: ObjectIndex, rows: usize, cols: usize) -> usize {
        let mut format = Format::char().with_object_index(Some(table));
        format.set_table_cell_row_span(rows);
        format.set_table_cell_column_span(cols);
        formats.intern(&format)
    }

    #[test]
    fn test_grid_with_spans() {
        let mut formats = FormatCollection::new();
        let table = formats.create_object_index(&Format::table(3));
        let wide = cell(&mut formats, table, 1, 2);
        let tall = cell(&mut formats, table, 2, 1);
        let plain = cell(&mut formats, table, 1, 1);

        // row 0: [wide wide tall]; row 1: [plain plain tall]
        let separators = vec![
            (0, FRAME_BEGIN, wide),
            (1, FRAME_BEGIN, tall),
            (2, FRAME_BEGIN, plain),
            (3, FRAME_BEGIN, plain),
            (4, FRAME_END, plain),
        ];
        let tree = FrameTree::build(&separators, &formats, 6);
        assert_eq!(tree.nodes.len(), 1);
        let grid = tree.nodes[0].grid.as_ref().unwrap();
        assert_eq!((grid.rows, grid.columns), (2, 3));
        assert_eq!(grid.cell_at(0, 1).unwrap().marker_position, 0);
        assert_eq!(grid.cell_at(1, 2).unwrap().marker_position, 1);
        assert_eq!(grid.cell_at(1, 0).unwrap().marker_position, 2);
        assert_eq!(grid.cell_at(1, 1).unwrap().last_position, 4);
    }

    #[test]
    fn test_nested_frames() {
        let mut formats = FormatCollection::new();
        let outer = formats.create_object_index(&Format::frame());
        let inner = formats.create_object_index(&Format::frame());
        let outer_fmt = formats.intern(&Format::char().with_object_index(Some(outer)));
        let inner_fmt = formats.intern(&Format::char().with_object_index(Some(inner)));

        let separators = vec![
            (1, FRAME_BEGIN, outer_fmt),
            (3, FRAME_BEGIN, inner_fmt),
            (5, FRAME_END, inner_fmt),
            (7, FRAME_END, outer_fmt),
        ];
        let tree = FrameTree::build(&separators, &formats, 9);
        assert_eq!(tree.nodes.len(), 2);
        assert_eq!(tree.nodes[1].parent, Some(0));
        assert_eq!(tree.innermost_at(4), Some(1));
        assert_eq!(tree.innermost_at(6), Some(0));
        assert_eq!(tree.innermost_at(1), None);
        assert_eq!(tree.innermost_at(7), Some(0));
    }
}
