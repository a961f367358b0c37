//! HTML import.
//!
//! The importer replays a [`NodeStream`] through a [`TextCursor`], the same
//! way a user would type the document:
//!
//! ```text
//!  node i ──► closed tags since node i-1? ──► close_tag (tables, lists, rows)
//!         ──► display: none?              ──► skip (title is recorded)
//!         ──► special node?               ──► lists, tables, images, rules
//!         ──► block node?                 ──► open or merge a block
//!         ──► own text                    ──► whitespace automaton, insert
//! ```
//!
//! Consecutive block tags collapse into one block: `<div><p>x</p></div>`
//! produces a single paragraph whose top margin is the larger of the two.

use std::borrow::Cow;
use std::mem;

use tracing::{debug, trace, warn};

use super::node::{DisplayMode, HtmlNode, Tag, WhiteSpaceMode, edge_slot};
use super::parser::NodeStream;
use crate::cursor::{MoveMode, TextCursor};
use crate::document::{ResourceProvider, TextDocument};
use crate::format::{
    BorderStyle, Edge, Format, ObjectIndex, PageBreak, Property, TextLength, Value,
};
use crate::structure::TableCell;
use crate::text::{LINE_SEPARATOR, NBSP, PARAGRAPH_SEPARATOR};

const START_FRAGMENT: &str = "<!--StartFragment-->";
const END_FRAGMENT: &str = "<!--EndFragment-->";
const RICH_TEXT_HEADER: &str = r#"<meta name="qrichtext" content="1" />"#;

/// Pixels of table margin per enclosing indent level.
const INDENT_WIDTH: f64 = 40.0;

/// Where the imported content ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportMode {
    /// Content for a clipboard fragment.
    #[default]
    Fragment,
    /// Content of a whole document. Horizontal rules merge into an open block.
    Document,
}

/// Importer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HtmlImportOptions {
    /// Fragment or document import.
    pub mode: ImportMode,
    /// Treat whitespace as the rich-text editor does even without its header.
    pub force_text_edit_mode: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Compression {
    Preserve,
    Collapse,
    #[default]
    Remove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeResult {
    NextNode,
    NextSibling,
    CurrentNode,
}

#[derive(Debug, Clone)]
struct ListContext {
    format: Format,
    node: usize,
    object: Option<ObjectIndex>,
}

#[derive(Debug, Clone)]
struct TableContext {
    /// Table or frame object; `None` for the root frame or a table that was
    /// never created.
    object: Option<ObjectIndex>,
    is_text_frame: bool,
    current_row: usize,
    /// Position of the current cell in [`TextTable::cells`](crate::TextTable::cells).
    cell: usize,
    last_indent: i64,
}

#[derive(Debug, Default)]
struct ImportState {
    has_block: bool,
    force_block_merging: bool,
    block_tag_closed: bool,
    indent: i64,
    heading_level: u8,
    compress: Compression,
    white_space: WhiteSpaceMode,
    named_anchors: Vec<String>,
    lists: Vec<ListContext>,
    tables: Vec<TableContext>,
}

#[derive(Debug, Clone, Copy, Default)]
struct SpanInfo {
    row: usize,
    column: usize,
    row_span: usize,
    column_span: usize,
}

/// Builds document content from HTML.
pub struct HtmlImporter<'d, 'p> {
    cursor: TextCursor<'d>,
    nodes: NodeStream,
    state: ImportState,
    mode: ImportMode,
    provider: Option<&'p dyn ResourceProvider>,
}

impl std::fmt::Debug for HtmlImporter<'_, '_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HtmlImporter")
            .field("cursor", &self.cursor)
            .field("nodes", &self.nodes.len())
            .field("mode", &self.mode)
            .finish()
    }
}

impl<'d, 'p> HtmlImporter<'d, 'p> {
    /// Parse `html` for import into `doc` at its start. Images are looked up
    /// in `provider` and cached in the document.
    pub fn new(
        doc: &'d mut TextDocument,
        html: &str,
        mode: ImportMode,
        provider: Option<&'p dyn ResourceProvider>,
    ) -> Self {
        let options = HtmlImportOptions {
            mode,
            ..HtmlImportOptions::default()
        };
        Self::with_options(doc, html, options, provider)
    }

    /// Same as [`HtmlImporter::new`] with explicit options.
    pub fn with_options(
        doc: &'d mut TextDocument,
        html: &str,
        options: HtmlImportOptions,
        provider: Option<&'p dyn ResourceProvider>,
    ) -> Self {
        let mut nodes = NodeStream::parse(&clipboard_payload(html));
        if options.force_text_edit_mode {
            nodes.set_text_edit_mode(true);
        }
        Self {
            cursor: TextCursor::new(doc),
            nodes,
            state: ImportState::default(),
            mode: options.mode,
            provider,
        }
    }

    /// Returns `true` if whitespace is handled the rich-text editor way.
    pub fn text_edit_mode(&self) -> bool {
        self.nodes.text_edit_mode()
    }

    /// Run the import inside one edit block.
    pub fn import(mut self) {
        let mut nodes = mem::take(&mut self.nodes);
        debug!(
            nodes = nodes.len(),
            mode = ?self.mode,
            text_edit_mode = nodes.text_edit_mode(),
            "html import"
        );
        self.cursor.document_mut().begin_edit_block();
        self.state.has_block = true;
        self.state.force_block_merging = false;
        self.state.compress = Compression::Remove;
        self.state.block_tag_closed = false;

        let mut index = 0;
        while index < nodes.len() {
            let skip = self.import_node(&mut nodes, index);
            index += 1 + skip;
        }

        self.cursor.document_mut().end_edit_block();
        debug!(len = self.cursor.document().len(), "html import done");
    }

    /// Process one node; returns how many following nodes to skip.
    fn import_node(&mut self, nodes: &mut NodeStream, index: usize) -> usize {
        let text_edit_mode = nodes.text_edit_mode();
        self.state.white_space = if text_edit_mode {
            WhiteSpaceMode::PreWrap
        } else {
            nodes[index].white_space
        };
        trace!(index, tag = ?nodes[index].tag, "import node");

        if index > 0 && nodes[index].parent != index - 1 {
            self.state.block_tag_closed = self.close_tag(nodes, index);
            let node = &nodes[index];
            if self.state.block_tag_closed && !node.is_block() && node.tag != Tag::Unknown {
                self.state.has_block = false;
            } else if self.state.block_tag_closed && self.state.has_block {
                let mut format = node.block_format.clone();
                format.set_indent(self.state.indent);
                if let Some(page_break) = self.cursor.block_format().page_break_policy() {
                    // The empty block being reused asked for a break after
                    // itself, which is a break before the content that follows.
                    format.set_page_break_policy(match page_break {
                        PageBreak::AlwaysAfter => PageBreak::AlwaysBefore,
                        other => other,
                    });
                }
                self.cursor.set_block_format(&format);
            }
        }

        if nodes[index].display == DisplayMode::None {
            if nodes[index].tag == Tag::Title {
                let title = nodes[index].text.trim().to_string();
                self.cursor.document_mut().set_title(title);
            }
            return 0;
        }

        if self.process_special_node(nodes, index) == NodeResult::NextNode {
            return 0;
        }

        let node = &nodes[index];
        // Text after a closed block, as in `<ul><li>a</ul>b`, needs a block of its own.
        if self.state.block_tag_closed
            && !self.state.has_block
            && !node.is_block()
            && !node.text.is_empty()
            && !node.has_only_whitespace()
            && node.display == DisplayMode::Inline
        {
            let mut block = node.block_format.clone();
            block.set_indent(self.state.indent);
            self.append_block(&block, &node.char_format);
            self.state.block_tag_closed = false;
            self.state.has_block = true;
        }

        if node.is_block() {
            match self.process_block_node(nodes, index) {
                NodeResult::NextNode => return 0,
                NodeResult::NextSibling => return nodes.descendant_count(index),
                NodeResult::CurrentNode => {}
            }
        }

        let node = &nodes[index];
        if node.char_format.is_anchor()
            && let Some(name) = node.char_format.anchor_names().first()
        {
            self.state.named_anchors.push(name.clone());
        }

        if self.append_node_text(node, text_edit_mode) {
            self.state.has_block = false;
        }
        0
    }

    /// Finish the structures of every node closed between `index - 1` and
    /// `index`. Returns `true` if one of them ended a block.
    fn close_tag(&mut self, nodes: &NodeStream, index: usize) -> bool {
        let mut closed = index - 1;
        let end_depth = nodes.depth(index).saturating_sub(1);
        let mut depth = nodes.depth(closed);
        let mut block_closed = false;

        while depth > end_depth {
            let node = &nodes[closed];
            match node.tag {
                Tag::Tr => {
                    if let Some(object) = self.current_table_object() {
                        let cells = self.table_cells(object);
                        if let Some(table) = self.state.tables.last_mut() {
                            table.current_row += 1;
                            // Rows missing their cells (broken rowspans) are skipped.
                            while cells
                                .get(table.cell)
                                .is_some_and(|cell| cell.row < table.current_row)
                            {
                                table.cell += 1;
                            }
                        }
                    }
                    block_closed = true;
                }
                Tag::Table => {
                    if let Some(table) = self.state.tables.pop() {
                        self.state.indent = table.last_indent;
                        if let Some(target) = self.position_after_table() {
                            self.cursor.move_to(target, MoveMode::MoveAnchor);
                        }
                        // Content after a table continues in the empty block
                        // that follows it.
                        if self.cursor.block().length() == 1 {
                            self.state.has_block = true;
                            self.state.force_block_merging = true;
                        }
                        block_closed = false;
                        self.state.compress = Compression::Remove;
                    }
                }
                Tag::Td | Tag::Th => {
                    if let Some(table) = self.state.tables.last_mut()
                        && !table.is_text_frame
                    {
                        table.cell += 1;
                    }
                    block_closed = true;
                    self.state.compress = Compression::Remove;
                }
                Tag::Ul | Tag::Ol => {
                    if self.state.lists.pop().is_some() {
                        self.state.indent -= 1;
                        block_closed = true;
                    }
                }
                Tag::Br => self.state.compress = Compression::Remove,
                Tag::Div => {
                    let position = self.cursor.position();
                    if position > 0
                        && !node.children.is_empty()
                        && self.cursor.document().char_at(position - 1) != Some(LINE_SEPARATOR)
                    {
                        block_closed = true;
                    }
                }
                tag if tag.heading_level().is_some() => {
                    self.state.heading_level = 0;
                    block_closed = true;
                }
                _ => {
                    if node.is_block() {
                        block_closed = true;
                    }
                }
            }
            closed = node.parent;
            depth -= 1;
        }
        block_closed
    }

    /// Where the cursor continues once the innermost table is closed.
    fn position_after_table(&self) -> Option<usize> {
        let doc = self.cursor.document();
        let root_end = doc.len() - 1;
        match self.state.tables.last() {
            None => Some(root_end),
            Some(outer) if outer.is_text_frame => match outer.object {
                Some(object) => doc
                    .frames()
                    .into_iter()
                    .find(|frame| frame.object_index() == object)
                    .map(|frame| frame.last_position()),
                None => Some(root_end),
            },
            Some(outer) => {
                let object = outer.object?;
                self.table_cells(object)
                    .get(outer.cell)
                    .map(|cell| cell.last_position)
            }
        }
    }

    fn current_table_object(&self) -> Option<ObjectIndex> {
        self.state
            .tables
            .last()
            .filter(|table| !table.is_text_frame)
            .and_then(|table| table.object)
    }

    fn table_cells(&self, object: ObjectIndex) -> Vec<TableCell> {
        self.cursor
            .document()
            .table(object)
            .map(|table| table.cells())
            .unwrap_or_default()
    }

    fn process_special_node(&mut self, nodes: &mut NodeStream, index: usize) -> NodeResult {
        let tag = nodes[index].tag;
        match tag {
            Tag::Body => {
                if let Some(background) = nodes[index].char_format.background() {
                    let mut root = self.cursor.document().root_frame_format().clone();
                    root.set_background(background);
                    self.cursor.document_mut().set_root_frame_format(&root);
                    nodes
                        .node_mut(index)
                        .char_format
                        .clear(Property::Background);
                }
                self.state.compress = Compression::Remove;
            }
            Tag::Ul | Tag::Ol => {
                let node = &nodes[index];
                let mut style = node.list_style;
                if tag == Tag::Ul && !node.has_own_list_style {
                    for _ in nodes.ancestors(index).filter(|&a| nodes[a].tag == Tag::Ul) {
                        style = style.nested();
                    }
                }
                let mut format = Format::list(style);
                if let Some(prefix) = &node.list_number_prefix {
                    format.set_list_number_prefix(prefix.as_str());
                }
                if let Some(suffix) = &node.list_number_suffix {
                    format.set_list_number_suffix(suffix.as_str());
                }
                self.state.indent += 1;
                format.set_list_indent(node.css_list_indent.unwrap_or(self.state.indent));
                self.state.lists.push(ListContext {
                    format,
                    node: index,
                    object: None,
                });
                self.state.compress = Compression::Remove;

                // Text directly inside the list, as in `<ul>text<li>item`, is
                // imported as a block of its own.
                if node.text.trim().is_empty() {
                    return NodeResult::NextNode;
                }
            }
            Tag::Table => {
                let table = self.scan_table(nodes, index);
                self.state.tables.push(table);
                self.state.has_block = false;
                self.state.compress = Compression::Remove;
                return NodeResult::NextNode;
            }
            Tag::Tr => return NodeResult::NextNode,
            Tag::Img => {
                self.insert_image(&nodes[index]);
                return NodeResult::NextNode;
            }
            Tag::Hr => {
                let node = &nodes[index];
                let mut format = node.block_format.clone();
                format.set_top_margin(nodes.top_margin(index));
                format.set_bottom_margin(nodes.bottom_margin(index));
                format.set_horizontal_ruler_width(node.width);
                if self.state.has_block && self.mode == ImportMode::Document {
                    self.cursor.merge_block_format(&format);
                } else {
                    self.append_block(&format, &Format::char());
                }
                self.state.has_block = false;
                self.state.compress = Compression::Remove;
                return NodeResult::NextNode;
            }
            _ => {
                if let Some(level) = tag.heading_level() {
                    self.state.heading_level = level;
                }
            }
        }
        NodeResult::CurrentNode
    }

    fn insert_image(&mut self, node: &HtmlNode) {
        let mut format = Format::image(node.image_name.as_str());
        if !node.text.is_empty() {
            format.set_image_title(node.text.as_str());
        }
        if !node.image_alt.is_empty() {
            format.set_image_alt_text(node.image_alt.as_str());
        }
        format.merge(&node.char_format);
        if let TextLength::Fixed(width) = node.width {
            format.set_image_width(width);
        }
        if let TextLength::Fixed(height) = node.height {
            format.set_image_height(height);
        }
        self.cursor.insert_image(&format, node.float);

        let end = self.cursor.position();
        self.cursor.move_to(end - 1, MoveMode::KeepAnchor);
        self.cursor.merge_char_format(&node.char_format);
        self.cursor.move_to(end, MoveMode::MoveAnchor);

        if let Some(provider) = self.provider
            && let Some(resource) = provider.resource(&node.image_name)
        {
            self.cursor
                .document_mut()
                .add_resource(node.image_name.as_str(), resource);
        }
        self.state.compress = Compression::Collapse;
        self.state.has_block = false;
    }

    fn process_block_node(&mut self, nodes: &NodeStream, index: usize) -> NodeResult {
        let node = &nodes[index];
        let mut block = Format::block();
        let mut char_format = Format::char();
        let mut modified_block = true;
        let mut modified_char = true;

        if node.is_table_cell() && !self.state.tables.is_empty() {
            self.enter_table_cell(node);
            self.state.has_block = true;
            self.state.compress = Compression::Remove;
            if let Some(background) = node.char_format.background() {
                char_format.set_background(background);
                self.cursor.merge_block_char_format(&char_format);
            }
        }

        if self.state.has_block {
            block = self.cursor.block_format();
            char_format = self.cursor.block_char_format();
            modified_block = false;
            modified_char = false;
        }

        let top = nodes.top_margin(index);
        if top > block.top_margin() {
            block.set_top_margin(top);
            modified_block = true;
        }

        let mut bottom = nodes.bottom_margin(index);
        let parent = &nodes[node.parent];
        if matches!(node.tag, Tag::Li | Tag::Dt | Tag::Dd)
            && node.parent != 0
            && (parent.is_list_start() || parent.tag == Tag::Dl)
            && parent.children.last() == Some(&index)
        {
            bottom = bottom.max(nodes.bottom_margin(node.parent));
        }
        if block.bottom_margin() != bottom {
            block.set_bottom_margin(bottom);
            modified_block = true;
        }

        let left = nodes.horizontal_margin(index, Edge::Left);
        let right = nodes.horizontal_margin(index, Edge::Right);
        if block.left_margin() != left {
            block.set_left_margin(left);
            modified_block = true;
        }
        if block.right_margin() != right {
            block.set_right_margin(right);
            modified_block = true;
        }

        if node.tag != Tag::Li
            && self.state.indent != 0
            && self.state.lists.last().is_none_or(|list| {
                !self.state.has_block
                    || list.object.is_none()
                    || self.cursor.block_format().object_index() != list.object
            })
        {
            block.set_indent(self.state.indent);
            modified_block = true;
        }

        if self.state.heading_level != 0 {
            block.set_heading_level(self.state.heading_level);
            modified_block = true;
        }

        if !node.block_format.is_empty() {
            block.merge(&node.block_format);
            modified_block = true;
        }

        if !node.char_format.is_empty() {
            char_format.merge(&node.char_format);
            modified_char = true;
        }

        if matches!(
            self.state.white_space,
            WhiteSpaceMode::Pre | WhiteSpaceMode::NoWrap
        ) {
            block.set_non_breakable_lines(true);
            modified_block = true;
        }

        if let Some(background) = node.char_format.background()
            && !node.is_table_cell()
        {
            block.set_background(background);
            modified_block = true;
        }

        if self.state.has_block && (!node.is_empty_paragraph || self.state.force_block_merging) {
            if modified_block {
                self.cursor.set_block_format(&block);
            }
            if modified_char {
                self.cursor.set_block_char_format(&char_format);
            }
        } else if index == 1 && self.cursor.position() == 0 && node.is_empty_paragraph {
            self.cursor.set_block_format(&block);
            self.cursor.set_block_char_format(&char_format);
        } else {
            self.append_block(&block, &char_format);
        }

        if node.user_state != -1 {
            let number = self.cursor.block_number();
            if let Err(error) = self
                .cursor
                .document_mut()
                .set_user_state(number, node.user_state)
            {
                warn!(%error, "user state not applied");
            }
        }

        if node.tag == Tag::Li
            && let Some(list) = self.state.lists.last()
        {
            let (object, format, list_node) = (list.object, list.format.clone(), list.node);
            match object {
                Some(object) => {
                    let link = Format::block().with_object_index(Some(object));
                    self.cursor.merge_block_format(&link);
                }
                None => {
                    let object = self.cursor.create_list(&format);
                    if let Some(list) = self.state.lists.last_mut() {
                        list.object = Some(object);
                    }
                    let list_top = nodes.top_margin(list_node);
                    if list_top > block.top_margin() {
                        block.set_top_margin(list_top);
                        self.cursor
                            .merge_block_format(&block.clone().with_object_index(None));
                    }
                }
            }
            if self.state.has_block {
                let mut indent = Format::block();
                indent.set_indent(node.block_format.indent());
                self.cursor.merge_block_format(&indent);
            }
        }

        self.state.force_block_merging =
            matches!(node.tag, Tag::Body | Tag::Html | Tag::Td | Tag::Th);

        if node.is_empty_paragraph {
            self.state.has_block = false;
            return NodeResult::NextSibling;
        }
        self.state.has_block = true;
        self.state.block_tag_closed = false;
        NodeResult::CurrentNode
    }

    /// Apply the cell's own paddings and borders and move into the cell.
    fn enter_table_cell(&mut self, node: &HtmlNode) {
        let Some(object) = self.current_table_object() else {
            return;
        };
        let ordinal = self.state.tables.last().map_or(0, |table| table.cell);
        let Some(cell) = self.table_cells(object).get(ordinal).copied() else {
            return;
        };
        let mut format = cell.format(self.cursor.document()).clone();
        for edge in Edge::ALL {
            let slot = edge_slot(edge);
            if let Some(padding) = node.padding(edge)
                && padding >= 0.0
            {
                format.set_cell_padding(edge, padding);
            }
            if node.cell_border[slot] > 0.0 {
                format.set_cell_border(edge, node.cell_border[slot]);
            }
            if let Some(style) = node.cell_border_style[slot]
                && style != BorderStyle::None
            {
                format.set_cell_border_style(edge, style);
            }
            if let Some(color) = node.cell_border_brush[slot] {
                format.set_cell_border_brush(edge, color);
            }
        }
        if let Err(error) =
            self.cursor
                .document_mut()
                .set_cell_format(object, cell.row, cell.column, &format)
        {
            warn!(%error, row = cell.row, column = cell.column, "cell format not applied");
        }
        self.cursor.move_to(cell.first_position, MoveMode::MoveAnchor);
    }

    /// Count rows and columns (honouring spans), create the table or frame,
    /// and return its import context with the cursor left in front of it.
    fn scan_table(&mut self, nodes: &NodeStream, index: usize) -> TableContext {
        let table_node = &nodes[index];
        let mut row_nodes = Vec::new();
        let mut header_rows = 0;
        for &child in &table_node.children {
            match nodes[child].tag {
                Tag::Tr => row_nodes.push(child),
                group @ (Tag::Thead | Tag::Tbody | Tag::Tfoot) => {
                    for &row in &nodes[child].children {
                        if nodes[row].tag == Tag::Tr {
                            row_nodes.push(row);
                            if group == Tag::Thead {
                                header_rows += 1;
                            }
                        }
                    }
                }
                _ => {}
            }
        }

        let mut spans: Vec<SpanInfo> = Vec::new();
        let mut span_for_column: Vec<SpanInfo> = Vec::new();
        let mut widths: Vec<TextLength> = Vec::new();
        let mut columns = 0;
        for (row, &row_node) in row_nodes.iter().enumerate() {
            let mut column = 0;
            for &cell_node in &nodes[row_node].children {
                let cell = &nodes[cell_node];
                if !cell.is_table_cell() {
                    continue;
                }
                // Skip slots still covered by row spans from earlier rows.
                while let Some(info) = span_for_column.get(column)
                    && info.row + info.row_span > row
                {
                    column = info.column + info.column_span;
                }
                let first = column;
                column += cell.table_cell_column_span;
                let info = SpanInfo {
                    row,
                    column: first,
                    row_span: cell.table_cell_row_span,
                    column_span: cell.table_cell_column_span,
                };
                if info.row_span > 1 || info.column_span > 1 {
                    spans.push(info);
                }
                if widths.len() < column {
                    widths.resize(column, TextLength::Variable);
                    span_for_column.resize(column, SpanInfo::default());
                }
                let width = cell.width.divided(cell.table_cell_column_span);
                for slot in first..column {
                    widths[slot] = narrower(widths[slot], width);
                    span_for_column[slot] = info;
                }
            }
            columns = columns.max(column);
        }
        let rows = row_nodes.len();

        let last_indent = self.state.indent;
        self.state.indent = 0;
        let mut context = TableContext {
            object: None,
            is_text_frame: table_node.is_text_frame,
            current_row: 0,
            cell: 0,
            last_indent,
        };
        if rows == 0 || columns == 0 {
            debug!(index, "table without cells skipped");
            return context;
        }

        let mut format = if table_node.is_text_frame {
            Format::frame()
        } else {
            let mut table = Format::table(columns);
            table.set_cell_spacing(table_node.table_cell_spacing);
            table.set_table_cell_padding(table_node.table_cell_padding);
            if let Some(alignment) = table_node.block_format.alignment() {
                table.set_alignment(alignment);
            }
            table.set_column_width_constraints(widths);
            table.set_header_row_count(header_rows);
            table.set_border_collapse(table_node.border_collapse);
            table
        };

        let top = nodes.top_margin(index);
        let bottom = nodes.bottom_margin(index);
        let left = nodes.horizontal_margin(index, Edge::Left) + last_indent as f64 * INDENT_WIDTH;
        let right = nodes.horizontal_margin(index, Edge::Right);
        format.set_frame_margin(Edge::Top, top);
        format.set_frame_margin(Edge::Bottom, bottom);
        format.set_frame_margin(Edge::Left, left);
        format.set_frame_margin(Edge::Right, right);
        if [top, bottom, right]
            .iter()
            .all(|margin| (margin - left).abs() < f64::EPSILON)
        {
            format.set(Property::FrameMargin, Value::Float(left));
        }
        format.set_frame_border_style(table_node.border_style);
        if let Some(brush) = table_node.border_brush {
            format.set_frame_border_brush(brush);
        }
        format.set_frame_border(table_node.table_border);
        format.set_frame_width(table_node.width);
        format.set_frame_height(table_node.height);
        if let Some(page_break) = table_node.block_format.page_break_policy() {
            format.set_page_break_policy(page_break);
        }
        if let Some(direction) = table_node.block_format.layout_direction() {
            format.set_layout_direction(direction);
        }
        if let Some(background) = table_node.char_format.background() {
            format.set_background(background);
        }
        format.set_frame_position(table_node.float);

        if table_node.is_text_frame {
            if table_node.is_root_frame {
                let current = self.cursor.current_frame().map(|frame| frame.object_index());
                match current {
                    None => self.cursor.document_mut().set_root_frame_format(&format),
                    Some(object) => self.cursor.document_mut().set_object_format(object, &format),
                }
                context.object = current;
            } else {
                match self.cursor.insert_frame(&format) {
                    Ok(object) => context.object = Some(object),
                    Err(error) => warn!(%error, "frame not inserted"),
                }
            }
            return context;
        }

        let old_position = self.cursor.position();
        match self.cursor.insert_table(rows, columns, &format) {
            Ok(object) => {
                debug!(?object, rows, columns, spans = spans.len(), "table created");
                for span in &spans {
                    let row_span = span.row_span.min(rows.saturating_sub(span.row));
                    let column_span = span.column_span.min(columns.saturating_sub(span.column));
                    if row_span <= 1 && column_span <= 1 {
                        continue;
                    }
                    if let Err(error) = self.cursor.document_mut().merge_cells(
                        object,
                        span.row,
                        span.column,
                        row_span,
                        column_span,
                    ) {
                        warn!(%error, row = span.row, column = span.column, "cell span dropped");
                    }
                }
                context.object = Some(object);
            }
            Err(error) => warn!(%error, "table not inserted"),
        }
        // Captions are inserted right before the table.
        self.cursor.move_to(old_position, MoveMode::MoveAnchor);
        context
    }

    fn append_block(&mut self, block: &Format, char_format: &Format) {
        let mut char_format = char_format.clone();
        if !self.state.named_anchors.is_empty() {
            char_format.set_anchor(true);
            char_format.set_anchor_names(mem::take(&mut self.state.named_anchors));
        }
        self.cursor.insert_block_with_formats(block, &char_format);
        if !matches!(
            self.state.white_space,
            WhiteSpaceMode::Pre | WhiteSpaceMode::PreWrap
        ) {
            self.state.compress = Compression::Remove;
        }
    }

    /// Insert the node's own text. Returns `true` if anything was inserted.
    fn append_node_text(&mut self, node: &HtmlNode, text_edit_mode: bool) -> bool {
        let initial = self.cursor.position();
        let mode = self.state.white_space;
        let mut format = node.char_format.clone();
        let mut pending = String::new();

        if matches!(mode, WhiteSpaceMode::Pre | WhiteSpaceMode::PreWrap) {
            self.state.compress = Compression::Preserve;
        }

        for c in node.text.chars() {
            let mut c = c;
            if c.is_whitespace() && c != NBSP && c != PARAGRAPH_SEPARATOR {
                let newline = c == '\n' || c == '\r';
                if mode == WhiteSpaceMode::PreLine && newline {
                    self.state.compress = Compression::Preserve;
                }
                match self.state.compress {
                    Compression::Collapse => self.state.compress = Compression::Remove,
                    Compression::Remove => continue,
                    Compression::Preserve => {}
                }
                if mode == WhiteSpaceMode::Pre || text_edit_mode {
                    if (c == '\n' && text_edit_mode) || c == '\r' {
                        continue;
                    }
                } else if mode != WhiteSpaceMode::PreWrap {
                    self.state.compress = Compression::Remove;
                    if mode == WhiteSpaceMode::PreLine && newline {
                        if c == '\r' {
                            continue;
                        }
                    } else if mode == WhiteSpaceMode::NoWrap {
                        c = NBSP;
                    } else {
                        c = ' ';
                    }
                } else if c == '\r' {
                    continue;
                }
            } else {
                self.state.compress = Compression::Preserve;
            }

            if c == '\n' || c == PARAGRAPH_SEPARATOR {
                self.flush_text(&mut pending, &format, mode == WhiteSpaceMode::PreLine);
                let block = self.cursor.block_format();
                if block.has(Property::BlockBottomMargin) {
                    let mut trimmed = block.clone();
                    trimmed.clear(Property::BlockBottomMargin);
                    self.cursor.set_block_format(&trimmed);
                }
                let mut next = block;
                next.clear(Property::BlockTopMargin);
                let char_format = self.cursor.char_format();
                self.append_block(&next, &char_format);
            } else if !self.state.named_anchors.is_empty() {
                self.flush_text(&mut pending, &format, false);
                format.set_anchor(true);
                format.set_anchor_names(mem::take(&mut self.state.named_anchors));
                self.cursor
                    .insert_text_with_format(c.encode_utf8(&mut [0; 4]), &format);
                format.clear(Property::IsAnchor);
                format.clear(Property::AnchorNames);
            } else {
                pending.push(c);
            }
        }
        self.flush_text(&mut pending, &format, false);

        self.cursor.position() != initial
    }

    fn flush_text(&mut self, pending: &mut String, format: &Format, chop_trailing_space: bool) {
        if pending.is_empty() {
            return;
        }
        if chop_trailing_space && pending.ends_with(' ') {
            pending.pop();
        }
        self.cursor.insert_text_with_format(pending, format);
        pending.clear();
    }
}

/// Cut a clipboard payload down to the part between the fragment markers,
/// keeping the rich-text editor header if the payload had one.
fn clipboard_payload(html: &str) -> Cow<'_, str> {
    let Some(start) = html.find(START_FRAGMENT) else {
        return Cow::Borrowed(html);
    };
    let has_header = html.contains(RICH_TEXT_HEADER);
    let fragment = match html.find(END_FRAGMENT) {
        Some(end) if end > start => &html[start..end],
        _ => &html[start..],
    };
    if has_header {
        Cow::Owned(format!("{RICH_TEXT_HEADER}{fragment}"))
    } else {
        Cow::Borrowed(fragment)
    }
}

/// The narrower of two column widths of the same kind; a variable width
/// always yields to an explicit one.
fn narrower(current: TextLength, candidate: TextLength) -> TextLength {
    match (current, candidate) {
        (TextLength::Variable, candidate) => candidate,
        (TextLength::Fixed(a), TextLength::Fixed(b)) => TextLength::Fixed(a.min(b)),
        (TextLength::Percentage(a), TextLength::Percentage(b)) => TextLength::Percentage(a.min(b)),
        (current, _) => current,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Resource;
    use crate::format::ListStyle;

    fn import(html: &str) -> TextDocument {
        let mut doc = TextDocument::new();
        HtmlImporter::new(&mut doc, html, ImportMode::Fragment, None).import();
        doc
    }

    #[test]
    fn test_whitespace_collapses() {
        let doc = import("<p>a   \n  b</p>");
        assert_eq!(doc.to_plain_text(), "a b");
    }

    #[test]
    fn test_first_paragraph_reuses_initial_block() {
        let doc = import("<p>A</p><p>B</p>");
        assert_eq!(doc.block_count(), 2);
        assert_eq!(doc.to_plain_text(), "A\nB");
        assert_eq!(doc.collapsed_margin_before(1), Some(12.0));
    }

    #[test]
    fn test_list_items_share_one_list() {
        let doc = import("<ul><li>x<li>y</ul>");
        let lists = doc.lists();
        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0].count(), 2);
        assert_eq!(lists[0].format().list_style(), ListStyle::Disc);
        assert_eq!(doc.to_plain_text(), "x\ny");
    }

    #[test]
    fn test_nested_bullets_cycle() {
        let doc = import("<ul><li>a<ul><li>b<ul><li>c</li></ul></li></ul></li></ul>");
        let styles: Vec<ListStyle> = doc.lists().iter().map(|l| l.format().list_style()).collect();
        assert_eq!(
            styles,
            [ListStyle::Disc, ListStyle::Circle, ListStyle::Square]
        );
    }

    #[test]
    fn test_text_after_list_gets_own_block() {
        let doc = import("<ul><li>a</li></ul>b");
        assert_eq!(doc.to_plain_text(), "a\nb");
        assert!(doc.block(1).unwrap().list().is_none());
    }

    #[test]
    fn test_table_cells() {
        let doc =
            import("<table><tr><td>a</td><td>b</td></tr><tr><td>c</td><td>d</td></tr></table>");
        let frames = doc.frames();
        assert_eq!(frames.len(), 1);
        let table = frames[0].as_table().unwrap();
        assert_eq!((table.rows(), table.columns()), (2, 2));
        let text: Vec<String> = table
            .cells()
            .iter()
            .map(|cell| doc.text_range(cell.first_position..cell.last_position))
            .collect();
        assert_eq!(text, ["a", "b", "c", "d"]);
    }

    #[test]
    fn test_table_spans_are_clamped() {
        let doc = import(
            r#"<table><tr><td rowspan="5">a</td><td>b</td></tr><tr><td>c</td></tr></table>"#,
        );
        let table = doc.frames()[0].as_table().unwrap();
        assert_eq!((table.rows(), table.columns()), (2, 2));
        let first = table.cell_at(0, 0).unwrap();
        assert_eq!(first.row_span, 2);
        assert_eq!(table.cell_at(1, 1).unwrap().row, 1);
    }

    #[test]
    fn test_overlapping_cell_resumes_after_row_span() {
        let doc = import(
            r#"<table><tr><td>p</td><td colspan="2" rowspan="3">q</td></tr><tr><td colspan="2">r</td><td>s</td></tr></table>"#,
        );
        let table = doc.frames()[0].as_table().unwrap();
        assert_eq!((table.rows(), table.columns()), (2, 4));
    }

    #[test]
    fn test_table_widths_and_header_rows() {
        let doc = import(
            r#"<table><thead><tr><th width="100">h</th><th>i</th></tr></thead><tr><td width="60">a</td><td width="30%">b</td></tr></table>"#,
        );
        let table = doc.frames()[0].as_table().unwrap();
        let format = table.format();
        assert_eq!(format.header_row_count(), 1);
        assert_eq!(
            format.column_width_constraints(),
            [TextLength::Fixed(60.0), TextLength::Percentage(30.0)]
        );
    }

    #[test]
    fn test_named_anchor_on_first_char_only() {
        let doc = import(r#"<a name="here">ab</a>"#);
        let first = doc.formats().format(doc.fragment_at(0).unwrap().format);
        assert_eq!(first.anchor_names(), ["here".to_string()]);
        let second = doc.formats().format(doc.fragment_at(1).unwrap().format);
        assert!(second.anchor_names().is_empty());
    }

    #[test]
    fn test_title_and_hidden_head() {
        let doc = import(
            "<html><head><title> Notes </title><style>p {}</style></head><body>x</body></html>",
        );
        assert_eq!(doc.title(), "Notes");
        assert_eq!(doc.to_plain_text(), "x");
    }

    #[test]
    fn test_clipboard_markers() {
        let doc = import("junk<!--StartFragment--><b>x</b><!--EndFragment-->tail");
        assert_eq!(doc.to_plain_text(), "x");
        let doc = import("<!--EndFragment-->a<!--StartFragment-->b");
        assert_eq!(doc.to_plain_text(), "b");
    }

    #[test]
    fn test_header_enables_text_edit_mode() {
        let mut doc = TextDocument::new();
        let html = r#"<html><head><meta name="qrichtext" content="1" /></head><body><!--StartFragment-->a  b<!--EndFragment--></body></html>"#;
        let importer = HtmlImporter::new(&mut doc, html, ImportMode::Fragment, None);
        assert!(importer.text_edit_mode());
        importer.import();
        assert_eq!(doc.to_plain_text(), "a  b");
    }

    #[test]
    fn test_preformatted_text() {
        let doc = import("<pre>a\n  b</pre>");
        assert_eq!(doc.to_plain_text(), "a\n  b");
        assert!(doc.block(0).unwrap().format().non_breakable_lines());
    }

    #[test]
    fn test_heading_level() {
        let doc = import("<h2>t</h2><p>u</p>");
        assert_eq!(doc.block(0).unwrap().format().heading_level(), 2);
        assert_eq!(doc.block(1).unwrap().format().heading_level(), 0);
    }

    #[test]
    fn test_horizontal_rule_block() {
        let doc = import("<p>a</p><hr><p>b</p>");
        assert_eq!(doc.block_count(), 3);
        assert!(doc.block(1).unwrap().format().horizontal_ruler_width().is_some());
    }

    #[test]
    fn test_image_with_provider() {
        struct Images;
        impl ResourceProvider for Images {
            fn resource(&self, name: &str) -> Option<Resource> {
                (name == "pic.png").then_some(Resource::Image {
                    width: 4.0,
                    height: 3.0,
                })
            }
        }
        let mut doc = TextDocument::new();
        HtmlImporter::new(
            &mut doc,
            r#"<img src="pic.png" alt="p" width="10">"#,
            ImportMode::Fragment,
            Some(&Images),
        )
        .import();
        assert_eq!(doc.to_raw_text(), "\u{FFFC}");
        let format = doc.formats().format(doc.fragment_at(0).unwrap().format);
        assert_eq!(format.image_name(), Some("pic.png"));
        assert_eq!(format.image_alt_text(), Some("p"));
        assert_eq!(format.image_width(), Some(10.0));
        assert!(doc.resources().contains_key("pic.png"));
    }

    #[test]
    fn test_line_break_stays_in_block() {
        let doc = import("<p>a<br>b</p>");
        assert_eq!(doc.block_count(), 1);
        assert_eq!(doc.to_raw_text(), "a\u{2028}b");
    }

    #[test]
    fn test_body_background_moves_to_root_frame() {
        let doc = import(r##"<body bgcolor="#00ff00">x</body>"##);
        assert_eq!(
            doc.root_frame_format().background(),
            Some(crate::format::Color::rgb(0, 255, 0))
        );
        let format = doc.formats().format(doc.fragment_at(0).unwrap().format);
        assert_eq!(format.background(), None);
    }

    #[test]
    fn test_narrower_width() {
        assert_eq!(
            narrower(TextLength::Fixed(50.0), TextLength::Fixed(20.0)),
            TextLength::Fixed(20.0)
        );
        assert_eq!(
            narrower(TextLength::Fixed(50.0), TextLength::Percentage(20.0)),
            TextLength::Fixed(50.0)
        );
        assert_eq!(
            narrower(TextLength::Variable, TextLength::Percentage(20.0)),
            TextLength::Percentage(20.0)
        );
    }
}
