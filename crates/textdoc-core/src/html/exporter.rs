//! HTML export.
//!
//! Output follows the rich-text editor dialect the importer understands:
//! the `qrichtext` header switches the importer to text-edit whitespace
//! handling, every block spells out its margins, text frames become
//! `-qt-table-type: frame` tables and empty blocks carry
//! `-qt-paragraph-type: empty`.

use std::fmt::Write;

use tracing::debug;

use crate::document::TextDocument;
use crate::format::{
    Alignment, BorderStyle, Color, Edge, Format, FormatKind, FramePosition, LayoutDirection,
    ListStyle, ObjectIndex, PageBreak, Property, TextLength, VerticalAlignment,
};
use crate::storage::FragmentRun;
use crate::structure::{Block, Frame, TableCell, TextTable};
use crate::text::{FRAME_BEGIN, FRAME_END, LINE_SEPARATOR, OBJECT_REPLACEMENT};

const DOCTYPE: &str = r#"<!DOCTYPE HTML PUBLIC "-//W3C//DTD HTML 4.0//EN" "http://www.w3.org/TR/REC-html40/strict.dtd">"#;
const RICH_TEXT_HEADER: &str = r#"<meta name="qrichtext" content="1" />"#;

/// What the exported markup stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportMode {
    /// A whole document, including its title.
    #[default]
    Document,
    /// Clipboard content, wrapped in fragment markers.
    Fragment,
}

/// Serializes a [`TextDocument`] to HTML.
#[derive(Debug)]
pub struct HtmlExporter<'a> {
    doc: &'a TextDocument,
    runs: Vec<FragmentRun>,
    frames: Vec<Frame<'a>>,
    /// Open lists as (object, list indent), innermost last.
    lists: Vec<(ObjectIndex, i64)>,
    out: String,
}

impl<'a> HtmlExporter<'a> {
    /// Exporter over `doc`.
    pub fn new(doc: &'a TextDocument) -> Self {
        Self {
            doc,
            runs: doc.fragments().collect(),
            frames: doc.frames(),
            lists: Vec::new(),
            out: String::new(),
        }
    }

    /// Render the document.
    pub fn to_html(mut self, mode: ExportMode) -> String {
        self.out.push_str(DOCTYPE);
        self.out.push_str("\n<html><head>");
        self.out.push_str(RICH_TEXT_HEADER);
        self.out.push_str(r#"<meta charset="utf-8" />"#);
        if mode == ExportMode::Document && !self.doc.title().is_empty() {
            self.out.push_str("<title>");
            html_escape::encode_text_to_string(self.doc.title(), &mut self.out);
            self.out.push_str("</title>");
        }
        self.out.push_str("</head><body");
        if let Some(background) = self.doc.root_frame_format().background() {
            self.push_attribute("bgcolor", &background.to_hex());
        }
        self.out.push_str(">\n");
        if mode == ExportMode::Fragment {
            self.out.push_str("<!--StartFragment-->");
        }

        self.emit_range(0, self.doc.len() - 1);

        if mode == ExportMode::Fragment {
            self.out.push_str("<!--EndFragment-->");
        }
        self.out.push_str("</body></html>");
        debug!(len = self.out.len(), ?mode, "html export");
        self.out
    }

    /// Emit the blocks between `start` and the separator at `end`, recursing
    /// into frames that begin on the way.
    fn emit_range(&mut self, start: usize, end: usize) {
        let doc = self.doc;
        let mut position = start;
        while position <= end {
            let Some(block) = doc.find_block(position) else {
                break;
            };
            let separator = block.position() + block.length() - 1;
            let frame_follows = separator < end && doc.char_at(separator) == Some(FRAME_BEGIN);
            let empty = block.length() == 1;
            // Blocks the importer creates on its own: the block a frame is
            // inserted into at the start of a range, the block left after a
            // closing frame and the only block of an empty cell or frame.
            let implicit = empty
                && ((position == start && (frame_follows || separator == end))
                    || (separator == end
                        && position > start
                        && doc.char_at(position - 1) == Some(FRAME_END)));
            if !implicit {
                self.emit_block(&block, separator);
            }

            if frame_follows {
                self.close_lists(0);
                let frame = self
                    .frames
                    .iter()
                    .find(|frame| frame.first_position() == separator + 1)
                    .cloned();
                if let Some(frame) = frame {
                    self.emit_frame(&frame);
                    position = frame.last_position() + 1;
                    continue;
                }
            }
            position = separator + 1;
        }
        self.close_lists(0);
    }

    fn emit_block(&mut self, block: &Block<'a>, separator: usize) {
        let format = block.format();

        if let Some(width) = format.horizontal_ruler_width() {
            self.close_lists(0);
            self.out.push_str("<hr");
            if let Some(width) = length_attribute(width) {
                self.push_attribute("width", &width);
            }
            self.out.push_str(" />\n");
            return;
        }

        let list = block.list();
        match &list {
            Some(list) => self.open_list(list.object_index(), list.format()),
            None => self.close_lists(0),
        }

        let tag = match format.heading_level() {
            _ if list.is_some() => "li".to_string(),
            level @ 1..=6 => format!("h{level}"),
            _ => "p".to_string(),
        };
        let empty = block.length() == 1;

        let _ = write!(self.out, "<{tag}");
        if let Some(alignment) = format.alignment() {
            self.push_attribute("align", alignment_name(alignment));
        }
        if format.layout_direction() == Some(LayoutDirection::RightToLeft) {
            self.push_attribute("dir", "rtl");
        }
        let style = block_style(format, empty, block.user_state());
        self.push_attribute("style", &style);
        self.out.push('>');

        if empty {
            self.out.push_str("<br />");
        } else {
            self.emit_text(block.position(), separator);
        }
        let _ = writeln!(self.out, "</{tag}>");
    }

    fn open_list(&mut self, object: ObjectIndex, format: &Format) {
        let indent = format.list_indent();
        while let Some(&(open, open_indent)) = self.lists.last() {
            if open == object {
                return;
            }
            if open_indent < indent {
                break;
            }
            self.close_lists(self.lists.len() - 1);
        }
        let style = format.list_style();
        let tag = if style.is_ordered() { "ol" } else { "ul" };
        let mut css =
            String::from("margin-top: 0px; margin-bottom: 0px; margin-left: 0px; margin-right: 0px; ");
        let _ = write!(
            css,
            "list-style-type: {}; -qt-list-indent: {indent};",
            list_style_name(style)
        );
        if let Some(prefix) = format.list_number_prefix() {
            let _ = write!(css, " -qt-list-number-prefix: '{prefix}';");
        }
        if let Some(suffix) = format.list_number_suffix() {
            let _ = write!(css, " -qt-list-number-suffix: '{suffix}';");
        }
        let _ = write!(self.out, "<{tag}");
        self.push_attribute("style", &css);
        self.out.push('>');
        self.lists.push((object, indent));
    }

    /// Close open lists until only `keep` remain.
    fn close_lists(&mut self, keep: usize) {
        while self.lists.len() > keep {
            let Some((object, _)) = self.lists.pop() else {
                break;
            };
            let ordered = self
                .doc
                .list(object)
                .is_some_and(|list| list.format().list_style().is_ordered());
            self.out.push_str(if ordered { "</ol>" } else { "</ul>" });
        }
    }

    /// Emit the inline content in `start..end`.
    fn emit_text(&mut self, start: usize, end: usize) {
        let first = self.runs.partition_point(|run| run.position + run.len <= start);
        let doc = self.doc;
        for index in first..self.runs.len() {
            let run = self.runs[index];
            if run.position >= end {
                break;
            }
            let from = run.position.max(start);
            let to = (run.position + run.len).min(end);
            let format = doc.formats().format(run.format);
            let text = doc.text_range(from..to);

            if format.kind() == FormatKind::Image {
                for c in text.chars() {
                    if c == OBJECT_REPLACEMENT {
                        self.emit_image(format);
                    }
                }
                continue;
            }

            let anchor = format.is_anchor();
            if anchor {
                self.out.push_str("<a");
                if let Some(href) = format.anchor_href() {
                    self.push_attribute("href", href);
                }
                if let Some(name) = format.anchor_names().first() {
                    self.push_attribute("name", name);
                }
                self.out.push('>');
            }
            let style = char_style(format);
            if !style.is_empty() {
                self.out.push_str("<span");
                self.push_attribute("style", &style);
                self.out.push('>');
            }
            for (i, line) in text.split(LINE_SEPARATOR).enumerate() {
                if i > 0 {
                    self.out.push_str("<br />");
                }
                html_escape::encode_text_to_string(line, &mut self.out);
            }
            if !style.is_empty() {
                self.out.push_str("</span>");
            }
            if anchor {
                self.out.push_str("</a>");
            }
        }
    }

    fn emit_image(&mut self, format: &Format) {
        self.out.push_str("<img");
        self.push_attribute("src", format.image_name().unwrap_or_default());
        if let Some(alt) = format.image_alt_text() {
            self.push_attribute("alt", alt);
        }
        if let Some(title) = format.image_title() {
            self.push_attribute("title", title);
        }
        if let Some(width) = format.image_width() {
            self.push_attribute("width", &width.to_string());
        }
        if let Some(height) = format.image_height() {
            self.push_attribute("height", &height.to_string());
        }
        if let Some(float) = float_name(format.frame_position()) {
            self.push_attribute("style", &format!("float: {float};"));
        }
        self.out.push_str(" />");
    }

    fn emit_frame(&mut self, frame: &Frame<'a>) {
        if let Some(table) = frame.as_table() {
            self.emit_table(&table);
            return;
        }
        let format = frame.format();
        self.out.push_str("<table");
        self.push_attribute("border", &format.frame_border().to_string());
        let mut style = String::from("-qt-table-type: frame; ");
        frame_style(&mut style, format);
        self.push_attribute("style", &style);
        self.push_length_attributes(format);
        self.out.push_str(r#"><tr><td style="border: none;">"#);
        self.emit_range(frame.first_position(), frame.last_position());
        self.out.push_str("</td></tr></table>\n");
    }

    fn emit_table(&mut self, table: &TextTable<'a>) {
        let format = table.format();
        let cells = table.cells();
        debug!(rows = table.rows(), columns = table.columns(), "export table");

        self.out.push_str("<table");
        self.push_attribute("border", &format.frame_border().to_string());
        self.push_attribute("cellspacing", &format.cell_spacing().to_string());
        self.push_attribute("cellpadding", &format.table_cell_padding().to_string());
        if let Some(alignment) = format.alignment() {
            self.push_attribute("align", alignment_name(alignment));
        }
        if let Some(background) = format.background() {
            self.push_attribute("bgcolor", &background.to_hex());
        }
        self.push_length_attributes(format);
        let mut style = String::new();
        frame_style(&mut style, format);
        if format.border_collapse() {
            style.push_str("border-collapse: collapse; ");
        }
        self.push_attribute("style", style.trim_end());
        self.out.push('>');

        let header_rows = format.header_row_count().min(table.rows());
        let widths = format.column_width_constraints();
        if header_rows > 0 {
            self.out.push_str("<thead>");
        }
        for row in 0..table.rows() {
            if header_rows > 0 && row == header_rows {
                self.out.push_str("</thead>");
            }
            self.out.push_str("<tr>");
            for cell in cells.iter().filter(|cell| cell.row == row) {
                let width = (cell.column_span == 1)
                    .then(|| widths.get(cell.column).copied())
                    .flatten();
                self.emit_cell(cell, width);
            }
            self.out.push_str("</tr>");
        }
        if header_rows == table.rows() && header_rows > 0 {
            self.out.push_str("</thead>");
        }
        self.out.push_str("</table>\n");
    }

    fn emit_cell(&mut self, cell: &TableCell, width: Option<TextLength>) {
        let format = cell.format(self.doc);
        self.out.push_str("<td");
        if let Some(width) = width.and_then(length_attribute) {
            self.push_attribute("width", &width);
        }
        if cell.row_span > 1 {
            self.push_attribute("rowspan", &cell.row_span.to_string());
        }
        if cell.column_span > 1 {
            self.push_attribute("colspan", &cell.column_span.to_string());
        }
        if let Some(background) = format.background() {
            self.push_attribute("bgcolor", &background.to_hex());
        }
        let mut style = String::new();
        for edge in Edge::ALL {
            let side = edge_name(edge);
            if let Some(padding) = format.cell_padding(edge) {
                let _ = write!(style, "padding-{side}: {padding}px; ");
            }
            if let Some(width) = format.cell_border(edge) {
                let _ = write!(style, "border-{side}-width: {width}px; ");
            }
            if let Some(border) = format.cell_border_style(edge) {
                let _ = write!(style, "border-{side}-style: {}; ", border_style_name(border));
            }
            if let Some(color) = format.cell_border_brush(edge) {
                let _ = write!(style, "border-{side}-color: {}; ", color.to_hex());
            }
        }
        if !style.is_empty() {
            self.push_attribute("style", style.trim_end());
        }
        self.out.push('>');
        self.emit_range(cell.first_position, cell.last_position);
        self.out.push_str("</td>");
    }

    fn push_length_attributes(&mut self, format: &Format) {
        if let Some(width) = length_attribute(format.frame_width()) {
            self.push_attribute("width", &width);
        }
        if let Some(height) = length_attribute(format.frame_height()) {
            self.push_attribute("height", &height);
        }
    }

    fn push_attribute(&mut self, name: &str, value: &str) {
        let _ = write!(self.out, " {name}=\"");
        html_escape::encode_double_quoted_attribute_to_string(value, &mut self.out);
        self.out.push('"');
    }
}

fn block_style(format: &Format, empty: bool, user_state: i32) -> String {
    let mut style = String::new();
    if empty {
        style.push_str("-qt-paragraph-type: empty; ");
    }
    let _ = write!(
        style,
        "margin-top: {}px; margin-bottom: {}px; margin-left: {}px; margin-right: {}px; -qt-block-indent: {};",
        format.top_margin(),
        format.bottom_margin(),
        format.left_margin(),
        format.right_margin(),
        format.indent(),
    );
    if format.non_breakable_lines() {
        style.push_str(" white-space: pre;");
    }
    if let Some(background) = format.background() {
        let _ = write!(style, " background-color: {};", background.to_hex());
    }
    match format.page_break_policy() {
        Some(PageBreak::AlwaysBefore) => style.push_str(" page-break-before: always;"),
        Some(PageBreak::AlwaysAfter) => style.push_str(" page-break-after: always;"),
        None => {}
    }
    if user_state != -1 {
        let _ = write!(style, " -qt-user-state: {user_state};");
    }
    style
}

/// Inline CSS for the explicitly set char properties of `format`.
fn char_style(format: &Format) -> String {
    let mut style = String::new();
    if let Some(family) = format.font_family() {
        let _ = write!(style, "font-family: '{family}'; ");
    }
    if let Some(size) = format.font_point_size() {
        let _ = write!(style, "font-size: {size}pt; ");
    } else if format.has(Property::FontSizeAdjustment) {
        let _ = write!(
            style,
            "font-size: {}; ",
            font_size_keyword(format.font_size_adjustment())
        );
    }
    if format.has(Property::FontWeight) {
        let _ = write!(style, "font-weight: {}; ", format.font_weight());
    }
    if format.has(Property::FontItalic) {
        let italic = if format.font_italic() { "italic" } else { "normal" };
        let _ = write!(style, "font-style: {italic}; ");
    }
    if format.has(Property::FontUnderline) || format.has(Property::FontStrikeOut) {
        let mut decorations = Vec::new();
        if format.font_underline() {
            decorations.push("underline");
        }
        if format.font_strike_out() {
            decorations.push("line-through");
        }
        if decorations.is_empty() {
            decorations.push("none");
        }
        let _ = write!(style, "text-decoration: {}; ", decorations.join(" "));
    }
    match format.vertical_alignment() {
        Some(VerticalAlignment::Sub) => style.push_str("vertical-align: sub; "),
        Some(VerticalAlignment::Super) => style.push_str("vertical-align: super; "),
        None => {}
    }
    if let Some(color) = format.foreground() {
        let _ = write!(style, "color: {}; ", color_css(color));
    }
    if let Some(color) = format.background() {
        let _ = write!(style, "background-color: {}; ", color_css(color));
    }
    style.truncate(style.trim_end().len());
    style
}

fn frame_style(style: &mut String, format: &Format) {
    for edge in Edge::ALL {
        let _ = write!(
            style,
            "margin-{}: {}px; ",
            edge_name(edge),
            format.frame_margin(edge)
        );
    }
    if let Some(border) = format.frame_border_style() {
        let _ = write!(style, "border-style: {}; ", border_style_name(border));
    }
    if let Some(color) = format.frame_border_brush() {
        let _ = write!(style, "border-color: {}; ", color.to_hex());
    }
    if let Some(float) = float_name(format.frame_position()) {
        let _ = write!(style, "float: {float}; ");
    }
    match format.page_break_policy() {
        Some(PageBreak::AlwaysBefore) => style.push_str("page-break-before: always; "),
        Some(PageBreak::AlwaysAfter) => style.push_str("page-break-after: always; "),
        None => {}
    }
}

fn color_css(color: Color) -> String {
    if color.a == 255 {
        color.to_hex()
    } else {
        format!("rgba({},{},{},{})", color.r, color.g, color.b, color.a)
    }
}

fn length_attribute(length: TextLength) -> Option<String> {
    match length {
        TextLength::Variable => None,
        TextLength::Fixed(value) => Some(value.to_string()),
        TextLength::Percentage(value) => Some(format!("{value}%")),
    }
}

fn font_size_keyword(adjustment: i64) -> &'static str {
    match adjustment {
        i64::MIN..=-3 => "xx-small",
        -2 => "x-small",
        -1 => "small",
        0 => "medium",
        1 => "large",
        2 => "x-large",
        _ => "xx-large",
    }
}

fn alignment_name(alignment: Alignment) -> &'static str {
    match alignment {
        Alignment::Left => "left",
        Alignment::Right => "right",
        Alignment::Center => "center",
        Alignment::Justify => "justify",
    }
}

fn list_style_name(style: ListStyle) -> &'static str {
    match style {
        ListStyle::Disc => "disc",
        ListStyle::Circle => "circle",
        ListStyle::Square => "square",
        ListStyle::Decimal => "decimal",
        ListStyle::LowerAlpha => "lower-alpha",
        ListStyle::UpperAlpha => "upper-alpha",
        ListStyle::LowerRoman => "lower-roman",
        ListStyle::UpperRoman => "upper-roman",
        ListStyle::None => "none",
    }
}

fn border_style_name(style: BorderStyle) -> &'static str {
    match style {
        BorderStyle::None => "none",
        BorderStyle::Dotted => "dotted",
        BorderStyle::Dashed => "dashed",
        BorderStyle::Solid => "solid",
        BorderStyle::Double => "double",
        BorderStyle::Groove => "groove",
        BorderStyle::Ridge => "ridge",
        BorderStyle::Inset => "inset",
        BorderStyle::Outset => "outset",
    }
}

fn float_name(position: FramePosition) -> Option<&'static str> {
    match position {
        FramePosition::InFlow => None,
        FramePosition::FloatLeft => Some("left"),
        FramePosition::FloatRight => Some("right"),
    }
}

fn edge_name(edge: Edge) -> &'static str {
    match edge {
        Edge::Top => "top",
        Edge::Right => "right",
        Edge::Bottom => "bottom",
        Edge::Left => "left",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn export(doc: &TextDocument, mode: ExportMode) -> String {
        HtmlExporter::new(doc).to_html(mode)
    }

    #[test]
    fn test_paragraphs_and_escaping() {
        let doc = TextDocument::from_plain_text("a < b\n&c");
        let html = export(&doc, ExportMode::Document);
        assert!(html.contains(RICH_TEXT_HEADER));
        assert!(html.contains("a &lt; b</p>"));
        assert!(html.contains("&amp;c</p>"));
        assert_eq!(html.matches("<p ").count(), 2);
    }

    #[test]
    fn test_fragment_markers() {
        let doc = TextDocument::from_plain_text("x");
        let html = export(&doc, ExportMode::Fragment);
        let start = html.find("<!--StartFragment-->").unwrap();
        let end = html.find("<!--EndFragment-->").unwrap();
        assert!(start < end);
        assert!(html[start..end].contains(">x</p>"));
    }

    #[test]
    fn test_empty_block_is_marked() {
        let doc = TextDocument::from_plain_text("a\n\nb");
        let html = export(&doc, ExportMode::Document);
        assert_eq!(html.matches("-qt-paragraph-type: empty").count(), 1);
        assert!(html.contains("<br /></p>"));
    }

    #[test]
    fn test_title_only_in_document_mode() {
        let mut doc = TextDocument::from_plain_text("x");
        doc.set_title("A & B");
        assert!(export(&doc, ExportMode::Document).contains("<title>A &amp; B</title>"));
        assert!(!export(&doc, ExportMode::Fragment).contains("<title>"));
    }

    #[test]
    fn test_inline_formatting() {
        let mut doc = TextDocument::from_plain_text("bold plain");
        let mut bold = Format::char();
        bold.set_font_weight(700);
        bold.set_foreground(Color::rgb(255, 0, 0));
        doc.merge_char_format(0..4, &bold).unwrap();
        let html = export(&doc, ExportMode::Document);
        assert!(html.contains(
            r#"<span style="font-weight: 700; color: #ff0000;">bold</span> plain"#
        ));
    }

    #[test]
    fn test_line_separator_becomes_br() {
        let doc = TextDocument::from_plain_text("a\u{2028}b");
        let html = export(&doc, ExportMode::Document);
        assert!(html.contains("a<br />b</p>"));
    }

    #[test]
    fn test_char_style_decorations() {
        let mut format = Format::char();
        format.set_font_underline(true);
        format.set_font_strike_out(true);
        format.set_vertical_alignment(VerticalAlignment::Super);
        assert_eq!(
            char_style(&format),
            "text-decoration: underline line-through; vertical-align: super;"
        );
        assert_eq!(char_style(&Format::char()), "");
    }

    #[test]
    fn test_table_with_spans() {
        let mut doc = TextDocument::new();
        let mut format = Format::table(2);
        format.set_header_row_count(1);
        let table = doc.insert_table(0, 2, 2, &format).unwrap();
        doc.merge_cells(table, 0, 0, 1, 2).unwrap();
        let html = export(&doc, ExportMode::Document);
        assert!(html.contains(r#"<td colspan="2">"#));
        assert_eq!(html.matches("<td").count(), 3);
        assert_eq!(html.matches("<tr>").count(), 2);
        assert!(html.contains("<thead>"));
    }

    #[test]
    fn test_length_attribute() {
        assert_eq!(length_attribute(TextLength::Variable), None);
        assert_eq!(length_attribute(TextLength::Fixed(40.0)), Some("40".to_string()));
        assert_eq!(
            length_attribute(TextLength::Percentage(50.0)),
            Some("50%".to_string())
        );
    }
}
