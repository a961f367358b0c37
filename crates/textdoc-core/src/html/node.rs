//! Parsed HTML nodes.
//!
//! The parser flattens the DOM into a [`Vec`] of [`HtmlNode`]s in document
//! order. Node 0 is a synthetic root; every other node names its parent by
//! index, so "how many tags closed between two nodes" is answered by walking
//! parent indices.

use crate::format::{BorderStyle, Color, Edge, Format, FramePosition, ListStyle, TextLength};

/// Element identity, closed over the tags the importer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[allow(missing_docs)]
pub enum Tag {
    /// Anonymous text runs, the root node and unsupported elements.
    #[default]
    Unknown,
    Html,
    Head,
    Title,
    Meta,
    Style,
    Script,
    Body,
    P,
    Div,
    Span,
    Br,
    Hr,
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
    Ul,
    Ol,
    Li,
    Dl,
    Dt,
    Dd,
    Table,
    Thead,
    Tbody,
    Tfoot,
    Tr,
    Td,
    Th,
    Caption,
    Img,
    A,
    B,
    Strong,
    I,
    Em,
    Cite,
    Dfn,
    Var,
    U,
    Ins,
    S,
    Strike,
    Del,
    Code,
    Tt,
    Kbd,
    Samp,
    Pre,
    Blockquote,
    Center,
    Address,
    Sub,
    Sup,
    Font,
    Big,
    Small,
    Nobr,
    Q,
}

impl Tag {
    /// Tag for a (case-insensitive) element name.
    pub fn from_name(name: &str) -> Tag {
        match name.to_ascii_lowercase().as_str() {
            "html" => Tag::Html,
            "head" => Tag::Head,
            "title" => Tag::Title,
            "meta" => Tag::Meta,
            "style" => Tag::Style,
            "script" => Tag::Script,
            "body" => Tag::Body,
            "p" => Tag::P,
            "div" => Tag::Div,
            "span" => Tag::Span,
            "br" => Tag::Br,
            "hr" => Tag::Hr,
            "h1" => Tag::H1,
            "h2" => Tag::H2,
            "h3" => Tag::H3,
            "h4" => Tag::H4,
            "h5" => Tag::H5,
            "h6" => Tag::H6,
            "ul" => Tag::Ul,
            "ol" => Tag::Ol,
            "li" => Tag::Li,
            "dl" => Tag::Dl,
            "dt" => Tag::Dt,
            "dd" => Tag::Dd,
            "table" => Tag::Table,
            "thead" => Tag::Thead,
            "tbody" => Tag::Tbody,
            "tfoot" => Tag::Tfoot,
            "tr" => Tag::Tr,
            "td" => Tag::Td,
            "th" => Tag::Th,
            "caption" => Tag::Caption,
            "img" => Tag::Img,
            "a" => Tag::A,
            "b" => Tag::B,
            "strong" => Tag::Strong,
            "i" => Tag::I,
            "em" => Tag::Em,
            "cite" => Tag::Cite,
            "dfn" => Tag::Dfn,
            "var" => Tag::Var,
            "u" => Tag::U,
            "ins" => Tag::Ins,
            "s" => Tag::S,
            "strike" => Tag::Strike,
            "del" => Tag::Del,
            "code" => Tag::Code,
            "tt" => Tag::Tt,
            "kbd" => Tag::Kbd,
            "samp" => Tag::Samp,
            "pre" => Tag::Pre,
            "blockquote" => Tag::Blockquote,
            "center" => Tag::Center,
            "address" => Tag::Address,
            "sub" => Tag::Sub,
            "sup" => Tag::Sup,
            "font" => Tag::Font,
            "big" => Tag::Big,
            "small" => Tag::Small,
            "nobr" => Tag::Nobr,
            "q" => Tag::Q,
            _ => Tag::Unknown,
        }
    }

    /// Display mode before any `display` declaration.
    pub fn default_display(self) -> DisplayMode {
        match self {
            Tag::Head | Tag::Title | Tag::Meta | Tag::Style | Tag::Script => DisplayMode::None,
            Tag::Table | Tag::Thead | Tag::Tbody | Tag::Tfoot | Tag::Tr => DisplayMode::Table,
            Tag::Html
            | Tag::Body
            | Tag::P
            | Tag::Div
            | Tag::Hr
            | Tag::H1
            | Tag::H2
            | Tag::H3
            | Tag::H4
            | Tag::H5
            | Tag::H6
            | Tag::Ul
            | Tag::Ol
            | Tag::Li
            | Tag::Dl
            | Tag::Dt
            | Tag::Dd
            | Tag::Td
            | Tag::Th
            | Tag::Caption
            | Tag::Pre
            | Tag::Blockquote
            | Tag::Center
            | Tag::Address => DisplayMode::Block,
            _ => DisplayMode::Inline,
        }
    }

    /// Heading level of `h1`..`h6`.
    pub fn heading_level(self) -> Option<u8> {
        match self {
            Tag::H1 => Some(1),
            Tag::H2 => Some(2),
            Tag::H3 => Some(3),
            Tag::H4 => Some(4),
            Tag::H5 => Some(5),
            Tag::H6 => Some(6),
            _ => None,
        }
    }
}

/// CSS `white-space` mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WhiteSpaceMode {
    /// Collapse runs, wrap.
    #[default]
    Normal,
    /// Keep everything, no wrapping.
    Pre,
    /// Collapse runs, no wrapping.
    NoWrap,
    /// Keep everything, wrap.
    PreWrap,
    /// Collapse spaces but keep newlines.
    PreLine,
}

/// CSS `display` mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    /// Flows inside the current block.
    #[default]
    Inline,
    /// Opens a block.
    Block,
    /// Table structure (rows and row groups).
    Table,
    /// Not rendered.
    None,
}

/// One node of the flattened tree.
#[derive(Debug, Clone)]
pub struct HtmlNode {
    /// Element identity.
    pub tag: Tag,
    /// Index of the parent node (0 for the root and its children).
    pub parent: usize,
    /// Child node indices in order.
    pub children: Vec<usize>,
    /// Text before the first child element (the whole text for leaves).
    pub text: String,
    /// Resolved char format.
    pub char_format: Format,
    /// Block format properties set by this node.
    pub block_format: Format,
    /// Resolved whitespace mode.
    pub white_space: WhiteSpaceMode,
    /// Resolved display mode.
    pub display: DisplayMode,
    /// Margins indexed by [`Edge`].
    pub margin: [f64; 4],
    /// Paddings indexed by [`Edge`], `None` when not given.
    pub padding: [Option<f64>; 4],
    /// Cell border widths indexed by [`Edge`].
    pub cell_border: [f64; 4],
    /// Cell border styles indexed by [`Edge`].
    pub cell_border_style: [Option<BorderStyle>; 4],
    /// Cell border colours indexed by [`Edge`].
    pub cell_border_brush: [Option<Color>; 4],
    /// List style (inherited, overridden by `ul`/`ol` and `list-style-type`).
    pub list_style: ListStyle,
    /// Set when the style came from markup rather than the tag default.
    pub has_own_list_style: bool,
    /// `-qt-list-number-prefix`.
    pub list_number_prefix: Option<String>,
    /// `-qt-list-number-suffix`.
    pub list_number_suffix: Option<String>,
    /// `-qt-list-indent`.
    pub css_list_indent: Option<i64>,
    /// `rowspan` of a cell.
    pub table_cell_row_span: usize,
    /// `colspan` of a cell.
    pub table_cell_column_span: usize,
    /// `cellspacing` of a table.
    pub table_cell_spacing: f64,
    /// `cellpadding` of a table.
    pub table_cell_padding: f64,
    /// `border` width of a table.
    pub table_border: f64,
    /// Border style of a table.
    pub border_style: BorderStyle,
    /// Border colour of a table.
    pub border_brush: Option<Color>,
    /// `border-collapse: collapse`.
    pub border_collapse: bool,
    /// Width of tables, cells, rules and images.
    pub width: TextLength,
    /// Height of tables and images.
    pub height: TextLength,
    /// `-qt-table-type: frame` (or `root`).
    pub is_text_frame: bool,
    /// `-qt-table-type: root`.
    pub is_root_frame: bool,
    /// CSS `float`.
    pub float: FramePosition,
    /// `src` of an image.
    pub image_name: String,
    /// `alt` of an image.
    pub image_alt: String,
    /// `-qt-user-state`, -1 when unset.
    pub user_state: i32,
    /// `-qt-paragraph-type: empty`.
    pub is_empty_paragraph: bool,
}

impl Default for HtmlNode {
    fn default() -> Self {
        Self {
            tag: Tag::Unknown,
            parent: 0,
            children: Vec::new(),
            text: String::new(),
            char_format: Format::char(),
            block_format: Format::block(),
            white_space: WhiteSpaceMode::Normal,
            display: DisplayMode::Inline,
            margin: [0.0; 4],
            padding: [None; 4],
            cell_border: [0.0; 4],
            cell_border_style: [None; 4],
            cell_border_brush: [None; 4],
            list_style: ListStyle::Disc,
            has_own_list_style: false,
            list_number_prefix: None,
            list_number_suffix: None,
            css_list_indent: None,
            table_cell_row_span: 1,
            table_cell_column_span: 1,
            table_cell_spacing: 2.0,
            table_cell_padding: 0.0,
            table_border: 0.0,
            border_style: BorderStyle::Outset,
            border_brush: None,
            border_collapse: false,
            width: TextLength::Variable,
            height: TextLength::Variable,
            is_text_frame: false,
            is_root_frame: false,
            float: FramePosition::InFlow,
            image_name: String::new(),
            image_alt: String::new(),
            user_state: -1,
            is_empty_paragraph: false,
        }
    }
}

impl HtmlNode {
    /// Returns `true` if the node opens a block.
    pub fn is_block(&self) -> bool {
        self.display == DisplayMode::Block
    }

    /// Returns `true` for `td` and `th`.
    pub fn is_table_cell(&self) -> bool {
        matches!(self.tag, Tag::Td | Tag::Th)
    }

    /// Returns `true` for `ul` and `ol`.
    pub fn is_list_start(&self) -> bool {
        matches!(self.tag, Tag::Ul | Tag::Ol)
    }

    /// Returns `true` if the node's own text is whitespace only.
    pub fn has_only_whitespace(&self) -> bool {
        self.text.chars().all(char::is_whitespace)
    }

    /// Margin on one edge.
    pub fn margin(&self, edge: Edge) -> f64 {
        self.margin[edge_slot(edge)]
    }

    /// Padding on one edge.
    pub fn padding(&self, edge: Edge) -> Option<f64> {
        self.padding[edge_slot(edge)]
    }
}

/// Array slot of an edge in the per-edge node fields.
pub(crate) fn edge_slot(edge: Edge) -> usize {
    match edge {
        Edge::Top => 0,
        Edge::Right => 1,
        Edge::Bottom => 2,
        Edge::Left => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_lookup_is_case_insensitive() {
        assert_eq!(Tag::from_name("TABLE"), Tag::Table);
        assert_eq!(Tag::from_name("Li"), Tag::Li);
        assert_eq!(Tag::from_name("marquee"), Tag::Unknown);
    }

    #[test]
    fn test_default_display() {
        assert_eq!(Tag::P.default_display(), DisplayMode::Block);
        assert_eq!(Tag::Tbody.default_display(), DisplayMode::Table);
        assert_eq!(Tag::Title.default_display(), DisplayMode::None);
        assert_eq!(Tag::B.default_display(), DisplayMode::Inline);
    }

    #[test]
    fn test_whitespace_only_text() {
        let mut node = HtmlNode {
            text: " \n\t".into(),
            ..HtmlNode::default()
        };
        assert!(node.has_only_whitespace());
        node.text.push('x');
        assert!(!node.has_only_whitespace());
    }
}
