//! HTML to [`NodeStream`].
//!
//! `scraper` (html5ever) does the tokenizing and tree repair; this module
//! walks the resulting DOM once and resolves every element into an
//! [`HtmlNode`]: tag defaults first, then presentational attributes, then
//! the inline `style` attribute. Inherited properties (char format,
//! whitespace mode, alignment, list style) are copied from the parent node at
//! creation time so the importer never has to look up the tree for them.

use std::ops::Index;

use scraper::node::Element;
use scraper::{ElementRef, Html};
use tracing::{debug, trace};

use super::css::{
    self, Declaration, FontSize, expand_box, parse_border_shorthand, parse_border_style,
    parse_color, parse_declarations, parse_length, parse_pixels,
};
use super::node::{DisplayMode, HtmlNode, Tag, WhiteSpaceMode, edge_slot};
use crate::format::{
    Alignment, BorderStyle, Color, Edge, FramePosition, LayoutDirection, ListStyle, PageBreak,
    Property, VerticalAlignment,
};
use crate::text::LINE_SEPARATOR;

const MONOSPACE_FAMILY: &str = "Courier New,courier";
const LINK_COLOR: Color = Color::rgb(0, 0, 255);

/// Parsed document in document order. Node 0 is a synthetic root.
#[derive(Debug, Clone, Default)]
pub struct NodeStream {
    nodes: Vec<HtmlNode>,
    text_edit_mode: bool,
}

impl NodeStream {
    /// Parse `html` into a node stream.
    pub fn parse(html: &str) -> Self {
        let document = Html::parse_document(html);
        let mut builder = Builder {
            nodes: vec![HtmlNode::default()],
            text_edit_mode: false,
        };
        builder.visit_element(document.root_element(), 0);
        debug!(
            nodes = builder.nodes.len(),
            text_edit_mode = builder.text_edit_mode,
            "parsed html"
        );
        Self {
            nodes: builder.nodes,
            text_edit_mode: builder.text_edit_mode,
        }
    }

    /// Number of nodes, including the root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if there is not even a root node.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node at `index`.
    pub fn get(&self, index: usize) -> Option<&HtmlNode> {
        self.nodes.get(index)
    }

    /// All nodes.
    pub fn nodes(&self) -> &[HtmlNode] {
        &self.nodes
    }

    pub(crate) fn node_mut(&mut self, index: usize) -> &mut HtmlNode {
        &mut self.nodes[index]
    }

    /// Returns `true` if the markup carried the rich-text editor header.
    pub fn text_edit_mode(&self) -> bool {
        self.text_edit_mode
    }

    pub(crate) fn set_text_edit_mode(&mut self, enabled: bool) {
        self.text_edit_mode = enabled;
    }

    /// Distance from the root (the root has depth 0).
    pub fn depth(&self, mut index: usize) -> usize {
        let mut depth = 0;
        while index != 0 {
            index = self.nodes[index].parent;
            depth += 1;
        }
        depth
    }

    /// Number of nodes below `index`.
    pub fn descendant_count(&self, index: usize) -> usize {
        self.nodes[index]
            .children
            .iter()
            .map(|&child| 1 + self.descendant_count(child))
            .sum()
    }

    /// Ancestors of `index`, nearest first, excluding the root.
    pub fn ancestors(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        std::iter::successors(Some(self.nodes[index].parent), move |&i| {
            (i != 0).then(|| self.nodes[i].parent)
        })
        .filter(|&i| i != 0)
    }

    /// Top margin of a node (the root has none).
    pub fn top_margin(&self, index: usize) -> f64 {
        if index == 0 {
            0.0
        } else {
            self.nodes[index].margin(Edge::Top)
        }
    }

    /// Bottom margin of a node (the root has none).
    pub fn bottom_margin(&self, index: usize) -> f64 {
        if index == 0 {
            0.0
        } else {
            self.nodes[index].margin(Edge::Bottom)
        }
    }

    /// Left or right margin accumulated over enclosing blocks, up to the
    /// nearest table cell or inline element.
    pub fn horizontal_margin(&self, mut index: usize, edge: Edge) -> f64 {
        let mut margin = 0.0;
        while index != 0 {
            let node = &self.nodes[index];
            if !node.is_block() && node.tag != Tag::Table {
                break;
            }
            if node.is_table_cell() {
                break;
            }
            margin += node.margin(edge);
            index = node.parent;
        }
        margin
    }
}

impl Index<usize> for NodeStream {
    type Output = HtmlNode;

    fn index(&self, index: usize) -> &HtmlNode {
        &self.nodes[index]
    }
}

enum Child<'a> {
    Text(String),
    Element(ElementRef<'a>),
}

struct Builder {
    nodes: Vec<HtmlNode>,
    text_edit_mode: bool,
}

impl Builder {
    fn visit_element(&mut self, element: ElementRef<'_>, parent: usize) {
        let index = self.push_element(element, parent);
        let children: Vec<Child<'_>> = element
            .children()
            .filter_map(|child| {
                if let Some(text) = child.value().as_text() {
                    Some(Child::Text(String::from(&**text)))
                } else {
                    ElementRef::wrap(child).map(Child::Element)
                }
            })
            .collect();

        let keeps_whitespace = self.text_edit_mode
            || matches!(
                self.nodes[index].white_space,
                WhiteSpaceMode::Pre | WhiteSpaceMode::PreWrap
            );
        let parent_is_block = self.nodes[index].is_block();
        let mut seen_element = false;
        for (i, child) in children.iter().enumerate() {
            match child {
                Child::Element(element) => {
                    seen_element = true;
                    self.visit_element(*element, index);
                }
                Child::Text(text) if !seen_element => self.nodes[index].text.push_str(text),
                Child::Text(text) => {
                    let blank = text.chars().all(char::is_whitespace);
                    if blank && !keeps_whitespace {
                        let before = i.checked_sub(1).and_then(|j| children.get(j));
                        let after = children.get(i + 1);
                        let next_to_block = [before, after].into_iter().flatten().any(|c| {
                            matches!(c, Child::Element(e) if is_block_level(*e))
                        });
                        if next_to_block || (after.is_none() && parent_is_block) {
                            continue;
                        }
                    }
                    self.push_text(index, text);
                }
            }
        }
    }

    fn push_text(&mut self, parent: usize, text: &str) {
        let mut node = self.inherit(parent, Tag::Unknown);
        node.text = text.to_string();
        if self.nodes[parent].display == DisplayMode::None {
            node.display = DisplayMode::None;
        }
        self.append(parent, node);
    }

    fn push_element(&mut self, element: ElementRef<'_>, parent: usize) -> usize {
        let tag = Tag::from_name(element.value().name());
        let mut node = self.inherit(parent, tag);
        let nested_list = std::iter::successors(Some(parent), |&i| {
            (i != 0).then(|| self.nodes[i].parent)
        })
        .any(|i| self.nodes[i].is_list_start());
        apply_tag_defaults(&mut node, nested_list);
        self.apply_attributes(&mut node, element);
        if let Some(style) = element.value().attr("style") {
            for declaration in parse_declarations(style) {
                apply_declaration(&mut node, &declaration);
            }
        }
        if self.nodes[parent].display == DisplayMode::None {
            node.display = DisplayMode::None;
        }
        trace!(?tag, parent, display = ?node.display, "html node");
        self.append(parent, node)
    }

    fn append(&mut self, parent: usize, node: HtmlNode) -> usize {
        let index = self.nodes.len();
        self.nodes[parent].children.push(index);
        self.nodes.push(node);
        index
    }

    fn inherit(&self, parent: usize, tag: Tag) -> HtmlNode {
        let from = &self.nodes[parent];
        let mut node = HtmlNode {
            tag,
            parent,
            display: tag.default_display(),
            white_space: from.white_space,
            list_style: from.list_style,
            char_format: from.char_format.clone(),
            ..HtmlNode::default()
        };
        node.char_format.clear(Property::AnchorNames);
        let keeps_background = (from.tag == Tag::Tr && node.is_table_cell())
            || (from.display == DisplayMode::Inline && node.display == DisplayMode::Inline);
        if !keeps_background {
            node.char_format.clear(Property::Background);
        }
        if from.tag != Tag::Table || tag == Tag::Caption {
            if let Some(alignment) = from.block_format.alignment() {
                node.block_format.set_alignment(alignment);
            }
            if let Some(direction) = from.block_format.layout_direction() {
                node.block_format.set_layout_direction(direction);
            }
        }
        node
    }

    fn apply_attributes(&mut self, node: &mut HtmlNode, element: ElementRef<'_>) {
        let element = element.value();
        if let Some(dir) = element.attr("dir") {
            match dir.trim().to_ascii_lowercase().as_str() {
                "rtl" => node
                    .block_format
                    .set_layout_direction(LayoutDirection::RightToLeft),
                "ltr" => node
                    .block_format
                    .set_layout_direction(LayoutDirection::LeftToRight),
                _ => {}
            }
        }
        if let Some(align) = element.attr("align") {
            if node.tag == Tag::Img {
                node.float = match align.trim().to_ascii_lowercase().as_str() {
                    "left" => FramePosition::FloatLeft,
                    "right" => FramePosition::FloatRight,
                    _ => node.float,
                };
            } else if let Some(alignment) = parse_alignment(align) {
                node.block_format.set_alignment(alignment);
            }
        }
        if let Some(color) = element.attr("bgcolor").and_then(parse_color) {
            node.char_format.set_background(color);
        }

        match node.tag {
            Tag::A => {
                if let Some(href) = element.attr("href") {
                    node.char_format.set_anchor(true);
                    node.char_format.set_anchor_href(href);
                    node.char_format.set_font_underline(true);
                    node.char_format.set_foreground(LINK_COLOR);
                }
                if let Some(name) = element.attr("name").or_else(|| element.attr("id")) {
                    node.char_format.set_anchor(true);
                    node.char_format.set_anchor_names(vec![name.to_string()]);
                }
            }
            Tag::Img => {
                if let Some(src) = element.attr("src") {
                    node.image_name = src.to_string();
                }
                if let Some(alt) = element.attr("alt") {
                    node.image_alt = alt.to_string();
                }
                if let Some(title) = element.attr("title") {
                    node.text = title.to_string();
                }
                apply_size(node, element);
            }
            Tag::Font => {
                if let Some(color) = element.attr("color").and_then(parse_color) {
                    node.char_format.set_foreground(color);
                }
                if let Some(step) = element.attr("size").and_then(css::parse_font_size_attribute) {
                    node.char_format.set_font_size_adjustment(step);
                }
                if let Some(face) = element.attr("face") {
                    node.char_format.set_font_family(face.trim());
                }
            }
            Tag::Table => {
                if let Some(border) = element.attr("border") {
                    // A bare `border` attribute means a one pixel border.
                    node.table_border = parse_pixels(border).unwrap_or(1.0);
                }
                if let Some(spacing) = element.attr("cellspacing").and_then(parse_pixels) {
                    node.table_cell_spacing = spacing;
                }
                if let Some(padding) = element.attr("cellpadding").and_then(parse_pixels) {
                    node.table_cell_padding = padding;
                }
                apply_size(node, element);
            }
            Tag::Td | Tag::Th => {
                if let Some(span) = element.attr("rowspan").and_then(parse_span) {
                    node.table_cell_row_span = span;
                }
                if let Some(span) = element.attr("colspan").and_then(parse_span) {
                    node.table_cell_column_span = span;
                }
                apply_size(node, element);
            }
            Tag::Hr => apply_size(node, element),
            Tag::Ol => {
                let style = match element.attr("type").map(str::trim) {
                    Some("1") => Some(ListStyle::Decimal),
                    Some("a") => Some(ListStyle::LowerAlpha),
                    Some("A") => Some(ListStyle::UpperAlpha),
                    Some("i") => Some(ListStyle::LowerRoman),
                    Some("I") => Some(ListStyle::UpperRoman),
                    _ => None,
                };
                if let Some(style) = style {
                    node.list_style = style;
                    node.has_own_list_style = true;
                }
            }
            Tag::Ul => {
                if let Some(style) = element.attr("type").and_then(parse_list_style) {
                    node.list_style = style;
                    node.has_own_list_style = true;
                }
            }
            Tag::Meta => {
                let rich_text = element
                    .attr("name")
                    .is_some_and(|name| name.eq_ignore_ascii_case("qrichtext"));
                if rich_text && element.attr("content").map(str::trim) == Some("1") {
                    self.text_edit_mode = true;
                }
            }
            _ => {}
        }
    }

}

fn apply_size(node: &mut HtmlNode, element: &Element) {
    if let Some(width) = element.attr("width").and_then(parse_length) {
        node.width = width;
    }
    if let Some(height) = element.attr("height").and_then(parse_length) {
        node.height = height;
    }
}

fn is_block_level(element: ElementRef<'_>) -> bool {
    let mut display = Tag::from_name(element.value().name()).default_display();
    if let Some(style) = element.value().attr("style") {
        for declaration in parse_declarations(style) {
            if declaration.property == "display"
                && let Some(declared) = parse_display(&declaration.value)
            {
                display = declared;
            }
        }
    }
    matches!(display, DisplayMode::Block | DisplayMode::Table)
}

fn apply_tag_defaults(node: &mut HtmlNode, nested_list: bool) {
    let set_vertical = |node: &mut HtmlNode, top: f64, bottom: f64| {
        node.margin[edge_slot(Edge::Top)] = top;
        node.margin[edge_slot(Edge::Bottom)] = bottom;
    };
    let heading = |node: &mut HtmlNode, top: f64, bottom: f64, step: i64| {
        node.margin[edge_slot(Edge::Top)] = top;
        node.margin[edge_slot(Edge::Bottom)] = bottom;
        node.char_format.set_font_size_adjustment(step);
        node.char_format.set_font_weight(700);
    };
    match node.tag {
        Tag::P => set_vertical(node, 12.0, 12.0),
        Tag::H1 => heading(node, 18.0, 12.0, 3),
        Tag::H2 => heading(node, 16.0, 12.0, 2),
        Tag::H3 => heading(node, 14.0, 12.0, 1),
        Tag::H4 => heading(node, 12.0, 12.0, 0),
        Tag::H5 => heading(node, 12.0, 4.0, -1),
        Tag::H6 => heading(node, 12.0, 4.0, -2),
        Tag::Ul | Tag::Ol => {
            if !nested_list {
                set_vertical(node, 12.0, 12.0);
            }
            node.list_style = if node.tag == Tag::Ul {
                ListStyle::Disc
            } else {
                ListStyle::Decimal
            };
            node.has_own_list_style = false;
        }
        Tag::Blockquote => {
            set_vertical(node, 12.0, 12.0);
            node.margin[edge_slot(Edge::Left)] = 40.0;
            node.margin[edge_slot(Edge::Right)] = 40.0;
        }
        Tag::Dl => set_vertical(node, 8.0, 8.0),
        Tag::Dd => node.margin[edge_slot(Edge::Left)] = 30.0,
        Tag::Pre => {
            set_vertical(node, 12.0, 12.0);
            node.white_space = WhiteSpaceMode::Pre;
            node.char_format.set_font_fixed_pitch(true);
            node.char_format.set_font_family(MONOSPACE_FAMILY);
        }
        Tag::Th => {
            node.char_format.set_font_weight(700);
            node.block_format.set_alignment(Alignment::Center);
        }
        Tag::B | Tag::Strong => node.char_format.set_font_weight(700),
        Tag::I | Tag::Em | Tag::Cite | Tag::Dfn | Tag::Var | Tag::Address => {
            node.char_format.set_font_italic(true)
        }
        Tag::U | Tag::Ins => node.char_format.set_font_underline(true),
        Tag::S | Tag::Strike | Tag::Del => node.char_format.set_font_strike_out(true),
        Tag::Code | Tag::Tt | Tag::Kbd | Tag::Samp => {
            node.char_format.set_font_fixed_pitch(true);
            node.char_format.set_font_family(MONOSPACE_FAMILY);
        }
        Tag::Sub => node
            .char_format
            .set_vertical_alignment(VerticalAlignment::Sub),
        Tag::Sup => node
            .char_format
            .set_vertical_alignment(VerticalAlignment::Super),
        Tag::Center => node.block_format.set_alignment(Alignment::Center),
        Tag::Nobr => node.white_space = WhiteSpaceMode::NoWrap,
        Tag::Big => node.char_format.set_font_size_adjustment(1),
        Tag::Small => node.char_format.set_font_size_adjustment(-1),
        Tag::Br => {
            node.text = LINE_SEPARATOR.to_string();
            node.white_space = WhiteSpaceMode::Pre;
        }
        _ => {}
    }
}

fn apply_declaration(node: &mut HtmlNode, declaration: &Declaration) {
    let value = declaration.value.as_str();
    let property = declaration.property.as_str();
    match property {
        "margin" => {
            for (edge, margin) in Edge::ALL.into_iter().zip(css::parse_box(value)) {
                if let Some(margin) = margin {
                    node.margin[edge_slot(edge)] = margin;
                }
            }
        }
        "padding" => {
            for (edge, padding) in Edge::ALL.into_iter().zip(css::parse_box(value)) {
                if padding.is_some() {
                    node.padding[edge_slot(edge)] = padding;
                }
            }
        }
        "color" => {
            if let Some(color) = parse_color(value) {
                node.char_format.set_foreground(color);
            }
        }
        "background-color" | "background" => {
            if let Some(color) = value.split_whitespace().find_map(parse_color) {
                node.char_format.set_background(color);
            }
        }
        "font-weight" => {
            if let Some(weight) = css::parse_font_weight(value) {
                node.char_format.set_font_weight(weight);
            }
        }
        "font-style" => node.char_format.set_font_italic(matches!(
            value.to_ascii_lowercase().as_str(),
            "italic" | "oblique"
        )),
        "font-size" => match css::parse_font_size(value) {
            Some(FontSize::Points(points)) => node.char_format.set_font_point_size(points),
            Some(FontSize::Adjustment(step)) => node.char_format.set_font_size_adjustment(step),
            None => {}
        },
        "font-family" => {
            let family = value
                .split(',')
                .map(|name| name.trim().trim_matches(['\'', '"']))
                .collect::<Vec<_>>()
                .join(",");
            node.char_format.set_font_family(family);
        }
        "text-decoration" => {
            let value = value.to_ascii_lowercase();
            if value.contains("none") {
                node.char_format.set_font_underline(false);
                node.char_format.set_font_strike_out(false);
            }
            if value.contains("underline") {
                node.char_format.set_font_underline(true);
            }
            if value.contains("line-through") {
                node.char_format.set_font_strike_out(true);
            }
        }
        "vertical-align" => match value.to_ascii_lowercase().as_str() {
            "sub" => node
                .char_format
                .set_vertical_alignment(VerticalAlignment::Sub),
            "super" => node
                .char_format
                .set_vertical_alignment(VerticalAlignment::Super),
            _ => {}
        },
        "text-align" => {
            if let Some(alignment) = parse_alignment(value) {
                node.block_format.set_alignment(alignment);
            }
        }
        "white-space" => {
            node.white_space = match value.to_ascii_lowercase().as_str() {
                "pre" => WhiteSpaceMode::Pre,
                "nowrap" => WhiteSpaceMode::NoWrap,
                "pre-wrap" => WhiteSpaceMode::PreWrap,
                "pre-line" => WhiteSpaceMode::PreLine,
                _ => WhiteSpaceMode::Normal,
            }
        }
        "list-style-type" | "list-style" => {
            if let Some(style) = value.split_whitespace().find_map(parse_list_style) {
                node.list_style = style;
                node.has_own_list_style = true;
            }
        }
        "display" => {
            if let Some(display) = parse_display(value) {
                node.display = display;
            }
        }
        "width" => {
            if let Some(width) = parse_length(value) {
                node.width = width;
            }
        }
        "height" => {
            if let Some(height) = parse_length(value) {
                node.height = height;
            }
        }
        "float" => {
            node.float = match value.to_ascii_lowercase().as_str() {
                "left" => FramePosition::FloatLeft,
                "right" => FramePosition::FloatRight,
                _ => FramePosition::InFlow,
            }
        }
        "page-break-before" if value.eq_ignore_ascii_case("always") => {
            node.block_format
                .set_page_break_policy(PageBreak::AlwaysBefore);
        }
        "page-break-after" if value.eq_ignore_ascii_case("always") => {
            node.block_format
                .set_page_break_policy(PageBreak::AlwaysAfter);
        }
        "border-collapse" => node.border_collapse = value.eq_ignore_ascii_case("collapse"),
        "-qt-table-type" => match value.to_ascii_lowercase().as_str() {
            "frame" => node.is_text_frame = true,
            "root" => {
                node.is_text_frame = true;
                node.is_root_frame = true;
            }
            _ => {}
        },
        "-qt-paragraph-type" => node.is_empty_paragraph = value.eq_ignore_ascii_case("empty"),
        "-qt-user-state" => {
            if let Ok(state) = value.parse() {
                node.user_state = state;
            }
        }
        "-qt-list-indent" => {
            if let Ok(indent) = value.parse() {
                node.css_list_indent = Some(indent);
            }
        }
        "-qt-block-indent" => {
            if let Ok(indent) = value.parse() {
                node.block_format.set_indent(indent);
            }
        }
        "-qt-list-number-prefix" => {
            node.list_number_prefix = Some(unquote(value).to_string());
        }
        "-qt-list-number-suffix" => {
            node.list_number_suffix = Some(unquote(value).to_string());
        }
        _ => {
            if let Some(side) = property.strip_prefix("margin-") {
                if let (Some(edge), Some(margin)) = (parse_edge(side), parse_pixels(value)) {
                    node.margin[edge_slot(edge)] = margin;
                }
            } else if let Some(side) = property.strip_prefix("padding-") {
                if let (Some(edge), Some(padding)) = (parse_edge(side), parse_pixels(value)) {
                    node.padding[edge_slot(edge)] = Some(padding);
                }
            } else if property == "border" || property.starts_with("border-") {
                apply_border(node, property, value);
            }
        }
    }
}

/// `border`, `border-width`, `border-style`, `border-color` and their
/// per-edge variants. Tables keep one uniform border; cells keep one per edge.
fn apply_border(node: &mut HtmlNode, property: &str, value: &str) {
    let rest = property.strip_prefix("border").unwrap_or_default();
    let mut parts = rest.trim_start_matches('-').splitn(2, '-');
    let first = parts.next().unwrap_or_default();
    let (edges, aspect): (Vec<Edge>, &str) = match parse_edge(first) {
        Some(edge) => (vec![edge], parts.next().unwrap_or_default()),
        None => (Edge::ALL.to_vec(), first),
    };

    if node.tag == Tag::Table {
        match aspect {
            "" => {
                let (width, style, color) = parse_border_shorthand(value);
                if let Some(width) = width {
                    node.table_border = width;
                }
                if let Some(style) = style {
                    node.border_style = style;
                }
                if color.is_some() {
                    node.border_brush = color;
                }
            }
            "width" => {
                if let Some(width) = value.split_whitespace().find_map(parse_pixels) {
                    node.table_border = width;
                }
            }
            "style" => {
                if let Some(style) = value.split_whitespace().find_map(parse_border_style) {
                    node.border_style = style;
                }
            }
            "color" => {
                if let Some(color) = value.split_whitespace().find_map(parse_color) {
                    node.border_brush = Some(color);
                }
            }
            _ => {}
        }
        return;
    }

    let per_edge = |values: Vec<Option<BorderValue>>| -> Option<[Option<BorderValue>; 4]> {
        if edges.len() == 1 {
            let mut out = [None; 4];
            out[edge_slot(edges[0])] = values.first().copied().flatten();
            Some(out)
        } else {
            expand_box(&values)
        }
    };
    match aspect {
        "" => {
            let (width, style, color) = parse_border_shorthand(value);
            for &edge in &edges {
                let slot = edge_slot(edge);
                if let Some(width) = width {
                    node.cell_border[slot] = width;
                }
                if style.is_some() {
                    node.cell_border_style[slot] = style;
                }
                if color.is_some() {
                    node.cell_border_brush[slot] = color;
                }
            }
        }
        "width" => {
            let values = value
                .split_whitespace()
                .map(|v| parse_pixels(v).map(BorderValue::Width))
                .collect();
            for (slot, value) in per_edge(values).into_iter().flatten().enumerate() {
                if let Some(BorderValue::Width(width)) = value {
                    node.cell_border[slot] = width;
                }
            }
        }
        "style" => {
            let values = value
                .split_whitespace()
                .map(|v| parse_border_style(v).map(BorderValue::Style))
                .collect();
            for (slot, value) in per_edge(values).into_iter().flatten().enumerate() {
                if let Some(BorderValue::Style(style)) = value {
                    node.cell_border_style[slot] = Some(style);
                }
            }
        }
        "color" => {
            let values = value
                .split_whitespace()
                .map(|v| parse_color(v).map(BorderValue::Color))
                .collect();
            for (slot, value) in per_edge(values).into_iter().flatten().enumerate() {
                if let Some(BorderValue::Color(color)) = value {
                    node.cell_border_brush[slot] = Some(color);
                }
            }
        }
        _ => {}
    }
}

/// One parsed per-edge border value.
#[derive(Debug, Clone, Copy)]
enum BorderValue {
    Width(f64),
    Style(BorderStyle),
    Color(Color),
}

fn parse_edge(name: &str) -> Option<Edge> {
    match name {
        "top" => Some(Edge::Top),
        "right" => Some(Edge::Right),
        "bottom" => Some(Edge::Bottom),
        "left" => Some(Edge::Left),
        _ => None,
    }
}

fn parse_alignment(value: &str) -> Option<Alignment> {
    match value.trim().to_ascii_lowercase().as_str() {
        "left" => Some(Alignment::Left),
        "right" => Some(Alignment::Right),
        "center" | "middle" => Some(Alignment::Center),
        "justify" => Some(Alignment::Justify),
        _ => None,
    }
}

fn parse_display(value: &str) -> Option<DisplayMode> {
    match value.trim().to_ascii_lowercase().as_str() {
        "none" => Some(DisplayMode::None),
        "block" | "list-item" => Some(DisplayMode::Block),
        "inline" | "inline-block" => Some(DisplayMode::Inline),
        "table" | "table-row" | "table-row-group" | "table-header-group"
        | "table-footer-group" => Some(DisplayMode::Table),
        _ => None,
    }
}

fn parse_list_style(value: &str) -> Option<ListStyle> {
    match value.trim().to_ascii_lowercase().as_str() {
        "disc" => Some(ListStyle::Disc),
        "circle" => Some(ListStyle::Circle),
        "square" => Some(ListStyle::Square),
        "decimal" => Some(ListStyle::Decimal),
        "lower-alpha" | "lower-latin" => Some(ListStyle::LowerAlpha),
        "upper-alpha" | "upper-latin" => Some(ListStyle::UpperAlpha),
        "lower-roman" => Some(ListStyle::LowerRoman),
        "upper-roman" => Some(ListStyle::UpperRoman),
        "none" => Some(ListStyle::None),
        _ => None,
    }
}

fn parse_span(value: &str) -> Option<usize> {
    value.trim().parse::<usize>().ok().map(|span| span.max(1))
}

fn unquote(value: &str) -> &str {
    value.trim().trim_matches(['\'', '"'])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::TextLength;

    fn find(stream: &NodeStream, tag: Tag) -> (usize, &HtmlNode) {
        stream
            .nodes()
            .iter()
            .enumerate()
            .find(|(_, node)| node.tag == tag)
            .unwrap()
    }

    #[test]
    fn test_flattened_structure() {
        let stream = NodeStream::parse("<p>Hello <b>World</b>!</p>");
        let (p, para) = find(&stream, Tag::P);
        assert_eq!(para.text, "Hello ");
        let (b, bold) = find(&stream, Tag::B);
        assert_eq!(bold.parent, p);
        assert_eq!(bold.text, "World");
        assert!(bold.char_format.is_bold());
        let tail = &stream[b + 1];
        assert_eq!(tail.tag, Tag::Unknown);
        assert_eq!(tail.parent, p);
        assert_eq!(tail.text, "!");
        assert_eq!(stream.depth(b), stream.depth(p) + 1);
    }

    #[test]
    fn test_whitespace_between_blocks_is_dropped() {
        let stream = NodeStream::parse("<body><p>a</p>\n  <p>b</p>\n</body>");
        let (body, _) = find(&stream, Tag::Body);
        assert!(
            stream[body]
                .children
                .iter()
                .all(|&child| stream[child].tag == Tag::P)
        );
    }

    #[test]
    fn test_inline_whitespace_is_kept() {
        let stream = NodeStream::parse("<p><b>a</b> <i>b</i></p>");
        let (_, node) = stream
            .nodes()
            .iter()
            .enumerate()
            .find(|(_, n)| n.tag == Tag::Unknown && n.text == " ")
            .unwrap();
        assert!(!node.char_format.is_bold());
    }

    #[test]
    fn test_inheritance() {
        let stream = NodeStream::parse(r#"<p align="center"><b><i>x</i></b></p>"#);
        let (_, italic) = find(&stream, Tag::I);
        assert!(italic.char_format.is_bold());
        assert!(italic.char_format.font_italic());
        assert_eq!(italic.block_format.alignment(), Some(Alignment::Center));
    }

    #[test]
    fn test_anchor_names_are_not_inherited() {
        let stream = NodeStream::parse(r#"<a name="top">x<b>y</b></a>"#);
        let (_, anchor) = find(&stream, Tag::A);
        assert_eq!(anchor.char_format.anchor_names(), ["top".to_string()]);
        let (_, bold) = find(&stream, Tag::B);
        assert!(bold.char_format.anchor_names().is_empty());
    }

    #[test]
    fn test_inline_style() {
        let stream =
            NodeStream::parse(r#"<p style="margin-top: 5px; color: #ff0000; -qt-user-state: 7">x</p>"#);
        let (_, para) = find(&stream, Tag::P);
        assert_eq!(para.margin(Edge::Top), 5.0);
        assert_eq!(para.margin(Edge::Bottom), 12.0);
        assert_eq!(para.char_format.foreground(), Some(Color::rgb(255, 0, 0)));
        assert_eq!(para.user_state, 7);
    }

    #[test]
    fn test_table_attributes() {
        let stream = NodeStream::parse(
            r#"<table border="1" cellspacing="3" width="50%"><tr><td colspan="2" style="padding-left: 4px; border-top: 2px solid red">x</td></tr></table>"#,
        );
        let (_, table) = find(&stream, Tag::Table);
        assert_eq!(table.table_border, 1.0);
        assert_eq!(table.table_cell_spacing, 3.0);
        assert_eq!(table.width, TextLength::Percentage(50.0));
        let (_, cell) = find(&stream, Tag::Td);
        assert_eq!(cell.table_cell_column_span, 2);
        assert_eq!(cell.padding(Edge::Left), Some(4.0));
        assert_eq!(cell.cell_border[edge_slot(Edge::Top)], 2.0);
        assert_eq!(cell.cell_border_style[edge_slot(Edge::Top)], Some(BorderStyle::Solid));
        assert_eq!(cell.cell_border[edge_slot(Edge::Left)], 0.0);
    }

    #[test]
    fn test_nested_list_margins() {
        let stream = NodeStream::parse("<ul><li>a<ul><li>b</li></ul></li></ul>");
        let lists: Vec<&HtmlNode> = stream.nodes().iter().filter(|n| n.tag == Tag::Ul).collect();
        assert_eq!(lists.len(), 2);
        assert_eq!(lists[0].margin(Edge::Top), 12.0);
        assert_eq!(lists[1].margin(Edge::Top), 0.0);
    }

    #[test]
    fn test_head_is_hidden_and_header_detected() {
        let stream = NodeStream::parse(
            r#"<html><head><meta name="qrichtext" content="1" /><title>T</title></head><body>x</body></html>"#,
        );
        assert!(stream.text_edit_mode());
        let (_, title) = find(&stream, Tag::Title);
        assert_eq!(title.display, DisplayMode::None);
        assert_eq!(title.text, "T");
    }

    #[test]
    fn test_line_break_node() {
        let stream = NodeStream::parse("<p>a<br>b</p>");
        let (br, node) = find(&stream, Tag::Br);
        assert_eq!(node.text, "\u{2028}");
        assert_eq!(node.white_space, WhiteSpaceMode::Pre);
        assert_eq!(stream[br + 1].text, "b");
    }

    #[test]
    fn test_descendant_count() {
        let stream = NodeStream::parse("<div><p>a<b>b</b></p><p>c</p></div>");
        let (div, _) = find(&stream, Tag::Div);
        assert_eq!(stream.descendant_count(div), 3);
    }
}
