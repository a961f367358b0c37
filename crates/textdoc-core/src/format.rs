//! Formats: typed property bags attached to characters, blocks and shared objects.
//!
//! A [`Format`] is a [`FormatKind`] plus a sorted map of [`Property`] → [`Value`].
//! Formats that describe a shared logical object (a list, a table, a frame) are
//! linked to it through an optional [`ObjectIndex`]. The object index is not part
//! of a format's value equality: two cell formats of different tables compare
//! equal when their properties do, while the [`FormatCollection`](crate::FormatCollection)
//! still keeps them apart when interning.

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

/// Identity of a shared object (list, table or frame) inside one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectIndex(pub usize);

/// The kind of a format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FormatKind {
    /// Character format (also used for table cell markers).
    #[default]
    Char,
    /// Block (paragraph) format.
    Block,
    /// Definition of a list object.
    List,
    /// Definition of a frame object.
    Frame,
    /// Definition of a table object.
    Table,
    /// Character format of an inline image.
    Image,
}

impl FormatKind {
    /// Returns `true` for kinds that may be applied to character positions.
    pub fn is_char_like(self) -> bool {
        matches!(self, FormatKind::Char | FormatKind::Image)
    }

    /// Returns `true` for kinds that define a shared object.
    pub fn is_object_kind(self) -> bool {
        matches!(self, FormatKind::List | FormatKind::Frame | FormatKind::Table)
    }
}

/// Property keys understood by the document model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Property {
    // character
    /// Font family name.
    FontFamily,
    /// Absolute font size in points.
    FontPointSize,
    /// Relative size step (-2..=4), used by headings and `big`/`small`.
    FontSizeAdjustment,
    /// Font weight (400 normal, 700 bold).
    FontWeight,
    /// Italic flag.
    FontItalic,
    /// Underline flag.
    FontUnderline,
    /// Strike-out flag.
    FontStrikeOut,
    /// Fixed pitch (monospace) flag.
    FontFixedPitch,
    /// Vertical alignment (sub/superscript).
    VerticalAlignment,
    /// Text colour.
    Foreground,
    /// Marks the run as an anchor (link or named target).
    IsAnchor,
    /// Link target.
    AnchorHref,
    /// Named anchor targets.
    AnchorNames,

    // shared
    /// Background colour (text highlight, block, frame or cell background).
    Background,
    /// Left-to-right / right-to-left.
    LayoutDirection,
    /// Page break flags.
    PageBreakPolicy,

    // block
    /// Horizontal alignment of blocks and tables.
    BlockAlignment,
    /// Space above the block.
    BlockTopMargin,
    /// Space below the block.
    BlockBottomMargin,
    /// Space left of the block.
    BlockLeftMargin,
    /// Space right of the block.
    BlockRightMargin,
    /// Indentation level.
    BlockIndent,
    /// Heading level 1..=6.
    HeadingLevel,
    /// Lines in the block never wrap.
    NonBreakableLines,
    /// Width of a trailing horizontal rule.
    HorizontalRulerWidth,

    // list
    /// Bullet / numbering style.
    ListStyle,
    /// Indentation level of the list.
    ListIndent,
    /// Text before an item number.
    ListNumberPrefix,
    /// Text after an item number.
    ListNumberSuffix,

    // frame
    /// Frame border width.
    FrameBorder,
    /// Frame border colour.
    FrameBorderBrush,
    /// Frame border style.
    FrameBorderStyle,
    /// Uniform margin, set when all four margins agree.
    FrameMargin,
    /// Frame top margin.
    FrameTopMargin,
    /// Frame bottom margin.
    FrameBottomMargin,
    /// Frame left margin.
    FrameLeftMargin,
    /// Frame right margin.
    FrameRightMargin,
    /// Frame padding.
    FramePadding,
    /// Frame width constraint.
    FrameWidth,
    /// Frame height constraint.
    FrameHeight,
    /// Float position.
    FramePosition,

    // table
    /// Column count.
    TableColumns,
    /// Per-column width constraints.
    TableColumnWidthConstraints,
    /// Space between cells.
    TableCellSpacing,
    /// Default padding inside cells.
    TableCellPadding,
    /// Number of header rows repeated on page breaks.
    TableHeaderRowCount,
    /// Collapsed cell borders.
    TableBorderCollapse,

    // table cell (stored on the cell marker's char format)
    /// Rows covered by the cell.
    TableCellRowSpan,
    /// Columns covered by the cell.
    TableCellColumnSpan,
    /// Cell top padding.
    TableCellTopPadding,
    /// Cell bottom padding.
    TableCellBottomPadding,
    /// Cell left padding.
    TableCellLeftPadding,
    /// Cell right padding.
    TableCellRightPadding,
    /// Cell top border width.
    TableCellTopBorder,
    /// Cell right border width.
    TableCellRightBorder,
    /// Cell bottom border width.
    TableCellBottomBorder,
    /// Cell left border width.
    TableCellLeftBorder,
    /// Cell top border style.
    TableCellTopBorderStyle,
    /// Cell right border style.
    TableCellRightBorderStyle,
    /// Cell bottom border style.
    TableCellBottomBorderStyle,
    /// Cell left border style.
    TableCellLeftBorderStyle,
    /// Cell top border colour.
    TableCellTopBorderBrush,
    /// Cell right border colour.
    TableCellRightBorderBrush,
    /// Cell bottom border colour.
    TableCellBottomBorderBrush,
    /// Cell left border colour.
    TableCellLeftBorderBrush,

    // image
    /// Image resource name.
    ImageName,
    /// Image width.
    ImageWidth,
    /// Image height.
    ImageHeight,
    /// Image title (tooltip).
    ImageTitle,
    /// Alternative text.
    ImageAltText,
}

/// An RGBA colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha.
    pub a: u8,
}

impl Color {
    /// Opaque colour from components.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// `#rrggbb` (or `#rrggbbaa` when not opaque).
    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

/// A length that is either unconstrained, fixed or relative to the container.
#[derive(Debug, Clone, Copy, Default)]
pub enum TextLength {
    /// No constraint.
    #[default]
    Variable,
    /// Absolute length in pixels.
    Fixed(f64),
    /// Percentage of the available width.
    Percentage(f64),
}

impl TextLength {
    /// Returns `true` if the length carries no constraint.
    pub fn is_variable(&self) -> bool {
        matches!(self, TextLength::Variable)
    }

    /// Same kind of length with its value divided by `n`.
    pub fn divided(self, n: usize) -> Self {
        let n = n.max(1) as f64;
        match self {
            TextLength::Variable => TextLength::Variable,
            TextLength::Fixed(v) => TextLength::Fixed(v / n),
            TextLength::Percentage(v) => TextLength::Percentage(v / n),
        }
    }

    fn key(&self) -> (u8, u64) {
        match self {
            TextLength::Variable => (0, 0),
            TextLength::Fixed(v) => (1, v.to_bits()),
            TextLength::Percentage(v) => (2, v.to_bits()),
        }
    }
}

impl PartialEq for TextLength {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for TextLength {}

impl Hash for TextLength {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

/// A property value.
#[derive(Debug, Clone)]
pub enum Value {
    /// Boolean flag.
    Bool(bool),
    /// Integer (also used for enums).
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// String.
    Text(String),
    /// List of strings.
    TextList(Vec<String>),
    /// Colour.
    Color(Color),
    /// Single length.
    Length(TextLength),
    /// List of lengths.
    Lengths(Vec<TextLength>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::TextList(a), Value::TextList(b)) => a == b,
            (Value::Color(a), Value::Color(b)) => a == b,
            (Value::Length(a), Value::Length(b)) => a == b,
            (Value::Lengths(a), Value::Lengths(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Bool(v) => v.hash(state),
            Value::Int(v) => v.hash(state),
            Value::Float(v) => v.to_bits().hash(state),
            Value::Text(v) => v.hash(state),
            Value::TextList(v) => v.hash(state),
            Value::Color(v) => v.hash(state),
            Value::Length(v) => v.hash(state),
            Value::Lengths(v) => v.hash(state),
        }
    }
}

/// Horizontal alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Alignment {
    /// Left.
    Left,
    /// Right.
    Right,
    /// Centered.
    Center,
    /// Justified.
    Justify,
}

/// List bullet or numbering style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListStyle {
    /// Filled circle.
    Disc,
    /// Empty circle.
    Circle,
    /// Filled square.
    Square,
    /// 1, 2, 3
    Decimal,
    /// a, b, c
    LowerAlpha,
    /// A, B, C
    UpperAlpha,
    /// i, ii, iii
    LowerRoman,
    /// I, II, III
    UpperRoman,
    /// No marker.
    None,
}

impl ListStyle {
    /// Bullet used one nesting level deeper for unordered lists without an explicit style.
    pub fn nested(self) -> Self {
        match self {
            ListStyle::Disc => ListStyle::Circle,
            ListStyle::Circle => ListStyle::Square,
            other => other,
        }
    }

    /// Returns `true` for numbered styles.
    pub fn is_ordered(self) -> bool {
        matches!(
            self,
            ListStyle::Decimal
                | ListStyle::LowerAlpha
                | ListStyle::UpperAlpha
                | ListStyle::LowerRoman
                | ListStyle::UpperRoman
        )
    }
}

/// Border style of frames, tables and cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BorderStyle {
    /// No border.
    None,
    /// Dotted.
    Dotted,
    /// Dashed.
    Dashed,
    /// Solid.
    Solid,
    /// Double.
    Double,
    /// Groove.
    Groove,
    /// Ridge.
    Ridge,
    /// Inset.
    Inset,
    /// Outset.
    Outset,
}

/// Float position of frames and images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FramePosition {
    /// Laid out in the text flow.
    #[default]
    InFlow,
    /// Floated to the left.
    FloatLeft,
    /// Floated to the right.
    FloatRight,
}

/// Page break flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageBreak {
    /// Break before the element.
    AlwaysBefore,
    /// Break after the element.
    AlwaysAfter,
}

/// Text direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutDirection {
    /// Left to right.
    LeftToRight,
    /// Right to left.
    RightToLeft,
}

/// Sub/superscript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerticalAlignment {
    /// Subscript.
    Sub,
    /// Superscript.
    Super,
}

/// One edge of a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    /// Top edge.
    Top,
    /// Right edge.
    Right,
    /// Bottom edge.
    Bottom,
    /// Left edge.
    Left,
}

impl Edge {
    /// All edges in CSS order.
    pub const ALL: [Edge; 4] = [Edge::Top, Edge::Right, Edge::Bottom, Edge::Left];
}

macro_rules! int_enum {
    ($ty:ident { $($variant:ident = $value:expr),* $(,)? }) => {
        impl $ty {
            fn to_int(self) -> i64 {
                match self {
                    $($ty::$variant => $value,)*
                }
            }

            fn from_int(value: i64) -> Option<Self> {
                match value {
                    $($value => Some($ty::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

int_enum!(Alignment { Left = 1, Right = 2, Center = 4, Justify = 8 });
int_enum!(ListStyle {
    Disc = -1,
    Circle = -2,
    Square = -3,
    Decimal = -4,
    LowerAlpha = -5,
    UpperAlpha = -6,
    LowerRoman = -7,
    UpperRoman = -8,
    None = 0,
});
int_enum!(BorderStyle {
    None = 0,
    Dotted = 1,
    Dashed = 2,
    Solid = 3,
    Double = 4,
    Groove = 7,
    Ridge = 8,
    Inset = 9,
    Outset = 10,
});
int_enum!(FramePosition { InFlow = 0, FloatLeft = 1, FloatRight = 2 });
int_enum!(PageBreak { AlwaysBefore = 1, AlwaysAfter = 2 });
int_enum!(LayoutDirection { LeftToRight = 0, RightToLeft = 1 });
int_enum!(VerticalAlignment { Sub = 1, Super = 2 });

/// A typed property bag.
#[derive(Debug, Clone, Default)]
pub struct Format {
    kind: FormatKind,
    properties: BTreeMap<Property, Value>,
    object_index: Option<ObjectIndex>,
}

impl PartialEq for Format {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.properties == other.properties
    }
}

impl Eq for Format {}

impl Hash for Format {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.properties.hash(state);
    }
}

impl Format {
    /// Empty format of the given kind.
    pub fn new(kind: FormatKind) -> Self {
        Self {
            kind,
            properties: BTreeMap::new(),
            object_index: None,
        }
    }

    /// Empty character format.
    pub fn char() -> Self {
        Self::new(FormatKind::Char)
    }

    /// Empty block format.
    pub fn block() -> Self {
        Self::new(FormatKind::Block)
    }

    /// List definition with the given style.
    pub fn list(style: ListStyle) -> Self {
        let mut format = Self::new(FormatKind::List);
        format.set_list_style(style);
        format
    }

    /// Empty frame definition.
    pub fn frame() -> Self {
        Self::new(FormatKind::Frame)
    }

    /// Table definition with the given column count.
    pub fn table(columns: usize) -> Self {
        let mut format = Self::new(FormatKind::Table);
        format.set_table_columns(columns);
        format
    }

    /// Image format referencing a named resource.
    pub fn image(name: impl Into<String>) -> Self {
        let mut format = Self::new(FormatKind::Image);
        format.set(Property::ImageName, Value::Text(name.into()));
        format
    }

    /// Format kind.
    pub fn kind(&self) -> FormatKind {
        self.kind
    }

    /// Linked object, if any.
    pub fn object_index(&self) -> Option<ObjectIndex> {
        self.object_index
    }

    /// Link (or unlink) this format to a shared object.
    pub fn set_object_index(&mut self, index: Option<ObjectIndex>) {
        self.object_index = index;
    }

    /// Builder form of [`Format::set_object_index`].
    pub fn with_object_index(mut self, index: Option<ObjectIndex>) -> Self {
        self.object_index = index;
        self
    }

    /// Value of a property.
    pub fn get(&self, property: Property) -> Option<&Value> {
        self.properties.get(&property)
    }

    /// Returns `true` if the property is set.
    pub fn has(&self, property: Property) -> bool {
        self.properties.contains_key(&property)
    }

    /// Set a property.
    pub fn set(&mut self, property: Property, value: Value) {
        self.properties.insert(property, value);
    }

    /// Builder form of [`Format::set`].
    pub fn with(mut self, property: Property, value: Value) -> Self {
        self.set(property, value);
        self
    }

    /// Remove a property.
    pub fn clear(&mut self, property: Property) {
        self.properties.remove(&property);
    }

    /// Number of properties (the object index is not counted).
    pub fn property_count(&self) -> usize {
        self.properties.len()
    }

    /// Returns `true` if no property is set.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Iterate over the properties in key order.
    pub fn properties(&self) -> impl Iterator<Item = (Property, &Value)> {
        self.properties.iter().map(|(k, v)| (*k, v))
    }

    /// Copy every property of `other` over this one. The object index is taken
    /// from `other` only if it has one.
    pub fn merge(&mut self, other: &Format) {
        for (property, value) in &other.properties {
            self.properties.insert(*property, value.clone());
        }
        if other.object_index.is_some() {
            self.object_index = other.object_index;
        }
    }

    /// Copy of this format reinterpreted as another kind.
    pub fn converted(&self, kind: FormatKind) -> Format {
        Format {
            kind,
            properties: self.properties.clone(),
            object_index: self.object_index,
        }
    }

    fn float(&self, property: Property) -> Option<f64> {
        match self.properties.get(&property)? {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    fn int(&self, property: Property) -> Option<i64> {
        match self.properties.get(&property)? {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    fn flag(&self, property: Property) -> bool {
        matches!(self.properties.get(&property), Some(Value::Bool(true)))
    }

    fn text(&self, property: Property) -> Option<&str> {
        match self.properties.get(&property)? {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }

    fn color(&self, property: Property) -> Option<Color> {
        match self.properties.get(&property)? {
            Value::Color(v) => Some(*v),
            _ => None,
        }
    }

    fn length(&self, property: Property) -> TextLength {
        match self.properties.get(&property) {
            Some(Value::Length(v)) => *v,
            _ => TextLength::Variable,
        }
    }

    fn set_float(&mut self, property: Property, value: f64) {
        self.set(property, Value::Float(value));
    }

    fn set_int(&mut self, property: Property, value: i64) {
        self.set(property, Value::Int(value));
    }

    fn set_flag(&mut self, property: Property, value: bool) {
        self.set(property, Value::Bool(value));
    }
}

/// Character formatting.
impl Format {
    /// Font weight, 400 when unset.
    pub fn font_weight(&self) -> i64 {
        self.int(Property::FontWeight).unwrap_or(400)
    }

    /// Set the font weight.
    pub fn set_font_weight(&mut self, weight: i64) {
        self.set_int(Property::FontWeight, weight);
    }

    /// Weight of at least 600.
    pub fn is_bold(&self) -> bool {
        self.font_weight() >= 600
    }

    /// Italic flag.
    pub fn font_italic(&self) -> bool {
        self.flag(Property::FontItalic)
    }

    /// Set the italic flag.
    pub fn set_font_italic(&mut self, italic: bool) {
        self.set_flag(Property::FontItalic, italic);
    }

    /// Underline flag.
    pub fn font_underline(&self) -> bool {
        self.flag(Property::FontUnderline)
    }

    /// Set the underline flag.
    pub fn set_font_underline(&mut self, underline: bool) {
        self.set_flag(Property::FontUnderline, underline);
    }

    /// Strike-out flag.
    pub fn font_strike_out(&self) -> bool {
        self.flag(Property::FontStrikeOut)
    }

    /// Set the strike-out flag.
    pub fn set_font_strike_out(&mut self, strike: bool) {
        self.set_flag(Property::FontStrikeOut, strike);
    }

    /// Fixed pitch flag.
    pub fn font_fixed_pitch(&self) -> bool {
        self.flag(Property::FontFixedPitch)
    }

    /// Font family.
    pub fn font_family(&self) -> Option<&str> {
        self.text(Property::FontFamily)
    }

    /// Point size.
    pub fn font_point_size(&self) -> Option<f64> {
        self.float(Property::FontPointSize)
    }

    /// Relative size step.
    pub fn font_size_adjustment(&self) -> i64 {
        self.int(Property::FontSizeAdjustment).unwrap_or(0)
    }

    /// Set the fixed-pitch flag.
    pub fn set_font_fixed_pitch(&mut self, fixed: bool) {
        self.set_flag(Property::FontFixedPitch, fixed);
    }

    /// Set the font family.
    pub fn set_font_family(&mut self, family: impl Into<String>) {
        self.set(Property::FontFamily, Value::Text(family.into()));
    }

    /// Set the point size.
    pub fn set_font_point_size(&mut self, size: f64) {
        self.set_float(Property::FontPointSize, size);
    }

    /// Set the relative size step.
    pub fn set_font_size_adjustment(&mut self, step: i64) {
        self.set_int(Property::FontSizeAdjustment, step);
    }

    /// Sub/superscript.
    pub fn vertical_alignment(&self) -> Option<VerticalAlignment> {
        self.int(Property::VerticalAlignment)
            .and_then(VerticalAlignment::from_int)
    }

    /// Set sub/superscript.
    pub fn set_vertical_alignment(&mut self, alignment: VerticalAlignment) {
        self.set_int(Property::VerticalAlignment, alignment.to_int());
    }

    /// Text colour.
    pub fn foreground(&self) -> Option<Color> {
        self.color(Property::Foreground)
    }

    /// Set the text colour.
    pub fn set_foreground(&mut self, color: Color) {
        self.set(Property::Foreground, Value::Color(color));
    }

    /// Background colour.
    pub fn background(&self) -> Option<Color> {
        self.color(Property::Background)
    }

    /// Set the background colour.
    pub fn set_background(&mut self, color: Color) {
        self.set(Property::Background, Value::Color(color));
    }

    /// Anchor flag.
    pub fn is_anchor(&self) -> bool {
        self.flag(Property::IsAnchor)
    }

    /// Set the anchor flag.
    pub fn set_anchor(&mut self, anchor: bool) {
        self.set_flag(Property::IsAnchor, anchor);
    }

    /// Link target.
    pub fn anchor_href(&self) -> Option<&str> {
        self.text(Property::AnchorHref)
    }

    /// Set the link target.
    pub fn set_anchor_href(&mut self, href: impl Into<String>) {
        self.set(Property::AnchorHref, Value::Text(href.into()));
    }

    /// Named anchors attached to this run.
    pub fn anchor_names(&self) -> &[String] {
        match self.properties.get(&Property::AnchorNames) {
            Some(Value::TextList(names)) => names,
            _ => &[],
        }
    }

    /// Set the named anchors.
    pub fn set_anchor_names(&mut self, names: Vec<String>) {
        self.set(Property::AnchorNames, Value::TextList(names));
    }

    /// Rows covered by a table cell.
    pub fn table_cell_row_span(&self) -> usize {
        self.int(Property::TableCellRowSpan).unwrap_or(1).max(1) as usize
    }

    /// Set the row span of a table cell.
    pub fn set_table_cell_row_span(&mut self, span: usize) {
        self.set_int(Property::TableCellRowSpan, span as i64);
    }

    /// Columns covered by a table cell.
    pub fn table_cell_column_span(&self) -> usize {
        self.int(Property::TableCellColumnSpan).unwrap_or(1).max(1) as usize
    }

    /// Set the column span of a table cell.
    pub fn set_table_cell_column_span(&mut self, span: usize) {
        self.set_int(Property::TableCellColumnSpan, span as i64);
    }

    /// Cell padding on one edge.
    pub fn cell_padding(&self, edge: Edge) -> Option<f64> {
        self.float(cell_padding_property(edge))
    }

    /// Set the cell padding on one edge.
    pub fn set_cell_padding(&mut self, edge: Edge, padding: f64) {
        self.set_float(cell_padding_property(edge), padding);
    }

    /// Cell border width on one edge.
    pub fn cell_border(&self, edge: Edge) -> Option<f64> {
        self.float(cell_border_property(edge).0)
    }

    /// Set the cell border width on one edge.
    pub fn set_cell_border(&mut self, edge: Edge, width: f64) {
        self.set_float(cell_border_property(edge).0, width);
    }

    /// Cell border style on one edge.
    pub fn cell_border_style(&self, edge: Edge) -> Option<BorderStyle> {
        self.int(cell_border_property(edge).1)
            .and_then(BorderStyle::from_int)
    }

    /// Set the cell border style on one edge.
    pub fn set_cell_border_style(&mut self, edge: Edge, style: BorderStyle) {
        self.set_int(cell_border_property(edge).1, style.to_int());
    }

    /// Cell border colour on one edge.
    pub fn cell_border_brush(&self, edge: Edge) -> Option<Color> {
        self.color(cell_border_property(edge).2)
    }

    /// Set the cell border colour on one edge.
    pub fn set_cell_border_brush(&mut self, edge: Edge, color: Color) {
        self.set(cell_border_property(edge).2, Value::Color(color));
    }
}

fn cell_padding_property(edge: Edge) -> Property {
    match edge {
        Edge::Top => Property::TableCellTopPadding,
        Edge::Right => Property::TableCellRightPadding,
        Edge::Bottom => Property::TableCellBottomPadding,
        Edge::Left => Property::TableCellLeftPadding,
    }
}

fn cell_border_property(edge: Edge) -> (Property, Property, Property) {
    match edge {
        Edge::Top => (
            Property::TableCellTopBorder,
            Property::TableCellTopBorderStyle,
            Property::TableCellTopBorderBrush,
        ),
        Edge::Right => (
            Property::TableCellRightBorder,
            Property::TableCellRightBorderStyle,
            Property::TableCellRightBorderBrush,
        ),
        Edge::Bottom => (
            Property::TableCellBottomBorder,
            Property::TableCellBottomBorderStyle,
            Property::TableCellBottomBorderBrush,
        ),
        Edge::Left => (
            Property::TableCellLeftBorder,
            Property::TableCellLeftBorderStyle,
            Property::TableCellLeftBorderBrush,
        ),
    }
}

/// Image formatting.
impl Format {
    /// Image resource name.
    pub fn image_name(&self) -> Option<&str> {
        self.text(Property::ImageName)
    }

    /// Image width.
    pub fn image_width(&self) -> Option<f64> {
        self.float(Property::ImageWidth)
    }

    /// Set the image width.
    pub fn set_image_width(&mut self, width: f64) {
        self.set_float(Property::ImageWidth, width);
    }

    /// Image height.
    pub fn image_height(&self) -> Option<f64> {
        self.float(Property::ImageHeight)
    }

    /// Set the image height.
    pub fn set_image_height(&mut self, height: f64) {
        self.set_float(Property::ImageHeight, height);
    }

    /// Image title.
    pub fn image_title(&self) -> Option<&str> {
        self.text(Property::ImageTitle)
    }

    /// Alternative text.
    pub fn image_alt_text(&self) -> Option<&str> {
        self.text(Property::ImageAltText)
    }

    pub(crate) fn set_image_title(&mut self, title: impl Into<String>) {
        self.set(Property::ImageTitle, Value::Text(title.into()));
    }

    pub(crate) fn set_image_alt_text(&mut self, alt: impl Into<String>) {
        self.set(Property::ImageAltText, Value::Text(alt.into()));
    }
}

/// Block formatting.
impl Format {
    /// Horizontal alignment.
    pub fn alignment(&self) -> Option<Alignment> {
        self.int(Property::BlockAlignment).and_then(Alignment::from_int)
    }

    /// Set the horizontal alignment.
    pub fn set_alignment(&mut self, alignment: Alignment) {
        self.set_int(Property::BlockAlignment, alignment.to_int());
    }

    /// Top margin, 0 when unset.
    pub fn top_margin(&self) -> f64 {
        self.float(Property::BlockTopMargin).unwrap_or(0.0)
    }

    /// Set the top margin.
    pub fn set_top_margin(&mut self, margin: f64) {
        self.set_float(Property::BlockTopMargin, margin);
    }

    /// Bottom margin, 0 when unset.
    pub fn bottom_margin(&self) -> f64 {
        self.float(Property::BlockBottomMargin).unwrap_or(0.0)
    }

    /// Set the bottom margin.
    pub fn set_bottom_margin(&mut self, margin: f64) {
        self.set_float(Property::BlockBottomMargin, margin);
    }

    /// Left margin, 0 when unset.
    pub fn left_margin(&self) -> f64 {
        self.float(Property::BlockLeftMargin).unwrap_or(0.0)
    }

    /// Set the left margin.
    pub fn set_left_margin(&mut self, margin: f64) {
        self.set_float(Property::BlockLeftMargin, margin);
    }

    /// Right margin, 0 when unset.
    pub fn right_margin(&self) -> f64 {
        self.float(Property::BlockRightMargin).unwrap_or(0.0)
    }

    /// Set the right margin.
    pub fn set_right_margin(&mut self, margin: f64) {
        self.set_float(Property::BlockRightMargin, margin);
    }

    /// Indent level.
    pub fn indent(&self) -> i64 {
        self.int(Property::BlockIndent).unwrap_or(0)
    }

    /// Set the indent level.
    pub fn set_indent(&mut self, indent: i64) {
        self.set_int(Property::BlockIndent, indent);
    }

    /// Heading level, 0 for body text.
    pub fn heading_level(&self) -> u8 {
        self.int(Property::HeadingLevel).unwrap_or(0).clamp(0, 6) as u8
    }

    /// Set the heading level.
    pub fn set_heading_level(&mut self, level: u8) {
        self.set_int(Property::HeadingLevel, i64::from(level));
    }

    /// Non-breakable lines flag.
    pub fn non_breakable_lines(&self) -> bool {
        self.flag(Property::NonBreakableLines)
    }

    /// Set the non-breakable lines flag.
    pub fn set_non_breakable_lines(&mut self, value: bool) {
        self.set_flag(Property::NonBreakableLines, value);
    }

    /// Page break policy.
    pub fn page_break_policy(&self) -> Option<PageBreak> {
        self.int(Property::PageBreakPolicy).and_then(PageBreak::from_int)
    }

    /// Set the page break policy.
    pub fn set_page_break_policy(&mut self, policy: PageBreak) {
        self.set_int(Property::PageBreakPolicy, policy.to_int());
    }

    /// Layout direction.
    pub fn layout_direction(&self) -> Option<LayoutDirection> {
        self.int(Property::LayoutDirection)
            .and_then(LayoutDirection::from_int)
    }

    /// Set the layout direction.
    pub fn set_layout_direction(&mut self, direction: LayoutDirection) {
        self.set_int(Property::LayoutDirection, direction.to_int());
    }

    /// Width of the trailing horizontal rule, if the block carries one.
    pub fn horizontal_ruler_width(&self) -> Option<TextLength> {
        self.has(Property::HorizontalRulerWidth)
            .then(|| self.length(Property::HorizontalRulerWidth))
    }

    /// Attach a trailing horizontal rule.
    pub fn set_horizontal_ruler_width(&mut self, width: TextLength) {
        self.set(Property::HorizontalRulerWidth, Value::Length(width));
    }
}

/// List formatting.
impl Format {
    /// Bullet / numbering style.
    pub fn list_style(&self) -> ListStyle {
        self.int(Property::ListStyle)
            .and_then(ListStyle::from_int)
            .unwrap_or(ListStyle::Disc)
    }

    /// Set the bullet / numbering style.
    pub fn set_list_style(&mut self, style: ListStyle) {
        self.set_int(Property::ListStyle, style.to_int());
    }

    /// List indentation.
    pub fn list_indent(&self) -> i64 {
        self.int(Property::ListIndent).unwrap_or(0)
    }

    /// Set the list indentation.
    pub fn set_list_indent(&mut self, indent: i64) {
        self.set_int(Property::ListIndent, indent);
    }

    /// Number prefix.
    pub fn list_number_prefix(&self) -> Option<&str> {
        self.text(Property::ListNumberPrefix)
    }

    /// Number suffix.
    pub fn list_number_suffix(&self) -> Option<&str> {
        self.text(Property::ListNumberSuffix)
    }

    /// Set the number prefix.
    pub fn set_list_number_prefix(&mut self, prefix: impl Into<String>) {
        self.set(Property::ListNumberPrefix, Value::Text(prefix.into()));
    }

    /// Set the number suffix.
    pub fn set_list_number_suffix(&mut self, suffix: impl Into<String>) {
        self.set(Property::ListNumberSuffix, Value::Text(suffix.into()));
    }
}

/// Frame and table formatting.
impl Format {
    /// Frame margin on one edge.
    pub fn frame_margin(&self, edge: Edge) -> f64 {
        let property = match edge {
            Edge::Top => Property::FrameTopMargin,
            Edge::Right => Property::FrameRightMargin,
            Edge::Bottom => Property::FrameBottomMargin,
            Edge::Left => Property::FrameLeftMargin,
        };
        self.float(property)
            .or_else(|| self.float(Property::FrameMargin))
            .unwrap_or(0.0)
    }

    /// Set the frame margin on one edge.
    pub fn set_frame_margin(&mut self, edge: Edge, margin: f64) {
        let property = match edge {
            Edge::Top => Property::FrameTopMargin,
            Edge::Right => Property::FrameRightMargin,
            Edge::Bottom => Property::FrameBottomMargin,
            Edge::Left => Property::FrameLeftMargin,
        };
        self.set_float(property, margin);
    }

    /// Border width.
    pub fn frame_border(&self) -> f64 {
        self.float(Property::FrameBorder).unwrap_or(0.0)
    }

    /// Set the border width.
    pub fn set_frame_border(&mut self, width: f64) {
        self.set_float(Property::FrameBorder, width);
    }

    /// Border style.
    pub fn frame_border_style(&self) -> Option<BorderStyle> {
        self.int(Property::FrameBorderStyle)
            .and_then(BorderStyle::from_int)
    }

    /// Set the border style.
    pub fn set_frame_border_style(&mut self, style: BorderStyle) {
        self.set_int(Property::FrameBorderStyle, style.to_int());
    }

    /// Border colour.
    pub fn frame_border_brush(&self) -> Option<Color> {
        self.color(Property::FrameBorderBrush)
    }

    /// Set the border colour.
    pub fn set_frame_border_brush(&mut self, color: Color) {
        self.set(Property::FrameBorderBrush, Value::Color(color));
    }

    /// Height constraint.
    pub fn frame_height(&self) -> TextLength {
        self.length(Property::FrameHeight)
    }

    /// Set the height constraint.
    pub fn set_frame_height(&mut self, height: TextLength) {
        self.set(Property::FrameHeight, Value::Length(height));
    }

    /// Float position.
    pub fn frame_position(&self) -> FramePosition {
        self.int(Property::FramePosition)
            .and_then(FramePosition::from_int)
            .unwrap_or_default()
    }

    /// Set the float position.
    pub fn set_frame_position(&mut self, position: FramePosition) {
        self.set_int(Property::FramePosition, position.to_int());
    }

    /// Width constraint.
    pub fn frame_width(&self) -> TextLength {
        self.length(Property::FrameWidth)
    }

    /// Set the width constraint.
    pub fn set_frame_width(&mut self, width: TextLength) {
        self.set(Property::FrameWidth, Value::Length(width));
    }

    /// Column count of a table.
    pub fn table_columns(&self) -> usize {
        self.int(Property::TableColumns).unwrap_or(0).max(0) as usize
    }

    /// Set the column count of a table.
    pub fn set_table_columns(&mut self, columns: usize) {
        self.set_int(Property::TableColumns, columns as i64);
    }

    /// Per-column width constraints.
    pub fn column_width_constraints(&self) -> &[TextLength] {
        match self.properties.get(&Property::TableColumnWidthConstraints) {
            Some(Value::Lengths(widths)) => widths,
            _ => &[],
        }
    }

    /// Set the per-column width constraints.
    pub fn set_column_width_constraints(&mut self, widths: Vec<TextLength>) {
        self.set(Property::TableColumnWidthConstraints, Value::Lengths(widths));
    }

    /// Drop the per-column width constraints.
    pub fn clear_column_width_constraints(&mut self) {
        self.clear(Property::TableColumnWidthConstraints);
    }

    /// Space between cells.
    pub fn cell_spacing(&self) -> f64 {
        self.float(Property::TableCellSpacing).unwrap_or(2.0)
    }

    /// Set the space between cells.
    pub fn set_cell_spacing(&mut self, spacing: f64) {
        self.set_float(Property::TableCellSpacing, spacing);
    }

    /// Default cell padding.
    pub fn table_cell_padding(&self) -> f64 {
        self.float(Property::TableCellPadding).unwrap_or(0.0)
    }

    /// Set the default cell padding.
    pub fn set_table_cell_padding(&mut self, padding: f64) {
        self.set_float(Property::TableCellPadding, padding);
    }

    /// Header row count.
    pub fn header_row_count(&self) -> usize {
        self.int(Property::TableHeaderRowCount).unwrap_or(0).max(0) as usize
    }

    /// Set the header row count.
    pub fn set_header_row_count(&mut self, rows: usize) {
        self.set_int(Property::TableHeaderRowCount, rows as i64);
    }

    /// Collapsed borders flag.
    pub fn border_collapse(&self) -> bool {
        self.flag(Property::TableBorderCollapse)
    }

    /// Set the collapsed borders flag.
    pub fn set_border_collapse(&mut self, collapse: bool) {
        self.set_flag(Property::TableBorderCollapse, collapse);
    }
}
