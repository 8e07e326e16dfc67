//! Document nodes and their markup.

use super::convert::{MarkerStyle, color_to_use, language_tag};
use super::format::{
    BorderFormat, CellFormat, Direction, FormatState, RowFormat, Strike, SuperSub, Underline,
};
use super::options::ConvertOptions;
use super::tables::{Color, ColorTable, FontTable};
use crate::common::unit::{half_points_to_px, push_px, twip_to_positive_px, twip_to_positive_visible_px, twip_to_px};
use quick_xml::escape::escape;

/// Namespace declared on the root element.
pub const XAML_NAMESPACE: &str = "http://schemas.microsoft.com/winfx/2006/xaml/presentation";

/// Stable handle of a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

/// Node kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Text,
    /// Synthetic inline container (direction runs)
    Inline,
    LineBreak,
    Hyperlink,
    Image,
    Paragraph,
    List,
    ListItem,
    /// Rendered list marker; never emitted
    ListText,
    Table,
    TableBody,
    Row,
    Cell,
    FieldBegin,
    FieldEnd,
    /// Scope fence for shape content; never emitted
    Shape,
}

impl NodeType {
    pub fn is_inline(self) -> bool {
        matches!(
            self,
            NodeType::Text
                | NodeType::Inline
                | NodeType::LineBreak
                | NodeType::Hyperlink
                | NodeType::Image
                | NodeType::ListText
                | NodeType::FieldBegin
                | NodeType::FieldEnd
        )
    }

    pub fn is_block(self) -> bool {
        matches!(self, NodeType::Paragraph | NodeType::List | NodeType::Table)
    }

    pub fn is_field_marker(self) -> bool {
        matches!(self, NodeType::FieldBegin | NodeType::FieldEnd)
    }

    /// The tag this node emits, if any.
    pub fn tag(self) -> Option<XamlTag> {
        Some(match self {
            NodeType::Text => XamlTag::Run,
            NodeType::Inline => XamlTag::Span,
            NodeType::LineBreak => XamlTag::LineBreak,
            NodeType::Hyperlink => XamlTag::Hyperlink,
            NodeType::Image => XamlTag::InlineUIContainer,
            NodeType::Paragraph => XamlTag::Paragraph,
            NodeType::List => XamlTag::List,
            NodeType::ListItem => XamlTag::ListItem,
            NodeType::Table => XamlTag::Table,
            NodeType::TableBody => XamlTag::TableRowGroup,
            NodeType::Row => XamlTag::TableRow,
            NodeType::Cell => XamlTag::TableCell,
            NodeType::ListText | NodeType::FieldBegin | NodeType::FieldEnd | NodeType::Shape => {
                return None;
            },
        })
    }
}

/// Closed set of element names the converter writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum XamlTag {
    Section,
    Paragraph,
    Run,
    Span,
    LineBreak,
    Hyperlink,
    List,
    ListItem,
    Table,
    TableColumns,
    TableColumn,
    TableRowGroup,
    TableRow,
    TableCell,
    InlineUIContainer,
    Image,
    ImageSource,
    BitmapImage,
}

impl XamlTag {
    pub fn name(self) -> &'static str {
        match self {
            XamlTag::Section => "Section",
            XamlTag::Paragraph => "Paragraph",
            XamlTag::Run => "Run",
            XamlTag::Span => "Span",
            XamlTag::LineBreak => "LineBreak",
            XamlTag::Hyperlink => "Hyperlink",
            XamlTag::List => "List",
            XamlTag::ListItem => "ListItem",
            XamlTag::Table => "Table",
            XamlTag::TableColumns => "Table.Columns",
            XamlTag::TableColumn => "TableColumn",
            XamlTag::TableRowGroup => "TableRowGroup",
            XamlTag::TableRow => "TableRow",
            XamlTag::TableCell => "TableCell",
            XamlTag::InlineUIContainer => "InlineUIContainer",
            XamlTag::Image => "Image",
            XamlTag::ImageSource => "Image.Source",
            XamlTag::BitmapImage => "BitmapImage",
        }
    }

    /// Attributes every instance of the tag carries.
    pub fn min_attribute_count(self) -> usize {
        match self {
            XamlTag::Section => 2,
            XamlTag::Table | XamlTag::TableColumn | XamlTag::Image => 1,
            XamlTag::BitmapImage => 2,
            _ => 0,
        }
    }
}

/// Which part of a field a marker delimits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Field,
    Instruction,
    Result,
}

/// One merged column boundary of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnState {
    /// Boundary in twips
    pub cellx: i64,
    /// Row that introduced the boundary
    pub row: NodeId,
    /// The introducing row has a cell ending exactly here that starts at the
    /// previous boundary
    pub filled: bool,
}

/// The unit of output structure.
#[derive(Debug, Clone)]
pub struct DocumentNode {
    pub node_type: NodeType,
    pub format: FormatState,
    /// Finished markup; final once `terminated`
    pub xaml: String,
    /// Raw text of leaves (unescaped); hyperlink target frame
    pub content: String,
    /// List marker text or hyperlink target
    pub custom: String,
    /// Flattened descendant count, meaningful once closed
    pub child_count: usize,
    /// Position in the live sequence
    pub index: usize,
    /// Parent link, set once the parent closes
    pub parent: Option<NodeId>,
    pub pending: bool,
    pub terminated: bool,
    pub row_span: usize,
    pub col_span: usize,
    /// Left margin hoisted onto a list item, twips
    pub near_margin: i64,
    pub flow_direction: Option<Direction>,
    pub field_kind: Option<FieldKind>,
    pub list_marker: MarkerStyle,
    pub list_ils: i64,
    pub start_index: i64,
    /// Table columns after reconciliation
    pub column_states: Vec<ColumnState>,
    /// Left edge of the table, twips
    pub table_left: i64,
    /// Row definition captured at `\row`
    pub row_format: Option<Box<RowFormat>>,
    /// Resolved cell formatting
    pub cell_format: Option<CellFormat>,
}

impl DocumentNode {
    pub fn new(node_type: NodeType, format: FormatState) -> Self {
        Self {
            node_type,
            format,
            xaml: String::new(),
            content: String::new(),
            custom: String::new(),
            child_count: 0,
            index: 0,
            parent: None,
            pending: true,
            terminated: false,
            row_span: 1,
            col_span: 1,
            near_margin: 0,
            flow_direction: None,
            field_kind: None,
            list_marker: MarkerStyle::None,
            list_ils: -1,
            start_index: 1,
            column_states: Vec::new(),
            table_left: 0,
            row_format: None,
            cell_format: None,
        }
    }

    /// A node that is complete on creation.
    pub fn leaf(node_type: NodeType, format: FormatState) -> Self {
        let mut node = Self::new(node_type, format);
        node.pending = false;
        node
    }

    pub fn text(format: FormatState, text: &str) -> Self {
        let mut node = Self::leaf(NodeType::Text, format);
        node.content.push_str(text);
        node
    }

    pub fn field_marker(node_type: NodeType, kind: FieldKind, format: FormatState) -> Self {
        let mut node = Self::leaf(node_type, format);
        node.field_kind = Some(kind);
        node
    }

    #[inline]
    pub fn is_inline(&self) -> bool {
        self.node_type.is_inline()
    }

    #[inline]
    pub fn is_block(&self) -> bool {
        self.node_type.is_block()
    }

    /// Omitted from output (merged or spanned table cell).
    pub fn is_dropped(&self) -> bool {
        self.node_type == NodeType::Cell && (self.col_span == 0 || self.row_span == 0)
    }

    /// Release the strings of a node that left the live sequence.
    pub(crate) fn release(&mut self) {
        self.pending = false;
        self.xaml = String::new();
        self.content = String::new();
        self.custom = String::new();
        self.column_states = Vec::new();
        self.row_format = None;
    }
}

/// Lookup tables needed while writing markup.
pub struct XamlContext<'a> {
    pub fonts: &'a FontTable,
    pub colors: &'a ColorTable,
    pub options: &'a ConvertOptions,
    /// Formatting the root element implies
    pub root: &'a FormatState,
}

impl XamlContext<'_> {
    fn color(&self, index: i64) -> Color {
        self.colors.get(index).unwrap_or(Color::BLACK)
    }
}

/// Writes one start tag, tracking how many attributes it carries.
pub struct TagWriter<'a> {
    out: &'a mut String,
    tag: XamlTag,
    attributes: usize,
}

impl<'a> TagWriter<'a> {
    pub fn open(out: &'a mut String, tag: XamlTag) -> Self {
        out.push('<');
        out.push_str(tag.name());
        Self {
            out,
            tag,
            attributes: 0,
        }
    }

    pub fn attr(&mut self, name: &str, value: &str) -> &mut Self {
        self.out.push(' ');
        self.out.push_str(name);
        self.out.push_str("=\"");
        self.out.push_str(&escape(value));
        self.out.push('"');
        self.attributes += 1;
        self
    }

    pub fn attr_px(&mut self, name: &str, px: f64) -> &mut Self {
        self.out.push(' ');
        self.out.push_str(name);
        self.out.push_str("=\"");
        push_px(self.out, px);
        self.out.push('"');
        self.attributes += 1;
        self
    }

    pub fn attr_int(&mut self, name: &str, value: i64) -> &mut Self {
        let mut buf = itoa::Buffer::new();
        let formatted = buf.format(value);
        self.out.push(' ');
        self.out.push_str(name);
        self.out.push_str("=\"");
        self.out.push_str(formatted);
        self.out.push('"');
        self.attributes += 1;
        self
    }

    /// Four pixel values as a `Thickness`.
    pub fn attr_thickness(&mut self, name: &str, left: f64, top: f64, right: f64, bottom: f64) -> &mut Self {
        let mut value = String::new();
        for (i, px) in [left, top, right, bottom].into_iter().enumerate() {
            if i > 0 {
                value.push(',');
            }
            push_px(&mut value, px);
        }
        self.attr(name, &value)
    }

    pub fn finish(self) {
        debug_assert!(self.attributes >= self.tag.min_attribute_count());
        self.out.push('>');
    }

    pub fn finish_empty(self) {
        debug_assert!(self.attributes >= self.tag.min_attribute_count());
        self.out.push_str(" />");
    }
}

/// Append the closing tag of `tag`.
pub fn close_tag(out: &mut String, tag: XamlTag) {
    out.push_str("</");
    out.push_str(tag.name());
    out.push('>');
}

/// Root start tag.
pub fn root_start(out: &mut String, block: bool) -> XamlTag {
    let tag = if block { XamlTag::Section } else { XamlTag::Span };
    let mut writer = TagWriter::open(out, tag);
    writer.attr("xml:space", "preserve").attr("xmlns", XAML_NAMESPACE);
    writer.finish();
    tag
}

impl DocumentNode {
    /// Start markup of this node given its parent.
    pub fn append_start(&self, out: &mut String, ctx: &XamlContext<'_>, parent: Option<&DocumentNode>) {
        if self.is_dropped() {
            return;
        }
        let Some(tag) = self.node_type.tag() else {
            return;
        };
        let parent_format = parent.map_or(ctx.root, |p| &p.format);

        match self.node_type {
            NodeType::Text | NodeType::Inline => {
                let mut w = TagWriter::open(out, tag);
                write_inline_attributes(&mut w, ctx, &self.format, parent_format);
                w.finish();
            },
            NodeType::Hyperlink => {
                let mut w = TagWriter::open(out, tag);
                write_inline_attributes(&mut w, ctx, &self.format, parent_format);
                if !self.custom.is_empty() {
                    w.attr("NavigateUri", &self.custom);
                }
                if !self.content.is_empty() {
                    w.attr("TargetName", &self.content);
                }
                w.finish();
            },
            NodeType::LineBreak => TagWriter::open(out, tag).finish_empty(),
            NodeType::Image => out.push_str(&self.content),
            NodeType::Paragraph => {
                let mut w = TagWriter::open(out, tag);
                write_inline_attributes(&mut w, ctx, &self.format, parent_format);
                write_paragraph_attributes(&mut w, ctx, self, parent);
                w.finish();
            },
            NodeType::List => {
                let mut w = TagWriter::open(out, tag);
                w.attr("Margin", "0,0,0,0").attr("Padding", "0,0,0,0");
                w.attr("MarkerStyle", self.list_marker.xaml_name());
                if self.start_index != 1 && self.list_marker.is_numbered() {
                    w.attr_int("StartIndex", self.start_index);
                }
                if self.flow_direction == Some(Direction::RightToLeft) {
                    w.attr("FlowDirection", Direction::RightToLeft.xaml_name());
                }
                w.finish();
            },
            NodeType::ListItem => {
                let mut w = TagWriter::open(out, tag);
                if self.near_margin > 0 {
                    w.attr_thickness("Margin", twip_to_positive_px(self.near_margin as f64), 0.0, 0.0, 0.0);
                }
                if let Some(direction) = self.flow_direction
                    && parent.and_then(|p| p.flow_direction) != Some(direction)
                {
                    w.attr("FlowDirection", direction.xaml_name());
                }
                w.finish();
            },
            NodeType::Table => {
                let mut w = TagWriter::open(out, tag);
                w.attr("CellSpacing", "0");
                let direction = self.row_format.as_ref().map_or(Direction::LeftToRight, |r| r.direction);
                if direction == Direction::RightToLeft {
                    w.attr("FlowDirection", direction.xaml_name());
                }
                w.finish();
                self.append_columns(out);
            },
            NodeType::TableBody | NodeType::Row => TagWriter::open(out, tag).finish(),
            NodeType::Cell => {
                let mut w = TagWriter::open(out, tag);
                write_cell_attributes(&mut w, ctx, self);
                w.finish();
            },
            NodeType::ListText | NodeType::FieldBegin | NodeType::FieldEnd | NodeType::Shape => {},
        }
    }

    /// Closing markup of this node.
    pub fn append_end(&self, out: &mut String) {
        if self.is_dropped() {
            return;
        }
        match self.node_type {
            NodeType::LineBreak | NodeType::Image => {},
            ty => {
                if let Some(tag) = ty.tag() {
                    close_tag(out, tag);
                }
            },
        }
    }

    /// Full markup of a childless node.
    pub fn leaf_markup(&self, ctx: &XamlContext<'_>, parent: Option<&DocumentNode>) -> String {
        let mut out = String::new();
        if self.is_dropped() || self.node_type.tag().is_none() {
            return out;
        }
        self.append_start(&mut out, ctx, parent);
        if matches!(self.node_type, NodeType::Text | NodeType::Inline | NodeType::Hyperlink) {
            out.push_str(&escape(self.content_text()));
        }
        self.append_end(&mut out);
        out
    }

    /// Displayed text of a leaf. Hyperlink `content` holds the target frame.
    fn content_text(&self) -> &str {
        match self.node_type {
            NodeType::Text => &self.content,
            _ => "",
        }
    }

    fn append_columns(&self, out: &mut String) {
        if self.column_states.is_empty() {
            return;
        }
        out.push_str("<Table.Columns>");
        let mut previous = self.table_left;
        for column in &self.column_states {
            let width = twip_to_positive_px((column.cellx - previous) as f64);
            let mut w = TagWriter::open(out, XamlTag::TableColumn);
            w.attr_px("Width", width);
            w.finish_empty();
            previous = column.cellx;
        }
        close_tag(out, XamlTag::TableColumns);
    }
}

/// Character formatting that differs from the parent.
fn write_inline_attributes(w: &mut TagWriter<'_>, ctx: &XamlContext<'_>, fs: &FormatState, parent: &FormatState) {
    if fs.font != parent.font
        && let Some(entry) = ctx.fonts.get(fs.font)
        && !entry.name.is_empty()
    {
        w.attr("FontFamily", ctx.options.substitute_font(&entry.name));
    }
    if fs.font_size != parent.font_size && fs.font_size > 0 {
        w.attr_px("FontSize", half_points_to_px(fs.font_size));
    }
    if fs.bold != parent.bold {
        w.attr("FontWeight", if fs.bold { "Bold" } else { "Normal" });
    }
    if fs.italic != parent.italic {
        w.attr("FontStyle", if fs.italic { "Italic" } else { "Normal" });
    }
    if fs.cf != parent.cf && fs.cf >= 0 {
        w.attr("Foreground", &ctx.color(fs.cf).to_string());
    }
    if fs.cb != parent.cb
        && let Some(color) = ctx.colors.get(fs.cb)
    {
        w.attr("Background", &color.to_string());
    }
    let underline = fs.underline != Underline::None;
    let strike = fs.strike != Strike::None;
    let parent_underline = parent.underline != Underline::None;
    let parent_strike = parent.strike != Strike::None;
    match (underline && !parent_underline, strike && !parent_strike) {
        (true, true) => {
            w.attr("TextDecorations", "Underline, Strikethrough");
        },
        (true, false) => {
            w.attr("TextDecorations", "Underline");
        },
        (false, true) => {
            w.attr("TextDecorations", "Strikethrough");
        },
        (false, false) => {},
    }
    if fs.super_sub != parent.super_sub {
        let value = match fs.super_sub {
            SuperSub::Super => "Superscript",
            SuperSub::Sub => "Subscript",
            SuperSub::None => "Baseline",
        };
        w.attr("BaselineAlignment", value);
    }
    if fs.char_direction != parent.char_direction {
        w.attr("FlowDirection", fs.char_direction.xaml_name());
    }
    if fs.lang != parent.lang
        && let Some(tag) = language_tag(fs.lang)
    {
        w.attr("xml:lang", tag);
    }
}

fn write_paragraph_attributes(
    w: &mut TagWriter<'_>,
    ctx: &XamlContext<'_>,
    node: &DocumentNode,
    parent: Option<&DocumentNode>,
) {
    let fs = &node.format;
    let in_list_item = parent.is_some_and(|p| p.node_type == NodeType::ListItem);

    if fs.li != 0 || fs.ri != 0 || fs.sb != 0 || fs.sa != 0 {
        w.attr_thickness(
            "Margin",
            twip_to_positive_px(fs.li as f64),
            twip_to_positive_px(fs.sb as f64),
            twip_to_positive_px(fs.ri as f64),
            twip_to_positive_px(fs.sa as f64),
        );
    }
    if fs.fi != 0 && !(in_list_item && fs.fi < 0) {
        w.attr_px("TextIndent", twip_to_px(fs.fi as f64));
    }
    if fs.sl != 0 && !fs.sl_mult {
        w.attr_px("LineHeight", twip_to_positive_px(fs.sl.unsigned_abs() as f64));
    }
    if fs.align != super::format::Alignment::Left {
        w.attr("TextAlignment", fs.align.xaml_name());
    }
    let inherited = parent.and_then(|p| p.flow_direction).unwrap_or(Direction::LeftToRight);
    if fs.para_direction != inherited {
        w.attr("FlowDirection", fs.para_direction.xaml_name());
    }
    if fs.para_cb >= 0 || fs.para_shading >= 0 {
        let color = color_to_use(ctx.colors, fs.para_cb, fs.para_cf, fs.para_shading);
        w.attr("Background", &color.to_string());
    }
    let border = &fs.para_border;
    if !border.is_empty() {
        let px = |b: &BorderFormat| twip_to_positive_visible_px(b.effective_width() as f64);
        w.attr_thickness("BorderThickness", px(&border.left), px(&border.top), px(&border.right), px(&border.bottom));
        w.attr("BorderBrush", &ctx.color(border.color()).to_string());
        let space = twip_to_positive_px(border.space() as f64);
        if space > 0.0 {
            w.attr_thickness("Padding", space, space, space, space);
        }
    }
}

fn write_cell_attributes(w: &mut TagWriter<'_>, ctx: &XamlContext<'_>, node: &DocumentNode) {
    if node.col_span > 1 {
        w.attr_int("ColumnSpan", node.col_span as i64);
    }
    if node.row_span > 1 {
        w.attr_int("RowSpan", node.row_span as i64);
    }
    let Some(cell) = node.cell_format.as_ref() else {
        return;
    };

    if cell.has_borders() {
        let px = |b: &BorderFormat| twip_to_positive_visible_px(b.effective_width() as f64);
        w.attr_thickness("BorderThickness", px(&cell.left), px(&cell.top), px(&cell.right), px(&cell.bottom));
        let color = [cell.left, cell.top, cell.right, cell.bottom]
            .iter()
            .map(|b| b.color)
            .find(|&c| c >= 0)
            .unwrap_or(-1);
        w.attr("BorderBrush", &ctx.color(color).to_string());
    }

    let pad = |value: i64| twip_to_positive_px(value.max(0) as f64);
    if cell.padding_left >= 0 || cell.padding_top >= 0 || cell.padding_right >= 0 || cell.padding_bottom >= 0 {
        w.attr_thickness(
            "Padding",
            pad(cell.padding_left),
            pad(cell.padding_top),
            pad(cell.padding_right),
            pad(cell.padding_bottom),
        );
    }
    if cell.has_shading() {
        let color = color_to_use(ctx.colors, cell.cb, cell.cf, cell.shading);
        w.attr("Background", &color.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context<'a>(fonts: &'a FontTable, colors: &'a ColorTable, options: &'a ConvertOptions, root: &'a FormatState) -> XamlContext<'a> {
        XamlContext {
            fonts,
            colors,
            options,
            root,
        }
    }

    #[test]
    fn test_run_attributes_diff_against_parent() {
        let fonts = FontTable::new();
        let colors = ColorTable::new();
        let options = ConvertOptions::default();
        let root = FormatState::default();
        let ctx = context(&fonts, &colors, &options, &root);

        let mut format = FormatState::default();
        format.bold = true;
        format.font_size = 36;
        let node = DocumentNode::text(format, "a<b");
        assert_eq!(node.leaf_markup(&ctx, None), r#"<Run FontSize="24" FontWeight="Bold">a&lt;b</Run>"#);

        let parent = DocumentNode::new(NodeType::Paragraph, node.format.clone());
        assert_eq!(node.leaf_markup(&ctx, Some(&parent)), "<Run>a&lt;b</Run>");
    }

    #[test]
    fn test_dropped_cell_emits_nothing() {
        let fonts = FontTable::new();
        let colors = ColorTable::new();
        let options = ConvertOptions::default();
        let root = FormatState::default();
        let ctx = context(&fonts, &colors, &options, &root);

        let mut cell = DocumentNode::new(NodeType::Cell, FormatState::default());
        cell.col_span = 0;
        let mut out = String::new();
        cell.append_start(&mut out, &ctx, None);
        cell.append_end(&mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_tag_table() {
        assert_eq!(XamlTag::TableColumns.name(), "Table.Columns");
        assert_eq!(XamlTag::Section.min_attribute_count(), 2);
        assert_eq!(NodeType::Cell.tag(), Some(XamlTag::TableCell));
        assert_eq!(NodeType::Shape.tag(), None);
        assert!(NodeType::FieldBegin.is_inline());
        assert!(NodeType::Table.is_block());
    }

    #[test]
    fn test_root_start() {
        let mut out = String::new();
        let tag = root_start(&mut out, false);
        close_tag(&mut out, tag);
        assert_eq!(
            out,
            r#"<Span xml:space="preserve" xmlns="http://schemas.microsoft.com/winfx/2006/xaml/presentation"></Span>"#
        );
    }
}
