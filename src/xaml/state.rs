//! Conversion state and the structural work done at paragraph, cell and
//! row boundaries.

use super::format::{Destination, FormatState};
use super::list::desired_markers;
use super::list_table::{ListOverrideTable, ListTable};
use super::node::{DocumentNode, FieldKind, NodeId, NodeType, XamlContext, close_tag, root_start};
use super::node_array::DocumentNodeArray;
use super::options::ConvertOptions;
use super::picture::{ImageSink, MetafileRasterizer, PictureState};
use super::tables::{ColorTable, FontTable};
use crate::rtf::TokenSource;
use smallvec::SmallVec;
use std::borrow::Cow;
use tracing::trace;

/// Everything one conversion keeps between tokens.
pub struct ConverterState<'a> {
    pub(crate) options: ConvertOptions,
    /// State outside every group
    pub(crate) base: FormatState,
    /// One entry per open group
    pub(crate) stack: Vec<FormatState>,
    pub(crate) nodes: DocumentNodeArray,
    pub(crate) fonts: FontTable,
    pub(crate) colors: ColorTable,
    pub(crate) lists: ListTable,
    pub(crate) overrides: ListOverrideTable,
    /// `\deff`, -1 when unset
    pub(crate) default_font: i64,
    /// `\deflang`, -1 when unset
    pub(crate) default_lang: i64,
    /// `\ansicpg` or the configured default
    pub(crate) document_code_page: u32,
    /// Code page last handed to the token source
    pub(crate) lexer_code_page: u32,
    /// `\*` was seen and no keyword followed yet
    pub(crate) pending_destination: bool,
    /// First half of a surrogate pair written with `\u`
    pub(crate) high_surrogate: Option<u32>,
    pub(crate) picture: Option<PictureState>,
    pub(crate) image_index: usize,
    /// Node collecting the current `\listtext`
    pub(crate) list_text: Option<NodeId>,
    /// `\field` groups not yet closed
    pub(crate) open_fields: usize,
    /// Open shapes with the group depth that owns them
    pub(crate) shapes: Vec<(usize, NodeId)>,
    /// Top-level positions before this are final
    pub(crate) coalesce_mark: usize,
    /// Formatting implied by the root element
    pub(crate) root_format: FormatState,
    pub(crate) images: Option<&'a mut dyn ImageSink>,
    pub(crate) rasterizer: Option<&'a dyn MetafileRasterizer>,
}

impl<'a> ConverterState<'a> {
    pub fn new(
        options: ConvertOptions,
        images: Option<&'a mut dyn ImageSink>,
        rasterizer: Option<&'a dyn MetafileRasterizer>,
    ) -> Self {
        let code_page = options.default_code_page;
        let base = FormatState {
            code_page,
            ..FormatState::default()
        };
        Self {
            options,
            base,
            stack: Vec::new(),
            nodes: DocumentNodeArray::new(),
            fonts: FontTable::new(),
            colors: ColorTable::new(),
            lists: ListTable::new(),
            overrides: ListOverrideTable::new(),
            default_font: -1,
            default_lang: -1,
            document_code_page: code_page,
            lexer_code_page: code_page,
            pending_destination: false,
            high_surrogate: None,
            picture: None,
            image_index: 0,
            list_text: None,
            open_fields: 0,
            shapes: Vec::new(),
            coalesce_mark: 0,
            root_format: FormatState::default(),
            images,
            rasterizer,
        }
    }

    #[inline]
    pub(crate) fn top(&self) -> &FormatState {
        self.stack.last().unwrap_or(&self.base)
    }

    #[inline]
    pub(crate) fn top_mut(&mut self) -> &mut FormatState {
        match self.stack.last_mut() {
            Some(top) => top,
            None => &mut self.base,
        }
    }

    /// Hand the top state's code page to the token source if it changed.
    pub(crate) fn sync_code_page(&mut self, source: &mut dyn TokenSource) {
        let code_page = self.top().code_page;
        if code_page != self.lexer_code_page {
            source.set_code_page(code_page);
            self.lexer_code_page = code_page;
        }
    }

    /// Select font `index` in the top state, switching to its code page.
    pub(crate) fn select_font(&mut self, index: i64) {
        let code_page = self
            .fonts
            .get(index)
            .and_then(|f| f.code_page)
            .unwrap_or(self.document_code_page);
        let top = self.top_mut();
        top.font = index;
        top.code_page = code_page;
    }

    fn coalesce(&mut self, at: usize) {
        let ctx = XamlContext {
            fonts: &self.fonts,
            colors: &self.colors,
            options: &self.options,
            root: &self.root_format,
        };
        self.nodes.coalesce_children(&ctx, at);
    }

    fn coalesce_only(&mut self, at: usize) {
        let ctx = XamlContext {
            fonts: &self.fonts,
            colors: &self.colors,
            options: &self.options,
            root: &self.root_format,
        };
        self.nodes.coalesce_only_children(&ctx, at);
    }

    // Text

    /// Literal text routed by the current destination.
    pub(crate) fn handle_text(&mut self, text: &str) {
        self.high_surrogate = None;
        let dest = self.top().dest;
        match dest {
            d if d.is_content() => self.add_content_text(text),
            Destination::FieldInstruction => {
                let format = self.top().clone();
                self.append_text(format, text);
            },
            Destination::ListText => {
                if let Some(id) = self.list_text {
                    self.nodes.get_mut(id).content.push_str(text);
                }
            },
            Destination::FontTable => self.fonts.append_name(text),
            Destination::ColorTable => {
                for _ in text.matches(';') {
                    self.colors.finish_entry();
                }
            },
            _ => {},
        }
    }

    fn add_content_text(&mut self, text: &str) {
        let format = self.top().clone();
        if format.hidden {
            return;
        }
        let text = if format.caps {
            Cow::Owned(text.to_uppercase())
        } else {
            Cow::Borrowed(text)
        };
        self.append_text(format, &text);
    }

    /// Append to the last text node when it is still open to more text,
    /// otherwise start a new one.
    fn append_text(&mut self, format: FormatState, text: &str) {
        if let Some(last) = self.nodes.last_mut()
            && last.node_type == NodeType::Text
            && !last.terminated
            && last.parent.is_none()
            && last.format.dest == format.dest
            && last.format.same_character_format(&format)
        {
            last.content.push_str(text);
            return;
        }
        self.nodes.push(DocumentNode::text(format, text));
    }

    /// `\line`.
    pub(crate) fn add_line_break(&mut self) {
        let format = self.top().clone();
        self.nodes.push(DocumentNode::leaf(NodeType::LineBreak, format));
    }

    /// A `\uN` code unit.
    pub(crate) fn add_unicode(&mut self, unit: u32) {
        let pending = self.high_surrogate.take();
        let ch = match unit {
            0xD800..=0xDBFF => {
                self.high_surrogate = Some(unit);
                return;
            },
            0xDC00..=0xDFFF => match pending {
                Some(high) => char::from_u32(0x10000 + ((high - 0xD800) << 10) + (unit - 0xDC00)),
                None => None,
            },
            _ => char::from_u32(unit),
        };
        if let Some(ch) = ch {
            let mut buf = [0u8; 4];
            self.handle_text(ch.encode_utf8(&mut buf));
        }
    }

    // Paragraph structure

    /// Trailing inline nodes become a paragraph placed in the table cell and
    /// list item the paragraph properties ask for.
    pub(crate) fn end_paragraph(&mut self) {
        let format = self.top().clone();
        let tail_start = self.nodes.inline_tail_start();
        let tail = self.nodes.detach_tail(tail_start);
        let marker_text = self.marker_text(&tail);

        self.reconcile_tables(format.table_level(), &format);
        self.reconcile_paragraph_lists(&format, marker_text.as_deref());

        let start = self.nodes.attach_tail(tail);
        self.make_paragraph(start, &format);
        self.top_mut().listtext_seen = false;
    }

    /// `\cell` / `\nestcell`.
    pub(crate) fn end_cell(&mut self) {
        let format = self.top().clone();
        let depth = format.table_level().max(1);
        let tail_start = self.nodes.inline_tail_start();
        let has_tail = tail_start < self.nodes.len();
        let tail = self.nodes.detach_tail(tail_start);
        let marker_text = self.marker_text(&tail);

        self.reconcile_tables(depth, &format);
        if has_tail {
            self.reconcile_paragraph_lists(&format, marker_text.as_deref());
        }
        let start = self.nodes.attach_tail(tail);

        let Some(cell) = self.nodes.find_pending(NodeType::Cell) else {
            return;
        };
        let empty = cell + 1 == self.nodes.len();
        if has_tail || empty {
            self.make_paragraph(start, &format);
        }
        if let Some(cell) = self.nodes.find_pending(NodeType::Cell) {
            self.nodes.close_at(cell);
        }
        self.top_mut().listtext_seen = false;
    }

    /// `\row` / `\nestrow`.
    pub(crate) fn end_row(&mut self) {
        if self.nodes.inline_tail_start() < self.nodes.len() {
            self.end_cell();
        }
        let format = self.top().clone();
        let depth = format.table_level().max(1);
        let tables = self.pending_tables();
        if tables.is_empty() {
            return;
        }
        if tables.len() > depth {
            self.close_table(tables[depth], &format);
        }
        let table = self.nodes.index_of(tables[tables.len().min(depth) - 1]);
        let Some(row) = self.nodes.find_pending_after(NodeType::Row, Some(table)) else {
            return;
        };
        self.nodes.at_mut(row).row_format = Some(Box::new(format.row_snapshot()));
        self.nodes.close_at(row);
    }

    fn marker_text(&self, tail: &[NodeId]) -> Option<String> {
        let mut text: Option<String> = None;
        for &id in tail {
            let node = self.nodes.get(id);
            if node.node_type == NodeType::ListText {
                text.get_or_insert_with(String::new).push_str(&node.content);
            }
        }
        text
    }

    fn reconcile_paragraph_lists(&mut self, format: &FormatState, marker_text: Option<&str>) {
        let want = desired_markers(format, &self.lists, &self.overrides, marker_text);
        let is_continue = format.old_list.is_continue;
        self.nodes.reconcile_lists(&want, is_continue, format, &self.options);
    }

    /// Wrap everything from `start` on in a closed paragraph.
    fn make_paragraph(&mut self, start: usize, format: &FormatState) -> NodeId {
        for position in (start..self.nodes.len()).rev() {
            if self.nodes.at(position).node_type == NodeType::ListText {
                self.nodes.excise(position, 1);
            }
        }
        self.list_text = None;
        let id = self.nodes.insert(start, DocumentNode::new(NodeType::Paragraph, format.clone()));
        let at = self.nodes.index_of(id);
        self.nodes.close_at(at);
        self.finish_block(id);
        id
    }

    /// A block just closed: coalesce what can no longer change. Nested
    /// blocks inside an open field wait for the field to be resolved.
    fn finish_block(&mut self, id: NodeId) {
        let at = self.nodes.index_of(id);
        if self.nodes.parent_of(at).is_some() {
            if self.open_fields == 0 {
                self.coalesce_only(at);
            }
        } else {
            self.coalesce_top_level(false);
        }
    }

    /// Coalesce closed top-level blocks from the mark on. Blocks after an
    /// open field and a trailing list that may still resume are left alone
    /// unless `everything` is set.
    pub(crate) fn coalesce_top_level(&mut self, everything: bool) {
        let mut position = self.coalesce_mark.min(self.nodes.len());
        let mut mark = None;
        while position < self.nodes.len() {
            let node = self.nodes.at(position);
            let end = self.nodes.span_end(position);
            if node.terminated {
                position = end;
                continue;
            }
            if !everything {
                let open_field = node.node_type == NodeType::FieldBegin && node.field_kind == Some(FieldKind::Field);
                if node.pending || open_field {
                    mark.get_or_insert(position);
                    break;
                }
                let resumable =
                    node.node_type == NodeType::List && self.options.resume_lists && self.only_paragraphs_from(end);
                if node.is_inline() || resumable {
                    mark.get_or_insert(position);
                    position = end;
                    continue;
                }
            }
            let id = self.nodes.id_at(position);
            self.coalesce(position);
            position = self.nodes.index_of(id) + 1;
        }
        self.coalesce_mark = mark.unwrap_or(position);
    }

    fn only_paragraphs_from(&self, mut position: usize) -> bool {
        while position < self.nodes.len() {
            if self.nodes.at(position).node_type != NodeType::Paragraph {
                return false;
            }
            position = self.nodes.span_end(position);
        }
        true
    }

    // Tables

    /// Pending tables inside the current shape scope, outermost first.
    fn pending_tables(&self) -> SmallVec<[NodeId; 4]> {
        let mut tables = SmallVec::new();
        for &id in self.nodes.open_nodes() {
            match self.nodes.get(id).node_type {
                NodeType::Shape => tables.clear(),
                NodeType::Table => tables.push(id),
                _ => {},
            }
        }
        tables
    }

    /// Make `depth` tables open, each with an open cell.
    fn reconcile_tables(&mut self, depth: usize, format: &FormatState) {
        let tables = self.pending_tables();
        if tables.len() > depth {
            self.close_table(tables[depth], format);
        }
        let mut open = tables.len().min(depth);
        if open < depth {
            self.close_scope_lists();
        }
        while open < depth {
            if open > 0 {
                self.ensure_cell(format);
            }
            trace!(depth = open + 1, "opening table");
            for node_type in [NodeType::Table, NodeType::TableBody, NodeType::Row, NodeType::Cell] {
                self.nodes.push(DocumentNode::new(node_type, format.clone()));
            }
            open += 1;
        }
        if depth > 0 {
            self.ensure_cell(format);
        }
    }

    fn close_table(&mut self, table: NodeId, format: &FormatState) {
        let at = self.nodes.index_of(table);
        self.snapshot_open_rows(at, format);
        self.nodes.close_at(at);
        self.finish_block(table);
    }

    /// Rows that never saw `\row` take the current row definition.
    fn snapshot_open_rows(&mut self, from: usize, format: &FormatState) {
        let rows: SmallVec<[NodeId; 4]> = self
            .nodes
            .open_nodes()
            .iter()
            .copied()
            .filter(|&id| {
                let node = self.nodes.get(id);
                node.node_type == NodeType::Row && node.index >= from && node.row_format.is_none()
            })
            .collect();
        for id in rows {
            self.nodes.get_mut(id).row_format = Some(Box::new(format.row_snapshot()));
        }
    }

    /// Open the body, row and cell of the innermost table as needed.
    fn ensure_cell(&mut self, format: &FormatState) {
        let Some(table) = self.nodes.find_pending(NodeType::Table) else {
            return;
        };
        let Some(body) = self.nodes.find_pending_after(NodeType::TableBody, Some(table)) else {
            for node_type in [NodeType::TableBody, NodeType::Row, NodeType::Cell] {
                self.nodes.push(DocumentNode::new(node_type, format.clone()));
            }
            return;
        };
        let Some(row) = self.nodes.find_pending_after(NodeType::Row, Some(body)) else {
            for node_type in [NodeType::Row, NodeType::Cell] {
                self.nodes.push(DocumentNode::new(node_type, format.clone()));
            }
            return;
        };
        if self.nodes.find_pending_after(NodeType::Cell, Some(row)).is_none() {
            self.nodes.push(DocumentNode::new(NodeType::Cell, format.clone()));
        }
    }

    /// Close the outermost list of the current scope.
    fn close_scope_lists(&mut self) {
        if let Some(&outer) = self.nodes.open_lists().lists.first() {
            let at = self.nodes.index_of(outer);
            self.nodes.close_at(at);
        }
    }

    // Shapes

    /// `\shp` in document text.
    pub(crate) fn begin_shape(&mut self) {
        let format = self.top().clone();
        let id = self.nodes.push(DocumentNode::new(NodeType::Shape, format));
        self.shapes.push((self.stack.len(), id));
    }

    /// The shape group closed: its content joins the enclosing scope.
    pub(crate) fn end_shape(&mut self, id: NodeId) {
        let at = self.nodes.index_of(id);
        if !self.nodes.get(id).pending {
            return;
        }
        self.nodes.close_at(at);
        let has_blocks = self.nodes.children(at).iter().any(|&c| !self.nodes.at(c).is_inline());
        if has_blocks {
            self.nodes.wrap_inline_runs(Some(at));
            self.wrap_preceding_inlines(at);
        }
        let at = self.nodes.index_of(id);
        self.nodes.remove_keep_children(at);
        self.coalesce_top_level(false);
    }

    /// Inline siblings directly before `at` become a paragraph.
    fn wrap_preceding_inlines(&mut self, at: usize) {
        let mut start = at;
        while start > 0 {
            let sibling = self.nodes.scope_sibling(start - 1);
            let node = self.nodes.at(sibling);
            if node.pending || !node.is_inline() {
                break;
            }
            start = sibling;
        }
        if start < at {
            let format = self.nodes.at(start).format.clone();
            self.nodes.wrap(start, at - start, DocumentNode::new(NodeType::Paragraph, format));
        }
    }

    // End of input

    /// The document group is about to close.
    pub(crate) fn end_document_group(&mut self) {
        let has_tail = self.nodes.inline_tail_start() < self.nodes.len();
        if has_tail && (self.has_blocks() || self.nodes.has_open_nodes() || self.options.force_paragraph) {
            self.end_paragraph();
        }
    }

    fn has_blocks(&self) -> bool {
        let mut position = 0;
        while position < self.nodes.len() {
            if !self.nodes.at(position).is_inline() {
                return true;
            }
            position = self.nodes.span_end(position);
        }
        false
    }

    /// Close everything and produce the final markup.
    pub(crate) fn finish(&mut self, source: &mut dyn TokenSource) -> String {
        while !self.stack.is_empty() {
            self.group_end(source);
        }
        self.end_document_group();

        let format = self.top().clone();
        self.snapshot_open_rows(0, &format);
        self.nodes.close_all();

        let block = self.has_blocks() || self.options.force_paragraph;
        if block {
            self.nodes.wrap_inline_runs(None);
        }
        self.coalesce_mark = 0;
        self.coalesce_top_level(true);

        let mut out = String::new();
        let tag = root_start(&mut out, block);
        out.push_str(&self.nodes.top_level_xaml());
        close_tag(&mut out, tag);
        out
    }
}
