//! Token dispatch and control-word handlers.
//!
//! Every control word mutates the top [`FormatState`] or one of the side
//! tables; the few that change document structure call into the state's
//! paragraph, table, list, field and shape operations.

use super::convert::{MarkerStyle, clamp_border_width, clamp_font_size, clamp_shading, clamp_width_type};
use super::format::{
    Alignment, BorderKind, BorderTarget, Destination, Direction, FormatState, MergeKind, Strike, SuperSub, Underline,
    VerticalAlignment,
};
use super::node::{DocumentNode, FieldKind, NodeType};
use super::picture::{ImageFormat, PictureState};
use super::state::ConverterState;
use super::tables::Channel;
use crate::rtf::{ControlGroup, ControlToken, ControlWord, LexHint, RtfError, RtfResult, Token, TokenSource};
use tracing::debug;

impl ConverterState<'_> {
    /// Hint for the next token request.
    pub(crate) fn lex_hint(&self) -> LexHint {
        LexHint {
            picture_data: self.top().dest == Destination::Picture,
        }
    }

    /// Apply one token. Returns `Ok(false)` at end of input.
    pub(crate) fn dispatch(&mut self, token: Token, source: &mut dyn TokenSource) -> RtfResult<bool> {
        if !matches!(token, Token::Control(_)) {
            self.pending_destination = false;
        }
        match token {
            Token::GroupStart => self.group_start(source.offset())?,
            Token::GroupEnd => self.group_end(source),
            Token::Destination => self.pending_destination = true,
            Token::Control(control) => self.handle_control(&control, source),
            Token::Text(text) => {
                if !self.top().dest.is_suppressed() {
                    self.handle_text(&text);
                }
            },
            Token::PictureData => self.handle_picture_data(source),
            Token::Invalid { offset, reason } => return Err(RtfError::invalid(offset, reason)),
            Token::Eof => return Ok(false),
        }
        Ok(true)
    }

    // Groups

    pub(crate) fn group_start(&mut self, offset: usize) -> RtfResult<()> {
        if self.stack.len() >= self.options.max_group_depth {
            return Err(RtfError::invalid(offset, "group nesting too deep"));
        }
        let state = self.top().clone();
        self.stack.push(state);
        Ok(())
    }

    pub(crate) fn group_end(&mut self, source: &mut dyn TokenSource) {
        if self.stack.is_empty() {
            debug!("unbalanced group end");
            return;
        }
        if self.stack.len() == 1 {
            self.end_document_group();
        }
        let depth = self.stack.len();
        let Some(popped) = self.stack.pop() else {
            return;
        };
        if popped.dest != self.top().dest || popped.dest == Destination::FontTable {
            self.leave_destination(popped.dest, &popped);
        }
        while let Some(&(shape_depth, id)) = self.shapes.last()
            && shape_depth >= depth
        {
            self.shapes.pop();
            self.end_shape(id);
        }
        let left_font_table = popped.dest == Destination::FontTable && self.top().dest != Destination::FontTable;
        if (left_font_table || self.top().font < 0) && self.default_font >= 0 {
            self.select_font(self.default_font);
        }
        self.sync_code_page(source);
    }

    fn leave_destination(&mut self, dest: Destination, popped: &FormatState) {
        match dest {
            Destination::FontTable => self.fonts.finish_entry(),
            Destination::Field => self.process_field(),
            Destination::FieldInstruction => {
                let marker = DocumentNode::field_marker(NodeType::FieldEnd, FieldKind::Instruction, popped.clone());
                self.nodes.push(marker);
            },
            Destination::FieldResult => {
                let marker = DocumentNode::field_marker(NodeType::FieldEnd, FieldKind::Result, popped.clone());
                self.nodes.push(marker);
            },
            Destination::ListText => {
                self.top_mut().listtext_seen = true;
            },
            Destination::OldList => {
                let old_list = popped.old_list;
                self.top_mut().old_list = old_list;
            },
            Destination::Picture => self.picture = None,
            _ => {},
        }
    }

    // Control words

    pub(crate) fn handle_control(&mut self, token: &ControlToken, source: &mut dyn TokenSource) {
        let starred = std::mem::take(&mut self.pending_destination);
        let word = token.word();
        if word == ControlWord::Binary {
            source.skip_binary(token.value_or(0).max(0) as usize);
            return;
        }
        if self.top().dest.is_suppressed() {
            return;
        }
        if word == ControlWord::Unknown {
            if starred || token.info.is_destination() {
                debug!(keyword = %token.name, "skipping unknown destination");
                self.top_mut().dest = Destination::Unknown;
            }
            return;
        }
        match token.group() {
            ControlGroup::Document => self.handle_document(token),
            ControlGroup::Character => self.handle_character(token),
            ControlGroup::Paragraph => self.handle_paragraph(token),
            ControlGroup::Border => self.handle_border(token),
            ControlGroup::Special => self.handle_special(word),
            ControlGroup::Unicode => self.handle_unicode(token, source),
            ControlGroup::FontTable => self.handle_font_table(token),
            ControlGroup::ColorTable => self.handle_color_table(token),
            ControlGroup::Table => self.handle_table(token),
            ControlGroup::List => self.handle_list(token),
            ControlGroup::OldList => self.handle_old_list(token),
            ControlGroup::Shape => self.handle_shape(word),
            ControlGroup::Field => self.handle_field(word),
            ControlGroup::Picture => self.handle_picture(token),
            ControlGroup::Ignored => self.top_mut().dest = Destination::Ignored,
        }
        self.sync_code_page(source);
    }

    fn handle_document(&mut self, token: &ControlToken) {
        let value = token.value_or(0) as i64;
        let code_page = match token.word() {
            ControlWord::Ansi => 1252,
            ControlWord::Mac => 10000,
            ControlWord::Pc => 437,
            ControlWord::Pca => 850,
            ControlWord::AnsiCodePage if value > 0 => value as u32,
            ControlWord::DefaultFont => {
                self.default_font = value;
                if self.top().font < 0 {
                    self.select_font(value);
                }
                return;
            },
            ControlWord::DefaultLanguage => {
                self.default_lang = value;
                let top = self.top_mut();
                if top.lang < 0 {
                    top.lang = value;
                }
                return;
            },
            _ => return,
        };
        self.document_code_page = code_page;
        self.top_mut().code_page = code_page;
    }

    fn handle_character(&mut self, token: &ControlToken) {
        let on = token.toggle();
        let value = token.value_or(0) as i64;
        if token.word() == ControlWord::Font {
            if self.top().dest == Destination::FontTable {
                self.fonts.define_entry(value);
            } else {
                self.select_font(value);
            }
            return;
        }
        if token.word() == ControlWord::Plain {
            let (font, lang) = (self.default_font, self.default_lang);
            self.top_mut().reset_character(font, lang);
            if font >= 0 {
                self.select_font(font);
            }
            return;
        }

        let top = self.top_mut();
        match token.word() {
            ControlWord::Bold => top.bold = on,
            ControlWord::Italic => top.italic = on,
            ControlWord::Underline => top.underline = if on { Underline::Single } else { Underline::None },
            ControlWord::UnderlineNone => top.underline = Underline::None,
            ControlWord::UnderlineDouble => top.underline = if on { Underline::Double } else { Underline::None },
            ControlWord::UnderlineDotted => top.underline = if on { Underline::Dotted } else { Underline::None },
            ControlWord::UnderlineDash => top.underline = if on { Underline::Dash } else { Underline::None },
            ControlWord::UnderlineWords => top.underline = if on { Underline::Words } else { Underline::None },
            ControlWord::UnderlineWave => top.underline = if on { Underline::Wave } else { Underline::None },
            ControlWord::UnderlineThick => top.underline = if on { Underline::Thick } else { Underline::None },
            ControlWord::Strike => top.strike = if on { Strike::Single } else { Strike::None },
            ControlWord::StrikeDouble => top.strike = if on { Strike::Double } else { Strike::None },
            ControlWord::Super => top.super_sub = if on { SuperSub::Super } else { SuperSub::None },
            ControlWord::Sub => top.super_sub = if on { SuperSub::Sub } else { SuperSub::None },
            ControlWord::NoSuperSub => top.super_sub = SuperSub::None,
            ControlWord::Up => top.baseline_offset = token.value_or(6) as i64,
            ControlWord::Down => top.baseline_offset = -(token.value_or(6) as i64),
            ControlWord::SmallCaps => top.small_caps = on,
            ControlWord::Caps => top.caps = on,
            ControlWord::Hidden => top.hidden = on,
            ControlWord::FontSize => top.font_size = clamp_font_size(token.value_or(24) as i64),
            ControlWord::ForeColor => top.cf = value,
            ControlWord::BackColor | ControlWord::CharShading | ControlWord::Highlight => top.cb = value,
            ControlWord::Language => top.lang = value,
            ControlWord::RtlChar => top.char_direction = Direction::RightToLeft,
            ControlWord::LtrChar => top.char_direction = Direction::LeftToRight,
            // Quarter points
            ControlWord::Expand => top.expand = value * 5,
            ControlWord::ExpandTwips => top.expand = value,
            _ => {},
        }
    }

    fn handle_paragraph(&mut self, token: &ControlToken) {
        let value = token.value_or(0) as i64;
        let content = self.top().dest.is_content();
        match token.word() {
            ControlWord::Par | ControlWord::Sect | ControlWord::Page | ControlWord::Column => {
                if content {
                    self.end_paragraph();
                }
                return;
            },
            ControlWord::Line => {
                if content {
                    self.add_line_break();
                }
                return;
            },
            _ => {},
        }

        let top = self.top_mut();
        match token.word() {
            ControlWord::Pard => top.reset_paragraph(),
            ControlWord::LeftIndent | ControlWord::LeftIndentLogical => top.li = value,
            ControlWord::RightIndent | ControlWord::RightIndentLogical => top.ri = value,
            ControlWord::FirstIndent => top.fi = value,
            ControlWord::SpaceBefore => top.sb = value,
            ControlWord::SpaceAfter => top.sa = value,
            ControlWord::SpaceLine => top.sl = value,
            ControlWord::SpaceLineMultiple => top.sl_mult = token.toggle(),
            ControlWord::AlignLeft => top.align = Alignment::Left,
            ControlWord::AlignRight => top.align = Alignment::Right,
            ControlWord::AlignCenter => top.align = Alignment::Center,
            ControlWord::AlignJustify | ControlWord::AlignDistribute => top.align = Alignment::Justify,
            ControlWord::RtlPar => top.para_direction = Direction::RightToLeft,
            ControlWord::LtrPar => top.para_direction = Direction::LeftToRight,
            ControlWord::ParaBackPattern => top.para_cb = value,
            ControlWord::ParaForePattern => top.para_cf = value,
            ControlWord::ParaShading => top.para_shading = clamp_shading(value),
            _ => {},
        }
    }

    fn handle_border(&mut self, token: &ControlToken) {
        let value = token.value_or(0) as i64;
        let top = self.top_mut();
        let kind = match token.word() {
            ControlWord::BorderTop => {
                top.border_target = BorderTarget::ParaTop;
                return;
            },
            ControlWord::BorderBottom => {
                top.border_target = BorderTarget::ParaBottom;
                return;
            },
            ControlWord::BorderLeft => {
                top.border_target = BorderTarget::ParaLeft;
                return;
            },
            ControlWord::BorderRight => {
                top.border_target = BorderTarget::ParaRight;
                return;
            },
            ControlWord::BorderBox => {
                top.border_target = BorderTarget::ParaBox;
                return;
            },
            ControlWord::BorderSingle => BorderKind::Single,
            ControlWord::BorderThick => BorderKind::Thick,
            ControlWord::BorderDouble => BorderKind::Double,
            ControlWord::BorderDotted => BorderKind::Dotted,
            ControlWord::BorderDashed => BorderKind::Dashed,
            ControlWord::BorderHairline => BorderKind::Hairline,
            ControlWord::BorderNone => BorderKind::None,
            ControlWord::BorderWidth => {
                if let Some(edit) = top.target_border() {
                    edit.apply(|b| b.width = clamp_border_width(value));
                }
                return;
            },
            ControlWord::BorderSpace => {
                if let Some(edit) = top.target_border() {
                    edit.apply(|b| b.space = value.max(0));
                }
                return;
            },
            ControlWord::BorderColor => {
                if let Some(edit) = top.target_border() {
                    edit.apply(|b| b.color = value);
                }
                return;
            },
            _ => return,
        };
        if let Some(edit) = top.target_border() {
            edit.apply(|b| b.kind = kind);
        }
    }

    fn handle_special(&mut self, word: ControlWord) {
        let text = match word {
            ControlWord::Tab => "\t",
            ControlWord::EmDash => "\u{2014}",
            ControlWord::EnDash => "\u{2013}",
            ControlWord::Bullet => "\u{2022}",
            ControlWord::LeftQuote => "\u{2018}",
            ControlWord::RightQuote => "\u{2019}",
            ControlWord::LeftDoubleQuote => "\u{201C}",
            ControlWord::RightDoubleQuote => "\u{201D}",
            ControlWord::EmSpace => "\u{2003}",
            ControlWord::EnSpace => "\u{2002}",
            ControlWord::QmSpace => "\u{2005}",
            ControlWord::ZeroWidthJoiner => "\u{200D}",
            ControlWord::ZeroWidthNonJoiner => "\u{200C}",
            ControlWord::LtrMark => "\u{200E}",
            ControlWord::RtlMark => "\u{200F}",
            _ => return,
        };
        self.handle_text(text);
    }

    fn handle_unicode(&mut self, token: &ControlToken, source: &mut dyn TokenSource) {
        match token.word() {
            ControlWord::Unicode => {
                let value = token.value_or(0);
                let unit = (if value < 0 { value + 65536 } else { value }) as u32;
                source.skip_unicode_fallback(self.top().unicode_skip);
                self.add_unicode(unit);
            },
            ControlWord::UnicodeSkip => self.top_mut().unicode_skip = token.value_or(1).max(0) as usize,
            _ => {},
        }
    }

    fn handle_font_table(&mut self, token: &ControlToken) {
        let value = token.value_or(0) as i64;
        match token.word() {
            ControlWord::FontTable => self.top_mut().dest = Destination::FontTable,
            ControlWord::FontCharset => self.fonts.set_current_charset(value),
            ControlWord::FontCodePage if value > 0 => {
                if let Some(entry) = self.fonts.current_mut() {
                    entry.code_page = Some(value as u32);
                }
            },
            _ => {},
        }
    }

    fn handle_color_table(&mut self, token: &ControlToken) {
        let value = token.value_or(0) as i64;
        match token.word() {
            ControlWord::ColorTable => self.top_mut().dest = Destination::ColorTable,
            ControlWord::Red => self.colors.set_component(Channel::Red, value),
            ControlWord::Green => self.colors.set_component(Channel::Green, value),
            ControlWord::Blue => self.colors.set_component(Channel::Blue, value),
            _ => {},
        }
    }

    fn handle_table(&mut self, token: &ControlToken) {
        let value = token.value_or(0) as i64;
        let dest = self.top().dest;
        match token.word() {
            ControlWord::Cell | ControlWord::NestCell => {
                if dest.is_content() {
                    self.end_cell();
                }
                return;
            },
            ControlWord::Row | ControlWord::NestRow => {
                if dest.is_content() || dest == Destination::NestTableProps {
                    self.end_row();
                }
                return;
            },
            ControlWord::NestTableProps => {
                self.top_mut().dest = Destination::NestTableProps;
                return;
            },
            ControlWord::NoNestTables => {
                self.top_mut().dest = Destination::Ignored;
                return;
            },
            _ => {},
        }

        let top = self.top_mut();
        match token.word() {
            ControlWord::InTable => top.in_table = true,
            ControlWord::Itap => {
                top.itap = value.max(0);
                top.in_table = value > 0;
            },
            ControlWord::RowDefaults => top.reset_row(),
            ControlWord::RowBorderTop => top.border_target = BorderTarget::RowTop,
            ControlWord::RowBorderLeft => top.border_target = BorderTarget::RowLeft,
            ControlWord::RowBorderBottom => top.border_target = BorderTarget::RowBottom,
            ControlWord::RowBorderRight => top.border_target = BorderTarget::RowRight,
            ControlWord::RowBorderHorizontal => top.border_target = BorderTarget::RowHorizontal,
            ControlWord::RowBorderVertical => top.border_target = BorderTarget::RowVertical,
            ControlWord::CellBorderTop => top.border_target = BorderTarget::CellTop,
            ControlWord::CellBorderLeft => top.border_target = BorderTarget::CellLeft,
            ControlWord::CellBorderBottom => top.border_target = BorderTarget::CellBottom,
            ControlWord::CellBorderRight => top.border_target = BorderTarget::CellRight,
            word => {
                let mut row = top.row_format.borrow_mut();
                match word {
                    ControlWord::CellBackPattern => row.pending_cell.cb = value,
                    ControlWord::CellForePattern => row.pending_cell.cf = value,
                    ControlWord::CellShading => row.pending_cell.shading = clamp_shading(value),
                    ControlWord::CellVMergeFirst => row.pending_cell.v_merge = MergeKind::First,
                    ControlWord::CellVMerge => row.pending_cell.v_merge = MergeKind::Continue,
                    ControlWord::CellHMergeFirst => row.pending_cell.h_merge = MergeKind::First,
                    ControlWord::CellHMerge => row.pending_cell.h_merge = MergeKind::Continue,
                    ControlWord::CellVAlignTop => row.pending_cell.v_align = VerticalAlignment::Top,
                    ControlWord::CellVAlignCenter => row.pending_cell.v_align = VerticalAlignment::Center,
                    ControlWord::CellVAlignBottom => row.pending_cell.v_align = VerticalAlignment::Bottom,
                    ControlWord::CellPaddingLeft => row.pending_cell.padding_left = value.max(0),
                    ControlWord::CellPaddingTop => row.pending_cell.padding_top = value.max(0),
                    ControlWord::CellPaddingRight => row.pending_cell.padding_right = value.max(0),
                    ControlWord::CellPaddingBottom => row.pending_cell.padding_bottom = value.max(0),
                    ControlWord::CellWidthType => row.pending_cell.width_type = clamp_width_type(value),
                    ControlWord::CellWidth => row.pending_cell.width = value,
                    ControlWord::CellX => row.push_cell(value),
                    ControlWord::RowGap => row.gap = value,
                    ControlWord::RowLeft => row.left = value,
                    ControlWord::RtlRow => row.direction = Direction::RightToLeft,
                    ControlWord::LtrRow => row.direction = Direction::LeftToRight,
                    ControlWord::RowPaddingLeft => row.row_cell.padding_left = value.max(0),
                    ControlWord::RowPaddingTop => row.row_cell.padding_top = value.max(0),
                    ControlWord::RowPaddingRight => row.row_cell.padding_right = value.max(0),
                    ControlWord::RowPaddingBottom => row.row_cell.padding_bottom = value.max(0),
                    ControlWord::RowWidthType => row.width_type = clamp_width_type(value),
                    ControlWord::RowWidth => row.width = value,
                    _ => {},
                }
            },
        }
    }

    fn handle_list(&mut self, token: &ControlToken) {
        let value = token.value_or(0) as i64;
        let dest = self.top().dest;
        match token.word() {
            ControlWord::ListTable => self.top_mut().dest = Destination::ListTable,
            ControlWord::List => {
                if dest == Destination::ListTable {
                    self.lists.add_entry();
                    self.top_mut().dest = Destination::List;
                } else {
                    self.top_mut().dest = Destination::Ignored;
                }
            },
            ControlWord::ListId => match dest {
                Destination::List => {
                    if let Some(list) = self.lists.current_mut() {
                        list.id = value;
                    }
                },
                Destination::ListOverride => {
                    if let Some(entry) = self.overrides.current_mut() {
                        entry.list_id = value;
                    }
                },
                _ => {},
            },
            ControlWord::ListTemplateId => {
                if dest == Destination::List
                    && let Some(list) = self.lists.current_mut()
                {
                    list.template_id = value;
                }
            },
            ControlWord::ListSimple => {
                if dest == Destination::List
                    && let Some(list) = self.lists.current_mut()
                {
                    list.simple = token.toggle();
                }
            },
            ControlWord::ListLevel => match dest {
                Destination::List => {
                    self.lists.add_level();
                    self.top_mut().dest = Destination::ListLevel;
                },
                Destination::ListOverrideLevel => {},
                _ => self.top_mut().dest = Destination::Ignored,
            },
            ControlWord::LevelNfc | ControlWord::LevelNfcN => {
                let marker = MarkerStyle::from_nfc(value);
                match dest {
                    Destination::ListLevel => {
                        if let Some(level) = self.lists.current_level_mut() {
                            level.marker = marker;
                        }
                    },
                    Destination::ListOverrideLevel => {
                        if let Some(level) = self.overrides.current_level_mut() {
                            level.marker = Some(marker);
                        }
                    },
                    _ => {},
                }
            },
            ControlWord::LevelStartAt => match dest {
                Destination::ListLevel => {
                    if let Some(level) = self.lists.current_level_mut() {
                        level.start_index = value;
                    }
                },
                Destination::ListOverrideLevel => {
                    if let Some(level) = self.overrides.current_level_mut() {
                        level.start_index = Some(value);
                    }
                },
                _ => {},
            },
            ControlWord::LevelText => self.top_mut().dest = Destination::LevelText,
            ControlWord::LevelNumbers => self.top_mut().dest = Destination::LevelNumbers,
            ControlWord::ListOverrideTable => self.top_mut().dest = Destination::ListOverrideTable,
            ControlWord::ListOverride => {
                if dest == Destination::ListOverrideTable {
                    self.overrides.add_entry();
                    self.top_mut().dest = Destination::ListOverride;
                } else {
                    self.top_mut().dest = Destination::Ignored;
                }
            },
            ControlWord::ListOverrideLevel => {
                if dest == Destination::ListOverride {
                    self.overrides.add_level();
                    self.top_mut().dest = Destination::ListOverrideLevel;
                } else {
                    self.top_mut().dest = Destination::Ignored;
                }
            },
            ControlWord::ListOverrideStartAt => {
                if dest == Destination::ListOverrideLevel
                    && let Some(level) = self.overrides.current_level_mut()
                {
                    level.overrides_start = true;
                }
            },
            ControlWord::ListStyle => match dest {
                Destination::ListOverride => {
                    if let Some(entry) = self.overrides.current_mut() {
                        entry.index = value;
                    }
                },
                Destination::List | Destination::ListLevel => {},
                _ => self.top_mut().ils = value,
            },
            ControlWord::ListLevelIndex => self.top_mut().ilvl = value.max(0),
            ControlWord::ListText => self.begin_list_text(),
            _ => {},
        }
    }

    /// `\listtext` / `\pntext`: the marker text of the current paragraph.
    fn begin_list_text(&mut self) {
        if !self.top().dest.is_content() {
            self.top_mut().dest = Destination::Ignored;
            return;
        }
        let top = self.top_mut();
        top.dest = Destination::ListText;
        let format = top.clone();
        let id = self.nodes.push(DocumentNode::leaf(NodeType::ListText, format));
        self.list_text = Some(id);
    }

    fn handle_old_list(&mut self, token: &ControlToken) {
        let value = token.value_or(0) as i64;
        let marker = match token.word() {
            ControlWord::Pn => {
                let top = self.top_mut();
                top.dest = Destination::OldList;
                top.old_list = Default::default();
                return;
            },
            ControlWord::PnText => {
                self.begin_list_text();
                return;
            },
            ControlWord::PnTextAfter | ControlWord::PnTextBefore => {
                self.top_mut().dest = Destination::OldListText;
                return;
            },
            ControlWord::PnDecimal => MarkerStyle::Arabic,
            ControlWord::PnUpperLetter => MarkerStyle::UpperAlpha,
            ControlWord::PnLowerLetter => MarkerStyle::LowerAlpha,
            ControlWord::PnUpperRoman => MarkerStyle::UpperRoman,
            ControlWord::PnLowerRoman => MarkerStyle::LowerRoman,
            ControlWord::PnOrdinal | ControlWord::PnOrdinalText => MarkerStyle::Ordinal,
            ControlWord::PnCardinal => MarkerStyle::Cardinal,
            word => {
                let old_list = &mut self.top_mut().old_list;
                match word {
                    ControlWord::PnLevel => old_list.level = value.clamp(0, 9),
                    ControlWord::PnLevelBullet => {
                        old_list.level = 1;
                        old_list.marker = MarkerStyle::Bullet;
                    },
                    ControlWord::PnLevelBody => old_list.level = 1,
                    ControlWord::PnLevelContinue => old_list.is_continue = true,
                    ControlWord::PnStart => old_list.start = value,
                    _ => {},
                }
                return;
            },
        };
        self.top_mut().old_list.marker = marker;
    }

    fn handle_shape(&mut self, word: ControlWord) {
        let dest = self.top().dest;
        let next = match word {
            ControlWord::Shape if dest.is_content() || dest == Destination::ShapeGroup => {
                self.begin_shape();
                Destination::Shape
            },
            ControlWord::ShapeGroup if dest.is_content() || dest == Destination::ShapeInstruction => {
                Destination::ShapeGroup
            },
            ControlWord::ShapeInstruction if matches!(dest, Destination::Shape | Destination::ShapeGroup) => {
                Destination::ShapeInstruction
            },
            ControlWord::ShapeText if matches!(dest, Destination::Shape | Destination::ShapeInstruction) => {
                Destination::ShapeText
            },
            ControlWord::ShapeResult => Destination::ShapeResult,
            ControlWord::ShapePicture => Destination::ShapePicture,
            ControlWord::NonShapePicture => Destination::NonShapePicture,
            ControlWord::ShapeProperty | ControlWord::ShapePropertyName | ControlWord::ShapePropertyValue => {
                Destination::ShapeProperty
            },
            _ => Destination::Ignored,
        };
        self.top_mut().dest = next;
    }

    fn handle_field(&mut self, word: ControlWord) {
        let dest = self.top().dest;
        let (next, kind) = match word {
            ControlWord::Field if dest.is_content() || dest == Destination::FieldInstruction => {
                (Destination::Field, FieldKind::Field)
            },
            ControlWord::FieldInstruction if dest == Destination::Field => {
                (Destination::FieldInstruction, FieldKind::Instruction)
            },
            ControlWord::FieldResult if dest == Destination::Field => (Destination::FieldResult, FieldKind::Result),
            _ => {
                self.top_mut().dest = Destination::Ignored;
                return;
            },
        };
        if kind == FieldKind::Field {
            self.open_fields += 1;
        }
        let top = self.top_mut();
        top.dest = next;
        let format = top.clone();
        self.nodes
            .push(DocumentNode::field_marker(NodeType::FieldBegin, kind, format));
    }

    fn handle_picture(&mut self, token: &ControlToken) {
        let value = token.value_or(0) as i64;
        let dest = self.top().dest;
        match token.word() {
            ControlWord::Picture => {
                if dest.allows_pictures() {
                    self.top_mut().dest = Destination::Picture;
                    self.picture = Some(PictureState::default());
                } else {
                    self.top_mut().dest = Destination::Ignored;
                }
                return;
            },
            ControlWord::Object => {
                self.top_mut().dest = if dest.is_content() {
                    Destination::Object
                } else {
                    Destination::Ignored
                };
                return;
            },
            ControlWord::ObjectResult => {
                self.top_mut().dest = if dest == Destination::Object {
                    Destination::ObjectResult
                } else {
                    Destination::Ignored
                };
                return;
            },
            _ => {},
        }

        let Some(picture) = self.picture.as_mut() else {
            return;
        };
        match token.word() {
            ControlWord::PngBlip => picture.format = ImageFormat::Png,
            ControlWord::JpegBlip => picture.format = ImageFormat::Jpeg,
            ControlWord::EmfBlip => picture.format = ImageFormat::Emf,
            ControlWord::WindowsMetafile => picture.format = ImageFormat::Wmf,
            ControlWord::PictureWidth => picture.width = value,
            ControlWord::PictureHeight => picture.height = value,
            ControlWord::PictureGoalWidth => picture.goal_width = value,
            ControlWord::PictureGoalHeight => picture.goal_height = value,
            ControlWord::PictureScaleX => picture.scale_x = value,
            ControlWord::PictureScaleY => picture.scale_y = value,
            _ => {},
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rtf::Lexer;
    use crate::xaml::options::ConvertOptions;

    fn feed(state: &mut ConverterState<'_>, rtf: &[u8]) {
        let mut lexer = Lexer::new(rtf);
        loop {
            let token = lexer.next_token(state.lex_hint());
            if !state.dispatch(token, &mut lexer).unwrap() {
                break;
            }
        }
    }

    fn state() -> ConverterState<'static> {
        ConverterState::new(ConvertOptions::default(), None, None)
    }

    #[test]
    fn test_font_and_color_tables() {
        let mut state = state();
        feed(
            &mut state,
            br"{\rtf1\deff0{\fonttbl{\f0\fswiss Arial;}{\f1\fcharset204 Times;}}{\colortbl;\red255\green0\blue0;}",
        );
        assert_eq!(state.fonts.get(0).map(|f| f.name.as_str()), Some("Arial"));
        assert_eq!(state.fonts.get(1).and_then(|f| f.code_page), Some(1251));
        assert_eq!(state.colors.len(), 2);
        assert_eq!(state.top().font, 0);
    }

    #[test]
    fn test_character_toggles_follow_groups() {
        let mut state = state();
        feed(&mut state, br"{\rtf1\b\fs30{\i0\ul");
        assert!(state.top().bold);
        assert_eq!(state.top().font_size, 30);
        assert_eq!(state.top().underline, Underline::Single);
        feed(&mut state, b"}");
        assert_eq!(state.top().underline, Underline::None);
    }

    #[test]
    fn test_up_down_defaults() {
        let mut state = state();
        feed(&mut state, br"{\rtf1\up");
        assert_eq!(state.top().baseline_offset, 6);
        feed(&mut state, br"\dn4");
        assert_eq!(state.top().baseline_offset, -4);
    }

    #[test]
    fn test_row_definition() {
        let mut state = state();
        feed(
            &mut state,
            br"{\rtf1\trowd\trgaph108\clbrdrt\brdrs\brdrw20\clvmgf\cellx1440\cellx2880",
        );
        let row = state.top().row_snapshot();
        assert_eq!(row.gap, 108);
        assert_eq!(row.cells.len(), 2);
        assert_eq!(row.cells[0].top.kind, BorderKind::Single);
        assert_eq!(row.cells[0].top.width, 20);
        assert_eq!(row.cells[0].v_merge, MergeKind::First);
        assert_eq!(row.cells[1].v_merge, MergeKind::None);
    }

    #[test]
    fn test_list_tables() {
        let mut state = state();
        feed(
            &mut state,
            br"{\rtf1{\*\listtable{\list\listtemplateid5{\listlevel\levelnfc23\levelstartat1}{\listlevel\levelnfc1\levelstartat3}\listid77}}{\*\listoverridetable{\listoverride\listid77\listoverridecount0\ls1}}",
        );
        let list = state.lists.find(77).unwrap();
        assert_eq!(list.template_id, 5);
        assert_eq!(list.level(1).unwrap().marker, MarkerStyle::Bullet);
        assert_eq!(list.level(2).unwrap().marker, MarkerStyle::UpperRoman);
        assert_eq!(list.level(2).unwrap().start_index, 3);
        assert_eq!(state.overrides.find(1).unwrap().list_id, 77);
    }

    #[test]
    fn test_old_list_copied_to_paragraph() {
        let mut state = state();
        feed(&mut state, br"{\rtf1{\*\pn\pnlvlbody\pnucrm\pnstart4}");
        let old_list = state.top().old_list;
        assert_eq!(old_list.level, 1);
        assert_eq!(old_list.marker, MarkerStyle::UpperRoman);
        assert_eq!(old_list.start, 4);
    }

    #[test]
    fn test_unknown_starred_destination_is_skipped() {
        let mut state = state();
        feed(&mut state, br"{\rtf1{\*\nosuchthing hidden text}visible");
        assert_eq!(state.nodes.len(), 1);
        assert_eq!(state.nodes.at(0).content, "visible");
    }

    #[test]
    fn test_unicode_with_fallback_and_surrogates() {
        let mut state = state();
        feed(&mut state, br"{\rtf1\uc1\u8364?\u-10179?\u-8704?");
        assert_eq!(state.nodes.at(0).content, "\u{20AC}\u{1F600}");
    }

    #[test]
    fn test_group_depth_limit() {
        let mut state = ConverterState::new(ConvertOptions::default().with_max_group_depth(2), None, None);
        let mut lexer = Lexer::new(b"{{{");
        assert!(state.dispatch(Token::GroupStart, &mut lexer).is_ok());
        assert!(state.dispatch(Token::GroupStart, &mut lexer).is_ok());
        assert!(state.dispatch(Token::GroupStart, &mut lexer).is_err());
    }
}
