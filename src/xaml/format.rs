//! Inherited formatting state.
//!
//! A [`FormatState`] is pushed (cloned) on every `{` and popped on every `}`.
//! Paragraph borders and old-style numbering are plain values and are copied
//! with the state. The row format is held through a shared handle: nested
//! groups see and mutate the same [`RowFormat`] as their parent until a
//! `\trowd` installs a fresh one.

use super::convert::MarkerStyle;
use crate::common::encoding::DEFAULT_CODE_PAGE;
use std::cell::RefCell;
use std::rc::Rc;

/// Which logical sub-document subsequent tokens belong to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Destination {
    #[default]
    Normal,
    FontTable,
    ColorTable,
    ListTable,
    List,
    ListLevel,
    LevelText,
    LevelNumbers,
    ListOverrideTable,
    ListOverride,
    ListOverrideLevel,
    /// `\listtext` or `\pntext`: the rendered marker of the paragraph
    ListText,
    /// `\*\pn`: old-style numbering settings
    OldList,
    /// `\pntxta` / `\pntxtb`
    OldListText,
    Field,
    FieldInstruction,
    FieldResult,
    Picture,
    Shape,
    ShapeGroup,
    ShapeInstruction,
    ShapeText,
    ShapeResult,
    ShapePicture,
    NonShapePicture,
    ShapeProperty,
    Object,
    ObjectResult,
    /// `\nesttableprops`: row definitions, no text
    NestTableProps,
    /// A known destination whose content is dropped
    Ignored,
    /// An optional destination this converter does not understand
    Unknown,
}

impl Destination {
    /// Text in this destination becomes document content.
    pub fn is_content(self) -> bool {
        matches!(
            self,
            Destination::Normal
                | Destination::FieldResult
                | Destination::ShapeText
                | Destination::ObjectResult
        )
    }

    /// Pictures found here are converted.
    pub fn allows_pictures(self) -> bool {
        self.is_content() || self == Destination::ShapePicture
    }

    /// Nothing nested here is ever converted.
    pub fn is_suppressed(self) -> bool {
        matches!(
            self,
            Destination::Ignored
                | Destination::Unknown
                | Destination::ShapeResult
                | Destination::NonShapePicture
        )
    }
}

/// Text direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    #[default]
    LeftToRight,
    RightToLeft,
}

impl Direction {
    pub fn xaml_name(self) -> &'static str {
        match self {
            Direction::LeftToRight => "LeftToRight",
            Direction::RightToLeft => "RightToLeft",
        }
    }
}

/// Paragraph alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Alignment {
    #[default]
    Left,
    Right,
    Center,
    Justify,
}

impl Alignment {
    pub fn xaml_name(self) -> &'static str {
        match self {
            Alignment::Left => "Left",
            Alignment::Right => "Right",
            Alignment::Center => "Center",
            Alignment::Justify => "Justify",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Underline {
    #[default]
    None,
    Single,
    Double,
    Dotted,
    Dash,
    Words,
    Wave,
    Thick,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Strike {
    #[default]
    None,
    Single,
    Double,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SuperSub {
    #[default]
    None,
    Super,
    Sub,
}

/// Line style of a border.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BorderKind {
    #[default]
    None,
    Single,
    Thick,
    Double,
    Dotted,
    Dashed,
    Hairline,
}

/// One border edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BorderFormat {
    pub kind: BorderKind,
    /// `\brdrw`, twips
    pub width: i64,
    /// `\brdrcf` color index, -1 when unset
    pub color: i64,
    /// `\brsp`, twips
    pub space: i64,
}

impl Default for BorderFormat {
    fn default() -> Self {
        Self {
            kind: BorderKind::None,
            width: 0,
            color: -1,
            space: 0,
        }
    }
}

impl BorderFormat {
    /// Drawn width in twips.
    pub fn effective_width(&self) -> i64 {
        let width = self.width.max(1);
        match self.kind {
            BorderKind::None => 0,
            BorderKind::Thick => width * 2,
            BorderKind::Double => width * 3,
            BorderKind::Hairline => 1,
            _ => width,
        }
    }

    #[inline]
    pub fn is_visible(&self) -> bool {
        self.kind != BorderKind::None
    }
}

/// Paragraph border set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParaBorder {
    pub top: BorderFormat,
    pub left: BorderFormat,
    pub bottom: BorderFormat,
    pub right: BorderFormat,
}

impl ParaBorder {
    pub fn is_empty(&self) -> bool {
        !(self.top.is_visible()
            || self.left.is_visible()
            || self.bottom.is_visible()
            || self.right.is_visible())
    }

    /// First explicitly colored edge.
    pub fn color(&self) -> i64 {
        [self.left, self.top, self.right, self.bottom]
            .iter()
            .map(|b| b.color)
            .find(|&c| c >= 0)
            .unwrap_or(-1)
    }

    /// Largest edge spacing, used as padding.
    pub fn space(&self) -> i64 {
        [self.left, self.top, self.right, self.bottom]
            .iter()
            .map(|b| b.space)
            .max()
            .unwrap_or(0)
    }
}

/// Border edge that border keywords currently apply to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BorderTarget {
    #[default]
    None,
    ParaTop,
    ParaLeft,
    ParaBottom,
    ParaRight,
    ParaBox,
    RowTop,
    RowLeft,
    RowBottom,
    RowRight,
    RowHorizontal,
    RowVertical,
    CellTop,
    CellLeft,
    CellBottom,
    CellRight,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MergeKind {
    #[default]
    None,
    /// First cell of a merged range
    First,
    /// Continuation of the range
    Continue,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VerticalAlignment {
    #[default]
    Top,
    Center,
    Bottom,
}

/// Formatting of one table cell, defined before the row content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellFormat {
    /// Right boundary in twips from the row origin, -1 when unset
    pub cellx: i64,
    pub top: BorderFormat,
    pub left: BorderFormat,
    pub bottom: BorderFormat,
    pub right: BorderFormat,
    pub cb: i64,
    pub cf: i64,
    pub shading: i64,
    /// Padding in twips, -1 when unset
    pub padding_left: i64,
    pub padding_top: i64,
    pub padding_right: i64,
    pub padding_bottom: i64,
    pub h_merge: MergeKind,
    pub v_merge: MergeKind,
    pub v_align: VerticalAlignment,
    pub width_type: i64,
    pub width: i64,
}

impl Default for CellFormat {
    fn default() -> Self {
        Self {
            cellx: -1,
            top: BorderFormat::default(),
            left: BorderFormat::default(),
            bottom: BorderFormat::default(),
            right: BorderFormat::default(),
            cb: -1,
            cf: -1,
            shading: -1,
            padding_left: -1,
            padding_top: -1,
            padding_right: -1,
            padding_bottom: -1,
            h_merge: MergeKind::None,
            v_merge: MergeKind::None,
            v_align: VerticalAlignment::Top,
            width_type: 0,
            width: 0,
        }
    }
}

impl CellFormat {
    pub fn has_borders(&self) -> bool {
        self.top.is_visible() || self.left.is_visible() || self.bottom.is_visible() || self.right.is_visible()
    }

    pub fn has_shading(&self) -> bool {
        self.cb >= 0 || self.shading >= 0
    }

    /// Fill unset padding from the row defaults.
    pub fn inherit_padding(&mut self, row: &CellFormat) {
        for (mine, theirs) in [
            (&mut self.padding_left, row.padding_left),
            (&mut self.padding_top, row.padding_top),
            (&mut self.padding_right, row.padding_right),
            (&mut self.padding_bottom, row.padding_bottom),
        ] {
            if *mine < 0 {
                *mine = theirs;
            }
        }
    }
}

/// Row definition: the `\trowd` group of keywords.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowFormat {
    /// Row-level defaults (padding, `\trbrdr*` borders)
    pub row_cell: CellFormat,
    /// One entry per `\cellx`
    pub cells: Vec<CellFormat>,
    /// Cell being defined; pushed on `\cellx`
    pub pending_cell: CellFormat,
    /// Inside horizontal and vertical borders
    pub inner_horizontal: BorderFormat,
    pub inner_vertical: BorderFormat,
    /// `\trleft`
    pub left: i64,
    /// `\trgaph`
    pub gap: i64,
    pub direction: Direction,
    pub width_type: i64,
    pub width: i64,
}

impl RowFormat {
    /// Close the pending cell at boundary `cellx`.
    pub fn push_cell(&mut self, cellx: i64) {
        let mut cell = std::mem::take(&mut self.pending_cell);
        cell.cellx = cellx;
        self.cells.push(cell);
    }

    /// Format of the `index`-th cell, falling back to the row defaults.
    pub fn nth_cell(&self, index: usize) -> CellFormat {
        self.cells.get(index).copied().unwrap_or(self.row_cell)
    }

    /// Cell boundaries relative to the page, sorted as written.
    pub fn boundaries(&self) -> impl Iterator<Item = i64> + '_ {
        self.cells.iter().map(move |c| c.cellx + self.left)
    }
}

/// Shared row format handle.
pub type SharedRowFormat = Rc<RefCell<RowFormat>>;

/// Old-style (`\pn`) paragraph numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OldListFormat {
    /// 0 when the paragraph is not numbered; 1..9 otherwise
    pub level: i64,
    pub marker: MarkerStyle,
    pub start: i64,
    /// `\pnlvlcont`: continue the previous item
    pub is_continue: bool,
}

impl Default for OldListFormat {
    fn default() -> Self {
        Self {
            level: 0,
            marker: MarkerStyle::None,
            start: 1,
            is_continue: false,
        }
    }
}

/// All inherited character and paragraph formatting.
#[derive(Debug, Clone)]
pub struct FormatState {
    pub dest: Destination,

    // Character formatting
    pub bold: bool,
    pub italic: bool,
    pub underline: Underline,
    pub strike: Strike,
    pub super_sub: SuperSub,
    /// `\up` / `\dn` offset in half points. Not written to markup; a
    /// change only starts a new run.
    pub baseline_offset: i64,
    pub caps: bool,
    /// Not written to markup; a change only starts a new run.
    pub small_caps: bool,
    pub hidden: bool,
    pub font: i64,
    pub font_size: i64,
    pub cf: i64,
    pub cb: i64,
    pub lang: i64,
    pub char_direction: Direction,
    /// `\expndtw`, twips. Not written to markup; a change only starts a
    /// new run.
    pub expand: i64,

    // Paragraph formatting
    pub li: i64,
    pub ri: i64,
    pub fi: i64,
    pub sb: i64,
    pub sa: i64,
    pub sl: i64,
    pub sl_mult: bool,
    pub align: Alignment,
    pub para_direction: Direction,
    pub para_cb: i64,
    pub para_cf: i64,
    pub para_shading: i64,
    pub para_border: ParaBorder,
    pub border_target: BorderTarget,

    // Tables
    pub in_table: bool,
    /// `\itap`; with `in_table` gives the table depth
    pub itap: i64,
    pub row_format: SharedRowFormat,

    // Lists
    /// `\ls`, -1 when unset
    pub ils: i64,
    /// `\ilvl`
    pub ilvl: i64,
    pub old_list: OldListFormat,
    /// A `\listtext`/`\pntext` marker was seen for this paragraph
    pub listtext_seen: bool,

    // Decoding
    pub code_page: u32,
    /// `\uc`
    pub unicode_skip: usize,
}

impl Default for FormatState {
    fn default() -> Self {
        Self {
            dest: Destination::Normal,
            bold: false,
            italic: false,
            underline: Underline::None,
            strike: Strike::None,
            super_sub: SuperSub::None,
            baseline_offset: 0,
            caps: false,
            small_caps: false,
            hidden: false,
            font: -1,
            font_size: 24,
            cf: -1,
            cb: -1,
            lang: -1,
            char_direction: Direction::LeftToRight,
            expand: 0,
            li: 0,
            ri: 0,
            fi: 0,
            sb: 0,
            sa: 0,
            sl: 0,
            sl_mult: false,
            align: Alignment::Left,
            para_direction: Direction::LeftToRight,
            para_cb: -1,
            para_cf: -1,
            para_shading: -1,
            para_border: ParaBorder::default(),
            border_target: BorderTarget::None,
            in_table: false,
            itap: 0,
            row_format: SharedRowFormat::default(),
            ils: -1,
            ilvl: 0,
            old_list: OldListFormat::default(),
            listtext_seen: false,
            code_page: DEFAULT_CODE_PAGE,
            unicode_skip: 1,
        }
    }
}

impl FormatState {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// `\plain`: character formatting back to defaults.
    pub fn reset_character(&mut self, default_font: i64, default_lang: i64) {
        self.bold = false;
        self.italic = false;
        self.underline = Underline::None;
        self.strike = Strike::None;
        self.super_sub = SuperSub::None;
        self.baseline_offset = 0;
        self.caps = false;
        self.small_caps = false;
        self.hidden = false;
        self.font = default_font;
        self.font_size = 24;
        self.cf = -1;
        self.cb = -1;
        self.lang = default_lang;
        self.char_direction = Direction::LeftToRight;
        self.expand = 0;
    }

    /// `\pard`: paragraph formatting back to defaults, including table
    /// membership and numbering.
    pub fn reset_paragraph(&mut self) {
        self.li = 0;
        self.ri = 0;
        self.fi = 0;
        self.sb = 0;
        self.sa = 0;
        self.sl = 0;
        self.sl_mult = false;
        self.align = Alignment::Left;
        self.para_direction = Direction::LeftToRight;
        self.para_cb = -1;
        self.para_cf = -1;
        self.para_shading = -1;
        self.para_border = ParaBorder::default();
        self.border_target = BorderTarget::None;
        self.in_table = false;
        self.itap = 0;
        self.ils = -1;
        self.ilvl = 0;
        self.old_list = OldListFormat::default();
    }

    /// Whether text written under `other` renders identically to text
    /// written under `self`.
    pub fn same_character_format(&self, other: &FormatState) -> bool {
        self.bold == other.bold
            && self.italic == other.italic
            && self.underline == other.underline
            && self.strike == other.strike
            && self.super_sub == other.super_sub
            && self.baseline_offset == other.baseline_offset
            && self.caps == other.caps
            && self.small_caps == other.small_caps
            && self.hidden == other.hidden
            && self.font == other.font
            && self.font_size == other.font_size
            && self.cf == other.cf
            && self.cb == other.cb
            && self.lang == other.lang
            && self.char_direction == other.char_direction
            && self.expand == other.expand
    }

    /// Table nesting depth of the current paragraph.
    pub fn table_level(&self) -> usize {
        if self.itap > 0 {
            self.itap as usize
        } else if self.in_table {
            1
        } else {
            0
        }
    }

    /// Install a fresh row definition (`\trowd`).
    pub fn reset_row(&mut self) {
        self.row_format = SharedRowFormat::default();
    }

    /// Snapshot of the current row definition.
    pub fn row_snapshot(&self) -> RowFormat {
        self.row_format.borrow().clone()
    }

    /// Border edge addressed by the current border target.
    pub fn target_border(&mut self) -> Option<BorderEdit<'_>> {
        match self.border_target {
            BorderTarget::None => None,
            BorderTarget::ParaTop => Some(BorderEdit::One(&mut self.para_border.top)),
            BorderTarget::ParaLeft => Some(BorderEdit::One(&mut self.para_border.left)),
            BorderTarget::ParaBottom => Some(BorderEdit::One(&mut self.para_border.bottom)),
            BorderTarget::ParaRight => Some(BorderEdit::One(&mut self.para_border.right)),
            BorderTarget::ParaBox => Some(BorderEdit::Box(&mut self.para_border)),
            _ => Some(BorderEdit::Row(self.border_target, Rc::clone(&self.row_format))),
        }
    }

    /// Virtual list level: 1-based effective nesting depth, 0 when the
    /// paragraph is not a list paragraph.
    pub fn virtual_list_level(&self) -> i64 {
        if self.ils > 0 {
            self.ilvl.clamp(0, 8) + 1
        } else if self.old_list.level > 0 {
            self.old_list.level
        } else if self.listtext_seen {
            1
        } else {
            0
        }
    }
}

/// A mutable view on the border the current keywords address.
pub enum BorderEdit<'a> {
    One(&'a mut BorderFormat),
    Box(&'a mut ParaBorder),
    Row(BorderTarget, SharedRowFormat),
}

impl BorderEdit<'_> {
    /// Apply `edit` to every edge addressed.
    pub fn apply(self, edit: impl Fn(&mut BorderFormat)) {
        match self {
            BorderEdit::One(border) => edit(border),
            BorderEdit::Box(set) => {
                edit(&mut set.top);
                edit(&mut set.left);
                edit(&mut set.bottom);
                edit(&mut set.right);
            },
            BorderEdit::Row(target, shared) => {
                let mut guard = shared.borrow_mut();
                let row = &mut *guard;
                let border = match target {
                    BorderTarget::RowTop => &mut row.row_cell.top,
                    BorderTarget::RowLeft => &mut row.row_cell.left,
                    BorderTarget::RowBottom => &mut row.row_cell.bottom,
                    BorderTarget::RowRight => &mut row.row_cell.right,
                    BorderTarget::RowHorizontal => &mut row.inner_horizontal,
                    BorderTarget::RowVertical => &mut row.inner_vertical,
                    BorderTarget::CellTop => &mut row.pending_cell.top,
                    BorderTarget::CellLeft => &mut row.pending_cell.left,
                    BorderTarget::CellBottom => &mut row.pending_cell.bottom,
                    BorderTarget::CellRight => &mut row.pending_cell.right,
                    _ => return,
                };
                edit(border);
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unwritten_character_properties_still_split_runs() {
        let plain = FormatState::new();

        let mut raised = plain.clone();
        raised.baseline_offset = 6;
        assert!(!plain.same_character_format(&raised));

        let mut small = plain.clone();
        small.small_caps = true;
        assert!(!plain.same_character_format(&small));

        let mut spaced = plain.clone();
        spaced.expand = 20;
        assert!(!plain.same_character_format(&spaced));

        assert!(plain.same_character_format(&plain.clone()));
    }

    #[test]
    fn test_row_format_is_shared_between_copies() {
        let outer = FormatState::new();
        let inner = outer.clone();
        inner.row_format.borrow_mut().push_cell(1440);
        assert_eq!(outer.row_format.borrow().cells.len(), 1);

        let mut fresh = outer.clone();
        fresh.reset_row();
        assert_eq!(fresh.row_format.borrow().cells.len(), 0);
        assert_eq!(outer.row_format.borrow().cells.len(), 1);
    }

    #[test]
    fn test_para_border_is_copied() {
        let mut outer = FormatState::new();
        let mut inner = outer.clone();
        inner.border_target = BorderTarget::ParaBox;
        if let Some(edit) = inner.target_border() {
            edit.apply(|b| b.kind = BorderKind::Single);
        }
        assert!(!inner.para_border.is_empty());
        assert!(outer.para_border.is_empty());
        outer.border_target = BorderTarget::CellTop;
        if let Some(edit) = outer.target_border() {
            edit.apply(|b| b.width = 30);
        }
        assert_eq!(outer.row_format.borrow().pending_cell.top.width, 30);
    }

    #[test]
    fn test_nth_cell_falls_back_to_row_defaults() {
        let mut row = RowFormat::default();
        row.row_cell.padding_left = 108;
        row.push_cell(2000);
        assert_eq!(row.nth_cell(0).cellx, 2000);
        assert_eq!(row.nth_cell(5).padding_left, 108);
    }

    #[test]
    fn test_virtual_list_level() {
        let mut state = FormatState::new();
        assert_eq!(state.virtual_list_level(), 0);
        state.listtext_seen = true;
        assert_eq!(state.virtual_list_level(), 1);
        state.old_list.level = 3;
        assert_eq!(state.virtual_list_level(), 3);
        state.ils = 2;
        state.ilvl = 1;
        assert_eq!(state.virtual_list_level(), 2);
    }

    #[test]
    fn test_pard_resets_table_membership() {
        let mut state = FormatState::new();
        state.in_table = true;
        state.itap = 2;
        assert_eq!(state.table_level(), 2);
        state.reset_paragraph();
        assert_eq!(state.table_level(), 0);
    }
}
