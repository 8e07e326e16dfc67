//! Static control-word metadata.
//!
//! Every control word the converter understands is listed once in
//! [`CONTROL_WORDS`], a compile-time perfect hash map from the keyword text to
//! its [`ControlWordInfo`]. The info names the typed [`ControlWord`], the
//! handler group that owns it and how its parameter is interpreted.

use bitflags::bitflags;
use phf::phf_map;

bitflags! {
    /// How a control word behaves.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ControlFlags: u8 {
        /// Opens a destination for the rest of the enclosing group.
        const DESTINATION = 0x01;
        /// On/off property; a parameter of 0 turns it off.
        const TOGGLE = 0x02;
        /// Takes a numeric parameter.
        const VALUE = 0x04;
        /// Bare flag, the parameter is ignored.
        const FLAG = 0x08;
        /// Produces a character rather than changing state.
        const SYMBOL = 0x10;
    }
}

/// Handler group a control word is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlGroup {
    /// Document-wide settings (`\rtf`, `\ansicpg`, `\deff`)
    Document,
    /// Character formatting
    Character,
    /// Paragraph formatting and breaks
    Paragraph,
    /// Border definition keywords shared by paragraphs, rows and cells
    Border,
    /// Characters produced by keywords (`\emdash`, `\tab`)
    Special,
    /// Unicode and binary escapes
    Unicode,
    /// Font table entries
    FontTable,
    /// Color table entries
    ColorTable,
    /// Table rows and cells
    Table,
    /// Word 97+ list tables
    List,
    /// Word 6/95 paragraph numbering
    OldList,
    /// Drawing shapes
    Shape,
    /// Fields
    Field,
    /// Embedded pictures
    Picture,
    /// Destinations whose content is never converted
    Ignored,
}

/// Typed identity of a recognized control word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlWord {
    // Document
    Rtf,
    Ansi,
    Mac,
    Pc,
    Pca,
    AnsiCodePage,
    DefaultFont,
    DefaultLanguage,

    // Character formatting
    Plain,
    Bold,
    Italic,
    Underline,
    UnderlineNone,
    UnderlineDouble,
    UnderlineDotted,
    UnderlineDash,
    UnderlineWords,
    UnderlineWave,
    UnderlineThick,
    Strike,
    StrikeDouble,
    Super,
    Sub,
    NoSuperSub,
    Up,
    Down,
    SmallCaps,
    Caps,
    Hidden,
    Font,
    FontSize,
    ForeColor,
    BackColor,
    CharShading,
    Highlight,
    Language,
    RtlChar,
    LtrChar,
    Expand,
    ExpandTwips,
    Outline,
    Shadow,
    Emboss,
    Engrave,

    // Paragraph formatting
    Par,
    Pard,
    Sect,
    Page,
    Column,
    Line,
    LeftIndent,
    RightIndent,
    FirstIndent,
    LeftIndentLogical,
    RightIndentLogical,
    SpaceBefore,
    SpaceAfter,
    SpaceLine,
    SpaceLineMultiple,
    AlignLeft,
    AlignRight,
    AlignCenter,
    AlignJustify,
    AlignDistribute,
    RtlPar,
    LtrPar,
    ParaBackPattern,
    ParaForePattern,
    ParaShading,

    // Borders
    BorderTop,
    BorderBottom,
    BorderLeft,
    BorderRight,
    BorderBox,
    BorderSingle,
    BorderThick,
    BorderDouble,
    BorderDotted,
    BorderDashed,
    BorderHairline,
    BorderShadow,
    BorderNone,
    BorderWidth,
    BorderSpace,
    BorderColor,

    // Special characters
    Tab,
    EmDash,
    EnDash,
    Bullet,
    LeftQuote,
    RightQuote,
    LeftDoubleQuote,
    RightDoubleQuote,
    EmSpace,
    EnSpace,
    QmSpace,
    ZeroWidthJoiner,
    ZeroWidthNonJoiner,
    LtrMark,
    RtlMark,

    // Unicode and binary
    Unicode,
    UnicodeSkip,
    Binary,

    // Font table
    FontTable,
    FontFamily,
    FontCharset,
    FontCodePage,
    FontPitch,

    // Color table
    ColorTable,
    Red,
    Green,
    Blue,

    // Tables
    InTable,
    Itap,
    RowDefaults,
    RowGap,
    RowLeft,
    RowAlignLeft,
    RowAlignRight,
    RowAlignCenter,
    RowHeight,
    RtlRow,
    LtrRow,
    RowPaddingLeft,
    RowPaddingTop,
    RowPaddingRight,
    RowPaddingBottom,
    RowBorderTop,
    RowBorderLeft,
    RowBorderBottom,
    RowBorderRight,
    RowBorderHorizontal,
    RowBorderVertical,
    RowWidthType,
    RowWidth,
    CellX,
    CellBorderTop,
    CellBorderLeft,
    CellBorderBottom,
    CellBorderRight,
    CellBackPattern,
    CellForePattern,
    CellShading,
    CellVMergeFirst,
    CellVMerge,
    CellHMergeFirst,
    CellHMerge,
    CellVAlignTop,
    CellVAlignCenter,
    CellVAlignBottom,
    CellPaddingLeft,
    CellPaddingTop,
    CellPaddingRight,
    CellPaddingBottom,
    CellWidthType,
    CellWidth,
    Cell,
    NestCell,
    Row,
    NestRow,
    NestTableProps,
    NoNestTables,

    // Lists
    ListTable,
    List,
    ListId,
    ListTemplateId,
    ListSimple,
    ListHybrid,
    ListLevel,
    LevelNfc,
    LevelNfcN,
    LevelStartAt,
    LevelText,
    LevelNumbers,
    ListOverrideTable,
    ListOverride,
    ListOverrideCount,
    ListOverrideLevel,
    ListOverrideStartAt,
    ListStyle,
    ListLevelIndex,
    ListText,

    // Legacy paragraph numbering
    Pn,
    PnText,
    PnLevel,
    PnLevelBullet,
    PnLevelBody,
    PnLevelContinue,
    PnStart,
    PnDecimal,
    PnUpperLetter,
    PnLowerLetter,
    PnUpperRoman,
    PnLowerRoman,
    PnOrdinal,
    PnOrdinalText,
    PnCardinal,
    PnTextAfter,
    PnTextBefore,

    // Shapes
    Shape,
    ShapeGroup,
    ShapeInstruction,
    ShapeText,
    ShapeResult,
    ShapePicture,
    NonShapePicture,
    DrawingObject,
    ShapeProperty,
    ShapePropertyName,
    ShapePropertyValue,

    // Fields
    Field,
    FieldInstruction,
    FieldResult,

    // Pictures
    Picture,
    PngBlip,
    JpegBlip,
    EmfBlip,
    WindowsMetafile,
    PictureWidth,
    PictureHeight,
    PictureGoalWidth,
    PictureGoalHeight,
    PictureScaleX,
    PictureScaleY,

    // Embedded objects
    Object,
    ObjectResult,

    // Destinations whose text is dropped
    SkippedDestination,

    /// Not in the table
    Unknown,
}

/// Metadata for one control word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlWordInfo {
    /// Typed identity
    pub control: ControlWord,
    /// Handler group
    pub group: ControlGroup,
    /// Parameter interpretation
    pub flags: ControlFlags,
}

impl ControlWordInfo {
    const fn new(control: ControlWord, group: ControlGroup, flags: ControlFlags) -> Self {
        Self {
            control,
            group,
            flags,
        }
    }

    /// Whether this keyword opens a destination.
    #[inline]
    pub fn is_destination(&self) -> bool {
        self.flags.contains(ControlFlags::DESTINATION)
    }
}

/// Info returned for keywords not in [`CONTROL_WORDS`].
pub const UNKNOWN_CONTROL: ControlWordInfo =
    ControlWordInfo::new(ControlWord::Unknown, ControlGroup::Ignored, ControlFlags::empty());

use ControlGroup as G;
use ControlWord as W;

const DEST: ControlFlags = ControlFlags::DESTINATION;
const TOGGLE: ControlFlags = ControlFlags::TOGGLE;
const VALUE: ControlFlags = ControlFlags::VALUE;
const FLAG: ControlFlags = ControlFlags::FLAG;
const SYMBOL: ControlFlags = ControlFlags::SYMBOL;

const fn cw(control: ControlWord, group: ControlGroup, flags: ControlFlags) -> ControlWordInfo {
    ControlWordInfo::new(control, group, flags)
}

/// Keyword table.
pub static CONTROL_WORDS: phf::Map<&'static str, ControlWordInfo> = phf_map! {
    "rtf" => cw(W::Rtf, G::Document, VALUE),
    "ansi" => cw(W::Ansi, G::Document, FLAG),
    "mac" => cw(W::Mac, G::Document, FLAG),
    "pc" => cw(W::Pc, G::Document, FLAG),
    "pca" => cw(W::Pca, G::Document, FLAG),
    "ansicpg" => cw(W::AnsiCodePage, G::Document, VALUE),
    "deff" => cw(W::DefaultFont, G::Document, VALUE),
    "deflang" => cw(W::DefaultLanguage, G::Document, VALUE),

    "plain" => cw(W::Plain, G::Character, FLAG),
    "b" => cw(W::Bold, G::Character, TOGGLE),
    "i" => cw(W::Italic, G::Character, TOGGLE),
    "ul" => cw(W::Underline, G::Character, TOGGLE),
    "ulnone" => cw(W::UnderlineNone, G::Character, FLAG),
    "uldb" => cw(W::UnderlineDouble, G::Character, TOGGLE),
    "uld" => cw(W::UnderlineDotted, G::Character, TOGGLE),
    "uldash" => cw(W::UnderlineDash, G::Character, TOGGLE),
    "ulw" => cw(W::UnderlineWords, G::Character, TOGGLE),
    "ulwave" => cw(W::UnderlineWave, G::Character, TOGGLE),
    "ulth" => cw(W::UnderlineThick, G::Character, TOGGLE),
    "strike" => cw(W::Strike, G::Character, TOGGLE),
    "striked" => cw(W::StrikeDouble, G::Character, TOGGLE),
    "super" => cw(W::Super, G::Character, TOGGLE),
    "sub" => cw(W::Sub, G::Character, TOGGLE),
    "nosupersub" => cw(W::NoSuperSub, G::Character, FLAG),
    "up" => cw(W::Up, G::Character, VALUE),
    "dn" => cw(W::Down, G::Character, VALUE),
    "scaps" => cw(W::SmallCaps, G::Character, TOGGLE),
    "caps" => cw(W::Caps, G::Character, TOGGLE),
    "v" => cw(W::Hidden, G::Character, TOGGLE),
    "f" => cw(W::Font, G::Character, VALUE),
    "fs" => cw(W::FontSize, G::Character, VALUE),
    "cf" => cw(W::ForeColor, G::Character, VALUE),
    "cb" => cw(W::BackColor, G::Character, VALUE),
    "chcbpat" => cw(W::CharShading, G::Character, VALUE),
    "highlight" => cw(W::Highlight, G::Character, VALUE),
    "lang" => cw(W::Language, G::Character, VALUE),
    "rtlch" => cw(W::RtlChar, G::Character, FLAG),
    "ltrch" => cw(W::LtrChar, G::Character, FLAG),
    "expnd" => cw(W::Expand, G::Character, VALUE),
    "expndtw" => cw(W::ExpandTwips, G::Character, VALUE),
    "outl" => cw(W::Outline, G::Character, TOGGLE),
    "shad" => cw(W::Shadow, G::Character, TOGGLE),
    "embo" => cw(W::Emboss, G::Character, TOGGLE),
    "impr" => cw(W::Engrave, G::Character, TOGGLE),

    "par" => cw(W::Par, G::Paragraph, SYMBOL),
    "pard" => cw(W::Pard, G::Paragraph, FLAG),
    "sect" => cw(W::Sect, G::Paragraph, SYMBOL),
    "page" => cw(W::Page, G::Paragraph, SYMBOL),
    "column" => cw(W::Column, G::Paragraph, SYMBOL),
    "line" => cw(W::Line, G::Paragraph, SYMBOL),
    "li" => cw(W::LeftIndent, G::Paragraph, VALUE),
    "ri" => cw(W::RightIndent, G::Paragraph, VALUE),
    "fi" => cw(W::FirstIndent, G::Paragraph, VALUE),
    "lin" => cw(W::LeftIndentLogical, G::Paragraph, VALUE),
    "rin" => cw(W::RightIndentLogical, G::Paragraph, VALUE),
    "sb" => cw(W::SpaceBefore, G::Paragraph, VALUE),
    "sa" => cw(W::SpaceAfter, G::Paragraph, VALUE),
    "sl" => cw(W::SpaceLine, G::Paragraph, VALUE),
    "slmult" => cw(W::SpaceLineMultiple, G::Paragraph, TOGGLE),
    "ql" => cw(W::AlignLeft, G::Paragraph, FLAG),
    "qr" => cw(W::AlignRight, G::Paragraph, FLAG),
    "qc" => cw(W::AlignCenter, G::Paragraph, FLAG),
    "qj" => cw(W::AlignJustify, G::Paragraph, FLAG),
    "qd" => cw(W::AlignDistribute, G::Paragraph, FLAG),
    "rtlpar" => cw(W::RtlPar, G::Paragraph, FLAG),
    "ltrpar" => cw(W::LtrPar, G::Paragraph, FLAG),
    "cbpat" => cw(W::ParaBackPattern, G::Paragraph, VALUE),
    "cfpat" => cw(W::ParaForePattern, G::Paragraph, VALUE),
    "shading" => cw(W::ParaShading, G::Paragraph, VALUE),

    "brdrt" => cw(W::BorderTop, G::Border, FLAG),
    "brdrb" => cw(W::BorderBottom, G::Border, FLAG),
    "brdrl" => cw(W::BorderLeft, G::Border, FLAG),
    "brdrr" => cw(W::BorderRight, G::Border, FLAG),
    "box" => cw(W::BorderBox, G::Border, FLAG),
    "brdrs" => cw(W::BorderSingle, G::Border, FLAG),
    "brdrth" => cw(W::BorderThick, G::Border, FLAG),
    "brdrdb" => cw(W::BorderDouble, G::Border, FLAG),
    "brdrdot" => cw(W::BorderDotted, G::Border, FLAG),
    "brdrdash" => cw(W::BorderDashed, G::Border, FLAG),
    "brdrhair" => cw(W::BorderHairline, G::Border, FLAG),
    "brdrsh" => cw(W::BorderShadow, G::Border, FLAG),
    "brdrnone" => cw(W::BorderNone, G::Border, FLAG),
    "brdrnil" => cw(W::BorderNone, G::Border, FLAG),
    "brdrw" => cw(W::BorderWidth, G::Border, VALUE),
    "brsp" => cw(W::BorderSpace, G::Border, VALUE),
    "brdrcf" => cw(W::BorderColor, G::Border, VALUE),

    "tab" => cw(W::Tab, G::Special, SYMBOL),
    "emdash" => cw(W::EmDash, G::Special, SYMBOL),
    "endash" => cw(W::EnDash, G::Special, SYMBOL),
    "bullet" => cw(W::Bullet, G::Special, SYMBOL),
    "lquote" => cw(W::LeftQuote, G::Special, SYMBOL),
    "rquote" => cw(W::RightQuote, G::Special, SYMBOL),
    "ldblquote" => cw(W::LeftDoubleQuote, G::Special, SYMBOL),
    "rdblquote" => cw(W::RightDoubleQuote, G::Special, SYMBOL),
    "emspace" => cw(W::EmSpace, G::Special, SYMBOL),
    "enspace" => cw(W::EnSpace, G::Special, SYMBOL),
    "qmspace" => cw(W::QmSpace, G::Special, SYMBOL),
    "zwj" => cw(W::ZeroWidthJoiner, G::Special, SYMBOL),
    "zwnj" => cw(W::ZeroWidthNonJoiner, G::Special, SYMBOL),
    "ltrmark" => cw(W::LtrMark, G::Special, SYMBOL),
    "rtlmark" => cw(W::RtlMark, G::Special, SYMBOL),

    "u" => cw(W::Unicode, G::Unicode, VALUE),
    "uc" => cw(W::UnicodeSkip, G::Unicode, VALUE),
    "bin" => cw(W::Binary, G::Unicode, VALUE),

    "fonttbl" => cw(W::FontTable, G::FontTable, DEST),
    "fnil" => cw(W::FontFamily, G::FontTable, FLAG),
    "froman" => cw(W::FontFamily, G::FontTable, FLAG),
    "fswiss" => cw(W::FontFamily, G::FontTable, FLAG),
    "fmodern" => cw(W::FontFamily, G::FontTable, FLAG),
    "fscript" => cw(W::FontFamily, G::FontTable, FLAG),
    "fdecor" => cw(W::FontFamily, G::FontTable, FLAG),
    "ftech" => cw(W::FontFamily, G::FontTable, FLAG),
    "fbidi" => cw(W::FontFamily, G::FontTable, FLAG),
    "fcharset" => cw(W::FontCharset, G::FontTable, VALUE),
    "cpg" => cw(W::FontCodePage, G::FontTable, VALUE),
    "fprq" => cw(W::FontPitch, G::FontTable, VALUE),

    "colortbl" => cw(W::ColorTable, G::ColorTable, DEST),
    "red" => cw(W::Red, G::ColorTable, VALUE),
    "green" => cw(W::Green, G::ColorTable, VALUE),
    "blue" => cw(W::Blue, G::ColorTable, VALUE),

    "intbl" => cw(W::InTable, G::Table, FLAG),
    "itap" => cw(W::Itap, G::Table, VALUE),
    "trowd" => cw(W::RowDefaults, G::Table, FLAG),
    "trgaph" => cw(W::RowGap, G::Table, VALUE),
    "trleft" => cw(W::RowLeft, G::Table, VALUE),
    "trql" => cw(W::RowAlignLeft, G::Table, FLAG),
    "trqr" => cw(W::RowAlignRight, G::Table, FLAG),
    "trqc" => cw(W::RowAlignCenter, G::Table, FLAG),
    "trrh" => cw(W::RowHeight, G::Table, VALUE),
    "rtlrow" => cw(W::RtlRow, G::Table, FLAG),
    "ltrrow" => cw(W::LtrRow, G::Table, FLAG),
    "trpaddl" => cw(W::RowPaddingLeft, G::Table, VALUE),
    "trpaddt" => cw(W::RowPaddingTop, G::Table, VALUE),
    "trpaddr" => cw(W::RowPaddingRight, G::Table, VALUE),
    "trpaddb" => cw(W::RowPaddingBottom, G::Table, VALUE),
    "trbrdrt" => cw(W::RowBorderTop, G::Table, FLAG),
    "trbrdrl" => cw(W::RowBorderLeft, G::Table, FLAG),
    "trbrdrb" => cw(W::RowBorderBottom, G::Table, FLAG),
    "trbrdrr" => cw(W::RowBorderRight, G::Table, FLAG),
    "trbrdrh" => cw(W::RowBorderHorizontal, G::Table, FLAG),
    "trbrdrv" => cw(W::RowBorderVertical, G::Table, FLAG),
    "trftsWidth" => cw(W::RowWidthType, G::Table, VALUE),
    "trwWidth" => cw(W::RowWidth, G::Table, VALUE),
    "cellx" => cw(W::CellX, G::Table, VALUE),
    "clbrdrt" => cw(W::CellBorderTop, G::Table, FLAG),
    "clbrdrl" => cw(W::CellBorderLeft, G::Table, FLAG),
    "clbrdrb" => cw(W::CellBorderBottom, G::Table, FLAG),
    "clbrdrr" => cw(W::CellBorderRight, G::Table, FLAG),
    "clcbpat" => cw(W::CellBackPattern, G::Table, VALUE),
    "clcfpat" => cw(W::CellForePattern, G::Table, VALUE),
    "clshdng" => cw(W::CellShading, G::Table, VALUE),
    "clvmgf" => cw(W::CellVMergeFirst, G::Table, FLAG),
    "clvmrg" => cw(W::CellVMerge, G::Table, FLAG),
    "clmgf" => cw(W::CellHMergeFirst, G::Table, FLAG),
    "clmrg" => cw(W::CellHMerge, G::Table, FLAG),
    "clvertalt" => cw(W::CellVAlignTop, G::Table, FLAG),
    "clvertalc" => cw(W::CellVAlignCenter, G::Table, FLAG),
    "clvertalb" => cw(W::CellVAlignBottom, G::Table, FLAG),
    "clpadl" => cw(W::CellPaddingLeft, G::Table, VALUE),
    "clpadt" => cw(W::CellPaddingTop, G::Table, VALUE),
    "clpadr" => cw(W::CellPaddingRight, G::Table, VALUE),
    "clpadb" => cw(W::CellPaddingBottom, G::Table, VALUE),
    "clftsWidth" => cw(W::CellWidthType, G::Table, VALUE),
    "clwWidth" => cw(W::CellWidth, G::Table, VALUE),
    "cell" => cw(W::Cell, G::Table, SYMBOL),
    "nestcell" => cw(W::NestCell, G::Table, SYMBOL),
    "row" => cw(W::Row, G::Table, SYMBOL),
    "nestrow" => cw(W::NestRow, G::Table, SYMBOL),
    "nesttableprops" => cw(W::NestTableProps, G::Table, DEST),
    "nonesttables" => cw(W::NoNestTables, G::Table, DEST),

    "listtable" => cw(W::ListTable, G::List, DEST),
    "list" => cw(W::List, G::List, DEST),
    "listid" => cw(W::ListId, G::List, VALUE),
    "listtemplateid" => cw(W::ListTemplateId, G::List, VALUE),
    "listsimple" => cw(W::ListSimple, G::List, TOGGLE),
    "listhybrid" => cw(W::ListHybrid, G::List, FLAG),
    "listlevel" => cw(W::ListLevel, G::List, DEST),
    "levelnfc" => cw(W::LevelNfc, G::List, VALUE),
    "levelnfcn" => cw(W::LevelNfcN, G::List, VALUE),
    "levelstartat" => cw(W::LevelStartAt, G::List, VALUE),
    "leveltext" => cw(W::LevelText, G::List, DEST),
    "levelnumbers" => cw(W::LevelNumbers, G::List, DEST),
    "listoverridetable" => cw(W::ListOverrideTable, G::List, DEST),
    "listoverride" => cw(W::ListOverride, G::List, DEST),
    "listoverridecount" => cw(W::ListOverrideCount, G::List, VALUE),
    "lfolevel" => cw(W::ListOverrideLevel, G::List, DEST),
    "listoverridestartat" => cw(W::ListOverrideStartAt, G::List, FLAG),
    "liststyleid" => cw(W::ListStyle, G::List, VALUE),
    "ls" => cw(W::ListStyle, G::List, VALUE),
    "ilvl" => cw(W::ListLevelIndex, G::List, VALUE),
    "listtext" => cw(W::ListText, G::List, DEST),

    "pn" => cw(W::Pn, G::OldList, DEST),
    "pntext" => cw(W::PnText, G::OldList, DEST),
    "pnlvl" => cw(W::PnLevel, G::OldList, VALUE),
    "pnlvlblt" => cw(W::PnLevelBullet, G::OldList, FLAG),
    "pnlvlbody" => cw(W::PnLevelBody, G::OldList, FLAG),
    "pnlvlcont" => cw(W::PnLevelContinue, G::OldList, FLAG),
    "pnstart" => cw(W::PnStart, G::OldList, VALUE),
    "pndec" => cw(W::PnDecimal, G::OldList, FLAG),
    "pnucltr" => cw(W::PnUpperLetter, G::OldList, FLAG),
    "pnlcltr" => cw(W::PnLowerLetter, G::OldList, FLAG),
    "pnucrm" => cw(W::PnUpperRoman, G::OldList, FLAG),
    "pnlcrm" => cw(W::PnLowerRoman, G::OldList, FLAG),
    "pnord" => cw(W::PnOrdinal, G::OldList, FLAG),
    "pnordt" => cw(W::PnOrdinalText, G::OldList, FLAG),
    "pncard" => cw(W::PnCardinal, G::OldList, FLAG),
    "pntxta" => cw(W::PnTextAfter, G::OldList, DEST),
    "pntxtb" => cw(W::PnTextBefore, G::OldList, DEST),

    "shp" => cw(W::Shape, G::Shape, DEST),
    "shpgrp" => cw(W::ShapeGroup, G::Shape, DEST),
    "shpinst" => cw(W::ShapeInstruction, G::Shape, DEST),
    "shptxt" => cw(W::ShapeText, G::Shape, DEST),
    "shprslt" => cw(W::ShapeResult, G::Shape, DEST),
    "shppict" => cw(W::ShapePicture, G::Shape, DEST),
    "nonshppict" => cw(W::NonShapePicture, G::Shape, DEST),
    "do" => cw(W::DrawingObject, G::Shape, DEST),
    "sp" => cw(W::ShapeProperty, G::Shape, DEST),
    "sn" => cw(W::ShapePropertyName, G::Shape, DEST),
    "sv" => cw(W::ShapePropertyValue, G::Shape, DEST),

    "field" => cw(W::Field, G::Field, DEST),
    "fldinst" => cw(W::FieldInstruction, G::Field, DEST),
    "fldrslt" => cw(W::FieldResult, G::Field, DEST),

    "pict" => cw(W::Picture, G::Picture, DEST),
    "pngblip" => cw(W::PngBlip, G::Picture, FLAG),
    "jpegblip" => cw(W::JpegBlip, G::Picture, FLAG),
    "emfblip" => cw(W::EmfBlip, G::Picture, FLAG),
    "wmetafile" => cw(W::WindowsMetafile, G::Picture, VALUE),
    "picw" => cw(W::PictureWidth, G::Picture, VALUE),
    "pich" => cw(W::PictureHeight, G::Picture, VALUE),
    "picwgoal" => cw(W::PictureGoalWidth, G::Picture, VALUE),
    "pichgoal" => cw(W::PictureGoalHeight, G::Picture, VALUE),
    "picscalex" => cw(W::PictureScaleX, G::Picture, VALUE),
    "picscaley" => cw(W::PictureScaleY, G::Picture, VALUE),

    "object" => cw(W::Object, G::Picture, DEST),
    "result" => cw(W::ObjectResult, G::Picture, DEST),

    "info" => cw(W::SkippedDestination, G::Ignored, DEST),
    "stylesheet" => cw(W::SkippedDestination, G::Ignored, DEST),
    "header" => cw(W::SkippedDestination, G::Ignored, DEST),
    "headerl" => cw(W::SkippedDestination, G::Ignored, DEST),
    "headerr" => cw(W::SkippedDestination, G::Ignored, DEST),
    "headerf" => cw(W::SkippedDestination, G::Ignored, DEST),
    "footer" => cw(W::SkippedDestination, G::Ignored, DEST),
    "footerl" => cw(W::SkippedDestination, G::Ignored, DEST),
    "footerr" => cw(W::SkippedDestination, G::Ignored, DEST),
    "footerf" => cw(W::SkippedDestination, G::Ignored, DEST),
    "footnote" => cw(W::SkippedDestination, G::Ignored, DEST),
    "annotation" => cw(W::SkippedDestination, G::Ignored, DEST),
    "xmlnstbl" => cw(W::SkippedDestination, G::Ignored, DEST),
    "themedata" => cw(W::SkippedDestination, G::Ignored, DEST),
    "colorschememapping" => cw(W::SkippedDestination, G::Ignored, DEST),
    "datastore" => cw(W::SkippedDestination, G::Ignored, DEST),
    "latentstyles" => cw(W::SkippedDestination, G::Ignored, DEST),
    "rsidtbl" => cw(W::SkippedDestination, G::Ignored, DEST),
    "generator" => cw(W::SkippedDestination, G::Ignored, DEST),
    "listpicture" => cw(W::SkippedDestination, G::Ignored, DEST),
    "listname" => cw(W::SkippedDestination, G::Ignored, DEST),
    "bkmkstart" => cw(W::SkippedDestination, G::Ignored, DEST),
    "bkmkend" => cw(W::SkippedDestination, G::Ignored, DEST),
    "objdata" => cw(W::SkippedDestination, G::Ignored, DEST),
    "panose" => cw(W::SkippedDestination, G::Ignored, DEST),
    "falt" => cw(W::SkippedDestination, G::Ignored, DEST),
    "pgdsctbl" => cw(W::SkippedDestination, G::Ignored, DEST),
    "revtbl" => cw(W::SkippedDestination, G::Ignored, DEST),
    "filetbl" => cw(W::SkippedDestination, G::Ignored, DEST),
    "template" => cw(W::SkippedDestination, G::Ignored, DEST),
};

/// Look up a keyword.
#[inline]
pub fn lookup(name: &str) -> &'static ControlWordInfo {
    CONTROL_WORDS.get(name).unwrap_or(&UNKNOWN_CONTROL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known() {
        let info = lookup("b");
        assert_eq!(info.control, ControlWord::Bold);
        assert!(info.flags.contains(ControlFlags::TOGGLE));
        assert!(lookup("fonttbl").is_destination());
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        assert_eq!(lookup("clftsWidth").control, ControlWord::CellWidthType);
        assert_eq!(lookup("clftswidth").control, ControlWord::Unknown);
    }

    #[test]
    fn test_lookup_unknown() {
        let info = lookup("nosuchword");
        assert_eq!(info.control, ControlWord::Unknown);
        assert_eq!(info.group, ControlGroup::Ignored);
        assert!(!info.is_destination());
    }
}
