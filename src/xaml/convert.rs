//! Value converters and validators for untrusted RTF parameters.

use super::tables::{Color, ColorTable};
use phf::phf_map;

/// Largest accepted `\fs` value, in half points.
pub const MAX_FONT_SIZE: i64 = 0x7FFF;
/// Largest accepted border width, in twips.
pub const MAX_BORDER_WIDTH: i64 = 1440;
/// Shading is expressed in hundredths of a percent.
pub const MAX_SHADING: i64 = 10000;

#[inline]
pub fn clamp_font_size(half_points: i64) -> i64 {
    half_points.clamp(0, MAX_FONT_SIZE)
}

#[inline]
pub fn clamp_border_width(twips: i64) -> i64 {
    twips.clamp(0, MAX_BORDER_WIDTH)
}

#[inline]
pub fn clamp_shading(shade: i64) -> i64 {
    shade.clamp(0, MAX_SHADING)
}

/// Width types of `\trftsWidth`/`\clftsWidth` run from 0 (none) to 3 (twips).
#[inline]
pub fn clamp_width_type(value: i64) -> i64 {
    value.clamp(0, 3)
}

/// Resolve a background/foreground/shade triple to one color.
///
/// A negative `shade` means no shading: the background color wins (white
/// when absent). Otherwise the foreground (black when absent) is blended
/// over the background (white when absent) by `shade / 10000`.
///
/// # Examples
///
/// ```rust
/// use rtfxaml::xaml::{ColorTable, color_to_use};
///
/// let table = ColorTable::new();
/// let grey = color_to_use(&table, -1, -1, 2500);
/// assert_eq!((grey.r, grey.g, grey.b), (191, 191, 191));
/// ```
pub fn color_to_use(table: &ColorTable, cb: i64, cf: i64, shade: i64) -> Color {
    let background = table.get(cb);
    let foreground = table.get(cf);

    if shade < 0 {
        return background.unwrap_or(Color::WHITE);
    }

    let back = background.unwrap_or(Color::WHITE);
    let fore = foreground.unwrap_or(Color::BLACK);
    match shade {
        0 => back,
        s if s >= MAX_SHADING => fore,
        s => Color::rgb(
            blend(fore.r, back.r, s),
            blend(fore.g, back.g, s),
            blend(fore.b, back.b, s),
        ),
    }
}

#[inline]
fn blend(fore: u8, back: u8, shade: i64) -> u8 {
    let value = fore as i64 * shade / MAX_SHADING + back as i64 * (MAX_SHADING - shade) / MAX_SHADING;
    value.clamp(0, 255) as u8
}

/// List marker kinds, numbered the way `\levelnfc` numbers them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum MarkerStyle {
    #[default]
    None,
    Arabic,
    UpperRoman,
    LowerRoman,
    UpperAlpha,
    LowerAlpha,
    Ordinal,
    Cardinal,
    Bullet,
    Hidden,
}

impl MarkerStyle {
    /// Map a `\levelnfc` value.
    pub fn from_nfc(value: i64) -> Self {
        match value {
            0 => MarkerStyle::Arabic,
            1 => MarkerStyle::UpperRoman,
            2 => MarkerStyle::LowerRoman,
            3 => MarkerStyle::UpperAlpha,
            4 => MarkerStyle::LowerAlpha,
            5 => MarkerStyle::Ordinal,
            6 => MarkerStyle::Cardinal,
            23 => MarkerStyle::Bullet,
            255 => MarkerStyle::Hidden,
            // Everything else (Kanji, Hebrew, ...) numbers as decimal
            _ => MarkerStyle::Arabic,
        }
    }

    /// `MarkerStyle` attribute value of a `<List>`.
    pub fn xaml_name(self) -> &'static str {
        match self {
            MarkerStyle::Arabic | MarkerStyle::Ordinal | MarkerStyle::Cardinal => "Decimal",
            MarkerStyle::UpperRoman => "UpperRoman",
            MarkerStyle::LowerRoman => "LowerRoman",
            MarkerStyle::UpperAlpha => "UpperLatin",
            MarkerStyle::LowerAlpha => "LowerLatin",
            MarkerStyle::Bullet => "Disc",
            MarkerStyle::None | MarkerStyle::Hidden => "None",
        }
    }

    #[inline]
    pub fn is_numbered(self) -> bool {
        !matches!(self, MarkerStyle::None | MarkerStyle::Bullet | MarkerStyle::Hidden)
    }
}

/// Render the marker text for item number `count`.
///
/// # Examples
///
/// ```rust
/// use rtfxaml::xaml::{MarkerStyle, marker_count_to_string};
///
/// assert_eq!(marker_count_to_string(MarkerStyle::UpperRoman, 1994), "MCMXCIV");
/// assert_eq!(marker_count_to_string(MarkerStyle::LowerAlpha, 27), "aa");
/// ```
pub fn marker_count_to_string(style: MarkerStyle, count: i64) -> String {
    let count = count.max(0);
    match style {
        MarkerStyle::UpperRoman | MarkerStyle::LowerRoman if (1..4000).contains(&count) => {
            let roman = to_roman(count);
            if style == MarkerStyle::LowerRoman {
                roman.to_ascii_lowercase()
            } else {
                roman
            }
        },
        MarkerStyle::UpperAlpha | MarkerStyle::LowerAlpha if count > 0 => {
            let base = if style == MarkerStyle::UpperAlpha { b'A' } else { b'a' };
            let letter = char::from(base + ((count - 1) % 26) as u8);
            let repeat = ((count - 1) / 26 + 1) as usize;
            std::iter::repeat_n(letter, repeat).collect()
        },
        MarkerStyle::Bullet => "\u{2022}".to_string(),
        MarkerStyle::None | MarkerStyle::Hidden => String::new(),
        _ => itoa::Buffer::new().format(count).to_string(),
    }
}

fn to_roman(mut value: i64) -> String {
    const DIGITS: [(i64, &str); 13] = [
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];
    let mut out = String::new();
    for (amount, digits) in DIGITS {
        while value >= amount {
            out.push_str(digits);
            value -= amount;
        }
    }
    out
}

/// Windows LCIDs that appear in RTF `\lang` keywords.
static LANGUAGE_TAGS: phf::Map<u32, &'static str> = phf_map! {
    1025u32 => "ar-SA",
    1026u32 => "bg-BG",
    1027u32 => "ca-ES",
    1028u32 => "zh-TW",
    1029u32 => "cs-CZ",
    1030u32 => "da-DK",
    1031u32 => "de-DE",
    1032u32 => "el-GR",
    1033u32 => "en-US",
    1035u32 => "fi-FI",
    1036u32 => "fr-FR",
    1037u32 => "he-IL",
    1038u32 => "hu-HU",
    1040u32 => "it-IT",
    1041u32 => "ja-JP",
    1042u32 => "ko-KR",
    1043u32 => "nl-NL",
    1044u32 => "nb-NO",
    1045u32 => "pl-PL",
    1046u32 => "pt-BR",
    1048u32 => "ro-RO",
    1049u32 => "ru-RU",
    1050u32 => "hr-HR",
    1051u32 => "sk-SK",
    1053u32 => "sv-SE",
    1054u32 => "th-TH",
    1055u32 => "tr-TR",
    1057u32 => "id-ID",
    1058u32 => "uk-UA",
    1060u32 => "sl-SI",
    1061u32 => "et-EE",
    1062u32 => "lv-LV",
    1063u32 => "lt-LT",
    1065u32 => "fa-IR",
    1066u32 => "vi-VN",
    1081u32 => "hi-IN",
    2052u32 => "zh-CN",
    2057u32 => "en-GB",
    2058u32 => "es-MX",
    2070u32 => "pt-PT",
    3076u32 => "zh-HK",
    3082u32 => "es-ES",
    3084u32 => "fr-CA",
    4100u32 => "zh-SG",
};

/// Language tag for an LCID, if known.
#[inline]
pub fn language_tag(lcid: i64) -> Option<&'static str> {
    u32::try_from(lcid).ok().and_then(|id| LANGUAGE_TAGS.get(&id).copied())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_strings() {
        assert_eq!(marker_count_to_string(MarkerStyle::UpperRoman, 1994), "MCMXCIV");
        assert_eq!(marker_count_to_string(MarkerStyle::LowerRoman, 4), "iv");
        assert_eq!(marker_count_to_string(MarkerStyle::LowerAlpha, 27), "aa");
        assert_eq!(marker_count_to_string(MarkerStyle::UpperAlpha, 3), "C");
        assert_eq!(marker_count_to_string(MarkerStyle::Arabic, 12), "12");
        assert_eq!(marker_count_to_string(MarkerStyle::UpperRoman, 0), "0");
        assert_eq!(marker_count_to_string(MarkerStyle::Hidden, 5), "");
    }

    #[test]
    fn test_color_blend_midpoint() {
        let mut table = ColorTable::new();
        table.push(Color::rgb(200, 100, 50));
        let mid = color_to_use(&table, 0, -1, 5000);
        assert_eq!(mid, Color::rgb(100, 50, 25));
    }

    #[test]
    fn test_color_blend_defaults() {
        let table = ColorTable::new();
        assert_eq!(color_to_use(&table, -1, -1, 2500), Color::rgb(191, 191, 191));
        assert_eq!(color_to_use(&table, -1, -1, -1), Color::WHITE);
        assert_eq!(color_to_use(&table, -1, -1, 10000), Color::BLACK);
    }

    #[test]
    fn test_clamps() {
        assert_eq!(clamp_font_size(100_000), MAX_FONT_SIZE);
        assert_eq!(clamp_border_width(-3), 0);
        assert_eq!(clamp_shading(20000), 10000);
        assert_eq!(clamp_width_type(9), 3);
    }

    #[test]
    fn test_marker_style_names() {
        assert_eq!(MarkerStyle::from_nfc(23), MarkerStyle::Bullet);
        assert_eq!(MarkerStyle::from_nfc(23).xaml_name(), "Disc");
        assert_eq!(MarkerStyle::from_nfc(3).xaml_name(), "UpperLatin");
        assert_eq!(language_tag(1033), Some("en-US"));
        assert_eq!(language_tag(-1), None);
    }
}
