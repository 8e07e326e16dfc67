//! Code page utilities for 8-bit RTF text.
//!
//! RTF carries non-ASCII text either as raw 8-bit bytes or as `\'hh` escapes,
//! both interpreted through the code page that is active for the current
//! group. The active code page comes from `\ansicpg`, from the `\fcharset` of
//! the selected font, or from the document character set keyword.

use encoding_rs::Encoding;

/// Code page used when a document does not declare one.
pub const DEFAULT_CODE_PAGE: u32 = 1252;

/// Map Windows codepage identifier to encoding_rs Encoding.
///
/// # Examples
/// ```
/// use rtfxaml::common::encoding::codepage_to_encoding;
///
/// let encoding = codepage_to_encoding(936).unwrap();
/// assert_eq!(encoding.name(), "GBK");
/// ```
#[inline]
pub fn codepage_to_encoding(codepage: u32) -> Option<&'static Encoding> {
    match codepage {
        // DOS codepages
        437 => Some(encoding_rs::IBM866), // IBM866 (close approximation to CP437)
        850 => Some(encoding_rs::IBM866), // DOS Latin 1 (approximation)

        // Windows codepages (Western scripts)
        874 => Some(encoding_rs::WINDOWS_874),
        1250 => Some(encoding_rs::WINDOWS_1250),
        1251 => Some(encoding_rs::WINDOWS_1251),
        1252 => Some(encoding_rs::WINDOWS_1252),
        1253 => Some(encoding_rs::WINDOWS_1253),
        1254 => Some(encoding_rs::WINDOWS_1254),
        1255 => Some(encoding_rs::WINDOWS_1255),
        1256 => Some(encoding_rs::WINDOWS_1256),
        1257 => Some(encoding_rs::WINDOWS_1257),
        1258 => Some(encoding_rs::WINDOWS_1258),

        // East Asian codepages
        932 => Some(encoding_rs::SHIFT_JIS),
        936 => Some(encoding_rs::GBK),
        949 => Some(encoding_rs::EUC_KR),
        950 => Some(encoding_rs::BIG5),
        20932 => Some(encoding_rs::EUC_JP),
        20936 => Some(encoding_rs::GBK),
        54936 => Some(encoding_rs::GB18030),

        // ISO 8859 series
        28591 => Some(encoding_rs::WINDOWS_1252), // ISO-8859-1 approximation
        28592 => Some(encoding_rs::ISO_8859_2),
        28595 => Some(encoding_rs::ISO_8859_5),
        28596 => Some(encoding_rs::ISO_8859_6),
        28597 => Some(encoding_rs::ISO_8859_7),
        28598 => Some(encoding_rs::ISO_8859_8),
        28605 => Some(encoding_rs::ISO_8859_15),

        // KOI8 series
        20866 => Some(encoding_rs::KOI8_R),
        21866 => Some(encoding_rs::KOI8_U),

        // Macintosh
        10000 => Some(encoding_rs::MACINTOSH),
        10001 => Some(encoding_rs::SHIFT_JIS), // Mac Japanese
        10007 => Some(encoding_rs::KOI8_R),    // Mac Cyrillic (approximation)

        // Unicode
        65001 => Some(encoding_rs::UTF_8),

        _ => None,
    }
}

/// Map an RTF `\fcharset` value to the Windows code page it implies.
///
/// Returns `None` for charsets that do not select a code page (for example
/// the symbol charset 2, whose bytes are glyph indices).
#[inline]
pub fn charset_to_codepage(charset: i32) -> Option<u32> {
    let codepage = match charset {
        0 => 1252,   // ANSI
        77 => 10000, // Mac Roman
        78 => 10001, // Mac Shift JIS
        128 => 932,  // Shift JIS
        129 => 949,  // Hangul
        130 => 1361, // Johab
        134 => 936,  // GB2312
        136 => 950,  // Big5
        161 => 1253, // Greek
        162 => 1254, // Turkish
        163 => 1258, // Vietnamese
        177 => 1255, // Hebrew
        178 => 1256, // Arabic
        186 => 1257, // Baltic
        204 => 1251, // Russian
        222 => 874,  // Thai
        238 => 1250, // Eastern European
        254 => 437,  // PC 437
        255 => 850,  // OEM
        _ => return None,
    };
    Some(codepage)
}

/// Decode `bytes` through `codepage`, falling back to Windows-1252 when the
/// code page is unknown.
pub fn decode_with_codepage(bytes: &[u8], codepage: u32) -> String {
    let encoding = codepage_to_encoding(codepage).unwrap_or(encoding_rs::WINDOWS_1252);
    let (text, _, _) = encoding.decode(bytes);
    text.into_owned()
}

/// Convert a hex character to its nibble value (0-15).
#[inline(always)]
pub fn hex_nibble(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codepage_lookup() {
        assert_eq!(codepage_to_encoding(1251).unwrap().name(), "windows-1251");
        assert!(codepage_to_encoding(99999).is_none());
    }

    #[test]
    fn test_charset_to_codepage() {
        assert_eq!(charset_to_codepage(0), Some(1252));
        assert_eq!(charset_to_codepage(128), Some(932));
        assert_eq!(charset_to_codepage(2), None);
    }

    #[test]
    fn test_decode_with_codepage() {
        assert_eq!(decode_with_codepage(&[0x93, 0x41, 0x94], 1252), "\u{201C}A\u{201D}");
        assert_eq!(decode_with_codepage(&[0xC0], 1251), "А");
        // Unknown code pages decode as Windows-1252.
        assert_eq!(decode_with_codepage(&[0xE9], 4242), "é");
    }

    #[test]
    fn test_hex_nibble() {
        assert_eq!(hex_nibble(b'a'), Some(10));
        assert_eq!(hex_nibble(b'F'), Some(15));
        assert_eq!(hex_nibble(b'g'), None);
    }
}
