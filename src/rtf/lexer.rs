//! RTF lexer/tokenizer.
//!
//! Byte-level tokenizer over the raw document. Text runs are accumulated as
//! bytes (raw 8-bit text and `\'hh` escapes alike) and decoded through the
//! active code page in one go, so double-byte code pages decode correctly
//! even when lead and trail bytes are escaped separately.

use super::control::{self, ControlWordInfo, UNKNOWN_CONTROL};
use super::token::{ControlToken, LexHint, Token, TokenSource};
use crate::common::encoding::{DEFAULT_CODE_PAGE, codepage_to_encoding, hex_nibble};
use encoding_rs::Encoding;
use memchr::memchr3;
use smallvec::SmallVec;
use std::io::{self, Write};

/// Longest accepted control word.
const MAX_KEYWORD_LEN: usize = 32;
/// Longest accepted numeric parameter, in digits.
const MAX_PARAMETER_DIGITS: usize = 10;

/// RTF lexer over a byte slice.
pub struct Lexer<'a> {
    /// Source input
    input: &'a [u8],
    /// Current position in bytes
    pos: usize,
    /// Encoding for 8-bit text
    encoding: &'static Encoding,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer decoding 8-bit text as Windows-1252.
    #[inline]
    pub fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            pos: 0,
            encoding: encoding_rs::WINDOWS_1252,
        }
    }

    /// Create a lexer with a specific initial code page.
    pub fn with_code_page(input: &'a [u8], code_page: u32) -> Self {
        let mut lexer = Self::new(input);
        lexer.set_code_page(code_page);
        lexer
    }

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    #[inline]
    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    /// Value of a valid `\'hh` escape at the cursor.
    fn hex_escape_at(&self, at: usize) -> Option<u8> {
        let hi = hex_nibble(*self.input.get(at + 2)?)?;
        let lo = hex_nibble(*self.input.get(at + 3)?)?;
        Some((hi << 4) | lo)
    }

    fn skip_newlines(&mut self) {
        while matches!(self.peek(), Some(b'\r' | b'\n')) {
            self.pos += 1;
        }
    }

    /// Read a run of text up to the next group delimiter or control word.
    fn read_text(&mut self) -> Token {
        let mut bytes = SmallVec::<[u8; 64]>::new();
        let mut text = String::new();

        while let Some(byte) = self.peek() {
            match byte {
                b'{' | b'}' => break,
                b'\r' | b'\n' => self.pos += 1,
                b'\\' => {
                    let literal = match self.peek_at(1) {
                        Some(b'\'') => match self.hex_escape_at(self.pos) {
                            Some(value) => {
                                bytes.push(value);
                                self.pos += 4;
                                continue;
                            },
                            None => break,
                        },
                        Some(sym @ (b'\\' | b'{' | b'}')) => {
                            bytes.push(sym);
                            self.pos += 2;
                            continue;
                        },
                        Some(b'~') => '\u{00A0}',
                        Some(b'-') => '\u{00AD}',
                        Some(b'_') => '\u{2011}',
                        _ => break,
                    };
                    self.flush_bytes(&mut bytes, &mut text);
                    text.push(literal);
                    self.pos += 2;
                },
                _ => {
                    // Plain bytes up to the next delimiter
                    let rest = &self.input[self.pos..];
                    let end = memchr3(b'\\', b'{', b'}', rest).unwrap_or(rest.len());
                    let run = &rest[..end];
                    let line_end = run
                        .iter()
                        .position(|&b| b == b'\r' || b == b'\n')
                        .unwrap_or(run.len());
                    bytes.extend_from_slice(&run[..line_end]);
                    self.pos += line_end;
                },
            }
        }

        self.flush_bytes(&mut bytes, &mut text);
        Token::Text(text)
    }

    fn flush_bytes(&self, bytes: &mut SmallVec<[u8; 64]>, text: &mut String) {
        if bytes.is_empty() {
            return;
        }
        let (decoded, _) = self.encoding.decode_without_bom_handling(bytes);
        text.push_str(&decoded);
        bytes.clear();
    }

    /// Parse a control word or control symbol; the cursor is on the backslash.
    fn read_control(&mut self) -> Token {
        let start = self.pos;
        self.pos += 1;

        let Some(first) = self.peek() else {
            return Token::Invalid {
                offset: start,
                reason: "backslash at end of input",
            };
        };

        if first == b'*' {
            self.pos += 1;
            return Token::Destination;
        }
        if first == b'\r' || first == b'\n' {
            self.pos += 1;
            return Token::Control(self.control_token("par", control::lookup("par"), None));
        }
        if first == b'\'' {
            return Token::Invalid {
                offset: start,
                reason: "malformed hex escape",
            };
        }
        if !first.is_ascii_alphabetic() {
            // Unrecognized control symbol such as `\|` or `\:`
            self.pos += 1;
            let name = char::from(first).to_string();
            return Token::Control(ControlToken {
                name,
                info: &UNKNOWN_CONTROL,
                parameter: None,
            });
        }

        let word_start = self.pos;
        while matches!(self.peek(), Some(b) if b.is_ascii_alphabetic()) {
            self.pos += 1;
        }
        if self.pos - word_start > MAX_KEYWORD_LEN {
            return Token::Invalid {
                offset: start,
                reason: "control word too long",
            };
        }
        // Keywords are ASCII letters by construction.
        let name = String::from_utf8_lossy(&self.input[word_start..self.pos]).into_owned();

        let parameter = match self.read_parameter() {
            Ok(parameter) => parameter,
            Err(reason) => return Token::Invalid { offset: start, reason },
        };

        if self.peek() == Some(b' ') {
            self.pos += 1;
        }

        let info = control::lookup(&name);
        Token::Control(self.control_token(&name, info, parameter))
    }

    fn control_token(
        &self,
        name: &str,
        info: &'static ControlWordInfo,
        parameter: Option<i32>,
    ) -> ControlToken {
        ControlToken {
            name: name.to_string(),
            info,
            parameter,
        }
    }

    /// Parse the optional signed numeric parameter after a control word.
    fn read_parameter(&mut self) -> Result<Option<i32>, &'static str> {
        let start = self.pos;
        let negative = self.peek() == Some(b'-') && matches!(self.peek_at(1), Some(b) if b.is_ascii_digit());
        if negative {
            self.pos += 1;
        }
        let digits_start = self.pos;
        while matches!(self.peek(), Some(b) if b.is_ascii_digit()) {
            self.pos += 1;
        }
        let digits = self.pos - digits_start;
        if digits == 0 {
            return Ok(None);
        }
        if digits > MAX_PARAMETER_DIGITS {
            return Err("numeric parameter too long");
        }

        let value = atoi_simd::parse::<i64, false, false>(&self.input[start..self.pos])
            .map_err(|_| "malformed numeric parameter")?;
        Ok(Some(value.clamp(i32::MIN as i64, i32::MAX as i64) as i32))
    }

    /// Consume hex digit pairs (whitespace allowed between them).
    fn drain_hex(&mut self, mut sink: impl FnMut(&[u8]) -> io::Result<()>) -> io::Result<()> {
        let mut buf = SmallVec::<[u8; 256]>::new();
        let mut high: Option<u8> = None;

        while let Some(byte) = self.peek() {
            if let Some(nibble) = hex_nibble(byte) {
                match high.take() {
                    Some(h) => {
                        buf.push((h << 4) | nibble);
                        if buf.len() == buf.inline_size() {
                            sink(&buf)?;
                            buf.clear();
                        }
                    },
                    None => high = Some(nibble),
                }
            } else if !byte.is_ascii_whitespace() {
                break;
            }
            self.pos += 1;
        }

        if !buf.is_empty() {
            sink(&buf)?;
        }
        Ok(())
    }

    fn at_picture_data(&self) -> bool {
        self.input[self.pos..]
            .iter()
            .find(|b| !b.is_ascii_whitespace())
            .is_some_and(|&b| hex_nibble(b).is_some())
    }

    /// Skip one fallback unit: a byte, a hex escape or a control word.
    /// Returns false at a group boundary or end of input.
    fn skip_fallback_unit(&mut self) -> bool {
        loop {
            match self.peek() {
                None | Some(b'{' | b'}') => return false,
                Some(b'\r' | b'\n') => self.pos += 1,
                Some(b'\\') => {
                    match self.peek_at(1) {
                        Some(b'\'') if self.hex_escape_at(self.pos).is_some() => self.pos += 4,
                        Some(b) if b.is_ascii_alphabetic() => {
                            // Skipping a keyword that is malformed is harmless
                            let _ = self.read_control();
                        },
                        Some(_) => self.pos += 2,
                        None => return false,
                    }
                    return true;
                },
                Some(_) => {
                    self.pos += 1;
                    return true;
                },
            }
        }
    }
}

impl TokenSource for Lexer<'_> {
    fn next_token(&mut self, hint: LexHint) -> Token {
        self.skip_newlines();

        let Some(byte) = self.peek() else {
            return Token::Eof;
        };

        if hint.picture_data && self.at_picture_data() {
            return Token::PictureData;
        }

        match byte {
            b'{' => {
                self.pos += 1;
                Token::GroupStart
            },
            b'}' => {
                self.pos += 1;
                Token::GroupEnd
            },
            b'\\' => match self.peek_at(1) {
                Some(b'\'') if self.hex_escape_at(self.pos).is_some() => self.read_text(),
                Some(b'\\' | b'{' | b'}' | b'~' | b'-' | b'_') => self.read_text(),
                _ => self.read_control(),
            },
            _ => self.read_text(),
        }
    }

    fn set_code_page(&mut self, code_page: u32) {
        self.encoding = codepage_to_encoding(code_page)
            .or_else(|| codepage_to_encoding(DEFAULT_CODE_PAGE))
            .unwrap_or(encoding_rs::WINDOWS_1252);
    }

    fn skip_binary(&mut self, count: usize) {
        self.pos = self.pos.saturating_add(count).min(self.input.len());
    }

    fn skip_picture_data(&mut self) {
        // Discarding cannot fail
        let _ = self.drain_hex(|_| Ok(()));
    }

    fn skip_unicode_fallback(&mut self, count: usize) {
        for _ in 0..count {
            if !self.skip_fallback_unit() {
                break;
            }
        }
    }

    fn write_picture_data(&mut self, out: &mut dyn Write) -> io::Result<()> {
        self.drain_hex(|chunk| out.write_all(chunk))
    }

    fn offset(&self) -> usize {
        self.pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rtf::control::ControlWord;

    fn tokenize(input: &[u8]) -> Vec<Token> {
        let mut lexer = Lexer::new(input);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token(LexHint::default());
            let done = matches!(token, Token::Eof | Token::Invalid { .. });
            tokens.push(token);
            if done {
                break;
            }
        }
        tokens
    }

    fn word(token: &Token) -> Option<(ControlWord, Option<i32>)> {
        match token {
            Token::Control(c) => Some((c.word(), c.parameter)),
            _ => None,
        }
    }

    #[test]
    fn test_simple_tokenization() {
        let tokens = tokenize(br"{\rtf1\ansi Hello}");
        assert_eq!(tokens.len(), 6);
        assert_eq!(tokens[0], Token::GroupStart);
        assert_eq!(word(&tokens[1]), Some((ControlWord::Rtf, Some(1))));
        assert_eq!(word(&tokens[2]), Some((ControlWord::Ansi, None)));
        assert_eq!(tokens[3], Token::Text("Hello".to_string()));
        assert_eq!(tokens[4], Token::GroupEnd);
        assert_eq!(tokens[5], Token::Eof);
    }

    #[test]
    fn test_negative_parameter_and_delimiter() {
        let tokens = tokenize(br"\fi-360 x\li720y");
        assert_eq!(word(&tokens[0]), Some((ControlWord::FirstIndent, Some(-360))));
        assert_eq!(tokens[1], Token::Text("x".to_string()));
        assert_eq!(word(&tokens[2]), Some((ControlWord::LeftIndent, Some(720))));
        assert_eq!(tokens[3], Token::Text("y".to_string()));
    }

    #[test]
    fn test_hex_escapes_and_symbols() {
        let tokens = tokenize(br"caf\'e9 \{x\}\~\\");
        assert_eq!(tokens[0], Token::Text("café {x}\u{00A0}\\".to_string()));
    }

    #[test]
    fn test_double_byte_code_page() {
        let mut lexer = Lexer::with_code_page(br"\'c4\'e3", 936);
        assert_eq!(lexer.next_token(LexHint::default()), Token::Text("你".to_string()));
    }

    #[test]
    fn test_raw_bytes_follow_code_page_switch() {
        let mut lexer = Lexer::new(b"\xC0 \\'c0");
        lexer.set_code_page(1251);
        assert_eq!(lexer.next_token(LexHint::default()), Token::Text("\u{0410} \u{0410}".to_string()));
    }

    #[test]
    fn test_newlines_are_ignored_and_escaped_newline_is_par() {
        let tokens = tokenize(b"a\r\nb\\\nc");
        assert_eq!(tokens[0], Token::Text("ab".to_string()));
        assert_eq!(word(&tokens[1]), Some((ControlWord::Par, None)));
        assert_eq!(tokens[2], Token::Text("c".to_string()));
    }

    #[test]
    fn test_destination_marker_and_unknown_word() {
        let tokens = tokenize(br"{\*\foo bar}");
        assert_eq!(tokens[1], Token::Destination);
        assert_eq!(word(&tokens[2]), Some((ControlWord::Unknown, None)));
    }

    #[test]
    fn test_invalid_input() {
        assert!(matches!(tokenize(br"abc\").last(), Some(Token::Invalid { .. })));
        assert!(matches!(tokenize(br"\'zz").last(), Some(Token::Invalid { .. })));
        assert!(matches!(tokenize(br"\b12345678901").last(), Some(Token::Invalid { .. })));
        let long = format!("\\{}", "a".repeat(40));
        assert!(matches!(tokenize(long.as_bytes()).last(), Some(Token::Invalid { .. })));
    }

    #[test]
    fn test_unicode_fallback_skip() {
        let mut lexer = Lexer::new(br"\u8364\'80 rest");
        let token = lexer.next_token(LexHint::default());
        assert_eq!(word(&token), Some((ControlWord::Unicode, Some(8364))));
        lexer.skip_unicode_fallback(1);
        assert_eq!(lexer.next_token(LexHint::default()), Token::Text(" rest".to_string()));
    }

    #[test]
    fn test_picture_data() {
        let mut lexer = Lexer::new(b"89 50\r\n4e47}");
        let hint = LexHint { picture_data: true };
        assert_eq!(lexer.next_token(hint), Token::PictureData);
        let mut out = Vec::new();
        lexer.write_picture_data(&mut out).unwrap();
        assert_eq!(out, vec![0x89, 0x50, 0x4e, 0x47]);
        assert_eq!(lexer.next_token(hint), Token::GroupEnd);
    }

    #[test]
    fn test_skip_binary() {
        let mut lexer = Lexer::new(b"\\bin3 \x00\x01\x02}");
        let token = lexer.next_token(LexHint::default());
        assert_eq!(word(&token), Some((ControlWord::Binary, Some(3))));
        lexer.skip_binary(3);
        assert_eq!(lexer.next_token(LexHint::default()), Token::GroupEnd);
    }
}
