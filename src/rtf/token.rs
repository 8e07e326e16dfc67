//! Token model and the token-source contract consumed by the converter.

use super::control::{ControlGroup, ControlWord, ControlWordInfo};
use std::io::{self, Write};

/// A control word together with its parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlToken {
    /// Keyword text as it appeared in the input
    pub name: String,
    /// Static metadata for the keyword
    pub info: &'static ControlWordInfo,
    /// Numeric parameter, if one was written
    pub parameter: Option<i32>,
}

impl ControlToken {
    #[inline]
    pub fn word(&self) -> ControlWord {
        self.info.control
    }

    #[inline]
    pub fn group(&self) -> ControlGroup {
        self.info.group
    }

    /// Parameter value, or `default` when none was written.
    #[inline]
    pub fn value_or(&self, default: i32) -> i32 {
        self.parameter.unwrap_or(default)
    }

    /// Toggle interpretation: no parameter or a nonzero one turns the
    /// property on.
    #[inline]
    pub fn toggle(&self) -> bool {
        self.parameter.is_none_or(|p| p != 0)
    }
}

/// One lexical unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// `{`
    GroupStart,
    /// `}`
    GroupEnd,
    /// A control word or an unrecognized control symbol
    Control(ControlToken),
    /// `\*`, the next keyword names an optional destination
    Destination,
    /// Decoded literal text
    Text(String),
    /// Hex picture payload follows; the caller must consume it with
    /// [`TokenSource::write_picture_data`] or [`TokenSource::skip_picture_data`].
    PictureData,
    /// End of input
    Eof,
    /// Lexical corruption
    Invalid {
        /// Byte offset of the offending construct
        offset: usize,
        /// What was wrong
        reason: &'static str,
    },
}

/// Destination-sensitive hints passed with every token request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LexHint {
    /// The current destination is a picture: hex digits are payload.
    pub picture_data: bool,
}

/// Supplier of tokens with the side-effecting calls the converter issues back.
pub trait TokenSource {
    /// Read the next token.
    fn next_token(&mut self, hint: LexHint) -> Token;

    /// Switch the code page used to decode 8-bit text.
    fn set_code_page(&mut self, code_page: u32);

    /// Skip `count` raw bytes following `\bin`.
    fn skip_binary(&mut self, count: usize);

    /// Discard pending hex picture data.
    fn skip_picture_data(&mut self);

    /// Skip the fallback representation that follows a `\u` keyword.
    fn skip_unicode_fallback(&mut self, count: usize);

    /// Decode pending hex picture data into `out`.
    fn write_picture_data(&mut self, out: &mut dyn Write) -> io::Result<()>;

    /// Current byte offset, for diagnostics.
    fn offset(&self) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rtf::control::lookup;

    #[test]
    fn test_toggle_semantics() {
        let mut token = ControlToken {
            name: "b".to_string(),
            info: lookup("b"),
            parameter: None,
        };
        assert!(token.toggle());
        token.parameter = Some(0);
        assert!(!token.toggle());
        assert_eq!(token.value_or(7), 0);
        assert_eq!(token.word(), ControlWord::Bold);
    }
}
