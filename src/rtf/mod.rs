//! RTF (Rich Text Format) tokenization.
//!
//! This module turns raw RTF bytes into a stream of [`Token`]s. The converter
//! in [`crate::xaml`] consumes tokens through the [`TokenSource`] trait, so a
//! different tokenizer can be plugged in; [`Lexer`] is the byte-level
//! implementation used by [`crate::convert`].
//!
//! # Example
//!
//! ```rust
//! use rtfxaml::rtf::{LexHint, Lexer, Token, TokenSource};
//!
//! let mut lexer = Lexer::new(br"{\rtf1 Hi}");
//! assert_eq!(lexer.next_token(LexHint::default()), Token::GroupStart);
//! ```

pub mod control;
mod error;
mod lexer;
mod token;

// Re-exports
pub use control::{ControlFlags, ControlGroup, ControlWord, ControlWordInfo};
pub use error::{RtfError, RtfResult, XamlStatus};
pub use lexer::Lexer;
pub use token::{ControlToken, LexHint, Token, TokenSource};
