//! Helpers shared by the lexer and the converter.

pub mod encoding;
pub mod unit;
