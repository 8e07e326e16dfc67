//! rtfxaml - Convert Rich Text Format documents into XAML flow content
//!
//! The library reads RTF with a byte-level lexer and produces a single
//! XAML fragment: a `<Section>` of paragraphs, lists and tables, or a bare
//! `<Span>` when the document holds only inline text.
//!
//! # Features
//!
//! - **Character and paragraph formatting**: fonts, sizes, colors, shading,
//!   indents, spacing, alignment, borders and text direction
//! - **Tables**: nested tables, merged cells and rows with inconsistent
//!   cell boundaries (split into separate tables)
//! - **Lists**: Word 97+ list tables with overrides and legacy `\pn`
//!   numbering, including resumed lists
//! - **Fields**: `HYPERLINK`, `SYMBOL` and `INCLUDEPICTURE`
//! - **Pictures**: PNG/JPEG payloads streamed to an [`xaml::ImageSink`];
//!   metafiles through an optional [`xaml::MetafileRasterizer`]
//!
//! # Example - Converting a document
//!
//! ```rust
//! let xaml = rtfxaml::convert(br"{\rtf1\ansi Hello \b World\b0 !}").unwrap();
//! assert!(xaml.contains(r#"<Run FontWeight="Bold">World</Run>"#));
//! ```
//!
//! # Example - Options and images
//!
//! ```no_run
//! use rtfxaml::rtf::Lexer;
//! use rtfxaml::xaml::{ConvertOptions, DirectoryImageSink, RtfToXamlReader};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let input = std::fs::read("document.rtf")?;
//! let mut images = DirectoryImageSink::new("images");
//! let options = ConvertOptions::default()
//!     .with_force_paragraph(true)
//!     .with_image_uri_prefix("images/");
//!
//! let mut lexer = Lexer::new(&input);
//! let xaml = RtfToXamlReader::new(options)
//!     .with_image_sink(&mut images)
//!     .process(&mut lexer)?;
//! println!("{}", xaml);
//! # Ok(())
//! # }
//! ```

/// Encoding and unit helpers shared by the lexer and the converter
pub mod common;

/// RTF tokenization
pub mod rtf;

/// Conversion to XAML
pub mod xaml;

pub use rtf::{RtfError, RtfResult, XamlStatus};
pub use xaml::{ConvertOptions, RtfToXamlReader};

/// Convert an RTF document with default options.
///
/// Pictures are skipped; use [`RtfToXamlReader`] with an image sink to keep
/// them.
pub fn convert(rtf: &[u8]) -> RtfResult<String> {
    let mut lexer = rtf::Lexer::new(rtf);
    RtfToXamlReader::default().process(&mut lexer)
}
