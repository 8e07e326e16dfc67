//! RTF to XAML flow document conversion.
//!
//! The converter keeps a stack of [`FormatState`]s, one per open RTF group,
//! and builds the output as a flat array of document nodes. Structural
//! decisions (which table cell or list item a paragraph belongs to) are made
//! lazily at paragraph, cell and row boundaries, and finished subtrees are
//! turned into markup as soon as nothing can change them.
//!
//! # Example
//!
//! ```rust
//! use rtfxaml::rtf::Lexer;
//! use rtfxaml::xaml::{ConvertOptions, MemoryImageSink, RtfToXamlReader};
//!
//! let mut images = MemoryImageSink::new();
//! let mut lexer = Lexer::new(br"{\rtf1\ansi{\b Bold} text\par}");
//! let xaml = RtfToXamlReader::new(ConvertOptions::default().with_force_paragraph(true))
//!     .with_image_sink(&mut images)
//!     .process(&mut lexer)
//!     .unwrap();
//! assert!(xaml.contains("<Paragraph"));
//! ```

mod columns;
pub mod convert;
mod field;
pub mod format;
mod handlers;
mod list;
pub mod list_table;
pub mod node;
mod node_array;
mod options;
mod picture;
mod reader;
mod reconcile;
mod state;
pub mod tables;

pub use convert::{MarkerStyle, color_to_use, marker_count_to_string};
pub use field::{FieldInstruction, SymbolEncoding};
pub use format::FormatState;
pub use list::{MarkerEntry, desired_markers, guess_marker};
pub use node_array::DocumentNodeArray;
pub use options::ConvertOptions;
pub use picture::{
    DirectoryImageSink, ImageFormat, ImageSink, ImageStream, MemoryImageSink, MetafileRasterizer, StoredImage,
};
pub use reader::RtfToXamlReader;
pub use tables::{Color, ColorTable, FontTable};
