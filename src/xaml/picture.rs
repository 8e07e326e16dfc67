//! Embedded pictures and where their bytes go.
//!
//! Picture payloads are streamed straight from the token source into an
//! [`ImageSink`]; the converter only keeps the reference the sink hands
//! back. Metafiles have no markup representation and are only kept when a
//! [`MetafileRasterizer`] turns them into PNG.

use super::format::Destination;
use super::node::{DocumentNode, NodeType, TagWriter, XamlTag, close_tag};
use super::state::ConverterState;
use crate::common::unit::twip_to_positive_px;
use crate::rtf::TokenSource;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Picture payload encodings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    #[default]
    Unknown,
    Png,
    Jpeg,
    Emf,
    Wmf,
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Emf => "emf",
            ImageFormat::Wmf => "wmf",
            ImageFormat::Unknown => "bin",
        }
    }

    #[inline]
    pub fn is_metafile(self) -> bool {
        matches!(self, ImageFormat::Emf | ImageFormat::Wmf)
    }
}

/// An open destination for one image.
pub struct ImageStream<'a> {
    /// Reference written into the markup
    pub uri: String,
    pub writer: Box<dyn Write + 'a>,
}

/// Receives image payloads.
pub trait ImageSink {
    /// Open a stream for image number `index`. `Ok(None)` drops the image.
    fn open_image(&mut self, index: usize, format: ImageFormat) -> io::Result<Option<ImageStream<'_>>>;
}

/// Converts EMF/WMF data to PNG.
pub trait MetafileRasterizer {
    /// PNG bytes for the metafile, or `None` when it cannot be rendered.
    fn rasterize(&self, format: ImageFormat, data: &[u8], width_px: f64, height_px: f64) -> Option<Vec<u8>>;
}

/// One image captured by [`MemoryImageSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub uri: String,
    pub format: ImageFormat,
    pub data: Vec<u8>,
}

/// Keeps every image in memory.
#[derive(Debug, Default)]
pub struct MemoryImageSink {
    images: Vec<StoredImage>,
}

impl MemoryImageSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn images(&self) -> &[StoredImage] {
        &self.images
    }

    pub fn into_images(self) -> Vec<StoredImage> {
        self.images
    }
}

impl ImageSink for MemoryImageSink {
    fn open_image(&mut self, index: usize, format: ImageFormat) -> io::Result<Option<ImageStream<'_>>> {
        self.images.push(StoredImage {
            uri: image_file_name(index, format),
            format,
            data: Vec::new(),
        });
        let Some(image) = self.images.last_mut() else {
            return Ok(None);
        };
        Ok(Some(ImageStream {
            uri: image.uri.clone(),
            writer: Box::new(&mut image.data),
        }))
    }
}

/// Writes each image to its own file in a directory.
#[derive(Debug, Clone)]
pub struct DirectoryImageSink {
    directory: PathBuf,
}

impl DirectoryImageSink {
    pub fn new(directory: impl AsRef<Path>) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

impl ImageSink for DirectoryImageSink {
    fn open_image(&mut self, index: usize, format: ImageFormat) -> io::Result<Option<ImageStream<'_>>> {
        let name = image_file_name(index, format);
        let file = File::create(self.directory.join(&name))?;
        Ok(Some(ImageStream {
            uri: name,
            writer: Box::new(BufWriter::new(file)),
        }))
    }
}

fn image_file_name(index: usize, format: ImageFormat) -> String {
    let mut buf = itoa::Buffer::new();
    format!("image{}.{}", buf.format(index), format.extension())
}

/// Properties of the `\pict` group being read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PictureState {
    pub format: ImageFormat,
    /// `\picw`/`\pich`: pixels for bitmaps, 0.01 mm for metafiles
    pub width: i64,
    pub height: i64,
    /// `\picwgoal`/`\pichgoal`, twips
    pub goal_width: i64,
    pub goal_height: i64,
    /// Percent
    pub scale_x: i64,
    pub scale_y: i64,
    /// Payload already consumed
    pub done: bool,
}

impl Default for PictureState {
    fn default() -> Self {
        Self {
            format: ImageFormat::Unknown,
            width: 0,
            height: 0,
            goal_width: 0,
            goal_height: 0,
            scale_x: 100,
            scale_y: 100,
            done: false,
        }
    }
}

impl PictureState {
    /// Whether the payload can be converted at all.
    pub fn is_convertible(&self) -> bool {
        self.format != ImageFormat::Unknown && self.scale_x >= 0 && self.scale_y >= 0 && !self.done
    }

    /// Displayed size in pixels; zero when unknown.
    pub fn display_size(&self) -> (f64, f64) {
        (
            self.extent(self.goal_width, self.width, self.scale_x),
            self.extent(self.goal_height, self.height, self.scale_y),
        )
    }

    fn extent(&self, goal: i64, natural: i64, scale: i64) -> f64 {
        let px = if goal > 0 {
            twip_to_positive_px(goal as f64)
        } else if self.format.is_metafile() {
            // Hundredths of a millimetre
            natural.max(0) as f64 / 2540.0 * 96.0
        } else {
            natural.max(0) as f64
        };
        px * scale as f64 / 100.0
    }
}

/// Markup of an inline image.
pub fn image_markup(uri: &str, width: f64, height: f64) -> String {
    let mut out = String::new();
    TagWriter::open(&mut out, XamlTag::InlineUIContainer).finish();
    let mut image = TagWriter::open(&mut out, XamlTag::Image);
    if width > 0.0 {
        image.attr_px("Width", width);
    }
    if height > 0.0 {
        image.attr_px("Height", height);
    }
    image.attr("Stretch", "Fill");
    image.finish();
    TagWriter::open(&mut out, XamlTag::ImageSource).finish();
    let mut bitmap = TagWriter::open(&mut out, XamlTag::BitmapImage);
    bitmap.attr("UriSource", uri).attr("CacheOption", "OnLoad");
    bitmap.finish_empty();
    close_tag(&mut out, XamlTag::ImageSource);
    close_tag(&mut out, XamlTag::Image);
    close_tag(&mut out, XamlTag::InlineUIContainer);
    out
}

/// Open a stream for one image and fill it with `write`.
fn store_image(
    sink: &mut dyn ImageSink,
    index: usize,
    format: ImageFormat,
    write: impl FnOnce(&mut dyn Write) -> io::Result<()>,
) -> io::Result<Option<String>> {
    let Some(mut stream) = sink.open_image(index, format)? else {
        return Ok(None);
    };
    write(&mut stream.writer)?;
    stream.writer.flush()?;
    Ok(Some(stream.uri))
}

impl ConverterState<'_> {
    /// Hex payload of the current `\pict`. The payload is always consumed;
    /// an image node is added only when the sink stored it.
    pub(crate) fn handle_picture_data(&mut self, source: &mut dyn TokenSource) {
        let picture = match self.picture {
            Some(picture) if picture.is_convertible() && self.top().dest == Destination::Picture => picture,
            _ => {
                source.skip_picture_data();
                return;
            },
        };
        if let Some(current) = self.picture.as_mut() {
            current.done = true;
        }
        let index = self.image_index;
        let (width, height) = picture.display_size();
        let Some(sink) = self.images.as_deref_mut() else {
            source.skip_picture_data();
            return;
        };
        self.image_index += 1;

        let stored = if picture.format.is_metafile() {
            let mut data = Vec::new();
            if let Err(err) = source.write_picture_data(&mut data) {
                warn!(%err, "reading metafile picture failed");
                source.skip_picture_data();
                return;
            }
            let Some(png) = self
                .rasterizer
                .and_then(|r| r.rasterize(picture.format, &data, width, height))
            else {
                debug!(index, "metafile picture dropped");
                return;
            };
            store_image(sink, index, ImageFormat::Png, |w| w.write_all(&png))
        } else {
            store_image(sink, index, picture.format, |w| source.write_picture_data(w))
        };

        let uri = match stored {
            Ok(Some(uri)) => uri,
            Ok(None) => {
                debug!(index, "image sink declined picture");
                source.skip_picture_data();
                return;
            },
            Err(err) => {
                warn!(%err, index, "writing picture failed");
                source.skip_picture_data();
                return;
            },
        };
        let uri = format!("{}{}", self.options.image_uri_prefix, uri);
        let mut node = DocumentNode::leaf(NodeType::Image, self.top().clone());
        node.content = image_markup(&uri, width, height);
        self.nodes.push(node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_collects_bytes() {
        let mut sink = MemoryImageSink::new();
        {
            let mut stream = sink.open_image(0, ImageFormat::Png).unwrap().unwrap();
            assert_eq!(stream.uri, "image0.png");
            stream.writer.write_all(&[0x89, b'P']).unwrap();
        }
        assert_eq!(sink.images()[0].data, vec![0x89, b'P']);
    }

    #[test]
    fn test_directory_sink_writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = DirectoryImageSink::new(dir.path());
        {
            let mut stream = sink.open_image(3, ImageFormat::Jpeg).unwrap().unwrap();
            stream.writer.write_all(b"jpeg").unwrap();
            stream.writer.flush().unwrap();
        }
        let written = std::fs::read(dir.path().join("image3.jpg")).unwrap();
        assert_eq!(written, b"jpeg");
    }

    #[test]
    fn test_display_size() {
        let picture = PictureState {
            format: ImageFormat::Png,
            width: 200,
            goal_height: 1440,
            scale_y: 50,
            ..Default::default()
        };
        assert_eq!(picture.display_size(), (200.0, 48.0));
        assert!(picture.is_convertible());
        assert!(!PictureState::default().is_convertible());
    }

    #[test]
    fn test_image_markup() {
        assert_eq!(
            image_markup("a.png", 10.0, 0.0),
            r#"<InlineUIContainer><Image Width="10" Stretch="Fill"><Image.Source><BitmapImage UriSource="a.png" CacheOption="OnLoad" /></Image.Source></Image></InlineUIContainer>"#
        );
    }
}
