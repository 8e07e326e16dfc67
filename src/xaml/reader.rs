//! RTF to XAML conversion driver.

use super::options::ConvertOptions;
use super::picture::{ImageSink, MetafileRasterizer};
use super::state::ConverterState;
use crate::rtf::{RtfResult, TokenSource};
use tracing::debug;

/// Converts one RTF token stream into a XAML flow document fragment.
///
/// # Example
///
/// ```rust
/// use rtfxaml::rtf::Lexer;
/// use rtfxaml::xaml::{ConvertOptions, RtfToXamlReader};
///
/// let mut lexer = Lexer::new(br"{\rtf1\ansi Hello\par}");
/// let xaml = RtfToXamlReader::new(ConvertOptions::default())
///     .process(&mut lexer)
///     .unwrap();
/// assert!(xaml.starts_with("<Section"));
/// ```
pub struct RtfToXamlReader<'a> {
    options: ConvertOptions,
    images: Option<&'a mut dyn ImageSink>,
    rasterizer: Option<&'a dyn MetafileRasterizer>,
}

impl<'a> RtfToXamlReader<'a> {
    pub fn new(options: ConvertOptions) -> Self {
        Self {
            options,
            images: None,
            rasterizer: None,
        }
    }

    /// Store pictures in `sink`. Without a sink pictures are skipped.
    pub fn with_image_sink(mut self, sink: &'a mut dyn ImageSink) -> Self {
        self.images = Some(sink);
        self
    }

    /// Render EMF/WMF pictures with `rasterizer`.
    pub fn with_metafile_rasterizer(mut self, rasterizer: &'a dyn MetafileRasterizer) -> Self {
        self.rasterizer = Some(rasterizer);
        self
    }

    /// Run the conversion to the end of `source`.
    ///
    /// Fails only when the token source reports corrupt input or groups
    /// nest deeper than [`ConvertOptions::max_group_depth`].
    pub fn process(self, source: &mut dyn TokenSource) -> RtfResult<String> {
        let mut state = ConverterState::new(self.options, self.images, self.rasterizer);
        source.set_code_page(state.document_code_page);
        loop {
            let token = source.next_token(state.lex_hint());
            if !state.dispatch(token, source)? {
                break;
            }
        }
        if !state.stack.is_empty() {
            debug!(open = state.stack.len(), "closing unbalanced groups at end of input");
        }
        Ok(state.finish(source))
    }
}

impl Default for RtfToXamlReader<'_> {
    fn default() -> Self {
        Self::new(ConvertOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert;
    use crate::rtf::{Lexer, XamlStatus};
    use crate::xaml::picture::MemoryImageSink;
    use pretty_assertions::assert_eq;

    fn convert_with(rtf: &[u8], options: ConvertOptions) -> String {
        let mut lexer = Lexer::new(rtf);
        RtfToXamlReader::new(options).process(&mut lexer).unwrap()
    }

    #[test]
    fn test_inline_document() {
        let xaml = convert(br"{\rtf1\ansi Hello \b World\b0 !}").unwrap();
        assert!(xaml.starts_with("<Span xml:space=\"preserve\""));
        assert!(xaml.contains("Hello </Run>"));
        assert!(xaml.contains(r#"<Run FontWeight="Bold">World</Run>"#));
        assert!(xaml.contains("!</Run>"));
        assert!(xaml.ends_with("</Span>"));
        assert!(!xaml.contains("<Paragraph"));
    }

    #[test]
    fn test_paragraphs_make_a_section() {
        let xaml = convert(br"{\rtf1\ansi One\par Two}").unwrap();
        assert!(xaml.starts_with("<Section"));
        assert_eq!(xaml.matches("<Paragraph").count(), 2);
        assert!(xaml.ends_with("</Section>"));
    }

    #[test]
    fn test_force_paragraph() {
        let xaml = convert_with(br"{\rtf1 Hi}", ConvertOptions::default().with_force_paragraph(true));
        assert!(xaml.starts_with("<Section"));
        assert_eq!(xaml.matches("<Paragraph").count(), 1);
        assert!(xaml.contains("Hi</Run>"));
    }

    #[test]
    fn test_mismatched_rows_split_table() {
        let rtf = br"{\rtf1\ansi
\trowd\cellx2000\cellx4000\intbl A\cell B\cell\row
\trowd\cellx1000\cellx3000\intbl C\cell D\cell\row
\pard after\par}";
        let xaml = convert(rtf).unwrap();
        assert_eq!(xaml.matches("<Table ").count(), 2);
        assert_eq!(xaml.matches("<TableRow").count(), 2);
        assert_eq!(xaml.matches("<TableCell").count(), 4);
        assert!(xaml.contains("after</Run>"));
    }

    #[test]
    fn test_consistent_rows_share_table() {
        let rtf = br"{\rtf1\ansi
\trowd\cellx2000\cellx4000\intbl A\cell B\cell\row
\trowd\cellx2000\cellx4000\intbl C\cell D\cell\row
}";
        let xaml = convert(rtf).unwrap();
        assert_eq!(xaml.matches("<Table ").count(), 1);
        assert_eq!(xaml.matches("<TableColumn ").count(), 2);
    }

    #[test]
    fn test_nested_table() {
        let rtf = br"{\rtf1\ansi
\trowd\cellx4000\intbl Outer\par
\itap2 Inner\nestcell{\*\nesttableprops\trowd\cellx2000\nestrow}{\nonesttables\par}
\pard\intbl\itap1\cell\row
}";
        let xaml = convert(rtf).unwrap();
        assert_eq!(xaml.matches("<Table ").count(), 2);
        let inner = xaml.find("Inner").unwrap();
        let second_table = xaml.rfind("<Table ").unwrap();
        assert!(second_table < inner);
    }

    #[test]
    fn test_list_override_levels() {
        let rtf = br"{\rtf1\ansi
{\*\listtable{\list\listtemplateid1{\listlevel\levelnfc23\levelstartat1}{\listlevel\levelnfc1\levelstartat3}\listid10}}
{\*\listoverridetable{\listoverride\listid10\listoverridecount0\ls1}}
\pard\ls1 Top\par
\pard\ls1\ilvl1 Deep\par}";
        let xaml = convert(rtf).unwrap();
        assert_eq!(xaml.matches("<List ").count(), 2);
        assert!(xaml.contains(r#"MarkerStyle="Disc""#));
        assert!(xaml.contains(r#"MarkerStyle="UpperRoman" StartIndex="3""#));
    }

    #[test]
    fn test_legacy_bullets_form_one_list() {
        let rtf = br"{\rtf1\ansi{\fonttbl{\f0 Arial;}{\f1 Symbol;}}
\pard{\pntext\f1 \'b7\tab}{\*\pn\pnlvlblt\pnf1{\pntxtb\'b7}}\fi-360\li720 One\par
{\pntext\f1 \'b7\tab}{\*\pn\pnlvlblt\pnf1{\pntxtb\'b7}}\fi-360\li720 Two\par}";
        let xaml = convert(rtf).unwrap();
        assert_eq!(xaml.matches("<List ").count(), 1);
        assert_eq!(xaml.matches("<ListItem").count(), 2);
        assert!(xaml.contains(r#"MarkerStyle="Disc""#));
        assert!(!xaml.contains("\u{b7}"));
    }

    #[test]
    fn test_missing_brace_still_converts() {
        let xaml = convert(br"{\rtf1\ansi{\b Hello").unwrap();
        assert!(xaml.contains(r#"<Run FontWeight="Bold">Hello</Run>"#));
    }

    #[test]
    fn test_invalid_escape_fails() {
        let err = convert(br"{\rtf1 \'zz}").unwrap_err();
        assert_eq!(err.status(), XamlStatus::InvalidFormat);
    }

    #[test]
    fn test_group_depth_cap_fails() {
        let mut rtf = b"{\\rtf1".to_vec();
        rtf.extend(std::iter::repeat_n(b'{', 10));
        let mut lexer = Lexer::new(&rtf);
        let result = RtfToXamlReader::new(ConvertOptions::default().with_max_group_depth(5)).process(&mut lexer);
        assert!(result.is_err());
    }

    #[test]
    fn test_hyperlink_field() {
        let xaml = convert(br#"{\rtf1\ansi{\field{\*\fldinst HYPERLINK "http://example.com/"}{\fldrslt Example}}}"#).unwrap();
        assert!(xaml.contains(r#"NavigateUri="http://example.com/""#));
        assert!(xaml.contains("Example</Run></Hyperlink>"));
        assert!(!xaml.contains("HYPERLINK"));
    }

    #[test]
    fn test_unknown_field_keeps_result() {
        let xaml = convert(br"{\rtf1\ansi{\field{\*\fldinst PAGE}{\fldrslt 7}}}").unwrap();
        assert!(xaml.contains("7</Run>"));
        assert!(!xaml.contains("PAGE"));
    }

    #[test]
    fn test_hyperlink_result_across_paragraphs() {
        let xaml = convert(br#"{\rtf1\ansi{\field{\*\fldinst HYPERLINK "http://a.b/"}{\fldrslt one\par two}}\par}"#).unwrap();
        assert_eq!(xaml.matches("<Paragraph").count(), 2);
        assert_eq!(xaml.matches(r#"<Hyperlink NavigateUri="http://a.b/""#).count(), 2);
        assert!(xaml.contains("one</Run></Hyperlink></Paragraph>"));
        assert!(xaml.contains("two</Run></Hyperlink></Paragraph>"));
        assert!(!xaml.contains("HYPERLINK"));
    }

    #[test]
    fn test_hyperlink_result_in_grouped_paragraphs() {
        let rtf = br#"{\rtf1\ansi x\par{\field{\*\fldinst HYPERLINK "http://a.b/"}{\fldrslt {one\par}{two\par}}}}"#;
        let xaml = convert(rtf).unwrap();
        assert_eq!(xaml.matches("<Paragraph").count(), 3);
        assert_eq!(xaml.matches("<Hyperlink").count(), 2);
        assert!(xaml.contains("x</Run></Paragraph>"));
        assert!(xaml.contains("two</Run></Hyperlink></Paragraph>"));
    }

    #[test]
    fn test_symbol_field_with_font_and_size() {
        let xaml = convert(br#"{\rtf1\ansi{\field{\*\fldinst SYMBOL 65 \\f "Wingdings" \\s 10}{\fldrslt x}}}"#).unwrap();
        assert!(xaml.contains(r#"<Run FontFamily="Wingdings" FontSize="13.33">A</Run>"#));
        assert!(!xaml.contains("x</Run>"));
        assert!(!xaml.contains("SYMBOL"));
    }

    #[test]
    fn test_unwritten_character_properties_split_runs() {
        let xaml = convert(br"{\rtf1\ansi\deflangfe2052 a{\langfe1041 d}{\scaps b}{\up6 c}}").unwrap();
        assert_eq!(xaml.matches("</Run>").count(), 3);
        assert!(xaml.contains(">ad</Run>"));
        assert!(xaml.contains(">b</Run>"));
        assert!(xaml.contains(">c</Run>"));
        assert!(!xaml.contains("Typography"));
    }

    #[test]
    fn test_include_picture_field() {
        let rtf = br#"{\rtf1\ansi{\field{\*\fldinst INCLUDEPICTURE "http://x.org/a.png" \\* MERGEFORMATINET}{\fldrslt alt}}}"#;
        let xaml = convert(rtf).unwrap();
        assert!(xaml.contains(r#"<BitmapImage UriSource="http://x.org/a.png""#));
        assert!(!xaml.contains("alt</Run>"));
        assert!(!xaml.contains("INCLUDEPICTURE"));
    }

    #[test]
    fn test_skipped_destinations() {
        let xaml = convert(br"{\rtf1\ansi{\info{\title Secret}}{\*\generator Tool;}Body}").unwrap();
        assert!(xaml.contains("Body</Run>"));
        assert!(!xaml.contains("Secret"));
        assert!(!xaml.contains("Tool"));
    }

    #[test]
    fn test_shape_text_joins_document() {
        let rtf = br"{\rtf1\ansi{\shp{\*\shpinst{\sp{\sn fillColor}{\sv 255}}{\shptxt Boxed\par}}{\shprslt Fallback}}After\par}";
        let xaml = convert(rtf).unwrap();
        assert!(xaml.contains("Boxed</Run>"));
        assert!(xaml.contains("After</Run>"));
        assert!(!xaml.contains("Fallback"));
        assert!(!xaml.contains("fillColor"));
    }

    #[test]
    fn test_picture_goes_to_sink() {
        let mut sink = MemoryImageSink::new();
        let mut lexer = Lexer::new(br"{\rtf1{\pict\pngblip\picw2\pich1 89504e47}}");
        let xaml = RtfToXamlReader::new(ConvertOptions::default().with_image_uri_prefix("img/"))
            .with_image_sink(&mut sink)
            .process(&mut lexer)
            .unwrap();
        assert!(xaml.contains(r#"UriSource="img/image0.png""#));
        assert!(xaml.contains(r#"Width="2" Height="1""#));
        assert_eq!(sink.images().len(), 1);
        assert_eq!(sink.images()[0].data, vec![0x89, 0x50, 0x4e, 0x47]);
    }

    #[test]
    fn test_picture_without_sink_is_skipped() {
        let xaml = convert(br"{\rtf1{\pict\pngblip 89504e47}Text}").unwrap();
        assert!(!xaml.contains("Image"));
        assert!(xaml.contains("Text</Run>"));
    }

    #[test]
    fn test_negative_scale_drops_picture() {
        let mut sink = MemoryImageSink::new();
        let mut lexer = Lexer::new(br"{\rtf1{\pict\pngblip\picscalex-5 89504e47}Text}");
        let xaml = RtfToXamlReader::default()
            .with_image_sink(&mut sink)
            .process(&mut lexer)
            .unwrap();
        assert!(sink.images().is_empty());
        assert!(xaml.contains("Text</Run>"));
    }

    #[test]
    fn test_metafile_without_rasterizer_is_dropped() {
        let mut sink = MemoryImageSink::new();
        let mut lexer = Lexer::new(br"{\rtf1{\pict\wmetafile8\picw100\pich100 0102}}");
        let xaml = RtfToXamlReader::default()
            .with_image_sink(&mut sink)
            .process(&mut lexer)
            .unwrap();
        assert!(sink.images().is_empty());
        assert!(!xaml.contains("Image"));
    }

    struct FixedRasterizer;

    impl MetafileRasterizer for FixedRasterizer {
        fn rasterize(&self, _: crate::xaml::ImageFormat, data: &[u8], _: f64, _: f64) -> Option<Vec<u8>> {
            Some(data.iter().rev().copied().collect())
        }
    }

    #[test]
    fn test_metafile_is_rasterized() {
        let mut sink = MemoryImageSink::new();
        let rasterizer = FixedRasterizer;
        let mut lexer = Lexer::new(br"{\rtf1{\pict\emfblip 0102}}");
        let xaml = RtfToXamlReader::default()
            .with_image_sink(&mut sink)
            .with_metafile_rasterizer(&rasterizer)
            .process(&mut lexer)
            .unwrap();
        assert_eq!(sink.images()[0].format, crate::xaml::ImageFormat::Png);
        assert_eq!(sink.images()[0].data, vec![0x02, 0x01]);
        assert!(xaml.contains("image0.png"));
    }

    #[test]
    fn test_special_characters() {
        let xaml = convert(br"{\rtf1\ansi a\emdash b\tab c\u8364?}").unwrap();
        assert!(xaml.contains("a\u{2014}b\tc\u{20AC}</Run>"));
    }
}
