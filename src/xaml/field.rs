//! Fields: `{\field{\*\fldinst ...}{\fldrslt ...}}`.
//!
//! While a field is being read its parts are delimited by begin/end marker
//! nodes. When the field group closes, the instruction text is parsed, the
//! markers and the instruction are excised and the result is rewritten
//! according to the instruction.

use super::convert::clamp_font_size;
use super::node::{DocumentNode, FieldKind, NodeId, NodeType};
use super::picture::image_markup;
use super::state::ConverterState;
use crate::common::encoding::{DEFAULT_CODE_PAGE, decode_with_codepage};
use smallvec::SmallVec;
use tracing::debug;

/// How a `SYMBOL` character code is encoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SymbolEncoding {
    /// `\a`, the default
    #[default]
    Ansi,
    /// `\u`
    Unicode,
    /// `\j`
    ShiftJis,
}

/// A parsed field instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldInstruction {
    Hyperlink {
        uri: String,
        /// `\t` target frame
        target: String,
    },
    Symbol {
        code: u32,
        font: Option<String>,
        /// `\s`, points
        size: Option<f64>,
        encoding: SymbolEncoding,
    },
    IncludePicture {
        uri: Option<String>,
    },
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Arg {
    Switch(char),
    Value(String),
}

fn tokenize(text: &str) -> SmallVec<[Arg; 8]> {
    let mut args = SmallVec::new();
    let mut chars = text.chars().peekable();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if c == '"' {
            chars.next();
            let mut value = String::new();
            while let Some(c) = chars.next() {
                match c {
                    '"' => break,
                    '\\' if matches!(chars.peek(), Some('\\' | '"')) => {
                        value.extend(chars.next());
                    },
                    c => value.push(c),
                }
            }
            args.push(Arg::Value(value));
            continue;
        }
        if c == '\\' {
            chars.next();
            match chars.peek() {
                Some(&s) if s.is_ascii_alphabetic() => {
                    chars.next();
                    args.push(Arg::Switch(s.to_ascii_lowercase()));
                    continue;
                },
                _ => {},
            }
        }
        let mut value = String::new();
        while let Some(&c) = chars.peek() {
            if c.is_whitespace() {
                break;
            }
            chars.next();
            if c == '\\' && chars.peek() == Some(&'\\') {
                chars.next();
            }
            value.push(c);
        }
        args.push(Arg::Value(value));
    }
    args
}

fn parse_code(text: &str) -> Option<u32> {
    let text = text.trim();
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => atoi_simd::parse::<u32, false, false>(text.as_bytes()).ok(),
    }
}

impl FieldInstruction {
    /// Parse instruction text such as `HYPERLINK "http://x" \t "_blank"`.
    pub fn parse(text: &str) -> Self {
        let args = tokenize(text);
        let Some(Arg::Value(keyword)) = args.first() else {
            return FieldInstruction::Other;
        };
        let rest = &args[1..];
        match keyword.to_ascii_uppercase().as_str() {
            "HYPERLINK" => Self::parse_hyperlink(rest),
            "SYMBOL" => Self::parse_symbol(rest),
            "INCLUDEPICTURE" => FieldInstruction::IncludePicture {
                uri: rest.iter().find_map(|a| match a {
                    Arg::Value(v) => v.find("http:").or_else(|| v.find("https:")).map(|at| v[at..].to_string()),
                    Arg::Switch(_) => None,
                }),
            },
            _ => FieldInstruction::Other,
        }
    }

    fn parse_hyperlink(args: &[Arg]) -> Self {
        let mut uri = String::new();
        let mut bookmark = String::new();
        let mut target = String::new();
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg {
                Arg::Value(v) if uri.is_empty() => uri = v.clone(),
                Arg::Value(_) => {},
                Arg::Switch(s) => {
                    let value = match s {
                        'l' | 't' | 'o' => match iter.next() {
                            Some(Arg::Value(v)) => v.clone(),
                            _ => continue,
                        },
                        _ => continue,
                    };
                    match s {
                        'l' => bookmark = value,
                        't' => target = value,
                        _ => {},
                    }
                },
            }
        }
        if !bookmark.is_empty() {
            uri.push('#');
            uri.push_str(&bookmark);
        }
        FieldInstruction::Hyperlink { uri, target }
    }

    fn parse_symbol(args: &[Arg]) -> Self {
        let mut code = None;
        let mut font = None;
        let mut size = None;
        let mut encoding = SymbolEncoding::Ansi;
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg {
                Arg::Value(v) if code.is_none() => code = parse_code(v),
                Arg::Value(_) => {},
                Arg::Switch('f') => {
                    if let Some(Arg::Value(v)) = iter.next() {
                        font = Some(v.clone());
                    }
                },
                Arg::Switch('s') => {
                    if let Some(Arg::Value(v)) = iter.next() {
                        size = fast_float2::parse::<f64, _>(v.as_str()).ok();
                    }
                },
                Arg::Switch('a') => encoding = SymbolEncoding::Ansi,
                Arg::Switch('u') => encoding = SymbolEncoding::Unicode,
                Arg::Switch('j') => encoding = SymbolEncoding::ShiftJis,
                Arg::Switch(_) => {},
            }
        }
        match code {
            Some(code) => FieldInstruction::Symbol {
                code,
                font,
                size,
                encoding,
            },
            None => FieldInstruction::Other,
        }
    }
}

/// The character a `SYMBOL` field stands for.
pub fn symbol_text(code: u32, encoding: SymbolEncoding) -> Option<String> {
    match encoding {
        SymbolEncoding::Unicode => char::from_u32(code).map(String::from),
        SymbolEncoding::ShiftJis => {
            let bytes: SmallVec<[u8; 2]> = if code > 0xFF {
                [(code >> 8) as u8, code as u8].into_iter().collect()
            } else {
                [code as u8].into_iter().collect()
            };
            Some(decode_with_codepage(&bytes, 932))
        },
        SymbolEncoding::Ansi if code <= 0xFF => Some(decode_with_codepage(&[code as u8], DEFAULT_CODE_PAGE)),
        SymbolEncoding::Ansi => char::from_u32(code).map(String::from),
    }
    .filter(|s| !s.is_empty())
}

impl ConverterState<'_> {
    /// The `\field` group closed.
    pub(crate) fn process_field(&mut self) {
        self.open_fields = self.open_fields.saturating_sub(1);
        let Some(begin) = self.nodes.find_unmatched_begin(FieldKind::Field) else {
            debug!("field without a begin marker");
            return;
        };
        let field_format = self.nodes.at(begin).format.clone();
        let instruction = FieldInstruction::parse(&self.instruction_text(begin));
        self.strip_markers(begin);

        let end = self.nodes.len();
        if begin >= end {
            return;
        }
        match instruction {
            FieldInstruction::Hyperlink { uri, target } if !uri.is_empty() => {
                let mut link = DocumentNode::leaf(NodeType::Hyperlink, field_format);
                link.custom = uri;
                link.content = target;
                self.link_result(begin, link);
            },
            FieldInstruction::Symbol {
                code,
                font,
                size,
                encoding,
            } if self.result_is_flat(begin) => {
                let Some(text) = symbol_text(code, encoding) else {
                    return;
                };
                let mut format = field_format;
                if let Some(name) = font {
                    format.font = self.fonts.merge(&name, None);
                }
                if let Some(points) = size {
                    format.font_size = clamp_font_size((points * 2.0).round() as i64);
                }
                self.nodes.excise(begin, end - begin);
                self.nodes.push(DocumentNode::text(format, &text));
            },
            FieldInstruction::IncludePicture { uri: Some(uri) } if self.result_is_flat(begin) => {
                let has_image = (begin..end).any(|p| self.nodes.at(p).node_type == NodeType::Image);
                if !has_image {
                    self.nodes.excise(begin, end - begin);
                    let mut image = DocumentNode::leaf(NodeType::Image, field_format);
                    image.content = image_markup(&uri, 0.0, 0.0);
                    self.nodes.push(image);
                }
            },
            _ => {},
        }
    }

    fn instruction_text(&self, begin: usize) -> String {
        let mut text = String::new();
        let mut inside = false;
        for position in begin..self.nodes.len() {
            let node = self.nodes.at(position);
            match (node.node_type, node.field_kind) {
                (NodeType::FieldBegin, Some(FieldKind::Instruction)) => inside = true,
                (NodeType::FieldEnd, Some(FieldKind::Instruction)) => inside = false,
                (NodeType::Text, _) if inside => text.push_str(&node.content),
                _ => {},
            }
        }
        text
    }

    /// Every node from `begin` on is a closed top-level sibling of it.
    fn result_is_flat(&self, begin: usize) -> bool {
        let mut position = begin;
        while position < self.nodes.len() {
            let node = self.nodes.at(position);
            if node.pending || node.parent.is_some() {
                return false;
            }
            position = self.nodes.span_end(position);
        }
        true
    }

    /// Excise the markers and the instruction, wherever paragraphs, cells
    /// or list items placed them.
    fn strip_markers(&mut self, begin: usize) {
        let mut doomed: SmallVec<[(usize, usize); 16]> = SmallVec::new();
        let mut inside = false;
        let mut position = begin;
        while position < self.nodes.len() {
            let node = self.nodes.at(position);
            if node.node_type.is_field_marker() {
                match (node.node_type, node.field_kind) {
                    (NodeType::FieldBegin, Some(FieldKind::Instruction)) => inside = true,
                    (NodeType::FieldEnd, Some(FieldKind::Instruction)) => inside = false,
                    _ => {},
                }
                doomed.push((position, 1));
                position += 1;
            } else if inside && !node.pending {
                let end = self.nodes.span_end(position);
                doomed.push((position, end - position));
                position = end;
            } else {
                position += 1;
            }
        }
        // Back to front so earlier positions stay valid
        for (position, count) in doomed.into_iter().rev() {
            self.nodes.excise(position, count);
        }
    }

    /// Wrap the result from `begin` on in `link`: once when it is a single
    /// inline run, otherwise around the content of each paragraph and each
    /// loose inline run.
    fn link_result(&mut self, begin: usize, link: DocumentNode) {
        let mut ranges: SmallVec<[(usize, usize); 8]> = SmallVec::new();
        // (start, end, parent) of the inline run being collected
        let mut run: Option<(usize, usize, Option<NodeId>)> = None;
        let mut position = begin;
        while position < self.nodes.len() {
            let node = self.nodes.at(position);
            let end = self.nodes.span_end(position);
            if !node.pending && node.is_inline() {
                let extends = run.is_some_and(|(_, run_end, parent)| run_end == position && parent == node.parent);
                if extends {
                    if let Some(current) = run.as_mut() {
                        current.1 = end;
                    }
                } else if let Some((start, run_end, _)) = run.replace((position, end, node.parent)) {
                    ranges.push((start, run_end - start));
                }
                position = end;
            } else if node.node_type == NodeType::Paragraph && !node.pending {
                if node.terminated {
                    debug!(position, "paragraph already written, hyperlink not applied");
                } else if node.child_count > 0 {
                    ranges.push((position + 1, node.child_count));
                }
                position = end;
            } else {
                position += 1;
            }
        }
        if let Some((start, run_end, _)) = run {
            ranges.push((start, run_end - start));
        }

        ranges.sort_unstable_by(|a, b| b.0.cmp(&a.0));
        for (start, span) in ranges {
            self.nodes.wrap(start, span, link.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hyperlink() {
        let parsed = FieldInstruction::parse(r#" HYPERLINK "http://example.com/a b" \l "top" \t "_blank" "#);
        assert_eq!(
            parsed,
            FieldInstruction::Hyperlink {
                uri: "http://example.com/a b#top".to_string(),
                target: "_blank".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_hyperlink_unescapes_backslashes() {
        let parsed = FieldInstruction::parse(r#"HYPERLINK "C:\\docs\\x.rtf""#);
        assert_eq!(
            parsed,
            FieldInstruction::Hyperlink {
                uri: r"C:\docs\x.rtf".to_string(),
                target: String::new(),
            }
        );
    }

    #[test]
    fn test_parse_symbol() {
        let parsed = FieldInstruction::parse(r#"SYMBOL 0xF0B7 \f "Symbol" \s 10.5 \u"#);
        assert_eq!(
            parsed,
            FieldInstruction::Symbol {
                code: 0xF0B7,
                font: Some("Symbol".to_string()),
                size: Some(10.5),
                encoding: SymbolEncoding::Unicode,
            }
        );
        assert_eq!(
            FieldInstruction::parse("SYMBOL 65"),
            FieldInstruction::Symbol {
                code: 65,
                font: None,
                size: None,
                encoding: SymbolEncoding::Ansi,
            }
        );
        assert_eq!(FieldInstruction::parse("SYMBOL"), FieldInstruction::Other);
    }

    #[test]
    fn test_parse_include_picture_and_other() {
        assert_eq!(
            FieldInstruction::parse(r#"INCLUDEPICTURE "see http://x.org/a.png" \* MERGEFORMATINET"#),
            FieldInstruction::IncludePicture {
                uri: Some("http://x.org/a.png".to_string()),
            }
        );
        assert_eq!(FieldInstruction::parse(r#"PAGE \* MERGEFORMAT"#), FieldInstruction::Other);
        assert_eq!(FieldInstruction::parse(""), FieldInstruction::Other);
    }

    #[test]
    fn test_symbol_text() {
        assert_eq!(symbol_text(65, SymbolEncoding::Ansi).as_deref(), Some("A"));
        assert_eq!(symbol_text(0x93, SymbolEncoding::Ansi).as_deref(), Some("\u{201C}"));
        assert_eq!(symbol_text(0x263A, SymbolEncoding::Unicode).as_deref(), Some("\u{263A}"));
        assert_eq!(symbol_text(0xD800, SymbolEncoding::Unicode), None);
    }
}
