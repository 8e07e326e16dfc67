//! Font and color tables populated from the document preamble.

use crate::common::encoding::charset_to_codepage;
use std::fmt;

/// Opaque RGB color.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Color {
    /// Formats as an opaque ARGB brush, `#FFRRGGBB`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#FF{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// The document color table.
///
/// Entries keep their RTF positions because the body refers to them by
/// index. An entry written as a bare `;` is "auto" and resolves to nothing.
#[derive(Debug, Clone, Default)]
pub struct ColorTable {
    entries: Vec<Option<Color>>,
    /// Components of the entry being defined
    pending: Option<Color>,
}

impl ColorTable {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a defined color.
    pub fn push(&mut self, color: Color) {
        self.entries.push(Some(color));
    }

    /// Set one component of the entry under construction.
    pub fn set_component(&mut self, channel: Channel, value: i64) {
        let value = value.clamp(0, 255) as u8;
        let color = self.pending.get_or_insert(Color::BLACK);
        match channel {
            Channel::Red => color.r = value,
            Channel::Green => color.g = value,
            Channel::Blue => color.b = value,
        }
    }

    /// Finish the entry under construction (the `;` terminator).
    pub fn finish_entry(&mut self) {
        let entry = self.pending.take();
        self.entries.push(entry);
    }

    /// Color at `index`; `None` for auto entries and out-of-range indices.
    pub fn get(&self, index: i64) -> Option<Color> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.entries.get(i).copied().flatten())
    }

    /// Index of an identical defined color, appending one if none exists.
    pub fn intern(&mut self, color: Color) -> usize {
        if let Some(index) = self.entries.iter().position(|e| *e == Some(color)) {
            return index;
        }
        self.entries.push(Some(color));
        self.entries.len() - 1
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Color channel keywords of the color table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Red,
    Green,
    Blue,
}

/// One font table entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FontTableEntry {
    /// `\fN` number
    pub index: i64,
    /// Face name without the trailing `;`
    pub name: String,
    /// Code page implied by `\fcharset` or set by `\cpg`
    pub code_page: Option<u32>,
    /// Set once the `;` terminator has been seen
    pub name_complete: bool,
}

/// The document font table.
#[derive(Debug, Clone, Default)]
pub struct FontTable {
    entries: Vec<FontTableEntry>,
    /// Position in `entries` of the entry under definition
    current: Option<usize>,
}

impl FontTable {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin (or redefine) the entry for `\fN` inside the font table.
    pub fn define_entry(&mut self, index: i64) -> &mut FontTableEntry {
        let position = match self.entries.iter().position(|e| e.index == index) {
            Some(position) => {
                self.entries[position] = FontTableEntry {
                    index,
                    ..Default::default()
                };
                position
            },
            None => {
                self.entries.push(FontTableEntry {
                    index,
                    ..Default::default()
                });
                self.entries.len() - 1
            },
        };
        self.current = Some(position);
        &mut self.entries[position]
    }

    /// The entry under definition.
    pub fn current_mut(&mut self) -> Option<&mut FontTableEntry> {
        self.current.and_then(|i| self.entries.get_mut(i))
    }

    /// Apply `\fcharset` to the entry under definition.
    pub fn set_current_charset(&mut self, charset: i64) {
        if let Some(entry) = self.current_mut()
            && let Some(code_page) = i32::try_from(charset).ok().and_then(charset_to_codepage)
        {
            entry.code_page = Some(code_page);
        }
    }

    /// Append face-name text to the entry under definition. A `;` ends the
    /// name; anything after it belongs to no entry.
    pub fn append_name(&mut self, text: &str) {
        let Some(entry) = self.current_mut() else {
            return;
        };
        if entry.name_complete {
            return;
        }
        match text.find(';') {
            Some(end) => {
                entry.name.push_str(&text[..end]);
                entry.name = entry.name.trim().to_string();
                entry.name_complete = true;
            },
            None => entry.name.push_str(text),
        }
    }

    /// Close the entry under definition (its group ended).
    pub fn finish_entry(&mut self) {
        if let Some(entry) = self.current_mut() {
            entry.name = entry.name.trim().to_string();
            entry.name_complete = true;
        }
        self.current = None;
    }

    pub fn get(&self, index: i64) -> Option<&FontTableEntry> {
        self.entries.iter().find(|e| e.index == index)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&FontTableEntry> {
        self.entries.iter().find(|e| e.name.eq_ignore_ascii_case(name))
    }

    /// Index of the font named `name`, adding an entry when there is none.
    pub fn merge(&mut self, name: &str, code_page: Option<u32>) -> i64 {
        if let Some(entry) = self.find_by_name(name) {
            return entry.index;
        }
        let index = self.entries.iter().map(|e| e.index).max().map_or(0, |m| m + 1);
        self.entries.push(FontTableEntry {
            index,
            name: name.to_string(),
            code_page,
            name_complete: true,
        });
        index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_table_entries() {
        let mut table = ColorTable::new();
        table.finish_entry();
        table.set_component(Channel::Red, 255);
        table.finish_entry();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(0), None);
        assert_eq!(table.get(1), Some(Color::rgb(255, 0, 0)));
        assert_eq!(table.get(7), None);
        assert_eq!(table.get(-1), None);
    }

    #[test]
    fn test_color_intern_dedups() {
        let mut table = ColorTable::new();
        table.push(Color::rgb(1, 2, 3));
        assert_eq!(table.intern(Color::rgb(1, 2, 3)), 0);
        assert_eq!(table.intern(Color::rgb(9, 9, 9)), 1);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_color_display() {
        assert_eq!(Color::rgb(255, 0, 16).to_string(), "#FFFF0010");
    }

    #[test]
    fn test_font_table_definition() {
        let mut fonts = FontTable::new();
        fonts.define_entry(0);
        fonts.set_current_charset(204);
        fonts.append_name("Times New ");
        fonts.append_name("Roman;");
        fonts.finish_entry();
        let entry = fonts.get(0).unwrap();
        assert_eq!(entry.name, "Times New Roman");
        assert_eq!(entry.code_page, Some(1251));

        // Redefinition replaces the entry
        fonts.define_entry(0);
        fonts.append_name("Arial;");
        fonts.finish_entry();
        assert_eq!(fonts.len(), 1);
        assert_eq!(fonts.get(0).unwrap().name, "Arial");
    }

    #[test]
    fn test_font_merge() {
        let mut fonts = FontTable::new();
        fonts.define_entry(3);
        fonts.append_name("Arial;");
        fonts.finish_entry();
        assert_eq!(fonts.merge("arial", None), 3);
        assert_eq!(fonts.merge("Symbol", None), 4);
        assert_eq!(fonts.find_by_name("Symbol").map(|e| e.index), Some(4));
    }
}
