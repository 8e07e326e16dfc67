//! Configuration for RTF to XAML conversion.

use crate::common::encoding::DEFAULT_CODE_PAGE;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Configuration options for a conversion.
///
/// # Examples
///
/// ```rust
/// use rtfxaml::xaml::ConvertOptions;
///
/// let options = ConvertOptions::new()
///     .with_force_paragraph(true)
///     .with_max_group_depth(256);
/// assert!(options.force_paragraph);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// Always emit a block root and wrap trailing inline content in a paragraph
    pub force_paragraph: bool,
    /// Group nesting cap; deeper input is rejected as malformed
    pub max_group_depth: usize,
    /// Levels a paragraph may open beyond the matched list prefix
    pub max_list_level_jump: usize,
    /// Resume the last closed list when a numbered paragraph follows
    /// intervening non-list paragraphs
    pub resume_lists: bool,
    /// Code page for documents that declare none
    pub default_code_page: u32,
    /// Font name substitutions applied when emitting `FontFamily`
    pub font_substitutes: HashMap<String, String>,
    /// Prefix for image references returned by the image sink
    pub image_uri_prefix: String,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            force_paragraph: false,
            max_group_depth: 1024,
            max_list_level_jump: 1,
            resume_lists: true,
            default_code_page: DEFAULT_CODE_PAGE,
            font_substitutes: HashMap::new(),
            image_uri_prefix: String::new(),
        }
    }
}

impl ConvertOptions {
    /// Create options with default values.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether a block root is always produced.
    #[inline]
    pub fn with_force_paragraph(mut self, force: bool) -> Self {
        self.force_paragraph = force;
        self
    }

    /// Set the group nesting cap.
    #[inline]
    pub fn with_max_group_depth(mut self, depth: usize) -> Self {
        self.max_group_depth = depth;
        self
    }

    /// Set how many list levels a paragraph may open at once.
    #[inline]
    pub fn with_max_list_level_jump(mut self, jump: usize) -> Self {
        self.max_list_level_jump = jump.max(1);
        self
    }

    /// Enable or disable resumption of interrupted lists.
    #[inline]
    pub fn with_resume_lists(mut self, resume: bool) -> Self {
        self.resume_lists = resume;
        self
    }

    /// Set the code page for documents that declare none.
    #[inline]
    pub fn with_default_code_page(mut self, code_page: u32) -> Self {
        self.default_code_page = code_page;
        self
    }

    /// Add a font name substitution.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rtfxaml::xaml::ConvertOptions;
    ///
    /// let options = ConvertOptions::new().with_font_substitute("Helv", "Arial");
    /// assert_eq!(options.substitute_font("Helv"), "Arial");
    /// assert_eq!(options.substitute_font("Courier"), "Courier");
    /// ```
    pub fn with_font_substitute(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.font_substitutes.insert(from.into(), to.into());
        self
    }

    /// Set the prefix prepended to image references.
    #[inline]
    pub fn with_image_uri_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.image_uri_prefix = prefix.into();
        self
    }

    /// Map a font name through the substitution table.
    pub fn substitute_font<'a>(&'a self, name: &'a str) -> &'a str {
        self.font_substitutes.get(name).map_or(name, String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ConvertOptions::default();
        assert!(!options.force_paragraph);
        assert_eq!(options.max_group_depth, 1024);
        assert_eq!(options.max_list_level_jump, 1);
        assert!(options.resume_lists);
        assert_eq!(options.default_code_page, 1252);
    }

    #[test]
    fn test_partial_yaml() {
        let options: ConvertOptions =
            serde_saphyr::from_str("force_paragraph: true\nmax_group_depth: 64\n").unwrap();
        assert!(options.force_paragraph);
        assert_eq!(options.max_group_depth, 64);
        assert!(options.resume_lists);
    }
}
