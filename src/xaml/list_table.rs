//! List definition and list override tables (`\listtable`, `\listoverridetable`).

use super::convert::MarkerStyle;

/// One level of a list definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListLevel {
    pub marker: MarkerStyle,
    pub start_index: i64,
}

impl Default for ListLevel {
    fn default() -> Self {
        Self {
            marker: MarkerStyle::Arabic,
            start_index: 1,
        }
    }
}

/// A `\list` definition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListTableEntry {
    pub id: i64,
    pub template_id: i64,
    pub simple: bool,
    pub levels: Vec<ListLevel>,
}

impl ListTableEntry {
    /// Level for a 1-based virtual level; deeper levels reuse the last one.
    pub fn level(&self, level: usize) -> Option<&ListLevel> {
        if self.levels.is_empty() {
            return None;
        }
        let index = level.saturating_sub(1).min(self.levels.len() - 1);
        self.levels.get(index)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ListTable {
    entries: Vec<ListTableEntry>,
}

impl ListTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new definition; subsequent keywords apply to it.
    pub fn add_entry(&mut self) -> &mut ListTableEntry {
        self.entries.push(ListTableEntry::default());
        let last = self.entries.len() - 1;
        &mut self.entries[last]
    }

    pub fn current_mut(&mut self) -> Option<&mut ListTableEntry> {
        self.entries.last_mut()
    }

    /// Start a new level of the current definition.
    pub fn add_level(&mut self) -> Option<&mut ListLevel> {
        let entry = self.current_mut()?;
        entry.levels.push(ListLevel::default());
        entry.levels.last_mut()
    }

    pub fn current_level_mut(&mut self) -> Option<&mut ListLevel> {
        self.current_mut().and_then(|e| e.levels.last_mut())
    }

    pub fn find(&self, id: i64) -> Option<&ListTableEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A per-level override inside `\listoverride`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverrideLevel {
    /// `\listoverridestartat` was given
    pub overrides_start: bool,
    pub start_index: Option<i64>,
    pub marker: Option<MarkerStyle>,
}

/// A `\listoverride` entry mapping an `\ls` index to a list definition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOverride {
    /// `\listid` of the definition
    pub list_id: i64,
    /// `\ls` value paragraphs refer to
    pub index: i64,
    pub levels: Vec<OverrideLevel>,
}

impl ListOverride {
    /// Start index override for a 1-based level.
    pub fn start_index(&self, level: usize) -> Option<i64> {
        self.levels
            .get(level.saturating_sub(1))
            .filter(|l| l.overrides_start)
            .and_then(|l| l.start_index)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ListOverrideTable {
    entries: Vec<ListOverride>,
}

impl ListOverrideTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_entry(&mut self) -> &mut ListOverride {
        self.entries.push(ListOverride::default());
        let last = self.entries.len() - 1;
        &mut self.entries[last]
    }

    pub fn current_mut(&mut self) -> Option<&mut ListOverride> {
        self.entries.last_mut()
    }

    pub fn add_level(&mut self) -> Option<&mut OverrideLevel> {
        let entry = self.current_mut()?;
        entry.levels.push(OverrideLevel::default());
        entry.levels.last_mut()
    }

    pub fn current_level_mut(&mut self) -> Option<&mut OverrideLevel> {
        self.current_mut().and_then(|e| e.levels.last_mut())
    }

    /// Entry referenced by `\lsN`.
    pub fn find(&self, index: i64) -> Option<&ListOverride> {
        self.entries.iter().find(|e| e.index == index)
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
    fn test_level_lookup_clamps_to_last_level() {
        let mut table = ListTable::new();
        table.add_entry().id = 7;
        table.add_level();
        if let Some(level) = table.add_level() {
            level.marker = MarkerStyle::LowerAlpha;
        }
        let entry = table.find(7).unwrap();
        assert_eq!(entry.level(1).unwrap().marker, MarkerStyle::Arabic);
        assert_eq!(entry.level(2).unwrap().marker, MarkerStyle::LowerAlpha);
        assert_eq!(entry.level(9).unwrap().marker, MarkerStyle::LowerAlpha);
        assert!(table.find(8).is_none());
    }

    #[test]
    fn test_override_start_index() {
        let mut overrides = ListOverrideTable::new();
        let entry = overrides.add_entry();
        entry.list_id = 7;
        entry.index = 1;
        if let Some(level) = overrides.add_level() {
            level.start_index = Some(5);
        }
        if let Some(level) = overrides.add_level() {
            level.overrides_start = true;
            level.start_index = Some(9);
        }
        let entry = overrides.find(1).unwrap();
        assert_eq!(entry.start_index(1), None);
        assert_eq!(entry.start_index(2), Some(9));
    }
}
