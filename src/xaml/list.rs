//! List membership of paragraphs.
//!
//! RTF never says "a list starts here". Every paragraph carries enough hints
//! (`\ls`/`\ilvl`, legacy `\pn` settings, a rendered `\listtext` marker) to
//! work out the chain of list markers it wants, and the converter compares
//! that chain with the lists currently open when the paragraph ends.

use super::convert::MarkerStyle;
use super::format::FormatState;
use super::list_table::{ListOverrideTable, ListTable};
use super::node::{DocumentNode, NodeId, NodeType};
use super::node_array::DocumentNodeArray;
use super::options::ConvertOptions;
use smallvec::SmallVec;
use tracing::{debug, trace};

/// One level of a list marker chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerEntry {
    pub marker: MarkerStyle,
    /// `\ls` of the paragraph that opened the level, -1 for legacy lists
    pub ils: i64,
    pub start_index: i64,
}

impl MarkerEntry {
    /// Whether a paragraph wanting `other` belongs to the list at this level.
    #[inline]
    pub fn same_list(&self, other: &MarkerEntry) -> bool {
        self.marker == other.marker && self.ils == other.ils
    }
}

pub type MarkerList = SmallVec<[MarkerEntry; 4]>;

/// Marker chain a paragraph wants, outermost level first.
///
/// `marker_text` is the text of the paragraph's `\listtext`, if any.
pub fn desired_markers(
    format: &FormatState,
    lists: &ListTable,
    overrides: &ListOverrideTable,
    marker_text: Option<&str>,
) -> MarkerList {
    let mut want = MarkerList::new();
    let level = format.virtual_list_level();
    if level <= 0 {
        return want;
    }
    let level = level as usize;

    if format.ils > 0 {
        let definition = overrides
            .find(format.ils)
            .and_then(|o| lists.find(o.list_id).map(|l| (o, l)));
        if definition.is_none() {
            debug!(ils = format.ils, "paragraph refers to an unknown list");
        }
        for n in 1..=level {
            let (marker, start_index) = match definition {
                Some((over, list)) => {
                    let defined = list.level(n);
                    let marker = over
                        .levels
                        .get(n - 1)
                        .and_then(|l| l.marker)
                        .or(defined.map(|l| l.marker))
                        .unwrap_or(MarkerStyle::Arabic);
                    let start = over
                        .start_index(n)
                        .or(defined.map(|l| l.start_index))
                        .unwrap_or(1);
                    (marker, start)
                },
                None => (marker_text.map_or(MarkerStyle::Arabic, guess_marker), 1),
            };
            let marker = if marker == MarkerStyle::Hidden && format.listtext_seen {
                MarkerStyle::Bullet
            } else {
                marker
            };
            want.push(MarkerEntry {
                marker,
                ils: format.ils,
                start_index,
            });
        }
    } else if format.old_list.level > 0 {
        let marker = match format.old_list.marker {
            MarkerStyle::None => MarkerStyle::Arabic,
            marker => marker,
        };
        for n in 1..=level {
            want.push(MarkerEntry {
                marker,
                ils: -1,
                start_index: if n == level { format.old_list.start } else { 1 },
            });
        }
    } else {
        want.push(MarkerEntry {
            marker: marker_text.map_or(MarkerStyle::Bullet, guess_marker),
            ils: -1,
            start_index: 1,
        });
    }
    want
}

/// Marker style implied by rendered marker text such as `"3."` or `"iv)"`.
pub fn guess_marker(text: &str) -> MarkerStyle {
    let word: String = text
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect();
    let Some(first) = word.chars().next() else {
        return MarkerStyle::Bullet;
    };
    let roman = word
        .chars()
        .all(|c| matches!(c.to_ascii_uppercase(), 'I' | 'V' | 'X' | 'L' | 'C' | 'D' | 'M'));
    if first.is_ascii_digit() {
        MarkerStyle::Arabic
    } else if first.is_ascii_lowercase() {
        let lower = word.chars().all(|c| c.is_ascii_lowercase());
        // A lone letter is only roman when it is "i"
        if lower && roman && (word.len() > 1 || word == "i") {
            MarkerStyle::LowerRoman
        } else {
            MarkerStyle::LowerAlpha
        }
    } else {
        let upper = word.chars().all(|c| c.is_ascii_uppercase());
        if upper && roman && (word.len() > 1 || word == "I") {
            MarkerStyle::UpperRoman
        } else {
            MarkerStyle::UpperAlpha
        }
    }
}

/// Lists open in the current scope, outermost first.
#[derive(Debug, Default)]
pub(crate) struct OpenLists {
    pub lists: SmallVec<[NodeId; 4]>,
    pub markers: MarkerList,
    /// Pending container that bounds the scope
    pub floor: Option<usize>,
}

fn common_prefix(have: &[MarkerEntry], want: &[MarkerEntry]) -> usize {
    have.iter().zip(want).take_while(|(h, w)| h.same_list(w)).count()
}

impl DocumentNodeArray {
    pub(crate) fn open_lists(&self) -> OpenLists {
        let mut open = OpenLists::default();
        for &id in self.open_nodes().iter().rev() {
            let node = self.get(id);
            match node.node_type {
                NodeType::List => open.lists.push(id),
                NodeType::Cell | NodeType::Row | NodeType::TableBody | NodeType::Table | NodeType::Shape => {
                    open.floor = Some(node.index);
                    break;
                },
                _ => {},
            }
        }
        open.lists.reverse();
        open.markers = open.lists.iter().map(|&id| self.list_entry(id)).collect();
        open
    }

    fn list_entry(&self, id: NodeId) -> MarkerEntry {
        let node = self.get(id);
        MarkerEntry {
            marker: node.list_marker,
            ils: node.list_ils,
            start_index: node.start_index,
        }
    }

    /// Position of the outermost ancestor of `at` whose parent is pending or
    /// absent.
    pub(crate) fn scope_sibling(&self, at: usize) -> usize {
        let mut position = at;
        while let Some(parent) = self.at(position).parent {
            position = self.index_of(parent);
        }
        position
    }

    /// Last closed list in scope when only paragraphs follow it.
    fn resumable_list(&self, floor: Option<usize>) -> Option<usize> {
        let start = floor.map_or(0, |f| f + 1);
        let mut end = self.len();
        while end > start {
            let sibling = self.scope_sibling(end - 1);
            if sibling < start {
                return None;
            }
            let node = self.at(sibling);
            match node.node_type {
                NodeType::Paragraph => end = sibling,
                NodeType::List if !node.pending && !node.terminated => return Some(sibling),
                _ => return None,
            }
        }
        None
    }

    /// Reopen the previous list when `want` continues it. Returns whether
    /// anything was reopened.
    fn resume_list(&mut self, floor: Option<usize>, want: &[MarkerEntry]) -> bool {
        let Some(list) = self.resumable_list(floor) else {
            return false;
        };

        // (list, last item) pairs from the outermost level down
        let mut chain: SmallVec<[(NodeId, NodeId); 4]> = SmallVec::new();
        let mut current = list;
        loop {
            let Some(&item) = self
                .children(current)
                .iter()
                .rev()
                .find(|&&c| self.at(c).node_type == NodeType::ListItem)
            else {
                break;
            };
            chain.push((self.id_at(current), self.id_at(item)));
            let nested = self.children(item).last().copied().filter(|&c| {
                let node = self.at(c);
                node.node_type == NodeType::List && !node.terminated
            });
            match nested {
                Some(next) => current = next,
                None => break,
            }
        }

        let markers: MarkerList = chain.iter().map(|&(l, _)| self.list_entry(l)).collect();
        let matched = common_prefix(&markers, want);
        if matched == 0 || matched < markers.len().min(want.len()) {
            return false;
        }
        trace!(levels = matched, "resuming list");
        for &(list, item) in &chain[..matched] {
            self.reopen(list);
            self.reopen(item);
        }
        true
    }

    /// Open, close and split lists so that the end of the sequence sits in
    /// a list item matching `want`.
    pub(crate) fn reconcile_lists(
        &mut self,
        want: &[MarkerEntry],
        is_continue: bool,
        format: &FormatState,
        options: &ConvertOptions,
    ) {
        let mut open = self.open_lists();
        if is_continue && !open.lists.is_empty() {
            return;
        }
        if want.is_empty() {
            if let Some(&outer) = open.lists.first() {
                let at = self.index_of(outer);
                self.close_at(at);
            }
            return;
        }

        let mut prefix = common_prefix(&open.markers, want);
        if open.lists.is_empty() && options.resume_lists && self.resume_list(open.floor, want) {
            open = self.open_lists();
            prefix = common_prefix(&open.markers, want);
        }

        let have = open.lists.len();
        if prefix < have {
            let at = self.index_of(open.lists[prefix]);
            self.close_at(at);
        }

        let depth = want.len().min(prefix + options.max_list_level_jump.max(1));
        if depth == prefix {
            // Same list, same level: start the next item
            if let Some(item) = self.find_pending_after(NodeType::ListItem, open.floor) {
                self.close_at(item);
            }
            self.push(DocumentNode::new(NodeType::ListItem, format.clone()));
            return;
        }
        for entry in &want[prefix..depth] {
            let mut list = DocumentNode::new(NodeType::List, format.clone());
            list.list_marker = entry.marker;
            list.list_ils = entry.ils;
            list.start_index = entry.start_index;
            self.push(list);
            self.push(DocumentNode::new(NodeType::ListItem, format.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xaml::list_table::ListLevel;

    fn roman_tables() -> (ListTable, ListOverrideTable) {
        let mut lists = ListTable::new();
        let entry = lists.add_entry();
        entry.id = 7;
        entry.levels.push(ListLevel::default());
        entry.levels.push(ListLevel {
            marker: MarkerStyle::UpperRoman,
            start_index: 3,
        });
        let mut overrides = ListOverrideTable::new();
        let over = overrides.add_entry();
        over.list_id = 7;
        over.index = 1;
        (lists, overrides)
    }

    fn list_format(ils: i64, ilvl: i64) -> FormatState {
        let mut format = FormatState::default();
        format.ils = ils;
        format.ilvl = ilvl;
        format
    }

    #[test]
    fn test_override_level_resolution() {
        let (lists, overrides) = roman_tables();
        let want = desired_markers(&list_format(1, 1), &lists, &overrides, None);
        assert_eq!(want.len(), 2);
        assert_eq!(want[0].marker, MarkerStyle::Arabic);
        assert_eq!(want[1].marker, MarkerStyle::UpperRoman);
        assert_eq!(want[1].start_index, 3);
    }

    #[test]
    fn test_override_start_takes_precedence() {
        let (lists, mut overrides) = roman_tables();
        if let Some(level) = overrides.add_level() {
            level.overrides_start = true;
            level.start_index = Some(5);
        }
        let want = desired_markers(&list_format(1, 0), &lists, &overrides, None);
        assert_eq!(want[0].start_index, 5);
    }

    #[test]
    fn test_legacy_and_marker_text_fallbacks() {
        let lists = ListTable::new();
        let overrides = ListOverrideTable::new();

        let mut format = FormatState::default();
        format.old_list.level = 2;
        format.old_list.marker = MarkerStyle::LowerAlpha;
        let want = desired_markers(&format, &lists, &overrides, None);
        assert_eq!(want.len(), 2);
        assert!(want.iter().all(|e| e.marker == MarkerStyle::LowerAlpha));

        let mut format = FormatState::default();
        format.listtext_seen = true;
        let want = desired_markers(&format, &lists, &overrides, Some("2.\t"));
        assert_eq!(want[0].marker, MarkerStyle::Arabic);
        assert!(desired_markers(&FormatState::default(), &lists, &overrides, None).is_empty());
    }

    #[test]
    fn test_guess_marker() {
        assert_eq!(guess_marker("iv."), MarkerStyle::LowerRoman);
        assert_eq!(guess_marker("b)"), MarkerStyle::LowerAlpha);
        assert_eq!(guess_marker("XII"), MarkerStyle::UpperRoman);
        assert_eq!(guess_marker("A."), MarkerStyle::UpperAlpha);
        assert_eq!(guess_marker("\u{2022}\t"), MarkerStyle::Bullet);
    }

    fn entry(marker: MarkerStyle) -> MarkerEntry {
        MarkerEntry {
            marker,
            ils: 1,
            start_index: 1,
        }
    }

    fn paragraph(array: &mut DocumentNodeArray) {
        let para = array.push(DocumentNode::new(NodeType::Paragraph, FormatState::default()));
        array.push(DocumentNode::text(FormatState::default(), "p"));
        let at = array.index_of(para);
        array.close_at(at);
    }

    #[test]
    fn test_items_split_and_levels_nest() {
        let mut array = DocumentNodeArray::new();
        let options = ConvertOptions::default();
        let format = FormatState::default();
        let one = [entry(MarkerStyle::Arabic)];
        let two = [entry(MarkerStyle::Arabic), entry(MarkerStyle::Bullet)];

        array.reconcile_lists(&one, false, &format, &options);
        paragraph(&mut array);
        array.reconcile_lists(&one, false, &format, &options);
        paragraph(&mut array);
        assert_eq!(array.count_pending(NodeType::List), 1);
        assert_eq!(array.count_pending(NodeType::ListItem), 1);

        array.reconcile_lists(&two, false, &format, &options);
        paragraph(&mut array);
        assert_eq!(array.count_pending(NodeType::List), 2);

        array.reconcile_lists(&[], false, &format, &options);
        assert!(!array.has_open_nodes());
        array.close_all();
        let items = (0..array.len())
            .filter(|&p| array.at(p).node_type == NodeType::ListItem)
            .count();
        assert_eq!(items, 3);
    }

    #[test]
    fn test_level_jump_is_clipped() {
        let mut array = DocumentNodeArray::new();
        let deep = [
            entry(MarkerStyle::Arabic),
            entry(MarkerStyle::LowerAlpha),
            entry(MarkerStyle::LowerRoman),
        ];
        array.reconcile_lists(&deep, false, &FormatState::default(), &ConvertOptions::default());
        assert_eq!(array.count_pending(NodeType::List), 1);
    }

    #[test]
    fn test_list_resumes_after_plain_paragraph() {
        let mut array = DocumentNodeArray::new();
        let options = ConvertOptions::default();
        let format = FormatState::default();
        let one = [entry(MarkerStyle::Arabic)];

        array.reconcile_lists(&one, false, &format, &options);
        paragraph(&mut array);
        array.reconcile_lists(&[], false, &format, &options);
        paragraph(&mut array);
        array.reconcile_lists(&one, false, &format, &options);
        paragraph(&mut array);
        array.close_all();

        assert_eq!(array.at(0).node_type, NodeType::List);
        assert_eq!(array.at(0).child_count, array.len() - 1);
        let lists = (0..array.len())
            .filter(|&p| array.at(p).node_type == NodeType::List)
            .count();
        assert_eq!(lists, 1);
    }

    #[test]
    fn test_resume_can_be_disabled() {
        let mut array = DocumentNodeArray::new();
        let options = ConvertOptions::default().with_resume_lists(false);
        let format = FormatState::default();
        let one = [entry(MarkerStyle::Arabic)];

        array.reconcile_lists(&one, false, &format, &options);
        paragraph(&mut array);
        array.reconcile_lists(&[], false, &format, &options);
        paragraph(&mut array);
        array.reconcile_lists(&one, false, &format, &options);
        paragraph(&mut array);
        array.close_all();

        let lists = (0..array.len())
            .filter(|&p| array.at(p).node_type == NodeType::List)
            .count();
        assert_eq!(lists, 2);
    }
}
