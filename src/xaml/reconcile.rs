//! Structural passes run over a closed subtree right before it is coalesced.

use super::format::Direction;
use super::node::{DocumentNode, NodeId, NodeType};
use super::node_array::DocumentNodeArray;

impl DocumentNodeArray {
    pub(crate) fn pre_coalesce(&mut self, at: usize) {
        let root = self.id_at(at);
        self.process_tables(at);
        self.wrap_container_inlines(self.index_of(root));
        self.merge_direction_runs(self.index_of(root));
        self.promote_list_margins(self.index_of(root));
        self.promote_list_directions(self.index_of(root));
    }

    /// Unterminated nodes of `node_type` in the subtree at `at`, in document
    /// order.
    fn subtree_nodes(&self, at: usize, node_type: NodeType) -> Vec<NodeId> {
        (at..self.span_end(at))
            .filter(|&p| {
                let node = self.at(p);
                node.node_type == node_type && !node.terminated && !node.pending
            })
            .map(|p| self.id_at(p))
            .collect()
    }

    /// Maximal runs of consecutive inline children of `at`, as
    /// `(start, span)` pairs, last run first.
    fn inline_runs(&self, at: usize, accept: impl Fn(&DocumentNode) -> bool) -> Vec<(usize, usize)> {
        let mut runs = Vec::new();
        let mut current: Option<(usize, usize)> = None;
        for child in self.children(at) {
            let node = self.at(child);
            if node.is_inline() && accept(node) {
                let end = self.span_end(child);
                current = Some(match current {
                    Some((start, _)) => (start, end - start),
                    None => (child, end - child),
                });
            } else if let Some(run) = current.take() {
                runs.push(run);
            }
        }
        runs.extend(current);
        runs.reverse();
        runs
    }

    /// Wrap inline content sitting directly in `parent` (cells and list
    /// items, or the top level when `parent` is `None`) in paragraphs.
    pub(crate) fn wrap_inline_runs(&mut self, parent: Option<usize>) {
        let runs = match parent {
            Some(at) => self.inline_runs(at, |_| true),
            None => self.top_level_inline_runs(),
        };
        for (start, span) in runs {
            let format = self.at(start).format.clone();
            self.wrap(start, span, DocumentNode::new(NodeType::Paragraph, format));
        }
    }

    fn top_level_inline_runs(&self) -> Vec<(usize, usize)> {
        let mut runs = Vec::new();
        let mut current: Option<(usize, usize)> = None;
        let mut position = 0;
        while position < self.len() {
            let node = self.at(position);
            let end = self.span_end(position);
            if node.is_inline() && !node.pending {
                current = Some(match current {
                    Some((start, _)) => (start, end - start),
                    None => (position, end - position),
                });
            } else if let Some(run) = current.take() {
                runs.push(run);
            }
            position = end;
        }
        runs.extend(current);
        runs.reverse();
        runs
    }

    fn wrap_container_inlines(&mut self, at: usize) {
        let mut containers = self.subtree_nodes(at, NodeType::Cell);
        containers.extend(self.subtree_nodes(at, NodeType::ListItem));
        for container in containers {
            let position = self.index_of(container);
            self.wrap_inline_runs(Some(position));
        }
    }

    /// Group consecutive children of a paragraph whose character direction
    /// differs from the paragraph's into one span.
    fn merge_direction_runs(&mut self, at: usize) {
        for paragraph in self.subtree_nodes(at, NodeType::Paragraph) {
            let position = self.index_of(paragraph);
            let direction = self.get(paragraph).format.para_direction;
            let candidates = self.inline_runs(position, |n| {
                !n.terminated && n.node_type == NodeType::Text && n.format.char_direction != direction
            });
            for (start, span) in candidates {
                // Split the run further where the children disagree
                let mut groups: Vec<(usize, usize)> = Vec::new();
                let mut child = start;
                while child < start + span {
                    let end = self.span_end(child);
                    let dir = self.at(child).format.char_direction;
                    match groups.last_mut() {
                        Some((first, len)) if self.at(*first).format.char_direction == dir => *len = end - *first,
                        _ => groups.push((child, end - child)),
                    }
                    child = end;
                }
                for (first, len) in groups.into_iter().rev() {
                    if len < 2 {
                        continue;
                    }
                    let format = self.at(first).format.clone();
                    self.wrap(first, len, DocumentNode::new(NodeType::Inline, format));
                }
            }
        }
    }

    /// Hoist the smallest left indent of an item's paragraphs onto the item.
    fn promote_list_margins(&mut self, at: usize) {
        for item in self.subtree_nodes(at, NodeType::ListItem) {
            let position = self.index_of(item);
            let paragraphs: Vec<usize> = self
                .children(position)
                .into_iter()
                .filter(|&p| {
                    let node = self.at(p);
                    node.node_type == NodeType::Paragraph && !node.terminated && node.child_count > 0
                })
                .collect();
            let Some(min_li) = paragraphs.iter().map(|&p| self.at(p).format.li).min() else {
                continue;
            };

            let mut enclosing = 0;
            let mut ancestor = self.get(item).parent;
            while let Some(id) = ancestor {
                let node = self.get(id);
                if node.node_type == NodeType::ListItem {
                    enclosing += node.near_margin;
                }
                ancestor = node.parent;
            }

            self.get_mut(item).near_margin = (min_li - enclosing).max(0);
            for p in paragraphs {
                self.at_mut(p).format.li -= min_li;
            }
        }
    }

    /// Give a list the flow direction all of its paragraphs agree on.
    fn promote_list_directions(&mut self, at: usize) {
        for list in self.subtree_nodes(at, NodeType::List) {
            let position = self.index_of(list);
            let items: Vec<usize> = self
                .children(position)
                .into_iter()
                .filter(|&p| self.at(p).node_type == NodeType::ListItem)
                .collect();
            let mut agreed: Option<Direction> = None;
            let mut consistent = true;
            for &item in &items {
                for child in self.children(item) {
                    let node = self.at(child);
                    if node.node_type != NodeType::Paragraph || (node.child_count == 0 && node.xaml.is_empty()) {
                        continue;
                    }
                    let direction = node.format.para_direction;
                    match agreed {
                        None => agreed = Some(direction),
                        Some(d) if d != direction => consistent = false,
                        Some(_) => {},
                    }
                }
            }
            let Some(direction) = agreed.filter(|_| consistent) else {
                continue;
            };
            self.get_mut(list).flow_direction = Some(direction);
            for item in items {
                self.at_mut(item).flow_direction = Some(direction);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xaml::format::FormatState;

    fn paragraph_with(array: &mut DocumentNodeArray, li: i64, direction: Direction) {
        let mut format = FormatState::default();
        format.li = li;
        format.para_direction = direction;
        let para = array.push(DocumentNode::new(NodeType::Paragraph, format.clone()));
        array.push(DocumentNode::text(format, "item"));
        let at = array.index_of(para);
        array.close_at(at);
    }

    #[test]
    fn test_list_margin_and_direction_promotion() {
        let mut array = DocumentNodeArray::new();
        let list = array.push(DocumentNode::new(NodeType::List, FormatState::default()));
        let first = array.push(DocumentNode::new(NodeType::ListItem, FormatState::default()));
        paragraph_with(&mut array, 720, Direction::RightToLeft);
        paragraph_with(&mut array, 1080, Direction::RightToLeft);
        let at = array.index_of(first);
        array.close_at(at);
        let second = array.push(DocumentNode::new(NodeType::ListItem, FormatState::default()));
        paragraph_with(&mut array, 720, Direction::RightToLeft);
        array.close_at(0);

        array.pre_coalesce(0);
        assert_eq!(array.get(first).near_margin, 720);
        assert_eq!(array.get(second).near_margin, 720);
        let paragraphs: Vec<i64> = (0..array.len())
            .filter(|&p| array.at(p).node_type == NodeType::Paragraph)
            .map(|p| array.at(p).format.li)
            .collect();
        assert_eq!(paragraphs, vec![0, 360, 0]);
        assert_eq!(array.get(list).flow_direction, Some(Direction::RightToLeft));
        assert_eq!(array.get(second).flow_direction, Some(Direction::RightToLeft));
    }

    #[test]
    fn test_direction_runs_are_grouped() {
        let mut array = DocumentNodeArray::new();
        let para = array.push(DocumentNode::new(NodeType::Paragraph, FormatState::default()));
        let mut rtl = FormatState::default();
        rtl.char_direction = Direction::RightToLeft;
        array.push(DocumentNode::text(FormatState::default(), "a"));
        array.push(DocumentNode::text(rtl.clone(), "b"));
        array.push(DocumentNode::text(rtl, "c"));
        array.close_at(0);

        array.pre_coalesce(0);
        assert_eq!(array.len(), 5);
        assert_eq!(array.at(2).node_type, NodeType::Inline);
        assert_eq!(array.at(2).child_count, 2);
        assert_eq!(array.get(para).child_count, 4);
    }

    #[test]
    fn test_cell_inline_content_is_wrapped() {
        let mut array = DocumentNodeArray::new();
        array.push(DocumentNode::new(NodeType::Cell, FormatState::default()));
        array.push(DocumentNode::text(FormatState::default(), "loose"));
        array.close_at(0);

        array.pre_coalesce(0);
        assert_eq!(array.at(1).node_type, NodeType::Paragraph);
        assert_eq!(array.at(2).parent, Some(array.id_at(1)));
        assert_eq!(array.at(0).child_count, 2);
    }
}
