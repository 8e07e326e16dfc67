//! Flattened document tree.
//!
//! Nodes live in an arena and are addressed by [`NodeId`]. The live document
//! is a pre-order sequence of ids: a closed node at position `i` with
//! `child_count` n owns exactly the positions `i + 1 ..= i + n`. A pending
//! (still open) node owns everything after it. Open nodes are also tracked in
//! an index-sorted stack so the innermost open node of a kind can be found
//! without scanning the whole sequence.
//!
//! Coalescing works bottom-up: a closed subtree is turned into markup, its
//! descendants are excised and the node becomes a terminated leaf holding
//! the finished markup.

use super::node::{DocumentNode, FieldKind, NodeId, NodeType, XamlContext};
use tracing::debug;

#[derive(Debug, Default)]
pub struct DocumentNodeArray {
    nodes: Vec<DocumentNode>,
    order: Vec<NodeId>,
    /// Pending nodes, ascending by index
    open: Vec<NodeId>,
}

impl DocumentNodeArray {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    #[inline]
    pub fn id_at(&self, at: usize) -> NodeId {
        self.order[at]
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> &DocumentNode {
        &self.nodes[id.0 as usize]
    }

    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut DocumentNode {
        &mut self.nodes[id.0 as usize]
    }

    #[inline]
    pub fn at(&self, at: usize) -> &DocumentNode {
        self.get(self.order[at])
    }

    #[inline]
    pub fn at_mut(&mut self, at: usize) -> &mut DocumentNode {
        let id = self.order[at];
        self.get_mut(id)
    }

    /// Current position of a live node.
    #[inline]
    pub fn index_of(&self, id: NodeId) -> usize {
        self.get(id).index
    }

    pub fn last(&self) -> Option<&DocumentNode> {
        self.order.last().map(|&id| self.get(id))
    }

    pub fn last_mut(&mut self) -> Option<&mut DocumentNode> {
        let id = *self.order.last()?;
        Some(self.get_mut(id))
    }

    /// Pending nodes, outermost first.
    pub fn open_nodes(&self) -> &[NodeId] {
        &self.open
    }

    pub fn has_open_nodes(&self) -> bool {
        !self.open.is_empty()
    }

    /// Position of the innermost pending node.
    pub fn top_pending(&self) -> Option<usize> {
        self.open.last().map(|&id| self.index_of(id))
    }

    /// One past the last position of the subtree at `at`.
    pub fn span_end(&self, at: usize) -> usize {
        let node = self.at(at);
        if node.pending {
            self.len()
        } else {
            at + node.child_count + 1
        }
    }

    fn reindex(&mut self, from: usize) {
        for position in from..self.order.len() {
            let id = self.order[position];
            self.nodes[id.0 as usize].index = position;
        }
    }

    fn register_open(&mut self, id: NodeId) {
        let index = self.index_of(id);
        let nodes = &self.nodes;
        let slot = self.open.partition_point(|o| nodes[o.0 as usize].index < index);
        self.open.insert(slot, id);
    }

    fn unregister_open(&mut self, id: NodeId) {
        self.open.retain(|&o| o != id);
    }

    /// Append a node. Pending nodes join the open stack.
    pub fn push(&mut self, node: DocumentNode) -> NodeId {
        self.insert(self.len(), node)
    }

    /// Insert a node at `at`. Child counts of enclosing closed nodes are
    /// left to the caller.
    pub fn insert(&mut self, at: usize, mut node: DocumentNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        node.index = at;
        let pending = node.pending;
        self.nodes.push(node);
        self.order.insert(at, id);
        self.reindex(at + 1);
        if pending {
            self.register_open(id);
        }
        id
    }

    /// Mark a closed node pending again.
    pub fn reopen(&mut self, id: NodeId) {
        let node = self.get_mut(id);
        if node.pending || node.terminated {
            return;
        }
        node.pending = true;
        self.register_open(id);
    }

    /// Close the node at `at`, closing every pending node after it first.
    ///
    /// The node's child count becomes everything after it, and its direct
    /// children get their parent link.
    pub fn close_at(&mut self, at: usize) {
        while let Some(&last) = self.open.last() {
            let index = self.index_of(last);
            if index <= at {
                break;
            }
            self.close_one(index);
        }
        if self.at(at).pending {
            self.close_one(at);
        } else {
            debug!(position = at, "close of a node that is not pending");
        }
    }

    fn close_one(&mut self, at: usize) {
        let id = self.order[at];
        let len = self.len();
        {
            let node = self.get_mut(id);
            node.pending = false;
            node.child_count = len - at - 1;
        }
        let mut child = at + 1;
        while child < len {
            let node = self.at_mut(child);
            node.parent = Some(id);
            child += node.child_count + 1;
        }
        self.unregister_open(id);
    }

    /// Close every pending node.
    pub fn close_all(&mut self) {
        if let Some(&first) = self.open.first() {
            let at = self.index_of(first);
            self.close_at(at);
        }
    }

    /// Remove `count` nodes starting at `at`. The range must consist of
    /// whole subtrees sharing one parent.
    pub fn excise(&mut self, at: usize, count: usize) {
        if count == 0 {
            return;
        }
        let mut parent = self.at(at).parent;
        while let Some(pid) = parent {
            let node = self.get_mut(pid);
            if node.pending {
                break;
            }
            node.child_count -= count;
            parent = node.parent;
        }
        let removed: Vec<NodeId> = self.order.drain(at..at + count).collect();
        for id in removed {
            if self.get(id).pending {
                self.unregister_open(id);
            }
            self.get_mut(id).release();
        }
        self.reindex(at);
    }

    /// Remove the node at `at` but keep its descendants, which move up to
    /// the node's parent.
    pub fn remove_keep_children(&mut self, at: usize) {
        let id = self.order[at];
        if self.get(id).pending {
            self.close_at(at);
        }
        let parent = self.get(id).parent;
        let end = self.span_end(at);
        let mut child = at + 1;
        while child < end {
            let node = self.at_mut(child);
            node.parent = parent;
            child += node.child_count + 1;
        }
        let mut ancestor = parent;
        while let Some(pid) = ancestor {
            let node = self.get_mut(pid);
            if node.pending {
                break;
            }
            node.child_count -= 1;
            ancestor = node.parent;
        }
        self.order.remove(at);
        self.get_mut(id).release();
        self.reindex(at);
    }

    /// Wrap the `span` closed nodes starting at `at` (whole sibling subtrees)
    /// in a new closed node.
    pub fn wrap(&mut self, at: usize, span: usize, mut wrapper: DocumentNode) -> NodeId {
        let parent = if at < self.len() { self.at(at).parent } else { None };
        wrapper.pending = false;
        wrapper.child_count = span;
        wrapper.parent = parent;

        let mut ancestor = parent;
        while let Some(pid) = ancestor {
            let node = self.get_mut(pid);
            if node.pending {
                break;
            }
            node.child_count += 1;
            ancestor = node.parent;
        }

        let id = self.insert(at, wrapper);
        let end = at + 1 + span;
        let mut child = at + 1;
        while child < end {
            let node = self.at_mut(child);
            node.parent = Some(id);
            child += node.child_count + 1;
        }
        id
    }

    /// Take the nodes from `start` to the end out of the live sequence.
    /// They must not be pending.
    pub fn detach_tail(&mut self, start: usize) -> Vec<NodeId> {
        self.order.split_off(start)
    }

    /// Append nodes taken by [`detach_tail`](Self::detach_tail).
    pub fn attach_tail(&mut self, tail: Vec<NodeId>) -> usize {
        let start = self.len();
        self.order.extend(tail);
        self.reindex(start);
        start
    }

    /// Parent position of the node at `at`: its parent link, or the
    /// innermost pending node before it.
    pub fn parent_of(&self, at: usize) -> Option<usize> {
        if let Some(parent) = self.at(at).parent {
            return Some(self.index_of(parent));
        }
        self.open.iter().rev().map(|&id| self.index_of(id)).find(|&index| index < at)
    }

    /// Positions of the direct children of the node at `at`.
    pub fn children(&self, at: usize) -> Vec<usize> {
        let end = self.span_end(at);
        let mut out = Vec::new();
        let mut child = at + 1;
        while child < end {
            out.push(child);
            child = self.span_end(child);
        }
        out
    }

    /// Recompute every parent link from the spans.
    pub fn establish_tree_relationships(&mut self) {
        let mut stack: Vec<(NodeId, usize, bool)> = Vec::new();
        for position in 0..self.len() {
            while stack.last().is_some_and(|&(_, end, _)| position >= end) {
                stack.pop();
            }
            let parent = stack.last().and_then(|&(id, _, pending)| (!pending).then_some(id));
            let end = self.span_end(position);
            let id = self.order[position];
            let node = self.get_mut(id);
            node.parent = parent;
            let pending = node.pending;
            stack.push((id, end, pending));
        }
    }

    /// Innermost pending node of `node_type`, not looking past a shape
    /// boundary.
    pub fn find_pending(&self, node_type: NodeType) -> Option<usize> {
        for &id in self.open.iter().rev() {
            let node = self.get(id);
            if node.node_type == node_type {
                return Some(node.index);
            }
            if node.node_type == NodeType::Shape {
                return None;
            }
        }
        None
    }

    /// Innermost pending node of `node_type` after position `floor`.
    pub fn find_pending_after(&self, node_type: NodeType, floor: Option<usize>) -> Option<usize> {
        self.find_pending(node_type)
            .filter(|&index| floor.is_none_or(|f| index > f))
    }

    /// Number of pending nodes of `node_type` inside the current shape scope.
    pub fn count_pending(&self, node_type: NodeType) -> usize {
        let mut count = 0;
        for &id in self.open.iter().rev() {
            let node = self.get(id);
            if node.node_type == NodeType::Shape {
                break;
            }
            if node.node_type == node_type {
                count += 1;
            }
        }
        count
    }

    /// Last field-begin marker of `kind` not matched by a later end marker.
    pub fn find_unmatched_begin(&self, kind: FieldKind) -> Option<usize> {
        let floor = self.find_pending(NodeType::Shape);
        let mut depth = 0usize;
        for position in (0..self.len()).rev() {
            if floor.is_some_and(|f| position <= f) {
                break;
            }
            let node = self.at(position);
            if node.field_kind != Some(kind) {
                continue;
            }
            match node.node_type {
                NodeType::FieldEnd => depth += 1,
                NodeType::FieldBegin if depth == 0 => return Some(position),
                NodeType::FieldBegin => depth -= 1,
                _ => {},
            }
        }
        None
    }

    /// Start of the run of trailing inline nodes that a paragraph break
    /// turns into a paragraph. Stops at pending nodes, blocks and open
    /// field results.
    pub fn inline_tail_start(&self) -> usize {
        let mut start = self.len();
        let mut ends = 0usize;
        while start > 0 {
            let root = self.closed_root(start - 1);
            let node = self.at(root);
            if node.pending || !node.is_inline() {
                break;
            }
            match node.node_type {
                NodeType::FieldEnd => ends += 1,
                NodeType::FieldBegin if ends == 0 => break,
                NodeType::FieldBegin => ends -= 1,
                _ => {},
            }
            start = root;
        }
        start
    }

    /// Outermost closed ancestor of the node at `at`, or the node itself.
    pub fn closed_root(&self, at: usize) -> usize {
        let mut root = at;
        while let Some(parent) = self.at(root).parent {
            let parent_at = self.index_of(parent);
            if self.at(parent_at).pending {
                break;
            }
            root = parent_at;
        }
        root
    }

    /// Turn the closed subtree at `at` into markup; it becomes a terminated
    /// leaf.
    pub fn coalesce_children(&mut self, ctx: &XamlContext<'_>, at: usize) {
        if self.at(at).pending {
            debug!(position = at, "coalesce of a pending node");
            return;
        }
        let id = self.id_at(at);
        self.pre_coalesce(at);
        let at = self.index_of(id);
        let end = at + self.at(at).child_count;
        for position in (at..=end).rev() {
            self.coalesce_node(ctx, position);
        }
    }

    /// Coalesce every descendant of the closed node at `at`, leaving the
    /// node itself open to further restructuring.
    pub fn coalesce_only_children(&mut self, ctx: &XamlContext<'_>, at: usize) {
        if self.at(at).pending {
            return;
        }
        let id = self.id_at(at);
        self.pre_coalesce(at);
        let at = self.index_of(id);
        let end = at + self.at(at).child_count;
        for position in (at + 1..=end).rev() {
            self.coalesce_node(ctx, position);
        }
    }

    /// Children of `at` are already terminated leaves.
    fn coalesce_node(&mut self, ctx: &XamlContext<'_>, at: usize) {
        let node = self.at(at);
        if node.terminated {
            return;
        }
        let parent = self.parent_of(at).map(|p| self.at(p));
        let child_count = node.child_count;

        let xaml = if child_count == 0 {
            node.leaf_markup(ctx, parent)
        } else if node.is_dropped() {
            String::new()
        } else {
            let mut xaml = String::new();
            node.append_start(&mut xaml, ctx, parent);
            for child in at + 1..=at + child_count {
                xaml.push_str(&self.at(child).xaml);
            }
            node.append_end(&mut xaml);
            xaml
        };

        let node = self.at_mut(at);
        node.xaml = xaml;
        node.terminated = true;
        if child_count > 0 {
            self.excise(at + 1, child_count);
        }
    }

    /// Concatenated markup of every top-level node.
    pub fn top_level_xaml(&self) -> String {
        let mut out = String::new();
        let mut position = 0;
        while position < self.len() {
            out.push_str(&self.at(position).xaml);
            position = self.span_end(position);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xaml::format::FormatState;
    use crate::xaml::options::ConvertOptions;
    use crate::xaml::tables::{ColorTable, FontTable};
    use proptest::prelude::*;

    fn pending(node_type: NodeType) -> DocumentNode {
        DocumentNode::new(node_type, FormatState::default())
    }

    fn text(s: &str) -> DocumentNode {
        DocumentNode::text(FormatState::default(), s)
    }

    /// Every closed node's span stays inside its parent's span.
    fn assert_spans(array: &DocumentNodeArray) {
        for position in 0..array.len() {
            let node = array.at(position);
            assert_eq!(node.index, position);
            assert!(array.span_end(position) <= array.len());
            if let Some(parent) = node.parent {
                let p = array.index_of(parent);
                assert!(p < position);
                assert!(array.span_end(position) <= array.span_end(p));
            }
        }
    }

    #[test]
    fn test_close_assigns_counts_and_parents() {
        let mut array = DocumentNodeArray::new();
        let para = array.push(pending(NodeType::Paragraph));
        let a = array.push(text("a"));
        let link = array.push(pending(NodeType::Hyperlink));
        array.push(text("b"));
        array.close_at(0);

        assert_eq!(array.get(para).child_count, 3);
        assert_eq!(array.get(link).child_count, 1);
        assert_eq!(array.get(a).parent, Some(para));
        assert_eq!(array.get(link).parent, Some(para));
        assert_eq!(array.at(3).parent, Some(link));
        assert!(!array.has_open_nodes());
        assert_spans(&array);
    }

    #[test]
    fn test_excise_updates_ancestors() {
        let mut array = DocumentNodeArray::new();
        let para = array.push(pending(NodeType::Paragraph));
        array.push(text("a"));
        array.push(text("b"));
        array.push(text("c"));
        array.close_at(0);
        array.excise(2, 1);
        assert_eq!(array.get(para).child_count, 2);
        assert_eq!(array.at(2).content, "c");
        assert_spans(&array);
    }

    #[test]
    fn test_wrap_and_remove_keep_children() {
        let mut array = DocumentNodeArray::new();
        let para = array.push(pending(NodeType::Paragraph));
        array.push(text("a"));
        array.push(text("b"));
        array.close_at(0);
        let span = array.wrap(1, 2, DocumentNode::new(NodeType::Inline, FormatState::default()));
        assert_eq!(array.get(para).child_count, 3);
        assert_eq!(array.at(2).parent, Some(span));
        assert_spans(&array);

        array.remove_keep_children(1);
        assert_eq!(array.get(para).child_count, 2);
        assert_eq!(array.at(1).parent, Some(para));
        assert_spans(&array);
    }

    #[test]
    fn test_inline_tail_stops_at_open_field_result() {
        let mut array = DocumentNodeArray::new();
        array.push(text("before"));
        let format = FormatState::default();
        array.push(DocumentNode::field_marker(NodeType::FieldBegin, FieldKind::Result, format.clone()));
        array.push(text("inside"));
        assert_eq!(array.inline_tail_start(), 2);

        array.push(DocumentNode::field_marker(NodeType::FieldEnd, FieldKind::Result, format));
        array.push(text("after"));
        assert_eq!(array.inline_tail_start(), 0);
    }

    #[test]
    fn test_inline_tail_skips_content_of_closed_paragraph() {
        let mut array = DocumentNodeArray::new();
        array.push(pending(NodeType::Paragraph));
        array.push(text("one"));
        array.close_at(0);
        array.wrap(1, 1, DocumentNode::new(NodeType::Hyperlink, FormatState::default()));
        array.push(text("two"));
        assert_eq!(array.closed_root(2), 0);
        assert_eq!(array.inline_tail_start(), 3);

        let tail = array.detach_tail(array.inline_tail_start());
        assert_eq!(tail.len(), 1);
        array.attach_tail(tail);
        assert_spans(&array);
    }

    #[test]
    fn test_find_pending_stops_at_shape() {
        let mut array = DocumentNodeArray::new();
        array.push(pending(NodeType::List));
        array.push(pending(NodeType::Shape));
        assert_eq!(array.find_pending(NodeType::List), None);
        assert_eq!(array.find_pending(NodeType::Shape), Some(1));
        array.close_at(1);
        assert_eq!(array.find_pending(NodeType::List), Some(0));
    }

    #[test]
    fn test_find_unmatched_begin() {
        let mut array = DocumentNodeArray::new();
        let format = FormatState::default();
        array.push(DocumentNode::field_marker(NodeType::FieldBegin, FieldKind::Field, format.clone()));
        array.push(DocumentNode::field_marker(NodeType::FieldBegin, FieldKind::Field, format.clone()));
        array.push(DocumentNode::field_marker(NodeType::FieldEnd, FieldKind::Field, format));
        assert_eq!(array.find_unmatched_begin(FieldKind::Field), Some(0));
    }

    #[test]
    fn test_coalesce_wraps_children() {
        let fonts = FontTable::new();
        let colors = ColorTable::new();
        let options = ConvertOptions::default();
        let root = FormatState::default();
        let ctx = XamlContext {
            fonts: &fonts,
            colors: &colors,
            options: &options,
            root: &root,
        };

        let mut array = DocumentNodeArray::new();
        array.push(pending(NodeType::Paragraph));
        array.push(text("x & y"));
        array.push(DocumentNode::leaf(NodeType::LineBreak, FormatState::default()));
        array.close_at(0);
        array.coalesce_children(&ctx, 0);

        assert_eq!(array.len(), 1);
        assert!(array.at(0).terminated);
        assert_eq!(array.top_level_xaml(), "<Paragraph><Run>x &amp; y</Run><LineBreak /></Paragraph>");
    }

    #[derive(Debug, Clone)]
    enum Op {
        Open(bool),
        Text,
        Close,
        Excise,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            any::<bool>().prop_map(Op::Open),
            Just(Op::Text),
            Just(Op::Close),
            Just(Op::Excise),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(128))]

        #[test]
        fn prop_spans_stay_nested(ops in prop::collection::vec(op(), 1..64)) {
            let mut array = DocumentNodeArray::new();
            for op in ops {
                match op {
                    Op::Open(list) => {
                        let ty = if list { NodeType::List } else { NodeType::Paragraph };
                        array.push(pending(ty));
                    },
                    Op::Text => {
                        array.push(text("t"));
                    },
                    Op::Close => {
                        if let Some(at) = array.top_pending() {
                            array.close_at(at);
                        }
                    },
                    Op::Excise => {
                        if let Some(last) = array.len().checked_sub(1)
                            && !array.at(last).pending
                            && array.at(last).child_count == 0
                        {
                            array.excise(last, 1);
                        }
                    },
                }
                assert_spans(&array);
            }
            array.close_all();
            assert_spans(&array);
            let mut position = 0;
            let mut covered = 0;
            while position < array.len() {
                covered += array.at(position).child_count + 1;
                position = array.span_end(position);
            }
            prop_assert_eq!(covered, array.len());
        }
    }
}
